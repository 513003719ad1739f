// Copyright 2025 Phenotag Contributors
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! Phenotag CLI
//!
//! Annotate clinical free text against a phenotype vocabulary from the
//! command line.

use std::fs;
use std::io::Read;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Deserialize;
use tracing::{info, Level};

use phenotag_core::{PipelineConfig, ShinglePipeline};
use phenotag_index::{ConceptRecord, MemoryConceptIndex};
use phenotag_query::{Annotator, ConceptMatcher, MatcherConfig};

#[derive(Parser)]
#[command(name = "phenotag")]
#[command(about = "Phenotag - phenotype concept annotation for clinical text", long_about = None)]
struct Cli {
    /// Verbose mode
    #[arg(short, long)]
    verbose: bool,

    /// Optional TOML file overriding pipeline and matcher settings
    #[arg(long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Annotate text against a vocabulary
    Annotate {
        /// JSON file holding an array of concept records
        #[arg(short = 'V', long)]
        vocabulary: PathBuf,

        /// Text to annotate; reads stdin when neither this nor --file is given
        text: Option<String>,

        /// Read the text from a file instead
        #[arg(long, conflicts_with = "text")]
        file: Option<PathBuf>,

        /// Emit the full ranked hit list per span
        #[arg(long)]
        detailed: bool,
    },

    /// Print the shingles produced for a text (debugging aid)
    Shingles {
        /// Text to shingle
        text: String,

        /// Maximum shingle length
        #[arg(long, default_value = "6")]
        max_len: usize,
    },
}

/// Optional settings file: both sections fall back to defaults.
#[derive(Debug, Default, Deserialize)]
struct Settings {
    #[serde(default)]
    pipeline: Option<PipelineConfig>,
    #[serde(default)]
    matcher: Option<MatcherConfig>,
}

fn load_settings(path: Option<&PathBuf>) -> Result<Settings> {
    match path {
        Some(path) => {
            let raw = fs::read_to_string(path)
                .with_context(|| format!("reading config {}", path.display()))?;
            toml::from_str(&raw).with_context(|| format!("parsing config {}", path.display()))
        }
        None => Ok(Settings::default()),
    }
}

fn load_vocabulary(path: &PathBuf) -> Result<Vec<ConceptRecord>> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("reading vocabulary {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("parsing vocabulary {}", path.display()))
}

fn read_text(text: Option<String>, file: Option<&PathBuf>) -> Result<String> {
    if let Some(text) = text {
        return Ok(text);
    }
    if let Some(path) = file {
        return fs::read_to_string(path).with_context(|| format!("reading {}", path.display()));
    }
    let mut buf = String::new();
    std::io::stdin()
        .read_to_string(&mut buf)
        .context("reading stdin")?;
    Ok(buf)
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    tracing_subscriber::fmt().with_max_level(level).init();

    let settings = load_settings(cli.config.as_ref())?;
    let pipeline_config = settings.pipeline.unwrap_or_default();
    let matcher_config = settings.matcher.unwrap_or_default();

    match cli.command {
        Commands::Annotate {
            vocabulary,
            text,
            file,
            detailed,
        } => {
            let records = load_vocabulary(&vocabulary)?;
            info!(concepts = records.len(), "vocabulary loaded");
            let index = Arc::new(MemoryConceptIndex::from_records(records));
            let matcher = ConceptMatcher::new(index.clone(), index, matcher_config);
            let annotator = Annotator::new(matcher, pipeline_config)?;

            let text = read_text(text, file.as_ref())?;
            if detailed {
                let matches = annotator.annotate_detailed(&text)?;
                println!("{}", serde_json::to_string_pretty(&matches)?);
            } else {
                let annotations = annotator.annotate(&text)?;
                println!("{}", serde_json::to_string_pretty(&annotations)?);
            }
        }
        Commands::Shingles { text, max_len } => {
            let pipeline = ShinglePipeline::new(PipelineConfig {
                max_shingle_len: max_len,
                ..pipeline_config
            })?;
            for shingle in pipeline.start(text) {
                let words: Vec<&str> = shingle.tokens().iter().map(|t| t.text.as_str()).collect();
                println!("{:>4}..{:<4} {}", shingle.start(), shingle.end(), words.join(" "));
            }
        }
    }

    Ok(())
}
