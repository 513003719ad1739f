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

//! Phenotag Core
//!
//! Tokenization, clause segmentation, and the clause-bounded shingle
//! pipeline that feeds the concept matcher.

pub mod clause;
pub mod config;
pub mod error;
pub mod shingle;
pub mod token;

pub use clause::ClauseSegmenter;
pub use config::{PipelineConfig, DEFAULT_MAX_SHINGLE_LEN, DEFAULT_QUEUE_CAPACITY};
pub use error::{PhenotagError, Result};
pub use shingle::{Shingle, ShingleEvent, ShinglePipeline, ShingleStream};
pub use token::{Token, WhitespaceTokenizer};
