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

//! Configuration for the shingle pipeline.

use serde::{Deserialize, Serialize};

use crate::error::{PhenotagError, Result};

/// Default maximum number of tokens in one shingle.
pub const DEFAULT_MAX_SHINGLE_LEN: usize = 6;

/// Default capacity of the bounded producer/consumer channel.
pub const DEFAULT_QUEUE_CAPACITY: usize = 64;

/// Tunables for one producer/consumer pipeline run.
///
/// A full channel blocks the producer thread, so `queue_capacity` bounds the
/// memory held by shingles that have been produced but not yet matched.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Maximum shingle length in tokens.
    pub max_shingle_len: usize,
    /// Bounded channel capacity between producer and consumer.
    pub queue_capacity: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_shingle_len: DEFAULT_MAX_SHINGLE_LEN,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
        }
    }
}

impl PipelineConfig {
    /// Validate the configuration before starting a pipeline.
    pub fn validate(&self) -> Result<()> {
        if self.max_shingle_len == 0 {
            return Err(PhenotagError::InvalidArgument(
                "max_shingle_len must be at least 1".into(),
            ));
        }
        if self.queue_capacity == 0 {
            return Err(PhenotagError::InvalidArgument(
                "queue_capacity must be at least 1".into(),
            ));
        }
        Ok(())
    }
}
