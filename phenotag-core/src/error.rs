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

//! Error types shared across the Phenotag crates.

use thiserror::Error;

/// Errors produced by the annotation pipeline and concept matching.
#[derive(Debug, Error)]
pub enum PhenotagError {
    /// I/O failure while reading the input text stream.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A query clause could not be built from the given literal.
    #[error("invalid query clause: {0}")]
    QueryBuild(String),

    /// Query execution against the concept index failed.
    #[error("concept search failed: {0}")]
    Search(String),

    /// The concept index cannot be reached at all.
    #[error("concept index unavailable: {0}")]
    IndexUnavailable(String),

    /// A caller-supplied argument was out of range or malformed.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

/// Result alias used throughout the workspace.
pub type Result<T> = std::result::Result<T, PhenotagError>;
