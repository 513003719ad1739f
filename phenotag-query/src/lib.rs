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

//! Phenotag Query
//!
//! The weighted multi-field fuzzy concept matcher and the annotator driver
//! that turns a shingle stream into annotations.

pub mod annotator;
pub mod matcher;
pub mod threshold;

pub use annotator::{Annotation, Annotator, SpanMatch};
pub use matcher::{ConceptHit, ConceptMatcher, MatcherConfig};
pub use threshold::AdaptiveThreshold;
