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

//! Phenotag Index
//!
//! The concept data model, the weighted multi-field query model, and an
//! embedded in-memory concept index.

pub mod concept;
pub mod memory;
pub mod query;

pub use concept::ConceptRecord;
pub use memory::MemoryConceptIndex;
pub use query::{ConceptQuery, ConceptSearch, Field, QueryClause, ScoredHit, Vocabulary};
