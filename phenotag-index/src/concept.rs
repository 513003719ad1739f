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

//! Vocabulary concept records.

use serde::{Deserialize, Serialize};

/// One controlled-vocabulary concept.
///
/// `id` is the vocabulary-level identifier (e.g. an HPO curie such as
/// `HP:0000635`). The three text fields are the searchable surface of the
/// concept, in descending order of authority: label, synonyms, comment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConceptRecord {
    /// Vocabulary identifier.
    pub id: String,
    /// Primary human-readable label.
    pub label: String,
    /// Alternative names.
    #[serde(default)]
    pub synonyms: Vec<String>,
    /// Free-text description, if any.
    #[serde(default)]
    pub comment: Option<String>,
}

impl ConceptRecord {
    /// Create a record with just an id and a label.
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            synonyms: Vec::new(),
            comment: None,
        }
    }

    /// Builder-style synonym list.
    pub fn with_synonyms(mut self, synonyms: Vec<String>) -> Self {
        self.synonyms = synonyms;
        self
    }

    /// Builder-style comment.
    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }
}
