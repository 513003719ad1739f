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

//! Clause boundary detection.
//!
//! A token ends a grammatical clause when its text ends with sentence or
//! clause punctuation. Shingles never grow past such a token.

use regex::Regex;

/// Classifies token boundaries and normalizes boundary punctuation.
#[derive(Debug, Clone)]
pub struct ClauseSegmenter {
    boundary_re: Regex,
    strip_re: Regex,
    possessive_re: Regex,
}

impl Default for ClauseSegmenter {
    fn default() -> Self {
        Self::new()
    }
}

impl ClauseSegmenter {
    /// Create a segmenter with its patterns compiled.
    pub fn new() -> Self {
        Self {
            boundary_re: Regex::new(r#"[.!?,:;"'()]+$"#).unwrap(),
            strip_re: Regex::new(r#"^[.!?,:;"'()]*(.*?)[.!?,:;"'()]*$"#).unwrap(),
            possessive_re: Regex::new(r"'s").unwrap(),
        }
    }

    /// Whether the token ends a clause.
    ///
    /// Only trailing punctuation counts; `"(left` is not a boundary while
    /// `left)` is. Punctuation-only tokens are boundaries.
    pub fn is_boundary(&self, token_text: &str) -> bool {
        self.boundary_re.is_match(token_text)
    }

    /// Strip one layer of leading/trailing punctuation and rewrite the
    /// possessive `'s` to `s`.
    ///
    /// A punctuation-only token strips to the empty string.
    pub fn strip_boundary_punctuation(&self, token_text: &str) -> String {
        let stripped = self.strip_re.replace(token_text, "$1");
        self.possessive_re.replace_all(&stripped, "s").into_owned()
    }
}
