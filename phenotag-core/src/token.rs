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

//! Whitespace tokenization with character offsets.

use serde::{Deserialize, Serialize};

/// A single whitespace-delimited token.
///
/// `start`/`end` are character offsets into the original input, half-open
/// `[start, end)`. The `boundary` flag is assigned by the clause segmenter;
/// the tokenizer itself never interprets punctuation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    /// Raw token text, punctuation included.
    pub text: String,
    /// Character offset of the first character.
    pub start: usize,
    /// Character offset one past the last character.
    pub end: usize,
    /// Whether this token ends a grammatical clause.
    pub boundary: bool,
}

impl Token {
    /// Create a token with the boundary flag unset.
    pub fn new(text: impl Into<String>, start: usize, end: usize) -> Self {
        Self {
            text: text.into(),
            start,
            end,
            boundary: false,
        }
    }

    /// Return the same token with the boundary flag set as given.
    pub fn flagged(mut self, boundary: bool) -> Self {
        self.boundary = boundary;
        self
    }
}

/// Iterator splitting text on whitespace, tracking character offsets.
pub struct WhitespaceTokenizer<'a> {
    chars: std::str::Chars<'a>,
    pos: usize,
}

impl<'a> WhitespaceTokenizer<'a> {
    /// Tokenize `text` from the beginning.
    pub fn new(text: &'a str) -> Self {
        Self {
            chars: text.chars(),
            pos: 0,
        }
    }
}

impl Iterator for WhitespaceTokenizer<'_> {
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        let mut start = self.pos;
        let mut current = String::new();
        for c in self.chars.by_ref() {
            self.pos += 1;
            if c.is_whitespace() {
                if current.is_empty() {
                    start = self.pos;
                    continue;
                }
                return Some(Token::new(current, start, self.pos - 1));
            }
            current.push(c);
        }
        if current.is_empty() {
            None
        } else {
            Some(Token::new(current, start, self.pos))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(text: &str) -> Vec<Token> {
        WhitespaceTokenizer::new(text).collect()
    }

    #[test]
    fn simple_split_with_offsets() {
        let toks = tokens("The lady has blue eyes");
        assert_eq!(toks.len(), 5);
        assert_eq!(toks[0], Token::new("The", 0, 3));
        assert_eq!(toks[3], Token::new("blue", 13, 17));
        assert_eq!(toks[4], Token::new("eyes", 18, 22));
    }

    #[test]
    fn empty_and_whitespace_only() {
        assert!(tokens("").is_empty());
        assert!(tokens("   \t\n ").is_empty());
    }

    #[test]
    fn leading_trailing_and_repeated_whitespace() {
        let toks = tokens("  a  bb ");
        assert_eq!(toks, vec![Token::new("a", 2, 3), Token::new("bb", 5, 7)]);
    }

    #[test]
    fn offsets_count_chars_not_bytes() {
        // "é" is two bytes but one character.
        let toks = tokens("é b");
        assert_eq!(toks[0], Token::new("é", 0, 1));
        assert_eq!(toks[1], Token::new("b", 2, 3));
    }

    #[test]
    fn punctuation_stays_attached() {
        let toks = tokens("Onset, at age five.");
        assert_eq!(toks[0].text, "Onset,");
        assert_eq!(toks[3].text, "five.");
    }
}
