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

//! The composite weighted query model and the index trait seams.
//!
//! A `ConceptQuery` is a disjunction of boosted clauses over named text
//! fields. Clause constructors validate their literals up front so a
//! malformed clause can be skipped by the caller instead of failing the
//! whole query.

use phenotag_core::{PhenotagError, Result};
use serde::{Deserialize, Serialize};

use crate::concept::ConceptRecord;

/// Searchable text fields of a concept, in descending order of authority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Field {
    /// Primary label.
    Label,
    /// Synonym list.
    Synonym,
    /// Free-text comment.
    Comment,
}

/// One boosted clause of a composite query.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryClause {
    /// The phrase must equal the whole field value (case-insensitive).
    Exact {
        field: Field,
        phrase: String,
        boost: f32,
    },
    /// Every word must match the corresponding field-value word within
    /// edit-distance tolerance, in order, spanning the whole value.
    FuzzyPhrase {
        field: Field,
        phrase: String,
        similarity: f32,
        boost: f32,
    },
    /// Plain full-text match; scores by the fraction of query words
    /// present in the field.
    FullText {
        field: Field,
        text: String,
        boost: f32,
    },
}

fn validate_literal(literal: &str) -> Result<()> {
    if literal.trim().is_empty() {
        return Err(PhenotagError::QueryBuild("empty query literal".into()));
    }
    Ok(())
}

fn validate_boost(boost: f32) -> Result<()> {
    if !boost.is_finite() || boost < 0.0 {
        return Err(PhenotagError::QueryBuild(format!(
            "boost must be a non-negative finite number, got {boost}"
        )));
    }
    Ok(())
}

impl QueryClause {
    /// Build an exact whole-value clause. The literal is lowercased so
    /// matching stays case-insensitive regardless of the caller.
    pub fn exact(field: Field, phrase: &str, boost: f32) -> Result<Self> {
        validate_literal(phrase)?;
        validate_boost(boost)?;
        Ok(Self::Exact {
            field,
            phrase: phrase.to_lowercase(),
            boost,
        })
    }

    /// Build a fuzzy positional phrase clause. The literal is lowercased.
    pub fn fuzzy_phrase(field: Field, phrase: &str, similarity: f32, boost: f32) -> Result<Self> {
        validate_literal(phrase)?;
        validate_boost(boost)?;
        if !(0.0..=1.0).contains(&similarity) {
            return Err(PhenotagError::QueryBuild(format!(
                "similarity must be within [0, 1], got {similarity}"
            )));
        }
        Ok(Self::FuzzyPhrase {
            field,
            phrase: phrase.to_lowercase(),
            similarity,
            boost,
        })
    }

    /// Build a plain full-text clause. The literal is lowercased.
    pub fn full_text(field: Field, text: &str, boost: f32) -> Result<Self> {
        validate_literal(text)?;
        validate_boost(boost)?;
        Ok(Self::FullText {
            field,
            text: text.to_lowercase(),
            boost,
        })
    }

    /// The clause's boost weight.
    pub fn boost(&self) -> f32 {
        match self {
            Self::Exact { boost, .. }
            | Self::FuzzyPhrase { boost, .. }
            | Self::FullText { boost, .. } => *boost,
        }
    }
}

/// A composite scored query: the union of its clauses.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConceptQuery {
    clauses: Vec<QueryClause>,
}

impl ConceptQuery {
    /// An empty query.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a clause.
    pub fn push(&mut self, clause: QueryClause) {
        self.clauses.push(clause);
    }

    /// The clauses in insertion order.
    pub fn clauses(&self) -> &[QueryClause] {
        &self.clauses
    }

    /// Whether no clause was added.
    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    /// Sum of all clause boosts; the score normalizer.
    pub fn total_boost(&self) -> f32 {
        self.clauses.iter().map(QueryClause::boost).sum()
    }
}

/// A scored hit returned by a concept index.
///
/// `record_ref` is an index-level reference, resolved to a vocabulary
/// concept through [`Vocabulary::resolve`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredHit {
    /// Opaque index record reference.
    pub record_ref: u64,
    /// Non-negative relevance score, larger is better.
    pub score: f32,
}

/// Scored, multi-field boolean search over concept records.
///
/// Implementations return hits in descending score order, ties kept in a
/// stable order, within a single logical read.
pub trait ConceptSearch: Send + Sync {
    /// Execute `query`, returning at most `limit` hits.
    fn search(&self, query: &ConceptQuery, limit: usize) -> Result<Vec<ScoredHit>>;
}

/// Resolution of index record references to vocabulary concepts.
pub trait Vocabulary: Send + Sync {
    /// Look up a record reference; `None` when unknown.
    fn resolve(&self, record_ref: u64) -> Option<ConceptRecord>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_literal_rejected() {
        assert!(QueryClause::exact(Field::Label, "", 1.0).is_err());
        assert!(QueryClause::full_text(Field::Comment, "   ", 1.0).is_err());
    }

    #[test]
    fn bad_boost_rejected() {
        assert!(QueryClause::exact(Field::Label, "blue eyes", f32::NAN).is_err());
        assert!(QueryClause::exact(Field::Label, "blue eyes", -1.0).is_err());
        assert!(QueryClause::exact(Field::Label, "blue eyes", f32::INFINITY).is_err());
    }

    #[test]
    fn similarity_out_of_range_rejected() {
        assert!(QueryClause::fuzzy_phrase(Field::Label, "blue eyes", 1.5, 1.0).is_err());
        assert!(QueryClause::fuzzy_phrase(Field::Label, "blue eyes", -0.1, 1.0).is_err());
    }

    #[test]
    fn literals_are_lowercased_at_construction() {
        let clause = QueryClause::exact(Field::Synonym, "Blue Eyes", 10.0).unwrap();
        assert_eq!(
            clause,
            QueryClause::Exact {
                field: Field::Synonym,
                phrase: "blue eyes".to_string(),
                boost: 10.0,
            }
        );
        let clause = QueryClause::full_text(Field::Label, "Blue", 1.0).unwrap();
        match clause {
            QueryClause::FullText { text, .. } => assert_eq!(text, "blue"),
            other => panic!("unexpected clause {other:?}"),
        }
    }

    #[test]
    fn total_boost_sums_clauses() {
        let mut query = ConceptQuery::new();
        query.push(QueryClause::exact(Field::Label, "blue eyes", 100.0).unwrap());
        query.push(QueryClause::full_text(Field::Label, "blue eyes", 20.0).unwrap());
        assert_eq!(query.total_boost(), 120.0);
        assert_eq!(query.clauses().len(), 2);
    }
}
