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

//! Embedded in-memory concept index.
//!
//! Scoring: each clause contributes its boost when it matches one of the
//! field's values (full-text clauses scale the boost by the fraction of
//! query words found). A record's raw score is the sum over clauses, then
//! normalized by the query's total boost, so scores land in [0, 1] and stay
//! comparable across queries. Hits come back in descending score order;
//! ties keep insertion order.

use std::cmp::Ordering;

use parking_lot::RwLock;
use tracing::debug;

use crate::concept::ConceptRecord;
use crate::query::{ConceptQuery, ConceptSearch, Field, QueryClause, ScoredHit, Vocabulary};
use phenotag_core::Result;

/// In-memory concept index and vocabulary.
///
/// Read queries take a shared lock, so one index may serve many annotation
/// requests concurrently.
#[derive(Default)]
pub struct MemoryConceptIndex {
    records: RwLock<Vec<ConceptRecord>>,
}

impl MemoryConceptIndex {
    /// An empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build an index from a record list.
    pub fn from_records(records: Vec<ConceptRecord>) -> Self {
        Self {
            records: RwLock::new(records),
        }
    }

    /// Add one record, returning its record reference.
    pub fn insert(&self, record: ConceptRecord) -> u64 {
        let mut records = self.records.write();
        records.push(record);
        (records.len() - 1) as u64
    }

    /// Number of indexed records.
    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    /// Whether the index holds no records.
    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }
}

impl ConceptSearch for MemoryConceptIndex {
    fn search(&self, query: &ConceptQuery, limit: usize) -> Result<Vec<ScoredHit>> {
        let total_boost = query.total_boost();
        if query.is_empty() || total_boost <= 0.0 {
            return Ok(Vec::new());
        }
        let records = self.records.read();
        let mut hits: Vec<ScoredHit> = Vec::new();
        for (idx, record) in records.iter().enumerate() {
            let raw: f32 = query
                .clauses()
                .iter()
                .map(|clause| clause_score(clause, record))
                .sum();
            if raw > 0.0 {
                hits.push(ScoredHit {
                    record_ref: idx as u64,
                    score: raw / total_boost,
                });
            }
        }
        // Stable sort keeps insertion order among equal scores.
        hits.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
        if hits.len() > limit {
            debug!(dropped = hits.len() - limit, limit, "truncating hit list");
            hits.truncate(limit);
        }
        Ok(hits)
    }
}

impl Vocabulary for MemoryConceptIndex {
    fn resolve(&self, record_ref: u64) -> Option<ConceptRecord> {
        let resolved = self.records.read().get(record_ref as usize).cloned();
        if resolved.is_none() {
            debug!(record_ref, "unknown record reference");
        }
        resolved
    }
}

fn field_values<'a>(record: &'a ConceptRecord, field: Field) -> Vec<&'a str> {
    match field {
        Field::Label => vec![record.label.as_str()],
        Field::Synonym => record.synonyms.iter().map(String::as_str).collect(),
        Field::Comment => record.comment.as_deref().into_iter().collect(),
    }
}

/// Contribution of one clause against one record: the best match over the
/// field's values.
fn clause_score(clause: &QueryClause, record: &ConceptRecord) -> f32 {
    match clause {
        QueryClause::Exact {
            field,
            phrase,
            boost,
        } => {
            let matched = field_values(record, *field)
                .iter()
                .any(|value| value.to_lowercase() == *phrase);
            if matched {
                *boost
            } else {
                0.0
            }
        }
        QueryClause::FuzzyPhrase {
            field,
            phrase,
            similarity,
            boost,
        } => {
            let words: Vec<&str> = phrase.split_whitespace().collect();
            let matched = field_values(record, *field)
                .iter()
                .any(|value| fuzzy_phrase_matches(&words, value, *similarity));
            if matched {
                *boost
            } else {
                0.0
            }
        }
        QueryClause::FullText { field, text, boost } => {
            let words: Vec<&str> = text.split_whitespace().collect();
            if words.is_empty() {
                return 0.0;
            }
            field_values(record, *field)
                .iter()
                .map(|value| {
                    let value_words = analyze_value(value);
                    let present = words
                        .iter()
                        .filter(|w| value_words.iter().any(|v| v.as_str() == **w))
                        .count();
                    boost * present as f32 / words.len() as f32
                })
                .fold(0.0, f32::max)
        }
    }
}

/// Lowercased field-value words with punctuation trimmed from the edges.
fn analyze_value(value: &str) -> Vec<String> {
    value
        .split_whitespace()
        .map(|w| {
            w.trim_matches(|c: char| !c.is_alphanumeric())
                .to_lowercase()
        })
        .filter(|w| !w.is_empty())
        .collect()
}

/// Whole-value fuzzy phrase match: same word count, words aligned in order,
/// each within its edit-distance budget.
fn fuzzy_phrase_matches(words: &[&str], value: &str, similarity: f32) -> bool {
    let value_words = analyze_value(value);
    if value_words.len() != words.len() || words.is_empty() {
        return false;
    }
    words.iter().zip(&value_words).all(|(query, field)| {
        let budget = max_edits(query, similarity);
        levenshtein(query, field) <= budget
    })
}

/// Edits allowed for a query word at the given similarity, following the
/// classic `floor(len * (1 - similarity))` fuzzy-term rule.
fn max_edits(word: &str, similarity: f32) -> usize {
    (word.chars().count() as f32 * (1.0 - similarity)).floor() as usize
}

fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }
    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut current = vec![0usize; b.len() + 1];
    for (i, ca) in a.iter().enumerate() {
        current[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let substitution = prev[j] + usize::from(ca != cb);
            current[j + 1] = substitution.min(prev[j + 1] + 1).min(current[j] + 1);
        }
        std::mem::swap(&mut prev, &mut current);
    }
    prev[b.len()]
}
