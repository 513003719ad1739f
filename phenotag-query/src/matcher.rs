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

//! Weighted multi-field fuzzy concept matching.
//!
//! For every searchable field the matcher emits an exact clause, a fuzzy
//! positional phrase clause, and a plain full-text clause, with boosts
//! descending both across fields (label > synonym > comment) and within a
//! field (exact > fuzzy > full text). The full-text boost shrinks for
//! single-word phrases: a lone "slow" or "abnormality" matches far too many
//! concepts to be trusted on its own.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use phenotag_core::Result;
use phenotag_index::{ConceptQuery, ConceptSearch, Field, QueryClause, Vocabulary};

use crate::threshold::AdaptiveThreshold;

/// Boost schedule and acceptance constants for the matcher.
///
/// These were global constants in earlier revisions; they are plain
/// configuration now so deployments can retune fields independently.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatcherConfig {
    /// Per-word fuzzy similarity, 0..=1.
    pub similarity: f32,
    /// Starting acceptance threshold.
    pub base_threshold: f32,
    /// Threshold increment; its divisor doubles per accepted hit.
    pub threshold_increment: f32,
    /// Maximum hits requested from the index per query.
    pub hit_limit: usize,
    /// Exact whole-label match.
    pub label_exact_boost: f32,
    /// Fuzzy phrase over the label.
    pub label_fuzzy_boost: f32,
    /// Cap for the length-scaled label full-text boost.
    pub label_text_cap: f32,
    /// Exact whole-synonym match.
    pub synonym_exact_boost: f32,
    /// Fuzzy phrase over synonyms.
    pub synonym_fuzzy_boost: f32,
    /// Cap for the length-scaled synonym full-text boost.
    pub synonym_text_cap: f32,
    /// Fuzzy phrase over the comment.
    pub comment_fuzzy_boost: f32,
    /// Flat comment full-text boost.
    pub comment_text_boost: f32,
    /// Full-text length scale for single-word phrases.
    pub single_word_score: f32,
    /// Full-text length scale for multi-word phrases.
    pub multi_word_score: f32,
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self {
            similarity: 0.7,
            base_threshold: 0.15,
            threshold_increment: 0.8,
            hit_limit: 50,
            label_exact_boost: 100.0,
            label_fuzzy_boost: 36.0,
            label_text_cap: 20.0,
            synonym_exact_boost: 70.0,
            synonym_fuzzy_boost: 25.0,
            synonym_text_cap: 15.0,
            comment_fuzzy_boost: 5.0,
            comment_text_boost: 3.0,
            single_word_score: 0.5,
            multi_word_score: 1.4,
        }
    }
}

/// A confidence-ranked concept match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConceptHit {
    /// Resolved vocabulary concept identifier.
    pub concept_id: String,
    /// Score reported by the index, larger is better.
    pub score: f32,
}

/// Ranks vocabulary concepts by relevance to a phrase.
///
/// Stateless per call; the index handle is read-only and may be shared
/// across concurrent requests.
pub struct ConceptMatcher {
    index: Arc<dyn ConceptSearch>,
    vocabulary: Arc<dyn Vocabulary>,
    config: MatcherConfig,
}

impl ConceptMatcher {
    /// Create a matcher over the given index and vocabulary.
    pub fn new(
        index: Arc<dyn ConceptSearch>,
        vocabulary: Arc<dyn Vocabulary>,
        config: MatcherConfig,
    ) -> Self {
        Self {
            index,
            vocabulary,
            config,
        }
    }

    /// Rank concepts for `phrase`, highest score first, applying the
    /// adaptive acceptance threshold.
    pub fn matches(&self, phrase: &str) -> Result<Vec<ConceptHit>> {
        let phrase = phrase.trim().to_lowercase();
        if phrase.is_empty() {
            return Ok(Vec::new());
        }
        let query = self.build_query(&phrase);
        if query.is_empty() {
            debug!(%phrase, "no usable query clause for phrase");
            return Ok(Vec::new());
        }
        let hits = self.index.search(&query, self.config.hit_limit)?;

        let mut threshold = AdaptiveThreshold::new(
            self.config.base_threshold,
            self.config.threshold_increment,
        );
        let mut accepted = Vec::new();
        for hit in hits {
            if !threshold.accepts(hit.score) {
                // Hits are pre-sorted by score; nothing later can clear
                // the cutoff either.
                break;
            }
            match self.vocabulary.resolve(hit.record_ref) {
                Some(concept) => accepted.push(ConceptHit {
                    concept_id: concept.id,
                    score: hit.score,
                }),
                None => {
                    debug!(record_ref = hit.record_ref, "dropping unresolvable hit")
                }
            }
            threshold.record_acceptance();
        }
        Ok(accepted)
    }

    /// Assemble the composite query for a lowercased phrase. Clauses that
    /// fail validation are logged and left out.
    fn build_query(&self, phrase: &str) -> ConceptQuery {
        let cfg = &self.config;
        let word_count = phrase.split_whitespace().count();
        let word_count_score = if word_count == 1 {
            cfg.single_word_score
        } else {
            cfg.multi_word_score
        };
        let chars = phrase.chars().count() as f32;
        let label_text_boost = ((chars - 1.0) * word_count_score).min(cfg.label_text_cap);
        let synonym_text_boost =
            ((chars - 2.0) * (word_count_score - 0.2)).min(cfg.synonym_text_cap);

        let mut query = ConceptQuery::new();
        push_clause(
            &mut query,
            QueryClause::exact(Field::Label, phrase, cfg.label_exact_boost),
        );
        push_clause(
            &mut query,
            QueryClause::fuzzy_phrase(Field::Label, phrase, cfg.similarity, cfg.label_fuzzy_boost),
        );
        push_clause(
            &mut query,
            QueryClause::full_text(Field::Label, phrase, label_text_boost),
        );
        push_clause(
            &mut query,
            QueryClause::exact(Field::Synonym, phrase, cfg.synonym_exact_boost),
        );
        push_clause(
            &mut query,
            QueryClause::fuzzy_phrase(
                Field::Synonym,
                phrase,
                cfg.similarity,
                cfg.synonym_fuzzy_boost,
            ),
        );
        push_clause(
            &mut query,
            QueryClause::full_text(Field::Synonym, phrase, synonym_text_boost),
        );
        push_clause(
            &mut query,
            QueryClause::fuzzy_phrase(
                Field::Comment,
                phrase,
                cfg.similarity,
                cfg.comment_fuzzy_boost,
            ),
        );
        push_clause(
            &mut query,
            QueryClause::full_text(Field::Comment, phrase, cfg.comment_text_boost),
        );
        query
    }
}

fn push_clause(query: &mut ConceptQuery, clause: Result<QueryClause>) {
    match clause {
        Ok(clause) => query.push(clause),
        Err(e) => debug!(error = %e, "omitting malformed query clause"),
    }
}
