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

//! The shingle consumer: drives the matcher over a shingle stream.

use serde::{Deserialize, Serialize};
use tracing::warn;

use phenotag_core::{ClauseSegmenter, PhenotagError, PipelineConfig, Result, Shingle, ShinglePipeline};

use crate::matcher::{ConceptHit, ConceptMatcher};

/// One annotated span: the top-scoring accepted concept for a shingle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Annotation {
    /// Character offset of the span start.
    pub start: usize,
    /// Character offset one past the span end.
    pub end: usize,
    /// Resolved vocabulary concept identifier.
    pub concept_id: String,
}

/// A span with its full confidence-ranked accepted hit list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpanMatch {
    /// Character offset of the span start.
    pub start: usize,
    /// Character offset one past the span end.
    pub end: usize,
    /// Accepted hits, highest score first.
    pub hits: Vec<ConceptHit>,
}

/// Annotates free text by matching every clause-bounded shingle against
/// the concept index.
///
/// Each call runs one producer thread paired with the calling thread as
/// the consumer; the annotator itself is stateless across calls and may be
/// shared.
pub struct Annotator {
    pipeline: ShinglePipeline,
    matcher: ConceptMatcher,
    segmenter: ClauseSegmenter,
}

impl Annotator {
    /// Create an annotator.
    pub fn new(matcher: ConceptMatcher, pipeline_config: PipelineConfig) -> Result<Self> {
        Ok(Self {
            pipeline: ShinglePipeline::new(pipeline_config)?,
            matcher,
            segmenter: ClauseSegmenter::new(),
        })
    }

    /// Annotate `text`, returning the top accepted concept per matching
    /// span, in shingle emission order.
    pub fn annotate(&self, text: &str) -> Result<Vec<Annotation>> {
        Ok(self
            .annotate_detailed(text)?
            .into_iter()
            .map(|m| Annotation {
                start: m.start,
                end: m.end,
                concept_id: m.hits[0].concept_id.clone(),
            })
            .collect())
    }

    /// Annotate `text`, keeping the full accepted hit list per span.
    ///
    /// Per-shingle match failures degrade to "no annotation for that
    /// shingle"; only an index that is unavailable before anything could
    /// be matched fails the whole request.
    pub fn annotate_detailed(&self, text: &str) -> Result<Vec<SpanMatch>> {
        let mut matches = Vec::new();
        let mut queries = 0usize;
        for shingle in self.pipeline.start(text.to_string()) {
            let phrase = self.phrase_of(&shingle);
            if phrase.is_empty() {
                continue;
            }
            queries += 1;
            match self.matcher.matches(&phrase) {
                Ok(hits) if !hits.is_empty() => matches.push(SpanMatch {
                    start: shingle.start(),
                    end: shingle.end(),
                    hits,
                }),
                Ok(_) => {}
                Err(e @ PhenotagError::IndexUnavailable(_)) if queries == 1 => {
                    // Nothing was processed at all; surface it.
                    return Err(e);
                }
                Err(e) => {
                    warn!(error = %e, %phrase, "concept match failed; skipping shingle")
                }
            }
        }
        Ok(matches)
    }

    /// Rebuild a shingle's phrase: every token normalized through boundary
    /// punctuation stripping, empties dropped, joined on single spaces.
    fn phrase_of(&self, shingle: &Shingle) -> String {
        let words: Vec<String> = shingle
            .tokens()
            .iter()
            .map(|t| self.segmenter.strip_boundary_punctuation(&t.text))
            .filter(|w| !w.is_empty())
            .collect();
        words.join(" ")
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use super::*;
    use crate::matcher::MatcherConfig;
    use phenotag_index::{
        ConceptQuery, ConceptRecord, ConceptSearch, MemoryConceptIndex, ScoredHit, Vocabulary,
    };

    fn annotator_over(records: Vec<ConceptRecord>) -> Annotator {
        let index = Arc::new(MemoryConceptIndex::from_records(records));
        let matcher = ConceptMatcher::new(index.clone(), index, MatcherConfig::default());
        Annotator::new(matcher, PipelineConfig::default()).unwrap()
    }

    fn sample_records() -> Vec<ConceptRecord> {
        vec![ConceptRecord::new("HP:0000635", "Blue irides")
            .with_synonyms(vec!["Blue eyes".to_string()])]
    }

    #[test]
    fn annotates_matching_span_with_offsets() {
        let annotator = annotator_over(sample_records());
        let text = "The lady has blue eyes";
        let annotations = annotator.annotate(text).unwrap();
        assert!(annotations
            .iter()
            .any(|a| a.concept_id == "HP:0000635" && &text[a.start..a.end] == "blue eyes"));
        for a in &annotations {
            assert!(a.start < a.end);
            assert!(a.end <= text.chars().count());
        }
    }

    #[test]
    fn empty_text_produces_no_annotations() {
        let annotator = annotator_over(sample_records());
        assert!(annotator.annotate("").unwrap().is_empty());
    }

    #[test]
    fn boundary_punctuation_is_stripped_from_phrases() {
        let annotator = annotator_over(sample_records());
        // The period must not stop "blue eyes." from matching.
        let annotations = annotator.annotate("Has blue eyes.").unwrap();
        assert!(annotations.iter().any(|a| a.concept_id == "HP:0000635"));
    }

    #[test]
    fn detailed_matches_carry_ranked_hits() {
        let annotator = annotator_over(sample_records());
        let matches = annotator.annotate_detailed("blue eyes").unwrap();
        assert!(!matches.is_empty());
        for m in &matches {
            assert!(!m.hits.is_empty());
            for pair in m.hits.windows(2) {
                assert!(pair[0].score >= pair[1].score);
            }
        }
    }

    #[test]
    fn one_failing_shingle_does_not_abort_the_rest() {
        // Fails exactly one phrase; every other shingle still matches.
        struct FlakyIndex {
            inner: Arc<MemoryConceptIndex>,
            calls: AtomicUsize,
        }
        impl ConceptSearch for FlakyIndex {
            fn search(&self, query: &ConceptQuery, limit: usize) -> Result<Vec<ScoredHit>> {
                if self.calls.fetch_add(1, Ordering::SeqCst) == 2 {
                    return Err(PhenotagError::Search("simulated query failure".into()));
                }
                self.inner.search(query, limit)
            }
        }
        let inner = Arc::new(MemoryConceptIndex::from_records(sample_records()));
        let index = Arc::new(FlakyIndex {
            inner: inner.clone(),
            calls: AtomicUsize::new(0),
        });
        let matcher = ConceptMatcher::new(index, inner, MatcherConfig::default());
        let annotator = Annotator::new(matcher, PipelineConfig::default()).unwrap();
        let annotations = annotator.annotate("The lady has blue eyes").unwrap();
        assert!(annotations.iter().any(|a| a.concept_id == "HP:0000635"));
    }

    #[test]
    fn index_unavailable_on_first_query_fails_the_request() {
        struct DeadIndex;
        impl ConceptSearch for DeadIndex {
            fn search(&self, _query: &ConceptQuery, _limit: usize) -> Result<Vec<ScoredHit>> {
                Err(PhenotagError::IndexUnavailable("connection refused".into()))
            }
        }
        struct NoVocabulary;
        impl Vocabulary for NoVocabulary {
            fn resolve(&self, _record_ref: u64) -> Option<ConceptRecord> {
                None
            }
        }
        let matcher = ConceptMatcher::new(
            Arc::new(DeadIndex),
            Arc::new(NoVocabulary),
            MatcherConfig::default(),
        );
        let annotator = Annotator::new(matcher, PipelineConfig::default()).unwrap();
        assert!(matches!(
            annotator.annotate("blue eyes"),
            Err(PhenotagError::IndexUnavailable(_))
        ));
    }
}
