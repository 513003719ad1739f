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

//! Clause-bounded shingle production.
//!
//! A shingle is a contiguous window of 1..=N tokens that never spans a
//! clause boundary. The producer walks the token stream with a sliding
//! buffer on its own thread and publishes shingles to a bounded channel, so
//! the consumer can start matching early shingles while later tokens are
//! still being scanned, and a slow consumer applies backpressure instead of
//! growing memory.
//!
//! Emission order: whenever the buffer fills to N tokens or a boundary
//! token arrives, every prefix of the buffer is emitted, then the oldest
//! token is dropped. A boundary token pins the buffer, which keeps flushing
//! and shrinking until the boundary has been emitted alone; no later token
//! is consumed before that. Across a run every clause-bounded window of
//! every length 1..=N is emitted exactly once, in left-to-right order.

use std::collections::VecDeque;
use std::io::Read;
use std::thread::{self, JoinHandle};

use crossbeam_channel::{bounded, Receiver, SendError, Sender};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::clause::ClauseSegmenter;
use crate::config::PipelineConfig;
use crate::error::Result;
use crate::token::{Token, WhitespaceTokenizer};

/// An ordered run of contiguous tokens, at most one boundary token, always
/// last.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shingle {
    tokens: Vec<Token>,
}

impl Shingle {
    /// Wrap a non-empty token run. Only the producer constructs shingles,
    /// which keeps `start()`/`end()` total.
    pub(crate) fn new(tokens: Vec<Token>) -> Self {
        assert!(!tokens.is_empty(), "shingle must hold at least one token");
        Self { tokens }
    }

    /// The tokens of this shingle, in source order.
    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    /// Number of tokens.
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    /// Never true for a produced shingle.
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Character offset of the first token.
    pub fn start(&self) -> usize {
        self.tokens[0].start
    }

    /// Character offset one past the last token.
    pub fn end(&self) -> usize {
        self.tokens[self.tokens.len() - 1].end
    }
}

/// One message on the producer/consumer channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShingleEvent {
    /// A produced shingle.
    Shingle(Shingle),
    /// End of stream; nothing follows.
    End,
}

/// Factory for shingle streams.
#[derive(Debug, Clone, Default)]
pub struct ShinglePipeline {
    config: PipelineConfig,
    segmenter: ClauseSegmenter,
}

impl ShinglePipeline {
    /// Create a pipeline with the given configuration.
    pub fn new(config: PipelineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            segmenter: ClauseSegmenter::new(),
        })
    }

    /// Start producing shingles for `text` on a dedicated thread.
    pub fn start(&self, text: String) -> ShingleStream {
        let (tx, rx) = bounded(self.config.queue_capacity);
        let segmenter = self.segmenter.clone();
        let max_len = self.config.max_shingle_len;
        let handle = thread::Builder::new()
            .name("shingle-producer".into())
            .spawn(move || produce(&text, &segmenter, max_len, &tx))
            .expect("failed to spawn shingle producer thread");
        ShingleStream {
            rx: Some(rx),
            handle: Some(handle),
            done: false,
        }
    }

    /// Start producing shingles from an arbitrary reader.
    ///
    /// A read failure truncates the input to what was read so far; the
    /// shingles buffered up to that point and the end-of-stream marker are
    /// still delivered, so the consumer is never left blocked.
    pub fn start_reader<R>(&self, reader: R) -> ShingleStream
    where
        R: Read + Send + 'static,
    {
        let (tx, rx) = bounded(self.config.queue_capacity);
        let segmenter = self.segmenter.clone();
        let max_len = self.config.max_shingle_len;
        let handle = thread::Builder::new()
            .name("shingle-producer".into())
            .spawn(move || {
                let text = read_available(reader);
                produce(&text, &segmenter, max_len, &tx)
            })
            .expect("failed to spawn shingle producer thread");
        ShingleStream {
            rx: Some(rx),
            handle: Some(handle),
            done: false,
        }
    }
}

/// Consumer handle over a running producer.
///
/// Iterates shingles in FIFO emission order until the end-of-stream marker.
/// Dropping the stream early disconnects the channel, which unblocks and
/// terminates the producer thread.
pub struct ShingleStream {
    rx: Option<Receiver<ShingleEvent>>,
    handle: Option<JoinHandle<()>>,
    done: bool,
}

impl Iterator for ShingleStream {
    type Item = Shingle;

    fn next(&mut self) -> Option<Shingle> {
        if self.done {
            return None;
        }
        let rx = self.rx.as_ref()?;
        match rx.recv() {
            Ok(ShingleEvent::Shingle(shingle)) => Some(shingle),
            Ok(ShingleEvent::End) | Err(_) => {
                self.done = true;
                None
            }
        }
    }
}

impl Drop for ShingleStream {
    fn drop(&mut self) {
        // Disconnect first so a producer blocked on a full channel wakes up.
        drop(self.rx.take());
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

fn read_available<R: Read>(mut reader: R) -> String {
    let mut bytes = Vec::new();
    let mut buf = [0u8; 8192];
    loop {
        match reader.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => bytes.extend_from_slice(&buf[..n]),
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => {
                warn!(error = %e, "input read failed; truncating shingle stream");
                break;
            }
        }
    }
    String::from_utf8_lossy(&bytes).into_owned()
}

fn produce(text: &str, segmenter: &ClauseSegmenter, max_len: usize, tx: &Sender<ShingleEvent>) {
    let mut tokens = WhitespaceTokenizer::new(text).map(|t| {
        let boundary = segmenter.is_boundary(&t.text);
        t.flagged(boundary)
    });
    let mut buffer: VecDeque<Token> = VecDeque::with_capacity(max_len);
    let mut punctuation = false;
    loop {
        if !punctuation {
            match tokens.next() {
                Some(token) => {
                    punctuation = token.boundary;
                    buffer.push_back(token);
                    if !punctuation && buffer.len() < max_len {
                        // Fill the buffer before offering anything.
                        continue;
                    }
                }
                None => break,
            }
        }
        if flush_prefixes(&buffer, tx).is_err() {
            // Consumer went away; unwind without the end marker.
            return;
        }
        if punctuation || buffer.len() == max_len {
            buffer.pop_front();
        }
        if punctuation && buffer.is_empty() {
            punctuation = false;
        }
    }
    while !buffer.is_empty() {
        if flush_prefixes(&buffer, tx).is_err() {
            return;
        }
        buffer.pop_front();
    }
    let _ = tx.send(ShingleEvent::End);
}

/// Emit every prefix of the buffer as its own shingle, shortest first.
fn flush_prefixes(
    buffer: &VecDeque<Token>,
    tx: &Sender<ShingleEvent>,
) -> std::result::Result<(), SendError<ShingleEvent>> {
    let mut prefix = Vec::with_capacity(buffer.len());
    for token in buffer {
        prefix.push(token.clone());
        tx.send(ShingleEvent::Shingle(Shingle::new(prefix.clone())))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn shingles(text: &str, max_len: usize) -> Vec<Vec<String>> {
        let pipeline = ShinglePipeline::new(PipelineConfig {
            max_shingle_len: max_len,
            ..Default::default()
        })
        .unwrap();
        pipeline
            .start(text.to_string())
            .map(|s| s.tokens().iter().map(|t| t.text.clone()).collect())
            .collect()
    }

    #[test]
    fn empty_text_yields_no_shingles() {
        assert!(shingles("", 6).is_empty());
        assert!(shingles("   ", 6).is_empty());
    }

    #[test]
    fn single_token() {
        assert_eq!(shingles("eyes", 6), vec![vec!["eyes".to_string()]]);
    }

    #[test]
    fn every_window_of_every_length_without_boundaries() {
        // Five tokens, max length 6: all 15 contiguous windows, each once.
        let got = shingles("The lady has blue eyes", 6);
        assert_eq!(got.len(), 15);
        let blue = vec!["blue".to_string()];
        let blue_eyes = vec!["blue".to_string(), "eyes".to_string()];
        let full: Vec<String> = ["The", "lady", "has", "blue", "eyes"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert!(got.contains(&blue));
        assert!(got.contains(&blue_eyes));
        assert!(got.contains(&full));
        // No duplicates.
        let mut dedup = got.clone();
        dedup.sort();
        dedup.dedup();
        assert_eq!(dedup.len(), got.len());
    }

    #[test]
    fn sliding_window_caps_length() {
        let got = shingles("a b c d e", 3);
        assert!(got.iter().all(|s| s.len() <= 3));
        // 5 + 4 + 3 windows of lengths 1..=3.
        assert_eq!(got.len(), 12);
    }

    #[test]
    fn no_shingle_crosses_a_clause_boundary() {
        let got = shingles("Onset, at age five.", 6);
        for shingle in &got {
            let crossing = shingle
                .iter()
                .position(|t| t == "Onset,")
                .map(|i| i + 1 < shingle.len())
                .unwrap_or(false);
            assert!(!crossing, "shingle {shingle:?} crosses the comma");
        }
        assert!(got.contains(&vec!["Onset,".to_string()]));
        assert!(got.contains(&vec![
            "at".to_string(),
            "age".to_string(),
            "five.".to_string()
        ]));
    }

    #[test]
    fn boundary_token_emitted_alone() {
        let got = shingles("blue eyes.", 6);
        assert!(got.contains(&vec!["eyes.".to_string()]));
        assert!(got.contains(&vec!["blue".to_string(), "eyes.".to_string()]));
    }

    #[test]
    fn punctuation_only_text() {
        let got = shingles(". ! ?", 6);
        assert_eq!(
            got,
            vec![
                vec![".".to_string()],
                vec!["!".to_string()],
                vec!["?".to_string()]
            ]
        );
    }

    #[test]
    fn max_len_one_degenerates_to_single_tokens() {
        let got = shingles("a b c", 1);
        assert_eq!(
            got,
            vec![
                vec!["a".to_string()],
                vec!["b".to_string()],
                vec!["c".to_string()]
            ]
        );
    }

    #[test]
    fn produced_shingles_are_never_empty() {
        let pipeline = ShinglePipeline::new(PipelineConfig::default()).unwrap();
        for shingle in pipeline.start("Onset, at age five.".to_string()) {
            assert!(!shingle.is_empty());
            assert!(shingle.start() < shingle.end());
        }
    }

    #[test]
    fn restartable_and_deterministic() {
        let first = shingles("Onset, at age five. Blue eyes noted.", 4);
        let second = shingles("Onset, at age five. Blue eyes noted.", 4);
        assert_eq!(first, second);
    }

    #[test]
    fn dropping_stream_terminates_producer() {
        let pipeline = ShinglePipeline::new(PipelineConfig {
            max_shingle_len: 3,
            queue_capacity: 1,
        })
        .unwrap();
        let mut stream = pipeline.start("a b c d e f g h i j k l m n o p".to_string());
        // Consume one shingle, then drop; Drop joins the producer, which
        // must observe the disconnect instead of blocking forever.
        assert!(stream.next().is_some());
        drop(stream);
    }

    #[test]
    fn reader_failure_truncates_but_terminates() {
        struct FailingReader {
            fed: bool,
        }
        impl std::io::Read for FailingReader {
            fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
                if self.fed {
                    Err(std::io::Error::new(std::io::ErrorKind::Other, "stream broke"))
                } else {
                    self.fed = true;
                    let data = b"blue eyes ";
                    buf[..data.len()].copy_from_slice(data);
                    Ok(data.len())
                }
            }
        }
        let pipeline = ShinglePipeline::new(PipelineConfig::default()).unwrap();
        let got: Vec<_> = pipeline
            .start_reader(FailingReader { fed: false })
            .collect();
        // The two tokens read before the failure still produce shingles.
        assert_eq!(got.len(), 3);
    }

    proptest! {
        #[test]
        fn invariants_hold_for_arbitrary_text(
            text in "[a-z,. ]{0,60}",
            max_len in 1usize..6,
        ) {
            let pipeline = ShinglePipeline::new(PipelineConfig {
                max_shingle_len: max_len,
                ..Default::default()
            }).unwrap();
            let seg = ClauseSegmenter::new();
            let char_count = text.chars().count();
            for shingle in pipeline.start(text.clone()) {
                prop_assert!(shingle.len() <= max_len);
                prop_assert!(shingle.start() < shingle.end());
                prop_assert!(shingle.end() <= char_count);
                let boundaries = shingle
                    .tokens()
                    .iter()
                    .filter(|t| seg.is_boundary(&t.text))
                    .count();
                prop_assert!(boundaries <= 1);
                if boundaries == 1 {
                    prop_assert!(seg.is_boundary(&shingle.tokens().last().unwrap().text));
                }
                // Tokens are contiguous in source order.
                for pair in shingle.tokens().windows(2) {
                    prop_assert!(pair[0].end <= pair[1].start);
                }
            }
        }
    }
}
