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

//! Adaptive hit acceptance threshold.
//!
//! A phrase with many strong matches should return only the good ones,
//! while a phrase with a single authoritative hit near the floor should
//! still return it. The cutoff therefore starts low and rises after every
//! acceptance, by an increment whose divisor doubles each time, so the
//! climb flattens as more hits are let through. This only works because
//! hits arrive sorted by descending score.

/// Monotonically non-decreasing acceptance cutoff for one match call.
#[derive(Debug, Clone)]
pub struct AdaptiveThreshold {
    threshold: f32,
    increment: f32,
    divisor: u32,
}

impl AdaptiveThreshold {
    /// Start at `base`, rising by `increment / divisor` per acceptance.
    pub fn new(base: f32, increment: f32) -> Self {
        Self {
            threshold: base,
            increment,
            divisor: 2,
        }
    }

    /// The current cutoff.
    pub fn current(&self) -> f32 {
        self.threshold
    }

    /// Whether a hit with this score clears the current cutoff.
    pub fn accepts(&self, score: f32) -> bool {
        score >= self.threshold
    }

    /// Raise the cutoff after accepting a hit.
    pub fn record_acceptance(&mut self) {
        self.threshold += self.increment / self.divisor as f32;
        self.divisor = self.divisor.saturating_mul(2);
    }
}
