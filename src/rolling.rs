// Melvin - emergent associative graph engine.
// Copyright (C) 2024-2025 Melvin Engine Team
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! Per-node rolling window over recent absolute weight (or degree) deltas,
//! and the local learning rate derived from it.
//!
//! Capacity starts at 1 (no global constant larger than that is ever
//! hard-coded) and doubles whenever the window fills without its median
//! having stabilized, so a node that is still changing fast keeps a
//! short memory and one that has settled keeps a longer one.

use std::collections::VecDeque;

use crate::stats::median;

#[derive(Debug, Clone)]
pub struct RollingWindow {
    capacity: usize,
    values: VecDeque<f32>,
    previous_median: Option<f32>,
}

impl Default for RollingWindow {
    fn default() -> Self {
        Self::new()
    }
}

impl RollingWindow {
    pub fn new() -> Self {
        Self {
            capacity: 1,
            values: VecDeque::with_capacity(1),
            previous_median: None,
        }
    }

    /// Push a new observation, evicting the oldest once the window is full.
    /// When a push fills the window, check whether the median has
    /// stabilized relative to the last time the window was full; if not,
    /// double the capacity.
    pub fn push(&mut self, value: f32) {
        if self.values.len() >= self.capacity {
            self.values.pop_front();
        }
        self.values.push_back(value);

        if self.values.len() == self.capacity {
            let current_median = self.median();
            let stable = match self.previous_median {
                None => false,
                Some(prev) if prev == 0.0 => current_median == 0.0,
                Some(prev) => ((current_median - prev).abs() / prev) < (prev / (prev + 1.0)),
            };
            self.previous_median = Some(current_median);
            if !stable {
                self.capacity *= 2;
            }
        }
    }

    pub fn median(&self) -> f32 {
        let values: Vec<f32> = self.values.iter().copied().collect();
        median(&values)
    }

    /// Local learning rate: `median / (median + 1)`, always in `[0, 1)`.
    pub fn learning_rate(&self) -> f32 {
        let m = self.median();
        m / (m + 1.0)
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_at_capacity_one() {
        let w = RollingWindow::new();
        assert_eq!(w.capacity(), 1);
        assert_eq!(w.learning_rate(), 0.0);
    }

    #[test]
    fn single_push_gives_nonzero_rate() {
        let mut w = RollingWindow::new();
        w.push(1.0);
        assert!((w.learning_rate() - 0.5).abs() < 1e-6);
    }

    #[test]
    fn doubles_capacity_while_medians_keep_shifting() {
        let mut w = RollingWindow::new();
        for v in [1.0, 4.0, 16.0, 64.0, 256.0] {
            w.push(v);
        }
        assert!(w.capacity() > 1);
    }

    #[test]
    fn capacity_settles_once_median_is_stable() {
        let mut w = RollingWindow::new();
        for _ in 0..20 {
            w.push(2.0);
        }
        let cap_before = w.capacity();
        w.push(2.0);
        assert_eq!(w.capacity(), cap_before);
    }
}
