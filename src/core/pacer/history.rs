// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 itsakeyfut
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Bounded rolling history of frame timings

use super::FrameTiming;
use std::collections::VecDeque;
use std::time::Duration;

/// Age-ordered ring of the most recent [`FrameTiming`] records
///
/// Holds at most `capacity` entries; pushing into a full history evicts the
/// oldest entry first.
#[derive(Debug, Clone)]
pub struct FrameHistory {
    frames: VecDeque<FrameTiming>,
    capacity: usize,
}

impl FrameHistory {
    /// Create an empty history
    ///
    /// A capacity of 0 is raised to 1.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            frames: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append a record, evicting the oldest one when full
    pub fn push(&mut self, timing: FrameTiming) {
        if self.frames.len() == self.capacity {
            self.frames.pop_front();
        }
        self.frames.push_back(timing);
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.frames.clear();
    }

    /// Most recent record
    pub fn latest(&self) -> Option<&FrameTiming> {
        self.frames.back()
    }

    /// Records from oldest to newest
    pub fn iter(&self) -> impl Iterator<Item = &FrameTiming> {
        self.frames.iter()
    }

    /// Mean measured cost over the window
    pub fn average_cost(&self) -> Option<Duration> {
        if self.frames.is_empty() {
            return None;
        }
        let total: Duration = self.frames.iter().map(|f| f.cost).sum();
        Some(total / self.frames.len() as u32)
    }

    /// Number of records in the window that missed their deadline
    pub fn missed_count(&self) -> usize {
        self.frames.iter().filter(|f| f.missed).count()
    }
}
