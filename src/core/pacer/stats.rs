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

//! Frame rate statistics
//!
//! Tracks presented frame count, the interval between the two most recent
//! frames and an FPS figure recomputed roughly once per second.

use std::time::Duration;

/// FPS counter driven by frame submission timestamps
///
/// # Example
///
/// ```
/// use pacedloop::core::pacer::FrameStats;
/// use std::time::Duration;
///
/// let mut stats = FrameStats::new();
/// for i in 1..=61u64 {
///     stats.tick(Duration::from_micros(16_667 * i));
/// }
/// assert_eq!(stats.frame_count(), 61);
/// assert!((stats.fps() - 60.0).abs() < 1.0);
/// ```
#[derive(Debug, Clone, Default)]
pub struct FrameStats {
    /// Timestamp of the last frame
    last_frame: Option<Duration>,
    /// Total number of frames recorded
    frame_count: u64,
    /// Current FPS (frames per second)
    fps: f32,
    /// Interval between the last two frames in milliseconds
    frame_time_ms: f32,
    /// Start of the current FPS window
    fps_start: Option<Duration>,
    /// Frames since the FPS window started
    fps_frame_count: u64,
}

impl FrameStats {
    /// Create empty statistics
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a frame submitted at `now`
    ///
    /// FPS is recomputed once at least one second has passed since the
    /// current measurement window started.
    pub fn tick(&mut self, now: Duration) {
        if let Some(last) = self.last_frame {
            self.frame_time_ms = now.saturating_sub(last).as_secs_f32() * 1000.0;
        }

        self.frame_count += 1;

        match self.fps_start {
            None => {
                self.fps_start = Some(now);
                self.fps_frame_count = 0;
            }
            Some(start) => {
                self.fps_frame_count += 1;
                let fps_elapsed = now.saturating_sub(start);
                if fps_elapsed >= Duration::from_secs(1) {
                    self.fps = self.fps_frame_count as f32 / fps_elapsed.as_secs_f32();
                    self.fps_frame_count = 0;
                    self.fps_start = Some(now);
                }
            }
        }

        self.last_frame = Some(now);
    }

    /// Forget the measurement window (after a pause)
    ///
    /// The frame count is kept.
    pub fn restart_window(&mut self) {
        self.last_frame = None;
        self.fps_start = None;
        self.fps_frame_count = 0;
        self.fps = 0.0;
    }

    /// Most recent FPS figure, 0 until a full second has been measured
    #[inline(always)]
    pub fn fps(&self) -> f32 {
        self.fps
    }

    /// Interval between the two most recent frames in milliseconds
    #[inline(always)]
    pub fn frame_time_ms(&self) -> f32 {
        self.frame_time_ms
    }

    /// Total number of frames recorded
    #[inline(always)]
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }
}
