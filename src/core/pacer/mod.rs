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

//! Frame pacing
//!
//! The [`FramePacer`] decides how many display refresh periods elapse between
//! presented frames (the *swap interval*) and reports whether the previous
//! frame met its deadline.
//!
//! ## Algorithm
//!
//! - An exponentially-weighted estimate of per-frame CPU+GPU cost is kept.
//!   The first measured sample seeds it; later samples are blended in with
//!   weight [`PacerConfig::smoothing`] (0.2 by default).
//! - Before any sample exists the nominal refresh period is the estimate, so
//!   the first frame (and the first frame after [`FramePacer::reset`]) paces
//!   at 1x.
//! - `swap_interval = ceil(estimate / refresh)`, clamped to
//!   `1..=max_swap_interval`. A frame costing 2.5 refresh periods is paced at
//!   3x, never 2x.
//! - Each frame owns a vsync slot, its intended present. The next frame is
//!   due at that slot, with a wake-up tolerance of `refresh / 16`. A frame
//!   starting within half a refresh of its slot is anchored to the slot, so
//!   a renderer that never blocks in present still renders once per
//!   `swap_interval` refreshes. A later start re-anchors at the start time.
//!
//! ## Degraded mode
//!
//! When the renderer reports no actual present time for
//! [`PacerConfig::degrade_after_frames`] consecutive frames, swap-timing
//! feedback is considered unavailable: the pacer logs a warning once, raises
//! its degraded flag and pins pacing at 1x nominal refresh. This is never an
//! error for the caller.

mod history;
mod stats;
#[cfg(test)]
mod tests;

pub use history::FrameHistory;
pub use stats::FrameStats;

use crate::core::error::{CoreError, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Fraction of a refresh period a frame may start ahead of its slot
const WAKE_TOLERANCE_DIVISOR: u32 = 16;

/// Frame pacer settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PacerConfig {
    /// Nominal display refresh rate
    pub refresh_rate_hz: f64,
    /// Weight of a new cost sample in the moving estimate
    pub smoothing: f64,
    /// Number of frames kept in the rolling history
    pub history_len: usize,
    /// Largest swap interval the pacer may choose
    pub max_swap_interval: u32,
    /// Consecutive frames without present feedback before degraded mode
    pub degrade_after_frames: u32,
    /// Pace against vsync; when false every tick renders
    pub vsync: bool,
}

impl Default for PacerConfig {
    fn default() -> Self {
        Self {
            refresh_rate_hz: 60.0,
            smoothing: 0.2,
            history_len: 32,
            max_swap_interval: 4,
            degrade_after_frames: 3,
            vsync: true,
        }
    }
}

impl PacerConfig {
    /// Nominal refresh period
    pub fn refresh_period(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.refresh_rate_hz)
    }

    /// Check value ranges
    ///
    /// # Errors
    ///
    /// [`CoreError::Config`] naming the first offending field.
    pub fn validate(&self) -> Result<()> {
        if !(self.refresh_rate_hz.is_finite() && self.refresh_rate_hz > 0.0) {
            return Err(CoreError::Config(format!(
                "pacer.refresh_rate_hz must be > 0, got {}",
                self.refresh_rate_hz
            )));
        }
        if !(self.smoothing > 0.0 && self.smoothing <= 1.0) {
            return Err(CoreError::Config(format!(
                "pacer.smoothing must be in (0, 1], got {}",
                self.smoothing
            )));
        }
        if self.history_len == 0 {
            return Err(CoreError::Config("pacer.history_len must be > 0".into()));
        }
        if self.max_swap_interval == 0 {
            return Err(CoreError::Config(
                "pacer.max_swap_interval must be > 0".into(),
            ));
        }
        Ok(())
    }
}

/// Pacing decision for one frame, produced by [`FramePacer::begin_frame`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FramePlan {
    /// 1-based frame counter
    pub frame_index: u64,
    /// When the frame started
    pub frame_start: Duration,
    /// Refresh periods this frame is allowed to take
    pub swap_interval: u32,
    /// `swap_interval` refresh periods
    pub target_interval: Duration,
    /// Intended presentation timestamp
    pub intended_present: Duration,
    /// Whether the previous frame missed its deadline
    pub previous_missed: bool,
}

/// Post-submission observations for one frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PresentFeedback {
    /// When the frame was submitted
    pub submitted_at: Duration,
    /// GPU execution time, if the renderer measured it
    pub gpu_time: Option<Duration>,
    /// When the frame reached the display, if the platform reported it
    pub actual_present: Option<Duration>,
}

/// Per-frame timing record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameTiming {
    pub frame_index: u64,
    pub frame_start: Duration,
    /// Intended presentation timestamp
    pub intended_present: Duration,
    /// Actual submission timestamp
    pub submitted_at: Duration,
    /// Measured CPU+GPU duration
    pub cost: Duration,
    /// Actual presentation timestamp, if reported
    pub actual_present: Option<Duration>,
    pub swap_interval: u32,
    /// Whether the frame missed its intended presentation
    pub missed: bool,
}

/// Pacer state for diagnostics
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct PacerStatus {
    pub swap_interval: u32,
    pub estimated_cost_ms: f64,
    /// Mean cost over the rolling history, 0 when empty
    pub average_cost_ms: f64,
    /// Missed deadlines within the rolling history
    pub recent_missed: usize,
    pub degraded: bool,
    pub frames_rendered: u64,
    pub ticks_skipped: u64,
    pub missed_deadlines: u64,
    pub fps: f32,
}

/// Exponentially-weighted cost estimate
#[derive(Debug, Clone)]
struct CostEstimator {
    estimate: Option<Duration>,
    weight: f64,
}

impl CostEstimator {
    fn new(weight: f64) -> Self {
        Self {
            estimate: None,
            weight,
        }
    }

    fn observe(&mut self, sample: Duration) {
        self.estimate = Some(match self.estimate {
            None => sample,
            Some(prev) => {
                let blended = prev.as_nanos() as f64 * (1.0 - self.weight)
                    + sample.as_nanos() as f64 * self.weight;
                Duration::from_nanos(blended.round() as u64)
            }
        });
    }

    fn reset(&mut self) {
        self.estimate = None;
    }
}

/// Adaptive frame pacer
///
/// # Example
///
/// ```
/// use pacedloop::core::pacer::{FramePacer, PacerConfig, PresentFeedback};
/// use std::time::Duration;
///
/// let mut pacer = FramePacer::new(PacerConfig::default());
/// let refresh = pacer.refresh_period();
///
/// let plan = pacer.begin_frame(Duration::ZERO);
/// assert_eq!(plan.swap_interval, 1);
///
/// // The frame took 2.5 refresh periods
/// let cost = refresh * 5 / 2;
/// pacer.end_frame(&plan, PresentFeedback {
///     submitted_at: cost,
///     gpu_time: None,
///     actual_present: Some(cost + refresh),
/// });
/// assert_eq!(pacer.swap_interval(), 3);
/// ```
#[derive(Debug, Clone)]
pub struct FramePacer {
    config: PacerConfig,
    refresh: Duration,
    estimator: CostEstimator,
    history: FrameHistory,
    stats: FrameStats,
    swap_interval: u32,
    /// Intended present of the previous frame
    next_slot: Option<Duration>,
    frame_index: u64,
    previous_missed: bool,
    missing_feedback: u32,
    degraded: bool,
    ticks_skipped: u64,
    missed_total: u64,
}

impl FramePacer {
    /// Create a pacer
    pub fn new(config: PacerConfig) -> Self {
        let refresh = config.refresh_period();
        Self {
            refresh,
            estimator: CostEstimator::new(config.smoothing),
            history: FrameHistory::new(config.history_len),
            stats: FrameStats::new(),
            swap_interval: 1,
            next_slot: None,
            frame_index: 0,
            previous_missed: false,
            missing_feedback: 0,
            degraded: false,
            ticks_skipped: 0,
            missed_total: 0,
            config,
        }
    }

    /// Nominal refresh period
    #[inline(always)]
    pub fn refresh_period(&self) -> Duration {
        self.refresh
    }

    /// Swap interval the next frame will use
    pub fn swap_interval(&self) -> u32 {
        if self.degraded || !self.config.vsync {
            1
        } else {
            self.swap_interval
        }
    }

    /// Time the next frame is allowed to take
    pub fn target_interval(&self) -> Duration {
        self.refresh * self.swap_interval()
    }

    /// Current cost estimate (nominal refresh before any sample)
    pub fn estimated_cost(&self) -> Duration {
        self.estimator.estimate.unwrap_or(self.refresh)
    }

    /// Earliest time the next frame is due, `None` if due now
    pub fn next_due(&self) -> Option<Duration> {
        if !self.config.vsync {
            return None;
        }
        let slot = self.next_slot?;
        Some(slot.saturating_sub(self.refresh / WAKE_TOLERANCE_DIVISOR))
    }

    /// Whether a frame should be rendered at `now`
    pub fn should_render(&self, now: Duration) -> bool {
        match self.next_due() {
            None => true,
            Some(due) => now >= due,
        }
    }

    /// Count a tick that did not render because no frame was due
    pub fn skip_tick(&mut self) {
        self.ticks_skipped += 1;
    }

    /// Start a frame at `now`
    ///
    /// The intended present is `swap_interval` refreshes after the frame's
    /// slot: the previous intended present when `now` is within half a
    /// refresh of it, else `now`.
    pub fn begin_frame(&mut self, now: Duration) -> FramePlan {
        let swap_interval = self.swap_interval();
        let target_interval = self.refresh * swap_interval;
        self.frame_index += 1;

        let anchor = match self.next_slot {
            Some(slot) if self.config.vsync && now <= slot + self.refresh / 2 => slot,
            _ => now,
        };
        let intended_present = anchor + target_interval;
        self.next_slot = Some(intended_present);

        FramePlan {
            frame_index: self.frame_index,
            frame_start: now,
            swap_interval,
            target_interval,
            intended_present,
            previous_missed: self.previous_missed,
        }
    }

    /// Finish a frame and feed its measurements back
    ///
    /// # Returns
    ///
    /// The [`FrameTiming`] recorded in the history
    pub fn end_frame(&mut self, plan: &FramePlan, feedback: PresentFeedback) -> FrameTiming {
        let cpu_cost = feedback.submitted_at.saturating_sub(plan.frame_start);
        let cost = cpu_cost.max(feedback.gpu_time.unwrap_or_default());

        let missed = match feedback.actual_present {
            Some(present) => present > plan.intended_present + self.refresh / 2,
            None => feedback.submitted_at > plan.intended_present,
        };

        let timing = FrameTiming {
            frame_index: plan.frame_index,
            frame_start: plan.frame_start,
            intended_present: plan.intended_present,
            submitted_at: feedback.submitted_at,
            cost,
            actual_present: feedback.actual_present,
            swap_interval: plan.swap_interval,
            missed,
        };

        self.history.push(timing);
        self.stats.tick(feedback.submitted_at);
        self.estimator.observe(cost);
        self.track_feedback(feedback.actual_present.is_some());

        if missed {
            self.missed_total += 1;
            log::trace!(
                "Frame {} missed its deadline ({:?} > {:?})",
                plan.frame_index,
                feedback.actual_present.unwrap_or(feedback.submitted_at),
                plan.intended_present
            );
        }
        self.previous_missed = missed;

        let next = self.compute_swap_interval();
        if next != self.swap_interval {
            log::debug!(
                "Swap interval {} -> {} (estimated cost {:.2}ms)",
                self.swap_interval,
                next,
                self.estimated_cost().as_secs_f64() * 1000.0
            );
            self.swap_interval = next;
        }

        timing
    }

    /// Forget all measurements
    ///
    /// The next frame paces from the nominal refresh period again. Degraded
    /// mode is a device property and survives a reset.
    pub fn reset(&mut self) {
        self.history.clear();
        self.estimator.reset();
        self.stats.restart_window();
        self.swap_interval = 1;
        self.next_slot = None;
        self.previous_missed = false;
        self.missing_feedback = 0;
        log::debug!("Frame pacer history reset");
    }

    /// Release pacing timers while paused
    pub fn suspend(&mut self) {
        self.next_slot = None;
        self.previous_missed = false;
        self.stats.restart_window();
    }

    /// Whether the previous frame missed its deadline
    pub fn previous_missed(&self) -> bool {
        self.previous_missed
    }

    /// Whether swap-timing feedback is unavailable
    pub fn is_degraded(&self) -> bool {
        self.degraded
    }

    /// Rolling frame history
    pub fn history(&self) -> &FrameHistory {
        &self.history
    }

    /// Frame rate statistics
    pub fn stats(&self) -> &FrameStats {
        &self.stats
    }

    pub fn config(&self) -> &PacerConfig {
        &self.config
    }

    /// Snapshot for diagnostics
    pub fn status(&self) -> PacerStatus {
        PacerStatus {
            swap_interval: self.swap_interval(),
            estimated_cost_ms: self.estimated_cost().as_secs_f64() * 1000.0,
            average_cost_ms: self
                .history
                .average_cost()
                .map_or(0.0, |cost| cost.as_secs_f64() * 1000.0),
            recent_missed: self.history.missed_count(),
            degraded: self.degraded,
            frames_rendered: self.stats.frame_count(),
            ticks_skipped: self.ticks_skipped,
            missed_deadlines: self.missed_total,
            fps: self.stats.fps(),
        }
    }

    fn compute_swap_interval(&self) -> u32 {
        let refresh = self.refresh.as_nanos().max(1);
        let estimate = self.estimated_cost().as_nanos();
        let periods = estimate.div_ceil(refresh).max(1);
        periods.min(self.config.max_swap_interval as u128) as u32
    }

    fn track_feedback(&mut self, has_present: bool) {
        if has_present {
            self.missing_feedback = 0;
            if self.degraded {
                log::info!("Swap timing feedback available again, adaptive pacing restored");
                self.degraded = false;
            }
            return;
        }

        self.missing_feedback = self.missing_feedback.saturating_add(1);
        if !self.degraded && self.missing_feedback >= self.config.degrade_after_frames {
            self.degraded = true;
            log::warn!(
                "{}; pacing at {:.1} Hz",
                CoreError::SwapTimingUnavailable,
                self.config.refresh_rate_hz
            );
        }
    }
}
