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

//! Unit tests for the frame pacer

use super::*;
use proptest::prelude::*;

/// Run one frame starting at `start` that costs `cost`, presented on the next
/// vblank after the intended present if it was late
fn run_frame(pacer: &mut FramePacer, start: Duration, cost: Duration) -> FrameTiming {
    let plan = pacer.begin_frame(start);
    let submitted_at = start + cost;
    let present = submitted_at.max(plan.intended_present);
    pacer.end_frame(
        &plan,
        PresentFeedback {
            submitted_at,
            gpu_time: None,
            actual_present: Some(present),
        },
    )
}

fn timing(index: u64, cost_ms: u64) -> FrameTiming {
    FrameTiming {
        frame_index: index,
        frame_start: Duration::ZERO,
        intended_present: Duration::ZERO,
        submitted_at: Duration::ZERO,
        cost: Duration::from_millis(cost_ms),
        actual_present: None,
        swap_interval: 1,
        missed: false,
    }
}

// ============================================================================
// Configuration
// ============================================================================

#[test]
fn test_default_config_is_valid() {
    let config = PacerConfig::default();
    assert!(config.validate().is_ok());
    assert_eq!(config.refresh_rate_hz, 60.0);
    assert!(config.vsync);
}

#[test]
fn test_validate_rejects_bad_values() {
    let bad_rate = PacerConfig {
        refresh_rate_hz: 0.0,
        ..Default::default()
    };
    assert!(matches!(bad_rate.validate(), Err(CoreError::Config(_))));

    let bad_smoothing = PacerConfig {
        smoothing: 1.5,
        ..Default::default()
    };
    assert!(bad_smoothing.validate().is_err());

    let bad_interval = PacerConfig {
        max_swap_interval: 0,
        ..Default::default()
    };
    assert!(bad_interval.validate().is_err());
}

// ============================================================================
// Swap interval selection
// ============================================================================

#[test]
fn test_first_frame_uses_nominal_refresh() {
    let mut pacer = FramePacer::new(PacerConfig::default());
    assert_eq!(pacer.estimated_cost(), pacer.refresh_period());

    let plan = pacer.begin_frame(Duration::ZERO);
    assert_eq!(plan.frame_index, 1);
    assert_eq!(plan.swap_interval, 1);
    assert_eq!(plan.intended_present, pacer.refresh_period());
    assert!(!plan.previous_missed);
}

#[test]
fn test_cheap_frames_stay_at_one() {
    let mut pacer = FramePacer::new(PacerConfig::default());
    let refresh = pacer.refresh_period();
    let cost = Duration::from_millis(10);

    let mut now = Duration::ZERO;
    for _ in 0..3 {
        let t = run_frame(&mut pacer, now, cost);
        assert_eq!(t.swap_interval, 1);
        assert!(!t.missed);
        now += refresh;
    }

    assert_eq!(pacer.swap_interval(), 1);
    assert_eq!(pacer.history().len(), 3);
    assert_eq!(pacer.history().missed_count(), 0);
}

#[test]
fn test_expensive_frames_round_up_to_three() {
    let mut pacer = FramePacer::new(PacerConfig::default());
    let refresh = pacer.refresh_period();
    let cost = refresh * 5 / 2;

    // First frame is planned at 1x and misses
    let first = run_frame(&mut pacer, Duration::ZERO, cost);
    assert_eq!(first.swap_interval, 1);
    assert!(first.missed);
    assert_eq!(pacer.swap_interval(), 3);

    let mut now = first.submitted_at;
    for _ in 0..5 {
        let plan = pacer.begin_frame(now);
        assert_eq!(plan.swap_interval, 3, "2.5x cost must never pace at 2x");
        let submitted_at = now + cost;
        let t = pacer.end_frame(
            &plan,
            PresentFeedback {
                submitted_at,
                gpu_time: None,
                actual_present: Some(plan.intended_present),
            },
        );
        assert!(!t.missed);
        now = plan.intended_present;
    }
}

#[test]
fn test_gpu_time_dominates_cost() {
    let mut pacer = FramePacer::new(PacerConfig::default());
    let refresh = pacer.refresh_period();

    let plan = pacer.begin_frame(Duration::ZERO);
    let t = pacer.end_frame(
        &plan,
        PresentFeedback {
            submitted_at: Duration::from_millis(2),
            gpu_time: Some(refresh * 2),
            actual_present: Some(refresh * 3),
        },
    );

    assert_eq!(t.cost, refresh * 2);
    assert_eq!(pacer.swap_interval(), 2);
}

#[test]
fn test_swap_interval_clamped_to_max() {
    let config = PacerConfig {
        max_swap_interval: 2,
        ..Default::default()
    };
    let mut pacer = FramePacer::new(config);
    let refresh = pacer.refresh_period();

    run_frame(&mut pacer, Duration::ZERO, refresh * 10);
    assert_eq!(pacer.swap_interval(), 2);
}

#[test]
fn test_estimate_smooths_after_first_sample() {
    let mut pacer = FramePacer::new(PacerConfig::default());

    run_frame(&mut pacer, Duration::ZERO, Duration::from_millis(10));
    assert_eq!(pacer.estimated_cost(), Duration::from_millis(10));

    run_frame(&mut pacer, Duration::from_millis(20), Duration::from_millis(20));
    // 0.8 * 10 + 0.2 * 20
    assert_eq!(pacer.estimated_cost(), Duration::from_millis(12));
}

// ============================================================================
// Scheduling
// ============================================================================

#[test]
fn test_should_render_waits_for_target_interval() {
    let mut pacer = FramePacer::new(PacerConfig::default());
    let refresh = pacer.refresh_period();

    assert!(pacer.should_render(Duration::ZERO), "first frame is due now");
    run_frame(&mut pacer, Duration::ZERO, Duration::from_millis(5));

    assert!(!pacer.should_render(Duration::from_millis(1)));
    assert!(!pacer.should_render(refresh / 2));
    let due = refresh - refresh / 16;
    assert!(!pacer.should_render(due - Duration::from_micros(1)));
    assert!(pacer.should_render(due));
    assert!(pacer.should_render(refresh));
    assert_eq!(pacer.next_due(), Some(due));
}

#[test]
fn test_non_blocking_frames_stay_on_their_slots() {
    let mut pacer = FramePacer::new(PacerConfig::default());
    let refresh = pacer.refresh_period();
    let cost = Duration::from_millis(2);

    // Present returns immediately, so every frame wakes as soon as it is due
    let mut now = Duration::ZERO;
    let mut presents = Vec::new();
    for _ in 0..10 {
        let plan = pacer.begin_frame(now);
        presents.push(plan.intended_present);
        pacer.end_frame(
            &plan,
            PresentFeedback {
                submitted_at: now + cost,
                gpu_time: None,
                actual_present: Some(plan.intended_present),
            },
        );
        now = pacer.next_due().unwrap();
    }

    for pair in presents.windows(2) {
        assert_eq!(pair[1] - pair[0], refresh);
    }
    assert_eq!(pacer.history().missed_count(), 0);
}

#[test]
fn test_late_start_reanchors_slot() {
    let mut pacer = FramePacer::new(PacerConfig::default());
    let refresh = pacer.refresh_period();

    run_frame(&mut pacer, Duration::ZERO, Duration::from_millis(2));

    // A quarter refresh late: still this slot
    let plan = pacer.begin_frame(refresh + refresh / 4);
    assert_eq!(plan.intended_present, refresh * 2);
    pacer.end_frame(&plan, PresentFeedback::default());

    // A whole refresh late: the slot is gone, pace from now
    let start = refresh * 3 + refresh / 4;
    let plan = pacer.begin_frame(start);
    assert_eq!(plan.intended_present, start + refresh);
}

#[test]
fn test_missed_flag_carried_into_next_plan() {
    let mut pacer = FramePacer::new(PacerConfig::default());
    let refresh = pacer.refresh_period();

    let t = run_frame(&mut pacer, Duration::ZERO, refresh * 2);
    assert!(t.missed);

    let plan = pacer.begin_frame(t.submitted_at);
    assert!(plan.previous_missed);
}

#[test]
fn test_missed_without_present_uses_submission_time() {
    let mut pacer = FramePacer::new(PacerConfig::default());
    let refresh = pacer.refresh_period();

    let plan = pacer.begin_frame(Duration::ZERO);
    let t = pacer.end_frame(
        &plan,
        PresentFeedback {
            submitted_at: refresh + Duration::from_millis(1),
            gpu_time: None,
            actual_present: None,
        },
    );
    assert!(t.missed);
}

#[test]
fn test_unpaced_mode_renders_every_tick() {
    let config = PacerConfig {
        vsync: false,
        ..Default::default()
    };
    let mut pacer = FramePacer::new(config);
    let refresh = pacer.refresh_period();

    run_frame(&mut pacer, Duration::ZERO, refresh * 3);
    assert_eq!(pacer.swap_interval(), 1);
    assert!(pacer.should_render(Duration::from_micros(1)));
    assert_eq!(pacer.next_due(), None);
}

// ============================================================================
// Reset and degraded mode
// ============================================================================

#[test]
fn test_reset_returns_to_nominal() {
    let mut pacer = FramePacer::new(PacerConfig::default());
    let refresh = pacer.refresh_period();

    run_frame(&mut pacer, Duration::ZERO, refresh * 3);
    assert_eq!(pacer.swap_interval(), 3);

    pacer.reset();
    assert!(pacer.history().is_empty());
    assert_eq!(pacer.estimated_cost(), refresh);
    assert!(pacer.should_render(Duration::from_millis(1)));

    let plan = pacer.begin_frame(Duration::from_secs(5));
    assert_eq!(plan.swap_interval, 1);
    assert!(!plan.previous_missed);
}

#[test]
fn test_suspend_keeps_estimate() {
    let mut pacer = FramePacer::new(PacerConfig::default());
    let refresh = pacer.refresh_period();

    run_frame(&mut pacer, Duration::ZERO, refresh * 2);
    pacer.suspend();

    assert_eq!(pacer.swap_interval(), 2);
    assert!(pacer.should_render(Duration::from_millis(1)));
}

#[test]
fn test_degrades_without_present_feedback() {
    let mut pacer = FramePacer::new(PacerConfig::default());
    let refresh = pacer.refresh_period();
    let mut now = Duration::ZERO;

    for i in 0..3 {
        let plan = pacer.begin_frame(now);
        pacer.end_frame(
            &plan,
            PresentFeedback {
                submitted_at: now + refresh * 2,
                gpu_time: None,
                actual_present: None,
            },
        );
        now += refresh * 2;
        assert_eq!(pacer.is_degraded(), i == 2);
    }

    assert_eq!(pacer.swap_interval(), 1, "degraded mode paces at nominal refresh");
    assert!(pacer.status().degraded);

    // Feedback comes back
    run_frame(&mut pacer, now, refresh * 2);
    assert!(!pacer.is_degraded());
    assert_eq!(pacer.swap_interval(), 2);
}

#[test]
fn test_status_snapshot() {
    let mut pacer = FramePacer::new(PacerConfig::default());
    pacer.skip_tick();
    pacer.skip_tick();
    run_frame(&mut pacer, Duration::ZERO, Duration::from_millis(4));

    let status = pacer.status();
    assert_eq!(status.ticks_skipped, 2);
    assert_eq!(status.frames_rendered, 1);
    assert_eq!(status.swap_interval, 1);
    assert!((status.estimated_cost_ms - 4.0).abs() < 1e-6);
    assert!((status.average_cost_ms - 4.0).abs() < 1e-6);
    assert_eq!(status.recent_missed, 0);
}

#[test]
fn test_status_reports_history_window() {
    let config = PacerConfig {
        history_len: 2,
        ..Default::default()
    };
    let mut pacer = FramePacer::new(config);
    assert_eq!(pacer.status().average_cost_ms, 0.0);

    let refresh = pacer.refresh_period();
    let late = run_frame(&mut pacer, Duration::ZERO, refresh * 2);
    assert!(late.missed);
    run_frame(&mut pacer, Duration::from_millis(100), Duration::from_millis(2));
    assert_eq!(pacer.status().recent_missed, 1);

    // The late frame falls out of the window, the lifetime counter keeps it
    run_frame(&mut pacer, Duration::from_millis(200), Duration::from_millis(2));
    let status = pacer.status();
    assert_eq!(status.recent_missed, 0);
    assert_eq!(status.missed_deadlines, 1);
    assert!((status.average_cost_ms - 2.0).abs() < 1e-6);
}

// ============================================================================
// History
// ============================================================================

#[test]
fn test_history_average_cost() {
    let mut history = FrameHistory::new(4);
    assert_eq!(history.average_cost(), None);

    history.push(timing(1, 10));
    history.push(timing(2, 20));
    assert_eq!(history.average_cost(), Some(Duration::from_millis(15)));
    assert_eq!(history.latest().map(|t| t.frame_index), Some(2));
}

#[test]
fn test_history_zero_capacity_raised() {
    let history = FrameHistory::new(0);
    assert_eq!(history.capacity(), 1);
}

proptest! {
    /// The history never exceeds its capacity and always keeps the newest
    /// records in age order
    #[test]
    fn prop_history_evicts_oldest(capacity in 1usize..16, pushes in 0u64..64) {
        let mut history = FrameHistory::new(capacity);
        for i in 0..pushes {
            history.push(timing(i, 1));
        }

        prop_assert!(history.len() <= capacity);
        prop_assert_eq!(history.len() as u64, pushes.min(capacity as u64));

        let indices: Vec<u64> = history.iter().map(|t| t.frame_index).collect();
        let expected: Vec<u64> = (pushes.saturating_sub(capacity as u64)..pushes).collect();
        prop_assert_eq!(indices, expected);
    }

    /// Whatever the frame cost, the swap interval stays within bounds
    #[test]
    fn prop_swap_interval_bounded(costs in prop::collection::vec(0u64..200, 1..40)) {
        let mut pacer = FramePacer::new(PacerConfig::default());
        let mut now = Duration::ZERO;
        for ms in costs {
            let cost = Duration::from_millis(ms);
            run_frame(&mut pacer, now, cost);
            now += cost + Duration::from_millis(1);
            let interval = pacer.swap_interval();
            prop_assert!((1..=4).contains(&interval));
        }
    }
}
