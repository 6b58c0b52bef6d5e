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

//! Unit tests for the lifecycle state machine and controller

use super::*;
use crate::core::config::CoreConfig;
use crate::core::event::{InputEvent, PointerAction};
use crate::core::render::HeadlessRenderer;
use crate::core::render_loop::{Core, CoreStatus};
use crate::core::surface::{SurfaceHandle, SurfaceStatus};
use crate::core::time::MonotonicClock;
use crate::demo::BouncingQuads;
use std::time::{Duration, Instant};

fn running() -> Lifecycle {
    let mut lifecycle = Lifecycle::new();
    lifecycle.apply(Signal::Start).unwrap();
    lifecycle.apply(Signal::SurfaceCreated).unwrap();
    assert_eq!(lifecycle.state(), LoopState::Running);
    lifecycle
}

// ============================================================================
// State machine
// ============================================================================

#[test]
fn test_start_and_surface_in_either_order() {
    let mut a = Lifecycle::new();
    a.apply(Signal::Start).unwrap();
    assert_eq!(a.state(), LoopState::Uninitialized);
    let t = a.apply(Signal::SurfaceCreated).unwrap();
    assert!(t.entered(LoopState::Running));

    let mut b = Lifecycle::new();
    b.apply(Signal::SurfaceCreated).unwrap();
    assert_eq!(b.state(), LoopState::Uninitialized);
    b.apply(Signal::Start).unwrap();
    assert_eq!(b.state(), LoopState::Running);
}

#[test]
fn test_resume_before_first_window_is_accepted() {
    let mut lifecycle = Lifecycle::new();
    lifecycle.apply(Signal::Start).unwrap();
    lifecycle.apply(Signal::Resume).unwrap();
    assert_eq!(lifecycle.state(), LoopState::Uninitialized);

    lifecycle.apply(Signal::SurfaceCreated).unwrap();
    assert_eq!(lifecycle.state(), LoopState::Running);
}

#[test]
fn test_backgrounded_before_first_window_waits_for_resume() {
    let mut lifecycle = Lifecycle::new();
    lifecycle.apply(Signal::Start).unwrap();
    lifecycle.apply(Signal::Pause).unwrap();
    lifecycle.apply(Signal::SurfaceCreated).unwrap();
    assert_eq!(lifecycle.state(), LoopState::Uninitialized);

    assert!(matches!(
        lifecycle.apply(Signal::Pause),
        Err(CoreError::PauseWhilePaused)
    ));

    lifecycle.apply(Signal::Resume).unwrap();
    assert_eq!(lifecycle.state(), LoopState::Running);
}

#[test]
fn test_pause_resume_cycle() {
    let mut lifecycle = running();

    let t = lifecycle.apply(Signal::Pause).unwrap();
    assert_eq!((t.from, t.to), (LoopState::Running, LoopState::Paused));

    let t = lifecycle.apply(Signal::Resume).unwrap();
    assert_eq!((t.from, t.to), (LoopState::Paused, LoopState::Running));
}

#[test]
fn test_resume_while_running_is_a_violation() {
    let mut lifecycle = running();

    let err = lifecycle.apply(Signal::Resume).unwrap_err();
    assert!(matches!(
        err,
        CoreError::ResumeWithoutPause {
            state: LoopState::Running
        }
    ));
    assert!(err.is_contract_violation());
    assert_eq!(lifecycle.state(), LoopState::Running);
}

#[test]
fn test_pause_while_paused_is_a_violation() {
    let mut lifecycle = running();
    lifecycle.apply(Signal::Pause).unwrap();

    assert!(matches!(
        lifecycle.apply(Signal::Pause),
        Err(CoreError::PauseWhilePaused)
    ));
    assert_eq!(lifecycle.state(), LoopState::Paused);
}

#[test]
fn test_start_twice_is_a_violation() {
    let mut lifecycle = running();
    assert!(matches!(
        lifecycle.apply(Signal::Start),
        Err(CoreError::AlreadyStarted)
    ));
}

#[test]
fn test_surface_loss_while_paused_keeps_lifecycle() {
    let mut lifecycle = running();
    lifecycle.apply(Signal::Pause).unwrap();
    lifecycle.apply(Signal::SurfaceDestroyed).unwrap();
    lifecycle.apply(Signal::Resume).unwrap();

    assert_eq!(lifecycle.state(), LoopState::Running);
    assert!(!lifecycle.has_surface());
}

#[test]
fn test_destroy_from_every_live_state() {
    let mut uninit = Lifecycle::new();
    uninit.apply(Signal::Destroy).unwrap();
    assert_eq!(uninit.state(), LoopState::ShuttingDown);

    let mut paused = running();
    paused.apply(Signal::Pause).unwrap();
    paused.apply(Signal::Destroy).unwrap();
    assert_eq!(paused.state(), LoopState::ShuttingDown);
}

#[test]
fn test_everything_after_destroy_is_rejected() {
    let mut lifecycle = running();
    lifecycle.apply(Signal::Destroy).unwrap();

    for signal in [
        Signal::Start,
        Signal::SurfaceCreated,
        Signal::SurfaceDestroyed,
        Signal::Pause,
        Signal::Resume,
        Signal::Destroy,
    ] {
        let err = lifecycle.apply(signal).unwrap_err();
        assert!(matches!(err, CoreError::AfterDestroy { .. }), "{signal:?}");
    }
    assert!(lifecycle.check_accepts("pointer").is_err());

    lifecycle.apply(Signal::ShutdownComplete).unwrap();
    assert_eq!(lifecycle.state(), LoopState::Terminated);

    // Terminated is absorbing
    assert!(lifecycle.apply(Signal::ShutdownComplete).is_err());
    assert!(lifecycle.apply(Signal::Resume).is_err());
    assert_eq!(lifecycle.state(), LoopState::Terminated);
}

// ============================================================================
// Controller
// ============================================================================

fn controller() -> LifecycleController {
    let core = Core::new(
        &CoreConfig::default(),
        HeadlessRenderer::new(),
        BouncingQuads::new(8),
        MonotonicClock::new(),
    )
    .unwrap();
    LifecycleController::new(core)
}

fn wait_for(controller: &LifecycleController, what: &str, pred: impl Fn(&CoreStatus) -> bool) {
    let deadline = Instant::now() + Duration::from_secs(5);
    while Instant::now() < deadline {
        if pred(&controller.status()) {
            return;
        }
        std::thread::sleep(Duration::from_millis(2));
    }
    panic!("timed out waiting for {what}: {:?}", controller.status());
}

#[test]
fn test_controller_full_session() {
    let controller = controller();
    controller.start().unwrap();
    controller.on_resume().unwrap();
    controller
        .on_create(SurfaceHandle::headless(320, 240))
        .unwrap();

    wait_for(&controller, "first frames", |s| s.frames_rendered >= 3);
    assert_eq!(controller.status().state, LoopState::Running);

    controller.on_pause().unwrap();
    wait_for(&controller, "pause", |s| s.state == LoopState::Paused);
    let paused_frames = controller.status().frames_rendered;
    std::thread::sleep(Duration::from_millis(50));
    assert_eq!(controller.status().frames_rendered, paused_frames);

    controller.on_resume().unwrap();
    wait_for(&controller, "frames after resume", |s| {
        s.frames_rendered > paused_frames
    });

    controller.on_destroy().unwrap();
    controller.wait_terminated(Duration::from_secs(5)).unwrap();
    let status = controller.join().unwrap();
    assert_eq!(status.state, LoopState::Terminated);
    assert_eq!(controller.status().state, LoopState::Terminated);
}

#[test]
fn test_controller_rejects_resume_while_running() {
    let controller = controller();
    controller.start().unwrap();
    controller
        .on_create(SurfaceHandle::headless(64, 64))
        .unwrap();
    wait_for(&controller, "running", |s| s.state == LoopState::Running);

    let err = controller.on_resume().unwrap_err();
    assert!(err.is_contract_violation());
    assert_eq!(controller.host_state(), LoopState::Running);
    assert_eq!(controller.status().state, LoopState::Running);
}

#[test]
fn test_controller_start_twice() {
    let controller = controller();
    controller.start().unwrap();
    assert!(matches!(controller.start(), Err(CoreError::AlreadyStarted)));
}

#[test]
fn test_controller_start_retryable_after_failed_spawn() {
    let controller = controller();
    let err = controller
        .start_with(|_| Err(std::io::Error::other("no threads left")))
        .unwrap_err();
    assert!(matches!(err, CoreError::Io(_)));
    assert!(!controller.is_running());
    assert!(matches!(
        controller.wait_terminated(Duration::ZERO),
        Err(CoreError::Timeout(_))
    ));

    controller.start().unwrap();
    controller
        .on_create(SurfaceHandle::headless(64, 64))
        .unwrap();
    wait_for(&controller, "frames", |s| s.frames_rendered >= 1);

    controller.on_destroy().unwrap();
    controller.wait_terminated(Duration::from_secs(5)).unwrap();
    assert_eq!(controller.join().unwrap().state, LoopState::Terminated);
}

#[test]
fn test_controller_concurrent_pause_resume_stays_in_step() {
    let controller = std::sync::Arc::new(controller());
    controller.start().unwrap();
    controller
        .on_create(SurfaceHandle::headless(64, 64))
        .unwrap();
    wait_for(&controller, "running", |s| s.state == LoopState::Running);

    let workers: Vec<_> = (0..2)
        .map(|_| {
            let controller = controller.clone();
            std::thread::spawn(move || {
                for i in 0..200 {
                    // Violations are expected; only the accepted order matters
                    let _ = if i % 2 == 0 {
                        controller.on_pause()
                    } else {
                        controller.on_resume()
                    };
                }
            })
        })
        .collect();
    for worker in workers {
        worker.join().unwrap();
    }

    let host = controller.host_state();
    wait_for(&controller, "loop to drain the queue", |s| s.state == host);
    std::thread::sleep(Duration::from_millis(20));
    assert_eq!(controller.status().state, controller.host_state());
}

#[test]
fn test_controller_destroy_before_start() {
    let controller = controller();
    controller.on_destroy().unwrap();

    assert_eq!(controller.status().state, LoopState::Terminated);
    controller.wait_terminated(Duration::from_millis(10)).unwrap();
    assert!(matches!(
        controller.start(),
        Err(CoreError::AfterDestroy { .. })
    ));
}

#[test]
fn test_controller_rejects_input_after_destroy() {
    let controller = controller();
    controller.start().unwrap();
    controller.on_destroy().unwrap();

    let err = controller
        .on_input_event(InputEvent::Pointer {
            id: 0,
            action: PointerAction::Down,
            x: 1.0,
            y: 1.0,
            timestamp: Duration::ZERO,
        })
        .unwrap_err();
    assert!(matches!(err, CoreError::AfterDestroy { event: "pointer", .. }));
    assert!(controller.on_focus_changed(true).is_err());
    assert!(controller.on_window_resized(10, 10).is_err());
}

#[test]
fn test_controller_surface_release_is_acknowledged() {
    let controller = controller();
    controller.start().unwrap();
    let surface = SurfaceHandle::headless(64, 64);
    let id = surface.id();
    controller.on_create(surface).unwrap();
    wait_for(&controller, "surface", |s| s.surface == SurfaceStatus::SurfaceReady);

    let release = controller.on_window_destroyed().unwrap();
    assert_eq!(release.wait(Duration::from_secs(5)).unwrap(), Some(id));
    wait_for(&controller, "no surface", |s| s.surface == SurfaceStatus::NoSurface);
    assert_eq!(controller.status().state, LoopState::Running);
}

#[test]
fn test_controller_drop_joins_loop() {
    let core = Core::new(
        &CoreConfig::default(),
        HeadlessRenderer::new(),
        BouncingQuads::new(2),
        MonotonicClock::new(),
    )
    .unwrap();
    let status = core.status_handle();
    let controller = LifecycleController::new(core);
    controller.start().unwrap();
    controller
        .on_create(SurfaceHandle::headless(64, 64))
        .unwrap();

    drop(controller);
    assert_eq!(status.get().state, LoopState::Terminated);
}
