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

//! Render/update loop
//!
//! [`Core`] owns everything the loop thread touches: the receiving end of the
//! event queue, the surface state, the frame pacer, the input state, the
//! renderer and the simulation. One call to [`Core::tick`] is one loop
//! iteration:
//!
//! 1. Drain the queue and apply events in arrival order
//! 2. Release resources and stop if shutting down
//! 3. Idle unless Running with a drawable surface
//! 4. Recreate size-dependent resources after a resize
//! 5. Advance simulated time by the real delta since the last active tick
//! 6. Light bookkeeping step if no frame is due yet
//! 7. Otherwise update, draw, submit and report timing to the pacer
//!
//! [`Core::run`] repeats that until the loop terminates, waiting on the queue
//! (never longer than the idle poll interval) between iterations.


use crate::core::config::CoreConfig;
use crate::core::error::{CoreError, ErrorClass, Result};
use crate::core::event::{Event, EventQueue, EventSender};
use crate::core::input::InputState;
use crate::core::lifecycle::{Lifecycle, LoopState, Signal, Transition};
use crate::core::pacer::{FramePacer, FramePlan, FrameTiming, PresentFeedback};
use crate::core::render::{DrawList, FrameRequest, Renderer, Simulation, Step, StepKind, Submission};
use crate::core::surface::{Extent, SurfaceHandle, SurfaceId, SurfaceState, SurfaceStatus};
use crate::core::time::{Clock, MonotonicClock};
use serde::Serialize;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

/// Attempts at draining the GPU before resources are released on shutdown
const SHUTDOWN_IDLE_ATTEMPTS: u32 = 3;

/// Snapshot of the loop published after every iteration
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct CoreStatus {
    pub state: LoopState,
    pub surface: SurfaceStatus,
    /// Number of surfaces attached since start
    pub surface_generation: u64,
    /// Swap-timing feedback unavailable, pacing at nominal refresh
    pub degraded: bool,
    pub swap_interval: u32,
    pub estimated_cost_ms: f64,
    /// Mean cost over the pacer's rolling history
    pub average_cost_ms: f64,
    /// Missed deadlines within the pacer's rolling history
    pub recent_missed: usize,
    pub fps: f32,
    pub frames_rendered: u64,
    /// Active ticks that did not render because no frame was due
    pub ticks_skipped: u64,
    pub missed_deadlines: u64,
    pub dropped_input: u64,
    pub sim_time_ms: f64,
}

/// Shared, cloneable view of the latest [`CoreStatus`]
#[derive(Debug, Clone, Default)]
pub struct StatusHandle {
    inner: Arc<Mutex<CoreStatus>>,
}

impl StatusHandle {
    /// Latest published snapshot
    pub fn get(&self) -> CoreStatus {
        *self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn set(&self, status: CoreStatus) {
        *self.inner.lock().unwrap_or_else(PoisonError::into_inner) = status;
    }
}

/// What one loop iteration did
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TickOutcome {
    /// Not Running, or no drawable surface
    Idle,
    /// Active, but no frame was due
    Bookkeeping,
    /// A frame was submitted
    Rendered(FrameTiming),
    /// The surface went away mid-frame; the frame was dropped
    Skipped,
    /// The loop has released its resources and stopped
    Terminated,
}

/// Loop core
pub struct Core<R: Renderer, S: Simulation, C: Clock = MonotonicClock> {
    queue: EventQueue,
    /// Events received while waiting, processed before the next drain
    backlog: VecDeque<Event>,
    lifecycle: Lifecycle,
    surface: SurfaceState,
    /// Surface the renderer is currently bound to
    attached: Option<SurfaceId>,
    pacer: FramePacer,
    input: InputState,
    draw_list: DrawList,
    renderer: R,
    simulation: S,
    clock: C,
    last_tick: Option<Duration>,
    sim_time: Duration,
    focused: bool,
    idle_poll: Duration,
    gpu_idle_timeout: Duration,
    surface_release_timeout: Duration,
    status: StatusHandle,
}

impl<R: Renderer, S: Simulation, C: Clock> Core<R, S, C> {
    /// Create a loop core
    ///
    /// # Errors
    ///
    /// [`CoreError::Config`] if `config` does not validate.
    pub fn new(config: &CoreConfig, renderer: R, simulation: S, clock: C) -> Result<Self> {
        config.validate()?;

        let core = Self {
            queue: EventQueue::new(config.queue.input_capacity),
            backlog: VecDeque::new(),
            lifecycle: Lifecycle::new(),
            surface: SurfaceState::new(),
            attached: None,
            pacer: FramePacer::new(config.pacer.clone()),
            input: InputState::new(),
            draw_list: DrawList::new(),
            renderer,
            simulation,
            clock,
            last_tick: None,
            sim_time: Duration::ZERO,
            focused: true,
            idle_poll: config.scheduler.idle_poll(),
            gpu_idle_timeout: config.scheduler.gpu_idle_timeout(),
            surface_release_timeout: config.scheduler.surface_release_timeout(),
            status: StatusHandle::default(),
        };
        core.publish();
        Ok(core)
    }

    /// Producer handle for host threads
    pub fn sender(&self) -> EventSender {
        self.queue.sender()
    }

    /// Shared status view
    pub fn status_handle(&self) -> StatusHandle {
        self.status.clone()
    }

    /// Explicit start signal
    ///
    /// # Errors
    ///
    /// [`CoreError::AlreadyStarted`] if called twice.
    pub fn start(&mut self) -> Result<()> {
        let transition = self.lifecycle.apply(Signal::Start)?;
        self.on_transition(transition);
        self.publish();
        Ok(())
    }

    pub fn state(&self) -> LoopState {
        self.lifecycle.state()
    }

    /// Total simulated time
    pub fn sim_time(&self) -> Duration {
        self.sim_time
    }

    pub fn pacer(&self) -> &FramePacer {
        &self.pacer
    }

    pub fn surface(&self) -> &SurfaceState {
        &self.surface
    }

    pub fn input(&self) -> &InputState {
        &self.input
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn simulation(&self) -> &S {
        &self.simulation
    }

    /// How long a host should wait for a surface release acknowledgement
    pub fn surface_release_timeout(&self) -> Duration {
        self.surface_release_timeout
    }

    /// Whether the host window currently has focus
    pub fn is_focused(&self) -> bool {
        self.focused
    }

    /// Build the current status snapshot
    pub fn status(&self) -> CoreStatus {
        let pacer = self.pacer.status();
        CoreStatus {
            state: self.lifecycle.state(),
            surface: self.surface.status(),
            surface_generation: self.surface.generation(),
            degraded: pacer.degraded,
            swap_interval: pacer.swap_interval,
            estimated_cost_ms: pacer.estimated_cost_ms,
            average_cost_ms: pacer.average_cost_ms,
            recent_missed: pacer.recent_missed,
            fps: pacer.fps,
            frames_rendered: pacer.frames_rendered,
            ticks_skipped: pacer.ticks_skipped,
            missed_deadlines: pacer.missed_deadlines,
            dropped_input: self.queue.dropped_input(),
            sim_time_ms: self.sim_time.as_secs_f64() * 1000.0,
        }
    }

    /// Run one loop iteration
    ///
    /// # Errors
    ///
    /// Fatal renderer errors. Contract violations found while replaying
    /// queued events are logged and skipped, never returned from here.
    pub fn tick(&mut self) -> Result<TickOutcome> {
        if self.lifecycle.state() == LoopState::Terminated {
            return Ok(TickOutcome::Terminated);
        }

        let mut events: Vec<Event> = self.backlog.drain(..).collect();
        events.extend(self.queue.drain());
        self.process_events(events)?;

        let outcome = self.step()?;
        self.publish();
        Ok(outcome)
    }

    /// Drive the loop until it terminates
    ///
    /// Applies the start signal first if [`start`](Core::start) was not
    /// called. On a fatal error the renderer is released before the error is
    /// returned.
    pub fn run(mut self) -> Result<CoreStatus> {
        if !self.lifecycle.is_started() {
            self.start()?;
        }
        log::info!("Loop thread running");

        loop {
            let outcome = match self.tick() {
                Ok(outcome) => outcome,
                Err(e) => {
                    log::error!("Loop stopped: {}", e);
                    self.abort();
                    return Err(e);
                }
            };

            match outcome {
                TickOutcome::Terminated => {
                    log::info!("Loop thread finished");
                    return Ok(self.status());
                }
                TickOutcome::Idle => self.wait_for_event(self.idle_poll),
                TickOutcome::Bookkeeping => {
                    let now = self.clock.now();
                    let until_due = self
                        .pacer
                        .next_due()
                        .map(|due| due.saturating_sub(now))
                        .unwrap_or(Duration::ZERO);
                    self.wait_for_event(until_due.min(self.idle_poll));
                }
                TickOutcome::Rendered(_) | TickOutcome::Skipped => {}
            }
        }
    }

    fn wait_for_event(&mut self, timeout: Duration) {
        if timeout.is_zero() {
            return;
        }
        if let Some(event) = self.queue.wait(timeout) {
            self.backlog.push_back(event);
        }
    }

    fn process_events(&mut self, events: Vec<Event>) -> Result<()> {
        let total = events.len();
        for (i, event) in events.into_iter().enumerate() {
            self.handle_event(event)?;
            if self.lifecycle.is_destroyed() {
                let discarded = total - i - 1;
                if discarded > 0 {
                    log::debug!("Discarding {} events queued after destroy", discarded);
                }
                break;
            }
        }
        Ok(())
    }

    fn handle_event(&mut self, event: Event) -> Result<()> {
        log::trace!("Event: {}", event.name());
        match event {
            Event::Input(input) => {
                self.input.apply(&input);
                self.simulation.handle_input(&input);
            }
            Event::WindowCreated(handle) => {
                if self.surface.is_ready() {
                    log::warn!("window-created while a surface is attached, releasing it first");
                    self.release_surface();
                }
                self.renderer.attach(&handle)?;
                self.attached = Some(handle.id());
                self.surface.on_created(handle);
                self.signal(Signal::SurfaceCreated);
            }
            Event::WindowResized { width, height } => {
                self.surface.on_resized(Extent::new(width, height));
            }
            Event::WindowDestroyed { release } => {
                let released = self.release_surface();
                self.signal(Signal::SurfaceDestroyed);
                if let (Some(tx), Some(id)) = (release, released) {
                    // The host may have stopped waiting
                    let _ = tx.try_send(id);
                }
            }
            Event::FocusGained => {
                self.focused = true;
                self.simulation.focus_changed(true);
            }
            Event::FocusLost => {
                self.focused = false;
                self.input.release_all();
                self.simulation.focus_changed(false);
            }
            Event::Pause => self.signal(Signal::Pause),
            Event::Resume => self.signal(Signal::Resume),
            Event::Destroy => self.signal(Signal::Destroy),
        }
        Ok(())
    }

    /// Replay a lifecycle signal on the loop side
    fn signal(&mut self, signal: Signal) {
        match self.lifecycle.apply(signal) {
            Ok(transition) => self.on_transition(transition),
            Err(e) => log::error!("Ignoring {}: {}", signal.name(), e),
        }
    }

    fn on_transition(&mut self, transition: Transition) {
        if !transition.changed() {
            return;
        }
        log::info!("Loop state {} -> {}", transition.from, transition.to);

        match (transition.from, transition.to) {
            (LoopState::Running, LoopState::Paused) => {
                self.pacer.suspend();
                self.last_tick = None;
            }
            (LoopState::Paused, LoopState::Running) => {
                self.pacer.reset();
                self.last_tick = None;
            }
            _ => {}
        }

        if transition.entered(LoopState::Terminated) {
            let pacer = self.pacer.status();
            log::info!(
                "Loop terminated after {} frames ({} missed deadlines)",
                pacer.frames_rendered,
                pacer.missed_deadlines
            );
        }
    }

    /// Flush in-flight work and unbind the renderer from the current surface
    ///
    /// Returns the id of the released surface. The host is blocked on a
    /// surface release, so GPU idle is waited for once.
    fn release_surface(&mut self) -> Option<SurfaceId> {
        self.release_surface_after(1)
    }

    fn release_surface_after(&mut self, idle_attempts: u32) -> Option<SurfaceId> {
        if self.attached.take().is_some() {
            self.wait_gpu_idle(idle_attempts);
            self.renderer.detach();
        }
        self.last_tick = None;
        self.surface.on_destroyed().map(|handle| handle.id())
    }

    /// Wait for in-flight GPU work, up to `attempts` idle timeouts
    fn wait_gpu_idle(&mut self, attempts: u32) {
        for attempt in 1..=attempts {
            match self.renderer.wait_idle(self.gpu_idle_timeout) {
                Ok(()) => return,
                Err(e) if attempt < attempts => {
                    log::warn!("GPU still busy ({}/{}): {}", attempt, attempts, e);
                }
                Err(e) => {
                    log::warn!("GPU did not go idle, releasing surface anyway: {}", e);
                }
            }
        }
    }

    fn step(&mut self) -> Result<TickOutcome> {
        match self.lifecycle.state() {
            LoopState::ShuttingDown => return self.shutdown(),
            LoopState::Terminated => return Ok(TickOutcome::Terminated),
            _ => {}
        }

        if self.lifecycle.state() != LoopState::Running || !self.surface.is_drawable() {
            self.last_tick = None;
            return Ok(TickOutcome::Idle);
        }

        if let Some(extent) = self.surface.take_resize() {
            log::debug!("Recreating size-dependent resources for {}", extent);
            match self.renderer.resize(extent) {
                Ok(()) => {}
                Err(e) if e.class() == ErrorClass::TransientResourceLoss => {
                    log::warn!("Resize failed, skipping frame: {}", e);
                    return Ok(TickOutcome::Skipped);
                }
                Err(e) => return Err(e),
            }
        }

        let now = self.clock.now();
        let dt = self
            .last_tick
            .map(|last| now.saturating_sub(last))
            .unwrap_or(Duration::ZERO);
        self.last_tick = Some(now);
        self.sim_time += dt;

        if !self.pacer.should_render(now) {
            let step = Step {
                dt,
                sim_time: self.sim_time,
                kind: StepKind::Bookkeeping,
            };
            self.simulation.advance(&step, &self.input);
            self.pacer.skip_tick();
            return Ok(TickOutcome::Bookkeeping);
        }

        let plan = self.pacer.begin_frame(now);
        let step = Step {
            dt,
            sim_time: self.sim_time,
            kind: if plan.previous_missed {
                StepKind::Reduced
            } else {
                StepKind::Full
            },
        };
        self.simulation.advance(&step, &self.input);

        let outcome = match self.render_frame(&plan) {
            Ok(submission) => {
                let feedback = PresentFeedback {
                    submitted_at: self.clock.now(),
                    gpu_time: submission.gpu_time,
                    actual_present: submission.actual_present,
                };
                let timing = self.pacer.end_frame(&plan, feedback);
                log::trace!(
                    "Frame {} cost {:?} (x{})",
                    timing.frame_index,
                    timing.cost,
                    timing.swap_interval
                );
                TickOutcome::Rendered(timing)
            }
            Err(e) if e.class() == ErrorClass::TransientResourceLoss => {
                log::warn!("Frame {} dropped: {}", plan.frame_index, e);
                TickOutcome::Skipped
            }
            Err(e) => return Err(e),
        };

        self.input.end_frame();
        Ok(outcome)
    }

    /// Draw and submit one frame
    ///
    /// Refuses to draw unless Running with a ready surface bound to the
    /// renderer.
    fn render_frame(&mut self, plan: &FramePlan) -> Result<Submission> {
        let state = self.lifecycle.state();
        let handle: &SurfaceHandle = match self.surface.handle() {
            Some(handle) if state == LoopState::Running && self.attached == Some(handle.id()) => {
                handle
            }
            _ => {
                let e = CoreError::DrawOutsideRunning {
                    state,
                    surface_ready: self.surface.is_ready(),
                };
                log::error!("{}", e);
                return Err(e);
            }
        };
        let extent = self.surface.extent().unwrap_or_else(|| handle.extent());

        self.draw_list.reset();
        self.simulation.draw(extent, &mut self.draw_list);

        let request = FrameRequest {
            frame_index: plan.frame_index,
            surface: handle,
            extent,
            swap_interval: plan.swap_interval,
            intended_present: plan.intended_present,
            draw_list: &self.draw_list,
        };
        self.renderer.render(&request)
    }

    fn shutdown(&mut self) -> Result<TickOutcome> {
        log::info!("Shutting down loop");
        self.release_surface_after(SHUTDOWN_IDLE_ATTEMPTS);
        self.renderer.release();
        let transition = self.lifecycle.apply(Signal::ShutdownComplete)?;
        self.on_transition(transition);
        Ok(TickOutcome::Terminated)
    }

    /// Best-effort cleanup after a fatal error
    fn abort(&mut self) {
        self.release_surface_after(SHUTDOWN_IDLE_ATTEMPTS);
        self.renderer.release();
        if !self.lifecycle.is_destroyed() {
            self.signal(Signal::Destroy);
        }
        self.signal(Signal::ShutdownComplete);
        self.publish();
    }

    fn publish(&self) {
        self.status.set(self.status());
    }
}
