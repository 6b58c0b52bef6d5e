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

//! Host-facing lifecycle controller

use super::{Lifecycle, LoopState, Signal, Transition};
use crate::core::error::{CoreError, Result};
use crate::core::event::{Event, EventSender, InputEvent};
use crate::core::render::{Renderer, Simulation};
use crate::core::render_loop::{Core, CoreStatus, StatusHandle};
use crate::core::surface::{Extent, SurfaceHandle, SurfaceRelease};
use crate::core::time::Clock;
use std::io;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

type LoopMain = Box<dyn FnOnce() -> Result<CoreStatus> + Send>;
type LoopThread = JoinHandle<Result<CoreStatus>>;

/// Entry points called by the host
///
/// Every call is validated against the host-side [`Lifecycle`] on the calling
/// thread, then forwarded to the loop thread through the event queue. The
/// lifecycle lock is held until the event is queued, so concurrent callers
/// reach the loop in the order their transitions were accepted. Contract
/// violations are logged, returned and never queued.
///
/// # Example
///
/// ```
/// use pacedloop::core::config::CoreConfig;
/// use pacedloop::core::lifecycle::{LifecycleController, LoopState};
/// use pacedloop::core::render::HeadlessRenderer;
/// use pacedloop::core::render_loop::Core;
/// use pacedloop::core::surface::SurfaceHandle;
/// use pacedloop::core::time::MonotonicClock;
/// use pacedloop::demo::BouncingQuads;
/// use std::time::Duration;
///
/// let core = Core::new(
///     &CoreConfig::default(),
///     HeadlessRenderer::new(),
///     BouncingQuads::new(4),
///     MonotonicClock::new(),
/// )?;
/// let controller = LifecycleController::new(core);
/// controller.on_create(SurfaceHandle::headless(320, 240))?;
/// controller.start()?;
///
/// controller.on_destroy()?;
/// controller.wait_terminated(Duration::from_secs(5))?;
/// assert_eq!(controller.status().state, LoopState::Terminated);
/// # Ok::<(), pacedloop::core::error::CoreError>(())
/// ```
pub struct LifecycleController {
    sender: EventSender,
    lifecycle: Mutex<Lifecycle>,
    status: StatusHandle,
    /// Loop entry point until the loop thread takes it
    pending: Arc<Mutex<Option<LoopMain>>>,
    thread: Mutex<Option<LoopThread>>,
    done: flume::Receiver<()>,
    release_timeout: Duration,
}

impl LifecycleController {
    /// Wrap a loop core; nothing runs until [`start`](Self::start)
    pub fn new<R, S, C>(core: Core<R, S, C>) -> Self
    where
        R: Renderer,
        S: Simulation,
        C: Clock,
    {
        let sender = core.sender();
        let status = core.status_handle();
        let release_timeout = core.surface_release_timeout();
        let (done_tx, done) = flume::bounded(1);

        let main: LoopMain = Box::new(move || {
            let result = core.run();
            let _ = done_tx.send(());
            result
        });

        Self {
            sender,
            lifecycle: Mutex::new(Lifecycle::new()),
            status,
            pending: Arc::new(Mutex::new(Some(main))),
            thread: Mutex::new(None),
            done,
            release_timeout,
        }
    }

    /// Spawn the loop thread
    ///
    /// Start is only committed once the thread exists; after a failed spawn
    /// the controller is still startable.
    ///
    /// # Errors
    ///
    /// - [`CoreError::AlreadyStarted`] on a second call
    /// - [`CoreError::AfterDestroy`] after [`on_destroy`](Self::on_destroy)
    /// - [`CoreError::Io`] if the thread cannot be spawned
    pub fn start(&self) -> Result<()> {
        self.start_with(|main| {
            thread::Builder::new()
                .name("pacedloop-core".to_string())
                .spawn(main)
        })
    }

    pub(crate) fn start_with<F>(&self, spawn: F) -> Result<()>
    where
        F: FnOnce(LoopMain) -> io::Result<LoopThread>,
    {
        let mut lifecycle = lock(&self.lifecycle);
        apply_then(&mut lifecycle, Signal::Start, || {
            if lock(&self.pending).is_none() {
                return Err(CoreError::AlreadyStarted);
            }
            // The thread takes the entry point itself, a failed spawn leaves it here
            let slot = Arc::clone(&self.pending);
            let main: LoopMain = Box::new(move || match lock(&slot).take() {
                Some(main) => main(),
                None => Err(CoreError::AlreadyStarted),
            });
            let handle = spawn(main).inspect_err(|e| {
                log::error!("Failed to spawn loop thread: {}", e);
            })?;
            *lock(&self.thread) = Some(handle);
            Ok(())
        })?;
        log::info!("Loop thread started");
        Ok(())
    }

    /// A drawable surface became available
    pub fn on_create(&self, surface: SurfaceHandle) -> Result<()> {
        self.forward(Signal::SurfaceCreated, Event::WindowCreated(surface))
    }

    /// The surface changed size
    pub fn on_window_resized(&self, width: u32, height: u32) -> Result<()> {
        log::debug!("Host resize to {}", Extent::new(width, height));
        self.forward_event(Event::WindowResized { width, height })
    }

    /// The surface is going away
    ///
    /// Returns an acknowledgement the host can wait on (see
    /// [`release_surface`](Self::release_surface)) before letting the
    /// platform destroy the native window.
    pub fn on_window_destroyed(&self) -> Result<SurfaceRelease> {
        let (tx, release) = SurfaceRelease::channel();
        self.forward(
            Signal::SurfaceDestroyed,
            Event::WindowDestroyed { release: Some(tx) },
        )?;
        Ok(release)
    }

    /// [`on_window_destroyed`](Self::on_window_destroyed), then wait up to
    /// the configured surface release timeout for the loop to let go
    pub fn release_surface(&self) -> Result<()> {
        let release = self.on_window_destroyed()?;
        if !self.is_running() {
            return Ok(());
        }
        match release.wait(self.release_timeout)? {
            Some(id) => log::debug!("Loop released {}", id),
            None => log::debug!("No surface was attached"),
        }
        Ok(())
    }

    pub fn on_pause(&self) -> Result<()> {
        self.forward(Signal::Pause, Event::Pause)
    }

    pub fn on_resume(&self) -> Result<()> {
        self.forward(Signal::Resume, Event::Resume)
    }

    /// Request shutdown
    ///
    /// If the loop was never started there is nothing to release and the
    /// controller goes straight to Terminated.
    pub fn on_destroy(&self) -> Result<()> {
        let mut lifecycle = lock(&self.lifecycle);
        if lifecycle.is_started() {
            apply_then(&mut lifecycle, Signal::Destroy, || {
                self.sender.push(Event::Destroy)
            })?;
            return Ok(());
        }

        apply_then(&mut lifecycle, Signal::Destroy, || Ok(()))?;
        drop(lock(&self.pending).take());
        lifecycle.apply(Signal::ShutdownComplete)?;
        self.status.set(CoreStatus {
            state: lifecycle.state(),
            ..self.status.get()
        });
        log::info!("Destroyed before start");
        Ok(())
    }

    pub fn on_focus_changed(&self, focused: bool) -> Result<()> {
        let event = if focused {
            Event::FocusGained
        } else {
            Event::FocusLost
        };
        self.forward_event(event)
    }

    pub fn on_input_event(&self, input: InputEvent) -> Result<()> {
        self.forward_event(Event::Input(input))
    }

    /// Latest status published by the loop
    pub fn status(&self) -> CoreStatus {
        self.status.get()
    }

    /// Host-side lifecycle state
    ///
    /// Runs ahead of [`status`](Self::status) by whatever is still queued.
    pub fn host_state(&self) -> LoopState {
        lock(&self.lifecycle).state()
    }

    /// Whether the loop thread is alive
    pub fn is_running(&self) -> bool {
        lock(&self.thread)
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Wait until the loop thread has finished
    ///
    /// # Errors
    ///
    /// [`CoreError::Timeout`] if the loop is still running after `timeout`.
    pub fn wait_terminated(&self, timeout: Duration) -> Result<()> {
        {
            let lifecycle = lock(&self.lifecycle);
            if !lifecycle.is_started() && !lifecycle.is_destroyed() {
                return Err(CoreError::Timeout("loop termination (never started)"));
            }
        }
        match self.done.recv_timeout(timeout) {
            Ok(()) | Err(flume::RecvTimeoutError::Disconnected) => Ok(()),
            Err(flume::RecvTimeoutError::Timeout) => Err(CoreError::Timeout("loop termination")),
        }
    }

    /// Join the loop thread and return its final status
    ///
    /// Returns the latest status if the loop was never started or was
    /// already joined.
    ///
    /// # Errors
    ///
    /// The loop's fatal error, or [`CoreError::ThreadPanicked`].
    pub fn join(&self) -> Result<CoreStatus> {
        let handle = lock(&self.thread).take();
        match handle {
            Some(handle) => handle.join().map_err(|_| CoreError::ThreadPanicked)?,
            None => Ok(self.status.get()),
        }
    }

    /// Validate `signal` and queue `event` under the lifecycle lock
    fn forward(&self, signal: Signal, event: Event) -> Result<()> {
        let mut lifecycle = lock(&self.lifecycle);
        apply_then(&mut lifecycle, signal, || self.sender.push(event))?;
        Ok(())
    }

    /// Queue a non-lifecycle event unless destroy was accepted
    fn forward_event(&self, event: Event) -> Result<()> {
        let lifecycle = lock(&self.lifecycle);
        lifecycle.check_accepts(event.name()).inspect_err(|e| {
            log::error!("Rejected {}: {}", event.name(), e);
        })?;
        self.sender.push(event)
    }
}

/// Apply `signal` to a copy of `lifecycle`, run `then`, and commit the copy
/// only if both succeed
fn apply_then<F>(lifecycle: &mut Lifecycle, signal: Signal, then: F) -> Result<Transition>
where
    F: FnOnce() -> Result<()>,
{
    let mut next = lifecycle.clone();
    let transition = next.apply(signal).inspect_err(|e| {
        log::error!("Rejected {}: {}", signal.name(), e);
    })?;
    then()?;
    *lifecycle = next;

    if transition.changed() {
        log::debug!(
            "Host lifecycle {} -> {} on {}",
            transition.from,
            transition.to,
            signal.name()
        );
    }
    Ok(transition)
}

impl Drop for LifecycleController {
    fn drop(&mut self) {
        let destroyed = lock(&self.lifecycle).is_destroyed();
        if !destroyed {
            if let Err(e) = self.on_destroy() {
                log::warn!("Destroy on drop failed: {}", e);
            }
        }
        if let Err(e) = self.join() {
            log::error!("Loop thread ended with error: {}", e);
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
