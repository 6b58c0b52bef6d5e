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

//! Desktop host
//!
//! Maps winit's application callbacks onto the [`LifecycleController`]
//! entry points. The loop renders on its own thread; this side only owns
//! the window and forwards events.

use crate::core::config::CoreConfig;
use crate::core::error::Result;
use crate::core::event::InputEvent;
use crate::core::lifecycle::{LifecycleController, LoopState};
use crate::core::render::Simulation;
use crate::core::render_loop::{Core, CoreStatus};
use crate::core::surface::{Extent, SurfaceHandle};
use crate::core::time::MonotonicClock;
use crate::frontend::input::InputTranslator;
use crate::frontend::renderer::WgpuRenderer;
use std::sync::Arc;
use std::time::{Duration, Instant};
use winit::{
    application::ApplicationHandler,
    event::WindowEvent,
    event_loop::{ActiveEventLoop, ControlFlow},
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowId},
};

/// How often the event loop wakes to check the loop status
const STATUS_POLL: Duration = Duration::from_millis(100);

/// How often the status line is logged
const STATUS_LOG_INTERVAL: Duration = Duration::from_secs(1);

/// Upper bound on waiting for the loop thread at exit
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

/// Window creation options
#[derive(Debug, Clone)]
pub struct WindowOptions {
    pub title: String,
    /// Logical size
    pub width: u32,
    pub height: u32,
    /// Close after this many rendered frames
    pub frame_limit: Option<u64>,
}

impl Default for WindowOptions {
    fn default() -> Self {
        Self {
            title: "pacedloop".to_string(),
            width: 800,
            height: 600,
            frame_limit: None,
        }
    }
}

/// Desktop application
///
/// # Example
///
/// ```no_run
/// use pacedloop::core::config::CoreConfig;
/// use pacedloop::demo::BouncingQuads;
/// use pacedloop::frontend::{Application, WindowOptions};
/// use winit::event_loop::EventLoop;
///
/// let event_loop = EventLoop::new().unwrap();
/// let mut app = Application::new(
///     &CoreConfig::default(),
///     BouncingQuads::default(),
///     WindowOptions::default(),
/// )
/// .unwrap();
/// event_loop.run_app(&mut app).unwrap();
/// let status = app.finish().unwrap();
/// ```
pub struct Application {
    controller: LifecycleController,
    options: WindowOptions,
    window: Option<Arc<Window>>,
    input: InputTranslator,
    /// Origin for input timestamps
    epoch: Instant,
    /// Loop thread spawned
    started: bool,
    /// A surface was handed to the loop and not yet released
    surface_live: bool,
    /// Host-side pause state last reported to the controller
    paused: bool,
    /// Paused from the keyboard (`Space`)
    user_paused: bool,
    /// Window fully hidden or minimised
    occluded: bool,
    /// Between winit `suspended` and `resumed`
    suspended: bool,
    exit_requested: bool,
    last_status_log: Instant,
}

impl Application {
    /// Build the loop core around a [`WgpuRenderer`] and `simulation`
    ///
    /// # Errors
    ///
    /// [`CoreError::Config`](crate::core::error::CoreError::Config) for an
    /// invalid configuration.
    pub fn new<S: Simulation>(
        config: &CoreConfig,
        simulation: S,
        options: WindowOptions,
    ) -> Result<Self> {
        let core = Core::new(
            config,
            WgpuRenderer::new(config.pacer.vsync),
            simulation,
            MonotonicClock::new(),
        )?;

        Ok(Self {
            controller: LifecycleController::new(core),
            options,
            window: None,
            input: InputTranslator::new(),
            epoch: Instant::now(),
            started: false,
            surface_live: false,
            paused: false,
            user_paused: false,
            occluded: false,
            suspended: false,
            exit_requested: false,
            last_status_log: Instant::now(),
        })
    }

    /// Latest status published by the loop
    pub fn status(&self) -> CoreStatus {
        self.controller.status()
    }

    /// Join the loop thread after the event loop has returned
    pub fn finish(&self) -> Result<CoreStatus> {
        if !self.exit_requested {
            self.controller.on_destroy()?;
        }
        self.controller.join()
    }

    /// Toggle the user pause
    pub fn toggle_pause(&mut self) {
        self.user_paused = !self.user_paused;
        log::info!(
            "Loop {}",
            if self.user_paused { "paused" } else { "resumed" }
        );
        self.sync_pause();
    }

    /// Toggle fullscreen mode
    pub fn toggle_fullscreen(&mut self) {
        if let Some(window) = &self.window {
            if window.fullscreen().is_some() {
                window.set_fullscreen(None);
                log::info!("Switched to windowed mode");
            } else {
                window.set_fullscreen(Some(winit::window::Fullscreen::Borderless(None)));
                log::info!("Switched to fullscreen mode");
            }
        }
    }

    /// Report pause / resume when the combined background state changes
    fn sync_pause(&mut self) {
        let want = self.user_paused || self.occluded || self.suspended;
        if want == self.paused {
            return;
        }
        let result = if want {
            self.controller.on_pause()
        } else {
            self.controller.on_resume()
        };
        match result {
            Ok(()) => self.paused = want,
            Err(e) => log::warn!("Pause state not updated: {}", e),
        }
    }

    fn create_window(&mut self, event_loop: &ActiveEventLoop) -> Option<Arc<Window>> {
        let attributes = Window::default_attributes()
            .with_title(self.options.title.clone())
            .with_inner_size(winit::dpi::LogicalSize::new(
                self.options.width,
                self.options.height,
            ))
            .with_resizable(true);

        match event_loop.create_window(attributes) {
            Ok(window) => Some(Arc::new(window)),
            Err(e) => {
                log::error!("Failed to create window: {}", e);
                None
            }
        }
    }

    fn hand_over_surface(&mut self, window: &Arc<Window>) {
        if self.surface_live {
            return;
        }
        let size = window.inner_size();
        let surface = SurfaceHandle::new(window.clone(), Extent::new(size.width, size.height));
        match self.controller.on_create(surface) {
            Ok(()) => self.surface_live = true,
            Err(e) => log::error!("Surface not handed to the loop: {}", e),
        }
    }

    fn forward(&self, event: Option<InputEvent>) {
        if let Some(event) = event {
            if let Err(e) = self.controller.on_input_event(event) {
                log::debug!("Input dropped: {}", e);
            }
        }
    }

    fn timestamp(&self) -> Duration {
        self.epoch.elapsed()
    }

    fn shutdown(&mut self, event_loop: &ActiveEventLoop) {
        if !self.exit_requested {
            self.exit_requested = true;
            if let Err(e) = self.controller.on_destroy() {
                log::warn!("Destroy failed: {}", e);
            }
            if let Err(e) = self.controller.wait_terminated(SHUTDOWN_TIMEOUT) {
                log::error!("Loop did not terminate: {}", e);
            }
        }
        event_loop.exit();
    }

    fn handle_hotkey(&mut self, code: KeyCode) -> bool {
        match code {
            KeyCode::Space => self.toggle_pause(),
            KeyCode::F11 => self.toggle_fullscreen(),
            _ => return false,
        }
        true
    }
}

impl ApplicationHandler for Application {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_none() {
            let Some(window) = self.create_window(event_loop) else {
                self.shutdown(event_loop);
                return;
            };
            self.window = Some(window);
        }

        if let Some(window) = self.window.clone() {
            self.hand_over_surface(&window);
        }

        if !self.started {
            if let Err(e) = self.controller.start() {
                log::error!("Failed to start loop: {}", e);
                self.shutdown(event_loop);
                return;
            }
            self.started = true;
            log::info!("Application initialized successfully");
        }

        self.suspended = false;
        self.sync_pause();
    }

    fn suspended(&mut self, _event_loop: &ActiveEventLoop) {
        self.suspended = true;
        self.sync_pause();

        if self.surface_live {
            if let Err(e) = self.controller.release_surface() {
                log::warn!("Surface release: {}", e);
            }
            self.surface_live = false;
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => {
                log::info!("Close requested, exiting");
                self.shutdown(event_loop);
            }
            WindowEvent::Resized(size) => {
                if let Err(e) = self.controller.on_window_resized(size.width, size.height) {
                    log::debug!("Resize dropped: {}", e);
                }
            }
            WindowEvent::Focused(focused) => {
                if let Err(e) = self.controller.on_focus_changed(focused) {
                    log::debug!("Focus change dropped: {}", e);
                }
            }
            WindowEvent::Occluded(occluded) => {
                self.occluded = occluded;
                self.sync_pause();
            }
            WindowEvent::KeyboardInput { event, .. } => {
                if let PhysicalKey::Code(code) = event.physical_key {
                    if event.state.is_pressed() && !event.repeat && self.handle_hotkey(code) {
                        return;
                    }
                    let input = self
                        .input
                        .key(code, event.state, event.repeat, self.timestamp());
                    self.forward(input);
                }
            }
            WindowEvent::CursorMoved { position, .. } => {
                let ts = self.timestamp();
                let input = self.input.cursor_moved(position.x, position.y, ts);
                self.forward(input);
            }
            WindowEvent::CursorLeft { .. } => {
                let ts = self.timestamp();
                let input = self.input.cursor_left(ts);
                self.forward(input);
            }
            WindowEvent::MouseInput { state, button, .. } => {
                let ts = self.timestamp();
                let input = self.input.mouse_button(button, state, ts);
                self.forward(input);
            }
            WindowEvent::Touch(touch) => {
                let ts = self.timestamp();
                let input = self.input.touch(
                    touch.id,
                    touch.phase,
                    touch.location.x,
                    touch.location.y,
                    ts,
                );
                self.forward(input);
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        if self.exit_requested {
            return;
        }

        let status = self.controller.status();
        if status.state == LoopState::Terminated {
            log::error!("Loop stopped unexpectedly, exiting");
            self.shutdown(event_loop);
            return;
        }

        if let Some(limit) = self.options.frame_limit {
            if status.frames_rendered >= limit {
                log::info!("Rendered {} frames, exiting", status.frames_rendered);
                self.shutdown(event_loop);
                return;
            }
        }

        if self.last_status_log.elapsed() >= STATUS_LOG_INTERVAL {
            self.last_status_log = Instant::now();
            log::debug!(
                "{} | {:.1} fps | {}x swap | cost {:.2} ms (avg {:.2}) | {} missed ({} recent)",
                status.state,
                status.fps,
                status.swap_interval,
                status.estimated_cost_ms,
                status.average_cost_ms,
                status.missed_deadlines,
                status.recent_missed
            );
        }

        event_loop.set_control_flow(ControlFlow::WaitUntil(Instant::now() + STATUS_POLL));
    }
}
