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

//! Renderer and simulation interfaces
//!
//! The loop thread talks to the GPU through a [`Renderer`] and to the engine
//! through a [`Simulation`]. Both are owned by the loop thread and never
//! touched from host threads.
//!
//! Per rendered frame the loop asks the simulation to fill a [`DrawList`] and
//! hands it to the renderer together with the borrowed surface in a
//! [`FrameRequest`].

use crate::core::error::Result;
use crate::core::event::InputEvent;
use crate::core::input::InputState;
use crate::core::surface::{Extent, SurfaceHandle};
use std::time::Duration;

/// RGBA color, components in `0.0..=1.0`
pub type Color = [f32; 4];

/// Axis-aligned rectangle in surface pixels
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }
}

/// Single draw command
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DrawCommand {
    /// Clear the whole surface
    Clear(Color),
    /// Solid-colored rectangle
    Quad { rect: Rect, color: Color },
}

/// Commands for one frame, in submission order
#[derive(Debug, Clone, Default)]
pub struct DrawList {
    commands: Vec<DrawCommand>,
}

impl DrawList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear_color(&mut self, color: Color) {
        self.commands.push(DrawCommand::Clear(color));
    }

    pub fn quad(&mut self, rect: Rect, color: Color) {
        self.commands.push(DrawCommand::Quad { rect, color });
    }

    /// Drop all commands, keeping the allocation
    pub fn reset(&mut self) {
        self.commands.clear();
    }

    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Last clear color in the list, if any
    pub fn background(&self) -> Option<Color> {
        self.commands.iter().rev().find_map(|c| match c {
            DrawCommand::Clear(color) => Some(*color),
            DrawCommand::Quad { .. } => None,
        })
    }

    /// Quads in submission order
    pub fn quads(&self) -> impl Iterator<Item = (Rect, Color)> + '_ {
        self.commands.iter().filter_map(|c| match c {
            DrawCommand::Quad { rect, color } => Some((*rect, *color)),
            DrawCommand::Clear(_) => None,
        })
    }
}

/// Everything a renderer needs for one frame
#[derive(Debug)]
pub struct FrameRequest<'a> {
    pub frame_index: u64,
    /// Surface borrowed for the duration of the frame
    pub surface: &'a SurfaceHandle,
    pub extent: Extent,
    /// Refresh periods this frame may take
    pub swap_interval: u32,
    /// Loop-clock timestamp the frame should reach the display
    pub intended_present: Duration,
    pub draw_list: &'a DrawList,
}

/// What the renderer observed while submitting a frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Submission {
    /// GPU execution time, when measured
    pub gpu_time: Option<Duration>,
    /// Loop-clock timestamp the frame reached the display, when the platform
    /// reports it
    pub actual_present: Option<Duration>,
}

/// GPU side of the loop
///
/// Errors classified as
/// [`TransientResourceLoss`](crate::core::error::ErrorClass::TransientResourceLoss)
/// (e.g. [`CoreError::SurfaceLost`](crate::core::error::CoreError::SurfaceLost))
/// make the loop skip the frame; anything else stops the loop.
pub trait Renderer: Send + 'static {
    /// Bind to a newly created surface
    fn attach(&mut self, surface: &SurfaceHandle) -> Result<()>;

    /// Recreate size-dependent resources
    fn resize(&mut self, extent: Extent) -> Result<()>;

    /// Record, submit and present one frame
    fn render(&mut self, frame: &FrameRequest<'_>) -> Result<Submission>;

    /// Block until submitted GPU work has retired, at most `timeout`
    fn wait_idle(&mut self, timeout: Duration) -> Result<()>;

    /// Drop everything tied to the current surface
    ///
    /// Called after [`wait_idle`](Renderer::wait_idle), before the host's
    /// window-destroyed returns.
    fn detach(&mut self);

    /// Drop all GPU resources (shutdown)
    fn release(&mut self);
}

/// Kind of simulation step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepKind {
    /// Normal update before a rendered frame
    Full,
    /// Cheaper update, the previous frame missed its deadline
    Reduced,
    /// No frame is due this tick, only advance time-keeping
    Bookkeeping,
}

/// One simulation step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Step {
    /// Real wall-clock time since the previous active tick
    pub dt: Duration,
    /// Simulated time after this step
    pub sim_time: Duration,
    pub kind: StepKind,
}

/// Engine side of the loop
pub trait Simulation: Send + 'static {
    /// Called for every input event, in arrival order
    fn handle_input(&mut self, _event: &InputEvent) {}

    /// Window focus changed
    fn focus_changed(&mut self, _focused: bool) {}

    /// Advance by `step.dt`
    fn advance(&mut self, step: &Step, input: &InputState);

    /// Fill the draw list for the frame about to be rendered
    fn draw(&mut self, extent: Extent, list: &mut DrawList);
}

/// Renderer without a GPU
///
/// Counts calls and reports no present timestamps, so a loop driving it runs
/// in degraded pacing mode. Optionally sleeps for a fixed cost per frame to
/// stand in for GPU work.
#[derive(Debug, Default)]
pub struct HeadlessRenderer {
    frame_cost: Duration,
    attached: Option<Extent>,
    frames: u64,
    commands: u64,
    resizes: u64,
    released: bool,
}

impl HeadlessRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sleep for `cost` on every rendered frame
    pub fn with_frame_cost(cost: Duration) -> Self {
        Self {
            frame_cost: cost,
            ..Self::default()
        }
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Draw commands consumed so far
    pub fn commands(&self) -> u64 {
        self.commands
    }

    pub fn resizes(&self) -> u64 {
        self.resizes
    }

    pub fn is_attached(&self) -> bool {
        self.attached.is_some()
    }

    pub fn is_released(&self) -> bool {
        self.released
    }
}

impl Renderer for HeadlessRenderer {
    fn attach(&mut self, surface: &SurfaceHandle) -> Result<()> {
        log::debug!("Headless renderer attached to {}", surface.id());
        self.attached = Some(surface.extent());
        Ok(())
    }

    fn resize(&mut self, extent: Extent) -> Result<()> {
        self.attached = Some(extent);
        self.resizes += 1;
        Ok(())
    }

    fn render(&mut self, frame: &FrameRequest<'_>) -> Result<Submission> {
        if !self.frame_cost.is_zero() {
            std::thread::sleep(self.frame_cost);
        }
        self.frames += 1;
        self.commands += frame.draw_list.len() as u64;
        Ok(Submission::default())
    }

    fn wait_idle(&mut self, _timeout: Duration) -> Result<()> {
        Ok(())
    }

    fn detach(&mut self) {
        self.attached = None;
    }

    fn release(&mut self) {
        self.attached = None;
        self.released = true;
        log::debug!("Headless renderer released after {} frames", self.frames);
    }
}
