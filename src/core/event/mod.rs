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

//! Host events and the queue that carries them to the loop thread
//!
//! The host (activity glue or a desktop window) turns every platform callback
//! into exactly one [`Event`] and pushes it through an [`EventSender`]. The
//! loop thread is the sole consumer and drains the [`EventQueue`] once per
//! iteration.
//!
//! Events fall into two classes (see [`EventClass`]):
//!
//! - **Control**: window and lifecycle events. Never dropped.
//! - **Input**: pointer and key events. May be rejected when the queue has an
//!   input capacity configured and that many input events are still pending.

mod queue;

pub use queue::{EventQueue, EventSender};

use crate::core::input::Key;
use crate::core::surface::{SurfaceHandle, SurfaceId};
use std::time::Duration;

/// Pointer (touch / mouse) action
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerAction {
    /// Finger touched down / button pressed
    Down,
    /// Finger lifted / button released
    Up,
    /// Pointer moved while tracked
    Move,
    /// Gesture cancelled by the platform
    Cancel,
}

/// Key action
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    Down,
    Up,
}

/// Input event delivered by the host
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    /// Touch or mouse event
    Pointer {
        /// Pointer (finger) id, 0 for the primary pointer
        id: u32,
        action: PointerAction,
        /// Position in physical surface pixels
        x: f32,
        y: f32,
        /// Host timestamp
        timestamp: Duration,
    },
    /// Keyboard / hardware key event
    Key {
        key: Key,
        action: KeyAction,
        timestamp: Duration,
    },
}

impl InputEvent {
    /// Host timestamp of the event
    pub fn timestamp(&self) -> Duration {
        match self {
            InputEvent::Pointer { timestamp, .. } | InputEvent::Key { timestamp, .. } => {
                *timestamp
            }
        }
    }
}

/// Event class, used for queue priority
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventClass {
    Control,
    Input,
}

/// Event pushed by the host and consumed exactly once by the loop
#[derive(Debug, Clone)]
pub enum Event {
    /// Pointer or key input
    Input(InputEvent),
    /// A drawable surface became available
    WindowCreated(SurfaceHandle),
    /// The current surface changed size
    WindowResized { width: u32, height: u32 },
    /// The current surface is going away
    ///
    /// `release` is signalled by the loop once the surface has been released
    /// (see [`SurfaceRelease`](crate::core::surface::SurfaceRelease)).
    WindowDestroyed { release: Option<flume::Sender<SurfaceId>> },
    FocusGained,
    FocusLost,
    Pause,
    Resume,
    Destroy,
}

impl Event {
    /// Class of this event
    pub fn class(&self) -> EventClass {
        match self {
            Event::Input(_) => EventClass::Input,
            _ => EventClass::Control,
        }
    }

    /// Short name for logs and diagnostics
    pub fn name(&self) -> &'static str {
        match self {
            Event::Input(InputEvent::Pointer { .. }) => "pointer",
            Event::Input(InputEvent::Key { .. }) => "key",
            Event::WindowCreated(_) => "window-created",
            Event::WindowResized { .. } => "window-resized",
            Event::WindowDestroyed { .. } => "window-destroyed",
            Event::FocusGained => "focus-gained",
            Event::FocusLost => "focus-lost",
            Event::Pause => "pause",
            Event::Resume => "resume",
            Event::Destroy => "destroy",
        }
    }
}
