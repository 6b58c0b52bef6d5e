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

//! Application lifecycle
//!
//! [`Lifecycle`] is the pure state machine shared by both sides of the queue:
//! the [`LifecycleController`] validates every host call against its own copy
//! before the event is queued, and the loop replays the same signals when it
//! drains them.
//!
//! ```text
//! Uninitialized --start + window-created--> Running
//! Running  --pause-->   Paused
//! Paused   --resume-->  Running
//! *        --destroy--> ShuttingDown --shutdown complete--> Terminated
//! ```
//!
//! Before the first surface, `pause`/`resume` only mark the app as
//! backgrounded or foregrounded; platforms deliver `resume` before the first
//! window exists.

mod controller;
#[cfg(test)]
mod tests;

pub use controller::LifecycleController;

use crate::core::error::{CoreError, Result};
use serde::Serialize;
use std::fmt;

/// Loop state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub enum LoopState {
    /// Waiting for start and the first surface
    #[default]
    Uninitialized,
    /// Drawing frames (when a surface is attached)
    Running,
    /// Backgrounded; simulation retained, no draws
    Paused,
    /// Destroy requested, releasing resources
    ShuttingDown,
    /// Loop thread finished
    Terminated,
}

impl fmt::Display for LoopState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LoopState::Uninitialized => "Uninitialized",
            LoopState::Running => "Running",
            LoopState::Paused => "Paused",
            LoopState::ShuttingDown => "ShuttingDown",
            LoopState::Terminated => "Terminated",
        };
        f.write_str(name)
    }
}

/// Input to the lifecycle state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    Start,
    SurfaceCreated,
    SurfaceDestroyed,
    Pause,
    Resume,
    Destroy,
    /// Loop released its resources
    ShutdownComplete,
}

impl Signal {
    pub fn name(&self) -> &'static str {
        match self {
            Signal::Start => "start",
            Signal::SurfaceCreated => "window-created",
            Signal::SurfaceDestroyed => "window-destroyed",
            Signal::Pause => "pause",
            Signal::Resume => "resume",
            Signal::Destroy => "destroy",
            Signal::ShutdownComplete => "shutdown-complete",
        }
    }
}

/// Result of applying a [`Signal`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub from: LoopState,
    pub to: LoopState,
}

impl Transition {
    /// Whether the state changed
    pub fn changed(&self) -> bool {
        self.from != self.to
    }

    /// Whether this transition entered `state`
    pub fn entered(&self, state: LoopState) -> bool {
        self.changed() && self.to == state
    }
}

/// Lifecycle state machine
///
/// Contract violations are returned as errors and leave the state unchanged.
///
/// # Example
///
/// ```
/// use pacedloop::core::lifecycle::{Lifecycle, LoopState, Signal};
///
/// let mut lifecycle = Lifecycle::new();
/// lifecycle.apply(Signal::Start).unwrap();
/// lifecycle.apply(Signal::SurfaceCreated).unwrap();
/// assert_eq!(lifecycle.state(), LoopState::Running);
///
/// // resume without a preceding pause
/// assert!(lifecycle.apply(Signal::Resume).is_err());
/// assert_eq!(lifecycle.state(), LoopState::Running);
/// ```
#[derive(Debug, Clone, Default)]
pub struct Lifecycle {
    state: LoopState,
    started: bool,
    has_surface: bool,
    backgrounded: bool,
}

impl Lifecycle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn is_started(&self) -> bool {
        self.started
    }

    pub fn has_surface(&self) -> bool {
        self.has_surface
    }

    /// Whether `destroy` has been accepted
    pub fn is_destroyed(&self) -> bool {
        matches!(self.state, LoopState::ShuttingDown | LoopState::Terminated)
    }

    /// Reject non-lifecycle host events (input, resize, focus) after destroy
    pub fn check_accepts(&self, event: &'static str) -> Result<()> {
        if self.is_destroyed() {
            return Err(CoreError::AfterDestroy {
                event,
                state: self.state,
            });
        }
        Ok(())
    }

    /// Apply a signal
    ///
    /// # Errors
    ///
    /// - [`CoreError::AlreadyStarted`] on a second `Start`
    /// - [`CoreError::ResumeWithoutPause`] on `Resume` while Running
    /// - [`CoreError::PauseWhilePaused`] on `Pause` while Paused
    /// - [`CoreError::AfterDestroy`] on any signal after `Destroy`
    pub fn apply(&mut self, signal: Signal) -> Result<Transition> {
        let from = self.state;

        if self.is_destroyed() {
            return match (from, signal) {
                (LoopState::ShuttingDown, Signal::ShutdownComplete) => {
                    self.state = LoopState::Terminated;
                    Ok(Transition {
                        from,
                        to: self.state,
                    })
                }
                _ => Err(CoreError::AfterDestroy {
                    event: signal.name(),
                    state: from,
                }),
            };
        }

        match signal {
            Signal::Start => {
                if self.started {
                    return Err(CoreError::AlreadyStarted);
                }
                self.started = true;
            }
            Signal::SurfaceCreated => self.has_surface = true,
            Signal::SurfaceDestroyed => self.has_surface = false,
            Signal::Pause => match from {
                LoopState::Running => self.state = LoopState::Paused,
                LoopState::Paused => return Err(CoreError::PauseWhilePaused),
                _ => {
                    if self.backgrounded {
                        return Err(CoreError::PauseWhilePaused);
                    }
                    self.backgrounded = true;
                }
            },
            Signal::Resume => match from {
                LoopState::Paused => self.state = LoopState::Running,
                LoopState::Running => {
                    return Err(CoreError::ResumeWithoutPause { state: from });
                }
                _ => self.backgrounded = false,
            },
            Signal::Destroy => self.state = LoopState::ShuttingDown,
            Signal::ShutdownComplete => {
                log::warn!("shutdown-complete while {}, ignored", from);
            }
        }

        if self.state == LoopState::Uninitialized
            && self.started
            && self.has_surface
            && !self.backgrounded
        {
            self.state = LoopState::Running;
        }

        Ok(Transition {
            from,
            to: self.state,
        })
    }
}
