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

//! pacedloop: a frame-paced native render/game loop core
//!
//! The core sits between an application-lifecycle host (an Android
//! GameActivity, or a desktop window) and an engine. The host forwards
//! lifecycle, window and input events; the core runs one dedicated loop
//! thread that advances a simulation by real time, draws through a renderer
//! and paces presentation against the display refresh.
//!
//! # Architecture
//!
//! - [`core::event`]: thread-safe event queue from host threads to the loop
//! - [`core::surface`]: surface state machine that gates rendering
//! - [`core::pacer`]: adaptive swap-interval frame pacer
//! - [`core::render_loop`]: the loop itself ([`Core`])
//! - [`core::lifecycle`]: lifecycle state machine and the host-facing
//!   [`LifecycleController`]
//! - [`frontend`] (feature `window`): winit + wgpu desktop host
//!
//! # Example
//!
//! ```
//! use pacedloop::core::config::CoreConfig;
//! use pacedloop::core::render::HeadlessRenderer;
//! use pacedloop::core::surface::SurfaceHandle;
//! use pacedloop::core::time::MonotonicClock;
//! use pacedloop::demo::BouncingQuads;
//! use pacedloop::{Core, LifecycleController};
//!
//! let core = Core::new(
//!     &CoreConfig::default(),
//!     HeadlessRenderer::new(),
//!     BouncingQuads::default(),
//!     MonotonicClock::new(),
//! )?;
//! let controller = LifecycleController::new(core);
//! controller.start()?;
//! controller.on_create(SurfaceHandle::headless(640, 480))?;
//! // ... forward pause/resume/input from the host ...
//! controller.on_destroy()?;
//! let status = controller.join()?;
//! println!("{} frames", status.frames_rendered);
//! # Ok::<(), pacedloop::CoreError>(())
//! ```
//!
//! # Error Handling
//!
//! All fallible operations return [`core::error::Result<T>`] which is an alias for
//! `Result<T, CoreError>`.

pub mod core;
pub mod demo;
#[cfg(feature = "window")]
pub mod frontend;

// Re-export commonly used types
pub use self::core::error::{CoreError, Result};
pub use self::core::lifecycle::{LifecycleController, LoopState};
pub use self::core::render_loop::{Core, CoreStatus};
