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

//! Frontend module
//!
//! Desktop host for the loop. It uses winit for window management and wgpu
//! for presentation.
//!
//! # Architecture
//!
//! - [`Application`]: winit event handler driving the lifecycle controller
//! - [`input`]: winit keyboard / mouse / touch translation
//! - [`renderer`]: wgpu context and the quad renderer
//!
//! # Example
//!
//! ```no_run
//! use pacedloop::core::config::CoreConfig;
//! use pacedloop::demo::BouncingQuads;
//! use pacedloop::frontend::{Application, WindowOptions};
//! use winit::event_loop::EventLoop;
//!
//! let event_loop = EventLoop::new().unwrap();
//! let mut app = Application::new(
//!     &CoreConfig::default(),
//!     BouncingQuads::default(),
//!     WindowOptions::default(),
//! )
//! .unwrap();
//! event_loop.run_app(&mut app).unwrap();
//! ```

pub mod app;
pub mod input;
pub mod renderer;

#[cfg(test)]
mod tests;

pub use app::{Application, WindowOptions};
pub use input::InputTranslator;
pub use renderer::{RenderContext, WgpuRenderer};
