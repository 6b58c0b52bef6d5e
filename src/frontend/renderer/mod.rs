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

//! Rendering subsystem
//!
//! - [`RenderContext`]: device, queue and configured surface
//! - [`QuadRenderer`]: instanced pipeline drawing a [`DrawList`](crate::core::render::DrawList)
//! - [`WgpuRenderer`]: the loop's [`Renderer`](crate::core::render::Renderer)

mod context;
mod quad_renderer;
mod wgpu_renderer;

#[cfg(test)]
mod tests;

pub use context::{select_present_mode, RenderContext};
pub use quad_renderer::QuadRenderer;
pub use wgpu_renderer::WgpuRenderer;
