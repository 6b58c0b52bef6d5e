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

//! [`Renderer`] backed by wgpu and a winit window

use super::context::RenderContext;
use super::quad_renderer::QuadRenderer;
use crate::core::error::{CoreError, Result};
use crate::core::render::{FrameRequest, Renderer, Submission};
use crate::core::surface::{Extent, SurfaceHandle, SurfaceId};
use std::sync::Arc;
use std::time::Duration;
use winit::window::Window;

/// Resources tied to one attached window
struct Attached {
    id: SurfaceId,
    context: RenderContext,
    quads: QuadRenderer,
}

/// wgpu renderer
///
/// Expects the [`SurfaceHandle`] payload to be an `Arc<Window>`. The device
/// is created per attach so a recreated window may land on a different
/// adapter.
pub struct WgpuRenderer {
    vsync: bool,
    attached: Option<Attached>,
}

impl WgpuRenderer {
    pub fn new(vsync: bool) -> Self {
        Self {
            vsync,
            attached: None,
        }
    }

    pub fn is_attached(&self) -> bool {
        self.attached.is_some()
    }

    fn attached_mut(&mut self, what: &str) -> Result<&mut Attached> {
        self.attached
            .as_mut()
            .ok_or_else(|| CoreError::Renderer(format!("{} without an attached surface", what)))
    }
}

impl Renderer for WgpuRenderer {
    fn attach(&mut self, surface: &SurfaceHandle) -> Result<()> {
        let window = surface
            .payload::<Arc<Window>>()
            .ok_or_else(|| CoreError::Renderer(format!("{} is not a winit window", surface.id())))?;

        let context = pollster::block_on(RenderContext::new(window, self.vsync))?;
        let quads = QuadRenderer::new(&context.device, context.surface_config.format);

        self.attached = Some(Attached {
            id: surface.id(),
            context,
            quads,
        });
        log::info!("Attached to {}", surface.id());
        Ok(())
    }

    fn resize(&mut self, extent: Extent) -> Result<()> {
        self.attached_mut("resize")?.context.resize(extent);
        Ok(())
    }

    fn render(&mut self, frame: &FrameRequest<'_>) -> Result<Submission> {
        let attached = self.attached_mut("render")?;
        if attached.id != frame.surface.id() {
            return Err(CoreError::Renderer(format!(
                "frame for {} but {} is attached",
                frame.surface.id(),
                attached.id
            )));
        }

        let output = match attached.context.surface.get_current_texture() {
            Ok(output) => output,
            Err(wgpu::SurfaceError::Outdated | wgpu::SurfaceError::Lost) => {
                log::warn!("Surface outdated or lost, reconfiguring");
                attached.context.reconfigure();
                return Err(CoreError::SurfaceLost("outdated".into()));
            }
            Err(wgpu::SurfaceError::Timeout) => {
                log::warn!("Surface texture acquisition timed out");
                return Err(CoreError::SurfaceLost("acquire timeout".into()));
            }
            Err(e) => {
                return Err(CoreError::Renderer(format!(
                    "Failed to acquire surface texture: {}",
                    e
                )));
            }
        };

        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let mut encoder =
            attached
                .context
                .device
                .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                    label: Some("Frame Encoder"),
                });

        attached.quads.render(
            &mut encoder,
            &view,
            frame.draw_list,
            attached.context.extent(),
            &attached.context.device,
            &attached.context.queue,
        );

        attached.context.queue.submit(std::iter::once(encoder.finish()));
        output.present();

        // wgpu exposes neither present timestamps nor per-pass GPU timing
        // without optional features; the pacer falls back to 1x.
        Ok(Submission::default())
    }

    fn wait_idle(&mut self, timeout: Duration) -> Result<()> {
        match &self.attached {
            Some(attached) => attached.context.wait_idle(timeout),
            None => Ok(()),
        }
    }

    fn detach(&mut self) {
        if let Some(attached) = self.attached.take() {
            log::info!("Detached from {}", attached.id);
        }
    }

    fn release(&mut self) {
        self.detach();
        log::info!("wgpu renderer released");
    }
}
