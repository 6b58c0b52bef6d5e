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

//! wgpu rendering context
//!
//! Owns the GPU device, queue, surface and surface configuration for one
//! attached window.

use crate::core::error::{CoreError, Result};
use crate::core::surface::Extent;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use winit::window::Window;

/// wgpu rendering context
pub struct RenderContext {
    /// wgpu device for creating GPU resources
    pub device: wgpu::Device,
    /// Command queue for submitting GPU commands
    pub queue: wgpu::Queue,
    /// Surface for rendering to the window
    pub surface: wgpu::Surface<'static>,
    /// Surface configuration (format, size, present mode, etc.)
    pub surface_config: wgpu::SurfaceConfiguration,
}

impl RenderContext {
    /// Create a rendering context for `window`
    ///
    /// `vsync` selects FIFO presentation; otherwise the lowest-latency
    /// unpaced mode the surface supports is used.
    ///
    /// # Errors
    ///
    /// [`CoreError::Renderer`] if no adapter or device is available.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use std::sync::Arc;
    /// use winit::window::Window;
    /// use pacedloop::frontend::renderer::RenderContext;
    ///
    /// async fn create_context(window: Arc<Window>) {
    ///     let context = RenderContext::new(&window, true).await.unwrap();
    /// }
    /// ```
    pub async fn new(window: &Arc<Window>, vsync: bool) -> Result<Self> {
        let size = window.inner_size();

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let surface = instance
            .create_surface(window.clone())
            .map_err(|e| CoreError::Renderer(format!("Failed to create surface: {}", e)))?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .map_err(|e| {
                CoreError::Renderer(format!("Failed to find suitable GPU adapter: {}", e))
            })?;

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("pacedloop device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: Default::default(),
                experimental_features: Default::default(),
                trace: wgpu::Trace::Off,
            })
            .await
            .map_err(|e| CoreError::Renderer(format!("Failed to create device: {}", e)))?;

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .or_else(|| surface_caps.formats.first().copied())
            .ok_or_else(|| CoreError::Renderer("Surface reports no formats".into()))?;
        let alpha_mode = surface_caps
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);
        let present_mode = select_present_mode(&surface_caps.present_modes, vsync);

        let surface_config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };

        surface.configure(&device, &surface_config);

        log::info!(
            "Initialized wgpu context: {}x{}, format: {:?}, present mode: {:?}",
            size.width,
            size.height,
            surface_format,
            present_mode
        );

        Ok(Self {
            device,
            queue,
            surface,
            surface_config,
        })
    }

    /// Reconfigure the surface for a new size
    ///
    /// Zero-sized extents are ignored (minimised window).
    pub fn resize(&mut self, extent: Extent) {
        if !extent.is_empty() {
            self.surface_config.width = extent.width;
            self.surface_config.height = extent.height;
            self.surface.configure(&self.device, &self.surface_config);
            log::debug!("Resized surface to {}", extent);
        }
    }

    /// Reconfigure at the current size (after `Outdated` / `Lost`)
    pub fn reconfigure(&mut self) {
        self.surface.configure(&self.device, &self.surface_config);
    }

    /// Current surface size
    pub fn extent(&self) -> Extent {
        Extent::new(self.surface_config.width, self.surface_config.height)
    }

    /// Block until all submitted work has completed, at most `timeout`
    ///
    /// # Errors
    ///
    /// [`CoreError::Timeout`] if the GPU is still busy after `timeout`,
    /// [`CoreError::Renderer`] if the device was lost.
    pub fn wait_idle(&self, timeout: Duration) -> Result<()> {
        let done = Arc::new(AtomicBool::new(false));
        let flag = done.clone();
        self.queue.on_submitted_work_done(move || {
            flag.store(true, Ordering::Release);
        });

        let deadline = Instant::now() + timeout;
        loop {
            self.device
                .poll(wgpu::PollType::Poll)
                .map_err(|e| CoreError::Renderer(format!("Device poll failed: {}", e)))?;
            if done.load(Ordering::Acquire) {
                return Ok(());
            }
            if Instant::now() >= deadline {
                return Err(CoreError::Timeout("GPU idle"));
            }
            std::thread::sleep(Duration::from_millis(1));
        }
    }
}

/// Pick a present mode
///
/// FIFO is always supported and is the paced mode. Unpaced prefers
/// `Mailbox`, then `Immediate`, falling back to FIFO.
pub fn select_present_mode(available: &[wgpu::PresentMode], vsync: bool) -> wgpu::PresentMode {
    if vsync {
        return wgpu::PresentMode::Fifo;
    }
    [wgpu::PresentMode::Mailbox, wgpu::PresentMode::Immediate]
        .into_iter()
        .find(|mode| available.contains(mode))
        .unwrap_or(wgpu::PresentMode::Fifo)
}
