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

//! Quad renderer
//!
//! Draws a [`DrawList`] in a single render pass: the list's clear color
//! becomes the pass load op and every quad is one instance of a six-vertex
//! draw.

use crate::core::render::{Color, DrawList, Rect};
use crate::core::surface::Extent;

/// Initial instance buffer capacity
const INITIAL_CAPACITY: usize = 64;

/// Per-instance vertex data
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub(crate) struct QuadInstance {
    /// NDC left, top, right, bottom
    pub bounds: [f32; 4],
    pub color: [f32; 4],
}

impl QuadInstance {
    const ATTRIBUTES: [wgpu::VertexAttribute; 2] =
        wgpu::vertex_attr_array![0 => Float32x4, 1 => Float32x4];

    fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<QuadInstance>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &Self::ATTRIBUTES,
        }
    }
}

/// Convert a pixel rectangle (origin top-left, y down) to NDC bounds
pub(crate) fn rect_to_ndc(rect: Rect, extent: Extent) -> [f32; 4] {
    let w = extent.width.max(1) as f32;
    let h = extent.height.max(1) as f32;
    [
        rect.x / w * 2.0 - 1.0,
        1.0 - rect.y / h * 2.0,
        (rect.x + rect.width) / w * 2.0 - 1.0,
        1.0 - (rect.y + rect.height) / h * 2.0,
    ]
}

/// Build the instance array for a draw list
pub(crate) fn build_instances(list: &DrawList, extent: Extent) -> Vec<QuadInstance> {
    list.quads()
        .map(|(rect, color)| QuadInstance {
            bounds: rect_to_ndc(rect, extent),
            color,
        })
        .collect()
}

/// Clear color for the pass, black when the list has none
pub(crate) fn clear_color(list: &DrawList) -> wgpu::Color {
    let [r, g, b, a]: Color = list.background().unwrap_or([0.0, 0.0, 0.0, 1.0]);
    wgpu::Color {
        r: r as f64,
        g: g as f64,
        b: b as f64,
        a: a as f64,
    }
}

/// Quad rendering pipeline
pub struct QuadRenderer {
    pipeline: wgpu::RenderPipeline,
    instance_buffer: wgpu::Buffer,
    /// Instance buffer capacity in quads
    capacity: usize,
}

impl QuadRenderer {
    /// Create the pipeline for `surface_format`
    pub fn new(device: &wgpu::Device, surface_format: wgpu::TextureFormat) -> Self {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Quad Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/quad.wgsl").into()),
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Quad Pipeline Layout"),
            bind_group_layouts: &[],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Quad Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[QuadInstance::layout()],
                compilation_options: Default::default(),
            },
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                unclipped_depth: false,
                polygon_mode: wgpu::PolygonMode::Fill,
                conservative: false,
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState {
                count: 1,
                mask: !0,
                alpha_to_coverage_enabled: false,
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: surface_format,
                    blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            multiview: None,
            cache: None,
        });

        let instance_buffer = create_instance_buffer(device, INITIAL_CAPACITY);

        log::info!("Quad renderer initialized");

        Self {
            pipeline,
            instance_buffer,
            capacity: INITIAL_CAPACITY,
        }
    }

    /// Record the draw list into `encoder`, targeting `output_view`
    pub fn render(
        &mut self,
        encoder: &mut wgpu::CommandEncoder,
        output_view: &wgpu::TextureView,
        list: &DrawList,
        extent: Extent,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
    ) {
        let instances = build_instances(list, extent);
        if instances.len() > self.capacity {
            self.capacity = instances.len().next_power_of_two();
            self.instance_buffer = create_instance_buffer(device, self.capacity);
            log::debug!("Grew quad instance buffer to {}", self.capacity);
        }
        if !instances.is_empty() {
            queue.write_buffer(&self.instance_buffer, 0, bytemuck::cast_slice(&instances));
        }

        let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Quad Render Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: output_view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(clear_color(list)),
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
        });

        if !instances.is_empty() {
            render_pass.set_pipeline(&self.pipeline);
            render_pass.set_vertex_buffer(0, self.instance_buffer.slice(..));
            render_pass.draw(0..6, 0..instances.len() as u32);
        }
    }
}

fn create_instance_buffer(device: &wgpu::Device, capacity: usize) -> wgpu::Buffer {
    device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("Quad Instance Buffer"),
        size: (capacity * std::mem::size_of::<QuadInstance>()) as u64,
        usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    })
}
