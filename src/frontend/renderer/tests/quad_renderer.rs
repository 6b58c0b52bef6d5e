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

//! Unit tests for quad instance building and present mode selection

use crate::core::render::{DrawList, Rect};
use crate::core::surface::Extent;
use crate::frontend::renderer::quad_renderer::{build_instances, clear_color, rect_to_ndc};
use crate::frontend::renderer::select_present_mode;

#[test]
fn test_full_surface_rect_covers_ndc() {
    let ndc = rect_to_ndc(Rect::new(0.0, 0.0, 800.0, 600.0), Extent::new(800, 600));
    assert_eq!(ndc, [-1.0, 1.0, 1.0, -1.0]);
}

#[test]
fn test_rect_y_axis_points_down() {
    let ndc = rect_to_ndc(Rect::new(100.0, 50.0, 100.0, 50.0), Extent::new(200, 100));
    assert_eq!(ndc, [0.0, 0.0, 1.0, -1.0]);
}

#[test]
fn test_zero_extent_does_not_divide_by_zero() {
    let ndc = rect_to_ndc(Rect::new(0.0, 0.0, 1.0, 1.0), Extent::new(0, 0));
    assert!(ndc.iter().all(|v| v.is_finite()));
}

#[test]
fn test_instances_skip_clear_commands() {
    let mut list = DrawList::new();
    list.clear_color([0.1, 0.2, 0.3, 1.0]);
    list.quad(Rect::new(0.0, 0.0, 10.0, 10.0), [1.0, 0.0, 0.0, 1.0]);
    list.quad(Rect::new(10.0, 10.0, 10.0, 10.0), [0.0, 1.0, 0.0, 1.0]);

    let instances = build_instances(&list, Extent::new(20, 20));
    assert_eq!(instances.len(), 2);
    assert_eq!(instances[0].color, [1.0, 0.0, 0.0, 1.0]);
    assert_eq!(instances[1].bounds, [0.0, 0.0, 1.0, -1.0]);
}

#[test]
fn test_instance_layout_is_tightly_packed() {
    use crate::frontend::renderer::quad_renderer::QuadInstance;
    assert_eq!(std::mem::size_of::<QuadInstance>(), 32);
}

#[test]
fn test_clear_color_defaults_to_black() {
    let list = DrawList::new();
    assert_eq!(clear_color(&list), wgpu::Color::BLACK);

    let mut list = DrawList::new();
    list.clear_color([0.5, 0.25, 0.0, 1.0]);
    let color = clear_color(&list);
    assert_eq!((color.r, color.g, color.b, color.a), (0.5, 0.25, 0.0, 1.0));
}

#[test]
fn test_present_mode_selection() {
    use wgpu::PresentMode::*;

    assert_eq!(select_present_mode(&[Fifo, Mailbox, Immediate], true), Fifo);
    assert_eq!(select_present_mode(&[Fifo, Mailbox, Immediate], false), Mailbox);
    assert_eq!(select_present_mode(&[Fifo, Immediate], false), Immediate);
    assert_eq!(select_present_mode(&[Fifo], false), Fifo);
}
