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

//! Demo simulation
//!
//! Colored quads bouncing around the surface. Touching (or clicking) spawns a
//! quad at the pointer; `Backspace` removes the newest one. Positions live in
//! normalized surface space so a resize never loses a quad off-screen.

use crate::core::input::{Fingers, InputState, Key, MAX_POINTERS};
use crate::core::render::{Color, DrawList, Rect, Simulation, Step, StepKind};
use crate::core::surface::Extent;

/// Upper bound on live quads
const MAX_QUADS: usize = 64;

/// Edge length relative to the shorter surface side
const QUAD_SIZE: f32 = 0.06;

const BACKGROUND: Color = [0.05, 0.06, 0.08, 1.0];

#[derive(Debug, Clone, Copy, PartialEq)]
struct Quad {
    /// Center, normalized `0.0..=1.0`
    pos: [f32; 2],
    /// Normalized units per second
    vel: [f32; 2],
    color: Color,
}

/// Bouncing-quads simulation
#[derive(Debug, Clone)]
pub struct BouncingQuads {
    quads: Vec<Quad>,
    extent: Extent,
    spawned: u32,
    focused: bool,
    /// Seconds of animation, frozen while unfocused
    pulse: f32,
}

impl BouncingQuads {
    /// Start with `count` quads
    pub fn new(count: usize) -> Self {
        let mut sim = Self {
            quads: Vec::with_capacity(count.max(MAX_QUADS)),
            extent: Extent::new(1, 1),
            spawned: 0,
            focused: true,
            pulse: 0.0,
        };
        for _ in 0..count {
            let n = sim.spawned as f32;
            sim.spawn([fract(0.5 + n * 0.618_034), fract(0.5 + n * 0.414_214)]);
        }
        sim
    }

    pub fn len(&self) -> usize {
        self.quads.len()
    }

    pub fn is_empty(&self) -> bool {
        self.quads.is_empty()
    }

    fn spawn(&mut self, pos: [f32; 2]) {
        if self.quads.len() >= MAX_QUADS {
            log::debug!("Quad limit reached");
            return;
        }
        // Low-discrepancy direction and hue per spawn
        let n = self.spawned as f32;
        let angle = fract(n * 0.618_034) * std::f32::consts::TAU;
        let speed = 0.2 + 0.2 * fract(n * 0.754_878);
        self.quads.push(Quad {
            pos,
            vel: [angle.cos() * speed, angle.sin() * speed],
            color: hue(fract(n * 0.381_966)),
        });
        self.spawned += 1;
    }

    fn integrate(&mut self, dt: f32) {
        let half = QUAD_SIZE / 2.0;
        for quad in &mut self.quads {
            for axis in 0..2 {
                quad.pos[axis] += quad.vel[axis] * dt;
                if quad.pos[axis] < half {
                    quad.pos[axis] = half;
                    quad.vel[axis] = quad.vel[axis].abs();
                } else if quad.pos[axis] > 1.0 - half {
                    quad.pos[axis] = 1.0 - half;
                    quad.vel[axis] = -quad.vel[axis].abs();
                }
            }
        }
    }

    fn apply_input(&mut self, input: &InputState) {
        let pressed = input.fingers_pressed();
        for id in 0..MAX_POINTERS {
            let Some(finger) = Fingers::from_id(id as u32) else {
                continue;
            };
            if !pressed.contains(finger) {
                continue;
            }
            if let Some(touch) = input.touch(id) {
                let x = touch.x / self.extent.width.max(1) as f32;
                let y = touch.y / self.extent.height.max(1) as f32;
                self.spawn([x.clamp(0.0, 1.0), y.clamp(0.0, 1.0)]);
            }
        }
        if input.key_pressed(Key::Backspace) {
            self.quads.pop();
        }
    }
}

impl Default for BouncingQuads {
    fn default() -> Self {
        Self::new(8)
    }
}

impl Simulation for BouncingQuads {
    fn focus_changed(&mut self, focused: bool) {
        self.focused = focused;
    }

    fn advance(&mut self, step: &Step, input: &InputState) {
        let dt = step.dt.as_secs_f32();
        self.integrate(dt);

        match step.kind {
            StepKind::Full => {
                self.apply_input(input);
                if self.focused {
                    self.pulse += dt;
                }
            }
            // Skip the color animation to catch up
            StepKind::Reduced => self.apply_input(input),
            StepKind::Bookkeeping => {}
        }
    }

    fn draw(&mut self, extent: Extent, list: &mut DrawList) {
        self.extent = extent;
        list.clear_color(BACKGROUND);

        let w = extent.width as f32;
        let h = extent.height as f32;
        let side = QUAD_SIZE * w.min(h);
        let glow = 0.85 + 0.15 * (self.pulse * 2.0).sin();

        for quad in &self.quads {
            let rect = Rect::new(
                quad.pos[0] * w - side / 2.0,
                quad.pos[1] * h - side / 2.0,
                side,
                side,
            );
            let [r, g, b, a] = quad.color;
            list.quad(rect, [r * glow, g * glow, b * glow, a]);
        }
    }
}

fn fract(x: f32) -> f32 {
    x - x.floor()
}

/// Fully saturated color for hue `h` in `0.0..1.0`
fn hue(h: f32) -> Color {
    let channel = |offset: f32| {
        let k = fract(h + offset) * 6.0;
        ((k - 3.0).abs() - 1.0).clamp(0.0, 1.0)
    };
    [channel(0.0), channel(2.0 / 3.0), channel(1.0 / 3.0), 1.0]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::event::{InputEvent, KeyAction, PointerAction};
    use std::time::Duration;

    fn step(ms: u64, kind: StepKind) -> Step {
        Step {
            dt: Duration::from_millis(ms),
            sim_time: Duration::ZERO,
            kind,
        }
    }

    #[test]
    fn test_quads_stay_on_surface() {
        let mut sim = BouncingQuads::new(16);
        let input = InputState::new();
        for _ in 0..600 {
            sim.advance(&step(16, StepKind::Full), &input);
        }

        let mut list = DrawList::new();
        sim.draw(Extent::new(640, 480), &mut list);
        for (rect, _) in list.quads() {
            assert!(rect.x >= -0.01 && rect.x + rect.width <= 640.01, "{rect:?}");
            assert!(rect.y >= -0.01 && rect.y + rect.height <= 480.01, "{rect:?}");
        }
    }

    #[test]
    fn test_draw_emits_background_then_quads() {
        let mut sim = BouncingQuads::new(3);
        let mut list = DrawList::new();
        sim.draw(Extent::new(100, 100), &mut list);

        assert_eq!(list.len(), 4);
        assert_eq!(list.background(), Some(BACKGROUND));
    }

    #[test]
    fn test_touch_spawns_and_backspace_removes() {
        let mut sim = BouncingQuads::new(0);
        let mut list = DrawList::new();
        sim.draw(Extent::new(200, 100), &mut list);

        let mut input = InputState::new();
        input.apply(&InputEvent::Pointer {
            id: 0,
            action: PointerAction::Down,
            x: 100.0,
            y: 50.0,
            timestamp: Duration::ZERO,
        });
        sim.advance(&step(0, StepKind::Full), &input);
        assert_eq!(sim.len(), 1);
        assert_eq!(sim.quads[0].pos, [0.5, 0.5]);

        // Bookkeeping steps do not consume input
        sim.advance(&step(0, StepKind::Bookkeeping), &input);
        assert_eq!(sim.len(), 1);

        input.end_frame();
        input.apply(&InputEvent::Key {
            key: Key::Backspace,
            action: KeyAction::Down,
            timestamp: Duration::ZERO,
        });
        sim.advance(&step(0, StepKind::Reduced), &input);
        assert!(sim.is_empty());
    }

    #[test]
    fn test_hue_is_saturated() {
        assert_eq!(hue(0.0), [1.0, 0.0, 0.0, 1.0]);
        for i in 0..12 {
            let [r, g, b, _] = hue(i as f32 / 12.0);
            let max = r.max(g).max(b);
            assert!((max - 1.0).abs() < 1e-5);
        }
    }
}
