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

//! Input translation
//!
//! Turns winit keyboard, mouse and touch events into [`InputEvent`]s. The
//! mouse is pointer 0; touches take the lowest free slot among the
//! remaining pointer ids so a mouse and fingers never collide.

use crate::core::event::{InputEvent, KeyAction, PointerAction};
use crate::core::input::{Key, MAX_POINTERS};
use std::time::Duration;
use winit::event::{ElementState, MouseButton, TouchPhase};
use winit::keyboard::KeyCode;

/// Pointer id used for the mouse
pub const MOUSE_POINTER: u32 = 0;

/// Map a physical key to a logical key
///
/// Returns `None` for keys the engine does not use.
pub fn key_from_code(code: KeyCode) -> Option<Key> {
    use KeyCode::*;

    let key = match code {
        KeyA => Key::Char('A'),
        KeyB => Key::Char('B'),
        KeyC => Key::Char('C'),
        KeyD => Key::Char('D'),
        KeyE => Key::Char('E'),
        KeyF => Key::Char('F'),
        KeyG => Key::Char('G'),
        KeyH => Key::Char('H'),
        KeyI => Key::Char('I'),
        KeyJ => Key::Char('J'),
        KeyK => Key::Char('K'),
        KeyL => Key::Char('L'),
        KeyM => Key::Char('M'),
        KeyN => Key::Char('N'),
        KeyO => Key::Char('O'),
        KeyP => Key::Char('P'),
        KeyQ => Key::Char('Q'),
        KeyR => Key::Char('R'),
        KeyS => Key::Char('S'),
        KeyT => Key::Char('T'),
        KeyU => Key::Char('U'),
        KeyV => Key::Char('V'),
        KeyW => Key::Char('W'),
        KeyX => Key::Char('X'),
        KeyY => Key::Char('Y'),
        KeyZ => Key::Char('Z'),
        Digit0 => Key::Char('0'),
        Digit1 => Key::Char('1'),
        Digit2 => Key::Char('2'),
        Digit3 => Key::Char('3'),
        Digit4 => Key::Char('4'),
        Digit5 => Key::Char('5'),
        Digit6 => Key::Char('6'),
        Digit7 => Key::Char('7'),
        Digit8 => Key::Char('8'),
        Digit9 => Key::Char('9'),
        Period => Key::Char('.'),
        Numpad0 => Key::Numpad(0),
        Numpad1 => Key::Numpad(1),
        Numpad2 => Key::Numpad(2),
        Numpad3 => Key::Numpad(3),
        Numpad4 => Key::Numpad(4),
        Numpad5 => Key::Numpad(5),
        Numpad6 => Key::Numpad(6),
        Numpad7 => Key::Numpad(7),
        Numpad8 => Key::Numpad(8),
        Numpad9 => Key::Numpad(9),
        F1 => Key::F(1),
        F2 => Key::F(2),
        F3 => Key::F(3),
        F4 => Key::F(4),
        F5 => Key::F(5),
        F6 => Key::F(6),
        F7 => Key::F(7),
        F8 => Key::F(8),
        F9 => Key::F(9),
        F10 => Key::F(10),
        F11 => Key::F(11),
        F12 => Key::F(12),
        Backspace => Key::Backspace,
        Enter | NumpadEnter => Key::Enter,
        Escape => Key::Escape,
        Tab => Key::Tab,
        ArrowLeft => Key::Left,
        ArrowRight => Key::Right,
        ArrowUp => Key::Up,
        ArrowDown => Key::Down,
        _ => return None,
    };
    Some(key)
}

/// Stateful winit-to-core input translator
#[derive(Debug, Default)]
pub struct InputTranslator {
    /// Last cursor position in physical pixels
    cursor: (f32, f32),
    mouse_down: bool,
    /// winit touch id per pointer slot (slot 0 is the mouse)
    touches: [Option<u64>; MAX_POINTERS],
}

impl InputTranslator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keyboard press or release; repeats are dropped
    pub fn key(
        &self,
        code: KeyCode,
        state: ElementState,
        repeat: bool,
        timestamp: Duration,
    ) -> Option<InputEvent> {
        if repeat {
            return None;
        }
        let key = key_from_code(code)?;
        let action = match state {
            ElementState::Pressed => KeyAction::Down,
            ElementState::Released => KeyAction::Up,
        };
        Some(InputEvent::Key {
            key,
            action,
            timestamp,
        })
    }

    /// Cursor motion; only reported while the left button is held
    pub fn cursor_moved(&mut self, x: f64, y: f64, timestamp: Duration) -> Option<InputEvent> {
        self.cursor = (x as f32, y as f32);
        self.mouse_down.then(|| self.mouse_event(PointerAction::Move, timestamp))
    }

    /// Left button press or release at the last cursor position
    pub fn mouse_button(
        &mut self,
        button: MouseButton,
        state: ElementState,
        timestamp: Duration,
    ) -> Option<InputEvent> {
        if button != MouseButton::Left {
            return None;
        }
        let action = match (state, self.mouse_down) {
            (ElementState::Pressed, false) => PointerAction::Down,
            (ElementState::Released, true) => PointerAction::Up,
            _ => return None,
        };
        self.mouse_down = state == ElementState::Pressed;
        Some(self.mouse_event(action, timestamp))
    }

    /// Cancel a held mouse button (cursor left the window)
    pub fn cursor_left(&mut self, timestamp: Duration) -> Option<InputEvent> {
        if !self.mouse_down {
            return None;
        }
        self.mouse_down = false;
        Some(self.mouse_event(PointerAction::Cancel, timestamp))
    }

    /// Touch event
    ///
    /// Touches beyond the available pointer slots are dropped.
    pub fn touch(
        &mut self,
        touch_id: u64,
        phase: TouchPhase,
        x: f64,
        y: f64,
        timestamp: Duration,
    ) -> Option<InputEvent> {
        let slot = match phase {
            TouchPhase::Started => {
                let Some(slot) = self.free_slot() else {
                    log::debug!("No pointer slot for touch {}", touch_id);
                    return None;
                };
                self.touches[slot] = Some(touch_id);
                slot
            }
            _ => self.slot_of(touch_id)?,
        };

        let action = match phase {
            TouchPhase::Started => PointerAction::Down,
            TouchPhase::Moved => PointerAction::Move,
            TouchPhase::Ended => PointerAction::Up,
            TouchPhase::Cancelled => PointerAction::Cancel,
        };
        if matches!(phase, TouchPhase::Ended | TouchPhase::Cancelled) {
            self.touches[slot] = None;
        }

        Some(InputEvent::Pointer {
            id: slot as u32,
            action,
            x: x as f32,
            y: y as f32,
            timestamp,
        })
    }

    /// Number of fingers currently tracked
    pub fn active_touches(&self) -> usize {
        self.touches.iter().flatten().count()
    }

    fn mouse_event(&self, action: PointerAction, timestamp: Duration) -> InputEvent {
        InputEvent::Pointer {
            id: MOUSE_POINTER,
            action,
            x: self.cursor.0,
            y: self.cursor.1,
            timestamp,
        }
    }

    fn free_slot(&self) -> Option<usize> {
        (MOUSE_POINTER as usize + 1..MAX_POINTERS).find(|&slot| self.touches[slot].is_none())
    }

    fn slot_of(&self, touch_id: u64) -> Option<usize> {
        self.touches.iter().position(|t| *t == Some(touch_id))
    }
}
