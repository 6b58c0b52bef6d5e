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

//! Per-frame input state
//!
//! The loop folds every drained [`InputEvent`] into an [`InputState`] that the
//! simulation reads during its update. Up to [`MAX_POINTERS`] pointers
//! (fingers) are tracked; each has a held bit plus pressed/released edge bits
//! that are cleared at the end of every rendered frame.
//!
//! Hardware keys arrive as Android key codes on device and are mapped to
//! [`Key`] with [`Key::from_android_keycode`].

use crate::core::event::{InputEvent, KeyAction, PointerAction};
use bitflags::bitflags;
use std::collections::HashSet;

/// Number of pointers tracked
pub const MAX_POINTERS: usize = 4;

bitflags! {
    /// One bit per tracked pointer
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct Fingers: u8 {
        const FINGER0 = 1 << 0;
        const FINGER1 = 1 << 1;
        const FINGER2 = 1 << 2;
        const FINGER3 = 1 << 3;
    }
}

impl Fingers {
    /// Bit for pointer `id`, or `None` if the id is not tracked
    pub fn from_id(id: u32) -> Option<Self> {
        if (id as usize) < MAX_POINTERS {
            Fingers::from_bits(1 << id)
        } else {
            None
        }
    }
}

/// Logical key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    /// Letters `A`-`Z`, digits `0`-`9`, `@` and `.`
    Char(char),
    Backspace,
    Enter,
    Escape,
    Tab,
    Left,
    Right,
    Up,
    Down,
    /// Numeric keypad digit
    Numpad(u8),
    /// Function key `F1`-`F12`
    F(u8),
}

// Android key codes (android/keycodes.h)
const AKEYCODE_0: u32 = 7;
const AKEYCODE_9: u32 = 16;
const AKEYCODE_DPAD_UP: u32 = 19;
const AKEYCODE_DPAD_DOWN: u32 = 20;
const AKEYCODE_DPAD_LEFT: u32 = 21;
const AKEYCODE_DPAD_RIGHT: u32 = 22;
const AKEYCODE_A: u32 = 29;
const AKEYCODE_Z: u32 = 54;
const AKEYCODE_PERIOD: u32 = 56;
const AKEYCODE_TAB: u32 = 61;
const AKEYCODE_ENTER: u32 = 66;
const AKEYCODE_DEL: u32 = 67;
const AKEYCODE_AT: u32 = 77;
const AKEYCODE_ESCAPE: u32 = 111;
const AKEYCODE_F1: u32 = 131;
const AKEYCODE_F12: u32 = 142;
const AKEYCODE_NUMPAD_0: u32 = 144;
const AKEYCODE_NUMPAD_9: u32 = 153;

impl Key {
    /// Map an Android key code
    ///
    /// Returns `None` for keys the engine does not use.
    ///
    /// # Example
    ///
    /// ```
    /// use pacedloop::core::input::Key;
    ///
    /// assert_eq!(Key::from_android_keycode(29), Some(Key::Char('A')));
    /// assert_eq!(Key::from_android_keycode(66), Some(Key::Enter));
    /// assert_eq!(Key::from_android_keycode(3), None); // HOME
    /// ```
    pub fn from_android_keycode(code: u32) -> Option<Key> {
        let key = match code {
            AKEYCODE_A..=AKEYCODE_Z => Key::Char((b'A' + (code - AKEYCODE_A) as u8) as char),
            AKEYCODE_0..=AKEYCODE_9 => Key::Char((b'0' + (code - AKEYCODE_0) as u8) as char),
            AKEYCODE_DEL => Key::Backspace,
            AKEYCODE_ENTER => Key::Enter,
            AKEYCODE_ESCAPE => Key::Escape,
            AKEYCODE_TAB => Key::Tab,
            AKEYCODE_DPAD_LEFT => Key::Left,
            AKEYCODE_DPAD_RIGHT => Key::Right,
            AKEYCODE_DPAD_UP => Key::Up,
            AKEYCODE_DPAD_DOWN => Key::Down,
            AKEYCODE_AT => Key::Char('@'),
            AKEYCODE_PERIOD => Key::Char('.'),
            AKEYCODE_NUMPAD_0..=AKEYCODE_NUMPAD_9 => Key::Numpad((code - AKEYCODE_NUMPAD_0) as u8),
            AKEYCODE_F1..=AKEYCODE_F12 => Key::F((code - AKEYCODE_F1) as u8 + 1),
            _ => {
                log::trace!("Unmapped Android key code {}", code);
                return None;
            }
        };
        Some(key)
    }
}

/// Last known pointer position
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Touch {
    pub x: f32,
    pub y: f32,
}

/// Input state seen by the simulation
#[derive(Debug, Default)]
pub struct InputState {
    down: Fingers,
    pressed: Fingers,
    released: Fingers,
    touches: [Touch; MAX_POINTERS],
    keys_down: HashSet<Key>,
    keys_pressed: HashSet<Key>,
    keys_released: HashSet<Key>,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one input event into the state
    pub fn apply(&mut self, event: &InputEvent) {
        match *event {
            InputEvent::Pointer {
                id, action, x, y, ..
            } => {
                let Some(finger) = Fingers::from_id(id) else {
                    log::trace!("Ignoring pointer id {}", id);
                    return;
                };
                match action {
                    PointerAction::Down => {
                        self.pressed |= finger;
                        self.down |= finger;
                        self.touches[id as usize] = Touch { x, y };
                    }
                    PointerAction::Move => {
                        self.touches[id as usize] = Touch { x, y };
                    }
                    PointerAction::Up | PointerAction::Cancel => {
                        if self.down.contains(finger) {
                            self.released |= finger;
                        }
                        self.down.remove(finger);
                    }
                }
            }
            InputEvent::Key { key, action, .. } => match action {
                KeyAction::Down => {
                    if self.keys_down.insert(key) {
                        self.keys_pressed.insert(key);
                    }
                }
                KeyAction::Up => {
                    if self.keys_down.remove(&key) {
                        self.keys_released.insert(key);
                    }
                }
            },
        }
    }

    /// Clear the pressed/released edges; called after each rendered frame
    pub fn end_frame(&mut self) {
        self.pressed = Fingers::empty();
        self.released = Fingers::empty();
        self.keys_pressed.clear();
        self.keys_released.clear();
    }

    /// Drop every held pointer and key (focus loss)
    pub fn release_all(&mut self) {
        self.released |= self.down;
        self.down = Fingers::empty();
        self.keys_released.extend(self.keys_down.drain());
    }

    /// Pointers currently held
    pub fn fingers_down(&self) -> Fingers {
        self.down
    }

    /// Pointers that went down since the last frame
    pub fn fingers_pressed(&self) -> Fingers {
        self.pressed
    }

    /// Pointers that went up since the last frame
    pub fn fingers_released(&self) -> Fingers {
        self.released
    }

    /// Number of pointers currently held
    pub fn touch_count(&self) -> u32 {
        self.down.bits().count_ones()
    }

    /// Last known position of pointer `id`
    pub fn touch(&self, id: usize) -> Option<Touch> {
        self.touches.get(id).copied()
    }

    pub fn key_down(&self, key: Key) -> bool {
        self.keys_down.contains(&key)
    }

    pub fn key_pressed(&self, key: Key) -> bool {
        self.keys_pressed.contains(&key)
    }

    pub fn key_released(&self, key: Key) -> bool {
        self.keys_released.contains(&key)
    }

    pub fn any_key_down(&self) -> bool {
        !self.keys_down.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn pointer(id: u32, action: PointerAction, x: f32, y: f32) -> InputEvent {
        InputEvent::Pointer {
            id,
            action,
            x,
            y,
            timestamp: Duration::ZERO,
        }
    }

    fn key(key: Key, action: KeyAction) -> InputEvent {
        InputEvent::Key {
            key,
            action,
            timestamp: Duration::ZERO,
        }
    }

    #[test]
    fn test_android_letters_and_digits() {
        assert_eq!(Key::from_android_keycode(AKEYCODE_A), Some(Key::Char('A')));
        assert_eq!(Key::from_android_keycode(AKEYCODE_Z), Some(Key::Char('Z')));
        assert_eq!(Key::from_android_keycode(AKEYCODE_0), Some(Key::Char('0')));
        assert_eq!(Key::from_android_keycode(AKEYCODE_9), Some(Key::Char('9')));
    }

    #[test]
    fn test_android_special_keys() {
        assert_eq!(Key::from_android_keycode(AKEYCODE_DEL), Some(Key::Backspace));
        assert_eq!(Key::from_android_keycode(AKEYCODE_DPAD_UP), Some(Key::Up));
        assert_eq!(Key::from_android_keycode(AKEYCODE_NUMPAD_0 + 5), Some(Key::Numpad(5)));
        assert_eq!(Key::from_android_keycode(AKEYCODE_F1), Some(Key::F(1)));
        assert_eq!(Key::from_android_keycode(AKEYCODE_F12), Some(Key::F(12)));
        assert_eq!(Key::from_android_keycode(0), None);
    }

    #[test]
    fn test_finger_down_up_edges() {
        let mut input = InputState::new();
        input.apply(&pointer(1, PointerAction::Down, 10.0, 20.0));

        assert!(input.fingers_down().contains(Fingers::FINGER1));
        assert!(input.fingers_pressed().contains(Fingers::FINGER1));
        assert_eq!(input.touch(1), Some(Touch { x: 10.0, y: 20.0 }));
        assert_eq!(input.touch_count(), 1);

        input.end_frame();
        assert!(input.fingers_pressed().is_empty());
        assert!(input.fingers_down().contains(Fingers::FINGER1));

        input.apply(&pointer(1, PointerAction::Up, 10.0, 20.0));
        assert!(input.fingers_released().contains(Fingers::FINGER1));
        assert_eq!(input.touch_count(), 0);
    }

    #[test]
    fn test_move_updates_position_only() {
        let mut input = InputState::new();
        input.apply(&pointer(0, PointerAction::Move, 5.0, 6.0));
        assert_eq!(input.touch(0), Some(Touch { x: 5.0, y: 6.0 }));
        assert!(input.fingers_down().is_empty());
    }

    #[test]
    fn test_untracked_pointer_ignored() {
        let mut input = InputState::new();
        input.apply(&pointer(4, PointerAction::Down, 1.0, 1.0));
        assert_eq!(input.touch_count(), 0);
    }

    #[test]
    fn test_key_edges_and_release_all() {
        let mut input = InputState::new();
        input.apply(&key(Key::Enter, KeyAction::Down));
        input.apply(&key(Key::Enter, KeyAction::Down)); // repeat
        assert!(input.key_down(Key::Enter));
        assert!(input.key_pressed(Key::Enter));

        input.end_frame();
        assert!(!input.key_pressed(Key::Enter));

        input.apply(&pointer(0, PointerAction::Down, 0.0, 0.0));
        input.release_all();
        assert!(!input.any_key_down());
        assert!(input.key_released(Key::Enter));
        assert!(input.fingers_released().contains(Fingers::FINGER0));
    }
}
