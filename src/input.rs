// Copyright 2018 Ian Johnson

// This file is part of Chip-8.

// Chip-8 is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.

// Chip-8 is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.

// You should have received a copy of the GNU General Public License
// along with Chip-8.  If not, see <http://www.gnu.org/licenses/>.

//! Input handling for the Chip-8 interpreter.
//!
//! The keypad state is a 16-bit mask behind an atomic, so a front-end can
//! press and release keys from its event thread while the interpreter reads
//! them from another.

use std::default::Default;
use std::sync::atomic::{AtomicU16, Ordering};

use num::FromPrimitive;

/// The number of keys on the Chip-8 controller.
const N_KEYS: usize = 16;

enum_from_primitive!{
/// The keys on the Chip-8 controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    K0 = 0,
    K1,
    K2,
    K3,
    K4,
    K5,
    K6,
    K7,
    K8,
    K9,
    KA,
    KB,
    KC,
    KD,
    KE,
    KF
}
}

impl Key {
    /// Returns the key with the given code, if there is one.
    pub fn from_byte(b: u8) -> Option<Key> {
        Key::from_u8(b)
    }

    fn mask(self) -> u16 {
        1 << self as u16
    }
}

/// Represents the state of the input device.
#[derive(Debug, Default)]
pub struct Keypad {
    /// Bit `k` is set while key `k` is held down.
    keys: AtomicU16,
}

impl Keypad {
    /// Returns a new keypad with all keys unpressed.
    pub fn new() -> Self {
        Keypad::default()
    }

    /// Marks the given key as held down.
    pub fn press(&self, key: Key) {
        self.keys.fetch_or(key.mask(), Ordering::SeqCst);
    }

    /// Marks the given key as released.
    pub fn release(&self, key: Key) {
        self.keys.fetch_and(!key.mask(), Ordering::SeqCst);
    }

    /// Returns whether the given key is pressed.
    pub fn is_pressed(&self, key: Key) -> bool {
        self.keys.load(Ordering::SeqCst) & key.mask() != 0
    }

    /// Returns the lowest key that is pressed.
    pub fn first_pressed(&self) -> Option<Key> {
        let keys = self.keys.load(Ordering::SeqCst);
        (0..N_KEYS)
            .find(|&i| keys & (1 << i) != 0)
            .and_then(Key::from_usize)
    }
}
