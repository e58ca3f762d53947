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

//! The Chip-8 display buffer and the built-in font.

use std::default::Default;

/// The width of the display.
pub const WIDTH: usize = 64;
/// The height of the display.
pub const HEIGHT: usize = 32;

/// The height of a font glyph.
pub const HEX_HEIGHT: usize = 5;

/// The hex digit sprites.
pub const HEX_SPRITES: [[u8; HEX_HEIGHT]; 16] = [
    [0xF0, 0x90, 0x90, 0x90, 0xF0],
    [0x20, 0x60, 0x20, 0x20, 0x70],
    [0xF0, 0x10, 0xF0, 0x80, 0xF0],
    [0xF0, 0x10, 0xF0, 0x10, 0xF0],
    [0x90, 0x90, 0xF0, 0x10, 0x10],
    [0xF0, 0x80, 0xF0, 0x10, 0xF0],
    [0xF0, 0x80, 0xF0, 0x90, 0xF0],
    [0xF0, 0x10, 0x20, 0x40, 0x40],
    [0xF0, 0x90, 0xF0, 0x90, 0xF0],
    [0xF0, 0x90, 0xF0, 0x10, 0xF0],
    [0xF0, 0x90, 0xF0, 0x90, 0x90],
    [0xE0, 0x90, 0xE0, 0x90, 0xE0],
    [0xF0, 0x80, 0x80, 0x80, 0xF0],
    [0xE0, 0x90, 0x90, 0x90, 0xE0],
    [0xF0, 0x80, 0xF0, 0x80, 0xF0],
    [0xF0, 0x80, 0xF0, 0x80, 0x80],
];

/// The outcome of drawing a sprite.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Blit {
    /// Whether some pixel was turned off.
    pub collision: bool,
    /// Whether any pixel changed at all.
    pub changed: bool,
}

/// A Chip-8 display buffer.
///
/// Only the interpreter can modify the buffer; front-ends get a shared
/// reference and read pixels through `get` or `data`.
#[derive(Clone)]
pub struct Buffer {
    /// The underlying display buffer data, indexed `[x][y]`.
    data: [[bool; HEIGHT]; WIDTH],
}

impl Buffer {
    /// Returns a new display buffer with all pixels clear.
    pub fn new() -> Self {
        Buffer {
            data: [[false; HEIGHT]; WIDTH],
        }
    }

    /// Returns a reference to the underlying pixel data.
    pub fn data(&self) -> &[[bool; HEIGHT]; WIDTH] {
        &self.data
    }

    /// Returns whether the pixel at the given position is set.
    ///
    /// Positions outside the display are never set.
    pub fn get(&self, x: usize, y: usize) -> bool {
        x < WIDTH && y < HEIGHT && self.data[x][y]
    }

    /// Returns whether every pixel is clear.
    pub fn is_blank(&self) -> bool {
        self.data.iter().all(|col| col.iter().all(|&p| !p))
    }

    /// Clears the display, returning whether any pixel was set.
    pub(crate) fn clear(&mut self) -> bool {
        let changed = !self.is_blank();
        for col in self.data.iter_mut() {
            for elem in col.iter_mut() {
                *elem = false;
            }
        }
        changed
    }

    /// XORs the given sprite onto the display with its top-left corner at the
    /// given position.
    ///
    /// Each byte of the sprite is one row, most significant bit leftmost.
    /// Pixels falling off an edge wrap around to the opposite edge.
    pub(crate) fn draw_sprite(&mut self, sprite: &[u8], x: usize, y: usize) -> Blit {
        let mut blit = Blit::default();

        for (j, row) in sprite.iter().enumerate() {
            for i in 0..8 {
                if row & (1 << (7 - i)) != 0 {
                    if self.toggle((x + i) % WIDTH, (y + j) % HEIGHT) {
                        blit.collision = true;
                    }
                    blit.changed = true;
                }
            }
        }

        blit
    }

    /// Flips the on/off state of the given pixel, returning whether it was
    /// flipped off from the on state.
    fn toggle(&mut self, x: usize, y: usize) -> bool {
        let old = self.data[x][y];
        self.data[x][y] = !old;
        old
    }
}

impl Default for Buffer {
    fn default() -> Self {
        Buffer::new()
    }
}
