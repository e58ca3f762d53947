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

//! Chip-8 instructions and opcodes.
//!
//! This module is the single place where instruction words are taken apart.
//! An `Opcode` wraps a raw 16-bit word and exposes its bit fields; an
//! `Instruction` is the typed form of an opcode that the interpreter executes
//! and the disassembler renders.  Decoding never fails: encodings without
//! assigned semantics become `Instruction::Unknown` (or `Instruction::Sys`
//! for machine-code routines), and it is up to the consumer to decide what
//! to do with them.

use std::fmt;

use disassembler;

enum_from_primitive! {
/// A Chip-8 register.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Register {
    V0 = 0,
    V1,
    V2,
    V3,
    V4,
    V5,
    V6,
    V7,
    V8,
    V9,
    VA,
    VB,
    VC,
    VD,
    VE,
    VF,
}
}

/// All registers, in index order.
const REGISTERS: [Register; 16] = [
    Register::V0,
    Register::V1,
    Register::V2,
    Register::V3,
    Register::V4,
    Register::V5,
    Register::V6,
    Register::V7,
    Register::V8,
    Register::V9,
    Register::VA,
    Register::VB,
    Register::VC,
    Register::VD,
    Register::VE,
    Register::VF,
];

impl Register {
    /// Returns the register named by the lowest four bits of `n`.
    pub fn from_nibble(n: u8) -> Register {
        REGISTERS[(n & 0xF) as usize]
    }

    /// Returns the registers `V0` through `self`, inclusive.
    pub fn up_to(self) -> &'static [Register] {
        &REGISTERS[..=self as usize]
    }
}

impl fmt::Display for Register {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:?}", *self)
    }
}

/// A Chip-8 opcode.
///
/// Having this as a wrapper around an ordinary `u16` allows for some nice
/// helper methods to be implemented, which make decoding opcodes much easier.
/// Every field accessor is defined for every word, whether or not the result
/// is meaningful for the instruction in question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Opcode(pub u16);

impl Opcode {
    /// Assembles an opcode from its big-endian byte pair.
    pub fn from_bytes(high: u8, low: u8) -> Self {
        Opcode(u16::from(high) << 8 | u16::from(low))
    }

    /// The top four bits, selecting the instruction category.
    pub fn op(&self) -> u8 {
        (self.0 >> 12) as u8
    }

    /// The low twelve bits (an address or constant).
    pub fn nnn(&self) -> u16 {
        self.0 & 0xFFF
    }

    /// The low byte.
    pub fn nn(&self) -> u8 {
        self.0 as u8
    }

    /// The low nibble.
    pub fn n(&self) -> u8 {
        self.0 as u8 & 0xF
    }

    /// Bits 8 to 11, the primary register index.
    pub fn x(&self) -> u8 {
        (self.0 >> 8) as u8 & 0xF
    }

    /// Bits 4 to 7, the secondary register index.
    pub fn y(&self) -> u8 {
        (self.0 >> 4) as u8 & 0xF
    }

    fn vx(&self) -> Register {
        Register::from_nibble(self.x())
    }

    fn vy(&self) -> Register {
        Register::from_nibble(self.y())
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "${:04X}", self.0)
    }
}

/// A Chip-8 instruction.
///
/// Addresses are kept as the raw 12-bit values found in the opcode; it is the
/// interpreter's job to decide whether a control transfer is acceptable.
///
/// # Examples
///
/// ```
/// use chip8vm::{Instruction, Opcode, Register};
///
/// let instr = Instruction::decode(Opcode(0x7510));
/// assert_eq!(instr, Instruction::AddByte(Register::V5, 0x10));
/// ```
///
/// Words without a meaning are still decoded:
///
/// ```
/// use chip8vm::{Instruction, Opcode};
///
/// assert_eq!(Instruction::decode(Opcode(0xE0FF)), Instruction::Unknown(Opcode(0xE0FF)));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Instruction {
    /// `CLS` (`00E0`).
    Cls,
    /// `RET` (`00EE`).
    Ret,
    /// `SYS addr` (`0nnn`), a call into machine code.  Ignored.
    Sys(u16),
    /// `JMP addr` (`1nnn`).
    Jp(u16),
    /// `CALL addr` (`2nnn`).
    Call(u16),
    /// `SE Vx, byte` (`3xkk`).
    SeByte(Register, u8),
    /// `SNE Vx, byte` (`4xkk`).
    SneByte(Register, u8),
    /// `SE Vx, Vy` (`5xy0`).
    SeReg(Register, Register),
    /// `LD Vx, byte` (`6xkk`).
    LdByte(Register, u8),
    /// `ADD Vx, byte` (`7xkk`).
    AddByte(Register, u8),
    /// `LD Vx, Vy` (`8xy0`).
    LdReg(Register, Register),
    /// `OR Vx, Vy` (`8xy1`).
    Or(Register, Register),
    /// `AND Vx, Vy` (`8xy2`).
    And(Register, Register),
    /// `XOR Vx, Vy` (`8xy3`).
    Xor(Register, Register),
    /// `ADD Vx, Vy` (`8xy4`).
    AddReg(Register, Register),
    /// `SUB Vx, Vy` (`8xy5`).
    Sub(Register, Register),
    /// `SHR Vx` (`8x_6`).
    Shr(Register),
    /// `SUBN Vx, Vy` (`8xy7`).
    Subn(Register, Register),
    /// `SHL Vx` (`8x_E`).
    Shl(Register),
    /// `SNE Vx, Vy` (`9xy0`).
    SneReg(Register, Register),
    /// `LD I, addr` (`Annn`).
    LdI(u16),
    /// `JMP V0, addr` (`Bnnn`).
    JpV0(u16),
    /// `RND Vx, byte` (`Cxkk`).
    Rnd(Register, u8),
    /// `DRAW Vx, Vy, nibble` (`Dxyn`).
    Drw(Register, Register, u8),
    /// `SKP Vx` (`Ex9E`).
    Skp(Register),
    /// `SKNP Vx` (`ExA1`).
    Sknp(Register),
    /// `LD Vx, DT` (`Fx07`).
    LdRegDt(Register),
    /// `LD Vx, K` (`Fx0A`).
    LdKey(Register),
    /// `LD DT, Vx` (`Fx15`).
    LdDtReg(Register),
    /// `LD ST, Vx` (`Fx18`).
    LdSt(Register),
    /// `ADD I, Vx` (`Fx1E`).
    AddI(Register),
    /// `LD F, Vx` (`Fx29`).
    LdF(Register),
    /// `LD B, Vx` (`Fx33`).
    LdB(Register),
    /// `LD [I], Vx` (`Fx55`).
    LdDerefIReg(Register),
    /// `LD Vx, [I]` (`Fx65`).
    LdRegDerefI(Register),
    /// Any word with no assigned meaning.
    Unknown(Opcode),
}

impl Instruction {
    /// Returns the instruction corresponding to the given opcode.
    ///
    /// The `5xy_` and `9xy_` forms ignore their low nibble.
    pub fn decode(opcode: Opcode) -> Self {
        use self::Instruction::*;

        let (vx, vy) = (opcode.vx(), opcode.vy());
        match opcode.op() {
            0x0 => match opcode.nn() {
                0xE0 => Cls,
                0xEE => Ret,
                _ => Sys(opcode.nnn()),
            },
            0x1 => Jp(opcode.nnn()),
            0x2 => Call(opcode.nnn()),
            0x3 => SeByte(vx, opcode.nn()),
            0x4 => SneByte(vx, opcode.nn()),
            0x5 => SeReg(vx, vy),
            0x6 => LdByte(vx, opcode.nn()),
            0x7 => AddByte(vx, opcode.nn()),
            0x8 => match opcode.n() {
                0x0 => LdReg(vx, vy),
                0x1 => Or(vx, vy),
                0x2 => And(vx, vy),
                0x3 => Xor(vx, vy),
                0x4 => AddReg(vx, vy),
                0x5 => Sub(vx, vy),
                0x6 => Shr(vx),
                0x7 => Subn(vx, vy),
                0xE => Shl(vx),
                _ => Unknown(opcode),
            },
            0x9 => SneReg(vx, vy),
            0xA => LdI(opcode.nnn()),
            0xB => JpV0(opcode.nnn()),
            0xC => Rnd(vx, opcode.nn()),
            0xD => Drw(vx, vy, opcode.n()),
            0xE => match opcode.nn() {
                0x9E => Skp(vx),
                0xA1 => Sknp(vx),
                _ => Unknown(opcode),
            },
            0xF => match opcode.nn() {
                0x07 => LdRegDt(vx),
                0x0A => LdKey(vx),
                0x15 => LdDtReg(vx),
                0x18 => LdSt(vx),
                0x1E => AddI(vx),
                0x29 => LdF(vx),
                0x33 => LdB(vx),
                0x55 => LdDerefIReg(vx),
                0x65 => LdRegDerefI(vx),
                _ => Unknown(opcode),
            },
            _ => unreachable!("4-bit quantity didn't match 0-15"),
        }
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let (mnemonic, operands) = disassembler::render(self);
        if operands.is_empty() {
            write!(f, "{}", mnemonic)
        } else {
            write!(f, "{} {}", mnemonic, operands.join(", "))
        }
    }
}
