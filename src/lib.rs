/*
 * Copyright 2018 Ian Johnson
 *
 * This is free software, distributed under the MIT license.  A copy of the
 * license can be found in the LICENSE file in the project root, or at
 * https://opensource.org/licenses/MIT.
 */

//! A CHIP-8 virtual machine core.
//!
//! The crate provides the instruction decoder, the interpreter, the 60 Hz
//! timer pair and a disassembler.  Windows, rendering and input mapping are
//! left to the front-end, which drives the `Interpreter` through its public
//! methods.

#[macro_use]
extern crate enum_primitive;
extern crate failure;
#[macro_use]
extern crate failure_derive;
#[macro_use]
extern crate log;
extern crate num;
extern crate rand;
extern crate time;

/// The size of the Chip-8's memory, in bytes.
pub const MEM_SIZE: usize = 0x1000;
/// The address where programs should be loaded.
pub const PROG_START: usize = 0x200;
/// The maximum size of a Chip-8 program, in bytes.
pub const PROG_SIZE: usize = 0xE00;
/// The address of the built-in hex font.
pub const FONT_START: usize = 0x50;
/// The maximum depth of the call stack.
pub const STACK_SIZE: usize = 16;

pub mod disassembler;
pub mod display;
pub mod input;
pub mod instruction;
pub mod interpreter;
pub mod timer;

pub use disassembler::disassemble;
pub use input::Key;
pub use instruction::{Instruction, Opcode, Register};
pub use interpreter::{Fault, Interpreter};
