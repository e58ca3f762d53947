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

//! The Chip-8 interpreter.
//!
//! The main focus of this module is the `Interpreter` struct, which contains
//! the state of a Chip-8 machine and provides the interface used by a
//! front-end: load a program, run `cycle` at whatever rate it likes, feed key
//! events and timer ticks, and read back the display and registers.
//!
//! Memory accesses through `I` and the program counter wrap around the end
//! of memory.  Stack misuse and jumps into the interpreter area are reported
//! as a `Fault`, after which the machine halts until a program is loaded.

use std::cmp;
use std::default::Default;
use std::num::Wrapping;
use std::sync::Arc;
use std::u8;

use rand;

use display::{self, HEX_HEIGHT, HEX_SPRITES};
use input::{Key, Keypad};
use instruction::{Instruction, Opcode, Register};
use timer::{Clock, Timers, TIMER_FREQ};
use {FONT_START, MEM_SIZE, PROG_SIZE, PROG_START, STACK_SIZE};

/// A condition that stops the machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Fail)]
pub enum Fault {
    /// A `CALL` was made with a full call stack.
    #[fail(display = "call stack overflow at {:#05X}", _0)]
    StackOverflow(u16),
    /// A `RET` was made outside of any subroutine.
    #[fail(display = "no subroutine to return from at {:#05X}", _0)]
    StackUnderflow(u16),
    /// A jump or call targeted the interpreter area.
    #[fail(display = "jump to {:#05X} below program area at {:#05X}", target, at)]
    JumpBelowProgram { at: u16, target: u16 },
}

/// Options for the interpreter.
#[derive(Debug, Clone)]
pub struct Options {
    /// Whether loading a program starts the timers (default `true`).
    pub enable_timer: bool,
    /// Whether `SHL` sets `VF` when the low nibble is all ones, as some old
    /// interpreters did, rather than to the bit shifted out (default `false`).
    pub legacy_shift_flag: bool,
    /// The frequency of the wall clock used by `update_timers`, in Hz
    /// (default 60).
    pub timer_freq: u32,
}

impl Options {
    /// Returns the default set of options.
    pub fn new() -> Self {
        Options {
            enable_timer: true,
            legacy_shift_flag: false,
            timer_freq: TIMER_FREQ,
        }
    }

    /// Returns a set of options useful for testing (e.g. no timer).
    pub fn testing() -> Self {
        Options {
            enable_timer: false,
            ..Options::new()
        }
    }
}

impl Default for Options {
    fn default() -> Self {
        Options::new()
    }
}

/// A Chip-8 interpreter.
///
/// This struct contains the entire state of a Chip-8 machine and provides
/// all the expected methods for interacting with it, such as stepping
/// through execution and inspecting the internal state.
pub struct Interpreter {
    /// The internal memory.
    mem: [u8; MEM_SIZE],
    /// The display buffer.
    display: display::Buffer,
    /// Whether the last cycle changed the display.
    should_redraw: bool,
    /// The input state, shared with the front-end.
    keypad: Arc<Keypad>,
    /// The general-purpose registers `V0`-`VF`.
    regs: [Wrapping<u8>; 16],
    /// The special register `I`.
    reg_i: Wrapping<u16>,
    /// The delay and sound timers, shared with whoever ticks them.
    timers: Arc<Timers>,
    /// The wall clock driving `update_timers`.
    clock: Clock,
    /// The program counter.
    pc: Wrapping<u16>,
    /// The call stack (for returning from subroutines).
    call_stack: Vec<u16>,
    /// The fault that halted the machine, if any.
    fault: Option<Fault>,

    /// Whether to start the timers on load.
    enable_timer: bool,
    /// Whether to use the legacy `SHL` flag.
    legacy_shift_flag: bool,
}

impl Interpreter {
    /// Returns a new interpreter with the default options.
    pub fn new() -> Self {
        Interpreter::with_options(Options::default())
    }

    /// Returns a new interpreter using the given options.
    pub fn with_options(options: Options) -> Self {
        let mut interpreter = Interpreter {
            mem: [0; MEM_SIZE],
            display: display::Buffer::new(),
            should_redraw: false,
            keypad: Arc::new(Keypad::new()),
            regs: [Wrapping(0); 16],
            reg_i: Wrapping(0),
            timers: Arc::new(Timers::new()),
            clock: Clock::new(options.timer_freq),
            pc: Wrapping(PROG_START as u16),
            call_stack: Vec::with_capacity(STACK_SIZE),
            fault: None,

            enable_timer: options.enable_timer,
            legacy_shift_flag: options.legacy_shift_flag,
        };

        // Copy sprites into memory.
        for (i, sprite) in HEX_SPRITES.iter().enumerate() {
            let start = FONT_START + i * HEX_HEIGHT;
            let end = start + sprite.len();
            interpreter.mem[start..end].copy_from_slice(sprite);
        }

        interpreter
    }

    /// Loads a program, resetting the machine.
    ///
    /// Everything from the program area onwards is cleared before the
    /// program is copied in; programs longer than the program area are
    /// truncated.  The keypad is left alone, since it mirrors physical keys.
    pub fn load_program(&mut self, program: &[u8]) {
        if program.len() > PROG_SIZE {
            warn!(
                "program is {} bytes long; only the first {} will be loaded",
                program.len(),
                PROG_SIZE
            );
        }
        let len = cmp::min(program.len(), PROG_SIZE);

        for byte in self.mem[PROG_START..].iter_mut() {
            *byte = 0;
        }
        self.mem[PROG_START..PROG_START + len].copy_from_slice(&program[..len]);

        self.display.clear();
        self.should_redraw = false;
        self.regs = [Wrapping(0); 16];
        self.reg_i = Wrapping(0);
        self.pc = Wrapping(PROG_START as u16);
        self.call_stack.clear();
        self.fault = None;
        self.timers.reset();
        if self.enable_timer {
            self.start_timer();
        }
        info!("loaded {} byte program", len);
    }

    /// Returns a reference to the display buffer.
    pub fn display(&self) -> &display::Buffer {
        &self.display
    }

    /// Returns whether the display changed during the last cycle.
    pub fn should_redraw(&self) -> bool {
        self.should_redraw
    }

    /// Returns whether a tone should be playing.
    pub fn should_beep(&self) -> bool {
        self.timers.should_beep()
    }

    /// Returns a handle to the keypad, which may be moved to another thread.
    pub fn keypad(&self) -> Arc<Keypad> {
        Arc::clone(&self.keypad)
    }

    /// Marks the given key as held down.
    pub fn key_down(&self, key: Key) {
        self.keypad.press(key);
    }

    /// Marks the given key as released.
    pub fn key_up(&self, key: Key) {
        self.keypad.release(key);
    }

    /// Returns a handle to the timers, which may be moved to another thread
    /// and ticked from there.
    pub fn timers(&self) -> Arc<Timers> {
        Arc::clone(&self.timers)
    }

    /// Starts the timers and the wall clock.
    pub fn start_timer(&mut self) {
        self.timers.start();
        self.clock.start();
    }

    /// Stops the timers and the wall clock.
    pub fn stop_timer(&mut self) {
        self.timers.stop();
        self.clock.stop();
    }

    /// Performs a single 60 Hz timer step.
    pub fn tick_timers(&self) {
        self.timers.tick();
    }

    /// Applies the timer steps that have elapsed on the wall clock since the
    /// last call, returning how many were applied.
    pub fn update_timers(&mut self) -> u32 {
        // Both timers are at zero after 255 ticks, whatever they started at.
        let ticks = cmp::min(self.clock.lap(), u32::from(u8::MAX));
        for _ in 0..ticks {
            self.timers.tick();
        }
        ticks
    }

    /// Returns the internal memory.
    pub fn mem(&self) -> &[u8; MEM_SIZE] {
        &self.mem
    }

    /// Returns the value of register `I`.
    pub fn i(&self) -> u16 {
        self.reg_i.0
    }

    /// Sets the value of register `I`.
    pub fn set_i(&mut self, val: u16) {
        self.reg_i = Wrapping(val);
    }

    /// Returns the value of the delay timer.
    pub fn dt(&self) -> u8 {
        self.timers.delay()
    }

    /// Returns the value of the sound timer.
    pub fn st(&self) -> u8 {
        self.timers.sound()
    }

    /// Returns the value in the given register.
    pub fn register(&self, reg: Register) -> u8 {
        self.regs[reg as usize].0
    }

    /// Returns the values of all sixteen registers.
    pub fn registers(&self) -> [u8; 16] {
        let mut regs = [0; 16];
        for (dest, src) in regs.iter_mut().zip(self.regs.iter()) {
            *dest = src.0;
        }
        regs
    }

    /// Sets the given register to the given value.
    pub fn set_register(&mut self, reg: Register, val: u8) {
        self.regs[reg as usize] = Wrapping(val);
    }

    /// Returns the value of the program counter.
    pub fn pc(&self) -> u16 {
        self.pc.0
    }

    /// Returns the return addresses on the call stack, innermost last.
    pub fn stack(&self) -> &[u16] {
        &self.call_stack
    }

    /// Returns whether a fault has halted the interpreter.
    pub fn halted(&self) -> bool {
        self.fault.is_some()
    }

    /// Returns the fault that halted the interpreter, if any.
    pub fn fault(&self) -> Option<Fault> {
        self.fault
    }

    /// Returns the opcode at the program counter.
    pub fn current_opcode(&self) -> Opcode {
        let high = self.mem[wrap(self.pc.0)];
        let low = self.mem[wrap(self.pc.0.wrapping_add(1))];
        Opcode::from_bytes(high, low)
    }

    /// Performs a single fetch-decode-execute step.
    ///
    /// A halted interpreter does nothing.  If the instruction faults, the
    /// program counter is left pointing at it, the interpreter halts and the
    /// fault is returned (it stays available through `fault`).
    pub fn cycle(&mut self) -> Result<(), Fault> {
        if self.halted() {
            return Ok(());
        }

        let opcode = self.current_opcode();
        self.pc += Wrapping(2);
        self.should_redraw = false;

        let instr = Instruction::decode(opcode);
        trace!("{:#05X}: {}", self.pc.0.wrapping_sub(2), instr);
        self.execute(instr).map_err(|fault| {
            error!("{}", fault);
            self.pc -= Wrapping(2);
            self.fault = Some(fault);
            fault
        })
    }

    /// Executes the given instruction in the current interpreter context.
    ///
    /// The interpreter behaves as if the given instruction had just been
    /// fetched, i.e. the program counter already points past it.
    pub fn execute(&mut self, ins: Instruction) -> Result<(), Fault> {
        use self::Instruction::*;

        match ins {
            Cls => if self.display.clear() {
                self.should_redraw = true;
            },
            Ret => {
                let at = self.pc.0.wrapping_sub(2);
                self.pc = Wrapping(self.call_stack.pop().ok_or(Fault::StackUnderflow(at))?);
            }
            Sys(addr) => debug!("ignoring machine code routine at {:#05X}", addr),
            Jp(addr) => self.jump(addr)?,
            Call(addr) => {
                if self.call_stack.len() == STACK_SIZE {
                    return Err(Fault::StackOverflow(self.pc.0.wrapping_sub(2)));
                }
                let ret = self.pc.0;
                self.jump(addr)?;
                self.call_stack.push(ret);
            }
            SeByte(reg, b) => if self.register(reg) == b {
                self.skip();
            },
            SneByte(reg, b) => if self.register(reg) != b {
                self.skip();
            },
            SeReg(reg1, reg2) => if self.register(reg1) == self.register(reg2) {
                self.skip();
            },
            LdByte(reg, b) => self.set_register(reg, b),
            AddByte(reg, b) => self.regs[reg as usize] += Wrapping(b),
            LdReg(reg1, reg2) => {
                let r2 = self.register(reg2);
                self.set_register(reg1, r2);
            }
            Or(reg1, reg2) => {
                let r1 = self.register(reg1);
                let r2 = self.register(reg2);
                self.set_register(reg1, r1 | r2);
            }
            And(reg1, reg2) => {
                let r1 = self.register(reg1);
                let r2 = self.register(reg2);
                self.set_register(reg1, r1 & r2);
            }
            Xor(reg1, reg2) => {
                let r1 = self.register(reg1);
                let r2 = self.register(reg2);
                self.set_register(reg1, r1 ^ r2);
            }
            AddReg(reg1, reg2) => self.add(reg1, reg2),
            Sub(reg1, reg2) => self.sub(reg1, reg2),
            Shr(reg) => self.shr(reg),
            Subn(reg1, reg2) => self.subn(reg1, reg2),
            Shl(reg) => self.shl(reg),
            SneReg(reg1, reg2) => if self.register(reg1) != self.register(reg2) {
                self.skip();
            },
            LdI(addr) => self.set_i(addr),
            JpV0(addr) => {
                let target = addr + u16::from(self.register(Register::V0));
                self.jump(target)?;
            }
            Rnd(reg, b) => self.set_register(reg, rand::random::<u8>() & b),
            Drw(reg1, reg2, n) => self.drw(reg1, reg2, n),
            Skp(reg) => if self.is_pressed(reg) {
                self.skip();
            },
            Sknp(reg) => if !self.is_pressed(reg) {
                self.skip();
            },
            LdRegDt(reg) => {
                let dt = self.dt();
                self.set_register(reg, dt);
            }
            LdKey(reg) => match self.keypad.first_pressed() {
                Some(key) => self.set_register(reg, key as u8),
                // Run this instruction again until a key shows up.
                None => self.pc -= Wrapping(2),
            },
            LdDtReg(reg) => self.timers.set_delay(self.register(reg)),
            LdSt(reg) => self.timers.set_sound(self.register(reg)),
            AddI(reg) => {
                let r = u16::from(self.register(reg));
                self.reg_i += Wrapping(r);
            }
            LdF(reg) => {
                let r = u16::from(self.register(reg));
                self.set_i(FONT_START as u16 + HEX_HEIGHT as u16 * r);
            }
            LdB(reg) => self.ld_b(reg),
            LdDerefIReg(reg) => {
                let start = self.i();
                for (k, &r) in reg.up_to().iter().enumerate() {
                    self.mem[wrap(start.wrapping_add(k as u16))] = self.register(r);
                }
            }
            LdRegDerefI(reg) => {
                let start = self.i();
                for (k, &r) in reg.up_to().iter().enumerate() {
                    let val = self.mem[wrap(start.wrapping_add(k as u16))];
                    self.set_register(r, val);
                }
            }
            Unknown(opcode) => debug!("ignoring unknown opcode {}", opcode),
        }

        Ok(())
    }

    /// Moves the program counter to `addr`, which must lie in the program
    /// area.
    fn jump(&mut self, addr: u16) -> Result<(), Fault> {
        if (addr as usize) < PROG_START {
            return Err(Fault::JumpBelowProgram {
                at: self.pc.0.wrapping_sub(2),
                target: addr,
            });
        }
        self.pc = Wrapping(addr);
        Ok(())
    }

    /// Skips the next instruction.
    fn skip(&mut self) {
        self.pc += Wrapping(2);
    }

    /// Returns whether the key named by the given register is pressed.
    ///
    /// Values above `0xF` name no key, so they are never pressed.
    fn is_pressed(&self, reg: Register) -> bool {
        Key::from_byte(self.register(reg)).map_or(false, |key| self.keypad.is_pressed(key))
    }

    /// Sets `VF` to the given flag.
    fn set_flag(&mut self, flag: bool) {
        self.set_register(Register::VF, flag as u8);
    }

    // The flag-setting operations below write `VF` before the result, so an
    // operation targeting `VF` keeps its result rather than the flag.

    /// Adds `reg2` to `reg1`, setting `VF` to 1 on carry or 0 otherwise.
    fn add(&mut self, reg1: Register, reg2: Register) {
        let (r1, r2) = (self.register(reg1), self.register(reg2));
        self.set_flag(r2 > u8::MAX - r1);
        self.set_register(reg1, r1.wrapping_add(r2));
    }

    /// Subtracts `reg2` from `reg1`, setting `VF` to 1 if `reg1` was strictly
    /// greater or 0 otherwise.
    fn sub(&mut self, reg1: Register, reg2: Register) {
        let (r1, r2) = (self.register(reg1), self.register(reg2));
        self.set_flag(r1 > r2);
        self.set_register(reg1, r1.wrapping_sub(r2));
    }

    /// Sets `reg1` to `reg2 - reg1`, setting `VF` to 1 if `reg2` was strictly
    /// greater or 0 otherwise.
    fn subn(&mut self, reg1: Register, reg2: Register) {
        let (r1, r2) = (self.register(reg1), self.register(reg2));
        self.set_flag(r2 > r1);
        self.set_register(reg1, r2.wrapping_sub(r1));
    }

    /// Shifts `reg` right by one, setting `VF` to the old lowest bit.
    fn shr(&mut self, reg: Register) {
        let r = self.register(reg);
        self.set_flag(r & 1 == 1);
        self.set_register(reg, r >> 1);
    }

    /// Shifts `reg` left by one, setting `VF` to the old highest bit (or, in
    /// legacy mode, to whether the low nibble was all ones).
    fn shl(&mut self, reg: Register) {
        let r = self.register(reg);
        let flag = if self.legacy_shift_flag {
            r & 0xF == 0xF
        } else {
            r & 0x80 != 0
        };
        self.set_flag(flag);
        self.set_register(reg, r << 1);
    }

    /// Implements the `DRAW` operation.
    fn drw(&mut self, reg1: Register, reg2: Register, n: u8) {
        let x = self.register(reg1) as usize;
        let y = self.register(reg2) as usize;
        self.set_flag(false);

        let start = self.i();
        let sprite: Vec<u8> = (0..u16::from(n))
            .map(|row| self.mem[wrap(start.wrapping_add(row))])
            .collect();
        let blit = self.display.draw_sprite(&sprite, x, y);

        if blit.changed {
            self.should_redraw = true;
        }
        self.set_flag(blit.collision);
    }

    /// Implements the `LD B, Vx` operation.
    fn ld_b(&mut self, reg: Register) {
        let val = self.register(reg);
        let addr = self.i();

        self.mem[wrap(addr)] = val / 100;
        self.mem[wrap(addr.wrapping_add(1))] = val % 100 / 10;
        self.mem[wrap(addr.wrapping_add(2))] = val % 10;
    }
}

impl Default for Interpreter {
    fn default() -> Self {
        Interpreter::new()
    }
}

/// Maps an address onto memory, wrapping past the end.
fn wrap(addr: u16) -> usize {
    addr as usize % MEM_SIZE
}
