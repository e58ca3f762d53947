/*
 * Copyright 2018 Ian Johnson
 *
 * This is free software, distributed under the MIT license.  A copy of the
 * license can be found in the LICENSE file in the project root, or at
 * https://opensource.org/licenses/MIT.
 */

//! Runs small programs end to end through the public interface.

extern crate chip8vm;

use std::thread;

use chip8vm::interpreter::Options;
use chip8vm::{disassemble, Interpreter, Key, Register};

fn load(program: &[u8]) -> Interpreter {
    let mut interpreter = Interpreter::with_options(Options::testing());
    interpreter.load_program(program);
    interpreter
}

#[test]
fn clear_then_spin() {
    // CLS; JMP $200
    let mut interpreter = load(&[0x00, 0xE0, 0x12, 0x00]);

    for _ in 0..100 {
        interpreter.cycle().unwrap();
        assert!(interpreter.display().is_blank());
        assert!(interpreter.pc() == 0x200 || interpreter.pc() == 0x202);
    }
    // An even number of cycles always lands back on the `CLS`.
    assert_eq!(interpreter.pc(), 0x200);
    assert!(!interpreter.halted());
}

#[test]
fn subtract_with_borrow() {
    // LD V0, $05; LD V1, $0A; SUB V0, V1
    let mut interpreter = load(&[0x60, 0x05, 0x61, 0x0A, 0x80, 0x15]);

    for _ in 0..3 {
        interpreter.cycle().unwrap();
    }
    assert_eq!(interpreter.register(Register::V0), 251);
    assert_eq!(interpreter.register(Register::VF), 0);
    assert_eq!(interpreter.pc(), 0x206);
}

#[test]
fn add_wraps_with_carry() {
    // LD V2, $FF; LD V3, $01; ADD V2, V3; ADD V2, $01
    let mut interpreter = load(&[0x62, 0xFF, 0x63, 0x01, 0x82, 0x34, 0x72, 0x01]);

    for _ in 0..3 {
        interpreter.cycle().unwrap();
    }
    assert_eq!(interpreter.register(Register::V2), 0);
    assert_eq!(interpreter.register(Register::VF), 1);
    interpreter.cycle().unwrap();
    assert_eq!(interpreter.register(Register::V2), 1);
}

#[test]
fn draw_digit_and_bcd() {
    // LD V0, $7B; LD I, $300; LD B, V0; LD V2, [I]; LD F, V1; DRAW V3, V3, 5
    let mut interpreter = load(&[
        0x60, 0x7B, 0xA3, 0x00, 0xF0, 0x33, 0xF2, 0x65, 0xF1, 0x29, 0xD3, 0x35,
    ]);

    for _ in 0..4 {
        interpreter.cycle().unwrap();
    }
    assert_eq!(&interpreter.mem()[0x300..0x303], &[1, 2, 3]);
    assert_eq!(&interpreter.registers()[..4], &[1, 2, 3, 0]);

    // V1 = 2, so this selects the glyph for '2' and draws it at (V3, V3).
    interpreter.cycle().unwrap();
    interpreter.cycle().unwrap();
    assert!(interpreter.should_redraw());
    let glyph = [0xF0u8, 0x10, 0xF0, 0x80, 0xF0];
    for (row, bits) in glyph.iter().enumerate() {
        for col in 0..8 {
            let expected = bits & (0x80 >> col) != 0;
            assert_eq!(interpreter.display().get(col, row), expected);
        }
    }
}

#[test]
fn keys_from_another_thread() {
    // LD V5, K; JMP $202
    let mut interpreter = load(&[0xF5, 0x0A, 0x12, 0x02]);
    interpreter.cycle().unwrap();
    assert_eq!(interpreter.pc(), 0x200);

    let keypad = interpreter.keypad();
    thread::spawn(move || keypad.press(Key::KE))
        .join()
        .unwrap();

    interpreter.cycle().unwrap();
    assert_eq!(interpreter.register(Register::V5), 0xE);
    assert_eq!(interpreter.pc(), 0x202);
}

#[test]
fn timers_ticked_elsewhere() {
    // LD V0, $3C; LD DT, V0; LD ST, V0
    let mut interpreter = Interpreter::new();
    interpreter.load_program(&[0x60, 0x3C, 0xF0, 0x15, 0xF0, 0x18]);
    for _ in 0..3 {
        interpreter.cycle().unwrap();
    }
    assert!(interpreter.should_beep());

    let timers = interpreter.timers();
    thread::spawn(move || {
        for _ in 0..100 {
            timers.tick();
        }
    }).join()
        .unwrap();

    assert_eq!(interpreter.dt(), 0);
    assert_eq!(interpreter.st(), 0);
    assert!(!interpreter.should_beep());
}

#[test]
fn listing_of_load_i() {
    let mut emitted = Vec::new();
    disassemble(&[0xA2, 0x02], |addr, mnemonic, operands| {
        emitted.push((addr, mnemonic.to_owned(), operands.to_vec()));
    });

    assert_eq!(
        emitted,
        vec![(0, "LD".to_owned(), vec!["I".to_owned(), "$202".to_owned()])]
    );
}

#[test]
fn listing_covers_whole_program() {
    let program = [0x00, 0xE0, 0x12, 0x00, 0x81, 0x2F, 0xFF];
    let mut addrs = Vec::new();
    let mut mnemonics = Vec::new();
    disassemble(&program, |addr, mnemonic, _| {
        addrs.push(addr);
        mnemonics.push(mnemonic.to_owned());
    });

    assert_eq!(addrs, vec![0, 2, 4]);
    assert_eq!(mnemonics, vec!["CLS", "JMP", "UNK"]);
}
