/*
 * Copyright 2018 Ian Johnson
 *
 * This is free software, distributed under the MIT license.  A copy of the
 * license can be found in the LICENSE file in the project root, or at
 * https://opensource.org/licenses/MIT.
 */

//! The Chip-8 disassembler.
//!
//! Disassembly is a single linear pass: every aligned pair of bytes is
//! decoded with `Instruction::decode` and reported, whether it is code or
//! data.  Nothing is executed and no state is kept between calls.

use std::io::{self, Write};

use instruction::{Instruction, Opcode};

/// The most instructions `disassemble` will list, one per 16-bit even offset.
pub const MAX_WORDS: usize = 0x8000;

/// Returns the mnemonic and operands of the given instruction.
///
/// Registers are written `V0` to `VF`, addresses as `$NNN`, bytes as `$NN`
/// and sprite heights in decimal.  Unknown words come out as `UNK` with the
/// raw word as their only operand.
pub fn render(instr: &Instruction) -> (&'static str, Vec<String>) {
    use self::Instruction::*;

    let addr = |a: u16| format!("${:03X}", a);
    let byte = |b: u8| format!("${:02X}", b);

    match *instr {
        Cls => ("CLS", vec![]),
        Ret => ("RET", vec![]),
        Sys(a) => ("SYS", vec![addr(a)]),
        Jp(a) => ("JMP", vec![addr(a)]),
        Call(a) => ("CALL", vec![addr(a)]),
        SeByte(reg, b) => ("SE", vec![reg.to_string(), byte(b)]),
        SneByte(reg, b) => ("SNE", vec![reg.to_string(), byte(b)]),
        SeReg(reg1, reg2) => ("SE", vec![reg1.to_string(), reg2.to_string()]),
        LdByte(reg, b) => ("LD", vec![reg.to_string(), byte(b)]),
        AddByte(reg, b) => ("ADD", vec![reg.to_string(), byte(b)]),
        LdReg(reg1, reg2) => ("LD", vec![reg1.to_string(), reg2.to_string()]),
        Or(reg1, reg2) => ("OR", vec![reg1.to_string(), reg2.to_string()]),
        And(reg1, reg2) => ("AND", vec![reg1.to_string(), reg2.to_string()]),
        Xor(reg1, reg2) => ("XOR", vec![reg1.to_string(), reg2.to_string()]),
        AddReg(reg1, reg2) => ("ADD", vec![reg1.to_string(), reg2.to_string()]),
        Sub(reg1, reg2) => ("SUB", vec![reg1.to_string(), reg2.to_string()]),
        Shr(reg) => ("SHR", vec![reg.to_string()]),
        Subn(reg1, reg2) => ("SUBN", vec![reg1.to_string(), reg2.to_string()]),
        Shl(reg) => ("SHL", vec![reg.to_string()]),
        SneReg(reg1, reg2) => ("SNE", vec![reg1.to_string(), reg2.to_string()]),
        LdI(a) => ("LD", vec!["I".to_owned(), addr(a)]),
        JpV0(a) => ("JMP", vec!["V0".to_owned(), addr(a)]),
        Rnd(reg, b) => ("RND", vec![reg.to_string(), byte(b)]),
        Drw(reg1, reg2, n) => ("DRAW", vec![reg1.to_string(), reg2.to_string(), n.to_string()]),
        Skp(reg) => ("SKP", vec![reg.to_string()]),
        Sknp(reg) => ("SKNP", vec![reg.to_string()]),
        LdRegDt(reg) => ("LD", vec![reg.to_string(), "DT".to_owned()]),
        LdKey(reg) => ("LD", vec![reg.to_string(), "K".to_owned()]),
        LdDtReg(reg) => ("LD", vec!["DT".to_owned(), reg.to_string()]),
        LdSt(reg) => ("LD", vec!["ST".to_owned(), reg.to_string()]),
        AddI(reg) => ("ADD", vec!["I".to_owned(), reg.to_string()]),
        LdF(reg) => ("LD", vec!["F".to_owned(), reg.to_string()]),
        LdB(reg) => ("LD", vec!["B".to_owned(), reg.to_string()]),
        LdDerefIReg(reg) => ("LD", vec!["[I]".to_owned(), reg.to_string()]),
        LdRegDerefI(reg) => ("LD", vec![reg.to_string(), "[I]".to_owned()]),
        Unknown(opcode) => ("UNK", vec![opcode.to_string()]),
    }
}

/// Disassembles the given program, calling `emit` once per instruction.
///
/// `emit` receives the offset of the instruction from the start of
/// `program`, its mnemonic and its operands, in increasing offset order.  A
/// trailing odd byte is ignored.  Offsets are 16 bits, so at most the first
/// `MAX_WORDS` words (64 KiB) are listed; anything past offset `$FFFE` is
/// ignored.
///
/// # Examples
///
/// ```
/// use chip8vm::disassemble;
///
/// let mut listing = Vec::new();
/// disassemble(&[0xA2, 0x02], |addr, mnemonic, operands| {
///     listing.push((addr, mnemonic.to_owned(), operands.to_vec()));
/// });
/// assert_eq!(listing, vec![(0, "LD".to_owned(), vec!["I".to_owned(), "$202".to_owned()])]);
/// ```
pub fn disassemble<F>(program: &[u8], mut emit: F)
where
    F: FnMut(u16, &str, &[String]),
{
    for (i, word) in program.chunks(2).take(MAX_WORDS).enumerate() {
        if word.len() < 2 {
            break;
        }
        let instr = Instruction::decode(Opcode::from_bytes(word[0], word[1]));
        let (mnemonic, operands) = render(&instr);
        emit((2 * i) as u16, mnemonic, &operands);
    }
}

/// Writes a listing of the given program, one instruction per line.
///
/// `base` is added to every address; pass `PROG_START` to see the addresses
/// the program will run at.
pub fn dump<W: Write>(program: &[u8], base: u16, output: &mut W) -> io::Result<()> {
    let mut result = Ok(());
    disassemble(program, |addr, mnemonic, operands| {
        if result.is_ok() {
            let addr = base.wrapping_add(addr);
            result = if operands.is_empty() {
                writeln!(output, "{:03X}  {}", addr, mnemonic)
            } else {
                writeln!(output, "{:03X}  {:<5}{}", addr, mnemonic, operands.join(", "))
            };
        }
    });
    result
}

#[cfg(test)]
mod tests {
    use super::{disassemble, dump, MAX_WORDS};

    /// Collects the emitted instructions as `(address, text)` pairs.
    fn listing(program: &[u8]) -> Vec<(u16, String)> {
        let mut out = Vec::new();
        disassemble(program, |addr, mnemonic, operands| {
            out.push((addr, format!("{} {}", mnemonic, operands.join(","))))
        });
        out
    }

    #[test]
    fn one_line_per_word() {
        let lines = listing(&[0x00, 0xE0, 0x12, 0x00, 0x00]);
        assert_eq!(
            lines,
            vec![(0, "CLS ".to_owned()), (2, "JMP $200".to_owned())]
        );
        assert!(listing(&[0xA2]).is_empty());
    }

    #[test]
    fn offsets_stop_at_64k() {
        let program = vec![0; 0x10004];
        let mut count = 0;
        let mut last = None;
        disassemble(&program, |addr, _, _| {
            count += 1;
            last = Some(addr);
        });
        assert_eq!(count, MAX_WORDS);
        assert_eq!(last, Some(0xFFFE));
    }

    #[test]
    fn mnemonics() {
        let cases: &[(&[u8], &str)] = &[
            (&[0x00, 0xEE], "RET "),
            (&[0x03, 0x45], "SYS $345"),
            (&[0x2A, 0xBC], "CALL $ABC"),
            (&[0x3A, 0x07], "SE VA,$07"),
            (&[0x4B, 0xFF], "SNE VB,$FF"),
            (&[0x51, 0x20], "SE V1,V2"),
            (&[0x6C, 0x10], "LD VC,$10"),
            (&[0x7D, 0x01], "ADD VD,$01"),
            (&[0x81, 0x20], "LD V1,V2"),
            (&[0x81, 0x21], "OR V1,V2"),
            (&[0x81, 0x22], "AND V1,V2"),
            (&[0x81, 0x23], "XOR V1,V2"),
            (&[0x81, 0x24], "ADD V1,V2"),
            (&[0x81, 0x25], "SUB V1,V2"),
            (&[0x81, 0x26], "SHR V1"),
            (&[0x81, 0x27], "SUBN V1,V2"),
            (&[0x81, 0x2E], "SHL V1"),
            (&[0x81, 0x29], "UNK $8129"),
            (&[0x9E, 0xF0], "SNE VE,VF"),
            (&[0xB2, 0x10], "JMP V0,$210"),
            (&[0xC3, 0x0F], "RND V3,$0F"),
            (&[0xD0, 0x1F], "DRAW V0,V1,15"),
            (&[0xE4, 0x9E], "SKP V4"),
            (&[0xE4, 0xA1], "SKNP V4"),
            (&[0xE4, 0x00], "UNK $E400"),
            (&[0xF5, 0x07], "LD V5,DT"),
            (&[0xF5, 0x0A], "LD V5,K"),
            (&[0xF5, 0x15], "LD DT,V5"),
            (&[0xF5, 0x18], "LD ST,V5"),
            (&[0xF5, 0x1E], "ADD I,V5"),
            (&[0xF5, 0x29], "LD F,V5"),
            (&[0xF5, 0x33], "LD B,V5"),
            (&[0xF5, 0x55], "LD [I],V5"),
            (&[0xF5, 0x65], "LD V5,[I]"),
            (&[0xF5, 0x99], "UNK $F599"),
        ];

        for &(program, expected) in cases.iter() {
            assert_eq!(listing(program), vec![(0, expected.to_owned())]);
        }
    }

    #[test]
    fn dump_listing() {
        let mut output = Vec::new();
        dump(&[0xA2, 0x02, 0x00, 0xE0, 0xD0, 0x15], 0x200, &mut output).unwrap();
        assert_eq!(
            String::from_utf8(output).unwrap(),
            "200  LD   I, $202\n202  CLS\n204  DRAW V0, V1, 5\n"
        );
    }
}
