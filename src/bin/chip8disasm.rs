/*
 * Copyright 2018 Ian Johnson
 *
 * This is free software, distributed under the MIT license.  A copy of the
 * license can be found in the LICENSE file in the project root, or at
 * https://opensource.org/licenses/MIT.
 */

//! The `chip8disasm` binary program.
//!
//! Prints one line per instruction word: the address, the raw word and the
//! decoded instruction.  A trailing odd byte gets a line of its own so that
//! nothing in the file goes unreported.

extern crate chip8vm;
extern crate clap;
extern crate env_logger;
extern crate failure;
#[macro_use]
extern crate log;

use std::fs;
use std::io::{self, Read, Write};
use std::process;

use clap::{App, Arg, ArgMatches};
use failure::{Error, ResultExt};
use log::LevelFilter;

use chip8vm::disassembler::MAX_WORDS;
use chip8vm::{disassemble, PROG_SIZE, PROG_START};

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// What a listing contained, for the log.
#[derive(Debug, Default, PartialEq)]
struct Summary {
    words: usize,
    unknown: usize,
    trailing: Option<u8>,
}

fn absolute_help() -> String {
    format!(
        "show addresses as loaded at ${:03X} instead of file offsets",
        PROG_START
    )
}

fn main() {
    let absolute_help = absolute_help();
    let matches = App::new("chip8disasm")
        .version(VERSION)
        .about("Lists the instructions of a Chip-8 program")
        .arg(
            Arg::with_name("output")
                .short("o")
                .long("output")
                .value_name("OUTPUT")
                .help("write the listing to OUTPUT instead of standard output")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("absolute")
                .short("a")
                .long("absolute")
                .help(&absolute_help),
        )
        .arg(
            Arg::with_name("verbose")
                .short("v")
                .long("verbose")
                .multiple(true)
                .help("log more (repeat for debug and trace output)"),
        )
        .arg(
            Arg::with_name("FILE")
                .help("the program to list, or - for standard input")
                .default_value("-")
                .index(1),
        )
        .get_matches();

    init_logger(matches.occurrences_of("verbose"));

    if let Err(e) = run(&matches) {
        let mut chain = e.iter_chain();
        if let Some(first) = chain.next() {
            error!("{}", first);
        }
        for cause in chain {
            error!("  caused by: {}", cause);
        }
        process::exit(1);
    }
}

fn init_logger(verbosity: u64) {
    let filter = match verbosity {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    env_logger::Builder::new()
        .filter(None, filter)
        .format(|buf, record| writeln!(buf, "{}: {}", record.level(), record.args()))
        .init();
}

fn run(matches: &ArgMatches) -> Result<(), Error> {
    let program = match matches.value_of("FILE") {
        None | Some("-") => {
            let mut buf = Vec::new();
            io::stdin()
                .read_to_end(&mut buf)
                .context("could not read program from standard input")?;
            buf
        }
        Some(path) => {
            fs::read(path).with_context(|_| format!("could not read program '{}'", path))?
        }
    };
    info!("read {} bytes", program.len());
    if program.len() > PROG_SIZE {
        warn!(
            "program is {} bytes, but only {} fit in memory",
            program.len(),
            PROG_SIZE
        );
    }
    if program.len() > 2 * MAX_WORDS {
        warn!("only the first {} words are listed", MAX_WORDS);
    }

    let base = if matches.is_present("absolute") {
        PROG_START as u32
    } else {
        0
    };

    let summary = match matches.value_of("output") {
        Some(path) => {
            let mut file = fs::File::create(path)
                .with_context(|_| format!("could not create output file '{}'", path))?;
            write_listing(&program, base, &mut file)
        }
        None => {
            let stdout = io::stdout();
            let mut lock = stdout.lock();
            write_listing(&program, base, &mut lock)
        }
    }.context("could not write listing")?;

    info!(
        "listed {} words, {} of them unknown",
        summary.words, summary.unknown
    );
    if let Some(b) = summary.trailing {
        warn!("program has an odd length; trailing byte ${:02X} is not an instruction", b);
    }
    Ok(())
}

/// Formats a single listing line.
fn format_line(addr: u32, word: u16, mnemonic: &str, operands: &[String]) -> String {
    if operands.is_empty() {
        format!("{:03X}  {:04X}  {}", addr, word, mnemonic)
    } else {
        format!("{:03X}  {:04X}  {:<5}{}", addr, word, mnemonic, operands.join(", "))
    }
}

/// Writes the listing of `program`, with `base` added to every address.
fn write_listing<W: Write>(program: &[u8], base: u32, output: &mut W) -> io::Result<Summary> {
    let mut summary = Summary::default();
    let mut result = Ok(());
    disassemble(program, |offset, mnemonic, operands| {
        let at = usize::from(offset);
        let word = u16::from(program[at]) << 8 | u16::from(program[at + 1]);
        summary.words += 1;
        if mnemonic == "UNK" {
            debug!("unknown word ${:04X} at offset ${:03X}", word, offset);
            summary.unknown += 1;
        }
        if result.is_ok() {
            let line = format_line(base + u32::from(offset), word, mnemonic, operands);
            result = writeln!(output, "{}", line);
        }
    });
    result?;

    if program.len() % 2 != 0 && program.len() < 2 * MAX_WORDS {
        let at = program.len() - 1;
        let b = program[at];
        writeln!(output, "{:03X}  {:02X}    (odd trailing byte)", base + at as u32, b)?;
        summary.trailing = Some(b);
    }
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::{absolute_help, format_line, write_listing, Summary};

    fn listing(program: &[u8], base: u32) -> (String, Summary) {
        let mut out = Vec::new();
        let summary = write_listing(program, base, &mut out).unwrap();
        (String::from_utf8(out).unwrap(), summary)
    }

    #[test]
    fn lines_show_raw_words() {
        assert_eq!(format_line(0x200, 0x00E0, "CLS", &[]), "200  00E0  CLS");
        assert_eq!(
            format_line(0x2, 0xA202, "LD", &["I".to_owned(), "$202".to_owned()]),
            "002  A202  LD   I, $202"
        );
    }

    #[test]
    fn absolute_addresses() {
        // CLS; JMP $200
        let (text, summary) = listing(&[0x00, 0xE0, 0x12, 0x00], 0x200);
        assert_eq!(text, "200  00E0  CLS\n202  1200  JMP  $200\n");
        assert_eq!(
            summary,
            Summary {
                words: 2,
                unknown: 0,
                trailing: None,
            }
        );
    }

    #[test]
    fn odd_trailing_byte_is_reported() {
        // CLS; SHL V1 with an undefined subcode; then a lone $FF
        let (text, summary) = listing(&[0x00, 0xE0, 0x81, 0x2F, 0xFF], 0);
        assert_eq!(
            text,
            "000  00E0  CLS\n002  812F  UNK  $812F\n004  FF    (odd trailing byte)\n"
        );
        assert_eq!(
            summary,
            Summary {
                words: 2,
                unknown: 1,
                trailing: Some(0xFF),
            }
        );
    }

    #[test]
    fn empty_program_lists_nothing() {
        let (text, summary) = listing(&[], 0x200);
        assert!(text.is_empty());
        assert_eq!(summary, Summary::default());
    }

    #[test]
    fn help_uses_listing_address_syntax() {
        let help = absolute_help();
        assert!(help.contains("$200"), "help was {:?}", help);
        assert!(!help.contains('#'));
    }
}
