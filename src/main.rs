//! # JR-100 program file tool
//!
//! Loads a program saved from a JR-100 (MB8861 CPU) emulator in any of the formats it
//! understands, then disassembles it and/or converts it to another format.
//!
//! ## Getting Started
//! To list every binary region of a program:
//! ```
//! cargo run -- -l /path/to/game.prog
//! ```
//! To convert a BASIC listing into a version 1 container:
//! ```
//! jr100-prog --prog-version 1 -o game.prog game.bas
//! ```
//! ## Options
//! Help for command line options is available using -h or --help.
#[macro_use]
mod macros;
mod basic;
mod config;
mod disasm;
mod error;
mod hex;
mod instructions;
mod listing;
mod memory;
mod prog;
mod program;
mod resolve;
mod u8oru16;
use memory::Ram;
use std::path::Path;
use std::result::Result;
use std::{fmt, io};
pub(crate) use u8oru16::u8u16;
pub(crate) use {crate::error::*, memory::Memory, program::*};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    config::init();
    // process_file does all the work
    if let Err(e) = process_file(config::ARGS.file.as_str()) {
        println!("{}", e);
        return Err(Box::new(e));
    }
    Ok(())
}
/// process_file drives the top level functionality (load, disassemble, save) of the app
fn process_file(filename: &str) -> Result<(), Error> {
    let mut ram = Ram::new(config::ARGS.ram_top);
    let outcome = load_file(Path::new(filename), &mut ram);
    if !outcome.is_ok() {
        warn!("{} while loading {}", outcome.status(), filename);
    }
    let program = outcome.into_result()?;
    info!("Loaded {}: {}", filename, program);
    if !program.comment.is_empty() {
        info!("{}", program.comment);
    }
    let mut stdout = io::stdout();
    if let Some((start, end)) = config::disasm_window() {
        if start > 0xffff || end > 0x10000 || start >= end {
            return Err(general_err!(format!("bad disassembly range {:04X}..{:04X}", start, end)));
        }
        disassemble(&ram, start as u16, end, &mut stdout)?;
    }
    if config::ARGS.list {
        for region in program.address_regions() {
            println!("; {}", region);
            disassemble(&ram, region.start, region.end as u32 + 1, &mut stdout)?;
        }
    }
    if let Some(out) = config::ARGS.output.as_ref() {
        let outcome = save_file(Path::new(out), config::ARGS.prog_version, &ram, &program);
        if !outcome.is_ok() {
            warn!("{} while saving {}", outcome.status(), out);
        }
        outcome.into_result()?;
        info!("Saved {}", out);
    }
    Ok(())
}
fn disassemble(mem: &dyn Memory, start: u16, end: u32, f: &mut dyn io::Write) -> Result<(), Error> {
    let n = listing::disassemble_memory(mem, start, end, f)?;
    verbose_println!("{} instructions in {:04X}..{:04X}", n, start, end);
    Ok(())
}
#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn test_files(dir: &str) -> Result<Vec<std::path::PathBuf>, Error> {
        let mut entries = fs::read_dir(dir)?
            .map(|res| res.map(|e| e.path()))
            .collect::<Result<Vec<_>, io::Error>>()?;
        entries.sort();
        Ok(entries.into_iter().filter(|e| e.is_file()).collect())
    }
    /// loads a file and returns it with the memory it was loaded into
    fn load_path(path: &Path) -> (Ram, Outcome) {
        let mut ram = Ram::new(0x7fff);
        let outcome = load_file(path, &mut ram);
        (ram, outcome)
    }
    #[test]
    fn various_programs() -> Result<(), Error> {
        // every file in ./test should load cleanly
        const TEST_PATH: &str = "test";
        println!("Attempting to load all files in {}", TEST_PATH);
        for e in test_files(TEST_PATH)? {
            process_file(e.to_str().unwrap())?
        }
        Ok(())
    }
    #[test]
    fn conversions_preserve_programs() -> Result<(), Error> {
        // save every file in ./test in each format it fits and load it back
        for e in test_files("test")? {
            let (ram, outcome) = load_path(&e);
            let program = outcome.into_result()?;
            let mut formats = vec![FileFormat::Prog(2), FileFormat::HexDump];
            if matches!((program.has_basic_area, program.address_regions().len()), (true, 0) | (false, 1)) {
                formats.push(FileFormat::Prog(1));
            }
            for format in formats {
                let mut buf = Vec::new();
                save(format, &mut buf, &ram, &program).into_result()?;
                let mut fresh = Ram::new(0x7fff);
                let reloaded = load(format, &mut &buf[..], &mut fresh).into_result()?;
                assert_eq!(reloaded.has_basic_area, program.has_basic_area, "{:?} {:?}", e, format);
                assert_eq!(reloaded.address_regions().len(), program.address_regions().len());
                for (a, b) in program.address_regions().iter().zip(reloaded.address_regions()) {
                    assert_eq!((a.start, a.end), (b.start, b.end), "{:?} {:?}", e, format);
                    assert!((a.start..=a.end).all(|addr| ram.load8(addr) == fresh.load8(addr)));
                }
                if program.has_basic_area {
                    let end = basic_area_end(&ram)?;
                    assert_eq!(basic_area_end(&fresh)?, end);
                    assert!((BASIC_ORIGIN..=end + 2).all(|addr| ram.load8(addr) == fresh.load8(addr)));
                }
            }
        }
        Ok(())
    }
    #[test]
    fn format_errors() -> Result<(), Error> {
        // every file in ./test/errors should fail to load, with the status its name starts with
        const TEST_PATH: &str = "test/errors";
        for pb in test_files(TEST_PATH)? {
            let stem = pb.file_stem().and_then(|s| s.to_str()).unwrap_or("");
            let (_, outcome) = load_path(&pb);
            let status = outcome.status().to_string().to_ascii_lowercase();
            assert!(
                stem.starts_with(&status) && !outcome.is_ok(),
                "expected the status named by {} but got {} ({})",
                pb.display(),
                outcome.status(),
                outcome.message()
            );
        }
        Ok(())
    }
    #[test]
    fn listing_a_loaded_program() -> Result<(), Error> {
        let (ram, outcome) = load_path(Path::new("test/counter.hex"));
        let program = outcome.into_result()?;
        let region = &program.address_regions()[0];
        let mut out = Vec::new();
        listing::disassemble_memory(&ram, region.start, region.end as u32 + 1, &mut out)?;
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("3000  CE 00 00  LDX   0x0000\nL1:\n"), "{}", text);
        assert!(text.contains("BNE   L1"), "{}", text);
        Ok(())
    }
}
