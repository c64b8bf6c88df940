//! The checksummed hex dump: a plain text listing of memory that people can read, edit and
//! type back in.
//!
//! ```text
//! # title screen
//! 3000 86 41 B7 C1 00 39 : 78
//! 3006 01 02
//! 3008 03 : 06
//! ```
//! Each record is an address followed by byte values, optionally closed by `: CC`, where CC is
//! the sum (mod 256) of every value since the previous checksum or the start of the region.
//! `#` starts a comment. Records that don't continue the previous one start a new region, as
//! does any comment-only line; the last comment-only line before a region names it.
use super::*;
use lazy_static::lazy_static;
use regex::Regex;
use std::io::{BufRead, BufReader, Read, Write};

/// values per row when saving
pub const ROW_LEN: usize = 16;

lazy_static! {
    static ref RE_RECORD: Regex = Regex::new(r"^([^\s:]+)([^:]*)(?::(.*))?$").unwrap();
    static ref RE_ADDRESS: Regex = Regex::new(r"(?i)^[0-9a-f]{1,4}$").unwrap();
    static ref RE_VALUE: Regex = Regex::new(r"(?i)^[0-9a-f]{1,2}$").unwrap();
}

/// One line of values.
#[derive(Debug, PartialEq, Eq)]
pub struct DumpRecord {
    pub address: u16,
    pub data: Vec<u8>,
    pub checksum: Option<u8>,
}
impl fmt::Display for DumpRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04X}", self.address)?;
        for b in &self.data {
            write!(f, " {:02X}", b)?;
        }
        if let Some(sum) = self.checksum {
            write!(f, " : {:02X}", sum)?;
        }
        Ok(())
    }
}
impl DumpRecord {
    pub fn from_data(address: u16, data: &[u8]) -> Self {
        DumpRecord {
            address,
            data: data.to_vec(),
            checksum: Some(Self::calc_checksum(data)),
        }
    }
    /// Parses the record part of a line (comment already removed, not blank).
    pub fn from_str(s: &str) -> Result<Self, (ErrorKind, String)> {
        let c = RE_RECORD
            .captures(s)
            .ok_or_else(|| (ErrorKind::NoAddress, "missing address".to_string()))?;
        let address = Some(&c[1])
            .filter(|a| RE_ADDRESS.is_match(a))
            .and_then(|a| u16::from_str_radix(a, 16).ok())
            .ok_or_else(|| (ErrorKind::NoAddress, format!("bad address \"{}\"", &c[1])))?;
        let data = c[2].split_whitespace().map(Self::value).collect::<Result<Vec<u8>, _>>()?;
        let checksum = match c.get(3) {
            Some(sum) => Some(Self::value(sum.as_str().trim())?),
            None => None,
        };
        Ok(DumpRecord {
            address,
            data,
            checksum,
        })
    }
    fn value(s: &str) -> Result<u8, (ErrorKind, String)> {
        Some(s)
            .filter(|v| RE_VALUE.is_match(v))
            .and_then(|v| u8::from_str_radix(v, 16).ok())
            .ok_or_else(|| (ErrorKind::InvalidFormat, format!("bad value \"{}\"", s)))
    }
    pub fn calc_checksum(data: &[u8]) -> u8 { data.iter().fold(0u8, |sum, &b| sum.wrapping_add(b)) }
}

/// The region being accumulated while loading.
struct OpenRegion {
    start: u16,
    /// address of the next byte (may be 0x10000)
    next: u32,
    comment: String,
    /// running checksum since the last verified one
    sum: u8,
}

/// Records the finished region: either the BASIC area or another binary region.
fn close_region(region: OpenRegion, mem: &mut dyn Memory, program: &mut Program) -> Result<(), Error> {
    let end = (region.next - 1) as u16;
    let is_basic = region.start == BASIC_ORIGIN
        && end >= BASIC_ORIGIN + 2
        && (end - 2..=end).all(|a| mem.load8(a) == BASIC_SENTINEL);
    if is_basic {
        finish_basic_area(mem, end - 2)?;
        program.set_basic_area(true);
        verbose_println!("BASIC area {:04X}-{:04X}", region.start, end);
    } else {
        verbose_println!("region {:04X}-{:04X} {}", region.start, end, region.comment);
        program.add_address_region(region.start, end, &region.comment);
    }
    Ok(())
}

pub struct HexDumpCodec;

impl ProgramCodec for HexDumpCodec {
    fn read(&self, r: &mut dyn Read, mem: &mut dyn Memory, program: &mut Program) -> Result<(), Error> {
        let mut open: Option<OpenRegion> = None;
        let mut comment = String::new();
        for (i, line) in BufReader::new(r).lines().enumerate() {
            let line = line?;
            let line_num = i + 1;
            let (record, note) = match line.split_once('#') {
                Some((record, note)) => (record.trim(), Some(note.trim())),
                None => (line.trim(), None),
            };
            if record.is_empty() {
                // a comment-only line ends the region before it and names the next one
                if let Some(note) = note {
                    if let Some(o) = open.take() {
                        close_region(o, mem, program)?;
                    }
                    comment = note.to_string();
                }
                continue;
            }
            let rec = DumpRecord::from_str(record).map_err(|(kind, msg)| line_err!(line_num, kind, msg))?;
            if rec.data.is_empty() && rec.checksum.is_none() {
                continue;
            }
            if open.as_ref().map_or(true, |o| o.next != rec.address as u32) {
                if let Some(o) = open.take() {
                    close_region(o, mem, program)?;
                }
                open = Some(OpenRegion {
                    start: rec.address,
                    next: rec.address as u32,
                    comment: std::mem::take(&mut comment),
                    sum: 0,
                });
            }
            let Some(o) = open.as_mut() else {
                return Err(general_err!("no open region"));
            };
            if o.next + rec.data.len() as u32 > 0x10000 {
                return Err(line_err!(
                    line_num,
                    ErrorKind::MemoryFull,
                    format!("data at {:04X} runs past FFFF", rec.address)
                ));
            }
            for &b in &rec.data {
                mem.store8(o.next as u16, b);
                o.next += 1;
            }
            o.sum = o.sum.wrapping_add(DumpRecord::calc_checksum(&rec.data));
            if let Some(expected) = rec.checksum {
                if expected != o.sum {
                    return Err(line_err!(
                        line_num,
                        ErrorKind::CheckSum,
                        format!("checksum is {:02X} but the values add up to {:02X}", expected, o.sum)
                    ));
                }
                o.sum = 0;
            }
            // an empty region (a lone checksum) has nothing to record
            if o.next == o.start as u32 {
                open = None;
            }
        }
        if let Some(o) = open {
            close_region(o, mem, program)?;
        }
        Ok(())
    }
    fn write(&self, w: &mut dyn Write, mem: &dyn Memory, program: &Program) -> Result<(), Error> {
        if program.has_basic_area {
            let end = basic_area_end(mem)? + 2;
            writeln!(w, "# BASIC")?;
            write_block(w, mem, BASIC_ORIGIN, end)?;
        }
        for region in program.address_regions() {
            // always separate regions, even adjacent ones without a comment
            match region.comment.is_empty() {
                true => writeln!(w, "#")?,
                false => writeln!(w, "# {}", region.comment.replace(['\r', '\n'], " "))?,
            }
            write_block(w, mem, region.start, region.end)?;
        }
        Ok(())
    }
}

/// Writes [start, end] as rows of ROW_LEN values, each row closed by its checksum.
fn write_block(w: &mut dyn Write, mem: &dyn Memory, start: u16, end: u16) -> Result<(), Error> {
    let data: Vec<u8> = (start..=end).map(|a| mem.load8(a)).collect();
    for (i, row) in data.chunks(ROW_LEN).enumerate() {
        writeln!(w, "{}", DumpRecord::from_data(start + (i * ROW_LEN) as u16, row))?;
    }
    Ok(())
}
