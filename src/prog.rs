//! The PROG container: a binary file holding a whole program (name, comment, BASIC text and
//! binary regions).
//!
//! Every file starts with the magic `PROG` and a 32-bit version. All integers are 32-bit
//! little-endian and all strings are a 32-bit length followed by UTF-8 bytes.
//!
//! Version 1 is flat and holds exactly one thing, either a BASIC program or a binary block:
//! ```text
//! name | start | length | flag (0 = BASIC) | data[length]
//! ```
//! Version 2 is a sequence of sections, read until the end of the file:
//! ```text
//! tag[4] | length | payload[length]
//! PNAM  name
//! CMNT  comment
//! PBAS  length | data[length]                      (loaded at the BASIC origin)
//! PBIN  start | length | data[length] | comment    (repeatable)
//! ```
//! Unknown sections are skipped. Repeated PNAM/CMNT/PBAS sections, and PBIN sections past
//! [MAX_BINARY_SECTIONS], are read (to stay aligned) and then ignored.
use super::*;
use std::io::{self, Read, Write};

pub const MAGIC: [u8; 4] = *b"PROG";
/// The most binary regions taken from one file.
pub const MAX_BINARY_SECTIONS: usize = 256;
const MAX_SECTION_LEN: u32 = 0x20000;

const TAG_NAME: [u8; 4] = *b"PNAM";
const TAG_BASIC: [u8; 4] = *b"PBAS";
const TAG_BINARY: [u8; 4] = *b"PBIN";
const TAG_COMMENT: [u8; 4] = *b"CMNT";

/// A decoded version 2 section.
#[derive(Debug, PartialEq, Eq)]
enum Section {
    Name(String),
    Comment(String),
    Basic(Vec<u8>),
    Binary { start: u16, data: Vec<u8>, comment: String },
}

pub struct ProgCodec {
    /// the version written by write(); read() accepts any supported version
    version: u32,
}
impl ProgCodec {
    pub fn new(version: u32) -> Self { ProgCodec { version } }
}
impl ProgramCodec for ProgCodec {
    fn read(&self, r: &mut dyn Read, mem: &mut dyn Memory, program: &mut Program) -> Result<(), Error> {
        let mut magic = [0u8; 4];
        r.read_exact(&mut magic)?;
        if magic != MAGIC {
            return Err(format_err!("not a PROG file (magic {:02X?})", magic));
        }
        match read_u32(r)? {
            1 => read_v1(r, mem, program),
            2 => read_v2(r, mem, program),
            v => Err(format_err!("unsupported PROG version {}", v)),
        }
    }
    fn write(&self, w: &mut dyn Write, mem: &dyn Memory, program: &Program) -> Result<(), Error> {
        // build the whole file first so that a failure leaves nothing half written
        let mut buf: Vec<u8> = Vec::new();
        buf.extend_from_slice(&MAGIC);
        write_u32(&mut buf, self.version)?;
        match self.version {
            1 => write_v1(&mut buf, mem, program)?,
            2 => write_v2(&mut buf, mem, program)?,
            v => unreachable!("no writer for PROG version {}", v),
        }
        w.write_all(&buf)?;
        verbose_println!("wrote {} byte PROG v{} file", buf.len(), self.version);
        Ok(())
    }
}

//
// primitives
//
fn read_u32(r: &mut dyn Read) -> Result<u32, Error> {
    let mut b = [0u8; 4];
    r.read_exact(&mut b)?;
    Ok(u32::from_le_bytes(b))
}
fn write_u32(w: &mut dyn Write, val: u32) -> Result<(), Error> { Ok(w.write_all(&val.to_le_bytes())?) }
/// reads exactly len bytes without trusting len for the allocation
fn read_bytes(r: &mut dyn Read, len: u32) -> Result<Vec<u8>, Error> {
    let mut data = Vec::new();
    r.take(len as u64).read_to_end(&mut data)?;
    if data.len() != len as usize {
        return Err(io::Error::new(io::ErrorKind::UnexpectedEof, "unexpected end of PROG data").into());
    }
    Ok(data)
}
fn read_string(r: &mut dyn Read, what: &str, max: usize) -> Result<String, Error> {
    let len = read_u32(r)?;
    if len as usize > max {
        return Err(format_err!("{} is {} bytes long (max {})", what, len, max));
    }
    String::from_utf8(read_bytes(r, len)?).map_err(|_| format_err!("{} is not valid UTF-8", what))
}
fn write_string(w: &mut dyn Write, what: &str, s: &str, max: usize) -> Result<(), Error> {
    check_text_len(what, s, max)?;
    write_u32(w, s.len() as u32)?;
    Ok(w.write_all(s.as_bytes())?)
}
/// checks that [start, start+len) lies within the address space
fn check_block(start: u32, len: u32) -> Result<(), Error> {
    if start as u64 + len as u64 > 0x10000 {
        return Err(format_err!("{} byte block at {:04X} runs past the end of memory", len, start));
    }
    Ok(())
}
fn store_block(mem: &mut dyn Memory, start: u16, data: &[u8]) {
    for (i, &b) in data.iter().enumerate() {
        mem.store8(start + i as u16, b);
    }
}
/// copies a BASIC body into memory at the origin and terminates it the way the interpreter expects
fn load_basic(mem: &mut dyn Memory, data: &[u8]) -> Result<(), Error> {
    let end = BASIC_ORIGIN as usize + data.len();
    if end + 2 > mem.ram_top() as usize {
        return Err(memory_full_err!("{} byte BASIC program doesn't fit", data.len()));
    }
    store_block(mem, BASIC_ORIGIN, data);
    finish_basic_area(mem, end as u16)
}
fn fetch_block(mem: &dyn Memory, start: u16, len: usize) -> Vec<u8> {
    (0..len).map(|i| mem.load8(start.wrapping_add(i as u16))).collect()
}

//
// version 1
//
fn read_v1(r: &mut dyn Read, mem: &mut dyn Memory, program: &mut Program) -> Result<(), Error> {
    let name = read_string(r, "program name", MAX_NAME_LEN)?;
    if !name.is_empty() {
        program.set_name(&name);
    }
    let start = read_u32(r)?;
    let len = read_u32(r)?;
    check_block(start, len)?;
    let flag = read_u32(r)?;
    let data = read_bytes(r, len)?;
    if flag == 0 {
        if start != BASIC_ORIGIN as u32 {
            return Err(format_err!("BASIC program at {:04X} instead of {:04X}", start, BASIC_ORIGIN));
        }
        load_basic(mem, &data)?;
        program.set_basic_area(true);
        verbose_println!("loaded {} byte BASIC program at {:04X}", len, start);
    } else {
        if len == 0 {
            return Err(format_err!("empty binary block at {:04X}", start));
        }
        store_block(mem, start as u16, &data);
        program.add_address_region(start as u16, (start + len - 1) as u16, "");
        verbose_println!("loaded {} bytes at {:04X}", len, start);
    }
    Ok(())
}
fn write_v1(w: &mut dyn Write, mem: &dyn Memory, program: &Program) -> Result<(), Error> {
    let (start, len, flag) = match (program.has_basic_area, program.address_regions()) {
        (true, []) => (BASIC_ORIGIN, (basic_area_end(mem)? - BASIC_ORIGIN) as usize, 0u32),
        (false, [region]) => (region.start, region.len(), 1u32),
        _ => {
            return Err(format_err!(
                "PROG version 1 holds either one BASIC program or one binary region, not both or several"
            ))
        }
    };
    write_string(w, "program name", &program.name, MAX_NAME_LEN)?;
    write_u32(w, start as u32)?;
    write_u32(w, len as u32)?;
    write_u32(w, flag)?;
    Ok(w.write_all(&fetch_block(mem, start, len))?)
}

//
// version 2
//
/// reads the next tag, or None at a clean end of file
fn read_tag(r: &mut dyn Read) -> Result<Option<[u8; 4]>, Error> {
    let mut tag = [0u8; 4];
    let mut got = 0;
    while got < tag.len() {
        match r.read(&mut tag[got..]) {
            Ok(0) if got == 0 => return Ok(None),
            Ok(0) => return Err(io::Error::new(io::ErrorKind::UnexpectedEof, "truncated section tag").into()),
            Ok(n) => got += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        }
    }
    Ok(Some(tag))
}
fn parse_section(tag: [u8; 4], payload: &[u8]) -> Result<Section, Error> {
    let mut cur = payload;
    let r: &mut dyn Read = &mut cur;
    let section = match tag {
        TAG_NAME => Section::Name(read_string(r, "program name", MAX_NAME_LEN)?),
        TAG_COMMENT => Section::Comment(read_string(r, "program comment", MAX_COMMENT_LEN)?),
        TAG_BASIC => {
            let len = read_u32(r)?;
            check_block(BASIC_ORIGIN as u32, len)?;
            Section::Basic(read_bytes(r, len)?)
        }
        TAG_BINARY => {
            let start = read_u32(r)?;
            let len = read_u32(r)?;
            check_block(start, len)?;
            if len == 0 {
                return Err(format_err!("empty binary section at {:04X}", start));
            }
            let data = read_bytes(r, len)?;
            let comment = read_string(r, "region comment", MAX_COMMENT_LEN)?;
            Section::Binary {
                start: start as u16,
                data,
                comment,
            }
        }
        _ => unreachable!("parse_section called for unknown tag"),
    };
    if !cur.is_empty() {
        return Err(format_err!(
            "{} section declares {} bytes but holds {}",
            String::from_utf8_lossy(&tag),
            payload.len(),
            payload.len() - cur.len()
        ));
    }
    Ok(section)
}
fn read_v2(r: &mut dyn Read, mem: &mut dyn Memory, program: &mut Program) -> Result<(), Error> {
    let (mut named, mut commented, mut basic) = (false, false, false);
    let mut binaries = 0usize;
    while let Some(tag) = read_tag(r)? {
        let len = read_u32(r)?;
        if !matches!(tag, TAG_NAME | TAG_COMMENT | TAG_BASIC | TAG_BINARY) {
            verbose_println!("skipping {} byte section {:02X?}", len, tag);
            let skipped = io::copy(&mut (&mut *r).take(len as u64), &mut io::sink())?;
            if skipped != len as u64 {
                return Err(io::Error::new(io::ErrorKind::UnexpectedEof, "truncated section").into());
            }
            continue;
        }
        if len > MAX_SECTION_LEN {
            return Err(format_err!("{} section is too long ({} bytes)", String::from_utf8_lossy(&tag), len));
        }
        let payload = read_bytes(r, len)?;
        // a payload shorter than its own fields is a length mismatch, not an io problem
        let section = parse_section(tag, &payload).map_err(|e| match e.kind {
            ErrorKind::IO => format_err!("{} section is shorter than its contents", String::from_utf8_lossy(&tag)),
            _ => e,
        })?;
        match section {
            Section::Name(name) if !named => {
                named = true;
                program.set_name(&name);
            }
            Section::Comment(comment) if !commented => {
                commented = true;
                program.set_comment(&comment);
            }
            Section::Basic(data) if !basic => {
                basic = true;
                load_basic(mem, &data)?;
                program.set_basic_area(true);
                verbose_println!("loaded {} byte BASIC program", data.len());
            }
            Section::Binary { start, data, comment } if binaries < MAX_BINARY_SECTIONS => {
                binaries += 1;
                store_block(mem, start, &data);
                program.add_address_region(start, start + (data.len() - 1) as u16, &comment);
                verbose_println!("loaded {} bytes at {:04X}", data.len(), start);
            }
            s => warn!("ignoring extra section {:?}", DiscardedSection(&s)),
        }
    }
    Ok(())
}
/// Debug view of a discarded section that doesn't dump its data.
struct DiscardedSection<'a>(&'a Section);
impl fmt::Debug for DiscardedSection<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Section::Name(_) => write!(f, "PNAM"),
            Section::Comment(_) => write!(f, "CMNT"),
            Section::Basic(_) => write!(f, "PBAS"),
            Section::Binary { start, .. } => write!(f, "PBIN@{:04X}", start),
        }
    }
}
fn write_section(w: &mut dyn Write, tag: [u8; 4], payload: &[u8]) -> Result<(), Error> {
    w.write_all(&tag)?;
    write_u32(w, payload.len() as u32)?;
    Ok(w.write_all(payload)?)
}
fn write_v2(w: &mut dyn Write, mem: &dyn Memory, program: &Program) -> Result<(), Error> {
    let mut payload: Vec<u8> = Vec::new();
    if !program.name.is_empty() {
        write_string(&mut payload, "program name", &program.name, MAX_NAME_LEN)?;
        write_section(w, TAG_NAME, &payload)?;
    }
    if !program.comment.is_empty() {
        payload.clear();
        write_string(&mut payload, "program comment", &program.comment, MAX_COMMENT_LEN)?;
        write_section(w, TAG_COMMENT, &payload)?;
    }
    if program.has_basic_area {
        let len = (basic_area_end(mem)? - BASIC_ORIGIN) as usize;
        payload.clear();
        write_u32(&mut payload, len as u32)?;
        payload.extend(fetch_block(mem, BASIC_ORIGIN, len));
        write_section(w, TAG_BASIC, &payload)?;
    }
    if program.address_regions().len() > MAX_BINARY_SECTIONS {
        return Err(format_err!(
            "{} binary regions (max {})",
            program.address_regions().len(),
            MAX_BINARY_SECTIONS
        ));
    }
    for region in program.address_regions() {
        payload.clear();
        write_u32(&mut payload, region.start as u32)?;
        write_u32(&mut payload, region.len() as u32)?;
        payload.extend(fetch_block(mem, region.start, region.len()));
        write_string(&mut payload, "region comment", &region.comment, MAX_COMMENT_LEN)?;
        write_section(w, TAG_BINARY, &payload)?;
    }
    Ok(())
}
