//! BASIC program text.
//!
//! Each line of a `.bas` file is `<number> <body>`. In memory the interpreter keeps, from
//! [BASIC_ORIGIN] on, one record per line: the line number as a big-endian word, the body
//! bytes and a zero terminator. The last record is followed by the 0xDF sentinel.
//!
//! Bytes that can't be written as plain text appear in the file as `\XX` (two hex digits).
use super::*;
use lazy_static::lazy_static;
use regex::Regex;
use std::io::{Read, Write};

/// the interpreter's input buffer limits a line body to this many bytes
pub const MAX_LINE_LEN: usize = 72;
pub const MAX_LINE_NUMBER: u32 = 32767;

lazy_static! {
    static ref RE_LINE: Regex = Regex::new(r"^([0-9]+) ?(.*)$").unwrap();
}

pub struct BasicCodec;

impl ProgramCodec for BasicCodec {
    fn read(&self, r: &mut dyn Read, mem: &mut dyn Memory, program: &mut Program) -> Result<(), Error> {
        let mut text = Vec::new();
        r.read_to_end(&mut text)?;
        let mut addr = BASIC_ORIGIN as usize;
        for (i, raw) in text.split(|&b| b == b'\n').enumerate() {
            let line_num = i + 1;
            if !raw.is_ascii() {
                return Err(line_err!(line_num, ErrorKind::InvalidFormat, "non-ASCII character"));
            }
            // is_ascii() guarantees valid UTF-8
            let line = String::from_utf8_lossy(raw).trim().to_ascii_uppercase();
            if line.is_empty() {
                continue;
            }
            let (number, body) = parse_line(&line).map_err(|msg| line_err!(line_num, ErrorKind::InvalidFormat, msg))?;
            // number, body, terminator, and room left for the sentinel
            let next = addr + 2 + body.len() + 1;
            if next + 2 > mem.ram_top() as usize {
                return Err(line_err!(
                    line_num,
                    ErrorKind::MemoryFull,
                    format!("BASIC line {} doesn't fit below {:04X}", number, mem.ram_top())
                ));
            }
            mem.store16(addr as u16, number);
            for (j, &b) in body.iter().enumerate() {
                mem.store8((addr + 2 + j) as u16, b);
            }
            mem.store8((next - 1) as u16, 0);
            addr = next;
        }
        finish_basic_area(mem, addr as u16)?;
        program.set_basic_area(true);
        verbose_println!("loaded {} bytes of BASIC", addr - BASIC_ORIGIN as usize);
        Ok(())
    }
    fn write(&self, w: &mut dyn Write, mem: &dyn Memory, program: &Program) -> Result<(), Error> {
        if !program.has_basic_area {
            return Err(format_err!("program has no BASIC area"));
        }
        // build the whole listing first so that a failure leaves nothing half written
        let mut buf: Vec<u8> = Vec::new();
        let mut addr = BASIC_ORIGIN as usize;
        loop {
            if addr + 1 > 0xffff {
                return Err(format_err!("BASIC program has no end marker"));
            }
            if mem.load16(addr as u16) == u16::from_be_bytes([BASIC_SENTINEL; 2]) {
                break;
            }
            let number = mem.load16(addr as u16);
            addr += 2;
            let mut body = Vec::new();
            loop {
                if addr > 0xffff {
                    return Err(format_err!("BASIC line {} has no terminator", number));
                }
                match mem.load8(addr as u16) {
                    0 => break,
                    b => body.push(b),
                }
                addr += 1;
            }
            addr += 1;
            writeln!(buf, "{} {}", number, escape(&body))?;
        }
        w.write_all(&buf)?;
        Ok(())
    }
}

/// Splits a trimmed, uppercased line into its number and encoded body.
fn parse_line(line: &str) -> Result<(u16, Vec<u8>), String> {
    let caps = RE_LINE.captures(line).ok_or_else(|| "missing line number".to_string())?;
    let number = caps[1]
        .parse::<u32>()
        .ok()
        .filter(|n| (1..=MAX_LINE_NUMBER).contains(n))
        .ok_or_else(|| format!("line number {} out of range", &caps[1]))?;
    let body = unescape(&caps[2])?;
    if body.len() > MAX_LINE_LEN {
        return Err(format!("line {} is {} bytes long (max {})", number, body.len(), MAX_LINE_LEN));
    }
    Ok((number as u16, body))
}

fn unescape(s: &str) -> Result<Vec<u8>, String> {
    let bytes = s.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'\\' {
            let b = s
                .get(i + 1..i + 3)
                .and_then(|hex| u8::from_str_radix(hex, 16).ok())
                .ok_or_else(|| format!("bad escape at column {}", i + 1))?;
            if b == 0 {
                // zero terminates the line record
                return Err(format!("\\00 at column {} can't appear in a line", i + 1));
            }
            out.push(b);
            i += 3;
        } else {
            out.push(bytes[i]);
            i += 1;
        }
    }
    Ok(out)
}

/// Text form of a line body; anything that wouldn't survive reloading is escaped.
fn escape(body: &[u8]) -> String {
    let mut s = String::with_capacity(body.len());
    for &b in body {
        match b {
            b'\\' | b'a'..=b'z' | 0x00..=0x1f | 0x7f..=0xff => s.push_str(&format!("\\{:02X}", b)),
            _ => s.push(b as char),
        }
    }
    s
}

#[cfg(test)]
mod tests {
    use super::*;
    use memory::Ram;

    fn read(text: &str, ram: &mut Ram) -> Outcome { load(FileFormat::Basic, &mut text.as_bytes(), ram) }
    fn write(ram: &Ram, program: &Program) -> (Outcome, String) {
        let mut out = Vec::new();
        let outcome = save(FileFormat::Basic, &mut out, ram, program);
        (outcome, String::from_utf8(out).unwrap())
    }
    fn bytes_at(ram: &Ram, addr: u16, n: usize) -> Vec<u8> { (0..n).map(|i| ram.load8(addr + i as u16)).collect() }

    #[test]
    fn one_line_encoding() {
        let mut ram = Ram::new(0x7fff);
        let outcome = read("10 PRINT 1\n", &mut ram);
        assert!(outcome.is_ok(), "{}", outcome.message());
        assert!(outcome.program.has_basic_area);
        assert_eq!(
            bytes_at(&ram, 0x0246, 13),
            vec![0x00, 0x0a, b'P', b'R', b'I', b'N', b'T', b' ', b'1', 0x00, 0xdf, 0xdf, 0xdf]
        );
        assert_eq!(ram.load16(0x0006), 0x0250);
        assert_eq!(ram.load16(0x000c), 0x0253);
    }
    #[test]
    fn lines_are_trimmed_and_uppercased() {
        let mut ram = Ram::new(0x7fff);
        let outcome = read("\r\n   20 goto 10  \r\n\n30\n", &mut ram);
        assert!(outcome.is_ok(), "{}", outcome.message());
        assert_eq!(
            bytes_at(&ram, 0x0246, 14),
            vec![0x00, 0x14, b'G', b'O', b'T', b'O', b' ', b'1', b'0', 0x00, 0x00, 0x1e, 0x00, 0xdf]
        );
    }
    #[test]
    fn escapes() {
        let mut ram = Ram::new(0x7fff);
        let outcome = read("5 A$=\"\\80\\ff\\5C\"\n", &mut ram);
        assert!(outcome.is_ok(), "{}", outcome.message());
        assert_eq!(bytes_at(&ram, 0x0248, 8), b"A$=\"\x80\xff\\\"".to_vec());
        let (outcome, text) = write(&ram, &outcome.program);
        assert!(outcome.is_ok());
        assert_eq!(text, "5 A$=\"\\80\\FF\\5C\"\n");
    }
    #[test]
    fn bad_lines() {
        for text in ["PRINT 1", "0 END", "32768 END", "10 \\8", "10 \\G0", "10 ÄRGER"] {
            let outcome = read(text, &mut Ram::new(0x7fff));
            assert_eq!(outcome.status(), Status::InvalidFormat, "{}", text);
        }
        let long = format!("10 REM {}", "X".repeat(MAX_LINE_LEN));
        assert_eq!(read(&long, &mut Ram::new(0x7fff)).status(), Status::InvalidFormat);
        let max = format!("32767 REM {}", "X".repeat(MAX_LINE_LEN - 4));
        assert!(read(&max, &mut Ram::new(0x7fff)).is_ok());
    }
    #[test]
    fn zero_escape_is_rejected() {
        let outcome = read("10 A\\00B\n20 END\n", &mut Ram::new(0x7fff));
        assert_eq!(outcome.status(), Status::InvalidFormat);
        assert!(!outcome.program.has_basic_area);
    }
    #[test]
    fn lowercase_and_control_bytes_survive_saving() {
        let mut ram = Ram::new(0x7fff);
        ram.load_bytes(&[0x00, 0x0a, b'a', 0x07, 0x7f, b'Z', 0x00], 0x0246);
        finish_basic_area(&mut ram, 0x024d).unwrap();
        let mut program = Program::new();
        program.set_basic_area(true);
        let (outcome, text) = write(&ram, &program);
        assert!(outcome.is_ok(), "{}", outcome.message());
        assert_eq!(text, "10 \\61\\07\\7FZ\n");
        let mut fresh = Ram::new(0x7fff);
        assert!(read(&text, &mut fresh).is_ok());
        assert_eq!(bytes_at(&fresh, 0x0246, 7), bytes_at(&ram, 0x0246, 7));
    }
    #[test]
    fn memory_full() {
        // 0x0246 + 3 lines of 13 bytes = 0x026D; the sentinel needs 0x026D..=0x026F
        let text = "10 PRINT 1234\n20 PRINT 1234\n30 PRINT 1234\n";
        assert!(read(text, &mut Ram::new(0x026f)).is_ok());
        let outcome = read(text, &mut Ram::new(0x026e));
        assert_eq!(outcome.status(), Status::MemoryFull);
        assert!(!outcome.program.has_basic_area);
    }
    #[test]
    fn save_walks_to_the_sentinel() {
        let mut ram = Ram::new(0x7fff);
        let outcome = read("10 FOR I=1 TO 9\n20 PRINT I\n30 NEXT\n", &mut ram);
        let (outcome, text) = write(&ram, &outcome.program);
        assert!(outcome.is_ok(), "{}", outcome.message());
        assert_eq!(text, "10 FOR I=1 TO 9\n20 PRINT I\n30 NEXT\n");
    }
    #[test]
    fn save_needs_a_basic_area() {
        let (outcome, _) = write(&Ram::new(0x7fff), &Program::new());
        assert_eq!(outcome.status(), Status::InvalidFormat);
    }
    #[test]
    fn save_without_terminator() {
        let mut ram = Ram::new(0xffff);
        // one good line, then a line that runs off the end of memory
        for a in 0x0246..=0xffffu32 {
            ram.store8(a as u16, b'X');
        }
        ram.load_bytes(&[0x00, 0x0a, b'A', 0x00], 0x0246);
        let mut program = Program::new();
        program.set_basic_area(true);
        let (outcome, text) = write(&ram, &program);
        assert_eq!(outcome.status(), Status::InvalidFormat);
        assert!(text.is_empty());
    }
}
