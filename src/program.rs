//! The Program accumulator and the load/save entry points shared by all file formats.
use super::*;
use std::fs::{self, File};
use std::io::{BufReader, Read, Write};
use std::path::Path;

/// Address at which the BASIC interpreter keeps its program text.
pub const BASIC_ORIGIN: u16 = 0x0246;
/// The interpreter marks the end of the program text with three of these.
pub const BASIC_SENTINEL: u8 = 0xdf;
/// The four end-of-program pointers live here (big-endian words).
const BASIC_END_POINTERS: [u16; 4] = [0x0006, 0x0008, 0x000a, 0x000c];
pub const MAX_NAME_LEN: usize = 256;
pub const MAX_COMMENT_LEN: usize = 1024;

/// One contiguous block of binary data in the address space.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddressRegion {
    pub start: u16,
    /// inclusive
    pub end: u16,
    pub comment: String,
}
impl AddressRegion {
    pub fn new(start: u16, end: u16, comment: &str) -> Self {
        assert!(start <= end);
        AddressRegion {
            start,
            end,
            comment: comment.to_string(),
        }
    }
    pub fn len(&self) -> usize { (self.end - self.start) as usize + 1 }
}
impl fmt::Display for AddressRegion {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:04X}-{:04X} {}", self.start, self.end, self.comment)
    }
}

/// Everything known about a loaded (or to-be-saved) program, apart from the bytes themselves,
/// which live in memory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Program {
    pub name: String,
    pub comment: String,
    pub has_basic_area: bool,
    regions: Vec<AddressRegion>,
}
impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "Program \"{}\": {}{} binary region{}",
            self.name,
            if self.has_basic_area { "BASIC, " } else { "" },
            self.regions.len(),
            if self.regions.len() == 1 { "" } else { "s" }
        )
    }
}
impl Program {
    pub fn new() -> Self { Default::default() }
    pub fn set_name(&mut self, name: &str) { self.name = name.to_string() }
    pub fn set_comment(&mut self, comment: &str) { self.comment = comment.to_string() }
    pub fn set_basic_area(&mut self, has_basic_area: bool) { self.has_basic_area = has_basic_area }
    pub fn add_address_region(&mut self, start: u16, end: u16, comment: &str) {
        self.regions.push(AddressRegion::new(start, end, comment))
    }
    pub fn address_regions(&self) -> &[AddressRegion] { &self.regions }
}

/// The result of every load or save: whatever was accumulated, plus the error (if any)
/// that ended the call. Check status() before trusting program.
#[derive(Debug)]
pub struct Outcome {
    pub program: Program,
    pub error: Option<Error>,
}
impl Outcome {
    pub fn new(program: Program, result: Result<(), Error>) -> Self {
        Outcome {
            program,
            error: result.err(),
        }
    }
    pub fn status(&self) -> Status { self.error.as_ref().map_or(Status::Success, |e| Status::from(e.kind)) }
    pub fn is_ok(&self) -> bool { self.error.is_none() }
    pub fn message(&self) -> String {
        self.error.as_ref().map_or_else(|| "OK".to_string(), |e| e.msg.clone())
    }
    /// Drops whatever was accumulated if the call failed.
    pub fn into_result(self) -> Result<Program, Error> {
        match self.error {
            Some(e) => Err(e),
            None => Ok(self.program),
        }
    }
}

/// A persisted program representation.
pub trait ProgramCodec {
    /// Reads a program into memory, accumulating its description in program.
    fn read(&self, r: &mut dyn Read, mem: &mut dyn Memory, program: &mut Program) -> Result<(), Error>;
    /// Writes program (whose bytes are in memory) to w.
    fn write(&self, w: &mut dyn Write, mem: &dyn Memory, program: &Program) -> Result<(), Error>;
}

/// The supported file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    /// PROG container; the version is only used when saving
    Prog(u32),
    Basic,
    HexDump,
}
impl FileFormat {
    pub fn from_path(path: &Path, prog_version: u32) -> Result<Self, Error> {
        let ext = path.extension().and_then(std::ffi::OsStr::to_str).unwrap_or("");
        match ext.to_ascii_lowercase().as_str() {
            "prog" | "prg" => Ok(FileFormat::Prog(prog_version)),
            "bas" => Ok(FileFormat::Basic),
            "hex" | "dmp" => Ok(FileFormat::HexDump),
            _ => Err(format_err!("unrecognized file type \"{}\"", path.display())),
        }
    }
    pub fn codec(&self) -> Box<dyn ProgramCodec> {
        match self {
            FileFormat::Prog(version) => Box::new(prog::ProgCodec::new(*version)),
            FileFormat::Basic => Box::new(basic::BasicCodec),
            FileFormat::HexDump => Box::new(hex::HexDumpCodec),
        }
    }
}

/// Loads a program from r using the given format.
pub fn load(format: FileFormat, r: &mut dyn Read, mem: &mut dyn Memory) -> Outcome {
    let mut program = Program::new();
    let result = format.codec().read(r, mem, &mut program);
    Outcome::new(program, result)
}
/// Saves program to w using the given format.
pub fn save(format: FileFormat, w: &mut dyn Write, mem: &dyn Memory, program: &Program) -> Outcome {
    let result = format.codec().write(w, mem, program).and_then(|_| w.flush().map_err(Error::from));
    Outcome::new(program.clone(), result)
}
pub fn load_file(path: &Path, mem: &mut dyn Memory) -> Outcome {
    let result = FileFormat::from_path(path, 2).and_then(|format| Ok((format, File::open(path)?)));
    match result {
        Ok((format, file)) => {
            verbose_println!("loading {} as {:?}", path.display(), format);
            load(format, &mut BufReader::new(file), mem)
        }
        Err(e) => Outcome::new(Program::new(), Err(e)),
    }
}
/// Saves to path in the format its extension selects. The file is only touched once the whole
/// program has been encoded.
pub fn save_file(path: &Path, prog_version: u32, mem: &dyn Memory, program: &Program) -> Outcome {
    let format = match FileFormat::from_path(path, prog_version) {
        Ok(format) => format,
        Err(e) => return Outcome::new(program.clone(), Err(e)),
    };
    verbose_println!("saving {} as {:?}", path.display(), format);
    let mut buf: Vec<u8> = Vec::new();
    let outcome = save(format, &mut buf, mem, program);
    if !outcome.is_ok() {
        return outcome;
    }
    Outcome::new(program.clone(), fs::write(path, &buf).map_err(Error::from))
}

/// Writes the end-of-program sentinel at end and points the interpreter's bookkeeping at it.
/// The real interpreter won't run a program whose pointers don't agree with its text.
pub fn finish_basic_area(mem: &mut dyn Memory, end: u16) -> Result<(), Error> {
    if end as usize + 2 > mem.ram_top() as usize {
        return Err(memory_full_err!("BASIC program ends at {:04X} past top of RAM", end));
    }
    for i in 0..3 {
        mem.store8(end + i, BASIC_SENTINEL);
    }
    for (i, &ptr) in BASIC_END_POINTERS.iter().enumerate() {
        mem.store16(ptr, end.wrapping_add(i as u16));
    }
    Ok(())
}
/// The address of the first sentinel byte, according to the interpreter's end pointer.
pub fn basic_area_end(mem: &dyn Memory) -> Result<u16, Error> {
    let end = mem.load16(BASIC_END_POINTERS[0]);
    if end < BASIC_ORIGIN || end as usize + 2 > 0xffff {
        return Err(format_err!("BASIC end pointer {:04X} is out of range", end));
    }
    Ok(end)
}
/// Checks a name or comment against its length limit.
pub fn check_text_len(what: &str, text: &str, max: usize) -> Result<(), Error> {
    if text.len() > max {
        Err(format_err!("{} is {} bytes long (max {})", what, text.len(), max))
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use memory::Ram;
    #[test]
    fn sentinel_and_pointers() -> Result<(), Error> {
        let mut ram = Ram::new(0x7fff);
        finish_basic_area(&mut ram, 0x0250)?;
        assert_eq!([ram.load8(0x0250), ram.load8(0x0251), ram.load8(0x0252)], [0xdf; 3]);
        assert_eq!(ram.load16(0x0006), 0x0250);
        assert_eq!(ram.load16(0x0008), 0x0251);
        assert_eq!(ram.load16(0x000a), 0x0252);
        assert_eq!(ram.load16(0x000c), 0x0253);
        assert_eq!(basic_area_end(&ram)?, 0x0250);
        Ok(())
    }
    #[test]
    fn sentinel_must_fit_below_ram_top() {
        let mut ram = Ram::new(0x3fff);
        let e = finish_basic_area(&mut ram, 0x3ffe).unwrap_err();
        assert_eq!(e.kind, ErrorKind::MemoryFull);
        assert!(finish_basic_area(&mut ram, 0x3ffd).is_ok());
    }
    #[test]
    fn bad_end_pointer() {
        let ram = Ram::new(0x7fff);
        // a fresh RAM has a zero end pointer
        assert_eq!(basic_area_end(&ram).unwrap_err().kind, ErrorKind::InvalidFormat);
    }
    #[test]
    fn formats_by_extension() {
        assert_eq!(FileFormat::from_path(Path::new("a.PROG"), 1).unwrap(), FileFormat::Prog(1));
        assert_eq!(FileFormat::from_path(Path::new("a.bas"), 2).unwrap(), FileFormat::Basic);
        assert_eq!(FileFormat::from_path(Path::new("a.dmp"), 2).unwrap(), FileFormat::HexDump);
        assert_eq!(
            FileFormat::from_path(Path::new("a.asm"), 2).unwrap_err().kind,
            ErrorKind::InvalidFormat
        );
    }
    #[test]
    fn missing_file() {
        let mut ram = Ram::new(0x7fff);
        let outcome = load_file(Path::new("test/does_not_exist.prog"), &mut ram);
        assert_eq!(outcome.status(), Status::FileNotFound);
        assert_eq!(outcome.program, Program::new());
    }
    #[test]
    fn failed_save_leaves_file_alone() -> Result<(), Error> {
        let path = std::env::temp_dir().join(format!("jr100-prog-{}-keep.prog", std::process::id()));
        fs::write(&path, b"PROGprecious")?;
        let ram = Ram::new(0x7fff);
        let mut program = Program::new();
        program.add_address_region(0x1000, 0x1001, "");
        program.add_address_region(0x2000, 0x2001, "");
        let outcome = save_file(&path, 1, &ram, &program);
        assert_eq!(outcome.status(), Status::InvalidFormat);
        assert_eq!(fs::read(&path)?, b"PROGprecious");
        // the same program fits version 2
        assert!(save_file(&path, 2, &ram, &program).is_ok());
        assert_eq!(&fs::read(&path)?[..4], b"PROG");
        let mut fresh = Ram::new(0x7fff);
        assert_eq!(load_file(&path, &mut fresh).into_result()?, program);
        fs::remove_file(&path)?;
        Ok(())
    }
    #[test]
    fn outcome_reports_status() {
        let ok = Outcome::new(Program::new(), Ok(()));
        assert_eq!((ok.status(), ok.message().as_str()), (Status::Success, "OK"));
        let bad = Outcome::new(Program::new(), Err(Error::new(ErrorKind::CheckSum, "checksum mismatch")));
        assert_eq!(bad.status(), Status::CheckSumError);
        assert_eq!(bad.status().to_string(), "CHECK_SUM_ERROR");
        assert!(!bad.is_ok());
    }
}
