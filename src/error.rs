use std::{convert::From, fmt, io};

/// Simple custom Error for the program file tools
pub struct Error {
    pub kind: ErrorKind,
    pub msg: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// a record or line that should start with an address doesn't
    NoAddress,
    /// stored checksum doesn't match the data it covers
    CheckSum,
    /// malformed or unsupported file contents
    InvalidFormat,
    /// the named file doesn't exist
    FileNotFound,
    /// underlying io error (including truncated input)
    IO,
    /// catch-all for other errors
    Unexpected,
    /// the program doesn't fit in the available RAM
    MemoryFull,
}

/// The terminal status reported by every load or save.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Success,
    NoAddress,
    CheckSumError,
    InvalidFormat,
    FileNotFound,
    IoError,
    UnexpectedError,
    MemoryFull,
}

impl From<ErrorKind> for Status {
    fn from(kind: ErrorKind) -> Self {
        match kind {
            ErrorKind::NoAddress => Status::NoAddress,
            ErrorKind::CheckSum => Status::CheckSumError,
            ErrorKind::InvalidFormat => Status::InvalidFormat,
            ErrorKind::FileNotFound => Status::FileNotFound,
            ErrorKind::IO => Status::IoError,
            ErrorKind::Unexpected => Status::UnexpectedError,
            ErrorKind::MemoryFull => Status::MemoryFull,
        }
    }
}
impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let s = match self {
            Status::Success => "SUCCESS",
            Status::NoAddress => "NO_ADDRESS",
            Status::CheckSumError => "CHECK_SUM_ERROR",
            Status::InvalidFormat => "INVALID_FORMAT",
            Status::FileNotFound => "FILE_NOT_FOUND",
            Status::IoError => "IO_ERROR",
            Status::UnexpectedError => "UNEXPECTED_ERROR",
            Status::MemoryFull => "MEMORY_FULL",
        };
        write!(f, "{:width$}", s, width = f.width().unwrap_or(0))
    }
}

impl Error {
    pub fn new(kind: ErrorKind, message: &str) -> Error {
        Error {
            kind,
            msg: String::from(message),
        }
    }
}

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Self {
        let kind = match e.kind() {
            io::ErrorKind::NotFound => ErrorKind::FileNotFound,
            _ => ErrorKind::IO,
        };
        Error::new(kind, e.to_string().as_str())
    }
}

impl fmt::Debug for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}: {:?}: {}", red!("prog::Error"), self.kind, self.msg)
    }
}
impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result { write!(f, "{}", self.msg) }
}
impl std::error::Error for Error {}
