use std::fmt;

/// u8u16 is a helper enum for instruction operands that may be either one or two bytes wide.
/// Code that only cares about the value can use u16(); code that renders the operand
/// gets the width for free (Display prints 2 or 4 hex digits).
#[allow(non_camel_case_types)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum u8u16 {
    u8(u8),
    u16(u16),
}
impl fmt::Display for u8u16 {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let s = match self {
            u8u16::u8(val) => format!("{:02X}", val),
            u8u16::u16(val) => format!("{:04X}", val),
        };
        write!(f, "{:width$}", s, width = f.width().unwrap_or(0))
    }
}

impl u8u16 {
    /// builds a big-endian operand from the bytes following an opcode
    pub fn new(msb: u8, lsb: Option<u8>) -> Self {
        if let Some(lo) = lsb {
            u8u16::u16(((msb as u16) << 8) | (lo as u16))
        } else {
            u8u16::u8(msb)
        }
    }
    pub fn size(&self) -> u16 {
        match self {
            u8u16::u8(_) => 1,
            u8u16::u16(_) => 2,
        }
    }
    pub fn is_u8(&self) -> bool { matches!(self, u8u16::u8(_)) }
    pub fn u16(&self) -> u16 {
        match self {
            u8u16::u8(val) => *val as u16,
            u8u16::u16(val) => *val,
        }
    }
    pub fn u8(&self) -> u8 {
        match self {
            u8u16::u8(val) => *val,
            u8u16::u16(val) => (val & 0xff) as u8,
        }
    }
    pub fn lsb(&self) -> u8 { self.u8() }
    pub fn msb(&self) -> Option<u8> {
        match self {
            u8u16::u8(_) => None,
            u8u16::u16(w) => Some((w >> 8) as u8),
        }
    }
    /// writes the operand bytes (high order byte first) into buf, returning the count
    pub fn get_as_bytes(&self, buf: &mut [u8]) -> usize {
        let mut bytes = 0usize;
        if let Some(b) = self.msb() {
            buf[0] = b;
            bytes = 1;
        }
        buf[bytes] = self.lsb();
        bytes + 1
    }
    pub fn sign_extended(self) -> Self {
        match self {
            u8u16::u16(_) => self,
            u8u16::u8(b) => u8u16::u16(u16::from_be_bytes([if b & 0x80 == 0 { 0u8 } else { 0xffu8 }, b])),
        }
    }
    /// adds rhs to self as a signed offset (u8 offsets are sign extended first), wrapping at 16 bits
    pub fn signed_offset(self, rhs: Self) -> Self {
        assert!(!self.is_u8());
        u8u16::u16(self.u16().wrapping_add(rhs.sign_extended().u16()))
    }
}
