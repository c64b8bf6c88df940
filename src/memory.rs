//! The byte-addressable memory the codecs read from and write to.
//!
//! The emulator proper owns its address space; everything in this crate only
//! sees it through the [Memory] trait. [Ram] is a plain 64KB implementation
//! used by the command line driver and by tests.
use std::fmt;

pub trait Memory {
    fn load8(&self, addr: u16) -> u8;
    fn store8(&mut self, addr: u16, data: u8);
    /// highest address a growing program (e.g. BASIC) may occupy
    fn ram_top(&self) -> u16 { 0xffff }
    // reads two bytes as a u16 (high order byte first)
    fn load16(&self, addr: u16) -> u16 {
        let hi = self.load8(addr) as u16;
        let lo = self.load8(addr.wrapping_add(1)) as u16;
        hi << 8 | lo
    }
    fn store16(&mut self, addr: u16, data: u16) {
        self.store8(addr, (data >> 8) as u8);
        self.store8(addr.wrapping_add(1), data as u8);
    }
}

/// A flat 64KB address space.
pub struct Ram {
    mem: Vec<u8>,
    ram_top: u16,
}
impl Ram {
    pub fn new(ram_top: u16) -> Self {
        Ram {
            // allocate the entire 16-bit address space
            mem: vec![0u8; 0x10000],
            ram_top,
        }
    }
    /// copies bytes from a slice of u8 into memory at addr
    #[cfg(test)]
    pub fn load_bytes(&mut self, bytes: &[u8], addr: u16) {
        for (i, &b) in bytes.iter().enumerate() {
            self.store8(addr.wrapping_add(i as u16), b);
        }
    }
}
impl Memory for Ram {
    fn load8(&self, addr: u16) -> u8 { self.mem[addr as usize] }
    fn store8(&mut self, addr: u16, data: u8) { self.mem[addr as usize] = data }
    fn ram_top(&self) -> u16 { self.ram_top }
}
impl fmt::Debug for Ram {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Ram {{ {} bytes, ram_top: {:04X} }}", self.mem.len(), self.ram_top)
    }
}
