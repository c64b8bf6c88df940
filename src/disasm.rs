//! Turns raw MB8861 machine code into a sequence of [Instruction]s.
//!
//! Decoding is table driven (see instructions.rs) and never fails: bytes without an opcode
//! decode as a 1-byte `???`, and operand bytes past the end of the supplied buffer read as 0.
use super::*;
use instructions::{AddressingMode, Flavor};

/// One decoded machine instruction.
#[derive(Clone, Copy, Debug)]
pub struct Instruction {
    /// address of the opcode
    pub addr: u16,
    /// the opcode byte
    pub op: u8,
    /// the Flavor of this instruction
    pub flavor: &'static Flavor,
    /// raw operand (big-endian when two bytes wide)
    pub operand: Option<u8u16>,
}
impl Instruction {
    pub fn mnemonic(&self) -> &'static str { self.flavor.desc.name }
    pub fn mode(&self) -> AddressingMode { self.flavor.mode }
    pub fn is_branch(&self) -> bool { self.flavor.desc.branch }
    pub fn size(&self) -> u16 { 1 + self.operand.map_or(0, |u| u.size()) }
    /// Copy of the instruction bytes; only the first size() are valid
    pub fn bytes(&self) -> ([u8; 3], usize) {
        let mut buf = [self.op, 0, 0];
        let n = self.operand.map_or(0, |u| u.get_as_bytes(&mut buf[1..]));
        (buf, n + 1)
    }
    /// The address a branch-capable instruction transfers control to, if it can be known
    /// statically. Indexed targets depend on X and are never defined.
    pub fn target(&self) -> Option<u16> {
        if !self.is_branch() {
            return None;
        }
        let operand = self.operand?;
        match self.mode() {
            AddressingMode::Relative => Some(u8u16::u16(self.addr.wrapping_add(2)).signed_offset(operand).u16()),
            AddressingMode::Extended | AddressingMode::Immediate => Some(operand.u16()),
            _ => None,
        }
    }
}

/// Decodes the window [start, end) of the address space; buf\[0\] holds the byte at start.
/// The buffer may run past end so that a trailing instruction can pick up its operand bytes;
/// anything beyond the buffer reads as zero.
pub fn decode(buf: &[u8], start: u16, end: u32) -> Vec<Instruction> {
    let end = end.min(0x10000);
    let byte_at = |addr: u32| buf.get((addr - start as u32) as usize).copied().unwrap_or(0);
    let mut out = Vec::new();
    let mut addr = start as u32;
    while addr < end {
        let op = byte_at(addr);
        let flavor = instructions::opcode_to_flavor(op);
        let operand = match flavor.operand_size() {
            0 => None,
            1 => Some(u8u16::new(byte_at(addr + 1), None)),
            _ => Some(u8u16::new(byte_at(addr + 1), Some(byte_at(addr + 2)))),
        };
        let inst = Instruction {
            addr: addr as u16,
            op,
            flavor,
            operand,
        };
        addr += inst.size() as u32;
        out.push(inst);
    }
    out
}

/// Decodes [start, end) straight out of memory.
pub fn decode_memory(mem: &dyn Memory, start: u16, end: u32) -> Vec<Instruction> {
    let end = end.min(0x10000);
    // two bytes of slack for the operand of a trailing instruction
    let buf: Vec<u8> = (start as u32..(end + 2).min(0x10000))
        .map(|a| mem.load8(a as u16))
        .collect();
    decode(&buf, start, end)
}

#[cfg(test)]
mod tests {
    use super::*;
    #[test]
    fn branch_then_nops() {
        let insts = decode(&[0x20, 0x02, 0x01, 0x01], 0x0000, 0x0004);
        assert_eq!(insts.len(), 3);
        assert_eq!((insts[0].addr, insts[0].mnemonic()), (0x0000, "BRA"));
        assert_eq!(insts[0].target(), Some(0x0004));
        assert_eq!((insts[1].addr, insts[1].mnemonic()), (0x0002, "NOP"));
        assert_eq!((insts[2].addr, insts[2].mnemonic()), (0x0003, "NOP"));
    }
    #[test]
    fn every_opcode_decodes_to_one_instruction() {
        for op in 0..=255u8 {
            let buf = [op];
            let insts = decode(&buf, 0x1000, 0x1001);
            assert_eq!(insts.len(), 1);
            assert_eq!(insts[0].size(), insts[0].flavor.size());
            // operand bytes past the buffer read as zero
            assert_eq!(insts[0].operand.map_or(0, |u| u.u16()), 0);
        }
    }
    #[test]
    fn addresses_advance_by_size() {
        // LDX #$1234, STAA $40, JMP $0100, unknown, RTS
        let code = [0xce, 0x12, 0x34, 0x97, 0x40, 0x7e, 0x01, 0x00, 0x00, 0x39];
        let insts = decode(&code, 0x0100, 0x0100 + code.len() as u32);
        let addrs: Vec<u16> = insts.iter().map(|i| i.addr).collect();
        assert_eq!(addrs, vec![0x0100, 0x0103, 0x0105, 0x0108, 0x0109]);
        assert_eq!(insts[0].operand, Some(u8u16::u16(0x1234)));
        assert_eq!(insts[2].target(), Some(0x0100));
        assert_eq!(insts[3].mnemonic(), "???");
        for pair in insts.windows(2) {
            assert_eq!(pair[0].addr + pair[0].size(), pair[1].addr);
        }
    }
    #[test]
    fn truncated_operands_are_zero_filled() {
        let insts = decode(&[0xbd, 0x12], 0xfffd, 0x10000);
        assert_eq!(insts.len(), 1);
        assert_eq!(insts[0].operand, Some(u8u16::u16(0x1200)));
        assert_eq!(insts[0].bytes(), ([0xbd, 0x12, 0x00], 3));
    }
    #[test]
    fn backward_relative_target() {
        // BNE -4 at 0x0210
        let insts = decode(&[0x26, 0xfc], 0x0210, 0x0212);
        assert_eq!(insts[0].target(), Some(0x020e));
        // JMP ,X has no static target
        let insts = decode(&[0x6e, 0x05], 0x0000, 0x0002);
        assert_eq!(insts[0].target(), None);
        assert!(insts[0].is_branch());
    }
    #[test]
    fn decode_from_memory() {
        let mut ram = memory::Ram::new(0x7fff);
        ram.load_bytes(&[0x86, 0x41, 0xb7], 0x2000);
        let insts = decode_memory(&ram, 0x2000, 0x2003);
        assert_eq!(insts.len(), 2);
        assert_eq!(insts[1].mnemonic(), "STAA");
        assert_eq!(insts[1].operand, Some(u8u16::u16(0x0000)));
    }
}
