//! The MB8861 opcode table.
//!
//! The MB8861 runs the MC6800 instruction set plus `ADX`. Every instruction name is described
//! once (a [Descriptor]) together with the opcodes it owns in each addressing mode; at startup
//! the descriptors are flattened into a 256-entry lookup from opcode byte to [Flavor].
use lazy_static::lazy_static;
use std::fmt::{self, Debug};

lazy_static! {
    static ref FLAVOR_TABLE: [Option<Flavor>; 256] = {
        let mut table: [Option<Flavor>; 256] = [None; 256];
        for desc in DESCRIPTORS {
            for detail in desc.md {
                table[detail.op as usize] = Some(Flavor {
                    desc,
                    mode: AddressingMode::from(detail.am),
                    detail,
                });
            }
        }
        table
    };
}

/// LDX immediate is the only immediate-mode instruction with a 16 bit operand.
pub const LDX_IMMEDIATE: u8 = 0xce;

/// Looks up the Flavor for an opcode. Unmapped opcodes yield the 1-byte unknown flavor.
pub fn opcode_to_flavor(op: u8) -> &'static Flavor { FLAVOR_TABLE[op as usize].as_ref().unwrap_or(&UNKNOWN_FLAVOR) }

/// All the addressing modes of the MB8861.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum AddressingMode {
    Immediate = 0,
    Direct,
    Indexed,
    Extended,
    Implied,
    Relative,
}
impl From<usize> for AddressingMode {
    fn from(am: usize) -> AddressingMode {
        match am {
            0 => AddressingMode::Immediate,
            1 => AddressingMode::Direct,
            2 => AddressingMode::Indexed,
            3 => AddressingMode::Extended,
            4 => AddressingMode::Implied,
            5 => AddressingMode::Relative,
            _ => {
                panic!("Invalid AddressingMode")
            }
        }
    }
}
impl AddressingMode {
    /// number of operand bytes that follow the opcode in this mode
    pub fn operand_size(&self) -> u16 {
        match self {
            AddressingMode::Implied => 0,
            AddressingMode::Immediate | AddressingMode::Direct | AddressingMode::Indexed | AddressingMode::Relative => 1,
            AddressingMode::Extended => 2,
        }
    }
}

/// Properties of an instruction that vary depending on addressing mode.
#[derive(Debug)]
pub struct ModeDetail {
    /// op code
    pub op: u8,
    /// AddressingMode in number form
    pub am: usize,
}
type M = ModeDetail;

/// Information about all the instruction variations that share a common name.
pub struct Descriptor {
    /// the instruction name
    pub name: &'static str,
    /// true if the instruction transfers control (branch, jump or subroutine call)
    pub branch: bool,
    /// details for all the addressing modes supported for this instruction
    pub md: &'static [ModeDetail],
}
impl Debug for Descriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Descriptor")
            .field("name", &self.name)
            .field("branch", &self.branch)
            .field("md", &self.md)
            .finish()
    }
}

/// Represents a fully specified instruction -- one that maps to a specific op code.
/// It combines a Descriptor with a specific ModeDetail
#[derive(Clone, Copy, Debug)]
pub struct Flavor {
    /// the Descriptor for this instruction
    pub desc: &'static Descriptor,
    /// the addressing mode for this instruction
    pub mode: AddressingMode,
    /// the ModeDetail for this instruction
    pub detail: &'static ModeDetail,
}
impl Flavor {
    /// number of operand bytes following the opcode
    pub fn operand_size(&self) -> u16 {
        if self.detail.op == LDX_IMMEDIATE {
            2
        } else {
            self.mode.operand_size()
        }
    }
    /// full size in bytes of an instruction of this flavor
    pub fn size(&self) -> u16 { 1 + self.operand_size() }
    #[cfg(test)]
    pub fn is_unknown(&self) -> bool { self.desc.md.is_empty() }
}
impl fmt::Display for Flavor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:width$}",
            format!("{:02X} {}, {:?}, ({})", self.detail.op, self.desc.name, self.mode, self.size()),
            width = f.width().unwrap_or(0)
        )
    }
}

static UNKNOWN: Descriptor = Descriptor {
    name: "???",
    branch: false,
    md: &[],
};
static UNKNOWN_FLAVOR: Flavor = Flavor {
    desc: &UNKNOWN,
    mode: AddressingMode::Implied,
    detail: &M { op: 0x00, am: 4 },
};

#[rustfmt::skip]
pub const DESCRIPTORS: &[Descriptor] = &[
 Descriptor{name:"ABA", 	branch:false,	md:&[M{op:0x1B,am:4},]},
 Descriptor{name:"ADCA",	branch:false,	md:&[M{op:0x89,am:0},M{op:0x99,am:1},M{op:0xA9,am:2},M{op:0xB9,am:3},]},
 Descriptor{name:"ADCB",	branch:false,	md:&[M{op:0xC9,am:0},M{op:0xD9,am:1},M{op:0xE9,am:2},M{op:0xF9,am:3},]},
 Descriptor{name:"ADDA",	branch:false,	md:&[M{op:0x8B,am:0},M{op:0x9B,am:1},M{op:0xAB,am:2},M{op:0xBB,am:3},]},
 Descriptor{name:"ADDB",	branch:false,	md:&[M{op:0xCB,am:0},M{op:0xDB,am:1},M{op:0xEB,am:2},M{op:0xFB,am:3},]},
 Descriptor{name:"ADX", 	branch:false,	md:&[M{op:0xEC,am:0},M{op:0xFC,am:3},]},
 Descriptor{name:"ANDA",	branch:false,	md:&[M{op:0x84,am:0},M{op:0x94,am:1},M{op:0xA4,am:2},M{op:0xB4,am:3},]},
 Descriptor{name:"ANDB",	branch:false,	md:&[M{op:0xC4,am:0},M{op:0xD4,am:1},M{op:0xE4,am:2},M{op:0xF4,am:3},]},
 Descriptor{name:"ASL", 	branch:false,	md:&[M{op:0x68,am:2},M{op:0x78,am:3},]},
 Descriptor{name:"ASLA",	branch:false,	md:&[M{op:0x48,am:4},]},
 Descriptor{name:"ASLB",	branch:false,	md:&[M{op:0x58,am:4},]},
 Descriptor{name:"ASR", 	branch:false,	md:&[M{op:0x67,am:2},M{op:0x77,am:3},]},
 Descriptor{name:"ASRA",	branch:false,	md:&[M{op:0x47,am:4},]},
 Descriptor{name:"ASRB",	branch:false,	md:&[M{op:0x57,am:4},]},
 Descriptor{name:"BCC", 	branch:true,	md:&[M{op:0x24,am:5},]},
 Descriptor{name:"BCS", 	branch:true,	md:&[M{op:0x25,am:5},]},
 Descriptor{name:"BEQ", 	branch:true,	md:&[M{op:0x27,am:5},]},
 Descriptor{name:"BGE", 	branch:true,	md:&[M{op:0x2C,am:5},]},
 Descriptor{name:"BGT", 	branch:true,	md:&[M{op:0x2E,am:5},]},
 Descriptor{name:"BHI", 	branch:true,	md:&[M{op:0x22,am:5},]},
 Descriptor{name:"BITA",	branch:false,	md:&[M{op:0x85,am:0},M{op:0x95,am:1},M{op:0xA5,am:2},M{op:0xB5,am:3},]},
 Descriptor{name:"BITB",	branch:false,	md:&[M{op:0xC5,am:0},M{op:0xD5,am:1},M{op:0xE5,am:2},M{op:0xF5,am:3},]},
 Descriptor{name:"BLE", 	branch:true,	md:&[M{op:0x2F,am:5},]},
 Descriptor{name:"BLS", 	branch:true,	md:&[M{op:0x23,am:5},]},
 Descriptor{name:"BLT", 	branch:true,	md:&[M{op:0x2D,am:5},]},
 Descriptor{name:"BMI", 	branch:true,	md:&[M{op:0x2B,am:5},]},
 Descriptor{name:"BNE", 	branch:true,	md:&[M{op:0x26,am:5},]},
 Descriptor{name:"BPL", 	branch:true,	md:&[M{op:0x2A,am:5},]},
 Descriptor{name:"BRA", 	branch:true,	md:&[M{op:0x20,am:5},]},
 Descriptor{name:"BSR", 	branch:true,	md:&[M{op:0x8D,am:5},]},
 Descriptor{name:"BVC", 	branch:true,	md:&[M{op:0x28,am:5},]},
 Descriptor{name:"BVS", 	branch:true,	md:&[M{op:0x29,am:5},]},
 Descriptor{name:"CBA", 	branch:false,	md:&[M{op:0x11,am:4},]},
 Descriptor{name:"CLC", 	branch:false,	md:&[M{op:0x0C,am:4},]},
 Descriptor{name:"CLI", 	branch:false,	md:&[M{op:0x0E,am:4},]},
 Descriptor{name:"CLR", 	branch:false,	md:&[M{op:0x6F,am:2},M{op:0x7F,am:3},]},
 Descriptor{name:"CLRA",	branch:false,	md:&[M{op:0x4F,am:4},]},
 Descriptor{name:"CLRB",	branch:false,	md:&[M{op:0x5F,am:4},]},
 Descriptor{name:"CLV", 	branch:false,	md:&[M{op:0x0A,am:4},]},
 Descriptor{name:"CMPA",	branch:false,	md:&[M{op:0x81,am:0},M{op:0x91,am:1},M{op:0xA1,am:2},M{op:0xB1,am:3},]},
 Descriptor{name:"CMPB",	branch:false,	md:&[M{op:0xC1,am:0},M{op:0xD1,am:1},M{op:0xE1,am:2},M{op:0xF1,am:3},]},
 Descriptor{name:"COM", 	branch:false,	md:&[M{op:0x63,am:2},M{op:0x73,am:3},]},
 Descriptor{name:"COMA",	branch:false,	md:&[M{op:0x43,am:4},]},
 Descriptor{name:"COMB",	branch:false,	md:&[M{op:0x53,am:4},]},
 Descriptor{name:"CPX", 	branch:false,	md:&[M{op:0x8C,am:0},M{op:0x9C,am:1},M{op:0xAC,am:2},M{op:0xBC,am:3},]},
 Descriptor{name:"DAA", 	branch:false,	md:&[M{op:0x19,am:4},]},
 Descriptor{name:"DEC", 	branch:false,	md:&[M{op:0x6A,am:2},M{op:0x7A,am:3},]},
 Descriptor{name:"DECA",	branch:false,	md:&[M{op:0x4A,am:4},]},
 Descriptor{name:"DECB",	branch:false,	md:&[M{op:0x5A,am:4},]},
 Descriptor{name:"DES", 	branch:false,	md:&[M{op:0x34,am:4},]},
 Descriptor{name:"DEX", 	branch:false,	md:&[M{op:0x09,am:4},]},
 Descriptor{name:"EORA",	branch:false,	md:&[M{op:0x88,am:0},M{op:0x98,am:1},M{op:0xA8,am:2},M{op:0xB8,am:3},]},
 Descriptor{name:"EORB",	branch:false,	md:&[M{op:0xC8,am:0},M{op:0xD8,am:1},M{op:0xE8,am:2},M{op:0xF8,am:3},]},
 Descriptor{name:"INC", 	branch:false,	md:&[M{op:0x6C,am:2},M{op:0x7C,am:3},]},
 Descriptor{name:"INCA",	branch:false,	md:&[M{op:0x4C,am:4},]},
 Descriptor{name:"INCB",	branch:false,	md:&[M{op:0x5C,am:4},]},
 Descriptor{name:"INS", 	branch:false,	md:&[M{op:0x31,am:4},]},
 Descriptor{name:"INX", 	branch:false,	md:&[M{op:0x08,am:4},]},
 Descriptor{name:"JMP", 	branch:true,	md:&[M{op:0x6E,am:2},M{op:0x7E,am:3},]},
 Descriptor{name:"JSR", 	branch:true,	md:&[M{op:0xAD,am:2},M{op:0xBD,am:3},]},
 Descriptor{name:"LDAA",	branch:false,	md:&[M{op:0x86,am:0},M{op:0x96,am:1},M{op:0xA6,am:2},M{op:0xB6,am:3},]},
 Descriptor{name:"LDAB",	branch:false,	md:&[M{op:0xC6,am:0},M{op:0xD6,am:1},M{op:0xE6,am:2},M{op:0xF6,am:3},]},
 Descriptor{name:"LDS", 	branch:false,	md:&[M{op:0x8E,am:0},M{op:0x9E,am:1},M{op:0xAE,am:2},M{op:0xBE,am:3},]},
 Descriptor{name:"LDX", 	branch:false,	md:&[M{op:0xCE,am:0},M{op:0xDE,am:1},M{op:0xEE,am:2},M{op:0xFE,am:3},]},
 Descriptor{name:"LSR", 	branch:false,	md:&[M{op:0x64,am:2},M{op:0x74,am:3},]},
 Descriptor{name:"LSRA",	branch:false,	md:&[M{op:0x44,am:4},]},
 Descriptor{name:"LSRB",	branch:false,	md:&[M{op:0x54,am:4},]},
 Descriptor{name:"NEG", 	branch:false,	md:&[M{op:0x60,am:2},M{op:0x70,am:3},]},
 Descriptor{name:"NEGA",	branch:false,	md:&[M{op:0x40,am:4},]},
 Descriptor{name:"NEGB",	branch:false,	md:&[M{op:0x50,am:4},]},
 Descriptor{name:"NOP", 	branch:false,	md:&[M{op:0x01,am:4},]},
 Descriptor{name:"ORAA",	branch:false,	md:&[M{op:0x8A,am:0},M{op:0x9A,am:1},M{op:0xAA,am:2},M{op:0xBA,am:3},]},
 Descriptor{name:"ORAB",	branch:false,	md:&[M{op:0xCA,am:0},M{op:0xDA,am:1},M{op:0xEA,am:2},M{op:0xFA,am:3},]},
 Descriptor{name:"PSHA",	branch:false,	md:&[M{op:0x36,am:4},]},
 Descriptor{name:"PSHB",	branch:false,	md:&[M{op:0x37,am:4},]},
 Descriptor{name:"PULA",	branch:false,	md:&[M{op:0x32,am:4},]},
 Descriptor{name:"PULB",	branch:false,	md:&[M{op:0x33,am:4},]},
 Descriptor{name:"ROL", 	branch:false,	md:&[M{op:0x69,am:2},M{op:0x79,am:3},]},
 Descriptor{name:"ROLA",	branch:false,	md:&[M{op:0x49,am:4},]},
 Descriptor{name:"ROLB",	branch:false,	md:&[M{op:0x59,am:4},]},
 Descriptor{name:"ROR", 	branch:false,	md:&[M{op:0x66,am:2},M{op:0x76,am:3},]},
 Descriptor{name:"RORA",	branch:false,	md:&[M{op:0x46,am:4},]},
 Descriptor{name:"RORB",	branch:false,	md:&[M{op:0x56,am:4},]},
 Descriptor{name:"RTI", 	branch:false,	md:&[M{op:0x3B,am:4},]},
 Descriptor{name:"RTS", 	branch:false,	md:&[M{op:0x39,am:4},]},
 Descriptor{name:"SBA", 	branch:false,	md:&[M{op:0x10,am:4},]},
 Descriptor{name:"SBCA",	branch:false,	md:&[M{op:0x82,am:0},M{op:0x92,am:1},M{op:0xA2,am:2},M{op:0xB2,am:3},]},
 Descriptor{name:"SBCB",	branch:false,	md:&[M{op:0xC2,am:0},M{op:0xD2,am:1},M{op:0xE2,am:2},M{op:0xF2,am:3},]},
 Descriptor{name:"SEC", 	branch:false,	md:&[M{op:0x0D,am:4},]},
 Descriptor{name:"SEI", 	branch:false,	md:&[M{op:0x0F,am:4},]},
 Descriptor{name:"SEV", 	branch:false,	md:&[M{op:0x0B,am:4},]},
 Descriptor{name:"STAA",	branch:false,	md:&[M{op:0x97,am:1},M{op:0xA7,am:2},M{op:0xB7,am:3},]},
 Descriptor{name:"STAB",	branch:false,	md:&[M{op:0xD7,am:1},M{op:0xE7,am:2},M{op:0xF7,am:3},]},
 Descriptor{name:"STS", 	branch:false,	md:&[M{op:0x9F,am:1},M{op:0xAF,am:2},M{op:0xBF,am:3},]},
 Descriptor{name:"STX", 	branch:false,	md:&[M{op:0xDF,am:1},M{op:0xEF,am:2},M{op:0xFF,am:3},]},
 Descriptor{name:"SUBA",	branch:false,	md:&[M{op:0x80,am:0},M{op:0x90,am:1},M{op:0xA0,am:2},M{op:0xB0,am:3},]},
 Descriptor{name:"SUBB",	branch:false,	md:&[M{op:0xC0,am:0},M{op:0xD0,am:1},M{op:0xE0,am:2},M{op:0xF0,am:3},]},
 Descriptor{name:"SWI", 	branch:false,	md:&[M{op:0x3F,am:4},]},
 Descriptor{name:"TAB", 	branch:false,	md:&[M{op:0x16,am:4},]},
 Descriptor{name:"TAP", 	branch:false,	md:&[M{op:0x06,am:4},]},
 Descriptor{name:"TBA", 	branch:false,	md:&[M{op:0x17,am:4},]},
 Descriptor{name:"TPA", 	branch:false,	md:&[M{op:0x07,am:4},]},
 Descriptor{name:"TST", 	branch:false,	md:&[M{op:0x6D,am:2},M{op:0x7D,am:3},]},
 Descriptor{name:"TSTA",	branch:false,	md:&[M{op:0x4D,am:4},]},
 Descriptor{name:"TSTB",	branch:false,	md:&[M{op:0x5D,am:4},]},
 Descriptor{name:"TSX", 	branch:false,	md:&[M{op:0x30,am:4},]},
 Descriptor{name:"TXS", 	branch:false,	md:&[M{op:0x35,am:4},]},
 Descriptor{name:"WAI", 	branch:false,	md:&[M{op:0x3E,am:4},]},
];

#[cfg(test)]
mod tests {
    use super::*;
    #[test]
    fn no_opcode_defined_twice() {
        let mut seen = [false; 256];
        for desc in DESCRIPTORS {
            for detail in desc.md {
                assert!(!seen[detail.op as usize], "{:02X} ({}) defined twice", detail.op, desc.name);
                seen[detail.op as usize] = true;
            }
        }
    }
    #[test]
    fn sizes_follow_addressing_mode() {
        for op in 0..=255u8 {
            let flavor = opcode_to_flavor(op);
            let expected = match (op, flavor.mode) {
                (LDX_IMMEDIATE, _) => 3,
                (_, AddressingMode::Implied) => 1,
                (_, AddressingMode::Extended) => 3,
                _ => 2,
            };
            assert_eq!(flavor.size(), expected, "size of {}", flavor);
        }
    }
    #[test]
    fn lookups() {
        let f = opcode_to_flavor(0x20);
        assert_eq!(f.desc.name, "BRA");
        assert_eq!(f.mode, AddressingMode::Relative);
        assert!(f.desc.branch);
        let f = opcode_to_flavor(0xbd);
        assert_eq!((f.desc.name, f.mode), ("JSR", AddressingMode::Extended));
        // CPX # keeps the generic 8 bit immediate size
        assert_eq!(opcode_to_flavor(0x8c).size(), 2);
        assert_eq!(opcode_to_flavor(0xce).size(), 3);
        let f = opcode_to_flavor(0x00);
        assert!(f.is_unknown());
        assert_eq!(f.size(), 1);
        assert!(!opcode_to_flavor(0x01).is_unknown());
    }
}
