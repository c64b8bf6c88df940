//! Renders resolved instructions as fixed-column disassembly text.
use super::*;
use instructions::AddressingMode;
use resolve::{Line, Target};

impl Line {
    fn operand_text(&self) -> String {
        let inst = &self.inst;
        let Some(operand) = inst.operand else {
            return match self.target {
                Target::NotBranch => String::new(),
                _ => "???".to_string(),
            };
        };
        match (self.target, inst.mode()) {
            (Target::NotBranch, AddressingMode::Immediate) => format!("0x{}", operand),
            (Target::NotBranch, AddressingMode::Direct) => format!("[0x{}]", operand),
            (Target::NotBranch, AddressingMode::Indexed) => format!("[X+0x{}]", operand),
            (Target::NotBranch, AddressingMode::Extended) => format!("[0x{}]", operand),
            (Target::NotBranch, _) => String::new(),
            (Target::Resolved(label), _) => label.to_string(),
            (_, AddressingMode::Relative) => format!("PC+0x{}", operand),
            (_, AddressingMode::Indexed) => format!("X+0x{}", operand),
            (_, AddressingMode::Extended) => format!("0x{:04X}", operand.u16()),
            _ => "???".to_string(),
        }
    }
}
impl fmt::Display for Line {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(label) = self.label {
            writeln!(f, "{}:", label)?;
        }
        let (buf, n) = self.inst.bytes();
        let bytes = buf[..n].iter().map(|b| format!("{:02X}", b)).collect::<Vec<String>>().join(" ");
        let text = format!(
            "{:04X}  {:8}  {:5} {}",
            self.inst.addr,
            bytes,
            self.inst.mnemonic(),
            self.operand_text()
        );
        write!(f, "{}", text.trim_end())
    }
}

/// Writes one line per instruction (plus label lines) to f.
pub fn write_listing(lines: &[Line], f: &mut dyn io::Write) -> Result<(), io::Error> {
    for line in lines {
        writeln!(f, "{line}")?;
    }
    Ok(())
}

/// Runs the whole pipeline (decode, resolve, print) over a window of memory.
pub fn disassemble_memory(mem: &dyn Memory, start: u16, end: u32, f: &mut dyn io::Write) -> Result<usize, Error> {
    let lines = resolve::resolve(disasm::decode_memory(mem, start, end));
    write_listing(&lines, f)?;
    Ok(lines.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use disasm::decode;
    use resolve::resolve;

    fn listing(code: &[u8], start: u16) -> String {
        let lines = resolve(decode(code, start, start as u32 + code.len() as u32));
        let mut out = Vec::new();
        write_listing(&lines, &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }
    #[test]
    fn unresolved_branch_falls_back_to_pc_offset() {
        assert_eq!(
            listing(&[0x20, 0x02, 0x01, 0x01], 0x0000),
            "0000  20 02     BRA   PC+0x02\n\
             0002  01        NOP\n\
             0003  01        NOP\n"
        );
    }
    #[test]
    fn operand_forms() {
        let code = [
            0x86, 0x41, // LDAA #$41
            0x96, 0x10, // LDAA $10
            0xa6, 0x03, // LDAA 3,X
            0xb6, 0x12, 0x34, // LDAA $1234
            0xce, 0xab, 0xcd, // LDX #$ABCD
            0x6e, 0x04, // JMP 4,X
            0x7e, 0x40, 0x00, // JMP $4000
        ];
        assert_eq!(
            listing(&code, 0x1000),
            "1000  86 41     LDAA  0x41\n\
             1002  96 10     LDAA  [0x10]\n\
             1004  A6 03     LDAA  [X+0x03]\n\
             1006  B6 12 34  LDAA  [0x1234]\n\
             1009  CE AB CD  LDX   0xABCD\n\
             100C  6E 04     JMP   X+0x04\n\
             100E  7E 40 00  JMP   0x4000\n"
        );
    }
    #[test]
    fn labels_precede_their_lines() {
        // loop: DECA / BNE loop / RTS
        assert_eq!(
            listing(&[0x4a, 0x26, 0xfd, 0x39], 0x0300),
            "L1:\n\
             0300  4A        DECA\n\
             0301  26 FD     BNE   L1\n\
             0303  39        RTS\n"
        );
    }
    #[test]
    fn disassemble_from_memory() {
        let mut ram = memory::Ram::new(0x7fff);
        ram.load_bytes(&[0xbd, 0x02, 0x00, 0x39], 0x0200);
        let mut out = Vec::new();
        assert_eq!(disassemble_memory(&ram, 0x0200, 0x0204, &mut out).unwrap(), 2);
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "L1:\n0200  BD 02 00  JSR   L1\n0203  39        RTS\n"
        );
    }
}
