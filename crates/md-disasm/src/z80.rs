//! Z80 sound coprocessor.

use core::fmt;

use crate::{start_address, write_line_head, Extra, Isa};

/// Longest Z80 instruction, in bytes.
pub const MAX_BYTES: usize = 4;

pub const ADDRESS_MASK: u32 = 0xFFFF;

/// Trace coverage: the 8 KiB of sound RAM the Z80 runs from.
pub const TABLE_LEN: usize = 0x2000;

mnemonics! {
    /// Z80 mnemonic set. `Unk` is the unknown-opcode sentinel.
    pub enum Mnemonic {
        Unk => "UNK",
        Ld => "LD",
        Push => "PUSH",
        Pop => "POP",
        Ex => "EX",
        Exx => "EXX",
        Ldi => "LDI",
        Ldir => "LDIR",
        Ldd => "LDD",
        Lddr => "LDDR",
        Cpi => "CPI",
        Cpir => "CPIR",
        Cpd => "CPD",
        Cpdr => "CPDR",
        Add => "ADD",
        Adc => "ADC",
        Sub => "SUB",
        Sbc => "SBC",
        And => "AND",
        Or => "OR",
        Xor => "XOR",
        Cp => "CP",
        Inc => "INC",
        Dec => "DEC",
        Daa => "DAA",
        Cpl => "CPL",
        Neg => "NEG",
        Ccf => "CCF",
        Scf => "SCF",
        Nop => "NOP",
        Halt => "HALT",
        Di => "DI",
        Ei => "EI",
        Im0 => "IM   0",
        Im1 => "IM   1",
        Im2 => "IM   2",
        Rlca => "RLCA",
        Rla => "RLA",
        Rrca => "RRCA",
        Rra => "RRA",
        Rlc => "RLC",
        Rl => "RL",
        Rrc => "RRC",
        Rr => "RR",
        Sla => "SLA",
        Sra => "SRA",
        Srl => "SRL",
        Rld => "RLD",
        Rrd => "RRD",
        Bit => "BIT",
        Set => "SET",
        Res => "RES",
        Jp => "JP",
        Jr => "JR",
        Djnz => "DJNZ",
        Call => "CALL",
        Ret => "RET",
        Reti => "RETI",
        Retn => "RETN",
        Rst00 => "RST  00H",
        Rst08 => "RST  08H",
        Rst10 => "RST  10H",
        Rst18 => "RST  18H",
        Rst20 => "RST  20H",
        Rst28 => "RST  28H",
        Rst30 => "RST  30H",
        Rst38 => "RST  38H",
        In => "IN",
        Ini => "INI",
        Inir => "INIR",
        Ind => "IND",
        Indr => "INDR",
        Out => "OUT",
        Outi => "OUTI",
        Otir => "OTIR",
        Outd => "OUTD",
        Otdr => "OTDR",
    }
}

operand_kinds! {
    /// Z80 operand kinds. `P*` kinds are `(..)` memory/port indirections.
    pub enum OperandKind {
        NoOperand,
        A,
        B,
        C,
        D,
        E,
        H,
        L,
        I,
        R,
        Byte,
        PHl,
        PBc,
        PDe,
        PSp,
        PIx,
        PIy,
        PIxD,
        PIyD,
        Addr,
        Bc,
        De,
        Hl,
        Sp,
        Ix,
        Ixl,
        Ixh,
        Iy,
        Iyl,
        Iyh,
        Af,
        /// `AF'`
        AfAlt,
        Bit0,
        Bit1,
        Bit2,
        Bit3,
        Bit4,
        Bit5,
        Bit6,
        Bit7,
        Word,
        CondNz,
        CondZ,
        CondNc,
        CondC,
        CondPo,
        CondPe,
        CondP,
        CondM,
        Branch,
        PB,
        PC,
        PD,
        PE,
        PH,
        PL,
        PA,
        PByte,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ExtraRule {
    Byte,
    Disp,
    AddrWord,
    Branch,
}

impl OperandKind {
    fn extra_rule(self) -> Option<ExtraRule> {
        use OperandKind::*;
        Some(match self {
            Byte | PByte => ExtraRule::Byte,
            PIxD | PIyD => ExtraRule::Disp,
            Addr | Word => ExtraRule::AddrWord,
            Branch => ExtraRule::Branch,
            NoOperand | A | B | C | D | E | H | L | I | R | PHl | PBc | PDe | PSp | PIx | PIy
            | Bc | De | Hl | Sp | Ix | Ixl | Ixh | Iy | Iyl | Iyh | Af | AfAlt | Bit0 | Bit1
            | Bit2 | Bit3 | Bit4 | Bit5 | Bit6 | Bit7 | CondNz | CondZ | CondNc | CondC
            | CondPo | CondPe | CondP | CondM | PB | PC | PD | PE | PH | PL | PA
            | Unknown(_) => return None,
        })
    }

    /// Text of operands that carry no extra value.
    fn fixed_text(self) -> Option<&'static str> {
        use OperandKind::*;
        Some(match self {
            A => " A",
            B => " B",
            C => " C",
            D => " D",
            E => " E",
            H => " H",
            L => " L",
            I => " I",
            R => " R",
            PHl => " (HL)",
            PBc => " (BC)",
            PDe => " (DE)",
            PSp => " (SP)",
            PIx => " (IX)",
            PIy => " (IY)",
            Bc => " BC",
            De => " DE",
            Hl => " HL",
            Sp => " SP",
            Ix => " IX",
            Ixl => " IXL",
            Ixh => " IXH",
            Iy => " IY",
            Iyl => " IYL",
            Iyh => " IYH",
            Af => " AF",
            AfAlt => " AF'",
            Bit0 => " 0",
            Bit1 => " 1",
            Bit2 => " 2",
            Bit3 => " 3",
            Bit4 => " 4",
            Bit5 => " 5",
            Bit6 => " 6",
            Bit7 => " 7",
            CondNz => " NZ",
            CondZ => " Z",
            CondNc => " NC",
            CondC => " C",
            CondPo => " PO",
            CondPe => " PE",
            CondP => " P",
            CondM => " M",
            PB => " (B)",
            PC => " (C)",
            PD => " (D)",
            PE => " (E)",
            PH => " (H)",
            PL => " (L)",
            PA => " (A)",
            NoOperand | Byte | PIxD | PIyD | Addr | Word | Branch | PByte | Unknown(_) => {
                return None
            }
        })
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BranchPayload {
    pub disp: i8,
    pub target: u16,
}

/// Positional operand payload reported alongside each operand slot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExtraPayload {
    pub byte: u8,
    pub disp: i8,
    pub addr_word: u16,
    pub branch: BranchPayload,
}

impl ExtraPayload {
    fn extract(&self, rule: ExtraRule) -> Extra {
        match rule {
            ExtraRule::Byte => Extra::Imm(u32::from(self.byte)),
            ExtraRule::Disp => Extra::Int(i32::from(self.disp)),
            ExtraRule::AddrWord => Extra::Imm(u32::from(self.addr_word)),
            ExtraRule::Branch => Extra::Branch {
                offset: i32::from(self.branch.disp),
                target: u32::from(self.branch.target),
            },
        }
    }
}

/// Retired-instruction step as reported by the Z80 core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
    /// PC after the fetch.
    pub pc: u16,
    pub mnemonic: Mnemonic,
    pub op1: OperandKind,
    pub op2: OperandKind,
    pub bytes: Vec<u8>,
    pub extra1: ExtraPayload,
    pub extra2: ExtraPayload,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instruction {
    address: u16,
    bytes: Vec<u8>,
    mnemonic: Mnemonic,
    operands: [OperandKind; 2],
    extra: [Option<Extra>; 2],
}

impl Instruction {
    pub fn build(step: &Step) -> Self {
        let resolve = |kind: OperandKind, payload: &ExtraPayload| {
            kind.extra_rule().map(|rule| payload.extract(rule))
        };
        Self {
            address: start_address(u32::from(step.pc), step.bytes.len(), ADDRESS_MASK) as u16,
            bytes: step.bytes.clone(),
            mnemonic: step.mnemonic,
            operands: [step.op1, step.op2],
            extra: [
                resolve(step.op1, &step.extra1),
                resolve(step.op2, &step.extra2),
            ],
        }
    }

    pub fn address(&self) -> u16 {
        self.address
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn mnemonic(&self) -> Mnemonic {
        self.mnemonic
    }

    pub fn operands(&self) -> [OperandKind; 2] {
        self.operands
    }

    pub fn extra(&self, slot: usize) -> Option<Extra> {
        self.extra.get(slot).copied().flatten()
    }

    fn fmt_operand(&self, f: &mut fmt::Formatter<'_>, slot: usize) -> fmt::Result {
        let kind = self.operands[slot];
        if let Some(text) = kind.fixed_text() {
            return f.write_str(text);
        }

        match (kind, self.extra[slot]) {
            (OperandKind::NoOperand, _) => Ok(()),
            (OperandKind::Byte, Some(Extra::Imm(v))) => write!(f, " {v:02X}H"),
            (OperandKind::PByte, Some(Extra::Imm(v))) => write!(f, " ({v:02X}H)"),
            (OperandKind::PIxD, Some(Extra::Int(d))) => write!(f, " (IX{d:+})"),
            (OperandKind::PIyD, Some(Extra::Int(d))) => write!(f, " (IY{d:+})"),
            (OperandKind::Addr, Some(Extra::Imm(v))) => write!(f, " ({v:04X}H)"),
            (OperandKind::Word, Some(Extra::Imm(v))) => write!(f, " {v:04X}H"),
            (OperandKind::Branch, Some(Extra::Branch { offset, target })) => {
                write!(f, " ${offset:+} ({target:04X}H)")
            }
            (kind, _) => write!(f, "{}", kind.raw()),
        }
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_line_head(
            f,
            u32::from(self.address),
            4,
            self.bytes.as_slice(),
            2,
            MAX_BYTES,
        )?;
        write!(f, "{:<4}", self.mnemonic.as_str())?;
        if self.operands[0] != OperandKind::NoOperand {
            self.fmt_operand(f, 0)?;
        }
        if self.operands[1] != OperandKind::NoOperand {
            f.write_str(",")?;
            self.fmt_operand(f, 1)?;
        }
        Ok(())
    }
}

/// Marker type implementing [`Isa`] for the Z80.
#[derive(Debug, Clone, Copy, Default)]
pub struct Z80;

impl Isa for Z80 {
    type Step = Step;
    type Inst = Instruction;

    const NAME: &'static str = "z80";
    const LINE_PREFIX: &'static str = "[Z80] ";
    const ADDRESS_MASK: u32 = ADDRESS_MASK;
    const TABLE_LEN: usize = TABLE_LEN;

    fn build(step: &Step) -> Instruction {
        Instruction::build(step)
    }

    fn address(inst: &Instruction) -> u32 {
        u32::from(inst.address)
    }

    fn unit_len(inst: &Instruction) -> usize {
        inst.bytes.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn step(mnemonic: Mnemonic, pc: u16, bytes: &[u8]) -> Step {
        Step {
            pc,
            mnemonic,
            op1: OperandKind::NoOperand,
            op2: OperandKind::NoOperand,
            bytes: bytes.to_vec(),
            extra1: ExtraPayload::default(),
            extra2: ExtraPayload::default(),
        }
    }

    #[test]
    fn immediate_byte_line() {
        let mut s = step(Mnemonic::Ld, 0x0102, &[0x3E, 0x2A]);
        s.op1 = OperandKind::A;
        s.op2 = OperandKind::Byte;
        s.extra2.byte = 0x2A;

        let inst = Instruction::build(&s);
        assert_eq!(inst.address(), 0x0100);
        assert_eq!(
            inst.to_string(),
            format!("0100    3e 2a{}    LD   A, 2AH", " ".repeat(6))
        );
    }

    #[test]
    fn relative_branch_shows_offset_and_target() {
        let mut s = step(Mnemonic::Jr, 0x0104, &[0x18, 0xFA]);
        s.op1 = OperandKind::Branch;
        s.extra1.branch = BranchPayload {
            disp: -4,
            target: 0x0100,
        };
        let text = Instruction::build(&s).to_string();
        assert!(text.ends_with("JR   $-4 (0100H)"), "{text}");

        s.extra1.branch = BranchPayload {
            disp: 12,
            target: 0x0412,
        };
        let text = Instruction::build(&s).to_string();
        assert!(text.ends_with("JR   $+12 (0412H)"), "{text}");
    }

    #[test]
    fn indexed_and_absolute_forms() {
        let mut s = step(Mnemonic::Ld, 0x0203, &[0xDD, 0x7E, 0x05]);
        s.op1 = OperandKind::A;
        s.op2 = OperandKind::PIxD;
        s.extra2.disp = 5;
        assert!(Instruction::build(&s).to_string().ends_with("LD   A, (IX+5)"));

        s.op2 = OperandKind::PIyD;
        s.extra2.disp = -3;
        assert!(Instruction::build(&s).to_string().ends_with("LD   A, (IY-3)"));

        s.op2 = OperandKind::Addr;
        s.extra2.addr_word = 0x1FFD;
        assert!(Instruction::build(&s).to_string().ends_with("LD   A, (1FFDH)"));

        s.op1 = OperandKind::Hl;
        s.op2 = OperandKind::Word;
        s.extra2.addr_word = 0x6000;
        assert!(Instruction::build(&s).to_string().ends_with("LD   HL, 6000H"));
    }

    #[test]
    fn port_and_alternate_register_forms() {
        let mut s = step(Mnemonic::Out, 0x0012, &[0xD3, 0x7F]);
        s.op1 = OperandKind::PByte;
        s.extra1.byte = 0x7F;
        s.op2 = OperandKind::A;
        assert!(Instruction::build(&s).to_string().ends_with("OUT  (7FH), A"));

        let mut s = step(Mnemonic::Ex, 0x0001, &[0x08]);
        s.op1 = OperandKind::Af;
        s.op2 = OperandKind::AfAlt;
        let inst = Instruction::build(&s);
        assert_eq!(inst.address(), 0x0000);
        assert!(inst.to_string().ends_with("EX   AF, AF'"));
    }

    #[test]
    fn fixed_width_mnemonics_keep_embedded_operand() {
        let s = step(Mnemonic::Rst38, 0x0039, &[0xFF]);
        assert!(Instruction::build(&s).to_string().ends_with("    RST  38H"));
    }

    #[test]
    fn address_wraps_at_64k() {
        let s = step(Mnemonic::Nop, 0x0000, &[0x00]);
        assert_eq!(Instruction::build(&s).address(), 0xFFFF);
    }

    #[test]
    fn unknown_second_operand_prints_bare_tag() {
        let mut s = step(Mnemonic::Ld, 0x0002, &[0x00, 0x00]);
        s.op1 = OperandKind::A;
        s.op2 = OperandKind::from_raw(200);
        let inst = Instruction::build(&s);
        assert_eq!(inst.extra(1), None);
        assert!(inst.to_string().ends_with("LD   A,200"));
    }

    #[test]
    fn only_payload_kinds_have_extra_rules() {
        let with_rule: Vec<_> = OperandKind::KNOWN
            .iter()
            .copied()
            .filter(|k| k.extra_rule().is_some())
            .collect();
        use OperandKind::*;
        assert_eq!(with_rule, [Byte, PIxD, PIyD, Addr, Word, Branch, PByte]);
        assert_eq!(OperandKind::Unknown(200).extra_rule(), None);
    }
}
