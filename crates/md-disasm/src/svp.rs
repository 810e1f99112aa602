//! SSP1601 DSP core of the SVP chip.
//!
//! Program memory is addressed in 16-bit words. An instruction is one or
//! two words; the second word is either an immediate or an absolute
//! address.

use core::fmt;

use crate::{start_address, write_line_head, Extra, Isa};

/// Longest SSP1601 instruction, in words.
pub const MAX_WORDS: usize = 2;

pub const ADDRESS_MASK: u32 = 0xFFFF;

mnemonics! {
    /// SSP1601 mnemonic set. `Unk` is the unknown-opcode sentinel.
    pub enum Mnemonic {
        Unk => "unk",
        Sub => "sub",
        Cmp => "cmp",
        Add => "add",
        And => "and",
        Or => "or",
        Eor => "eor",
        Mod => "mod",
        Ld => "ld",
        Call => "call",
        Bra => "bra",
        Mld => "mld",
        Mpya => "mpya",
        Mpys => "mpys",
    }
}

operand_kinds! {
    /// SSP1601 operand kinds.
    ///
    /// `Pri*` kinds are pointer-register indirections `(rN..)`, `Ppri*` the
    /// double indirections `((rN..))` through program memory.
    pub enum OperandKind {
        NoOperand,
        /// The `-` blind register.
        Blind,
        X,
        Y,
        A,
        St,
        Stack,
        Pc,
        P,
        Pm0,
        Pm1,
        Pm2,
        Xst,
        Pm4,
        Ext5,
        Pmc,
        Al,
        Pri,
        /// `(rN|m)` with an explicit modifier value.
        PriMval,
        /// `(rN+!)`
        PriInc,
        /// `(rN+)` modulo increment.
        PriModInc,
        /// `(rN-)` modulo decrement.
        PriModDec,
        /// Direct RAM bank address `RAMb[pos]`.
        Adr,
        Imm,
        Ppri,
        PpriMval,
        PpriInc,
        PpriModInc,
        PpriModDec,
        /// Pointer register as a plain register.
        Ri,
        /// Short immediate byte.
        Simm,
        CondUnk,
        CondTrue,
        CondZ,
        CondN,
        /// Absolute program address (second word).
        Addr,
        /// `(A)`
        PA,
        OpSr,
        OpSl,
        OpNeg,
        OpAbs,
        OpUnk,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ExtraRule {
    PointerReg,
    SecondWord,
    ShortImm,
}

impl OperandKind {
    fn extra_rule(self) -> Option<ExtraRule> {
        use OperandKind::*;
        Some(match self {
            Pri | PriMval | PriInc | PriModInc | PriModDec | Ppri | PpriMval | PpriInc
            | PpriModInc | PpriModDec | Ri => ExtraRule::PointerReg,
            Imm | Addr => ExtraRule::SecondWord,
            Simm => ExtraRule::ShortImm,
            NoOperand | Blind | X | Y | A | St | Stack | Pc | P | Pm0 | Pm1 | Pm2 | Xst | Pm4
            | Ext5 | Pmc | Al | Adr | CondUnk | CondTrue | CondZ | CondN | PA | OpSr | OpSl
            | OpNeg | OpAbs | OpUnk | Unknown(_) => return None,
        })
    }
}

/// Pointer register operand: register number and addressing modifier.
///
/// The modifier is `-1` when the decoder did not resolve one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RegIndirect {
    pub modifier: i8,
    pub reg: u8,
}

/// Direct internal RAM address: bank (`RAM0`/`RAM1`) and offset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RamAddr {
    pub pos: u8,
    pub bank: u8,
}

/// Retired-instruction step as reported by the SVP core.
///
/// The payload is positional: `ri`, `cond_f`, `simm` and `adr` back several
/// operand kinds at once and are only meaningful for the kinds that use
/// them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
    /// PC after the fetch, in words.
    pub pc: u16,
    pub mnemonic: Mnemonic,
    pub op1: OperandKind,
    pub op2: OperandKind,
    pub words: [u16; MAX_WORDS],
    pub nwords: u8,
    pub ri: [RegIndirect; 2],
    pub cond_f: bool,
    pub simm: u8,
    pub adr: RamAddr,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instruction {
    address: u16,
    words: Vec<u16>,
    mnemonic: Mnemonic,
    operands: [OperandKind; 2],
    extra: [Option<Extra>; 2],
    ri: [RegIndirect; 2],
    cond_f: bool,
    simm: u8,
    adr: RamAddr,
}

impl Instruction {
    pub fn build(step: &Step) -> Self {
        let len = usize::from(step.nwords).min(MAX_WORDS);
        let resolve = |slot: usize, kind: OperandKind| {
            kind.extra_rule().map(|rule| match rule {
                ExtraRule::PointerReg => Extra::RegMod {
                    reg: step.ri[slot].reg,
                    modifier: step.ri[slot].modifier,
                },
                ExtraRule::SecondWord => Extra::Imm(u32::from(step.words[1])),
                ExtraRule::ShortImm => Extra::Imm(u32::from(step.simm)),
            })
        };
        Self {
            address: start_address(u32::from(step.pc), len, ADDRESS_MASK) as u16,
            words: step.words[..len].to_vec(),
            mnemonic: step.mnemonic,
            operands: [step.op1, step.op2],
            extra: [resolve(0, step.op1), resolve(1, step.op2)],
            ri: step.ri,
            cond_f: step.cond_f,
            simm: step.simm,
            adr: step.adr,
        }
    }

    pub fn address(&self) -> u16 {
        self.address
    }

    pub fn words(&self) -> &[u16] {
        &self.words
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

    pub fn reg_indirect(&self) -> [RegIndirect; 2] {
        self.ri
    }

    /// Condition polarity: set for `is_zero`/`is_neg`, clear for the negated
    /// forms.
    pub fn cond_flag(&self) -> bool {
        self.cond_f
    }

    pub fn short_imm(&self) -> u8 {
        self.simm
    }

    pub fn ram_addr(&self) -> RamAddr {
        self.adr
    }

    fn fmt_operand(&self, f: &mut fmt::Formatter<'_>, slot: usize) -> fmt::Result {
        use OperandKind::*;

        let kind = self.operands[slot];
        let (reg, modifier) = match self.extra[slot] {
            Some(Extra::RegMod { reg, modifier }) => (reg, modifier),
            _ => (self.ri[slot].reg, self.ri[slot].modifier),
        };
        let imm = self.extra[slot].and_then(Extra::imm).unwrap_or(0);

        match kind {
            NoOperand => Ok(()),
            Blind => f.write_str(" -"),
            X => f.write_str(" X"),
            Y => f.write_str(" Y"),
            A => f.write_str(" A"),
            St => f.write_str(" ST"),
            Stack => f.write_str(" STACK"),
            Pc => f.write_str(" PC"),
            P => f.write_str(" P"),
            Pm0 => f.write_str(" PM0"),
            Pm1 => f.write_str(" PM1"),
            Pm2 => f.write_str(" PM2"),
            Xst => f.write_str(" XST"),
            Pm4 => f.write_str(" PM4"),
            Ext5 => f.write_str(" EXT5"),
            Pmc => f.write_str(" PMC"),
            Al => f.write_str(" AL"),
            Pri => write!(f, " (r{reg})"),
            PriMval => write!(f, " (r{reg}|{modifier})"),
            PriInc => write!(f, " (r{reg}+!)"),
            PriModInc => write!(f, " (r{reg}+)"),
            PriModDec => write!(f, " (r{reg}-)"),
            Adr => write!(f, " RAM{}[{:02X}]", self.adr.bank, self.adr.pos),
            Imm | Addr => write!(f, " {imm:04X}"),
            Ppri => write!(f, " ((r{reg}))"),
            PpriMval => write!(f, " ((r{reg}|{modifier}))"),
            PpriInc => write!(f, " ((r{reg}+!))"),
            PpriModInc => write!(f, " ((r{reg}+))"),
            PpriModDec => write!(f, " ((r{reg}-))"),
            Ri => write!(f, " r{reg}"),
            Simm => write!(f, " {imm:02X}"),
            CondUnk => f.write_str(" con_unk"),
            CondTrue => f.write_str(" true"),
            CondZ => f.write_str(if self.cond_f { " is_zero" } else { " !is_zero" }),
            CondN => f.write_str(if self.cond_f { " is_neg" } else { " !is_neg" }),
            PA => f.write_str(" (A)"),
            OpSr => f.write_str(" op [A >>= 1]"),
            OpSl => f.write_str(" op [A <<= 1]"),
            OpNeg => f.write_str(" op [A = -A]"),
            OpAbs => f.write_str(" op [A = ABS(A)]"),
            OpUnk => f.write_str(" op [¿?]"),
            Unknown(raw) => write!(f, "{raw}"),
        }
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_line_head(
            f,
            u32::from(self.address),
            4,
            self.words.as_slice(),
            4,
            MAX_WORDS,
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

/// Marker type implementing [`Isa`] for the SSP1601.
#[derive(Debug, Clone, Copy, Default)]
pub struct Svp;

impl Isa for Svp {
    type Step = Step;
    type Inst = Instruction;

    const NAME: &'static str = "svp";
    const LINE_PREFIX: &'static str = "[SVP] ";
    const ADDRESS_MASK: u32 = ADDRESS_MASK;
    const TABLE_LEN: usize = 0x1_0000;

    fn build(step: &Step) -> Instruction {
        Instruction::build(step)
    }

    fn address(inst: &Instruction) -> u32 {
        u32::from(inst.address)
    }

    fn unit_len(inst: &Instruction) -> usize {
        inst.words.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn step(mnemonic: Mnemonic, pc: u16, words: &[u16]) -> Step {
        let mut w = [0u16; MAX_WORDS];
        w[..words.len()].copy_from_slice(words);
        Step {
            pc,
            mnemonic,
            op1: OperandKind::NoOperand,
            op2: OperandKind::NoOperand,
            words: w,
            nwords: words.len() as u8,
            ri: [RegIndirect::default(); 2],
            cond_f: false,
            simm: 0,
            adr: RamAddr::default(),
        }
    }

    #[test]
    fn two_word_immediate_line() {
        let mut s = step(Mnemonic::Ld, 0x0012, &[0x0800, 0x1234]);
        s.op1 = OperandKind::X;
        s.op2 = OperandKind::Imm;

        let inst = Instruction::build(&s);
        assert_eq!(inst.address(), 0x0010);
        assert_eq!(inst.extra(1), Some(Extra::Imm(0x1234)));
        assert_eq!(inst.to_string(), "0010    0800 1234    ld   X, 1234");
    }

    #[test]
    fn single_word_pads_missing_word() {
        let mut s = step(Mnemonic::Ld, 0x0021, &[0x0A0C]);
        s.op1 = OperandKind::A;
        s.op2 = OperandKind::PriModInc;
        s.ri[1] = RegIndirect {
            modifier: 1,
            reg: 3,
        };
        let inst = Instruction::build(&s);
        assert_eq!(inst.words(), &[0x0A0C]);
        assert_eq!(
            inst.to_string(),
            format!("0020    0a0c{}    ld   A, (r3+)", " ".repeat(5))
        );
    }

    #[test]
    fn pointer_register_variants() {
        let mut s = step(Mnemonic::Ld, 0x0031, &[0x0000]);
        s.ri[0] = RegIndirect {
            modifier: 2,
            reg: 6,
        };
        let render = |s: &Step| Instruction::build(s).to_string();

        s.op1 = OperandKind::PriMval;
        assert!(render(&s).ends_with("ld   (r6|2)"));
        s.op1 = OperandKind::PriInc;
        assert!(render(&s).ends_with("ld   (r6+!)"));
        s.op1 = OperandKind::PpriModDec;
        assert!(render(&s).ends_with("ld   ((r6-))"));
        s.op1 = OperandKind::PpriMval;
        assert!(render(&s).ends_with("ld   ((r6|2))"));
        s.op1 = OperandKind::Ri;
        assert!(render(&s).ends_with("ld   r6"));
    }

    #[test]
    fn condition_polarity_follows_flag() {
        let mut s = step(Mnemonic::Bra, 0x0042, &[0x4D00, 0x0100]);
        s.op1 = OperandKind::CondZ;
        s.op2 = OperandKind::Addr;
        assert!(Instruction::build(&s)
            .to_string()
            .ends_with("bra  !is_zero, 0100"));

        s.cond_f = true;
        assert!(Instruction::build(&s)
            .to_string()
            .ends_with("bra  is_zero, 0100"));

        s.op1 = OperandKind::CondN;
        assert!(Instruction::build(&s)
            .to_string()
            .ends_with("bra  is_neg, 0100"));
    }

    #[test]
    fn ram_bank_and_short_immediate() {
        let mut s = step(Mnemonic::Ld, 0x0051, &[0x071F]);
        s.op1 = OperandKind::A;
        s.op2 = OperandKind::Adr;
        s.adr = RamAddr { pos: 0x1F, bank: 1 };
        assert!(Instruction::build(&s).to_string().ends_with("ld   A, RAM1[1F]"));

        s.op1 = OperandKind::Simm;
        s.op2 = OperandKind::NoOperand;
        s.simm = 0x0C;
        let inst = Instruction::build(&s);
        assert_eq!(inst.extra(0), Some(Extra::Imm(0x0C)));
        assert!(inst.to_string().ends_with("ld   0C"));
    }

    #[test]
    fn op_kinds_render_fixed_text() {
        let mut s = step(Mnemonic::Mod, 0x0061, &[0x9000]);
        s.op1 = OperandKind::CondTrue;
        s.op2 = OperandKind::OpNeg;
        assert!(Instruction::build(&s)
            .to_string()
            .ends_with("mod  true, op [A = -A]"));
    }

    #[test]
    fn unknown_kind_prints_tag() {
        let mut s = step(Mnemonic::Unk, 0x0001, &[0xFFFF]);
        s.op1 = OperandKind::from_raw(99);
        assert!(Instruction::build(&s).to_string().ends_with("unk 99"));
    }

    #[test]
    fn only_payload_kinds_have_extra_rules() {
        let with_rule: Vec<_> = OperandKind::KNOWN
            .iter()
            .copied()
            .filter(|k| k.extra_rule().is_some())
            .collect();
        use OperandKind::*;
        assert_eq!(
            with_rule,
            [
                Pri, PriMval, PriInc, PriModInc, PriModDec, Imm, Ppri, PpriMval, PpriInc,
                PpriModInc, PpriModDec, Ri, Simm, Addr,
            ]
        );
        assert_eq!(OperandKind::Unknown(99).extra_rule(), None);
    }
}
