//! 68000 main CPU.
//!
//! Addresses are reported in the full 32-bit space; records and the trace
//! table use the 24-bit window actually decoded by the bus.

use core::fmt;

use crate::{start_address, write_line_head, Extra, Isa};

/// Longest 68000 instruction, in bytes.
pub const MAX_BYTES: usize = 10;

pub const ADDRESS_MASK: u32 = 0x00FF_FFFF;

mnemonics! {
    /// 68000 mnemonic set. `Unk` is the unknown-opcode sentinel.
    pub enum Mnemonic {
        Unk => "UNK",
        Abcd => "ABCD",
        AddB => "ADD.b",
        AddW => "ADD.w",
        AddL => "ADD.l",
        AddiB => "ADDI.b",
        AddiW => "ADDI.w",
        AddiL => "ADDI.l",
        AddqB => "ADDQ.b",
        AddqL => "ADDQ.l",
        AddqW => "ADDQ.w",
        AddxB => "ADDX.b",
        AddxW => "ADDX.w",
        AddxL => "ADDX.l",
        AndB => "AND.b",
        AndW => "AND.w",
        AndL => "AND.l",
        AndiB => "ANDI.b",
        AndiW => "ANDI.w",
        AndiL => "ANDI.l",
        AslB => "ASL.b",
        AslW => "ASL.w",
        AslL => "ASL.l",
        AsrB => "ASR.b",
        AsrW => "ASR.w",
        AsrL => "ASR.l",
        Bcc => "BCC",
        Bcs => "BCS",
        Beq => "BEQ",
        Bge => "BGE",
        Bgt => "BGT",
        Bhi => "BHI",
        Ble => "BLE",
        Bls => "BLS",
        Blt => "BLT",
        Bmi => "BMI",
        Bne => "BNE",
        Bpl => "BPL",
        Bvc => "BVC",
        Bvs => "BVS",
        Bchg => "BCHG",
        Bclr => "BCLR",
        Bra => "BRA",
        Bset => "BSET",
        Bsr => "BSR",
        Btst => "BTST",
        Chk => "CHK",
        ClrB => "CLR.b",
        ClrW => "CLR.w",
        ClrL => "CLR.l",
        CmpB => "CMP.b",
        CmpW => "CMP.w",
        CmpL => "CMP.l",
        CmpiB => "CMPI.b",
        CmpiW => "CMPI.w",
        CmpiL => "CMPI.l",
        CmpmB => "CMPM.b",
        CmpmW => "CMPM.w",
        CmpmL => "CMPM.l",
        Dbcc => "DBCC",
        Dbcs => "DBCS",
        Dbeq => "DBEQ",
        Dbf => "DBF",
        Dbge => "DBGE",
        Dbgt => "DBGT",
        Dbhi => "DBHI",
        Dble => "DBLE",
        Dbls => "DBLS",
        Dblt => "DBLT",
        Dbmi => "DBMI",
        Dbne => "DBNE",
        Dbpl => "DBPL",
        Dbt => "DBT",
        Dbvc => "DBVC",
        Dbvs => "DBVS",
        Divs => "DIVS",
        Divu => "DIVU",
        EorB => "EOR.b",
        EorW => "EOR.w",
        EorL => "EOR.l",
        EoriB => "EORI.b",
        EoriW => "EORI.w",
        EoriL => "EORI.l",
        Exg => "EXG",
        ExtL => "EXT.l",
        ExtW => "EXT.w",
        Illegal => "ILLEGAL",
        Jmp => "JMP",
        Jsr => "JSR",
        Lea => "LEA",
        Link => "LINK",
        LslB => "LSL.b",
        LslW => "LSL.w",
        LslL => "LSL.l",
        LsrB => "LSR.b",
        LsrW => "LSR.w",
        LsrL => "LSR.l",
        MoveB => "MOVE.b",
        MoveW => "MOVE.w",
        MoveL => "MOVE.l",
        MovemL => "MOVEM.l",
        MovemW => "MOVEM.w",
        MovepW => "MOVEP.w",
        MovepL => "MOVEP.l",
        Moveq => "MOVEQ",
        Muls => "MULS",
        Mulu => "MULU",
        Nbcd => "NBCD",
        NegB => "NEG.b",
        NegL => "NEG.l",
        NegW => "NEG.w",
        NegxB => "NEGX.b",
        NegxL => "NEGX.l",
        NegxW => "NEGX.w",
        Nop => "NOP",
        NotB => "NOT.b",
        NotL => "NOT.l",
        NotW => "NOT.w",
        OrB => "OR.b",
        OrL => "OR.l",
        OrW => "OR.w",
        OriB => "ORI.b",
        OriL => "ORI.l",
        OriW => "ORI.w",
        Pea => "PEA",
        Reset => "RESET",
        RolB => "ROL.b",
        RolW => "ROL.w",
        RolL => "ROL.l",
        RorB => "ROR.b",
        RorW => "ROR.w",
        RorL => "ROR.l",
        RoxlB => "ROXL.b",
        RoxlW => "ROXL.w",
        RoxlL => "ROXL.l",
        RoxrB => "ROXR.b",
        RoxrW => "ROXR.w",
        RoxrL => "ROXR.l",
        Rte => "RTE",
        Rtr => "RTR",
        Rts => "RTS",
        Sbcd => "SBCD",
        Scc => "SCC",
        Scs => "SCS",
        Seq => "SEQ",
        Sf => "SF",
        Sge => "SGE",
        Sgt => "SGT",
        Shi => "SHI",
        Sle => "SLE",
        Sls => "SLS",
        Slt => "SLT",
        Smi => "SMI",
        Sne => "SNE",
        Spl => "SPL",
        St => "ST",
        Svc => "SVC",
        Svs => "SVS",
        Stop => "STOP",
        SubB => "SUB.b",
        SubW => "SUB.w",
        SubL => "SUB.l",
        SubiB => "SUBI.b",
        SubiW => "SUBI.w",
        SubiL => "SUBI.l",
        SubqB => "SUBQ.b",
        SubqL => "SUBQ.l",
        SubqW => "SUBQ.w",
        SubxB => "SUBX.b",
        SubxL => "SUBX.l",
        SubxW => "SUBX.w",
        Swap => "SWAP",
        Trap => "TRAP",
        TstB => "TST.b",
        TstW => "TST.w",
        TstL => "TST.l",
        Unlk => "UNLK",
    }
}

operand_kinds! {
    /// 68000 addressing modes and operand classes.
    pub enum OperandKind {
        NoOperand,
        /// `#imm` byte.
        ImmB,
        ImmW,
        ImmL,
        /// `Dn`
        DataReg,
        /// `An`
        AddrReg,
        /// `(An)`
        AddrInd,
        /// `(An)+`
        AddrPostInc,
        /// `-(An)`
        AddrPreDec,
        /// `(d16,An)`
        AddrDisp,
        /// `(d8,An,Xn)`
        AddrIndex,
        /// `(xxx).W`
        AbsW,
        /// `(xxx).L`
        AbsL,
        /// `(d16,PC)`
        PcDisp,
        /// `(d8,PC,Xn)`
        PcIndex,
        Sr,
        Vector,
        Dis16,
        Usp,
        RegList,
        Ccr,
        /// Branch target (Bcc/DBcc/BSR).
        Label,
        /// Shift/quick count.
        Count,
    }
}

/// Which field of [`ExtraPayload`] an operand kind reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ExtraRule {
    Byte,
    Reg,
    D16An,
    D8AnXn,
    Word,
    Long,
    Vector,
    Dis16,
    List,
    Label,
    Count,
}

impl OperandKind {
    fn extra_rule(self) -> Option<ExtraRule> {
        use OperandKind::*;
        Some(match self {
            ImmB => ExtraRule::Byte,
            DataReg | AddrReg | AddrInd | AddrPostInc | AddrPreDec => ExtraRule::Reg,
            AddrDisp | PcDisp => ExtraRule::D16An,
            AddrIndex | PcIndex => ExtraRule::D8AnXn,
            ImmW | AbsW => ExtraRule::Word,
            ImmL | AbsL => ExtraRule::Long,
            Vector => ExtraRule::Vector,
            Dis16 => ExtraRule::Dis16,
            RegList => ExtraRule::List,
            Label => ExtraRule::Label,
            Count => ExtraRule::Count,
            NoOperand | Sr | Usp | Ccr | Unknown(_) => return None,
        })
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct D16AnPayload {
    pub reg: u8,
    pub disp: i16,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct D8AnXnPayload {
    pub areg: u8,
    pub xreg: u8,
    pub disp: i8,
    pub is_data: bool,
    pub is_word: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LabelPayload {
    pub target: u32,
    pub disp: i16,
}

/// Positional operand payload reported alongside each operand slot.
///
/// The core fills every field regardless of the operand kind; only the one
/// selected by the kind is meaningful.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExtraPayload {
    pub byte: u8,
    pub reg: u8,
    pub d16an: D16AnPayload,
    pub d8anxn: D8AnXnPayload,
    pub word: u16,
    pub longval: u32,
    pub vector: i32,
    pub dis16: i16,
    pub list: u16,
    pub label: LabelPayload,
    pub count: u8,
}

impl ExtraPayload {
    fn extract(&self, rule: ExtraRule) -> Extra {
        match rule {
            ExtraRule::Byte => Extra::Imm(u32::from(self.byte)),
            ExtraRule::Reg => Extra::Reg(self.reg),
            ExtraRule::D16An => Extra::BaseDisp {
                disp: self.d16an.disp,
                base: self.d16an.reg,
            },
            ExtraRule::D8AnXn => Extra::Indexed {
                disp: self.d8anxn.disp,
                base: self.d8anxn.areg,
                index: self.d8anxn.xreg,
                index_is_data: self.d8anxn.is_data,
                index_is_word: self.d8anxn.is_word,
            },
            ExtraRule::Word => Extra::Imm(u32::from(self.word)),
            ExtraRule::Long => Extra::Imm(self.longval),
            ExtraRule::Vector => Extra::Int(self.vector),
            ExtraRule::Dis16 => Extra::Int(i32::from(self.dis16)),
            ExtraRule::List => Extra::RegList(self.list),
            ExtraRule::Label => Extra::Branch {
                offset: i32::from(self.label.disp),
                target: self.label.target,
            },
            ExtraRule::Count => Extra::Int(i32::from(self.count)),
        }
    }
}

/// Retired-instruction step as reported by the 68000 core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
    /// PC after the fetch.
    pub pc: u32,
    pub mnemonic: Mnemonic,
    pub op1: OperandKind,
    pub op2: OperandKind,
    pub bytes: Vec<u8>,
    pub extra1: ExtraPayload,
    pub extra2: ExtraPayload,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instruction {
    address: u32,
    full_address: u32,
    bytes: Vec<u8>,
    mnemonic: Mnemonic,
    operands: [OperandKind; 2],
    extra: [Option<Extra>; 2],
}

impl Instruction {
    pub fn build(step: &Step) -> Self {
        let full_address = start_address(step.pc, step.bytes.len(), u32::MAX);
        let resolve = |kind: OperandKind, payload: &ExtraPayload| {
            kind.extra_rule().map(|rule| payload.extract(rule))
        };
        Self {
            address: full_address & ADDRESS_MASK,
            full_address,
            bytes: step.bytes.clone(),
            mnemonic: step.mnemonic,
            operands: [step.op1, step.op2],
            extra: [
                resolve(step.op1, &step.extra1),
                resolve(step.op2, &step.extra2),
            ],
        }
    }

    /// Address inside the 24-bit window.
    pub fn address(&self) -> u32 {
        self.address
    }

    /// Address before masking to the 24-bit window.
    pub fn full_address(&self) -> u32 {
        self.full_address
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
        use OperandKind::*;

        let kind = self.operands[slot];
        let extra = self.extra[slot];
        let imm = || extra.and_then(Extra::imm).unwrap_or(0);
        let int = || extra.and_then(Extra::int).unwrap_or(0);
        let reg = || extra.and_then(Extra::reg).unwrap_or(0);

        match kind {
            NoOperand => Ok(()),
            ImmB | ImmW | ImmL => write!(f, " ${:X}", imm()),
            DataReg => write!(f, " D{}", reg()),
            AddrReg => write!(f, " A{}", reg()),
            AddrInd => write!(f, " (A{})", reg()),
            AddrPostInc => write!(f, " (A{})+", reg()),
            AddrPreDec => write!(f, " -(A{})", reg()),
            AddrDisp | PcDisp => {
                let Some(Extra::BaseDisp { disp, base }) = extra else {
                    return write!(f, "{}", kind.raw());
                };
                if kind == PcDisp {
                    write!(f, " ({disp},PC)")
                } else {
                    write!(f, " ({disp},A{base})")
                }
            }
            AddrIndex | PcIndex => {
                let Some(Extra::Indexed {
                    disp,
                    base,
                    index,
                    index_is_data,
                    index_is_word,
                }) = extra
                else {
                    return write!(f, "{}", kind.raw());
                };
                let bank = if index_is_data { 'D' } else { 'A' };
                let size = if index_is_word { 'w' } else { 'l' };
                if kind == PcIndex {
                    write!(f, " ({disp},PC,{bank}{index}.{size})")
                } else {
                    write!(f, " ({disp},A{base},{bank}{index}.{size})")
                }
            }
            AbsW => write!(f, " (${:04X}).W", imm()),
            AbsL => write!(f, " (${:08X}).L", imm()),
            Sr => f.write_str(" SR"),
            Usp => f.write_str(" USP"),
            Ccr => f.write_str(" CCR"),
            Vector | Dis16 | Count => write!(f, " {}", int()),
            RegList => {
                let mask = match extra {
                    Some(Extra::RegList(mask)) => mask,
                    _ => 0,
                };
                f.write_str(" ")?;
                fmt_reg_list(f, mask)
            }
            Label => match extra {
                Some(Extra::Branch { offset, target }) => write!(f, " {offset} (${target:08X})"),
                _ => write!(f, "{}", kind.raw()),
            },
            Unknown(raw) => write!(f, "{raw}"),
        }
    }
}

/// Writes the set registers of a MOVEM mask as `D0,D3,A7`.
fn fmt_reg_list(f: &mut fmt::Formatter<'_>, mask: u16) -> fmt::Result {
    let mut first = true;
    for bit in 0..16u16 {
        if mask & (1 << bit) == 0 {
            continue;
        }
        if !first {
            f.write_str(",")?;
        }
        first = false;
        let bank = if bit < 8 { 'D' } else { 'A' };
        write!(f, "{bank}{}", bit % 8)?;
    }
    Ok(())
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_line_head(f, self.address, 8, self.bytes.as_slice(), 2, MAX_BYTES)?;
        write!(f, "{:<8}", self.mnemonic.as_str())?;
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

/// Marker type implementing [`Isa`] for the 68000.
#[derive(Debug, Clone, Copy, Default)]
pub struct M68k;

impl Isa for M68k {
    type Step = Step;
    type Inst = Instruction;

    const NAME: &'static str = "m68k";
    const LINE_PREFIX: &'static str = "";
    const ADDRESS_MASK: u32 = ADDRESS_MASK;
    const TABLE_LEN: usize = 0x0100_0000;

    fn build(step: &Step) -> Instruction {
        Instruction::build(step)
    }

    fn address(inst: &Instruction) -> u32 {
        inst.address
    }

    fn unit_len(inst: &Instruction) -> usize {
        inst.bytes.len()
    }
}
