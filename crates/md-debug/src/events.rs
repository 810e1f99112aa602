//! Events reported by the emulation core.

use md_disasm::{m68k, svp, z80};

use crate::error::TraceError;

/// 68000 step: a retired instruction or one of the core's pseudo-events.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CpuStep {
    Inst(m68k::Step),
    Stop,
    Reset,
    AutoVector { vector: u32, priority: u8 },
}

/// Z80 step: a retired instruction or an interrupt acknowledge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Z80Step {
    Inst(z80::Step),
    /// Maskable interrupt; `bus` is the byte on the data bus.
    Irq { bus: u8 },
    Nmi,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Access {
    Read,
    Write,
}

/// Step tuples with opcode and operand ids still in their raw ordinal form.
///
/// Operand ids never fail to convert. An opcode id outside the mnemonic
/// table is a malformed tuple and yields [`TraceError::UnknownOpcode`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawM68kStep {
    pub pc: u32,
    pub opcode: u16,
    pub op1: u16,
    pub op2: u16,
    pub bytes: Vec<u8>,
    pub extra1: m68k::ExtraPayload,
    pub extra2: m68k::ExtraPayload,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawZ80Step {
    pub pc: u16,
    pub opcode: u16,
    pub op1: u16,
    pub op2: u16,
    pub bytes: Vec<u8>,
    pub extra1: z80::ExtraPayload,
    pub extra2: z80::ExtraPayload,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawSvpStep {
    pub pc: u16,
    pub opcode: u16,
    pub op1: u16,
    pub op2: u16,
    pub words: [u16; svp::MAX_WORDS],
    pub nwords: u8,
    pub ri: [svp::RegIndirect; 2],
    pub cond_f: bool,
    pub simm: u8,
    pub adr: svp::RamAddr,
}

fn mnemonic<M>(
    arch: &'static str,
    id: u16,
    from_raw: fn(u16) -> Option<M>,
) -> Result<M, TraceError> {
    from_raw(id).ok_or(TraceError::UnknownOpcode { arch, id })
}

impl RawM68kStep {
    pub fn decode(self) -> Result<m68k::Step, TraceError> {
        Ok(m68k::Step {
            pc: self.pc,
            mnemonic: mnemonic("m68k", self.opcode, m68k::Mnemonic::from_raw)?,
            op1: m68k::OperandKind::from_raw(self.op1),
            op2: m68k::OperandKind::from_raw(self.op2),
            bytes: self.bytes,
            extra1: self.extra1,
            extra2: self.extra2,
        })
    }
}

impl RawZ80Step {
    pub fn decode(self) -> Result<z80::Step, TraceError> {
        Ok(z80::Step {
            pc: self.pc,
            mnemonic: mnemonic("z80", self.opcode, z80::Mnemonic::from_raw)?,
            op1: z80::OperandKind::from_raw(self.op1),
            op2: z80::OperandKind::from_raw(self.op2),
            bytes: self.bytes,
            extra1: self.extra1,
            extra2: self.extra2,
        })
    }
}

impl RawSvpStep {
    pub fn decode(self) -> Result<svp::Step, TraceError> {
        Ok(svp::Step {
            pc: self.pc,
            mnemonic: mnemonic("svp", self.opcode, svp::Mnemonic::from_raw)?,
            op1: svp::OperandKind::from_raw(self.op1),
            op2: svp::OperandKind::from_raw(self.op2),
            words: self.words,
            nwords: self.nwords,
            ri: self.ri,
            cond_f: self.cond_f,
            simm: self.simm,
            adr: self.adr,
        })
    }
}
