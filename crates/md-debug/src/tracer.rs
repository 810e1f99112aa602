use std::io::Write;

use md_disasm::m68k::M68k;
use md_disasm::svp::{self, Svp};
use md_disasm::z80::Z80;
use md_disasm::Isa;
use tracing::debug;

use crate::config::{ConfigError, TracerConfig};
use crate::error::Result;
use crate::events::{Access, CpuStep, RawM68kStep, RawSvpStep, RawZ80Step, Z80Step};
use crate::mem_filter::{MainBusFilter, MemRegions, Z80BusFilter};
use crate::tracker::ExecTracker;

/// Callbacks invoked in-line by the emulation core.
pub trait TraceHooks {
    fn cpu_step(&mut self, step: &CpuStep) -> Result<()>;

    fn cpu_step_z80(&mut self, step: &Z80Step) -> Result<()>;

    fn cpu_step_svp(&mut self, step: &svp::Step) -> Result<()>;

    /// 68000 word access.
    fn mem_access(&mut self, access: Access, addr: u32, data: u16) -> Result<()>;

    /// 68000 byte access.
    fn mem_access8(&mut self, access: Access, addr: u32, data: u8) -> Result<()>;

    fn mem_access_z80(&mut self, access: Access, addr: u16, data: u8) -> Result<()>;

    /// Same as [`cpu_step`](Self::cpu_step) for a step still holding raw ids.
    /// Nothing is recorded when the opcode id is unknown.
    fn cpu_step_raw(&mut self, step: RawM68kStep) -> Result<()> {
        self.cpu_step(&CpuStep::Inst(step.decode()?))
    }

    fn cpu_step_z80_raw(&mut self, step: RawZ80Step) -> Result<()> {
        self.cpu_step_z80(&Z80Step::Inst(step.decode()?))
    }

    fn cpu_step_svp_raw(&mut self, step: RawSvpStep) -> Result<()> {
        self.cpu_step_svp(&step.decode()?)
    }
}

/// Where a core last executed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Cursor {
    /// Start address of the last decoded instruction. For the 68000 this is
    /// the unmasked 32-bit value.
    pub last_addr: Option<u32>,
    /// PC reported after the last fetch.
    pub next_addr: u32,
}

/// Last 68000 word access that passed the filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemAccess {
    pub access: Access,
    pub addr: u32,
    pub data: u16,
}

/// Instruction and memory tracer for the three cores.
///
/// Owns one [`ExecTracker`] per architecture. Live lines and dumps go to the
/// writer `W`.
#[derive(Debug)]
pub struct Tracer<W: Write> {
    out: W,
    config: TracerConfig,
    m68k: ExecTracker<M68k>,
    z80: ExecTracker<Z80>,
    svp: ExecTracker<Svp>,
    cursor: Cursor,
    cursor_z80: Cursor,
    cursor_svp: Cursor,
    last_mem_access: Option<MemAccess>,
}

impl<W: Write> Tracer<W> {
    pub fn new(out: W, config: TracerConfig) -> Self {
        debug!(?config, "tracer configured");
        Self {
            out,
            config,
            m68k: ExecTracker::new(),
            z80: ExecTracker::new(),
            svp: ExecTracker::new(),
            cursor: Cursor::default(),
            cursor_z80: Cursor::default(),
            cursor_svp: Cursor::default(),
            last_mem_access: None,
        }
    }

    pub fn from_env(out: W) -> std::result::Result<Self, ConfigError> {
        Ok(Self::new(out, TracerConfig::from_env()?))
    }

    pub fn config(&self) -> &TracerConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: TracerConfig) {
        debug!(?config, "tracer reconfigured");
        self.config = config;
    }

    pub fn enable_print_insts(&mut self, enabled: bool) {
        self.config.print_insts = enabled;
    }

    pub fn enable_print_insts_z80(&mut self, enabled: bool) {
        self.config.print_insts_z80 = enabled;
    }

    pub fn enable_print_insts_svp(&mut self, enabled: bool) {
        self.config.print_insts_svp = enabled;
    }

    pub fn enable_print_mem_access(&mut self, regions: MemRegions) {
        debug!(?regions, "68000 memory access print");
        self.config.mem_access = regions;
    }

    pub fn enable_print_mem_access_z80(&mut self, regions: MemRegions) {
        debug!(?regions, "z80 memory access print");
        self.config.mem_access_z80 = regions;
    }

    pub fn m68k(&self) -> &ExecTracker<M68k> {
        &self.m68k
    }

    pub fn z80(&self) -> &ExecTracker<Z80> {
        &self.z80
    }

    pub fn svp(&self) -> &ExecTracker<Svp> {
        &self.svp
    }

    pub fn cursor(&self) -> Cursor {
        self.cursor
    }

    pub fn cursor_z80(&self) -> Cursor {
        self.cursor_z80
    }

    pub fn cursor_svp(&self) -> Cursor {
        self.cursor_svp
    }

    pub fn last_mem_access(&self) -> Option<MemAccess> {
        self.last_mem_access
    }

    pub fn dump_insts(&mut self) -> Result<()> {
        Ok(self.m68k.dump(&mut self.out)?)
    }

    pub fn dump_insts_z80(&mut self) -> Result<()> {
        Ok(self.z80.dump(&mut self.out)?)
    }

    pub fn dump_insts_svp(&mut self) -> Result<()> {
        Ok(self.svp.dump(&mut self.out)?)
    }

    /// Drops all three execution tables.
    pub fn clear(&mut self) {
        self.m68k.clear();
        self.z80.clear();
        self.svp.clear();
    }

    pub fn get_ref(&self) -> &W {
        &self.out
    }

    pub fn get_mut(&mut self) -> &mut W {
        &mut self.out
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> TraceHooks for Tracer<W> {
    fn cpu_step(&mut self, step: &CpuStep) -> Result<()> {
        let step = match step {
            CpuStep::Inst(step) => step,
            CpuStep::Stop => return Ok(writeln!(self.out, "STOP")?),
            CpuStep::Reset => return Ok(writeln!(self.out, "RESET")?),
            CpuStep::AutoVector { vector, priority } => {
                return Ok(writeln!(self.out, "AUTOVECTOR {vector:X} ({priority})")?);
            }
        };

        let inst = M68k::build(step);
        self.cursor = Cursor {
            last_addr: Some(inst.full_address()),
            next_addr: step.pc,
        };
        if self.config.print_insts {
            writeln!(self.out, "{}{}", M68k::LINE_PREFIX, M68k::render(&inst))?;
        }
        self.m68k.record(inst);
        Ok(())
    }

    fn cpu_step_z80(&mut self, step: &Z80Step) -> Result<()> {
        let print = self.config.print_insts_z80;
        let step = match step {
            Z80Step::Inst(step) => step,
            Z80Step::Irq { bus } => {
                if print {
                    writeln!(self.out, "{}IRQ 00{bus:02X}", Z80::LINE_PREFIX)?;
                }
                return Ok(());
            }
            Z80Step::Nmi => {
                if print {
                    writeln!(self.out, "{}NMI", Z80::LINE_PREFIX)?;
                }
                return Ok(());
            }
        };

        let inst = Z80::build(step);
        self.cursor_z80 = Cursor {
            last_addr: Some(Z80::address(&inst)),
            next_addr: u32::from(step.pc),
        };
        if print {
            writeln!(self.out, "{}{}", Z80::LINE_PREFIX, Z80::render(&inst))?;
        }
        self.z80.record(inst);
        Ok(())
    }

    fn cpu_step_svp(&mut self, step: &svp::Step) -> Result<()> {
        let inst = Svp::build(step);
        self.cursor_svp = Cursor {
            last_addr: Some(Svp::address(&inst)),
            next_addr: u32::from(step.pc),
        };
        if self.config.print_insts_svp {
            writeln!(self.out, "{}{}", Svp::LINE_PREFIX, Svp::render(&inst))?;
        }
        self.svp.record(inst);
        Ok(())
    }

    fn mem_access(&mut self, access: Access, addr: u32, data: u16) -> Result<()> {
        if !MainBusFilter::new(self.config.mem_access).should_report(addr) {
            return Ok(());
        }
        self.last_mem_access = Some(MemAccess { access, addr, data });
        match access {
            Access::Read => writeln!(self.out, "MEM[{addr:08X}] -> {data:04X}")?,
            Access::Write => writeln!(self.out, "MEM[{addr:08X}]= {data:04X}")?,
        }
        Ok(())
    }

    fn mem_access8(&mut self, access: Access, addr: u32, data: u8) -> Result<()> {
        if !MainBusFilter::new(self.config.mem_access).should_report(addr) {
            return Ok(());
        }
        match access {
            Access::Read => writeln!(self.out, "MEM8[{addr:08X}] -> {data:02X}")?,
            Access::Write => writeln!(self.out, "MEM8[{addr:08X}]= {data:02X}")?,
        }
        Ok(())
    }

    fn mem_access_z80(&mut self, access: Access, addr: u16, data: u8) -> Result<()> {
        if !Z80BusFilter::new(self.config.mem_access_z80).should_report(addr) {
            return Ok(());
        }
        match access {
            Access::Read => writeln!(self.out, "MEMZ80[{addr:04X}] -> {data:02X}")?,
            Access::Write => writeln!(self.out, "MEMZ80[{addr:04X}]= {data:02X}")?,
        }
        Ok(())
    }
}
