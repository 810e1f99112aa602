//! Execution tracing for the Mega Drive cores.
//!
//! [`Tracer`] receives step and memory-access callbacks from the emulation
//! core through [`TraceHooks`]. Every retired instruction is decoded with
//! `md-disasm`, counted in a per-architecture [`ExecTracker`], and printed
//! when live print is enabled for that core. Memory accesses are printed
//! when their region is selected in the [`TracerConfig`].

mod config;
mod error;
mod events;
mod mem_filter;
mod tracer;
mod tracker;

pub use config::{
    ConfigError, TracerConfig, ENV_MEM_ACCESS, ENV_MEM_ACCESS_Z80, ENV_PRINT_INSTS,
    ENV_PRINT_INSTS_SVP, ENV_PRINT_INSTS_Z80,
};
pub use error::{Result, TraceError};
pub use events::{Access, CpuStep, RawM68kStep, RawSvpStep, RawZ80Step, Z80Step};
pub use mem_filter::{classify_main, classify_z80, MainBusFilter, MemRegions, Region, Z80BusFilter};
pub use tracer::{Cursor, MemAccess, TraceHooks, Tracer};
pub use tracker::{ExecRecord, ExecTracker};
