//! Instruction records and disassembly for the three Mega Drive processors.
//!
//! The emulation core reports every retired instruction as a positional
//! payload (post-fetch PC, mnemonic id, operand kinds, fetched units and the
//! operand extras). Each architecture module turns that payload into an
//! immutable instruction record and renders it as one line of text:
//!
//! - [`m68k`]: the 68000 main CPU (24-bit visible address window).
//! - [`z80`]: the Z80 sound coprocessor (16-bit address space).
//! - [`svp`]: the SSP1601 DSP found in the SVP cartridge chip (16-bit word
//!   addressed).
//!
//! All three are exposed through the [`Isa`] trait so the tracer can be
//! written once and instantiated per architecture.

use core::fmt;

/// Declares a closed `#[repr(u16)]` mnemonic set with sequential ordinals
/// starting at zero and its assembly text.
macro_rules! mnemonics {
    (
        $(#[$meta:meta])*
        pub enum $name:ident {
            $($(#[$vmeta:meta])* $variant:ident => $text:literal,)+
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        #[repr(u16)]
        pub enum $name {
            $($(#[$vmeta])* $variant,)+
        }

        impl $name {
            pub const ALL: &'static [Self] = &[$(Self::$variant,)+];

            /// Maps an ordinal reported by the emulation core.
            pub fn from_raw(raw: u16) -> Option<Self> {
                Self::ALL.get(usize::from(raw)).copied()
            }

            pub const fn raw(self) -> u16 {
                self as u16
            }

            pub const fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $text,)+
                }
            }
        }
    };
}

/// Declares an operand-kind set with sequential ordinals starting at zero.
/// Ordinals past the known set decode to `Unknown(raw)`.
macro_rules! operand_kinds {
    (
        $(#[$meta:meta])*
        pub enum $name:ident {
            $($(#[$vmeta:meta])* $variant:ident,)+
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $($(#[$vmeta])* $variant,)+
            /// Kind not modelled here; rendered as its raw tag.
            Unknown(u16),
        }

        impl $name {
            const KNOWN: &'static [Self] = &[$(Self::$variant,)+];

            pub fn from_raw(raw: u16) -> Self {
                Self::KNOWN
                    .get(usize::from(raw))
                    .copied()
                    .unwrap_or(Self::Unknown(raw))
            }

            pub fn raw(self) -> u16 {
                match self {
                    Self::Unknown(raw) => raw,
                    known => Self::KNOWN
                        .iter()
                        .position(|k| *k == known)
                        .map_or(u16::MAX, |i| i as u16),
                }
            }
        }
    };
}

pub mod m68k;
pub mod svp;
pub mod z80;

mod operand;

pub use operand::Extra;

/// Per-architecture build/render interface.
pub trait Isa {
    /// Raw step payload emitted by the emulation core for one retired
    /// instruction.
    type Step;
    /// Decoded instruction record.
    type Inst: Clone + fmt::Debug + fmt::Display;

    const NAME: &'static str;
    /// Prefix for live-print and dump lines (`""`, `"[Z80] "`, `"[SVP] "`).
    const LINE_PREFIX: &'static str;
    /// Mask applied to `reported_pc - len` to get the instruction address.
    const ADDRESS_MASK: u32;
    /// Number of addresses covered by the execution trace table.
    const TABLE_LEN: usize;

    fn build(step: &Self::Step) -> Self::Inst;

    fn address(inst: &Self::Inst) -> u32;

    /// Number of fetched units (bytes or words) making up the instruction.
    fn unit_len(inst: &Self::Inst) -> usize;

    fn render(inst: &Self::Inst) -> String {
        inst.to_string()
    }
}

pub(crate) fn start_address(reported_pc: u32, len: usize, mask: u32) -> u32 {
    reported_pc.wrapping_sub(len as u32) & mask
}

/// Writes the `ADDR   uu uu ..    ` prefix shared by all three renderers.
///
/// `units` are printed lower-case with a leading space each and padded to
/// `max_units` columns of `unit_width + 1` characters.
pub(crate) fn write_line_head<T: Into<u32> + Copy>(
    f: &mut fmt::Formatter<'_>,
    address: u32,
    address_digits: usize,
    units: &[T],
    unit_digits: usize,
    max_units: usize,
) -> fmt::Result {
    write!(f, "{address:0address_digits$X}   ")?;
    for &unit in units {
        write!(f, " {:0unit_digits$x}", unit.into())?;
    }
    for _ in units.len()..max_units {
        write!(f, "{:1$}", "", unit_digits + 1)?;
    }
    f.write_str("    ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn start_address_wraps_below_zero() {
        assert_eq!(start_address(0x0001, 2, 0xFFFF), 0xFFFF);
        assert_eq!(start_address(0x1006, 2, 0xFFFF), 0x1004);
        assert_eq!(start_address(0x0000_0000, 2, 0x00FF_FFFF), 0x00FF_FFFE);
    }
}
