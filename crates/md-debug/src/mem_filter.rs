//! Region classification for reported memory accesses.
//!
//! Both buses use fixed, hard-coded windows. Addresses falling in a gap
//! between windows are never reported whatever the configured mask.

use bitflags::bitflags;

bitflags! {
    /// Regions whose accesses are printed.
    #[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash)]
    pub struct MemRegions: u8 {
        const ROM = 0x01;
        const RAM = 0x02;
        const PORTS = 0x04;
        /// 68000 memory as seen through the Z80 bank window.
        const MAIN_MEM = 0x08;
        const VDP = 0x10;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Region {
    Rom,
    Ram,
    Ports,
    MainMem,
    Vdp,
}

impl Region {
    pub const fn flag(self) -> MemRegions {
        match self {
            Self::Rom => MemRegions::ROM,
            Self::Ram => MemRegions::RAM,
            Self::Ports => MemRegions::PORTS,
            Self::MainMem => MemRegions::MAIN_MEM,
            Self::Vdp => MemRegions::VDP,
        }
    }
}

/// Classifies a 68000 bus address.
pub fn classify_main(addr: u32) -> Option<Region> {
    match addr {
        0..=0x3F_FFFF => Some(Region::Rom),
        0xC0_0000..=0xC0_0007 => Some(Region::Vdp),
        0xFF_0000.. => Some(Region::Ram),
        _ => None,
    }
}

/// Classifies a Z80 bus address.
pub fn classify_z80(addr: u16) -> Option<Region> {
    match addr {
        0..=0x1FFF => Some(Region::Ram),
        0x4000..=0x4003 | 0x6000 | 0x7F11 => Some(Region::Ports),
        0x8000.. => Some(Region::MainMem),
        _ => None,
    }
}

/// Access filter for the 68000 bus.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MainBusFilter {
    regions: MemRegions,
}

impl MainBusFilter {
    /// Z80 RAM byte 0x1FFD seen through the 68000 window. Reported whatever
    /// the mask.
    pub const ALWAYS_REPORTED: u32 = 0xA0_1FFD;

    pub const fn new(regions: MemRegions) -> Self {
        Self { regions }
    }

    pub fn should_report(&self, addr: u32) -> bool {
        addr == Self::ALWAYS_REPORTED
            || classify_main(addr).is_some_and(|r| self.regions.contains(r.flag()))
    }
}

/// Access filter for the Z80 bus.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Z80BusFilter {
    regions: MemRegions,
}

impl Z80BusFilter {
    pub const fn new(regions: MemRegions) -> Self {
        Self { regions }
    }

    pub fn should_report(&self, addr: u16) -> bool {
        classify_z80(addr).is_some_and(|r| self.regions.contains(r.flag()))
    }
}
