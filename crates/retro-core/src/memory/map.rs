//! Fixed console address maps for the two CPU profiles.

use crate::fault::ConfigurationError;
use crate::memory::{Bus, IoRegisterBlock, MemoryRegion, RegionHandle};

/// Wide profile: inclusive start of the boot ROM.
pub const BIOS_START: u32 = 0x0000_0000;
/// Wide profile: boot ROM size.
pub const BIOS_SIZE: u32 = 16 * 1024;
/// Wide profile: inclusive start of external work RAM.
pub const EWRAM_START: u32 = 0x0200_0000;
/// Wide profile: external work RAM size.
pub const EWRAM_SIZE: u32 = 256 * 1024;
/// Wide profile: inclusive start of internal work RAM.
pub const IWRAM_START: u32 = 0x0300_0000;
/// Wide profile: internal work RAM size.
pub const IWRAM_SIZE: u32 = 32 * 1024;
/// Wide profile: inclusive start of the I/O register block.
pub const IO_START: u32 = 0x0400_0000;
/// Wide profile: I/O register block size.
pub const IO_SIZE: u32 = 0x400;
/// Wide profile: inclusive start of palette RAM.
pub const PALETTE_START: u32 = 0x0500_0000;
/// Wide profile: palette RAM size.
pub const PALETTE_SIZE: u32 = 1024;
/// Wide profile: inclusive start of video RAM.
pub const VRAM_START: u32 = 0x0600_0000;
/// Wide profile: video RAM size.
pub const VRAM_SIZE: u32 = 96 * 1024;
/// Wide profile: inclusive start of object-attribute RAM.
pub const OAM_START: u32 = 0x0700_0000;
/// Wide profile: object-attribute RAM size.
pub const OAM_SIZE: u32 = 1024;
/// Wide profile: inclusive start of cartridge ROM (default entry point).
pub const ROM_START: u32 = 0x0800_0000;
/// Wide profile: maximum cartridge ROM size.
pub const ROM_SIZE: u32 = 32 * 1024 * 1024;

/// Bus handles for every region of the wide address map.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(missing_docs)]
pub struct WideMemoryMap {
    pub bios: RegionHandle,
    pub ewram: RegionHandle,
    pub iwram: RegionHandle,
    pub io: RegionHandle,
    pub palette: RegionHandle,
    pub vram: RegionHandle,
    pub oam: RegionHandle,
    pub rom: RegionHandle,
}

impl WideMemoryMap {
    /// Builds a bus with the wide map: BIOS and cartridge ROM read-only,
    /// I/O served by an unbound [`IoRegisterBlock`].
    ///
    /// # Errors
    ///
    /// Propagates [`ConfigurationError`] from the bus; the fixed layout
    /// itself never overlaps.
    pub fn build() -> Result<(Bus, Self), ConfigurationError> {
        let mut bus = Bus::new();
        let map = Self {
            bios: bus.map(BIOS_START, BIOS_SIZE, ram_ro("BIOS", BIOS_SIZE), 0)?,
            ewram: bus.map(EWRAM_START, EWRAM_SIZE, ram("EWRAM", EWRAM_SIZE), 0)?,
            iwram: bus.map(IWRAM_START, IWRAM_SIZE, ram("IWRAM", IWRAM_SIZE), 0)?,
            io: bus.map(IO_START, IO_SIZE, IoRegisterBlock::new("IO", IO_SIZE as usize), 0)?,
            palette: bus.map(PALETTE_START, PALETTE_SIZE, ram("PAL", PALETTE_SIZE), 0)?,
            vram: bus.map(VRAM_START, VRAM_SIZE, ram("VRAM", VRAM_SIZE), 0)?,
            oam: bus.map(OAM_START, OAM_SIZE, ram("OAM", OAM_SIZE), 0)?,
            rom: bus.map(ROM_START, ROM_SIZE, ram_ro("ROM", ROM_SIZE), 0)?,
        };
        Ok((bus, map))
    }
}

/// Narrow profile: cartridge ROM (`0x0000..=0x7FFF`).
pub const NARROW_ROM_START: u16 = 0x0000;
/// Narrow profile: video RAM (`0x8000..=0x9FFF`).
pub const NARROW_VRAM_START: u16 = 0x8000;
/// Narrow profile: external cartridge RAM (`0xA000..=0xBFFF`).
pub const NARROW_ERAM_START: u16 = 0xA000;
/// Narrow profile: work RAM (`0xC000..=0xDFFF`).
pub const NARROW_WRAM_START: u16 = 0xC000;
/// Narrow profile: echo of work RAM (`0xE000..=0xFDFF`).
pub const NARROW_ECHO_START: u16 = 0xE000;
/// Narrow profile: object-attribute memory (`0xFE00..=0xFE9F`).
pub const NARROW_OAM_START: u16 = 0xFE00;
/// Narrow profile: first unmapped address after OAM (`0xFEA0..=0xFEFF`).
pub const NARROW_UNUSABLE_START: u16 = 0xFEA0;
/// Narrow profile: I/O ports (`0xFF00..=0xFF7F`).
pub const NARROW_IO_START: u16 = 0xFF00;
/// Narrow profile: high RAM (`0xFF80..=0xFFFE`).
pub const NARROW_HRAM_START: u16 = 0xFF80;
/// Narrow profile: interrupt-enable register.
pub const NARROW_IE_ADDRESS: u16 = 0xFFFF;
/// Narrow profile: reset entry point.
pub const NARROW_ENTRY_POINT: u16 = 0x0100;

/// Bus handles for every region of the narrow address map.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(missing_docs)]
pub struct NarrowMemoryMap {
    pub rom: RegionHandle,
    pub vram: RegionHandle,
    pub eram: RegionHandle,
    pub wram: RegionHandle,
    pub oam: RegionHandle,
    pub io: RegionHandle,
    pub hram: RegionHandle,
    pub interrupt_enable: RegionHandle,
}

impl NarrowMemoryMap {
    /// Builds a bus with the narrow map. Work RAM is mirrored at the echo
    /// range; `0xFEA0..=0xFEFF` is left unmapped and faults.
    ///
    /// # Errors
    ///
    /// Propagates [`ConfigurationError`] from the bus.
    pub fn build() -> Result<(Bus, Self), ConfigurationError> {
        let mut bus = Bus::new();
        let map = Self {
            rom: bus.map(at(NARROW_ROM_START), 0x8000, ram_ro("ROM", 0x8000), 0)?,
            vram: bus.map(at(NARROW_VRAM_START), 0x2000, ram("VRAM", 0x2000), 0)?,
            eram: bus.map(at(NARROW_ERAM_START), 0x2000, ram("ERAM", 0x2000), 0)?,
            wram: bus.map(at(NARROW_WRAM_START), 0x2000, ram("WRAM", 0x2000), 0)?,
            oam: bus.map(at(NARROW_OAM_START), 0xA0, ram("OAM", 0xA0), 0)?,
            io: bus.map(at(NARROW_IO_START), 0x80, ram("IO", 0x80), 0)?,
            hram: bus.map(at(NARROW_HRAM_START), 0x7F, ram("HRAM", 0x7F), 0)?,
            interrupt_enable: bus.map(at(NARROW_IE_ADDRESS), 1, ram("IE", 1), 0)?,
        };
        bus.mirror(at(NARROW_ECHO_START), 0x1E00, map.wram, 0)?;
        Ok((bus, map))
    }
}

const fn at(address: u16) -> u32 {
    address as u32
}

fn ram(name: &'static str, size: u32) -> MemoryRegion {
    MemoryRegion::new(name, size as usize)
}

fn ram_ro(name: &'static str, size: u32) -> MemoryRegion {
    MemoryRegion::read_only(name, size as usize)
}
