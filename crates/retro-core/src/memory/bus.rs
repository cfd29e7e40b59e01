//! Global address routing onto owned regions.

use crate::fault::{BusFault, ConfigurationError, CoreError};
use crate::memory::{AccessKind, AccessWidth, MappedRegion, Region};

/// Stable identifier of a region owned by a [`Bus`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RegionHandle(usize);

impl RegionHandle {
    /// Index of the region in registration order.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

/// One routed address range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Mapping {
    /// Inclusive start address.
    pub start: u32,
    /// Inclusive end address.
    pub end: u32,
    /// Region serving this range.
    pub region: RegionHandle,
    /// Local offset that `start` maps to inside the region.
    pub local_base: u32,
}

impl Mapping {
    /// Returns `true` when `address` falls inside this range.
    #[must_use]
    pub const fn contains(&self, address: u32) -> bool {
        address >= self.start && address <= self.end
    }

    const fn overlaps(&self, start: u32, end: u32) -> bool {
        start <= self.end && self.start <= end
    }
}

/// Address-space router.
///
/// Mappings never overlap and are kept sorted by start address, so routing
/// is a binary search. Addresses outside every mapping fault; they never
/// read as zero or as the open-bus value.
#[derive(Debug, Default)]
pub struct Bus {
    regions: Vec<MappedRegion>,
    mappings: Vec<Mapping>,
    open_bus: u8,
}

impl Bus {
    /// Creates a bus with no mappings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Takes ownership of `region` and maps `size` bytes of it at `start`.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigurationError`] for empty, overflowing or
    /// overlapping ranges, or a window larger than the region.
    pub fn map(
        &mut self,
        start: u32,
        size: u32,
        region: impl Into<MappedRegion>,
        local_base: u32,
    ) -> Result<RegionHandle, ConfigurationError> {
        let region = region.into();
        let end = Self::validate_range(start, size)?;
        Self::validate_window(&region, local_base, size)?;
        self.validate_free(start, end)?;

        let handle = RegionHandle(self.regions.len());
        tracing::debug!(
            region = region.name(),
            start,
            end,
            local_base,
            "mapped region"
        );
        self.regions.push(region);
        self.insert(Mapping {
            start,
            end,
            region: handle,
            local_base,
        });
        Ok(handle)
    }

    /// Maps an already-owned region at an additional range.
    ///
    /// # Errors
    ///
    /// Same conditions as [`Bus::map`], plus
    /// [`ConfigurationError::UnknownHandle`].
    pub fn mirror(
        &mut self,
        start: u32,
        size: u32,
        handle: RegionHandle,
        local_base: u32,
    ) -> Result<(), ConfigurationError> {
        let region = self
            .regions
            .get(handle.0)
            .ok_or(ConfigurationError::UnknownHandle(handle.0))?;
        let end = Self::validate_range(start, size)?;
        Self::validate_window(region, local_base, size)?;
        self.validate_free(start, end)?;

        tracing::debug!(
            region = region.name(),
            start,
            end,
            local_base,
            "mirrored region"
        );
        self.insert(Mapping {
            start,
            end,
            region: handle,
            local_base,
        });
        Ok(())
    }

    const fn validate_range(start: u32, size: u32) -> Result<u32, ConfigurationError> {
        if size == 0 {
            return Err(ConfigurationError::EmptyRange { start });
        }
        match start.checked_add(size - 1) {
            Some(end) => Ok(end),
            None => Err(ConfigurationError::RangeOverflow { start, size }),
        }
    }

    fn validate_window(
        region: &MappedRegion,
        local_base: u32,
        size: u32,
    ) -> Result<(), ConfigurationError> {
        let fits = (local_base as usize)
            .checked_add(size as usize)
            .is_some_and(|window_end| window_end <= region.size());
        if fits {
            Ok(())
        } else {
            Err(ConfigurationError::WindowOutOfRegion {
                region: region.name(),
                region_size: region.size(),
                local_base,
                size,
            })
        }
    }

    fn validate_free(&self, start: u32, end: u32) -> Result<(), ConfigurationError> {
        match self.mappings.iter().find(|mapping| mapping.overlaps(start, end)) {
            Some(existing) => Err(ConfigurationError::Overlap {
                start,
                end,
                existing_start: existing.start,
                existing_end: existing.end,
            }),
            None => Ok(()),
        }
    }

    fn insert(&mut self, mapping: Mapping) {
        let at = self
            .mappings
            .partition_point(|existing| existing.start < mapping.start);
        self.mappings.insert(at, mapping);
    }

    /// Routed mappings in ascending address order.
    #[must_use]
    pub fn mappings(&self) -> &[Mapping] {
        &self.mappings
    }

    /// Finds the mapping covering `address`.
    #[must_use]
    pub fn mapping_at(&self, address: u32) -> Option<&Mapping> {
        let after = self
            .mappings
            .partition_point(|mapping| mapping.start <= address);
        after
            .checked_sub(1)
            .and_then(|index| self.mappings.get(index))
            .filter(|mapping| mapping.contains(address))
    }

    /// Borrows an owned region.
    #[must_use]
    pub fn region(&self, handle: RegionHandle) -> Option<&MappedRegion> {
        self.regions.get(handle.0)
    }

    /// Mutably borrows an owned region (cartridge mount, I/O binding).
    pub fn region_mut(&mut self, handle: RegionHandle) -> Option<&mut MappedRegion> {
        self.regions.get_mut(handle.0)
    }

    /// Last byte returned by a successful read.
    #[must_use]
    pub const fn open_bus(&self) -> u8 {
        self.open_bus
    }

    fn route(
        &mut self,
        address: u32,
        width: AccessWidth,
        kind: AccessKind,
    ) -> Result<(&mut MappedRegion, usize), CoreError> {
        let mapping = *self.mapping_at(address).ok_or(BusFault {
            address,
            width,
            kind,
        })?;
        let offset = (address - mapping.start) as usize + mapping.local_base as usize;
        Ok((&mut self.regions[mapping.region.0], offset))
    }

    /// Reads one byte.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::BusFault`] for unmapped addresses and
    /// [`CoreError::Region`] for faults inside the owning region.
    pub fn read8(&mut self, address: u32) -> Result<u8, CoreError> {
        let (region, offset) = self.route(address, AccessWidth::Byte, AccessKind::Read)?;
        let value = region
            .read8(offset)
            .map_err(|fault| CoreError::Region { address, fault })?;
        self.open_bus = value;
        Ok(value)
    }

    /// Reads a little-endian half-word.
    ///
    /// # Errors
    ///
    /// See [`Bus::read8`].
    pub fn read16(&mut self, address: u32) -> Result<u16, CoreError> {
        let (region, offset) = self.route(address, AccessWidth::HalfWord, AccessKind::Read)?;
        let value = region
            .read16(offset)
            .map_err(|fault| CoreError::Region { address, fault })?;
        self.open_bus = value.to_le_bytes()[0];
        Ok(value)
    }

    /// Reads a little-endian word.
    ///
    /// # Errors
    ///
    /// See [`Bus::read8`].
    pub fn read32(&mut self, address: u32) -> Result<u32, CoreError> {
        let (region, offset) = self.route(address, AccessWidth::Word, AccessKind::Read)?;
        let value = region
            .read32(offset)
            .map_err(|fault| CoreError::Region { address, fault })?;
        self.open_bus = value.to_le_bytes()[0];
        Ok(value)
    }

    /// Writes one byte. Writes into read-only regions are discarded.
    ///
    /// # Errors
    ///
    /// See [`Bus::read8`].
    pub fn write8(&mut self, address: u32, value: u8) -> Result<(), CoreError> {
        let (region, offset) = self.route(address, AccessWidth::Byte, AccessKind::Write)?;
        region
            .write8(offset, value)
            .map_err(|fault| CoreError::Region { address, fault })
    }

    /// Writes a little-endian half-word.
    ///
    /// # Errors
    ///
    /// See [`Bus::read8`].
    pub fn write16(&mut self, address: u32, value: u16) -> Result<(), CoreError> {
        let (region, offset) = self.route(address, AccessWidth::HalfWord, AccessKind::Write)?;
        region
            .write16(offset, value)
            .map_err(|fault| CoreError::Region { address, fault })
    }

    /// Writes a little-endian word.
    ///
    /// # Errors
    ///
    /// See [`Bus::read8`].
    pub fn write32(&mut self, address: u32, value: u32) -> Result<(), CoreError> {
        let (region, offset) = self.route(address, AccessWidth::Word, AccessKind::Write)?;
        region
            .write32(offset, value)
            .map_err(|fault| CoreError::Region { address, fault })
    }
}

#[cfg(test)]
mod tests {
    use super::Bus;
    use crate::fault::{BusFault, ConfigurationError, CoreError, RegionFault};
    use crate::memory::{AccessKind, AccessWidth, MemoryRegion};

    fn two_region_bus() -> Bus {
        let mut bus = Bus::new();
        bus.map(0x1000, 0x100, MemoryRegion::new("A", 0x100), 0)
            .expect("first mapping");
        bus.map(0x1100, 0x100, MemoryRegion::new("B", 0x100), 0)
            .expect("adjacent mapping");
        bus
    }

    #[test]
    fn overlapping_mapping_is_rejected() {
        let mut bus = two_region_bus();
        let err = bus
            .map(0x10FF, 2, MemoryRegion::new("C", 2), 0)
            .expect_err("overlaps both");
        assert_eq!(
            err,
            ConfigurationError::Overlap {
                start: 0x10FF,
                end: 0x1100,
                existing_start: 0x1000,
                existing_end: 0x10FF,
            }
        );
        assert_eq!(bus.mappings().len(), 2);
    }

    #[test]
    fn empty_and_overflowing_ranges_are_rejected() {
        let mut bus = Bus::new();
        assert_eq!(
            bus.map(0, 0, MemoryRegion::new("Z", 1), 0),
            Err(ConfigurationError::EmptyRange { start: 0 })
        );
        assert_eq!(
            bus.map(0xFFFF_FFFF, 2, MemoryRegion::new("Z", 2), 0),
            Err(ConfigurationError::RangeOverflow {
                start: 0xFFFF_FFFF,
                size: 2,
            })
        );
    }

    #[test]
    fn window_larger_than_region_is_rejected() {
        let mut bus = Bus::new();
        let err = bus
            .map(0, 0x20, MemoryRegion::new("SMALL", 0x10), 0)
            .expect_err("window too big");
        assert!(matches!(err, ConfigurationError::WindowOutOfRegion { .. }));
    }

    #[test]
    fn unmapped_access_is_a_bus_fault() {
        let mut bus = two_region_bus();
        assert_eq!(
            bus.read8(0x0FFF),
            Err(CoreError::BusFault(BusFault {
                address: 0x0FFF,
                width: AccessWidth::Byte,
                kind: AccessKind::Read,
            }))
        );
        assert_eq!(
            bus.write32(0x1200, 1),
            Err(CoreError::BusFault(BusFault {
                address: 0x1200,
                width: AccessWidth::Word,
                kind: AccessKind::Write,
            }))
        );
    }

    #[test]
    fn access_straddling_regions_faults_inside_owner() {
        let mut bus = two_region_bus();
        bus.write8(0x1100, 0x77).expect("first byte of B");

        let err = bus.write16(0x10FF, 0xFFFF).expect_err("straddles A/B");
        assert_eq!(
            err,
            CoreError::Region {
                address: 0x10FF,
                fault: RegionFault::OutOfBounds {
                    offset: 0xFF,
                    width: AccessWidth::HalfWord,
                    size: 0x100,
                },
            }
        );
        assert_eq!(bus.read8(0x1100), Ok(0x77));
    }

    #[test]
    fn local_base_offsets_into_region() {
        let mut bus = Bus::new();
        let handle = bus
            .map(0x8000, 0x10, MemoryRegion::new("WIN", 0x20), 0x10)
            .expect("window fits");
        bus.write8(0x8000, 0xAB).expect("mapped");

        let region = bus.region(handle).and_then(|r| r.as_memory()).expect("memory");
        assert_eq!(region.as_slice()[0x10], 0xAB);
        assert_eq!(region.as_slice()[0x00], 0x00);
    }

    #[test]
    fn mirror_shares_backing_storage() {
        let mut bus = Bus::new();
        let wram = bus
            .map(0xC000, 0x2000, MemoryRegion::new("WRAM", 0x2000), 0)
            .expect("wram");
        bus.mirror(0xE000, 0x1E00, wram, 0).expect("echo");

        bus.write8(0xE123, 0x42).expect("echo write");
        assert_eq!(bus.read8(0xC123), Ok(0x42));
        assert_eq!(bus.mappings()[1].region, wram);
    }

    #[test]
    fn open_bus_tracks_low_byte_of_successful_reads() {
        let mut bus = two_region_bus();
        bus.write32(0x1000, 0xA1B2_C3D4).expect("mapped");

        assert_eq!(bus.open_bus(), 0);
        bus.read32(0x1000).expect("mapped");
        assert_eq!(bus.open_bus(), 0xD4);
        bus.read8(0x1002).expect("mapped");
        assert_eq!(bus.open_bus(), 0xB2);

        bus.read8(0x9999).expect_err("unmapped");
        assert_eq!(bus.open_bus(), 0xB2);
    }

    #[test]
    fn mappings_stay_sorted_regardless_of_registration_order() {
        let mut bus = Bus::new();
        bus.map(0x3000, 0x10, MemoryRegion::new("C", 0x10), 0).expect("c");
        bus.map(0x1000, 0x10, MemoryRegion::new("A", 0x10), 0).expect("a");
        bus.map(0x2000, 0x10, MemoryRegion::new("B", 0x10), 0).expect("b");

        let starts: Vec<u32> = bus.mappings().iter().map(|m| m.start).collect();
        assert_eq!(starts, vec![0x1000, 0x2000, 0x3000]);
        assert!(bus.mapping_at(0x2008).is_some());
        assert!(bus.mapping_at(0x2010).is_none());
    }
}
