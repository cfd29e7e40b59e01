//! Memory model: regions, the routing bus and the fixed console address maps.

use std::fmt;

/// Address-routing bus and open-bus tracking.
pub mod bus;
/// Fixed address maps for both CPU profiles.
pub mod map;
/// Region capability trait and its closed set of variants.
pub mod region;

pub use bus::{Bus, Mapping, RegionHandle};
pub use map::{NarrowMemoryMap, WideMemoryMap};
pub use region::{IoGetter, IoRegisterBlock, IoSetter, MappedRegion, MemoryRegion, Region};

/// Granularity of a single bus access.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum AccessWidth {
    /// 8-bit access.
    Byte,
    /// 16-bit access.
    HalfWord,
    /// 32-bit access.
    Word,
}

impl AccessWidth {
    /// Number of bytes touched by this access.
    #[must_use]
    pub const fn bytes(self) -> usize {
        match self {
            Self::Byte => 1,
            Self::HalfWord => 2,
            Self::Word => 4,
        }
    }

    /// Mask selecting the bits carried by this access.
    #[must_use]
    pub const fn mask(self) -> u32 {
        match self {
            Self::Byte => 0xFF,
            Self::HalfWord => 0xFFFF,
            Self::Word => u32::MAX,
        }
    }
}

impl fmt::Display for AccessWidth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Byte => f.write_str("8-bit"),
            Self::HalfWord => f.write_str("16-bit"),
            Self::Word => f.write_str("32-bit"),
        }
    }
}

/// Direction of a bus access.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum AccessKind {
    /// Load from the address space.
    Read,
    /// Store into the address space.
    Write,
}

impl fmt::Display for AccessKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Read => f.write_str("read"),
            Self::Write => f.write_str("write"),
        }
    }
}
