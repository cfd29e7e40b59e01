use thiserror::Error;

use crate::memory::{AccessKind, AccessWidth};
use crate::state::InstructionMode;

/// Fault classes used for host policy decisions (halt, log, skip).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum FaultClass {
    /// Bus map rejected at setup.
    Configuration,
    /// Address outside every mapped range.
    Bus,
    /// Fault raised inside a mapped region.
    Region,
    /// Opcode missing or encoded field combination rejected.
    Decode,
    /// Instruction-width mode not supported by the core.
    Mode,
}

/// Invalid bus or I/O block configuration, only produced during setup.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Error)]
pub enum ConfigurationError {
    /// Mapping with zero length.
    #[error("mapping at {start:#010x} has zero size")]
    EmptyRange {
        /// Requested start address.
        start: u32,
    },
    /// Mapping end does not fit the 32-bit address space.
    #[error("mapping at {start:#010x} with size {size:#x} overflows the address space")]
    RangeOverflow {
        /// Requested start address.
        start: u32,
        /// Requested size in bytes.
        size: u32,
    },
    /// New range intersects an already mapped range.
    #[error(
        "mapping {start:#010x}..={end:#010x} overlaps existing {existing_start:#010x}..={existing_end:#010x}"
    )]
    Overlap {
        /// Requested inclusive start.
        start: u32,
        /// Requested inclusive end.
        end: u32,
        /// Inclusive start of the conflicting mapping.
        existing_start: u32,
        /// Inclusive end of the conflicting mapping.
        existing_end: u32,
    },
    /// `local_base + size` runs past the end of the target region.
    #[error("window {local_base:#x}+{size:#x} exceeds region '{region}' of {region_size:#x} bytes")]
    WindowOutOfRegion {
        /// Name of the target region.
        region: &'static str,
        /// Size of the target region in bytes.
        region_size: usize,
        /// Requested local base offset.
        local_base: u32,
        /// Requested window size.
        size: u32,
    },
    /// Handle does not name a region owned by this bus.
    #[error("unknown region handle {0}")]
    UnknownHandle(usize),
    /// I/O binding offset lies outside the register block.
    #[error("i/o binding at offset {offset:#x} outside block '{block}' of {size:#x} bytes")]
    BindingOutOfRange {
        /// Name of the register block.
        block: &'static str,
        /// Requested offset.
        offset: usize,
        /// Block size in bytes.
        size: usize,
    },
}

/// Access to an address that no mapping covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
#[error("bus fault: {kind} of {width} at unmapped address {address:#010x}")]
pub struct BusFault {
    /// Global address of the access.
    pub address: u32,
    /// Access granularity.
    pub width: AccessWidth,
    /// Read or write.
    pub kind: AccessKind,
}

/// Fault raised by a region while serving a routed access.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
pub enum RegionFault {
    /// Access runs past the end of the region.
    #[error("{width} access at local offset {offset:#x} runs past region end {size:#x}")]
    OutOfBounds {
        /// Local offset of the first byte.
        offset: usize,
        /// Access granularity.
        width: AccessWidth,
        /// Region size in bytes.
        size: usize,
    },
    /// No getter/setter bound at an I/O register offset.
    #[error("no i/o register bound for {kind} at offset {offset:#x}")]
    Unbound {
        /// Local offset of the unbound byte.
        offset: usize,
        /// Read or write.
        kind: AccessKind,
    },
}

/// Why the field-extraction decoder rejected a word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
pub enum DecodeReason {
    /// Instruction class recognised but not implemented by this core.
    #[error("unsupported instruction class: {0}")]
    UnsupportedClass(&'static str),
    /// Flag-setting data processing into R15 needs a banked status register.
    #[error("flag-setting write to r15 requires a saved status register")]
    StatusRestoreUnsupported,
    /// Transfer writes back into R15 as its base register.
    #[error("write-back into r15 base register")]
    WriteBackToPc,
    /// Register-specified shift amount sourced from R15.
    #[error("register-specified shift uses r15")]
    ShiftByPc,
}

/// Terminal fault for one `step()` call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    /// Invalid or overlapping bus mapping.
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
    /// Address outside every mapped range.
    #[error(transparent)]
    BusFault(#[from] BusFault),
    /// Fault raised inside the region that owns `address`.
    #[error("region fault at {address:#010x}: {fault}")]
    Region {
        /// Global address of the access.
        address: u32,
        /// Region-internal cause.
        fault: RegionFault,
    },
    /// No handler registered for an opcode (table dispatch).
    #[error("unimplemented instruction {opcode:#04x} at {pc:#06x}")]
    UnimplementedInstruction {
        /// Raw opcode byte.
        opcode: u8,
        /// Address the opcode was fetched from.
        pc: u32,
    },
    /// Encoded fields rejected (field-extraction dispatch).
    #[error("cannot decode {word:#010x} at {pc:#010x}: {reason}")]
    Decode {
        /// Raw instruction word.
        word: u32,
        /// Address the word was fetched from.
        pc: u32,
        /// Rejection cause.
        reason: DecodeReason,
    },
    /// Step attempted in an instruction-width mode the core does not run.
    #[error("{mode} mode is not supported (pc {pc:#010x})")]
    InvalidMode {
        /// Active mode.
        mode: InstructionMode,
        /// Program counter at the attempted step.
        pc: u32,
    },
}

impl CoreError {
    /// Returns the fault class for this error.
    #[must_use]
    pub const fn class(&self) -> FaultClass {
        match self {
            Self::Configuration(_) => FaultClass::Configuration,
            Self::BusFault(_) => FaultClass::Bus,
            Self::Region { .. } => FaultClass::Region,
            Self::UnimplementedInstruction { .. } | Self::Decode { .. } => FaultClass::Decode,
            Self::InvalidMode { .. } => FaultClass::Mode,
        }
    }

    /// Returns `true` for faults raised by the memory system.
    #[must_use]
    pub const fn is_memory_fault(&self) -> bool {
        matches!(self.class(), FaultClass::Bus | FaultClass::Region)
    }
}
