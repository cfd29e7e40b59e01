//! Instruction-execution core and memory bus for retro console emulation.
//!
//! Two CPU profiles share one bus model: a narrow 8-bit core dispatching
//! through an opcode table and a wide 32-bit core decoding fixed fields of
//! each instruction word. A [`Machine`] pairs a CPU with its [`Bus`] and
//! reports cycle costs and trace events to host-provided sinks.

/// Host-facing configuration, sinks and run outcomes.
pub mod api;
pub use api::{
    CoreConfig, CpuProfile, CycleCounter, CycleSink, DispatchPolicy, DispatchShape, LoopDetection,
    ProfileDescriptor, RunOutcome, StopReason, TraceEvent, TraceSink,
};

/// Cartridge images and ROM mounting.
pub mod cartridge;
pub use cartridge::{Cartridge, CartridgeError, HeaderLayout};

/// CPU cores and the machine driving them.
pub mod cpu;
pub use cpu::{Cpu, Machine, NarrowCpu, WideCpu};

/// Opcode table and field-extraction decoding.
pub mod decoder;
pub use decoder::{decode, Condition, InstructionDef, OpcodeTable, WideInstruction, WideOp};

/// Instruction semantics.
pub mod execute;

/// Fault taxonomy.
pub mod fault;
pub use fault::{BusFault, ConfigurationError, CoreError, DecodeReason, FaultClass, RegionFault};

/// Regions, bus routing and fixed address maps.
pub mod memory;
pub use memory::{
    AccessKind, AccessWidth, Bus, IoRegisterBlock, MappedRegion, MemoryRegion, NarrowMemoryMap,
    Region, RegionHandle, WideMemoryMap,
};

/// Architectural register state.
pub mod state;
pub use state::{
    InstructionMode, NarrowFlags, NarrowRegisters, Reg16, Reg8, RunState, StatusRegister,
    WideRegisters,
};

/// Fixed instruction cycle costs.
pub mod timing;
pub use timing::CycleCostKind;

#[cfg(test)]
use proptest as _;
#[cfg(test)]
use rstest as _;
