//! Architectural CPU state for both profiles.

/// Register files and typed register identifiers.
pub mod registers;
/// Narrow profile halt/stop state.
pub mod run_state;
/// Status words and named partial updates.
pub mod status;

pub use registers::{
    NarrowRegisters, Reg16, Reg8, WideRegisters, LR_INDEX, NARROW_REGISTER_COUNT, PC_INDEX,
    SP_INDEX, WIDE_REGISTER_COUNT,
};
pub use run_state::RunState;
pub use status::{InstructionMode, NarrowFlags, NarrowFlagsUpdate, StatusRegister, StatusUpdate};
