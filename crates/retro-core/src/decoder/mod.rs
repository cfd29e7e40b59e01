//! Instruction decoding for both CPU profiles.
//!
//! The narrow profile dispatches through an [`OpcodeTable`] owned by each CPU
//! instance. The wide profile extracts fields from the instruction word with
//! [`decode`] and never consults a table.

/// Field-extraction decoding of 32-bit instruction words.
pub mod field;
/// Opcode table for table dispatch.
pub mod table;

pub use field::{
    decode, Condition, DataOp, Operand2, ShiftAmount, ShiftKind, TransferOffset, WideClass,
    WideInstruction, WideOp,
};
pub use table::{InstructionDef, NarrowHandler, OpcodeTable};
