//! Instruction semantics for both CPU profiles.
//!
//! Handlers mutate a working copy of the register file; the CPU commits it
//! only after the handler returns `Ok`.

/// Flag-producing arithmetic.
pub mod flags;
/// Narrow operand addressing and stack helpers.
pub mod helpers;
/// Narrow profile handlers.
pub mod narrow;
/// Wide profile handlers.
pub mod wide;

pub use wide::{execute, shift, Retired};
