//! Status words and their partial-update records.
//!
//! Flag updates name every flag they change; a `None` field leaves the
//! corresponding bit untouched, and bits without a name are never read or
//! written by the core.

use std::fmt;

/// Narrow profile `F` bit for a zero result.
pub const NARROW_FLAG_Z: u8 = 1 << 7;
/// Narrow profile `F` bit for a subtraction.
pub const NARROW_FLAG_N: u8 = 1 << 6;
/// Narrow profile `F` bit for a carry out of bit 3 (or borrow into bit 4).
pub const NARROW_FLAG_H: u8 = 1 << 5;
/// Narrow profile `F` bit for carry/borrow out of the operand width.
pub const NARROW_FLAG_C: u8 = 1 << 4;

/// Wide profile status bit for a negative result.
pub const STATUS_N: u32 = 1 << 31;
/// Wide profile status bit for a zero result.
pub const STATUS_Z: u32 = 1 << 30;
/// Wide profile status bit for carry / not-borrow.
pub const STATUS_C: u32 = 1 << 29;
/// Wide profile status bit for signed overflow.
pub const STATUS_V: u32 = 1 << 28;
/// Wide profile status bit selecting the 16-bit instruction set.
pub const STATUS_T: u32 = 1 << 5;
/// Wide profile processor-mode field.
pub const STATUS_MODE_MASK: u32 = 0x1F;
/// Wide profile status value after reset (mode `0x10`, 32-bit instructions, flags clear).
pub const STATUS_RESET: u32 = 0x0000_0010;

const fn assign8(bits: u8, mask: u8, value: Option<bool>) -> u8 {
    match value {
        Some(true) => bits | mask,
        Some(false) => bits & !mask,
        None => bits,
    }
}

const fn assign32(bits: u32, mask: u32, value: Option<bool>) -> u32 {
    match value {
        Some(true) => bits | mask,
        Some(false) => bits & !mask,
        None => bits,
    }
}

/// Narrow profile flag register (`F`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct NarrowFlags(u8);

impl NarrowFlags {
    /// Wraps a raw `F` value; reserved low bits are kept verbatim.
    #[must_use]
    pub const fn from_bits(bits: u8) -> Self {
        Self(bits)
    }

    /// Raw `F` value.
    #[must_use]
    pub const fn bits(self) -> u8 {
        self.0
    }

    /// `Z`: last result was zero.
    #[must_use]
    pub const fn zero(self) -> bool {
        self.0 & NARROW_FLAG_Z != 0
    }

    /// `N`: last arithmetic operation was a subtraction.
    #[must_use]
    pub const fn subtract(self) -> bool {
        self.0 & NARROW_FLAG_N != 0
    }

    /// `H`: nibble carry/borrow.
    #[must_use]
    pub const fn half_carry(self) -> bool {
        self.0 & NARROW_FLAG_H != 0
    }

    /// `C`: carry/borrow out of the operand width.
    #[must_use]
    pub const fn carry(self) -> bool {
        self.0 & NARROW_FLAG_C != 0
    }

    /// Applies a partial update, leaving unnamed bits unchanged.
    #[must_use]
    pub const fn apply(self, update: NarrowFlagsUpdate) -> Self {
        let mut bits = self.0;
        bits = assign8(bits, NARROW_FLAG_Z, update.zero);
        bits = assign8(bits, NARROW_FLAG_N, update.subtract);
        bits = assign8(bits, NARROW_FLAG_H, update.half_carry);
        bits = assign8(bits, NARROW_FLAG_C, update.carry);
        Self(bits)
    }
}

/// Partial update of [`NarrowFlags`]; `None` keeps the current bit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct NarrowFlagsUpdate {
    /// New `Z` value.
    pub zero: Option<bool>,
    /// New `N` value.
    pub subtract: Option<bool>,
    /// New `H` value.
    pub half_carry: Option<bool>,
    /// New `C` value.
    pub carry: Option<bool>,
}

impl NarrowFlagsUpdate {
    /// Update that changes nothing.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            zero: None,
            subtract: None,
            half_carry: None,
            carry: None,
        }
    }

    /// Sets `Z`.
    #[must_use]
    pub const fn zero(mut self, value: bool) -> Self {
        self.zero = Some(value);
        self
    }

    /// Sets `N`.
    #[must_use]
    pub const fn subtract(mut self, value: bool) -> Self {
        self.subtract = Some(value);
        self
    }

    /// Sets `H`.
    #[must_use]
    pub const fn half_carry(mut self, value: bool) -> Self {
        self.half_carry = Some(value);
        self
    }

    /// Sets `C`.
    #[must_use]
    pub const fn carry(mut self, value: bool) -> Self {
        self.carry = Some(value);
        self
    }
}

/// Instruction-width mode selected by the wide status `T` bit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum InstructionMode {
    /// Fixed 32-bit instructions.
    Arm,
    /// Compressed 16-bit instructions.
    Thumb,
}

impl InstructionMode {
    /// Instruction fetch granularity in bytes.
    #[must_use]
    pub const fn fetch_bytes(self) -> u32 {
        match self {
            Self::Arm => 4,
            Self::Thumb => 2,
        }
    }

    /// Distance between the executing instruction and the PC value it observes.
    #[must_use]
    pub const fn pipeline_offset(self) -> u32 {
        self.fetch_bytes() * 2
    }

    /// Mask that aligns an address to the fetch granularity.
    #[must_use]
    pub const fn alignment_mask(self) -> u32 {
        !(self.fetch_bytes() - 1)
    }
}

impl fmt::Display for InstructionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Arm => f.write_str("arm"),
            Self::Thumb => f.write_str("thumb"),
        }
    }
}

/// Wide profile program status register.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct StatusRegister(u32);

impl Default for StatusRegister {
    fn default() -> Self {
        Self(STATUS_RESET)
    }
}

impl StatusRegister {
    /// Wraps a raw status value.
    #[must_use]
    pub const fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    /// Raw status value.
    #[must_use]
    pub const fn bits(self) -> u32 {
        self.0
    }

    /// `N` flag.
    #[must_use]
    pub const fn negative(self) -> bool {
        self.0 & STATUS_N != 0
    }

    /// `Z` flag.
    #[must_use]
    pub const fn zero(self) -> bool {
        self.0 & STATUS_Z != 0
    }

    /// `C` flag.
    #[must_use]
    pub const fn carry(self) -> bool {
        self.0 & STATUS_C != 0
    }

    /// `V` flag.
    #[must_use]
    pub const fn overflow(self) -> bool {
        self.0 & STATUS_V != 0
    }

    /// `T` flag.
    #[must_use]
    pub const fn thumb(self) -> bool {
        self.0 & STATUS_T != 0
    }

    /// Processor-mode field (bits 0..=4).
    #[must_use]
    pub const fn mode_bits(self) -> u32 {
        self.0 & STATUS_MODE_MASK
    }

    /// Active instruction-width mode.
    #[must_use]
    pub const fn instruction_mode(self) -> InstructionMode {
        if self.thumb() {
            InstructionMode::Thumb
        } else {
            InstructionMode::Arm
        }
    }

    /// Applies a partial update, leaving unnamed bits unchanged.
    #[must_use]
    pub const fn apply(self, update: StatusUpdate) -> Self {
        let mut bits = self.0;
        bits = assign32(bits, STATUS_N, update.negative);
        bits = assign32(bits, STATUS_Z, update.zero);
        bits = assign32(bits, STATUS_C, update.carry);
        bits = assign32(bits, STATUS_V, update.overflow);
        bits = assign32(bits, STATUS_T, update.thumb);
        Self(bits)
    }
}

/// Partial update of [`StatusRegister`]; `None` keeps the current bit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct StatusUpdate {
    /// New `N` value.
    pub negative: Option<bool>,
    /// New `Z` value.
    pub zero: Option<bool>,
    /// New `C` value.
    pub carry: Option<bool>,
    /// New `V` value.
    pub overflow: Option<bool>,
    /// New `T` value.
    pub thumb: Option<bool>,
}

impl StatusUpdate {
    /// Update that changes nothing.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            negative: None,
            zero: None,
            carry: None,
            overflow: None,
            thumb: None,
        }
    }

    /// Sets `N`.
    #[must_use]
    pub const fn negative(mut self, value: bool) -> Self {
        self.negative = Some(value);
        self
    }

    /// Sets `Z`.
    #[must_use]
    pub const fn zero(mut self, value: bool) -> Self {
        self.zero = Some(value);
        self
    }

    /// Sets `C`.
    #[must_use]
    pub const fn carry(mut self, value: bool) -> Self {
        self.carry = Some(value);
        self
    }

    /// Sets `V`.
    #[must_use]
    pub const fn overflow(mut self, value: bool) -> Self {
        self.overflow = Some(value);
        self
    }

    /// Sets `T`.
    #[must_use]
    pub const fn thumb(mut self, value: bool) -> Self {
        self.thumb = Some(value);
        self
    }

    /// `N` and `Z` from a 32-bit result.
    #[must_use]
    pub const fn from_result(result: u32) -> Self {
        Self::new().negative(result & STATUS_N != 0).zero(result == 0)
    }
}
