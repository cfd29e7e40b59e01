//! Operand access shared by the narrow handlers.

use crate::fault::CoreError;
use crate::memory::Bus;
use crate::state::{NarrowFlags, NarrowRegisters, Reg16, Reg8};

/// 8-bit operand selected by a 3-bit field (`B C D E H L (HL) A`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operand8 {
    /// Register operand.
    Reg(Reg8),
    /// Byte addressed by `HL`.
    IndirectHl,
}

impl Operand8 {
    /// Decodes the low three bits of `bits`.
    #[must_use]
    pub const fn from_u3(bits: u8) -> Self {
        match bits & 0x07 {
            0 => Self::Reg(Reg8::B),
            1 => Self::Reg(Reg8::C),
            2 => Self::Reg(Reg8::D),
            3 => Self::Reg(Reg8::E),
            4 => Self::Reg(Reg8::H),
            5 => Self::Reg(Reg8::L),
            6 => Self::IndirectHl,
            _ => Self::Reg(Reg8::A),
        }
    }

    /// Returns `true` when the operand goes through the bus.
    #[must_use]
    pub const fn is_memory(self) -> bool {
        matches!(self, Self::IndirectHl)
    }
}

/// 16-bit operand selected by a 2-bit field, with `SP` in slot 3.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operand16 {
    /// Register pair.
    Pair(Reg16),
    /// Stack pointer.
    Sp,
}

impl Operand16 {
    /// Decodes the low two bits of `bits` (`BC DE HL SP`).
    #[must_use]
    pub const fn from_u2(bits: u8) -> Self {
        match bits & 0x03 {
            0 => Self::Pair(Reg16::BC),
            1 => Self::Pair(Reg16::DE),
            2 => Self::Pair(Reg16::HL),
            _ => Self::Sp,
        }
    }

    /// Current value.
    #[must_use]
    pub const fn get(self, regs: &NarrowRegisters) -> u16 {
        match self {
            Self::Pair(pair) => regs.pair(pair),
            Self::Sp => regs.sp(),
        }
    }

    /// Stores `value`.
    pub const fn set(self, regs: &mut NarrowRegisters, value: u16) {
        match self {
            Self::Pair(pair) => regs.set_pair(pair, value),
            Self::Sp => regs.set_sp(value),
        }
    }
}

/// Stack pair selected by a 2-bit field (`BC DE HL AF`).
#[must_use]
pub const fn stack_pair(bits: u8) -> Reg16 {
    match bits & 0x03 {
        0 => Reg16::BC,
        1 => Reg16::DE,
        2 => Reg16::HL,
        _ => Reg16::AF,
    }
}

/// Branch condition selected by a 2-bit field (`NZ Z NC C`).
#[must_use]
pub const fn condition_holds(bits: u8, flags: NarrowFlags) -> bool {
    match bits & 0x03 {
        0 => !flags.zero(),
        1 => flags.zero(),
        2 => !flags.carry(),
        _ => flags.carry(),
    }
}

/// Reads an 8-bit operand.
///
/// # Errors
///
/// Propagates bus faults for `(HL)`.
pub fn read8(regs: &NarrowRegisters, bus: &mut Bus, operand: Operand8) -> Result<u8, CoreError> {
    match operand {
        Operand8::Reg(reg) => Ok(regs.get(reg)),
        Operand8::IndirectHl => bus.read8(u32::from(regs.pair(Reg16::HL))),
    }
}

/// Writes an 8-bit operand.
///
/// # Errors
///
/// Propagates bus faults for `(HL)`.
pub fn write8(
    regs: &mut NarrowRegisters,
    bus: &mut Bus,
    operand: Operand8,
    value: u8,
) -> Result<(), CoreError> {
    match operand {
        Operand8::Reg(reg) => {
            regs.set(reg, value);
            Ok(())
        }
        Operand8::IndirectHl => bus.write8(u32::from(regs.pair(Reg16::HL)), value),
    }
}

/// Reads the byte at `PC` and advances `PC`.
///
/// # Errors
///
/// Propagates bus faults.
pub fn fetch8(regs: &mut NarrowRegisters, bus: &mut Bus) -> Result<u8, CoreError> {
    let value = bus.read8(u32::from(regs.pc()))?;
    regs.set_pc(regs.pc().wrapping_add(1));
    Ok(value)
}

/// Reads a little-endian immediate at `PC` and advances `PC` by two.
///
/// # Errors
///
/// Propagates bus faults.
pub fn fetch16(regs: &mut NarrowRegisters, bus: &mut Bus) -> Result<u16, CoreError> {
    let low = fetch8(regs, bus)?;
    let high = fetch8(regs, bus)?;
    Ok(u16::from_le_bytes([low, high]))
}

/// Pushes `value` high byte first, leaving `SP` on the low byte.
///
/// # Errors
///
/// Propagates bus faults.
pub fn push16(regs: &mut NarrowRegisters, bus: &mut Bus, value: u16) -> Result<(), CoreError> {
    let [low, high] = value.to_le_bytes();
    let sp = regs.sp().wrapping_sub(1);
    bus.write8(u32::from(sp), high)?;
    let sp = sp.wrapping_sub(1);
    bus.write8(u32::from(sp), low)?;
    regs.set_sp(sp);
    Ok(())
}

/// Pops a 16-bit value pushed by [`push16`].
///
/// # Errors
///
/// Propagates bus faults.
pub fn pop16(regs: &mut NarrowRegisters, bus: &mut Bus) -> Result<u16, CoreError> {
    let sp = regs.sp();
    let low = bus.read8(u32::from(sp))?;
    let high = bus.read8(u32::from(sp.wrapping_add(1)))?;
    regs.set_sp(sp.wrapping_add(2));
    Ok(u16::from_le_bytes([low, high]))
}
