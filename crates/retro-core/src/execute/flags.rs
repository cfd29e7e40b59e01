//! Arithmetic with flag results for both profiles.
//!
//! Each helper returns the masked result together with the named flag update
//! it implies; callers decide which of the fields they commit. Carries are
//! computed on the unmasked sum, zero on the masked result.

use crate::state::{NarrowFlagsUpdate, StatusUpdate};

/// `a + b + carry_in` on 8 bits: sets `Z N H C`.
#[must_use]
pub const fn add8(a: u8, b: u8, carry_in: bool) -> (u8, NarrowFlagsUpdate) {
    let carry = carry_in as u16;
    let full = a as u16 + b as u16 + carry;
    let half = (a & 0x0F) as u16 + (b & 0x0F) as u16 + carry > 0x0F;
    let result = (full & 0xFF) as u8;
    let update = NarrowFlagsUpdate::new()
        .zero(result == 0)
        .subtract(false)
        .half_carry(half)
        .carry(full > 0xFF);
    (result, update)
}

/// `a - b - borrow_in` on 8 bits: sets `Z N H C`.
#[must_use]
pub const fn sub8(a: u8, b: u8, borrow_in: bool) -> (u8, NarrowFlagsUpdate) {
    let borrow = borrow_in as u16;
    let half = ((a & 0x0F) as u16) < (b & 0x0F) as u16 + borrow;
    let carry = (a as u16) < b as u16 + borrow;
    let result = a.wrapping_sub(b).wrapping_sub(borrow_in as u8);
    let update = NarrowFlagsUpdate::new()
        .zero(result == 0)
        .subtract(true)
        .half_carry(half)
        .carry(carry);
    (result, update)
}

/// 8-bit increment: sets `Z N H`, leaves `C`.
#[must_use]
pub const fn inc8(value: u8) -> (u8, NarrowFlagsUpdate) {
    let result = value.wrapping_add(1);
    let update = NarrowFlagsUpdate::new()
        .zero(result == 0)
        .subtract(false)
        .half_carry(value & 0x0F == 0x0F);
    (result, update)
}

/// 8-bit decrement: sets `Z N H`, leaves `C`.
#[must_use]
pub const fn dec8(value: u8) -> (u8, NarrowFlagsUpdate) {
    let result = value.wrapping_sub(1);
    let update = NarrowFlagsUpdate::new()
        .zero(result == 0)
        .subtract(true)
        .half_carry(value & 0x0F == 0);
    (result, update)
}

/// 16-bit `ADD HL,rr`: carries out of bit 11 and bit 15; `Z` untouched.
#[must_use]
pub const fn add16(a: u16, b: u16) -> (u16, NarrowFlagsUpdate) {
    let half = (a & 0x0FFF) + (b & 0x0FFF) > 0x0FFF;
    let (result, carry) = a.overflowing_add(b);
    let update = NarrowFlagsUpdate::new()
        .subtract(false)
        .half_carry(half)
        .carry(carry);
    (result, update)
}

/// Bitwise result flags: `Z` from the result, `N C` clear, `H` as given.
#[must_use]
pub const fn logic8(result: u8, half_carry: bool) -> NarrowFlagsUpdate {
    NarrowFlagsUpdate::new()
        .zero(result == 0)
        .subtract(false)
        .half_carry(half_carry)
        .carry(false)
}

/// `a + b + carry_in` on 32 bits: sets `N Z C V`.
///
/// Subtraction is `add32(a, !b, true)`; with-carry forms pass the current `C`.
#[must_use]
pub const fn add32(a: u32, b: u32, carry_in: bool) -> (u32, StatusUpdate) {
    let wide = a as u64 + b as u64 + carry_in as u64;
    let result = wide as u32;
    let overflow = ((a ^ result) & (b ^ result)) >> 31 != 0;
    let update = StatusUpdate::from_result(result)
        .carry(wide > u32::MAX as u64)
        .overflow(overflow);
    (result, update)
}

#[cfg(test)]
mod tests {
    use super::{add16, add32, add8, dec8, inc8, sub8};
    use crate::state::NarrowFlagsUpdate;

    #[test]
    fn add8_half_carry_is_computed_before_masking() {
        let (result, flags) = add8(0x0F, 0x01, false);
        assert_eq!(result, 0x10);
        assert_eq!(flags.zero, Some(false));
        assert_eq!(flags.half_carry, Some(true));
        assert_eq!(flags.carry, Some(false));

        let (result, flags) = add8(0xFF, 0x01, false);
        assert_eq!(result, 0x00);
        assert_eq!(flags.zero, Some(true));
        assert_eq!(flags.half_carry, Some(true));
        assert_eq!(flags.carry, Some(true));
    }

    #[test]
    fn sub8_borrows() {
        let (result, flags) = sub8(0x10, 0x01, false);
        assert_eq!(result, 0x0F);
        assert_eq!(flags.half_carry, Some(true));
        assert_eq!(flags.carry, Some(false));
        assert_eq!(flags.subtract, Some(true));

        let (result, flags) = sub8(0x00, 0x00, true);
        assert_eq!(result, 0xFF);
        assert_eq!(flags.carry, Some(true));
    }

    #[test]
    fn inc_dec_leave_carry_alone() {
        let (result, flags) = inc8(0xFF);
        assert_eq!(result, 0);
        assert_eq!(flags.carry, None);
        assert_eq!(flags.half_carry, Some(true));

        let (result, flags) = dec8(0x10);
        assert_eq!(result, 0x0F);
        assert_eq!(flags.half_carry, Some(true));
        assert_eq!(flags.carry, None);

        let (_, flags) = dec8(0x11);
        assert_eq!(flags.half_carry, Some(false));
    }

    #[test]
    fn add16_uses_bit_11_and_bit_15() {
        let (result, flags) = add16(0x0FFF, 0x0001);
        assert_eq!(result, 0x1000);
        assert_eq!(
            flags,
            NarrowFlagsUpdate::new()
                .subtract(false)
                .half_carry(true)
                .carry(false)
        );

        let (result, flags) = add16(0xFFFF, 0x0001);
        assert_eq!(result, 0);
        assert_eq!(flags.carry, Some(true));
        assert_eq!(flags.zero, None);
    }

    #[test]
    fn add32_reports_carry_and_signed_overflow() {
        let (result, flags) = add32(0x7FFF_FFFF, 1, false);
        assert_eq!(result, 0x8000_0000);
        assert_eq!(flags.overflow, Some(true));
        assert_eq!(flags.carry, Some(false));
        assert_eq!(flags.negative, Some(true));

        let (result, flags) = add32(5, !5, true);
        assert_eq!(result, 0);
        assert_eq!(flags.zero, Some(true));
        assert_eq!(flags.carry, Some(true));
        assert_eq!(flags.overflow, Some(false));

        let (_, flags) = add32(3, !5, true);
        assert_eq!(flags.carry, Some(false));
    }
}
