//! Wide profile handlers for decoded 32-bit instructions.
//!
//! Handlers run with `PC` still addressing the executing instruction, so
//! `R15` operands read [`WideRegisters::visible_pc`]. The caller advances
//! `PC` only when the handler did not write it.

use crate::decoder::{DataOp, Operand2, ShiftAmount, ShiftKind, TransferOffset, WideOp};
use crate::execute::flags::add32;
use crate::fault::CoreError;
use crate::memory::Bus;
use crate::state::{StatusUpdate, WideRegisters, LR_INDEX, PC_INDEX};
use crate::timing::CycleCostKind;

/// Outcome of one executed wide instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Retired {
    /// Cycle cost.
    pub cycles: u32,
    /// `R15` was written and must not be advanced.
    pub pc_written: bool,
}

impl Retired {
    const fn new(kind: CycleCostKind, pc_written: bool) -> Self {
        Self {
            cycles: kind.cycles(),
            pc_written,
        }
    }
}

/// Executes a decoded operation whose condition already passed.
///
/// [`WideOp::Unsupported`] retires as a one-cycle no-op; dispatch policy is
/// the caller's concern.
///
/// # Errors
///
/// Propagates bus faults from load/store instructions.
pub fn execute(regs: &mut WideRegisters, bus: &mut Bus, op: WideOp) -> Result<Retired, CoreError> {
    match op {
        WideOp::Branch { link, offset } => Ok(branch(regs, link, offset)),
        WideOp::BranchExchange { rm } => Ok(branch_exchange(regs, rm)),
        WideOp::DataProcessing {
            op,
            set_flags,
            rn,
            rd,
            operand,
        } => Ok(data_processing(regs, op, set_flags, rn, rd, operand)),
        WideOp::SingleTransfer {
            load,
            byte,
            pre_index,
            up,
            write_back,
            rn,
            rd,
            offset,
        } => {
            let transfer = Transfer {
                byte,
                pre_index,
                up,
                write_back,
                rn,
                rd,
                offset,
            };
            if load {
                transfer.load(regs, bus)
            } else {
                transfer.store(regs, bus)
            }
        }
        WideOp::Unsupported { .. } => Ok(Retired::new(CycleCostKind::WideUnsupported, false)),
    }
}

fn branch(regs: &mut WideRegisters, link: bool, offset: i32) -> Retired {
    let target = regs.visible_pc().wrapping_add_signed(offset);
    if link {
        let next = regs.pc().wrapping_add(regs.mode().fetch_bytes());
        regs.set(LR_INDEX, next);
    }
    regs.set_pc(target);
    Retired::new(CycleCostKind::WideBranch, true)
}

fn branch_exchange(regs: &mut WideRegisters, rm: usize) -> Retired {
    let target = regs.operand(rm);
    regs.update_status(StatusUpdate::new().thumb(target & 1 != 0));
    regs.set_pc(target & !1);
    Retired::new(CycleCostKind::WideBranchExchange, true)
}

/// Barrel shifter: returns the shifted value and the carry-out.
///
/// `immediate` selects the five-bit encoding where an amount of zero means
/// LSR/ASR #32 and RRX; register amounts use the bottom byte as-is.
#[must_use]
pub const fn shift(value: u32, kind: ShiftKind, amount: u32, carry: bool, immediate: bool) -> (u32, bool) {
    const fn bit(value: u32, index: u32) -> bool {
        (value >> index) & 1 != 0
    }
    let sign = bit(value, 31);
    let fill = if sign { u32::MAX } else { 0 };

    if amount == 0 {
        return match (immediate, kind) {
            (false, _) | (true, ShiftKind::Lsl) => (value, carry),
            (true, ShiftKind::Lsr) => (0, sign),
            (true, ShiftKind::Asr) => (fill, sign),
            (true, ShiftKind::Ror) => ((value >> 1) | ((carry as u32) << 31), bit(value, 0)),
        };
    }

    match kind {
        ShiftKind::Lsl => {
            if amount < 32 {
                (value << amount, bit(value, 32 - amount))
            } else if amount == 32 {
                (0, bit(value, 0))
            } else {
                (0, false)
            }
        }
        ShiftKind::Lsr => {
            if amount < 32 {
                (value >> amount, bit(value, amount - 1))
            } else if amount == 32 {
                (0, sign)
            } else {
                (0, false)
            }
        }
        ShiftKind::Asr => {
            if amount < 32 {
                (((value as i32) >> amount) as u32, bit(value, amount - 1))
            } else {
                (fill, sign)
            }
        }
        ShiftKind::Ror => {
            let rotate = amount % 32;
            if rotate == 0 {
                (value, sign)
            } else {
                (value.rotate_right(rotate), bit(value, rotate - 1))
            }
        }
    }
}

/// Second operand value and shifter carry-out.
fn operand2(regs: &WideRegisters, operand: Operand2) -> (u32, bool) {
    let carry = regs.status().carry();
    match operand {
        Operand2::Immediate { imm8, rotate } => {
            let value = imm8.rotate_right(rotate);
            let carry_out = if rotate == 0 { carry } else { value >> 31 != 0 };
            (value, carry_out)
        }
        Operand2::Register { rm, shift: kind, amount } => {
            let value = regs.operand(rm);
            match amount {
                ShiftAmount::Immediate(amount) => shift(value, kind, amount, carry, true),
                ShiftAmount::Register(rs) => shift(value, kind, regs.operand(rs) & 0xFF, carry, false),
            }
        }
    }
}

fn data_processing(
    regs: &mut WideRegisters,
    op: DataOp,
    set_flags: bool,
    rn: usize,
    rd: usize,
    operand: Operand2,
) -> Retired {
    let lhs = regs.operand(rn);
    let (rhs, shifter_carry) = operand2(regs, operand);
    let carry = regs.status().carry();

    let (result, update) = if op.is_logical() {
        let result = match op {
            DataOp::And | DataOp::Tst => lhs & rhs,
            DataOp::Eor | DataOp::Teq => lhs ^ rhs,
            DataOp::Orr => lhs | rhs,
            DataOp::Bic => lhs & !rhs,
            DataOp::Mvn => !rhs,
            _ => rhs,
        };
        (result, StatusUpdate::from_result(result).carry(shifter_carry))
    } else {
        match op {
            DataOp::Sub | DataOp::Cmp => add32(lhs, !rhs, true),
            DataOp::Rsb => add32(rhs, !lhs, true),
            DataOp::Adc => add32(lhs, rhs, carry),
            DataOp::Sbc => add32(lhs, !rhs, carry),
            DataOp::Rsc => add32(rhs, !lhs, carry),
            _ => add32(lhs, rhs, false),
        }
    };

    if set_flags {
        regs.update_status(update);
    }
    let pc_written = !op.is_test() && rd == PC_INDEX;
    if !op.is_test() {
        regs.set(rd, result);
    }
    Retired::new(CycleCostKind::WideDataProcessing, pc_written)
}

struct Transfer {
    byte: bool,
    pre_index: bool,
    up: bool,
    write_back: bool,
    rn: usize,
    rd: usize,
    offset: TransferOffset,
}

impl Transfer {
    /// `(access address, address written back to Rn if any)`.
    fn addresses(&self, regs: &WideRegisters) -> (u32, Option<u32>) {
        let base = regs.operand(self.rn);
        let offset = match self.offset {
            TransferOffset::Immediate(offset) => offset,
            TransferOffset::Register { rm, shift: kind, amount } => {
                shift(regs.operand(rm), kind, amount, regs.status().carry(), true).0
            }
        };
        let offset_address = if self.up {
            base.wrapping_add(offset)
        } else {
            base.wrapping_sub(offset)
        };
        if self.pre_index {
            (offset_address, self.write_back.then_some(offset_address))
        } else {
            (base, Some(offset_address))
        }
    }

    fn load(&self, regs: &mut WideRegisters, bus: &mut Bus) -> Result<Retired, CoreError> {
        let (address, write_back) = self.addresses(regs);
        let value = if self.byte {
            u32::from(bus.read8(address)?)
        } else {
            // Misaligned word loads rotate the aligned word.
            bus.read32(address & !3)?.rotate_right((address & 3) * 8)
        };
        if let Some(updated) = write_back {
            regs.set(self.rn, updated);
        }
        regs.set(self.rd, value);
        Ok(Retired::new(CycleCostKind::WideLoad, self.rd == PC_INDEX))
    }

    fn store(&self, regs: &mut WideRegisters, bus: &mut Bus) -> Result<Retired, CoreError> {
        let (address, write_back) = self.addresses(regs);
        // A stored R15 is one fetch further along than an operand read.
        let value = if self.rd == PC_INDEX {
            regs.visible_pc().wrapping_add(regs.mode().fetch_bytes())
        } else {
            regs.operand(self.rd)
        };
        if self.byte {
            bus.write8(address, value.to_le_bytes()[0])?;
        } else {
            bus.write32(address & !3, value)?;
        }
        if let Some(updated) = write_back {
            regs.set(self.rn, updated);
        }
        Ok(Retired::new(CycleCostKind::WideStore, false))
    }
}
