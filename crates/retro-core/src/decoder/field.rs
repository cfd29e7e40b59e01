//! Field-extraction decoding for the wide profile's 32-bit instruction set.
//!
//! [`decode`] is a pure function of the instruction word. The condition
//! field is returned alongside the operation and is evaluated by the caller
//! before anything else happens.

use std::fmt;

use crate::fault::DecodeReason;
use crate::state::StatusRegister;

/// Condition field (bits 28..=31).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(missing_docs)]
pub enum Condition {
    Eq,
    Ne,
    Cs,
    Cc,
    Mi,
    Pl,
    Vs,
    Vc,
    Hi,
    Ls,
    Ge,
    Lt,
    Gt,
    Le,
    Al,
    /// Reserved code `0xF`, evaluated as [`Condition::Al`].
    Nv,
}

impl Condition {
    /// All codes in encoding order.
    pub const ALL: [Self; 16] = [
        Self::Eq,
        Self::Ne,
        Self::Cs,
        Self::Cc,
        Self::Mi,
        Self::Pl,
        Self::Vs,
        Self::Vc,
        Self::Hi,
        Self::Ls,
        Self::Ge,
        Self::Lt,
        Self::Gt,
        Self::Le,
        Self::Al,
        Self::Nv,
    ];

    /// Decodes the low four bits of `bits`.
    #[must_use]
    pub const fn from_u4(bits: u32) -> Self {
        Self::ALL[(bits & 0xF) as usize]
    }

    /// Evaluates the condition against the status flags.
    #[must_use]
    pub const fn evaluate(self, status: StatusRegister) -> bool {
        let n = status.negative();
        let z = status.zero();
        let c = status.carry();
        let v = status.overflow();
        match self {
            Self::Eq => z,
            Self::Ne => !z,
            Self::Cs => c,
            Self::Cc => !c,
            Self::Mi => n,
            Self::Pl => !n,
            Self::Vs => v,
            Self::Vc => !v,
            Self::Hi => c && !z,
            Self::Ls => !c || z,
            Self::Ge => n == v,
            Self::Lt => n != v,
            Self::Gt => !z && n == v,
            Self::Le => z || n != v,
            Self::Al | Self::Nv => true,
        }
    }
}

/// Data-processing opcode (bits 21..=24).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(missing_docs)]
pub enum DataOp {
    And,
    Eor,
    Sub,
    Rsb,
    Add,
    Adc,
    Sbc,
    Rsc,
    Tst,
    Teq,
    Cmp,
    Cmn,
    Orr,
    Mov,
    Bic,
    Mvn,
}

impl DataOp {
    const ALL: [Self; 16] = [
        Self::And,
        Self::Eor,
        Self::Sub,
        Self::Rsb,
        Self::Add,
        Self::Adc,
        Self::Sbc,
        Self::Rsc,
        Self::Tst,
        Self::Teq,
        Self::Cmp,
        Self::Cmn,
        Self::Orr,
        Self::Mov,
        Self::Bic,
        Self::Mvn,
    ];

    /// Decodes the low four bits of `bits`.
    #[must_use]
    pub const fn from_u4(bits: u32) -> Self {
        Self::ALL[(bits & 0xF) as usize]
    }

    /// Compare/test forms: flags only, `Rd` never written.
    #[must_use]
    pub const fn is_test(self) -> bool {
        matches!(self, Self::Tst | Self::Teq | Self::Cmp | Self::Cmn)
    }

    /// Logical forms: carry comes from the shifter, overflow is untouched.
    #[must_use]
    pub const fn is_logical(self) -> bool {
        matches!(
            self,
            Self::And | Self::Eor | Self::Tst | Self::Teq | Self::Orr | Self::Mov | Self::Bic | Self::Mvn
        )
    }
}

/// Barrel-shifter operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(missing_docs)]
pub enum ShiftKind {
    Lsl,
    Lsr,
    Asr,
    Ror,
}

impl ShiftKind {
    /// Decodes the low two bits of `bits`.
    #[must_use]
    pub const fn from_u2(bits: u32) -> Self {
        match bits & 0x3 {
            0 => Self::Lsl,
            1 => Self::Lsr,
            2 => Self::Asr,
            _ => Self::Ror,
        }
    }
}

/// Shift amount source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShiftAmount {
    /// Five-bit encoded amount; `0` carries the special LSR/ASR #32 and RRX meanings.
    Immediate(u32),
    /// Bottom byte of a register (never R15).
    Register(usize),
}

/// Second operand of a data-processing instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operand2 {
    /// `imm8` rotated right by `rotate` (an even amount `0..=30`).
    Immediate {
        /// Eight-bit immediate.
        imm8: u32,
        /// Right-rotate amount.
        rotate: u32,
    },
    /// Register passed through the barrel shifter.
    Register {
        /// Source register.
        rm: usize,
        /// Shift operation.
        shift: ShiftKind,
        /// Shift amount source.
        amount: ShiftAmount,
    },
}

impl Operand2 {
    /// Value of an immediate operand (true rotate), `None` for register forms.
    #[must_use]
    pub const fn immediate_value(self) -> Option<u32> {
        match self {
            Self::Immediate { imm8, rotate } => Some(imm8.rotate_right(rotate)),
            Self::Register { .. } => None,
        }
    }
}

/// Offset of a single data transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransferOffset {
    /// Twelve-bit unsigned immediate.
    Immediate(u32),
    /// Register shifted by an immediate amount.
    Register {
        /// Offset register.
        rm: usize,
        /// Shift operation.
        shift: ShiftKind,
        /// Five-bit encoded amount.
        amount: u32,
    },
}

/// Instruction classes recognised but not executed by this core.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(missing_docs)]
pub enum WideClass {
    Multiply,
    Swap,
    HalfwordTransfer,
    StatusTransfer,
    BlockTransfer,
    Coprocessor,
    SoftwareInterrupt,
    Undefined,
}

impl WideClass {
    /// Human-readable class name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Multiply => "multiply",
            Self::Swap => "single data swap",
            Self::HalfwordTransfer => "halfword transfer",
            Self::StatusTransfer => "status register transfer",
            Self::BlockTransfer => "block transfer",
            Self::Coprocessor => "coprocessor",
            Self::SoftwareInterrupt => "software interrupt",
            Self::Undefined => "undefined",
        }
    }
}

impl fmt::Display for WideClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Decoded operation, independent of its condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WideOp {
    /// `B` / `BL`.
    Branch {
        /// Store the return address in `R14`.
        link: bool,
        /// Sign-extended byte offset relative to the visible PC.
        offset: i32,
    },
    /// `BX Rm`.
    BranchExchange {
        /// Register holding the target.
        rm: usize,
    },
    /// Data-processing group.
    DataProcessing {
        /// Operation.
        op: DataOp,
        /// `S` bit.
        set_flags: bool,
        /// First operand register.
        rn: usize,
        /// Destination register.
        rd: usize,
        /// Second operand.
        operand: Operand2,
    },
    /// `LDR` / `STR` / `LDRB` / `STRB`.
    SingleTransfer {
        /// Load (`true`) or store.
        load: bool,
        /// Byte (`true`) or word access.
        byte: bool,
        /// Apply the offset before the access.
        pre_index: bool,
        /// Add (`true`) or subtract the offset.
        up: bool,
        /// Write the computed address back to `Rn` (pre-indexed forms).
        write_back: bool,
        /// Base register.
        rn: usize,
        /// Source/destination register.
        rd: usize,
        /// Offset.
        offset: TransferOffset,
    },
    /// Recognised class without an implementation.
    Unsupported {
        /// Which class.
        class: WideClass,
    },
}

/// Condition plus operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WideInstruction {
    /// Gate evaluated before execution.
    pub condition: Condition,
    /// Operation executed when the gate passes.
    pub op: WideOp,
}

const fn reg(word: u32, shift: u32) -> usize {
    ((word >> shift) & 0xF) as usize
}

const fn bit(word: u32, index: u32) -> bool {
    word & (1 << index) != 0
}

/// Decodes one 32-bit instruction word.
///
/// # Errors
///
/// Returns a [`DecodeReason`] for field combinations this core cannot
/// execute faithfully (flag-setting writes to `R15`, write-back into an
/// `R15` base, register shifts by `R15`).
pub const fn decode(word: u32) -> Result<WideInstruction, DecodeReason> {
    let condition = Condition::from_u4(word >> 28);
    let op = match decode_op(word) {
        Ok(op) => op,
        Err(reason) => return Err(reason),
    };
    Ok(WideInstruction { condition, op })
}

const fn decode_op(word: u32) -> Result<WideOp, DecodeReason> {
    if word & 0x0FFF_FFF0 == 0x012F_FF10 {
        return Ok(WideOp::BranchExchange { rm: reg(word, 0) });
    }

    match (word >> 25) & 0x7 {
        0b000 => {
            if word & 0x0FC0_00F0 == 0x0000_0090 || word & 0x0F80_00F0 == 0x0080_0090 {
                Ok(unsupported(WideClass::Multiply))
            } else if word & 0x0FB0_0FF0 == 0x0100_0090 {
                Ok(unsupported(WideClass::Swap))
            } else if word & 0x90 == 0x90 {
                Ok(unsupported(WideClass::HalfwordTransfer))
            } else {
                decode_data_processing(word)
            }
        }
        0b001 => decode_data_processing(word),
        0b010 => decode_transfer(word),
        0b011 => {
            if bit(word, 4) {
                Ok(unsupported(WideClass::Undefined))
            } else {
                decode_transfer(word)
            }
        }
        0b100 => Ok(unsupported(WideClass::BlockTransfer)),
        0b101 => Ok(WideOp::Branch {
            link: bit(word, 24),
            offset: ((word & 0x00FF_FFFF) << 8) as i32 >> 6,
        }),
        0b110 => Ok(unsupported(WideClass::Coprocessor)),
        _ => {
            if bit(word, 24) {
                Ok(unsupported(WideClass::SoftwareInterrupt))
            } else {
                Ok(unsupported(WideClass::Coprocessor))
            }
        }
    }
}

const fn unsupported(class: WideClass) -> WideOp {
    WideOp::Unsupported { class }
}

const fn decode_data_processing(word: u32) -> Result<WideOp, DecodeReason> {
    let op = DataOp::from_u4(word >> 21);
    let set_flags = bit(word, 20);
    if op.is_test() && !set_flags {
        return Ok(unsupported(WideClass::StatusTransfer));
    }

    let rd = reg(word, 12);
    if set_flags && rd == 15 {
        return Err(DecodeReason::StatusRestoreUnsupported);
    }

    let operand = if bit(word, 25) {
        Operand2::Immediate {
            imm8: word & 0xFF,
            rotate: ((word >> 8) & 0xF) * 2,
        }
    } else {
        let amount = if bit(word, 4) {
            let rs = reg(word, 8);
            if rs == 15 {
                return Err(DecodeReason::ShiftByPc);
            }
            ShiftAmount::Register(rs)
        } else {
            ShiftAmount::Immediate((word >> 7) & 0x1F)
        };
        Operand2::Register {
            rm: reg(word, 0),
            shift: ShiftKind::from_u2(word >> 5),
            amount,
        }
    };

    Ok(WideOp::DataProcessing {
        op,
        set_flags,
        rn: reg(word, 16),
        rd,
        operand,
    })
}

const fn decode_transfer(word: u32) -> Result<WideOp, DecodeReason> {
    let pre_index = bit(word, 24);
    let write_back = bit(word, 21);
    let rn = reg(word, 16);
    if rn == 15 && (write_back || !pre_index) {
        return Err(DecodeReason::WriteBackToPc);
    }

    let offset = if bit(word, 25) {
        TransferOffset::Register {
            rm: reg(word, 0),
            shift: ShiftKind::from_u2(word >> 5),
            amount: (word >> 7) & 0x1F,
        }
    } else {
        TransferOffset::Immediate(word & 0xFFF)
    };

    Ok(WideOp::SingleTransfer {
        load: bit(word, 20),
        byte: bit(word, 22),
        pre_index,
        up: bit(word, 23),
        write_back,
        rn,
        rd: reg(word, 12),
        offset,
    })
}

#[cfg(test)]
mod tests {
    use super::{
        decode, Condition, DataOp, Operand2, ShiftAmount, ShiftKind, TransferOffset, WideClass,
        WideOp,
    };
    use crate::fault::DecodeReason;

    #[test]
    fn branch_to_self_has_offset_minus_eight() {
        let instruction = decode(0xEAFF_FFFE).expect("branch");
        assert_eq!(instruction.condition, Condition::Al);
        assert_eq!(
            instruction.op,
            WideOp::Branch {
                link: false,
                offset: -8
            }
        );
    }

    #[test]
    fn branch_with_link_forward() {
        let instruction = decode(0x0B00_0010).expect("bleq");
        assert_eq!(instruction.condition, Condition::Eq);
        assert_eq!(
            instruction.op,
            WideOp::Branch {
                link: true,
                offset: 0x40
            }
        );
    }

    #[test]
    fn bx_is_recognised_before_data_processing() {
        let instruction = decode(0xE12F_FF13).expect("bx r3");
        assert_eq!(instruction.op, WideOp::BranchExchange { rm: 3 });
    }

    #[test]
    fn rotated_immediate_uses_true_rotate() {
        // MOV r0, #0xF000000F  (imm8 = 0xFF, rotate = 4)
        let instruction = decode(0xE3A0_02FF).expect("mov");
        let WideOp::DataProcessing {
            op, rd, operand, ..
        } = instruction.op
        else {
            panic!("expected data processing, got {:?}", instruction.op);
        };
        assert_eq!(op, DataOp::Mov);
        assert_eq!(rd, 0);
        assert_eq!(operand.immediate_value(), Some(0xF000_000F));
    }

    #[test]
    fn register_operand_with_shift() {
        // ADDS r1, r2, r3, LSL #4
        let instruction = decode(0xE092_1203).expect("adds");
        assert_eq!(
            instruction.op,
            WideOp::DataProcessing {
                op: DataOp::Add,
                set_flags: true,
                rn: 2,
                rd: 1,
                operand: Operand2::Register {
                    rm: 3,
                    shift: ShiftKind::Lsl,
                    amount: ShiftAmount::Immediate(4),
                },
            }
        );
    }

    #[test]
    fn malformed_combinations_are_rejected() {
        // MOVS pc, lr
        assert_eq!(
            decode(0xE1B0_F00E),
            Err(DecodeReason::StatusRestoreUnsupported)
        );
        // LDR r0, [pc], #4
        assert_eq!(decode(0xE49F_0004), Err(DecodeReason::WriteBackToPc));
        // MOV r0, r1, LSL pc
        assert_eq!(decode(0xE1A0_0F11), Err(DecodeReason::ShiftByPc));
    }

    #[test]
    fn single_transfer_fields() {
        // LDRB r2, [r3, #-5]!
        let instruction = decode(0xE573_2005).expect("ldrb");
        assert_eq!(
            instruction.op,
            WideOp::SingleTransfer {
                load: true,
                byte: true,
                pre_index: true,
                up: false,
                write_back: true,
                rn: 3,
                rd: 2,
                offset: TransferOffset::Immediate(5),
            }
        );
    }

    #[test]
    fn unsupported_classes() {
        let class = |word| match decode(word).map(|i| i.op) {
            Ok(WideOp::Unsupported { class }) => Some(class),
            _ => None,
        };
        assert_eq!(class(0xE002_0391), Some(WideClass::Multiply));
        assert_eq!(class(0xE1D0_00B0), Some(WideClass::HalfwordTransfer));
        assert_eq!(class(0xE10F_0000), Some(WideClass::StatusTransfer));
        assert_eq!(class(0xE8BD_0001), Some(WideClass::BlockTransfer));
        assert_eq!(class(0xEF00_0000), Some(WideClass::SoftwareInterrupt));
        assert_eq!(class(0xE600_0010), Some(WideClass::Undefined));
        assert_eq!(class(0xEE00_0000), Some(WideClass::Coprocessor));
    }
}
