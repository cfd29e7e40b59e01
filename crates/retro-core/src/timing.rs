/// Instruction forms with fixed cycle costs.
///
/// Narrow costs are in clock cycles (four per machine cycle); wide costs are
/// in bus cycles. The core only reports these; accumulation belongs to the
/// host's [`CycleSink`](crate::CycleSink).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CycleCostKind {
    /// `NOP`, `HALT`, `STOP`, flag and accumulator-only instructions.
    NarrowSimple,
    /// Register-to-register move or ALU operation.
    NarrowRegister,
    /// ALU operation or move through `(HL)` or with an 8-bit immediate.
    NarrowIndirect,
    /// Indirect load/store through `BC`, `DE` or `HL±`.
    NarrowIndirectTransfer,
    /// 16-bit increment/decrement or `ADD HL,rr`.
    NarrowWideArithmetic,
    /// Read-modify-write of `(HL)` or `LD (HL),n8`.
    NarrowIndirectModify,
    /// `LD rr,n16`.
    NarrowLoadImmediate16,
    /// `LD (a16),SP`.
    NarrowStoreStackPointer,
    /// `LDH` in either direction.
    NarrowHighPage,
    /// `LD (a16),A` / `LD A,(a16)`.
    NarrowAbsolute,
    /// Relative jump, condition true.
    NarrowJumpRelativeTaken,
    /// Relative jump, condition false.
    NarrowJumpRelativeSkipped,
    /// Absolute jump, condition true.
    NarrowJumpTaken,
    /// Absolute jump, condition false.
    NarrowJumpSkipped,
    /// `JP HL`.
    NarrowJumpRegister,
    /// Call, condition true.
    NarrowCallTaken,
    /// Call, condition false.
    NarrowCallSkipped,
    /// Unconditional return.
    NarrowReturn,
    /// Conditional return, condition true.
    NarrowReturnTaken,
    /// Conditional return, condition false.
    NarrowReturnSkipped,
    /// `PUSH rr`.
    NarrowPush,
    /// `POP rr`.
    NarrowPop,
    /// Any wide instruction whose condition evaluated false.
    WideConditionFailed,
    /// `B` / `BL`.
    WideBranch,
    /// `BX`.
    WideBranchExchange,
    /// Data-processing group.
    WideDataProcessing,
    /// `LDR` / `LDRB`.
    WideLoad,
    /// `STR` / `STRB`.
    WideStore,
    /// Permissive no-op for an unsupported class.
    WideUnsupported,
}

impl CycleCostKind {
    /// Every cost kind.
    pub const ALL: [Self; 29] = [
        Self::NarrowSimple,
        Self::NarrowRegister,
        Self::NarrowIndirect,
        Self::NarrowIndirectTransfer,
        Self::NarrowWideArithmetic,
        Self::NarrowIndirectModify,
        Self::NarrowLoadImmediate16,
        Self::NarrowStoreStackPointer,
        Self::NarrowHighPage,
        Self::NarrowAbsolute,
        Self::NarrowJumpRelativeTaken,
        Self::NarrowJumpRelativeSkipped,
        Self::NarrowJumpTaken,
        Self::NarrowJumpSkipped,
        Self::NarrowJumpRegister,
        Self::NarrowCallTaken,
        Self::NarrowCallSkipped,
        Self::NarrowReturn,
        Self::NarrowReturnTaken,
        Self::NarrowReturnSkipped,
        Self::NarrowPush,
        Self::NarrowPop,
        Self::WideConditionFailed,
        Self::WideBranch,
        Self::WideBranchExchange,
        Self::WideDataProcessing,
        Self::WideLoad,
        Self::WideStore,
        Self::WideUnsupported,
    ];

    /// Fixed cost of this form.
    #[must_use]
    pub const fn cycles(self) -> u32 {
        match self {
            Self::NarrowSimple | Self::NarrowRegister | Self::NarrowJumpRegister => 4,
            Self::NarrowIndirect
            | Self::NarrowIndirectTransfer
            | Self::NarrowWideArithmetic
            | Self::NarrowJumpRelativeSkipped
            | Self::NarrowReturnSkipped => 8,
            Self::NarrowIndirectModify
            | Self::NarrowLoadImmediate16
            | Self::NarrowHighPage
            | Self::NarrowJumpRelativeTaken
            | Self::NarrowJumpSkipped
            | Self::NarrowCallSkipped
            | Self::NarrowPop => 12,
            Self::NarrowAbsolute
            | Self::NarrowJumpTaken
            | Self::NarrowReturn
            | Self::NarrowPush => 16,
            Self::NarrowStoreStackPointer | Self::NarrowReturnTaken => 20,
            Self::NarrowCallTaken => 24,
            Self::WideConditionFailed | Self::WideDataProcessing | Self::WideUnsupported => 1,
            Self::WideStore => 2,
            Self::WideBranch | Self::WideBranchExchange | Self::WideLoad => 3,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::CycleCostKind;

    #[test]
    fn all_lists_each_kind_once() {
        let kinds: HashSet<_> = CycleCostKind::ALL.iter().copied().collect();
        assert_eq!(kinds.len(), CycleCostKind::ALL.len());
    }

    #[test]
    fn narrow_costs_are_whole_machine_cycles() {
        for kind in CycleCostKind::ALL {
            if format!("{kind:?}").starts_with("Narrow") {
                assert_eq!(kind.cycles() % 4, 0, "{kind:?}");
            }
        }
    }

    #[test]
    fn canonical_costs() {
        assert_eq!(CycleCostKind::NarrowSimple.cycles(), 4);
        assert_eq!(CycleCostKind::NarrowLoadImmediate16.cycles(), 12);
        assert_eq!(CycleCostKind::NarrowStoreStackPointer.cycles(), 20);
        assert_eq!(CycleCostKind::NarrowCallTaken.cycles(), 24);
        assert_eq!(CycleCostKind::WideConditionFailed.cycles(), 1);
        assert_eq!(CycleCostKind::WideBranch.cycles(), 3);
        assert_eq!(CycleCostKind::WideStore.cycles(), 2);
    }
}
