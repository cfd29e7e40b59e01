//! Host-facing configuration, collaborator traits and run outcomes.

use crate::fault::FaultClass;

/// CPU profile: register width, fetch granularity and dispatch shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum CpuProfile {
    /// 8-bit registers, 16-bit address space, table dispatch.
    Narrow,
    /// 32-bit registers, 32-bit address space, conditional field extraction.
    Wide,
}

/// How a profile turns fetched bytes into a handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum DispatchShape {
    /// 256-entry table keyed by the opcode byte.
    Table,
    /// Condition gate plus group-select bits of a 32-bit word.
    FieldExtraction,
}

/// Static parameters of a [`CpuProfile`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct ProfileDescriptor {
    /// Width of a general-purpose register in bits.
    pub register_bits: u32,
    /// Number of general-purpose registers (PC excluded for the narrow profile).
    pub register_count: usize,
    /// Bytes fetched for the opcode (immediates excluded).
    pub fetch_bytes: u32,
    /// Width of the address bus in bits.
    pub address_bits: u32,
    /// Dispatch shape.
    pub dispatch: DispatchShape,
}

impl CpuProfile {
    /// Parameters for this profile.
    #[must_use]
    pub const fn descriptor(self) -> ProfileDescriptor {
        match self {
            Self::Narrow => ProfileDescriptor {
                register_bits: 8,
                register_count: crate::state::NARROW_REGISTER_COUNT,
                fetch_bytes: 1,
                address_bits: 16,
                dispatch: DispatchShape::Table,
            },
            Self::Wide => ProfileDescriptor {
                register_bits: 32,
                register_count: crate::state::WIDE_REGISTER_COUNT,
                fetch_bytes: 4,
                address_bits: 32,
                dispatch: DispatchShape::FieldExtraction,
            },
        }
    }
}

/// Handling of recognised-but-unimplemented wide instruction classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum DispatchPolicy {
    /// Fail the step with [`CoreError::Decode`](crate::CoreError::Decode).
    Strict,
    /// Log a warning and retire a one-cycle no-op.
    Permissive,
}

impl Default for DispatchPolicy {
    fn default() -> Self {
        if cfg!(debug_assertions) {
            Self::Strict
        } else {
            Self::Permissive
        }
    }
}

/// Stop condition applied by [`Machine::run`](crate::Machine::run).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum LoopDetection {
    /// Run until halted, faulted or the bound is reached.
    Off,
    /// Stop once a step lands on a PC an earlier step of the same run landed on.
    #[default]
    RevisitedPc,
}

/// Top-level configuration for a machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct CoreConfig {
    /// Unsupported wide instruction handling.
    pub dispatch_policy: DispatchPolicy,
    /// Loop stop condition for runs; on unless opted out.
    pub loop_detection: LoopDetection,
}

/// External cycle accumulator. The core reports costs and never stores them.
pub trait CycleSink {
    /// Consumes the cost of one retired instruction.
    fn advance(&mut self, cycles: u32);
}

/// Minimal [`CycleSink`] that sums every reported cost.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct CycleCounter {
    total: u64,
}

impl CycleCounter {
    /// Cycles reported so far.
    #[must_use]
    pub const fn total(&self) -> u64 {
        self.total
    }
}

impl CycleSink for CycleCounter {
    fn advance(&mut self, cycles: u32) {
        self.total += u64::from(cycles);
    }
}

/// Deterministic trace events emitted at step boundaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TraceEvent {
    /// Instruction retired.
    InstructionRetired {
        /// Address the instruction was fetched from.
        pc: u32,
        /// Raw opcode byte or instruction word.
        word: u32,
        /// Cycle cost reported for it.
        cycles: u32,
    },
    /// Step failed; the register file is unchanged.
    FaultRaised {
        /// Fault class of the returned error.
        class: FaultClass,
        /// Program counter of the faulting instruction.
        pc: u32,
    },
    /// Run loop stopped.
    Stopped {
        /// Program counter at the stop.
        pc: u32,
        /// Why the loop stopped.
        reason: StopReason,
    },
}

/// Sink for [`TraceEvent`]s.
pub trait TraceSink {
    /// Records an event in execution order.
    fn on_event(&mut self, event: TraceEvent);
}

/// Why [`Machine::run`](crate::Machine::run) returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum StopReason {
    /// The CPU suspended itself (or was already suspended).
    Halted,
    /// A step landed on an already visited PC.
    LoopDetected {
        /// The revisited PC.
        pc: u32,
    },
    /// The step bound was exhausted.
    BoundReached,
}

/// Aggregated result of a bounded or unbounded run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct RunOutcome {
    /// Instructions retired during this call.
    pub steps: u64,
    /// Sum of their cycle costs.
    pub cycles: u64,
    /// Stop condition.
    pub reason: StopReason,
}

#[cfg(test)]
mod tests {
    use super::{
        CoreConfig, CpuProfile, CycleCounter, CycleSink, DispatchPolicy, DispatchShape,
        LoopDetection,
    };

    #[test]
    fn default_config_follows_build_profile() {
        let config = CoreConfig::default();
        assert_eq!(config.loop_detection, LoopDetection::RevisitedPc);
        if cfg!(debug_assertions) {
            assert_eq!(config.dispatch_policy, DispatchPolicy::Strict);
        } else {
            assert_eq!(config.dispatch_policy, DispatchPolicy::Permissive);
        }
    }

    #[test]
    fn profile_descriptors() {
        let narrow = CpuProfile::Narrow.descriptor();
        assert_eq!(narrow.register_bits, 8);
        assert_eq!(narrow.register_count, 8);
        assert_eq!(narrow.dispatch, DispatchShape::Table);

        let wide = CpuProfile::Wide.descriptor();
        assert_eq!(wide.register_count, 16);
        assert_eq!(wide.fetch_bytes, 4);
        assert_eq!(wide.dispatch, DispatchShape::FieldExtraction);
    }

    #[test]
    fn cycle_counter_accumulates() {
        let mut counter = CycleCounter::default();
        counter.advance(4);
        counter.advance(12);
        assert_eq!(counter.total(), 16);
    }
}
