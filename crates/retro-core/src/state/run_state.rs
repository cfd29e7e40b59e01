/// Narrow profile run state; the wide profile never leaves `Running`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum RunState {
    /// Fetching and executing instructions.
    #[default]
    Running,
    /// Suspended by `HALT`.
    Halted,
    /// Suspended by `STOP`.
    Stopped,
}

impl RunState {
    /// Returns `true` while the CPU makes progress on [`step`](crate::Cpu::step).
    #[must_use]
    pub const fn is_running(self) -> bool {
        matches!(self, Self::Running)
    }
}
