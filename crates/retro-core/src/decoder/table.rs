//! Table dispatch for the narrow profile.

use std::fmt;

use crate::fault::CoreError;
use crate::memory::Bus;
use crate::state::{NarrowRegisters, RunState};

/// Narrow instruction handler.
///
/// Called with `PC` already past the opcode byte; fetches its own
/// immediates and returns the cycle cost.
pub type NarrowHandler = fn(&mut NarrowRegisters, &mut Bus, u8) -> Result<u32, CoreError>;

/// One populated opcode slot.
#[derive(Clone, Copy)]
pub struct InstructionDef {
    /// Assembly template, e.g. `"LD r,n8"`.
    pub mnemonic: &'static str,
    /// Handler executed for the opcode.
    pub handler: NarrowHandler,
    /// Run state entered once the instruction retires, if any.
    pub suspends: Option<RunState>,
}

impl InstructionDef {
    /// Definition for an instruction that keeps the CPU running.
    #[must_use]
    pub const fn new(mnemonic: &'static str, handler: NarrowHandler) -> Self {
        Self {
            mnemonic,
            handler,
            suspends: None,
        }
    }

    /// Definition for an instruction that suspends the CPU.
    #[must_use]
    pub const fn suspending(mnemonic: &'static str, handler: NarrowHandler, state: RunState) -> Self {
        Self {
            mnemonic,
            handler,
            suspends: Some(state),
        }
    }
}

impl fmt::Debug for InstructionDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InstructionDef")
            .field("mnemonic", &self.mnemonic)
            .field("suspends", &self.suspends)
            .finish_non_exhaustive()
    }
}

/// 256-entry opcode table. Unpopulated slots are never filled implicitly.
#[derive(Clone)]
pub struct OpcodeTable {
    slots: [Option<InstructionDef>; 256],
}

impl Default for OpcodeTable {
    fn default() -> Self {
        Self::standard()
    }
}

impl fmt::Debug for OpcodeTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpcodeTable")
            .field("populated", &self.len())
            .finish()
    }
}

impl OpcodeTable {
    /// Table with every slot empty.
    #[must_use]
    pub const fn empty() -> Self {
        Self { slots: [None; 256] }
    }

    /// Table populated with the implemented narrow instruction set.
    #[must_use]
    pub fn standard() -> Self {
        let mut table = Self::empty();
        crate::execute::narrow::install(&mut table);
        table
    }

    /// Installs `def` at `opcode`, returning the definition it replaced.
    pub fn register(&mut self, opcode: u8, def: InstructionDef) -> Option<InstructionDef> {
        self.slots[usize::from(opcode)].replace(def)
    }

    /// Returns the definition for `opcode`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::UnimplementedInstruction`] for an empty slot.
    pub const fn lookup(&self, opcode: u8, pc: u16) -> Result<&InstructionDef, CoreError> {
        match &self.slots[opcode as usize] {
            Some(def) => Ok(def),
            None => Err(CoreError::UnimplementedInstruction {
                opcode,
                pc: pc as u32,
            }),
        }
    }

    /// Number of populated slots.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }

    /// Returns `true` when no slot is populated.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::{InstructionDef, OpcodeTable};
    use crate::fault::CoreError;
    use crate::memory::Bus;
    use crate::state::NarrowRegisters;

    fn four(_: &mut NarrowRegisters, _: &mut Bus, _: u8) -> Result<u32, CoreError> {
        Ok(4)
    }

    #[test]
    fn empty_slot_reports_opcode_and_pc() {
        let table = OpcodeTable::empty();
        assert!(table.is_empty());
        assert!(matches!(
            table.lookup(0xD3, 0x0150),
            Err(CoreError::UnimplementedInstruction {
                opcode: 0xD3,
                pc: 0x0150
            })
        ));
    }

    #[test]
    fn register_replaces_and_counts() {
        let mut table = OpcodeTable::empty();
        assert!(table.register(0x00, InstructionDef::new("NOP", four)).is_none());
        let previous = table.register(0x00, InstructionDef::new("NOP2", four));
        assert_eq!(previous.map(|def| def.mnemonic), Some("NOP"));
        assert_eq!(table.len(), 1);
        assert_eq!(table.lookup(0x00, 0).map(|def| def.mnemonic), Ok("NOP2"));
    }

    #[test]
    fn standard_table_leaves_gaps_unfilled() {
        let table = OpcodeTable::standard();
        assert!(table.lookup(0x00, 0).is_ok());
        assert!(table.lookup(0xCB, 0).is_err());
        assert!(table.lookup(0xD3, 0).is_err());
        assert!(table.len() > 200);
    }
}
