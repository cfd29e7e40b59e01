use crate::state::status::{
    InstructionMode, NarrowFlags, NarrowFlagsUpdate, StatusRegister, StatusUpdate,
};

/// Number of 8-bit registers in the narrow register file (`A F B C D E H L`).
pub const NARROW_REGISTER_COUNT: usize = 8;
/// Narrow profile stack pointer after reset.
pub const NARROW_SP_RESET: u16 = 0xFFFE;

/// Number of 32-bit registers in the wide register file (`R0..R15`).
pub const WIDE_REGISTER_COUNT: usize = 16;
/// Wide profile stack pointer index.
pub const SP_INDEX: usize = 13;
/// Wide profile link register index.
pub const LR_INDEX: usize = 14;
/// Wide profile program counter index.
pub const PC_INDEX: usize = 15;

/// Narrow profile 8-bit register identifier, in storage order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[repr(u8)]
#[allow(missing_docs)]
pub enum Reg8 {
    A = 0,
    F = 1,
    B = 2,
    C = 3,
    D = 4,
    E = 5,
    H = 6,
    L = 7,
}

impl Reg8 {
    /// Every register in storage order.
    pub const ALL: [Self; NARROW_REGISTER_COUNT] = [
        Self::A,
        Self::F,
        Self::B,
        Self::C,
        Self::D,
        Self::E,
        Self::H,
        Self::L,
    ];

    /// Storage index (`0..=7`).
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Register for a storage index.
    #[must_use]
    pub const fn from_index(index: usize) -> Option<Self> {
        if index < NARROW_REGISTER_COUNT {
            Some(Self::ALL[index])
        } else {
            None
        }
    }
}

/// Narrow profile 16-bit register pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[allow(missing_docs)]
pub enum Reg16 {
    AF,
    BC,
    DE,
    HL,
}

impl Reg16 {
    /// Every pair.
    pub const ALL: [Self; 4] = [Self::AF, Self::BC, Self::DE, Self::HL];

    /// `(high, low)` halves of the pair.
    #[must_use]
    pub const fn halves(self) -> (Reg8, Reg8) {
        match self {
            Self::AF => (Reg8::A, Reg8::F),
            Self::BC => (Reg8::B, Reg8::C),
            Self::DE => (Reg8::D, Reg8::E),
            Self::HL => (Reg8::H, Reg8::L),
        }
    }
}

/// Narrow profile register file: eight 8-bit registers plus 16-bit `SP` and `PC`.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct NarrowRegisters {
    regs: [u8; NARROW_REGISTER_COUNT],
    sp: u16,
    pc: u16,
}

impl Default for NarrowRegisters {
    fn default() -> Self {
        Self::reset(0)
    }
}

impl NarrowRegisters {
    /// Register file after reset: data registers clear, `SP = 0xFFFE`, `PC = entry`.
    #[must_use]
    pub const fn reset(entry: u16) -> Self {
        Self {
            regs: [0; NARROW_REGISTER_COUNT],
            sp: NARROW_SP_RESET,
            pc: entry,
        }
    }

    /// Reads an 8-bit register.
    #[must_use]
    pub const fn get(&self, reg: Reg8) -> u8 {
        self.regs[reg.index()]
    }

    /// Writes an 8-bit register.
    pub const fn set(&mut self, reg: Reg8, value: u8) {
        self.regs[reg.index()] = value;
    }

    /// Reads a register by storage index.
    ///
    /// # Panics
    ///
    /// Panics when `index >= 8`.
    #[must_use]
    pub const fn get_index(&self, index: usize) -> u8 {
        self.regs[index]
    }

    /// Writes a register by storage index.
    ///
    /// # Panics
    ///
    /// Panics when `index >= 8`.
    pub const fn set_index(&mut self, index: usize, value: u8) {
        self.regs[index] = value;
    }

    /// Reads a register pair, high half first.
    #[must_use]
    pub const fn pair(&self, pair: Reg16) -> u16 {
        let (high, low) = pair.halves();
        u16::from_be_bytes([self.get(high), self.get(low)])
    }

    /// Writes a register pair, splitting it into its halves.
    pub const fn set_pair(&mut self, pair: Reg16, value: u16) {
        let (high, low) = pair.halves();
        let [hi, lo] = value.to_be_bytes();
        self.set(high, hi);
        self.set(low, lo);
    }

    /// Current flags.
    #[must_use]
    pub const fn flags(&self) -> NarrowFlags {
        NarrowFlags::from_bits(self.get(Reg8::F))
    }

    /// Applies a partial flag update.
    pub const fn update_flags(&mut self, update: NarrowFlagsUpdate) {
        let flags = self.flags().apply(update);
        self.set(Reg8::F, flags.bits());
    }

    /// Reads `SP`.
    #[must_use]
    pub const fn sp(&self) -> u16 {
        self.sp
    }

    /// Writes `SP`.
    pub const fn set_sp(&mut self, value: u16) {
        self.sp = value;
    }

    /// Reads `PC`.
    #[must_use]
    pub const fn pc(&self) -> u16 {
        self.pc
    }

    /// Writes `PC`.
    pub const fn set_pc(&mut self, value: u16) {
        self.pc = value;
    }
}

/// Wide profile register file: sixteen 32-bit registers and the status word.
///
/// `R15` is the program counter. Writes through [`WideRegisters::set_pc`] (and
/// through [`WideRegisters::set`] with index 15) are aligned to the fetch
/// granularity of the current instruction mode.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct WideRegisters {
    regs: [u32; WIDE_REGISTER_COUNT],
    status: StatusRegister,
}

impl Default for WideRegisters {
    fn default() -> Self {
        Self::reset(0)
    }
}

impl WideRegisters {
    /// Register file after reset: registers clear, status at its reset value,
    /// `PC = entry` (aligned).
    #[must_use]
    pub const fn reset(entry: u32) -> Self {
        let status = StatusRegister::from_bits(crate::state::status::STATUS_RESET);
        let mut regs = [0; WIDE_REGISTER_COUNT];
        regs[PC_INDEX] = entry & status.instruction_mode().alignment_mask();
        Self { regs, status }
    }

    /// Reads a register as stored (no pipeline adjustment for `R15`).
    ///
    /// # Panics
    ///
    /// Panics when `index >= 16`.
    #[must_use]
    pub const fn get(&self, index: usize) -> u32 {
        self.regs[index]
    }

    /// Writes a register; `R15` goes through [`WideRegisters::set_pc`].
    ///
    /// # Panics
    ///
    /// Panics when `index >= 16`.
    pub const fn set(&mut self, index: usize, value: u32) {
        if index == PC_INDEX {
            self.set_pc(value);
        } else {
            self.regs[index] = value;
        }
    }

    /// Reads a register as an instruction operand: `R15` yields
    /// [`WideRegisters::visible_pc`].
    ///
    /// # Panics
    ///
    /// Panics when `index >= 16`.
    #[must_use]
    pub const fn operand(&self, index: usize) -> u32 {
        if index == PC_INDEX {
            self.visible_pc()
        } else {
            self.regs[index]
        }
    }

    /// Address of the instruction about to execute.
    #[must_use]
    pub const fn pc(&self) -> u32 {
        self.regs[PC_INDEX]
    }

    /// Writes `R15`, clearing the low bits below the fetch granularity.
    pub const fn set_pc(&mut self, value: u32) {
        self.regs[PC_INDEX] = value & self.mode().alignment_mask();
    }

    /// `PC` as observed by an executing instruction (two fetches ahead).
    #[must_use]
    pub const fn visible_pc(&self) -> u32 {
        self.pc().wrapping_add(self.mode().pipeline_offset())
    }

    /// Current status word.
    #[must_use]
    pub const fn status(&self) -> StatusRegister {
        self.status
    }

    /// Replaces the status word.
    pub const fn set_status(&mut self, status: StatusRegister) {
        self.status = status;
    }

    /// Applies a partial status update.
    pub const fn update_status(&mut self, update: StatusUpdate) {
        self.status = self.status.apply(update);
    }

    /// Instruction mode selected by the status `T` bit.
    #[must_use]
    pub const fn mode(&self) -> InstructionMode {
        self.status.instruction_mode()
    }
}
