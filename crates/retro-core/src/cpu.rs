//! CPU cores for both profiles and the machine that drives them.
//!
//! A step fetches, decodes and executes exactly one instruction. Handlers
//! work on a copy of the register file that replaces the live one only when
//! the whole instruction succeeded, so a failed step leaves every register
//! (`PC` included) as it was. Bus writes issued before a later fault in the
//! same instruction stay visible.

use std::collections::HashSet;
use std::fmt;

use crate::api::{
    CoreConfig, CpuProfile, CycleCounter, CycleSink, DispatchPolicy, LoopDetection, RunOutcome,
    StopReason, TraceEvent, TraceSink,
};
use crate::decoder::{decode, Condition, OpcodeTable, WideOp};
use crate::execute::wide;
use crate::fault::{ConfigurationError, CoreError, DecodeReason};
use crate::memory::map::{NARROW_ENTRY_POINT, ROM_START};
use crate::memory::{Bus, NarrowMemoryMap, WideMemoryMap};
use crate::state::{InstructionMode, NarrowRegisters, RunState, WideRegisters};
use crate::timing::CycleCostKind;

/// One emulated CPU attached to a [`Bus`].
pub trait Cpu {
    /// Profile implemented by this CPU.
    const PROFILE: CpuProfile;

    /// Clears the register file, sets the status word to its reset value,
    /// points `PC` at `entry` and resumes execution.
    fn reset(&mut self, entry: u32);

    /// Executes exactly one instruction and returns its cycle cost.
    ///
    /// A suspended CPU returns `Ok(0)` without touching the bus.
    ///
    /// # Errors
    ///
    /// Returns the bus, decode or mode fault that stopped the instruction;
    /// the register file is left unchanged.
    fn step(&mut self, bus: &mut Bus) -> Result<u32, CoreError>;

    /// Address of the next instruction.
    fn pc(&self) -> u32;

    /// Returns `false` once the CPU suspended itself.
    fn is_running(&self) -> bool;

    /// Opcode byte or instruction word fetched by the last successful step.
    fn last_word(&self) -> u32;

    /// Applies machine-level configuration.
    fn configure(&mut self, _config: &CoreConfig) {}
}

/// Narrow profile CPU with its own opcode table.
#[derive(Debug, Clone)]
pub struct NarrowCpu {
    registers: NarrowRegisters,
    table: OpcodeTable,
    run_state: RunState,
    last_opcode: u8,
}

impl Default for NarrowCpu {
    fn default() -> Self {
        Self::new()
    }
}

impl NarrowCpu {
    /// CPU with the standard table, reset to [`NARROW_ENTRY_POINT`].
    #[must_use]
    pub fn new() -> Self {
        Self::with_table(OpcodeTable::standard())
    }

    /// CPU dispatching through `table`.
    #[must_use]
    pub const fn with_table(table: OpcodeTable) -> Self {
        Self {
            registers: NarrowRegisters::reset(NARROW_ENTRY_POINT),
            table,
            run_state: RunState::Running,
            last_opcode: 0,
        }
    }

    /// Register file.
    #[must_use]
    pub const fn registers(&self) -> &NarrowRegisters {
        &self.registers
    }

    /// Mutable register file.
    pub fn registers_mut(&mut self) -> &mut NarrowRegisters {
        &mut self.registers
    }

    /// Opcode table.
    #[must_use]
    pub const fn table(&self) -> &OpcodeTable {
        &self.table
    }

    /// Current run state.
    #[must_use]
    pub const fn run_state(&self) -> RunState {
        self.run_state
    }
}

impl Cpu for NarrowCpu {
    const PROFILE: CpuProfile = CpuProfile::Narrow;

    fn reset(&mut self, entry: u32) {
        let [low, high, ..] = entry.to_le_bytes();
        self.registers = NarrowRegisters::reset(u16::from_le_bytes([low, high]));
        self.run_state = RunState::Running;
        self.last_opcode = 0;
        tracing::info!(profile = "narrow", entry = self.registers.pc(), "cpu reset");
    }

    fn step(&mut self, bus: &mut Bus) -> Result<u32, CoreError> {
        if !self.run_state.is_running() {
            return Ok(0);
        }

        let pc = self.registers.pc();
        let opcode = bus.read8(u32::from(pc))?;
        let def = *self.table.lookup(opcode, pc)?;

        let mut next = self.registers.clone();
        next.set_pc(pc.wrapping_add(1));
        let cycles = (def.handler)(&mut next, bus, opcode)?;

        self.registers = next;
        self.last_opcode = opcode;
        tracing::trace!(pc, opcode, mnemonic = def.mnemonic, cycles, "retired");
        if let Some(state) = def.suspends {
            self.run_state = state;
            tracing::info!(pc, mnemonic = def.mnemonic, "cpu suspended");
        }
        Ok(cycles)
    }

    fn pc(&self) -> u32 {
        u32::from(self.registers.pc())
    }

    fn is_running(&self) -> bool {
        self.run_state.is_running()
    }

    fn last_word(&self) -> u32 {
        u32::from(self.last_opcode)
    }
}

/// Wide profile CPU executing 32-bit instructions.
#[derive(Debug, Clone)]
pub struct WideCpu {
    registers: WideRegisters,
    policy: DispatchPolicy,
    last_word: u32,
}

impl Default for WideCpu {
    fn default() -> Self {
        Self::new()
    }
}

impl WideCpu {
    /// CPU reset to [`ROM_START`] with the default dispatch policy.
    #[must_use]
    pub fn new() -> Self {
        Self::with_policy(DispatchPolicy::default())
    }

    /// CPU with an explicit dispatch policy.
    #[must_use]
    pub const fn with_policy(policy: DispatchPolicy) -> Self {
        Self {
            registers: WideRegisters::reset(ROM_START),
            policy,
            last_word: 0,
        }
    }

    /// Register file.
    #[must_use]
    pub const fn registers(&self) -> &WideRegisters {
        &self.registers
    }

    /// Mutable register file.
    pub fn registers_mut(&mut self) -> &mut WideRegisters {
        &mut self.registers
    }

    /// Dispatch policy for unsupported classes.
    #[must_use]
    pub const fn policy(&self) -> DispatchPolicy {
        self.policy
    }
}

impl Cpu for WideCpu {
    const PROFILE: CpuProfile = CpuProfile::Wide;

    fn reset(&mut self, entry: u32) {
        self.registers = WideRegisters::reset(entry);
        self.last_word = 0;
        tracing::info!(profile = "wide", entry = self.registers.pc(), "cpu reset");
    }

    fn step(&mut self, bus: &mut Bus) -> Result<u32, CoreError> {
        let pc = self.registers.pc();
        let mode = self.registers.mode();
        if mode == InstructionMode::Thumb {
            return Err(CoreError::InvalidMode { mode, pc });
        }

        let word = bus.read32(pc)?;
        let mut next = self.registers.clone();
        let sequential = pc.wrapping_add(mode.fetch_bytes());

        let cycles = if Condition::from_u4(word >> 28).evaluate(next.status()) {
            let instruction = decode(word).map_err(|reason| CoreError::Decode { word, pc, reason })?;
            match instruction.op {
                WideOp::Unsupported { class } => match self.policy {
                    DispatchPolicy::Strict => {
                        return Err(CoreError::Decode {
                            word,
                            pc,
                            reason: DecodeReason::UnsupportedClass(class.name()),
                        });
                    }
                    DispatchPolicy::Permissive => {
                        tracing::warn!(pc, word, %class, "unsupported instruction executed as no-op");
                        next.set_pc(sequential);
                        CycleCostKind::WideUnsupported.cycles()
                    }
                },
                op => {
                    let retired = wide::execute(&mut next, bus, op)?;
                    if !retired.pc_written {
                        next.set_pc(sequential);
                    }
                    retired.cycles
                }
            }
        } else {
            next.set_pc(sequential);
            CycleCostKind::WideConditionFailed.cycles()
        };

        self.registers = next;
        self.last_word = word;
        tracing::trace!(pc, word, cycles, "retired");
        Ok(cycles)
    }

    fn pc(&self) -> u32 {
        self.registers.pc()
    }

    fn is_running(&self) -> bool {
        true
    }

    fn last_word(&self) -> u32 {
        self.last_word
    }

    fn configure(&mut self, config: &CoreConfig) {
        self.policy = config.dispatch_policy;
    }
}

/// A CPU, its bus and the host collaborators that observe it.
pub struct Machine<C: Cpu> {
    cpu: C,
    bus: Bus,
    cycles: Box<dyn CycleSink>,
    trace: Option<Box<dyn TraceSink>>,
    config: CoreConfig,
}

impl<C: Cpu + fmt::Debug> fmt::Debug for Machine<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Machine")
            .field("cpu", &self.cpu)
            .field("bus", &self.bus)
            .field("config", &self.config)
            .field("tracing", &self.trace.is_some())
            .finish_non_exhaustive()
    }
}

impl<C: Cpu> Machine<C> {
    /// Builds a machine around `cpu` and `bus`, counting cycles with a
    /// [`CycleCounter`] until another sink is installed.
    #[must_use]
    pub fn new(mut cpu: C, bus: Bus, config: CoreConfig) -> Self {
        cpu.configure(&config);
        Self {
            cpu,
            bus,
            cycles: Box::new(CycleCounter::default()),
            trace: None,
            config,
        }
    }

    /// Replaces the cycle sink.
    #[must_use]
    pub fn with_cycle_sink(mut self, sink: Box<dyn CycleSink>) -> Self {
        self.cycles = sink;
        self
    }

    /// Installs a trace sink.
    #[must_use]
    pub fn with_trace_sink(mut self, sink: Box<dyn TraceSink>) -> Self {
        self.trace = Some(sink);
        self
    }

    /// The CPU.
    #[must_use]
    pub const fn cpu(&self) -> &C {
        &self.cpu
    }

    /// Mutable CPU.
    pub fn cpu_mut(&mut self) -> &mut C {
        &mut self.cpu
    }

    /// The bus.
    #[must_use]
    pub const fn bus(&self) -> &Bus {
        &self.bus
    }

    /// Mutable bus.
    pub fn bus_mut(&mut self) -> &mut Bus {
        &mut self.bus
    }

    /// Active configuration.
    #[must_use]
    pub const fn config(&self) -> &CoreConfig {
        &self.config
    }

    /// Resets the CPU to `entry`. Memory is left as is.
    pub fn reset(&mut self, entry: u32) {
        self.cpu.reset(entry);
    }

    fn emit(&mut self, event: TraceEvent) {
        if let Some(sink) = self.trace.as_mut() {
            sink.on_event(event);
        }
    }

    /// Executes one instruction and forwards its cost to the cycle sink.
    ///
    /// # Errors
    ///
    /// Returns the fault raised by the CPU.
    pub fn step(&mut self) -> Result<u32, CoreError> {
        if !self.cpu.is_running() {
            return Ok(0);
        }
        let pc = self.cpu.pc();
        match self.cpu.step(&mut self.bus) {
            Ok(cycles) => {
                self.cycles.advance(cycles);
                let word = self.cpu.last_word();
                self.emit(TraceEvent::InstructionRetired { pc, word, cycles });
                Ok(cycles)
            }
            Err(error) => {
                self.emit(TraceEvent::FaultRaised {
                    class: error.class(),
                    pc,
                });
                Err(error)
            }
        }
    }

    /// Steps until the CPU suspends, `bound` steps have run, or (with
    /// [`LoopDetection::RevisitedPc`], the default) a step lands on an
    /// already visited PC.
    ///
    /// The visited set holds one entry per distinct landing PC, so it is
    /// bounded by the program's footprint rather than by the step count.
    ///
    /// # Errors
    ///
    /// Returns the first fault; steps retired before it stay committed.
    pub fn run(&mut self, bound: Option<u64>) -> Result<RunOutcome, CoreError> {
        let mut visited = HashSet::new();
        let mut steps = 0_u64;
        let mut cycles = 0_u64;

        let reason = loop {
            if !self.cpu.is_running() {
                break StopReason::Halted;
            }
            if bound.is_some_and(|limit| steps >= limit) {
                break StopReason::BoundReached;
            }

            cycles = cycles.saturating_add(u64::from(self.step()?));
            steps = steps.saturating_add(1);

            if self.config.loop_detection == LoopDetection::RevisitedPc {
                let pc = self.cpu.pc();
                if !visited.insert(pc) {
                    tracing::info!(pc, steps, "loop detected");
                    break StopReason::LoopDetected { pc };
                }
            }
        };

        let pc = self.cpu.pc();
        self.emit(TraceEvent::Stopped { pc, reason });
        tracing::debug!(pc, steps, cycles, ?reason, "run stopped");
        Ok(RunOutcome {
            steps,
            cycles,
            reason,
        })
    }
}

impl Machine<NarrowCpu> {
    /// Narrow machine on the fixed narrow address map.
    ///
    /// # Errors
    ///
    /// Propagates [`ConfigurationError`] from building the map.
    pub fn narrow(config: CoreConfig) -> Result<(Self, NarrowMemoryMap), ConfigurationError> {
        let (bus, map) = NarrowMemoryMap::build()?;
        Ok((Self::new(NarrowCpu::new(), bus, config), map))
    }
}

impl Machine<WideCpu> {
    /// Wide machine on the fixed wide address map.
    ///
    /// # Errors
    ///
    /// Propagates [`ConfigurationError`] from building the map.
    pub fn wide(config: CoreConfig) -> Result<(Self, WideMemoryMap), ConfigurationError> {
        let (bus, map) = WideMemoryMap::build()?;
        Ok((Self::new(WideCpu::new(), bus, config), map))
    }
}
