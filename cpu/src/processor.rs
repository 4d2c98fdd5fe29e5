//! The instruction processor.
//!
//! An [`InstructionProcessor`] owns everything which belongs to a
//! single processor: the general register set, the designator
//! register, the base registers, the program address register and
//! its pending interrupts.  Main storage, the bank descriptor table
//! and the UPI ports are shared with the other processors of the
//! system.
//!
//! Each call to [`InstructionProcessor::cycle`] does one of the
//! following, in order of preference:
//!
//! - stop, if the cycle limit has been reached or a breakpoint with
//!   the halt flag set was matched;
//! - take the most urgent pending interrupt which may be taken now;
//! - fetch, decode and execute one instruction.
//!
//! Instruction handlers report architectural faults by returning a
//! [`MachineInterrupt`].  Writes a handler makes to the general
//! register set are journaled, so that when an instruction faults
//! its register updates (including auto-increment of index
//! registers) and designator changes are undone before the
//! interrupt is queued.  Handlers check everything they need before
//! they write to storage or to a base register.
use std::fmt::{self, Debug, Formatter};
use std::sync::Arc;

use serde::Serialize;
use tracing::{event, span, Level};

use base::prelude::*;

mod address;
mod dispatch;
mod history;
mod op_arith;
mod op_jump;
mod op_loadstore;
mod op_procedure;
mod op_shift;
mod op_special;
mod rcs;

#[cfg(test)]
mod testing;
#[cfg(test)]
mod tests;

pub use address::OperandLocation;
pub use history::{BreakpointRegister, JumpHistory, JUMP_HISTORY_SIZE};
pub use rcs::RcsFrame;

use super::basereg::{
    BankDescriptor, BankDescriptorTable, BankType, BaseRegister, BASE_REGISTER_COUNT,
};
use super::config::ProcessorConfiguration;
use super::designator::DesignatorRegister;
use super::diagnostics::CurrentInstructionDiagnostics;
use super::grs::{register_index, GeneralRegisterSet, RegisterName, GRS_SIZE};
use super::image::{LoadError, ProgramImage};
use super::interrupt::{AddressingExceptionReason, InterruptClass, MachineInterrupt};
use super::interruptunit::InterruptUnit;
use super::memory::MainStorage;
use super::registers::{IndicatorKeyRegister, LevelBdi, ProgramAddressRegister};
use super::stop::StopReason;
use super::upi::{SignalChannel, SignalError};

/// What an instruction does to the program address register once it
/// has completed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgramCounterChange {
    /// Move on to the next instruction.
    Advance,
    /// Skip the next instruction.
    Skip,
    /// Continue at another address in the same bank.
    Jump(u32),
    /// Continue in another bank.
    Transfer(ProgramAddressRegister),
}

pub(crate) type OpResult = Result<ProgramCounterChange, MachineInterrupt>;

/// A snapshot of a processor's externally visible state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProcessorStatus {
    pub upi: u8,
    pub running: bool,
    pub stop_reason: StopReason,
    pub stop_detail: u64,
    pub program_address: ProgramAddressRegister,
    pub designator: DesignatorRegister,
    pub last_interrupt: Option<MachineInterrupt>,
    pub cycles: u64,
}

pub struct InstructionProcessor {
    upi: u8,
    config: ProcessorConfiguration,
    storage: Arc<MainStorage>,
    banks: Arc<BankDescriptorTable>,
    channel: SignalChannel,

    grs: GeneralRegisterSet,
    designator: DesignatorRegister,
    base_registers: [BaseRegister; BASE_REGISTER_COUNT],
    /// The L,BDI loaded into each of B0-B15.
    active_base_table: [LevelBdi; 16],
    indicator_key: IndicatorKeyRegister,
    par: ProgramAddressRegister,
    quantum_timer: Word36,
    current: InstructionWord,
    current_function: Function,

    interrupts: InterruptUnit,
    last_interrupt: Option<MachineInterrupt>,
    jump_history: JumpHistory,
    breakpoint: Option<BreakpointRegister>,
    breakpoint_hit: Option<usize>,

    running: bool,
    stop_reason: StopReason,
    stop_detail: u64,
    cycles: u64,

    /// Previous values of the registers written by the current
    /// instruction, oldest first.
    journal: Vec<(usize, Word36)>,
    saved_designator: DesignatorRegister,
}

impl Debug for InstructionProcessor {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("InstructionProcessor")
            .field("upi", &self.upi)
            .field("running", &self.running)
            .field("par", &self.par)
            .field("designator", &self.designator)
            .field("stop_reason", &self.stop_reason)
            .field("stop_detail", &self.stop_detail)
            .field("interrupts", &self.interrupts)
            .field("grs", &self.grs)
            .finish()
    }
}

impl InstructionProcessor {
    pub fn new(
        upi: u8,
        config: ProcessorConfiguration,
        storage: Arc<MainStorage>,
        banks: Arc<BankDescriptorTable>,
        channel: SignalChannel,
    ) -> Result<InstructionProcessor, SignalError> {
        if channel.port(upi).is_none() {
            return Err(SignalError::NoSuchProcessor(upi));
        }
        let jump_history = JumpHistory::new(config.jump_history_threshold);
        Ok(InstructionProcessor {
            upi,
            config,
            storage,
            banks,
            channel,
            grs: GeneralRegisterSet::new(),
            designator: DesignatorRegister::default(),
            base_registers: [BaseRegister::void(); BASE_REGISTER_COUNT],
            active_base_table: [LevelBdi::VOID; 16],
            indicator_key: IndicatorKeyRegister::default(),
            par: ProgramAddressRegister::default(),
            quantum_timer: Word36::ZERO,
            current: InstructionWord::from(Word36::ZERO),
            current_function: Function::Illegal,
            interrupts: InterruptUnit::new(),
            last_interrupt: None,
            jump_history,
            breakpoint: None,
            breakpoint_hit: None,
            running: false,
            stop_reason: StopReason::Initial,
            stop_detail: 0,
            cycles: 0,
            journal: Vec::new(),
            saved_designator: DesignatorRegister::default(),
        })
    }

    /// Return the processor to its power-on state.  Storage is not
    /// affected.
    pub fn clear(&mut self) {
        if self.running {
            self.stop(StopReason::Cleared, 0);
        }
        self.grs.clear();
        self.designator = DesignatorRegister::default();
        self.base_registers = [BaseRegister::void(); BASE_REGISTER_COUNT];
        self.active_base_table = [LevelBdi::VOID; 16];
        self.indicator_key = IndicatorKeyRegister::default();
        self.par = ProgramAddressRegister::default();
        self.quantum_timer = Word36::ZERO;
        self.interrupts.clear();
        self.last_interrupt = None;
        self.jump_history.clear();
        self.breakpoint_hit = None;
        self.journal.clear();
        self.cycles = 0;
        self.stop_reason = StopReason::Cleared;
        self.stop_detail = 0;
        // Anything sent to a cleared processor is lost.
        if let Some(port) = self.channel.port(self.upi) {
            port.drain();
        }
    }

    /// Prepare the processor to run `image`, whose banks must already
    /// be in storage and in the bank descriptor table.
    pub fn initial_program_load(&mut self, image: &ProgramImage) -> Result<(), LoadError> {
        self.clear();
        for bank in image.banks() {
            if let Some(index) = bank.base_register {
                let descriptor = self
                    .banks
                    .lookup(bank.level_bdi)
                    .ok_or(LoadError::UnknownBank(bank.level_bdi))?
                    .clone();
                self.load_base_register(index, &descriptor);
            }
        }
        for (index, value) in image.registers() {
            self.grs.write(index % GRS_SIZE, *value);
        }

        let start = image.start();
        self.designator
            .set_basic_mode_enabled(start.mode == AddressingMode::Basic);
        self.designator
            .set_processor_privilege(start.processor_privilege);
        let Some(descriptor) = self.banks.lookup(start.level_bdi).cloned() else {
            event!(
                Level::ERROR,
                "UPI {}: starting bank {} is not defined",
                self.upi,
                start.level_bdi
            );
            self.stop_reason = StopReason::L0BaseRegisterInvalid;
            return Err(LoadError::UndefinedStartBank(start.level_bdi));
        };
        let code_register = match start.mode {
            AddressingMode::Extended => 0,
            AddressingMode::Basic => 12,
        };
        self.load_base_register(code_register, &descriptor);
        self.par = ProgramAddressRegister::new(start.level_bdi, start.offset);
        event!(
            Level::DEBUG,
            "UPI {} loaded; execution will begin at {} in {:?} mode",
            self.upi,
            self.par,
            start.mode
        );
        Ok(())
    }

    pub fn start(&mut self) {
        if self.running {
            return;
        }
        event!(Level::INFO, "UPI {} starting at {}", self.upi, self.par);
        self.running = true;
        if let Some(port) = self.channel.port(self.upi) {
            port.set_running(true);
        }
    }

    /// Stop the processor, recording why.  Has no effect on a
    /// processor which is not running, so the first reason given
    /// sticks.
    pub fn stop(&mut self, reason: StopReason, detail: u64) {
        if !self.running {
            return;
        }
        event!(
            Level::INFO,
            "UPI {} stopped at {}: {reason} (detail {detail:o})",
            self.upi,
            self.par
        );
        self.running = false;
        self.stop_reason = reason;
        self.stop_detail = detail;
        if let Some(port) = self.channel.port(self.upi) {
            port.set_running(false);
        }
    }

    /// The operator's stop button.
    pub fn halt(&mut self) {
        self.stop(StopReason::PanelHalt, 0);
    }

    /// Run until something stops the processor.
    pub fn run(&mut self) {
        while self.running {
            self.cycle();
        }
    }

    pub fn cycle(&mut self) {
        if !self.running {
            return;
        }
        if let Some(limit) = self.config.cycle_limit {
            if self.cycles >= limit {
                self.stop(StopReason::Development, limit);
                return;
            }
        }
        self.cycles += 1;
        self.accept_signals();

        if let Some(address) = self.breakpoint_hit.take() {
            self.indicator_key.breakpoint_register_match = false;
            if self.breakpoint.is_some_and(|bp| bp.halt) {
                self.stop(StopReason::Breakpoint, address as u64);
                return;
            }
            self.interrupts.raise(MachineInterrupt::breakpoint(address));
        }
        self.raise_pended_conditions();

        if let Some(interrupt) = self
            .interrupts
            .take_next(self.designator.deferrable_interrupt_enabled())
        {
            self.dispatch_interrupt(interrupt);
            return;
        }

        match self.fetch_instruction() {
            Ok(inst) => self.execute_current(inst),
            Err(interrupt) => {
                event!(
                    Level::DEBUG,
                    "UPI {}: instruction fetch at {} failed: {interrupt}",
                    self.upi,
                    self.par
                );
                self.interrupts.raise(interrupt);
            }
        }
    }

    fn accept_signals(&mut self) {
        if let Some(port) = self.channel.port(self.upi) {
            for interrupt in port.drain() {
                self.interrupts.raise(interrupt);
            }
        }
    }

    fn raise_pended_conditions(&mut self) {
        if self.designator.quantum_timer_enabled()
            && self.quantum_timer.is_negative()
            && !self.interrupts.is_pending(InterruptClass::QuantumTimer)
        {
            self.interrupts.raise(MachineInterrupt::quantum_timer());
        }
        if self.jump_history.threshold_reached() {
            if self.config.jump_history_full_interrupt_enabled {
                self.interrupts.raise(MachineInterrupt::jump_history_full());
            }
            self.jump_history.acknowledge();
        }
    }

    fn execute_current(&mut self, inst: InstructionWord) {
        let function = Function::decode(inst, self.designator.addressing_mode());
        self.current = inst;
        self.current_function = function;
        self.journal.clear();
        self.saved_designator = self.designator;

        let span = span!(Level::INFO, "xop", upi = self.upi, par = %self.par, op = %function);
        let _enter = span.enter();
        event!(Level::TRACE, "executing {:?}", inst);
        match self.execute(function) {
            Ok(change) => {
                event!(Level::TRACE, "program counter change: {:?}", change);
                self.complete(change);
            }
            Err(interrupt) if interrupt.is_fault() => {
                if function == Function::Illegal {
                    event!(Level::WARN, "{}: {interrupt}", self.diagnostics());
                } else {
                    event!(Level::DEBUG, "{}: {interrupt}", self.diagnostics());
                }
                self.rollback();
                self.interrupts.raise(interrupt);
            }
            Err(interrupt) => {
                self.complete(ProgramCounterChange::Advance);
                self.interrupts.raise(interrupt);
            }
        }
    }

    fn execute(&mut self, function: Function) -> OpResult {
        use Function::*;
        match function {
            Sa => self.op_sa(),
            Sna => self.op_sna(),
            Sma => self.op_sma(),
            Sr => self.op_sr(),
            Sz | Snz | Sp1 | Sn1 | Sfs | Sfz | Sas | Saz => self.op_store_constant(function),
            Sx => self.op_sx(),
            Saqw => self.op_saqw(),
            Ds => self.op_ds(),
            Srs => self.op_srs(),
            La => self.op_la(),
            Lna => self.op_lna(),
            Lma => self.op_lma(),
            Lnma => self.op_lnma(),
            Lr => self.op_lr(),
            Lxm => self.op_lxm(),
            Lx => self.op_lx(),
            Lxi => self.op_lxi(),
            Lxsi => self.op_lxsi(),
            Lxlm => self.op_lxlm(),
            Laqw => self.op_laqw(),
            Dl => self.op_dl(),
            Lrs => self.op_lrs(),
            Aa => self.op_aa(),
            Ana => self.op_ana(),
            Ax => self.op_ax(),
            Anx => self.op_anx(),
            Inc => self.op_increment(Word36::ONE),
            Dec => self.op_increment(Word36::NEGATIVE_ONE),
            Inc2 => self.op_increment(Word36::from(2_u8)),
            Dec2 => self.op_increment(Word36::from(2_u8).negate()),
            Or => self.op_or(),
            Xor => self.op_xor(),
            And => self.op_and(),
            Mlu => self.op_mlu(),
            Te => self.op_te(),
            Tne => self.op_tne(),
            Ssc | Dsc | Ssl | Dsl | Ssa | Dsa | Lssc | Ldsc | Lssl | Ldsl => {
                self.op_shift(function)
            }
            Lsc => self.op_lsc(),
            Dlsc => self.op_dlsc(),
            Jz | Jnz | Jp | Jn | Jb | Jnb | Jc | Jnc | Jo | Jno => {
                self.op_conditional_jump(function)
            }
            J | Hj => self.op_j(),
            Jk => Ok(ProgramCounterChange::Advance),
            Aaij => self.op_aaij(),
            Paij => self.op_paij(),
            Lmj => self.op_lmj(),
            Hltj => self.op_hltj(),
            Jgd => self.op_jgd(),
            Locl => self.op_locl(),
            Call => self.op_call(),
            Goto => self.op_goto(),
            Rtn => self.op_rtn(),
            Lbu => self.op_lbu(),
            Sbu => self.op_sbu(),
            Lbe => self.op_lbe(),
            Buy => self.op_buy(),
            Sell => self.op_sell(),
            Er => self.op_er(),
            Sgnl => self.op_sgnl(),
            Nop => self.op_nop(),
            Send => self.op_send(),
            Ld => self.op_ld(),
            Sd => self.op_sd(),
            Ts => self.op_ts(),
            Tss => self.op_tss(),
            Tcs => self.op_tcs(),
            Iar => self.op_iar(),
            Halt => self.op_halt(),
            Illegal => self.op_illegal(),
        }
    }

    fn complete(&mut self, change: ProgramCounterChange) {
        match change {
            ProgramCounterChange::Advance => self.par = self.par.advanced(1),
            ProgramCounterChange::Skip => self.par = self.par.advanced(2),
            ProgramCounterChange::Jump(target) => {
                self.jump_history.record(self.par);
                self.par = ProgramAddressRegister::new(self.par.level_bdi, target);
            }
            ProgramCounterChange::Transfer(par) => {
                self.jump_history.record(self.par);
                self.par = par;
            }
        }
        if self.designator.quantum_timer_enabled() {
            let charge = Word36::truncate(self.config.quantum_charge_per_instruction);
            self.quantum_timer = self.quantum_timer.wrapping_sub(charge);
        }
    }

    fn rollback(&mut self) {
        while let Some((index, previous)) = self.journal.pop() {
            self.grs.write(index, previous);
        }
        self.designator = self.saved_designator;
    }

    fn diagnostics(&self) -> CurrentInstructionDiagnostics {
        CurrentInstructionDiagnostics {
            upi: self.upi,
            instruction: self.current,
            function: self.current_function,
            address: self.par,
        }
    }

    /// Write a general register on behalf of the current instruction.
    fn set_grs(&mut self, index: usize, value: Word36) {
        let index = index % GRS_SIZE;
        self.journal.push((index, self.grs.read(index)));
        self.grs.write(index, value);
    }

    fn get_grs(&self, index: usize) -> Word36 {
        self.grs.read(index)
    }

    fn register(&self, name: RegisterName) -> usize {
        register_index(name, self.designator.exec_register_set_selected())
    }

    fn a_register(&self, n: u8) -> usize {
        self.register(RegisterName::A(n))
    }

    fn x_register(&self, n: u8) -> usize {
        self.register(RegisterName::X(n))
    }

    fn r_register(&self, n: u8) -> usize {
        self.register(RegisterName::R(n))
    }

    fn load_base_register(&mut self, index: usize, descriptor: &BankDescriptor) {
        event!(
            Level::DEBUG,
            "UPI {}: B{index} based on bank {}",
            self.upi,
            descriptor.level_bdi
        );
        self.base_registers[index] = BaseRegister::from_descriptor(descriptor);
        if let Some(slot) = self.active_base_table.get_mut(index) {
            *slot = descriptor.level_bdi;
        }
    }

    fn void_base_register(&mut self, index: usize) {
        event!(Level::DEBUG, "UPI {}: B{index} voided", self.upi);
        self.base_registers[index] = BaseRegister::void();
        if let Some(slot) = self.active_base_table.get_mut(index) {
            *slot = LevelBdi::VOID;
        }
    }

    /// Find the bank a program names, for CALL, GOTO, RTN and LBU.
    fn lookup_bank(&self, level_bdi: LevelBdi) -> Result<BankDescriptor, MachineInterrupt> {
        if level_bdi.is_void() {
            return Err(MachineInterrupt::addressing_exception(
                AddressingExceptionReason::UndefinedBankDescriptor,
            ));
        }
        self.banks.lookup(level_bdi).cloned().ok_or_else(|| {
            MachineInterrupt::addressing_exception(
                AddressingExceptionReason::UndefinedBankDescriptor,
            )
        })
    }

    /// Make `bank` the code bank and continue at `offset` within it.
    /// An extended mode bank is based on B0, a basic mode one on B12
    /// (which also selects basic mode).
    fn transfer_to_bank(&mut self, bank: &BankDescriptor, offset: u32) -> ProgramCounterChange {
        match bank.bank_type {
            BankType::Extended => {
                self.load_base_register(0, bank);
                self.designator.set_basic_mode_enabled(false);
            }
            BankType::Basic => {
                self.load_base_register(12, bank);
                self.designator.set_basic_mode_enabled(true);
                self.designator.set_basic_mode_base_register_selection(false);
            }
        }
        ProgramCounterChange::Transfer(ProgramAddressRegister::new(bank.level_bdi, offset))
    }

    // Observers.

    pub fn upi(&self) -> u8 {
        self.upi
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn latest_stop_reason(&self) -> StopReason {
        self.stop_reason
    }

    pub fn latest_stop_detail(&self) -> u64 {
        self.stop_detail
    }

    pub fn general_register(&self, index: usize) -> Word36 {
        self.grs.read(index)
    }

    pub fn designator_register(&self) -> DesignatorRegister {
        self.designator
    }

    pub fn base_register(&self, index: usize) -> Option<&BaseRegister> {
        self.base_registers.get(index)
    }

    pub fn active_base_table_entry(&self, index: usize) -> Option<LevelBdi> {
        self.active_base_table.get(index).copied()
    }

    pub fn indicator_key_register(&self) -> IndicatorKeyRegister {
        self.indicator_key
    }

    pub fn last_interrupt(&self) -> Option<&MachineInterrupt> {
        self.last_interrupt.as_ref()
    }

    pub fn pending_interrupt_count(&self) -> usize {
        self.interrupts.len()
    }

    pub fn program_address_register(&self) -> ProgramAddressRegister {
        self.par
    }

    pub fn jump_history(&self) -> &JumpHistory {
        &self.jump_history
    }

    pub fn quantum_timer(&self) -> Word36 {
        self.quantum_timer
    }

    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    pub fn status(&self) -> ProcessorStatus {
        ProcessorStatus {
            upi: self.upi,
            running: self.running,
            stop_reason: self.stop_reason,
            stop_detail: self.stop_detail,
            program_address: self.par,
            designator: self.designator,
            last_interrupt: self.last_interrupt,
            cycles: self.cycles,
        }
    }

    // Maintenance panel operations.

    pub fn set_program_address_register(&mut self, par: ProgramAddressRegister) {
        self.par = par;
    }

    pub fn set_general_register(&mut self, index: usize, value: Word36) {
        self.grs.write(index, value);
    }

    pub fn set_designator_register(&mut self, value: DesignatorRegister) {
        self.designator = value;
    }

    pub fn set_quantum_timer(&mut self, value: Word36) {
        self.quantum_timer = value;
    }

    pub fn set_breakpoint(&mut self, breakpoint: Option<BreakpointRegister>) {
        self.breakpoint = breakpoint;
        self.breakpoint_hit = None;
    }
}
