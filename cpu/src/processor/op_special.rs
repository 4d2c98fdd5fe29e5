//! Implementations of the interrupt-related and special instructions.
//!
//! - ER, SGNL: [`InstructionProcessor::op_er`], [`InstructionProcessor::op_sgnl`]
//! - NOP
//! - SEND: interrupt another processor
//! - LD, SD: load and store the designator register
//! - TS, TSS, TCS: test and set
//! - IAR, HALT: stop the processor
use base::prelude::*;
use tracing::{event, Level};

use super::{InstructionProcessor, OpResult, ProgramCounterChange};
use crate::designator::DesignatorRegister;
use crate::interrupt::{AddressingExceptionReason, InvalidInstructionReason, MachineInterrupt};
use crate::stop::StopReason;
use crate::upi::SendOutcome;

/// Bit 5 of S1, the lock bit of a test-and-set cell.
const TEST_AND_SET_LOCK: u64 = 0o010_000_000_000;
const TEST_AND_SET_FIELD: u64 = 0o770_000_000_000;

fn privilege_violation() -> MachineInterrupt {
    MachineInterrupt::invalid_instruction(InvalidInstructionReason::InvalidProcessorPrivilege)
}

fn invalid_processor() -> MachineInterrupt {
    MachineInterrupt::addressing_exception(AddressingExceptionReason::InvalidProcessor)
}

impl InstructionProcessor {
    /// Implements ER (executive request).  The interrupt is taken
    /// after the instruction completes.
    pub(super) fn op_er(&mut self) -> OpResult {
        let operand = self.plain_relative_address();
        Err(MachineInterrupt::signal(0, Word36::from(operand)))
    }

    /// Implements SGNL (signal).
    pub(super) fn op_sgnl(&mut self) -> OpResult {
        let operand = self.plain_relative_address();
        Err(MachineInterrupt::signal(1, Word36::from(operand)))
    }

    /// Implements NOP.  The operand address is still formed, so any
    /// auto-increment happens.
    pub(super) fn op_nop(&mut self) -> OpResult {
        self.jump_operand()?;
        Ok(ProgramCounterChange::Advance)
    }

    /// Implements SEND, which raises a UPI interrupt on the processor
    /// named by the operand address.
    pub(super) fn op_send(&mut self) -> OpResult {
        let target = u8::try_from(self.plain_relative_address()).map_err(|_| invalid_processor())?;
        match self.channel.send(self.upi, target) {
            Ok(SendOutcome::SelfAddressed | SendOutcome::Delivered) => {
                Ok(ProgramCounterChange::Advance)
            }
            Err(e) => {
                event!(Level::DEBUG, "UPI {}: {e}", self.upi);
                Err(invalid_processor())
            }
        }
    }

    /// Implements LD (load designator register).
    pub(super) fn op_ld(&mut self) -> OpResult {
        if self.designator.processor_privilege() != 0 {
            return Err(privilege_violation());
        }
        let operand = self.fetch_operand(false, true, false, false)?;
        self.designator = DesignatorRegister::from(operand);
        Ok(ProgramCounterChange::Advance)
    }

    /// Implements SD (store designator register).
    pub(super) fn op_sd(&mut self) -> OpResult {
        let value = self.designator.word();
        self.store_operand(false, true, false, value)?;
        Ok(ProgramCounterChange::Advance)
    }

    /// Implements TS (test and set).  A cell which is already locked
    /// raises a Test and Set interrupt.
    pub(super) fn op_ts(&mut self) -> OpResult {
        self.update_operand(true, false, |cell| {
            if cell.bits() & TEST_AND_SET_LOCK != 0 {
                Err(MachineInterrupt::test_and_set())
            } else {
                Ok((cell & !TEST_AND_SET_FIELD) | TEST_AND_SET_LOCK)
            }
        })?;
        Ok(ProgramCounterChange::Advance)
    }

    /// Implements TSS (test and set and skip): lock the cell and skip
    /// if it was clear.
    pub(super) fn op_tss(&mut self) -> OpResult {
        let mut was_locked = false;
        self.update_operand(true, false, |cell| {
            was_locked = cell.bits() & TEST_AND_SET_LOCK != 0;
            if was_locked {
                Ok(cell)
            } else {
                Ok((cell & !TEST_AND_SET_FIELD) | TEST_AND_SET_LOCK)
            }
        })?;
        if was_locked {
            Ok(ProgramCounterChange::Advance)
        } else {
            Ok(ProgramCounterChange::Skip)
        }
    }

    /// Implements TCS (test and clear and skip): unlock the cell and
    /// skip if it was locked.
    pub(super) fn op_tcs(&mut self) -> OpResult {
        let mut was_locked = false;
        self.update_operand(true, false, |cell| {
            was_locked = cell.bits() & TEST_AND_SET_LOCK != 0;
            if was_locked {
                Ok(cell & !TEST_AND_SET_FIELD)
            } else {
                Ok(cell)
            }
        })?;
        if was_locked {
            Ok(ProgramCounterChange::Skip)
        } else {
            Ok(ProgramCounterChange::Advance)
        }
    }

    /// Implements IAR (initiate auto-recovery), which stops the
    /// processor.
    pub(super) fn op_iar(&mut self) -> OpResult {
        if self.designator.processor_privilege() != 0 {
            return Err(privilege_violation());
        }
        let detail = self.plain_relative_address();
        self.stop(StopReason::InitiateAutoRecovery, u64::from(detail));
        Ok(ProgramCounterChange::Advance)
    }

    /// Implements HALT, the emulator's debugging stop.  The stop detail
    /// is the operand address.
    pub(super) fn op_halt(&mut self) -> OpResult {
        let detail = self.plain_relative_address();
        self.stop(StopReason::Debug, u64::from(detail));
        Ok(ProgramCounterChange::Advance)
    }

    pub(super) fn op_illegal(&mut self) -> OpResult {
        Err(MachineInterrupt::invalid_instruction(
            InvalidInstructionReason::UndefinedFunctionCode,
        ))
    }
}
