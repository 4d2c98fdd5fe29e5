//! Implementations of the jump instructions.
//!
//! - JZ, JNZ, JP, JN, JB, JNB: test A(a)
//! - JC, JNC, JO, JNO: test the carry and overflow designators
//! - J, HJ, JK
//! - AAIJ, PAIJ: change DB13 and jump (privileged)
//! - LMJ: jump, leaving the return address in X(a)
//! - HLTJ: jump and stop (privileged)
//! - JGD: jump on a greater-than-zero register, always decrementing it
//!
//! The target of a jump is only computed when the jump is taken, so a
//! jump which is not taken does not auto-increment its index register.
use base::prelude::*;

use super::address::OperandLocation;
use super::{InstructionProcessor, OpResult, ProgramCounterChange};
use crate::grs::{IndexRegister, GRS_SIZE};
use crate::interrupt::{InvalidInstructionReason, MachineInterrupt};
use crate::stop::StopReason;

fn privilege_violation() -> MachineInterrupt {
    MachineInterrupt::invalid_instruction(InvalidInstructionReason::InvalidProcessorPrivilege)
}

impl InstructionProcessor {
    fn jump_if(&mut self, condition: bool) -> OpResult {
        if condition {
            Ok(ProgramCounterChange::Jump(self.jump_operand()?))
        } else {
            Ok(ProgramCounterChange::Advance)
        }
    }

    fn require_privilege_zero(&self) -> Result<(), MachineInterrupt> {
        if self.designator.processor_privilege() == 0 {
            Ok(())
        } else {
            Err(privilege_violation())
        }
    }

    pub(super) fn op_conditional_jump(&mut self, function: Function) -> OpResult {
        use Function::*;
        let a = self.get_grs(self.a_register(self.current.a()));
        let condition = match function {
            Jz => a.is_zero(),
            Jnz => !a.is_zero(),
            Jp => !a.is_negative(),
            Jn => a.is_negative(),
            Jb => a.bit(35),
            Jnb => !a.bit(35),
            Jc => self.designator.carry(),
            Jnc => !self.designator.carry(),
            Jo => self.designator.overflow(),
            Jno => !self.designator.overflow(),
            _ => return self.op_illegal(),
        };
        self.jump_if(condition)
    }

    /// Implements J and HJ.
    pub(super) fn op_j(&mut self) -> OpResult {
        self.jump_if(true)
    }

    /// Implements AAIJ (allow all interrupts and jump).
    pub(super) fn op_aaij(&mut self) -> OpResult {
        self.require_privilege_zero()?;
        let target = self.jump_operand()?;
        self.designator.set_deferrable_interrupt_enabled(true);
        Ok(ProgramCounterChange::Jump(target))
    }

    /// Implements PAIJ (prevent all interrupts and jump).
    pub(super) fn op_paij(&mut self) -> OpResult {
        self.require_privilege_zero()?;
        let target = self.jump_operand()?;
        self.designator.set_deferrable_interrupt_enabled(false);
        Ok(ProgramCounterChange::Jump(target))
    }

    /// Implements LMJ (load modifier and jump).
    pub(super) fn op_lmj(&mut self) -> OpResult {
        let target = self.jump_operand()?;
        let index = self.x_register(self.current.a());
        let link = IndexRegister(self.get_grs(index))
            .with_xm(self.par.program_counter.wrapping_add(1) & 0o777_777);
        self.set_grs(index, link.0);
        Ok(ProgramCounterChange::Jump(target))
    }

    /// Implements HLTJ (halt jump).  The processor stops with the
    /// program address register already at the jump target.
    pub(super) fn op_hltj(&mut self) -> OpResult {
        self.require_privilege_zero()?;
        let target = self.jump_operand()?;
        self.stop(StopReason::HaltJumpExecuted, 0);
        Ok(ProgramCounterChange::Jump(target))
    }

    /// Implements JGD (jump greater and decrement).  The j and a
    /// fields together name any register of the GRS.
    pub(super) fn op_jgd(&mut self) -> OpResult {
        let inst = self.current;
        let index = ((usize::from(inst.j()) << 4) | usize::from(inst.a())) % GRS_SIZE;
        let location = OperandLocation::Grs(index);
        self.check_access(location, true)?;
        let value = self.get_grs(index);
        let change = self.jump_if(value.to_i64() > 0)?;
        self.set_grs(index, value.wrapping_sub(Word36::ONE));
        Ok(change)
    }
}
