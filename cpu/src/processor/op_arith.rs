//! Implementations of the fixed-point, logical and test instructions.
//!
//! - AA, ANA, AX, ANX: [`InstructionProcessor::op_aa`] and friends
//! - INC, DEC, INC2, DEC2: [`InstructionProcessor::op_increment`]
//! - OR, XOR, AND, MLU
//! - TE, TNE
use base::prelude::*;

use super::{InstructionProcessor, OpResult, ProgramCounterChange};

impl InstructionProcessor {
    /// Add `operand` to the register at `index`, recording carry and
    /// overflow in the designator register.
    fn add_to_register(&mut self, index: usize, operand: Word36) -> OpResult {
        let result = self.get_grs(index).add(operand);
        self.set_grs(index, result.sum);
        self.designator.set_carry(result.carry);
        self.designator.set_overflow(result.overflow);
        Ok(ProgramCounterChange::Advance)
    }

    /// Implements AA (add to A).
    pub(super) fn op_aa(&mut self) -> OpResult {
        let operand = self.fetch_operand(true, true, true, true)?;
        let index = self.a_register(self.current.a());
        self.add_to_register(index, operand)
    }

    /// Implements ANA (add negative to A).
    pub(super) fn op_ana(&mut self) -> OpResult {
        let operand = self.fetch_operand(true, true, true, true)?;
        let index = self.a_register(self.current.a());
        self.add_to_register(index, operand.negate())
    }

    /// Implements AX (add to X).
    pub(super) fn op_ax(&mut self) -> OpResult {
        let operand = self.fetch_operand(true, true, true, true)?;
        let index = self.x_register(self.current.a());
        self.add_to_register(index, operand)
    }

    /// Implements ANX (add negative to X).
    pub(super) fn op_anx(&mut self) -> OpResult {
        let operand = self.fetch_operand(true, true, true, true)?;
        let index = self.x_register(self.current.a());
        self.add_to_register(index, operand.negate())
    }

    /// Implements INC, DEC, INC2 and DEC2: add `delta` to the operand
    /// in place and skip the next instruction if the result is zero.
    pub(super) fn op_increment(&mut self, delta: Word36) -> OpResult {
        let result = self.update_operand(true, true, |operand| {
            Ok(operand.wrapping_add(delta))
        })?;
        if result.is_zero() {
            Ok(ProgramCounterChange::Skip)
        } else {
            Ok(ProgramCounterChange::Advance)
        }
    }

    /// Store `op(A(a), operand)` in A(a+1).
    fn logical_operation(&mut self, op: fn(Word36, Word36) -> Word36) -> OpResult {
        let operand = self.fetch_operand(true, true, true, true)?;
        let a = self.current.a();
        let value = op(self.get_grs(self.a_register(a)), operand);
        let destination = self.a_register(a + 1);
        self.set_grs(destination, value);
        Ok(ProgramCounterChange::Advance)
    }

    pub(super) fn op_or(&mut self) -> OpResult {
        self.logical_operation(|l, r| l | r)
    }

    pub(super) fn op_xor(&mut self) -> OpResult {
        self.logical_operation(|l, r| l ^ r)
    }

    pub(super) fn op_and(&mut self) -> OpResult {
        self.logical_operation(|l, r| l & r)
    }

    /// Implements MLU (masked load upper): bits of the operand where R2
    /// is set, bits of A(a) elsewhere.
    pub(super) fn op_mlu(&mut self) -> OpResult {
        let operand = self.fetch_operand(true, true, true, true)?;
        let a = self.current.a();
        let mask = self.get_grs(self.r_register(2)).bits();
        let value = (operand & mask) | (self.get_grs(self.a_register(a)) & !mask);
        let destination = self.a_register(a + 1);
        self.set_grs(destination, value);
        Ok(ProgramCounterChange::Advance)
    }

    fn test_equality(&mut self, skip_when_equal: bool) -> OpResult {
        let operand = self.fetch_operand(false, true, true, true)?;
        let register = self.get_grs(self.a_register(self.current.a()));
        if (register == operand) == skip_when_equal {
            Ok(ProgramCounterChange::Skip)
        } else {
            Ok(ProgramCounterChange::Advance)
        }
    }

    /// Implements TE (test equal).  The comparison is of bit patterns,
    /// so +0 and -0 differ.
    pub(super) fn op_te(&mut self) -> OpResult {
        self.test_equality(true)
    }

    /// Implements TNE (test not equal).
    pub(super) fn op_tne(&mut self) -> OpResult {
        self.test_equality(false)
    }
}
