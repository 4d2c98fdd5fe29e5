//! Implementations of the shift instructions (function 073, j 000-013).
//!
//! The shift count is the low seven bits of the instruction's relative
//! address; nothing is read from storage except by LSC and DLSC,
//! which normalize their operand.
use base::prelude::*;
use base::shift;

use super::{InstructionProcessor, OpResult, ProgramCounterChange};

type SingleShift = fn(Word36, u32) -> Word36;
type DoubleShift = fn(Word36, Word36, u32) -> (Word36, Word36);

enum Shift {
    Single(SingleShift),
    Double(DoubleShift),
}

fn shift_for(function: Function) -> Option<Shift> {
    use Function::*;
    let shift = match function {
        Ssc => Shift::Single(shift::circular_right),
        Ssl => Shift::Single(shift::logical_right),
        Ssa => Shift::Single(shift::algebraic_right),
        Lssc => Shift::Single(shift::circular_left),
        Lssl => Shift::Single(shift::logical_left),
        Dsc => Shift::Double(shift::double_circular_right),
        Dsl => Shift::Double(shift::double_logical_right),
        Dsa => Shift::Double(shift::double_algebraic_right),
        Ldsc => Shift::Double(shift::double_circular_left),
        Ldsl => Shift::Double(shift::double_logical_left),
        _ => return None,
    };
    Some(shift)
}

impl InstructionProcessor {
    /// Implements SSC, DSC, SSL, DSL, SSA, DSA, LSSC, LDSC, LSSL and
    /// LDSL.  Double shifts treat A(a) and A(a+1) as one 72-bit value.
    pub(super) fn op_shift(&mut self, function: Function) -> OpResult {
        let count = self.plain_relative_address() & 0o177;
        let a = self.current.a();
        let upper_index = self.a_register(a);
        match shift_for(function) {
            Some(Shift::Single(op)) => {
                let value = op(self.get_grs(upper_index), count);
                self.set_grs(upper_index, value);
            }
            Some(Shift::Double(op)) => {
                let lower_index = self.a_register(a + 1);
                let (upper, lower) =
                    op(self.get_grs(upper_index), self.get_grs(lower_index), count);
                self.set_grs(upper_index, upper);
                self.set_grs(lower_index, lower);
            }
            None => return self.op_illegal(),
        }
        Ok(ProgramCounterChange::Advance)
    }

    /// Implements LSC (load shift and count).
    pub(super) fn op_lsc(&mut self) -> OpResult {
        let operand = self.fetch_operand(true, true, false, false)?;
        let (value, count) = shift::normalize(operand);
        let a = self.current.a();
        let value_index = self.a_register(a);
        let count_index = self.a_register(a + 1);
        self.set_grs(value_index, value);
        self.set_grs(count_index, Word36::from(count));
        Ok(ProgramCounterChange::Advance)
    }

    /// Implements DLSC (double load shift and count).
    pub(super) fn op_dlsc(&mut self) -> OpResult {
        let words = self.fetch_consecutive(true, 2)?;
        let (upper, lower, count) = shift::double_normalize(words[0], words[1]);
        let a = self.current.a();
        for (k, value) in (0_u8..).zip([upper, lower, Word36::from(count)]) {
            let index = self.a_register(a + k);
            self.set_grs(index, value);
        }
        Ok(ProgramCounterChange::Advance)
    }
}
