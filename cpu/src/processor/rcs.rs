//! The return control stack.
//!
//! CALL and LOCL push a two-word frame describing where to return
//! to; RTN pops it.  The stack lives in the bank based on B25 and
//! grows downwards; EX0 holds the relative address of the top frame.
use base::prelude::*;

use super::InstructionProcessor;
use crate::basereg::RCS_BASE_REGISTER;
use crate::grs::{register_index, RegisterName};
use crate::interrupt::{AddressingExceptionReason, MachineInterrupt, StackCondition};
use crate::registers::{AccessKey, LevelBdi};

const FRAME_SIZE: u32 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RcsFrame {
    pub return_bank: LevelBdi,
    pub return_offset: u32,
    /// Designator register bits 12-17 of the caller.
    pub designator_bits: u8,
    pub access_key: AccessKey,
}

impl RcsFrame {
    pub fn to_words(&self) -> [Word36; 2] {
        [
            join_halves(self.return_bank.to_half(), self.return_offset),
            join_halves(
                u32::from(self.designator_bits & 0o77),
                self.access_key.to_half(),
            ),
        ]
    }

    pub fn from_words(words: [Word36; 2]) -> RcsFrame {
        let (bank, offset) = split_halves(words[0]);
        let (bits, key) = split_halves(words[1]);
        RcsFrame {
            return_bank: LevelBdi::from_half(bank),
            return_offset: offset,
            designator_bits: (bits & 0o77) as u8,
            access_key: AccessKey::from_half(key),
        }
    }
}

impl InstructionProcessor {
    fn rcs_pointer_index() -> usize {
        register_index(RegisterName::EX(0), true)
    }

    pub(super) fn rcs_push(&mut self, frame: &RcsFrame) -> Result<(), MachineInterrupt> {
        let rcs = self.base_registers[RCS_BASE_REGISTER];
        if rcs.void {
            return Err(MachineInterrupt::addressing_exception(
                AddressingExceptionReason::VoidReturnControlStack,
            ));
        }
        let top = self.get_grs(Self::rcs_pointer_index()).to_i64();
        let new_top = top - i64::from(FRAME_SIZE);
        if new_top < i64::from(rcs.lower_limit) {
            return Err(MachineInterrupt::stack_condition(StackCondition::Overflow));
        }
        let new_top = u32::try_from(new_top)
            .map_err(|_| MachineInterrupt::stack_condition(StackCondition::Overflow))?;
        let (Some(first), Some(second)) = (rcs.absolute(new_top), rcs.absolute(new_top + 1))
        else {
            return Err(MachineInterrupt::stack_condition(StackCondition::Overflow));
        };
        let [word0, word1] = frame.to_words();
        for (address, word) in [(first, word0), (second, word1)] {
            self.storage
                .write(address, word)
                .map_err(|_| MachineInterrupt::hardware_check(address))?;
        }
        self.set_grs(Self::rcs_pointer_index(), Word36::from(new_top));
        Ok(())
    }

    pub(super) fn rcs_pop(&mut self) -> Result<RcsFrame, MachineInterrupt> {
        let rcs = self.base_registers[RCS_BASE_REGISTER];
        if rcs.void {
            return Err(MachineInterrupt::addressing_exception(
                AddressingExceptionReason::VoidReturnControlStack,
            ));
        }
        let top = self.get_grs(Self::rcs_pointer_index()).to_i64();
        if top < i64::from(rcs.lower_limit)
            || top + i64::from(FRAME_SIZE) > i64::from(rcs.upper_limit) + 1
        {
            return Err(MachineInterrupt::stack_condition(StackCondition::Underflow));
        }
        let top = top as u32;
        let mut words = [Word36::ZERO; 2];
        for (k, word) in words.iter_mut().enumerate() {
            let address = rcs
                .absolute(top + k as u32)
                .ok_or(MachineInterrupt::stack_condition(StackCondition::Underflow))?;
            *word = self
                .storage
                .read(address)
                .map_err(|_| MachineInterrupt::hardware_check(address))?;
        }
        self.set_grs(Self::rcs_pointer_index(), Word36::from(top + FRAME_SIZE));
        Ok(RcsFrame::from_words(words))
    }
}
