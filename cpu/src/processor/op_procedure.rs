//! Implementations of the procedure control, base register and generic
//! stack instructions.
//!
//! - CALL, LOCL: push a return control stack frame and transfer
//! - GOTO: transfer to another bank without touching the stack
//! - RTN: pop a frame and go back
//! - LBU, LBE, SBU: load and store base registers
//! - BUY, SELL: adjust a generic stack pointer held in an index register
//!
//! Each of these checks everything which could fault before it changes
//! a base register, because base registers are not restored when an
//! instruction is abandoned.
use base::prelude::*;

use super::rcs::RcsFrame;
use super::{InstructionProcessor, OpResult, ProgramCounterChange};
use crate::grs::{register_index, IndexRegister, RegisterName};
use crate::interrupt::{InvalidInstructionReason, MachineInterrupt, StackCondition};
use crate::registers::LevelBdi;

/// Bit 0 of user X0 after a CALL: the caller was in basic mode.
const CALLER_BASIC_MODE: u32 = 0o400_000;

/// A BUY or SELL operand: the index register holding the stack
/// pointer and the bank the stack lives in.
struct GenericStack {
    index: usize,
    register: IndexRegister,
    /// XM24 and XI12 are in use rather than XM and XI.
    wide: bool,
    pointer: i64,
    adjustment: i64,
    /// None if the base register is void.
    limits: Option<(i64, i64)>,
}

impl GenericStack {
    /// The stack pointer may range from the lower limit (a full
    /// stack) to one past the upper limit (an empty one).
    fn allows(&self, pointer: i64) -> bool {
        self.limits
            .is_some_and(|(lower, upper)| lower <= pointer && pointer <= upper + 1)
    }
}

impl InstructionProcessor {
    /// The frame which returns to the instruction after this one.
    fn return_frame(&self) -> RcsFrame {
        RcsFrame {
            return_bank: self.par.level_bdi,
            return_offset: self.par.program_counter.wrapping_add(1) & 0o777_777,
            designator_bits: self.designator.bits_12_through_17(),
            access_key: self.indicator_key.access_key,
        }
    }

    /// Read the operand of CALL or GOTO: the L,BDI of the target bank
    /// in H1 and the offset within it in H2.
    fn bank_transfer_operand(&mut self) -> Result<(LevelBdi, u32), MachineInterrupt> {
        let operand = self.fetch_operand(false, true, false, false)?;
        let (bank_name, offset) = split_halves(operand);
        Ok((LevelBdi::from_half(bank_name), offset))
    }

    /// Implements CALL.
    pub(super) fn op_call(&mut self) -> OpResult {
        let (level_bdi, offset) = self.bank_transfer_operand()?;
        let bank = self.lookup_bank(level_bdi)?;
        let frame = self.return_frame();
        self.rcs_push(&frame)?;
        let caller_mode = if self.designator.basic_mode_enabled() {
            CALLER_BASIC_MODE
        } else {
            0
        };
        self.set_grs(
            register_index(RegisterName::X(0), false),
            join_halves(caller_mode, frame.access_key.to_half()),
        );
        Ok(self.transfer_to_bank(&bank, offset))
    }

    /// Implements LOCL (local call), which stays in the current bank.
    pub(super) fn op_locl(&mut self) -> OpResult {
        let target = self.jump_operand()?;
        let frame = self.return_frame();
        self.rcs_push(&frame)?;
        Ok(ProgramCounterChange::Jump(target))
    }

    /// Implements GOTO.
    pub(super) fn op_goto(&mut self) -> OpResult {
        let (level_bdi, offset) = self.bank_transfer_operand()?;
        let bank = self.lookup_bank(level_bdi)?;
        Ok(self.transfer_to_bank(&bank, offset))
    }

    /// Implements RTN.  The caller's DB12-17 and access key come back
    /// from the frame.
    pub(super) fn op_rtn(&mut self) -> OpResult {
        let frame = self.rcs_pop()?;
        let bank = self.lookup_bank(frame.return_bank)?;
        let change = self.transfer_to_bank(&bank, frame.return_offset);
        self.designator
            .set_bits_12_through_17(frame.designator_bits);
        self.indicator_key.access_key = frame.access_key;
        Ok(change)
    }

    /// Base register `index` from the L,BDI in H1 of the operand; a void
    /// L,BDI voids the register.
    fn load_base_register_from_operand(&mut self, index: usize) -> OpResult {
        let operand = self.fetch_operand(false, true, false, false)?;
        let level_bdi = LevelBdi::from_half(left_half(operand));
        if level_bdi.is_void() {
            self.void_base_register(index);
        } else {
            let bank = self.lookup_bank(level_bdi)?;
            self.load_base_register(index, &bank);
        }
        Ok(ProgramCounterChange::Advance)
    }

    /// Implements LBU (load base user): B1-B15.
    pub(super) fn op_lbu(&mut self) -> OpResult {
        let a = usize::from(self.current.a());
        if a == 0 {
            return Err(MachineInterrupt::invalid_instruction(
                InvalidInstructionReason::InvalidBaseRegister,
            ));
        }
        self.load_base_register_from_operand(a)
    }

    /// Implements LBE (load base executive): B16-B31.
    pub(super) fn op_lbe(&mut self) -> OpResult {
        if self.designator.processor_privilege() != 0 {
            return Err(MachineInterrupt::invalid_instruction(
                InvalidInstructionReason::InvalidProcessorPrivilege,
            ));
        }
        let index = usize::from(self.current.a()) + 16;
        self.load_base_register_from_operand(index)
    }

    /// Implements SBU (store base user): the L,BDI last loaded into
    /// B(a) goes into H1 of the operand.
    pub(super) fn op_sbu(&mut self) -> OpResult {
        let level_bdi = self
            .active_base_table_entry(usize::from(self.current.a()))
            .unwrap_or(LevelBdi::VOID);
        self.store_field(
            false,
            true,
            PartialWord::H1,
            Word36::from(level_bdi.to_half()),
        )?;
        Ok(ProgramCounterChange::Advance)
    }

    fn generic_stack(&self) -> GenericStack {
        let inst = self.current;
        let index = self.x_register(inst.x());
        let register = IndexRegister(self.get_grs(index));
        let wide = self.indexing_24bit();
        let (modifier, increment) = if wide {
            (register.xm24(), register.xi12())
        } else {
            (register.xm(), register.xi())
        };
        let bank = self.base_registers[self.extended_base_register_index(inst)];
        GenericStack {
            index,
            register,
            wide,
            pointer: i64::from(modifier),
            adjustment: i64::from(increment) + i64::from(inst.d()),
            limits: (!bank.void)
                .then(|| (i64::from(bank.lower_limit), i64::from(bank.upper_limit))),
        }
    }

    fn move_stack_pointer(&mut self, stack: GenericStack, pointer: i64) {
        let updated = if stack.wide {
            stack.register.with_xm24(pointer as u32)
        } else {
            stack.register.with_xm(pointer as u32)
        };
        self.set_grs(stack.index, updated.0);
    }

    /// Implements BUY: allocate a frame by moving the stack pointer
    /// down by the frame size plus the displacement.
    pub(super) fn op_buy(&mut self) -> OpResult {
        let stack = self.generic_stack();
        let pointer = stack.pointer - stack.adjustment;
        if !stack.allows(pointer) {
            return Err(MachineInterrupt::stack_condition(StackCondition::Overflow));
        }
        self.move_stack_pointer(stack, pointer);
        Ok(ProgramCounterChange::Advance)
    }

    /// Implements SELL: release a frame allocated by BUY.
    pub(super) fn op_sell(&mut self) -> OpResult {
        let stack = self.generic_stack();
        let pointer = stack.pointer + stack.adjustment;
        if !stack.allows(pointer) {
            return Err(MachineInterrupt::stack_condition(StackCondition::Underflow));
        }
        self.move_stack_pointer(stack, pointer);
        Ok(ProgramCounterChange::Advance)
    }
}
