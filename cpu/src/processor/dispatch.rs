//! Taking an interrupt.
//!
//! The processor state is saved in a frame on the interrupt control
//! stack (the bank based on B26; EX1 holds the frame size in XI and
//! the current top in XM).  Control then passes to the handler named
//! by the interrupt's entry in the vector bank based on B16.  If any
//! of this cannot be done the processor stops instead.
use base::prelude::*;
use tracing::{event, Level};

use super::InstructionProcessor;
use crate::basereg::{BankDescriptor, BankType, ICS_BASE_REGISTER, INTERRUPT_VECTOR_BASE_REGISTER};
use crate::designator::DesignatorRegister;
use crate::grs::{register_index, IndexRegister, RegisterName};
use crate::interrupt::MachineInterrupt;
use crate::registers::{AccessKey, LevelBdi, ProgramAddressRegister};
use crate::stop::StopReason;

/// The smallest interrupt control stack frame: PAR, DR, IKR, quantum
/// timer and the two interrupt status words.
const MINIMUM_ICS_FRAME_SIZE: u32 = 6;

impl InstructionProcessor {
    pub(super) fn dispatch_interrupt(&mut self, interrupt: MachineInterrupt) {
        event!(
            Level::DEBUG,
            "UPI {} taking interrupt {interrupt} at {}",
            self.upi,
            self.par
        );
        self.last_interrupt = Some(interrupt);
        self.indicator_key.short_status = interrupt.short_status;
        self.indicator_key.interrupt_class = interrupt.class.code();

        if let Err(reason) = self.push_ics_frame(&interrupt) {
            self.interrupt_dispatch_failed(reason, &interrupt);
            return;
        }
        match self.interrupt_handler(&interrupt) {
            Ok((bank, offset)) => {
                self.load_base_register(0, &bank);
                self.par = ProgramAddressRegister::new(bank.level_bdi, offset);
                let fault_handling = self.designator.fault_handling_in_progress();
                self.designator = DesignatorRegister::default();
                self.designator
                    .set_fault_handling_in_progress(fault_handling);
                self.designator.set_exec_register_set_selected(true);
                self.designator.set_arithmetic_exception_enabled(true);
                self.indicator_key.access_key = AccessKey::default();
            }
            Err(reason) => self.interrupt_dispatch_failed(reason, &interrupt),
        }
    }

    fn interrupt_dispatch_failed(&mut self, reason: StopReason, interrupt: &MachineInterrupt) {
        event!(
            Level::ERROR,
            "UPI {} could not take interrupt {interrupt}: {reason}",
            self.upi
        );
        self.stop(reason, interrupt.class.stop_detail());
    }

    fn push_ics_frame(&mut self, interrupt: &MachineInterrupt) -> Result<(), StopReason> {
        let ics = self.base_registers[ICS_BASE_REGISTER];
        if ics.void {
            return Err(StopReason::ICSBaseRegisterInvalid);
        }
        let pointer_index = register_index(RegisterName::EX(1), true);
        let pointer = IndexRegister(self.grs.read(pointer_index));
        let frame_size = pointer.xi().max(MINIMUM_ICS_FRAME_SIZE);
        let Some(top) = pointer.xm().checked_sub(frame_size) else {
            return Err(StopReason::ICSOverflow);
        };
        if !(ics.contains(top) && ics.contains(top + frame_size - 1)) {
            return Err(StopReason::ICSOverflow);
        }
        let frame = [
            self.par.to_word(),
            self.designator.word(),
            self.indicator_key.to_word(),
            self.quantum_timer,
            interrupt.status_word_0,
            interrupt.status_word_1,
        ];
        for (offset, word) in (0_u32..).zip(frame) {
            let written = ics
                .absolute(top + offset)
                .and_then(|address| self.storage.write(address, word).ok());
            if written.is_none() {
                return Err(StopReason::ICSOverflow);
            }
        }
        self.grs.write(pointer_index, pointer.with_xm(top).0);
        Ok(())
    }

    /// Find the handler for `interrupt` through its vector.
    fn interrupt_handler(
        &self,
        interrupt: &MachineInterrupt,
    ) -> Result<(BankDescriptor, u32), StopReason> {
        let vector = self.base_registers[INTERRUPT_VECTOR_BASE_REGISTER]
            .absolute(u32::from(interrupt.class.code()))
            .and_then(|address| self.storage.read(address).ok())
            .ok_or(StopReason::InterruptHandlerHardwareFailure)?;
        let (bank_name, offset) = split_halves(vector);
        let level_bdi = LevelBdi::from_half(bank_name);
        if level_bdi.is_void() {
            return Err(StopReason::InterruptHandlerInvalidLevelBDI);
        }
        let bank = self
            .banks
            .lookup(level_bdi)
            .ok_or(StopReason::InterruptHandlerInvalidLevelBDI)?;
        if bank.bank_type == BankType::Basic {
            return Err(StopReason::InterruptHandlerInvalidBankType);
        }
        if offset < bank.lower_limit || offset > bank.upper_limit {
            return Err(StopReason::InterruptHandlerOffsetOutOfRange);
        }
        Ok((bank.clone(), offset))
    }
}
