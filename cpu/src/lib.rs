//! This crate emulates the instruction processors of the machine:
//! the general register set, base registers and banks, interrupts
//! and the execution of basic and extended mode instructions.
#![crate_name = "cpu"]

mod basereg;
mod config;
mod designator;
mod diagnostics;
mod grs;
mod image;
mod interrupt;
mod interruptunit;
mod memory;
mod processor;
mod registers;
mod stop;
mod system;
mod upi;

pub use basereg::{
    AccessPermissions, BankDescriptor, BankDescriptorTable, BankTableError, BankType,
    BaseRegister, BASE_REGISTER_COUNT, ICS_BASE_REGISTER, INTERRUPT_VECTOR_BASE_REGISTER,
    RCS_BASE_REGISTER,
};
pub use config::{
    ConfigurationError, ProcessorConfiguration, SystemConfiguration, MAX_PROCESSORS,
};
pub use designator::DesignatorRegister;
pub use diagnostics::CurrentInstructionDiagnostics;
pub use grs::{
    is_access_allowed, register_index, GeneralRegisterSet, IndexRegister, RegisterName, GRS_SIZE,
};
pub use image::{
    BankImage, LoadError, ProgramImage, ProgramStart, ICS_BANK, ICS_FRAME_SIZE,
    INTERRUPT_HANDLER_BANK, INTERRUPT_VECTOR_BANK, RCS_BANK,
};
pub use interrupt::{
    AddressingExceptionReason, ConditionCategory, Deferrability, InterruptClass, InterruptPoint,
    InvalidInstructionReason, MachineInterrupt, ReferenceViolationKind, StackCondition, Synchrony,
};
pub use memory::{MainStorage, MemoryOpFailure};
pub use processor::{
    BreakpointRegister, InstructionProcessor, JumpHistory, OperandLocation, ProcessorStatus,
    ProgramCounterChange, RcsFrame, JUMP_HISTORY_SIZE,
};
pub use registers::{
    AccessKey, AccessLock, IndicatorKeyRegister, LevelBdi, ProgramAddressRegister,
};
pub use stop::StopReason;
pub use system::System;
pub use upi::{SendOutcome, SignalChannel, SignalError, UpiPort};
