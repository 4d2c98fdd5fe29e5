//! Machine interrupts.
//!
//! Every fault or condition the processor can report is described
//! by a [`MachineInterrupt`].  The interrupt class determines its
//! priority (lower class numbers are more urgent), whether it can be
//! deferred, and which entry of the interrupt vector bank handles it.
use std::error::Error;
use std::fmt::{self, Display, Formatter};

use serde::Serialize;

use base::prelude::*;

/// The interrupt classes.  The discriminant of each is its class
/// number, which is also its priority and its offset in the
/// interrupt vector bank.
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy, PartialOrd, Ord, Serialize)]
#[repr(u8)]
pub enum InterruptClass {
    HardwareDefault = 0o00,
    HardwareCheck = 0o01,
    ReferenceViolation = 0o10,
    AddressingException = 0o11,
    TerminalAddressingException = 0o12,
    RcsGenericStackUnderOverflow = 0o13,
    Signal = 0o14,
    TestAndSet = 0o15,
    InvalidInstruction = 0o16,
    PageException = 0o17,
    ArithmeticException = 0o20,
    DataException = 0o21,
    OperationTrap = 0o22,
    Breakpoint = 0o23,
    QuantumTimer = 0o24,
    SoftwareBreak = 0o30,
    JumpHistoryFull = 0o31,
    Dayclock = 0o33,
    PerformanceMonitoring = 0o34,
    InitialProgramLoad = 0o35,
    UpiInitial = 0o36,
    UpiNormal = 0o37,
}

impl InterruptClass {
    pub const fn code(self) -> u8 {
        self as u8
    }

    /// The stop detail reported when no handler for this class could
    /// be reached: 01000 plus the class number.
    pub const fn stop_detail(self) -> u64 {
        0o1000 + self as u64
    }

    #[must_use]
    pub const fn all_classes() -> [InterruptClass; 22] {
        use InterruptClass::*;
        [
            HardwareDefault,
            HardwareCheck,
            ReferenceViolation,
            AddressingException,
            TerminalAddressingException,
            RcsGenericStackUnderOverflow,
            Signal,
            TestAndSet,
            InvalidInstruction,
            PageException,
            ArithmeticException,
            DataException,
            OperationTrap,
            Breakpoint,
            QuantumTimer,
            SoftwareBreak,
            JumpHistoryFull,
            Dayclock,
            PerformanceMonitoring,
            InitialProgramLoad,
            UpiInitial,
            UpiNormal,
        ]
    }

    pub fn from_code(code: u8) -> Option<InterruptClass> {
        Self::all_classes().into_iter().find(|c| c.code() == code)
    }

    /// Indicates whether delivery of this class waits until the
    /// deferrable-interrupt-enabled designator is set.
    pub const fn deferrability(self) -> Deferrability {
        use InterruptClass::*;
        match self {
            QuantumTimer | SoftwareBreak | JumpHistoryFull | Dayclock | PerformanceMonitoring
            | UpiNormal => Deferrability::Deferrable,
            _ => Deferrability::Exigent,
        }
    }

    /// Synchronous interrupts are caused by the instruction being
    /// executed; asynchronous ones arrive from outside the processor.
    pub const fn synchrony(self) -> Synchrony {
        use InterruptClass::*;
        match self {
            HardwareDefault | HardwareCheck | Dayclock | PerformanceMonitoring
            | InitialProgramLoad | UpiInitial | UpiNormal => Synchrony::Asynchronous,
            QuantumTimer | JumpHistoryFull | Breakpoint => Synchrony::Pended,
            _ => Synchrony::Synchronous,
        }
    }
}

impl Display for InterruptClass {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), fmt::Error> {
        use InterruptClass::*;
        let name = match self {
            HardwareDefault => "HardwareDefault",
            HardwareCheck => "HardwareCheck",
            ReferenceViolation => "ReferenceViolation",
            AddressingException => "AddressingException",
            TerminalAddressingException => "TerminalAddressingException",
            RcsGenericStackUnderOverflow => "RCSGenericStackUnderOverflow",
            Signal => "Signal",
            TestAndSet => "TestAndSet",
            InvalidInstruction => "InvalidInstruction",
            PageException => "PageException",
            ArithmeticException => "ArithmeticException",
            DataException => "DataException",
            OperationTrap => "OperationTrap",
            Breakpoint => "Breakpoint",
            QuantumTimer => "QuantumTimer",
            SoftwareBreak => "SoftwareBreak",
            JumpHistoryFull => "JumpHistoryFull",
            Dayclock => "Dayclock",
            PerformanceMonitoring => "PerformanceMonitoring",
            InitialProgramLoad => "InitialProgramLoad",
            UpiInitial => "UPIInitial",
            UpiNormal => "UPINormal",
        };
        write!(f, "{name} ({:03o})", self.code())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Deferrability {
    Deferrable,
    Exigent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Synchrony {
    Synchronous,
    Asynchronous,
    /// Detected by the processor itself and raised between
    /// instructions.
    Pended,
}

/// A Fault prevents the interrupted instruction from completing; a
/// NonFault is reported once it has completed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ConditionCategory {
    Fault,
    NonFault,
}

/// Where in the instruction cycle the interrupt was detected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum InterruptPoint {
    BetweenInstructions,
    MidExecution,
    InstructionFetch,
}

/// Identifies the access which caused a reference violation.  The
/// discriminant is the short status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[repr(u8)]
pub enum ReferenceViolationKind {
    GeneralRegisterSet = 0,
    StorageLimits = 1,
    ReadAccess = 2,
    WriteAccess = 3,
    ExecuteAccess = 4,
}

/// Why an instruction could not be executed.  The discriminant is
/// the short status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[repr(u8)]
pub enum InvalidInstructionReason {
    UndefinedFunctionCode = 0,
    InvalidProcessorPrivilege = 1,
    InvalidBaseRegister = 2,
}

/// Why a bank could not be addressed.  The discriminant is the short
/// status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[repr(u8)]
pub enum AddressingExceptionReason {
    UndefinedBankDescriptor = 0,
    InvalidBankType = 1,
    VoidReturnControlStack = 2,
    InvalidProcessor = 3,
}

/// Which way a stack ran out.  The discriminant is the short status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[repr(u8)]
pub enum StackCondition {
    Overflow = 0,
    Underflow = 1,
}

/// A pending or delivered interrupt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct MachineInterrupt {
    pub class: InterruptClass,
    pub category: ConditionCategory,
    pub point: InterruptPoint,
    pub short_status: u8,
    pub status_word_0: Word36,
    pub status_word_1: Word36,
}

impl MachineInterrupt {
    fn new(
        class: InterruptClass,
        category: ConditionCategory,
        point: InterruptPoint,
        short_status: u8,
    ) -> MachineInterrupt {
        MachineInterrupt {
            class,
            category,
            point,
            short_status,
            status_word_0: Word36::ZERO,
            status_word_1: Word36::ZERO,
        }
    }

    pub fn with_status_words(self, isw0: Word36, isw1: Word36) -> MachineInterrupt {
        MachineInterrupt {
            status_word_0: isw0,
            status_word_1: isw1,
            ..self
        }
    }

    pub fn reference_violation(kind: ReferenceViolationKind, fetch: bool) -> MachineInterrupt {
        MachineInterrupt::new(
            InterruptClass::ReferenceViolation,
            ConditionCategory::Fault,
            if fetch {
                InterruptPoint::InstructionFetch
            } else {
                InterruptPoint::MidExecution
            },
            kind as u8,
        )
    }

    pub fn invalid_instruction(reason: InvalidInstructionReason) -> MachineInterrupt {
        MachineInterrupt::new(
            InterruptClass::InvalidInstruction,
            ConditionCategory::Fault,
            InterruptPoint::MidExecution,
            reason as u8,
        )
    }

    pub fn addressing_exception(reason: AddressingExceptionReason) -> MachineInterrupt {
        MachineInterrupt::new(
            InterruptClass::AddressingException,
            ConditionCategory::Fault,
            InterruptPoint::MidExecution,
            reason as u8,
        )
    }

    pub fn stack_condition(condition: StackCondition) -> MachineInterrupt {
        MachineInterrupt::new(
            InterruptClass::RcsGenericStackUnderOverflow,
            ConditionCategory::Fault,
            InterruptPoint::MidExecution,
            condition as u8,
        )
    }

    pub fn test_and_set() -> MachineInterrupt {
        MachineInterrupt::new(
            InterruptClass::TestAndSet,
            ConditionCategory::Fault,
            InterruptPoint::MidExecution,
            0,
        )
    }

    /// Storage did not respond at an absolute address which a base
    /// register claimed was valid.
    pub fn hardware_check(absolute_address: usize) -> MachineInterrupt {
        MachineInterrupt::new(
            InterruptClass::HardwareCheck,
            ConditionCategory::Fault,
            InterruptPoint::MidExecution,
            0,
        )
        .with_status_words(Word36::truncate(absolute_address as u64), Word36::ZERO)
    }

    /// The interrupt raised by ER (short status 0) or SGNL (short
    /// status 1).  The instruction completes before it is taken.
    pub fn signal(short_status: u8, operand: Word36) -> MachineInterrupt {
        MachineInterrupt::new(
            InterruptClass::Signal,
            ConditionCategory::NonFault,
            InterruptPoint::MidExecution,
            short_status,
        )
        .with_status_words(Word36::ZERO, operand)
    }

    pub fn upi_normal(sender: u8) -> MachineInterrupt {
        MachineInterrupt::new(
            InterruptClass::UpiNormal,
            ConditionCategory::NonFault,
            InterruptPoint::BetweenInstructions,
            0,
        )
        .with_status_words(Word36::from(sender), Word36::ZERO)
    }

    pub fn quantum_timer() -> MachineInterrupt {
        MachineInterrupt::new(
            InterruptClass::QuantumTimer,
            ConditionCategory::NonFault,
            InterruptPoint::BetweenInstructions,
            0,
        )
    }

    pub fn jump_history_full() -> MachineInterrupt {
        MachineInterrupt::new(
            InterruptClass::JumpHistoryFull,
            ConditionCategory::NonFault,
            InterruptPoint::BetweenInstructions,
            0,
        )
    }

    pub fn breakpoint(absolute_address: usize) -> MachineInterrupt {
        MachineInterrupt::new(
            InterruptClass::Breakpoint,
            ConditionCategory::NonFault,
            InterruptPoint::BetweenInstructions,
            0,
        )
        .with_status_words(
            Word36::truncate(absolute_address as u64),
            Word36::ZERO,
        )
    }

    pub fn is_deferrable(&self) -> bool {
        self.class.deferrability() == Deferrability::Deferrable
    }

    pub fn is_fault(&self) -> bool {
        self.category == ConditionCategory::Fault
    }
}

impl Display for MachineInterrupt {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), fmt::Error> {
        write!(
            f,
            "{} short status {:o} (ISW0 {:o}, ISW1 {:o})",
            self.class, self.short_status, self.status_word_0, self.status_word_1
        )
    }
}

impl Error for MachineInterrupt {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_class_codes_round_trip() {
        for class in InterruptClass::all_classes() {
            assert_eq!(InterruptClass::from_code(class.code()), Some(class));
        }
        assert_eq!(InterruptClass::from_code(0o02), None);
        assert_eq!(InterruptClass::from_code(0o32), None);
        assert_eq!(InterruptClass::from_code(0o40), None);
    }

    #[test]
    fn test_deferrable_classes() {
        let deferrable: Vec<u8> = InterruptClass::all_classes()
            .into_iter()
            .filter(|c| c.deferrability() == Deferrability::Deferrable)
            .map(InterruptClass::code)
            .collect();
        assert_eq!(deferrable, vec![0o24, 0o30, 0o31, 0o33, 0o34, 0o37]);
        assert_eq!(InterruptClass::from_code(0o31), Some(InterruptClass::JumpHistoryFull));
    }

    #[test]
    fn test_stop_detail() {
        assert_eq!(InterruptClass::InvalidInstruction.stop_detail(), 0o1016);
        assert_eq!(InterruptClass::UpiNormal.stop_detail(), 0o1037);
    }

    #[test]
    fn test_signal_is_not_a_fault() {
        let sgnl = MachineInterrupt::signal(1, Word36::from(0o77_u32));
        assert!(!sgnl.is_fault());
        assert_eq!(sgnl.short_status, 1);
        assert_eq!(sgnl.status_word_1, Word36::from(0o77_u32));
        assert!(MachineInterrupt::reference_violation(ReferenceViolationKind::ReadAccess, false)
            .is_fault());
    }
}
