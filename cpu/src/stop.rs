//! Why a processor stopped.
use std::fmt::{self, Display, Formatter};

use serde::Serialize;

/// The reason a processor is not running.  Each stop also carries a
/// numeric detail whose meaning depends on the reason (for example
/// the operand of a HALT, or 01000 plus an interrupt class).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum StopReason {
    /// The processor has never run.
    Initial,
    /// The processor has been cleared.
    Cleared,
    /// A HALT instruction was executed.
    Debug,
    /// The emulator itself stopped the processor (for example on
    /// reaching the configured cycle limit).
    Development,
    Breakpoint,
    HaltJumpExecuted,
    ICSBaseRegisterInvalid,
    ICSOverflow,
    InitiateAutoRecovery,
    /// The initial program bank could not be based on B0.
    L0BaseRegisterInvalid,
    /// An operator asked for the processor to stop.
    PanelHalt,
    InterruptHandlerHardwareFailure,
    InterruptHandlerOffsetOutOfRange,
    InterruptHandlerInvalidBankType,
    InterruptHandlerInvalidLevelBDI,
}

impl Display for StopReason {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), fmt::Error> {
        use StopReason::*;
        f.write_str(match self {
            Initial => "Initial",
            Cleared => "Cleared",
            Debug => "Debug",
            Development => "Development",
            Breakpoint => "Breakpoint",
            HaltJumpExecuted => "HaltJumpExecuted",
            ICSBaseRegisterInvalid => "ICSBaseRegisterInvalid",
            ICSOverflow => "ICSOverflow",
            InitiateAutoRecovery => "InitiateAutoRecovery",
            L0BaseRegisterInvalid => "L0BaseRegisterInvalid",
            PanelHalt => "PanelHalt",
            InterruptHandlerHardwareFailure => "InterruptHandlerHardwareFailure",
            InterruptHandlerOffsetOutOfRange => "InterruptHandlerOffsetOutOfRange",
            InterruptHandlerInvalidBankType => "InterruptHandlerInvalidBankType",
            InterruptHandlerInvalidLevelBDI => "InterruptHandlerInvalidLevelBDI",
        })
    }
}
