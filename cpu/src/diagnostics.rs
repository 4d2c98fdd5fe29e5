/// Diagnostic information for log messages.
use std::fmt::{Display, Formatter};

use base::prelude::*;

use super::registers::ProgramAddressRegister;

/// CurrentInstructionDiagnostics is only for generating debug
/// information.  It must not be used for control/execution purposes.
#[derive(Debug, Clone, Copy)]
pub struct CurrentInstructionDiagnostics {
    pub upi: u8,
    pub instruction: InstructionWord,
    pub function: Function,
    pub address: ProgramAddressRegister,
}

impl Display for CurrentInstructionDiagnostics {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), std::fmt::Error> {
        match self.function {
            Function::Illegal => write!(
                f,
                "undefined instruction {:>012o}",
                self.instruction.word()
            )?,
            function => write!(
                f,
                "instruction {function} ({:>012o})",
                self.instruction.word()
            )?,
        }
        write!(f, " at {} on UPI {}", self.address, self.upi)
    }
}

#[test]
fn test_display() {
    use super::registers::LevelBdi;
    let diag = CurrentInstructionDiagnostics {
        upi: 1,
        instruction: InstructionWord::basic(0o10, 0o16, 0, 0, false, false, 0o1000),
        function: Function::La,
        address: ProgramAddressRegister::new(LevelBdi::new(0, 0o100), 0o1002),
    };
    assert_eq!(
        diag.to_string(),
        "instruction LA (107000001000) at 0,00100:001002 on UPI 1"
    );
}
