//! Decoding instruction words into the operation they perform.
//!
//! The function code is the f field, sometimes extended by j and/or
//! a.  Which codes are defined depends on the addressing mode; codes
//! which mean nothing in the current mode decode to
//! [`Function::Illegal`].
//!
//! | f   | j     | a     | Basic  | Extended |
//! |-----|-------|-------|--------|----------|
//! | 001 |       |       | SA     | SA       |
//! | 005 |       | 0-7   | SZ..SAZ| SZ..SAZ  |
//! | 005 |       | 10-13 | INC..DEC2 | INC..DEC2 |
//! | 007 | 016   | 000   |        | LOCL     |
//! | 007 | 016   | 013   |        | CALL     |
//! | 073 | 014   | 002   |        | BUY      |
//! | 073 | 017   | 003   |        | RTN      |
//! | 074 | 004   | 000   | J      |          |
//! | 074 | 015   | 004   |        | J        |
//! | 077 | 017   | 017   | HALT   | HALT     |
//!
//! (The table shows only a sample; [`Function::decode`] is
//! authoritative.)

use std::fmt::{self, Display, Formatter};

use serde::Serialize;

use super::InstructionWord;

/// The two addressing architectures.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum AddressingMode {
    Basic,
    Extended,
}

/// Every instruction the processor implements.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Function {
    // Store
    Sa,
    Sna,
    Sma,
    Sr,
    Sz,
    Snz,
    Sp1,
    Sn1,
    Sfs,
    Sfz,
    Sas,
    Saz,
    Sx,
    Saqw,
    Ds,
    Srs,
    // Load
    La,
    Lna,
    Lma,
    Lnma,
    Lr,
    Lxm,
    Lx,
    Lxi,
    Lxsi,
    Lxlm,
    Laqw,
    Dl,
    Lrs,
    // Arithmetic
    Aa,
    Ana,
    Ax,
    Anx,
    Inc,
    Dec,
    Inc2,
    Dec2,
    // Logical
    Or,
    Xor,
    And,
    Mlu,
    // Test
    Te,
    Tne,
    // Shift
    Ssc,
    Dsc,
    Ssl,
    Dsl,
    Ssa,
    Dsa,
    Lsc,
    Dlsc,
    Lssc,
    Ldsc,
    Lssl,
    Ldsl,
    // Jump
    Jz,
    Jnz,
    Jp,
    Jn,
    J,
    Jk,
    Hj,
    Aaij,
    Paij,
    Jb,
    Jnb,
    Jc,
    Jnc,
    Jo,
    Jno,
    Lmj,
    Hltj,
    Jgd,
    // Procedure control and base register manipulation
    Locl,
    Call,
    Goto,
    Rtn,
    Lbu,
    Sbu,
    Lbe,
    // Generic stack
    Buy,
    Sell,
    // Interrupt-related and special
    Er,
    Sgnl,
    Nop,
    Send,
    Ld,
    Sd,
    Ts,
    Tss,
    Tcs,
    Iar,
    Halt,
    /// Not a defined operation in the current addressing mode.
    Illegal,
}

impl Function {
    pub fn decode(inst: InstructionWord, mode: AddressingMode) -> Function {
        use AddressingMode::*;
        use Function::*;
        let (j, a) = (inst.j(), inst.a());
        match inst.f() {
            0o01 => Sa,
            0o02 => Sna,
            0o03 => Sma,
            0o04 => Sr,
            0o05 => match a {
                0 => Sz,
                1 => Snz,
                2 => Sp1,
                3 => Sn1,
                4 => Sfs,
                5 => Sfz,
                6 => Sas,
                7 => Saz,
                0o10 => Inc,
                0o11 => Dec,
                0o12 => Inc2,
                0o13 => Dec2,
                _ => Illegal,
            },
            0o06 => Sx,
            0o07 => match (mode, j, a) {
                (Extended, 0o04, _) => Laqw,
                (Extended, 0o05, _) => Saqw,
                (Extended, 0o16, 0o00) => Locl,
                (Extended, 0o16, 0o13) => Call,
                (Extended, 0o17, 0o00) => Goto,
                _ => Illegal,
            },
            0o10 => La,
            0o11 => Lna,
            0o12 => Lma,
            0o13 => Lnma,
            0o14 => Aa,
            0o15 => Ana,
            0o23 => Lr,
            0o24 => Ax,
            0o25 => Anx,
            0o26 => Lxm,
            0o27 => Lx,
            0o40 => Or,
            0o41 => Xor,
            0o42 => And,
            0o43 => Mlu,
            0o46 => Lxi,
            0o51 if mode == Extended => Lxsi,
            0o52 => Te,
            0o53 => Tne,
            0o70 => Jgd,
            0o71 => match j {
                0o12 => Ds,
                0o13 => Dl,
                _ => Illegal,
            },
            0o72 => match j {
                0o11 if mode == Basic => Er,
                0o16 => Srs,
                0o17 => Lrs,
                _ => Illegal,
            },
            0o73 => Self::decode_073(j, a, mode),
            0o74 => Self::decode_074(j, a, mode),
            0o75 => match j {
                0o00 => Lbu,
                0o02 => Sbu,
                0o03 => Lbe,
                0o13 => Lxlm,
                _ => Illegal,
            },
            0o77 if j == 0o17 && a == 0o17 => Halt,
            _ => Illegal,
        }
    }

    fn decode_073(j: u8, a: u8, mode: AddressingMode) -> Function {
        use AddressingMode::*;
        use Function::*;
        match (j, a, mode) {
            (0o00, _, _) => Ssc,
            (0o01, _, _) => Dsc,
            (0o02, _, _) => Ssl,
            (0o03, _, _) => Dsl,
            (0o04, _, _) => Ssa,
            (0o05, _, _) => Dsa,
            (0o06, _, _) => Lsc,
            (0o07, _, _) => Dlsc,
            (0o10, _, _) => Lssc,
            (0o11, _, _) => Ldsc,
            (0o12, _, _) => Lssl,
            (0o13, _, _) => Ldsl,
            (0o14, 0o00, Extended) => Nop,
            (0o14, 0o02, Extended) => Buy,
            (0o14, 0o03, Extended) => Sell,
            (0o15, 0o07, _) => Send,
            (0o15, 0o14, _) => Ld,
            (0o15, 0o15, _) => Sd,
            (0o15, 0o17, _) => Sgnl,
            (0o17, 0o00, _) => Ts,
            (0o17, 0o01, _) => Tss,
            (0o17, 0o02, _) => Tcs,
            (0o17, 0o03, Extended) => Rtn,
            (0o17, 0o06, Extended) => Iar,
            _ => Illegal,
        }
    }

    fn decode_074(j: u8, a: u8, mode: AddressingMode) -> Function {
        use AddressingMode::*;
        use Function::*;
        match (j, a, mode) {
            (0o00, _, _) => Jz,
            (0o01, _, _) => Jnz,
            (0o02, _, _) => Jp,
            (0o03, _, _) => Jn,
            (0o04, 0, Basic) => J,
            (0o04, _, Basic) => Jk,
            (0o05, _, Basic) => Hj,
            (0o06, _, Basic) => Nop,
            (0o07, _, Basic) => Aaij,
            (0o10, _, _) => Jnb,
            (0o11, _, _) => Jb,
            (0o13, _, _) => Lmj,
            (0o14, 0o00, _) => Jo,
            (0o14, 0o04, Extended) => Jc,
            (0o14, 0o05, Extended) => Jnc,
            (0o14, 0o06, Extended) => Aaij,
            (0o14, 0o07, _) => Paij,
            (0o15, 0o00, _) => Jno,
            (0o15, 0o04, Extended) => J,
            (0o15, 0o05, _) => Hltj,
            (0o16, _, Basic) => Jc,
            (0o17, _, Basic) => Jnc,
            _ => Illegal,
        }
    }

    /// True when the j field of the instruction selects a partial
    /// word (or immediate operand) rather than extending the function
    /// code.
    pub fn uses_j_field_as_partial_word(&self) -> bool {
        use Function::*;
        !matches!(
            self,
            Laqw | Saqw
                | Ds
                | Dl
                | Srs
                | Lrs
                | Lxlm
                | Ssc
                | Dsc
                | Ssl
                | Dsl
                | Ssa
                | Dsa
                | Lsc
                | Dlsc
                | Lssc
                | Ldsc
                | Lssl
                | Ldsl
                | Jz
                | Jnz
                | Jp
                | Jn
                | J
                | Jk
                | Hj
                | Aaij
                | Paij
                | Jb
                | Jnb
                | Jc
                | Jnc
                | Jo
                | Jno
                | Lmj
                | Hltj
                | Jgd
                | Locl
                | Call
                | Goto
                | Rtn
                | Lbu
                | Sbu
                | Lbe
                | Buy
                | Sell
                | Er
                | Sgnl
                | Nop
                | Send
                | Ld
                | Sd
                | Ts
                | Tss
                | Tcs
                | Iar
                | Halt
                | Illegal
        )
    }
}

impl Display for Function {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), fmt::Error> {
        use Function::*;
        f.write_str(match self {
            Sa => "SA",
            Sna => "SNA",
            Sma => "SMA",
            Sr => "SR",
            Sz => "SZ",
            Snz => "SNZ",
            Sp1 => "SP1",
            Sn1 => "SN1",
            Sfs => "SFS",
            Sfz => "SFZ",
            Sas => "SAS",
            Saz => "SAZ",
            Sx => "SX",
            Saqw => "SAQW",
            Ds => "DS",
            Srs => "SRS",
            La => "LA",
            Lna => "LNA",
            Lma => "LMA",
            Lnma => "LNMA",
            Lr => "LR",
            Lxm => "LXM",
            Lx => "LX",
            Lxi => "LXI",
            Lxsi => "LXSI",
            Lxlm => "LXLM",
            Laqw => "LAQW",
            Dl => "DL",
            Lrs => "LRS",
            Aa => "AA",
            Ana => "ANA",
            Ax => "AX",
            Anx => "ANX",
            Inc => "INC",
            Dec => "DEC",
            Inc2 => "INC2",
            Dec2 => "DEC2",
            Or => "OR",
            Xor => "XOR",
            And => "AND",
            Mlu => "MLU",
            Te => "TE",
            Tne => "TNE",
            Ssc => "SSC",
            Dsc => "DSC",
            Ssl => "SSL",
            Dsl => "DSL",
            Ssa => "SSA",
            Dsa => "DSA",
            Lsc => "LSC",
            Dlsc => "DLSC",
            Lssc => "LSSC",
            Ldsc => "LDSC",
            Lssl => "LSSL",
            Ldsl => "LDSL",
            Jz => "JZ",
            Jnz => "JNZ",
            Jp => "JP",
            Jn => "JN",
            J => "J",
            Jk => "JK",
            Hj => "HJ",
            Aaij => "AAIJ",
            Paij => "PAIJ",
            Jb => "JB",
            Jnb => "JNB",
            Jc => "JC",
            Jnc => "JNC",
            Jo => "JO",
            Jno => "JNO",
            Lmj => "LMJ",
            Hltj => "HLTJ",
            Jgd => "JGD",
            Locl => "LOCL",
            Call => "CALL",
            Goto => "GOTO",
            Rtn => "RTN",
            Lbu => "LBU",
            Sbu => "SBU",
            Lbe => "LBE",
            Buy => "BUY",
            Sell => "SELL",
            Er => "ER",
            Sgnl => "SGNL",
            Nop => "NOP",
            Send => "SEND",
            Ld => "LD",
            Sd => "SD",
            Ts => "TS",
            Tss => "TSS",
            Tcs => "TCS",
            Iar => "IAR",
            Halt => "HALT",
            Illegal => "(illegal)",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use AddressingMode::*;

    fn basic(f: u8, j: u8, a: u8) -> InstructionWord {
        InstructionWord::basic(f, j, a, 0, false, false, 0)
    }

    #[test]
    fn test_simple_function_codes() {
        assert_eq!(Function::decode(basic(0o10, 0o16, 0), Basic), Function::La);
        assert_eq!(Function::decode(basic(0o01, 0, 3), Extended), Function::Sa);
        assert_eq!(Function::decode(basic(0o05, 0, 0o11), Basic), Function::Dec);
    }

    #[test]
    fn test_mode_specific_codes() {
        assert_eq!(Function::decode(basic(0o74, 0o04, 0), Basic), Function::J);
        assert_eq!(Function::decode(basic(0o74, 0o04, 0), Extended), Function::Illegal);
        assert_eq!(Function::decode(basic(0o74, 0o15, 0o04), Extended), Function::J);
        assert_eq!(Function::decode(basic(0o74, 0o15, 0o04), Basic), Function::Illegal);
        assert_eq!(Function::decode(basic(0o07, 0o16, 0o13), Extended), Function::Call);
        assert_eq!(Function::decode(basic(0o07, 0o16, 0o13), Basic), Function::Illegal);
        assert_eq!(Function::decode(basic(0o74, 0o07, 0), Basic), Function::Aaij);
        assert_eq!(Function::decode(basic(0o74, 0o14, 0o06), Extended), Function::Aaij);
        assert_eq!(Function::decode(basic(0o74, 0o14, 0o07), Basic), Function::Paij);
        assert_eq!(Function::decode(basic(0o72, 0o11, 0), Basic), Function::Er);
        assert_eq!(Function::decode(basic(0o72, 0o11, 0), Extended), Function::Illegal);
    }

    #[test]
    fn test_halt() {
        assert_eq!(Function::decode(basic(0o77, 0o17, 0o17), Basic), Function::Halt);
        assert_eq!(Function::decode(basic(0o77, 0o17, 0o16), Basic), Function::Illegal);
    }

    #[test]
    fn test_undefined_is_illegal() {
        assert_eq!(Function::decode(basic(0, 0, 0), Basic), Function::Illegal);
        assert_eq!(Function::decode(basic(0o76, 0, 0), Extended), Function::Illegal);
    }

    #[test]
    fn test_display() {
        assert_eq!(Function::Lssl.to_string(), "LSSL");
        assert_eq!(Function::Sgnl.to_string(), "SGNL");
    }

    #[test]
    fn test_partial_word_usage() {
        assert!(Function::La.uses_j_field_as_partial_word());
        assert!(Function::Sz.uses_j_field_as_partial_word());
        assert!(!Function::Ssc.uses_j_field_as_partial_word());
        assert!(!Function::Call.uses_j_field_as_partial_word());
    }
}
