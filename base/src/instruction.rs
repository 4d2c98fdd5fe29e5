//! Binary representation of instructions.
//!
//! An instruction occupies one 36-bit word.  Bits are numbered from
//! the most significant end (bit 0) as the hardware documentation
//! does.  Basic mode instructions look like this:
//!
//! | f     | j     | a      | x      | h  | i  | u      |
//! |-------|-------|--------|--------|----|----|--------|
//! |6 bits |4 bits |4 bits  |4 bits  |1   |1   |16 bits |
//! |(0-5)  |(6-9)  |(10-13) |(14-17) |(18)|(19)|(20-35) |
//!
//! Extended mode instructions split the bottom 16 bits into a 4-bit
//! base register selector `b` and a 12-bit displacement `d`:
//!
//! | ... | h  | i  | b       | d       |
//! |-----|----|----|---------|---------|
//! | ... |(18)|(19)|(20-23)  |(24-35)  |
//!
//! For immediate operands (j = U or XU) the combined h, i and u
//! fields form the 18-bit value "hiu".  For some instructions j and a
//! extend the function code rather than selecting a partial word or
//! a register; see [`function`].

use std::fmt::{self, Debug, Formatter};

use crate::onescomplement::word::Word36;

pub mod function;

/// An instruction word.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct InstructionWord(Word36);

const F_SHIFT: u32 = 30;
const J_SHIFT: u32 = 26;
const A_SHIFT: u32 = 22;
const X_SHIFT: u32 = 18;
const H_BIT: u64 = 0o000_000_400_000;
const I_BIT: u64 = 0o000_000_200_000;
const U_MASK: u64 = 0o177_777;
const HIU_MASK: u64 = 0o777_777;
const B_SHIFT: u32 = 12;
const D_MASK: u64 = 0o7777;

impl InstructionWord {
    /// Assemble a basic mode instruction from its fields.  Each field
    /// is truncated to its width.
    pub fn basic(f: u8, j: u8, a: u8, x: u8, h: bool, i: bool, u: u32) -> InstructionWord {
        InstructionWord(Word36::truncate(
            (u64::from(f & 0o77) << F_SHIFT)
                | (u64::from(j & 0o17) << J_SHIFT)
                | (u64::from(a & 0o17) << A_SHIFT)
                | (u64::from(x & 0o17) << X_SHIFT)
                | if h { H_BIT } else { 0 }
                | if i { I_BIT } else { 0 }
                | (u64::from(u) & U_MASK),
        ))
    }

    /// Assemble an immediate-operand instruction using the 18-bit
    /// hiu field (x should be 0 for the whole field to be used).
    pub fn immediate(f: u8, j: u8, a: u8, x: u8, hiu: u32) -> InstructionWord {
        InstructionWord(Word36::truncate(
            (u64::from(f & 0o77) << F_SHIFT)
                | (u64::from(j & 0o17) << J_SHIFT)
                | (u64::from(a & 0o17) << A_SHIFT)
                | (u64::from(x & 0o17) << X_SHIFT)
                | (u64::from(hiu) & HIU_MASK),
        ))
    }

    /// Assemble an extended mode instruction from its fields.
    #[allow(clippy::too_many_arguments)]
    pub fn extended(
        f: u8,
        j: u8,
        a: u8,
        x: u8,
        h: bool,
        i: bool,
        b: u8,
        d: u16,
    ) -> InstructionWord {
        InstructionWord(Word36::truncate(
            (u64::from(f & 0o77) << F_SHIFT)
                | (u64::from(j & 0o17) << J_SHIFT)
                | (u64::from(a & 0o17) << A_SHIFT)
                | (u64::from(x & 0o17) << X_SHIFT)
                | if h { H_BIT } else { 0 }
                | if i { I_BIT } else { 0 }
                | (u64::from(b & 0o17) << B_SHIFT)
                | (u64::from(d) & D_MASK),
        ))
    }

    pub fn word(&self) -> Word36 {
        self.0
    }

    pub fn f(&self) -> u8 {
        ((self.0.bits() >> F_SHIFT) & 0o77) as u8
    }

    pub fn j(&self) -> u8 {
        ((self.0.bits() >> J_SHIFT) & 0o17) as u8
    }

    pub fn a(&self) -> u8 {
        ((self.0.bits() >> A_SHIFT) & 0o17) as u8
    }

    pub fn x(&self) -> u8 {
        ((self.0.bits() >> X_SHIFT) & 0o17) as u8
    }

    pub fn h(&self) -> bool {
        self.0.bits() & H_BIT != 0
    }

    pub fn i(&self) -> bool {
        self.0.bits() & I_BIT != 0
    }

    pub fn u(&self) -> u32 {
        (self.0.bits() & U_MASK) as u32
    }

    pub fn hiu(&self) -> u32 {
        (self.0.bits() & HIU_MASK) as u32
    }

    pub fn b(&self) -> u8 {
        ((self.0.bits() >> B_SHIFT) & 0o17) as u8
    }

    /// The i and b fields taken together, selecting one of 32 base
    /// registers.
    pub fn ib(&self) -> u8 {
        ((self.0.bits() >> B_SHIFT) & 0o37) as u8
    }

    pub fn d(&self) -> u16 {
        (self.0.bits() & D_MASK) as u16
    }

    /// Replace the x, h, i and u fields with those of `other`; this
    /// is what a basic mode indirect reference does.
    pub fn with_xhiu_of(&self, other: Word36) -> InstructionWord {
        const XHIU: u64 = 0o17_777_777;
        InstructionWord(Word36::truncate(
            (self.0.bits() & !XHIU) | (other.bits() & XHIU),
        ))
    }
}

impl From<Word36> for InstructionWord {
    fn from(w: Word36) -> InstructionWord {
        InstructionWord(w)
    }
}

impl From<InstructionWord> for Word36 {
    fn from(inst: InstructionWord) -> Word36 {
        inst.0
    }
}

impl Debug for InstructionWord {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), fmt::Error> {
        write!(
            f,
            "InstructionWord{{f:{:02o} j:{:02o} a:{:02o} x:{:02o} h:{} i:{} u:{:06o}}}",
            self.f(),
            self.j(),
            self.a(),
            self.x(),
            u8::from(self.h()),
            u8::from(self.i()),
            self.u(),
        )
    }
}
