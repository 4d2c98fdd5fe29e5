//! Partial-word ("j-field") access to 36-bit words.
//!
//! Fields are numbered from the most significant end of the word,
//! so H1 is the upper half and S1 the uppermost sixth:
//!
//! |Field|Bits  |Field|Bits  |Field|Bits  |
//! |-----|------|-----|------|-----|------|
//! | H1  | 0-17 | T1  | 0-11 | Q1  | 0-8  |
//! | H2  | 18-35| T2  | 12-23| Q2  | 9-17 |
//! |     |      | T3  | 24-35| Q3  | 18-26|
//! |     |      |     |      | Q4  | 27-35|
//!
//! Sixth-words S1 to S6 are six bits each, S1 in bits 0-5.
//!
//! The third-word fields and the "X" half-word fields sign-extend
//! when loaded; every other field is zero-filled.  On store the low
//! bits of the source replace the field and the rest of the
//! destination word is untouched.
use std::fmt::{self, Display, Formatter};

#[cfg(test)]
use test_strategy::Arbitrary;

use crate::onescomplement::word::Word36;

/// Selects the part of a word which a load or store operates on.
/// `U` and `XU` are immediate forms: they describe where the operand
/// comes from rather than a field of a storage word, so they are not
/// accepted by [`extract_field`] or [`insert_field`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(test, derive(Arbitrary))]
pub enum PartialWord {
    W,
    H1,
    H2,
    XH1,
    XH2,
    T1,
    T2,
    T3,
    Q1,
    Q2,
    Q3,
    Q4,
    S1,
    S2,
    S3,
    S4,
    S5,
    S6,
    U,
    XU,
}

impl PartialWord {
    /// Decode a j-field.  In quarter-word mode the codes which
    /// otherwise select XH1 and the third-words select quarters
    /// instead.
    pub fn from_j(j: u8, quarter_word_mode: bool) -> PartialWord {
        use PartialWord::*;
        match (j & 0o17, quarter_word_mode) {
            (0, _) => W,
            (1, _) => H2,
            (2, _) => H1,
            (3, _) => XH2,
            (4, false) => XH1,
            (4, true) => Q2,
            (5, false) => T3,
            (5, true) => Q4,
            (6, false) => T2,
            (6, true) => Q3,
            (7, false) => T1,
            (7, true) => Q1,
            (0o10, _) => S6,
            (0o11, _) => S5,
            (0o12, _) => S4,
            (0o13, _) => S3,
            (0o14, _) => S2,
            (0o15, _) => S1,
            (0o16, _) => U,
            _ => XU,
        }
    }

    pub fn is_immediate(&self) -> bool {
        matches!(self, PartialWord::U | PartialWord::XU)
    }

    /// Returns `(shift, width, sign_extended)` for a storage field;
    /// `shift` counts from the least significant end.
    fn layout(&self) -> Option<(u32, u32, bool)> {
        use PartialWord::*;
        match self {
            W => Some((0, 36, false)),
            H1 => Some((18, 18, false)),
            H2 => Some((0, 18, false)),
            XH1 => Some((18, 18, true)),
            XH2 => Some((0, 18, true)),
            T1 => Some((24, 12, true)),
            T2 => Some((12, 12, true)),
            T3 => Some((0, 12, true)),
            Q1 => Some((27, 9, false)),
            Q2 => Some((18, 9, false)),
            Q3 => Some((9, 9, false)),
            Q4 => Some((0, 9, false)),
            S1 => Some((30, 6, false)),
            S2 => Some((24, 6, false)),
            S3 => Some((18, 6, false)),
            S4 => Some((12, 6, false)),
            S5 => Some((6, 6, false)),
            S6 => Some((0, 6, false)),
            U | XU => None,
        }
    }
}

impl Display for PartialWord {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), fmt::Error> {
        use PartialWord::*;
        f.write_str(match self {
            W => "W",
            H1 => "H1",
            H2 => "H2",
            XH1 => "XH1",
            XH2 => "XH2",
            T1 => "T1",
            T2 => "T2",
            T3 => "T3",
            Q1 => "Q1",
            Q2 => "Q2",
            Q3 => "Q3",
            Q4 => "Q4",
            S1 => "S1",
            S2 => "S2",
            S3 => "S3",
            S4 => "S4",
            S5 => "S5",
            S6 => "S6",
            U => "U",
            XU => "XU",
        })
    }
}

/// Read a field of `word` as a full word, sign-extended or
/// zero-filled according to the designator.  The immediate
/// designators return the word unchanged.
pub fn extract_field(word: Word36, designator: PartialWord) -> Word36 {
    match designator.layout() {
        None => word,
        Some((_, 36, _)) => word,
        Some((shift, width, signed)) => {
            let field = (word.bits() >> shift) & ((1 << width) - 1);
            if signed {
                Word36::sign_extend(field, width)
            } else {
                Word36::truncate(field)
            }
        }
    }
}

/// Replace a field of `word` with the low bits of `value`.  The
/// immediate designators return the word unchanged.
pub fn insert_field(word: Word36, designator: PartialWord, value: Word36) -> Word36 {
    match designator.layout() {
        None => word,
        Some((_, 36, _)) => value,
        Some((shift, width, _)) => {
            let mask: u64 = ((1 << width) - 1) << shift;
            Word36::truncate((word.bits() & !mask) | ((value.bits() << shift) & mask))
        }
    }
}

/// Split a 36-bit word into its upper (H1) and lower (H2) halves.
pub fn split_halves(w: Word36) -> (u32, u32) {
    (left_half(w), right_half(w))
}

/// Join two 18-bit values into a 36-bit word.
pub fn join_halves(left: u32, right: u32) -> Word36 {
    Word36::truncate((u64::from(left & 0o777_777) << 18) | u64::from(right & 0o777_777))
}

/// The upper (more significant) halfword.
pub fn left_half(word: Word36) -> u32 {
    ((word.bits() >> 18) & 0o777_777) as u32
}

/// The lower (less significant) halfword.
pub fn right_half(word: Word36) -> u32 {
    (word.bits() & 0o777_777) as u32
}

/// Split a 36-bit word into four 9-bit quarters, Q1 first.
pub fn quarters(word: Word36) -> [u16; 4] {
    let b = word.bits();
    [
        ((b >> 27) & 0o777) as u16,
        ((b >> 18) & 0o777) as u16,
        ((b >> 9) & 0o777) as u16,
        (b & 0o777) as u16,
    ]
}
