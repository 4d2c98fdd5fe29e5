//! The 36-bit word.  Storage, registers and instructions are all made
//! of these.  The representation is one's complement: negation
//! inverts every bit, so there are two zeroes (all zeroes and all
//! ones).  Both compare equal numerically but they remain distinct
//! bit patterns, and some instructions (for example the sign-extended
//! immediate loads) go out of their way to turn negative zero into
//! positive zero.

use std::cmp::Ordering;
use std::fmt::{self, Debug, Display, Formatter, Octal};

use serde::Serialize;

use super::error::ConversionFailed;
use super::Sign;

#[cfg(test)]
mod tests;

/// A 36-bit one's-complement word.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
pub struct Word36 {
    pub(crate) bits: u64,
}

/// The outcome of a one's-complement addition.  The carry and
/// overflow indications end up in the designator register.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AdditionResult {
    pub sum: Word36,
    pub carry: bool,
    pub overflow: bool,
}

impl Word36 {
    const MODULUS: u64 = 1 << 36;
    pub const MASK: u64 = Self::MODULUS - 1;
    pub const SIGN_BIT: u64 = 1 << 35;

    pub const ZERO: Word36 = Word36 { bits: 0 };
    pub const NEGATIVE_ZERO: Word36 = Word36 { bits: Self::MASK };
    pub const ONE: Word36 = Word36 { bits: 1 };
    pub const NEGATIVE_ONE: Word36 = Word36 {
        bits: Self::MASK - 1,
    };
    pub const MAX_POSITIVE: Word36 = Word36 {
        bits: Self::SIGN_BIT - 1,
    };

    // Out-of-range arguments fail at compile time, so no need to
    // hide it.  It's pub so that it can be used in w36!().
    pub const fn new<const N: u64>() -> Word36 {
        struct Helper<const M: u64>;
        impl<const M: u64> Helper<M> {
            const W: Word36 = {
                if M > Word36::MASK {
                    panic!("input value is out of range")
                } else {
                    Word36 { bits: M }
                }
            };
        }
        Helper::<N>::W
    }

    /// Build a word from the low 36 bits of `value`, discarding any
    /// higher bits.
    pub const fn truncate(value: u64) -> Word36 {
        Word36 {
            bits: value & Self::MASK,
        }
    }

    /// Build a word from the low `width` bits of `value`, copying
    /// the most significant of those bits into the remaining high
    /// bits of the word.
    pub const fn sign_extend(value: u64, width: u32) -> Word36 {
        let field_mask: u64 = if width >= 36 {
            Self::MASK
        } else {
            (1 << width) - 1
        };
        let field = value & field_mask;
        if width < 36 && field & (1 << (width - 1)) != 0 {
            Word36 {
                bits: (field | !field_mask) & Self::MASK,
            }
        } else {
            Word36 { bits: field }
        }
    }

    pub const fn bits(self) -> u64 {
        self.bits
    }

    /// True for both +0 and -0.
    pub const fn is_zero(self) -> bool {
        self.bits == 0 || self.bits == Self::MASK
    }

    pub const fn is_positive_zero(self) -> bool {
        self.bits == 0
    }

    pub const fn is_negative_zero(self) -> bool {
        self.bits == Self::MASK
    }

    /// Tests the sign bit only; negative zero is negative.
    pub const fn is_negative(self) -> bool {
        self.bits & Self::SIGN_BIT != 0
    }

    pub const fn is_positive(self) -> bool {
        !self.is_negative()
    }

    pub const fn signum(self) -> Sign {
        if self.is_zero() {
            Sign::Zero
        } else if self.is_negative() {
            Sign::Negative
        } else {
            Sign::Positive
        }
    }

    pub const fn negate(self) -> Word36 {
        Word36 {
            bits: !self.bits & Self::MASK,
        }
    }

    pub const fn magnitude(self) -> Word36 {
        if self.is_negative() {
            self.negate()
        } else {
            self
        }
    }

    /// Replace negative zero with positive zero, leaving every other
    /// value alone.
    pub const fn normalize_zero(self) -> Word36 {
        if self.is_negative_zero() {
            Word36::ZERO
        } else {
            self
        }
    }

    /// One's-complement addition with end-around carry.  The sum is
    /// only negative zero when both addends are negative zero.
    pub const fn add(self, rhs: Word36) -> AdditionResult {
        let mut raw = self.bits + rhs.bits;
        if raw & Self::MODULUS != 0 {
            raw = (raw & Self::MASK) + 1;
        }
        if raw == Self::MASK && self.bits != rhs.bits {
            raw = 0;
        }
        let sum = Word36 { bits: raw };
        let neg_left = self.is_negative();
        let neg_right = rhs.is_negative();
        let neg_sum = sum.is_negative();
        let carry = if neg_sum {
            neg_left && neg_right
        } else {
            neg_left || neg_right
        };
        let overflow = neg_left == neg_right && neg_left != neg_sum;
        AdditionResult {
            sum,
            carry,
            overflow,
        }
    }

    pub const fn sub(self, rhs: Word36) -> AdditionResult {
        self.add(rhs.negate())
    }

    /// Adds without reporting carry or overflow.
    pub const fn wrapping_add(self, rhs: Word36) -> Word36 {
        self.add(rhs).sum
    }

    pub const fn wrapping_sub(self, rhs: Word36) -> Word36 {
        self.sub(rhs).sum
    }

    /// The numeric value of the word.  Both zeroes map to 0.
    pub const fn to_i64(self) -> i64 {
        if self.is_negative() {
            -((!self.bits & Self::MASK) as i64)
        } else {
            self.bits as i64
        }
    }

    pub const fn bit(self, n: u32) -> bool {
        self.bits & (1 << (35 - n)) != 0
    }

    pub const fn and(self, mask: u64) -> Word36 {
        Word36 {
            bits: self.bits & mask,
        }
    }

    pub const fn or(self, mask: u64) -> Word36 {
        Word36 {
            bits: (self.bits | mask) & Self::MASK,
        }
    }
}

/// One's-complement addition of two `width`-bit quantities (for
/// example the 18-bit or 24-bit modifier of an index register).  As
/// with [`Word36::add`], the sum is only negative zero when both
/// addends are.
pub const fn add_narrow(left: u64, right: u64, width: u32) -> u64 {
    let mask: u64 = (1 << width) - 1;
    let (l, r) = (left & mask, right & mask);
    let mut raw = l + r;
    if raw & (1 << width) != 0 {
        raw = (raw & mask) + 1;
    }
    if raw == mask && l != r {
        0
    } else {
        raw
    }
}

impl TryFrom<u64> for Word36 {
    type Error = ConversionFailed;
    fn try_from(n: u64) -> Result<Word36, ConversionFailed> {
        if n > Word36::MASK {
            Err(ConversionFailed::TooLarge)
        } else {
            Ok(Word36 { bits: n })
        }
    }
}

impl TryFrom<i64> for Word36 {
    type Error = ConversionFailed;
    fn try_from(n: i64) -> Result<Word36, ConversionFailed> {
        const LIMIT: i64 = (Word36::SIGN_BIT - 1) as i64;
        if n > LIMIT {
            Err(ConversionFailed::TooLarge)
        } else if n < -LIMIT {
            Err(ConversionFailed::TooSmall)
        } else if n < 0 {
            Ok(Word36 {
                bits: !n.unsigned_abs() & Word36::MASK,
            })
        } else {
            Ok(Word36 { bits: n as u64 })
        }
    }
}

macro_rules! from_native_type_to_word {
    ($($from:ty)*) => {
        $(
            impl From<$from> for Word36 {
                fn from(n: $from) -> Word36 {
                    Word36 { bits: n.into() }
                }
            }
        )*
    }
}

from_native_type_to_word!(u8 u16 u32);

impl From<Word36> for u64 {
    fn from(w: Word36) -> u64 {
        w.bits
    }
}

impl PartialOrd for Word36 {
    fn partial_cmp(&self, other: &Word36) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Numeric ordering, so that -0 and +0 are equivalent here even
/// though `==` tells them apart.
impl Ord for Word36 {
    fn cmp(&self, other: &Word36) -> Ordering {
        self.to_i64().cmp(&other.to_i64())
    }
}

impl Display for Word36 {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), fmt::Error> {
        Octal::fmt(&self.bits, f)
    }
}

impl Octal for Word36 {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), fmt::Error> {
        Octal::fmt(&self.bits, f)
    }
}

impl Debug for Word36 {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let b = self.bits;
        write!(
            f,
            "Word36{{{:o}_{:06o}_{:06o}}}",
            b >> 33,
            (b >> 18) & 0o77_777,
            b & 0o777_777
        )
    }
}

impl std::ops::Not for Word36 {
    type Output = Word36;
    fn not(self) -> Word36 {
        self.negate()
    }
}

macro_rules! word_bitop_impl {
    ($Trait:ident, $method:ident, $op:tt) => {
        impl std::ops::$Trait for Word36 {
            type Output = Word36;
            fn $method(self, rhs: Word36) -> Word36 {
                Word36 {
                    bits: (self.bits $op rhs.bits) & Word36::MASK,
                }
            }
        }

        impl std::ops::$Trait<u64> for Word36 {
            type Output = Word36;
            fn $method(self, rhs: u64) -> Word36 {
                Word36 {
                    bits: (self.bits $op rhs) & Word36::MASK,
                }
            }
        }
    };
}

word_bitop_impl!(BitAnd, bitand, &);
word_bitop_impl!(BitOr, bitor, |);
word_bitop_impl!(BitXor, bitxor, ^);
