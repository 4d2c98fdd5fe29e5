//! This module implements the 36-bit one's-complement word used by
//! the instruction processor, together with the arithmetic rules
//! (end-around carry, negative zero) that go with it.

pub mod error;
pub(crate) mod word;

/// The sign of a number.  Although in a one's-complement system all
/// values have a sign bit, we treat both zeroes specially in order to
/// simplify working with native types and one's-complement types
/// together.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Sign {
    Negative = -1, // <= -1
    Zero = 0,      // +0 or -0
    Positive = 1,  // >= +1
}
