//! Errors arising when native integers are converted to words.

use std::error::Error;
use std::fmt::{self, Debug, Display, Formatter};

/// A native value has no 36-bit one's-complement representation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConversionFailed {
    /// More than 35 magnitude bits (or, for unsigned input, more than
    /// 36 bits).
    TooLarge,
    /// Below the most negative 36-bit value.
    TooSmall,
}

impl Error for ConversionFailed {}

impl Display for ConversionFailed {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), fmt::Error> {
        match self {
            ConversionFailed::TooLarge => f.write_str("value does not fit in 36 bits"),
            ConversionFailed::TooSmall => {
                f.write_str("value is below the most negative 36-bit number")
            }
        }
    }
}
