//! The prelude exports the types most users of the base crate need.
pub use super::instruction::function::{AddressingMode, Function};
pub use super::instruction::InstructionWord;
pub use super::onescomplement::error::*;
pub use super::onescomplement::word::{add_narrow, AdditionResult, Word36};
pub use super::onescomplement::Sign;
pub use super::subword::{
    extract_field, insert_field, join_halves, left_half, right_half, split_halves, PartialWord,
};
pub use super::w36;
