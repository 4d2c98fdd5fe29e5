//! Single (36-bit) and double (72-bit) shifts.
//!
//! Double-word operands are passed as `(upper, lower)` pairs, the
//! upper word being the more significant one.  Counts larger than
//! the operand width are reduced modulo the width for circular
//! shifts, and shift everything out for logical and algebraic ones.

use crate::onescomplement::word::Word36;

const DOUBLE_MASK: u128 = (1 << 72) - 1;

fn join(upper: Word36, lower: Word36) -> u128 {
    (u128::from(upper.bits()) << 36) | u128::from(lower.bits())
}

fn split(value: u128) -> (Word36, Word36) {
    (
        Word36::truncate((value >> 36) as u64),
        Word36::truncate(value as u64),
    )
}

pub fn circular_right(w: Word36, count: u32) -> Word36 {
    let n = count % 36;
    if n == 0 {
        return w;
    }
    let b = w.bits();
    Word36::truncate((b >> n) | (b << (36 - n)))
}

pub fn circular_left(w: Word36, count: u32) -> Word36 {
    circular_right(w, 36 - (count % 36))
}

pub fn logical_right(w: Word36, count: u32) -> Word36 {
    if count >= 36 {
        Word36::ZERO
    } else {
        Word36::truncate(w.bits() >> count)
    }
}

pub fn logical_left(w: Word36, count: u32) -> Word36 {
    if count >= 36 {
        Word36::ZERO
    } else {
        Word36::truncate(w.bits() << count)
    }
}

/// Shift right, copying the sign bit into the vacated positions.
pub fn algebraic_right(w: Word36, count: u32) -> Word36 {
    let fill = if w.is_negative() { Word36::MASK } else { 0 };
    if count >= 36 {
        return Word36::truncate(fill);
    }
    let shifted = w.bits() >> count;
    let vacated = fill & !(Word36::MASK >> count);
    Word36::truncate(shifted | vacated)
}

pub fn double_circular_right(upper: Word36, lower: Word36, count: u32) -> (Word36, Word36) {
    let n = count % 72;
    let v = join(upper, lower);
    if n == 0 {
        return (upper, lower);
    }
    split(((v >> n) | (v << (72 - n))) & DOUBLE_MASK)
}

pub fn double_circular_left(upper: Word36, lower: Word36, count: u32) -> (Word36, Word36) {
    double_circular_right(upper, lower, 72 - (count % 72))
}

pub fn double_logical_right(upper: Word36, lower: Word36, count: u32) -> (Word36, Word36) {
    if count >= 72 {
        (Word36::ZERO, Word36::ZERO)
    } else {
        split(join(upper, lower) >> count)
    }
}

pub fn double_logical_left(upper: Word36, lower: Word36, count: u32) -> (Word36, Word36) {
    if count >= 72 {
        (Word36::ZERO, Word36::ZERO)
    } else {
        split((join(upper, lower) << count) & DOUBLE_MASK)
    }
}

pub fn double_algebraic_right(upper: Word36, lower: Word36, count: u32) -> (Word36, Word36) {
    let fill: u128 = if upper.is_negative() { DOUBLE_MASK } else { 0 };
    if count >= 72 {
        return split(fill);
    }
    let shifted = join(upper, lower) >> count;
    split(shifted | (fill & !(DOUBLE_MASK >> count)))
}

/// Left-justify `w` by circular shifting until bit 0 differs from
/// bit 1, returning the shifted value and the count.  Either zero
/// cannot be normalized; it is returned as-is with a count of 35.
pub fn normalize(w: Word36) -> (Word36, u32) {
    if w.is_zero() {
        return (w, 35);
    }
    let mut value = w;
    let mut count = 0;
    while value.bit(0) == value.bit(1) {
        value = circular_left(value, 1);
        count += 1;
    }
    (value, count)
}

/// The double-word form of [`normalize`]; an all-zero or all-one
/// pair gives a count of 71.
pub fn double_normalize(upper: Word36, lower: Word36) -> (Word36, Word36, u32) {
    let v = join(upper, lower);
    if v == 0 || v == DOUBLE_MASK {
        return (upper, lower, 71);
    }
    let top = |x: u128| (x >> 71) & 1;
    let next = |x: u128| (x >> 70) & 1;
    let mut value = v;
    let mut count = 0;
    while top(value) == next(value) {
        value = ((value << 1) | (value >> 71)) & DOUBLE_MASK;
        count += 1;
    }
    let (u, l) = split(value);
    (u, l, count)
}
