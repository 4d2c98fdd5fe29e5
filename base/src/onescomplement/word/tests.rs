use test_strategy::proptest;

use super::super::Sign;
use super::{add_narrow, ConversionFailed, Word36};

macro_rules! assert_octal_eq {
    ($left:expr, $right:expr $(,)?) => {{
        match (&$left, &$right) {
            (left_val, right_val) => {
                if !(*left_val == *right_val) {
                    panic!(
                        "Assertion failed: {:>#014o} != {:>#014o}",
                        left_val, right_val
                    );
                }
            }
        }
    }};
}

fn w(bits: u64) -> Word36 {
    Word36::try_from(bits).expect("test data should be in range")
}

#[test]
fn test_new_is_const() {
    const X: Word36 = Word36::new::<0o123_456_765_432>();
    assert_octal_eq!(X.bits(), 0o123_456_765_432_u64);
}

#[test]
fn test_try_from_u64() {
    assert_eq!(Word36::try_from(0_u64), Ok(Word36::ZERO));
    assert_eq!(
        Word36::try_from(0o777_777_777_777_u64),
        Ok(Word36::NEGATIVE_ZERO)
    );
    assert_eq!(
        Word36::try_from(1_u64 << 36),
        Err(ConversionFailed::TooLarge)
    );
}

#[test]
fn test_try_from_i64() {
    assert_octal_eq!(Word36::try_from(-1_i64).unwrap(), w(0o777_777_777_776));
    assert_octal_eq!(Word36::try_from(5_i64).unwrap(), w(5));
    assert_eq!(
        Word36::try_from(1_i64 << 35),
        Err(ConversionFailed::TooLarge)
    );
    assert_eq!(
        Word36::try_from(-(1_i64 << 35)),
        Err(ConversionFailed::TooSmall)
    );
}

#[test]
fn test_zeroes() {
    assert!(Word36::ZERO.is_zero());
    assert!(Word36::NEGATIVE_ZERO.is_zero());
    assert!(Word36::NEGATIVE_ZERO.is_negative());
    assert_ne!(Word36::ZERO, Word36::NEGATIVE_ZERO);
    assert_eq!(
        Word36::ZERO.cmp(&Word36::NEGATIVE_ZERO),
        std::cmp::Ordering::Equal
    );
    assert_eq!(Word36::NEGATIVE_ZERO.normalize_zero(), Word36::ZERO);
    assert_eq!(Word36::NEGATIVE_ZERO.signum(), Sign::Zero);
}

#[test]
fn test_sign_extend() {
    assert_octal_eq!(Word36::sign_extend(0o777_776, 18), w(0o777_777_777_776));
    assert_octal_eq!(Word36::sign_extend(0o377_776, 18), w(0o377_776));
    assert_octal_eq!(Word36::sign_extend(0o4000, 12), w(0o777_777_774_000));
    assert_octal_eq!(
        Word36::sign_extend(0o123_456_765_432, 36),
        w(0o123_456_765_432)
    );
}

#[test]
fn test_add_simple() {
    let r = w(2).add(w(3));
    assert_octal_eq!(r.sum, w(5));
    assert!(!r.carry);
    assert!(!r.overflow);
}

#[test]
fn test_add_end_around_carry() {
    // -1 + -1 = -2
    let r = Word36::NEGATIVE_ONE.add(Word36::NEGATIVE_ONE);
    assert_octal_eq!(r.sum, w(0o777_777_777_775));
    assert!(r.carry);
    assert!(!r.overflow);
}

#[test]
fn test_add_opposites_is_positive_zero() {
    let r = w(1).add(Word36::NEGATIVE_ONE);
    assert_octal_eq!(r.sum, Word36::ZERO);
    assert!(r.carry);
    let r = Word36::ZERO.add(Word36::NEGATIVE_ZERO);
    assert_octal_eq!(r.sum, Word36::ZERO);
}

#[test]
fn test_add_negative_zeroes() {
    let r = Word36::NEGATIVE_ZERO.add(Word36::NEGATIVE_ZERO);
    assert_octal_eq!(r.sum, Word36::NEGATIVE_ZERO);
}

#[test]
fn test_add_overflow() {
    let r = Word36::MAX_POSITIVE.add(Word36::ONE);
    assert!(r.overflow);
    assert!(!r.carry);
    assert_octal_eq!(r.sum, w(0o400_000_000_000));
}

#[test]
fn test_sub() {
    assert_octal_eq!(w(5).sub(w(7)).sum, w(0o777_777_777_775));
    assert_octal_eq!(w(7).sub(w(7)).sum, Word36::ZERO);
}

#[test]
fn test_magnitude() {
    assert_octal_eq!(Word36::NEGATIVE_ONE.magnitude(), Word36::ONE);
    assert_octal_eq!(w(0o123).magnitude(), w(0o123));
}

#[test]
fn test_bit_numbering() {
    let x = w(0o400_000_000_001);
    assert!(x.bit(0));
    assert!(x.bit(35));
    assert!(!x.bit(1));
}

#[test]
fn test_debug_format() {
    assert_eq!(
        format!("{:?}", w(0o000_002_000_006)),
        "Word36{0_000002_000006}"
    );
}

#[test]
fn test_add_narrow() {
    // 18-bit: 2 + 6
    assert_eq!(add_narrow(2, 6, 18), 8);
    // 18-bit: 5 + (-1) wraps with end-around carry.
    assert_eq!(add_narrow(5, 0o777_776, 18), 4);
    // 1 + (-1) is +0, not -0.
    assert_eq!(add_narrow(1, 0o777_776, 18), 0);
    assert_eq!(add_narrow(0o777_777, 0o777_777, 18), 0o777_777);
    // Bits above the width are ignored.
    assert_eq!(add_narrow(0o1_000_003, 1, 18), 4);
    assert_eq!(add_narrow(0o77_777_776, 3, 24), 2);
}

#[proptest]
fn add_matches_native_arithmetic(
    #[strategy(-(1_i64 << 33)..(1_i64 << 33))] a: i64,
    #[strategy(-(1_i64 << 33)..(1_i64 << 33))] b: i64,
) {
    let left = Word36::try_from(a).unwrap();
    let right = Word36::try_from(b).unwrap();
    let r = left.add(right);
    assert_eq!(r.sum.to_i64(), a + b);
    assert!(!r.overflow);
}

#[proptest]
fn negate_is_involution(#[strategy(0..=Word36::MASK)] bits: u64) {
    let x = Word36::truncate(bits);
    assert_eq!(x.negate().negate(), x);
    assert_eq!(x.negate().to_i64(), -x.to_i64());
}
