//! The `base` crate defines the machine-level vocabulary shared by
//! the instruction processor and any associated tools: the 36-bit
//! one's-complement word, partial-word fields, shifts and the
//! decoding of instruction words.  Nothing in here holds processor
//! state.

mod onescomplement;

pub mod instruction;
pub mod prelude;
pub mod shift;
pub mod subword;

#[macro_export]
macro_rules! w36 {
    ($n:expr) => {
        $crate::prelude::Word36::new::<{ $n }>()
    };
}

#[test]
fn test_w36() {
    use prelude::Word36;
    let m: Word36 = w36!(40_u64);
    let n: Word36 = Word36::from(40_u32);
    assert_eq!(m, n);

    let p: Word36 = w36!(0o777_777_777_776);
    assert_eq!(p, Word36::NEGATIVE_ONE);
}
