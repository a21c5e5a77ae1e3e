//! `limits.h`: the integer-range constants, computed from `CType::limits()` rather than
//! hardcoded, so they stay consistent with the 32-bit model `ctype.rs` implements.
//!
//! Grounded on `__builtins__/limits.py`, which hardcodes the same constants as plain Python
//! ints; here they're derived so a change to the size table in `ctype.rs` can't silently drift
//! out of sync with this module.

use super::{Constant, Library};
use crate::{
    ctype::{CType, LenSpec, SignSpec, TypeSpec},
    number::{Number, RawValue},
};

fn constant(name: &'static str, ty: &CType, value: i128) -> Constant {
    Constant { name, value: Number::new(ty.clone(), RawValue::Int(value as i64)) }
}

pub(super) fn library() -> Library {
    let schar = CType::new(TypeSpec::Char, LenSpec::None, SignSpec::Signed, false);
    let uchar = CType::new(TypeSpec::Char, LenSpec::None, SignSpec::Unsigned, false);
    let char_t = CType::char();
    let short_t = CType::new(TypeSpec::Int, LenSpec::Short, SignSpec::None, false);
    let ushort_t = CType::new(TypeSpec::Int, LenSpec::Short, SignSpec::Unsigned, false);
    let int_t = CType::int();
    let uint_t = CType::new(TypeSpec::Int, LenSpec::None, SignSpec::Unsigned, false);
    let long_t = CType::new(TypeSpec::Int, LenSpec::Long, SignSpec::None, false);
    let ulong_t = CType::new(TypeSpec::Int, LenSpec::Long, SignSpec::Unsigned, false);
    let llong_t = CType::new(TypeSpec::Int, LenSpec::LongLong, SignSpec::None, false);
    let ullong_t = CType::new(TypeSpec::Int, LenSpec::LongLong, SignSpec::Unsigned, false);

    let (schar_lo, schar_hi) = schar.limits();
    let (_, uchar_hi) = uchar.limits();
    let (char_lo, char_hi) = char_t.limits();
    let (short_lo, short_hi) = short_t.limits();
    let (_, ushort_hi) = ushort_t.limits();
    let (int_lo, int_hi) = int_t.limits();
    let (_, uint_hi) = uint_t.limits();
    let (long_lo, long_hi) = long_t.limits();
    let (_, ulong_hi) = ulong_t.limits();
    let (llong_lo, llong_hi) = llong_t.limits();
    let (_, ullong_hi) = ullong_t.limits();

    Library {
        functions: Vec::new(),
        constants: vec![
            constant("CHAR_BIT", &int_t, 8),
            constant("SCHAR_MIN", &schar, schar_lo),
            constant("SCHAR_MAX", &schar, schar_hi),
            constant("UCHAR_MAX", &uchar, uchar_hi),
            constant("CHAR_MIN", &char_t, char_lo),
            constant("CHAR_MAX", &char_t, char_hi),
            constant("SHRT_MIN", &short_t, short_lo),
            constant("SHRT_MAX", &short_t, short_hi),
            constant("USHRT_MAX", &ushort_t, ushort_hi),
            constant("INT_MIN", &int_t, int_lo),
            constant("INT_MAX", &int_t, int_hi),
            constant("UINT_MAX", &uint_t, uint_hi),
            constant("LONG_MIN", &long_t, long_lo),
            constant("LONG_MAX", &long_t, long_hi),
            constant("ULONG_MAX", &ulong_t, ulong_hi),
            constant("LLONG_MIN", &llong_t, llong_lo),
            constant("LLONG_MAX", &llong_t, llong_hi),
            constant("ULLONG_MAX", &ullong_t, ullong_hi),
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn int_min_and_max_match_32_bit_range() {
        let lib = library();
        let int_min = lib.constants.iter().find(|c| c.name == "INT_MIN").unwrap();
        let int_max = lib.constants.iter().find(|c| c.name == "INT_MAX").unwrap();
        assert_eq!(int_min.value.as_i64(), -(1_i64 << 31));
        assert_eq!(int_max.value.as_i64(), (1_i64 << 31) - 1);
    }

    #[test]
    fn char_bit_is_eight() {
        let lib = library();
        let char_bit = lib.constants.iter().find(|c| c.name == "CHAR_BIT").unwrap();
        assert_eq!(char_bit.value.as_i64(), 8);
    }
}
