//! `Number`: a (CType, value) pair with C-style modular wrap-around and usual arithmetic
//! conversions.
//!
//! Grounded on `interpreter/number.py`, reworked from Python's dynamically-typed `py_type()`
//! dispatch into an explicit two-variant `RawValue` matching the CType's storage class.

use rand::Rng as _;

use crate::{
    ctype::CType,
    error::{CError, CResult},
};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RawValue {
    Int(i64),
    Real(f64),
}

/// A (CType, value) pair. Integer-typed values are always held in their representable range;
/// see spec §3's wrap-around invariant.
#[derive(Debug, Clone)]
pub struct Number {
    pub ty: CType,
    pub raw: RawValue,
}

impl Number {
    /// Constructs a Number, wrapping integer values into the type's representable range.
    ///
    /// Float-like types pass the value through unchanged (no modular wrap-around applies to
    /// `float`/`double`).
    #[must_use]
    pub fn new(ty: CType, raw: RawValue) -> Self {
        if ty.is_float_like() {
            let v = match raw {
                RawValue::Real(f) => f,
                RawValue::Int(i) => i as f64,
            };
            return Self { ty, raw: RawValue::Real(v) };
        }
        let v: i64 = match raw {
            RawValue::Int(i) => i,
            RawValue::Real(f) => f as i64,
        };
        let (lo, hi) = ty.limits();
        let span = hi - lo + 1;
        let wrapped = (i128::from(v) - lo).rem_euclid(span) + lo;
        Self { ty, raw: RawValue::Int(wrapped as i64) }
    }

    #[must_use]
    pub fn int(value: i64) -> Self {
        Self::new(CType::int(), RawValue::Int(value))
    }

    #[must_use]
    pub fn double(value: f64) -> Self {
        Self::new(CType::double(), RawValue::Real(value))
    }

    /// An unspecified but in-range default, mirroring an uninitialized C storage slot.
    /// Tests must not depend on the specific value (spec §4.5/§9).
    #[must_use]
    pub fn uninitialized(ty: &CType) -> Self {
        if ty.is_float_like() {
            return Self::new(ty.clone(), RawValue::Real(0.0));
        }
        let garbage = rand::thread_rng().r#gen::<i64>();
        Self::new(ty.clone(), RawValue::Int(garbage))
    }

    #[must_use]
    pub fn as_i64(&self) -> i64 {
        match self.raw {
            RawValue::Int(i) => i,
            RawValue::Real(f) => f as i64,
        }
    }

    #[must_use]
    pub fn as_f64(&self) -> f64 {
        match self.raw {
            RawValue::Int(i) => i as f64,
            RawValue::Real(f) => f,
        }
    }

    #[must_use]
    pub fn truthy(&self) -> bool {
        match self.raw {
            RawValue::Int(i) => i != 0,
            RawValue::Real(f) => f != 0.0,
        }
    }

    /// Casts this value to `ty`, applying the same wrap-around rules as construction.
    #[must_use]
    pub fn cast(&self, ty: &CType) -> Self {
        if ty.pointer() {
            return Self { ty: ty.clone(), raw: RawValue::Int(self.as_i64()) };
        }
        Self::new(ty.clone(), self.raw)
    }

    fn combine(&self, other: &Self) -> CType {
        CType::combine_types(&self.ty.with_pointer(false), &other.ty.with_pointer(false))
    }

    fn numeric_binop(&self, other: &Self, int_op: impl Fn(i64, i64) -> i64, float_op: impl Fn(f64, f64) -> f64) -> Self {
        let ty = self.combine(other);
        if ty.is_float_like() {
            Self::new(ty, RawValue::Real(float_op(self.as_f64(), other.as_f64())))
        } else {
            Self::new(ty, RawValue::Int(int_op(self.as_i64(), other.as_i64())))
        }
    }

    /// `self + other`. Scales by pointee size when `self` is pointer-shaped (spec §3).
    #[must_use]
    pub fn add(&self, other: &Self) -> Self {
        if self.ty.pointer() {
            let size = i64::from(self.ty.dereference().expect("pointer type").size_bytes());
            return Self { ty: self.ty.clone(), raw: RawValue::Int(self.as_i64() + other.as_i64() * size) };
        }
        self.numeric_binop(other, |a, b| a.wrapping_add(b), |a, b| a + b)
    }

    /// `self - other`. Scales by pointee size when `self` is pointer-shaped (spec §3).
    #[must_use]
    pub fn sub(&self, other: &Self) -> Self {
        if self.ty.pointer() {
            let size = i64::from(self.ty.dereference().expect("pointer type").size_bytes());
            return Self { ty: self.ty.clone(), raw: RawValue::Int(self.as_i64() - other.as_i64() * size) };
        }
        self.numeric_binop(other, |a, b| a.wrapping_sub(b), |a, b| a - b)
    }

    #[must_use]
    pub fn mul(&self, other: &Self) -> Self {
        self.numeric_binop(other, |a, b| a.wrapping_mul(b), |a, b| a * b)
    }

    /// `self / other`. Integer division truncates toward zero (spec §4.6).
    ///
    /// # Errors
    /// Returns `CError::Runtime` on division by zero.
    pub fn div(&self, other: &Self) -> CResult<Self> {
        let ty = self.combine(other);
        if ty.is_float_like() {
            return Ok(Self::new(ty, RawValue::Real(self.as_f64() / other.as_f64())));
        }
        let divisor = other.as_i64();
        if divisor == 0 {
            return Err(CError::runtime("division by zero"));
        }
        Ok(Self::new(ty, RawValue::Int(self.as_i64() / divisor)))
    }

    /// `self % other`. Requires both operands combine to an integer type (spec §4.6).
    ///
    /// # Errors
    /// Returns `CError::Runtime` if either operand is float-like, or on modulo by zero.
    pub fn rem(&self, other: &Self) -> CResult<Self> {
        let ty = self.combine(other);
        if ty.is_float_like() {
            return Err(CError::runtime(format!(
                "invalid operands of types '{}' and '{}' to binary 'operator %'",
                self.ty, other.ty
            )));
        }
        let divisor = other.as_i64();
        if divisor == 0 {
            return Err(CError::runtime("modulo by zero"));
        }
        Ok(Self::new(ty, RawValue::Int(self.as_i64() % divisor)))
    }

    fn comparison(&self, other: &Self, cmp: impl Fn(f64, f64) -> bool) -> Self {
        Self::new(CType::int(), RawValue::Int(i64::from(cmp(self.as_f64(), other.as_f64()))))
    }

    #[must_use]
    pub fn lt(&self, other: &Self) -> Self {
        self.comparison(other, |a, b| a < b)
    }

    #[must_use]
    pub fn gt(&self, other: &Self) -> Self {
        self.comparison(other, |a, b| a > b)
    }

    #[must_use]
    pub fn le(&self, other: &Self) -> Self {
        self.comparison(other, |a, b| a <= b)
    }

    #[must_use]
    pub fn ge(&self, other: &Self) -> Self {
        self.comparison(other, |a, b| a >= b)
    }

    #[must_use]
    pub fn eq_num(&self, other: &Self) -> Self {
        self.comparison(other, |a, b| (a - b).abs() < f64::EPSILON)
    }

    #[must_use]
    pub fn ne_num(&self, other: &Self) -> Self {
        self.comparison(other, |a, b| (a - b).abs() >= f64::EPSILON)
    }

    #[must_use]
    pub fn bitand(&self, other: &Self) -> Self {
        self.numeric_binop(other, |a, b| a & b, |a, _| a)
    }

    #[must_use]
    pub fn bitor(&self, other: &Self) -> Self {
        self.numeric_binop(other, |a, b| a | b, |a, _| a)
    }

    #[must_use]
    pub fn bitxor(&self, other: &Self) -> Self {
        self.numeric_binop(other, |a, b| a ^ b, |a, _| a)
    }

    #[must_use]
    pub fn shl(&self, other: &Self) -> Self {
        self.numeric_binop(other, |a, b| a.wrapping_shl(b as u32), |a, _| a)
    }

    #[must_use]
    pub fn shr(&self, other: &Self) -> Self {
        self.numeric_binop(other, |a, b| a.wrapping_shr(b as u32), |a, _| a)
    }

    #[must_use]
    pub fn log_and(&self, other: &Self) -> Self {
        Self::new(CType::int(), RawValue::Int(i64::from(self.truthy() && other.truthy())))
    }

    #[must_use]
    pub fn log_or(&self, other: &Self) -> Self {
        Self::new(CType::int(), RawValue::Int(i64::from(self.truthy() || other.truthy())))
    }

    #[must_use]
    pub fn log_neg(&self) -> Self {
        Self::new(CType::int(), RawValue::Int(i64::from(!self.truthy())))
    }

    #[must_use]
    pub fn neg(&self) -> Self {
        match self.raw {
            RawValue::Int(i) => Self::new(self.ty.clone(), RawValue::Int(-i)),
            RawValue::Real(f) => Self::new(self.ty.clone(), RawValue::Real(-f)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ctype::TypeSpec;

    #[test]
    fn int_wraps_into_representable_range() {
        let unsigned_char = CType::new(TypeSpec::Char, crate::ctype::LenSpec::None, crate::ctype::SignSpec::Unsigned, false);
        let n = Number::new(unsigned_char, RawValue::Int(300));
        assert_eq!(n.as_i64(), 300 - 256);
    }

    #[test]
    fn in_range_value_round_trips() {
        let n = Number::int(42);
        assert_eq!(n.as_i64(), 42);
    }

    #[test]
    fn pointer_arithmetic_scales_by_pointee_size() {
        let ptr_ty = CType::int().with_pointer(true);
        let ptr = Number::new(ptr_ty, RawValue::Int(1_000_000));
        let advanced = ptr.add(&Number::int(3));
        assert_eq!(advanced.as_i64() - 1_000_000, 3 * 4);
    }

    #[test]
    fn combine_types_floors_char_plus_char_at_int() {
        let a = Number::new(CType::char(), RawValue::Int(3));
        let b = Number::new(CType::char(), RawValue::Int(4));
        let sum = a.add(&b);
        assert_eq!(sum.ty.to_canonical(), "int");
        assert_eq!(sum.as_i64(), 7);
    }

    #[test]
    fn division_truncates_toward_zero() {
        let a = Number::int(-7);
        let b = Number::int(2);
        assert_eq!(a.div(&b).unwrap().as_i64(), -3);
    }

    #[test]
    fn modulo_rejects_float_operands() {
        let a = Number::double(1.5);
        let b = Number::int(2);
        assert!(a.rem(&b).is_err());
    }

    #[test]
    fn division_by_zero_is_runtime_error() {
        let a = Number::int(1);
        let b = Number::int(0);
        assert!(a.div(&b).is_err());
    }
}
