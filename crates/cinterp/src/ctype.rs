//! The C type system: signedness/length/pointer specifiers and usual arithmetic conversions.
//!
//! Mirrors `common/ctype.py` from the reference interpreter, generalized with a dedicated
//! `Struct` variant and explicit length/sign enums instead of raw strings.

use std::fmt;

/// Base numeric type specifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeSpec {
    Char,
    Int,
    Float,
    Double,
}

/// Length specifier modifying a base type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LenSpec {
    None,
    Short,
    Long,
    LongLong,
}

/// Signedness specifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SignSpec {
    None,
    Signed,
    Unsigned,
}

/// A C type: either a numeric type with sign/length/pointer specifiers, or a named struct type.
///
/// Equality and the canonical string form are the same thing (`to_canonical`), matching the
/// reference implementation's `__eq__` based on `str(self) == str(other)`.
#[derive(Debug, Clone)]
pub enum CType {
    Numeric {
        type_spec: TypeSpec,
        len_spec: LenSpec,
        sign_spec: SignSpec,
        pointer: bool,
    },
    Struct {
        name: String,
        pointer: bool,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CTypeError(pub String);

impl fmt::Display for CTypeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for CTypeError {}

/// Canonical rank order used for usual arithmetic conversions, weakest to strongest.
/// Indices into this array double as "rank" for `combine_types`.
const RANK_ORDER: &[&str] = &[
    "char",
    "unsigned char",
    "short int",
    "unsigned short int",
    "int",
    "unsigned int",
    "long int",
    "unsigned long int",
    "long long int",
    "unsigned long long int",
    "float",
    "double",
    "long double",
];

/// Rank of `int` in `RANK_ORDER`; usual arithmetic conversions never produce anything weaker.
const INT_RANK: usize = 4;

impl CType {
    #[must_use]
    pub fn new(type_spec: TypeSpec, len_spec: LenSpec, sign_spec: SignSpec, pointer: bool) -> Self {
        Self::Numeric { type_spec, len_spec, sign_spec, pointer }
    }

    #[must_use]
    pub fn int() -> Self {
        Self::new(TypeSpec::Int, LenSpec::None, SignSpec::None, false)
    }

    #[must_use]
    pub fn char() -> Self {
        Self::new(TypeSpec::Char, LenSpec::None, SignSpec::None, false)
    }

    #[must_use]
    pub fn double() -> Self {
        Self::new(TypeSpec::Double, LenSpec::None, SignSpec::None, false)
    }

    #[must_use]
    pub fn pointer(&self) -> bool {
        match self {
            Self::Numeric { pointer, .. } | Self::Struct { pointer, .. } => *pointer,
        }
    }

    /// Returns the same type with the pointer flag set or cleared.
    #[must_use]
    pub fn with_pointer(&self, pointer: bool) -> Self {
        match self {
            Self::Numeric { type_spec, len_spec, sign_spec, .. } => {
                Self::Numeric { type_spec: *type_spec, len_spec: *len_spec, sign_spec: *sign_spec, pointer }
            }
            Self::Struct { name, .. } => Self::Struct { name: name.clone(), pointer },
        }
    }

    #[must_use]
    pub fn is_float_like(&self) -> bool {
        matches!(self, Self::Numeric { type_spec: TypeSpec::Float | TypeSpec::Double, pointer: false, .. })
    }

    #[must_use]
    pub fn is_struct(&self) -> bool {
        matches!(self, Self::Struct { .. })
    }

    #[must_use]
    pub fn struct_name(&self) -> Option<&str> {
        match self {
            Self::Struct { name, .. } => Some(name),
            Self::Numeric { .. } => None,
        }
    }

    /// Canonical string form, used both for display and as the equality key.
    ///
    /// `[unsigned] [short|long|long long] (int|char|float|double) [*]` or `struct NAME [*]`.
    #[must_use]
    pub fn to_canonical(&self) -> String {
        match self {
            Self::Struct { name, pointer } => {
                if *pointer { format!("struct {name} *") } else { format!("struct {name}") }
            }
            Self::Numeric { type_spec, len_spec, sign_spec, pointer } => {
                let mut parts = Vec::new();
                if matches!(sign_spec, SignSpec::Unsigned) {
                    parts.push("unsigned".to_string());
                }
                match len_spec {
                    LenSpec::Short => parts.push("short".to_string()),
                    LenSpec::Long => parts.push("long".to_string()),
                    LenSpec::LongLong => parts.push("long long".to_string()),
                    LenSpec::None => {}
                }
                let base = match type_spec {
                    TypeSpec::Char => "char",
                    TypeSpec::Int => "int",
                    TypeSpec::Float => "float",
                    TypeSpec::Double => "double",
                };
                parts.push(base.to_string());
                if *pointer {
                    parts.push("*".to_string());
                }
                parts.join(" ")
            }
        }
    }

    /// Parses a canonical type description, rejecting duplicate sign/length specifiers
    /// and unknown tokens.
    ///
    /// # Errors
    /// Returns `CTypeError` for duplicate or unrecognized specifiers, or an empty spec.
    pub fn from_string(s: &str) -> Result<Self, CTypeError> {
        if let Some(rest) = s.strip_prefix("struct ") {
            let rest = rest.trim();
            let (name, pointer) = match rest.strip_suffix('*') {
                Some(n) => (n.trim().to_string(), true),
                None => (rest.to_string(), false),
            };
            if name.is_empty() {
                return Err(CTypeError("empty struct name".to_string()));
            }
            return Ok(Self::Struct { name, pointer });
        }

        let mut type_spec: Option<TypeSpec> = None;
        let mut len_spec = LenSpec::None;
        let mut sign_spec = SignSpec::None;
        let mut pointer = false;

        let tokens: Vec<&str> = s.split_whitespace().collect();
        let mut idx = 0;
        while idx < tokens.len() {
            let tok = tokens[idx];
            match tok {
                "char" | "int" | "float" | "double" => {
                    if type_spec.is_some() {
                        return Err(CTypeError("Multiple type specifiers".to_string()));
                    }
                    type_spec = Some(match tok {
                        "char" => TypeSpec::Char,
                        "int" => TypeSpec::Int,
                        "float" => TypeSpec::Float,
                        "double" => TypeSpec::Double,
                        _ => unreachable!(),
                    });
                    if tokens.get(idx + 1) == Some(&"*") {
                        pointer = true;
                        idx += 1;
                    }
                }
                "short" | "long" => {
                    if !matches!(len_spec, LenSpec::None) {
                        return Err(CTypeError("Multiple len specifiers".to_string()));
                    }
                    if tok == "short" {
                        len_spec = LenSpec::Short;
                    } else if tokens.get(idx + 1) == Some(&"long") {
                        len_spec = LenSpec::LongLong;
                        idx += 1;
                    } else {
                        len_spec = LenSpec::Long;
                    }
                }
                "signed" | "unsigned" => {
                    if !matches!(sign_spec, SignSpec::None) {
                        return Err(CTypeError("Multiple sign specifiers".to_string()));
                    }
                    sign_spec = if tok == "signed" { SignSpec::Signed } else { SignSpec::Unsigned };
                }
                "*" => return Err(CTypeError(format!("Unexpected '*' in type spec '{s}'"))),
                other => return Err(CTypeError(format!("Unrecognized spec '{other}'"))),
            }
            idx += 1;
        }

        let type_spec = type_spec.ok_or_else(|| CTypeError("No len and no type spec".to_string()))?;
        Ok(Self::Numeric { type_spec, len_spec, sign_spec, pointer })
    }

    /// Combines this type with another, returning the rank-max, floored at `int`.
    ///
    /// # Panics
    /// Panics if either operand is a pointer or a struct type; callers must have already
    /// rejected those combinations during semantic analysis.
    #[must_use]
    pub fn combine_types(a: &Self, b: &Self) -> Self {
        assert!(!a.pointer() && !b.pointer(), "combine_types called on pointer operand");
        assert!(!a.is_struct() && !b.is_struct(), "combine_types called on struct operand");
        let rank_a = RANK_ORDER.iter().position(|r| *r == a.to_canonical()).expect("ranked numeric type");
        let rank_b = RANK_ORDER.iter().position(|r| *r == b.to_canonical()).expect("ranked numeric type");
        let result_rank = rank_a.max(rank_b).max(INT_RANK);
        Self::from_string(RANK_ORDER[result_rank]).expect("rank table entries are well-formed")
    }

    /// Size in bytes under the 32-bit model. By-value structs have no defined size (field
    /// access is by field identity, not byte layout) and this must not be called on one; a
    /// struct pointer is just an address, like any other pointer.
    ///
    /// # Panics
    /// Panics if called on a by-value struct type.
    #[must_use]
    pub fn size_bytes(&self) -> u32 {
        match self {
            Self::Struct { pointer: true, .. } => 4,
            Self::Struct { pointer: false, .. } => panic!("size_bytes called on a by-value struct type"),
            Self::Numeric { pointer: true, .. } => 4,
            Self::Numeric { type_spec: TypeSpec::Char, .. } => 1,
            Self::Numeric { len_spec: LenSpec::Short, .. } => 2,
            Self::Numeric { len_spec: LenSpec::LongLong, .. } => 8,
            Self::Numeric { type_spec: TypeSpec::Int, .. } => 4,
            Self::Numeric { type_spec: TypeSpec::Float, .. } => 4,
            Self::Numeric { type_spec: TypeSpec::Double, len_spec: LenSpec::Long, .. } => 8,
            Self::Numeric { type_spec: TypeSpec::Double, .. } => 4,
        }
    }

    /// Inclusive `(lo, hi)` range for an integer CType. Not meaningful for float-like types.
    #[must_use]
    pub fn limits(&self) -> (i128, i128) {
        let size_bits = i128::from(self.size_bytes()) * 8;
        let unsigned = matches!(self, Self::Numeric { sign_spec: SignSpec::Unsigned, .. });
        if unsigned {
            (0, (1i128 << size_bits) - 1)
        } else {
            let mid = 1i128 << (size_bits - 1);
            (-mid, mid - 1)
        }
    }

    /// Requires `pointer=true`; returns the same specifier set with the pointer flag cleared.
    ///
    /// # Errors
    /// Returns `CTypeError` if this type is not a pointer.
    pub fn dereference(&self) -> Result<Self, CTypeError> {
        if !self.pointer() {
            return Err(CTypeError(format!("cannot dereference non-pointer type '{}'", self.to_canonical())));
        }
        Ok(self.with_pointer(false))
    }
}

impl fmt::Display for CType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_canonical())
    }
}

impl PartialEq for CType {
    fn eq(&self, other: &Self) -> bool {
        self.to_canonical() == other.to_canonical()
    }
}

impl Eq for CType {}

impl std::hash::Hash for CType {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.to_canonical().hash(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_string_round_trips_canonical_forms() {
        for canon in RANK_ORDER {
            let parsed = CType::from_string(canon).unwrap();
            assert_eq!(parsed.to_canonical(), *canon);
        }
    }

    #[test]
    fn from_string_rejects_duplicate_specifiers() {
        assert!(CType::from_string("unsigned unsigned int").is_err());
        assert!(CType::from_string("long long long int").is_err());
        assert!(CType::from_string("bogus").is_err());
    }

    #[test]
    fn combine_types_floors_at_int() {
        let char_t = CType::char();
        let combined = CType::combine_types(&char_t, &char_t);
        assert_eq!(combined.to_canonical(), "int");
    }

    #[test]
    fn combine_types_picks_stronger_rank() {
        let int_t = CType::int();
        let double_t = CType::double();
        let combined = CType::combine_types(&int_t, &double_t);
        assert_eq!(combined.to_canonical(), "double");
    }

    #[test]
    fn limits_match_size_table() {
        assert_eq!(CType::from_string("int").unwrap().limits(), (-(1i128 << 31), (1i128 << 31) - 1));
        assert_eq!(CType::from_string("unsigned char").unwrap().limits(), (0, 255));
        assert_eq!(CType::from_string("short int").unwrap().limits(), (-32768, 32767));
    }

    #[test]
    fn struct_pointer_round_trip() {
        let s = CType::from_string("struct Point *").unwrap();
        assert!(s.pointer());
        assert_eq!(s.struct_name(), Some("Point"));
        assert_eq!(s.to_canonical(), "struct Point *");
    }

    #[test]
    fn dereference_requires_pointer() {
        let int_t = CType::int();
        assert!(int_t.dereference().is_err());
        let ptr_t = int_t.with_pointer(true);
        assert_eq!(ptr_t.dereference().unwrap().to_canonical(), "int");
    }
}
