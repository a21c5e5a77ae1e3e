//! The `stdio.h`/`stdlib.h`/`math.h`/`limits.h` builtin registry.
//!
//! Grounded on `__builtins__/{stdio,stdlib,math,limits}.py`'s `@definition(return_type,
//! arg_types)` decorator: each builtin carries its declared signature so the semantic analyzer
//! can check call sites the same way it checks user-declared functions (spec §4.4), plus a
//! handler the evaluator invokes directly (spec §4.6) instead of dispatching through a
//! decorator-populated registry dict.

pub mod limits;
pub mod math;
pub mod stdio;
pub mod stdlib;

use std::fmt;

use crate::{ctype::CType, error::CResult, evaluator::EvalContext, evaluator::Value, number::Number};

/// A builtin's implementation. Plain function pointers (not `dyn Fn`) since no builtin needs
/// to capture state beyond what `EvalContext` already carries.
pub type BuiltinHandler = fn(&[Value], &mut EvalContext<'_>) -> CResult<Value>;

/// One registered builtin function: its declared C signature plus the handler implementing it.
pub struct Builtin {
    pub name: &'static str,
    pub return_type: CType,
    /// `None` marks a variadic/unknown-arity builtin (`printf`, `scanf`); the semantic analyzer
    /// skips arity/type checking against call sites for these (spec §4.4).
    pub param_types: Option<Vec<CType>>,
    pub handler: BuiltinHandler,
}

impl fmt::Debug for Builtin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Builtin").field("name", &self.name).field("return_type", &self.return_type).finish_non_exhaustive()
    }
}

/// A library-level constant, e.g. `RAND_MAX` or one of the `limits.h` bounds.
#[derive(Debug, Clone)]
pub struct Constant {
    pub name: &'static str,
    pub value: Number,
}

/// Everything a single `#include <...>` directive pulls into the global scope.
#[derive(Debug, Default)]
pub struct Library {
    pub functions: Vec<Builtin>,
    pub constants: Vec<Constant>,
}

/// Resolves a library header name to its exported functions and constants.
///
/// Returns `None` for unrecognized names; the semantic analyzer turns that into a
/// `SemanticError` carrying the `#include` directive's source line (spec §4.4).
#[must_use]
pub fn library(name: &str) -> Option<Library> {
    match name {
        "stdio.h" => Some(stdio::library()),
        "stdlib.h" => Some(stdlib::library()),
        "math.h" => Some(math::library()),
        "limits.h" => Some(limits::library()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognizes_the_four_supported_headers() {
        for header in ["stdio.h", "stdlib.h", "math.h", "limits.h"] {
            assert!(library(header).is_some(), "{header} should resolve");
        }
    }

    #[test]
    fn rejects_unknown_headers() {
        assert!(library("string.h").is_none());
    }
}
