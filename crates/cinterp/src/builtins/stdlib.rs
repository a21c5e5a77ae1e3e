//! `stdlib.h`: `rand`, `srand`, `abs`, `malloc`, `free`, and the `RAND_MAX`/`NULL` constants.
//!
//! Grounded on `__builtins__/stdlib.py`. The reference module seeds Python's global `random`
//! module directly; here each `Runner` owns its own seeded `rand::rngs::StdRng` (threaded
//! through `EvalContext`) so separate interpreter runs don't share process-global RNG state.
//!
//! `malloc`/`free` model addresses as plain `int`, matching the reference exactly: there is
//! no `void*` in this type system, and registering `malloc` as returning `int` (rather than a
//! pointer type) is what lets `int *p = malloc(4);` type-check through the ordinary
//! int-to-pointer assignment rule instead of requiring pointer-to-pointer matching.

use rand::{Rng as _, SeedableRng as _};

use super::{Builtin, Constant, Library};
use crate::{
    ctype::CType,
    error::{CError, CResult},
    evaluator::{EvalContext, Value},
    number::Number,
};

fn rand(_args: &[Value], ctx: &mut EvalContext<'_>) -> CResult<Value> {
    let n: i64 = ctx.rng.gen_range(0..=32767);
    Ok(Value::Number(Number::int(n)))
}

fn srand(args: &[Value], ctx: &mut EvalContext<'_>) -> CResult<Value> {
    let seed = args.first().ok_or_else(|| CError::runtime("srand requires one argument"))?.as_number()?.as_i64();
    *ctx.rng = rand::rngs::StdRng::seed_from_u64(seed as u64);
    Ok(Value::Number(Number::int(0)))
}

fn abs(args: &[Value], _ctx: &mut EvalContext<'_>) -> CResult<Value> {
    let n = args.first().ok_or_else(|| CError::runtime("abs requires one argument"))?.as_number()?.as_i64();
    Ok(Value::Number(Number::int(n.abs())))
}

fn malloc(args: &[Value], ctx: &mut EvalContext<'_>) -> CResult<Value> {
    let size = args.first().ok_or_else(|| CError::runtime("malloc requires one argument"))?.as_number()?.as_i64();
    if size <= 0 {
        return Err(CError::runtime("malloc requires a positive size"));
    }
    let size = u32::try_from(size).map_err(|_| CError::runtime("malloc size out of range"))?;
    let address = ctx.memory.allocate(size);
    ctx.memory.track_dynamic(address);
    Ok(Value::Number(Number::int(address as i64)))
}

fn free(args: &[Value], ctx: &mut EvalContext<'_>) -> CResult<Value> {
    let address = args.first().ok_or_else(|| CError::runtime("free requires one argument"))?.as_number()?.as_i64() as u64;
    ctx.memory.free(address)?;
    Ok(Value::Number(Number::int(0)))
}

pub(super) fn library() -> Library {
    Library {
        functions: vec![
            Builtin { name: "rand", return_type: CType::int(), param_types: Some(vec![]), handler: rand },
            Builtin { name: "srand", return_type: CType::int(), param_types: Some(vec![CType::int()]), handler: srand },
            Builtin { name: "abs", return_type: CType::int(), param_types: Some(vec![CType::int()]), handler: abs },
            Builtin { name: "malloc", return_type: CType::int(), param_types: Some(vec![CType::int()]), handler: malloc },
            Builtin { name: "free", return_type: CType::int(), param_types: Some(vec![CType::int()]), handler: free },
        ],
        constants: vec![
            Constant { name: "RAND_MAX", value: Number::int(32767) },
            Constant { name: "NULL", value: Number::int(0) },
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn library_exposes_rand_max_and_null() {
        let lib = library();
        assert!(lib.constants.iter().any(|c| c.name == "RAND_MAX" && c.value.as_i64() == 32767));
        assert!(lib.constants.iter().any(|c| c.name == "NULL" && c.value.as_i64() == 0));
    }
}
