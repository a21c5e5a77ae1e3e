//! `math.h`: the trigonometric, hyperbolic, exponential, and rounding functions.
//!
//! Grounded on `__builtins__/math.py`, which calls through to Python's `math` module one
//! function at a time; here each builtin calls the matching `f64` method directly. `atan2` and
//! `pow` are corrected to their real two-argument signatures (spec §9's resolved Open
//! Question): the reference module declares both as single-argument, which silently drops
//! their second operand.

use super::{Builtin, Library};
use crate::{
    ctype::CType,
    error::{CError, CResult},
    evaluator::{EvalContext, Value},
    number::Number,
};

macro_rules! unary_math {
    ($name:ident, $method:ident) => {
        fn $name(args: &[Value], _ctx: &mut EvalContext<'_>) -> CResult<Value> {
            let x = args
                .first()
                .ok_or_else(|| CError::runtime(concat!(stringify!($name), " requires one argument")))?
                .as_number()?
                .as_f64();
            Ok(Value::Number(Number::double(x.$method())))
        }
    };
}

unary_math!(sqrt, sqrt);
unary_math!(sin, sin);
unary_math!(cos, cos);
unary_math!(tan, tan);
unary_math!(asin, asin);
unary_math!(acos, acos);
unary_math!(atan, atan);
unary_math!(sinh, sinh);
unary_math!(cosh, cosh);
unary_math!(tanh, tanh);
unary_math!(asinh, asinh);
unary_math!(acosh, acosh);
unary_math!(atanh, atanh);
unary_math!(exp, exp);
unary_math!(log10, log10);
unary_math!(ceil, ceil);
unary_math!(floor, floor);
unary_math!(trunc, trunc);
unary_math!(round, round);

fn log(args: &[Value], _ctx: &mut EvalContext<'_>) -> CResult<Value> {
    let x = args.first().ok_or_else(|| CError::runtime("log requires one argument"))?.as_number()?.as_f64();
    Ok(Value::Number(Number::double(x.ln())))
}

fn atan2(args: &[Value], _ctx: &mut EvalContext<'_>) -> CResult<Value> {
    let y = args.first().ok_or_else(|| CError::runtime("atan2 requires two arguments"))?.as_number()?.as_f64();
    let x = args.get(1).ok_or_else(|| CError::runtime("atan2 requires two arguments"))?.as_number()?.as_f64();
    Ok(Value::Number(Number::double(y.atan2(x))))
}

fn pow(args: &[Value], _ctx: &mut EvalContext<'_>) -> CResult<Value> {
    let base = args.first().ok_or_else(|| CError::runtime("pow requires two arguments"))?.as_number()?.as_f64();
    let exponent = args.get(1).ok_or_else(|| CError::runtime("pow requires two arguments"))?.as_number()?.as_f64();
    Ok(Value::Number(Number::double(base.powf(exponent))))
}

pub(super) fn library() -> Library {
    let unary = |name, handler| Builtin { name, return_type: CType::double(), param_types: Some(vec![CType::double()]), handler };
    let binary =
        |name, handler| Builtin { name, return_type: CType::double(), param_types: Some(vec![CType::double(), CType::double()]), handler };
    Library {
        functions: vec![
            unary("sqrt", sqrt),
            unary("sin", sin),
            unary("cos", cos),
            unary("tan", tan),
            unary("asin", asin),
            unary("acos", acos),
            unary("atan", atan),
            binary("atan2", atan2),
            unary("sinh", sinh),
            unary("cosh", cosh),
            unary("tanh", tanh),
            unary("asinh", asinh),
            unary("acosh", acosh),
            unary("atanh", atanh),
            unary("exp", exp),
            unary("log", log),
            unary("log10", log10),
            binary("pow", pow),
            unary("ceil", ceil),
            unary("floor", floor),
            unary("trunc", trunc),
            unary("round", round),
        ],
        constants: Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng as _;

    use super::*;

    #[test]
    fn library_declares_atan2_and_pow_as_two_argument() {
        let lib = library();
        let atan2 = lib.functions.iter().find(|f| f.name == "atan2").unwrap();
        assert_eq!(atan2.param_types.as_ref().unwrap().len(), 2);
        let pow = lib.functions.iter().find(|f| f.name == "pow").unwrap();
        assert_eq!(pow.param_types.as_ref().unwrap().len(), 2);
    }

    #[test]
    fn sqrt_handler_computes_square_root() {
        let args = [Value::Number(Number::double(9.0))];
        let mut mem = crate::memory::Memory::new();
        let mut writer = crate::io::NoPrint;
        let mut stdin = crate::io::NoStdin;
        let mut rng = rand::rngs::StdRng::seed_from_u64(0);
        let mut ctx = EvalContext { memory: &mut mem, writer: &mut writer, stdin: &mut stdin, rng: &mut rng };
        let result = sqrt(&args, &mut ctx).unwrap();
        assert_eq!(result.as_number().unwrap().as_f64(), 3.0);
    }
}
