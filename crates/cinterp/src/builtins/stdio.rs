//! `stdio.h`: `printf`, `scanf`, `getchar`, `putchar`.
//!
//! Grounded on `__builtins__/stdio.py`'s `printf`/`scanf` definitions; `getchar`/`putchar` are
//! additions the distilled grammar's builtin list names but the reference module never
//! implemented. `printf`/`scanf` are variadic (`param_types: None`) the same way the reference
//! decorator leaves their `arg_types` unchecked.

use std::borrow::Cow;

use super::{Builtin, Library};
use crate::{ctype::CType, error::CError, error::CResult, evaluator::EvalContext, evaluator::Value, number::Number};

/// Splits a format string into the ordered list of conversion characters it names, ignoring
/// flags/width/precision (this interpreter only needs to know which argument goes where).
fn format_specs(fmt: &str) -> CResult<Vec<char>> {
    let chars: Vec<char> = fmt.chars().collect();
    let mut specs = Vec::new();
    let mut i = 0;
    while i < chars.len() {
        if chars[i] != '%' {
            i += 1;
            continue;
        }
        i += 1;
        if i >= chars.len() {
            return Err(CError::runtime("dangling '%' in format string"));
        }
        if chars[i] != '%' {
            while i < chars.len() && !chars[i].is_ascii_alphabetic() {
                i += 1;
            }
            if i >= chars.len() {
                return Err(CError::runtime("unterminated format specifier"));
            }
            specs.push(chars[i]);
        }
        i += 1;
    }
    Ok(specs)
}

fn render_printf(fmt: &str, args: &[Value]) -> CResult<String> {
    let chars: Vec<char> = fmt.chars().collect();
    let mut out = String::new();
    let mut args = args.iter();
    let mut i = 0;
    while i < chars.len() {
        if chars[i] != '%' {
            out.push(chars[i]);
            i += 1;
            continue;
        }
        i += 1;
        if i >= chars.len() {
            return Err(CError::runtime("dangling '%' in format string"));
        }
        if chars[i] == '%' {
            out.push('%');
            i += 1;
            continue;
        }
        let flag_start = i;
        while i < chars.len() && !chars[i].is_ascii_alphabetic() {
            i += 1;
        }
        if i >= chars.len() {
            return Err(CError::runtime("unterminated format specifier"));
        }
        let flags: String = chars[flag_start..i].iter().collect();
        let conv = chars[i];
        i += 1;
        let value = args.next().ok_or_else(|| CError::runtime("not enough arguments for format string"))?;
        match conv {
            'd' | 'i' => out.push_str(&value.as_number()?.as_i64().to_string()),
            'u' => out.push_str(&(value.as_number()?.as_i64() as u64).to_string()),
            'f' | 'g' | 'e' => {
                let precision = flags.split('.').nth(1).and_then(|p| p.parse::<usize>().ok()).unwrap_or(6);
                out.push_str(&format!("{:.*}", precision, value.as_number()?.as_f64()));
            }
            'c' => {
                let code = value.as_number()?.as_i64();
                out.push(u8::try_from(code).map(char::from).unwrap_or('?'));
            }
            's' => match value {
                Value::Str(s) => out.push_str(s),
                Value::Number(_) => return Err(CError::runtime("'%s' expects a string argument")),
            },
            'x' => out.push_str(&format!("{:x}", value.as_number()?.as_i64())),
            'p' => out.push_str(&format!("0x{:x}", value.as_number()?.as_i64())),
            other => return Err(CError::runtime(format!("unsupported format specifier '%{other}'"))),
        }
    }
    Ok(out)
}

fn printf(args: &[Value], ctx: &mut EvalContext<'_>) -> CResult<Value> {
    let (fmt, rest) = args.split_first().ok_or_else(|| CError::runtime("printf requires a format string"))?;
    let Value::Str(fmt) = fmt else {
        return Err(CError::runtime("printf's first argument must be a string"));
    };
    let rendered = render_printf(fmt, rest)?;
    let printed = rendered.chars().count();
    ctx.writer.stdout_write(Cow::Owned(rendered))?;
    Ok(Value::Number(Number::int(printed as i64)))
}

fn scanf(args: &[Value], ctx: &mut EvalContext<'_>) -> CResult<Value> {
    let (fmt, rest) = args.split_first().ok_or_else(|| CError::runtime("scanf requires a format string"))?;
    let Value::Str(fmt) = fmt else {
        return Err(CError::runtime("scanf's first argument must be a string"));
    };
    let specs = format_specs(fmt)?;
    let mut matched = 0_i64;
    for (spec, target) in specs.iter().zip(rest.iter()) {
        let address = target.as_number()?.as_i64() as u64;
        let slot_ty = ctx.memory.load(address).as_number()?.ty.clone();
        let parsed = match spec {
            'd' | 'i' => {
                let token = ctx.stdin.next_token()?;
                let n: i64 = token.parse().map_err(|_| CError::runtime(format!("scanf: '{token}' is not an integer")))?;
                Number::int(n)
            }
            'f' => {
                let token = ctx.stdin.next_token()?;
                let n: f64 = token.parse().map_err(|_| CError::runtime(format!("scanf: '{token}' is not a float")))?;
                Number::double(n)
            }
            'c' => Number::int(i64::from(ctx.stdin.next_char()? as u32)),
            other => return Err(CError::runtime(format!("unsupported scanf specifier '%{other}'"))),
        };
        ctx.memory.store(address, parsed.cast(&slot_ty));
        matched += 1;
    }
    Ok(Value::Number(Number::int(matched)))
}

fn getchar(_args: &[Value], ctx: &mut EvalContext<'_>) -> CResult<Value> {
    let ch = ctx.stdin.next_char()?;
    Ok(Value::Number(Number::int(i64::from(ch as u32))))
}

fn putchar(args: &[Value], ctx: &mut EvalContext<'_>) -> CResult<Value> {
    let code = args.first().ok_or_else(|| CError::runtime("putchar requires one argument"))?.as_number()?.as_i64();
    let ch = u8::try_from(code).map(char::from).unwrap_or('?');
    ctx.writer.stdout_push(ch)?;
    Ok(Value::Number(Number::int(code)))
}

pub(super) fn library() -> Library {
    Library {
        functions: vec![
            Builtin { name: "printf", return_type: CType::int(), param_types: None, handler: printf },
            Builtin { name: "scanf", return_type: CType::int(), param_types: None, handler: scanf },
            Builtin { name: "getchar", return_type: CType::char(), param_types: Some(vec![]), handler: getchar },
            Builtin { name: "putchar", return_type: CType::char(), param_types: Some(vec![CType::char()]), handler: putchar },
        ],
        constants: Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_printf_substitutes_decimal_and_char() {
        let args = vec![Value::Number(Number::int(7)), Value::Number(Number::int(65))];
        let out = render_printf("x = %d, c = %c%%", &args).unwrap();
        assert_eq!(out, "x = 7, c = A%");
    }

    #[test]
    fn render_printf_rejects_missing_arguments() {
        assert!(render_printf("%d", &[]).is_err());
    }

    #[test]
    fn format_specs_extracts_conversion_letters_only() {
        assert_eq!(format_specs("%d and %f and %%").unwrap(), vec!['d', 'f']);
    }
}
