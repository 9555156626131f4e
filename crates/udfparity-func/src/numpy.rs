//! Plain scalar references built on top of the ufunc kernels.
//!
//! These are the catalog entries that pick one output of a multi-output
//! operation (`divmod0`, `frexp0`) or pin an optional argument (`around`,
//! `round2` with zero decimals), so they register as-is rather than through
//! the elementwise wrapper.

use udfparity_error::{Result, UdfError};
use udfparity_types::Value;

use crate::ufunc::{divmod_f64, divmod_i64, frexp};

fn numeric(name: &str, value: &Value) -> Result<f64> {
    match value {
        Value::Null => Ok(f64::NAN),
        other => other.as_f64().ok_or_else(|| {
            UdfError::function_error(format!(
                "{name}: unsupported operand type {}",
                other.type_name()
            ))
        }),
    }
}

fn expect_arity(name: &str, args: &[Value], arity: usize) -> Result<()> {
    if args.len() == arity {
        Ok(())
    } else {
        Err(UdfError::function_error(format!(
            "{name}() takes {arity} positional arguments but {} were given",
            args.len()
        )))
    }
}

/// Quotient of floor division.
pub fn divmod0(args: &[Value]) -> Result<Value> {
    expect_arity("divmod0", args, 2)?;
    match (&args[0], &args[1]) {
        (Value::Int(a), Value::Int(b)) => Ok(Value::Int(divmod_i64(*a, *b).0)),
        (a, b) => Ok(Value::Double(
            divmod_f64(numeric("divmod0", a)?, numeric("divmod0", b)?).0,
        )),
    }
}

/// Mantissa of `frexp`.
pub fn frexp0(args: &[Value]) -> Result<Value> {
    expect_arity("frexp0", args, 1)?;
    Ok(Value::Double(frexp(numeric("frexp0", &args[0])?).0))
}

/// Round half to even with zero decimals.
pub fn around(args: &[Value]) -> Result<Value> {
    expect_arity("around", args, 1)?;
    match &args[0] {
        Value::Int(i) => Ok(Value::Int(*i)),
        other => Ok(Value::Double(numeric("around", other)?.round_ties_even())),
    }
}

pub fn round2(args: &[Value]) -> Result<Value> {
    expect_arity("round2", args, 1)?;
    around(args)
}
