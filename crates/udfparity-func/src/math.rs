//! Scalar references with the semantics of a standard `math` module.
//!
//! Integer-valued operations (`ceil`, `floor`, `trunc`, `comb`, `factorial`,
//! `gcd`, `isqrt`, `prod`) return [`Value::Int`] and reject non-integral
//! inputs with a function error. Floating-point domain errors follow C libm:
//! `sqrt(-1)` is NaN, `log(0)` is `-inf`. This matches what a JIT-compiled
//! body produces for the same call.

use udfparity_error::{Result, UdfError};
use udfparity_types::Value;

use crate::special;
use crate::ufunc::frexp as frexp_parts;

fn expect_arity(name: &str, args: &[Value], arity: usize) -> Result<()> {
    if args.len() == arity {
        Ok(())
    } else {
        Err(UdfError::function_error(format!(
            "{name}() takes exactly {arity} argument(s) ({} given)",
            args.len()
        )))
    }
}

fn real(args: &[Value], idx: usize) -> Result<f64> {
    match &args[idx] {
        Value::Null => Ok(f64::NAN),
        Value::Bool(b) => Ok(f64::from(u8::from(*b))),
        Value::Int(i) => Ok(*i as f64),
        Value::Double(d) => Ok(*d),
        other => Err(UdfError::function_error(format!(
            "must be real number, not {}",
            other.type_name()
        ))),
    }
}

fn integer(args: &[Value], idx: usize) -> Result<i64> {
    match &args[idx] {
        Value::Bool(b) => Ok(i64::from(*b)),
        Value::Int(i) => Ok(*i),
        other => Err(UdfError::function_error(format!(
            "'{}' object cannot be interpreted as an integer",
            other.type_name()
        ))),
    }
}

/// Convert an integral float to `int`, rejecting NaN and infinities.
fn float_to_int(value: f64) -> Result<i64> {
    if value.is_nan() {
        return Err(UdfError::function_error("cannot convert float NaN to integer"));
    }
    if value.is_infinite() || value.abs() >= 9.223_372_036_854_776e18 {
        return Err(UdfError::function_error(
            "cannot convert float infinity to integer",
        ));
    }
    Ok(value as i64)
}

macro_rules! unary_real {
    ($($name:ident => $f:expr),+ $(,)?) => {
        $(
            pub fn $name(args: &[Value]) -> Result<Value> {
                expect_arity(stringify!($name), args, 1)?;
                let f: fn(f64) -> f64 = $f;
                Ok(Value::Double(f(real(args, 0)?)))
            }
        )+
    };
}

macro_rules! binary_real {
    ($($name:ident => $f:expr),+ $(,)?) => {
        $(
            pub fn $name(args: &[Value]) -> Result<Value> {
                expect_arity(stringify!($name), args, 2)?;
                let f: fn(f64, f64) -> f64 = $f;
                Ok(Value::Double(f(real(args, 0)?, real(args, 1)?)))
            }
        )+
    };
}

macro_rules! predicate {
    ($($name:ident => $f:expr),+ $(,)?) => {
        $(
            pub fn $name(args: &[Value]) -> Result<Value> {
                expect_arity(stringify!($name), args, 1)?;
                let f: fn(f64) -> bool = $f;
                Ok(Value::Bool(f(real(args, 0)?)))
            }
        )+
    };
}

unary_real! {
    fabs => f64::abs,
    exp => f64::exp,
    expm1 => f64::exp_m1,
    log => f64::ln,
    log1p => f64::ln_1p,
    log2 => f64::log2,
    log10 => f64::log10,
    sqrt => f64::sqrt,
    acos => f64::acos,
    asin => f64::asin,
    atan => f64::atan,
    cos => f64::cos,
    sin => f64::sin,
    tan => f64::tan,
    degrees => f64::to_degrees,
    radians => f64::to_radians,
    acosh => f64::acosh,
    asinh => f64::asinh,
    atanh => f64::atanh,
    cosh => f64::cosh,
    sinh => f64::sinh,
    tanh => f64::tanh,
    erf => special::erf,
    erfc => special::erfc,
    gamma => special::gamma,
    lgamma => special::lgamma,
}

binary_real! {
    copysign => f64::copysign,
    fmod => |x, y| x % y,
    atan2 => f64::atan2,
    hypot => f64::hypot,
    pow => f64::powf,
    remainder => ieee_remainder,
}

predicate! {
    isfinite => f64::is_finite,
    isinf => f64::is_infinite,
    isnan => f64::is_nan,
}

/// IEEE 754 remainder: `x - n*y` with `n` the integer nearest `x/y`, ties to even.
fn ieee_remainder(x: f64, y: f64) -> f64 {
    if x.is_nan() || y.is_nan() {
        return f64::NAN;
    }
    if x.is_infinite() || y == 0.0 {
        return f64::NAN;
    }
    if y.is_infinite() {
        return x;
    }
    let ax = x.abs();
    let ay = y.abs();
    let m = ax % ay;
    let c = ay - m;
    let r = if m < c {
        m
    } else if m > c {
        -c
    } else {
        // half-way: pick the even multiple
        m - 2.0 * ((0.5 * (ax - m)) % ay)
    };
    1.0_f64.copysign(x) * r
}

fn rounding(name: &str, args: &[Value], op: fn(f64) -> f64) -> Result<Value> {
    expect_arity(name, args, 1)?;
    match &args[0] {
        Value::Int(i) => Ok(Value::Int(*i)),
        Value::Bool(b) => Ok(Value::Int(i64::from(*b))),
        _ => Ok(Value::Int(float_to_int(op(real(args, 0)?))?)),
    }
}

pub fn ceil(args: &[Value]) -> Result<Value> {
    rounding("ceil", args, f64::ceil)
}

pub fn floor(args: &[Value]) -> Result<Value> {
    rounding("floor", args, f64::floor)
}

pub fn trunc(args: &[Value]) -> Result<Value> {
    rounding("trunc", args, f64::trunc)
}

pub fn comb(args: &[Value]) -> Result<Value> {
    expect_arity("comb", args, 2)?;
    let n = integer(args, 0)?;
    let k = integer(args, 1)?;
    if n < 0 || k < 0 {
        return Err(UdfError::function_error("n and k must be non-negative integers"));
    }
    if k > n {
        return Ok(Value::Int(0));
    }
    let k = k.min(n - k);
    let mut acc: i128 = 1;
    for step in 0..k {
        acc = acc * i128::from(n - step) / i128::from(step + 1);
        if acc > i128::from(i64::MAX) {
            return Err(UdfError::function_error("comb result does not fit in int64"));
        }
    }
    Ok(Value::Int(acc as i64))
}

pub fn factorial(args: &[Value]) -> Result<Value> {
    expect_arity("factorial", args, 1)?;
    let n = integer(args, 0)?;
    if n < 0 {
        return Err(UdfError::function_error(
            "factorial() not defined for negative values",
        ));
    }
    (1..=n)
        .try_fold(1_i64, i64::checked_mul)
        .map(Value::Int)
        .ok_or_else(|| UdfError::function_error("factorial result does not fit in int64"))
}

pub fn gcd(args: &[Value]) -> Result<Value> {
    expect_arity("gcd", args, 2)?;
    let (mut a, mut b) = (integer(args, 0)?.unsigned_abs(), integer(args, 1)?.unsigned_abs());
    while b != 0 {
        (a, b) = (b, a % b);
    }
    i64::try_from(a)
        .map(Value::Int)
        .map_err(|_| UdfError::function_error("gcd result does not fit in int64"))
}

/// `isclose(a, b)` with `rel_tol = 1e-9`, `abs_tol = 0`.
pub fn isclose(args: &[Value]) -> Result<Value> {
    expect_arity("isclose", args, 2)?;
    let a = real(args, 0)?;
    let b = real(args, 1)?;
    if a == b {
        return Ok(Value::Bool(true));
    }
    if a.is_infinite() || b.is_infinite() {
        return Ok(Value::Bool(false));
    }
    let diff = (b - a).abs();
    let tol = 1e-9 * b.abs().max(a.abs());
    Ok(Value::Bool(diff <= tol))
}

pub fn isqrt(args: &[Value]) -> Result<Value> {
    expect_arity("isqrt", args, 1)?;
    let n = integer(args, 0)?;
    if n < 0 {
        return Err(UdfError::function_error(
            "isqrt() argument must be nonnegative",
        ));
    }
    let mut root = (n as f64).sqrt() as i64;
    while root.checked_mul(root).is_none_or(|square| square > n) {
        root -= 1;
    }
    while (root + 1).checked_mul(root + 1).is_some_and(|square| square <= n) {
        root += 1;
    }
    Ok(Value::Int(root))
}

pub fn ldexp(args: &[Value]) -> Result<Value> {
    expect_arity("ldexp", args, 2)?;
    let x = real(args, 0)?;
    let exp = integer(args, 1)?.clamp(-2200, 2200) as i32;
    let half = exp / 2;
    Ok(Value::Double(x * 2f64.powi(half) * 2f64.powi(exp - half)))
}

/// Fractional part of `modf`; the integral part is dropped.
pub fn modf(args: &[Value]) -> Result<Value> {
    expect_arity("modf", args, 1)?;
    let x = real(args, 0)?;
    if x.is_infinite() {
        return Ok(Value::Double(0.0_f64.copysign(x)));
    }
    Ok(Value::Double((x - x.trunc()).copysign(x)))
}

/// Mantissa of `frexp`; the exponent is dropped.
pub fn frexp(args: &[Value]) -> Result<Value> {
    expect_arity("frexp", args, 1)?;
    Ok(Value::Double(frexp_parts(real(args, 0)?).0))
}

pub fn prod(args: &[Value]) -> Result<Value> {
    expect_arity("prod", args, 1)?;
    match &args[0] {
        Value::IntArray(items) => items
            .iter()
            .try_fold(1_i64, |acc, &item| acc.checked_mul(item))
            .map(Value::Int)
            .ok_or_else(|| UdfError::function_error("prod result does not fit in int64")),
        Value::DoubleArray(items) => Ok(Value::Double(items.iter().product())),
        other => Err(UdfError::function_error(format!(
            "'{}' object is not iterable",
            other.type_name()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(v: f64) -> Value {
        Value::Double(v)
    }

    fn i(v: i64) -> Value {
        Value::Int(v)
    }

    #[test]
    fn rounding_returns_integers() {
        assert_eq!(ceil(&[d(1.2)]).unwrap(), i(2));
        assert_eq!(floor(&[d(-1.2)]).unwrap(), i(-2));
        assert_eq!(floor(&[i(7)]).unwrap(), i(7));
        assert_eq!(trunc(&[d(-1.7)]).unwrap(), i(-1));
        assert!(ceil(&[d(f64::NAN)]).is_err());
        assert!(floor(&[d(f64::INFINITY)]).is_err());
    }

    #[test]
    fn domain_errors_follow_libm() {
        assert!(sqrt(&[d(-1.0)]).unwrap().is_nan());
        assert_eq!(log(&[d(0.0)]).unwrap(), d(f64::NEG_INFINITY));
        assert!(acos(&[d(1.1)]).unwrap().is_nan());
        assert_eq!(atanh(&[d(1.0)]).unwrap(), d(f64::INFINITY));
    }

    #[test]
    fn integer_functions() {
        assert_eq!(gcd(&[i(3), i(30)]).unwrap(), i(3));
        assert_eq!(gcd(&[i(0), i(0)]).unwrap(), i(0));
        assert_eq!(comb(&[i(5), i(2)]).unwrap(), i(10));
        assert_eq!(comb(&[i(1), i(10)]).unwrap(), i(0));
        assert_eq!(comb(&[i(60), i(30)]).unwrap(), i(118_264_581_564_861_424));
        assert!(comb(&[i(-1), i(1)]).is_err());
        assert_eq!(factorial(&[i(5)]).unwrap(), i(120));
        assert!(factorial(&[i(21)]).is_err());
        assert!(factorial(&[i(-1)]).is_err());
        assert_eq!(isqrt(&[i(30)]).unwrap(), i(5));
        assert_eq!(isqrt(&[i(i64::MAX)]).unwrap(), i(3_037_000_499));
        assert!(isqrt(&[i(-4)]).is_err());
        assert!(gcd(&[d(1.5), i(3)]).is_err());
    }

    #[test]
    fn remainder_rounds_to_even_quotient() {
        assert_eq!(remainder(&[d(5.0), d(2.0)]).unwrap(), d(1.0));
        assert_eq!(remainder(&[d(7.0), d(2.0)]).unwrap(), d(-1.0));
        assert_eq!(remainder(&[d(-7.0), d(2.0)]).unwrap(), d(1.0));
        assert_eq!(remainder(&[d(10.0), d(3.0)]).unwrap(), d(1.0));
        assert_eq!(remainder(&[d(11.0), d(3.0)]).unwrap(), d(-1.0));
        assert!(remainder(&[d(1.0), d(0.0)]).unwrap().is_nan());
        assert_eq!(remainder(&[d(1.5), d(f64::INFINITY)]).unwrap(), d(1.5));
    }

    #[test]
    fn pair_returning_functions_keep_first_component() {
        assert_eq!(frexp(&[d(8.0)]).unwrap(), d(0.5));
        assert_eq!(modf(&[d(-2.25)]).unwrap(), d(-0.25));
        assert_eq!(modf(&[d(f64::INFINITY)]).unwrap(), d(0.0));
    }

    #[test]
    fn isclose_default_tolerance() {
        assert_eq!(isclose(&[d(1.0), d(1.0 + 1e-10)]).unwrap(), Value::Bool(true));
        assert_eq!(isclose(&[d(1.0), d(1.0 + 1e-8)]).unwrap(), Value::Bool(false));
        assert_eq!(
            isclose(&[d(f64::INFINITY), d(f64::INFINITY)]).unwrap(),
            Value::Bool(true)
        );
        assert_eq!(isclose(&[d(f64::NAN), d(f64::NAN)]).unwrap(), Value::Bool(false));
    }

    #[test]
    fn prod_and_ldexp() {
        assert_eq!(prod(&[Value::IntArray(vec![2, 3, 4])]).unwrap(), i(24));
        assert_eq!(prod(&[Value::IntArray(Vec::new())]).unwrap(), i(1));
        assert!(prod(&[i(3)]).is_err());
        assert_eq!(ldexp(&[d(0.75), i(4)]).unwrap(), d(12.0));
    }

    #[test]
    fn arity_is_checked() {
        let err = sqrt(&[d(1.0), d(2.0)]).unwrap_err();
        assert_eq!(err.to_string(), "sqrt() takes exactly 1 argument(s) (2 given)");
        assert!(hypot(&[d(1.0)]).is_err());
    }
}
