//! Vectorized generic-dispatch reference functions ("ufuncs").
//!
//! A [`Ufunc`] owns an ordered list of typed inner loops. A call resolves one
//! loop from the argument classes (bool → int → double safe casting, first
//! match wins) and applies it elementwise with length-1 broadcasting.
//!
//! # NaN semantics
//! - `maximum` / `minimum` propagate NaN.
//! - `fmax` / `fmin` ignore NaN (return the non-NaN operand).
//! - `remainder` / `floor_divide` follow floor-division semantics; `fmod`
//!   follows the dividend's sign.
//! - Integer division by zero yields 0.
#![allow(
    clippy::float_cmp,
    clippy::unnecessary_wraps,
    clippy::suboptimal_flops,
    clippy::match_same_arms
)]

use std::f64::consts::LN_2;
use std::fmt;

use udfparity_error::{Result, UdfError};
use udfparity_types::Value;

/// Argument class used for loop resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ArgClass {
    Bool,
    Int,
    Double,
}

impl ArgClass {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Bool => "bool",
            Self::Int => "int64",
            Self::Double => "float64",
        }
    }

    /// Safe-cast rule: bool → int → double.
    #[must_use]
    pub fn can_cast_to(self, target: Self) -> bool {
        self <= target
    }

    fn of(value: &Value) -> Option<Self> {
        match value {
            Value::Bool(_) => Some(Self::Bool),
            Value::Int(_) => Some(Self::Int),
            Value::Double(_) | Value::Null => Some(Self::Double),
            Value::Text(_) | Value::IntArray(_) | Value::DoubleArray(_) => None,
        }
    }
}

/// One typed inner loop.
#[derive(Clone, Copy)]
pub enum Loop {
    BoolToBool(fn(bool) -> bool),
    BoolBoolToBool(fn(bool, bool) -> bool),
    IntToInt(fn(i64) -> i64),
    IntIntToInt(fn(i64, i64) -> Result<i64>),
    DoubleToDouble(fn(f64) -> f64),
    DoubleDoubleToDouble(fn(f64, f64) -> f64),
    DoubleToBool(fn(f64) -> bool),
    DoubleDoubleToBool(fn(f64, f64) -> bool),
    DoubleIntToDouble(fn(f64, i64) -> f64),
}

impl Loop {
    #[must_use]
    pub const fn inputs(&self) -> &'static [ArgClass] {
        match self {
            Self::BoolToBool(_) => &[ArgClass::Bool],
            Self::BoolBoolToBool(_) => &[ArgClass::Bool, ArgClass::Bool],
            Self::IntToInt(_) => &[ArgClass::Int],
            Self::IntIntToInt(_) => &[ArgClass::Int, ArgClass::Int],
            Self::DoubleToDouble(_) | Self::DoubleToBool(_) => &[ArgClass::Double],
            Self::DoubleDoubleToDouble(_) | Self::DoubleDoubleToBool(_) => {
                &[ArgClass::Double, ArgClass::Double]
            }
            Self::DoubleIntToDouble(_) => &[ArgClass::Double, ArgClass::Int],
        }
    }

    fn accepts(&self, classes: &[ArgClass]) -> bool {
        let inputs = self.inputs();
        inputs.len() == classes.len()
            && classes
                .iter()
                .zip(inputs)
                .all(|(have, want)| have.can_cast_to(*want))
    }

    fn apply(&self, args: &[&Value]) -> Result<Value> {
        Ok(match *self {
            Self::BoolToBool(f) => Value::Bool(f(bool_arg(args[0])?)),
            Self::BoolBoolToBool(f) => Value::Bool(f(bool_arg(args[0])?, bool_arg(args[1])?)),
            Self::IntToInt(f) => Value::Int(f(int_arg(args[0])?)),
            Self::IntIntToInt(f) => Value::Int(f(int_arg(args[0])?, int_arg(args[1])?)?),
            Self::DoubleToDouble(f) => Value::Double(f(double_arg(args[0])?)),
            Self::DoubleDoubleToDouble(f) => {
                Value::Double(f(double_arg(args[0])?, double_arg(args[1])?))
            }
            Self::DoubleToBool(f) => Value::Bool(f(double_arg(args[0])?)),
            Self::DoubleDoubleToBool(f) => {
                Value::Bool(f(double_arg(args[0])?, double_arg(args[1])?))
            }
            Self::DoubleIntToDouble(f) => {
                Value::Double(f(double_arg(args[0])?, int_arg(args[1])?))
            }
        })
    }
}

/// A vectorized function with typed loops.
pub struct Ufunc {
    name: &'static str,
    nin: usize,
    loops: &'static [Loop],
}

impl fmt::Debug for Ufunc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Ufunc")
            .field("name", &self.name)
            .field("nin", &self.nin)
            .field("loops", &self.loops.len())
            .finish()
    }
}

impl Ufunc {
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Number of inputs.
    #[must_use]
    pub const fn nin(&self) -> usize {
        self.nin
    }

    /// Pick the first loop every argument class can be safely cast into.
    pub fn resolve(&self, classes: &[ArgClass]) -> Result<&Loop> {
        self.loops
            .iter()
            .find(|candidate| candidate.accepts(classes))
            .ok_or_else(|| UdfError::NoMatchingLoop {
                name: self.name.to_owned(),
                kinds: classes
                    .iter()
                    .map(|c| c.as_str())
                    .collect::<Vec<_>>()
                    .join(", "),
            })
    }

    /// Apply elementwise over `inputs`, broadcasting length-1 operands.
    pub fn call(&self, inputs: &[&[Value]]) -> Result<Vec<Value>> {
        if inputs.len() != self.nin {
            return Err(UdfError::function_error(format!(
                "{}() takes {} positional arguments but {} were given",
                self.name,
                self.nin,
                inputs.len()
            )));
        }
        let len = broadcast_len(inputs)?;
        let classes = inputs
            .iter()
            .map(|column| column_class(column))
            .collect::<Result<Vec<_>>>()?;
        let inner = self.resolve(&classes)?;

        let mut out = Vec::with_capacity(len);
        let mut args: Vec<&Value> = Vec::with_capacity(self.nin);
        for idx in 0..len {
            args.clear();
            for column in inputs {
                args.push(if column.len() == 1 {
                    &column[0]
                } else {
                    &column[idx]
                });
            }
            out.push(inner.apply(&args)?);
        }
        Ok(out)
    }

    /// Scalar convenience wrapper over [`Ufunc::call`].
    pub fn call_scalar(&self, args: &[Value]) -> Result<Value> {
        let columns: Vec<&[Value]> = args.iter().map(std::slice::from_ref).collect();
        self.call(&columns)?
            .pop()
            .ok_or_else(|| UdfError::internal(format!("{} produced no output", self.name)))
    }
}

fn broadcast_len(inputs: &[&[Value]]) -> Result<usize> {
    let has_empty = inputs.iter().any(|c| c.is_empty());
    let max = inputs.iter().map(|c| c.len()).max().unwrap_or(1);
    let target = if has_empty { 0 } else { max };
    for column in inputs {
        if column.len() != 1 && column.len() != target {
            let shapes: Vec<String> = inputs.iter().map(|c| format!("({},)", c.len())).collect();
            return Err(UdfError::function_error(format!(
                "operands could not be broadcast together with shapes {}",
                shapes.join(" ")
            )));
        }
    }
    Ok(target)
}

fn column_class(column: &[Value]) -> Result<ArgClass> {
    let mut class = ArgClass::Bool;
    if column.is_empty() {
        return Ok(ArgClass::Double);
    }
    for value in column {
        let Some(c) = ArgClass::of(value) else {
            return Err(UdfError::TypeMismatch {
                expected: "scalar".to_owned(),
                actual: value.type_name().to_owned(),
            });
        };
        class = class.max(c);
    }
    Ok(class)
}

fn bool_arg(value: &Value) -> Result<bool> {
    value.as_bool().ok_or_else(|| arg_error("bool", value))
}

fn int_arg(value: &Value) -> Result<i64> {
    match value {
        Value::Bool(b) => Ok(i64::from(*b)),
        Value::Int(i) => Ok(*i),
        other => Err(arg_error("int64", other)),
    }
}

fn double_arg(value: &Value) -> Result<f64> {
    match value {
        Value::Null => Ok(f64::NAN),
        other => other.as_f64().ok_or_else(|| arg_error("float64", other)),
    }
}

fn arg_error(expected: &str, value: &Value) -> UdfError {
    UdfError::TypeMismatch {
        expected: expected.to_owned(),
        actual: value.type_name().to_owned(),
    }
}

// ── Kernels ───────────────────────────────────────────────────────────────

/// Floor division and remainder for doubles, matching `divmod` semantics.
#[must_use]
pub fn divmod_f64(a: f64, b: f64) -> (f64, f64) {
    if b == 0.0 {
        return (a / b, f64::NAN);
    }
    let mut rem = a % b;
    let mut div = (a - rem) / b;
    if rem == 0.0 {
        rem = 0.0_f64.copysign(b);
    } else if (b < 0.0) != (rem < 0.0) {
        rem += b;
        div -= 1.0;
    }
    let floordiv = if div == 0.0 {
        0.0_f64.copysign(a / b)
    } else {
        let floor = div.floor();
        if div - floor > 0.5 { floor + 1.0 } else { floor }
    };
    (floordiv, rem)
}

/// Floor division and remainder for integers; division by zero yields `(0, 0)`.
#[must_use]
pub fn divmod_i64(a: i64, b: i64) -> (i64, i64) {
    if b == 0 {
        return (0, 0);
    }
    let q = a.wrapping_div(b);
    let r = a.wrapping_rem(b);
    if r != 0 && ((r < 0) != (b < 0)) {
        (q - 1, r + b)
    } else {
        (q, r)
    }
}

/// Mantissa in `[0.5, 1)` and exponent with `m * 2^e == x`.
#[must_use]
pub fn frexp(x: f64) -> (f64, i64) {
    if x == 0.0 || !x.is_finite() {
        return (x, 0);
    }
    let bits = x.to_bits();
    let raw_exp = ((bits >> 52) & 0x7ff) as i64;
    if raw_exp == 0 {
        // subnormal: scale into the normal range first
        let (m, e) = frexp(x * 2f64.powi(54));
        return (m, e - 54);
    }
    let exp = raw_exp - 1022;
    let mantissa_bits = (bits & !(0x7ff_u64 << 52)) | (1022_u64 << 52);
    (f64::from_bits(mantissa_bits), exp)
}

#[must_use]
pub fn nextafter(x: f64, y: f64) -> f64 {
    if x.is_nan() || y.is_nan() {
        return f64::NAN;
    }
    if x == y {
        return y;
    }
    if x == 0.0 {
        return f64::from_bits(1).copysign(y);
    }
    let bits = x.to_bits();
    let next = if (y > x) == (x > 0.0) { bits + 1 } else { bits - 1 };
    f64::from_bits(next)
}

fn spacing(x: f64) -> f64 {
    if !x.is_finite() {
        return f64::NAN;
    }
    nextafter(x, f64::INFINITY.copysign(x)) - x
}

fn sign(x: f64) -> f64 {
    if x.is_nan() {
        f64::NAN
    } else if x > 0.0 {
        1.0
    } else if x < 0.0 {
        -1.0
    } else {
        0.0
    }
}

fn maximum(a: f64, b: f64) -> f64 {
    if a.is_nan() || b.is_nan() {
        f64::NAN
    } else {
        a.max(b)
    }
}

fn minimum(a: f64, b: f64) -> f64 {
    if a.is_nan() || b.is_nan() {
        f64::NAN
    } else {
        a.min(b)
    }
}

fn logaddexp(x: f64, y: f64) -> f64 {
    if x == y {
        return x + LN_2;
    }
    let tmp = x - y;
    if tmp > 0.0 {
        x + (-tmp).exp().ln_1p()
    } else if tmp <= 0.0 {
        y + tmp.exp().ln_1p()
    } else {
        tmp
    }
}

fn logaddexp2(x: f64, y: f64) -> f64 {
    if x == y {
        return x + 1.0;
    }
    let tmp = x - y;
    if tmp > 0.0 {
        x + (-tmp).exp2().ln_1p() / LN_2
    } else if tmp <= 0.0 {
        y + tmp.exp2().ln_1p() / LN_2
    } else {
        tmp
    }
}

fn heaviside(x: f64, h0: f64) -> f64 {
    if x.is_nan() {
        f64::NAN
    } else if x == 0.0 {
        h0
    } else if x < 0.0 {
        0.0
    } else {
        1.0
    }
}

fn ldexp(x: f64, exp: i64) -> f64 {
    let exp = exp.clamp(-2200, 2200) as i32;
    // split to avoid overflowing the intermediate power of two
    let half = exp / 2;
    x * 2f64.powi(half) * 2f64.powi(exp - half)
}

fn gcd_i64(a: i64, b: i64) -> Result<i64> {
    let (mut a, mut b) = (a.unsigned_abs(), b.unsigned_abs());
    while b != 0 {
        (a, b) = (b, a % b);
    }
    Ok(a as i64)
}

fn lcm_i64(a: i64, b: i64) -> Result<i64> {
    if a == 0 || b == 0 {
        return Ok(0);
    }
    let g = gcd_i64(a, b)?;
    Ok((a / g).wrapping_mul(b).wrapping_abs())
}

fn shift_left(a: i64, b: i64) -> Result<i64> {
    Ok(if (0..64).contains(&b) { a << b } else { 0 })
}

fn shift_right(a: i64, b: i64) -> Result<i64> {
    Ok(if (0..64).contains(&b) {
        a >> b
    } else if a < 0 {
        -1
    } else {
        0
    })
}

fn power_i64(a: i64, b: i64) -> Result<i64> {
    if b < 0 {
        return Err(UdfError::function_error(
            "Integers to negative integer powers are not allowed.",
        ));
    }
    Ok(a.wrapping_pow(u32::try_from(b).unwrap_or(u32::MAX)))
}

// ── Registry ──────────────────────────────────────────────────────────────

macro_rules! ufunc {
    ($ident:ident, $name:literal, $nin:literal, [$($loop:expr),+ $(,)?]) => {
        pub static $ident: Ufunc = Ufunc {
            name: $name,
            nin: $nin,
            loops: &[$($loop),+],
        };
    };
}

// Arithmetic
ufunc!(ABSOLUTE, "absolute", 1, [Loop::IntToInt(i64::wrapping_abs), Loop::DoubleToDouble(f64::abs)]);
ufunc!(CONJUGATE, "conjugate", 1, [Loop::IntToInt(|x| x), Loop::DoubleToDouble(|x| x)]);
ufunc!(FABS, "fabs", 1, [Loop::DoubleToDouble(f64::abs)]);
ufunc!(FMAX, "fmax", 2, [Loop::DoubleDoubleToDouble(f64::max)]);
ufunc!(FMIN, "fmin", 2, [Loop::DoubleDoubleToDouble(f64::min)]);
ufunc!(MAXIMUM, "maximum", 2, [Loop::IntIntToInt(|a, b| Ok(a.max(b))), Loop::DoubleDoubleToDouble(maximum)]);
ufunc!(MINIMUM, "minimum", 2, [Loop::IntIntToInt(|a, b| Ok(a.min(b))), Loop::DoubleDoubleToDouble(minimum)]);
ufunc!(POSITIVE, "positive", 1, [Loop::IntToInt(|x| x), Loop::DoubleToDouble(|x| x)]);
ufunc!(NEGATIVE, "negative", 1, [Loop::IntToInt(i64::wrapping_neg), Loop::DoubleToDouble(|x| -x)]);
ufunc!(SIGN, "sign", 1, [Loop::IntToInt(i64::signum), Loop::DoubleToDouble(sign)]);
ufunc!(RECIPROCAL, "reciprocal", 1, [Loop::DoubleToDouble(f64::recip)]);
ufunc!(ADD, "add", 2, [Loop::IntIntToInt(|a, b| Ok(a.wrapping_add(b))), Loop::DoubleDoubleToDouble(|a, b| a + b)]);
ufunc!(SUBTRACT, "subtract", 2, [Loop::IntIntToInt(|a, b| Ok(a.wrapping_sub(b))), Loop::DoubleDoubleToDouble(|a, b| a - b)]);
ufunc!(MULTIPLY, "multiply", 2, [Loop::IntIntToInt(|a, b| Ok(a.wrapping_mul(b))), Loop::DoubleDoubleToDouble(|a, b| a * b)]);
ufunc!(DIVIDE, "divide", 2, [Loop::DoubleDoubleToDouble(|a, b| a / b)]);
ufunc!(TRUE_DIVIDE, "true_divide", 2, [Loop::DoubleDoubleToDouble(|a, b| a / b)]);
ufunc!(FLOOR_DIVIDE, "floor_divide", 2, [Loop::IntIntToInt(|a, b| Ok(divmod_i64(a, b).0)), Loop::DoubleDoubleToDouble(|a, b| divmod_f64(a, b).0)]);
ufunc!(POWER, "power", 2, [Loop::IntIntToInt(power_i64), Loop::DoubleDoubleToDouble(f64::powf)]);
ufunc!(FLOAT_POWER, "float_power", 2, [Loop::DoubleDoubleToDouble(f64::powf)]);
ufunc!(SQUARE, "square", 1, [Loop::IntToInt(|x| x.wrapping_mul(x)), Loop::DoubleToDouble(|x| x * x)]);
ufunc!(SQRT, "sqrt", 1, [Loop::DoubleToDouble(f64::sqrt)]);
ufunc!(CBRT, "cbrt", 1, [Loop::DoubleToDouble(f64::cbrt)]);
ufunc!(REMAINDER, "remainder", 2, [Loop::IntIntToInt(|a, b| Ok(divmod_i64(a, b).1)), Loop::DoubleDoubleToDouble(|a, b| divmod_f64(a, b).1)]);
ufunc!(FMOD, "fmod", 2, [Loop::IntIntToInt(|a, b| Ok(if b == 0 { 0 } else { a.wrapping_rem(b) })), Loop::DoubleDoubleToDouble(|a, b| a % b)]);

// Trigonometric
ufunc!(SIN, "sin", 1, [Loop::DoubleToDouble(f64::sin)]);
ufunc!(COS, "cos", 1, [Loop::DoubleToDouble(f64::cos)]);
ufunc!(TAN, "tan", 1, [Loop::DoubleToDouble(f64::tan)]);
ufunc!(ARCSIN, "arcsin", 1, [Loop::DoubleToDouble(f64::asin)]);
ufunc!(ARCCOS, "arccos", 1, [Loop::DoubleToDouble(f64::acos)]);
ufunc!(ARCTAN, "arctan", 1, [Loop::DoubleToDouble(f64::atan)]);
ufunc!(ARCTAN2, "arctan2", 2, [Loop::DoubleDoubleToDouble(f64::atan2)]);
ufunc!(HYPOT, "hypot", 2, [Loop::DoubleDoubleToDouble(f64::hypot)]);
ufunc!(RADIANS, "radians", 1, [Loop::DoubleToDouble(f64::to_radians)]);
ufunc!(DEG2RAD, "deg2rad", 1, [Loop::DoubleToDouble(f64::to_radians)]);
ufunc!(DEGREES, "degrees", 1, [Loop::DoubleToDouble(f64::to_degrees)]);
ufunc!(RAD2DEG, "rad2deg", 1, [Loop::DoubleToDouble(f64::to_degrees)]);

// Hyperbolic
ufunc!(SINH, "sinh", 1, [Loop::DoubleToDouble(f64::sinh)]);
ufunc!(COSH, "cosh", 1, [Loop::DoubleToDouble(f64::cosh)]);
ufunc!(TANH, "tanh", 1, [Loop::DoubleToDouble(f64::tanh)]);
ufunc!(ARCSINH, "arcsinh", 1, [Loop::DoubleToDouble(f64::asinh)]);
ufunc!(ARCCOSH, "arccosh", 1, [Loop::DoubleToDouble(f64::acosh)]);
ufunc!(ARCTANH, "arctanh", 1, [Loop::DoubleToDouble(f64::atanh)]);

// Exp-log
ufunc!(EXP, "exp", 1, [Loop::DoubleToDouble(f64::exp)]);
ufunc!(EXPM1, "expm1", 1, [Loop::DoubleToDouble(f64::exp_m1)]);
ufunc!(EXP2, "exp2", 1, [Loop::DoubleToDouble(f64::exp2)]);
ufunc!(LOG, "log", 1, [Loop::DoubleToDouble(f64::ln)]);
ufunc!(LOG10, "log10", 1, [Loop::DoubleToDouble(f64::log10)]);
ufunc!(LOG2, "log2", 1, [Loop::DoubleToDouble(f64::log2)]);
ufunc!(LOG1P, "log1p", 1, [Loop::DoubleToDouble(f64::ln_1p)]);
ufunc!(LOGADDEXP, "logaddexp", 2, [Loop::DoubleDoubleToDouble(logaddexp)]);
ufunc!(LOGADDEXP2, "logaddexp2", 2, [Loop::DoubleDoubleToDouble(logaddexp2)]);
ufunc!(LDEXP, "ldexp", 2, [Loop::DoubleIntToDouble(ldexp)]);

// Rounding
ufunc!(RINT, "rint", 1, [Loop::DoubleToDouble(f64::round_ties_even)]);
ufunc!(FLOOR, "floor", 1, [Loop::DoubleToDouble(f64::floor)]);
ufunc!(CEIL, "ceil", 1, [Loop::DoubleToDouble(f64::ceil)]);
ufunc!(TRUNC, "trunc", 1, [Loop::DoubleToDouble(f64::trunc)]);
ufunc!(SPACING, "spacing", 1, [Loop::DoubleToDouble(spacing)]);
ufunc!(NEXTAFTER, "nextafter", 2, [Loop::DoubleDoubleToDouble(nextafter)]);

// Rational and bit-twiddling
ufunc!(GCD, "gcd", 2, [Loop::IntIntToInt(gcd_i64)]);
ufunc!(LCM, "lcm", 2, [Loop::IntIntToInt(lcm_i64)]);
ufunc!(RIGHT_SHIFT, "right_shift", 2, [Loop::IntIntToInt(shift_right)]);
ufunc!(LEFT_SHIFT, "left_shift", 2, [Loop::IntIntToInt(shift_left)]);
ufunc!(INVERT, "invert", 1, [Loop::BoolToBool(|b| !b), Loop::IntToInt(|x| !x)]);
ufunc!(BITWISE_OR, "bitwise_or", 2, [Loop::BoolBoolToBool(|a, b| a | b), Loop::IntIntToInt(|a, b| Ok(a | b))]);
ufunc!(BITWISE_XOR, "bitwise_xor", 2, [Loop::BoolBoolToBool(|a, b| a ^ b), Loop::IntIntToInt(|a, b| Ok(a ^ b))]);
ufunc!(BITWISE_AND, "bitwise_and", 2, [Loop::BoolBoolToBool(|a, b| a & b), Loop::IntIntToInt(|a, b| Ok(a & b))]);

// Misc
ufunc!(HEAVISIDE, "heaviside", 2, [Loop::DoubleDoubleToDouble(heaviside)]);
ufunc!(COPYSIGN, "copysign", 2, [Loop::DoubleDoubleToDouble(f64::copysign)]);

// Logical and predicates
ufunc!(ISFINITE, "isfinite", 1, [Loop::DoubleToBool(f64::is_finite)]);
ufunc!(ISINF, "isinf", 1, [Loop::DoubleToBool(f64::is_infinite)]);
ufunc!(ISNAN, "isnan", 1, [Loop::DoubleToBool(f64::is_nan)]);
ufunc!(SIGNBIT, "signbit", 1, [Loop::DoubleToBool(f64::is_sign_negative)]);
ufunc!(LESS, "less", 2, [Loop::DoubleDoubleToBool(|a, b| a < b)]);
ufunc!(LESS_EQUAL, "less_equal", 2, [Loop::DoubleDoubleToBool(|a, b| a <= b)]);
ufunc!(GREATER, "greater", 2, [Loop::DoubleDoubleToBool(|a, b| a > b)]);
ufunc!(GREATER_EQUAL, "greater_equal", 2, [Loop::DoubleDoubleToBool(|a, b| a >= b)]);
ufunc!(EQUAL, "equal", 2, [Loop::DoubleDoubleToBool(|a, b| a == b)]);
ufunc!(NOT_EQUAL, "not_equal", 2, [Loop::DoubleDoubleToBool(|a, b| a != b)]);
ufunc!(LOGICAL_OR, "logical_or", 2, [Loop::BoolBoolToBool(|a, b| a || b), Loop::DoubleDoubleToBool(|a, b| a != 0.0 || b != 0.0)]);
ufunc!(LOGICAL_XOR, "logical_xor", 2, [Loop::BoolBoolToBool(|a, b| a != b), Loop::DoubleDoubleToBool(|a, b| (a != 0.0) != (b != 0.0))]);
ufunc!(LOGICAL_AND, "logical_and", 2, [Loop::BoolBoolToBool(|a, b| a && b), Loop::DoubleDoubleToBool(|a, b| a != 0.0 && b != 0.0)]);
ufunc!(LOGICAL_NOT, "logical_not", 1, [Loop::BoolToBool(|a| !a), Loop::DoubleToBool(|a| a == 0.0)]);

/// Every ufunc known to the reference library.
pub static UFUNCS: &[&Ufunc] = &[
    &ABSOLUTE, &CONJUGATE, &FABS, &FMAX, &FMIN, &MAXIMUM, &MINIMUM, &POSITIVE, &NEGATIVE,
    &SIGN, &RECIPROCAL, &ADD, &SUBTRACT, &MULTIPLY, &DIVIDE, &TRUE_DIVIDE, &FLOOR_DIVIDE,
    &POWER, &FLOAT_POWER, &SQUARE, &SQRT, &CBRT, &REMAINDER, &FMOD, &SIN, &COS, &TAN,
    &ARCSIN, &ARCCOS, &ARCTAN, &ARCTAN2, &HYPOT, &RADIANS, &DEG2RAD, &DEGREES, &RAD2DEG,
    &SINH, &COSH, &TANH, &ARCSINH, &ARCCOSH, &ARCTANH, &EXP, &EXPM1, &EXP2, &LOG, &LOG10,
    &LOG2, &LOG1P, &LOGADDEXP, &LOGADDEXP2, &LDEXP, &RINT, &FLOOR, &CEIL, &TRUNC, &SPACING,
    &NEXTAFTER, &GCD, &LCM, &RIGHT_SHIFT, &LEFT_SHIFT, &INVERT, &BITWISE_OR, &BITWISE_XOR,
    &BITWISE_AND, &HEAVISIDE, &COPYSIGN, &ISFINITE, &ISINF, &ISNAN, &SIGNBIT, &LESS,
    &LESS_EQUAL, &GREATER, &GREATER_EQUAL, &EQUAL, &NOT_EQUAL, &LOGICAL_OR, &LOGICAL_XOR,
    &LOGICAL_AND, &LOGICAL_NOT,
];

#[cfg(test)]
fn find(name: &str) -> Option<&'static Ufunc> {
    UFUNCS.iter().copied().find(|u| u.name == name)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(v: f64) -> Value {
        Value::Double(v)
    }

    #[test]
    fn resolve_prefers_narrowest_loop() {
        let out = ADD.call_scalar(&[Value::Int(2), Value::Int(3)]).unwrap();
        assert_eq!(out, Value::Int(5));
        let out = ADD.call_scalar(&[Value::Int(2), d(0.5)]).unwrap();
        assert_eq!(out, d(2.5));
        let out = INVERT.call_scalar(&[Value::Bool(true)]).unwrap();
        assert_eq!(out, Value::Bool(false));
        let out = INVERT.call_scalar(&[Value::Int(3)]).unwrap();
        assert_eq!(out, Value::Int(-4));
    }

    #[test]
    fn resolve_reports_missing_loop() {
        let err = GCD.call_scalar(&[d(0.5), d(0.5)]).unwrap_err();
        assert!(
            matches!(err, UdfError::NoMatchingLoop { ref name, .. } if name == "gcd"),
            "got {err:?}"
        );
    }

    #[test]
    fn broadcasting_length_one() {
        let xs = [d(1.0), d(4.0), d(9.0)];
        let out = POWER.call(&[&xs, &[d(0.5)]]).unwrap();
        assert_eq!(out, vec![d(1.0), d(2.0), d(3.0)]);

        let err = ADD.call(&[&xs, &[d(1.0), d(2.0)]]).unwrap_err();
        assert!(err.to_string().contains("could not be broadcast"));

        let empty = ADD.call(&[&[], &[d(1.0)]]).unwrap();
        assert!(empty.is_empty());
    }

    #[test]
    fn wrong_input_count() {
        let err = SQRT.call(&[&[d(1.0)], &[d(1.0)]]).unwrap_err();
        assert!(err.to_string().contains("takes 1 positional arguments"));
    }

    #[test]
    fn nan_propagation_rules() {
        let nan = f64::NAN;
        assert!(MAXIMUM.call_scalar(&[d(nan), d(1.0)]).unwrap().is_nan());
        assert_eq!(FMAX.call_scalar(&[d(nan), d(1.0)]).unwrap(), d(1.0));
        assert!(MINIMUM.call_scalar(&[d(1.0), d(nan)]).unwrap().is_nan());
        assert_eq!(FMIN.call_scalar(&[d(1.0), d(nan)]).unwrap(), d(1.0));
        assert!(SIGN.call_scalar(&[d(nan)]).unwrap().is_nan());
        assert!(SQRT.call_scalar(&[Value::Null]).unwrap().is_nan());
    }

    #[test]
    fn floor_semantics() {
        assert_eq!(divmod_f64(7.0, -2.0), (-4.0, -1.0));
        assert_eq!(divmod_f64(-7.0, 2.0), (-4.0, 1.0));
        assert_eq!(divmod_i64(-7, 2), (-4, 1));
        assert_eq!(divmod_i64(7, 0), (0, 0));
        assert_eq!(REMAINDER.call_scalar(&[d(-1.0), d(3.0)]).unwrap(), d(2.0));
        assert_eq!(FMOD.call_scalar(&[d(-1.0), d(3.0)]).unwrap(), d(-1.0));
        assert_eq!(
            FLOOR_DIVIDE.call_scalar(&[Value::Int(-7), Value::Int(2)]).unwrap(),
            Value::Int(-4)
        );
    }

    #[test]
    fn rounding_is_half_even() {
        assert_eq!(RINT.call_scalar(&[d(2.5)]).unwrap(), d(2.0));
        assert_eq!(RINT.call_scalar(&[d(3.5)]).unwrap(), d(4.0));
        assert_eq!(RINT.call_scalar(&[d(-0.5)]).unwrap(), d(-0.0));
    }

    #[test]
    fn frexp_and_ldexp_invert() {
        for x in [1.0, 0.8, -3.25, 1e-310, 6.02e23] {
            let (m, e) = frexp(x);
            assert!((0.5..1.0).contains(&m.abs()), "x={x} m={m}");
            assert_eq!(ldexp(m, e), x, "x={x}");
        }
        assert_eq!(frexp(0.0), (0.0, 0));
    }

    #[test]
    fn nextafter_and_spacing() {
        assert_eq!(nextafter(1.0, 2.0), 1.0 + f64::EPSILON);
        assert_eq!(nextafter(1.0, 0.0), 1.0 - f64::EPSILON / 2.0);
        assert_eq!(nextafter(0.0, -1.0), -f64::from_bits(1));
        assert_eq!(spacing(1.0), f64::EPSILON);
        assert!(spacing(f64::INFINITY).is_nan());
    }

    #[test]
    fn logaddexp_values() {
        let got = logaddexp(1.0, 2.0);
        let want = (1f64.exp() + 2f64.exp()).ln();
        assert!((got - want).abs() < 1e-12);
        assert_eq!(logaddexp(0.0, 0.0), LN_2);
        assert_eq!(logaddexp2(3.0, 3.0), 4.0);
    }

    #[test]
    fn integer_rational_functions() {
        assert_eq!(gcd_i64(3, 30).unwrap(), 3);
        assert_eq!(gcd_i64(-4, 6).unwrap(), 2);
        assert_eq!(lcm_i64(3, 30).unwrap(), 30);
        assert_eq!(lcm_i64(0, 5).unwrap(), 0);
        assert_eq!(shift_right(3, 30).unwrap(), 0);
        assert_eq!(shift_right(-3, 70).unwrap(), -1);
        assert_eq!(shift_left(5, 50).unwrap(), 5 << 50);
        assert!(power_i64(2, -1).is_err());
        assert_eq!(power_i64(2, 10).unwrap(), 1024);
    }

    #[test]
    fn heaviside_cases() {
        assert_eq!(heaviside(-1.0, 0.5), 0.0);
        assert_eq!(heaviside(0.0, 0.5), 0.5);
        assert_eq!(heaviside(2.0, 0.5), 1.0);
        assert!(heaviside(f64::NAN, 0.5).is_nan());
    }

    #[test]
    fn logical_accepts_bools_and_doubles() {
        assert_eq!(
            LOGICAL_XOR
                .call_scalar(&[Value::Bool(true), Value::Bool(true)])
                .unwrap(),
            Value::Bool(false)
        );
        assert_eq!(
            LOGICAL_AND.call_scalar(&[d(0.5), d(0.0)]).unwrap(),
            Value::Bool(false)
        );
    }

    #[test]
    fn registry_lookup() {
        assert_eq!(find("hypot").map(Ufunc::name), Some("hypot"));
        assert!(find("matmul").is_none());
        let mut names: Vec<&str> = UFUNCS.iter().map(|u| u.name()).collect();
        let total = names.len();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), total, "duplicate ufunc names");
    }
}
