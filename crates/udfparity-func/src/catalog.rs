//! Reference function catalogs.
//!
//! A catalog is a static table of `(name, signature, reference)` triples.
//! Each entry's adapter shape is fixed when the catalog is built, from the
//! reference variant, so nothing downstream has to inspect the callable.

use std::f64::consts::{E, PI, TAU};
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;
use udfparity_error::{Result, UdfError};
use udfparity_types::{Signature, Value};

use crate::ufunc::{self, Ufunc};
use crate::{math, numpy};

/// Plain scalar reference: `fn(args) -> value`.
pub type ScalarFn = fn(&[Value]) -> Result<Value>;

/// The in-process implementation a UDF is checked against.
#[derive(Clone, Copy)]
pub enum Reference {
    /// Plain scalar function with a fixed number of parameters.
    Scalar { arity: usize, call: ScalarFn },
    /// Vectorized generic-dispatch function.
    Ufunc(&'static Ufunc),
    /// Mathematical constant.
    Constant(f64),
}

impl Reference {
    /// Scalar reference taking `arity` arguments.
    #[must_use]
    pub const fn scalar(arity: usize, call: ScalarFn) -> Self {
        Self::Scalar { arity, call }
    }

    #[must_use]
    pub const fn adapter_kind(&self) -> AdapterKind {
        match self {
            Self::Scalar { .. } => AdapterKind::Direct,
            Self::Ufunc(_) => AdapterKind::ElementwiseWrap,
            Self::Constant(_) => AdapterKind::ConstantWrap,
        }
    }
}

impl fmt::Debug for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Scalar { arity, .. } => write!(f, "Scalar(arity={arity})"),
            Self::Ufunc(u) => write!(f, "Ufunc({})", u.name()),
            Self::Constant(c) => write!(f, "Constant({c})"),
        }
    }
}

/// How a reference is turned into a compilable scalar function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdapterKind {
    Direct,
    ElementwiseWrap,
    ConstantWrap,
}

impl AdapterKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Direct => "direct",
            Self::ElementwiseWrap => "elementwise_wrap",
            Self::ConstantWrap => "constant_wrap",
        }
    }
}

/// Which reference library a catalog validates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Suite {
    Math,
    Numpy,
}

impl Suite {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Math => "math",
            Self::Numpy => "numpy",
        }
    }

    pub fn parse(text: &str) -> Result<Self> {
        match text {
            "math" => Ok(Self::Math),
            "numpy" => Ok(Self::Numpy),
            other => Err(UdfError::config(format!(
                "unknown suite '{other}' (expected 'math' or 'numpy')"
            ))),
        }
    }
}

impl fmt::Display for Suite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One catalog row.
#[derive(Debug, Clone)]
pub struct CatalogEntry {
    name: String,
    signature: Signature,
    reference: Reference,
    adapter: AdapterKind,
}

impl CatalogEntry {
    /// Build an entry, parsing `signature`. Malformed signatures are
    /// configuration errors.
    pub fn new(name: impl Into<String>, signature: &str, reference: Reference) -> Result<Self> {
        let signature = Signature::parse(signature)?;
        Ok(Self {
            name: name.into(),
            signature,
            adapter: reference.adapter_kind(),
            reference,
        })
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub const fn signature(&self) -> &Signature {
        &self.signature
    }

    #[must_use]
    pub const fn reference(&self) -> &Reference {
        &self.reference
    }

    #[must_use]
    pub const fn adapter(&self) -> AdapterKind {
        self.adapter
    }

    /// Evaluate the reference in-process on already-decoded arguments.
    pub fn evaluate(&self, args: &[Value]) -> Result<Value> {
        match self.reference {
            Reference::Scalar { arity, call } => {
                if args.len() != arity {
                    return Err(UdfError::function_error(format!(
                        "{}() takes {arity} positional arguments but {} were given",
                        self.name,
                        args.len()
                    )));
                }
                call(args)
            }
            Reference::Ufunc(u) => u.call_scalar(args),
            Reference::Constant(value) => Ok(Value::Double(value)),
        }
    }
}

/// An ordered set of entries for one suite.
#[derive(Debug, Clone)]
pub struct Catalog {
    suite: Suite,
    entries: Vec<CatalogEntry>,
}

impl Catalog {
    pub fn new(suite: Suite, entries: Vec<CatalogEntry>) -> Self {
        Self { suite, entries }
    }

    /// Catalog for `suite`.
    pub fn for_suite(suite: Suite) -> Result<Self> {
        match suite {
            Suite::Math => Self::math(),
            Suite::Numpy => Self::numpy(),
        }
    }

    pub fn math() -> Result<Self> {
        Self::from_table(Suite::Math, MATH_TABLE)
    }

    pub fn numpy() -> Result<Self> {
        Self::from_table(Suite::Numpy, NUMPY_TABLE)
    }

    fn from_table(suite: Suite, table: &[(&'static str, &'static str, Reference)]) -> Result<Self> {
        let entries = table
            .iter()
            .map(|&(name, signature, reference)| CatalogEntry::new(name, signature, reference))
            .collect::<Result<Vec<_>>>()?;
        debug!(suite = suite.as_str(), entries = entries.len(), "catalog built");
        Ok(Self { suite, entries })
    }

    #[must_use]
    pub const fn suite(&self) -> Suite {
        self.suite
    }

    #[must_use]
    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&CatalogEntry> {
        self.entries.iter().find(|entry| entry.name == name)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|entry| entry.name.as_str())
    }
}

const fn s(arity: usize, call: ScalarFn) -> Reference {
    Reference::scalar(arity, call)
}

const fn u(ufunc: &'static Ufunc) -> Reference {
    Reference::Ufunc(ufunc)
}

static MATH_TABLE: &[(&str, &str, Reference)] = &[
    // Number-theoretic and representation functions
    ("ceil", "int64(double)", s(1, math::ceil)),
    ("comb", "int64(int64, int64)", s(2, math::comb)),
    ("copysign", "double(double, double)", s(2, math::copysign)),
    ("fabs", "double(double)", s(1, math::fabs)),
    ("factorial", "int64(int64)", s(1, math::factorial)),
    ("floor", "int64(int64)", s(1, math::floor)),
    ("fmod", "double(double, double)", s(2, math::fmod)),
    ("frexp", "double(double)", s(1, math::frexp)),
    ("gcd", "int(int, int)", s(2, math::gcd)),
    ("isclose", "bool(double, double)", s(2, math::isclose)),
    ("isfinite", "bool(double)", s(1, math::isfinite)),
    ("isinf", "bool(double)", s(1, math::isinf)),
    ("isnan", "bool(double)", s(1, math::isnan)),
    ("isqrt", "int64(int64)", s(1, math::isqrt)),
    ("ldexp", "double(double, int)", s(2, math::ldexp)),
    ("modf", "double(double)", s(1, math::modf)),
    ("prod", "int64(int64[])", s(1, math::prod)),
    ("remainder", "double(double, double)", s(2, math::remainder)),
    ("trunc", "double(double)", s(1, math::trunc)),
    // Power and logarithmic functions
    ("exp", "double(double)", s(1, math::exp)),
    ("expm1", "double(double)", s(1, math::expm1)),
    ("log", "double(double)", s(1, math::log)),
    ("log1p", "double(double)", s(1, math::log1p)),
    ("log2", "double(double)", s(1, math::log2)),
    ("log10", "double(double)", s(1, math::log10)),
    ("pow", "double(double, double)", s(2, math::pow)),
    ("sqrt", "double(double)", s(1, math::sqrt)),
    // Trigonometric functions
    ("acos", "double(double)", s(1, math::acos)),
    ("asin", "double(double)", s(1, math::asin)),
    ("atan", "double(double)", s(1, math::atan)),
    ("atan2", "double(double, double)", s(2, math::atan2)),
    ("cos", "double(double)", s(1, math::cos)),
    ("hypot", "double(double, double)", s(2, math::hypot)),
    ("sin", "double(double)", s(1, math::sin)),
    ("tan", "double(double)", s(1, math::tan)),
    ("degrees", "double(double)", s(1, math::degrees)),
    ("radians", "double(double)", s(1, math::radians)),
    // Hyperbolic functions
    ("acosh", "double(double)", s(1, math::acosh)),
    ("asinh", "double(double)", s(1, math::asinh)),
    ("atanh", "double(double)", s(1, math::atanh)),
    ("cosh", "double(double)", s(1, math::cosh)),
    ("sinh", "double(double)", s(1, math::sinh)),
    ("tanh", "double(double)", s(1, math::tanh)),
    // Special functions
    ("erf", "double(double)", s(1, math::erf)),
    ("erfc", "double(double)", s(1, math::erfc)),
    ("gamma", "double(double)", s(1, math::gamma)),
    ("lgamma", "double(double)", s(1, math::lgamma)),
    // Constants
    ("pi", "double(double)", Reference::Constant(PI)),
    ("e", "double(double)", Reference::Constant(E)),
    ("tau", "double(double)", Reference::Constant(TAU)),
    ("inf", "double(double)", Reference::Constant(f64::INFINITY)),
    ("nan", "double(double)", Reference::Constant(f64::NAN)),
];

static NUMPY_TABLE: &[(&str, &str, Reference)] = &[
    // Arithmetic
    ("absolute", "double(double)", u(&ufunc::ABSOLUTE)),
    ("conjugate", "double(double)", u(&ufunc::CONJUGATE)),
    ("conj", "double(double)", u(&ufunc::CONJUGATE)),
    ("fabs", "double(double)", u(&ufunc::FABS)),
    ("fmax", "double(double, double)", u(&ufunc::FMAX)),
    ("fmin", "double(double, double)", u(&ufunc::FMIN)),
    ("maximum", "double(double, double)", u(&ufunc::MAXIMUM)),
    ("minimum", "double(double, double)", u(&ufunc::MINIMUM)),
    ("positive", "double(double)", u(&ufunc::POSITIVE)),
    ("negative", "double(double)", u(&ufunc::NEGATIVE)),
    ("sign", "double(double)", u(&ufunc::SIGN)),
    ("reciprocal", "double(double)", u(&ufunc::RECIPROCAL)),
    ("add", "double(double, double)", u(&ufunc::ADD)),
    ("subtract", "double(double, double)", u(&ufunc::SUBTRACT)),
    ("multiply", "double(double, double)", u(&ufunc::MULTIPLY)),
    ("divide", "double(double, double)", u(&ufunc::DIVIDE)),
    ("true_divide", "double(double, double)", u(&ufunc::TRUE_DIVIDE)),
    ("floor_divide", "double(double, double)", u(&ufunc::FLOOR_DIVIDE)),
    ("power", "double(double, double)", u(&ufunc::POWER)),
    ("float_power", "double(double, double)", u(&ufunc::FLOAT_POWER)),
    ("square", "double(double)", u(&ufunc::SQUARE)),
    ("sqrt", "double(double)", u(&ufunc::SQRT)),
    ("cbrt", "double(double)", u(&ufunc::CBRT)),
    ("remainder", "double(double, double)", u(&ufunc::REMAINDER)),
    ("fmod", "double(double, double)", u(&ufunc::FMOD)),
    ("modf", "double(double, double)", u(&ufunc::REMAINDER)),
    ("modi", "int(int, int)", u(&ufunc::REMAINDER)),
    ("divmod0", "int(int, int)", s(2, numpy::divmod0)),
    // Trigonometric
    ("sin", "double(double)", u(&ufunc::SIN)),
    ("cos", "double(double)", u(&ufunc::COS)),
    ("tan", "double(double)", u(&ufunc::TAN)),
    ("arcsin", "double(double)", u(&ufunc::ARCSIN)),
    ("arccos", "double(double)", u(&ufunc::ARCCOS)),
    ("arctan", "double(double)", u(&ufunc::ARCTAN)),
    ("arctan2", "double(double, double)", u(&ufunc::ARCTAN2)),
    ("hypot", "double(double, double)", u(&ufunc::HYPOT)),
    ("radians", "double(double)", u(&ufunc::RADIANS)),
    ("rad2deg", "double(double)", u(&ufunc::RAD2DEG)),
    ("deg2rad", "double(double)", u(&ufunc::DEG2RAD)),
    ("degrees", "double(double)", u(&ufunc::DEGREES)),
    // Hyperbolic
    ("sinh", "double(double)", u(&ufunc::SINH)),
    ("cosh", "double(double)", u(&ufunc::COSH)),
    ("tanh", "double(double)", u(&ufunc::TANH)),
    ("arcsinh", "double(double)", u(&ufunc::ARCSINH)),
    ("arccosh", "double(double)", u(&ufunc::ARCCOSH)),
    ("arctanh", "double(double)", u(&ufunc::ARCTANH)),
    // Exp-log
    ("exp", "double(double)", u(&ufunc::EXP)),
    ("expm1", "double(double)", u(&ufunc::EXPM1)),
    ("exp2", "double(double)", u(&ufunc::EXP2)),
    ("log", "double(double)", u(&ufunc::LOG)),
    ("log10", "double(double)", u(&ufunc::LOG10)),
    ("log2", "double(double)", u(&ufunc::LOG2)),
    ("log1p", "double(double)", u(&ufunc::LOG1P)),
    ("logaddexp", "double(double, double)", u(&ufunc::LOGADDEXP)),
    ("logaddexp2", "double(double, double)", u(&ufunc::LOGADDEXP2)),
    ("ldexp", "double(double, int)", u(&ufunc::LDEXP)),
    ("frexp0", "double(double)", s(1, numpy::frexp0)),
    // Rounding
    ("around", "double(double)", s(1, numpy::around)),
    ("round2", "double(double)", s(1, numpy::round2)),
    ("floor", "double(double)", u(&ufunc::FLOOR)),
    ("ceil", "double(double)", u(&ufunc::CEIL)),
    ("trunc", "double(double)", u(&ufunc::TRUNC)),
    ("rint", "double(double)", u(&ufunc::RINT)),
    ("spacing", "double(double)", u(&ufunc::SPACING)),
    ("nextafter", "double(double, double)", u(&ufunc::NEXTAFTER)),
    // Rational
    ("gcd", "int(int, int)", u(&ufunc::GCD)),
    ("lcm", "int(int, int)", u(&ufunc::LCM)),
    ("right_shift", "int(int, int)", u(&ufunc::RIGHT_SHIFT)),
    ("left_shift", "int64(int64, int64)", u(&ufunc::LEFT_SHIFT)),
    // Misc
    ("heaviside", "double(double, double)", u(&ufunc::HEAVISIDE)),
    ("copysign", "double(double, double)", u(&ufunc::COPYSIGN)),
    // Bit
    ("invert", "int(int)", u(&ufunc::INVERT)),
    ("bitwise_or", "int(int, int)", u(&ufunc::BITWISE_OR)),
    ("bitwise_xor", "int(int, int)", u(&ufunc::BITWISE_XOR)),
    ("bitwise_and", "int(int, int)", u(&ufunc::BITWISE_AND)),
    // Logical
    ("isfinite", "bool(double)", u(&ufunc::ISFINITE)),
    ("isinf", "bool(double)", u(&ufunc::ISINF)),
    ("isnan", "bool(double)", u(&ufunc::ISNAN)),
    ("signbit", "bool(double)", u(&ufunc::SIGNBIT)),
    ("less", "bool(double, double)", u(&ufunc::LESS)),
    ("less_equal", "bool(double, double)", u(&ufunc::LESS_EQUAL)),
    ("greater", "bool(double, double)", u(&ufunc::GREATER)),
    ("greater_equal", "bool(double, double)", u(&ufunc::GREATER_EQUAL)),
    ("equal", "bool(double, double)", u(&ufunc::EQUAL)),
    ("not_equal", "bool(double, double)", u(&ufunc::NOT_EQUAL)),
    ("logical_or", "bool(bool, bool)", u(&ufunc::LOGICAL_OR)),
    ("logical_xor", "bool(bool, bool)", u(&ufunc::LOGICAL_XOR)),
    ("logical_and", "bool(bool, bool)", u(&ufunc::LOGICAL_AND)),
    ("logical_not", "bool(bool)", u(&ufunc::LOGICAL_NOT)),
];
