//! Primitive-type kinds of the signature mini-language.

use std::fmt;

use serde::{Deserialize, Serialize};
use udfparity_error::{Result, UdfError};

use crate::Value;

/// A coarse primitive-type classifier.
///
/// Token matching is prefix based: any `int*` token is an integer kind
/// (`int64` is the only 64-bit spelling), any `bool*` token is boolean. A
/// trailing `[]` marks an array of the element kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Kind {
    Double,
    Int32,
    Int64,
    Bool,
    /// Zero-argument mathematical constant marker.
    Constant,
    Int32Array,
    Int64Array,
    DoubleArray,
}

/// Fixture column group selected by a primary argument kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KindGroup {
    Double,
    Integer,
    Boolean,
    Constant,
    IntegerArray,
    DoubleArray,
}

impl Kind {
    /// Parse a single kind token.
    pub fn parse(token: &str) -> Result<Self> {
        let token = token.trim();
        if let Some(element) = token.strip_suffix("[]") {
            return match Self::parse(element)? {
                Self::Double => Ok(Self::DoubleArray),
                Self::Int32 => Ok(Self::Int32Array),
                Self::Int64 => Ok(Self::Int64Array),
                _ => Err(UdfError::UnknownKind {
                    token: token.to_owned(),
                }),
            };
        }
        if token == "double" {
            Ok(Self::Double)
        } else if token == "constant" {
            Ok(Self::Constant)
        } else if token == "int64" {
            Ok(Self::Int64)
        } else if token.starts_with("int") {
            Ok(Self::Int32)
        } else if token.starts_with("bool") {
            Ok(Self::Bool)
        } else {
            Err(UdfError::UnknownKind {
                token: token.to_owned(),
            })
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Double => "double",
            Self::Int32 => "int32",
            Self::Int64 => "int64",
            Self::Bool => "bool",
            Self::Constant => "constant",
            Self::Int32Array => "int32[]",
            Self::Int64Array => "int64[]",
            Self::DoubleArray => "double[]",
        }
    }

    #[must_use]
    pub const fn group(self) -> KindGroup {
        match self {
            Self::Double => KindGroup::Double,
            Self::Int32 | Self::Int64 => KindGroup::Integer,
            Self::Bool => KindGroup::Boolean,
            Self::Constant => KindGroup::Constant,
            Self::Int32Array | Self::Int64Array => KindGroup::IntegerArray,
            Self::DoubleArray => KindGroup::DoubleArray,
        }
    }

    #[must_use]
    pub const fn is_array(self) -> bool {
        matches!(self, Self::Int32Array | Self::Int64Array | Self::DoubleArray)
    }

    #[must_use]
    pub const fn is_integer(self) -> bool {
        matches!(self, Self::Int32 | Self::Int64)
    }

    /// Convert a raw value into this kind.
    ///
    /// This is the single conversion used on both sides of a comparison: UDF
    /// shims decode their arguments with it and the comparator decodes
    /// fetched argument columns with it, so both see identical inputs.
    /// `Null` decodes to NaN for `double`; integer kinds truncate doubles
    /// toward zero and `int32` wraps to 32 bits.
    pub fn coerce(self, value: &Value) -> Result<Value> {
        match self {
            Self::Double => match value {
                Value::Null => Ok(Value::Double(f64::NAN)),
                other => other
                    .as_f64()
                    .map(Value::Double)
                    .ok_or_else(|| mismatch(self, other)),
            },
            Self::Int32 | Self::Int64 => {
                let wide = match value {
                    Value::Int(i) => *i,
                    Value::Bool(b) => i64::from(*b),
                    Value::Double(f) => *f as i64,
                    Value::Text(s) => s.trim().parse::<i64>().map_err(|_| mismatch(self, value))?,
                    other => return Err(mismatch(self, other)),
                };
                if self == Self::Int32 {
                    Ok(Value::Int(i64::from(wide as i32)))
                } else {
                    Ok(Value::Int(wide))
                }
            }
            Self::Bool => match value {
                Value::Bool(b) => Ok(Value::Bool(*b)),
                Value::Int(i) => Ok(Value::Bool(*i != 0)),
                Value::Double(f) => Ok(Value::Bool(*f != 0.0)),
                Value::Text(s) => match s.trim().to_ascii_lowercase().as_str() {
                    "true" | "t" | "1" => Ok(Value::Bool(true)),
                    "false" | "f" | "0" => Ok(Value::Bool(false)),
                    _ => Err(mismatch(self, value)),
                },
                other => Err(mismatch(self, other)),
            },
            Self::Constant => Ok(value.clone()),
            Self::Int32Array | Self::Int64Array => match value {
                Value::IntArray(items) => Ok(Value::IntArray(items.clone())),
                Value::Text(s) => serde_json::from_str::<Vec<i64>>(s)
                    .map(Value::IntArray)
                    .map_err(|_| mismatch(self, value)),
                other => Err(mismatch(self, other)),
            },
            Self::DoubleArray => match value {
                Value::DoubleArray(items) => Ok(Value::DoubleArray(items.clone())),
                Value::IntArray(items) => Ok(Value::DoubleArray(
                    items.iter().map(|&i| i as f64).collect(),
                )),
                Value::Text(s) => serde_json::from_str::<Vec<f64>>(s)
                    .map(Value::DoubleArray)
                    .map_err(|_| mismatch(self, value)),
                other => Err(mismatch(self, other)),
            },
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn mismatch(kind: Kind, value: &Value) -> UdfError {
    UdfError::TypeMismatch {
        expected: kind.as_str().to_owned(),
        actual: value.type_name().to_owned(),
    }
}
