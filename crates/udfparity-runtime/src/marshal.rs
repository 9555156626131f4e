//! Value conversion across the SQL boundary and signature lowering.

use rusqlite::types::{Value as SqlValue, ValueRef};
use udfparity_error::{Result, UdfError};
use udfparity_types::{Kind, Signature, Value};

/// SQLite storage class a kind lowers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageClass {
    Integer,
    Real,
}

/// A signature expressed in backend storage classes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoweredSignature {
    pub args: Vec<StorageClass>,
    pub ret: StorageClass,
}

impl LoweredSignature {
    #[must_use]
    pub fn arity(&self) -> usize {
        self.args.len()
    }
}

fn lower_kind(name: &str, kind: Kind) -> Result<StorageClass> {
    match kind {
        Kind::Double => Ok(StorageClass::Real),
        Kind::Int32 | Kind::Int64 | Kind::Bool => Ok(StorageClass::Integer),
        Kind::Constant => Err(UdfError::compile(name, "'constant' cannot be lowered")),
        Kind::Int32Array | Kind::Int64Array | Kind::DoubleArray => Err(UdfError::compile(
            name,
            format!("array kind '{kind}' is not supported by the embedded backend"),
        )),
    }
}

/// Lower `signature` for function `name`; array kinds are rejected.
pub fn lower(name: &str, signature: &Signature) -> Result<LoweredSignature> {
    let args = signature
        .arg_kinds()
        .iter()
        .map(|kind| lower_kind(name, *kind))
        .collect::<Result<Vec<_>>>()?;
    let ret = lower_kind(name, signature.return_kind())?;
    Ok(LoweredSignature { args, ret })
}

/// Raw SQL value → untyped [`Value`].
pub fn from_sql(raw: ValueRef<'_>) -> Result<Value> {
    match raw {
        ValueRef::Null => Ok(Value::Null),
        ValueRef::Integer(i) => Ok(Value::Int(i)),
        ValueRef::Real(f) => Ok(Value::Double(f)),
        ValueRef::Text(bytes) => std::str::from_utf8(bytes)
            .map(|s| Value::Text(s.to_owned()))
            .map_err(|_| UdfError::TypeMismatch {
                expected: "utf-8 text".to_owned(),
                actual: "invalid utf-8".to_owned(),
            }),
        ValueRef::Blob(_) => Err(UdfError::TypeMismatch {
            expected: "scalar".to_owned(),
            actual: "blob".to_owned(),
        }),
    }
}

/// UDF result → SQL value for return kind `ret`.
///
/// NaN travels as `NULL` and is restored by [`Kind::coerce`] on the way
/// back. `int32` results wrap to 32 bits; booleans become `0`/`1`.
pub fn to_sql(ret: Kind, value: &Value) -> Result<SqlValue> {
    let mismatch = || UdfError::TypeMismatch {
        expected: ret.as_str().to_owned(),
        actual: value.type_name().to_owned(),
    };
    match ret {
        Kind::Double => match value {
            Value::Null => Ok(SqlValue::Null),
            other => {
                let v = other.as_f64().ok_or_else(mismatch)?;
                Ok(if v.is_nan() {
                    SqlValue::Null
                } else {
                    SqlValue::Real(v)
                })
            }
        },
        Kind::Int32 => value
            .as_i64()
            .map(|v| SqlValue::Integer(i64::from(v as i32)))
            .ok_or_else(mismatch),
        Kind::Int64 => value.as_i64().map(SqlValue::Integer).ok_or_else(mismatch),
        Kind::Bool => {
            let truth = match value {
                Value::Double(d) => *d != 0.0,
                other => other.as_bool().ok_or_else(mismatch)?,
            };
            Ok(SqlValue::Integer(i64::from(truth)))
        }
        Kind::Constant | Kind::Int32Array | Kind::Int64Array | Kind::DoubleArray => {
            Err(mismatch())
        }
    }
}
