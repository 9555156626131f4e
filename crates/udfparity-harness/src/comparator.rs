//! Query construction and result comparison.
//!
//! A case query selects the argument columns followed by the UDF applied to
//! them. Every returned row is checked against the catalog reference
//! evaluated in-process on the same (decoded) arguments.

use tracing::{debug, trace};
use udfparity_error::{Result, UdfError};
use udfparity_func::CatalogEntry;
use udfparity_runtime::{QueryResult, SqlDialect};
use udfparity_types::{KindGroup, Signature, Value};

/// Absolute tolerance of [`isclose`].
pub const ABS_TOL: f64 = 1e-8;
/// Relative tolerance of [`isclose`], scaled by the actual value.
pub const REL_TOL: f64 = 1e-5;

/// Fixture columns feeding function `name` declared with `signature`.
pub fn argument_columns(name: &str, signature: &Signature) -> Result<Vec<&'static str>> {
    let arity = signature.arity();
    let (pool, max): (&[&'static str], usize) = match signature.primary_kind().group() {
        KindGroup::Double => (&["x", "y", "z"], 3),
        KindGroup::Integer => (&["i", "j"], 2),
        KindGroup::Boolean => (&["a", "b"], 2),
        KindGroup::Constant => (&[], 0),
        KindGroup::IntegerArray => (&["t"], 1),
        KindGroup::DoubleArray => (&["td"], 1),
    };
    if arity > max {
        return Err(UdfError::UnsupportedArity {
            name: name.to_owned(),
            signature: signature.as_str().to_owned(),
            arity,
        });
    }
    Ok(pool[..arity].to_vec())
}

/// `SELECT <cols>, <fn>(<cols>) FROM <table>`.
#[must_use]
pub fn build_query(dialect: SqlDialect, name: &str, columns: &[&str], table: &str) -> String {
    let args = columns.join(", ");
    let call = format!("{}({args})", dialect.function_name(name));
    if columns.is_empty() {
        format!("SELECT {call} FROM {table}")
    } else {
        format!("SELECT {args}, {call} FROM {table}")
    }
}

/// `|expected - actual| <= ABS_TOL + REL_TOL * |actual|`, NaN-aware.
///
/// A NaN expectation is met only by NaN; equal infinities are close.
#[must_use]
pub fn isclose(expected: f64, actual: f64) -> bool {
    if expected.is_nan() {
        return actual.is_nan();
    }
    if expected == actual {
        return true;
    }
    if expected.is_infinite() || actual.is_infinite() {
        return false;
    }
    (expected - actual).abs() <= actual.abs().mul_add(REL_TOL, ABS_TOL)
}

fn numeric(value: &Value, side: &str) -> Result<f64> {
    match value {
        Value::Null => Ok(f64::NAN),
        other => other.as_f64().ok_or_else(|| UdfError::TypeMismatch {
            expected: format!("numeric {side} value"),
            actual: other.type_name().to_owned(),
        }),
    }
}

fn render_args(args: &[Value]) -> String {
    args.iter().map(Value::to_string).collect::<Vec<_>>().join(", ")
}

/// Check every row of `result` against `entry`'s reference.
///
/// `name` is the SQL-visible function name (it differs from the catalog name
/// after a rename). Returns the number of rows compared; the first
/// disagreement is a [`UdfError::Mismatch`].
pub fn compare(entry: &CatalogEntry, name: &str, result: &QueryResult, query: &str) -> Result<usize> {
    let signature = entry.signature();
    let width = signature.arity();
    if result.is_empty() {
        return Err(UdfError::EmptyResult {
            name: name.to_owned(),
            query: query.to_owned(),
        });
    }

    for (idx, row) in result.rows.iter().enumerate() {
        let Some((raw_actual, raw_args)) = row.split_last() else {
            return Err(UdfError::internal(format!("row {} has no columns", idx + 1)));
        };
        if raw_args.len() != width {
            return Err(UdfError::internal(format!(
                "row {} has {} argument columns, expected {width}",
                idx + 1,
                raw_args.len()
            )));
        }
        let args = signature
            .arg_kinds()
            .iter()
            .zip(raw_args)
            .map(|(kind, raw)| kind.coerce(raw))
            .collect::<Result<Vec<_>>>()?;
        let actual = signature.return_kind().coerce(raw_actual)?;
        let expected = entry.evaluate(&args)?;

        let (want, got) = (numeric(&expected, "expected")?, numeric(&actual, "actual")?);
        trace!(name, row = idx + 1, expected = want, actual = got, "compare");
        if !isclose(want, got) {
            return Err(UdfError::Mismatch {
                name: name.to_owned(),
                row: idx + 1,
                args: render_args(&args),
                expected: expected.to_string(),
                actual: actual.to_string(),
            });
        }
    }
    debug!(name, rows = result.rows.len(), "rows match reference");
    Ok(result.rows.len())
}
