//! SQL dialect differences between the analytical server and the embedded
//! backend.
//!
//! | concern | `analytical` | `embedded` |
//! |---------|--------------|------------|
//! | boolean literal | `'true'` | `TRUE` |
//! | integer array column | `INT[]` | `TEXT` (JSON) |
//! | array literal | `ARRAY[1, 2]` | `'[1,2]'` |
//! | function call | `add(x, y)` | `"add"(x, y)` |

use std::fmt;

use serde::{Deserialize, Serialize};
use udfparity_error::{Result, UdfError};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SqlDialect {
    /// Remote analytical server with native array columns.
    Analytical,
    /// In-process SQL backend; arrays travel as JSON text.
    #[default]
    Embedded,
}

impl SqlDialect {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Analytical => "analytical",
            Self::Embedded => "embedded",
        }
    }

    pub fn parse(text: &str) -> Result<Self> {
        match text.trim().to_ascii_lowercase().as_str() {
            "analytical" => Ok(Self::Analytical),
            "embedded" => Ok(Self::Embedded),
            other => Err(UdfError::config(format!("unknown SQL dialect '{other}'"))),
        }
    }

    #[must_use]
    pub fn bool_literal(self, value: bool) -> String {
        match (self, value) {
            (Self::Analytical, true) => "'true'".to_owned(),
            (Self::Analytical, false) => "'false'".to_owned(),
            (Self::Embedded, true) => "TRUE".to_owned(),
            (Self::Embedded, false) => "FALSE".to_owned(),
        }
    }

    /// Round-trippable float literal; integral values keep a `.0`.
    #[must_use]
    pub fn double_literal(self, value: f64) -> String {
        format!("{value:?}")
    }

    /// Function name as written in a call expression. The embedded backend
    /// quotes it so names that collide with keywords (`add`) still parse.
    #[must_use]
    pub fn function_name(self, name: &str) -> String {
        match self {
            Self::Analytical => name.to_owned(),
            Self::Embedded => format!("\"{}\"", name.replace('"', "\"\"")),
        }
    }

    #[must_use]
    pub const fn int_array_type(self) -> &'static str {
        match self {
            Self::Analytical => "INT[]",
            Self::Embedded => "TEXT",
        }
    }

    #[must_use]
    pub const fn double_array_type(self) -> &'static str {
        match self {
            Self::Analytical => "DOUBLE[]",
            Self::Embedded => "TEXT",
        }
    }

    pub fn int_array_literal(self, items: &[i64]) -> Result<String> {
        match self {
            Self::Analytical => Ok(format!(
                "ARRAY[{}]",
                items.iter().map(i64::to_string).collect::<Vec<_>>().join(", ")
            )),
            Self::Embedded => json_literal(items),
        }
    }

    pub fn double_array_literal(self, items: &[f64]) -> Result<String> {
        match self {
            Self::Analytical => Ok(format!(
                "ARRAY[{}]",
                items
                    .iter()
                    .map(|v| self.double_literal(*v))
                    .collect::<Vec<_>>()
                    .join(", ")
            )),
            Self::Embedded => json_literal(items),
        }
    }
}

impl fmt::Display for SqlDialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn json_literal<T: Serialize>(items: &[T]) -> Result<String> {
    let encoded = serde_json::to_string(items)
        .map_err(|err| UdfError::internal(format!("array literal encoding failed: {err}")))?;
    Ok(format!("'{encoded}'"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn analytical_literals() {
        let d = SqlDialect::Analytical;
        assert_eq!(d.bool_literal(true), "'true'");
        assert_eq!(d.int_array_literal(&[9, 10, 11]).unwrap(), "ARRAY[9, 10, 11]");
        assert_eq!(d.int_array_literal(&[]).unwrap(), "ARRAY[]");
        assert_eq!(d.double_array_literal(&[9.0, 10.5]).unwrap(), "ARRAY[9.0, 10.5]");
        assert_eq!(d.int_array_type(), "INT[]");
        assert_eq!(d.double_array_type(), "DOUBLE[]");
    }

    #[test]
    fn embedded_literals() {
        let d = SqlDialect::Embedded;
        assert_eq!(d.bool_literal(false), "FALSE");
        assert_eq!(d.int_array_literal(&[9, 10, 11]).unwrap(), "'[9,10,11]'");
        assert_eq!(d.int_array_literal(&[]).unwrap(), "'[]'");
        assert_eq!(d.double_array_literal(&[9.0]).unwrap(), "'[9.0]'");
        assert_eq!(d.int_array_type(), "TEXT");
        assert_eq!(d.function_name("add"), "\"add\"");
        assert_eq!(SqlDialect::Analytical.function_name("add"), "add");
    }

    #[test]
    fn double_literal_round_trips() {
        let d = SqlDialect::Embedded;
        assert_eq!(d.double_literal(1.0), "1.0");
        let x = 0.7 + 1.0 / 10.0;
        assert_eq!(d.double_literal(x).parse::<f64>().unwrap(), x);
    }

    #[test]
    fn parse_names() {
        assert_eq!(SqlDialect::parse("Analytical").unwrap(), SqlDialect::Analytical);
        assert_eq!(SqlDialect::parse("embedded").unwrap(), SqlDialect::Embedded);
        assert!(SqlDialect::parse("tsql").unwrap_err().is_configuration());
        assert_eq!(SqlDialect::default(), SqlDialect::Embedded);
    }
}
