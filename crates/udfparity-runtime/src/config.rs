//! Runtime configuration: TOML file plus `UDFPARITY_*` environment overrides.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use udfparity_error::{Result, UdfError};

use crate::dialect::SqlDialect;

/// Environment variable prefix for overrides.
pub const ENV_PREFIX: &str = "UDFPARITY_";

/// Default fixture table name.
pub const DEFAULT_TABLE_NAME: &str = "udfparity_test_math";

/// Emulated server version, compared as `(major, minor)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ServerVersion {
    pub major: u32,
    pub minor: u32,
}

impl ServerVersion {
    #[must_use]
    pub const fn new(major: u32, minor: u32) -> Self {
        Self { major, minor }
    }

    /// Parse `"major.minor"`; extra components (`"5.5.1"`) are ignored.
    pub fn parse(text: &str) -> Result<Self> {
        let bad = || UdfError::config(format!("invalid server version '{text}' (expected 'major.minor')"));
        let mut parts = text.trim().split('.');
        let major = parts
            .next()
            .and_then(|p| p.parse::<u32>().ok())
            .ok_or_else(bad)?;
        let minor = parts
            .next()
            .and_then(|p| p.parse::<u32>().ok())
            .ok_or_else(bad)?;
        Ok(Self { major, minor })
    }
}

impl Default for ServerVersion {
    fn default() -> Self {
        Self::new(5, 5)
    }
}

impl fmt::Display for ServerVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

impl FromStr for ServerVersion {
    type Err = UdfError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for ServerVersion {
    type Error = UdfError;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<ServerVersion> for String {
    fn from(value: ServerVersion) -> Self {
        value.to_string()
    }
}

/// Session configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RuntimeConfig {
    /// Database path, or `:memory:`.
    pub database: String,
    pub dialect: SqlDialect,
    /// Capability profile used by skip rules.
    pub version: ServerVersion,
    pub has_cuda: bool,
    pub table_name: String,
    /// Trace every UDF invocation.
    pub debug: bool,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            database: ":memory:".to_owned(),
            dialect: SqlDialect::default(),
            version: ServerVersion::default(),
            has_cuda: false,
            table_name: DEFAULT_TABLE_NAME.to_owned(),
            debug: false,
        }
    }
}

impl RuntimeConfig {
    pub fn from_toml_str(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|err| UdfError::config(err.to_string()))
    }

    /// Load a TOML file. Missing fields take their defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|err| UdfError::ConfigFile {
            path: path.to_path_buf(),
            detail: err.to_string(),
        })?;
        let config: Self = toml::from_str(&text).map_err(|err| UdfError::ConfigFile {
            path: path.to_path_buf(),
            detail: err.to_string(),
        })?;
        debug!(path = %path.display(), "loaded runtime config");
        Ok(config)
    }

    /// File (or defaults) followed by process environment overrides.
    pub fn resolve(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::load(path)?,
            None => Self::default(),
        };
        config.apply_overrides(std::env::vars())?;
        info!(
            database = %config.database,
            dialect = config.dialect.as_str(),
            version = %config.version,
            has_cuda = config.has_cuda,
            table = %config.table_name,
            "runtime config resolved"
        );
        Ok(config)
    }

    /// Apply `UDFPARITY_*` overrides from `vars`; unrelated keys are ignored.
    pub fn apply_overrides<I, K, V>(&mut self, vars: I) -> Result<()>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        for (key, value) in vars {
            let Some(field) = key.as_ref().strip_prefix(ENV_PREFIX) else {
                continue;
            };
            let value = value.as_ref();
            match field {
                "DATABASE" => self.database = value.to_owned(),
                "DIALECT" => self.dialect = SqlDialect::parse(value)?,
                "VERSION" => self.version = ServerVersion::parse(value)?,
                "HAS_CUDA" => self.has_cuda = parse_flag(field, value)?,
                "TABLE" => self.table_name = value.to_owned(),
                "DEBUG" => self.debug = parse_flag(field, value)?,
                _ => continue,
            }
            debug!(key = key.as_ref(), "applied environment override");
        }
        self.validate()
    }

    pub fn validate(&self) -> Result<()> {
        if self.database.trim().is_empty() {
            return Err(UdfError::config("database must be non-empty"));
        }
        let name_ok = !self.table_name.is_empty()
            && self
                .table_name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_')
            && !self.table_name.starts_with(|c: char| c.is_ascii_digit());
        if !name_ok {
            return Err(UdfError::config(format!(
                "table name '{}' must be a plain identifier",
                self.table_name
            )));
        }
        Ok(())
    }
}

fn parse_flag(field: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        other => Err(UdfError::config(format!(
            "{ENV_PREFIX}{field}: expected a boolean, got '{other}'"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn version_ordering() {
        let v = ServerVersion::parse("5.1").unwrap();
        assert!(v < ServerVersion::new(5, 2));
        assert!(ServerVersion::new(5, 4) <= ServerVersion::new(5, 4));
        assert!(ServerVersion::new(4, 9) < ServerVersion::new(5, 0));
        assert_eq!(ServerVersion::parse("5.5.1").unwrap(), ServerVersion::new(5, 5));
        assert!(ServerVersion::parse("5").is_err());
        assert!(ServerVersion::parse("five.two").is_err());
    }

    #[test]
    fn defaults() {
        let config = RuntimeConfig::default();
        assert_eq!(config.database, ":memory:");
        assert_eq!(config.version, ServerVersion::new(5, 5));
        assert!(!config.has_cuda);
        assert_eq!(config.table_name, DEFAULT_TABLE_NAME);
        config.validate().unwrap();
    }

    #[test]
    fn toml_partial_file() {
        let config = RuntimeConfig::from_toml_str(
            r#"
            version = "5.1"
            has_cuda = true
            "#,
        )
        .unwrap();
        assert_eq!(config.version, ServerVersion::new(5, 1));
        assert!(config.has_cuda);
        assert_eq!(config.database, ":memory:");
    }

    #[test]
    fn toml_rejects_unknown_fields() {
        let err = RuntimeConfig::from_toml_str("port = 6274").unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "table_name = \"math_fixture\"\ndialect = \"embedded\"").unwrap();
        let config = RuntimeConfig::load(file.path()).unwrap();
        assert_eq!(config.table_name, "math_fixture");

        let missing = RuntimeConfig::load(Path::new("/nonexistent/udfparity.toml")).unwrap_err();
        assert!(matches!(missing, UdfError::ConfigFile { .. }));
    }

    #[test]
    fn env_overrides() {
        let mut config = RuntimeConfig::default();
        config
            .apply_overrides([
                ("UDFPARITY_VERSION", "5.1"),
                ("UDFPARITY_HAS_CUDA", "yes"),
                ("UDFPARITY_TABLE", "alt_table"),
                ("PATH", "/usr/bin"),
            ])
            .unwrap();
        assert_eq!(config.version, ServerVersion::new(5, 1));
        assert!(config.has_cuda);
        assert_eq!(config.table_name, "alt_table");
    }

    #[test]
    fn env_override_errors() {
        let mut config = RuntimeConfig::default();
        let err = config
            .apply_overrides([("UDFPARITY_HAS_CUDA", "maybe")])
            .unwrap_err();
        assert!(err.is_configuration());

        let mut config = RuntimeConfig::default();
        let err = config
            .apply_overrides([("UDFPARITY_TABLE", "drop table;")])
            .unwrap_err();
        assert!(err.to_string().contains("plain identifier"));
    }
}
