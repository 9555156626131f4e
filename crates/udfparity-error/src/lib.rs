//! Error types shared by every udfparity crate.

use std::path::PathBuf;

use thiserror::Error;

/// Primary error type for UDF conformance runs.
///
/// Every variant belongs to exactly one [`ErrorClass`]. The class decides how
/// a case runner reports the error: configuration errors abort the case,
/// compilation errors and mismatches fail it, backend errors fail it with the
/// runtime's diagnostic attached.
#[derive(Error, Debug)]
pub enum UdfError {
    // === Configuration Errors ===
    /// Signature string is not of the form `R(K1, K2, ...)`.
    #[error("malformed signature '{signature}': {detail}")]
    MalformedSignature { signature: String, detail: String },

    /// Kind token is not one of `double|int*|bool*|constant` (optionally `[]`).
    #[error("unknown kind '{token}'")]
    UnknownKind { token: String },

    /// Adapter or query builder cannot handle this many arguments.
    #[error("unsupported arity {arity} for '{name}' ({signature})")]
    UnsupportedArity {
        name: String,
        signature: String,
        arity: usize,
    },

    /// No fixture columns exist for the primary argument kind.
    #[error("no fixture columns for kind '{kind}'")]
    UnsupportedKindGroup { kind: String },

    /// Configuration file or environment override could not be applied.
    #[error("invalid configuration: {detail}")]
    Config { detail: String },

    /// Configuration file could not be parsed.
    #[error("invalid configuration file '{path}': {detail}")]
    ConfigFile { path: PathBuf, detail: String },

    // === Compilation Errors ===
    /// The runtime refused to lower or activate a staged function.
    #[error("compilation of '{name}' failed: {detail}")]
    Compile { name: String, detail: String },

    /// `register()` was called with a declaration whose body does not match it.
    #[error("'{name}' declared with arity {declared} but function takes {actual}")]
    ArityMismatch {
        name: String,
        declared: usize,
        actual: usize,
    },

    // === Mismatch Errors ===
    /// UDF result disagrees with the in-process reference.
    #[error("'{name}' row {row}: expected {expected}, got {actual} (args: {args})")]
    Mismatch {
        name: String,
        row: usize,
        args: String,
        expected: String,
        actual: String,
    },

    /// Query returned no rows to compare.
    #[error("'{name}' query returned no rows: {query}")]
    EmptyResult { name: String, query: String },

    // === Backend Errors ===
    /// SQL execution failed on the runtime.
    #[error("SQL error in '{query}': {detail}")]
    Sql { query: String, detail: String },

    /// The runtime session could not be opened.
    #[error("runtime unavailable: {detail}")]
    Unavailable { detail: String },

    /// Value could not be converted to the requested kind.
    #[error("type mismatch: expected {expected}, got {actual}")]
    TypeMismatch { expected: String, actual: String },

    /// Reference or UDF body raised a domain/runtime error.
    #[error("{0}")]
    FunctionError(String),

    /// Generic dispatch has no loop for the argument kinds.
    #[error("no loop for {name} matching argument kinds ({kinds})")]
    NoMatchingLoop { name: String, kinds: String },

    /// File I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Internal logic error (should never happen).
    #[error("internal error: {0}")]
    Internal(String),
}

/// Error taxonomy used by reports and the case runner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorClass {
    /// Fatal setup problem; never skipped.
    Configuration,
    /// Runtime rejected the function at registration.
    Compilation,
    /// Value disagreement between UDF and reference.
    Mismatch,
    /// SQL, I/O or evaluation failure.
    Backend,
}

impl ErrorClass {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Configuration => "configuration",
            Self::Compilation => "compilation",
            Self::Mismatch => "mismatch",
            Self::Backend => "backend",
        }
    }
}

impl UdfError {
    /// Map this error to its taxonomy class.
    #[allow(clippy::match_same_arms)]
    pub const fn class(&self) -> ErrorClass {
        match self {
            Self::MalformedSignature { .. }
            | Self::UnknownKind { .. }
            | Self::UnsupportedArity { .. }
            | Self::UnsupportedKindGroup { .. }
            | Self::Config { .. }
            | Self::ConfigFile { .. } => ErrorClass::Configuration,
            Self::Compile { .. } | Self::ArityMismatch { .. } => ErrorClass::Compilation,
            Self::Mismatch { .. } | Self::EmptyResult { .. } => ErrorClass::Mismatch,
            Self::Sql { .. }
            | Self::Unavailable { .. }
            | Self::TypeMismatch { .. }
            | Self::FunctionError(_)
            | Self::NoMatchingLoop { .. }
            | Self::Io(_)
            | Self::Internal(_) => ErrorClass::Backend,
        }
    }

    /// Whether this error must abort the case rather than be reported as a
    /// comparison result.
    pub const fn is_configuration(&self) -> bool {
        matches!(self.class(), ErrorClass::Configuration)
    }

    /// Create a function error from any displayable message.
    pub fn function_error(msg: impl Into<String>) -> Self {
        Self::FunctionError(msg.into())
    }

    /// Create a compile error for `name`.
    pub fn compile(name: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::Compile {
            name: name.into(),
            detail: detail.into(),
        }
    }

    /// Create an internal error.
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Create a configuration error.
    pub fn config(detail: impl Into<String>) -> Self {
        Self::Config {
            detail: detail.into(),
        }
    }
}

/// Result type alias using `UdfError`.
pub type Result<T> = std::result::Result<T, UdfError>;
