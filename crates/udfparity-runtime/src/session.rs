//! The UDF registration session contract.
//!
//! A session stages adapted functions under declared signatures and activates
//! them on [`UdfRuntime::register`]. The function catalog behind a session is
//! global to it, so callers run one case at a time and call
//! [`UdfRuntime::reset`] between cases.

use udfparity_error::Result;
use udfparity_func::AdaptedFunction;
use udfparity_types::{Signature, Value};

use crate::config::ServerVersion;
use crate::dialect::SqlDialect;

/// Column names plus decoded rows of one statement.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryResult {
    pub description: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

impl QueryResult {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// A function waiting for [`UdfRuntime::register`].
#[derive(Debug, Clone)]
pub struct StagedFunction {
    pub signature: Signature,
    pub function: AdaptedFunction,
}

/// Functions declared since the last `register()` or `reset()`.
#[derive(Debug, Default)]
pub struct Staging {
    staged: Vec<StagedFunction>,
}

impl Staging {
    pub fn push(&mut self, staged: StagedFunction) {
        self.staged.push(staged);
    }

    /// Remove and return everything staged.
    pub fn take(&mut self) -> Vec<StagedFunction> {
        std::mem::take(&mut self.staged)
    }

    pub fn clear(&mut self) {
        self.staged.clear();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.staged.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.staged.is_empty()
    }
}

/// Returned by [`UdfRuntime::declare`]; binding a function stages it under
/// the declared signature.
#[derive(Debug)]
pub struct Binder<'a> {
    staging: &'a mut Staging,
    signature: Signature,
}

impl<'a> Binder<'a> {
    pub fn new(staging: &'a mut Staging, signature: Signature) -> Self {
        Self { staging, signature }
    }

    #[must_use]
    pub const fn signature(&self) -> &Signature {
        &self.signature
    }

    pub fn bind(self, function: AdaptedFunction) {
        self.staging.push(StagedFunction {
            signature: self.signature,
            function,
        });
    }
}

/// A session against a runtime that compiles and hosts scalar UDFs.
pub trait UdfRuntime {
    /// Run one SQL statement.
    fn sql_execute(&mut self, query: &str) -> Result<QueryResult>;

    /// Drop staged and registered UDFs. Idempotent; tables are untouched.
    fn reset(&mut self) -> Result<()>;

    fn staging(&mut self) -> &mut Staging;

    /// Start staging a function under `signature`.
    fn declare(&mut self, signature: Signature) -> Binder<'_> {
        Binder::new(self.staging(), signature)
    }

    /// Compile and activate every staged function. Returns how many were
    /// activated.
    fn register(&mut self) -> Result<usize>;

    fn has_cuda(&self) -> bool;

    fn version(&self) -> ServerVersion;

    fn dialect(&self) -> SqlDialect;
}
