//! In-process runtime backed by SQLite.
//!
//! `register()` lowers each staged signature, checks the body's arity against
//! it and installs a marshaling shim as an application-defined SQL function.
//! The server capability profile (`version`, `has_cuda`) is emulated from
//! [`RuntimeConfig`].

use std::ffi::c_int;
use std::panic::AssertUnwindSafe;

use rusqlite::functions::{Context, FunctionFlags};
use rusqlite::types::Value as SqlValue;
use rusqlite::Connection;
use tracing::{debug, info, warn};
use udfparity_error::{Result, UdfError};
use udfparity_func::AdaptedFunction;
use udfparity_types::{Kind, Value};

use crate::config::{RuntimeConfig, ServerVersion};
use crate::dialect::SqlDialect;
use crate::marshal;
use crate::session::{QueryResult, StagedFunction, Staging, UdfRuntime};

/// Outcome of trying to open a runtime. An available runtime is handed back
/// open so callers never connect twice.
#[derive(Debug)]
pub enum Availability {
    Available(EmbeddedRuntime),
    Unavailable { reason: String },
}

impl Availability {
    #[must_use]
    pub const fn is_available(&self) -> bool {
        matches!(self, Self::Available(_))
    }
}

/// Try to open a session with `config`. Configuration errors are returned;
/// any other open failure is `Unavailable`.
pub fn availability(config: &RuntimeConfig) -> Result<Availability> {
    match EmbeddedRuntime::open(config.clone()) {
        Ok(runtime) => Ok(Availability::Available(runtime)),
        Err(err) if err.is_configuration() => Err(err),
        Err(err) => {
            warn!(error = %err, database = %config.database, "runtime unavailable");
            Ok(Availability::Unavailable {
                reason: err.to_string(),
            })
        }
    }
}

/// Per-function marshaling state captured by the SQL callback.
struct Shim {
    function: AdaptedFunction,
    arg_kinds: Vec<Kind>,
    ret: Kind,
    debug: bool,
}

impl Shim {
    fn invoke(&self, ctx: &Context<'_>) -> rusqlite::Result<SqlValue> {
        let mut args = Vec::with_capacity(ctx.len());
        for (idx, kind) in self.arg_kinds.iter().enumerate() {
            let raw = marshal::from_sql(ctx.get_raw(idx)).map_err(user_error)?;
            args.push(kind.coerce(&raw).map_err(user_error)?);
        }
        let out = self.function.call(&args).map_err(user_error)?;
        if self.debug {
            debug!(name = self.function.name(), args = ?args, result = %out, "udf call");
        }
        marshal::to_sql(self.ret, &out).map_err(user_error)
    }
}

fn user_error(err: UdfError) -> rusqlite::Error {
    rusqlite::Error::UserFunctionError(Box::new(err))
}

fn sql_error(query: &str) -> impl Fn(rusqlite::Error) -> UdfError + '_ {
    move |err| UdfError::Sql {
        query: query.to_owned(),
        detail: err.to_string(),
    }
}

/// A session against an in-process SQLite database.
pub struct EmbeddedRuntime {
    conn: Connection,
    config: RuntimeConfig,
    staging: Staging,
    installed: Vec<(String, usize)>,
}

impl std::fmt::Debug for EmbeddedRuntime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmbeddedRuntime")
            .field("database", &self.config.database)
            .field("version", &self.config.version)
            .field("staged", &self.staging.len())
            .field("installed", &self.installed)
            .finish()
    }
}

impl EmbeddedRuntime {
    /// Open a session. Failure to open the database is `Unavailable`; an
    /// unsupported dialect is a configuration error.
    pub fn open(config: RuntimeConfig) -> Result<Self> {
        config.validate()?;
        if config.dialect != SqlDialect::Embedded {
            return Err(UdfError::config(format!(
                "the embedded runtime speaks the '{}' dialect, not '{}'",
                SqlDialect::Embedded,
                config.dialect
            )));
        }
        let conn = if config.database == ":memory:" {
            Connection::open_in_memory()
        } else {
            Connection::open(&config.database)
        }
        .map_err(|err| UdfError::Unavailable {
            detail: format!("{}: {err}", config.database),
        })?;
        info!(
            database = %config.database,
            version = %config.version,
            has_cuda = config.has_cuda,
            "embedded runtime opened"
        );
        Ok(Self {
            conn,
            config,
            staging: Staging::default(),
            installed: Vec::new(),
        })
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::open(RuntimeConfig::default())
    }

    #[must_use]
    pub const fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    #[cfg(test)]
    fn installed(&self) -> impl Iterator<Item = &str> {
        self.installed.iter().map(|(name, _)| name.as_str())
    }

    fn install(&mut self, staged: StagedFunction) -> Result<()> {
        let StagedFunction {
            signature,
            function,
        } = staged;
        let name = function.name().to_owned();
        let lowered = marshal::lower(&name, &signature)?;
        if lowered.arity() != function.arity() {
            return Err(UdfError::ArityMismatch {
                name,
                declared: lowered.arity(),
                actual: function.arity(),
            });
        }
        let n_arg = c_int::try_from(lowered.arity())
            .map_err(|_| UdfError::compile(&name, "too many arguments"))?;

        let shim = AssertUnwindSafe(Shim {
            function,
            arg_kinds: signature.arg_kinds().to_vec(),
            ret: signature.return_kind(),
            debug: self.config.debug,
        });
        self.conn
            .create_scalar_function(
                name.as_str(),
                n_arg,
                FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
                move |ctx| shim.invoke(ctx),
            )
            .map_err(|err| UdfError::compile(&name, err.to_string()))?;

        debug!(name = %name, signature = signature.as_str(), "udf registered");
        let arity = lowered.arity();
        if !self.installed.iter().any(|(n, a)| *n == name && *a == arity) {
            self.installed.push((name, arity));
        }
        Ok(())
    }
}

impl UdfRuntime for EmbeddedRuntime {
    fn sql_execute(&mut self, query: &str) -> Result<QueryResult> {
        debug!(query, "sql_execute");
        let mut stmt = self.conn.prepare(query).map_err(sql_error(query))?;
        let description: Vec<String> = stmt
            .column_names()
            .into_iter()
            .map(str::to_owned)
            .collect();
        if description.is_empty() {
            stmt.execute([]).map_err(sql_error(query))?;
            return Ok(QueryResult::default());
        }

        let width = description.len();
        let mut rows = stmt.query([]).map_err(sql_error(query))?;
        let mut out = Vec::new();
        while let Some(row) = rows.next().map_err(sql_error(query))? {
            let mut values = Vec::with_capacity(width);
            for idx in 0..width {
                let raw = row.get_ref(idx).map_err(sql_error(query))?;
                values.push(marshal::from_sql(raw)?);
            }
            out.push(values);
        }
        Ok(QueryResult {
            description,
            rows: out,
        })
    }

    fn reset(&mut self) -> Result<()> {
        self.staging.clear();
        for (name, arity) in std::mem::take(&mut self.installed) {
            let n_arg = c_int::try_from(arity)
                .map_err(|_| UdfError::internal(format!("arity {arity} out of range")))?;
            self.conn
                .remove_function(&name, n_arg)
                .map_err(|err| UdfError::Sql {
                    query: format!("<remove function {name}/{arity}>"),
                    detail: err.to_string(),
                })?;
        }
        debug!("runtime reset");
        Ok(())
    }

    fn staging(&mut self) -> &mut Staging {
        &mut self.staging
    }

    fn register(&mut self) -> Result<usize> {
        let staged = self.staging.take();
        let count = staged.len();
        for item in staged {
            self.install(item)?;
        }
        Ok(count)
    }

    fn has_cuda(&self) -> bool {
        self.config.has_cuda
    }

    fn version(&self) -> ServerVersion {
        self.config.version
    }

    fn dialect(&self) -> SqlDialect {
        SqlDialect::Embedded
    }
}
