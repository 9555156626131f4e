//! UDF registration sessions.
//!
//! - [`session`]: the [`UdfRuntime`] contract (declare, register, reset, SQL).
//! - [`embedded`]: SQLite-backed implementation.
//! - [`config`]: TOML plus environment configuration.
//! - [`dialect`]: literal and column-type spelling per SQL dialect.
//! - [`marshal`]: value conversion across the SQL boundary.

pub mod config;
pub mod dialect;
pub mod embedded;
pub mod marshal;
pub mod session;

pub use config::{DEFAULT_TABLE_NAME, ENV_PREFIX, RuntimeConfig, ServerVersion};
pub use dialect::SqlDialect;
pub use embedded::{Availability, EmbeddedRuntime, availability};
pub use session::{Binder, QueryResult, StagedFunction, Staging, UdfRuntime};
