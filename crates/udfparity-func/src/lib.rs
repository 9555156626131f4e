//! Reference numeric functions, catalogs and UDF adapters.
//!
//! - [`ufunc`]: vectorized generic-dispatch references with typed loops.
//! - [`math`] / [`numpy`]: plain scalar references.
//! - [`catalog`]: `(name, signature, reference)` tables for each suite.
//! - [`adapter`]: catalog entry → named, compilable scalar function.
//! - [`coverage`]: ufuncs with no catalog entry.

pub mod adapter;
pub mod catalog;
pub mod coverage;
pub mod math;
pub mod numpy;
pub mod special;
pub mod ufunc;

pub use adapter::{AdaptedFunction, UdfBody, adapt};
pub use catalog::{AdapterKind, Catalog, CatalogEntry, Reference, ScalarFn, Suite};
pub use coverage::uncovered_ufuncs;
pub use ufunc::{ArgClass, Ufunc};
