//! Audit of ufuncs that have no catalog entry.

use tracing::warn;

use crate::catalog::Catalog;
use crate::ufunc::Ufunc;

/// Ufuncs deliberately left out of every catalog.
pub const UNSUPPORTED_UFUNCS: &[&str] = &["matmul", "isnat"];

/// Names of ufuncs in `registry` for which no catalog entry name starts with
/// the ufunc name. Each one is logged as a warning.
pub fn uncovered_ufuncs(registry: &[&'static Ufunc], catalog: &Catalog) -> Vec<&'static str> {
    let mut missing = Vec::new();
    for ufunc in registry {
        let name = ufunc.name();
        if UNSUPPORTED_UFUNCS.contains(&name) {
            continue;
        }
        if catalog.names().any(|entry| entry.starts_with(name)) {
            continue;
        }
        warn!(ufunc = name, suite = catalog.suite().as_str(), "ufunc has no catalog entry");
        missing.push(name);
    }
    missing
}
