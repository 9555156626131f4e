//! Sequential suite runner.
//!
//! Cases run one at a time against a single session:
//! reset, adapt, skip policy, declare and register, query, compare.
//! The runtime's function catalog is shared session state, so `reset()` at
//! the start of each case is the only isolation boundary between cases.

use std::collections::BTreeMap;

use serde_json::Value as JsonValue;
use tracing::{debug, info, warn};
use udfparity_error::Result;
use udfparity_func::{Catalog, CatalogEntry, Suite, adapt, ufunc, uncovered_ufuncs};
use udfparity_runtime::UdfRuntime;

use crate::comparator::{argument_columns, build_query, compare};
use crate::fixture::FixtureTable;
use crate::log::{LifecycleEventKind, RunLog, payload};
use crate::report::{CaseOutcome, SuiteReport};
use crate::skip::{Decision, SkipPolicy};

/// Rule id recorded when the whole suite could not run.
pub const UNAVAILABLE_RULE: &str = "runtime-unavailable";

/// Run one case on `runtime`. The fixture `table` must already exist.
pub fn run_case<R: UdfRuntime + ?Sized>(
    runtime: &mut R,
    entry: &CatalogEntry,
    policy: &SkipPolicy,
    table: &str,
) -> Result<CaseOutcome> {
    runtime.reset()?;

    let function = adapt(entry)?;
    debug!(
        name = entry.name(),
        signature = entry.signature().as_str(),
        adapter = entry.adapter().as_str(),
        "adapted"
    );

    let name = match policy.decide(runtime.version(), runtime.has_cuda(), &function)? {
        Decision::Skip { rule, reason } => {
            info!(name = entry.name(), rule = %rule, reason = %reason, "case skipped");
            return Ok(CaseOutcome::Skipped { rule, reason });
        }
        Decision::Run { name } => name,
    };
    let function = if name == function.name() {
        function
    } else {
        function.renamed(name.as_str())
    };

    let columns = argument_columns(&name, entry.signature())?;
    runtime.declare(entry.signature().clone()).bind(function);
    runtime.register()?;

    let query = build_query(runtime.dialect(), &name, &columns, table);
    let result = runtime.sql_execute(&query)?;
    let rows = compare(entry, &name, &result, &query)?;
    debug!(name = %name, rows, "case passed");
    Ok(CaseOutcome::Passed { rows })
}

fn emit(
    log: &mut Option<&mut RunLog>,
    kind: LifecycleEventKind,
    message: &str,
    fields: BTreeMap<String, JsonValue>,
) -> Result<()> {
    match log {
        Some(log) => log.emit_event(kind, message, fields),
        None => Ok(()),
    }
}

fn outcome_event(outcome: &CaseOutcome) -> (LifecycleEventKind, BTreeMap<String, JsonValue>) {
    match outcome {
        CaseOutcome::Passed { rows } => (
            LifecycleEventKind::Assertion,
            payload([("status", "passed".into()), ("rows", (*rows).into())]),
        ),
        CaseOutcome::Skipped { rule, reason } => (
            LifecycleEventKind::Skip,
            payload([("rule", rule.as_str().into()), ("reason", reason.as_str().into())]),
        ),
        CaseOutcome::Failed { class, message } => (
            LifecycleEventKind::Assertion,
            payload([
                ("status", "failed".into()),
                ("class", class.as_str().into()),
                ("message", message.as_str().into()),
            ]),
        ),
    }
}

/// Provision the fixture, run every catalog entry, tear the fixture down.
///
/// Case errors become `Failed` outcomes; only fixture and log errors are
/// returned. The fixture is dropped even when this returns early.
pub fn run_suite<R: UdfRuntime + ?Sized>(
    runtime: &mut R,
    catalog: &Catalog,
    policy: &SkipPolicy,
    table: &str,
    mut log: Option<&mut RunLog>,
) -> Result<SuiteReport> {
    let suite = catalog.suite();
    let version = runtime.version();
    let has_cuda = runtime.has_cuda();
    let mut report = SuiteReport::new(suite, version.to_string(), has_cuda);
    info!(
        suite = suite.as_str(),
        cases = catalog.len(),
        version = %version,
        has_cuda,
        "suite started"
    );

    if suite == Suite::Numpy {
        let uncovered = uncovered_ufuncs(ufunc::UFUNCS, catalog);
        emit(
            &mut log,
            LifecycleEventKind::Setup,
            "coverage_audit",
            payload([("uncovered", uncovered.into())]),
        )?;
    }

    let mut fixture = FixtureTable::provision(runtime, table)?;
    emit(
        &mut log,
        LifecycleEventKind::Setup,
        "fixture_provisioned",
        payload([("table", table.into())]),
    )?;

    for entry in catalog.entries() {
        emit(
            &mut log,
            LifecycleEventKind::Step,
            entry.name(),
            payload([("signature", entry.signature().as_str().into())]),
        )?;
        let outcome = match run_case(fixture.runtime(), entry, policy, table) {
            Ok(outcome) => outcome,
            Err(err) => {
                warn!(name = entry.name(), class = err.class().as_str(), error = %err, "case failed");
                CaseOutcome::failed(&err)
            }
        };
        let (kind, fields) = outcome_event(&outcome);
        emit(&mut log, kind, entry.name(), fields)?;
        report.push(entry.name(), entry.signature().as_str(), outcome);
    }

    fixture.runtime().reset()?;
    fixture.teardown()?;
    emit(
        &mut log,
        LifecycleEventKind::Teardown,
        "fixture_dropped",
        payload([("table", table.into())]),
    )?;

    let summary = report.summary();
    info!(
        suite = suite.as_str(),
        passed = summary.passed,
        skipped = summary.skipped,
        failed = summary.failed,
        "suite finished"
    );
    Ok(report)
}

/// Report for a suite whose runtime could not be opened: every case skipped.
#[must_use]
pub fn unavailable_report(
    catalog: &Catalog,
    server_version: &str,
    has_cuda: bool,
    reason: &str,
) -> SuiteReport {
    warn!(suite = catalog.suite().as_str(), reason, "suite unavailable");
    let mut report = SuiteReport::new(catalog.suite(), server_version, has_cuda);
    for entry in catalog.entries() {
        report.push(
            entry.name(),
            entry.signature().as_str(),
            CaseOutcome::Skipped {
                rule: UNAVAILABLE_RULE.to_owned(),
                reason: reason.to_owned(),
            },
        );
    }
    report
}

#[cfg(test)]
mod tests {
    use udfparity_runtime::EmbeddedRuntime;

    use super::*;

    #[test]
    fn single_case_passes() {
        let mut rt = EmbeddedRuntime::open_in_memory().unwrap();
        let catalog = Catalog::numpy().unwrap();
        let policy = SkipPolicy::numpy();
        let mut fixture = FixtureTable::provision(&mut rt, "fx").unwrap();
        let outcome = run_case(fixture.runtime(), catalog.get("hypot").unwrap(), &policy, "fx").unwrap();
        assert_eq!(outcome, CaseOutcome::Passed { rows: 5 });
    }

    #[test]
    fn keyword_named_function_passes() {
        let mut rt = EmbeddedRuntime::open_in_memory().unwrap();
        let catalog = Catalog::numpy().unwrap();
        let policy = SkipPolicy::numpy();
        let mut fixture = FixtureTable::provision(&mut rt, "fx").unwrap();
        let outcome = run_case(fixture.runtime(), catalog.get("add").unwrap(), &policy, "fx").unwrap();
        assert!(outcome.is_passed(), "{outcome:?}");
    }

    #[test]
    fn missing_table_is_backend_failure() {
        let mut rt = EmbeddedRuntime::open_in_memory().unwrap();
        let catalog = Catalog::numpy().unwrap();
        let err = run_case(&mut rt, catalog.get("sqrt").unwrap(), &SkipPolicy::numpy(), "absent")
            .unwrap_err();
        assert_eq!(err.class(), udfparity_error::ErrorClass::Backend);
    }

    #[test]
    fn unavailable_suite_skips_everything() {
        let catalog = Catalog::math().unwrap();
        let report = unavailable_report(&catalog, "5.5", false, "cannot connect");
        let summary = report.summary();
        assert_eq!(summary.total, catalog.len());
        assert_eq!(summary.skipped, catalog.len());
        assert!(report.is_success());
    }
}
