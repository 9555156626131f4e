//! End-to-end suite runs against the embedded runtime.

use std::io::Write;

use udfparity_error::{ErrorClass, Result};
use udfparity_func::{Catalog, CatalogEntry, Reference, Suite, adapt};
use udfparity_harness::runner::{UNAVAILABLE_RULE, run_case, run_suite, unavailable_report};
use udfparity_harness::{CaseOutcome, FixtureTable, SkipPolicy, SuiteReport};
use udfparity_runtime::{
    Availability, EmbeddedRuntime, RuntimeConfig, ServerVersion, UdfRuntime, availability,
};
use udfparity_types::Value;

const TABLE: &str = "udfparity_suite_fixture";

fn runtime(version: (u32, u32), has_cuda: bool) -> EmbeddedRuntime {
    EmbeddedRuntime::open(RuntimeConfig {
        version: ServerVersion::new(version.0, version.1),
        has_cuda,
        ..RuntimeConfig::default()
    })
    .unwrap()
}

fn run(catalog: &Catalog, version: (u32, u32), has_cuda: bool) -> SuiteReport {
    let mut rt = runtime(version, has_cuda);
    run_suite(
        &mut rt,
        catalog,
        &SkipPolicy::for_suite(catalog.suite()),
        TABLE,
        None,
    )
    .unwrap()
}

fn assert_no_failures(report: &SuiteReport) {
    let failures: Vec<String> = report
        .failures()
        .map(|case| format!("{}: {:?}", case.name, case.outcome))
        .collect();
    assert!(failures.is_empty(), "failures:\n{}", failures.join("\n"));
}

fn skip_reason<'a>(report: &'a SuiteReport, name: &str) -> &'a str {
    match &report.case(name).unwrap().outcome {
        CaseOutcome::Skipped { reason, .. } => reason,
        other => panic!("{name}: expected skip, got {other:?}"),
    }
}

#[test]
fn math_suite_has_no_failures() {
    let catalog = Catalog::math().unwrap();
    let report = run(&catalog, (5, 5), false);
    assert_no_failures(&report);

    let summary = report.summary();
    assert_eq!(summary.total, catalog.len());
    assert_eq!(summary.skipped, 11);
    assert_eq!(summary.passed, catalog.len() - 11);
    assert_eq!(
        report.case("sqrt").unwrap().outcome,
        CaseOutcome::Passed { rows: 5 }
    );
    assert!(report.case("pi").unwrap().outcome.is_passed());
    assert!(report.case("ldexp").unwrap().outcome.is_passed());
    assert_eq!(skip_reason(&report, "frexp"), "frexp returns a pair (m, e)");
    assert_eq!(
        report.case("modf").unwrap().outcome,
        CaseOutcome::Passed { rows: 5 }
    );
}

#[test]
fn modf_registers_without_any_skip_rule() {
    let catalog = Catalog::math().unwrap();
    let mut rt = EmbeddedRuntime::open_in_memory().unwrap();
    let mut fixture = FixtureTable::provision(&mut rt, TABLE).unwrap();
    let outcome = run_case(
        fixture.runtime(),
        catalog.get("modf").unwrap(),
        &SkipPolicy::new(vec![]),
        TABLE,
    )
    .unwrap();
    assert_eq!(outcome, CaseOutcome::Passed { rows: 5 });
}

fn first_of_three(args: &[Value]) -> Result<Value> {
    Ok(args[0].clone())
}

fn three_argument_entry() -> CatalogEntry {
    CatalogEntry::new(
        "first3",
        "double(double, double, double)",
        Reference::scalar(3, first_of_three),
    )
    .unwrap()
}

#[test]
fn three_argument_case_aborts_with_configuration_error() {
    let entry = three_argument_entry();
    let mut rt = EmbeddedRuntime::open_in_memory().unwrap();
    let mut fixture = FixtureTable::provision(&mut rt, TABLE).unwrap();
    let err = run_case(fixture.runtime(), &entry, &SkipPolicy::math(), TABLE).unwrap_err();
    assert_eq!(err.class(), ErrorClass::Configuration);
    assert!(err.to_string().contains("'first3'"), "{err}");
}

#[test]
fn three_argument_case_fails_the_suite_as_configuration() {
    let math = Catalog::math().unwrap();
    let catalog = Catalog::new(
        Suite::Math,
        vec![math.get("sqrt").unwrap().clone(), three_argument_entry()],
    );
    let report = run(&catalog, (5, 5), false);
    assert!(!report.is_success());
    assert!(report.case("sqrt").unwrap().outcome.is_passed());
    match &report.case("first3").unwrap().outcome {
        CaseOutcome::Failed { class, message } => {
            assert_eq!(class, ErrorClass::Configuration.as_str());
            assert!(message.contains("unsupported arity 3"), "{message}");
        }
        other => panic!("{other:?}"),
    }
    assert_eq!(report.summary().failed, 1);
}

#[test]
fn numpy_suite_has_no_failures() {
    let catalog = Catalog::numpy().unwrap();
    let report = run(&catalog, (5, 5), false);
    assert_no_failures(&report);

    let summary = report.summary();
    assert_eq!(summary.skipped, 6);
    assert_eq!(summary.passed, catalog.len() - 6);
    assert!(report.case("logical_xor").unwrap().outcome.is_passed());
    assert!(report.case("divmod0").unwrap().outcome.is_passed());
    assert!(report.case("add").unwrap().outcome.is_passed());
}

#[test]
fn ldexp_reports_skipped_not_passed_or_failed() {
    let catalog = Catalog::numpy().unwrap();
    for (version, cuda) in [((5, 0), false), ((5, 5), false), ((5, 5), true)] {
        let report = run(&catalog, version, cuda);
        assert_eq!(skip_reason(&report, "ldexp"), "ldexp: FIXME");
    }
}

#[test]
fn sqrt_of_row_three_is_one() {
    let catalog = Catalog::math().unwrap();
    let sqrt = catalog.get("sqrt").unwrap();
    let mut rt = EmbeddedRuntime::open_in_memory().unwrap();
    let mut fixture = FixtureTable::provision(&mut rt, TABLE).unwrap();
    let session = fixture.runtime();
    session.declare(sqrt.signature().clone()).bind(adapt(sqrt).unwrap());
    session.register().unwrap();

    let result = session
        .sql_execute(&format!("SELECT x, sqrt(x) FROM {TABLE} WHERE i = 3"))
        .unwrap();
    let row = &result.rows[0];
    let Value::Double(got) = row[1] else {
        panic!("unexpected {row:?}");
    };
    assert!(udfparity_harness::isclose(1.0, got), "sqrt(x) = {got}");
}

#[test]
fn gcd_of_row_three_is_three() {
    let catalog = Catalog::numpy().unwrap();
    let gcd = catalog.get("gcd").unwrap();
    let mut rt = EmbeddedRuntime::open_in_memory().unwrap();
    let mut fixture = FixtureTable::provision(&mut rt, TABLE).unwrap();
    let session = fixture.runtime();
    session.declare(gcd.signature().clone()).bind(adapt(gcd).unwrap());
    session.register().unwrap();

    let result = session
        .sql_execute(&format!("SELECT i, j, gcd(i, j) FROM {TABLE} WHERE i = 3"))
        .unwrap();
    assert_eq!(
        result.rows,
        vec![vec![Value::Int(3), Value::Int(30), Value::Int(3)]]
    );
}

#[test]
fn old_servers_register_forbidden_names_with_suffix() {
    let catalog = Catalog::numpy().unwrap();
    let mut rt = runtime((5, 1), false);
    let mut fixture = FixtureTable::provision(&mut rt, TABLE).unwrap();
    let outcome = run_case(
        fixture.runtime(),
        catalog.get("gcd").unwrap(),
        &SkipPolicy::numpy(),
        TABLE,
    )
    .unwrap();
    assert_eq!(outcome, CaseOutcome::Passed { rows: 5 });

    let session = fixture.runtime();
    let renamed = session
        .sql_execute(&format!("SELECT \"gcdFIX\"(i, j) FROM {TABLE} WHERE i = 3"))
        .unwrap();
    assert_eq!(renamed.rows, vec![vec![Value::Int(3)]]);
    assert!(
        session
            .sql_execute(&format!("SELECT gcd(i, j) FROM {TABLE}"))
            .is_err()
    );
}

#[test]
fn old_server_suite_skips_boolean_functions() {
    let catalog = Catalog::numpy().unwrap();
    let report = run(&catalog, (5, 1), false);
    assert_no_failures(&report);
    assert_eq!(report.summary().skipped, 10);
    assert_eq!(
        skip_reason(&report, "logical_not"),
        "using boolean arguments requires omniscidb v 5.4 or newer (got 5.1) [issue 108]"
    );
    assert!(report.case("hypot").unwrap().outcome.is_passed());
}

#[test]
fn cuda_profile_skips_crashing_functions() {
    let catalog = Catalog::numpy().unwrap();
    let report = run(&catalog, (5, 5), true);
    assert_no_failures(&report);
    assert_eq!(report.summary().skipped, 24);
    assert_eq!(
        skip_reason(&report, "arctan2"),
        "arctan2: crashes CUDA enabled omniscidb server [rbc issue 59]"
    );
    assert_eq!(
        skip_reason(&report, "lcm"),
        "lcm: crashes CUDA enabled omniscidb server [rbc issue 71]"
    );
    assert!(report.case("sqrt").unwrap().outcome.is_passed());

    let legacy = run(&catalog, (5, 1), true);
    assert_no_failures(&legacy);
    assert_eq!(
        skip_reason(&legacy, "sqrt"),
        "sqrt: crashes CUDA enabled omniscidb server < 5.2"
    );
}

#[test]
fn config_file_drives_the_run() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "version = \"5.1\"\ntable_name = \"from_config\"").unwrap();
    let config = RuntimeConfig::load(file.path()).unwrap();

    let mut rt = EmbeddedRuntime::open(config.clone()).unwrap();
    let catalog = Catalog::math().unwrap();
    let report = run_suite(
        &mut rt,
        &catalog,
        &SkipPolicy::math(),
        &config.table_name,
        None,
    )
    .unwrap();
    assert_eq!(report.server_version, "5.1");
    assert_no_failures(&report);
    assert!(rt.sql_execute("SELECT * FROM from_config").is_err());
}

#[test]
fn unreachable_database_skips_suite() {
    let config = RuntimeConfig {
        database: "/nonexistent-dir/udfparity/parity.sqlite".to_owned(),
        ..RuntimeConfig::default()
    };
    let Availability::Unavailable { reason } = availability(&config).unwrap() else {
        panic!("database should be unavailable");
    };
    let catalog = Catalog::numpy().unwrap();
    let report = unavailable_report(&catalog, "5.5", false, &reason);
    assert!(report.is_success());
    assert_eq!(report.summary().skipped, catalog.len());
    match &report.cases[0].outcome {
        CaseOutcome::Skipped { rule, .. } => assert_eq!(rule, UNAVAILABLE_RULE),
        other => panic!("{other:?}"),
    }
}
