//! UDF parity harness.
//!
//! Registers every catalog function as a UDF on a runtime session, queries
//! it over a deterministic fixture table and checks each row against the
//! in-process reference.
//!
//! - [`fixture`]: scoped fixture table.
//! - [`skip`]: data-driven skip policies.
//! - [`comparator`]: query builder and NaN-aware tolerance check.
//! - [`runner`]: sequential case and suite runner.
//! - [`report`]: per-case outcomes and summaries.
//! - [`log`]: `meta.json` + `events.jsonl` run logs.

pub mod comparator;
pub mod fixture;
pub mod log;
pub mod report;
pub mod runner;
pub mod skip;

pub use comparator::{build_query, compare, isclose};
pub use fixture::{FIXTURE_ROWS, FixtureRow, FixtureTable};
pub use log::{RunLog, RunStatus, init_run_log, validate_run_log};
pub use report::{CaseOutcome, CaseReport, SuiteReport, Summary};
pub use runner::{run_case, run_suite, unavailable_report};
pub use skip::{Decision, SkipPolicy, SkipRule};
