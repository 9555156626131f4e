//! Per-case outcomes and suite reports.

use serde::{Deserialize, Serialize};
use udfparity_error::UdfError;
use udfparity_func::Suite;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CaseOutcome {
    Passed { rows: usize },
    Skipped { rule: String, reason: String },
    Failed { class: String, message: String },
}

impl CaseOutcome {
    #[must_use]
    pub fn failed(err: &UdfError) -> Self {
        Self::Failed {
            class: err.class().as_str().to_owned(),
            message: err.to_string(),
        }
    }

    #[must_use]
    pub const fn is_passed(&self) -> bool {
        matches!(self, Self::Passed { .. })
    }

    #[must_use]
    pub const fn is_skipped(&self) -> bool {
        matches!(self, Self::Skipped { .. })
    }

    #[must_use]
    pub const fn is_failed(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaseReport {
    pub name: String,
    pub signature: String,
    pub outcome: CaseOutcome,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    pub total: usize,
    pub passed: usize,
    pub skipped: usize,
    pub failed: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuiteReport {
    pub suite: Suite,
    pub server_version: String,
    pub has_cuda: bool,
    pub cases: Vec<CaseReport>,
}

impl SuiteReport {
    #[must_use]
    pub fn new(suite: Suite, server_version: impl Into<String>, has_cuda: bool) -> Self {
        Self {
            suite,
            server_version: server_version.into(),
            has_cuda,
            cases: Vec::new(),
        }
    }

    pub fn push(&mut self, name: &str, signature: &str, outcome: CaseOutcome) {
        self.cases.push(CaseReport {
            name: name.to_owned(),
            signature: signature.to_owned(),
            outcome,
        });
    }

    #[must_use]
    pub fn case(&self, name: &str) -> Option<&CaseReport> {
        self.cases.iter().find(|case| case.name == name)
    }

    #[must_use]
    pub fn summary(&self) -> Summary {
        let mut summary = Summary {
            total: self.cases.len(),
            ..Summary::default()
        };
        for case in &self.cases {
            match case.outcome {
                CaseOutcome::Passed { .. } => summary.passed += 1,
                CaseOutcome::Skipped { .. } => summary.skipped += 1,
                CaseOutcome::Failed { .. } => summary.failed += 1,
            }
        }
        summary
    }

    pub fn failures(&self) -> impl Iterator<Item = &CaseReport> {
        self.cases.iter().filter(|case| case.outcome.is_failed())
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        self.failures().next().is_none()
    }
}
