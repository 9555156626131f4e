//! Structured run logs.
//!
//! A run log directory holds:
//! - `meta.json` with suite, server profile and harness version
//! - `events.jsonl` with one lifecycle event per line, from `run_start`
//!   through `run_end`

use std::collections::BTreeMap;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{error, info, warn};
use udfparity_error::{Result, UdfError};
use udfparity_func::Suite;
use udfparity_runtime::ServerVersion;

/// Version of the run log schema.
pub const LOG_SCHEMA_VERSION: u32 = 1;

/// Files that must be present in every run log.
pub const REQUIRED_LOG_FILES: [&str; 2] = ["meta.json", "events.jsonl"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleEventKind {
    RunStart,
    Setup,
    Step,
    Skip,
    Assertion,
    Teardown,
    RunEnd,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Passed,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunMeta {
    pub schema_version: u32,
    pub suite: String,
    pub server_version: String,
    pub has_cuda: bool,
    pub harness_version: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunEvent {
    pub kind: LifecycleEventKind,
    pub status: Option<RunStatus>,
    pub step: u64,
    pub message: String,
    pub payload: BTreeMap<String, Value>,
}

/// An open run log. Events are appended as they happen.
#[derive(Debug)]
pub struct RunLog {
    root: PathBuf,
    events_path: PathBuf,
    next_step: u64,
}

impl RunLog {
    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn emit_event(
        &mut self,
        kind: LifecycleEventKind,
        message: impl Into<String>,
        payload: BTreeMap<String, Value>,
    ) -> Result<()> {
        let event = RunEvent {
            kind,
            status: None,
            step: self.next_step,
            message: message.into(),
            payload,
        };
        self.next_step = self.next_step.saturating_add(1);
        self.write_event_line(&event)
    }

    /// Write the `run_end` event and close the log.
    pub fn finish(self, status: RunStatus) -> Result<PathBuf> {
        let event = RunEvent {
            kind: LifecycleEventKind::RunEnd,
            status: Some(status),
            step: self.next_step,
            message: "run_end".to_string(),
            payload: BTreeMap::new(),
        };
        self.write_event_line(&event)?;
        info!(
            root = %self.root.display(),
            status = ?status,
            "run log finalized"
        );
        Ok(self.root)
    }

    fn write_event_line(&self, event: &RunEvent) -> Result<()> {
        let encoded = serde_json::to_string(event)
            .map_err(|err| internal_error(format!("failed to serialize run event: {err}")))?;
        let mut file = OpenOptions::new().append(true).open(&self.events_path)?;
        writeln!(file, "{encoded}")?;
        Ok(())
    }
}

/// Build an event payload from `(key, value)` pairs.
pub fn payload<const N: usize>(entries: [(&str, Value); N]) -> BTreeMap<String, Value> {
    entries
        .into_iter()
        .map(|(key, value)| (key.to_owned(), value))
        .collect()
}

fn log_dir_name(suite: Suite, version: ServerVersion, has_cuda: bool) -> String {
    let device = if has_cuda { "cuda" } else { "cpu" };
    format!("{suite}-v{}_{}-{device}", version.major, version.minor)
}

/// Create `<base_dir>/<suite>-v<major>_<minor>-<device>/` and emit
/// `run_start`.
pub fn init_run_log(
    base_dir: &Path,
    suite: Suite,
    version: ServerVersion,
    has_cuda: bool,
) -> Result<RunLog> {
    let root = base_dir.join(log_dir_name(suite, version, has_cuda));
    fs::create_dir_all(&root)?;

    let meta = RunMeta {
        schema_version: LOG_SCHEMA_VERSION,
        suite: suite.as_str().to_string(),
        server_version: version.to_string(),
        has_cuda,
        harness_version: env!("CARGO_PKG_VERSION").to_string(),
    };
    let bytes = serde_json::to_vec_pretty(&meta)
        .map_err(|err| internal_error(format!("failed to serialize meta.json: {err}")))?;
    fs::write(root.join("meta.json"), bytes)?;

    let events_path = root.join("events.jsonl");
    fs::write(&events_path, b"")?;

    let mut log = RunLog {
        root,
        events_path,
        next_step: 0,
    };
    log.emit_event(LifecycleEventKind::RunStart, "run_start", BTreeMap::new())?;

    info!(
        suite = suite.as_str(),
        version = %version,
        has_cuda,
        root = %log.root.display(),
        "run log initialized"
    );
    Ok(log)
}

pub fn validate_required_files(log_root: &Path) -> Result<()> {
    let missing: Vec<&str> = REQUIRED_LOG_FILES
        .iter()
        .copied()
        .filter(|name| !log_root.join(name).is_file())
        .collect();

    if missing.is_empty() {
        return Ok(());
    }

    error!(
        root = %log_root.display(),
        missing_count = missing.len(),
        "missing required run log files"
    );
    Err(internal_error(format!(
        "missing required run log files: {}",
        missing.join(", ")
    )))
}

pub fn validate_run_meta(log_root: &Path) -> Result<RunMeta> {
    let bytes = fs::read(log_root.join("meta.json"))?;
    let meta: RunMeta = serde_json::from_slice(&bytes)
        .map_err(|err| internal_error(format!("run log meta.json is not valid JSON: {err}")))?;

    if meta.schema_version != LOG_SCHEMA_VERSION {
        warn!(
            expected = LOG_SCHEMA_VERSION,
            found = meta.schema_version,
            "run log schema version mismatch"
        );
        return Err(internal_error(format!(
            "run log schema {} is not {LOG_SCHEMA_VERSION}",
            meta.schema_version
        )));
    }
    if meta.suite.is_empty() {
        return Err(internal_error("meta.json must include a non-empty suite"));
    }
    Ok(meta)
}

pub fn validate_events_jsonl(log_root: &Path) -> Result<Vec<RunEvent>> {
    let contents = fs::read_to_string(log_root.join("events.jsonl"))?;
    let mut events = Vec::new();

    for (line_no, line) in contents.lines().enumerate() {
        if line.trim().is_empty() {
            return Err(internal_error(format!(
                "run log event {} is blank",
                line_no + 1
            )));
        }
        let event: RunEvent = serde_json::from_str(line).map_err(|err| {
            internal_error(format!(
                "run log event {} is not valid JSON: {err}",
                line_no + 1
            ))
        })?;
        if event.message.is_empty() {
            return Err(internal_error(format!(
                "run log event {} has no message",
                line_no + 1
            )));
        }
        events.push(event);
    }

    if events.is_empty() {
        return Err(internal_error("events.jsonl must contain at least one event"));
    }
    Ok(events)
}

/// Full check: files, schema, and `run_start` ... `run_end` framing.
pub fn validate_run_log(log_root: &Path) -> Result<Vec<RunEvent>> {
    validate_required_files(log_root)?;
    let _meta = validate_run_meta(log_root)?;
    let events = validate_events_jsonl(log_root)?;

    if events.first().map(|event| event.kind) != Some(LifecycleEventKind::RunStart) {
        return Err(internal_error("run log does not begin with run_start"));
    }
    if events.last().map(|event| event.kind) != Some(LifecycleEventKind::RunEnd) {
        return Err(internal_error("run log does not end with run_end"));
    }
    Ok(events)
}

fn internal_error(message: impl Into<String>) -> UdfError {
    UdfError::internal(message)
}
