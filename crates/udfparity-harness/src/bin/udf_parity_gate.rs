use std::env;
use std::path::PathBuf;
use std::process::ExitCode;

use serde::Serialize;
use tracing_subscriber::EnvFilter;
use udfparity_func::{Catalog, Suite};
use udfparity_harness::log::{RunStatus, init_run_log};
use udfparity_harness::runner::{run_suite, unavailable_report};
use udfparity_harness::{SkipPolicy, SuiteReport};
use udfparity_runtime::{Availability, RuntimeConfig, UdfRuntime, availability};

#[derive(Debug)]
struct CliConfig {
    suites: Vec<Suite>,
    config_path: Option<PathBuf>,
    output_path: Option<PathBuf>,
    log_dir: Option<PathBuf>,
    json_logs: bool,
}

#[derive(Debug, Serialize)]
struct GateReport {
    overall_pass: bool,
    suites: Vec<SuiteReport>,
}

fn print_help() {
    let help = "\
udf_parity_gate: register reference math functions as UDFs and check them against the reference

USAGE:
    cargo run -p udfparity-harness --bin udf_parity_gate -- [OPTIONS]

OPTIONS:
    --suite <math|numpy|all>  Suite to run (default: all)
    --config <PATH>           Runtime config TOML (UDFPARITY_* env vars override it)
    --output <PATH>           Write JSON report to path (stdout when omitted)
    --log-dir <PATH>          Write meta.json + events.jsonl run logs under path
    --json-logs               Emit tracing output as JSON
    -h, --help                Show this help
";
    println!("{help}");
}

fn parse_suites(value: &str) -> Result<Vec<Suite>, String> {
    if value == "all" {
        return Ok(vec![Suite::Math, Suite::Numpy]);
    }
    Suite::parse(value)
        .map(|suite| vec![suite])
        .map_err(|err| err.to_string())
}

fn parse_args(args: &[String]) -> Result<CliConfig, String> {
    let mut suites = vec![Suite::Math, Suite::Numpy];
    let mut config_path: Option<PathBuf> = None;
    let mut output_path: Option<PathBuf> = None;
    let mut log_dir: Option<PathBuf> = None;
    let mut json_logs = false;

    let mut index = 0;
    while index < args.len() {
        match args[index].as_str() {
            flag @ ("--suite" | "--config" | "--output" | "--log-dir") => {
                index += 1;
                if index >= args.len() {
                    return Err(format!("{flag} requires a value"));
                }
                let value = &args[index];
                match flag {
                    "--suite" => suites = parse_suites(value)?,
                    "--config" => config_path = Some(PathBuf::from(value)),
                    "--output" => output_path = Some(PathBuf::from(value)),
                    _ => log_dir = Some(PathBuf::from(value)),
                }
            }
            "--json-logs" => json_logs = true,
            "-h" | "--help" => {
                print_help();
                return Err(String::new());
            }
            unknown => {
                return Err(format!("unknown option: {unknown}"));
            }
        }
        index += 1;
    }

    Ok(CliConfig {
        suites,
        config_path,
        output_path,
        log_dir,
        json_logs,
    })
}

fn install_tracing(json: bool) -> Result<(), String> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    let installed = if json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    installed.map_err(|error| format!("tracing_init_failed: {error}"))
}

fn run_one(
    cli: &CliConfig,
    config: &RuntimeConfig,
    suite: Suite,
) -> Result<SuiteReport, String> {
    let catalog = Catalog::for_suite(suite).map_err(|err| err.to_string())?;

    let mut runtime = match availability(config).map_err(|err| err.to_string())? {
        Availability::Unavailable { reason } => {
            let version = config.version.to_string();
            return Ok(unavailable_report(&catalog, &version, config.has_cuda, &reason));
        }
        Availability::Available(runtime) => runtime,
    };
    let mut log = match &cli.log_dir {
        Some(dir) => Some(
            init_run_log(dir, suite, runtime.version(), runtime.has_cuda())
                .map_err(|err| format!("run_log_init_failed: {err}"))?,
        ),
        None => None,
    };

    let outcome = run_suite(
        &mut runtime,
        &catalog,
        &SkipPolicy::for_suite(suite),
        &config.table_name,
        log.as_mut(),
    );
    if let Some(log) = log {
        let status = match &outcome {
            Ok(report) if report.is_success() => RunStatus::Passed,
            _ => RunStatus::Failed,
        };
        log.finish(status)
            .map_err(|err| format!("run_log_finish_failed: {err}"))?;
    }
    outcome.map_err(|err| format!("suite {suite} aborted: {err}"))
}

fn run(args: &[String]) -> Result<i32, String> {
    let cli = parse_args(args)?;
    install_tracing(cli.json_logs)?;

    let config = RuntimeConfig::resolve(cli.config_path.as_deref()).map_err(|err| err.to_string())?;
    let suites = cli
        .suites
        .iter()
        .map(|&suite| run_one(&cli, &config, suite))
        .collect::<Result<Vec<_>, _>>()?;

    let report = GateReport {
        overall_pass: suites.iter().all(SuiteReport::is_success),
        suites,
    };
    let payload = serde_json::to_string_pretty(&report)
        .map_err(|error| format!("report_serialize_failed: {error}"))?;

    if let Some(output_path) = &cli.output_path {
        std::fs::write(output_path, payload).map_err(|error| {
            format!(
                "report_write_failed path={} error={error}",
                output_path.display()
            )
        })?;
    } else {
        println!("{payload}");
    }

    for suite in &report.suites {
        let summary = suite.summary();
        eprintln!(
            "INFO suite={} passed={} skipped={} failed={}",
            suite.suite, summary.passed, summary.skipped, summary.failed
        );
    }
    if report.overall_pass {
        return Ok(0);
    }

    for suite in &report.suites {
        for case in suite.failures() {
            eprintln!("WARN suite={} case={} {:?}", suite.suite, case.name, case.outcome);
        }
    }
    Ok(1)
}

fn main() -> ExitCode {
    let args: Vec<String> = env::args().skip(1).collect();
    match run(&args) {
        Ok(0) => ExitCode::SUCCESS,
        Ok(1) => ExitCode::from(1),
        Ok(_) => ExitCode::from(2),
        Err(error) if error.is_empty() => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("ERROR udf_parity_gate failed: {error}");
            ExitCode::from(2)
        }
    }
}
