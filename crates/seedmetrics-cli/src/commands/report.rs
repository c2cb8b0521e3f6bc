//! `seedmetrics report`: render a report from recorded job results.

use std::io::Read;
use std::path::Path;

use serde::Deserialize;

use seedmetrics_core::{HostProbe, RunMonitor, load_checks};

use super::{ReportOptions, append_log, load_config};

/// One job outcome as written by an orchestrator.
#[derive(Debug, Deserialize)]
struct JobResult {
    job_id: String,
    #[serde(default)]
    target: Option<String>,
    records: u64,
    elapsed_seconds: f64,
    #[serde(default)]
    memory_delta_bytes: i64,
}

fn read_input(input: &str) -> std::io::Result<String> {
    if input == "-" {
        let mut raw = String::new();
        std::io::stdin().read_to_string(&mut raw)?;
        Ok(raw)
    } else {
        std::fs::read_to_string(input)
    }
}

/// Run the report command.
pub fn run(input: &str, checks_path: Option<&str>, system: bool, opts: &ReportOptions<'_>) {
    let config = load_config(opts);

    let raw = match read_input(input) {
        Ok(raw) => raw,
        Err(e) => {
            eprintln!("Error reading job results '{input}': {e}");
            std::process::exit(1);
        }
    };
    let results: Vec<JobResult> = match serde_json::from_str(&raw) {
        Ok(results) => results,
        Err(e) => {
            eprintln!("Error parsing job results: {e}");
            std::process::exit(1);
        }
    };

    let mut monitor = match RunMonitor::new(config) {
        Ok(m) => m.with_theme(opts.theme()),
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };
    if system {
        monitor = monitor.with_system_probe(Box::new(HostProbe));
    }
    if let Some(path) = checks_path {
        match load_checks(Path::new(path)) {
            Ok(checks) => monitor.add_health_checks(checks),
            Err(e) => {
                eprintln!("Error reading health checks '{path}': {e}");
                std::process::exit(1);
            }
        }
    }

    for result in &results {
        if let Some(target) = &result.target {
            monitor.register(&result.job_id, target);
        }
        monitor.report_memory(&result.job_id, result.memory_delta_bytes);
        monitor.report_result(&result.job_id, result.records, result.elapsed_seconds);
    }
    log::info!("loaded {} job results", results.len());

    print!("{}", monitor.render_report());
    append_log(opts.log_path, &monitor.snapshot());
}
