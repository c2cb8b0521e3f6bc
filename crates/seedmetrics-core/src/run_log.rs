//! Append-only run log: one `[YYYY-MM-DD HH:MM:SS] message` line per call.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDateTime};

use crate::error::Result;
use crate::format::{format_count, format_duration, format_rate};
use crate::snapshot::AggregateSnapshot;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Log file written by the caller at the end of a run.
#[derive(Debug, Clone)]
pub struct RunLog {
    path: PathBuf,
}

impl RunLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append `message` stamped with the local time. Creates the file if missing.
    pub fn append(&self, message: &str) -> Result<()> {
        self.append_at(Local::now().naive_local(), message)
    }

    pub fn append_at(&self, at: NaiveDateTime, message: &str) -> Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.write_all(format_entry(at, message).as_bytes())?;
        Ok(())
    }
}

/// One log line. Embedded line breaks are folded into ` | `.
pub fn format_entry(at: NaiveDateTime, message: &str) -> String {
    let folded = message
        .lines()
        .map(str::trim_end)
        .filter(|l| !l.trim().is_empty())
        .collect::<Vec<_>>()
        .join(" | ");
    format!("[{}] {folded}\n", at.format(TIMESTAMP_FORMAT))
}

/// Single-line digest of a run for the log.
pub fn summary_message(s: &AggregateSnapshot) -> String {
    format!(
        "Seeded {} records in {} ({}, {}) across {} jobs",
        format_count(s.total_records),
        format_duration(s.total_time),
        format_rate(s.overall_rate),
        s.overall_rating.label(),
        s.job_count,
    )
}
