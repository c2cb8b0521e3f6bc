//! Externally computed health check results.
//!
//! The checks themselves (database ping, disk space, ...) run outside this
//! crate; the report only groups and formats what it is handed.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{ReportError, Result};
use crate::markup::Color;

/// Outcome of one check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Ok,
    Warning,
    Error,
}

impl Severity {
    pub fn key(self) -> &'static str {
        match self {
            Self::Ok => "ok",
            Self::Warning => "warning",
            Self::Error => "error",
        }
    }

    pub fn color(self) -> Color {
        match self {
            Self::Ok => Color::Green,
            Self::Warning => Color::Yellow,
            Self::Error => Color::Red,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for Severity {
    type Err = ReportError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ok" | "pass" => Ok(Self::Ok),
            "warning" | "warn" => Ok(Self::Warning),
            "error" | "fail" => Ok(Self::Error),
            other => Err(ReportError::config(format!("unknown severity '{other}'"))),
        }
    }
}

/// One pre-computed check result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthCheck {
    #[serde(default = "default_category")]
    pub category: String,
    pub name: String,
    pub severity: Severity,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recommendation: Option<String>,
}

fn default_category() -> String {
    "General".to_string()
}

impl HealthCheck {
    pub fn new(
        category: impl Into<String>,
        name: impl Into<String>,
        severity: Severity,
        message: impl Into<String>,
    ) -> Self {
        Self {
            category: category.into(),
            name: name.into(),
            severity,
            message: message.into(),
            detail: None,
            recommendation: None,
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    pub fn with_recommendation(mut self, recommendation: impl Into<String>) -> Self {
        self.recommendation = Some(recommendation.into());
        self
    }
}

/// Pass/warn/fail counts over a set of checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct HealthTally {
    pub passed: usize,
    pub warnings: usize,
    pub failed: usize,
}

impl HealthTally {
    pub fn from_checks(checks: &[HealthCheck]) -> Self {
        let mut tally = Self::default();
        for check in checks {
            match check.severity {
                Severity::Ok => tally.passed += 1,
                Severity::Warning => tally.warnings += 1,
                Severity::Error => tally.failed += 1,
            }
        }
        tally
    }

    pub fn total(&self) -> usize {
        self.passed + self.warnings + self.failed
    }

    /// Worst severity seen, `Ok` when empty.
    pub fn worst(&self) -> Severity {
        if self.failed > 0 {
            Severity::Error
        } else if self.warnings > 0 {
            Severity::Warning
        } else {
            Severity::Ok
        }
    }
}

/// Checks grouped by category, categories in first-seen order.
pub fn group_by_category(checks: &[HealthCheck]) -> Vec<(&str, Vec<&HealthCheck>)> {
    let mut groups: Vec<(&str, Vec<&HealthCheck>)> = Vec::new();
    for check in checks {
        match groups.iter_mut().find(|(cat, _)| *cat == check.category) {
            Some((_, items)) => items.push(check),
            None => groups.push((check.category.as_str(), vec![check])),
        }
    }
    groups
}

/// Parse a JSON array of checks.
pub fn checks_from_json(raw: &str) -> Result<Vec<HealthCheck>> {
    serde_json::from_str(raw)
        .map_err(|e| ReportError::Parse(format!("failed to parse health checks: {e}")))
}

/// Load a JSON array of checks from disk.
pub fn load_checks(path: &Path) -> Result<Vec<HealthCheck>> {
    let raw = std::fs::read_to_string(path)?;
    checks_from_json(&raw)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Vec<HealthCheck> {
        vec![
            HealthCheck::new("Database", "connection", Severity::Ok, "reachable"),
            HealthCheck::new("System", "disk", Severity::Warning, "82% used")
                .with_recommendation("free up space"),
            HealthCheck::new("Database", "migrations", Severity::Error, "2 pending"),
        ]
    }

    #[test]
    fn severity_keys() {
        assert_eq!("ok".parse::<Severity>().unwrap(), Severity::Ok);
        assert_eq!("WARN".parse::<Severity>().unwrap(), Severity::Warning);
        assert_eq!("fail".parse::<Severity>().unwrap(), Severity::Error);
        assert!(matches!(
            "critical".parse::<Severity>(),
            Err(ReportError::Configuration(_))
        ));
    }

    #[test]
    fn tally_counts_each_severity() {
        let tally = HealthTally::from_checks(&sample());
        assert_eq!(tally.passed, 1);
        assert_eq!(tally.warnings, 1);
        assert_eq!(tally.failed, 1);
        assert_eq!(tally.total(), 3);
        assert_eq!(tally.worst(), Severity::Error);
        assert_eq!(HealthTally::default().worst(), Severity::Ok);
    }

    #[test]
    fn grouping_keeps_first_seen_order() {
        let checks = sample();
        let groups = group_by_category(&checks);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].0, "Database");
        assert_eq!(groups[0].1.len(), 2);
        assert_eq!(groups[1].0, "System");
    }

    #[test]
    fn json_checks() {
        let checks = checks_from_json(
            r#"[{"name": "ping", "severity": "ok", "message": "fine"},
                {"category": "Disk", "name": "space", "severity": "error",
                 "message": "full", "detail": "/var at 99%"}]"#,
        )
        .unwrap();
        assert_eq!(checks[0].category, "General");
        assert_eq!(checks[1].detail.as_deref(), Some("/var at 99%"));
        assert!(matches!(
            checks_from_json(r#"[{"name": "x"}]"#),
            Err(ReportError::Parse(_))
        ));
    }
}
