use super::ReportRenderer;
use crate::format::format_bytes;
use crate::health::{HealthCheck, HealthTally, Severity, group_by_category};
use crate::layout::Segment;
use crate::markup::{self, Color};
use crate::probe::SystemInfo;

const UNKNOWN: &str = "unknown";

fn or_unknown<T>(value: Option<T>, f: impl FnOnce(T) -> String) -> String {
    value.map(f).unwrap_or_else(|| UNKNOWN.to_string())
}

impl ReportRenderer {
    /// Host facts and externally supplied health checks, grouped by category.
    ///
    /// Empty when there is neither host information nor any check.
    pub fn system_info(&self, system: Option<&SystemInfo>, checks: &[HealthCheck]) -> String {
        if system.is_none() && checks.is_empty() {
            return String::new();
        }
        let mut out = self.header("System Information");

        match system {
            Some(info) => {
                out.push_str(&self.pair(
                    "Platform",
                    &markup::escape(&format!("{} ({})", info.os, info.arch)),
                ));
                out.push_str(&self.pair("CPUs", &or_unknown(info.cpu_count, |n| n.to_string())));
                out.push_str(&self.pair(
                    "Load average",
                    &or_unknown(info.loadavg_1m, |l1| {
                        let rest = |v: Option<f64>| or_unknown(v, |x| format!("{x:.2}"));
                        format!(
                            "{l1:.2} / {} / {}",
                            rest(info.loadavg_5m),
                            rest(info.loadavg_15m)
                        )
                    }),
                ));
                out.push_str(&self.pair(
                    "Process memory",
                    &or_unknown(info.process_memory_bytes, |b| format_bytes(b as f64)),
                ));
                out.push_str(&self.pair(
                    "Terminal width",
                    &or_unknown(info.terminal_width, |w| format!("{w} columns")),
                ));
            }
            None => out.push_str(&self.pair("Host", &markup::paint(UNKNOWN, Color::Gray))),
        }

        if checks.is_empty() {
            return out;
        }
        for (category, items) in group_by_category(checks) {
            out.push('\n');
            out.push_str(&self.fit(&markup::bold(category)));
            out.push('\n');
            for check in items {
                out.push_str(&self.check_lines(check));
            }
        }

        let tally = HealthTally::from_checks(checks);
        out.push('\n');
        out.push_str(&self.fit(&format!(
            "Health: {}, {}, {}",
            markup::paint(&format!("{} passed", tally.passed), Severity::Ok.color()),
            markup::paint(
                &format!(
                    "{} {}",
                    tally.warnings,
                    if tally.warnings == 1 { "warning" } else { "warnings" }
                ),
                Severity::Warning.color()
            ),
            markup::paint(&format!("{} failed", tally.failed), Severity::Error.color()),
        )));
        out.push('\n');
        out
    }

    fn check_lines(&self, check: &HealthCheck) -> String {
        let color = check.severity.color();
        let name = format!(
            "  {} {}",
            markup::paint(&self.theme.severity_icon(check.severity).to_string(), color),
            markup::escape(&check.name)
        );
        let mut out = self
            .layout
            .format_line(&[Segment::plain(name), Segment::colored(markup::escape(&check.message), color)]);
        out.push('\n');
        for (prefix, text) in [("", check.detail.as_deref()), ("-> ", check.recommendation.as_deref())] {
            let Some(text) = text else {
                continue;
            };
            let indent = 6usize;
            let width = self.layout.width().saturating_sub(indent + prefix.len());
            for line in super::wrap(text, width) {
                out.push_str(&self.fit(&format!(
                    "{}{}",
                    " ".repeat(indent),
                    markup::paint(&format!("{prefix}{line}"), Color::Gray)
                )));
                out.push('\n');
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::renderer;
    use super::*;

    fn info() -> SystemInfo {
        SystemInfo {
            os: "linux".into(),
            arch: "x86_64".into(),
            cpu_count: Some(8),
            loadavg_1m: Some(0.5),
            loadavg_5m: None,
            loadavg_15m: Some(0.25),
            process_memory_bytes: None,
            terminal_width: Some(120),
        }
    }

    #[test]
    fn nothing_to_show() {
        assert_eq!(renderer(80).system_info(None, &[]), "");
    }

    #[test]
    fn missing_values_render_unknown() {
        let out = renderer(80).system_info(Some(&info()), &[]);
        assert!(out.contains("linux (x86_64)"));
        assert!(out.contains("0.50 / unknown / 0.25"));
        assert!(out.lines().any(|l| l.starts_with("Process memory") && l.ends_with(UNKNOWN)));
        assert!(out.contains("120 columns"));
        assert!(!out.contains("Health:"));
    }

    #[test]
    fn checks_are_grouped_and_tallied() {
        let checks = vec![
            HealthCheck::new("Database", "connection", Severity::Ok, "reachable"),
            HealthCheck::new("Disk", "space", Severity::Warning, "85% used")
                .with_detail("/var/lib/mysql")
                .with_recommendation("free some space before the next run"),
            HealthCheck::new("Database", "migrations", Severity::Error, "2 pending"),
        ];
        let out = renderer(80).system_info(None, &checks);
        assert!(out.contains("Host"));
        let db = out.find("\nDatabase\n").unwrap();
        let disk = out.find("\nDisk\n").unwrap();
        assert!(db < disk);
        // both database checks come before the disk category
        assert!(out.find("migrations").unwrap() < disk);
        assert!(out.contains("      /var/lib/mysql"));
        assert!(out.contains("      -> free some space"));
        assert!(out.contains("Health: 1 passed, 1 warning, 1 failed"));
        for line in out.lines() {
            assert!(line.chars().count() <= 80);
        }
    }
}
