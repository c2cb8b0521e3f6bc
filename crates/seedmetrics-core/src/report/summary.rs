use super::ReportRenderer;
use crate::format::{
    format_bytes_delta, format_count, format_duration, format_number, format_rate,
};
use crate::markup::{self, Color};
use crate::record::short_name;
use crate::snapshot::{AggregateSnapshot, JobRate};

impl ReportRenderer {
    /// Headline numbers. Always rendered, even for an empty run.
    pub fn summary(&self, s: &AggregateSnapshot) -> String {
        let mut out = self.header("Summary");

        out.push_str(&self.pair(
            "Execution time",
            &markup::escape(&format_duration(s.total_time)),
        ));

        let per_record = s
            .ms_per_record()
            .map(|ms| format!(" ({} ms/record)", format_number(ms, 2)))
            .unwrap_or_default();
        out.push_str(&self.pair(
            "Total records",
            &markup::escape(&format!("{}{per_record}", format_count(s.total_records))),
        ));
        out.push_str(&self.pair(
            "Jobs",
            &format!("{} ({} with records)", s.job_count, s.active_job_count),
        ));
        out.push_str(&self.pair("Overall rate", &markup::escape(&format_rate(s.overall_rate))));
        out.push_str(&self.pair(
            "Overall rating",
            &markup::paint(
                &format!(
                    "{} {}",
                    self.theme.rating_icon(s.overall_rating),
                    s.overall_rating.label()
                ),
                s.overall_rating.color(),
            ),
        ));
        out.push_str(&self.pair("Fastest job", &job_rate(s.fastest.as_ref(), Color::Green)));
        out.push_str(&self.pair("Slowest job", &job_rate(s.slowest.as_ref(), Color::Yellow)));
        out.push_str(&self.pair(
            "Speed variance",
            &markup::escape(&format!("{}%", format_number(s.speed_variance_ratio, 1))),
        ));

        if s.total_memory_delta_bytes != 0 || s.peak_memory.as_ref().is_some_and(|p| p.bytes != 0) {
            out.push_str(&self.pair(
                "Memory delta",
                &format!(
                    "{} ({})",
                    markup::escape(&format_bytes_delta(s.total_memory_delta_bytes)),
                    markup::paint(
                        s.overall_memory_rating.label(),
                        s.overall_memory_rating.color()
                    ),
                ),
            ));
            if let Some(peak) = &s.peak_memory {
                out.push_str(&self.pair(
                    "Peak memory job",
                    &markup::escape(&format!(
                        "{} ({})",
                        short_name(&peak.job_id),
                        format_bytes_delta(peak.bytes)
                    )),
                ));
            }
        }
        out
    }
}

fn job_rate(job: Option<&JobRate>, color: Color) -> String {
    match job {
        Some(j) => format!(
            "{} ({})",
            markup::paint(short_name(&j.job_id), color),
            markup::escape(&format_rate(j.rate))
        ),
        None => markup::paint("n/a", Color::Gray),
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::{records, renderer, snapshot};

    #[test]
    fn scenario_numbers_are_reported() {
        let recs = records(&[("A", 1000, 0.5), ("B", 100, 1.0), ("C", 0, 0.0)]);
        let out = renderer(60).summary(&snapshot(&recs));
        assert!(out.contains("1,100 (1.36 ms/record)"));
        assert!(out.contains("3 (2 with records)"));
        assert!(out.contains("A (2,000.0 rec/s)"));
        assert!(out.contains("B (100.0 rec/s)"));
        assert!(out.contains("1,900.0%"));
        assert!(out.contains("1.50 sec"));
        // every line is exactly the configured width
        for line in out.lines().skip(1) {
            assert_eq!(line.chars().count(), 60, "{line:?}");
        }
    }

    #[test]
    fn empty_snapshot_uses_placeholders() {
        let out = renderer(60).summary(&Default::default());
        assert!(out.contains("n/a"));
        assert!(out.contains("0.0 rec/s"));
        assert!(out.contains("N/A"));
        assert!(!out.contains("Memory delta"));
    }

    #[test]
    fn memory_lines_appear_with_memory_data() {
        let mut recs = records(&[("A", 1000, 1.0)]);
        recs[0].apply_memory(2048, &Default::default());
        let out = renderer(60).summary(&snapshot(&recs));
        assert!(out.contains("+2.00 KiB (Efficient)"));
        assert!(out.contains("Peak memory job"));
    }
}
