use super::ReportRenderer;
use crate::format::format_rate;
use crate::layout::Align;
use crate::record::MetricRecord;

/// Bar columns kept before the name column gives up its last characters.
const MIN_BAR: usize = 10;

/// Active jobs by rate, fastest first; equal rates keep registration order.
pub(crate) fn ranked_active(records: &[MetricRecord]) -> Vec<&MetricRecord> {
    let mut active: Vec<&MetricRecord> = records.iter().filter(|r| r.is_active()).collect();
    active.sort_by(|a, b| b.rate.total_cmp(&a.rate));
    active
}

impl ReportRenderer {
    /// Horizontal bar chart of the fastest jobs. Needs at least two jobs with records.
    pub fn top_chart(&self, records: &[MetricRecord]) -> String {
        let ranked = ranked_active(records);
        if ranked.len() < 2 {
            return String::new();
        }
        let max_rate = ranked[0].rate;
        if max_rate <= 0.0 {
            log::warn!("top chart skipped: no job has a positive rate");
            return String::new();
        }

        let top: Vec<&MetricRecord> = ranked.into_iter().take(self.display.top_n).collect();
        let rates: Vec<String> = top.iter().map(|r| format_rate(r.rate)).collect();
        let rate_width = rates.iter().map(|r| r.chars().count()).max().unwrap_or(0);
        let longest_name = top
            .iter()
            .map(|r| r.short_name().chars().count())
            .max()
            .unwrap_or(0);

        // name gives way first, then the bar; the rate column is never cut
        let room = self.layout.width().saturating_sub(rate_width + 2);
        let name_width = self
            .display
            .name_width
            .min(longest_name)
            .min(room.saturating_sub(MIN_BAR))
            .max(1);
        let max_chars = self
            .display
            .chart_bar_chars
            .min(room.saturating_sub(name_width))
            .max(1);

        let mut out = self.header(&format!("Top {} Fastest Jobs", top.len()));
        for (record, rate) in top.into_iter().zip(&rates) {
            let len = ((record.rate / max_rate) * max_chars as f64).round() as usize;
            let len = if record.rate > 0.0 { len.clamp(1, max_chars) } else { 0 };
            let bar: String = std::iter::repeat_n(self.theme.bar_full, len).collect();
            let row = format!(
                "{} {} {}",
                self.col(record.short_name(), name_width, None, Align::Left),
                self.col(&bar, max_chars, Some(record.rating.color()), Align::Left),
                self.col(rate, rate_width, None, Align::Right),
            );
            out.push_str(&self.fit(&row));
            out.push('\n');
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::{records, renderer};
    use super::*;

    #[test]
    fn needs_two_active_jobs() {
        let r = renderer(140);
        assert_eq!(r.top_chart(&records(&[("A", 10, 1.0)])), "");
        assert_eq!(r.top_chart(&records(&[("A", 10, 1.0), ("B", 0, 0.0)])), "");
        assert!(!r.top_chart(&records(&[("A", 10, 1.0), ("B", 5, 1.0)])).is_empty());
    }

    #[test]
    fn top_five_by_rate_descending() {
        let recs = records(&[
            ("r10", 10, 1.0),
            ("r70", 70, 1.0),
            ("r30", 30, 1.0),
            ("r60", 60, 1.0),
            ("r20", 20, 1.0),
            ("r50", 50, 1.0),
        ]);
        let out = renderer(140).top_chart(&recs);
        let names: Vec<&str> = out
            .lines()
            .skip(2)
            .map(|l| l.split_whitespace().next().unwrap())
            .collect();
        assert_eq!(names, vec!["r70", "r60", "r50", "r30", "r20"]);
        assert!(out.starts_with("Top 5 Fastest Jobs"));
    }

    #[test]
    fn bars_scale_to_the_fastest() {
        let recs = records(&[("fast", 200, 1.0), ("half", 100, 1.0)]);
        let out = renderer(140).top_chart(&recs);
        let rows: Vec<&str> = out.lines().skip(2).collect();
        assert_eq!(rows[0].matches('#').count(), 60);
        assert_eq!(rows[1].matches('#').count(), 30);
        assert!(rows[0].trim_end().ends_with("200.0 rec/s"));
    }

    #[test]
    fn ties_keep_registration_order() {
        let recs = records(&[("first", 100, 1.0), ("second", 100, 1.0)]);
        let ranked = ranked_active(&recs);
        assert_eq!(ranked[0].job_id, "first");
    }

    #[test]
    fn narrow_lines_keep_the_rate() {
        let recs = records(&[
            ("DatabaseSeederWithAVeryLongName", 200, 1.0),
            ("half", 100, 1.0),
        ]);
        for width in [40, 80, 100] {
            let out = renderer(width).top_chart(&recs);
            let rows: Vec<&str> = out.lines().skip(2).collect();
            assert!(rows[0].ends_with("200.0 rec/s"), "width {width}: {:?}", rows[0]);
            assert!(rows[1].ends_with("100.0 rec/s"), "width {width}: {:?}", rows[1]);
            assert!(rows[1].contains('#'));
            for line in out.lines() {
                assert!(line.chars().count() <= width);
            }
        }
    }

    #[test]
    fn bar_takes_the_width_left_over() {
        let recs = records(&[("fast", 200, 1.0), ("half", 100, 1.0)]);
        let rows: Vec<String> = renderer(60)
            .top_chart(&recs)
            .lines()
            .skip(2)
            .map(str::to_string)
            .collect();
        assert!(rows[0].starts_with("fast "));
        assert_eq!(rows[0].matches('#').count(), 60 - 11 - 2 - 4);
    }
}
