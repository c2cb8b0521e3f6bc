use super::ReportRenderer;
use crate::format::format_percent;
use crate::layout::Align;
use crate::markup;
use crate::rating::Rating;
use crate::snapshot::AggregateSnapshot;

const LABEL_WIDTH: usize = 12;

/// Bar length for `count` out of `total`, scaled to `max_chars`.
pub(crate) fn bar_length(count: usize, total: usize, max_chars: usize) -> usize {
    if total == 0 {
        return 0;
    }
    ((count as f64 / total as f64) * max_chars as f64).round() as usize
}

impl ReportRenderer {
    /// One proportional bar per non-empty rating bucket. Empty without active jobs.
    pub fn distribution(&self, s: &AggregateSnapshot) -> String {
        let total = s.distribution.active_total();
        if total == 0 {
            return String::new();
        }
        let rows: Vec<(Rating, usize, String)> = Rating::ACTIVE
            .into_iter()
            .map(|rating| (rating, s.distribution.get(rating)))
            .filter(|&(_, count)| count > 0)
            .map(|(rating, count)| {
                let stats = format!(
                    "{} ({} {})",
                    format_percent(count as f64 / total as f64 * 100.0),
                    count,
                    if count == 1 { "seeder" } else { "seeders" }
                );
                (rating, count, stats)
            })
            .collect();

        // the bar gives up columns so the percentage always shows
        let stats_width = rows
            .iter()
            .map(|(_, _, stats)| stats.chars().count())
            .max()
            .unwrap_or(0);
        let max_chars = self
            .display
            .distribution_bar_chars
            .min(
                self.layout
                    .width()
                    .saturating_sub(LABEL_WIDTH + stats_width + 2),
            )
            .max(1);

        let mut out = self.header("Performance Distribution");
        for (rating, count, stats) in rows {
            let len = bar_length(count, total, max_chars);
            let label = format!("{} {}", self.theme.rating_icon(rating), rating.label());
            let bar: String = std::iter::repeat_n(self.theme.bar_full, len).collect();
            let row = format!(
                "{} {} {}",
                self.col(&label, LABEL_WIDTH, Some(rating.color()), Align::Left),
                self.col(&bar, max_chars, Some(rating.color()), Align::Left),
                markup::escape(&stats),
            );
            out.push_str(&self.fit(&row));
            out.push('\n');
        }
        out
    }
}
