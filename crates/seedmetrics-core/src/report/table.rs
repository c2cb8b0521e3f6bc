use super::ReportRenderer;
use crate::format::{format_bytes_delta, format_count, format_duration, format_rate};
use crate::layout::Align;
use crate::markup::{self, Color};
use crate::record::MetricRecord;

const RANKED: usize = 3;
const RANK_WIDTH: usize = 4;
/// Narrowest the job column gets before optional columns are dropped.
const MIN_NAME: usize = 8;

/// Colour bands by table position, best to worst.
const BANDS: [Color; 5] = [
    Color::BrightGreen,
    Color::Green,
    Color::Yellow,
    Color::BrightRed,
    Color::Red,
];

/// Band colour of row `position` in a table of `rows` rows.
pub(crate) fn band_color(position: usize, rows: usize) -> Color {
    if rows == 0 {
        return BANDS[0];
    }
    BANDS[(position * BANDS.len() / rows).min(BANDS.len() - 1)]
}

/// Every job, fastest first; equal rates keep registration order.
pub(crate) fn ranked_all(records: &[MetricRecord]) -> Vec<&MetricRecord> {
    let mut all: Vec<&MetricRecord> = records.iter().collect();
    all.sort_by(|a, b| b.rate.total_cmp(&a.rate));
    all
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Column {
    Job,
    Records,
    Time,
    Rate,
    Rating,
    Memory,
}

impl Column {
    const ALL: [Column; 6] = [
        Column::Job,
        Column::Records,
        Column::Time,
        Column::Rate,
        Column::Rating,
        Column::Memory,
    ];

    fn title(self) -> &'static str {
        match self {
            Self::Job => "Job",
            Self::Records => "Records",
            Self::Time => "Time",
            Self::Rate => "Rate",
            Self::Rating => "Rating",
            Self::Memory => "Memory",
        }
    }

    fn align(self) -> Align {
        match self {
            Self::Records | Self::Time | Self::Rate => Align::Right,
            _ => Align::Left,
        }
    }
}

/// One table row before layout: text and colour per column.
struct Row {
    rank: String,
    cells: [(String, Option<Color>); 6],
}

/// Column widths for a line of `line_width`, and the columns that still fit.
///
/// Memory goes first, then the job column narrows to [`MIN_NAME`], then time
/// and record count go. Rate and rating are always kept.
fn fit_columns(mut widths: [usize; 6], line_width: usize) -> ([usize; 6], Vec<Column>) {
    let mut shown = Column::ALL.to_vec();
    let total = |widths: &[usize; 6], shown: &[Column]| {
        RANK_WIDTH + shown.iter().map(|&c| widths[c as usize]).sum::<usize>() + shown.len() - 1
    };
    let name = Column::Job as usize;

    for step in [Column::Memory, Column::Job, Column::Time, Column::Records, Column::Job] {
        let over = total(&widths, &shown).saturating_sub(line_width);
        if over == 0 {
            break;
        }
        if step == Column::Job {
            let floor = if shown.contains(&Column::Time) { MIN_NAME } else { 1 };
            widths[name] = widths[name].saturating_sub(over).max(floor.min(widths[name]));
        } else {
            shown.retain(|&c| c != step);
        }
    }
    (widths, shown)
}

impl ReportRenderer {
    /// All jobs, including those that produced nothing. Empty for an empty run.
    ///
    /// Columns are sized to their contents; on narrow lines the optional ones
    /// are dropped so that every row still shows its rate and rating.
    pub fn detailed_table(&self, records: &[MetricRecord]) -> String {
        if records.is_empty() {
            return String::new();
        }
        let ranked = ranked_all(records);
        let count = ranked.len();
        let rows: Vec<Row> = ranked
            .into_iter()
            .enumerate()
            .map(|(position, record)| self.table_row(position, count, record))
            .collect();

        let mut widths = Column::ALL.map(|c| c.title().chars().count());
        for row in &rows {
            for (w, (text, _)) in widths.iter_mut().zip(&row.cells) {
                *w = (*w).max(text.chars().count());
            }
        }
        let name = Column::Job as usize;
        widths[name] = widths[name].min(self.display.name_width);
        let (widths, shown) = fit_columns(widths, self.layout.width());

        let mut out = self.header("Detailed Results");
        let mut head = self.col("", RANK_WIDTH, None, Align::Left);
        for (i, &c) in shown.iter().enumerate() {
            if i > 0 {
                head.push(' ');
            }
            head.push_str(&self.col(c.title(), widths[c as usize], None, c.align()));
        }
        out.push_str(&self.fit(&markup::bold(markup::strip(&head).trim_end())));
        out.push('\n');

        for row in rows {
            let name_color = row.cells[name].1;
            let mut line = self.col(&row.rank, RANK_WIDTH, name_color, Align::Left);
            for (i, &c) in shown.iter().enumerate() {
                if i > 0 {
                    line.push(' ');
                }
                let (text, color) = &row.cells[c as usize];
                line.push_str(&self.col(text, widths[c as usize], *color, c.align()));
            }
            out.push_str(&self.fit(line.trim_end()));
            out.push('\n');
        }
        out
    }

    fn table_row(&self, position: usize, rows: usize, record: &MetricRecord) -> Row {
        let rank = if position < RANKED && record.is_active() {
            format!("#{}", position + 1)
        } else {
            String::new()
        };
        let name_color = if record.is_active() {
            band_color(position, rows)
        } else {
            Color::Gray
        };
        let rating = format!(
            "{} {}",
            self.theme.rating_icon(record.rating),
            record.rating.label()
        );
        let memory = if record.memory_delta_bytes == 0 && !record.memory_rating.is_heavy() {
            "-".to_string()
        } else {
            format!(
                "{} {}",
                format_bytes_delta(record.memory_delta_bytes),
                record.memory_rating.label()
            )
        };
        Row {
            rank,
            cells: [
                (record.short_name().to_string(), Some(name_color)),
                (format_count(record.records_added), None),
                (format_duration(record.elapsed_seconds), None),
                (format_rate(record.rate), None),
                (rating, Some(record.rating.color())),
                (memory, Some(record.memory_rating.color())),
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::{records, renderer};
    use super::*;

    #[test]
    fn bands_cover_five_tiers() {
        let colors: Vec<Color> = (0..10).map(|p| band_color(p, 10)).collect();
        assert_eq!(colors[0], Color::BrightGreen);
        assert_eq!(colors[2], Color::Green);
        assert_eq!(colors[9], Color::Red);
        assert_eq!(band_color(0, 1), Color::BrightGreen);
        assert_eq!(band_color(0, 0), Color::BrightGreen);
    }

    #[test]
    fn includes_idle_jobs_last() {
        let recs = records(&[("Idle", 0, 0.0), ("Slow", 50, 1.0), ("Fast", 5000, 1.0)]);
        let out = renderer(146).detailed_table(&recs);
        let rows: Vec<&str> = out.lines().skip(3).collect();
        assert_eq!(rows.len(), 3);
        assert!(rows[0].starts_with("#1  Fast"));
        assert!(rows[1].starts_with("#2  Slow"));
        assert!(rows[2].starts_with("    Idle"));
        assert!(rows[2].contains("N/A"));
        assert!(rows[0].contains("5,000"));
        assert!(rows[0].contains("Excellent"));
    }

    #[test]
    fn only_top_three_are_ranked() {
        let recs = records(&[
            ("a", 400, 1.0),
            ("b", 300, 1.0),
            ("c", 200, 1.0),
            ("d", 100, 1.0),
        ]);
        let out = renderer(146).detailed_table(&recs);
        let rows: Vec<&str> = out.lines().skip(3).collect();
        assert!(rows[2].starts_with("#3"));
        assert!(rows[3].starts_with("    d"));
    }

    #[test]
    fn header_names_columns() {
        let out = renderer(146).detailed_table(&records(&[("a", 1, 1.0)]));
        let head = out.lines().nth(2).unwrap();
        for col in ["Job", "Records", "Time", "Rate", "Rating", "Memory"] {
            assert!(head.contains(col));
        }
    }

    #[test]
    fn rate_and_rating_survive_narrow_lines() {
        let mut recs = records(&[
            ("AVeryLongUserAccountsTableSeeder", 5000, 1.0),
            ("Orders", 50, 1.0),
            ("Idle", 0, 0.0),
        ]);
        recs[0].memory_delta_bytes = 80 * 1024 * 1024;
        for width in [40, 80, 100] {
            let out = renderer(width).detailed_table(&recs);
            let rows: Vec<&str> = out.lines().skip(3).collect();
            assert!(rows[0].contains("5,000.0 rec/s"), "width {width}: {:?}", rows[0]);
            assert!(rows[0].contains("Excellent"), "width {width}: {:?}", rows[0]);
            assert!(rows[1].contains("50.0 rec/s"));
            assert!(rows[1].contains("Slow"));
            assert!(rows[2].contains("N/A"));
            for line in out.lines() {
                assert!(line.chars().count() <= width);
            }
        }
    }

    #[test]
    fn optional_columns_drop_in_order() {
        // rank 4 + job 8 + records 7 + time 9 + rate 13 + rating 11 + memory 6 + 5 gaps
        let widths = [8, 7, 9, 13, 11, 6];
        let (_, shown) = fit_columns(widths, 63);
        assert_eq!(shown.len(), 6);
        let (_, shown) = fit_columns(widths, 62);
        assert!(!shown.contains(&Column::Memory));
        let (w, shown) = fit_columns([30, 7, 9, 13, 11, 6], 60);
        assert_eq!(shown.len(), 5);
        assert_eq!(w[Column::Job as usize], 12);
        let (w, shown) = fit_columns(widths, 40);
        assert_eq!(shown, vec![Column::Job, Column::Rate, Column::Rating]);
        assert_eq!(w[Column::Job as usize], 8);
    }

    #[test]
    fn empty_run_has_no_table() {
        assert_eq!(renderer(80).detailed_table(&[]), "");
    }
}
