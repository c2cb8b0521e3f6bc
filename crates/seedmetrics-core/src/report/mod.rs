//! Final console report.
//!
//! The report is a title block, the summary (always present) and the optional
//! sections of [`SectionConfig`], in [`Section::ALL`] order. A section that
//! has nothing to show renders as an empty string and is skipped; no input,
//! however sparse, makes rendering fail.

mod chart;
mod distribution;
mod recommendations;
mod summary;
mod system;
mod table;

use crate::aggregator::MetricsAggregator;
use crate::config::{DisplayConfig, ReportConfig, Section, SectionConfig};
use crate::error::Result;
use crate::health::HealthCheck;
use crate::layout::{Align, LayoutEngine, Segment};
use crate::markup::{self, Color};
use crate::probe::SystemInfo;
use crate::record::MetricRecord;
use crate::recommend::RecommendationEngine;
use crate::snapshot::AggregateSnapshot;
use crate::theme::Theme;

pub const REPORT_TITLE: &str = "SEEDING PERFORMANCE REPORT";

/// Everything a report is rendered from.
#[derive(Debug, Clone, Copy)]
pub struct ReportInput<'a> {
    pub records: &'a [MetricRecord],
    pub snapshot: &'a AggregateSnapshot,
    pub system: Option<&'a SystemInfo>,
    pub checks: &'a [HealthCheck],
}

impl<'a> ReportInput<'a> {
    pub fn new(records: &'a [MetricRecord], snapshot: &'a AggregateSnapshot) -> Self {
        Self {
            records,
            snapshot,
            system: None,
            checks: &[],
        }
    }

    pub fn with_system(mut self, system: Option<&'a SystemInfo>) -> Self {
        self.system = system;
        self
    }

    pub fn with_checks(mut self, checks: &'a [HealthCheck]) -> Self {
        self.checks = checks;
        self
    }
}

/// Composes the report sections into one string.
#[derive(Debug, Clone)]
pub struct ReportRenderer {
    layout: LayoutEngine,
    theme: Theme,
    display: DisplayConfig,
    sections: SectionConfig,
    recommender: RecommendationEngine,
}

impl ReportRenderer {
    /// Renderer for a validated `config`. Invalid configuration is fatal here.
    pub fn new(config: &ReportConfig) -> Result<Self> {
        config.validate()?;
        let layout = LayoutEngine::new(config.display.line_width)?
            .with_filler(config.display.filler)
            .styled(config.display.styling);
        Ok(Self {
            layout,
            theme: Theme::default(),
            display: config.display.clone(),
            sections: config.sections,
            recommender: RecommendationEngine::default(),
        })
    }

    pub fn with_theme(mut self, theme: Theme) -> Self {
        self.set_theme(theme);
        self
    }

    pub fn set_theme(&mut self, theme: Theme) {
        self.theme = theme;
    }

    pub fn with_sections(mut self, sections: SectionConfig) -> Self {
        self.sections = sections;
        self
    }

    pub fn with_recommendation_engine(mut self, engine: RecommendationEngine) -> Self {
        self.recommender = engine;
        self
    }

    pub fn sections(&self) -> &SectionConfig {
        &self.sections
    }

    pub fn layout(&self) -> &LayoutEngine {
        &self.layout
    }

    pub fn theme(&self) -> &Theme {
        &self.theme
    }

    /// Full report text.
    pub fn render(&self, input: &ReportInput<'_>) -> String {
        let mut parts = vec![self.title(), self.summary(input.snapshot)];
        for section in Section::ALL {
            if !self.sections.is_enabled(section) {
                continue;
            }
            let body = self.render_section(section, input);
            if body.is_empty() {
                log::debug!("section '{section}' has nothing to show");
                continue;
            }
            parts.push(body);
        }
        parts.push(self.heavy_rule());
        parts.join("\n")
    }

    /// Report over everything an aggregator holds, without host information.
    pub fn render_aggregator(&self, aggregator: &MetricsAggregator) -> String {
        let snapshot = aggregator.snapshot();
        self.render(&ReportInput::new(aggregator.records(), &snapshot))
    }

    /// One optional section on its own; empty when it has nothing to show.
    pub fn render_section(&self, section: Section, input: &ReportInput<'_>) -> String {
        match section {
            Section::PerformanceDistribution => self.distribution(input.snapshot),
            Section::PerformanceCharts => self.top_chart(input.records),
            Section::DetailedTable => self.detailed_table(input.records),
            Section::SystemInfo => self.system_info(input.system, input.checks),
            Section::Recommendations => self.recommendations(input.snapshot),
        }
    }

    // -----------------------------------------------------------------------
    // Shared building blocks
    // -----------------------------------------------------------------------

    fn title(&self) -> String {
        let title = self.cell(
            &markup::bold(REPORT_TITLE),
            self.layout.width(),
            Some(Color::Cyan),
            Align::Center,
        );
        format!("{}{title}\n{}", self.heavy_rule(), self.heavy_rule())
    }

    fn heavy_rule(&self) -> String {
        self.paint_rule(self.theme.heavy_rule, Color::Cyan) + "\n"
    }

    fn paint_rule(&self, ch: char, color: Color) -> String {
        self.layout
            .render_markup(&markup::paint(&self.layout.rule(ch), color))
    }

    /// Section title followed by a light rule.
    fn header(&self, title: &str) -> String {
        let title = self.fit(&markup::paint_markup(&markup::bold(title), Color::Cyan));
        format!("{title}\n{}\n", self.paint_rule(self.theme.light_rule, Color::Gray))
    }

    /// `label ........ value`, exactly one line wide.
    fn pair(&self, label: &str, value: &str) -> String {
        let mut line = self
            .layout
            .format_line(&[Segment::plain(markup::escape(label)), Segment::plain(value)]);
        line.push('\n');
        line
    }

    /// Fixed-width cell. Widths are validated positive, so failure only logs.
    fn cell(&self, text: &str, width: usize, color: Option<Color>, align: Align) -> String {
        self.layout
            .constant_width(text, width, color, None, align)
            .unwrap_or_else(|e| {
                log::warn!("cell degraded to empty: {e}");
                String::new()
            })
    }

    /// Plain `text` padded or cut to `width` columns, as markup for a row.
    fn col(&self, text: &str, width: usize, color: Option<Color>, align: Align) -> String {
        let len = text.chars().count();
        let shown: String = if len > width {
            text.chars().take(width).collect()
        } else {
            text.to_string()
        };
        let pad = width.saturating_sub(len);
        let (left, right) = match align {
            Align::Left => (0, pad),
            Align::Right => (pad, 0),
            Align::Center => (pad / 2, pad - pad / 2),
        };
        let body = match color {
            Some(c) => markup::paint(&shown, c),
            None => markup::escape(&shown),
        };
        format!("{}{body}{}", " ".repeat(left), " ".repeat(right))
    }

    /// Render a markup row, truncated to the line width if it is wider.
    fn fit(&self, row: &str) -> String {
        let spans = markup::parse(row);
        let spans = if markup::spans_width(&spans) > self.layout.width() {
            markup::truncate_spans(&spans, self.layout.width())
        } else {
            spans
        };
        markup::render_spans(&spans, self.layout.is_styled())
    }
}

/// Greedy word wrap to `width` columns. Words longer than a line are split.
pub(crate) fn wrap(text: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut lines = Vec::new();
    let mut current = String::new();
    let mut current_len = 0usize;
    for word in text.split_whitespace() {
        let mut word: Vec<char> = word.chars().collect();
        while word.len() > width {
            if current_len > 0 {
                lines.push(std::mem::take(&mut current));
                current_len = 0;
            }
            let rest = word.split_off(width);
            lines.push(word.into_iter().collect());
            word = rest;
        }
        let len = word.len();
        if len == 0 {
            continue;
        }
        if current_len > 0 && current_len + 1 + len > width {
            lines.push(std::mem::take(&mut current));
            current_len = 0;
        }
        if current_len > 0 {
            current.push(' ');
            current_len += 1;
        }
        current.extend(word);
        current_len += len;
    }
    if current_len > 0 {
        lines.push(current);
    }
    lines
}
