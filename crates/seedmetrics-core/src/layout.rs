//! Width-exact line layout.
//!
//! [`LayoutEngine::format_line`] joins segments with a filler character so the
//! visible width of the result (markup excluded) is exactly the engine's line
//! width. Filler placement for the default [`FillPolicy::Auto`]:
//!
//! | segments | placement                                              |
//! |----------|--------------------------------------------------------|
//! | 1        | all filler after the segment                           |
//! | 2        | all filler between the two segments                    |
//! | n >= 3   | spread over the n-1 inner gaps, see [`distribute_filler`] |
//!
//! Content wider than the line is truncated left-to-right (one filler column is
//! kept between segments while it fits) instead of overflowing.

use std::str::FromStr;

use crate::error::{ReportError, Result};
use crate::markup::{self, Color, Span, Style};

/// One atomic piece of a formatted line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    /// Text, possibly containing markup.
    pub text: String,
    /// Base colour layered under any inner markup.
    pub color: Option<Color>,
}

impl Segment {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            color: None,
        }
    }

    pub fn colored(text: impl Into<String>, color: Color) -> Self {
        Self {
            text: text.into(),
            color: Some(color),
        }
    }

    fn spans(&self) -> Vec<Span> {
        let base = self.color.map(Style::fg).unwrap_or_default();
        markup::parse_with_base(&self.text, base)
    }
}

/// Horizontal alignment for [`LayoutEngine::constant_width`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Align {
    #[default]
    Left,
    Right,
    /// Odd padding puts the shorter half on the left.
    Center,
}

impl FromStr for Align {
    type Err = ReportError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "left" => Ok(Self::Left),
            "right" => Ok(Self::Right),
            "center" | "centre" => Ok(Self::Center),
            other => Err(ReportError::config(format!("unknown alignment '{other}'"))),
        }
    }
}

/// Where filler goes when a line is shorter than the target width.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FillPolicy {
    #[default]
    Auto,
    /// All filler before the first segment.
    Start,
    /// All filler after the last segment.
    End,
    /// Filler split before the first and after the last segment, shorter half first.
    Around,
}

/// Split `total` filler columns over `gaps` gaps.
///
/// Every gap receives `total / gaps`; the `total % gaps` leftover columns go one
/// each to consecutive gaps starting at the middle gap (the left-middle one
/// for an even gap count) and wrapping to the first gap after the last.
pub fn distribute_filler(total: usize, gaps: usize) -> Vec<usize> {
    if gaps == 0 {
        return Vec::new();
    }
    let mut counts = vec![total / gaps; gaps];
    let start = (gaps - 1) / 2;
    for k in 0..total % gaps {
        counts[(start + k) % gaps] += 1;
    }
    counts
}

/// Fixed-width line formatter.
#[derive(Debug, Clone)]
pub struct LayoutEngine {
    width: usize,
    filler: char,
    filler_color: Option<Color>,
    styled: bool,
}

impl LayoutEngine {
    /// Engine producing lines of `width` visible columns. Zero is a configuration error.
    pub fn new(width: usize) -> Result<Self> {
        if width == 0 {
            return Err(ReportError::config("line width must be positive"));
        }
        Ok(Self {
            width,
            filler: '.',
            filler_color: Some(Color::Gray),
            styled: true,
        })
    }

    pub fn with_filler(mut self, filler: char) -> Self {
        self.filler = filler;
        self
    }

    pub fn with_filler_color(mut self, color: Option<Color>) -> Self {
        self.filler_color = color;
        self
    }

    /// Emit ANSI styling (`true`) or bare text (`false`).
    pub fn styled(mut self, styled: bool) -> Self {
        self.styled = styled;
        self
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn is_styled(&self) -> bool {
        self.styled
    }

    pub fn filler(&self) -> char {
        self.filler
    }

    /// Format segments with [`FillPolicy::Auto`].
    pub fn format_line(&self, segments: &[Segment]) -> String {
        self.format_line_with(segments, FillPolicy::Auto)
    }

    /// Format segments into exactly `self.width()` visible columns.
    pub fn format_line_with(&self, segments: &[Segment], policy: FillPolicy) -> String {
        if segments.is_empty() {
            return self.rule(self.filler);
        }
        let parts: Vec<Vec<Span>> = segments.iter().map(Segment::spans).collect();
        let content: usize = parts.iter().map(|p| markup::spans_width(p)).sum();

        if content > self.width {
            log::debug!(
                "layout overflow: {content} visible columns into {}; truncating",
                self.width
            );
            return self.render(&self.truncated(&parts));
        }

        let fill = self.fill_counts(parts.len(), self.width - content, policy);
        let mut spans = Vec::new();
        for (i, part) in parts.into_iter().enumerate() {
            self.push_filler(&mut spans, fill[i]);
            spans.extend(part);
        }
        self.push_filler(&mut spans, fill[fill.len() - 1]);
        self.render(&spans)
    }

    /// Filler columns for positions before, between and after `n` segments.
    fn fill_counts(&self, n: usize, filler: usize, policy: FillPolicy) -> Vec<usize> {
        let mut counts = vec![0; n + 1];
        match policy {
            FillPolicy::Start => counts[0] = filler,
            FillPolicy::End => counts[n] = filler,
            FillPolicy::Around => {
                counts[0] = filler / 2;
                counts[n] = filler - filler / 2;
            }
            FillPolicy::Auto if n == 1 => counts[1] = filler,
            FillPolicy::Auto => {
                for (i, c) in distribute_filler(filler, n - 1).into_iter().enumerate() {
                    counts[i + 1] = c;
                }
            }
        }
        counts
    }

    fn truncated(&self, parts: &[Vec<Span>]) -> Vec<Span> {
        let mut joined = Vec::new();
        for (i, part) in parts.iter().enumerate() {
            if i > 0 {
                self.push_filler(&mut joined, 1);
            }
            joined.extend(part.iter().cloned());
        }
        markup::truncate_spans(&joined, self.width)
    }

    fn push_filler(&self, spans: &mut Vec<Span>, count: usize) {
        if count == 0 {
            return;
        }
        let style = self.filler_color.map(Style::fg).unwrap_or_default();
        spans.push(Span::new(self.filler.to_string().repeat(count), style));
    }

    /// Pad or truncate `text` to exactly `width` visible columns.
    ///
    /// `filler` defaults to a space. Zero width is a configuration error.
    pub fn constant_width(
        &self,
        text: &str,
        width: usize,
        color: Option<Color>,
        filler: Option<char>,
        align: Align,
    ) -> Result<String> {
        if width == 0 {
            return Err(ReportError::config("column width must be positive"));
        }
        let base = color.map(Style::fg).unwrap_or_default();
        let spans = markup::parse_with_base(text, base);
        let len = markup::spans_width(&spans);
        if len >= width {
            return Ok(self.render(&markup::truncate_spans(&spans, width)));
        }

        let pad = width - len;
        let (left, right) = match align {
            Align::Left => (0, pad),
            Align::Right => (pad, 0),
            Align::Center => (pad / 2, pad - pad / 2),
        };
        let fill = filler.unwrap_or(' ').to_string();
        let mut out = Vec::with_capacity(spans.len() + 2);
        if left > 0 {
            out.push(Span::new(fill.repeat(left), Style::default()));
        }
        out.extend(spans);
        if right > 0 {
            out.push(Span::new(fill.repeat(right), Style::default()));
        }
        Ok(self.render(&out))
    }

    /// A full-width line of `ch`.
    pub fn rule(&self, ch: char) -> String {
        ch.to_string().repeat(self.width)
    }

    /// Render a markup string with this engine's styling mode.
    pub fn render_markup(&self, text: &str) -> String {
        markup::render(text, self.styled)
    }

    fn render(&self, spans: &[Span]) -> String {
        markup::render_spans(spans, self.styled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plain(width: usize) -> LayoutEngine {
        LayoutEngine::new(width).unwrap().styled(false)
    }

    #[test]
    fn zero_width_is_rejected() {
        assert!(matches!(
            LayoutEngine::new(0),
            Err(ReportError::Configuration(_))
        ));
    }

    #[test]
    fn two_segments_fill_between() {
        let engine = plain(20);
        let line = engine.format_line(&[
            Segment::plain("Name"),
            Segment::colored("Value", Color::Green),
        ]);
        assert_eq!(line, "Name...........Value");
        assert_eq!(line.chars().count(), 20);
    }

    #[test]
    fn one_segment_fills_right() {
        let line = plain(10).format_line(&[Segment::plain("abc")]);
        assert_eq!(line, "abc.......");
    }

    #[test]
    fn three_segments_remainder_goes_middle_first() {
        // 4 gaps would be needed for 5 segments; 3 segments -> 2 gaps.
        let line = plain(10).format_line(&[
            Segment::plain("a"),
            Segment::plain("b"),
            Segment::plain("c"),
        ]);
        // 7 filler over 2 gaps: base 3, remainder to gap 0 (left-middle).
        assert_eq!(line, "a....b...c");
    }

    #[test]
    fn distribute_is_exact_and_never_negative() {
        for total in 0..40 {
            for gaps in 1..7 {
                let d = distribute_filler(total, gaps);
                assert_eq!(d.len(), gaps);
                assert_eq!(d.iter().sum::<usize>(), total);
                let max = *d.iter().max().unwrap();
                let min = *d.iter().min().unwrap();
                assert!(max - min <= 1);
            }
        }
        assert_eq!(distribute_filler(2, 4), vec![0, 1, 1, 0]);
        assert!(distribute_filler(5, 0).is_empty());
    }

    #[test]
    fn markup_does_not_count_towards_width() {
        let engine = plain(40);
        let line = engine.format_line(&[
            Segment::plain("<fg=red;options=bold>Heavy</> markup"),
            Segment::plain("green{ok}"),
        ]);
        assert_eq!(line.chars().count(), 40);
        assert!(line.starts_with("Heavy markup"));
        assert!(line.ends_with("ok"));
    }

    #[test]
    fn styled_output_has_exact_visible_width() {
        let engine = LayoutEngine::new(50).unwrap();
        let line = engine.format_line(&[
            Segment::colored("Total", Color::Cyan),
            Segment::plain("<fg=green>1,100</> records"),
        ]);
        assert_eq!(markup::strip_ansi(&line).chars().count(), 50);
    }

    #[test]
    fn overflow_truncates_instead_of_growing() {
        let engine = plain(40);
        let long = "x".repeat(30);
        let line = engine.format_line(&[
            Segment::plain(long.clone()),
            Segment::plain(format!("<fg=red>{long}</>")),
        ]);
        assert_eq!(line.chars().count(), 40);
        assert!(line.starts_with(&long));
        assert_eq!(line.chars().nth(30), Some('.'));
    }

    #[test]
    fn overflow_never_leaves_markup_open() {
        let engine = plain(45);
        let line = engine.format_line(&[Segment::plain(format!(
            "<fg=red>{}</>",
            "y".repeat(60)
        ))]);
        assert_eq!(line, "y".repeat(45));
    }

    #[test]
    fn policies_place_filler() {
        let engine = plain(9);
        let seg = [Segment::plain("abc")];
        assert_eq!(engine.format_line_with(&seg, FillPolicy::Start), "......abc");
        assert_eq!(engine.format_line_with(&seg, FillPolicy::End), "abc......");
        assert_eq!(engine.format_line_with(&seg, FillPolicy::Around), "...abc...");
    }

    #[test]
    fn empty_segments_give_a_rule() {
        assert_eq!(plain(5).format_line(&[]), ".....");
    }

    #[test]
    fn constant_width_aligns() {
        let engine = plain(40);
        assert_eq!(
            engine.constant_width("ab", 5, None, None, Align::Left).unwrap(),
            "ab   "
        );
        assert_eq!(
            engine.constant_width("ab", 5, None, None, Align::Right).unwrap(),
            "   ab"
        );
        // Odd remainder: shorter padding on the left.
        assert_eq!(
            engine
                .constant_width("ab", 5, None, Some('-'), Align::Center)
                .unwrap(),
            "-ab--"
        );
    }

    #[test]
    fn constant_width_truncates_markup_cleanly() {
        let engine = plain(40);
        let out = engine
            .constant_width("<fg=green>abcdefgh</>", 3, None, None, Align::Left)
            .unwrap();
        assert_eq!(out, "abc");
    }

    #[test]
    fn constant_width_rejects_zero() {
        let engine = plain(40);
        assert!(engine.constant_width("x", 0, None, None, Align::Left).is_err());
    }

    #[test]
    fn align_from_str() {
        assert_eq!("Center".parse::<Align>().unwrap(), Align::Center);
        assert!("justify".parse::<Align>().is_err());
    }
}
