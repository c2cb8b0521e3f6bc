//! Inline colour markup: scanning, measuring, truncating and rendering.
//!
//! Two notations are understood and may be mixed freely:
//!
//! ```text
//! <fg=green;options=bold>12,000 rec/s</>      tag form, `</>` closes the innermost tag
//! yellow{Average} (bold{slow} path)           macro form, braces nest
//! ```
//!
//! The scanner produces a flat list of [`Span`]s, each carrying the fully
//! resolved [`Style`] for its text. Everything that is not recognised markup
//! (a `<` that does not open a valid tag, a word that is not a style name, an
//! opener without a matching close) is kept as literal text, so measuring and
//! truncating never trip over malformed input.
//!
//! A backslash escapes `<`, `{`, `}` and `\`. [`escape`] applies that to
//! arbitrary text (job names, messages) before embedding it in markup.

use std::fmt;
use std::str::FromStr;

use crossterm::style::{Attribute, Color as TermColor, ContentStyle, StyledContent};

use crate::error::{ReportError, Result};

// ---------------------------------------------------------------------------
// Colours and styles
// ---------------------------------------------------------------------------

/// Named terminal colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Color {
    Black,
    Red,
    Green,
    Yellow,
    Blue,
    Magenta,
    Cyan,
    White,
    Gray,
    BrightRed,
    BrightGreen,
    BrightYellow,
    BrightBlue,
    BrightMagenta,
    BrightCyan,
}

impl Color {
    /// Markup name of the colour.
    pub fn name(self) -> &'static str {
        match self {
            Self::Black => "black",
            Self::Red => "red",
            Self::Green => "green",
            Self::Yellow => "yellow",
            Self::Blue => "blue",
            Self::Magenta => "magenta",
            Self::Cyan => "cyan",
            Self::White => "white",
            Self::Gray => "gray",
            Self::BrightRed => "bright-red",
            Self::BrightGreen => "bright-green",
            Self::BrightYellow => "bright-yellow",
            Self::BrightBlue => "bright-blue",
            Self::BrightMagenta => "bright-magenta",
            Self::BrightCyan => "bright-cyan",
        }
    }

    fn from_name(name: &str) -> Option<Self> {
        let color = match name {
            "black" => Self::Black,
            "red" => Self::Red,
            "green" => Self::Green,
            "yellow" => Self::Yellow,
            "blue" => Self::Blue,
            "magenta" => Self::Magenta,
            "cyan" => Self::Cyan,
            "white" => Self::White,
            "gray" | "grey" => Self::Gray,
            "bright-red" => Self::BrightRed,
            "bright-green" => Self::BrightGreen,
            "bright-yellow" => Self::BrightYellow,
            "bright-blue" => Self::BrightBlue,
            "bright-magenta" => Self::BrightMagenta,
            "bright-cyan" => Self::BrightCyan,
            _ => return None,
        };
        Some(color)
    }

    fn to_term(self) -> TermColor {
        match self {
            Self::Black => TermColor::Black,
            Self::Red => TermColor::DarkRed,
            Self::Green => TermColor::DarkGreen,
            Self::Yellow => TermColor::DarkYellow,
            Self::Blue => TermColor::DarkBlue,
            Self::Magenta => TermColor::DarkMagenta,
            Self::Cyan => TermColor::DarkCyan,
            Self::White => TermColor::White,
            Self::Gray => TermColor::DarkGrey,
            Self::BrightRed => TermColor::Red,
            Self::BrightGreen => TermColor::Green,
            Self::BrightYellow => TermColor::Yellow,
            Self::BrightBlue => TermColor::Blue,
            Self::BrightMagenta => TermColor::Magenta,
            Self::BrightCyan => TermColor::Cyan,
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Color {
    type Err = ReportError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_name(&s.trim().to_ascii_lowercase())
            .ok_or_else(|| ReportError::config(format!("unknown colour '{s}'")))
    }
}

/// Resolved style of a run of text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Style {
    pub fg: Option<Color>,
    pub bg: Option<Color>,
    pub bold: bool,
    pub underline: bool,
    pub italic: bool,
    pub dim: bool,
    pub reverse: bool,
}

impl Style {
    /// Style with only a foreground colour.
    pub fn fg(color: Color) -> Self {
        Self {
            fg: Some(color),
            ..Self::default()
        }
    }

    /// Whether rendering this style needs any escape sequences.
    pub fn is_plain(&self) -> bool {
        *self == Self::default()
    }

    /// Layer `inner` on top of `self`; set fields of `inner` win.
    fn merge(self, inner: Style) -> Style {
        Style {
            fg: inner.fg.or(self.fg),
            bg: inner.bg.or(self.bg),
            bold: self.bold || inner.bold,
            underline: self.underline || inner.underline,
            italic: self.italic || inner.italic,
            dim: self.dim || inner.dim,
            reverse: self.reverse || inner.reverse,
        }
    }

    /// Apply a single option keyword. Returns `false` for unknown keywords.
    fn apply_option(&mut self, option: &str) -> bool {
        match option {
            "bold" => self.bold = true,
            "underscore" | "underline" => self.underline = true,
            "italic" => self.italic = true,
            "dim" => self.dim = true,
            "reverse" => self.reverse = true,
            _ => return false,
        }
        true
    }

    /// Parse the body of a tag such as `fg=red;bg=black;options=bold,underscore`.
    fn parse_tag_body(body: &str) -> Option<Style> {
        if body.trim().is_empty() {
            return None;
        }
        let mut style = Style::default();
        for part in body.split(';') {
            let (key, value) = part.split_once('=')?;
            let value = value.trim().to_ascii_lowercase();
            match key.trim() {
                "fg" => style.fg = Some(Color::from_name(&value)?),
                "bg" => style.bg = Some(Color::from_name(&value)?),
                "options" => {
                    for option in value.split(',') {
                        if !style.apply_option(option.trim()) {
                            return None;
                        }
                    }
                }
                _ => return None,
            }
        }
        Some(style)
    }

    /// Style named by a macro word: a colour or an option keyword.
    fn from_macro_name(name: &str) -> Option<Style> {
        if let Some(color) = Color::from_name(name) {
            return Some(Style::fg(color));
        }
        let mut style = Style::default();
        style.apply_option(name).then_some(style)
    }

    fn to_content_style(self) -> ContentStyle {
        let mut cs = ContentStyle::new();
        cs.foreground_color = self.fg.map(Color::to_term);
        cs.background_color = self.bg.map(Color::to_term);
        if self.bold {
            cs.attributes.set(Attribute::Bold);
        }
        if self.underline {
            cs.attributes.set(Attribute::Underlined);
        }
        if self.italic {
            cs.attributes.set(Attribute::Italic);
        }
        if self.dim {
            cs.attributes.set(Attribute::Dim);
        }
        if self.reverse {
            cs.attributes.set(Attribute::Reverse);
        }
        cs
    }
}

/// A run of text sharing one style.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Span {
    pub text: String,
    pub style: Style,
}

impl Span {
    pub fn new(text: impl Into<String>, style: Style) -> Self {
        Self {
            text: text.into(),
            style,
        }
    }

    /// Visible width in columns, counted as one column per `char`.
    ///
    /// Double-width glyphs (CJK, most emoji) occupy two terminal cells but
    /// count as one here, so a row containing them renders wider than its
    /// layout width and columns after it shift right.
    pub fn width(&self) -> usize {
        self.text.chars().count()
    }
}

// ---------------------------------------------------------------------------
// Scanner
// ---------------------------------------------------------------------------

#[derive(Clone, Copy, PartialEq, Eq)]
enum FrameKind {
    Tag,
    Macro,
}

struct Frame {
    kind: FrameKind,
    style: Style,
    /// Literal `{` still open inside a macro body.
    open_braces: usize,
}

struct Scanner {
    chars: Vec<char>,
    pos: usize,
    base: Style,
    stack: Vec<Frame>,
    buf: String,
    spans: Vec<Span>,
}

impl Scanner {
    fn new(input: &str, base: Style) -> Self {
        Self {
            chars: input.chars().collect(),
            pos: 0,
            base,
            stack: Vec::new(),
            buf: String::new(),
            spans: Vec::new(),
        }
    }

    fn current_style(&self) -> Style {
        self.stack.last().map_or(self.base, |f| f.style)
    }

    fn flush(&mut self) {
        if self.buf.is_empty() {
            return;
        }
        let text = std::mem::take(&mut self.buf);
        let style = self.current_style();
        match self.spans.last_mut() {
            Some(last) if last.style == style => last.text.push_str(&text),
            _ => self.spans.push(Span { text, style }),
        }
    }

    fn push_frame(&mut self, kind: FrameKind, style: Style) {
        self.flush();
        let merged = self.current_style().merge(style);
        self.stack.push(Frame {
            kind,
            style: merged,
            open_braces: 0,
        });
    }

    fn find_from(&self, start: usize, target: char) -> Option<usize> {
        self.chars[start..]
            .iter()
            .position(|&c| c == target)
            .map(|off| start + off)
    }

    fn run(mut self) -> Vec<Span> {
        while self.pos < self.chars.len() {
            let c = self.chars[self.pos];
            match c {
                '\\' => self.scan_escape(),
                '<' => self.scan_tag(),
                '{' => self.scan_open_brace(),
                '}' => self.scan_close_brace(),
                c if c.is_ascii_alphabetic() && self.at_word_start() => self.scan_macro(),
                _ => {
                    self.buf.push(c);
                    self.pos += 1;
                }
            }
        }
        self.flush();
        self.spans
    }

    fn scan_escape(&mut self) {
        match self.chars.get(self.pos + 1) {
            Some(&next @ ('<' | '{' | '}' | '\\')) => {
                self.buf.push(next);
                self.pos += 2;
            }
            _ => {
                self.buf.push('\\');
                self.pos += 1;
            }
        }
    }

    fn scan_tag(&mut self) {
        let Some(end) = self.find_from(self.pos + 1, '>') else {
            // Unterminated: everything from here on is literal text.
            let rest: String = self.chars[self.pos..].iter().collect();
            self.buf.push_str(&rest);
            self.pos = self.chars.len();
            return;
        };
        let body: String = self.chars[self.pos + 1..end].iter().collect();

        if let Some(closing) = body.strip_prefix('/') {
            let closes_tag = self
                .stack
                .last()
                .is_some_and(|f| f.kind == FrameKind::Tag);
            let well_formed = closing.is_empty() || Style::parse_tag_body(closing).is_some();
            if closes_tag && well_formed {
                self.flush();
                self.stack.pop();
                self.pos = end + 1;
                return;
            }
        } else if let Some(style) = Style::parse_tag_body(&body) {
            self.push_frame(FrameKind::Tag, style);
            self.pos = end + 1;
            return;
        }

        self.buf.push('<');
        self.pos += 1;
    }

    fn scan_open_brace(&mut self) {
        if let Some(frame) = self.innermost_macro() {
            frame.open_braces += 1;
        }
        self.buf.push('{');
        self.pos += 1;
    }

    /// A `}` balances a literal `{` before it can close the macro around it.
    fn scan_close_brace(&mut self) {
        let closes_macro = self
            .stack
            .last()
            .is_some_and(|f| f.kind == FrameKind::Macro && f.open_braces == 0);
        if closes_macro {
            self.flush();
            self.stack.pop();
        } else {
            if let Some(frame) = self.innermost_macro() {
                frame.open_braces = frame.open_braces.saturating_sub(1);
            }
            self.buf.push('}');
        }
        self.pos += 1;
    }

    fn innermost_macro(&mut self) -> Option<&mut Frame> {
        self.stack
            .iter_mut()
            .rev()
            .find(|f| f.kind == FrameKind::Macro)
    }

    fn at_word_start(&self) -> bool {
        self.pos == 0 || {
            let prev = self.chars[self.pos - 1];
            !(prev.is_alphanumeric() || prev == '-' || prev == '_')
        }
    }

    fn scan_macro(&mut self) {
        let mut end = self.pos;
        while end < self.chars.len() && (self.chars[end].is_ascii_alphabetic() || self.chars[end] == '-')
        {
            end += 1;
        }
        let word: String = self.chars[self.pos..end].iter().collect();
        let opens = self.chars.get(end) == Some(&'{') && self.has_matching_brace(end);
        match Style::from_macro_name(&word.to_ascii_lowercase()) {
            Some(style) if opens => {
                self.push_frame(FrameKind::Macro, style);
                self.pos = end + 1;
            }
            _ => {
                self.buf.push_str(&word);
                self.pos = end;
            }
        }
    }

    /// Whether the `{` at `open` has a balancing `}` (escapes honoured).
    fn has_matching_brace(&self, open: usize) -> bool {
        let mut depth = 0usize;
        let mut i = open;
        while i < self.chars.len() {
            match self.chars[i] {
                '\\' => i += 1,
                '{' => depth += 1,
                '}' => {
                    depth -= 1;
                    if depth == 0 {
                        return true;
                    }
                }
                _ => {}
            }
            i += 1;
        }
        false
    }
}

// ---------------------------------------------------------------------------
// Public helpers
// ---------------------------------------------------------------------------

/// Scan markup into styled spans.
pub fn parse(input: &str) -> Vec<Span> {
    parse_with_base(input, Style::default())
}

/// Scan markup into spans, layering every style on top of `base`.
pub fn parse_with_base(input: &str, base: Style) -> Vec<Span> {
    Scanner::new(input, base).run()
}

/// Text with all markup removed.
pub fn strip(input: &str) -> String {
    parse(input).into_iter().map(|s| s.text).collect()
}

/// Visible width of markup text in columns. Counts `char`s; see [`Span::width`]
/// for how double-width glyphs are measured.
pub fn visible_len(input: &str) -> usize {
    spans_width(&parse(input))
}

/// Total visible width of a span list.
pub fn spans_width(spans: &[Span]) -> usize {
    spans.iter().map(Span::width).sum()
}

/// Keep at most `max` visible columns, cutting inside a span if needed.
///
/// Styles are carried per span, so a cut never leaves markup open.
pub fn truncate_spans(spans: &[Span], max: usize) -> Vec<Span> {
    let mut out = Vec::new();
    let mut remaining = max;
    for span in spans {
        if remaining == 0 {
            break;
        }
        let w = span.width();
        if w <= remaining {
            out.push(span.clone());
            remaining -= w;
        } else {
            let text: String = span.text.chars().take(remaining).collect();
            out.push(Span::new(text, span.style));
            remaining = 0;
        }
    }
    out
}

/// Render spans as terminal text. With `styled == false` no escape sequence is emitted.
pub fn render_spans(spans: &[Span], styled: bool) -> String {
    let mut out = String::new();
    for span in spans {
        if span.text.is_empty() {
            continue;
        }
        if styled && !span.style.is_plain() {
            let content = StyledContent::new(span.style.to_content_style(), span.text.as_str());
            out.push_str(&content.to_string());
        } else {
            out.push_str(&span.text);
        }
    }
    out
}

/// Parse and render markup in one step.
pub fn render(input: &str, styled: bool) -> String {
    render_spans(&parse(input), styled)
}

/// Escape text so it is taken literally when embedded in markup.
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '<' | '{' | '}' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Wrap escaped `text` in a foreground-colour tag.
pub fn paint(text: &str, color: Color) -> String {
    format!("<fg={}>{}</>", color.name(), escape(text))
}

/// Wrap already-marked-up `markup` in a foreground-colour tag.
pub fn paint_markup(markup: &str, color: Color) -> String {
    format!("<fg={}>{}</>", color.name(), markup)
}

/// Wrap escaped `text` in a bold tag.
pub fn bold(text: &str) -> String {
    format!("<options=bold>{}</>", escape(text))
}

/// Remove ANSI CSI escape sequences from rendered terminal text.
pub fn strip_ansi(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\u{1b}' && chars.peek() == Some(&'[') {
            chars.next();
            for n in chars.by_ref() {
                if ('@'..='~').contains(&n) {
                    break;
                }
            }
        } else {
            out.push(c);
        }
    }
    out
}
