//! Icon and border tables.
//!
//! A [`Theme`] is a plain value built once and handed to the renderer and the
//! progress bar by reference. Every glyph is a single terminal column so width
//! arithmetic stays exact.

use std::str::FromStr;

use crate::error::{ReportError, Result};
use crate::health::Severity;
use crate::rating::Rating;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Theme {
    pub name: &'static str,
    /// Report title and closing rule.
    pub heavy_rule: char,
    /// Section header rule.
    pub light_rule: char,
    /// Filled and empty cells of bars.
    pub bar_full: char,
    pub bar_empty: char,
    pub bullet: char,
    rating_icons: [char; 6],
    severity_icons: [char; 3],
}

impl Theme {
    pub const fn unicode() -> Self {
        Self {
            name: "unicode",
            heavy_rule: '═',
            light_rule: '─',
            bar_full: '█',
            bar_empty: '░',
            bullet: '•',
            // Excellent, Good, Average, Slow, VerySlow, N/A
            rating_icons: ['★', '▲', '●', '▼', '✗', '·'],
            severity_icons: ['✓', '!', '✗'],
        }
    }

    pub const fn ascii() -> Self {
        Self {
            name: "ascii",
            heavy_rule: '=',
            light_rule: '-',
            bar_full: '#',
            bar_empty: '.',
            bullet: '*',
            rating_icons: ['*', '+', '=', '-', '!', '.'],
            severity_icons: ['+', '!', 'x'],
        }
    }

    pub fn rating_icon(&self, rating: Rating) -> char {
        self.rating_icons[rating.index()]
    }

    pub fn severity_icon(&self, severity: Severity) -> char {
        match severity {
            Severity::Ok => self.severity_icons[0],
            Severity::Warning => self.severity_icons[1],
            Severity::Error => self.severity_icons[2],
        }
    }

    /// Bar of `filled` full cells, padded with empty cells up to `width`.
    pub fn bar(&self, filled: usize, width: usize) -> String {
        let filled = filled.min(width);
        let mut out = String::with_capacity(width * 3);
        out.extend(std::iter::repeat_n(self.bar_full, filled));
        out.extend(std::iter::repeat_n(self.bar_empty, width - filled));
        out
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::unicode()
    }
}

impl FromStr for Theme {
    type Err = ReportError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "unicode" => Ok(Self::unicode()),
            "ascii" => Ok(Self::ascii()),
            other => Err(ReportError::config(format!("unknown theme '{other}'"))),
        }
    }
}
