//! Single-job live progress line.
//!
//! ```text
//! Idle --start(total)--> Running --finish()--> Finished
//!                          |  ^
//!                          advance(n)
//! ```
//!
//! Redraws are rate limited: an `advance` only repaints every K calls, where K
//! is the configured `redraw_every` or `max(1, min(100, total / 100))`. Start
//! and finish always draw. Output failures are logged and otherwise ignored;
//! progress is best-effort and must never fail a job.

use std::io::{self, Write};
use std::time::{Duration, Instant};

use crossterm::cursor::MoveToColumn;
use crossterm::queue;
use crossterm::style::Print;
use crossterm::terminal::{Clear, ClearType};

use crate::config::ProgressConfig;
use crate::format::{format_bytes, format_clock};
use crate::markup::{self, Color};
use crate::memory::{MemoryProbe, ProcessMemory};
use crate::theme::Theme;

const REMAINING_UNKNOWN: &str = "--:--";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressState {
    Idle,
    Running,
    Finished,
}

/// Default redraw interval for a job of `total` steps.
pub fn redraw_interval(total: u64) -> u64 {
    (total / 100).clamp(1, 100)
}

/// `elapsed * (total - processed) / processed`, unknown before the first step
/// and when the estimate does not fit a `Duration`.
pub fn estimate_remaining(elapsed: Duration, processed: u64, total: u64) -> Option<Duration> {
    if processed == 0 {
        return None;
    }
    let left = total.saturating_sub(processed);
    Duration::try_from_secs_f64(elapsed.as_secs_f64() * (left as f64 / processed as f64)).ok()
}

/// Live progress bar writing to `W` (stderr in production, a buffer in tests).
pub struct ProgressIndicator<W: Write> {
    out: W,
    template: String,
    bar_width: usize,
    fixed_interval: Option<u64>,
    styled: bool,
    theme: Theme,
    memory: Box<dyn MemoryProbe>,
    state: ProgressState,
    total: u64,
    processed: u64,
    interval: u64,
    pending: u64,
    started: Option<Instant>,
    finished_after: Option<Duration>,
    drawn_width: usize,
    draws: u64,
}

impl ProgressIndicator<io::Stderr> {
    /// Indicator drawing to standard error.
    pub fn stderr(config: &ProgressConfig) -> Self {
        Self::new(io::stderr(), config)
    }
}

impl<W: Write> ProgressIndicator<W> {
    pub fn new(out: W, config: &ProgressConfig) -> Self {
        Self {
            out,
            template: config.template.clone(),
            bar_width: config.bar_width.max(1),
            fixed_interval: config.redraw_every.filter(|&k| k > 0),
            styled: true,
            theme: Theme::default(),
            memory: Box::new(ProcessMemory),
            state: ProgressState::Idle,
            total: 0,
            processed: 0,
            interval: 1,
            pending: 0,
            started: None,
            finished_after: None,
            drawn_width: 0,
            draws: 0,
        }
    }

    pub fn styled(mut self, styled: bool) -> Self {
        self.styled = styled;
        self
    }

    pub fn with_theme(mut self, theme: Theme) -> Self {
        self.set_theme(theme);
        self
    }

    pub fn set_theme(&mut self, theme: Theme) {
        self.theme = theme;
    }

    pub fn with_memory_probe(mut self, probe: Box<dyn MemoryProbe>) -> Self {
        self.memory = probe;
        self
    }

    pub fn state(&self) -> ProgressState {
        self.state
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    pub fn processed(&self) -> u64 {
        self.processed
    }

    /// Number of times the line was painted.
    pub fn draw_count(&self) -> u64 {
        self.draws
    }

    pub fn redraw_every(&self) -> u64 {
        self.interval
    }

    pub fn elapsed(&self) -> Duration {
        match (self.finished_after, self.started) {
            (Some(d), _) => d,
            (None, Some(start)) => start.elapsed(),
            (None, None) => Duration::ZERO,
        }
    }

    /// Completed fraction in `[0, 1]`. A job of zero steps counts as done once finished.
    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            return if self.state == ProgressState::Finished { 1.0 } else { 0.0 };
        }
        (self.processed as f64 / self.total as f64).min(1.0)
    }

    /// Begin tracking a job of `total` steps and draw the first frame.
    ///
    /// Starting again resets the indicator, so one instance can serve a
    /// sequence of jobs.
    pub fn start(&mut self, total: u64) {
        if self.state == ProgressState::Running {
            log::debug!("progress restarted while running");
        }
        self.total = total;
        self.processed = 0;
        self.pending = 0;
        self.interval = self.fixed_interval.unwrap_or_else(|| redraw_interval(total));
        self.started = Some(Instant::now());
        self.finished_after = None;
        self.state = ProgressState::Running;
        self.draw();
    }

    /// Count `n` more steps. No-op unless running.
    pub fn advance(&mut self, n: u64) {
        if self.state != ProgressState::Running {
            return;
        }
        self.processed = self.processed.saturating_add(n);
        self.pending += 1;
        if self.pending >= self.interval {
            self.draw();
        }
    }

    /// Repaint now regardless of the redraw interval.
    pub fn redraw(&mut self) {
        if self.state == ProgressState::Running {
            self.draw();
        }
    }

    /// Draw the final 100% frame and stop. No-op unless running.
    pub fn finish(&mut self) {
        if self.state != ProgressState::Running {
            return;
        }
        self.processed = self.processed.max(self.total);
        self.finished_after = Some(self.elapsed());
        self.state = ProgressState::Finished;
        self.draw();
        if let Err(e) = writeln!(self.out).and_then(|()| self.out.flush()) {
            log::debug!("progress output failed: {e}");
        }
        self.drawn_width = 0;
    }

    /// Erase the current line without touching the counters.
    pub fn clear(&mut self) {
        if self.drawn_width == 0 {
            return;
        }
        let result = if self.styled {
            queue!(self.out, MoveToColumn(0), Clear(ClearType::CurrentLine))
        } else {
            write!(self.out, "\r{}\r", " ".repeat(self.drawn_width))
        };
        if let Err(e) = result.and_then(|()| self.out.flush()) {
            log::debug!("progress output failed: {e}");
        }
        self.drawn_width = 0;
    }

    /// The line as it would be drawn for `elapsed`, in markup.
    pub fn render_line(&self, elapsed: Duration) -> String {
        let mut out = String::with_capacity(self.template.len() + self.bar_width * 3);
        let mut rest = self.template.as_str();
        while let Some(open) = rest.find('{') {
            out.push_str(&markup::escape(&rest[..open]));
            let after = &rest[open..];
            match after.find('}').and_then(|close| {
                self.token(&after[1..close], elapsed)
                    .map(|value| (value, close))
            }) {
                Some((value, close)) => {
                    out.push_str(&value);
                    rest = &after[close + 1..];
                }
                None => {
                    out.push_str(&markup::escape("{"));
                    rest = &after[1..];
                }
            }
        }
        out.push_str(&markup::escape(rest));
        out
    }

    fn token(&self, name: &str, elapsed: Duration) -> Option<String> {
        let value = match name {
            "bar" => {
                let filled = (self.fraction() * self.bar_width as f64).round() as usize;
                markup::paint(&self.theme.bar(filled, self.bar_width), Color::Green)
            }
            "percent" => format!("{:>3}%", (self.fraction() * 100.0).floor() as u64),
            "elapsed" => format_clock(elapsed),
            "remaining" => match self.state {
                ProgressState::Finished => format_clock(Duration::ZERO),
                _ => estimate_remaining(elapsed, self.processed, self.total)
                    .map(format_clock)
                    .unwrap_or_else(|| REMAINING_UNKNOWN.to_string()),
            },
            "memory" => self
                .memory
                .resident_bytes()
                .map(|b| format_bytes(b as f64))
                .unwrap_or_else(|| "unknown".to_string()),
            _ => return None,
        };
        Some(value)
    }

    fn draw(&mut self) {
        self.pending = 0;
        let line = self.render_line(self.elapsed());
        let width = markup::visible_len(&line);
        let rendered = markup::render(&line, self.styled);
        let result = if self.styled {
            queue!(
                self.out,
                MoveToColumn(0),
                Clear(ClearType::CurrentLine),
                Print(rendered)
            )
        } else {
            // pad over a longer previous frame
            let pad = self.drawn_width.saturating_sub(width);
            write!(self.out, "\r{rendered}{}", " ".repeat(pad))
        };
        if let Err(e) = result.and_then(|()| self.out.flush()) {
            log::debug!("progress output failed: {e}");
        }
        self.drawn_width = width;
        self.draws += 1;
    }

    /// Give back the writer.
    pub fn into_inner(self) -> W {
        self.out
    }
}
