//! Human-readable number, duration and size formatting.

use std::time::Duration;

/// Format seconds for humans.
///
/// - under 0.1s: `"85.0 ms"`
/// - under a minute: `"12.34 sec"`
/// - under an hour: `"3m 5.20s"`
/// - otherwise: `"2h 3m 5.20s"`
pub fn format_duration(seconds: f64) -> String {
    let seconds = if seconds.is_finite() { seconds.max(0.0) } else { 0.0 };
    if seconds < 0.1 {
        return format!("{:.1} ms", seconds * 1000.0);
    }
    // round once, up front, so a carry moves into the next unit
    let centis = (seconds * 100.0).round() as u64;
    let (whole, frac) = (centis / 100, centis % 100);
    let (hours, minutes, secs) = (whole / 3600, (whole % 3600) / 60, whole % 60);
    if whole < 60 {
        format!("{whole}.{frac:02} sec")
    } else if whole < 3600 {
        format!("{minutes}m {secs}.{frac:02}s")
    } else {
        format!("{hours}h {minutes}m {secs}.{frac:02}s")
    }
}

/// Compact clock-style duration for live progress (`"01:05"`, `"1:02:03"`).
pub fn format_clock(duration: Duration) -> String {
    let total = duration.as_secs();
    let (h, m, s) = (total / 3600, (total % 3600) / 60, total % 60);
    if h > 0 {
        format!("{h}:{m:02}:{s:02}")
    } else {
        format!("{m:02}:{s:02}")
    }
}

/// Signed binary size (`"-1.50 MiB"`).
pub fn format_bytes(value: f64) -> String {
    let sign = if value.is_sign_negative() && value != 0.0 { "-" } else { "" };
    let mut v = value.abs();
    let units = ["B", "KiB", "MiB", "GiB", "TiB"];
    let mut idx = 0usize;
    while v >= 1024.0 && idx < units.len() - 1 {
        v /= 1024.0;
        idx += 1;
    }
    if idx == 0 {
        format!("{sign}{v:.0} {}", units[idx])
    } else {
        format!("{sign}{v:.2} {}", units[idx])
    }
}

/// Memory delta with an explicit `+` for growth.
pub fn format_bytes_delta(bytes: i64) -> String {
    if bytes > 0 {
        format!("+{}", format_bytes(bytes as f64))
    } else {
        format_bytes(bytes as f64)
    }
}

/// Integer with thousands separators (`1,234,567`).
pub fn format_count(value: u64) -> String {
    group_digits(&value.to_string())
}

/// Float with thousands separators and fixed decimals (`12,345.68`).
pub fn format_number(value: f64, decimals: usize) -> String {
    if !value.is_finite() {
        return "0".to_string();
    }
    let raw = format!("{:.*}", decimals, value.abs());
    let (int_part, frac_part) = match raw.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (raw.as_str(), None),
    };
    let sign = if value < 0.0 && raw.chars().any(|c| c.is_ascii_digit() && c != '0') {
        "-"
    } else {
        ""
    };
    match frac_part {
        Some(f) => format!("{sign}{}.{f}", group_digits(int_part)),
        None => format!("{sign}{}", group_digits(int_part)),
    }
}

/// Throughput with unit (`"2,000.0 rec/s"`).
pub fn format_rate(rate: f64) -> String {
    format!("{} rec/s", format_number(rate, 1))
}

/// Percentage with no decimals for whole values (`"100%"`, `"33.3%"`).
pub fn format_percent(value: f64) -> String {
    if !value.is_finite() {
        return "0%".to_string();
    }
    if (value - value.round()).abs() < 0.05 {
        format!("{:.0}%", value.round())
    } else {
        format!("{value:.1}%")
    }
}

fn group_digits(digits: &str) -> String {
    let len = digits.len();
    let mut out = String::with_capacity(len + len / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}
