//! Qualitative performance and memory ratings.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::config::{MemoryThresholds, ThresholdConfig};
use crate::error::{ReportError, Result};
use crate::markup::Color;

/// Throughput class of a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rating {
    Excellent,
    Good,
    Average,
    Slow,
    VerySlow,
    NotApplicable,
}

impl Rating {
    /// All ratings, best first.
    pub const ALL: [Rating; 6] = [
        Rating::Excellent,
        Rating::Good,
        Rating::Average,
        Rating::Slow,
        Rating::VerySlow,
        Rating::NotApplicable,
    ];

    /// Ratings a job with records can receive, best first.
    pub const ACTIVE: [Rating; 5] = [
        Rating::Excellent,
        Rating::Good,
        Rating::Average,
        Rating::Slow,
        Rating::VerySlow,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Excellent => "Excellent",
            Self::Good => "Good",
            Self::Average => "Average",
            Self::Slow => "Slow",
            Self::VerySlow => "Very Slow",
            Self::NotApplicable => "N/A",
        }
    }

    pub fn key(self) -> &'static str {
        match self {
            Self::Excellent => "excellent",
            Self::Good => "good",
            Self::Average => "average",
            Self::Slow => "slow",
            Self::VerySlow => "very_slow",
            Self::NotApplicable => "not_applicable",
        }
    }

    pub fn color(self) -> Color {
        match self {
            Self::Excellent => Color::BrightGreen,
            Self::Good => Color::Green,
            Self::Average => Color::Yellow,
            Self::Slow => Color::BrightRed,
            Self::VerySlow => Color::Red,
            Self::NotApplicable => Color::Gray,
        }
    }

    /// Slow or VerySlow.
    pub fn is_poor(self) -> bool {
        matches!(self, Self::Slow | Self::VerySlow)
    }
}

impl fmt::Display for Rating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Rating {
    type Err = ReportError;

    fn from_str(s: &str) -> Result<Self> {
        let key = s.trim().to_ascii_lowercase().replace([' ', '-'], "_");
        match key.as_str() {
            "excellent" => Ok(Self::Excellent),
            "good" => Ok(Self::Good),
            "average" => Ok(Self::Average),
            "slow" => Ok(Self::Slow),
            "very_slow" | "veryslow" => Ok(Self::VerySlow),
            "not_applicable" | "n/a" | "na" => Ok(Self::NotApplicable),
            _ => Err(ReportError::config(format!("unknown rating '{s}'"))),
        }
    }
}

/// Classify throughput against the rate thresholds.
///
/// Zero records is always [`Rating::NotApplicable`]. Otherwise bands are
/// checked top-down with a strict `>`, so a rate equal to a cutoff falls into
/// the band below it.
pub fn classify_rate(rate: f64, records_added: u64, thresholds: &ThresholdConfig) -> Rating {
    if records_added == 0 {
        return Rating::NotApplicable;
    }
    if rate > thresholds.excellent {
        Rating::Excellent
    } else if rate > thresholds.good {
        Rating::Good
    } else if rate > thresholds.average {
        Rating::Average
    } else if rate > thresholds.slow {
        Rating::Slow
    } else {
        Rating::VerySlow
    }
}

/// Memory cost class of a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemoryRating {
    Efficient,
    Acceptable,
    Concerning,
    Excessive,
    Critical,
    NotApplicable,
}

impl MemoryRating {
    pub fn label(self) -> &'static str {
        match self {
            Self::Efficient => "Efficient",
            Self::Acceptable => "Acceptable",
            Self::Concerning => "Concerning",
            Self::Excessive => "Excessive",
            Self::Critical => "Critical",
            Self::NotApplicable => "N/A",
        }
    }

    pub fn color(self) -> Color {
        match self {
            Self::Efficient => Color::Green,
            Self::Acceptable => Color::Cyan,
            Self::Concerning => Color::Yellow,
            Self::Excessive => Color::BrightRed,
            Self::Critical => Color::Red,
            Self::NotApplicable => Color::Gray,
        }
    }

    /// Excessive or Critical.
    pub fn is_heavy(self) -> bool {
        matches!(self, Self::Excessive | Self::Critical)
    }
}

impl fmt::Display for MemoryRating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Bytes of memory growth per record; `None` when no records were produced.
pub fn bytes_per_record(memory_delta_bytes: i64, records_added: u64) -> Option<f64> {
    (records_added > 0).then(|| memory_delta_bytes as f64 / records_added as f64)
}

/// Classify memory growth per record. Bands are inclusive upper bounds; a
/// shrinking footprint counts as efficient.
pub fn classify_memory(
    memory_delta_bytes: i64,
    records_added: u64,
    thresholds: &MemoryThresholds,
) -> MemoryRating {
    let Some(per_record) = bytes_per_record(memory_delta_bytes, records_added) else {
        return MemoryRating::NotApplicable;
    };
    if per_record <= thresholds.efficient as f64 {
        MemoryRating::Efficient
    } else if per_record <= thresholds.acceptable as f64 {
        MemoryRating::Acceptable
    } else if per_record <= thresholds.concerning as f64 {
        MemoryRating::Concerning
    } else if per_record <= thresholds.excessive as f64 {
        MemoryRating::Excessive
    } else {
        MemoryRating::Critical
    }
}
