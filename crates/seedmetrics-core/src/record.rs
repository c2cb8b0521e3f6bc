//! Per-job metric record.

use serde::{Deserialize, Serialize};

use crate::config::{MemoryThresholds, ThresholdConfig};
use crate::rating::{MemoryRating, Rating, bytes_per_record, classify_memory, classify_rate};

/// Measurements for one job.
///
/// Created zeroed by registration; a reported result overwrites the counters
/// rather than accumulating into them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricRecord {
    pub job_id: String,
    pub target_name: String,
    pub records_added: u64,
    pub elapsed_seconds: f64,
    /// `records_added / elapsed_seconds`, or 0 when no time elapsed.
    pub rate: f64,
    /// End minus start resident memory; negative when memory was reclaimed.
    pub memory_delta_bytes: i64,
    pub rating: Rating,
    pub memory_rating: MemoryRating,
    /// Whether a result was ever reported (false for discovered-but-unrun jobs).
    pub reported: bool,
}

impl MetricRecord {
    /// Zeroed record for a freshly registered job.
    pub fn new(job_id: impl Into<String>, target_name: impl Into<String>) -> Self {
        Self {
            job_id: job_id.into(),
            target_name: target_name.into(),
            records_added: 0,
            elapsed_seconds: 0.0,
            rate: 0.0,
            memory_delta_bytes: 0,
            rating: Rating::NotApplicable,
            memory_rating: MemoryRating::NotApplicable,
            reported: false,
        }
    }

    /// Overwrite the counters with a reported outcome and re-derive rate and ratings.
    pub fn apply_result(
        &mut self,
        records_added: u64,
        elapsed_seconds: f64,
        thresholds: &ThresholdConfig,
        memory: &MemoryThresholds,
    ) {
        let elapsed = sanitize_seconds(elapsed_seconds);
        if elapsed != elapsed_seconds {
            log::warn!(
                "job '{}' reported invalid elapsed time {elapsed_seconds}; using {elapsed}",
                self.job_id
            );
        }
        self.records_added = records_added;
        self.elapsed_seconds = elapsed;
        self.rate = compute_rate(records_added, elapsed);
        self.rating = classify_rate(self.rate, records_added, thresholds);
        self.memory_rating = classify_memory(self.memory_delta_bytes, records_added, memory);
        self.reported = true;
    }

    /// Set the memory delta and re-derive the memory rating.
    pub fn apply_memory(&mut self, memory_delta_bytes: i64, memory: &MemoryThresholds) {
        self.memory_delta_bytes = memory_delta_bytes;
        self.memory_rating = classify_memory(memory_delta_bytes, self.records_added, memory);
    }

    /// Whether the job produced any records.
    pub fn is_active(&self) -> bool {
        self.records_added > 0
    }

    /// Memory growth per record, if any records were produced.
    pub fn bytes_per_record(&self) -> Option<f64> {
        bytes_per_record(self.memory_delta_bytes, self.records_added)
    }

    /// Milliseconds spent per record, if any records were produced.
    pub fn ms_per_record(&self) -> Option<f64> {
        self.is_active()
            .then(|| self.elapsed_seconds * 1000.0 / self.records_added as f64)
    }

    /// Last path component of the job id (`App\Seeders\UserSeeder` -> `UserSeeder`).
    pub fn short_name(&self) -> &str {
        short_name(&self.job_id)
    }
}

/// Records per second, 0 when no time elapsed.
pub fn compute_rate(records_added: u64, elapsed_seconds: f64) -> f64 {
    if elapsed_seconds > 0.0 {
        records_added as f64 / elapsed_seconds
    } else {
        0.0
    }
}

fn sanitize_seconds(seconds: f64) -> f64 {
    if seconds.is_finite() && seconds > 0.0 {
        seconds
    } else {
        0.0
    }
}

/// Last component of a namespaced job id. Separators: `\`, `/`, `::`, `.`.
pub fn short_name(job_id: &str) -> &str {
    let trimmed = job_id.trim_end_matches(['\\', '/', ':', '.']);
    trimmed
        .rsplit(['\\', '/', ':', '.'])
        .find(|part| !part.is_empty())
        .unwrap_or(trimmed)
}

/// Derive a target (table) name from a job id.
///
/// `Database\Seeders\BlogPostSeeder` becomes `blog_posts`: take the short
/// name, drop a trailing `Seeder`/`TableSeeder`/`Job`, snake-case it and
/// pluralise the last word.
pub fn derive_target_name(job_id: &str) -> String {
    let mut base = short_name(job_id);
    for suffix in ["TableSeeder", "Seeder", "Job"] {
        if let Some(stripped) = base.strip_suffix(suffix) {
            if !stripped.is_empty() {
                base = stripped;
                break;
            }
        }
    }
    let snake = to_snake_case(base);
    if snake.is_empty() {
        return job_id.to_string();
    }
    pluralize(&snake)
}

fn to_snake_case(name: &str) -> String {
    let chars: Vec<char> = name.chars().collect();
    let mut out = String::with_capacity(name.len() + 4);
    for (i, &c) in chars.iter().enumerate() {
        if c.is_uppercase() {
            let prev_lower = i > 0 && (chars[i - 1].is_lowercase() || chars[i - 1].is_ascii_digit());
            let next_lower = chars.get(i + 1).is_some_and(|n| n.is_lowercase());
            let prev_upper = i > 0 && chars[i - 1].is_uppercase();
            if prev_lower || (prev_upper && next_lower) {
                out.push('_');
            }
            out.extend(c.to_lowercase());
        } else if c == '-' || c == ' ' {
            out.push('_');
        } else {
            out.push(c);
        }
    }
    out
}

fn pluralize(snake: &str) -> String {
    if snake.ends_with('s') {
        return snake.to_string();
    }
    if snake.ends_with('x') || snake.ends_with("ch") || snake.ends_with("sh") {
        return format!("{snake}es");
    }
    if let Some(stem) = snake.strip_suffix('y') {
        let before = stem.chars().last();
        if before.is_some_and(|c| !"aeiou".contains(c)) {
            return format!("{stem}ies");
        }
    }
    format!("{snake}s")
}
