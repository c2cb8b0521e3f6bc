//! Aggregate statistics derived from all job records.
//!
//! A snapshot is recomputed from the records every time it is requested; it is
//! never updated incrementally, so it cannot drift from the records it
//! describes.

use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;

use crate::config::{MemoryThresholds, ThresholdConfig};
use crate::rating::{MemoryRating, Rating, classify_memory, classify_rate};
use crate::record::{MetricRecord, compute_rate};

/// A job identified together with its throughput.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobRate {
    pub job_id: String,
    pub rate: f64,
}

/// A job identified together with its memory delta.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobMemory {
    pub job_id: String,
    pub bytes: i64,
}

/// Job count per rating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Distribution {
    counts: [usize; 6],
}

impl Distribution {
    pub fn from_ratings(ratings: impl IntoIterator<Item = Rating>) -> Self {
        let mut dist = Self::default();
        for rating in ratings {
            dist.counts[rating.index()] += 1;
        }
        dist
    }

    pub fn get(&self, rating: Rating) -> usize {
        self.counts[rating.index()]
    }

    /// Jobs with a throughput rating (everything except NotApplicable).
    pub fn active_total(&self) -> usize {
        Rating::ACTIVE.iter().map(|&r| self.get(r)).sum()
    }

    /// `(rating, count)` for every rating, best first, including zeros.
    pub fn iter(&self) -> impl Iterator<Item = (Rating, usize)> + '_ {
        Rating::ALL.into_iter().map(|r| (r, self.get(r)))
    }

    pub fn is_empty(&self) -> bool {
        self.counts.iter().all(|&c| c == 0)
    }
}

/// Point-in-time aggregate over every registered job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateSnapshot {
    pub job_count: usize,
    /// Jobs with `records_added > 0`.
    pub active_job_count: usize,
    pub total_records: u64,
    pub total_time: f64,
    /// `total_records / total_time`, 0 when no time elapsed.
    pub overall_rate: f64,
    pub overall_rating: Rating,
    /// Highest-rate active job; ties keep the first registered.
    pub fastest: Option<JobRate>,
    /// Lowest-rate active job; ties keep the first registered.
    pub slowest: Option<JobRate>,
    /// Mean rate over jobs with a positive rate.
    pub mean_rate: f64,
    /// Population standard deviation of rates over jobs with a positive rate.
    pub rate_std_dev: f64,
    /// `fastest / slowest * 100 - 100`, 0 when the slowest rate is 0.
    pub speed_variance_ratio: f64,
    pub distribution: Distribution,
    /// Active jobs rated Slow or VerySlow.
    pub poor_job_count: usize,
    pub total_memory_delta_bytes: i64,
    /// Largest memory growth of any job.
    pub peak_memory: Option<JobMemory>,
    /// Memory rating of the run as a whole (total delta over total records).
    pub overall_memory_rating: MemoryRating,
    /// Jobs rated Excessive or Critical for memory, in registration order.
    pub heavy_memory_jobs: Vec<String>,
    /// Registered jobs that produced no records, in registration order.
    pub idle_jobs: Vec<String>,
}

impl Default for AggregateSnapshot {
    fn default() -> Self {
        Self {
            job_count: 0,
            active_job_count: 0,
            total_records: 0,
            total_time: 0.0,
            overall_rate: 0.0,
            overall_rating: Rating::NotApplicable,
            fastest: None,
            slowest: None,
            mean_rate: 0.0,
            rate_std_dev: 0.0,
            speed_variance_ratio: 0.0,
            distribution: Distribution::default(),
            poor_job_count: 0,
            total_memory_delta_bytes: 0,
            peak_memory: None,
            overall_memory_rating: MemoryRating::NotApplicable,
            heavy_memory_jobs: Vec::new(),
            idle_jobs: Vec::new(),
        }
    }
}

impl AggregateSnapshot {
    /// Compute the aggregate over `records` (in registration order).
    pub fn compute(
        records: &[MetricRecord],
        thresholds: &ThresholdConfig,
        memory: &MemoryThresholds,
    ) -> Self {
        if records.is_empty() {
            return Self::default();
        }

        let total_records: u64 = records.iter().map(|r| r.records_added).sum();
        let total_time: f64 = records.iter().map(|r| r.elapsed_seconds).sum();
        let overall_rate = compute_rate(total_records, total_time);
        let total_memory_delta_bytes: i64 = records.iter().map(|r| r.memory_delta_bytes).sum();

        let mut fastest: Option<&MetricRecord> = None;
        let mut slowest: Option<&MetricRecord> = None;
        for r in records.iter().filter(|r| r.is_active()) {
            if fastest.is_none_or(|f| r.rate > f.rate) {
                fastest = Some(r);
            }
            if slowest.is_none_or(|s| r.rate < s.rate) {
                slowest = Some(r);
            }
        }

        let positive: Vec<f64> = records
            .iter()
            .filter(|r| r.rate > 0.0)
            .map(|r| r.rate)
            .collect();
        let (mean_rate, rate_std_dev) = if positive.is_empty() {
            (0.0, 0.0)
        } else {
            let mean = positive.iter().mean();
            let std_dev = positive.iter().population_std_dev();
            (finite_or_zero(mean), finite_or_zero(std_dev))
        };

        let speed_variance_ratio = match (fastest, slowest) {
            (Some(f), Some(s)) if s.rate > 0.0 => (f.rate / s.rate) * 100.0 - 100.0,
            _ => 0.0,
        };

        let mut peak_memory: Option<&MetricRecord> = None;
        for r in records {
            if peak_memory.is_none_or(|p| r.memory_delta_bytes > p.memory_delta_bytes) {
                peak_memory = Some(r);
            }
        }

        let distribution = Distribution::from_ratings(records.iter().map(|r| r.rating));
        let poor_job_count = distribution.get(Rating::Slow) + distribution.get(Rating::VerySlow);

        Self {
            job_count: records.len(),
            active_job_count: records.iter().filter(|r| r.is_active()).count(),
            total_records,
            total_time,
            overall_rate,
            overall_rating: classify_rate(overall_rate, total_records, thresholds),
            fastest: fastest.map(job_rate),
            slowest: slowest.map(job_rate),
            mean_rate,
            rate_std_dev,
            speed_variance_ratio,
            distribution,
            poor_job_count,
            total_memory_delta_bytes,
            peak_memory: peak_memory.map(|r| JobMemory {
                job_id: r.job_id.clone(),
                bytes: r.memory_delta_bytes,
            }),
            overall_memory_rating: classify_memory(
                total_memory_delta_bytes,
                total_records,
                memory,
            ),
            heavy_memory_jobs: records
                .iter()
                .filter(|r| r.memory_rating.is_heavy())
                .map(|r| r.job_id.clone())
                .collect(),
            idle_jobs: records
                .iter()
                .filter(|r| !r.is_active())
                .map(|r| r.job_id.clone())
                .collect(),
        }
    }

    /// `fastest / slowest`, when both exist and the slowest rate is positive.
    pub fn rate_ratio(&self) -> Option<f64> {
        match (&self.fastest, &self.slowest) {
            (Some(f), Some(s)) if s.rate > 0.0 => Some(f.rate / s.rate),
            _ => None,
        }
    }

    /// Average milliseconds per record over the whole run.
    pub fn ms_per_record(&self) -> Option<f64> {
        (self.total_records > 0).then(|| self.total_time * 1000.0 / self.total_records as f64)
    }
}

fn job_rate(r: &MetricRecord) -> JobRate {
    JobRate {
        job_id: r.job_id.clone(),
        rate: r.rate,
    }
}

fn finite_or_zero(v: f64) -> f64 {
    if v.is_finite() { v } else { 0.0 }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str, records: u64, secs: f64) -> MetricRecord {
        let mut r = MetricRecord::new(id, id.to_lowercase());
        r.apply_result(
            records,
            secs,
            &ThresholdConfig::default(),
            &MemoryThresholds::default(),
        );
        r
    }

    fn compute(records: &[MetricRecord]) -> AggregateSnapshot {
        AggregateSnapshot::compute(
            records,
            &ThresholdConfig::default(),
            &MemoryThresholds::default(),
        )
    }

    #[test]
    fn empty_is_neutral() {
        let s = compute(&[]);
        assert_eq!(s.total_records, 0);
        assert_eq!(s.overall_rate, 0.0);
        assert!(s.fastest.is_none());
        assert!(s.slowest.is_none());
        assert!(s.distribution.is_empty());
        assert_eq!(s.overall_rating, Rating::NotApplicable);
        assert_eq!(s.rate_ratio(), None);
    }

    #[test]
    fn extrema_skip_idle_jobs() {
        let s = compute(&[
            record("A", 1000, 0.5),
            record("B", 100, 1.0),
            record("C", 0, 0.0),
        ]);
        assert_eq!(s.total_records, 1100);
        assert_eq!(s.active_job_count, 2);
        let fastest = s.fastest.unwrap();
        assert_eq!(fastest.job_id, "A");
        assert!((fastest.rate - 2000.0).abs() < 1e-9);
        let slowest = s.slowest.unwrap();
        assert_eq!(slowest.job_id, "B");
        assert!((slowest.rate - 100.0).abs() < 1e-9);
        assert_eq!(s.idle_jobs, vec!["C".to_string()]);
        assert!((s.speed_variance_ratio - 1900.0).abs() < 1e-9);
    }

    #[test]
    fn ties_keep_first_registered() {
        let s = compute(&[
            record("first", 100, 1.0),
            record("second", 100, 1.0),
        ]);
        assert_eq!(s.fastest.unwrap().job_id, "first");
        assert_eq!(s.slowest.unwrap().job_id, "first");
        assert_eq!(s.speed_variance_ratio, 0.0);
    }

    #[test]
    fn population_std_dev() {
        // rates 100, 200, 300 -> population variance 6666.67
        let s = compute(&[
            record("a", 100, 1.0),
            record("b", 200, 1.0),
            record("c", 300, 1.0),
        ]);
        assert!((s.mean_rate - 200.0).abs() < 1e-9);
        assert!((s.rate_std_dev - (20000.0_f64 / 3.0).sqrt()).abs() < 1e-9);
    }

    #[test]
    fn overall_rate_invariant() {
        let s = compute(&[record("a", 300, 2.0), record("b", 100, 2.0)]);
        assert!((s.overall_rate - s.total_records as f64 / s.total_time).abs() < 1e-9);
        assert_eq!(s.overall_rating, Rating::Slow);
    }

    #[test]
    fn distribution_sums_to_active_jobs() {
        let s = compute(&[
            record("a", 5000, 1.0),
            record("b", 600, 1.0),
            record("c", 50, 1.0),
            record("d", 0, 0.0),
        ]);
        assert_eq!(s.distribution.active_total(), s.active_job_count);
        assert_eq!(s.distribution.get(Rating::Excellent), 1);
        assert_eq!(s.distribution.get(Rating::Good), 1);
        assert_eq!(s.distribution.get(Rating::Slow), 1);
        assert_eq!(s.distribution.get(Rating::NotApplicable), 1);
        assert_eq!(s.poor_job_count, 1);
    }

    #[test]
    fn zero_rate_slowest_gives_zero_variance_ratio() {
        let s = compute(&[record("a", 100, 1.0), record("b", 100, 0.0)]);
        assert_eq!(s.slowest.as_ref().unwrap().job_id, "b");
        assert_eq!(s.speed_variance_ratio, 0.0);
        assert_eq!(s.rate_ratio(), None);
    }

    #[test]
    fn memory_aggregates() {
        let m = MemoryThresholds::default();
        let t = ThresholdConfig::default();
        let mut a = record("a", 10, 1.0);
        a.apply_memory(10 * 200_000, &m);
        let mut b = record("b", 1000, 1.0);
        b.apply_memory(-5000, &m);
        let s = AggregateSnapshot::compute(&[a, b], &t, &m);
        assert_eq!(s.total_memory_delta_bytes, 2_000_000 - 5000);
        assert_eq!(s.peak_memory.unwrap().job_id, "a");
        assert_eq!(s.heavy_memory_jobs, vec!["a".to_string()]);
    }
}
