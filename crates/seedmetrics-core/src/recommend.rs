//! Improvement suggestions derived from an aggregate snapshot.
//!
//! Rules are independent: every rule that applies contributes one message, in
//! the fixed order of [`Rule::ALL`]. When none applies a single positive
//! message is returned, so the list is never empty.

use std::fmt;

use crate::format::format_number;
use crate::record::short_name;
use crate::snapshot::AggregateSnapshot;

/// Returned when no rule fires.
pub const ALL_CLEAR: &str =
    "All jobs performed within expected ranges. No changes recommended.";

/// Individual recommendation rules, in evaluation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Rule {
    /// At least one job rated Slow or Very Slow.
    Batching,
    /// Fastest job much faster than the slowest.
    ReviewSlowJobs,
    /// Overall throughput rated Slow or Very Slow.
    Indexing,
    /// Many jobs in one run.
    Parallelism,
    /// Jobs with Excessive or Critical memory per record.
    MemoryChunking,
    /// Registered jobs that produced nothing.
    IdleJobs,
}

impl Rule {
    pub const ALL: [Rule; 6] = [
        Rule::Batching,
        Rule::ReviewSlowJobs,
        Rule::Indexing,
        Rule::Parallelism,
        Rule::MemoryChunking,
        Rule::IdleJobs,
    ];

    pub fn key(self) -> &'static str {
        match self {
            Self::Batching => "batching",
            Self::ReviewSlowJobs => "review_slow_jobs",
            Self::Indexing => "indexing",
            Self::Parallelism => "parallelism",
            Self::MemoryChunking => "memory_chunking",
            Self::IdleJobs => "idle_jobs",
        }
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Rule evaluator. Pure: identical snapshots yield identical output.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RecommendationEngine {
    /// Fastest/slowest rate ratio above which slow jobs should be reviewed.
    pub rate_ratio_limit: f64,
    /// Job count above which parallel execution is suggested.
    pub parallel_job_count: usize,
    /// Job names listed per message before eliding the rest.
    pub max_listed: usize,
}

impl Default for RecommendationEngine {
    fn default() -> Self {
        Self {
            rate_ratio_limit: 5.0,
            parallel_job_count: 10,
            max_listed: 5,
        }
    }
}

impl RecommendationEngine {
    /// Messages for every applicable rule, or [`ALL_CLEAR`].
    pub fn recommend(&self, snapshot: &AggregateSnapshot) -> Vec<String> {
        let fired: Vec<String> = self
            .evaluate(snapshot)
            .into_iter()
            .map(|(_, message)| message)
            .collect();
        if fired.is_empty() {
            vec![ALL_CLEAR.to_string()]
        } else {
            fired
        }
    }

    /// Applicable rules with their messages, in evaluation order.
    pub fn evaluate(&self, snapshot: &AggregateSnapshot) -> Vec<(Rule, String)> {
        Rule::ALL
            .into_iter()
            .filter_map(|rule| self.apply(rule, snapshot).map(|m| (rule, m)))
            .collect()
    }

    fn apply(&self, rule: Rule, s: &AggregateSnapshot) -> Option<String> {
        match rule {
            Rule::Batching => (s.poor_job_count > 0).then(|| {
                format!(
                    "{} {} rated Slow or Very Slow: insert records in batches \
                     (chunks of 500-1000 rows) instead of one at a time.",
                    s.poor_job_count,
                    plural(s.poor_job_count, "job", "jobs"),
                )
            }),
            Rule::ReviewSlowJobs => {
                let ratio = s.rate_ratio()?;
                let slowest = s.slowest.as_ref()?;
                (ratio > self.rate_ratio_limit).then(|| {
                    format!(
                        "The fastest job is {}x faster than the slowest ({}): \
                         review slow jobs for per-record queries or lookups.",
                        format_number(ratio, 1),
                        short_name(&slowest.job_id),
                    )
                })
            }
            Rule::Indexing => s.overall_rating.is_poor().then(|| {
                format!(
                    "Overall throughput is {}: review indexes and foreign-key \
                     checks on the target tables, or disable them while seeding.",
                    s.overall_rating.label(),
                )
            }),
            Rule::Parallelism => (s.job_count > self.parallel_job_count).then(|| {
                format!(
                    "{} jobs ran sequentially: independent jobs could run in parallel.",
                    s.job_count
                )
            }),
            Rule::MemoryChunking => (!s.heavy_memory_jobs.is_empty()).then(|| {
                format!(
                    "High memory use per record in {}: process data in chunks and \
                     release references between batches.",
                    self.list(&s.heavy_memory_jobs),
                )
            }),
            Rule::IdleJobs => (!s.idle_jobs.is_empty()).then(|| {
                format!(
                    "No records produced by {}: check that {} wired up or remove {}.",
                    self.list(&s.idle_jobs),
                    plural(s.idle_jobs.len(), "it is", "they are"),
                    plural(s.idle_jobs.len(), "it", "them"),
                )
            }),
        }
    }

    fn list(&self, jobs: &[String]) -> String {
        let shown = jobs.len().min(self.max_listed.max(1));
        let mut out = jobs[..shown]
            .iter()
            .map(|j| short_name(j))
            .collect::<Vec<_>>()
            .join(", ");
        let hidden = jobs.len() - shown;
        if hidden > 0 {
            out.push_str(&format!(", {hidden} more"));
        }
        out
    }
}

fn plural<'a>(n: usize, one: &'a str, many: &'a str) -> &'a str {
    if n == 1 { one } else { many }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rating::Rating;
    use crate::snapshot::JobRate;

    fn healthy() -> AggregateSnapshot {
        AggregateSnapshot {
            job_count: 2,
            active_job_count: 2,
            total_records: 3000,
            total_time: 2.0,
            overall_rate: 1500.0,
            overall_rating: Rating::Excellent,
            fastest: Some(JobRate {
                job_id: "A".into(),
                rate: 2000.0,
            }),
            slowest: Some(JobRate {
                job_id: "B".into(),
                rate: 1000.0,
            }),
            ..AggregateSnapshot::default()
        }
    }

    #[test]
    fn nothing_fires_gives_single_positive_message() {
        let out = RecommendationEngine::default().recommend(&healthy());
        assert_eq!(out, vec![ALL_CLEAR.to_string()]);
        let empty = RecommendationEngine::default().recommend(&AggregateSnapshot::default());
        assert_eq!(empty, vec![ALL_CLEAR.to_string()]);
    }

    #[test]
    fn rules_fire_independently_in_order() {
        let mut s = healthy();
        s.poor_job_count = 2;
        s.slowest = Some(JobRate {
            job_id: r"Database\Seeders\SlowSeeder".into(),
            rate: 5.0,
        });
        s.overall_rating = Rating::VerySlow;
        s.job_count = 12;
        s.heavy_memory_jobs = vec!["Big".into()];
        s.idle_jobs = vec!["Empty".into()];

        let fired: Vec<Rule> = RecommendationEngine::default()
            .evaluate(&s)
            .into_iter()
            .map(|(r, _)| r)
            .collect();
        assert_eq!(fired, Rule::ALL.to_vec());

        let messages = RecommendationEngine::default().recommend(&s);
        assert_eq!(messages.len(), 6);
        assert!(messages[0].starts_with("2 jobs rated"));
        assert!(messages[1].contains("400.0x"));
        assert!(messages[1].contains("(SlowSeeder)"));
        assert!(messages[2].contains("Very Slow"));
        assert!(messages[5].contains("check that it is wired up"));
    }

    #[test]
    fn ratio_limit_is_strict() {
        let mut s = healthy();
        s.slowest = Some(JobRate {
            job_id: "B".into(),
            rate: 400.0,
        });
        // exactly 5x does not fire
        assert!(RecommendationEngine::default().evaluate(&s).is_empty());
        s.slowest = Some(JobRate {
            job_id: "B".into(),
            rate: 399.0,
        });
        let fired = RecommendationEngine::default().evaluate(&s);
        assert_eq!(fired[0].0, Rule::ReviewSlowJobs);
    }

    #[test]
    fn ten_jobs_is_not_many() {
        let mut s = healthy();
        s.job_count = 10;
        assert!(RecommendationEngine::default().evaluate(&s).is_empty());
        s.job_count = 11;
        assert_eq!(
            RecommendationEngine::default().evaluate(&s)[0].0,
            Rule::Parallelism
        );
    }

    #[test]
    fn long_lists_are_elided() {
        let mut s = healthy();
        s.idle_jobs = (0..8).map(|i| format!("Job{i}")).collect();
        let engine = RecommendationEngine {
            max_listed: 3,
            ..RecommendationEngine::default()
        };
        let out = engine.recommend(&s);
        assert!(out[0].starts_with("No records produced by Job0, Job1, Job2, 5 more:"));
    }

    #[test]
    fn deterministic() {
        let mut s = healthy();
        s.poor_job_count = 1;
        let engine = RecommendationEngine::default();
        assert_eq!(engine.recommend(&s), engine.recommend(&s));
        assert!(engine.recommend(&s)[0].starts_with("1 job rated"));
    }
}
