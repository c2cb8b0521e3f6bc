//! Keyed collection of job records.
//!
//! The aggregator is single-threaded: the orchestrator runs jobs one after the
//! other and reports each result as it finishes. [`SharedAggregator`] wraps it
//! in a mutex for runners that execute jobs concurrently; snapshots taken
//! through it are computed from a consistent view under the lock.

use std::cell::OnceCell;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::config::{MemoryThresholds, ThresholdConfig};
use crate::error::Result;
use crate::record::{MetricRecord, derive_target_name};
use crate::snapshot::AggregateSnapshot;

/// Owns every [`MetricRecord`] of a run, in registration order.
#[derive(Debug, Clone, Default)]
pub struct MetricsAggregator {
    records: Vec<MetricRecord>,
    index: HashMap<String, usize>,
    thresholds: ThresholdConfig,
    memory: MemoryThresholds,
    cache: OnceCell<AggregateSnapshot>,
}

impl MetricsAggregator {
    /// Aggregator classifying with the given thresholds (validated).
    pub fn new(thresholds: ThresholdConfig, memory: MemoryThresholds) -> Result<Self> {
        thresholds.validate()?;
        memory.validate()?;
        Ok(Self {
            thresholds,
            memory,
            ..Self::default()
        })
    }

    pub fn thresholds(&self) -> &ThresholdConfig {
        &self.thresholds
    }

    pub fn memory_thresholds(&self) -> &MemoryThresholds {
        &self.memory
    }

    /// Register a job with zeroed counters.
    ///
    /// Re-registering an id resets its record in place; it keeps its original
    /// position in the display order.
    pub fn register(&mut self, job_id: &str, target_name: &str) -> &MetricRecord {
        self.invalidate();
        let record = MetricRecord::new(job_id, target_name);
        let idx = match self.index.get(job_id) {
            Some(&idx) => {
                log::debug!("re-registering job '{job_id}'");
                self.records[idx] = record;
                idx
            }
            None => {
                self.records.push(record);
                let idx = self.records.len() - 1;
                self.index.insert(job_id.to_string(), idx);
                idx
            }
        };
        &self.records[idx]
    }

    /// Register a job whose target name is derived from its id.
    pub fn register_job(&mut self, job_id: &str) -> &MetricRecord {
        let target = derive_target_name(job_id);
        self.register(job_id, &target)
    }

    /// Register jobs that exist but may never report. Already known ids are left alone.
    pub fn discover<I, S, T>(&mut self, jobs: I) -> usize
    where
        I: IntoIterator<Item = (S, T)>,
        S: AsRef<str>,
        T: AsRef<str>,
    {
        let mut added = 0;
        for (job_id, target) in jobs {
            if !self.index.contains_key(job_id.as_ref()) {
                self.register(job_id.as_ref(), target.as_ref());
                added += 1;
            }
        }
        added
    }

    /// Record a job's outcome, registering it first if it is unknown.
    pub fn report_result(
        &mut self,
        job_id: &str,
        records_added: u64,
        elapsed_seconds: f64,
    ) -> &MetricRecord {
        let idx = self.ensure(job_id);
        self.invalidate();
        self.records[idx].apply_result(records_added, elapsed_seconds, &self.thresholds, &self.memory);
        &self.records[idx]
    }

    /// Record a job's memory delta, registering it first if it is unknown.
    pub fn report_memory(&mut self, job_id: &str, memory_delta_bytes: i64) -> &MetricRecord {
        let idx = self.ensure(job_id);
        self.invalidate();
        self.records[idx].apply_memory(memory_delta_bytes, &self.memory);
        &self.records[idx]
    }

    fn ensure(&mut self, job_id: &str) -> usize {
        if let Some(&idx) = self.index.get(job_id) {
            return idx;
        }
        log::debug!("implicitly registering unreported job '{job_id}'");
        self.register_job(job_id);
        self.records.len() - 1
    }

    /// Look up a job. Unknown ids yield `None`.
    pub fn get_record(&self, job_id: &str) -> Option<&MetricRecord> {
        self.index.get(job_id).map(|&idx| &self.records[idx])
    }

    /// All records in registration order.
    pub fn records(&self) -> &[MetricRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Aggregate statistics, computed on first request after a change.
    pub fn snapshot(&self) -> AggregateSnapshot {
        self.cache
            .get_or_init(|| AggregateSnapshot::compute(&self.records, &self.thresholds, &self.memory))
            .clone()
    }

    /// Drop every record.
    pub fn clear(&mut self) {
        self.records.clear();
        self.index.clear();
        self.invalidate();
    }

    fn invalidate(&mut self) {
        self.cache = OnceCell::new();
    }
}

/// Mutex-guarded aggregator for concurrent job runners.
#[derive(Debug, Clone, Default)]
pub struct SharedAggregator {
    inner: Arc<Mutex<MetricsAggregator>>,
}

impl SharedAggregator {
    pub fn new(aggregator: MetricsAggregator) -> Self {
        Self {
            inner: Arc::new(Mutex::new(aggregator)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, MetricsAggregator> {
        // A panicking job must not take the report down with it.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn register(&self, job_id: &str, target_name: &str) {
        self.lock().register(job_id, target_name);
    }

    pub fn report_result(&self, job_id: &str, records_added: u64, elapsed_seconds: f64) {
        self.lock()
            .report_result(job_id, records_added, elapsed_seconds);
    }

    pub fn report_memory(&self, job_id: &str, memory_delta_bytes: i64) {
        self.lock().report_memory(job_id, memory_delta_bytes);
    }

    pub fn get_record(&self, job_id: &str) -> Option<MetricRecord> {
        self.lock().get_record(job_id).cloned()
    }

    /// Snapshot computed under the lock.
    pub fn snapshot(&self) -> AggregateSnapshot {
        self.lock().snapshot()
    }

    /// Consistent copy of the whole aggregator, e.g. for rendering.
    pub fn frozen(&self) -> MetricsAggregator {
        self.lock().clone()
    }
}
