//! Run-level facade used by a job orchestrator.
//!
//! A [`RunMonitor`] is created explicitly for one run and owns everything the
//! run needs: configuration, the aggregator, the live progress line, host and
//! memory probes and any externally computed health checks. [`RunMonitor::close`]
//! ends the run and hands back the final snapshot; dropping a monitor without
//! closing it only erases a progress line that is still on screen.

use std::io::{self, Write};

use crate::aggregator::MetricsAggregator;
use crate::config::{ReportConfig, SectionConfig, ThresholdConfig};
use crate::error::Result;
use crate::health::HealthCheck;
use crate::memory::{JobTimer, MemoryProbe, ProcessMemory};
use crate::probe::{NullProbe, SystemProbe};
use crate::progress::{ProgressIndicator, ProgressState};
use crate::record::MetricRecord;
use crate::report::{ReportInput, ReportRenderer};
use crate::run_log::{RunLog, summary_message};
use crate::snapshot::AggregateSnapshot;
use crate::theme::Theme;

pub struct RunMonitor<W: Write = io::Stderr> {
    config: ReportConfig,
    aggregator: MetricsAggregator,
    renderer: ReportRenderer,
    progress: ProgressIndicator<W>,
    system: Box<dyn SystemProbe>,
    memory: Box<dyn MemoryProbe>,
    checks: Vec<HealthCheck>,
}

impl RunMonitor<io::Stderr> {
    /// Monitor drawing progress on standard error.
    pub fn new(config: ReportConfig) -> Result<Self> {
        Self::with_output(config, io::stderr())
    }
}

impl<W: Write> RunMonitor<W> {
    /// Monitor drawing progress to `out`. Invalid configuration fails here,
    /// before any job runs.
    pub fn with_output(config: ReportConfig, out: W) -> Result<Self> {
        let renderer = ReportRenderer::new(&config)?;
        let aggregator = MetricsAggregator::new(config.thresholds, config.memory)?;
        let progress = ProgressIndicator::new(out, &config.progress).styled(config.display.styling);
        Ok(Self {
            config,
            aggregator,
            renderer,
            progress,
            system: Box::new(NullProbe),
            memory: Box::new(ProcessMemory),
            checks: Vec::new(),
        })
    }

    pub fn with_system_probe(mut self, probe: Box<dyn SystemProbe>) -> Self {
        self.system = probe;
        self
    }

    pub fn with_memory_probe(mut self, probe: Box<dyn MemoryProbe>) -> Self {
        self.memory = probe;
        self
    }

    pub fn with_theme(mut self, theme: Theme) -> Self {
        self.renderer.set_theme(theme);
        self.progress.set_theme(theme);
        self
    }

    pub fn config(&self) -> &ReportConfig {
        &self.config
    }

    pub fn thresholds(&self) -> &ThresholdConfig {
        self.aggregator.thresholds()
    }

    pub fn aggregator(&self) -> &MetricsAggregator {
        &self.aggregator
    }

    // -----------------------------------------------------------------------
    // Bookkeeping
    // -----------------------------------------------------------------------

    pub fn register(&mut self, job_id: &str, target_name: &str) -> &MetricRecord {
        self.aggregator.register(job_id, target_name)
    }

    pub fn report_result(
        &mut self,
        job_id: &str,
        records_added: u64,
        elapsed_seconds: f64,
    ) -> &MetricRecord {
        self.aggregator
            .report_result(job_id, records_added, elapsed_seconds)
    }

    pub fn report_memory(&mut self, job_id: &str, memory_delta_bytes: i64) -> &MetricRecord {
        self.aggregator.report_memory(job_id, memory_delta_bytes)
    }

    /// Register jobs that exist but may never run. Returns how many were new.
    pub fn discover_jobs<I, S, T>(&mut self, jobs: I) -> usize
    where
        I: IntoIterator<Item = (S, T)>,
        S: AsRef<str>,
        T: AsRef<str>,
    {
        self.aggregator.discover(jobs)
    }

    pub fn get_record(&self, job_id: &str) -> Option<&MetricRecord> {
        self.aggregator.get_record(job_id)
    }

    pub fn snapshot(&self) -> AggregateSnapshot {
        self.aggregator.snapshot()
    }

    /// Run `job`, measuring its time and memory, and report the record count it returns.
    ///
    /// The job receives the progress indicator so it can advance it.
    pub fn time_job<F>(&mut self, job_id: &str, job: F) -> &MetricRecord
    where
        F: FnOnce(&mut ProgressIndicator<W>) -> u64,
    {
        let timer = JobTimer::start(self.memory.as_ref());
        let records = job(&mut self.progress);
        let measurement = timer.stop();
        self.aggregator.report_memory(job_id, measurement.memory_delta_bytes);
        self.aggregator
            .report_result(job_id, records, measurement.elapsed_seconds())
    }

    /// Like [`time_job`](Self::time_job) for a fallible job. A failed job is
    /// recorded with zero records and its elapsed time, then the error is returned.
    pub fn try_time_job<F, E>(&mut self, job_id: &str, job: F) -> std::result::Result<&MetricRecord, E>
    where
        F: FnOnce(&mut ProgressIndicator<W>) -> std::result::Result<u64, E>,
    {
        let timer = JobTimer::start(self.memory.as_ref());
        let outcome = job(&mut self.progress);
        let measurement = timer.stop();
        if self.progress.state() == ProgressState::Running {
            self.progress.clear();
        }
        self.aggregator.report_memory(job_id, measurement.memory_delta_bytes);
        match outcome {
            Ok(records) => Ok(self.aggregator.report_result(
                job_id,
                records,
                measurement.elapsed_seconds(),
            )),
            Err(e) => {
                log::warn!("job '{job_id}' failed; recording it with no records");
                self.aggregator
                    .report_result(job_id, 0, measurement.elapsed_seconds());
                Err(e)
            }
        }
    }

    // -----------------------------------------------------------------------
    // Progress
    // -----------------------------------------------------------------------

    pub fn start_progress(&mut self, total: u64) {
        self.progress.start(total);
    }

    pub fn advance_progress(&mut self, n: u64) {
        self.progress.advance(n);
    }

    pub fn finish_progress(&mut self) {
        self.progress.finish();
    }

    pub fn clear_progress(&mut self) {
        self.progress.clear();
    }

    pub fn progress(&self) -> &ProgressIndicator<W> {
        &self.progress
    }

    // -----------------------------------------------------------------------
    // Reporting
    // -----------------------------------------------------------------------

    pub fn add_health_check(&mut self, check: HealthCheck) {
        self.checks.push(check);
    }

    pub fn add_health_checks(&mut self, checks: impl IntoIterator<Item = HealthCheck>) {
        self.checks.extend(checks);
    }

    /// Report with the configured sections.
    pub fn render_report(&self) -> String {
        self.render_report_with(self.config.sections)
    }

    /// Report with an explicit section selection.
    pub fn render_report_with(&self, sections: SectionConfig) -> String {
        let snapshot = self.aggregator.snapshot();
        let system = self.system.system_info();
        let mut checks = self.checks.clone();
        checks.extend(self.system.health_checks());
        let input = ReportInput::new(self.aggregator.records(), &snapshot)
            .with_system(system.as_ref())
            .with_checks(&checks);
        self.renderer.clone().with_sections(sections).render(&input)
    }

    /// Append a one-line digest of the run to `log`.
    pub fn log_summary(&self, log: &RunLog) -> Result<()> {
        log.append(&summary_message(&self.aggregator.snapshot()))
    }

    /// End the run: finish a running progress line and return the final snapshot.
    pub fn close(mut self) -> AggregateSnapshot {
        self.progress.finish();
        self.aggregator.snapshot()
    }
}

impl<W: Write> Drop for RunMonitor<W> {
    fn drop(&mut self) {
        if self.progress.state() == ProgressState::Running {
            self.progress.clear();
        }
    }
}
