//! # seedmetrics-core
//!
//! Performance accounting and console reporting for batch data-generation
//! ("seeding") runs.
//!
//! An orchestrator reports each job's record count, elapsed time and memory
//! delta. The library rates every job, aggregates the run, and renders a
//! fixed-width console report with a summary, distribution, top-N chart,
//! detailed table, host information and rule-based recommendations.
//!
//! ## Quick Start
//!
//! ```no_run
//! use seedmetrics_core::{ReportConfig, RunMonitor};
//!
//! let mut monitor = RunMonitor::new(ReportConfig::default()).unwrap();
//! monitor.time_job("UserSeeder", |progress| {
//!     progress.start(1000);
//!     for _ in 0..1000 {
//!         progress.advance(1);
//!     }
//!     progress.finish();
//!     1000
//! });
//! println!("{}", monitor.render_report());
//! ```
//!
//! ## Architecture
//!
//! Jobs → [`MetricsAggregator`] → [`AggregateSnapshot`] → [`ReportRenderer`]
//!
//! Every line of the report goes through the [`LayoutEngine`], which measures
//! visible width with styling markup excluded, so rows stay exactly as wide as
//! the configured line width whether or not colour is emitted.

pub mod aggregator;
pub mod config;
pub mod error;
pub mod format;
pub mod health;
pub mod layout;
pub mod markup;
pub mod memory;
pub mod monitor;
pub mod probe;
pub mod progress;
pub mod rating;
pub mod recommend;
pub mod record;
pub mod report;
pub mod run_log;
pub mod snapshot;
pub mod theme;

pub use aggregator::{MetricsAggregator, SharedAggregator};
pub use config::{
    DisplayConfig, MemoryThresholds, ProgressConfig, ReportConfig, ReportConfigOverrides, Section,
    SectionConfig, ThresholdConfig, merge,
};
pub use error::{ReportError, Result};
pub use health::{HealthCheck, HealthTally, Severity, load_checks};
pub use layout::{Align, FillPolicy, LayoutEngine, Segment};
pub use markup::Color;
pub use memory::{JobMeasurement, JobTimer, MemoryProbe, NoMemory, ProcessMemory};
pub use monitor::RunMonitor;
pub use probe::{HostProbe, NullProbe, SystemInfo, SystemProbe};
pub use progress::{ProgressIndicator, ProgressState};
pub use rating::{MemoryRating, Rating};
pub use recommend::{RecommendationEngine, Rule};
pub use record::MetricRecord;
pub use report::{ReportInput, ReportRenderer};
pub use run_log::RunLog;
pub use snapshot::{AggregateSnapshot, Distribution, JobMemory, JobRate};
pub use theme::Theme;

/// Library version (from Cargo.toml).
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
