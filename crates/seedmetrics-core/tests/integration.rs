//! Integration tests for seedmetrics-core.
//!
//! These exercise the full pipeline through the public API:
//! job reporting → aggregation → rendering → run log.

use seedmetrics_core::{
    AggregateSnapshot, Distribution, LayoutEngine, MemoryThresholds, MetricsAggregator, Rating,
    ReportConfig, ReportInput, ReportRenderer, RunLog, RunMonitor, Section, SectionConfig,
    Segment, SharedAggregator, Theme, ThresholdConfig, markup,
};

fn aggregator() -> MetricsAggregator {
    MetricsAggregator::new(ThresholdConfig::default(), MemoryThresholds::default()).unwrap()
}

fn plain(width: usize) -> ReportRenderer {
    let mut config = ReportConfig::default();
    config.display.line_width = width;
    config.display.styling = false;
    ReportRenderer::new(&config)
        .unwrap()
        .with_theme(Theme::ascii())
}

/// A (1000 in 0.5s), B (100 in 1s), C registered but never produced anything.
fn three_jobs() -> MetricsAggregator {
    let mut agg = aggregator();
    agg.register("A", "a");
    agg.register("B", "b");
    agg.register("C", "c");
    agg.report_result("A", 1000, 0.5);
    agg.report_result("B", 100, 1.0);
    agg.report_result("C", 0, 0.0);
    agg
}

#[test]
fn aggregate_over_mixed_jobs() {
    let snap = three_jobs().snapshot();
    assert_eq!(snap.job_count, 3);
    assert_eq!(snap.active_job_count, 2);
    assert_eq!(snap.total_records, 1100);
    assert!((snap.total_time - 1.5).abs() < 1e-9);
    let fastest = snap.fastest.as_ref().unwrap();
    let slowest = snap.slowest.as_ref().unwrap();
    assert_eq!(fastest.job_id, "A");
    assert!((fastest.rate - 2000.0).abs() < 1e-9);
    assert_eq!(slowest.job_id, "B");
    assert!((slowest.rate - 100.0).abs() < 1e-9);
    assert!((snap.speed_variance_ratio - 1900.0).abs() < 1e-9);
    assert_eq!(snap.idle_jobs, vec!["C".to_string()]);
}

#[test]
fn rating_boundaries_are_strict() {
    let mut agg = aggregator();
    agg.report_result("exact", 1000, 1.0);
    agg.report_result("above", 1001, 1.0);
    agg.report_result("crawl", 5, 1.0);
    assert_eq!(agg.get_record("exact").unwrap().rating, Rating::Good);
    assert_eq!(agg.get_record("above").unwrap().rating, Rating::Excellent);
    assert_eq!(agg.get_record("crawl").unwrap().rating, Rating::VerySlow);
}

#[test]
fn rate_follows_records_and_time() {
    let mut agg = aggregator();
    let rec = agg.report_result("Job", 250, 0.25);
    assert!((rec.rate - 1000.0).abs() < 1e-9);
    assert!((rec.rate * rec.elapsed_seconds - rec.records_added as f64).abs() < 1e-6);
    let zero = agg.report_result("Zero", 10, 0.0);
    assert_eq!(zero.rate, 0.0);
}

#[test]
fn format_line_fills_to_exact_width() {
    let engine = LayoutEngine::new(20).unwrap().styled(false);
    let line = engine.format_line(&[Segment::plain("Name"), Segment::plain("Value")]);
    assert_eq!(line, format!("Name{}Value", ".".repeat(11)));
    assert_eq!(line.chars().count(), 20);
}

#[test]
fn styled_lines_have_the_same_visible_width() {
    let engine = LayoutEngine::new(40).unwrap();
    let line = engine.format_line(&[
        Segment::plain("<fg=green>Label</>"),
        Segment::plain("green{value}"),
    ]);
    assert!(line.contains('\u{1b}'));
    assert_eq!(markup::strip_ansi(&line).chars().count(), 40);
}

#[test]
fn single_bucket_distribution() {
    let snap = AggregateSnapshot {
        distribution: Distribution::from_ratings([Rating::Excellent; 7]),
        ..AggregateSnapshot::default()
    };
    let out = plain(120).distribution(&snap);
    assert!(out.contains("100% (7 seeders)"));
    assert_eq!(out.lines().count(), 3);
}

#[test]
fn empty_run_still_reports() {
    let agg = aggregator();
    let snap = agg.snapshot();
    assert_eq!(snap, AggregateSnapshot::default());
    let out = plain(80).render_aggregator(&agg);
    assert!(out.contains("SEEDING PERFORMANCE REPORT"));
    assert!(out.contains("Total records"));
    assert!(!out.contains("Performance Distribution"));
    assert!(!out.contains("Detailed Results"));
}

#[test]
fn snapshot_is_stable_without_new_reports() {
    let agg = three_jobs();
    assert_eq!(agg.snapshot(), agg.snapshot());
    let r = plain(100);
    assert_eq!(r.render_aggregator(&agg), r.render_aggregator(&agg));
}

#[test]
fn full_report_sections_in_order() {
    let agg = three_jobs();
    let out = plain(146).render_aggregator(&agg);
    let order = [
        "Summary",
        "Performance Distribution",
        "Top 2 Fastest Jobs",
        "Detailed Results",
        "Recommendations",
    ];
    let positions: Vec<usize> = order.iter().map(|t| out.find(t).unwrap()).collect();
    assert!(positions.windows(2).all(|w| w[0] < w[1]));
    // no host information was supplied
    assert!(!out.contains("System Information"));
    assert!(out.contains("No records produced by C"));
}

#[test]
fn every_line_fits_any_valid_width() {
    let mut agg = three_jobs();
    agg.report_memory("A", 80 * 1024 * 1024);
    agg.report_result(r"Database\Seeders\AVeryLongSeederNameThatKeepsGoingAndGoing", 42, 3.0);
    let snap = agg.snapshot();
    for width in [40, 41, 57, 80, 99, 146, 200] {
        let r = plain(width);
        let out = r.render(&ReportInput::new(agg.records(), &snap));
        for line in out.lines() {
            assert!(
                line.chars().count() <= width,
                "width {width}: {line:?} has {} columns",
                line.chars().count()
            );
        }
    }
}

#[test]
fn section_toggles_by_key() {
    let mut sections = SectionConfig::all();
    sections.set("detailed_table".parse::<Section>().unwrap(), false);
    let out = plain(120)
        .with_sections(sections)
        .render_aggregator(&three_jobs());
    assert!(!out.contains("Detailed Results"));
    assert!(out.contains("Recommendations"));
    assert!("no_such_section".parse::<Section>().is_err());
}

#[test]
fn shared_aggregator_across_threads() {
    let shared = SharedAggregator::new(aggregator());
    let handles: Vec<_> = (0..4)
        .map(|i| {
            let shared = shared.clone();
            std::thread::spawn(move || {
                shared.report_result(&format!("Job{i}"), 100, 1.0);
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }
    let snap = shared.snapshot();
    assert_eq!(snap.job_count, 4);
    assert_eq!(snap.total_records, 400);
}

#[test]
fn monitor_run_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let log = RunLog::new(dir.path().join("seed.log"));

    let mut config = ReportConfig::default();
    config.display.styling = false;
    let mut monitor = RunMonitor::with_output(config, Vec::new()).unwrap();
    monitor.register("UserSeeder", "users");
    monitor.time_job("UserSeeder", |progress| {
        progress.start(3);
        progress.advance(3);
        progress.finish();
        3
    });
    monitor.report_result("PostSeeder", 0, 0.0);

    let report = monitor.render_report();
    assert!(report.contains("UserSeeder"));
    monitor.log_summary(&log).unwrap();
    let snap = monitor.close();
    assert_eq!(snap.total_records, 3);
    assert_eq!(snap.job_count, 2);

    let content = std::fs::read_to_string(dir.path().join("seed.log")).unwrap();
    assert_eq!(content.lines().count(), 1);
    assert!(content.contains("Seeded 3 records"));
}
