//! `seedmetrics simulate`: synthetic seeding run with live progress.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use seedmetrics_core::record::derive_target_name;
use seedmetrics_core::{HostProbe, RunMonitor};

use super::{ReportOptions, append_log, load_config};

const BATCH: u64 = 50;
/// Longest a single synthetic job is allowed to run.
const MAX_JOB_SECS: f64 = 2.0;

const TABLES: &[&str] = &[
    "User", "Post", "Comment", "Tag", "Category", "Order", "Invoice", "Product", "Review",
    "Address", "Payment", "Session", "AuditLog", "Notification",
];

/// Synthetic job: how many records it inserts and how fast.
struct Plan {
    job_id: String,
    records: u64,
    rate: f64,
    row_bytes: usize,
}

fn plan_jobs(rng: &mut StdRng, jobs: usize, max_records: u64) -> Vec<Plan> {
    (0..jobs)
        .map(|i| {
            let table = TABLES[i % TABLES.len()];
            let job_id = if i < TABLES.len() {
                format!("Database\\Seeders\\{table}Seeder")
            } else {
                format!("Database\\Seeders\\{table}{}Seeder", i / TABLES.len() + 1)
            };
            // log-uniform between 2 and 5000 rec/s
            let rate = 10f64.powf(rng.random_range(0.3..3.7));
            let mut records = rng.random_range(0..=max_records);
            if records as f64 / rate > MAX_JOB_SECS {
                records = (rate * MAX_JOB_SECS) as u64;
            }
            Plan {
                job_id,
                records,
                rate,
                row_bytes: rng.random_range(64..4096),
            }
        })
        .collect()
}

/// Run the simulate command.
pub fn run(jobs: usize, max_records: u64, seed: Option<u64>, opts: &ReportOptions<'_>) {
    let config = load_config(opts);

    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };
    let plans = plan_jobs(&mut rng, jobs, max_records);

    let mut monitor = match RunMonitor::new(config) {
        Ok(m) => m
            .with_theme(opts.theme())
            .with_system_probe(Box::new(HostProbe)),
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };
    // Jobs never reached (Ctrl+C) still show up as producing nothing.
    monitor.discover_jobs(
        plans
            .iter()
            .map(|p| (p.job_id.as_str(), derive_target_name(&p.job_id))),
    );

    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    if let Err(e) = ctrlc::set_handler(move || {
        r.store(false, Ordering::SeqCst);
    }) {
        eprintln!("Warning: could not install Ctrl+C handler: {e}");
    }

    for plan in &plans {
        if !running.load(Ordering::SeqCst) {
            break;
        }
        eprintln!("Seeding {}", plan.job_id);
        monitor.time_job(&plan.job_id, |progress| {
            progress.start(plan.records);
            let mut rows: Vec<u8> = Vec::new();
            let mut done = 0u64;
            while done < plan.records {
                if !running.load(Ordering::SeqCst) {
                    progress.clear();
                    eprintln!("Interrupted after {done} records");
                    return done;
                }
                let batch = BATCH.min(plan.records - done);
                rows.resize(rows.len() + batch as usize * plan.row_bytes, 0xA5);
                std::thread::sleep(Duration::from_secs_f64(batch as f64 / plan.rate));
                for _ in 0..batch {
                    progress.advance(1);
                }
                done += batch;
            }
            std::hint::black_box(&rows);
            progress.finish();
            done
        });
    }

    let report = monitor.render_report();
    println!();
    print!("{report}");
    append_log(opts.log_path, &monitor.snapshot());
    monitor.close();
}
