//! CLI for seedmetrics: seeding performance reports in the terminal.

mod commands;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "seedmetrics")]
#[command(about = "seedmetrics: measure seeding jobs and render console performance reports")]
#[command(version = seedmetrics_core::VERSION)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Report options shared by every command that renders.
#[derive(clap::Args)]
struct ReportArgs {
    /// JSON file with configuration overrides (thresholds, display, sections, progress)
    #[arg(long)]
    config: Option<String>,

    /// Report line width in columns (minimum 40)
    #[arg(long)]
    width: Option<usize>,

    /// Emit plain text without ANSI styling
    #[arg(long)]
    no_color: bool,

    /// Use ASCII glyphs for rules, bars and icons
    #[arg(long)]
    ascii: bool,

    /// Disable a report section by key (repeatable): performance_distribution,
    /// performance_charts, detailed_table, system_info, recommendations
    #[arg(long, value_name = "SECTION")]
    disable: Vec<String>,

    /// Append a one-line run summary to this log file
    #[arg(long)]
    log: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Render a report from recorded job results (JSON array).
    Report {
        /// Path to the job results file; `-` reads standard input
        #[arg(long, default_value = "-")]
        input: String,

        /// JSON file of externally computed health checks
        #[arg(long)]
        check: Option<String>,

        /// Include host information and a load check
        #[arg(long)]
        system: bool,

        #[command(flatten)]
        report: ReportArgs,
    },

    /// Run synthetic jobs with live progress, then print the report.
    /// Ctrl+C stops early and reports the jobs completed so far.
    Simulate {
        /// Number of jobs
        #[arg(long, default_value = "8")]
        jobs: usize,

        /// Upper bound of records per job
        #[arg(long, default_value = "5000")]
        records: u64,

        /// RNG seed for reproducible runs
        #[arg(long)]
        seed: Option<u64>,

        #[command(flatten)]
        report: ReportArgs,
    },

    /// Print the effective configuration as JSON.
    Config {
        /// JSON file with configuration overrides
        #[arg(long)]
        config: Option<String>,

        /// Report line width in columns
        #[arg(long)]
        width: Option<usize>,
    },
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Report {
            input,
            check,
            system,
            report,
        } => commands::report::run(&input, check.as_deref(), system, &report.options()),
        Commands::Simulate {
            jobs,
            records,
            seed,
            report,
        } => commands::simulate::run(jobs, records, seed, &report.options()),
        Commands::Config { config, width } => commands::config::run(config.as_deref(), width),
    }
}

impl ReportArgs {
    fn options(&self) -> commands::ReportOptions<'_> {
        commands::ReportOptions {
            config_path: self.config.as_deref(),
            width: self.width,
            no_color: self.no_color,
            ascii: self.ascii,
            disable: &self.disable,
            log_path: self.log.as_deref(),
        }
    }
}
