pub mod config;
pub mod report;
pub mod simulate;

use std::path::Path;

use seedmetrics_core::{
    AggregateSnapshot, ReportConfig, ReportConfigOverrides, RunLog, Theme, merge,
};

/// Rendering options common to `report` and `simulate`.
pub struct ReportOptions<'a> {
    pub config_path: Option<&'a str>,
    pub width: Option<usize>,
    pub no_color: bool,
    pub ascii: bool,
    pub disable: &'a [String],
    pub log_path: Option<&'a str>,
}

impl ReportOptions<'_> {
    pub fn theme(&self) -> Theme {
        if self.ascii { Theme::ascii() } else { Theme::default() }
    }
}

/// Merge defaults, the `--config` file and command-line flags. Exits on invalid input.
pub fn load_config(opts: &ReportOptions<'_>) -> ReportConfig {
    let external = match opts.config_path {
        Some(path) => match ReportConfigOverrides::from_path(Path::new(path)) {
            Ok(o) => o,
            Err(e) => {
                eprintln!("Error reading config '{path}': {e}");
                std::process::exit(1);
            }
        },
        None => ReportConfigOverrides::default(),
    };

    let mut flags = ReportConfigOverrides::default();
    if let Some(width) = opts.width {
        flags.display_mut().line_width = Some(width);
    }
    if opts.no_color || std::env::var_os("NO_COLOR").is_some() {
        flags.display_mut().styling = Some(false);
    }
    for key in opts.disable {
        if let Err(e) = flags.sections_mut().set_key(key, false) {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    }

    match merge(ReportConfig::default(), &external, &flags) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    }
}

/// Append the run digest to `--log`, if given. Failure only warns.
pub fn append_log(path: Option<&str>, snapshot: &AggregateSnapshot) {
    let Some(path) = path else {
        return;
    };
    let log = RunLog::new(path);
    if let Err(e) = log.append(&seedmetrics_core::run_log::summary_message(snapshot)) {
        eprintln!("Warning: could not write run log '{path}': {e}");
    }
}
