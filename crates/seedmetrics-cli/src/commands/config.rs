//! `seedmetrics config`: print the effective configuration.

use super::{ReportOptions, load_config};

/// Run the config command.
pub fn run(config_path: Option<&str>, width: Option<usize>) {
    let config = load_config(&ReportOptions {
        config_path,
        width,
        no_color: false,
        ascii: false,
        disable: &[],
        log_path: None,
    });
    match serde_json::to_string_pretty(&config) {
        Ok(json) => println!("{json}"),
        Err(e) => {
            eprintln!("Error serializing config: {e}");
            std::process::exit(1);
        }
    }
}
