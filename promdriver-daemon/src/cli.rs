//! CLI argument definitions for the promdriver daemon.
//!
//! Uses `clap` v4 derive macros to parse command-line arguments.

use std::path::PathBuf;

use clap::Parser;

use promdriver_core::config::GeneralConfig;

/// Scrape Prometheus endpoints and write the samples to Google Cloud Monitoring.
#[derive(Parser, Debug)]
#[command(name = "promdriver")]
#[command(version, about, long_about = None)]
pub struct DaemonCli {
    /// Path to promdriver.toml (a `.json` file is read in the legacy target-array format).
    #[arg(short, long, default_value = "/etc/promdriver/promdriver.toml")]
    pub config: PathBuf,

    /// Override log level (trace, debug, info, warn, error).
    ///
    /// Takes precedence over the config file and environment variables.
    #[arg(long)]
    pub log_level: Option<String>,

    /// Override log format (json, pretty).
    ///
    /// Takes precedence over the config file and environment variables.
    #[arg(long)]
    pub log_format: Option<String>,

    /// Shorthand for `--log-level debug --log-format pretty`.
    #[arg(long)]
    pub debug: bool,

    /// Validate configuration, print the resolved targets and exit.
    #[arg(long)]
    pub validate: bool,
}

impl DaemonCli {
    /// Apply logging overrides to the `[general]` section.
    ///
    /// `--debug` is applied first so explicit `--log-level`/`--log-format` still win.
    pub fn apply_overrides(&self, general: &mut GeneralConfig) {
        if self.debug {
            general.log_level = "debug".to_owned();
            general.log_format = "pretty".to_owned();
        }
        if let Some(level) = &self.log_level {
            general.log_level.clone_from(level);
        }
        if let Some(format) = &self.log_format {
            general.log_format.clone_from(format);
        }
    }
}
