//! CLI argument parsing
//!
//! Defines command-line interface using clap. Every task input can also be
//! supplied by the pipeline runner through `INPUT_<NAME>` variables; flags
//! take precedence.

use clap::Parser;
use std::path::PathBuf;

use crate::config::RawInputs;
use crate::utils::LogLevel;

/// Trigger a remote test-suite execution and gate the pipeline on its result
#[derive(Parser, Debug)]
#[command(name = "suite-pipeline-executor")]
#[command(version)]
#[command(about = "Trigger a remote test-suite execution and gate the pipeline on its result")]
#[command(long_about = None)]
pub struct Args {
    /// Execution token (EXECTOKEN)
    #[arg(long)]
    pub exec_token: Option<String>,

    /// Application URL of the test-automation service (APPURL)
    #[arg(long)]
    pub app_url: Option<String>,

    /// Fail percentage at which the run is aborted, 0-100 (THRESHOLD)
    #[arg(long)]
    pub threshold: Option<String>,

    /// Dump request and response bodies, true/false (VERBOSE)
    #[arg(long, value_name = "BOOL")]
    pub verbose_payloads: Option<String>,

    /// Configuration file (YAML or JSON)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    pub log_level: LogLevel,
}

impl Args {
    /// Task inputs given on the command line
    pub fn inputs(&self) -> RawInputs {
        RawInputs {
            exec_token: self.exec_token.clone(),
            app_url: self.app_url.clone(),
            threshold: self.threshold.clone(),
            verbose: self.verbose_payloads.clone(),
        }
    }
}
