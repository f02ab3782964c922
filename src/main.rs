//! Suite Pipeline Executor - CI gate for remote test-suite executions
//!
//! A pipeline task that starts a test-suite execution on a remote
//! test-automation service, streams its progress into the build log, and
//! turns the outcome into a task result and exit code.
//!
//! ## Features
//!
//! - Fail-percentage threshold that aborts the run early
//! - Remote kill when the run is stopped or fails completely
//! - Graceful handling of SIGINT/SIGTERM from the pipeline agent
//! - Optional request/response dumps for troubleshooting
//!
//! ## Usage
//!
//! ```bash
//! # Inputs come from the pipeline runner
//! INPUT_EXECTOKEN=... INPUT_THRESHOLD=20 suite-pipeline-executor
//!
//! # Or from flags
//! suite-pipeline-executor --exec-token ... --app-url https://qa.example.com --threshold 20
//!
//! # With a tuned poller
//! suite-pipeline-executor --config ci/suite-executor.yaml
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{debug, error, info};

mod cli;
mod config;
mod executor;
mod http;
mod models;
mod output;
mod utils;

use cli::Args;
use config::{ConfigFile, EnvConfig};
use executor::{listen_for_signals, Poller, RunOutcome};
use http::ServiceClient;
use models::TaskResult;
use output::{eof_marker, format_parameters, report_result};

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    utils::init_logger(args.log_level);

    match run(args).await {
        Ok(outcome) => {
            debug!("Poller stopped in state {:?}", outcome.state);
            report_result(outcome.result, outcome.result.message());
            ExitCode::from(outcome.exit_code)
        }
        Err(e) => {
            error!("{:#}", e);
            info!("{}", eof_marker());
            report_result(TaskResult::Failed, &format!("{e:#}"));
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> Result<RunOutcome> {
    let env = EnvConfig::load();

    let config_path = args
        .config
        .clone()
        .or_else(|| env.config_file.as_ref().map(PathBuf::from));
    let config = ConfigFile::resolve(config_path.as_deref())?;

    let validated = config::validate(env.inputs_with(args.inputs()))?;
    if validated.has_warnings {
        debug!("Defaulted inputs: {}", validated.defaulted.join(", "));
    }

    let api = config.app.api;
    let poller_config = config.app.poller;
    let base_url = api.base_url(&validated.params.app_url);

    for line in format_parameters(
        &validated.params,
        &base_url,
        poller_config.token_display_suffix,
    ) {
        info!("{}", line);
    }

    let client = ServiceClient::new(
        api,
        &validated.params.app_url,
        validated.params.exec_token.clone(),
        poller_config.token_display_suffix,
    )
    .with_context(|| format!("Failed to create client for {base_url}"))?;

    let shutdown = listen_for_signals();
    let outcome = Poller::new(client, poller_config, validated, shutdown)
        .run()
        .await
        .context("Execution Failed!")?;

    Ok(outcome)
}
