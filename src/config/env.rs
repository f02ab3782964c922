//! Environment variable configuration
//!
//! Reads the task inputs the pipeline runner exposes as `INPUT_<NAME>`
//! variables, plus the executor's own overrides.

use std::env;

use super::RawInputs;

/// Prefix the pipeline runner uses for task inputs
const INPUT_PREFIX: &str = "INPUT";

/// Config file path override
pub const CONFIG_ENV_VAR: &str = "SUITE_EXECUTOR_CONFIG";

/// Task inputs and overrides read from the environment
#[derive(Clone, Debug, Default)]
pub struct EnvConfig {
    /// Execution token from INPUT_EXECTOKEN
    pub exec_token: Option<String>,
    /// App URL from INPUT_APPURL
    pub app_url: Option<String>,
    /// Threshold from INPUT_THRESHOLD
    pub threshold: Option<String>,
    /// Verbose flag from INPUT_VERBOSE
    pub verbose: Option<String>,
    /// Config file from SUITE_EXECUTOR_CONFIG
    pub config_file: Option<String>,
}

impl EnvConfig {
    /// Load configuration from environment variables
    pub fn load() -> Self {
        Self {
            exec_token: get_input("EXECTOKEN"),
            app_url: get_input("APPURL"),
            threshold: get_input("THRESHOLD"),
            verbose: get_input("VERBOSE"),
            config_file: non_empty(env::var(CONFIG_ENV_VAR).ok()),
        }
    }

    /// Task inputs, with explicit values taking precedence
    pub fn inputs_with(&self, overrides: RawInputs) -> RawInputs {
        RawInputs {
            exec_token: overrides.exec_token.or_else(|| self.exec_token.clone()),
            app_url: overrides.app_url.or_else(|| self.app_url.clone()),
            threshold: overrides.threshold.or_else(|| self.threshold.clone()),
            verbose: overrides.verbose.or_else(|| self.verbose.clone()),
        }
    }
}

/// Get a task input variable; empty values count as absent
fn get_input(name: &str) -> Option<String> {
    non_empty(env::var(format!("{INPUT_PREFIX}_{name}")).ok())
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}
