//! Configuration module
//!
//! Handles task inputs, their validation, and the executor's tunables.

mod env;
mod file;
mod params;

pub use env::EnvConfig;
pub use file::ConfigFile;
pub use params::{validate, ExecutionParameters, RawInputs, ValidatedParameters, EXEC_TOKEN_LENGTH};

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// App URL used when the APPURL input is missing or invalid
pub const DEFAULT_APP_URL: &str = "https://simplifyqa.app";

/// Application configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Polling behaviour
    pub poller: PollerConfig,

    /// Remote service endpoints
    pub api: ApiConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            poller: PollerConfig::default(),
            api: ApiConfig::default(),
        }
    }
}

/// Status polling configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct PollerConfig {
    /// Delay between two status polls in milliseconds
    pub poll_interval_ms: u64,

    /// Maximum status fetches while waiting for a triggered run to
    /// materialize. `None` waits forever.
    pub initial_poll_attempts: Option<u32>,

    /// Number of trigger calls before giving up
    pub trigger_attempts: u32,

    /// Trailing token characters shown in the parameter echo
    pub token_display_suffix: usize,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 5000,
            initial_poll_attempts: Some(120),
            trigger_attempts: 1,
            token_display_suffix: 18,
        }
    }
}

impl PollerConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn with_poll_interval_ms(mut self, ms: u64) -> Self {
        self.poll_interval_ms = ms;
        self
    }

    pub fn with_initial_poll_attempts(mut self, attempts: Option<u32>) -> Self {
        self.initial_poll_attempts = attempts;
        self
    }

    pub fn with_trigger_attempts(mut self, attempts: u32) -> Self {
        self.trigger_attempts = attempts;
        self
    }
}

/// Remote test-automation service endpoints
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL used when the APPURL input resolves to the default
    pub default_app_url: String,

    /// HTTP timeout in seconds
    pub timeout_secs: u64,

    pub trigger_path: String,
    pub status_path: String,
    pub kill_path: String,

    /// Report page path; `{execution_id}` is substituted
    pub report_path: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            default_app_url: DEFAULT_APP_URL.to_string(),
            timeout_secs: 30,
            trigger_path: "/Kiwi/api/v1/pipeline/execution/trigger".to_string(),
            status_path: "/Kiwi/api/v1/pipeline/execution/status".to_string(),
            kill_path: "/Kiwi/api/v1/pipeline/execution/kill".to_string(),
            report_path: "/#/reports/executions/{execution_id}".to_string(),
        }
    }
}

impl ApiConfig {
    /// Resolve the base URL for a validated APPURL input
    pub fn base_url(&self, app_url: &str) -> String {
        let base = if app_url.is_empty() {
            self.default_app_url.as_str()
        } else {
            app_url
        };
        base.trim_end_matches('/').to_string()
    }

    pub fn report_url(&self, base_url: &str, execution_id: &str) -> String {
        format!(
            "{}{}",
            base_url,
            self.report_path.replace("{execution_id}", execution_id)
        )
    }
}
