//! Progress line formatting
//!
//! Renders status snapshots, kill outcomes and run banners as the console
//! lines the pipeline log shows.

use serde_json::Value;

use crate::config::ExecutionParameters;
use crate::models::ExecutionStatus;

/// Indentation of detail lines under an `EXECUTION STATUS:` line
const DETAIL_INDENT: usize = 27;

/// Width of the star rulers on each side of banner labels
const RULER_WIDTH: usize = 51;

/// Formats run progress for the pipeline log
#[derive(Clone, Copy, Debug)]
pub struct StatusFormatter {
    threshold: f64,
    verbose: bool,
}

impl StatusFormatter {
    pub fn new(threshold: f64, verbose: bool) -> Self {
        Self { threshold, verbose }
    }

    pub fn verbose(&self) -> bool {
        self.verbose
    }

    /// Status header, counts line and one line per test case
    pub fn format_status(&self, status: &ExecutionStatus) -> Vec<String> {
        let indent = " ".repeat(DETAIL_INDENT);
        let mut lines = vec![
            format!(
                "EXECUTION STATUS: Execution {} for Suite ID: {}",
                status.exec_status,
                status.suite_label()
            ),
            format!(
                "{indent}(Executed {} of {} testcase(s), execution percentage: {:.2} %, fail percentage: {:.2} %, threshold: {:.2} % )",
                status.executed_tcs,
                status.total_tcs,
                status.execution_percent(),
                status.failure_percent(),
                self.threshold
            ),
        ];

        lines.extend(status.results.iter().map(|tc| {
            format!(
                "{indent}{}: {} | TESTCASE {} (total steps: {})",
                tc.code,
                tc.name,
                tc.outcome.to_uppercase(),
                tc.total_steps
            )
        }));

        lines
    }

    /// Request/response dumps, empty unless verbose
    pub fn format_payloads(&self, request: &Value, response: Option<&Value>) -> Vec<String> {
        if !self.verbose {
            return Vec::new();
        }
        vec![
            format!("REQUEST BODY: {request}"),
            format!(
                "RESPONSE BODY: {}",
                response.map_or_else(|| "null".to_string(), Value::to_string)
            ),
        ]
    }

    pub fn format_terminated(&self, status: &ExecutionStatus) -> String {
        format!(
            "EXECUTION STATUS: Execution {} for Suite ID: {} was terminated.",
            status.exec_status,
            status.suite_label()
        )
    }

    pub fn format_kill(&self, killed: bool) -> String {
        if killed {
            "EXECUTION STATUS: SUCCESSFUL to explicitly kill the execution!".to_string()
        } else {
            "EXECUTION STATUS: FAILED to explicitly kill the execution!".to_string()
        }
    }
}

/// Banner and parameter echo printed before the run starts
pub fn format_parameters(params: &ExecutionParameters, base_url: &str, suffix: usize) -> Vec<String> {
    let stars = "*".repeat(38);
    vec![
        format!("{stars}  SIMPLIFYQA PIPELINE EXECUTOR  {stars}"),
        "The Set Parameters are:".to_string(),
        format!("Execution Token: {}", params.masked_token(suffix)),
        format!("App Url: {base_url}"),
        format!("Threshold: {} %", params.threshold),
        format!("Verbose: {}", params.verbose),
        "*".repeat(RULER_WIDTH * 2),
    ]
}

pub fn format_report_url(url: &str) -> String {
    format!("REPORT URL: {url}")
}

/// End-of-run marker
pub fn eof_marker() -> String {
    format!("{}EOF{}", "*".repeat(RULER_WIDTH), "*".repeat(RULER_WIDTH))
}
