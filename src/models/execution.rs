//! Remote execution models
//!
//! Defines the run handle, execution state and status snapshot types
//! reported by the test-automation service.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Execution state as reported by the service
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ExecState {
    NotStarted,
    InProgress,
    Completed,
    Killed,
    Other(String),
}

impl ExecState {
    /// Wire name of the state
    pub fn as_str(&self) -> &str {
        match self {
            ExecState::NotStarted => "NOT_STARTED",
            ExecState::InProgress => "INPROGRESS",
            ExecState::Completed => "COMPLETED",
            ExecState::Killed => "KILLED",
            ExecState::Other(s) => s.as_str(),
        }
    }

    pub fn is_in_progress(&self) -> bool {
        matches!(self, ExecState::InProgress)
    }

    /// The remote run has stopped and will not report further progress
    pub fn is_terminal(&self) -> bool {
        matches!(self, ExecState::Completed | ExecState::Killed)
    }
}

impl From<String> for ExecState {
    fn from(s: String) -> Self {
        match s.trim().to_uppercase().as_str() {
            "NOT_STARTED" | "NOTSTARTED" => ExecState::NotStarted,
            "INPROGRESS" | "IN_PROGRESS" => ExecState::InProgress,
            "COMPLETED" => ExecState::Completed,
            "KILLED" => ExecState::Killed,
            _ => ExecState::Other(s),
        }
    }
}

impl From<ExecState> for String {
    fn from(state: ExecState) -> Self {
        state.as_str().to_string()
    }
}

impl Default for ExecState {
    fn default() -> Self {
        ExecState::NotStarted
    }
}

impl fmt::Display for ExecState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identity of a triggered remote run
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunHandle {
    #[serde(rename = "id", deserialize_with = "de_id")]
    pub execution_id: String,
    #[serde(default, deserialize_with = "de_id")]
    pub cust_id: String,
    #[serde(default, deserialize_with = "de_id")]
    pub project_id: String,
    #[serde(default, deserialize_with = "de_id")]
    pub suite_id: String,
    #[serde(default)]
    pub report_url: Option<String>,
}

impl RunHandle {
    pub fn new(execution_id: impl Into<String>) -> Self {
        Self {
            execution_id: execution_id.into(),
            cust_id: String::new(),
            project_id: String::new(),
            suite_id: String::new(),
            report_url: None,
        }
    }

    pub fn with_suite(mut self, cust_id: impl Into<String>, suite_id: impl Into<String>) -> Self {
        self.cust_id = cust_id.into();
        self.suite_id = suite_id.into();
        self
    }
}

/// Outcome of a single remote test case
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TestCaseResult {
    #[serde(rename = "tcCode", default, deserialize_with = "de_id")]
    pub code: String,
    #[serde(rename = "tcName", default, deserialize_with = "de_or_default")]
    pub name: String,
    #[serde(rename = "result", default, deserialize_with = "de_or_default")]
    pub outcome: String,
    #[serde(rename = "totalSteps", default, deserialize_with = "de_or_default")]
    pub total_steps: u32,
}

impl TestCaseResult {
    pub fn new(
        code: impl Into<String>,
        name: impl Into<String>,
        outcome: impl Into<String>,
        total_steps: u32,
    ) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
            outcome: outcome.into(),
            total_steps,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self.outcome.to_lowercase().as_str(), "failed" | "fail")
    }
}

/// Point-in-time status of a remote run
///
/// Percentages the service omits are derived from the counts and the
/// per-test-case outcomes of the same snapshot.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionStatus {
    #[serde(default, deserialize_with = "de_or_default")]
    pub exec_status: ExecState,
    #[serde(default, deserialize_with = "de_id")]
    pub cust_id: String,
    #[serde(default, deserialize_with = "de_id")]
    pub suite_id: String,
    #[serde(default, deserialize_with = "de_or_default")]
    pub total_tcs: u32,
    #[serde(default, deserialize_with = "de_or_default")]
    pub executed_tcs: u32,
    #[serde(rename = "result", default, deserialize_with = "de_or_default")]
    pub results: Vec<TestCaseResult>,
    #[serde(default)]
    pub exec_percent: Option<f64>,
    #[serde(default)]
    pub fail_percent: Option<f64>,
    #[serde(default)]
    pub report_url: Option<String>,
}

impl ExecutionStatus {
    pub fn new(exec_status: ExecState, total_tcs: u32, executed_tcs: u32) -> Self {
        Self {
            exec_status,
            total_tcs,
            executed_tcs,
            ..Default::default()
        }
    }

    pub fn with_fail_percent(mut self, fail_percent: f64) -> Self {
        self.fail_percent = Some(fail_percent);
        self
    }

    pub fn with_result(mut self, result: TestCaseResult) -> Self {
        self.results.push(result);
        self
    }

    /// Suite label as shown to users, e.g. `SU-1042`
    pub fn suite_label(&self) -> String {
        format!("SU-{}{}", self.cust_id, self.suite_id)
    }

    pub fn execution_percent(&self) -> f64 {
        self.exec_percent
            .unwrap_or_else(|| percent(self.executed_tcs as usize, self.total_tcs))
    }

    pub fn failure_percent(&self) -> f64 {
        self.fail_percent.unwrap_or_else(|| {
            let failed = self.results.iter().filter(|r| r.is_failed()).count();
            percent(failed, self.total_tcs)
        })
    }

    /// Whether this snapshot breaches the given threshold
    pub fn breaches(&self, threshold: f64) -> bool {
        self.failure_percent() >= threshold
    }
}

fn percent(part: usize, total: u32) -> f64 {
    if total == 0 {
        0.0
    } else {
        (part as f64 / total as f64) * 100.0
    }
}

/// Treat an explicit JSON `null` like a missing field
fn de_or_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Accept identifiers sent either as JSON numbers or strings
fn de_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Int(i64),
        Float(f64),
        Text(String),
    }

    Ok(match Option::<RawId>::deserialize(deserializer)? {
        Some(RawId::Int(n)) => n.to_string(),
        Some(RawId::Float(n)) => n.to_string(),
        Some(RawId::Text(s)) => s,
        None => String::new(),
    })
}
