//! Typed access to the remote execution endpoints
//!
//! Every endpoint answers with an [`ApiResponse`]: a payload, a "not ready
//! yet" marker, or an error description. Transport failures never escape as
//! errors; the poller decides what a failed call means for the run.

use serde_json::{json, Value};
use std::fmt;
use tracing::debug;

use super::client::{HttpClient, HttpError, HttpResponse};
use crate::config::ApiConfig;
use crate::models::{ExecutionStatus, RunHandle};

/// Longest response excerpt carried in an error description
const ERROR_BODY_EXCERPT: usize = 200;

/// Tagged endpoint response
#[derive(Clone, Debug, PartialEq)]
pub enum ApiResponse<T> {
    Success(T),
    NotReady,
    Error(String),
}

impl<T> ApiResponse<T> {
    pub fn is_success(&self) -> bool {
        matches!(self, ApiResponse::Success(_))
    }

    pub fn success(self) -> Option<T> {
        match self {
            ApiResponse::Success(value) => Some(value),
            _ => None,
        }
    }
}

/// Remote endpoints
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Endpoint {
    Trigger,
    Status,
    Kill,
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Endpoint::Trigger => write!(f, "trigger"),
            Endpoint::Status => write!(f, "status"),
            Endpoint::Kill => write!(f, "kill"),
        }
    }
}

/// A started run together with the body it was parsed from
#[derive(Clone, Debug, PartialEq)]
pub struct TriggerReceipt {
    pub run: RunHandle,
    pub raw: Value,
}

/// One status read together with the body it was parsed from
#[derive(Clone, Debug, PartialEq)]
pub struct StatusSnapshot {
    pub status: ExecutionStatus,
    pub raw: Value,
}

/// Operations the poller needs from the execution service
pub trait ExecutionApi {
    /// Start a run of the suite bound to the execution token
    async fn trigger(&self) -> ApiResponse<TriggerReceipt>;

    /// Fetch the latest status of a run
    async fn status(&self, run: &RunHandle) -> ApiResponse<StatusSnapshot>;

    /// Ask the service to stop a run
    async fn kill(&self, run: &RunHandle) -> ApiResponse<Value>;

    /// Request body sent to `endpoint`, with the token masked, for verbose dumps
    fn request_payload(&self, endpoint: Endpoint, run: Option<&RunHandle>) -> Value;

    /// Report page of a run
    fn report_url(&self, run: &RunHandle, status: Option<&ExecutionStatus>) -> String;
}

/// HTTP implementation of [`ExecutionApi`]
pub struct ServiceClient {
    http: HttpClient,
    api: ApiConfig,
    token: String,
    token_suffix: usize,
}

impl ServiceClient {
    pub fn new(
        api: ApiConfig,
        app_url: &str,
        token: impl Into<String>,
        token_suffix: usize,
    ) -> Result<Self, HttpError> {
        let http = HttpClient::with_timeout(api.base_url(app_url), api.timeout_secs)?;
        Ok(Self {
            http,
            api,
            token: token.into(),
            token_suffix,
        })
    }

    fn path(&self, endpoint: Endpoint) -> &str {
        match endpoint {
            Endpoint::Trigger => &self.api.trigger_path,
            Endpoint::Status => &self.api.status_path,
            Endpoint::Kill => &self.api.kill_path,
        }
    }

    fn payload(&self, token: &str, endpoint: Endpoint, run: Option<&RunHandle>) -> Value {
        match (endpoint, run) {
            (Endpoint::Trigger, _) | (_, None) => json!({ "token": token }),
            (_, Some(run)) => json!({
                "token": token,
                "customerId": run.cust_id,
                "projectId": run.project_id,
                "executionId": run.execution_id,
            }),
        }
    }

    async fn call(&self, endpoint: Endpoint, run: Option<&RunHandle>) -> Result<Value, String> {
        let body = self.payload(&self.token, endpoint, run);
        let response = self.http.post_json(self.path(endpoint), &body).await;
        read_body(endpoint, response)
    }
}

impl ExecutionApi for ServiceClient {
    async fn trigger(&self) -> ApiResponse<TriggerReceipt> {
        match self.call(Endpoint::Trigger, None).await {
            Ok(body) => parse_trigger(body),
            Err(reason) => ApiResponse::Error(reason),
        }
    }

    async fn status(&self, run: &RunHandle) -> ApiResponse<StatusSnapshot> {
        match self.call(Endpoint::Status, Some(run)).await {
            Ok(body) => parse_status(body),
            Err(reason) => ApiResponse::Error(reason),
        }
    }

    async fn kill(&self, run: &RunHandle) -> ApiResponse<Value> {
        match self.call(Endpoint::Kill, Some(run)).await {
            Ok(body) => ApiResponse::Success(body),
            Err(reason) => ApiResponse::Error(reason),
        }
    }

    fn request_payload(&self, endpoint: Endpoint, run: Option<&RunHandle>) -> Value {
        let masked = mask(&self.token, self.token_suffix);
        self.payload(&masked, endpoint, run)
    }

    fn report_url(&self, run: &RunHandle, status: Option<&ExecutionStatus>) -> String {
        status
            .and_then(|s| s.report_url.clone())
            .or_else(|| run.report_url.clone())
            .unwrap_or_else(|| self.api.report_url(self.http.base_url(), &run.execution_id))
    }
}

/// Turn an HTTP exchange into a JSON body or an error description
fn read_body(endpoint: Endpoint, response: Result<HttpResponse, HttpError>) -> Result<Value, String> {
    let response = response.map_err(|e| format!("{endpoint} request failed: {e}"))?;

    if !response.is_success() {
        let excerpt: String = response.body.chars().take(ERROR_BODY_EXCERPT).collect();
        return Err(format!(
            "{endpoint} returned HTTP {}: {excerpt}",
            response.status_code
        ));
    }

    debug!("{} answered in {}ms", endpoint, response.duration_ms);

    if response.body.trim().is_empty() {
        return Ok(Value::Null);
    }
    serde_json::from_str(&response.body)
        .map_err(|e| format!("{endpoint} returned an unreadable body: {e}"))
}

/// The service nests payloads as `{ data: { data: ... } }`
fn inner_payload(body: &Value) -> Option<&Value> {
    body.pointer("/data/data").filter(|inner| !inner.is_null())
}

/// Parse a trigger response body
pub fn parse_trigger(body: Value) -> ApiResponse<TriggerReceipt> {
    let Some(inner) = inner_payload(&body) else {
        return ApiResponse::NotReady;
    };
    if inner.get("id").map_or(true, Value::is_null) {
        return ApiResponse::NotReady;
    }

    match serde_json::from_value(inner.clone()) {
        Ok(run) => ApiResponse::Success(TriggerReceipt { run, raw: body }),
        Err(e) => ApiResponse::Error(format!("trigger returned an unexpected payload: {e}")),
    }
}

/// Parse a status response body
pub fn parse_status(body: Value) -> ApiResponse<StatusSnapshot> {
    let Some(inner) = inner_payload(&body) else {
        return ApiResponse::NotReady;
    };

    match serde_json::from_value::<ExecutionStatus>(inner.clone()) {
        Ok(status) => ApiResponse::Success(StatusSnapshot { status, raw: body }),
        Err(e) => ApiResponse::Error(format!("status returned an unexpected payload: {e}")),
    }
}

fn mask(token: &str, suffix: usize) -> String {
    let chars: Vec<char> = token.chars().collect();
    let keep = suffix.min(chars.len());
    let hidden = chars.len() - keep;
    let visible: String = chars[hidden..].iter().collect();
    format!("{}{}", "*".repeat(hidden), visible)
}
