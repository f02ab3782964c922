//! Remote execution poller
//!
//! Drives one remote run from trigger to final result: start the run, wait
//! for it to report a status, poll on a fixed interval until it leaves
//! `INPROGRESS` or breaches the fail threshold, then decide the task result.

use serde_json::Value;
use std::ops::ControlFlow;
use thiserror::Error;
use tracing::{debug, info, warn};

use super::session::RunSession;
use super::shutdown::{Interrupt, ShutdownSignal};
use crate::config::{PollerConfig, ValidatedParameters};
use crate::http::{ApiResponse, Endpoint, ExecutionApi, TriggerReceipt};
use crate::models::{ExecState, RunHandle, TaskResult};
use crate::output::{eof_marker, format_report_url, StatusFormatter};

const WARNINGS_MESSAGE: &str =
    "Execution performed successfully with resolved values. Please change the values to avoid future warnings.";

/// Poller lifecycle
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PollerState {
    Starting,
    PollingInitial,
    PollingActive,
    StoppedNormal,
    StoppedThreshold,
    StoppedKilled,
    StoppedInterrupted,
}

/// Failures that end the task before a result can be derived from the run
#[derive(Error, Debug)]
pub enum PollerError {
    #[error("Remote execution could not be started: {0}")]
    TriggerFailed(String),

    #[error("Remote execution did not report a status after {0} attempts")]
    NeverMaterialized(u32),
}

/// Final result of a run
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RunOutcome {
    pub result: TaskResult,
    pub exit_code: u8,
    pub state: PollerState,
}

/// Status-polling state machine for a single remote run
pub struct Poller<A: ExecutionApi> {
    api: A,
    config: PollerConfig,
    session: RunSession,
    formatter: StatusFormatter,
    shutdown: ShutdownSignal,
    state: PollerState,
}

impl<A: ExecutionApi> Poller<A> {
    pub fn new(
        api: A,
        config: PollerConfig,
        validated: ValidatedParameters,
        shutdown: ShutdownSignal,
    ) -> Self {
        let formatter =
            StatusFormatter::new(validated.params.threshold, validated.params.verbose);
        Self {
            api,
            config,
            session: RunSession::new(validated.params, validated.has_warnings),
            formatter,
            shutdown,
            state: PollerState::Starting,
        }
    }

    /// Run the remote execution to completion
    pub async fn run(mut self) -> Result<RunOutcome, PollerError> {
        let run = match self.start().await? {
            ControlFlow::Continue(run) => run,
            ControlFlow::Break(interrupt) => return Ok(self.shutdown_before_run(interrupt)),
        };

        if let ControlFlow::Break(interrupt) = self.poll_initial(&run).await? {
            return Ok(self.graceful_shutdown(&run, interrupt).await);
        }

        let outcome = match self.poll_active(&run).await {
            ControlFlow::Continue(()) => self.finalize(&run).await,
            ControlFlow::Break(interrupt) => self.graceful_shutdown(&run, interrupt).await,
        };

        info!(
            "Run finished in {}s with result {}",
            self.session.elapsed_secs(),
            outcome.result
        );
        Ok(outcome)
    }

    fn transition(&mut self, next: PollerState) {
        debug!("Poller state {:?} -> {:?}", self.state, next);
        self.state = next;
    }

    /// Wait one poll interval unless an interrupt arrives first
    async fn pause(&mut self) -> ControlFlow<Interrupt> {
        if let Some(interrupt) = self.shutdown.current() {
            return ControlFlow::Break(interrupt);
        }

        let delay = self.config.poll_interval();
        tokio::select! {
            _ = tokio::time::sleep(delay) => ControlFlow::Continue(()),
            interrupt = self.shutdown.wait() => ControlFlow::Break(interrupt),
        }
    }

    /// Trigger the remote run
    async fn start(&mut self) -> Result<ControlFlow<Interrupt, RunHandle>, PollerError> {
        self.transition(PollerState::Starting);

        let attempts = self.config.trigger_attempts.max(1);
        let mut last_failure = String::from("no run identifier returned");

        for attempt in 1..=attempts {
            if attempt > 1 {
                if let ControlFlow::Break(interrupt) = self.pause().await {
                    return Ok(ControlFlow::Break(interrupt));
                }
            }

            let response = self.api.trigger().await;
            let body = match &response {
                ApiResponse::Success(receipt) => Some(&receipt.raw),
                _ => None,
            };
            self.log_payloads(Endpoint::Trigger, None, body);

            match response {
                ApiResponse::Success(TriggerReceipt { run, .. }) => {
                    info!("Triggered remote execution {}", run.execution_id);
                    return Ok(ControlFlow::Continue(run));
                }
                ApiResponse::NotReady => {
                    warn!(
                        "Trigger attempt {}/{} returned no run identifier",
                        attempt, attempts
                    );
                    last_failure = String::from("no run identifier returned");
                }
                ApiResponse::Error(reason) => {
                    warn!("Trigger attempt {}/{} failed: {}", attempt, attempts, reason);
                    last_failure = reason;
                }
            }
        }

        Err(PollerError::TriggerFailed(last_failure))
    }

    /// Fetch one status; returns whether a fresh snapshot was recorded
    async fn poll_once(&mut self, run: &RunHandle, initial: bool) -> bool {
        match self.api.status(run).await {
            ApiResponse::Success(snapshot) => {
                self.session.record(snapshot);
                true
            }
            ApiResponse::NotReady if initial => {
                debug!("Execution {} has not reported a status yet", run.execution_id);
                false
            }
            ApiResponse::NotReady => {
                warn!("Status unavailable, keeping previous snapshot");
                false
            }
            ApiResponse::Error(reason) if initial => {
                debug!("Initial status poll failed: {}", reason);
                false
            }
            ApiResponse::Error(reason) => {
                warn!("Status poll failed, keeping previous snapshot: {}", reason);
                false
            }
        }
    }

    /// Wait for the triggered run to report its first status
    async fn poll_initial(
        &mut self,
        run: &RunHandle,
    ) -> Result<ControlFlow<Interrupt>, PollerError> {
        self.transition(PollerState::PollingInitial);
        info!("EXECUTION STATUS: INITIALIZING TESTCASES in the triggered suite");

        let mut attempts = 0u32;
        loop {
            attempts += 1;
            if self.poll_once(run, true).await {
                break;
            }
            if let Some(max) = self.config.initial_poll_attempts {
                if attempts >= max {
                    return Err(PollerError::NeverMaterialized(attempts));
                }
            }
            if let ControlFlow::Break(interrupt) = self.pause().await {
                return Ok(ControlFlow::Break(interrupt));
            }
        }

        self.render_status(run);
        Ok(ControlFlow::Continue(()))
    }

    fn should_continue(&self) -> bool {
        self.session.is_in_progress() && !self.session.breached() && !self.session.is_killed()
    }

    /// Poll until the run leaves `INPROGRESS`, breaches the threshold or is
    /// interrupted
    async fn poll_active(&mut self, run: &RunHandle) -> ControlFlow<Interrupt> {
        self.transition(PollerState::PollingActive);

        while self.should_continue() {
            let previous = self.session.executed_tcs();

            if let ControlFlow::Break(interrupt) = self.pause().await {
                return ControlFlow::Break(interrupt);
            }

            if self.poll_once(run, false).await && self.session.executed_tcs() > previous {
                self.render_status(run);
            }
        }

        if self.session.breached() {
            info!("THRESHOLD REACHED!");
        }
        ControlFlow::Continue(())
    }

    /// Explicitly stop the remote run; returns whether the service accepted
    async fn kill(&mut self, run: &RunHandle) -> bool {
        let response = self.api.kill(run).await;

        let body = match &response {
            ApiResponse::Success(body) => Some(body.clone()),
            ApiResponse::NotReady => None,
            ApiResponse::Error(reason) => {
                warn!("Kill request failed: {}", reason);
                None
            }
        };

        let accepted = response.is_success();
        if accepted {
            self.session.mark_killed();
        }

        info!("{}", self.formatter.format_kill(accepted));
        self.log_payloads(Endpoint::Kill, Some(run), body.as_ref());
        accepted
    }

    /// Decide the task result after the polling loop ended
    async fn finalize(&mut self, run: &RunHandle) -> RunOutcome {
        self.render_status(run);

        let fail_percent = self.session.failure_percent();
        let remote_killed = self
            .session
            .status()
            .map_or(false, |s| s.exec_status == ExecState::Killed);

        let (result, state) = if self.session.breached() {
            if fail_percent >= 100.0 {
                self.kill(run).await;
            } else {
                debug!(
                    "Fail percentage {:.2} % below 100 %, leaving the remote run alone",
                    fail_percent
                );
            }
            (TaskResult::Failed, PollerState::StoppedThreshold)
        } else if !self.session.is_killed() {
            if let Some(status) = self.session.status() {
                info!("{}", self.formatter.format_terminated(status));
            }
            (TaskResult::Failed, PollerState::StoppedNormal)
        } else if self.session.has_warnings() {
            (TaskResult::SucceededWithIssues, stopped_state(remote_killed))
        } else if fail_percent > 0.0 {
            (TaskResult::Succeeded, stopped_state(remote_killed))
        } else {
            // TODO: confirm with the service owners whether a clean run with
            // zero failures should really fail the pipeline.
            (TaskResult::Failed, stopped_state(remote_killed))
        };

        self.transition(state);
        self.conclude(run, result);

        RunOutcome {
            result,
            exit_code: result.exit_code(),
            state,
        }
    }

    /// Shut down after an interrupt: final snapshot, unconditional kill
    async fn graceful_shutdown(&mut self, run: &RunHandle, interrupt: Interrupt) -> RunOutcome {
        info!("{}", interrupt.message());
        self.transition(PollerState::StoppedInterrupted);

        self.poll_once(run, false).await;
        self.render_status(run);

        let breached = self.session.breached();
        self.kill(run).await;

        let result = if breached {
            TaskResult::Failed
        } else if self.session.has_warnings() {
            TaskResult::SucceededWithIssues
        } else {
            TaskResult::Succeeded
        };
        self.conclude(run, result);

        RunOutcome {
            result,
            exit_code: 1,
            state: PollerState::StoppedInterrupted,
        }
    }

    /// Interrupt arrived before a run existed; nothing to kill
    fn shutdown_before_run(&mut self, interrupt: Interrupt) -> RunOutcome {
        info!("{}", interrupt.message());
        self.transition(PollerState::StoppedInterrupted);
        info!("{}", TaskResult::Failed.message());
        info!("{}", eof_marker());

        RunOutcome {
            result: TaskResult::Failed,
            exit_code: 1,
            state: PollerState::StoppedInterrupted,
        }
    }

    fn conclude(&self, run: &RunHandle, result: TaskResult) {
        let message = match result {
            TaskResult::Succeeded => "Execution Passed!",
            TaskResult::SucceededWithIssues => WARNINGS_MESSAGE,
            TaskResult::Failed => "Execution Failed!",
        };
        info!("{}", message);

        let url = self.api.report_url(run, self.session.status());
        info!("{}", format_report_url(&url));
        info!("{}", eof_marker());
    }

    fn render_status(&self, run: &RunHandle) {
        let Some(snapshot) = self.session.latest() else {
            return;
        };

        for line in self.formatter.format_status(&snapshot.status) {
            info!("{}", line);
        }
        self.log_payloads(Endpoint::Status, Some(run), Some(&snapshot.raw));
    }

    fn log_payloads(&self, endpoint: Endpoint, run: Option<&RunHandle>, response: Option<&Value>) {
        if !self.formatter.verbose() {
            return;
        }
        let request = self.api.request_payload(endpoint, run);
        for line in self.formatter.format_payloads(&request, response) {
            info!("{}", line);
        }
    }
}

fn stopped_state(remote_killed: bool) -> PollerState {
    if remote_killed {
        PollerState::StoppedKilled
    } else {
        PollerState::StoppedNormal
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ExecutionParameters;
    use crate::executor::shutdown::ShutdownTrigger;
    use crate::http::StatusSnapshot;
    use crate::models::ExecutionStatus;
    use serde_json::json;
    use std::cell::{Cell, RefCell};
    use std::collections::VecDeque;
    use std::time::{Duration, Instant};

    /// In-memory service answering from prepared scripts
    struct ScriptedApi {
        triggers: RefCell<VecDeque<ApiResponse<RunHandle>>>,
        statuses: RefCell<VecDeque<ApiResponse<StatusSnapshot>>>,
        kill_response: ApiResponse<Value>,
        trigger_calls: Cell<u32>,
        status_calls: Cell<u32>,
        kill_calls: Cell<u32>,
    }

    impl ScriptedApi {
        fn new(statuses: Vec<ApiResponse<StatusSnapshot>>) -> Self {
            Self {
                triggers: RefCell::new(VecDeque::from([ApiResponse::Success(
                    RunHandle::new("900").with_suite("1", "42"),
                )])),
                statuses: RefCell::new(statuses.into()),
                kill_response: ApiResponse::Success(json!({ "killed": true })),
                trigger_calls: Cell::new(0),
                status_calls: Cell::new(0),
                kill_calls: Cell::new(0),
            }
        }

        fn with_triggers(self, triggers: Vec<ApiResponse<RunHandle>>) -> Self {
            *self.triggers.borrow_mut() = triggers.into();
            self
        }

        fn with_kill_response(mut self, response: ApiResponse<Value>) -> Self {
            self.kill_response = response;
            self
        }
    }

    impl ExecutionApi for &ScriptedApi {
        async fn trigger(&self) -> ApiResponse<TriggerReceipt> {
            self.trigger_calls.set(self.trigger_calls.get() + 1);
            match self.triggers.borrow_mut().pop_front() {
                Some(ApiResponse::Success(run)) => {
                    let raw = json!({ "data": { "data": { "id": run.execution_id } } });
                    ApiResponse::Success(TriggerReceipt { run, raw })
                }
                Some(ApiResponse::Error(reason)) => ApiResponse::Error(reason),
                Some(ApiResponse::NotReady) | None => ApiResponse::NotReady,
            }
        }

        async fn status(&self, _run: &RunHandle) -> ApiResponse<StatusSnapshot> {
            self.status_calls.set(self.status_calls.get() + 1);
            self.statuses
                .borrow_mut()
                .pop_front()
                .unwrap_or(ApiResponse::NotReady)
        }

        async fn kill(&self, _run: &RunHandle) -> ApiResponse<Value> {
            self.kill_calls.set(self.kill_calls.get() + 1);
            self.kill_response.clone()
        }

        fn request_payload(&self, _endpoint: Endpoint, _run: Option<&RunHandle>) -> Value {
            json!({ "token": "***" })
        }

        fn report_url(&self, run: &RunHandle, _status: Option<&crate::models::ExecutionStatus>) -> String {
            format!("https://reports.test/{}", run.execution_id)
        }
    }

    fn snap(state: ExecState, executed: u32, fail: f64) -> ApiResponse<StatusSnapshot> {
        ApiResponse::Success(StatusSnapshot {
            status: ExecutionStatus::new(state, 10, executed).with_fail_percent(fail),
            raw: json!({}),
        })
    }

    fn validated(threshold: f64, has_warnings: bool) -> ValidatedParameters {
        ValidatedParameters {
            params: ExecutionParameters {
                exec_token: "x".repeat(88),
                app_url: String::new(),
                threshold,
                verbose: true,
            },
            has_warnings,
            defaulted: Vec::new(),
        }
    }

    fn config() -> PollerConfig {
        PollerConfig::default()
            .with_poll_interval_ms(1)
            .with_initial_poll_attempts(Some(5))
    }

    async fn run_with(
        api: &ScriptedApi,
        config: PollerConfig,
        validated: ValidatedParameters,
        interrupt: Option<Interrupt>,
    ) -> Result<RunOutcome, PollerError> {
        let (trigger, signal): (ShutdownTrigger, ShutdownSignal) = ShutdownSignal::channel();
        if let Some(interrupt) = interrupt {
            trigger.trigger(interrupt);
        }
        Poller::new(api, config, validated, signal).run().await
    }

    #[tokio::test]
    async fn test_threshold_breach_stops_at_crossing_poll() {
        let api = ScriptedApi::new(vec![
            snap(ExecState::InProgress, 0, 0.0),
            snap(ExecState::InProgress, 1, 10.0),
            snap(ExecState::InProgress, 3, 30.0),
            snap(ExecState::InProgress, 5, 60.0),
            snap(ExecState::InProgress, 6, 70.0),
        ]);

        let outcome = run_with(&api, config(), validated(50.0, false), None)
            .await
            .unwrap();

        assert_eq!(outcome.result, TaskResult::Failed);
        assert_eq!(outcome.exit_code, 1);
        assert_eq!(outcome.state, PollerState::StoppedThreshold);
        assert_eq!(api.status_calls.get(), 4);
        assert_eq!(api.kill_calls.get(), 0);
    }

    #[tokio::test]
    async fn test_breach_on_first_snapshot() {
        let api = ScriptedApi::new(vec![snap(ExecState::InProgress, 1, 100.0)]);

        let outcome = run_with(&api, config(), validated(50.0, false), None)
            .await
            .unwrap();

        assert_eq!(outcome.result, TaskResult::Failed);
        assert_eq!(outcome.exit_code, 1);
        assert_eq!(outcome.state, PollerState::StoppedThreshold);
        assert_eq!(api.status_calls.get(), 1);
        assert_eq!(api.kill_calls.get(), 1);
    }

    #[tokio::test]
    async fn test_zero_threshold_fails_without_kill() {
        let api = ScriptedApi::new(vec![snap(ExecState::InProgress, 0, 0.0)]);

        let outcome = run_with(&api, config(), validated(0.0, false), None)
            .await
            .unwrap();

        assert_eq!(outcome.result, TaskResult::Failed);
        assert_eq!(outcome.state, PollerState::StoppedThreshold);
        assert_eq!(api.status_calls.get(), 1);
        assert_eq!(api.kill_calls.get(), 0);
    }

    #[tokio::test]
    async fn test_total_failure_kills_run() {
        let api = ScriptedApi::new(vec![
            snap(ExecState::InProgress, 0, 0.0),
            snap(ExecState::InProgress, 2, 100.0),
        ]);

        let outcome = run_with(&api, config(), validated(50.0, false), None)
            .await
            .unwrap();

        assert_eq!(outcome.result, TaskResult::Failed);
        assert_eq!(api.kill_calls.get(), 1);
    }

    #[tokio::test]
    async fn test_kill_failure_does_not_change_outcome() {
        let api = ScriptedApi::new(vec![
            snap(ExecState::InProgress, 0, 0.0),
            snap(ExecState::Completed, 10, 100.0),
        ])
        .with_kill_response(ApiResponse::Error("HTTP 500".to_string()));

        let outcome = run_with(&api, config(), validated(50.0, true), None)
            .await
            .unwrap();

        assert_eq!(outcome.result, TaskResult::Failed);
        assert_eq!(outcome.exit_code, 1);
        assert_eq!(api.kill_calls.get(), 1);
    }

    #[tokio::test]
    async fn test_completed_with_failures_succeeds() {
        let api = ScriptedApi::new(vec![
            snap(ExecState::InProgress, 0, 0.0),
            snap(ExecState::InProgress, 4, 10.0),
            snap(ExecState::Completed, 10, 20.0),
        ]);

        let outcome = run_with(&api, config(), validated(50.0, false), None)
            .await
            .unwrap();

        assert_eq!(outcome.result, TaskResult::Succeeded);
        assert_eq!(outcome.exit_code, 0);
        assert_eq!(outcome.state, PollerState::StoppedNormal);
        assert_eq!(api.status_calls.get(), 3);
        assert_eq!(api.kill_calls.get(), 0);
    }

    // Current behavior: a clean run without input warnings is reported as failed.
    #[tokio::test]
    async fn test_completed_without_failures_is_reported_failed() {
        let api = ScriptedApi::new(vec![
            snap(ExecState::InProgress, 0, 0.0),
            snap(ExecState::Completed, 10, 0.0),
        ]);

        let outcome = run_with(&api, config(), validated(50.0, false), None)
            .await
            .unwrap();

        assert_eq!(outcome.result, TaskResult::Failed);
        assert_eq!(outcome.exit_code, 1);
    }

    #[tokio::test]
    async fn test_completed_with_warnings_succeeds_with_issues() {
        let api = ScriptedApi::new(vec![
            snap(ExecState::InProgress, 0, 0.0),
            snap(ExecState::Completed, 10, 0.0),
        ]);

        let outcome = run_with(&api, config(), validated(100.0, true), None)
            .await
            .unwrap();

        assert_eq!(outcome.result, TaskResult::SucceededWithIssues);
        assert_eq!(outcome.exit_code, 0);
    }

    #[tokio::test]
    async fn test_remote_kill_is_reported() {
        let api = ScriptedApi::new(vec![
            snap(ExecState::InProgress, 0, 0.0),
            snap(ExecState::Killed, 3, 10.0),
        ]);

        let outcome = run_with(&api, config(), validated(50.0, false), None)
            .await
            .unwrap();

        assert_eq!(outcome.result, TaskResult::Succeeded);
        assert_eq!(outcome.state, PollerState::StoppedKilled);
    }

    #[tokio::test]
    async fn test_run_that_never_progressed_fails() {
        let api = ScriptedApi::new(vec![snap(ExecState::NotStarted, 0, 0.0)]);

        let outcome = run_with(&api, config(), validated(50.0, true), None)
            .await
            .unwrap();

        assert_eq!(outcome.result, TaskResult::Failed);
        assert_eq!(api.status_calls.get(), 1);
        assert_eq!(api.kill_calls.get(), 0);
    }

    #[tokio::test]
    async fn test_trigger_failure() {
        let api = ScriptedApi::new(vec![snap(ExecState::InProgress, 0, 0.0)])
            .with_triggers(vec![ApiResponse::Error("HTTP 401".to_string())]);

        let err = run_with(&api, config(), validated(50.0, false), None)
            .await
            .unwrap_err();

        assert!(matches!(err, PollerError::TriggerFailed(reason) if reason == "HTTP 401"));
        assert_eq!(api.status_calls.get(), 0);
        assert_eq!(api.kill_calls.get(), 0);
    }

    #[tokio::test]
    async fn test_trigger_retry() {
        let api = ScriptedApi::new(vec![
            snap(ExecState::InProgress, 0, 0.0),
            snap(ExecState::Completed, 10, 5.0),
        ])
        .with_triggers(vec![
            ApiResponse::NotReady,
            ApiResponse::Success(RunHandle::new("901")),
        ]);

        let outcome = run_with(
            &api,
            config().with_trigger_attempts(2),
            validated(50.0, false),
            None,
        )
        .await
        .unwrap();

        assert_eq!(api.trigger_calls.get(), 2);
        assert_eq!(outcome.result, TaskResult::Succeeded);
    }

    #[tokio::test]
    async fn test_initial_poll_waits_for_run() {
        let api = ScriptedApi::new(vec![
            ApiResponse::NotReady,
            ApiResponse::Error("HTTP 503".to_string()),
            snap(ExecState::InProgress, 0, 0.0),
            snap(ExecState::Completed, 10, 40.0),
        ]);

        let outcome = run_with(&api, config(), validated(50.0, false), None)
            .await
            .unwrap();

        assert_eq!(api.status_calls.get(), 4);
        assert_eq!(outcome.result, TaskResult::Succeeded);
    }

    #[tokio::test]
    async fn test_initial_poll_is_bounded() {
        let api = ScriptedApi::new(Vec::new());

        let err = run_with(
            &api,
            config().with_initial_poll_attempts(Some(3)),
            validated(50.0, false),
            None,
        )
        .await
        .unwrap_err();

        assert!(matches!(err, PollerError::NeverMaterialized(3)));
        assert_eq!(api.status_calls.get(), 3);
        assert_eq!(api.kill_calls.get(), 0);
    }

    #[tokio::test]
    async fn test_transient_poll_error_keeps_polling() {
        let api = ScriptedApi::new(vec![
            snap(ExecState::InProgress, 0, 0.0),
            ApiResponse::Error("timeout".to_string()),
            snap(ExecState::Completed, 10, 30.0),
        ]);

        let outcome = run_with(&api, config(), validated(50.0, false), None)
            .await
            .unwrap();

        assert_eq!(api.status_calls.get(), 3);
        assert_eq!(outcome.result, TaskResult::Succeeded);
    }

    #[tokio::test]
    async fn test_interrupt_kills_and_exits_nonzero() {
        let api = ScriptedApi::new(vec![
            snap(ExecState::InProgress, 0, 0.0),
            snap(ExecState::InProgress, 2, 10.0),
        ]);

        let outcome = run_with(
            &api,
            config(),
            validated(50.0, false),
            Some(Interrupt::SystemTermination),
        )
        .await
        .unwrap();

        assert_eq!(outcome.state, PollerState::StoppedInterrupted);
        assert_eq!(outcome.result, TaskResult::Succeeded);
        assert_eq!(outcome.exit_code, 1);
        assert_eq!(api.status_calls.get(), 2);
        assert_eq!(api.kill_calls.get(), 1);
    }

    #[tokio::test]
    async fn test_interrupt_during_poll_delay() {
        let api = ScriptedApi::new(vec![
            snap(ExecState::InProgress, 0, 0.0),
            snap(ExecState::InProgress, 2, 10.0),
        ]);
        let (trigger, signal) = ShutdownSignal::channel();

        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            trigger.trigger(Interrupt::SystemTermination);
        });

        let started = Instant::now();
        let outcome = Poller::new(
            &api,
            config().with_poll_interval_ms(60_000),
            validated(50.0, false),
            signal,
        )
        .run()
        .await
        .unwrap();

        assert!(started.elapsed() < Duration::from_secs(10));
        assert_eq!(outcome.state, PollerState::StoppedInterrupted);
        assert_eq!(outcome.result, TaskResult::Succeeded);
        assert_eq!(outcome.exit_code, 1);
        assert_eq!(api.status_calls.get(), 2);
        assert_eq!(api.kill_calls.get(), 1);
    }

    #[tokio::test]
    async fn test_interrupt_with_breach_fails() {
        let api = ScriptedApi::new(vec![
            snap(ExecState::InProgress, 0, 0.0),
            snap(ExecState::InProgress, 5, 80.0),
        ])
        .with_kill_response(ApiResponse::NotReady);

        let outcome = run_with(
            &api,
            config(),
            validated(50.0, true),
            Some(Interrupt::UserStop),
        )
        .await
        .unwrap();

        assert_eq!(outcome.result, TaskResult::Failed);
        assert_eq!(outcome.exit_code, 1);
        assert_eq!(api.kill_calls.get(), 1);
    }

    #[tokio::test]
    async fn test_interrupt_with_warnings_succeeds_with_issues() {
        let api = ScriptedApi::new(vec![snap(ExecState::InProgress, 0, 0.0)]);

        let outcome = run_with(
            &api,
            config(),
            validated(50.0, true),
            Some(Interrupt::UserStop),
        )
        .await
        .unwrap();

        assert_eq!(outcome.result, TaskResult::SucceededWithIssues);
        assert_eq!(outcome.exit_code, 1);
        assert_eq!(api.kill_calls.get(), 1);
    }

    #[tokio::test]
    async fn test_interrupt_during_trigger_retry() {
        let api = ScriptedApi::new(Vec::new()).with_triggers(vec![ApiResponse::NotReady]);

        let outcome = run_with(
            &api,
            config().with_trigger_attempts(3),
            validated(50.0, false),
            Some(Interrupt::UserStop),
        )
        .await
        .unwrap();

        assert_eq!(outcome.result, TaskResult::Failed);
        assert_eq!(outcome.exit_code, 1);
        assert_eq!(api.trigger_calls.get(), 1);
        assert_eq!(api.kill_calls.get(), 0);
    }
}
