//! Data models for remote suite executions
//!
//! This module contains the data structures shared by the poller, the API
//! client and the output layer.

mod execution;
mod task_result;

pub use execution::{ExecState, ExecutionStatus, RunHandle, TestCaseResult};
pub use task_result::TaskResult;
