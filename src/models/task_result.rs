//! Pipeline task results

use std::fmt;

/// Final result reported to the pipeline runner
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TaskResult {
    Succeeded,
    SucceededWithIssues,
    Failed,
}

impl TaskResult {
    pub fn is_success(&self) -> bool {
        !matches!(self, TaskResult::Failed)
    }

    /// Process exit code mirroring the result
    pub fn exit_code(&self) -> u8 {
        if self.is_success() {
            0
        } else {
            1
        }
    }

    /// Default message shown alongside the result
    pub fn message(&self) -> &'static str {
        match self {
            TaskResult::Succeeded => "Execution Succeeded!",
            TaskResult::SucceededWithIssues => "Execution Succeeded with Issues!",
            TaskResult::Failed => "Execution Failed!",
        }
    }
}

impl fmt::Display for TaskResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskResult::Succeeded => write!(f, "Succeeded"),
            TaskResult::SucceededWithIssues => write!(f, "SucceededWithIssues"),
            TaskResult::Failed => write!(f, "Failed"),
        }
    }
}
