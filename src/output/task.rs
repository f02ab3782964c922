//! Pipeline runner result reporting
//!
//! The runner reads the task result from a logging command written to
//! standard output.

use crate::models::TaskResult;

/// Logging command that sets the task result
pub fn format_task_complete(result: TaskResult, message: &str) -> String {
    format!(
        "##vso[task.complete result={result};]{}",
        escape_message(message)
    )
}

/// Report the final task result to the pipeline runner
pub fn report_result(result: TaskResult, message: &str) {
    println!("{}", format_task_complete(result, message));
}

/// Escape characters the runner treats as command syntax
fn escape_message(message: &str) -> String {
    message
        .replace('%', "%AZP25")
        .replace('\r', "%0D")
        .replace('\n', "%0A")
        .replace(']', "%5D")
        .replace(';', "%3B")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_task_complete() {
        assert_eq!(
            format_task_complete(TaskResult::Failed, " Execution Failed!"),
            "##vso[task.complete result=Failed;] Execution Failed!"
        );
        assert_eq!(
            format_task_complete(TaskResult::SucceededWithIssues, "ok"),
            "##vso[task.complete result=SucceededWithIssues;]ok"
        );
    }

    #[test]
    fn test_message_escaping() {
        assert_eq!(
            format_task_complete(TaskResult::Failed, "50% done; see [log]\nnext"),
            "##vso[task.complete result=Failed;]50%AZP25 done%3B see [log%5D%0Anext"
        );
    }
}
