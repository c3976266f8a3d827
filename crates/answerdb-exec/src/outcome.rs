use std::time::Duration;

use answerdb_core::types::ExecutionResult;

pub const UNSUPPORTED_FILE_TYPE: &str = "Unsupported file type";

/// What happened when a solution script was dispatched.
///
/// Only `Completed` is a clean run; the other variants are degraded answers
/// that are still rendered as text for the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutionOutcome {
    /// The script exited; `output` is its trimmed stdout. A non-zero exit
    /// still counts as completed.
    Completed { output: String, exit_code: Option<i32> },
    /// The interpreter could not be started or waited on.
    Failed { description: String },
    /// No `ScriptKind` for this extension; nothing was spawned.
    Unsupported { extension: Option<String> },
    /// Killed after running past the timeout.
    TimedOut { after: Duration, pid: Option<u32> },
}

impl ExecutionOutcome {
    pub fn is_degraded(&self) -> bool {
        !matches!(self, ExecutionOutcome::Completed { .. })
    }

    pub fn render(&self) -> String {
        match self {
            ExecutionOutcome::Completed { output, .. } => output.clone(),
            ExecutionOutcome::Failed { description } => description.clone(),
            ExecutionOutcome::Unsupported { .. } => UNSUPPORTED_FILE_TYPE.to_string(),
            ExecutionOutcome::TimedOut { after, .. } => {
                format!("Execution timed out after {}s", after.as_secs_f64())
            }
        }
    }

    pub fn to_result(&self) -> ExecutionResult {
        ExecutionResult::new(self.render())
    }
}
