// backup-api/src/command/result.rs
use serde::{Deserialize, Serialize};

use crate::errors::{CommandError, FailureKind};

/// Exit status recorded before a process has run.
pub const NOT_RUN: i32 = -1;

/// Outcome of one dump or restore invocation.
///
/// Serializes to `{"result_code", "has_error", "error_cause", "command"}`,
/// which is exactly what the HTTP layer sends back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CommandResult {
    pub result_code: i32,
    pub has_error: bool,
    pub error_cause: Option<String>,
    pub command: Option<String>,
    #[serde(skip)]
    pub failure: Option<FailureKind>,
}

impl Default for CommandResult {
    fn default() -> Self {
        Self {
            result_code: NOT_RUN,
            has_error: false,
            error_cause: None,
            command: None,
            failure: None,
        }
    }
}

impl CommandResult {
    pub fn new() -> Self {
        Self::default()
    }

    /// A result for a request that never got past validation.
    pub fn rejected(err: &CommandError) -> Self {
        let mut result = Self::new();
        result.record_failure(err);
        result
    }

    /// Builds the final result from the recorded command line and the run outcome.
    pub fn from_outcome(command: String, outcome: Result<i32, CommandError>) -> Self {
        let mut result = Self {
            command: Some(command),
            ..Self::default()
        };
        match outcome {
            Ok(code) => result.result_code = code,
            Err(err) => result.record_failure(&err),
        }
        result
    }

    pub fn record_failure(&mut self, err: &CommandError) {
        self.has_error = true;
        self.error_cause = Some(err.to_string());
        self.failure = Some(err.kind());
        if let Some(code) = err.result_code() {
            self.result_code = code;
        }
    }

    pub fn is_success(&self) -> bool {
        !self.has_error && self.result_code == 0
    }
}
