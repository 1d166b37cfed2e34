use std::path::PathBuf;
use thiserror::Error;

/// A request field failed validation before any external interaction.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{0} argument is mandatory")]
    MissingArgument(&'static str),

    #[error("{0} must be a bare file name")]
    NotABareFileName(&'static str),

    #[error("{0} may only contain letters, digits, '_' and '-', and must not start with '-'")]
    InvalidDatabaseName(&'static str),
}

/// Anything that stops a database command from completing successfully.
///
/// These never leave an executor: `ExecutableCommand::execute` folds them
/// into a `CommandResult`.
#[derive(Error, Debug)]
pub enum CommandError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Dump file does not exist: '{}'", .0.display())]
    DumpFileMissing(PathBuf),

    #[error("Failed to open dump file '{}': {source}", .path.display())]
    DumpFileUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to execute {binary}: {source}")]
    Spawn {
        binary: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{binary} was terminated by a signal")]
    Signal { binary: String },

    #[error("{cause}")]
    ExitStatus { code: i32, cause: String },
}

/// Coarse classification of a failed command, used to pick an HTTP status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// A required field was missing or malformed.
    Validation,
    /// The referenced dump file is not on disk.
    Precondition,
    /// The external process could not run or exited non-zero.
    Execution,
}

impl CommandError {
    pub fn kind(&self) -> FailureKind {
        match self {
            CommandError::Validation(_) => FailureKind::Validation,
            CommandError::DumpFileMissing(_) => FailureKind::Precondition,
            CommandError::DumpFileUnreadable { .. }
            | CommandError::Spawn { .. }
            | CommandError::Signal { .. }
            | CommandError::ExitStatus { .. } => FailureKind::Execution,
        }
    }

    /// Exit status to record on the result; `None` leaves the sentinel.
    pub fn result_code(&self) -> Option<i32> {
        match self {
            CommandError::ExitStatus { code, .. } => Some(*code),
            _ => None,
        }
    }
}
