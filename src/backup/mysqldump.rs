// backup-api/src/backup/mysqldump.rs
use chrono::{Local, NaiveDateTime};
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use super::BackupRequest;
use crate::command::{
    CommandResult, ExecutableCommand, arg, binary_name, database_name, render_command_line,
    required, run_process,
};
use crate::config::CommandConfig;
use crate::errors::{CommandError, ValidationError};

const DUMP_TIMESTAMP_FORMAT: &str = "%Y-%m-%d_%H%M%S";
const DUMP_EXTENSION: &str = "dmp";

/// Backup arguments that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DumpArguments<'a> {
    pub user: &'a str,
    pub password: &'a str,
    pub database: &'a str,
}

/// Checks the request fields in order: user, password, database, then the output directory.
pub fn validate_backup_request<'a>(
    request: &'a BackupRequest,
    output_path: &Path,
) -> Result<DumpArguments<'a>, ValidationError> {
    let user = required(request.user.as_deref(), "user")?;
    let password = request
        .password
        .as_deref()
        .ok_or(ValidationError::MissingArgument("password"))?;
    let database = database_name(request.database.as_deref(), "database")?;
    if output_path.as_os_str().is_empty() {
        return Err(ValidationError::MissingArgument("output_path"));
    }
    Ok(DumpArguments {
        user,
        password,
        database,
    })
}

/// `<output_path>/<database>-<YYYY-MM-DD_HHMMSS>.dmp`
pub fn dump_file_path(output_path: &Path, database: &str, at: &NaiveDateTime) -> PathBuf {
    output_path.join(format!(
        "{}-{}.{}",
        database,
        at.format(DUMP_TIMESTAMP_FORMAT),
        DUMP_EXTENSION
    ))
}

/// Maps a non-zero mysqldump exit code to a readable cause.
pub fn mysqldump_error_cause(code: i32, database: &str) -> String {
    match code {
        2 => format!("Unknown database [{}]", database),
        _ => format!("unknown error (mysqldump exited with code {})", code),
    }
}

/// Runs `mysqldump` for one database into the configured output directory.
#[derive(Debug, Clone)]
pub struct MysqlDumpCommand {
    binary_path: PathBuf,
    output_path: PathBuf,
}

impl MysqlDumpCommand {
    pub fn new(config: &CommandConfig) -> Self {
        Self {
            binary_path: config.dump_binary_path.clone(),
            output_path: config.output_directory.clone(),
        }
    }

    /// Argument vector for mysqldump; the database is always the last element.
    pub fn build_command_args(&self, args: &DumpArguments<'_>, output_file: &Path) -> Vec<OsString> {
        vec![
            self.binary_path.clone().into_os_string(),
            arg("--user=", args.user),
            arg("--password=", args.password),
            arg("--result-file=", output_file),
            OsString::from("--single-transaction"),
            OsString::from("--protocol=tcp"),
            OsString::from(args.database),
        ]
    }

    fn run(&self, args: &DumpArguments<'_>, cmd_args: &[OsString]) -> Result<i32, CommandError> {
        let code = run_process(cmd_args, None)?;
        if code != 0 {
            return Err(CommandError::ExitStatus {
                code,
                cause: mysqldump_error_cause(code, args.database),
            });
        }
        Ok(code)
    }
}

impl ExecutableCommand for MysqlDumpCommand {
    type Request = BackupRequest;

    fn execute(&self, request: &BackupRequest) -> CommandResult {
        let args = match validate_backup_request(request, &self.output_path) {
            Ok(args) => args,
            Err(e) => {
                warn!("Backup request rejected: {}", e);
                return CommandResult::rejected(&e.into());
            }
        };

        let output_file = dump_file_path(&self.output_path, args.database, &Local::now().naive_local());
        let cmd_args = self.build_command_args(&args, &output_file);
        let command = render_command_line(&cmd_args);

        info!("Dumping database {} to {}", args.database, output_file.display());
        let outcome = self.run(&args, &cmd_args);

        match &outcome {
            Ok(_) => info!("✓ Database {} dumped to {}", args.database, output_file.display()),
            Err(e) => {
                warn!(
                    "{} failed for database {}: {}",
                    binary_name(&self.binary_path),
                    args.database,
                    e
                );
                // mysqldump sometimes leaves an empty result file behind on failure.
                remove_partial_dump(&output_file);
            }
        }

        CommandResult::from_outcome(command, outcome)
    }
}

fn remove_partial_dump(output_file: &Path) {
    if !output_file.is_file() {
        return;
    }
    match fs::remove_file(output_file) {
        Ok(()) => info!("Removed partial dump file {}", output_file.display()),
        Err(e) => warn!(
            "Failed to remove partial dump file {}: {}",
            output_file.display(),
            e
        ),
    }
}
