//! Shared plumbing for running the external database utilities.

pub mod result;

use std::ffi::{OsStr, OsString};
use std::fs::File;
use std::path::Path;
use std::process::{Command, Stdio};
use tracing::{debug, warn};

use crate::errors::{CommandError, ValidationError};
pub use result::CommandResult;

/// A database utility invocation that always reports back through a `CommandResult`.
pub trait ExecutableCommand {
    type Request;

    fn execute(&self, request: &Self::Request) -> CommandResult;
}

/// Returns `value` unless it is absent or blank.
pub(crate) fn required<'a>(
    value: Option<&'a str>,
    name: &'static str,
) -> Result<&'a str, ValidationError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(ValidationError::MissingArgument(name)),
    }
}

/// Like `required`, but the value must also be a plain database name.
///
/// The name ends up in file names and as a positional argument to the client
/// binaries, so path separators and a leading `-` are refused.
pub(crate) fn database_name<'a>(
    value: Option<&'a str>,
    name: &'static str,
) -> Result<&'a str, ValidationError> {
    let value = required(value, name)?;
    if value.starts_with('-')
        || value.contains(|c: char| !c.is_alphanumeric() && c != '_' && c != '-')
    {
        return Err(ValidationError::InvalidDatabaseName(name));
    }
    Ok(value)
}

/// Joins an argument vector into the command line recorded on results.
pub fn render_command_line(args: &[OsString]) -> String {
    args.iter()
        .map(|a| a.to_string_lossy())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Same as `render_command_line` with the `--password=` value hidden, for logs.
pub fn masked_command_line(args: &[OsString]) -> String {
    args.iter()
        .map(|a| {
            let arg = a.to_string_lossy();
            if arg.starts_with("--password=") {
                "--password=****".into()
            } else {
                arg
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Short name of a binary for messages (`/usr/bin/mysqldump` -> `mysqldump`).
pub fn binary_name(path: &Path) -> String {
    path.file_name()
        .unwrap_or(path.as_os_str())
        .to_string_lossy()
        .into_owned()
}

/// Runs `args[0]` with the remaining arguments and waits for it to exit.
///
/// `stdin` is handed to the child and dropped with it, so the file is closed
/// on every return path. Returns the exit code, whatever it is; only spawn
/// failures and signal terminations are errors here.
pub fn run_process(args: &[OsString], stdin: Option<File>) -> Result<i32, CommandError> {
    let Some((program, rest)) = args.split_first() else {
        return Err(CommandError::Spawn {
            binary: String::new(),
            source: std::io::Error::new(std::io::ErrorKind::InvalidInput, "empty command"),
        });
    };
    let binary = binary_name(Path::new(program));

    debug!("Executing: {}", masked_command_line(args));

    let stdin = match stdin {
        Some(file) => Stdio::from(file),
        None => Stdio::null(),
    };

    let output = Command::new(program)
        .args(rest)
        .stdin(stdin)
        .output()
        .map_err(|source| CommandError::Spawn {
            binary: binary.clone(),
            source,
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        if !stderr.trim().is_empty() {
            warn!("{} failed with status {}: {}", binary, output.status, stderr.trim());
        }
    }

    output.status.code().ok_or(CommandError::Signal { binary })
}

pub(crate) fn arg(prefix: &str, value: impl AsRef<OsStr>) -> OsString {
    let mut arg = OsString::from(prefix);
    arg.push(value);
    arg
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn os(args: &[&str]) -> Vec<OsString> {
        args.iter().map(OsString::from).collect()
    }

    #[test]
    fn test_render_command_line() {
        let args = os(&["/usr/bin/mysql", "--user=root", "--protocol=tcp", "shop"]);
        assert_eq!(
            render_command_line(&args),
            "/usr/bin/mysql --user=root --protocol=tcp shop"
        );
    }

    #[test]
    fn test_masked_command_line_hides_password() {
        let args = os(&["mysqldump", "--user=root", "--password=s3cret", "shop"]);
        let masked = masked_command_line(&args);
        assert_eq!(masked, "mysqldump --user=root --password=**** shop");
        assert!(!masked.contains("s3cret"));
    }

    #[test]
    fn test_binary_name() {
        assert_eq!(binary_name(Path::new("/usr/bin/mysqldump")), "mysqldump");
        assert_eq!(binary_name(Path::new("mysql")), "mysql");
    }

    #[test]
    fn test_required_rejects_blank() {
        assert_eq!(required(Some("bob"), "user"), Ok("bob"));
        assert!(required(Some("  "), "user").is_err());
        assert!(required(None, "user").is_err());
    }

    #[test]
    fn test_database_name_rules() {
        assert_eq!(database_name(Some("shop_2024-eu"), "database"), Ok("shop_2024-eu"));
        assert_eq!(
            database_name(Some(" "), "database"),
            Err(ValidationError::MissingArgument("database"))
        );
        for bad in ["../x", "a/b", "--all-databases", "-x", "shop db", "a\\b", "db;drop"] {
            assert_eq!(
                database_name(Some(bad), "database"),
                Err(ValidationError::InvalidDatabaseName("database")),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_run_process_empty_args_is_spawn_error() {
        let err = run_process(&[], None).unwrap_err();
        assert!(matches!(err, CommandError::Spawn { .. }));
    }

    #[test]
    #[serial]
    fn test_run_process_missing_binary_is_spawn_error() {
        let args = os(&["/nonexistent/bin/mysqldump", "db"]);
        let err = run_process(&args, None).unwrap_err();
        match err {
            CommandError::Spawn { binary, .. } => assert_eq!(binary, "mysqldump"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_arg_concatenates() {
        assert_eq!(arg("--user=", "root"), OsString::from("--user=root"));
    }
}
