// backup-api/src/restore/mysql_load.rs
use std::ffi::OsString;
use std::fs::File;
use std::path::{Component, Path, PathBuf};
use tracing::{info, warn};

use super::RestoreRequest;
use crate::command::{
    CommandResult, ExecutableCommand, arg, database_name, render_command_line, required,
    run_process,
};
use crate::config::CommandConfig;
use crate::errors::{CommandError, ValidationError};

/// Restore arguments that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestoreArguments<'a> {
    pub user: &'a str,
    pub password: &'a str,
    pub database: &'a str,
    pub dump: &'a str,
}

/// Checks the request fields in order: user, password, dump, database.
pub fn validate_restore_request(
    request: &RestoreRequest,
) -> Result<RestoreArguments<'_>, ValidationError> {
    let user = required(request.user.as_deref(), "user")?;
    let password = request
        .password
        .as_deref()
        .ok_or(ValidationError::MissingArgument("password"))?;
    let dump = required(request.dump.as_deref(), "dump")?;
    if !is_bare_file_name(dump) {
        return Err(ValidationError::NotABareFileName("dump"));
    }
    let database = database_name(request.database.as_deref(), "database")?;
    Ok(RestoreArguments {
        user,
        password,
        database,
        dump,
    })
}

fn is_bare_file_name(name: &str) -> bool {
    let mut components = Path::new(name).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    ) && !name.contains(['/', '\\'])
}

/// Runs the `mysql` client with a dump file from the dump directory on stdin.
#[derive(Debug, Clone)]
pub struct MysqlRestoreCommand {
    binary_path: PathBuf,
    dump_directory: PathBuf,
}

impl MysqlRestoreCommand {
    pub fn new(config: &CommandConfig) -> Self {
        Self {
            binary_path: config.restore_binary_path.clone(),
            dump_directory: config.dump_directory.clone(),
        }
    }

    pub fn resolve_dump_path(&self, dump: &str) -> PathBuf {
        self.dump_directory.join(dump)
    }

    /// Argument vector for mysql; the database is always the last element.
    pub fn build_command_args(&self, args: &RestoreArguments<'_>) -> Vec<OsString> {
        vec![
            self.binary_path.clone().into_os_string(),
            arg("--user=", args.user),
            arg("--password=", args.password),
            OsString::from("--protocol=tcp"),
            OsString::from(args.database),
        ]
    }

    fn run(&self, dump_path: &Path, cmd_args: &[OsString]) -> Result<i32, CommandError> {
        let dump_file = File::open(dump_path).map_err(|source| CommandError::DumpFileUnreadable {
            path: dump_path.to_path_buf(),
            source,
        })?;
        let code = run_process(cmd_args, Some(dump_file))?;
        if code != 0 {
            return Err(CommandError::ExitStatus {
                code,
                cause: format!("unknown error (mysql exited with code {})", code),
            });
        }
        Ok(code)
    }
}

impl ExecutableCommand for MysqlRestoreCommand {
    type Request = RestoreRequest;

    fn execute(&self, request: &RestoreRequest) -> CommandResult {
        let args = match validate_restore_request(request) {
            Ok(args) => args,
            Err(e) => {
                warn!("Restore request rejected: {}", e);
                return CommandResult::rejected(&e.into());
            }
        };

        let dump_path = self.resolve_dump_path(args.dump);
        if !dump_path.is_file() {
            let err = CommandError::DumpFileMissing(dump_path);
            warn!("Restore of {} aborted: {}", args.database, err);
            return CommandResult::rejected(&err);
        }

        let cmd_args = self.build_command_args(&args);
        let command = render_command_line(&cmd_args);

        info!("Restoring database {} from {}", args.database, dump_path.display());
        let outcome = self.run(&dump_path, &cmd_args);
        match &outcome {
            Ok(_) => info!("✓ Database {} restored from {}", args.database, dump_path.display()),
            Err(e) => warn!("Restore of database {} failed: {}", args.database, e),
        }

        CommandResult::from_outcome(command, outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::FailureKind;
    use crate::test_support::write_stub;
    use serial_test::serial;
    use std::fs;
    use tempfile::TempDir;

    fn config(binary: &Path, dumps: &Path) -> CommandConfig {
        CommandConfig {
            restore_binary_path: binary.to_path_buf(),
            dump_directory: dumps.to_path_buf(),
            ..CommandConfig::default()
        }
    }

    #[test]
    fn test_build_command_args() {
        let cmd = MysqlRestoreCommand::new(&config(Path::new("/usr/bin/mysql"), Path::new("/tmp")));
        let args = RestoreArguments {
            user: "user",
            password: "password",
            database: "database",
            dump: "database.dmp",
        };

        let cmd_args = cmd.build_command_args(&args);

        assert_eq!(cmd_args.len(), 5);
        assert_eq!(cmd_args[4], "database");
        assert_eq!(
            render_command_line(&cmd_args),
            "/usr/bin/mysql --user=user --password=password --protocol=tcp database"
        );
    }

    #[test]
    fn test_validate_reports_first_missing_field() {
        let full = RestoreRequest::new("u", "p", "db", "db.dmp");

        let cases = [
            (RestoreRequest { user: None, ..full.clone() }, "user"),
            (RestoreRequest { password: None, ..full.clone() }, "password"),
            (RestoreRequest { dump: Some(String::new()), ..full.clone() }, "dump"),
            (RestoreRequest { database: None, ..full.clone() }, "database"),
        ];
        for (request, field) in &cases {
            assert_eq!(
                validate_restore_request(request),
                Err(ValidationError::MissingArgument(*field))
            );
        }

        // dump is checked before database
        let neither = RestoreRequest {
            dump: None,
            database: None,
            ..full.clone()
        };
        assert_eq!(
            validate_restore_request(&neither),
            Err(ValidationError::MissingArgument("dump"))
        );
        assert!(validate_restore_request(&full).is_ok());
    }

    #[test]
    fn test_validate_rejects_paths_as_dump_name() {
        for dump in ["../etc/passwd", "/tmp/x.dmp", "sub/x.dmp", "..", "."] {
            let request = RestoreRequest::new("u", "p", "db", dump);
            assert_eq!(
                validate_restore_request(&request),
                Err(ValidationError::NotABareFileName("dump")),
                "{dump} should be rejected"
            );
        }
    }

    #[test]
    fn test_validate_rejects_unsafe_database_name() {
        for database in ["../x", "a/b", "--all-databases", "--execute=DROP DATABASE shop"] {
            let request = RestoreRequest::new("u", "p", database, "shop.dmp");
            assert_eq!(
                validate_restore_request(&request),
                Err(ValidationError::InvalidDatabaseName("database")),
                "{database} should be rejected"
            );
        }
    }

    #[test]
    fn test_resolve_dump_path() {
        let cmd = MysqlRestoreCommand::new(&config(Path::new("mysql"), Path::new("/data/dumps")));
        assert_eq!(
            cmd.resolve_dump_path("shop-2017-07-06_000905.dmp"),
            PathBuf::from("/data/dumps/shop-2017-07-06_000905.dmp")
        );
    }

    #[test]
    #[serial]
    fn test_missing_dump_file_spawns_nothing() -> anyhow::Result<()> {
        let bin_dir = TempDir::new()?;
        let dump_dir = TempDir::new()?;
        let marker = bin_dir.path().join("ran");
        let stub = write_stub(
            bin_dir.path(),
            "mysql",
            &format!("touch '{}'\nexit 0", marker.display()),
        )?;
        let cmd = MysqlRestoreCommand::new(&config(&stub, dump_dir.path()));

        let result = cmd.execute(&RestoreRequest::new("u", "p", "shop", "missing.dmp"));

        let expected = format!(
            "Dump file does not exist: '{}'",
            dump_dir.path().join("missing.dmp").display()
        );
        assert!(result.has_error);
        assert_eq!(result.result_code, -1);
        assert_eq!(result.error_cause.as_deref(), Some(expected.as_str()));
        assert_eq!(result.failure, Some(FailureKind::Precondition));
        assert!(!marker.exists());
        Ok(())
    }

    #[test]
    #[serial]
    fn test_directory_is_not_a_dump_file() -> anyhow::Result<()> {
        let dump_dir = TempDir::new()?;
        fs::create_dir(dump_dir.path().join("nested.dmp"))?;
        let cmd = MysqlRestoreCommand::new(&config(Path::new("/bin/true"), dump_dir.path()));

        let result = cmd.execute(&RestoreRequest::new("u", "p", "shop", "nested.dmp"));

        assert!(result.has_error);
        assert_eq!(result.failure, Some(FailureKind::Precondition));
        Ok(())
    }

    #[test]
    #[serial]
    fn test_missing_fields_spawn_nothing() -> anyhow::Result<()> {
        let bin_dir = TempDir::new()?;
        let dump_dir = TempDir::new()?;
        fs::write(dump_dir.path().join("shop.dmp"), "SELECT 1;\n")?;
        let marker = bin_dir.path().join("ran");
        let stub = write_stub(
            bin_dir.path(),
            "mysql",
            &format!("touch '{}'\nexit 0", marker.display()),
        )?;
        let cmd = MysqlRestoreCommand::new(&config(&stub, dump_dir.path()));
        let full = RestoreRequest::new("u", "p", "shop", "shop.dmp");

        for request in [
            RestoreRequest { user: None, ..full.clone() },
            RestoreRequest { password: None, ..full.clone() },
            RestoreRequest { database: None, ..full.clone() },
            RestoreRequest { dump: None, ..full.clone() },
            RestoreRequest { database: Some("--all-databases".to_string()), ..full.clone() },
        ] {
            let result = cmd.execute(&request);
            assert!(result.has_error);
            assert_eq!(result.failure, Some(FailureKind::Validation));
            assert_eq!(result.result_code, -1);
        }
        assert!(!marker.exists());
        Ok(())
    }

    #[test]
    #[serial]
    fn test_dump_file_is_fed_to_stdin() -> anyhow::Result<()> {
        let bin_dir = TempDir::new()?;
        let dump_dir = TempDir::new()?;
        let received = bin_dir.path().join("received.sql");
        let contents = "CREATE TABLE t (id INT);\nINSERT INTO t VALUES (1);\n";
        fs::write(dump_dir.path().join("shop.dmp"), contents)?;
        let stub = write_stub(
            bin_dir.path(),
            "mysql",
            &format!("cat > '{}'\nexit 0", received.display()),
        )?;
        let cmd = MysqlRestoreCommand::new(&config(&stub, dump_dir.path()));

        let result = cmd.execute(&RestoreRequest::new("user", "password", "shop", "shop.dmp"));

        assert!(result.is_success(), "unexpected result: {result:?}");
        assert_eq!(fs::read_to_string(&received)?, contents);
        assert_eq!(
            result.command,
            Some(format!(
                "{} --user=user --password=password --protocol=tcp shop",
                stub.display()
            ))
        );
        Ok(())
    }

    #[test]
    #[serial]
    fn test_non_zero_exit_is_reported() -> anyhow::Result<()> {
        let bin_dir = TempDir::new()?;
        let dump_dir = TempDir::new()?;
        fs::write(dump_dir.path().join("shop.dmp"), "garbage\n")?;
        let stub = write_stub(bin_dir.path(), "mysql", "cat > /dev/null\nexit 1")?;
        let cmd = MysqlRestoreCommand::new(&config(&stub, dump_dir.path()));

        let result = cmd.execute(&RestoreRequest::new("u", "p", "shop", "shop.dmp"));

        assert!(result.has_error);
        assert_eq!(result.result_code, 1);
        assert_eq!(
            result.error_cause.as_deref(),
            Some("unknown error (mysql exited with code 1)")
        );
        assert_eq!(result.failure, Some(FailureKind::Execution));
        Ok(())
    }

    #[test]
    #[serial]
    fn test_missing_binary_is_reported() -> anyhow::Result<()> {
        let dump_dir = TempDir::new()?;
        fs::write(dump_dir.path().join("shop.dmp"), "SELECT 1;\n")?;
        let missing = dump_dir.path().join("no-such-mysql");
        let cmd = MysqlRestoreCommand::new(&config(&missing, dump_dir.path()));

        let result = cmd.execute(&RestoreRequest::new("u", "p", "shop", "shop.dmp"));

        assert!(result.has_error);
        assert_eq!(result.result_code, -1);
        assert_eq!(result.failure, Some(FailureKind::Execution));
        assert!(result.command.is_some());
        Ok(())
    }
}
