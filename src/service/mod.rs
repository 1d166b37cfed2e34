//! Backup service facade
//!
//! The only entry point callers use. Directories and binaries come from the
//! deployment's `CommandConfig`, never from the request.

use crate::backup::{BackupRequest, MysqlDumpCommand};
use crate::command::{CommandResult, ExecutableCommand};
use crate::config::CommandConfig;
use crate::restore::{MysqlRestoreCommand, RestoreRequest};

#[derive(Debug, Clone)]
pub struct BackupService {
    dump: MysqlDumpCommand,
    restore: MysqlRestoreCommand,
}

impl BackupService {
    pub fn new(config: &CommandConfig) -> Self {
        Self {
            dump: MysqlDumpCommand::new(config),
            restore: MysqlRestoreCommand::new(config),
        }
    }

    /// Dumps `request.database` into the configured output directory.
    pub fn create_backup(&self, request: &BackupRequest) -> CommandResult {
        self.dump.execute(request)
    }

    /// Loads `request.dump` from the configured dump directory into `request.database`.
    pub fn restore_backup(&self, request: &RestoreRequest) -> CommandResult {
        self.restore.execute(request)
    }
}
