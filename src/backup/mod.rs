pub(crate) mod mysqldump;

use serde::Deserialize;

pub use mysqldump::MysqlDumpCommand;

/// Caller-supplied part of a backup. Fields stay optional so a missing one
/// is reported as a validation failure instead of a decode error.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BackupRequest {
    pub user: Option<String>,
    pub password: Option<String>,
    pub database: Option<String>,
}

#[cfg(test)]
impl BackupRequest {
    pub fn new(
        user: impl Into<String>,
        password: impl Into<String>,
        database: impl Into<String>,
    ) -> Self {
        Self {
            user: Some(user.into()),
            password: Some(password.into()),
            database: Some(database.into()),
        }
    }
}
