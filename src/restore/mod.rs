pub(crate) mod mysql_load;

use serde::Deserialize;

pub use mysql_load::MysqlRestoreCommand;

/// Caller-supplied part of a restore: credentials, the target database and
/// the bare name of a dump file inside the configured dump directory.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RestoreRequest {
    pub user: Option<String>,
    pub password: Option<String>,
    pub database: Option<String>,
    pub dump: Option<String>,
}

#[cfg(test)]
impl RestoreRequest {
    pub fn new(
        user: impl Into<String>,
        password: impl Into<String>,
        database: impl Into<String>,
        dump: impl Into<String>,
    ) -> Self {
        Self {
            user: Some(user.into()),
            password: Some(password.into()),
            database: Some(database.into()),
            dump: Some(dump.into()),
        }
    }
}
