// backup-api/src/config/mod.rs
use anyhow::{Context, Result};
use serde::Deserialize;
use std::env;
use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use tracing::info;
use which::which;

pub const CONFIG_PATH_ENV: &str = "BACKUP_API_CONFIG";
const DEFAULT_CONFIG_FILE: &str = "config.json";

const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:5000";
const DEFAULT_DUMP_BINARY: &str = "/usr/bin/mysqldump";
const DEFAULT_RESTORE_BINARY: &str = "/usr/bin/mysql";
const DEFAULT_OUTPUT_DIR: &str = "/tmp";
const DEFAULT_DUMP_DIR: &str = "/tmp";

// Environment overrides, highest precedence
const ENV_LISTEN_ADDR: &str = "BACKUP_API_LISTEN_ADDR";
const ENV_DUMP_BINARY: &str = "BACKUP_API_DUMP_BINARY";
const ENV_RESTORE_BINARY: &str = "BACKUP_API_RESTORE_BINARY";
const ENV_OUTPUT_DIR: &str = "BACKUP_API_OUTPUT_DIR";
const ENV_DUMP_DIR: &str = "BACKUP_API_DUMP_DIR";

// Struct for deserializing config.json
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawJsonConfig {
    pub listen_addr: Option<String>,
    pub dump_binary_path: Option<PathBuf>,
    pub restore_binary_path: Option<PathBuf>,
    pub output_directory: Option<PathBuf>,
    pub dump_directory: Option<PathBuf>,
}

/// Where the database utilities live and which directories they may touch.
/// Handed to each command at construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandConfig {
    pub dump_binary_path: PathBuf,
    pub restore_binary_path: PathBuf,
    pub output_directory: PathBuf,
    pub dump_directory: PathBuf,
}

impl Default for CommandConfig {
    fn default() -> Self {
        Self {
            dump_binary_path: PathBuf::from(DEFAULT_DUMP_BINARY),
            restore_binary_path: PathBuf::from(DEFAULT_RESTORE_BINARY),
            output_directory: PathBuf::from(DEFAULT_OUTPUT_DIR),
            dump_directory: PathBuf::from(DEFAULT_DUMP_DIR),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub listen_addr: SocketAddr,
    pub commands: CommandConfig,
}

impl AppConfig {
    /// Loads `config.json` (or the file named by `BACKUP_API_CONFIG`), then
    /// applies environment overrides.
    pub fn load() -> Result<Self> {
        let raw = match env::var(CONFIG_PATH_ENV) {
            Ok(path) => RawJsonConfig::from_file(Path::new(&path))?,
            Err(_) => {
                let default_path = Path::new(DEFAULT_CONFIG_FILE);
                if default_path.exists() {
                    RawJsonConfig::from_file(default_path)?
                } else {
                    info!("No {} found, using built-in defaults", DEFAULT_CONFIG_FILE);
                    RawJsonConfig::default()
                }
            }
        };
        Self::from_raw(raw.with_env_overrides())
    }

    pub fn from_raw(raw: RawJsonConfig) -> Result<Self> {
        let listen_addr_str = raw
            .listen_addr
            .unwrap_or_else(|| DEFAULT_LISTEN_ADDR.to_string());
        let listen_addr = listen_addr_str
            .parse::<SocketAddr>()
            .with_context(|| format!("Invalid listen_addr: {}", listen_addr_str))?;

        let output_directory = non_empty_dir(raw.output_directory, DEFAULT_OUTPUT_DIR, "output_directory")?;
        let dump_directory = non_empty_dir(raw.dump_directory, DEFAULT_DUMP_DIR, "dump_directory")?;

        let dump_binary_path = resolve_binary(
            &raw.dump_binary_path
                .unwrap_or_else(|| PathBuf::from(DEFAULT_DUMP_BINARY)),
        )?;
        let restore_binary_path = resolve_binary(
            &raw.restore_binary_path
                .unwrap_or_else(|| PathBuf::from(DEFAULT_RESTORE_BINARY)),
        )?;

        Ok(AppConfig {
            listen_addr,
            commands: CommandConfig {
                dump_binary_path,
                restore_binary_path,
                output_directory,
                dump_directory,
            },
        })
    }
}

impl RawJsonConfig {
    pub fn from_file(config_path: &Path) -> Result<Self> {
        let config_content = fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read config file at {}", config_path.display()))?;
        serde_json::from_str(&config_content).with_context(|| {
            format!(
                "Failed to parse JSON from config file at {}",
                config_path.display()
            )
        })
    }

    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(v) = env::var(ENV_LISTEN_ADDR) {
            self.listen_addr = Some(v);
        }
        if let Ok(v) = env::var(ENV_DUMP_BINARY) {
            self.dump_binary_path = Some(PathBuf::from(v));
        }
        if let Ok(v) = env::var(ENV_RESTORE_BINARY) {
            self.restore_binary_path = Some(PathBuf::from(v));
        }
        if let Ok(v) = env::var(ENV_OUTPUT_DIR) {
            self.output_directory = Some(PathBuf::from(v));
        }
        if let Ok(v) = env::var(ENV_DUMP_DIR) {
            self.dump_directory = Some(PathBuf::from(v));
        }
        self
    }
}

fn non_empty_dir(value: Option<PathBuf>, default: &str, key: &str) -> Result<PathBuf> {
    let dir = value.unwrap_or_else(|| PathBuf::from(default));
    if dir.as_os_str().is_empty() {
        return Err(anyhow::anyhow!("{} cannot be empty in config.json.", key));
    }
    Ok(dir)
}

/// A bare name such as `mysqldump` is looked up on PATH; anything with a
/// directory component is used as given.
fn resolve_binary(configured: &Path) -> Result<PathBuf> {
    if configured.components().count() > 1 {
        return Ok(configured.to_path_buf());
    }
    which(configured).with_context(|| {
        format!(
            "{} executable not found in PATH. Please ensure the MySQL client tools are installed and in your PATH.",
            configured.display()
        )
    })
}
