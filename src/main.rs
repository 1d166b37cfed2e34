//! MySQL Backup/Restore API
//!
//! Provides an HTTP interface that runs mysqldump / mysql for backup and restore operations

// backup-api/src/main.rs
mod api;
mod backup;
mod command;
mod config;
mod errors;
mod restore;
mod service;
#[cfg(test)]
mod test_support;

use anyhow::{Context, Result};
use config::AppConfig;
use service::BackupService;
use std::process::ExitCode;
use tokio::net::TcpListener;
use tracing::{error, info};

/// Main entry point for the backup API server
#[tokio::main]
async fn main() -> ExitCode {
    // A missing .env file is fine; real deployments set the environment directly.
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                tracing_subscriber::EnvFilter::new("backup_api=info,tower_http=info")
            }),
        )
        .init();

    match run_app().await {
        Ok(_) => {
            info!("Server stopped.");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{:?}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run_app() -> Result<()> {
    let app_config = AppConfig::load().context("Failed to load application configuration")?;
    info!(
        "Using mysqldump at {}, mysql at {}, writing dumps to {}, reading dumps from {}",
        app_config.commands.dump_binary_path.display(),
        app_config.commands.restore_binary_path.display(),
        app_config.commands.output_directory.display(),
        app_config.commands.dump_directory.display()
    );

    let service = BackupService::new(&app_config.commands);
    let app = api::router(service);

    let listener = TcpListener::bind(app_config.listen_addr)
        .await
        .with_context(|| format!("Failed to bind {}", app_config.listen_addr))?;
    info!("🚀 Listening on {}", app_config.listen_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server error")?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
