//! HTTP routes
//!
//! `POST /api/backup/` and `POST /api/restore/` take a JSON request and answer
//! with the serialized `CommandResult`; the status code reflects how the
//! command failed, if it did.

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde_json::{Value, json};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::backup::BackupRequest;
use crate::command::CommandResult;
use crate::errors::FailureKind;
use crate::restore::RestoreRequest;
use crate::service::BackupService;

type SharedService = Arc<BackupService>;

pub fn router(service: BackupService) -> Router {
    Router::new()
        .route("/api/backup/", post(create_backup))
        .route("/api/backup", post(create_backup))
        .route("/api/restore/", post(restore_backup))
        .route("/api/restore", post(restore_backup))
        .route("/api/help", get(help))
        .with_state(Arc::new(service))
        .layer(TraceLayer::new_for_http())
}

/// Create a database backup.
async fn create_backup(
    State(service): State<SharedService>,
    Json(request): Json<BackupRequest>,
) -> Response {
    let operation_id = Uuid::new_v4();
    info!(%operation_id, database = ?request.database, "Backup requested");

    let result = run_blocking(move || service.create_backup(&request)).await;
    respond(operation_id, result)
}

/// Restore a database from a dump file.
async fn restore_backup(
    State(service): State<SharedService>,
    Json(request): Json<RestoreRequest>,
) -> Response {
    let operation_id = Uuid::new_v4();
    info!(%operation_id, database = ?request.database, dump = ?request.dump, "Restore requested");

    let result = run_blocking(move || service.restore_backup(&request)).await;
    respond(operation_id, result)
}

/// Print available functions.
async fn help() -> Json<Value> {
    Json(json!({
        "/api/backup/": "Create a database backup.",
        "/api/restore/": "Restore a database from a dump file.",
        "/api/help": "Print available functions."
    }))
}

/// The commands block on their child process, so they run on the blocking pool.
async fn run_blocking<F>(command: F) -> CommandResult
where
    F: FnOnce() -> CommandResult + Send + 'static,
{
    match tokio::task::spawn_blocking(command).await {
        Ok(result) => result,
        Err(e) => {
            error!("Command task failed: {}", e);
            CommandResult {
                has_error: true,
                error_cause: Some(format!("Command task failed: {}", e)),
                failure: Some(FailureKind::Execution),
                ..CommandResult::default()
            }
        }
    }
}

fn respond(operation_id: Uuid, result: CommandResult) -> Response {
    let status = status_for(&result);
    if status.is_success() {
        info!(%operation_id, "Command completed");
    } else {
        warn!(
            %operation_id,
            status = status.as_u16(),
            cause = result.error_cause.as_deref().unwrap_or(""),
            "Command failed"
        );
    }
    (status, Json(result)).into_response()
}

pub fn status_for(result: &CommandResult) -> StatusCode {
    if result.is_success() {
        return StatusCode::OK;
    }
    match result.failure {
        Some(FailureKind::Validation) => StatusCode::BAD_REQUEST,
        Some(FailureKind::Precondition) => StatusCode::NOT_FOUND,
        Some(FailureKind::Execution) | None => StatusCode::INTERNAL_SERVER_ERROR,
    }
}
