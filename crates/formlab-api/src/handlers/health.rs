//! Liveness and readiness.

use std::path::Path;

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;
use tracing::warn;

use crate::error::ApiError;
use crate::AppState;

pub async fn root() -> impl IntoResponse {
    Json(json!({
        "status": "online",
        "service": "FormLab",
        "version": env!("CARGO_PKG_VERSION"),
        "health": "/health",
    }))
}

pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let admission = state.pipeline.admission();
    Json(json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
        "active_analyses": admission.active_count(),
        "capacity": admission.capacity(),
    }))
}

/// Create `dir` if needed and prove a file can be written and removed there.
async fn writable(dir: &Path) -> bool {
    let probe = dir.join(".ready_check");
    let result = async {
        tokio::fs::create_dir_all(dir).await?;
        tokio::fs::write(&probe, b"ready").await?;
        tokio::fs::remove_file(&probe).await
    }
    .await;
    if let Err(e) = &result {
        warn!(dir = %dir.display(), error = %e, "Readiness probe failed");
    }
    result.is_ok()
}

pub async fn ready(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let upload_dir_writable = writable(&state.config.upload_dir).await;
    let results_dir_writable = writable(&state.config.results_dir).await;

    if !(upload_dir_writable && results_dir_writable) {
        return Err(ApiError::NotReady(format!(
            "Service not ready (upload_dir_writable={}, results_dir_writable={})",
            upload_dir_writable, results_dir_writable
        )));
    }

    Ok(Json(json!({
        "status": "ready",
        "checks": {
            "upload_dir_writable": upload_dir_writable,
            "results_dir_writable": results_dir_writable,
            "pose_source": state.pipeline.pose_source(),
        },
    })))
}
