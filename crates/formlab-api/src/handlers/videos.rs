//! Video upload, job status, results and deletion.

use std::path::{Path as FsPath, PathBuf};

use axum::extract::multipart::{Field, MultipartError};
use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{json, Value as JsonValue};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

use formlab_core::{defaults, AnalysisResult, Job, JobId, Sport};
use formlab_jobs::{SubmitOutcome, SubmitRequest};

use crate::error::ApiError;
use crate::AppState;

/// Movement assumed when a basketball upload names none.
const BASKETBALL_DEFAULT_MOVEMENT: &str = "jumpshot";

/// Response to an accepted upload.
#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub video_id: String,
    pub filename: String,
    pub sport: String,
    pub exercise_type: String,
    pub status: String,
    pub file_size: u64,
    pub uploaded_at: DateTime<Utc>,
}

struct StoredVideo {
    path: PathBuf,
    filename: String,
    size: u64,
}

fn multipart_error(e: MultipartError) -> ApiError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::PayloadTooLarge(e.body_text())
    } else {
        ApiError::BadRequest(format!("Failed to read upload: {}", e.body_text()))
    }
}

fn video_extension(file_name: Option<&str>) -> Result<String, ApiError> {
    let ext = file_name
        .and_then(|name| FsPath::new(name).extension())
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
        .unwrap_or_default();
    if defaults::ALLOWED_VIDEO_EXTENSIONS.contains(&ext.as_str()) {
        Ok(ext)
    } else {
        Err(ApiError::BadRequest(format!(
            "Unsupported video format. Allowed: {}",
            defaults::ALLOWED_VIDEO_EXTENSIONS.join(", ")
        )))
    }
}

async fn discard(path: &FsPath) {
    if let Err(e) = tokio::fs::remove_file(path).await {
        if e.kind() != std::io::ErrorKind::NotFound {
            warn!(path = %path.display(), error = %e, "Failed to remove uploaded video");
        }
    }
}

/// Stream a multipart field to disk, enforcing the size limit.
async fn store_video(
    mut field: Field<'_>,
    path: &FsPath,
    max_bytes: u64,
    max_mb: u64,
) -> Result<u64, ApiError> {
    let mut file = tokio::fs::File::create(path)
        .await
        .map_err(|e| ApiError::Internal(format!("Cannot store upload: {}", e.kind())))?;

    let mut written: u64 = 0;
    let result = async {
        while let Some(chunk) = field.chunk().await.map_err(multipart_error)? {
            written += chunk.len() as u64;
            if written > max_bytes {
                return Err(ApiError::PayloadTooLarge(format!(
                    "File size exceeds {}MB limit",
                    max_mb
                )));
            }
            file.write_all(&chunk)
                .await
                .map_err(|e| ApiError::Internal(format!("Cannot store upload: {}", e.kind())))?;
        }
        file.flush()
            .await
            .map_err(|e| ApiError::Internal(format!("Cannot store upload: {}", e.kind())))?;
        Ok(written)
    }
    .await;

    if result.is_err() {
        drop(file);
        discard(path).await;
    }
    result
}

/// Resolve the sport and movement fields of an upload.
fn validate_form(
    sport: Option<&str>,
    exercise_type: Option<&str>,
    size: u64,
) -> Result<(String, String), ApiError> {
    let sport = sport
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ApiError::BadRequest("Missing sport".to_string()))?;
    let movement = match exercise_type.map(str::trim).filter(|s| !s.is_empty()) {
        Some(movement) => movement.to_string(),
        None if sport.eq_ignore_ascii_case(Sport::Basketball.as_str()) => {
            BASKETBALL_DEFAULT_MOVEMENT.to_string()
        }
        None => {
            return Err(ApiError::BadRequest(format!(
                "exercise_type required for {}",
                sport
            )))
        }
    };
    if size == 0 {
        return Err(ApiError::BadRequest("Uploaded video is empty".to_string()));
    }
    Ok((sport.to_string(), movement))
}

/// `POST /api/v1/upload`: multipart with `video`, `sport` and `exercise_type`.
pub async fn upload_video(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<UploadResponse>), ApiError> {
    let job_id = JobId::generate();
    let mut sport: Option<String> = None;
    let mut exercise_type: Option<String> = None;
    let mut video: Option<StoredVideo> = None;

    let received = async {
        while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
            let name = field.name().map(str::to_string);
            match name.as_deref() {
                Some("video") if video.is_none() => {
                    let ext = video_extension(field.file_name())?;
                    tokio::fs::create_dir_all(&state.config.upload_dir)
                        .await
                        .map_err(|e| ApiError::Internal(format!("Cannot store upload: {}", e.kind())))?;
                    let filename = format!("{}.{}", job_id, ext);
                    let path = state.config.upload_dir.join(&filename);
                    let size = store_video(
                        field,
                        &path,
                        state.config.max_upload_bytes,
                        state.config.max_upload_mb(),
                    )
                    .await?;
                    video = Some(StoredVideo {
                        path,
                        filename,
                        size,
                    });
                }
                Some("sport") => sport = Some(field.text().await.map_err(multipart_error)?),
                Some("exercise_type") => {
                    exercise_type = Some(field.text().await.map_err(multipart_error)?)
                }
                other => debug!(field = ?other, "Ignoring multipart field"),
            }
        }
        Ok::<(), ApiError>(())
    }
    .await;

    if let Err(e) = received {
        if let Some(video) = &video {
            discard(&video.path).await;
        }
        return Err(e);
    }

    let Some(video) = video else {
        return Err(ApiError::BadRequest("Missing video file".to_string()));
    };

    let (sport, movement) =
        match validate_form(sport.as_deref(), exercise_type.as_deref(), video.size) {
            Ok(pair) => pair,
            Err(e) => {
                discard(&video.path).await;
                return Err(e);
            }
        };

    let request = SubmitRequest::new(&sport, &movement, &video.path).with_job_id(job_id.clone());
    let handle = match state.pipeline.submit(request).await {
        Ok(SubmitOutcome::Accepted(handle)) => handle,
        Ok(SubmitOutcome::Rejected(rejection)) => {
            discard(&video.path).await;
            return Err(ApiError::AtCapacity {
                active: rejection.active,
                capacity: rejection.capacity,
            });
        }
        Err(e) => {
            discard(&video.path).await;
            return Err(e.into());
        }
    };

    info!(
        job_id = %job_id,
        sport = handle.job().sport(),
        movement = handle.job().movement(),
        file_size = video.size,
        "Video uploaded"
    );

    Ok((
        StatusCode::ACCEPTED,
        Json(UploadResponse {
            video_id: job_id.to_string(),
            filename: video.filename,
            sport: handle.job().sport().to_string(),
            exercise_type: handle.job().movement().to_string(),
            status: handle.job().status().as_str().to_string(),
            file_size: video.size,
            uploaded_at: Utc::now(),
        }),
    ))
}

/// `GET /api/v1/status/:job_id`
pub async fn get_status(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> Result<Json<Job>, ApiError> {
    state
        .pipeline
        .job(&JobId::from(job_id))
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("Video not found".to_string()))
}

/// `GET /api/v1/status/results/:job_id`
pub async fn get_results(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> Result<Json<AnalysisResult>, ApiError> {
    state
        .pipeline
        .result(&JobId::from(job_id))
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("Analysis results not found".to_string()))
}

/// Remove every `{job_id}.*` file from the upload directory.
async fn remove_uploads(upload_dir: &FsPath, job_id: &JobId) -> usize {
    let mut removed = 0;
    let Ok(mut entries) = tokio::fs::read_dir(upload_dir).await else {
        return removed;
    };
    while let Ok(Some(entry)) = entries.next_entry().await {
        let path = entry.path();
        let matches = path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .is_some_and(|stem| stem == job_id.as_str());
        if matches {
            discard(&path).await;
            removed += 1;
        }
    }
    removed
}

/// `DELETE /api/v1/video/:job_id`: drop the job, its result and its upload.
pub async fn delete_video(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> Result<Json<JsonValue>, ApiError> {
    let job_id = JobId::from(job_id);
    if state.pipeline.delete(&job_id).await?.is_none() {
        return Err(ApiError::NotFound("Video not found".to_string()));
    }
    let files_removed = remove_uploads(&state.config.upload_dir, &job_id).await;
    Ok(Json(json!({
        "deleted": true,
        "video_id": job_id,
        "files_removed": files_removed,
    })))
}
