use crate::config::Config;
use crate::db_storage::ValidationResultStorage;
use crate::errors::AppError;
use crate::models::{MelissaRecord, ResultsListQuery, StoredValidationResult};
use crate::validation::process_recording_workflow;
use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    Json,
};
use moka::future::Cache;
use serde_json::json;
use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;

/// Shared application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub db: PgPool,
    /// Application configuration.
    pub config: Config,
    /// Cache of successful Melissa lookups keyed by phone number (24h TTL),
    /// so repeat uploads for the same caller skip the external call.
    pub melissa_cache: Cache<String, MelissaRecord>,
}

/// Health check endpoint.
///
/// Returns the service status, version, and health information.
pub async fn health() -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::OK,
        Json(json!({
            "status": "healthy",
            "service": "lead-validation-api",
            "version": "0.1.0"
        })),
    )
}

/// POST /api/v1/recordings
///
/// Accepts a multipart upload with an `audio` field (audio/mpeg), runs the
/// full validation pipeline for that one recording, and returns the stored
/// result.
///
/// # Arguments
///
/// * `state` - The application state.
/// * `multipart` - Multipart form data carrying the audio file.
///
/// # Returns
///
/// * `Result<Json<StoredValidationResult>, AppError>` - The persisted
///   validation result or an error.
pub async fn upload_recording(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<StoredValidationResult>, AppError> {
    tracing::info!("POST /recordings - receiving upload");

    let mut upload: Option<(String, String, Vec<u8>)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("Invalid multipart payload: {}", e)))?
    {
        if field.name() != Some("audio") {
            continue;
        }
        let file_name = field
            .file_name()
            .unwrap_or("recording.mp3")
            .to_string();
        let content_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(format!("Failed to read audio field: {}", e)))?;
        upload = Some((file_name, content_type, bytes.to_vec()));
    }

    let Some((file_name, content_type, audio)) = upload else {
        return Err(AppError::BadRequest(
            "Missing 'audio' field in form data".to_string(),
        ));
    };

    if content_type != "audio/mpeg" {
        return Err(AppError::BadRequest(
            "Invalid or missing audio file".to_string(),
        ));
    }
    if audio.is_empty() {
        return Err(AppError::BadRequest("Empty audio file".to_string()));
    }

    tracing::info!(
        "Processing upload: {} ({} bytes, {})",
        file_name,
        audio.len(),
        content_type
    );

    let stored = process_recording_workflow(state, &file_name, audio, &content_type).await?;
    Ok(Json(stored))
}

/// GET /api/v1/results
///
/// Lists stored validation results, newest first.
pub async fn list_results(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ResultsListQuery>,
) -> Result<Json<Vec<StoredValidationResult>>, AppError> {
    tracing::info!("GET /results - limit: {:?}", params.limit);

    let storage = ValidationResultStorage::new(state.db.clone());
    let results = storage.list_results(params.limit).await?;

    tracing::info!("Returning {} validation results", results.len());
    Ok(Json(results))
}

/// GET /api/v1/results/:id
///
/// Retrieves a single validation result by its UUID.
pub async fn get_result(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<StoredValidationResult>, AppError> {
    tracing::info!("GET /results/{}", id);

    let storage = ValidationResultStorage::new(state.db.clone());
    let result = storage.get_result(id).await?;

    Ok(Json(result))
}
