use crate::errors::{AppError, ResultExt};
use crate::models::{
    LeadStatus, StoredValidationResult, ValidationResult,
};
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use uuid::Uuid;

/// Database storage for validation results.
///
/// Each processed recording inserts exactly one row; rows are never updated
/// afterwards. Schema lives in `migrations/0001_create_validation_results.sql`.
pub struct ValidationResultStorage {
    pool: PgPool,
}

impl ValidationResultStorage {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Persist a freshly assembled validation result.
    pub async fn insert_result(
        &self,
        result: &ValidationResult,
        file_name: &str,
        phone_number: &str,
        transcript: &str,
    ) -> Result<StoredValidationResult, AppError> {
        let id = Uuid::new_v4();
        let created_at = Utc::now();

        let extracted_data = serde_json::to_value(&result.extracted_data)
            .map_err(|e| AppError::InternalError(format!("Failed to serialize result: {}", e)))?;
        let transcript_data = result
            .transcript_data
            .as_ref()
            .map(serde_json::to_value)
            .transpose()
            .map_err(|e| AppError::InternalError(format!("Failed to serialize result: {}", e)))?;
        let melissa_data = result
            .melissa_data
            .as_ref()
            .map(serde_json::to_value)
            .transpose()
            .map_err(|e| AppError::InternalError(format!("Failed to serialize result: {}", e)))?;
        let verification = result
            .verification
            .as_ref()
            .map(serde_json::to_value)
            .transpose()
            .map_err(|e| AppError::InternalError(format!("Failed to serialize result: {}", e)))?;
        let agent_feedback = result
            .agent_feedback
            .as_ref()
            .map(serde_json::to_value)
            .transpose()
            .map_err(|e| AppError::InternalError(format!("Failed to serialize result: {}", e)))?;
        let reasons = serde_json::to_value(&result.manual_review_reasons)
            .map_err(|e| AppError::InternalError(format!("Failed to serialize result: {}", e)))?;

        sqlx::query(
            r#"
            INSERT INTO validation_results (
                id, file_name, phone_number, transcript, created_at,
                status, confidence_score, needs_manual_review,
                manual_review_reasons, extracted_data, transcript_data,
                melissa_data, verification, agent_feedback,
                melissa_lookup_attempted, name_from_melissa, address_from_melissa,
                name_verified, address_verified,
                melissa_address_found, melissa_name_found,
                suggested_address, suggested_name, invalid_zip,
                transcript_first_name, transcript_last_name,
                transcript_address, transcript_zip
            )
            VALUES (
                $1, $2, $3, $4, $5,
                $6, $7, $8,
                $9, $10, $11,
                $12, $13, $14,
                $15, $16, $17,
                $18, $19,
                $20, $21,
                $22, $23, $24,
                $25, $26,
                $27, $28
            )
            "#,
        )
        .bind(id)
        .bind(file_name)
        .bind(phone_number)
        .bind(transcript)
        .bind(created_at)
        .bind(result.status.as_str())
        .bind(result.confidence_score)
        .bind(result.needs_manual_review)
        .bind(reasons)
        .bind(extracted_data)
        .bind(transcript_data)
        .bind(melissa_data)
        .bind(verification)
        .bind(agent_feedback)
        .bind(result.melissa_lookup_attempted)
        .bind(result.name_from_melissa)
        .bind(result.address_from_melissa)
        .bind(result.name_verified)
        .bind(result.address_verified)
        .bind(result.melissa_address_found)
        .bind(result.melissa_name_found)
        .bind(result.suggested_address.as_deref())
        .bind(result.suggested_name.as_deref())
        .bind(result.invalid_zip)
        .bind(result.transcript_first_name.as_deref())
        .bind(result.transcript_last_name.as_deref())
        .bind(result.transcript_address.as_deref())
        .bind(result.transcript_zip.as_deref())
        .execute(&self.pool)
        .await
        .context("Failed to store validation result")?;

        tracing::info!("Stored validation result {} for file {}", id, file_name);

        Ok(StoredValidationResult {
            id,
            file_name: file_name.to_string(),
            phone_number: phone_number.to_string(),
            transcript: transcript.to_string(),
            created_at,
            result: result.clone(),
        })
    }

    /// All results, newest first.
    pub async fn list_results(
        &self,
        limit: Option<i64>,
    ) -> Result<Vec<StoredValidationResult>, AppError> {
        let rows = sqlx::query(
            r#"
            SELECT * FROM validation_results
            ORDER BY created_at DESC
            LIMIT $1
            "#,
        )
        .bind(limit.unwrap_or(100))
        .fetch_all(&self.pool)
        .await
        .context("Failed to list validation results")?;

        rows.into_iter().map(row_to_stored_result).collect()
    }

    /// One result by id.
    pub async fn get_result(&self, id: Uuid) -> Result<StoredValidationResult, AppError> {
        let row = sqlx::query("SELECT * FROM validation_results WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!("Validation result with id {} not found", id))
            })?;

        row_to_stored_result(row)
    }
}

fn row_to_stored_result(row: PgRow) -> Result<StoredValidationResult, AppError> {
    let status_text: String = row.try_get("status")?;
    let status = LeadStatus::parse(&status_text).ok_or_else(|| {
        AppError::InternalError(format!("Unknown status '{}' in database", status_text))
    })?;

    let result = ValidationResult {
        status,
        confidence_score: row.try_get("confidence_score")?,
        extracted_data: from_json_column(&row, "extracted_data")?.unwrap_or_default(),
        transcript_data: from_json_column(&row, "transcript_data")?,
        melissa_data: from_json_column(&row, "melissa_data")?,
        verification: from_json_column(&row, "verification")?,
        needs_manual_review: row.try_get("needs_manual_review")?,
        manual_review_reasons: from_json_column(&row, "manual_review_reasons")?
            .unwrap_or_default(),
        melissa_lookup_attempted: row.try_get("melissa_lookup_attempted")?,
        name_from_melissa: row.try_get("name_from_melissa")?,
        address_from_melissa: row.try_get("address_from_melissa")?,
        name_verified: row.try_get("name_verified")?,
        address_verified: row.try_get("address_verified")?,
        melissa_address_found: row.try_get("melissa_address_found")?,
        melissa_name_found: row.try_get("melissa_name_found")?,
        suggested_address: row.try_get("suggested_address")?,
        suggested_name: row.try_get("suggested_name")?,
        invalid_zip: row.try_get("invalid_zip")?,
        transcript_first_name: row.try_get("transcript_first_name")?,
        transcript_last_name: row.try_get("transcript_last_name")?,
        transcript_address: row.try_get("transcript_address")?,
        transcript_zip: row.try_get("transcript_zip")?,
        agent_feedback: from_json_column(&row, "agent_feedback")?,
    };

    let created_at: DateTime<Utc> = row.try_get("created_at")?;

    Ok(StoredValidationResult {
        id: row.try_get("id")?,
        file_name: row.try_get("file_name")?,
        phone_number: row.try_get("phone_number")?,
        transcript: row.try_get("transcript")?,
        created_at,
        result,
    })
}

/// Decode an optional JSONB column into a typed value.
fn from_json_column<T: serde::de::DeserializeOwned>(
    row: &PgRow,
    column: &str,
) -> Result<Option<T>, AppError> {
    let value: Option<serde_json::Value> = row.try_get(column)?;
    value
        .map(serde_json::from_value)
        .transpose()
        .map_err(|e| {
            AppError::InternalError(format!("Corrupt JSON in column '{}': {}", column, e))
        })
}
