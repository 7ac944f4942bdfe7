/// Shared validation workflow for the upload handler.
///
/// One uploaded recording is one unit of work, processed as an ordered
/// pipeline:
/// 1. Extract phone number from the file name
/// 2. Verification lookup via Melissa (degradable, cached)
/// 3. Transcribe audio via Deepgram (fatal on failure)
/// 4. LLM lead extraction via OpenAI (fatal on failure)
/// 5. Reconcile and classify
/// 6. Store exactly one validation result
use crate::db_storage::ValidationResultStorage;
use crate::errors::AppError;
use crate::handlers::AppState;
use crate::models::StoredValidationResult;
use crate::reconcile::{
    assemble_validation_result, is_valid_zip_code, reconcile, MelissaLookup, REASON_INVALID_ZIP,
    REASON_MELISSA_FAILED, REASON_MELISSA_SKIPPED,
};
use crate::services::{DeepgramService, MelissaService, OpenAiService};
use regex::Regex;
use std::sync::Arc;

/// Pull the first 10-digit run out of an uploaded file's name.
///
/// Returns an empty string when none is found; the run then proceeds
/// without a verification lookup.
pub fn extract_phone_from_filename(filename: &str) -> String {
    Regex::new(r"\d{10}")
        .unwrap()
        .find(filename)
        .map(|m| m.as_str().to_string())
        .unwrap_or_default()
}

/// Attempt the Melissa verification lookup for a phone number.
///
/// Never fails the run: a thrown lookup is converted into a review reason,
/// a missing phone number or API key skips the lookup entirely. Successful
/// records are cached by phone so repeat uploads for the same caller skip
/// the external call. `attempted` marks lookups that produced a record;
/// failed and skipped lookups both leave it false.
pub async fn lookup_melissa(state: &Arc<AppState>, phone: &str) -> MelissaLookup {
    let mut lookup = MelissaLookup::default();

    let Some(api_key) = state.config.melissa_api_key.clone() else {
        tracing::info!("Skipping Melissa verification - no API key configured");
        lookup.reasons.push(REASON_MELISSA_SKIPPED.to_string());
        return lookup;
    };
    if phone.is_empty() {
        tracing::info!("Skipping Melissa verification - no phone number");
        lookup.reasons.push(REASON_MELISSA_SKIPPED.to_string());
        return lookup;
    }

    if let Some(cached) = state.melissa_cache.get(phone).await {
        tracing::debug!("Melissa cache HIT for phone: {}", phone);
        lookup.attempted = true;
        lookup.record = Some(cached);
    } else {
        let service = MelissaService::new(&state.config, api_key);
        match service.verify_contact(phone).await {
            Ok(record) => {
                state.melissa_cache.insert(phone.to_string(), record.clone()).await;
                lookup.attempted = true;
                lookup.record = Some(record);
            }
            Err(e) => {
                tracing::error!("Melissa lookup failed for phone {}: {}", phone, e);
                lookup.reasons.push(REASON_MELISSA_FAILED.to_string());
            }
        }
    }

    // Data-quality check on the returned ZIP; flags, never aborts.
    if let Some(record) = &lookup.record {
        if let Some(zip) = record.zip.as_deref() {
            if !is_valid_zip_code(zip) {
                tracing::warn!("Melissa returned invalid ZIP '{}' for phone {}", zip, phone);
                lookup.invalid_zip = true;
                lookup.reasons.push(REASON_INVALID_ZIP.to_string());
            }
        }
    }

    lookup
}

/// Complete validation workflow for one uploaded recording.
pub async fn process_recording_workflow(
    state: Arc<AppState>,
    file_name: &str,
    audio: Vec<u8>,
    content_type: &str,
) -> Result<StoredValidationResult, AppError> {
    tracing::info!("Starting validation workflow for file: {}", file_name);

    // Step 1: phone number from the file name
    let phone_number = extract_phone_from_filename(file_name);
    if phone_number.is_empty() {
        tracing::warn!("Couldn't extract phone number from filename: {}", file_name);
    } else {
        tracing::info!("Extracted phone number: {}", phone_number);
    }

    // Step 2: verification lookup (degradable)
    let lookup = lookup_melissa(&state, &phone_number).await;

    // Step 3: transcription (fatal for the run)
    tracing::info!("Step 3: Transcribing audio via Deepgram");
    let deepgram = DeepgramService::new(&state.config);
    let transcription = deepgram.transcribe(audio, content_type).await?;
    let transcript_text = transcription.formatted_transcript();
    if transcript_text.is_empty() {
        return Err(AppError::TranscriptionError(
            "Deepgram returned an empty transcript".to_string(),
        ));
    }

    // Step 4: LLM extraction (fatal for the run)
    tracing::info!("Step 4: Extracting lead data via OpenAI");
    let openai = OpenAiService::new(&state.config);
    let raw = openai
        .extract_lead(&transcript_text, &phone_number, lookup.record.as_ref())
        .await?;

    // Step 5: reconcile and classify
    tracing::info!("Step 5: Reconciling verification and transcript data");
    let outcome = reconcile(
        lookup.record.as_ref(),
        &raw.extracted_data,
        &transcript_text,
        &phone_number,
    );
    let result = assemble_validation_result(&raw, outcome, &lookup);

    // Step 6: persist exactly one record for this run
    tracing::info!("Step 6: Storing validation result");
    let storage = ValidationResultStorage::new(state.db.clone());
    let stored = storage
        .insert_result(&result, file_name, &phone_number, &transcript_text)
        .await?;

    tracing::info!(
        "Stored validation result {} (status: {}, manual review: {})",
        stored.id,
        stored.result.status.as_str(),
        stored.result.needs_manual_review
    );

    Ok(stored)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_phone_from_filename() {
        assert_eq!(
            extract_phone_from_filename("recording5551234567.mp3"),
            "5551234567"
        );
        assert_eq!(
            extract_phone_from_filename("call-2024-01-15-5551234567-final.mp3"),
            "5551234567"
        );
        assert_eq!(extract_phone_from_filename("no-phone-here.mp3"), "");
        assert_eq!(extract_phone_from_filename("short-555123.mp3"), "");
    }

    #[test]
    fn test_extract_phone_takes_first_ten_digit_run() {
        assert_eq!(
            extract_phone_from_filename("5551234567_then_9998887777.mp3"),
            "5551234567"
        );
    }
}
