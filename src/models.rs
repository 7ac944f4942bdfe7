use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ============ Lead Classification ============

/// Final classification of a lead.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeadStatus {
    /// Lead met all approval criteria.
    Approved,
    /// Lead explicitly failed (no interest, bogus call, etc.).
    Rejected,
    /// Lead requires a human decision.
    #[default]
    NeedsReview,
}

impl LeadStatus {
    /// Wire/database representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            LeadStatus::Approved => "approved",
            LeadStatus::Rejected => "rejected",
            LeadStatus::NeedsReview => "needs_review",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "approved" => Some(LeadStatus::Approved),
            "rejected" => Some(LeadStatus::Rejected),
            "needs_review" => Some(LeadStatus::NeedsReview),
            _ => None,
        }
    }
}

// ============ Verification Service (Melissa) Models ============

/// Authoritative identity/address record returned by the Melissa contact
/// verification service for a phone number.
///
/// Immutable once fetched; one record per lead-processing run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MelissaRecord {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip: Option<String>,
    pub email: Option<String>,
    pub dob: Option<String>,
    /// Whether Melissa's own result codes confirmed the name.
    pub name_verified: bool,
    /// Whether Melissa's own result codes confirmed the address.
    pub address_verified: bool,
    pub melissa_address_found: bool,
    pub melissa_name_found: bool,
    /// Standardized address suggested by Melissa, when it corrected the input.
    pub suggested_address: Option<String>,
    /// Corrected name suggested by Melissa.
    pub suggested_name: Option<String>,
}

// ============ Raw LLM Extraction Payload ============
//
// Strict snake_case schema for the model's JSON response. Missing optional
// sub-objects default; a type mismatch fails deserialization and aborts the
// run (see AppError::ExtractionError).

/// Top-level LLM response for a lead-validation call.
#[derive(Debug, Clone, Deserialize)]
pub struct RawValidationResponse {
    pub classification: LeadStatus,
    pub confidence_score: f64,
    #[serde(default)]
    pub reasons: Vec<String>,
    pub extracted_data: RawExtractedData,
    #[serde(default)]
    pub missing_information: Vec<String>,
    #[serde(default)]
    pub data_discrepancies: Vec<String>,
    #[serde(default)]
    pub agent_feedback: Option<AgentFeedback>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawExtractedData {
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub date_of_birth: Option<String>,
    #[serde(default)]
    pub phone_number: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub zip_code: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub auto_insurance: Option<RawAutoInsurance>,
    #[serde(default)]
    pub home_insurance: Option<RawHomeInsurance>,
    #[serde(default)]
    pub health_insurance: Option<RawHealthInsurance>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawAutoInsurance {
    #[serde(default)]
    pub main_vehicle: Option<RawVehicleInfo>,
    #[serde(default)]
    pub secondary_vehicle: Option<RawVehicleInfo>,
    #[serde(default)]
    pub current_provider: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawVehicleInfo {
    #[serde(default)]
    pub year: Option<String>,
    #[serde(default)]
    pub make: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub confidence: Option<f64>,
    #[serde(default)]
    pub suggested_correction: Option<RawSuggestedCorrection>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawSuggestedCorrection {
    #[serde(default)]
    pub year: Option<String>,
    #[serde(default)]
    pub make: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawHomeInsurance {
    #[serde(default)]
    pub interested: Option<bool>,
    #[serde(default)]
    pub ownership: Option<String>,
    #[serde(default)]
    pub home_type: Option<String>,
    #[serde(default)]
    pub current_provider: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawHealthInsurance {
    #[serde(default)]
    pub interested: Option<bool>,
    #[serde(default)]
    pub household_size: Option<RawHouseholdSize>,
    #[serde(default)]
    pub current_provider: Option<String>,
}

/// The model reports household size as either a number or free text.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RawHouseholdSize {
    Count(i64),
    Text(String),
}

/// Agent performance evaluation reported by the LLM.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentFeedback {
    #[serde(default)]
    pub asked_for_callback_number: bool,
    #[serde(default)]
    pub asked_for_first_and_last_name: bool,
    #[serde(default)]
    pub asked_for_vehicle_year_make_model: bool,
    #[serde(default)]
    pub asked_for_secondary_vehicle: bool,
    #[serde(default)]
    pub asked_for_current_insurance_provider: bool,
    #[serde(default)]
    pub asked_for_own_rent_home: bool,
    #[serde(default)]
    pub asked_for_dob: bool,
    #[serde(default)]
    pub asked_for_address: bool,
}

// ============ Canonical Lead Data ============

/// Canonical contact + insurance fields for a lead.
///
/// Used both for the transcript-side extraction and for the merged,
/// verification-prioritized `extracted_data` on the final result.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedData {
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub dob: String,
    #[serde(default)]
    pub phone_number: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub zip: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub auto_insurance: AutoInsurance,
    #[serde(default)]
    pub home_insurance: HomeInsurance,
    #[serde(default)]
    pub health_insurance: HealthInsurance,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AutoInsurance {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub main_vehicle: Option<VehicleInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secondary_vehicle: Option<VehicleInfo>,
    #[serde(default)]
    pub current_provider: String,
}

/// Vehicle description as heard on the call.
///
/// `confidence` and `suggested_correction` are present only when the model
/// flagged an unusual make/model; their presence is itself a signal, so the
/// mapper never synthesizes empty placeholders for them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VehicleInfo {
    #[serde(default)]
    pub year: String,
    #[serde(default)]
    pub make: String,
    #[serde(default)]
    pub model: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggested_correction: Option<SuggestedCorrection>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuggestedCorrection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub make: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HomeInsurance {
    /// Tri-state: Some(true)/Some(false) when stated, None when the call
    /// never established interest.
    #[serde(default)]
    pub interested: Option<bool>,
    #[serde(default)]
    pub ownership: String,
    #[serde(default)]
    pub home_type: String,
    #[serde(default)]
    pub current_provider: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthInsurance {
    #[serde(default)]
    pub interested: Option<bool>,
    #[serde(default)]
    pub household_size: Option<String>,
    #[serde(default)]
    pub current_provider: String,
}

// ============ Verification Status ============

/// Field-level match flags between Melissa data and the transcript
/// extraction.
///
/// Each flag is `None` when either side lacked the field - absence of data
/// is never reported as agreement or disagreement.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationStatus {
    pub name_matches: Option<bool>,
    pub address_matches: Option<bool>,
    pub zip_matches: Option<bool>,
    pub state_matches: Option<bool>,
}

// ============ Validation Result ============

/// Final classification artifact for one processed recording.
///
/// Constructed exactly once per uploaded file, persisted, and read-only
/// afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResult {
    pub status: LeadStatus,
    pub confidence_score: f64,
    /// Merged lead data: Melissa-prioritized contact fields, transcript-only
    /// insurance fields.
    pub extracted_data: ExtractedData,
    /// The transcript-side extraction after the rule-based name override and
    /// leakage guard, kept for side-by-side display.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transcript_data: Option<ExtractedData>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub melissa_data: Option<MelissaRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verification: Option<VerificationStatus>,
    #[serde(default)]
    pub needs_manual_review: bool,
    #[serde(default)]
    pub manual_review_reasons: Vec<String>,
    /// False when the lookup was skipped (no phone number or no API key).
    #[serde(default)]
    pub melissa_lookup_attempted: bool,
    #[serde(default)]
    pub name_from_melissa: bool,
    #[serde(default)]
    pub address_from_melissa: bool,
    /// Copied from Melissa's own verification flags, never recomputed locally.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name_verified: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address_verified: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub melissa_address_found: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub melissa_name_found: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggested_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggested_name: Option<String>,
    #[serde(default)]
    pub invalid_zip: bool,
    /// Discrepancy mirrors: populated only when the transcript value differs
    /// from the Melissa value for the field.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transcript_first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transcript_last_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transcript_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transcript_zip: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_feedback: Option<AgentFeedback>,
}

impl Default for ValidationResult {
    fn default() -> Self {
        Self {
            status: LeadStatus::NeedsReview,
            confidence_score: 0.5,
            extracted_data: ExtractedData::default(),
            transcript_data: None,
            melissa_data: None,
            verification: None,
            needs_manual_review: false,
            manual_review_reasons: Vec::new(),
            melissa_lookup_attempted: false,
            name_from_melissa: false,
            address_from_melissa: false,
            name_verified: None,
            address_verified: None,
            melissa_address_found: None,
            melissa_name_found: None,
            suggested_address: None,
            suggested_name: None,
            invalid_zip: false,
            transcript_first_name: None,
            transcript_last_name: None,
            transcript_address: None,
            transcript_zip: None,
            agent_feedback: None,
        }
    }
}

/// A validation result as persisted, keyed by id and retrievable by the
/// list/detail endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredValidationResult {
    pub id: Uuid,
    pub file_name: String,
    pub phone_number: String,
    pub transcript: String,
    pub created_at: DateTime<Utc>,
    #[serde(flatten)]
    pub result: ValidationResult,
}

/// Query parameters for the results list endpoint.
#[derive(Debug, Default, Deserialize)]
pub struct ResultsListQuery {
    pub limit: Option<i64>,
}

// ============ Deepgram Transcription Models ============

/// Root response from the Deepgram pre-recorded transcription API.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DeepgramResponse {
    pub results: DeepgramResults,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DeepgramResults {
    #[serde(default)]
    pub channels: Vec<DeepgramChannel>,
    /// Present when the backend performed utterance segmentation.
    #[serde(default)]
    pub utterances: Option<Vec<DeepgramUtterance>>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DeepgramChannel {
    #[serde(default)]
    pub alternatives: Vec<DeepgramAlternative>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DeepgramAlternative {
    #[serde(default)]
    pub words: Vec<DeepgramWord>,
    #[serde(default)]
    pub transcript: Option<String>,
}

/// A single word with diarization info.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DeepgramWord {
    pub word: String,
    #[serde(default)]
    pub start: f64,
    #[serde(default)]
    pub end: f64,
    #[serde(default)]
    pub confidence: f64,
    /// Numeric speaker identifier assigned by diarization.
    #[serde(default)]
    pub speaker: u32,
    #[serde(default)]
    pub punctuated_word: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DeepgramUtterance {
    #[serde(default)]
    pub speaker: u32,
    #[serde(default)]
    pub transcript: String,
}

impl DeepgramResponse {
    /// Render the response as speaker-tagged transcript lines, one line per
    /// speaker turn: `[Speaker:<id>] <text>`.
    ///
    /// Prefers backend utterances; falls back to coalescing diarized words,
    /// then to the plain transcript string.
    pub fn formatted_transcript(&self) -> String {
        if let Some(utterances) = &self.results.utterances {
            return utterances
                .iter()
                .map(|u| format!("[Speaker:{}] {}", u.speaker, u.transcript))
                .collect::<Vec<_>>()
                .join("\n");
        }

        let words = self
            .results
            .channels
            .first()
            .and_then(|c| c.alternatives.first())
            .map(|a| a.words.as_slice())
            .unwrap_or(&[]);

        if !words.is_empty() {
            let mut lines: Vec<String> = Vec::new();
            let mut current_speaker: Option<u32> = None;
            let mut current_text = String::new();

            for word in words {
                if current_speaker != Some(word.speaker) {
                    if !current_text.is_empty() {
                        lines.push(current_text.clone());
                    }
                    current_speaker = Some(word.speaker);
                    current_text = format!("[Speaker:{}] {}", word.speaker, word.word);
                } else {
                    current_text.push(' ');
                    current_text.push_str(&word.word);
                }
            }
            if !current_text.is_empty() {
                lines.push(current_text);
            }
            return lines.join("\n");
        }

        self.results
            .channels
            .first()
            .and_then(|c| c.alternatives.first())
            .and_then(|a| a.transcript.clone())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_transcript_coalesces_speaker_turns() {
        let json = r#"{
            "results": {
                "channels": [{
                    "alternatives": [{
                        "words": [
                            {"word": "hello", "start": 0.5, "end": 0.8, "confidence": 0.95, "speaker": 0},
                            {"word": "there", "start": 0.9, "end": 1.2, "confidence": 0.92, "speaker": 0},
                            {"word": "hi", "start": 1.5, "end": 1.7, "confidence": 0.9, "speaker": 1}
                        ]
                    }]
                }]
            }
        }"#;

        let response: DeepgramResponse = serde_json::from_str(json).unwrap();
        assert_eq!(
            response.formatted_transcript(),
            "[Speaker:0] hello there\n[Speaker:1] hi"
        );
    }

    #[test]
    fn test_format_transcript_prefers_utterances() {
        let json = r#"{
            "results": {
                "channels": [],
                "utterances": [
                    {"speaker": 2, "transcript": "can you spell that"},
                    {"speaker": 3, "transcript": "j o h n"}
                ]
            }
        }"#;

        let response: DeepgramResponse = serde_json::from_str(json).unwrap();
        assert_eq!(
            response.formatted_transcript(),
            "[Speaker:2] can you spell that\n[Speaker:3] j o h n"
        );
    }

    #[test]
    fn test_raw_payload_tolerates_missing_optional_objects() {
        let json = r#"{
            "classification": "approved",
            "confidence_score": 0.9,
            "extracted_data": {"first_name": "Jane"}
        }"#;

        let raw: RawValidationResponse = serde_json::from_str(json).unwrap();
        assert_eq!(raw.classification, LeadStatus::Approved);
        assert_eq!(raw.extracted_data.first_name.as_deref(), Some("Jane"));
        assert!(raw.extracted_data.auto_insurance.is_none());
        assert!(raw.missing_information.is_empty());
    }

    #[test]
    fn test_raw_payload_rejects_type_mismatch() {
        // confidence_score must be numeric
        let json = r#"{
            "classification": "approved",
            "confidence_score": "high",
            "extracted_data": {}
        }"#;

        assert!(serde_json::from_str::<RawValidationResponse>(json).is_err());
    }

    #[test]
    fn test_household_size_accepts_number_or_string() {
        let json = r#"{"interested": true, "household_size": 4}"#;
        let h: RawHealthInsurance = serde_json::from_str(json).unwrap();
        assert!(matches!(h.household_size, Some(RawHouseholdSize::Count(4))));

        let json = r#"{"interested": true, "household_size": "four"}"#;
        let h: RawHealthInsurance = serde_json::from_str(json).unwrap();
        assert!(matches!(h.household_size, Some(RawHouseholdSize::Text(_))));

        let json = r#"{"interested": null, "household_size": null}"#;
        let h: RawHealthInsurance = serde_json::from_str(json).unwrap();
        assert!(h.household_size.is_none());
    }
}
