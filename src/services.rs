use crate::config::Config;
use crate::errors::AppError;
use crate::models::{DeepgramResponse, MelissaRecord, RawValidationResponse};
use crate::prompts::{create_user_prompt, SYSTEM_PROMPT};
use reqwest::Client;
use serde::{Deserialize, Serialize};

// ============ Deepgram (transcription) ============

pub struct DeepgramService {
    client: Client,
    base_url: String,
    api_key: String,
}

impl DeepgramService {
    pub fn new(config: &Config) -> Self {
        Self {
            client: Client::new(),
            base_url: config.deepgram_base_url.clone(),
            api_key: config.deepgram_api_key.clone(),
        }
    }

    /// Transcribe pre-recorded audio with diarization enabled.
    ///
    /// Any failure here is fatal for the run: no partial result is persisted
    /// for a recording we could not transcribe.
    pub async fn transcribe(
        &self,
        audio: Vec<u8>,
        content_type: &str,
    ) -> Result<DeepgramResponse, AppError> {
        let url = reqwest::Url::parse_with_params(
            &format!("{}/v1/listen", self.base_url),
            &[
                ("detect_language", "true"),
                ("punctuate", "true"),
                ("diarize", "true"),
            ],
        )
        .map_err(|e| AppError::TranscriptionError(format!("Failed to build URL: {}", e)))?;

        tracing::info!(
            "Sending {} bytes ({}) to Deepgram for transcription",
            audio.len(),
            content_type
        );

        let response = self
            .client
            .post(url)
            .header("Authorization", format!("Token {}", self.api_key))
            .header("Content-Type", content_type)
            .body(audio)
            .send()
            .await
            .map_err(|e| AppError::TranscriptionError(format!("Deepgram request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            tracing::error!("Deepgram returned error {}: {}", status, error_text);
            return Err(AppError::TranscriptionError(format!(
                "Deepgram returned status {}: {}",
                status, error_text
            )));
        }

        let result: DeepgramResponse = response.json().await.map_err(|e| {
            AppError::TranscriptionError(format!("Failed to parse Deepgram response: {}", e))
        })?;

        tracing::info!("Deepgram transcription completed");
        Ok(result)
    }
}

// ============ Melissa (contact verification) ============

/// Personator result codes indicating the name matched the phone record.
const NAME_VERIFIED_CODES: [&str; 3] = ["VR01", "VR02", "VR03"];
/// Personator result codes indicating the address matched the phone record.
const ADDRESS_VERIFIED_CODES: [&str; 3] = ["VR01", "VR02", "VR04"];

pub struct MelissaService {
    client: Client,
    base_url: String,
    api_key: String,
}

impl MelissaService {
    pub fn new(config: &Config, api_key: String) -> Self {
        Self {
            client: Client::new(),
            base_url: config.melissa_base_url.clone(),
            api_key,
        }
    }

    /// Look up the best-known identity record for a phone number.
    ///
    /// Failures here are degradable: the caller records a manual-review
    /// reason and continues with transcript-only data.
    pub async fn verify_contact(&self, phone: &str) -> Result<MelissaRecord, AppError> {
        let url = reqwest::Url::parse_with_params(
            &format!(
                "{}/v3/WEB/ContactVerify/doContactVerify",
                self.base_url
            ),
            &[
                ("id", self.api_key.as_str()),
                ("act", "Check,Verify,Append"),
                ("phone", phone),
                ("format", "json"),
            ],
        )
        .map_err(|e| AppError::ExternalApiError(format!("Failed to build URL: {}", e)))?;

        tracing::info!("Querying Melissa for phone: {}", phone);
        // Redact the license key from logs
        tracing::debug!(
            "Melissa URL: {}/v3/WEB/ContactVerify/doContactVerify?id=[REDACTED]&phone={}",
            self.base_url,
            phone
        );

        let response = self.client.get(url).send().await.map_err(|e| {
            AppError::ExternalApiError(format!("Melissa request failed: {}", e))
        })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            tracing::error!("Melissa returned error {}: {}", status, error_text);
            return Err(AppError::ExternalApiError(format!(
                "Melissa returned status {}: {}",
                status, error_text
            )));
        }

        let result: PersonatorResponse = response.json().await.map_err(|e| {
            AppError::ExternalApiError(format!("Failed to parse Melissa response: {}", e))
        })?;

        let record = result
            .records
            .into_iter()
            .next()
            .ok_or_else(|| {
                AppError::NotFound(format!("No verification record for phone {}", phone))
            })?;

        tracing::info!("Melissa record received for phone: {}", phone);
        Ok(record.into_melissa_record())
    }
}

/// Raw Personator ContactVerify response.
#[derive(Debug, Deserialize)]
struct PersonatorResponse {
    #[serde(rename = "Records", default)]
    records: Vec<PersonatorRecord>,
}

#[derive(Debug, Default, Deserialize)]
struct PersonatorRecord {
    #[serde(rename = "NameFirst", default)]
    name_first: String,
    #[serde(rename = "NameLast", default)]
    name_last: String,
    #[serde(rename = "AddressLine1", default)]
    address_line_1: String,
    #[serde(rename = "City", default)]
    city: String,
    #[serde(rename = "State", default)]
    state: String,
    #[serde(rename = "PostalCode", default)]
    postal_code: String,
    #[serde(rename = "EmailAddress", default)]
    email_address: String,
    #[serde(rename = "DateOfBirth", default)]
    date_of_birth: String,
    /// Comma-separated Personator result codes.
    #[serde(rename = "Results", default)]
    results: String,
}

impl PersonatorRecord {
    fn into_melissa_record(self) -> MelissaRecord {
        let codes: Vec<&str> = self.results.split(',').map(str::trim).collect();
        let has_any = |wanted: &[&str]| codes.iter().any(|c| wanted.contains(c));

        let name_verified = has_any(&NAME_VERIFIED_CODES);
        let address_verified = has_any(&ADDRESS_VERIFIED_CODES);
        // AC## = address corrected during standardization, NC## = name corrected
        let address_corrected = codes.iter().any(|c| c.starts_with("AC"));
        let name_corrected = codes.iter().any(|c| c.starts_with("NC"));

        let melissa_name_found = !self.name_first.is_empty() || !self.name_last.is_empty();
        let melissa_address_found = !self.address_line_1.is_empty();

        let suggested_address = if address_corrected && melissa_address_found {
            Some(format!(
                "{}, {}, {} {}",
                self.address_line_1, self.city, self.state, self.postal_code
            ))
        } else {
            None
        };
        let suggested_name = if name_corrected && melissa_name_found {
            Some(format!("{} {}", self.name_first, self.name_last).trim().to_string())
        } else {
            None
        };

        let optional = |s: String| if s.is_empty() { None } else { Some(s) };

        MelissaRecord {
            first_name: optional(self.name_first),
            last_name: optional(self.name_last),
            address: optional(self.address_line_1),
            city: optional(self.city),
            state: optional(self.state),
            zip: optional(self.postal_code),
            email: optional(self.email_address),
            dob: optional(self.date_of_birth),
            name_verified,
            address_verified,
            melissa_address_found,
            melissa_name_found,
            suggested_address,
            suggested_name,
        }
    }
}

// ============ OpenAI (LLM extraction) ============

pub struct OpenAiService {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl OpenAiService {
    pub fn new(config: &Config) -> Self {
        Self {
            client: Client::new(),
            base_url: config.openai_base_url.clone(),
            api_key: config.openai_api_key.clone(),
            model: config.openai_model.clone(),
        }
    }

    /// Run the lead-extraction prompt over a transcript.
    ///
    /// The response content must parse as the raw extraction schema; an
    /// unparseable payload is a fatal `ExtractionError`, never silently
    /// defaulted.
    pub async fn extract_lead(
        &self,
        transcript: &str,
        phone_number: &str,
        melissa: Option<&MelissaRecord>,
    ) -> Result<RawValidationResponse, AppError> {
        let request = ChatCompletionRequest {
            model: self.model.clone(),
            temperature: 0.0,
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: SYSTEM_PROMPT.to_string(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: create_user_prompt(transcript, phone_number, melissa),
                },
            ],
        };

        tracing::info!(
            "Starting lead extraction for transcript ({} chars)",
            transcript.len()
        );

        let response = self
            .client
            .post(format!("{}/v1/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&request)
            .send()
            .await
            .map_err(|e| AppError::ExtractionError(format!("OpenAI request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            tracing::error!("OpenAI returned error {}: {}", status, error_text);
            return Err(AppError::ExtractionError(format!(
                "OpenAI returned status {}: {}",
                status, error_text
            )));
        }

        let completion: ChatCompletionResponse = response.json().await.map_err(|e| {
            AppError::ExtractionError(format!("Failed to parse OpenAI response: {}", e))
        })?;

        let content = completion
            .choices
            .first()
            .map(|c| c.message.content.trim())
            .ok_or_else(|| {
                AppError::ExtractionError("OpenAI response contained no choices".to_string())
            })?;

        let result: RawValidationResponse = serde_json::from_str(content).map_err(|e| {
            AppError::ExtractionError(format!(
                "OpenAI content is not a valid extraction payload: {}",
                e
            ))
        })?;

        tracing::info!("Lead extraction parsed successfully");
        Ok(result)
    }
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    model: String,
    temperature: f64,
    messages: Vec<ChatMessage>,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    #[serde(default)]
    content: String,
}
