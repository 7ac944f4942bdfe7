/// Reconciliation of verification-service data with the LLM transcript
/// extraction, and assembly of the final classification.
///
/// The stages run in a fixed order because later stages consume earlier
/// ones' output: rule-based name override, then the leakage guard, then
/// verification-status computation, then the merge, then discrepancy
/// mirroring. Each stage is a standalone function so it can be tested on
/// its own.
use crate::models::{
    ExtractedData, MelissaRecord, RawExtractedData, RawHouseholdSize, RawValidationResponse,
    RawVehicleInfo, SuggestedCorrection, ValidationResult, VehicleInfo, VerificationStatus,
};
use crate::transcript::{self, SpelledNames};
use regex::Regex;

/// Reason recorded when the verification lookup throws.
pub const REASON_MELISSA_FAILED: &str = "Failed to retrieve data from verification service";
/// Reason recorded when the lookup is skipped outright.
pub const REASON_MELISSA_SKIPPED: &str = "No phone number or verification API key available";
/// Reason recorded when Melissa returns a malformed ZIP.
pub const REASON_INVALID_ZIP: &str = "Invalid ZIP code from verification source";

/// Outcome of one verification lookup attempt, fed into the assembler.
#[derive(Debug, Clone, Default)]
pub struct MelissaLookup {
    pub record: Option<MelissaRecord>,
    pub attempted: bool,
    /// Lookup-level review reasons (failure, skip, invalid ZIP), in the
    /// order they were detected.
    pub reasons: Vec<String>,
    pub invalid_zip: bool,
}

/// Transcript-side values that disagreed with the verification record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiscrepancyMirrors {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub address: Option<String>,
    pub zip: Option<String>,
}

/// Result of the reconciliation pipeline.
#[derive(Debug, Clone)]
pub struct ReconcileOutcome {
    /// Post-override, post-guard transcript extraction.
    pub transcript_data: ExtractedData,
    /// Melissa-prioritized merge of contact fields plus transcript-only
    /// insurance fields.
    pub merged_data: ExtractedData,
    pub verification: Option<VerificationStatus>,
    /// Leakage-guard reasons followed by mirror reasons.
    pub discrepancy_reasons: Vec<String>,
    pub mirrors: DiscrepancyMirrors,
    pub name_from_melissa: bool,
    pub address_from_melissa: bool,
}

/// Case/whitespace-insensitive equality used for verification matching.
///
/// Both values absent (or empty) compare equal - callers computing match
/// flags must guard on both-sides-present first so this vacuous true is
/// never surfaced as a real match. In ZIP mode only the component before
/// the first hyphen is compared ("12345" == "12345-6789").
pub fn compare_loosely(a: Option<&str>, b: Option<&str>, is_zip: bool) -> bool {
    let a = a.unwrap_or("");
    let b = b.unwrap_or("");

    if a.is_empty() && b.is_empty() {
        return true;
    }
    if a.is_empty() || b.is_empty() {
        return false;
    }

    if is_zip {
        let normalize = |zip: &str| {
            zip.split('-')
                .next()
                .unwrap_or("")
                .trim()
                .to_lowercase()
        };
        return normalize(a) == normalize(b);
    }

    a.trim().to_lowercase() == b.trim().to_lowercase()
}

/// US ZIP shape: 5 digits with an optional +4 suffix.
pub fn is_valid_zip_code(zip: &str) -> bool {
    Regex::new(r"^\d{5}(-\d{4})?$").unwrap().is_match(zip)
}

/// Convert the raw LLM payload into the canonical camelCase shape.
///
/// Every access is defensive: missing fields become empty strings and
/// missing sub-objects stay absent. `confidence` and `suggested_correction`
/// are carried over only when the model supplied them.
pub fn map_extracted_data(raw: &RawExtractedData) -> ExtractedData {
    let mut data = ExtractedData {
        first_name: raw.first_name.clone().unwrap_or_default(),
        last_name: raw.last_name.clone().unwrap_or_default(),
        dob: raw.date_of_birth.clone().unwrap_or_default(),
        phone_number: raw.phone_number.clone().unwrap_or_default(),
        address: raw.address.clone().unwrap_or_default(),
        city: String::new(),
        zip: raw.zip_code.clone().unwrap_or_default(),
        state: raw.state.clone().unwrap_or_default(),
        email: raw.email.clone().unwrap_or_default(),
        ..ExtractedData::default()
    };

    if let Some(auto) = &raw.auto_insurance {
        data.auto_insurance.main_vehicle = auto.main_vehicle.as_ref().map(map_vehicle);
        data.auto_insurance.secondary_vehicle = auto.secondary_vehicle.as_ref().map(map_vehicle);
        data.auto_insurance.current_provider = auto.current_provider.clone().unwrap_or_default();
    }

    if let Some(home) = &raw.home_insurance {
        data.home_insurance.interested = home.interested;
        data.home_insurance.ownership = home.ownership.clone().unwrap_or_default();
        data.home_insurance.home_type = home.home_type.clone().unwrap_or_default();
        data.home_insurance.current_provider = home.current_provider.clone().unwrap_or_default();
    }

    if let Some(health) = &raw.health_insurance {
        data.health_insurance.interested = health.interested;
        data.health_insurance.household_size = health.household_size.as_ref().map(|h| match h {
            RawHouseholdSize::Count(n) => n.to_string(),
            RawHouseholdSize::Text(s) => s.clone(),
        });
        data.health_insurance.current_provider =
            health.current_provider.clone().unwrap_or_default();
    }

    data
}

fn map_vehicle(raw: &RawVehicleInfo) -> VehicleInfo {
    VehicleInfo {
        year: raw.year.clone().unwrap_or_default(),
        make: raw.make.clone().unwrap_or_default(),
        model: raw.model.clone().unwrap_or_default(),
        confidence: raw.confidence,
        suggested_correction: raw.suggested_correction.as_ref().map(|sc| {
            SuggestedCorrection {
                year: sc.year.clone(),
                make: sc.make.clone(),
                model: sc.model.clone(),
                reason: sc.reason.clone(),
            }
        }),
    }
}

/// Run the full reconciliation pipeline for one lead.
pub fn reconcile(
    melissa: Option<&MelissaRecord>,
    raw_extracted: &RawExtractedData,
    transcript_text: &str,
    phone_number: &str,
) -> ReconcileOutcome {
    let spelled = transcript::extract_spelled_names(transcript_text);
    let mut data = map_extracted_data(raw_extracted);

    apply_spelled_name_override(&mut data, &spelled);
    let mut discrepancy_reasons = apply_leakage_guard(&mut data, melissa, transcript_text);
    let verification = melissa.map(|m| compute_verification_status(m, &data));
    let merged_data = merge_extracted_data(&data, melissa, phone_number);
    let mirrors = collect_discrepancy_mirrors(&data, melissa, &mut discrepancy_reasons);

    let name_from_melissa = melissa.is_some_and(|m| {
        present(m.first_name.as_deref()) || present(m.last_name.as_deref())
    });
    let address_from_melissa = melissa.is_some_and(|m| present(m.address.as_deref()));

    ReconcileOutcome {
        transcript_data: data,
        merged_data,
        verification,
        discrepancy_reasons,
        mirrors,
        name_from_melissa,
        address_from_melissa,
    }
}

/// Stage: interviewer-prompted spelled names override the LLM's.
fn apply_spelled_name_override(data: &mut ExtractedData, spelled: &SpelledNames) {
    if let Some(first) = &spelled.first_name {
        if !first.is_empty() {
            tracing::debug!("Overriding extracted first name with spelled-out name");
            data.first_name = first.clone();
        }
    }
    if let Some(last) = &spelled.last_name {
        if !last.is_empty() {
            tracing::debug!("Overriding extracted last name with spelled-out name");
            data.last_name = last.clone();
        }
    }
}

/// Stage: clear extracted names that match the verification record but are
/// not grounded in the transcript text.
///
/// The extraction prompt forbids copying the verification context, so a
/// literal match that the (normalized) transcript never mentions is treated
/// as contamination rather than corroboration.
fn apply_leakage_guard(
    data: &mut ExtractedData,
    melissa: Option<&MelissaRecord>,
    transcript_text: &str,
) -> Vec<String> {
    let mut reasons = Vec::new();
    let Some(melissa) = melissa else {
        return reasons;
    };

    let normalized = transcript::normalize_spelled_name(transcript_text);

    let extracted_first = data.first_name.to_lowercase();
    let melissa_first = melissa
        .first_name
        .as_deref()
        .unwrap_or("")
        .to_lowercase();
    if !extracted_first.is_empty()
        && extracted_first == melissa_first
        && !normalized.contains(&extracted_first)
    {
        tracing::warn!(
            "Extracted first name matches verification data but is absent from transcript; clearing"
        );
        data.first_name.clear();
        reasons.push(
            "First name from transcript extraction matched verification data but wasn't found in transcript"
                .to_string(),
        );
    }

    let extracted_last = data.last_name.to_lowercase();
    let melissa_last = melissa.last_name.as_deref().unwrap_or("").to_lowercase();
    if !extracted_last.is_empty()
        && extracted_last == melissa_last
        && !normalized.contains(&extracted_last)
    {
        tracing::warn!(
            "Extracted last name matches verification data but is absent from transcript; clearing"
        );
        data.last_name.clear();
        reasons.push(
            "Last name from transcript extraction matched verification data but wasn't found in transcript"
                .to_string(),
        );
    }

    reasons
}

/// Stage: field-level match flags, each gated on both sides having data.
fn compute_verification_status(
    melissa: &MelissaRecord,
    data: &ExtractedData,
) -> VerificationStatus {
    let mut status = VerificationStatus::default();

    let extracted_name_present = !data.first_name.is_empty() || !data.last_name.is_empty();
    let melissa_first = melissa.first_name.as_deref().unwrap_or("");
    let melissa_last = melissa.last_name.as_deref().unwrap_or("");
    let melissa_name_present = !melissa_first.is_empty() || !melissa_last.is_empty();

    if extracted_name_present && melissa_name_present {
        let extracted_full = format!("{} {}", data.first_name, data.last_name);
        let melissa_full = format!("{} {}", melissa_first, melissa_last);
        status.name_matches = Some(compare_loosely(
            Some(extracted_full.as_str()),
            Some(melissa_full.as_str()),
            false,
        ));
    }

    if present(Some(data.address.as_str())) && present(melissa.address.as_deref()) {
        status.address_matches = Some(compare_loosely(
            Some(data.address.as_str()),
            melissa.address.as_deref(),
            false,
        ));
    }

    if present(Some(data.zip.as_str())) && present(melissa.zip.as_deref()) {
        status.zip_matches = Some(compare_loosely(
            Some(data.zip.as_str()),
            melissa.zip.as_deref(),
            true,
        ));
    }

    if present(Some(data.state.as_str())) && present(melissa.state.as_deref()) {
        status.state_matches = Some(compare_loosely(
            Some(data.state.as_str()),
            melissa.state.as_deref(),
            false,
        ));
    }

    status
}

/// Stage: merge with verification-record priority for contact fields.
///
/// Insurance fields come from the transcript alone; contact fields fall back
/// to the transcript only where Melissa had nothing.
fn merge_extracted_data(
    data: &ExtractedData,
    melissa: Option<&MelissaRecord>,
    phone_number: &str,
) -> ExtractedData {
    let mut merged = data.clone();

    if let Some(melissa) = melissa {
        if let Some(first) = nonempty(melissa.first_name.as_deref()) {
            merged.first_name = first.to_string();
        }
        if let Some(last) = nonempty(melissa.last_name.as_deref()) {
            merged.last_name = last.to_string();
        }
        if let Some(address) = nonempty(melissa.address.as_deref()) {
            merged.address = address.to_string();
        }
        if let Some(city) = nonempty(melissa.city.as_deref()) {
            merged.city = city.to_string();
        }
        if let Some(state) = nonempty(melissa.state.as_deref()) {
            merged.state = state.to_string();
        }
        if let Some(zip) = nonempty(melissa.zip.as_deref()) {
            merged.zip = zip.to_string();
        }
    }

    if !phone_number.is_empty() {
        merged.phone_number = phone_number.to_string();
    }

    merged
}

/// Stage: mirror transcript values that disagree with Melissa and record a
/// fixed-text reason per field.
///
/// Names and address compare case-insensitively; ZIP compares the exact
/// strings, deliberately stricter than the loose zip match above, so a
/// "12345" vs "12345-6789" pair matches loosely yet still gets mirrored.
fn collect_discrepancy_mirrors(
    data: &ExtractedData,
    melissa: Option<&MelissaRecord>,
    reasons: &mut Vec<String>,
) -> DiscrepancyMirrors {
    let mut mirrors = DiscrepancyMirrors::default();
    let Some(melissa) = melissa else {
        return mirrors;
    };

    let differs_ci = |a: &str, b: &str| !a.to_lowercase().eq(&b.to_lowercase());

    if let Some(melissa_first) = nonempty(melissa.first_name.as_deref()) {
        if !data.first_name.is_empty() && differs_ci(&data.first_name, melissa_first) {
            mirrors.first_name = Some(data.first_name.clone());
            reasons.push("First name differs between verification data and transcript".to_string());
        }
    }

    if let Some(melissa_last) = nonempty(melissa.last_name.as_deref()) {
        if !data.last_name.is_empty() && differs_ci(&data.last_name, melissa_last) {
            mirrors.last_name = Some(data.last_name.clone());
            reasons.push("Last name differs between verification data and transcript".to_string());
        }
    }

    if let Some(melissa_address) = nonempty(melissa.address.as_deref()) {
        if !data.address.is_empty() && differs_ci(&data.address, melissa_address) {
            mirrors.address = Some(data.address.clone());
            reasons.push("Address differs between verification data and transcript".to_string());
        }
    }

    if let Some(melissa_zip) = nonempty(melissa.zip.as_deref()) {
        if !data.zip.is_empty() && data.zip != melissa_zip {
            mirrors.zip = Some(data.zip.clone());
            reasons.push("ZIP code differs between verification data and transcript".to_string());
        }
    }

    mirrors
}

/// Assemble the final result from the LLM verdict, the reconciliation
/// outcome, and the lookup log.
///
/// The LLM's classification and confidence pass through verbatim; local
/// checks only ever escalate toward manual review. Reasons accumulate in a
/// fixed order: lookup reasons, missing-information entries, LLM-reported
/// discrepancies, reconciliation discrepancies.
pub fn assemble_validation_result(
    raw: &RawValidationResponse,
    outcome: ReconcileOutcome,
    lookup: &MelissaLookup,
) -> ValidationResult {
    let mut reasons: Vec<String> = Vec::new();
    reasons.extend(lookup.reasons.iter().cloned());
    reasons.extend(
        raw.missing_information
            .iter()
            .map(|field| format!("Missing: {}", field)),
    );
    reasons.extend(raw.data_discrepancies.iter().cloned());
    reasons.extend(outcome.discrepancy_reasons.iter().cloned());

    let needs_manual_review = !lookup.reasons.is_empty()
        || !raw.missing_information.is_empty()
        || !raw.data_discrepancies.is_empty()
        || !outcome.discrepancy_reasons.is_empty();

    ValidationResult {
        status: raw.classification,
        confidence_score: raw.confidence_score,
        extracted_data: outcome.merged_data,
        transcript_data: Some(outcome.transcript_data),
        melissa_data: lookup.record.clone(),
        verification: outcome.verification,
        needs_manual_review,
        manual_review_reasons: reasons,
        melissa_lookup_attempted: lookup.attempted,
        name_from_melissa: outcome.name_from_melissa,
        address_from_melissa: outcome.address_from_melissa,
        name_verified: lookup.record.as_ref().map(|m| m.name_verified),
        address_verified: lookup.record.as_ref().map(|m| m.address_verified),
        melissa_address_found: lookup.record.as_ref().map(|m| m.melissa_address_found),
        melissa_name_found: lookup.record.as_ref().map(|m| m.melissa_name_found),
        suggested_address: lookup
            .record
            .as_ref()
            .and_then(|m| m.suggested_address.clone()),
        suggested_name: lookup
            .record
            .as_ref()
            .and_then(|m| m.suggested_name.clone()),
        invalid_zip: lookup.invalid_zip,
        transcript_first_name: outcome.mirrors.first_name,
        transcript_last_name: outcome.mirrors.last_name,
        transcript_address: outcome.mirrors.address,
        transcript_zip: outcome.mirrors.zip,
        agent_feedback: raw.agent_feedback.clone(),
    }
}

fn present(value: Option<&str>) -> bool {
    value.map_or(false, |s| !s.is_empty())
}

fn nonempty(value: Option<&str>) -> Option<&str> {
    value.filter(|s| !s.is_empty())
}
