//! JSON parsing helpers for service responses
//!
//! The serverless functions wrap model output, so bodies sometimes carry
//! extra text before or after the JSON payload.

use std::collections::BTreeMap;

use serde::de::DeserializeOwned;

use crate::error::{Error, Result};

use super::types::{DealMessage, EnrichmentResponse, EnrichmentResult, PersonalizationResponse};

const MAX_RAW_IN_ERROR: usize = 200;

fn truncate_raw(raw: &str) -> String {
    match raw.char_indices().nth(MAX_RAW_IN_ERROR) {
        Some((idx, _)) => format!("{}...", &raw[..idx]),
        None => raw.to_string(),
    }
}

/// Slice between the first `open` and the last `close`, inclusive
fn delimited(response: &str, open: char, close: char) -> Option<&str> {
    let start = response.find(open)?;
    let end = response.rfind(close)?;
    (start < end).then(|| &response[start..=end])
}

/// Extract and deserialize the JSON object embedded in a response body
pub fn extract_json<T: DeserializeOwned>(response: &str, what: &str) -> Result<T> {
    let response = response.trim();
    let json_str = delimited(response, '{', '}').ok_or_else(|| {
        Error::InvalidData(format!(
            "No JSON found in {} response | Raw: {}",
            what,
            truncate_raw(response)
        ))
    })?;
    serde_json::from_str(json_str).map_err(|e| {
        Error::InvalidData(format!(
            "Invalid {} JSON: {} | Raw: {}",
            what,
            e,
            truncate_raw(json_str)
        ))
    })
}

/// Parse an enrichment response
///
/// Accepts `{"results": [...]}` or a bare array of results.
pub fn parse_enrichment_response(response: &str) -> Result<Vec<EnrichmentResult>> {
    let trimmed = response.trim();
    let array_first = match (trimmed.find('['), trimmed.find('{')) {
        (Some(a), Some(o)) => a < o,
        (Some(_), None) => true,
        _ => false,
    };

    if array_first {
        if let Some(json_str) = delimited(trimmed, '[', ']') {
            return serde_json::from_str(json_str).map_err(|e| {
                Error::InvalidData(format!(
                    "Invalid enrichment JSON: {} | Raw: {}",
                    e,
                    truncate_raw(json_str)
                ))
            });
        }
    }

    let parsed: EnrichmentResponse = extract_json(trimmed, "enrichment")?;
    Ok(parsed.results)
}

/// Parse a personalization response into messages keyed by deal id
///
/// Accepts `{"messages": {...}}` or the bare id-to-message map.
pub fn parse_personalization_response(response: &str) -> Result<BTreeMap<String, DealMessage>> {
    let wrapped: Result<PersonalizationResponse> = extract_json(response, "personalization");
    match wrapped {
        Ok(parsed) if !parsed.messages.is_empty() => Ok(parsed.messages),
        _ => extract_json(response, "personalization"),
    }
}
