//! Parsing of claim-extraction replies.

use super::Claim;
use crate::error::{Result, SiftError};
use crate::llm::extract_json;
use std::collections::HashSet;

/// Parse a JSON array of claim strings out of a model reply.
///
/// Blank and duplicate claims (compared case-insensitively) are dropped and
/// the rest capped at `max_claims`. An empty array is a valid answer.
pub fn parse_claims(reply: &str, max_claims: usize) -> Result<Vec<Claim>> {
    let json = extract_json(reply, '[');
    let raw: Vec<serde_json::Value> = serde_json::from_str(json)
        .map_err(|e| SiftError::Llm(format!("Claim list is not a JSON array: {}", e)))?;

    let mut seen = HashSet::new();
    let claims = raw
        .into_iter()
        .filter_map(|value| match value {
            serde_json::Value::String(s) => Some(s),
            // Some models answer with objects such as {"claim": "..."}
            serde_json::Value::Object(map) => map
                .get("claim")
                .or_else(|| map.get("text"))
                .and_then(|v| v.as_str())
                .map(str::to_string),
            _ => None,
        })
        .map(|text| text.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|text| !text.is_empty())
        .filter(|text| seen.insert(text.to_lowercase()))
        .take(max_claims)
        .map(Claim::new)
        .collect();

    Ok(claims)
}
