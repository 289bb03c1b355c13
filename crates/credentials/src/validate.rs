//! Validation contract for WhatsApp session credential blobs (spec-facing
//! terms: "creds.json"). Accepts either a raw JSON object or a
//! base64-encoded JSON string of the same shape.

use base64::Engine;
use regex::Regex;
use serde_json::Value;
use std::sync::OnceLock;

use crate::error::{Error, Result};

const MAX_DECODED_BYTES: usize = 5 * 1024 * 1024;
const REQUIRED_CREDS_FIELDS: &[&str] = &["noiseKey", "signedIdentityKey", "signedPreKey", "registrationId"];
const MAX_SCAN_DEPTH: usize = 5;

fn me_id_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(\d+):").unwrap())
}

fn deep_scan_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(\d{10,15}):").unwrap())
}

#[derive(Debug, Clone)]
pub struct ValidatedCredentials {
    /// The parsed top-level object, suitable for storage as-is.
    pub value: Value,
    /// Digits-only phone number extracted from the credentials.
    pub phone: String,
    /// Canonical JSON encoding, for persistence and size bookkeeping.
    pub canonical_json: String,
}

/// Validates a credentials blob per steps 1-5 of the contract. Step 6
/// (global phone uniqueness) requires registry access and is the caller's
/// responsibility — see `wafleet-registry::RegistryStore::find_global_registration`.
pub fn validate_credentials(raw: &[u8], caller_phone: Option<&str>) -> Result<ValidatedCredentials> {
    if raw.len() > (MAX_DECODED_BYTES * 4) / 3 {
        return Err(Error::TooLarge);
    }

    let value = parse_json_or_base64(raw)?;

    let Value::Object(ref map) = value else {
        return Err(Error::NotAnObject);
    };
    if map.is_empty() {
        return Err(Error::NotAnObject);
    }

    let canonical_json = serde_json::to_string(&value).map_err(|_| Error::Unparseable)?;
    if canonical_json.len() > MAX_DECODED_BYTES {
        return Err(Error::TooLarge);
    }

    let creds = map.get("creds").and_then(Value::as_object).ok_or(Error::MissingField("creds"))?;
    for field in REQUIRED_CREDS_FIELDS {
        if !creds.contains_key(*field) {
            return Err(Error::MissingField(field));
        }
    }

    let phone = extract_phone(&value).ok_or(Error::PhoneNotFound)?;

    if let Some(caller_phone) = caller_phone {
        let normalized_caller = wafleet_common::ids::normalize_phone(caller_phone);
        if normalized_caller != phone {
            return Err(Error::PhoneMismatch);
        }
    }

    Ok(ValidatedCredentials {
        value,
        phone,
        canonical_json,
    })
}

fn parse_json_or_base64(raw: &[u8]) -> Result<Value> {
    if let Ok(value) = serde_json::from_slice::<Value>(raw) {
        return Ok(value);
    }
    let decoded = base64::engine::general_purpose::STANDARD
        .decode(raw)
        .or_else(|_| base64::engine::general_purpose::STANDARD_NO_PAD.decode(raw))
        .map_err(|_| Error::Unparseable)?;
    if decoded.len() > MAX_DECODED_BYTES {
        return Err(Error::TooLarge);
    }
    serde_json::from_slice::<Value>(&decoded).map_err(|_| Error::Unparseable)
}

/// Extraction order: `creds.me.id`, then top-level `me.id`, then a
/// depth-bounded deep scan for any `<digits>:` string or a "phone"/"number"
/// field holding a 10-15 digit value.
fn extract_phone(value: &Value) -> Option<String> {
    if let Some(id) = value.pointer("/creds/me/id").and_then(Value::as_str)
        && let Some(phone) = me_id_pattern().captures(id).and_then(|c| c.get(1))
    {
        return Some(phone.as_str().to_string());
    }
    if let Some(id) = value.pointer("/me/id").and_then(Value::as_str)
        && let Some(phone) = me_id_pattern().captures(id).and_then(|c| c.get(1))
    {
        return Some(phone.as_str().to_string());
    }
    deep_scan(value, 0)
}

fn deep_scan(value: &Value, depth: usize) -> Option<String> {
    if depth > MAX_SCAN_DEPTH {
        return None;
    }
    match value {
        Value::String(s) => deep_scan_pattern()
            .captures(s)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().to_string()),
        Value::Object(map) => {
            for (key, v) in map {
                let key_lower = key.to_lowercase();
                if (key_lower.contains("phone") || key_lower.contains("number"))
                    && let Value::String(s) = v
                {
                    let digits = wafleet_common::ids::normalize_phone(s);
                    if (10..=15).contains(&digits.len()) {
                        return Some(digits);
                    }
                }
                if let Some(found) = deep_scan(v, depth + 1) {
                    return Some(found);
                }
            }
            None
        },
        Value::Array(items) => {
            for item in items {
                if let Some(found) = deep_scan(item, depth + 1) {
                    return Some(found);
                }
            }
            None
        },
        _ => None,
    }
}
