//! Opaque identifier generation.

/// Generate a new opaque id (UUIDv4, no hyphens stripped — callers that want
/// a shorter form can truncate for display purposes only).
#[must_use]
pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Digits-only normalization for phone number comparisons. Strips every
/// non-digit character so `+1 (555) 010-0001` and `15550100001` compare
/// equal.
#[must_use]
pub fn normalize_phone(raw: &str) -> String {
    raw.chars().filter(char::is_ascii_digit).collect()
}
