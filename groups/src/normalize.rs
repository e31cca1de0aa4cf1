//! Coercion helpers that make ids and counts from SQLite rows and JSON
//! documents comparable with each other.

use crate::types::{GroupKey, RawValue};

/// Best-effort integer coercion. Text and bytes are parsed as an integer
/// first and as a float second. Floats are truncated toward zero.
pub fn safe_int(value: &RawValue) -> Option<i64> {
    match value {
        RawValue::Null => None,
        RawValue::Bool(b) => Some(i64::from(*b)),
        RawValue::Integer(i) => Some(*i),
        RawValue::Real(f) => truncate(*f),
        RawValue::Text(s) => parse_int(s),
        RawValue::Bytes(b) => std::str::from_utf8(b).ok().and_then(parse_int),
    }
}

/// Member counts are never negative; anything that can't be read as one is 0.
pub fn safe_count(value: &RawValue) -> u64 {
    safe_int(value)
        .and_then(|i| u64::try_from(i).ok())
        .unwrap_or(0)
}

/// Returns `None` only for null. Every other value maps to a key.
pub fn normalize_key(value: &RawValue) -> Option<GroupKey> {
    if let RawValue::Null = value {
        return None;
    }

    if let Some(i) = safe_int(value) {
        return Some(GroupKey::Int(i));
    }

    let key = match value {
        RawValue::Text(s) => s.clone(),
        RawValue::Bytes(b) => String::from_utf8_lossy(b).into_owned(),
        RawValue::Real(f) => f.to_string(),
        // Null, Bool and Integer always coerce above
        RawValue::Null | RawValue::Bool(_) | RawValue::Integer(_) => return None,
    };

    Some(GroupKey::Str(key))
}

/// Text rendering for values that must be shown as a group name.
pub fn display_string(value: &RawValue) -> Option<String> {
    match value {
        RawValue::Null => None,
        RawValue::Bool(b) => Some(b.to_string()),
        RawValue::Integer(i) => Some(i.to_string()),
        RawValue::Real(f) => Some(f.to_string()),
        RawValue::Text(s) => Some(s.clone()),
        RawValue::Bytes(b) => Some(String::from_utf8_lossy(b).into_owned()),
    }
}

fn parse_int(s: &str) -> Option<i64> {
    let trimmed = s.trim();
    trimmed
        .parse::<i64>()
        .ok()
        .or_else(|| trimmed.parse::<f64>().ok().and_then(truncate))
}

fn truncate(f: f64) -> Option<i64> {
    // i64::MAX as f64 rounds up to 2^63, so the upper bound is exclusive
    if f.is_finite() && f >= i64::MIN as f64 && f < i64::MAX as f64 {
        Some(f.trunc() as i64)
    } else {
        None
    }
}
