//! Best-effort JSON field extraction.
//!
//! The server's payloads are flat objects, so a scan for `"key":value` is
//! enough; this deliberately stays an extractor at the boundary rather than
//! a parser. Missing keys and malformed input yield `None`, never a panic.

/// Returns the raw token for `key`, with surrounding quotes stripped for
/// string values.
pub fn get_field(key: &str, json: &str) -> Option<String> {
    let pattern = format!("\"{}\":", key);
    let start = json.find(&pattern)? + pattern.len();
    let rest = json[start..].trim_start();

    if let Some(stripped) = rest.strip_prefix('"') {
        let end = stripped.find('"')?;
        return Some(stripped[..end].to_string());
    }

    // Numeric, boolean or null token: runs until a delimiter.
    let end = rest
        .find(|c: char| c == ',' || c == '}' || c.is_whitespace())
        .unwrap_or(rest.len());
    if end == 0 {
        return None;
    }
    Some(rest[..end].to_string())
}

/// String field with a sentinel fallback for missing or empty values.
pub fn get_text(key: &str, json: &str, fallback: &str) -> String {
    match get_field(key, json) {
        Some(v) if !v.is_empty() => v,
        _ => fallback.to_string(),
    }
}

/// `true` only for a literal `true` token; anything else is `false`.
pub fn get_bool(key: &str, json: &str) -> bool {
    get_field(key, json).as_deref() == Some("true")
}

/// Percentage field; accepts both `42` and `"42"`, clamped to 0..=100.
pub fn get_percent(key: &str, json: &str) -> Option<u8> {
    let raw = get_field(key, json)?;
    raw.trim_matches('"').parse::<i64>().ok().map(|v| v.clamp(0, 100) as u8)
}
