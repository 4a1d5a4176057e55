//! Cache key derivation.

use reqwest::Method;
use std::collections::BTreeMap;

/// Deterministic key from method, path and the vary headers present.
///
/// Header names compare case-insensitively; headers not listed in `vary`
/// do not affect the key.
pub fn cache_key(
    method: &Method,
    path: &str,
    headers: &BTreeMap<String, String>,
    vary: &[String],
) -> String {
    let mut key = format!("{} {}", method, path);

    let mut parts: Vec<(String, &str)> = headers
        .iter()
        .map(|(name, value)| (name.to_ascii_lowercase(), value.as_str()))
        .filter(|(name, _)| vary.iter().any(|v| v.eq_ignore_ascii_case(name)))
        .collect();
    parts.sort();

    for (name, value) in parts {
        key.push('|');
        key.push_str(&name);
        key.push('=');
        key.push_str(value);
    }
    key
}
