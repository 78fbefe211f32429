//! Canonical JSON encoding and hashing
//!
//! The chain is only cross-implementation compatible if every producer
//! hashes the exact same bytes: object keys sorted lexicographically,
//! compact separators, UTF-8, serde_json's stable number formatting.

use serde_json::Value;
use sha2::{Digest, Sha256};

/// Canonical JSON serialization (sorted keys, no whitespace)
pub fn canonical_json(value: &Value) -> String {
    match value {
        Value::Object(map) => {
            let mut pairs: Vec<_> = map.iter().collect();
            pairs.sort_by_key(|(k, _)| *k);
            let contents: Vec<String> = pairs
                .iter()
                .map(|(k, v)| {
                    let key = serde_json::to_string(k).unwrap_or_default();
                    format!("{}:{}", key, canonical_json(v))
                })
                .collect();
            format!("{{{}}}", contents.join(","))
        }
        Value::Array(arr) => {
            let contents: Vec<String> = arr.iter().map(canonical_json).collect();
            format!("[{}]", contents.join(","))
        }
        _ => serde_json::to_string(value).unwrap_or_default(),
    }
}

/// Lowercase hex SHA-256 of a UTF-8 string
pub fn sha256_hex(s: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(s.as_bytes());
    hex::encode(hasher.finalize())
}

/// Check that a string is a 64-character lowercase hex digest
pub fn is_hex_digest(s: &str) -> bool {
    s.len() == 64 && s.chars().all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c))
}
