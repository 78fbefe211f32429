//! Independent receipt chain verification
//!
//! The verifier takes an externally supplied receipt sequence (not
//! necessarily produced by this process) and checks it from the sequence
//! alone, with no external state. It returns a structured verdict and never
//! panics on malformed input.

use std::io::BufRead;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{RecorderError, Result};

use super::canonical::{is_hex_digest, sha256_hex};
use super::chain::Receipt;
use super::GENESIS_HASH;

/// Required keys on every receipt object
const REQUIRED_KEYS: &[&str] = &[
    "trace_id",
    "seq",
    "event_type",
    "event_hash",
    "prev_hash",
    "receipt_hash",
];

/// Hash-valued receipt fields (64-char lowercase hex)
const HASH_KEYS: &[&str] = &["event_hash", "prev_hash", "receipt_hash"];

/// Result of verifying a receipt chain
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainVerification {
    /// Whether the chain is valid
    pub is_valid: bool,

    /// Total number of receipts examined
    pub receipt_count: usize,

    /// Sequence number of the first offending receipt (if any)
    pub first_invalid_seq: Option<i64>,

    /// Type of error if the chain is invalid
    pub error_type: Option<ChainErrorType>,

    /// Human-readable error message
    pub error_message: Option<String>,

    /// Hash of the final receipt when the chain is valid
    pub final_hash: Option<String>,
}

impl ChainVerification {
    fn valid(receipt_count: usize, final_hash: String) -> Self {
        Self {
            is_valid: true,
            receipt_count,
            first_invalid_seq: None,
            error_type: None,
            error_message: None,
            final_hash: Some(final_hash),
        }
    }

    fn invalid(
        receipt_count: usize,
        seq: i64,
        error_type: ChainErrorType,
        message: String,
    ) -> Self {
        Self {
            is_valid: false,
            receipt_count,
            first_invalid_seq: Some(seq),
            error_type: Some(error_type),
            error_message: Some(message),
            final_hash: None,
        }
    }
}

/// Types of chain errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChainErrorType {
    /// The sequence contains no receipts
    EmptyChain,
    /// A receipt is not a JSON object or lacks a required key
    MissingField,
    /// A hash field is not 64 lowercase hex characters
    MalformedHash,
    /// A receipt_hash does not recompute from its own core fields
    HashMismatch,
    /// The first receipt does not link to the genesis hash
    InvalidGenesis,
    /// A prev_hash does not link to the prior receipt_hash
    ChainBroken,
}

impl std::fmt::Display for ChainErrorType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ChainErrorType::EmptyChain => "empty_chain",
            ChainErrorType::MissingField => "missing_field",
            ChainErrorType::MalformedHash => "malformed_hash",
            ChainErrorType::HashMismatch => "hash_mismatch",
            ChainErrorType::InvalidGenesis => "invalid_genesis",
            ChainErrorType::ChainBroken => "chain_broken",
        };
        write!(f, "{s}")
    }
}

/// Receipt chain verifier
pub struct ChainVerifier;

impl ChainVerifier {
    /// Verify a sequence of receipt JSON values
    ///
    /// Checks, in order, for each receipt: required keys present; the three
    /// hash fields are 64-char lowercase hex; receipt_hash recomputes from
    /// the core fields; prev_hash links to the prior receipt (genesis for
    /// the first). An empty sequence is invalid.
    pub fn verify(receipts: &[Value]) -> ChainVerification {
        if receipts.is_empty() {
            return ChainVerification::invalid(
                0,
                0,
                ChainErrorType::EmptyChain,
                "Receipt sequence is empty".to_string(),
            );
        }

        let mut prev_hash = GENESIS_HASH.to_string();

        for (i, value) in receipts.iter().enumerate() {
            // Best-effort seq for error reporting, index fallback
            let seq = value
                .get("seq")
                .and_then(Value::as_i64)
                .unwrap_or(i as i64);

            let Some(obj) = value.as_object() else {
                return ChainVerification::invalid(
                    receipts.len(),
                    seq,
                    ChainErrorType::MissingField,
                    format!("Receipt at seq {seq} is not a JSON object"),
                );
            };

            for key in REQUIRED_KEYS {
                if !obj.contains_key(*key) {
                    return ChainVerification::invalid(
                        receipts.len(),
                        seq,
                        ChainErrorType::MissingField,
                        format!("Receipt at seq {seq} is missing '{key}'"),
                    );
                }
            }

            for key in HASH_KEYS {
                let field = obj.get(*key).and_then(Value::as_str).unwrap_or("");
                if !is_hex_digest(field) {
                    return ChainVerification::invalid(
                        receipts.len(),
                        seq,
                        ChainErrorType::MalformedHash,
                        format!("Receipt at seq {seq}: '{key}' is not a 64-char lowercase hex digest"),
                    );
                }
            }

            let str_of = |key: &str| obj.get(key).and_then(Value::as_str).unwrap_or("").to_string();
            let trace_id = str_of("trace_id");
            let event_type = str_of("event_type");
            let event_hash = str_of("event_hash");
            let receipt_prev = str_of("prev_hash");
            let receipt_hash = str_of("receipt_hash");
            let core_seq = obj.get("seq").and_then(Value::as_i64).unwrap_or(seq);

            let expected = sha256_hex(&Receipt::canonical_core(
                &trace_id,
                core_seq,
                &event_type,
                &event_hash,
                &receipt_prev,
            ));
            if expected != receipt_hash {
                return ChainVerification::invalid(
                    receipts.len(),
                    seq,
                    ChainErrorType::HashMismatch,
                    format!(
                        "Receipt at seq {seq}: stored receipt_hash {receipt_hash} != computed {expected}"
                    ),
                );
            }

            if receipt_prev != prev_hash {
                let (error_type, expected_desc) = if i == 0 {
                    (ChainErrorType::InvalidGenesis, "genesis hash".to_string())
                } else {
                    (ChainErrorType::ChainBroken, format!("prior receipt_hash {prev_hash}"))
                };
                return ChainVerification::invalid(
                    receipts.len(),
                    seq,
                    error_type,
                    format!("Receipt at seq {seq}: prev_hash {receipt_prev} != {expected_desc}"),
                );
            }

            prev_hash = receipt_hash;
        }

        ChainVerification::valid(receipts.len(), prev_hash)
    }

    /// Verify typed receipts produced by this process
    pub fn verify_receipts(receipts: &[Receipt]) -> ChainVerification {
        let values: Vec<Value> = receipts
            .iter()
            .map(|r| serde_json::to_value(r).unwrap_or(Value::Null))
            .collect();
        Self::verify(&values)
    }

    /// Read a receipts.jsonl file and verify it
    ///
    /// I/O failures are errors; unparsable lines are carried into the
    /// verification as non-object receipts and fail there with a reason.
    pub fn verify_file(path: &std::path::Path) -> Result<ChainVerification> {
        let file = std::fs::File::open(path).map_err(|e| RecorderError::ReceiptsRead {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;

        let mut values = Vec::new();
        for line in std::io::BufReader::new(file).lines() {
            let line = line.map_err(|e| RecorderError::ReceiptsRead {
                path: path.display().to_string(),
                reason: e.to_string(),
            })?;
            if line.trim().is_empty() {
                continue;
            }
            values.push(serde_json::from_str(&line).unwrap_or(Value::Null));
        }

        Ok(Self::verify(&values))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RecorderConfig;
    use crate::flight::EventNormalizer;
    use crate::receipt::ReceiptChainBuilder;
    use serde_json::json;

    fn build_chain(n: usize) -> Vec<Value> {
        let config = RecorderConfig::default();
        let normalizer = EventNormalizer::new(&config);
        let events: Vec<_> = (1..=n)
            .map(|i| {
                normalizer.normalize_value(
                    json!({
                        "v": "flight-log/1",
                        "ts": "2026-01-01T00:00:00Z",
                        "trace_id": "t-1",
                        "seq": i,
                        "actor": "agent",
                        "event_type": "API_CALL",
                        "payload_digest": "d".repeat(64),
                        "domain_class": "NET",
                        "details": {"endpoint": "https://api.example/v1"}
                    }),
                    i,
                )
            })
            .collect();
        ReceiptChainBuilder::build(&events)
            .iter()
            .map(|r| serde_json::to_value(r).unwrap())
            .collect()
    }

    #[test]
    fn test_valid_chain_passes() {
        let chain = build_chain(4);
        let result = ChainVerifier::verify(&chain);
        assert!(result.is_valid);
        assert_eq!(result.receipt_count, 4);
        assert!(result.final_hash.is_some());
    }

    #[test]
    fn test_empty_chain_fails() {
        let result = ChainVerifier::verify(&[]);
        assert!(!result.is_valid);
        assert_eq!(result.error_type, Some(ChainErrorType::EmptyChain));
    }

    #[test]
    fn test_single_character_tamper_pinpoints_seq() {
        let mut chain = build_chain(4);

        // Flip one character in receipt 3's receipt_hash
        let hash = chain[2]["receipt_hash"].as_str().unwrap().to_string();
        let flipped = if hash.starts_with('0') {
            format!("1{}", &hash[1..])
        } else {
            format!("0{}", &hash[1..])
        };
        chain[2]["receipt_hash"] = json!(flipped);

        let result = ChainVerifier::verify(&chain);
        assert!(!result.is_valid);
        assert_eq!(result.first_invalid_seq, Some(3));
        assert_eq!(result.error_type, Some(ChainErrorType::HashMismatch));
    }

    #[test]
    fn test_broken_linkage_detected() {
        let mut chain = build_chain(3);

        // Replace receipt 2's prev_hash with a valid-looking digest and
        // recompute its receipt_hash so only the linkage is wrong
        let fake_prev = "ab".repeat(32);
        chain[1]["prev_hash"] = json!(fake_prev);
        let recomputed = sha256_hex(&Receipt::canonical_core(
            chain[1]["trace_id"].as_str().unwrap(),
            chain[1]["seq"].as_i64().unwrap(),
            chain[1]["event_type"].as_str().unwrap(),
            chain[1]["event_hash"].as_str().unwrap(),
            chain[1]["prev_hash"].as_str().unwrap(),
        ));
        chain[1]["receipt_hash"] = json!(recomputed);

        let result = ChainVerifier::verify(&chain);
        assert!(!result.is_valid);
        assert_eq!(result.first_invalid_seq, Some(2));
        assert_eq!(result.error_type, Some(ChainErrorType::ChainBroken));
    }

    #[test]
    fn test_bad_genesis_detected() {
        let mut chain = build_chain(2);
        let fake_prev = "cd".repeat(32);
        chain[0]["prev_hash"] = json!(fake_prev);
        let recomputed = sha256_hex(&Receipt::canonical_core(
            chain[0]["trace_id"].as_str().unwrap(),
            chain[0]["seq"].as_i64().unwrap(),
            chain[0]["event_type"].as_str().unwrap(),
            chain[0]["event_hash"].as_str().unwrap(),
            chain[0]["prev_hash"].as_str().unwrap(),
        ));
        chain[0]["receipt_hash"] = json!(recomputed);

        let result = ChainVerifier::verify(&chain);
        assert!(!result.is_valid);
        assert_eq!(result.error_type, Some(ChainErrorType::InvalidGenesis));
    }

    #[test]
    fn test_missing_key_detected() {
        let mut chain = build_chain(2);
        chain[1].as_object_mut().unwrap().remove("event_hash");

        let result = ChainVerifier::verify(&chain);
        assert!(!result.is_valid);
        assert_eq!(result.first_invalid_seq, Some(2));
        assert_eq!(result.error_type, Some(ChainErrorType::MissingField));
    }

    #[test]
    fn test_uppercase_hash_rejected() {
        let mut chain = build_chain(1);
        let upper = chain[0]["event_hash"].as_str().unwrap().to_uppercase();
        chain[0]["event_hash"] = json!(upper);

        let result = ChainVerifier::verify(&chain);
        assert!(!result.is_valid);
        assert_eq!(result.error_type, Some(ChainErrorType::MalformedHash));
    }

    #[test]
    fn test_non_object_receipt_reported() {
        let result = ChainVerifier::verify(&[json!("not an object")]);
        assert!(!result.is_valid);
        assert_eq!(result.error_type, Some(ChainErrorType::MissingField));
    }
}
