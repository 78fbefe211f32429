//! Receipt chain construction

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::flight::NormalizedEvent;

use super::canonical::{canonical_json, sha256_hex};
use super::GENESIS_HASH;

/// An integrity receipt binding one event to the previous receipt
///
/// The hashed core is {trace_id, seq, event_type, event_hash, prev_hash};
/// `event_ts` is deterministic metadata carried outside the hash.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Receipt {
    pub trace_id: String,
    pub seq: i64,
    pub event_type: String,
    pub event_hash: String,
    pub prev_hash: String,
    pub event_ts: Value,
    pub receipt_hash: String,
}

impl Receipt {
    /// Canonical encoding of the hashed core fields
    pub fn canonical_core(
        trace_id: &str,
        seq: i64,
        event_type: &str,
        event_hash: &str,
        prev_hash: &str,
    ) -> String {
        canonical_json(&json!({
            "trace_id": trace_id,
            "seq": seq,
            "event_type": event_type,
            "event_hash": event_hash,
            "prev_hash": prev_hash,
        }))
    }

    /// Recompute this receipt's hash from its own core fields
    pub fn compute_hash(&self) -> String {
        sha256_hex(&Self::canonical_core(
            &self.trace_id,
            self.seq,
            &self.event_type,
            &self.event_hash,
            &self.prev_hash,
        ))
    }
}

/// Folds the event stream into a hash chain
///
/// Holds exactly one piece of state: the previous receipt hash, initialized
/// to the genesis value. Events must be appended in input order.
#[derive(Debug)]
pub struct ReceiptChainBuilder {
    prev_hash: String,
}

impl ReceiptChainBuilder {
    pub fn new() -> Self {
        Self {
            prev_hash: GENESIS_HASH.to_string(),
        }
    }

    /// Hash of the most recently appended receipt (genesis if none)
    pub fn last_hash(&self) -> &str {
        &self.prev_hash
    }

    /// Append one event, producing its receipt and advancing the chain
    pub fn append(&mut self, normalized: &NormalizedEvent) -> Receipt {
        let event = &normalized.event;
        let trace_id = if event.trace_id.is_empty() {
            "UNKNOWN".to_string()
        } else {
            event.trace_id.clone()
        };
        let event_type = if event.event_type.as_str().is_empty() {
            "UNKNOWN".to_string()
        } else {
            event.event_type.as_str().to_string()
        };
        let event_hash = sha256_hex(&canonical_json(event.raw_value()));

        let receipt_hash = sha256_hex(&Receipt::canonical_core(
            &trace_id,
            event.seq,
            &event_type,
            &event_hash,
            &self.prev_hash,
        ));

        let receipt = Receipt {
            trace_id,
            seq: event.seq,
            event_type,
            event_hash,
            prev_hash: std::mem::replace(&mut self.prev_hash, receipt_hash.clone()),
            event_ts: event
                .raw_value()
                .get("ts")
                .cloned()
                .unwrap_or(Value::Null),
            receipt_hash,
        };
        receipt
    }

    /// Fold a full event sequence into its receipt chain
    pub fn build(events: &[NormalizedEvent]) -> Vec<Receipt> {
        let mut builder = Self::new();
        events.iter().map(|e| builder.append(e)).collect()
    }
}

impl Default for ReceiptChainBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RecorderConfig;
    use crate::flight::EventNormalizer;

    fn normalized(value: Value, index: usize) -> NormalizedEvent {
        let config = RecorderConfig::default();
        EventNormalizer::new(&config).normalize_value(value, index)
    }

    fn sample_events() -> Vec<NormalizedEvent> {
        (1..=3)
            .map(|i| {
                normalized(
                    json!({
                        "v": "flight-log/1",
                        "ts": format!("2026-01-01T00:00:0{i}Z"),
                        "trace_id": "t-1",
                        "seq": i,
                        "actor": "agent",
                        "event_type": "FILE_IO",
                        "payload_digest": "d".repeat(64),
                        "domain_class": "FS",
                        "details": {"path": "/tmp/a", "op": "read"}
                    }),
                    i as usize,
                )
            })
            .collect()
    }

    #[test]
    fn test_chain_links_and_genesis() {
        let receipts = ReceiptChainBuilder::build(&sample_events());

        assert_eq!(receipts.len(), 3);
        assert_eq!(receipts[0].prev_hash, GENESIS_HASH);
        for i in 1..receipts.len() {
            assert_eq!(receipts[i].prev_hash, receipts[i - 1].receipt_hash);
        }
    }

    #[test]
    fn test_receipt_hash_recomputes() {
        let receipts = ReceiptChainBuilder::build(&sample_events());
        for r in &receipts {
            assert_eq!(r.receipt_hash, r.compute_hash());
        }
    }

    #[test]
    fn test_chain_is_deterministic() {
        let a = ReceiptChainBuilder::build(&sample_events());
        let b = ReceiptChainBuilder::build(&sample_events());
        assert_eq!(a, b);

        let a_json: Vec<String> = a.iter().map(|r| serde_json::to_string(r).unwrap()).collect();
        let b_json: Vec<String> = b.iter().map(|r| serde_json::to_string(r).unwrap()).collect();
        assert_eq!(a_json, b_json);
    }

    #[test]
    fn test_empty_trace_id_becomes_unknown() {
        let event = normalized(
            json!({"event_type": "FILE_IO", "seq": 1, "details": {"path": "/x", "op": "read"}}),
            1,
        );
        let receipts = ReceiptChainBuilder::build(&[event]);
        assert_eq!(receipts[0].trace_id, "UNKNOWN");
    }

    #[test]
    fn test_event_ts_carried_outside_hash() {
        let mut events = sample_events();
        let receipts_before = ReceiptChainBuilder::build(&events);

        // Same core fields, different ts: event_hash changes (ts is part of
        // the event), so this is only about the receipt core itself
        let core = Receipt::canonical_core("t", 1, "FILE_IO", &"a".repeat(64), GENESIS_HASH);
        assert!(!core.contains("event_ts"));

        events.truncate(1);
        assert_eq!(receipts_before[0].event_ts, json!("2026-01-01T00:00:01Z"));
    }
}
