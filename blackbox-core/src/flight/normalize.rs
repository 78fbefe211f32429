//! Event normalization and evidence-gap detection
//!
//! Turns one raw flight-log line (or a parse failure) into a
//! [`NormalizedEvent`]: the canonical event, a resolved declared flag, and
//! the specific missing fields that make it an evidence gap. Normalization
//! never fails and never drops a line.

use serde_json::{json, Value};

use crate::config::RecorderConfig;
use crate::receipt::sha256_hex;

use super::event::FlightEvent;
use super::FLIGHT_LOG_VERSION;

/// Required top-level fields on every flight-log record
const REQUIRED_TOP_LEVEL: &[&str] = &[
    "v",
    "ts",
    "trace_id",
    "seq",
    "actor",
    "event_type",
    "payload_digest",
    "domain_class",
];

/// One flight event after normalization
#[derive(Debug, Clone)]
pub struct NormalizedEvent {
    /// The canonical event
    pub event: FlightEvent,

    /// Resolved declared flag (see precedence on [`EventNormalizer`])
    pub declared: bool,

    /// Whether this event is an evidence gap
    pub gap: bool,

    /// Specific fields found absent or empty ("ts", "details.host", ...)
    pub missing_fields: Vec<String>,

    /// The exporter explicitly set `data_complete=false`
    pub forced_incomplete: bool,
}

/// Normalizer for raw flight-log records
///
/// Declared resolution precedence: an explicit boolean `declared` field on
/// the event (details map wins over top level) beats membership of the
/// event type in the declared-intents set, which beats the default `false`.
pub struct EventNormalizer<'a> {
    config: &'a RecorderConfig,
}

impl<'a> EventNormalizer<'a> {
    pub fn new(config: &'a RecorderConfig) -> Self {
        Self { config }
    }

    /// Normalize one input line
    ///
    /// `file_line_no` is the 1-based line number in the input file (used
    /// for the deterministic parse-failure digest); `event_index` is the
    /// 1-based position among kept events (used as the seq fallback).
    pub fn normalize_line(
        &self,
        line: &str,
        file_line_no: usize,
        event_index: usize,
    ) -> NormalizedEvent {
        match serde_json::from_str::<Value>(line.trim()) {
            Ok(value) if value.is_object() => self.normalize_value(value, event_index),
            _ => self.synthesize_parse_gap(file_line_no),
        }
    }

    /// Normalize an already-parsed record
    pub fn normalize_value(&self, raw: Value, event_index: usize) -> NormalizedEvent {
        let mut obj = match raw {
            Value::Object(map) => map,
            _ => serde_json::Map::new(),
        };
        let mut missing_fields = Vec::new();

        // Tier (a): required top-level fields, checked before coercion
        for key in REQUIRED_TOP_LEVEL {
            let absent = match obj.get(*key) {
                None | Some(Value::Null) => true,
                Some(Value::String(s)) => s.trim().is_empty(),
                Some(_) => false,
            };
            if absent {
                missing_fields.push((*key).to_string());
            }
        }

        // Canonical shape: integer seq, object details
        let seq = obj.get("seq").and_then(Value::as_i64).unwrap_or(event_index as i64);
        obj.insert("seq".to_string(), json!(seq));
        if !obj.get("details").map(Value::is_object).unwrap_or(false) {
            obj.insert("details".to_string(), json!({}));
        }

        let event = FlightEvent::from_normalized(Value::Object(obj));

        // Tier (b): per-event-type required details
        for key in event.event_type.required_details() {
            let absent = match event.field(key) {
                None | Some(Value::Null) => true,
                Some(Value::String(s)) => s.trim().is_empty(),
                Some(_) => false,
            };
            if absent {
                missing_fields.push(format!("details.{key}"));
            }
        }

        let forced_incomplete = matches!(event.field("data_complete"), Some(Value::Bool(false)));
        let declared = self.resolve_declared(&event);
        let gap = forced_incomplete || !missing_fields.is_empty();

        NormalizedEvent {
            event,
            declared,
            gap,
            missing_fields,
            forced_incomplete,
        }
    }

    /// Placeholder for a line that is not a JSON object
    ///
    /// The digest is derived deterministically from the line number, so two
    /// runs over the same input produce identical placeholder events.
    fn synthesize_parse_gap(&self, file_line_no: usize) -> NormalizedEvent {
        let raw = json!({
            "v": FLIGHT_LOG_VERSION,
            "ts": "UNKNOWN",
            "trace_id": "UNKNOWN",
            "seq": file_line_no as i64,
            "actor": "parser",
            "event_type": "EVIDENCE_GAP",
            "payload_digest": sha256_hex(&format!("parse_error_line_{file_line_no}")),
            "domain_class": "EVIDENCE",
            "declared": false,
            "details": {"raw_line_no": file_line_no},
            "data_complete": false,
        });

        NormalizedEvent {
            event: FlightEvent::from_normalized(raw),
            declared: false,
            gap: true,
            missing_fields: Vec::new(),
            forced_incomplete: true,
        }
    }

    fn resolve_declared(&self, event: &FlightEvent) -> bool {
        // Explicit boolean wins; non-boolean values are ignored
        if let Some(Value::Bool(b)) = event.field("declared") {
            return *b;
        }
        if self.config.declared_intents.contains(event.event_type.as_str()) {
            return true;
        }
        false
    }
}
