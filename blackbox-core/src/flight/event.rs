//! Flight event types

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

/// Event types defined in flight-log/1
///
/// The enumeration is closed; anything else is carried verbatim in
/// [`EventType::Unknown`] so that no input shape is silently dropped.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EventType {
    NetIo,
    FileIo,
    ProcExec,
    DepInstall,
    DatabaseOp,
    ApiCall,
    MemoryAccess,
    /// Synthesized or exporter-declared instrumentation defect
    EvidenceGap,
    /// Catch-all for event types outside the closed set
    Unknown(String),
}

impl EventType {
    /// Parse a raw event-type string; never fails
    pub fn from_raw(s: &str) -> Self {
        match s {
            "NET_IO" => EventType::NetIo,
            "FILE_IO" => EventType::FileIo,
            "PROC_EXEC" => EventType::ProcExec,
            "DEP_INSTALL" => EventType::DepInstall,
            "DATABASE_OP" => EventType::DatabaseOp,
            "API_CALL" => EventType::ApiCall,
            "MEMORY_ACCESS" => EventType::MemoryAccess,
            "EVIDENCE_GAP" => EventType::EvidenceGap,
            other => EventType::Unknown(other.to_string()),
        }
    }

    /// Get the string representation
    pub fn as_str(&self) -> &str {
        match self {
            EventType::NetIo => "NET_IO",
            EventType::FileIo => "FILE_IO",
            EventType::ProcExec => "PROC_EXEC",
            EventType::DepInstall => "DEP_INSTALL",
            EventType::DatabaseOp => "DATABASE_OP",
            EventType::ApiCall => "API_CALL",
            EventType::MemoryAccess => "MEMORY_ACCESS",
            EventType::EvidenceGap => "EVIDENCE_GAP",
            EventType::Unknown(s) => s.as_str(),
        }
    }

    /// Whether this type belongs to the closed known set
    pub fn is_known(&self) -> bool {
        !matches!(self, EventType::Unknown(_))
    }

    /// Required details-map keys for this event type
    ///
    /// Any key missing or empty marks the event as an evidence gap.
    pub fn required_details(&self) -> &'static [&'static str] {
        match self {
            EventType::NetIo => &["host", "port", "direction"],
            EventType::FileIo => &["path", "op"],
            EventType::ProcExec => &["cmd_digest"],
            EventType::DepInstall => &["package", "version"],
            EventType::DatabaseOp => &["db_type", "query"],
            EventType::ApiCall => &["endpoint"],
            EventType::MemoryAccess => &["size"],
            _ => &[],
        }
    }
}

impl std::fmt::Display for EventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl Serialize for EventType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for EventType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(EventType::from_raw(&s))
    }
}

/// A single flight-log event in canonical form
///
/// Typed top-level fields are extracted from the raw record for dispatch;
/// the full normalized record is retained for canonical hashing. Detail
/// lookup is details-first: the `details` map always wins, top-level fields
/// of the same name are fallbacks.
#[derive(Debug, Clone)]
pub struct FlightEvent {
    /// Schema version tag (e.g. "flight-log/1")
    pub version: String,

    /// Event timestamp as recorded by the exporter
    pub ts: String,

    /// Trace ID grouping the run's events
    pub trace_id: String,

    /// Monotonically-expected sequence number
    pub seq: i64,

    /// Acting component that emitted the event
    pub actor: String,

    /// Event type discriminant
    pub event_type: EventType,

    /// Content digest of the event payload
    pub payload_digest: String,

    /// Coarse domain classification from the exporter
    pub domain_class: String,

    /// Type-specific fields (host/port, path/op, cmd, ...)
    pub details: Map<String, Value>,

    /// Full normalized record; this is what gets canonically hashed
    raw: Value,
}

/// Lossy string view of a JSON value: null is empty, scalars are rendered,
/// containers are empty (they are never meaningful as field strings)
pub(crate) fn value_str(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Array(_) | Value::Object(_) => String::new(),
    }
}

impl FlightEvent {
    /// Build a flight event from a normalized raw record
    ///
    /// The record must already be an object with an integer `seq` and an
    /// object `details`; the normalizer guarantees this.
    pub(crate) fn from_normalized(raw: Value) -> Self {
        let obj = raw.as_object().cloned().unwrap_or_default();
        let top = |key: &str| obj.get(key).map(value_str).unwrap_or_default();

        let details = obj
            .get("details")
            .and_then(Value::as_object)
            .cloned()
            .unwrap_or_default();

        Self {
            version: top("v"),
            ts: top("ts"),
            trace_id: top("trace_id"),
            seq: obj.get("seq").and_then(Value::as_i64).unwrap_or(-1),
            actor: top("actor"),
            event_type: EventType::from_raw(&top("event_type")),
            payload_digest: top("payload_digest"),
            domain_class: top("domain_class"),
            details,
            raw,
        }
    }

    /// The normalized record this event was built from
    pub fn raw_value(&self) -> &Value {
        &self.raw
    }

    /// Look up a field, details map first, then the top level
    pub fn field(&self, key: &str) -> Option<&Value> {
        if let Some(v) = self.details.get(key) {
            return Some(v);
        }
        self.raw.as_object().and_then(|o| o.get(key))
    }

    /// String view of a field; absent fields are empty
    pub fn field_str(&self, key: &str) -> String {
        self.field(key).map(value_str).unwrap_or_default()
    }

    /// Numeric view of a field; non-numeric values are 0
    pub fn field_u64(&self, key: &str) -> u64 {
        match self.field(key) {
            Some(Value::Number(n)) => n
                .as_u64()
                .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64))
                .unwrap_or(0),
            Some(Value::String(s)) => s.trim().parse().unwrap_or(0),
            _ => 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_event_type_round_trip() {
        assert_eq!(EventType::from_raw("NET_IO"), EventType::NetIo);
        assert_eq!(EventType::NetIo.as_str(), "NET_IO");
        assert_eq!(
            EventType::from_raw("TELEPORT"),
            EventType::Unknown("TELEPORT".to_string())
        );
        assert!(!EventType::from_raw("TELEPORT").is_known());
        assert!(EventType::from_raw("EVIDENCE_GAP").is_known());
    }

    #[test]
    fn test_details_win_over_top_level() {
        let event = FlightEvent::from_normalized(json!({
            "event_type": "NET_IO",
            "seq": 1,
            "host": "top-level.example",
            "details": {"host": "details.example"}
        }));

        assert_eq!(event.field_str("host"), "details.example");
    }

    #[test]
    fn test_top_level_fallback() {
        let event = FlightEvent::from_normalized(json!({
            "event_type": "FILE_IO",
            "seq": 2,
            "path": "/tmp/x",
            "details": {}
        }));

        assert_eq!(event.field_str("path"), "/tmp/x");
        assert_eq!(event.field_str("absent"), "");
    }

    #[test]
    fn test_field_u64_coercion() {
        let event = FlightEvent::from_normalized(json!({
            "event_type": "MEMORY_ACCESS",
            "seq": 3,
            "details": {"size": "2048"}
        }));
        assert_eq!(event.field_u64("size"), 2048);

        let event = FlightEvent::from_normalized(json!({
            "event_type": "MEMORY_ACCESS",
            "seq": 4,
            "details": {"size": "lots"}
        }));
        assert_eq!(event.field_u64("size"), 0);
    }

    #[test]
    fn test_required_details_table() {
        assert_eq!(EventType::NetIo.required_details(), &["host", "port", "direction"]);
        assert_eq!(EventType::ProcExec.required_details(), &["cmd_digest"]);
        assert!(EventType::Unknown("X".into()).required_details().is_empty());
    }
}
