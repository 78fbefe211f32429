//! # Blackbox Core - Flight-Log Analysis & Integrity Receipts
//!
//! Blackbox turns an agent run's flight log (JSONL telemetry events) into:
//!
//! - **Badge**: a behavior summary with risk highlights and an overall status
//! - **Receipts**: a SHA-256 hash chain binding every event to its predecessor
//! - **Policy simulation**: what a named profile *would* have blocked (advisory
//!   only, nothing is enforced)
//! - **Suggestions**: remediation advice derived from the highlights
//!
//! ## Core Principle
//!
//! > Every line of input yields exactly one event and one receipt.
//!
//! Malformed lines, unknown event types, and missing fields are surfaced as
//! evidence gaps and highlights, never silently dropped and never fatal.
//!
//! ## Example
//!
//! ```rust
//! use blackbox_core::{ChainVerifier, FlightRecorder, RecorderConfig};
//!
//! let config = RecorderConfig::default();
//! let log = r#"{"v":"flight-log/1","ts":"2026-01-01T00:00:00Z","trace_id":"t-1","seq":1,"actor":"agent","event_type":"FILE_IO","payload_digest":"0000000000000000000000000000000000000000000000000000000000000000","domain_class":"FS","details":{"path":"/tmp/a","op":"read"}}"#;
//!
//! let artifacts = FlightRecorder::new(&config).analyze_lines(log.lines());
//! assert_eq!(artifacts.receipts.len(), 1);
//!
//! let verification = ChainVerifier::verify_receipts(&artifacts.receipts);
//! assert!(verification.is_valid);
//! ```

pub mod advice;
pub mod config;
pub mod error;
pub mod flight;
pub mod output;
pub mod policy;
pub mod receipt;
pub mod recorder;
pub mod report;
pub mod risk;

pub use advice::{build_probe_plan_md, generate_suggestions, Suggestion, SuggestionPack};
pub use config::RecorderConfig;
pub use error::{RecorderError, Result};
pub use flight::{EventNormalizer, EventType, FlightEvent, NormalizedEvent, FLIGHT_LOG_VERSION};
pub use output::OutputWriter;
pub use policy::{resolve_profile, PolicyProfile, PolicySimulation, PolicySimulator};
pub use receipt::{
    canonical_json, sha256_hex, ChainErrorType, ChainVerification, ChainVerifier, Receipt,
    ReceiptChainBuilder, GENESIS_HASH,
};
pub use recorder::{FlightRecorder, RunArtifacts};
pub use report::{Badge, BadgeStats, BadgeStatus, ReportAssembler};
pub use risk::{RiskHighlight, RiskRuleEngine, RiskTag};
