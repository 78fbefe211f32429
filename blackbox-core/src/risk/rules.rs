//! The risk rule dispatch table
//!
//! One rule function per event type, plus the two default arms (unknown
//! type, evidence gap) that no event can bypass. Rules read the normalized
//! event and the immutable run configuration only; nothing here mutates
//! state or performs I/O.

use std::sync::OnceLock;

use regex::Regex;

use crate::config::RecorderConfig;
use crate::flight::{EventType, FlightEvent, NormalizedEvent};
use crate::receipt::{canonical_json, sha256_hex};

use super::tags::{RiskHighlight, RiskTag};

/// Remote one-liner execution: curl/wget piped into a shell
fn remote_script_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)(curl|wget).*\|.*(sh|bash|zsh)").expect("remote script pattern is valid")
    })
}

/// Header keys that must never carry live credentials
fn is_credential_header(key: &str) -> bool {
    let k = key.to_lowercase();
    k == "api_key" || k == "api-key" || k == "x-api-key" || k == "x_api_key" || k.starts_with("authorization")
}

/// Redaction markers accepted as safe header values
fn is_redacted(value: &str) -> bool {
    matches!(
        value.trim().to_uppercase().as_str(),
        "" | "REDACTED" | "MASKED" | "<REDACTED>" | "***"
    )
}

/// Version strings that do not pin a dependency
fn is_unpinned_version(version: &str) -> bool {
    let v = version.trim().to_lowercase();
    v.is_empty() || v == "latest" || v.contains('*')
}

/// Command digest: explicit field, else digest of the raw command, else "unknown"
pub(crate) fn command_digest(event: &FlightEvent) -> String {
    let explicit = event.field_str("cmd_digest");
    if !explicit.is_empty() {
        return explicit;
    }
    let cmd = event.field_str("cmd");
    if cmd.is_empty() {
        "unknown".to_string()
    } else {
        sha256_hex(&cmd)
    }
}

/// The risk rule engine
///
/// Pure, total function of (normalized event, config) -> ordered tags.
pub struct RiskRuleEngine<'a> {
    config: &'a RecorderConfig,
}

impl<'a> RiskRuleEngine<'a> {
    pub fn new(config: &'a RecorderConfig) -> Self {
        Self { config }
    }

    /// Evaluate the full rule table for one event
    pub fn evaluate(&self, normalized: &NormalizedEvent) -> Vec<RiskHighlight> {
        let event = &normalized.event;
        let seq = event.seq;
        let evidence = sha256_hex(&canonical_json(event.raw_value()));
        let declared = normalized.declared;

        let mut highlights = Vec::new();
        let mut push = |tag: RiskTag, detail: Option<String>| {
            let mut h = RiskHighlight::new(tag, seq, evidence.clone());
            h.detail = detail;
            highlights.push(h);
        };

        match &event.event_type {
            EventType::DepInstall => {
                let package = event.field_str("package");
                let version = event.field_str("version");
                let dep_name = event.field_str("dep_name");

                let at_latest = package.to_lowercase().ends_with("@latest")
                    || dep_name.to_lowercase().ends_with("@latest");
                if is_unpinned_version(&version) || at_latest {
                    push(RiskTag::UnpinnedDep, Some(format!("{package}@{version}")));
                }
                if !declared {
                    push(RiskTag::UndeclaredDepInstall, None);
                }
            }

            EventType::ProcExec => {
                let cmd = event.field_str("cmd");
                if !cmd.is_empty() && remote_script_re().is_match(&cmd) {
                    push(RiskTag::RemoteScript, Some(command_digest(event)));
                }
                if !declared {
                    push(RiskTag::UndeclaredExec, Some(command_digest(event)));
                }
            }

            EventType::FileIo => {
                let path = event.field_str("path");
                if let Some(prefix) = self
                    .config
                    .sensitive_paths
                    .iter()
                    .find(|p| !path.is_empty() && path.starts_with(p.as_str()))
                {
                    push(RiskTag::SensitivePath, Some(prefix.clone()));
                }

                let op = event.field_str("op").to_lowercase();
                let mode = event.field_str("mode").to_lowercase();
                let is_mutation =
                    op == "write" || op == "delete" || mode == "w" || mode == "a" || mode == "x";
                if is_mutation && !declared {
                    push(RiskTag::UndeclaredFileMutation, None);
                }
            }

            EventType::NetIo => {
                let direction = event.field_str("direction").to_uppercase();
                if direction == "OUT" && !declared {
                    push(RiskTag::UndeclaredNetIo, None);
                }
            }

            EventType::DatabaseOp => {
                let query = event.field_str("query").to_lowercase();
                if query.contains("drop") || (query.contains("delete") && !query.contains("where"))
                {
                    push(RiskTag::SqlRisk, None);
                }
            }

            EventType::ApiCall => {
                let exposed = event
                    .field("headers")
                    .and_then(|v| v.as_object())
                    .and_then(|headers| {
                        headers.iter().find(|(k, v)| {
                            is_credential_header(k)
                                && !is_redacted(&crate::flight::value_str(v))
                        })
                    })
                    .map(|(k, _)| k.clone());
                if let Some(header) = exposed {
                    push(RiskTag::ApiCredentialExposure, Some(header));
                }
            }

            EventType::MemoryAccess => {
                let size = event.field_u64("size");
                if size > self.config.memory_threshold {
                    push(RiskTag::HighMemoryAccess, Some(size.to_string()));
                }
            }

            EventType::EvidenceGap | EventType::Unknown(_) => {}
        }

        // Default arms: no event type escapes these
        if !event.event_type.is_known() {
            push(
                RiskTag::UnknownEventType,
                Some(event.event_type.as_str().to_string()),
            );
        }

        if normalized.gap {
            let detail = if normalized.missing_fields.is_empty() {
                "data_complete=false".to_string()
            } else {
                format!("missing: {}", normalized.missing_fields.join(", "))
            };
            push(RiskTag::EvidenceGap, Some(detail));
        }

        highlights
    }
}
