//! Risk tags and highlights

use serde::{Deserialize, Serialize};

/// Closed set of risk tags producible by the rule table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RiskTag {
    #[serde(rename = "UNPINNED_DEP")]
    UnpinnedDep,
    #[serde(rename = "UNDECLARED_DEP_INSTALL")]
    UndeclaredDepInstall,
    #[serde(rename = "REMOTE_SCRIPT")]
    RemoteScript,
    #[serde(rename = "UNDECLARED_EXEC")]
    UndeclaredExec,
    #[serde(rename = "SENSITIVE_PATH")]
    SensitivePath,
    #[serde(rename = "UNDECLARED_FILE_MUTATION")]
    UndeclaredFileMutation,
    #[serde(rename = "UNDECLARED_NET_IO")]
    UndeclaredNetIo,
    #[serde(rename = "SQL_RISK")]
    SqlRisk,
    #[serde(rename = "API_CREDENTIAL_EXPOSURE")]
    ApiCredentialExposure,
    #[serde(rename = "HIGH_MEMORY_ACCESS")]
    HighMemoryAccess,
    #[serde(rename = "UNKNOWN_EVENT_TYPE")]
    UnknownEventType,
    #[serde(rename = "EVIDENCE_GAP")]
    EvidenceGap,
}

impl RiskTag {
    /// Get the string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskTag::UnpinnedDep => "UNPINNED_DEP",
            RiskTag::UndeclaredDepInstall => "UNDECLARED_DEP_INSTALL",
            RiskTag::RemoteScript => "REMOTE_SCRIPT",
            RiskTag::UndeclaredExec => "UNDECLARED_EXEC",
            RiskTag::SensitivePath => "SENSITIVE_PATH",
            RiskTag::UndeclaredFileMutation => "UNDECLARED_FILE_MUTATION",
            RiskTag::UndeclaredNetIo => "UNDECLARED_NET_IO",
            RiskTag::SqlRisk => "SQL_RISK",
            RiskTag::ApiCredentialExposure => "API_CREDENTIAL_EXPOSURE",
            RiskTag::HighMemoryAccess => "HIGH_MEMORY_ACCESS",
            RiskTag::UnknownEventType => "UNKNOWN_EVENT_TYPE",
            RiskTag::EvidenceGap => "EVIDENCE_GAP",
        }
    }

    /// All tags, in stable rule-table order
    pub fn all() -> &'static [RiskTag] {
        &[
            RiskTag::UnpinnedDep,
            RiskTag::UndeclaredDepInstall,
            RiskTag::RemoteScript,
            RiskTag::UndeclaredExec,
            RiskTag::SensitivePath,
            RiskTag::UndeclaredFileMutation,
            RiskTag::UndeclaredNetIo,
            RiskTag::SqlRisk,
            RiskTag::ApiCredentialExposure,
            RiskTag::HighMemoryAccess,
            RiskTag::UnknownEventType,
            RiskTag::EvidenceGap,
        ]
    }
}

impl std::fmt::Display for RiskTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One flagged risk, referencing its event by seq and content digest
///
/// The evidence field is the SHA-256 of the canonical event, never raw
/// (possibly sensitive) data.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RiskHighlight {
    pub tag: RiskTag,
    pub seq: i64,
    pub evidence: String,

    /// Tag-specific context (matched prefix, header key, missing fields)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl RiskHighlight {
    pub fn new(tag: RiskTag, seq: i64, evidence: String) -> Self {
        Self {
            tag,
            seq,
            evidence,
            detail: None,
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_serialization_matches_wire_names() {
        let json = serde_json::to_string(&RiskTag::UnpinnedDep).unwrap();
        assert_eq!(json, "\"UNPINNED_DEP\"");

        let parsed: RiskTag = serde_json::from_str("\"SQL_RISK\"").unwrap();
        assert_eq!(parsed, RiskTag::SqlRisk);
    }

    #[test]
    fn test_all_tags_have_distinct_names() {
        let names: std::collections::HashSet<_> =
            RiskTag::all().iter().map(|t| t.as_str()).collect();
        assert_eq!(names.len(), RiskTag::all().len());
    }

    #[test]
    fn test_highlight_detail_skipped_when_none() {
        let h = RiskHighlight::new(RiskTag::SqlRisk, 3, "e".repeat(64));
        let json = serde_json::to_string(&h).unwrap();
        assert!(!json.contains("detail"));

        let h = h.with_detail("query contains drop");
        let json = serde_json::to_string(&h).unwrap();
        assert!(json.contains("query contains drop"));
    }
}
