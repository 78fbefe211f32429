//! The badge — the summary report produced for one analysis run

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::policy::PolicySimulation;
use crate::risk::RiskHighlight;

/// Overall status label for one run
///
/// Derived in priority order: zero highlights is OBSERVED; highlights plus
/// at least one evidence gap is ATTENTION_WITH_GAPS; highlights without
/// gaps is ATTENTION. (An evidence gap always produces a highlight, so a
/// gap-only run still reports ATTENTION_WITH_GAPS.)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BadgeStatus {
    #[serde(rename = "OBSERVED")]
    Observed,
    #[serde(rename = "ATTENTION")]
    Attention,
    #[serde(rename = "ATTENTION_WITH_GAPS")]
    AttentionWithGaps,
}

impl BadgeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BadgeStatus::Observed => "OBSERVED",
            BadgeStatus::Attention => "ATTENTION",
            BadgeStatus::AttentionWithGaps => "ATTENTION_WITH_GAPS",
        }
    }

    /// Derive the status from highlight and gap counts
    pub fn derive(highlight_count: usize, gap_count: usize) -> Self {
        if highlight_count == 0 {
            BadgeStatus::Observed
        } else if gap_count > 0 {
            BadgeStatus::AttentionWithGaps
        } else {
            BadgeStatus::Attention
        }
    }
}

impl std::fmt::Display for BadgeStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Aggregate counters, always populated regardless of status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BadgeStats {
    pub total_events: usize,
    pub highlight_count: usize,
    pub evidence_gaps: usize,
}

/// The badge report for one analysis run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Badge {
    pub status: BadgeStatus,

    /// Category name -> sorted fact strings, materialized lazily per
    /// observed event type
    pub behavior_summary: BTreeMap<String, Vec<String>>,

    /// Highlights in input order (type rules, unknown-type, gap per event)
    pub risk_highlights: Vec<RiskHighlight>,

    pub stats: BadgeStats,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub policy_simulation: Option<PolicySimulation>,
}
