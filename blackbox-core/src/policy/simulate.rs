//! Advisory policy simulation
//!
//! Maps accumulated risk highlights through a profile's switches into
//! violation strings. Strictly read-only over the highlight list; nothing
//! upstream is mutated and nothing is enforced.

use serde::{Deserialize, Serialize};

use crate::risk::RiskHighlight;

use super::PolicyProfile;

/// Result of simulating a policy profile over one run's highlights
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicySimulation {
    pub enabled: bool,
    pub profile: String,
    pub would_block: bool,
    pub violation_count: usize,
    pub violations: Vec<String>,
}

/// The policy simulator
pub struct PolicySimulator;

impl PolicySimulator {
    /// Simulate `profile` over the highlights, in highlight order
    pub fn simulate(
        highlights: &[RiskHighlight],
        profile: &PolicyProfile,
        profile_name: &str,
    ) -> PolicySimulation {
        let mut violations = Vec::new();

        for highlight in highlights {
            if profile.blocks(highlight.tag) {
                violations.push(format!(
                    "seq {}: {} blocked by {} (evidence={}...)",
                    highlight.seq,
                    highlight.tag,
                    PolicyProfile::switch_for(highlight.tag),
                    evidence_prefix(&highlight.evidence),
                ));
            }
        }

        PolicySimulation {
            enabled: true,
            profile: profile_name.to_string(),
            would_block: !violations.is_empty(),
            violation_count: violations.len(),
            violations,
        }
    }
}

/// First 16 chars of an evidence digest, shorter evidence verbatim
fn evidence_prefix(evidence: &str) -> &str {
    let end = evidence
        .char_indices()
        .nth(16)
        .map(|(i, _)| i)
        .unwrap_or(evidence.len());
    &evidence[..end]
}
