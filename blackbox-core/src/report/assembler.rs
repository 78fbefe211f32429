//! Behavior bucketing and badge assembly

use std::collections::{BTreeMap, BTreeSet};

use crate::flight::{EventType, NormalizedEvent};
use crate::policy::PolicySimulation;
use crate::risk::{command_digest, RiskHighlight};

use super::badge::{Badge, BadgeStats, BadgeStatus};

/// Accumulates behavior facts, highlights, and counters over one pass
///
/// Behavior buckets are materialized lazily: a category key exists in the
/// badge only if its event type was observed.
#[derive(Debug, Default)]
pub struct ReportAssembler {
    behavior: BTreeMap<String, BTreeSet<String>>,
    highlights: Vec<RiskHighlight>,
    total_events: usize,
    evidence_gaps: usize,
}

impl ReportAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one event's behavior facts and counters
    pub fn observe(&mut self, normalized: &NormalizedEvent) {
        self.total_events += 1;
        if normalized.gap {
            self.evidence_gaps += 1;
        }

        let event = &normalized.event;
        match &event.event_type {
            EventType::NetIo => {
                if event.field_str("direction").to_uppercase() == "OUT" {
                    let host = non_empty(event.field_str("host"), "unknown");
                    let port = event.field_str("port");
                    self.fact("network_out", format!("HOST:{host}:{port}"));
                }
            }
            EventType::FileIo => {
                let op = event.field_str("op").to_lowercase();
                if op == "write" || op == "delete" {
                    let path = non_empty(event.field_str("path"), "unknown");
                    self.fact("file_write", format!("PATH:{path}"));
                }
            }
            EventType::ProcExec => {
                let digest = command_digest(event);
                let prefix: String = digest.chars().take(16).collect();
                self.fact("proc_exec", format!("CMD_DIGEST:{prefix}..."));
            }
            EventType::DepInstall => {
                let package = event.field_str("package");
                let version = event.field_str("version");
                let label = if !package.is_empty() && !version.is_empty() {
                    format!("{package}@{version}")
                } else {
                    non_empty(event.field_str("dep_name"), "unknown_dep")
                };
                self.fact("dep_install", label);
            }
            EventType::DatabaseOp => {
                self.fact("database_op", "DATABASE_OP".to_string());
            }
            EventType::ApiCall => {
                let endpoint = non_empty(event.field_str("endpoint"), "unknown");
                self.fact("api_call", format!("ENDPOINT:{endpoint}"));
            }
            EventType::MemoryAccess => {
                self.fact("memory_access", format!("SIZE:{}", event.field_u64("size")));
            }
            EventType::EvidenceGap | EventType::Unknown(_) => {}
        }
    }

    /// Append one event's highlights, preserving input order
    pub fn record_highlights(&mut self, highlights: Vec<RiskHighlight>) {
        self.highlights.extend(highlights);
    }

    /// Highlights accumulated so far (read-only, for simulation)
    pub fn highlights(&self) -> &[RiskHighlight] {
        &self.highlights
    }

    /// Finish the pass and derive the badge
    pub fn finish(self, policy_simulation: Option<PolicySimulation>) -> Badge {
        let stats = BadgeStats {
            total_events: self.total_events,
            highlight_count: self.highlights.len(),
            evidence_gaps: self.evidence_gaps,
        };

        Badge {
            status: BadgeStatus::derive(stats.highlight_count, stats.evidence_gaps),
            behavior_summary: self
                .behavior
                .into_iter()
                .map(|(k, v)| (k, v.into_iter().collect()))
                .collect(),
            risk_highlights: self.highlights,
            stats,
            policy_simulation,
        }
    }

    fn fact(&mut self, category: &str, fact: String) {
        self.behavior.entry(category.to_string()).or_default().insert(fact);
    }
}

fn non_empty(value: String, fallback: &str) -> String {
    if value.is_empty() {
        fallback.to_string()
    } else {
        value
    }
}
