//! Advisory remediation suggestions
//!
//! Facts-to-template only: a fixed catalog keyed by risk tag, rendered into
//! a suggestion pack and a human-friendly probe plan. No auto-fix, no
//! command execution, and nothing here feeds back into the analysis.

use std::collections::BTreeMap;

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::report::Badge;
use crate::risk::{RiskHighlight, RiskTag};

/// One advisory suggestion, derived from a single risk tag
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Suggestion {
    pub tag: String,
    pub priority: String,
    pub title: String,

    /// Concrete fix directions
    #[serde(rename = "do")]
    pub steps: Vec<String>,

    /// How to confirm the fix worked
    pub verify: Vec<String>,

    /// Unique evidence digests backing this suggestion
    pub evidence: Vec<String>,

    /// Number of highlights carrying this tag
    pub count: usize,
}

/// Summary header repeated from the badge
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuggestionSummary {
    pub status: String,
    pub total_events: usize,
    pub highlight_count: usize,
    pub evidence_gaps: usize,
    pub tags: Vec<String>,
}

/// The full advisory output for one run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuggestionPack {
    pub generated_at: String,
    pub input_hint: String,
    pub summary: SuggestionSummary,
    pub suggestions: Vec<Suggestion>,
}

struct CatalogEntry {
    priority: &'static str,
    title: &'static str,
    steps: &'static [&'static str],
    verify: &'static [&'static str],
}

/// Fixed suggestion catalog; advisory wording only, no exploit steps
fn catalog_entry(tag: RiskTag) -> CatalogEntry {
    match tag {
        RiskTag::UnpinnedDep => CatalogEntry {
            priority: "HIGH",
            title: "Pin dependencies and lock supply-chain inputs",
            steps: &[
                "Pin dependency versions (avoid latest/*).",
                "Use lockfiles and record provenance digests where possible.",
                "Review third-party packages as local executable code before enabling.",
            ],
            verify: &[
                "Re-run the recorder: UNPINNED_DEP should disappear.",
                "The receipt chain should remain continuous with no new evidence gaps.",
            ],
        },
        RiskTag::UndeclaredDepInstall => CatalogEntry {
            priority: "HIGH",
            title: "Require explicit declaration for installs and updates",
            steps: &[
                "Declare install/update intent in the run configuration.",
                "Run installs in an isolated environment when possible.",
            ],
            verify: &["Re-run the recorder: UNDECLARED_DEP_INSTALL should disappear or become declared."],
        },
        RiskTag::RemoteScript => CatalogEntry {
            priority: "CRITICAL",
            title: "Stop remote script execution patterns (curl|bash / wget|sh)",
            steps: &[
                "Do not execute one-liners that fetch remote scripts.",
                "Prefer documented packages with checksums and pinned versions.",
                "Inspect fetched sources before execution.",
            ],
            verify: &[
                "Re-run the recorder: REMOTE_SCRIPT should disappear.",
                "No PROC_EXEC should occur unless explicitly declared and reviewed.",
            ],
        },
        RiskTag::UndeclaredExec => CatalogEntry {
            priority: "CRITICAL",
            title: "Make process execution explicit",
            steps: &[
                "Declare and document any exec behavior; keep it off by default.",
                "Separate exec-capable hosts from device-local components where applicable.",
            ],
            verify: &["Re-run the recorder: UNDECLARED_EXEC should disappear (declared or no exec)."],
        },
        RiskTag::UndeclaredNetIo => CatalogEntry {
            priority: "HIGH",
            title: "Control outbound network calls via allowlists",
            steps: &[
                "Declare outbound network usage for the agent.",
                "Route egress through an allowlist or proxy policy in production.",
            ],
            verify: &["Re-run the recorder: UNDECLARED_NET_IO should disappear or be declared."],
        },
        RiskTag::UndeclaredFileMutation => CatalogEntry {
            priority: "HIGH",
            title: "Restrict file writes to a safe workspace",
            steps: &[
                "Restrict writes to a dedicated workspace directory.",
                "Avoid touching system paths; treat them as high-risk.",
            ],
            verify: &["Re-run the recorder: UNDECLARED_FILE_MUTATION should disappear."],
        },
        RiskTag::SensitivePath => CatalogEntry {
            priority: "CRITICAL",
            title: "Prevent sensitive and system path access",
            steps: &[
                "Block access to system paths (e.g. /etc, log directories, key stores).",
                "Sandbox untrusted components.",
            ],
            verify: &["Re-run the recorder: SENSITIVE_PATH should disappear."],
        },
        RiskTag::SqlRisk => CatalogEntry {
            priority: "HIGH",
            title: "Guard destructive SQL statements",
            steps: &[
                "Require WHERE clauses on DELETE; forbid DROP outside migrations.",
                "Use parameterized queries and least-privilege database roles.",
            ],
            verify: &["Re-run the recorder: SQL_RISK should disappear."],
        },
        RiskTag::ApiCredentialExposure => CatalogEntry {
            priority: "CRITICAL",
            title: "Keep live credentials out of recorded headers",
            steps: &[
                "Redact credential headers at the exporter (REDACTED/MASKED).",
                "Rotate any credential that appeared unredacted in a log.",
            ],
            verify: &["Re-run the recorder: API_CREDENTIAL_EXPOSURE should disappear."],
        },
        RiskTag::HighMemoryAccess => CatalogEntry {
            priority: "MEDIUM",
            title: "Bound large memory accesses",
            steps: &[
                "Set an explicit memory budget for the workload.",
                "Stream or chunk large payloads instead of loading them whole.",
            ],
            verify: &["Re-run the recorder: HIGH_MEMORY_ACCESS should disappear under the configured threshold."],
        },
        RiskTag::UnknownEventType => CatalogEntry {
            priority: "MEDIUM",
            title: "Align exporter event types with the recorder schema",
            steps: &[
                "Map custom exporter events onto the known event-type set.",
                "Upgrade the recorder if the exporter schema is newer.",
            ],
            verify: &["Re-run the recorder: UNKNOWN_EVENT_TYPE should be 0."],
        },
        RiskTag::EvidenceGap => CatalogEntry {
            priority: "MEDIUM",
            title: "Fix evidence gaps (missing exporter fields or parse errors)",
            steps: &[
                "Ensure the exporter provides the required detail fields (host/path/op/...).",
                "Set data_complete=true only when fields are present.",
                "Avoid mixing incompatible schemas in a single log file.",
            ],
            verify: &["Re-run the recorder: evidence_gaps should be 0."],
        },
    }
}

/// Generate the suggestion pack for a badge
pub fn generate_suggestions(badge: &Badge, input_hint: &str) -> SuggestionPack {
    let mut by_tag: BTreeMap<&'static str, (RiskTag, Vec<&RiskHighlight>)> = BTreeMap::new();
    for highlight in &badge.risk_highlights {
        by_tag
            .entry(highlight.tag.as_str())
            .or_insert_with(|| (highlight.tag, Vec::new()))
            .1
            .push(highlight);
    }

    let mut suggestions: Vec<Suggestion> = by_tag
        .values()
        .map(|(tag, items)| {
            let entry = catalog_entry(*tag);
            let mut evidence: Vec<String> = Vec::new();
            for item in items {
                if !item.evidence.is_empty() && !evidence.contains(&item.evidence) {
                    evidence.push(item.evidence.clone());
                }
            }
            Suggestion {
                tag: tag.as_str().to_string(),
                priority: entry.priority.to_string(),
                title: entry.title.to_string(),
                steps: entry.steps.iter().map(|s| s.to_string()).collect(),
                verify: entry.verify.iter().map(|s| s.to_string()).collect(),
                evidence,
                count: items.len(),
            }
        })
        .collect();

    let supply_chain = [
        RiskTag::UnpinnedDep,
        RiskTag::UndeclaredDepInstall,
        RiskTag::RemoteScript,
    ];
    if supply_chain.iter().any(|t| by_tag.contains_key(t.as_str())) {
        suggestions.push(Suggestion {
            tag: "SUPPLY_CHAIN_META".to_string(),
            priority: "HIGH".to_string(),
            title: "Supply-chain hygiene checklist (advisory)".to_string(),
            steps: vec![
                "Avoid installing packages from untrusted registries without review.".to_string(),
                "Prefer verified sources and pinned versions; keep installation isolated.".to_string(),
                "Run the recorder before enabling new components, and share only digests.".to_string(),
            ],
            verify: vec!["After cleanup, re-run the recorder; high-risk tags should reduce.".to_string()],
            evidence: Vec::new(),
            count: 1,
        });
    }

    SuggestionPack {
        generated_at: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
        input_hint: input_hint.to_string(),
        summary: SuggestionSummary {
            status: badge.status.to_string(),
            total_events: badge.stats.total_events,
            highlight_count: badge.stats.highlight_count,
            evidence_gaps: badge.stats.evidence_gaps,
            tags: by_tag.keys().map(|k| k.to_string()).collect(),
        },
        suggestions,
    }
}

/// Render the pack as a markdown probe plan: fix direction plus how to verify
pub fn build_probe_plan_md(pack: &SuggestionPack) -> String {
    let mut lines: Vec<String> = Vec::new();
    lines.push("# Probe Plan (Advisory)".to_string());
    lines.push(String::new());
    lines.push(format!("- generated_at: {}", pack.generated_at));
    lines.push(format!("- input_hint: {}", pack.input_hint));
    lines.push(String::new());
    lines.push("## Goal".to_string());
    lines.push(
        "Turn risky behavior into verifiable evidence: reduce high-attention tags and eliminate evidence gaps."
            .to_string(),
    );
    lines.push(String::new());
    lines.push("## Steps".to_string());
    lines.push("1) Apply fixes manually (do NOT run untrusted one-liners).".to_string());
    lines.push("2) Re-run the recorder on the same workflow in the same environment.".to_string());
    lines.push("3) Compare badge.json before/after (highlight_count should drop; gaps should be 0).".to_string());
    lines.push("4) Keep receipts for traceability (share only digests publicly).".to_string());
    lines.push(String::new());
    lines.push("## Suggested Fix Directions".to_string());
    lines.push(String::new());

    for s in &pack.suggestions {
        lines.push(format!(
            "### [{}] {}  (tag={}, count={})",
            s.priority, s.title, s.tag, s.count
        ));
        for step in &s.steps {
            lines.push(format!("- DO: {step}"));
        }
        for v in &s.verify {
            lines.push(format!("- VERIFY: {v}"));
        }
        if !s.evidence.is_empty() {
            let digests: Vec<String> = s
                .evidence
                .iter()
                .map(|e| {
                    let prefix: String = e.chars().take(16).collect();
                    format!("{prefix}...")
                })
                .collect();
            lines.push(format!("- Evidence digests: {}", digests.join(", ")));
        }
        lines.push(String::new());
    }

    lines.join("\n")
}
