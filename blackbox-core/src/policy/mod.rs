//! Policy profiles — advisory enforcement switches
//!
//! A profile is a named bundle of boolean switches. Profiles are only ever
//! used for simulation: the recorder reports what a profile *would* have
//! blocked and never enforces anything.
//!
//! Resolution precedence: explicit CLI override > config-selected profile
//! name > built-in "advisory". Individual rule overrides from the config
//! replace only the named switches, never the whole profile.

mod simulate;

pub use simulate::{PolicySimulation, PolicySimulator};

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::config::RecorderConfig;
use crate::risk::RiskTag;

/// A named bundle of boolean enforcement switches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyProfile {
    pub block_unpinned_deps: bool,
    pub block_undeclared_actions: bool,
    pub block_remote_script: bool,
    pub block_sensitive_paths: bool,
    pub block_sql_risks: bool,
    pub block_api_exposure: bool,
    pub block_high_memory: bool,
    pub block_on_gaps: bool,
    pub block_on_unknown: bool,
}

impl PolicyProfile {
    /// The built-in default profile
    ///
    /// Blocks behavioral risks; tolerates instrumentation defects (gaps,
    /// unknown types) since those are data-quality problems, not actions.
    pub fn advisory() -> Self {
        Self {
            block_unpinned_deps: true,
            block_undeclared_actions: true,
            block_remote_script: true,
            block_sensitive_paths: true,
            block_sql_risks: true,
            block_api_exposure: true,
            block_high_memory: true,
            block_on_gaps: false,
            block_on_unknown: false,
        }
    }

    /// Every switch on
    pub fn strict() -> Self {
        Self {
            block_on_gaps: true,
            block_on_unknown: true,
            ..Self::advisory()
        }
    }

    /// Look up a built-in profile by name
    pub fn builtin(name: &str) -> Option<Self> {
        match name {
            "advisory" => Some(Self::advisory()),
            "strict" => Some(Self::strict()),
            _ => None,
        }
    }

    /// The switch governing a risk tag
    pub fn switch_for(tag: RiskTag) -> &'static str {
        match tag {
            RiskTag::UnpinnedDep | RiskTag::UndeclaredDepInstall => "block_unpinned_deps",
            RiskTag::UndeclaredExec
            | RiskTag::UndeclaredFileMutation
            | RiskTag::UndeclaredNetIo => "block_undeclared_actions",
            RiskTag::RemoteScript => "block_remote_script",
            RiskTag::SensitivePath => "block_sensitive_paths",
            RiskTag::SqlRisk => "block_sql_risks",
            RiskTag::ApiCredentialExposure => "block_api_exposure",
            RiskTag::HighMemoryAccess => "block_high_memory",
            RiskTag::EvidenceGap => "block_on_gaps",
            RiskTag::UnknownEventType => "block_on_unknown",
        }
    }

    /// Whether this profile blocks a risk tag
    pub fn blocks(&self, tag: RiskTag) -> bool {
        match Self::switch_for(tag) {
            "block_unpinned_deps" => self.block_unpinned_deps,
            "block_undeclared_actions" => self.block_undeclared_actions,
            "block_remote_script" => self.block_remote_script,
            "block_sensitive_paths" => self.block_sensitive_paths,
            "block_sql_risks" => self.block_sql_risks,
            "block_api_exposure" => self.block_api_exposure,
            "block_high_memory" => self.block_high_memory,
            "block_on_gaps" => self.block_on_gaps,
            "block_on_unknown" => self.block_on_unknown,
            _ => false,
        }
    }

    /// Apply per-switch overrides; unnamed switches are untouched
    pub fn apply_overrides(&mut self, overrides: &BTreeMap<String, bool>) {
        for (name, enabled) in overrides {
            match name.as_str() {
                "block_unpinned_deps" => self.block_unpinned_deps = *enabled,
                "block_undeclared_actions" => self.block_undeclared_actions = *enabled,
                "block_remote_script" => self.block_remote_script = *enabled,
                "block_sensitive_paths" => self.block_sensitive_paths = *enabled,
                "block_sql_risks" => self.block_sql_risks = *enabled,
                "block_api_exposure" => self.block_api_exposure = *enabled,
                "block_high_memory" => self.block_high_memory = *enabled,
                "block_on_gaps" => self.block_on_gaps = *enabled,
                "block_on_unknown" => self.block_on_unknown = *enabled,
                other => tracing::warn!(switch = other, "ignoring unknown policy switch"),
            }
        }
    }
}

impl Default for PolicyProfile {
    fn default() -> Self {
        Self::advisory()
    }
}

/// Resolve the effective profile for a run
///
/// `cli_override` wins over the config's selected name, which wins over the
/// built-in "advisory". The name resolves through the config's named
/// profile definitions first, then the built-ins; an unknown name falls
/// back to advisory defaults before overrides. Config-level rule overrides
/// are applied last.
pub fn resolve_profile(cli_override: Option<&str>, config: &RecorderConfig) -> (String, PolicyProfile) {
    let name = cli_override
        .map(str::to_string)
        .or_else(|| config.profile.clone())
        .unwrap_or_else(|| "advisory".to_string());

    let mut profile = PolicyProfile::builtin(&name).unwrap_or_default();
    if let Some(partial) = config.profiles.get(&name) {
        profile.apply_overrides(partial);
    }
    profile.apply_overrides(&config.rule_overrides);

    (name, profile)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_advisory_defaults() {
        let p = PolicyProfile::advisory();
        assert!(p.block_remote_script);
        assert!(p.block_sensitive_paths);
        assert!(!p.block_on_gaps);
        assert!(!p.block_on_unknown);
    }

    #[test]
    fn test_strict_blocks_everything() {
        let p = PolicyProfile::strict();
        for tag in RiskTag::all() {
            assert!(p.blocks(*tag), "strict should block {tag}");
        }
    }

    #[test]
    fn test_every_tag_has_a_switch() {
        let p = PolicyProfile::advisory();
        for tag in RiskTag::all() {
            // blocks() must route every tag through a real switch
            let _ = p.blocks(*tag);
            assert!(PolicyProfile::switch_for(*tag).starts_with("block_"));
        }
    }

    #[test]
    fn test_overrides_replace_only_named_switches() {
        let mut p = PolicyProfile::advisory();
        let mut overrides = BTreeMap::new();
        overrides.insert("block_sensitive_paths".to_string(), false);
        overrides.insert("block_on_gaps".to_string(), true);
        p.apply_overrides(&overrides);

        assert!(!p.block_sensitive_paths);
        assert!(p.block_on_gaps);
        // Everything else untouched
        assert!(p.block_remote_script);
        assert!(p.block_sql_risks);
    }

    #[test]
    fn test_resolution_precedence() {
        let mut config = RecorderConfig::default();
        config.profile = Some("strict".to_string());

        // Config name applies without an override
        let (name, profile) = resolve_profile(None, &config);
        assert_eq!(name, "strict");
        assert!(profile.block_on_gaps);

        // CLI override wins
        let (name, profile) = resolve_profile(Some("advisory"), &config);
        assert_eq!(name, "advisory");
        assert!(!profile.block_on_gaps);

        // Unknown name falls back to advisory defaults
        let (name, profile) = resolve_profile(Some("mystery"), &config);
        assert_eq!(name, "mystery");
        assert_eq!(profile, PolicyProfile::advisory());
    }

    #[test]
    fn test_config_defined_profile_and_rule_overrides() {
        let mut config = RecorderConfig::default();
        let mut partial = BTreeMap::new();
        partial.insert("block_high_memory".to_string(), false);
        config.profiles.insert("lenient".to_string(), partial);
        config
            .rule_overrides
            .insert("block_sql_risks".to_string(), false);

        let (_, profile) = resolve_profile(Some("lenient"), &config);
        assert!(!profile.block_high_memory);
        assert!(!profile.block_sql_risks);
        assert!(profile.block_remote_script);
    }
}
