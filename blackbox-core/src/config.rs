//! Recorder configuration
//!
//! One immutable [`RecorderConfig`] value is constructed up front (built-in
//! defaults, optionally merged with a `policy.json` file and CLI fallbacks)
//! and passed explicitly through the whole pipeline. A config file that is
//! missing or fails to parse is never fatal: the defaults apply and a
//! warning is logged.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use serde::Deserialize;

/// Default sensitive path prefixes flagged on FILE_IO events
pub const DEFAULT_SENSITIVE_PATHS: &[&str] = &["/etc/", "/var/log/", "/home/user/.ssh/"];

/// Default MEMORY_ACCESS size threshold in bytes
pub const DEFAULT_MEMORY_THRESHOLD: u64 = 1_000_000_000;

/// Immutable configuration for one analysis run
#[derive(Debug, Clone)]
pub struct RecorderConfig {
    /// Path prefixes that trigger SENSITIVE_PATH on FILE_IO
    pub sensitive_paths: Vec<String>,

    /// MEMORY_ACCESS sizes above this trigger HIGH_MEMORY_ACCESS
    pub memory_threshold: u64,

    /// Event types treated as declared when the event carries no flag
    pub declared_intents: BTreeSet<String>,

    /// Profile name selected by the config file (CLI override wins)
    pub profile: Option<String>,

    /// Per-switch overrides applied on top of the resolved profile
    pub rule_overrides: BTreeMap<String, bool>,

    /// Named profile definitions (partial switch maps)
    pub profiles: BTreeMap<String, BTreeMap<String, bool>>,
}

impl Default for RecorderConfig {
    fn default() -> Self {
        Self {
            sensitive_paths: DEFAULT_SENSITIVE_PATHS.iter().map(|s| s.to_string()).collect(),
            memory_threshold: DEFAULT_MEMORY_THRESHOLD,
            declared_intents: BTreeSet::new(),
            profile: None,
            rule_overrides: BTreeMap::new(),
            profiles: BTreeMap::new(),
        }
    }
}

/// On-disk shape of `policy.json`; every field is optional
#[derive(Debug, Default, Deserialize)]
struct PolicyFile {
    #[serde(default)]
    sensitive_paths: Option<Vec<String>>,
    #[serde(default)]
    memory_threshold: Option<u64>,
    #[serde(default)]
    profile: Option<String>,
    #[serde(default)]
    policy_rules: Option<BTreeMap<String, bool>>,
    #[serde(default)]
    profiles: Option<BTreeMap<String, BTreeMap<String, bool>>>,
}

impl RecorderConfig {
    /// Load configuration, falling back silently to defaults
    ///
    /// A missing path, unreadable file, or unparsable JSON all yield the
    /// built-in defaults; a bad config must never abort an analysis run.
    pub fn load(path: Option<&Path>) -> Self {
        let Some(path) = path else {
            return Self::default();
        };

        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "policy config unreadable, using defaults");
                return Self::default();
            }
        };

        let file: PolicyFile = match serde_json::from_str(&content) {
            Ok(f) => f,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "policy config unparsable, using defaults");
                return Self::default();
            }
        };

        let mut config = Self::default();
        if let Some(paths) = file.sensitive_paths {
            config.sensitive_paths = paths;
        }
        if let Some(threshold) = file.memory_threshold {
            config.memory_threshold = threshold;
        }
        config.profile = file.profile;
        if let Some(rules) = file.policy_rules {
            config.rule_overrides = rules;
        }
        if let Some(profiles) = file.profiles {
            config.profiles = profiles;
        }
        config
    }

    /// Merge a comma-separated declared-intents list (CLI fallback)
    pub fn with_declared_intents(mut self, csv: &str) -> Self {
        for intent in csv.split(',') {
            let intent = intent.trim();
            if !intent.is_empty() {
                self.declared_intents.insert(intent.to_string());
            }
        }
        self
    }
}
