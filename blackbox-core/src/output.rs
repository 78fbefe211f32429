//! Output directory writer
//!
//! Writes one run's artifacts (badge.json, receipts.jsonl, anchor.json, and
//! optionally suggestions.json + probe_plan.md) into a directory, all or
//! nothing: every file is staged under a `.tmp` name first and renamed only
//! after all stages succeed. A non-empty target directory is refused unless
//! the caller opts into overwriting.

use std::path::{Path, PathBuf};

use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::advice::{build_probe_plan_md, generate_suggestions};
use crate::error::{RecorderError, Result};
use crate::receipt::GENESIS_HASH;
use crate::recorder::RunArtifacts;

type HmacSha256 = Hmac<Sha256>;

/// Writer for one run's output directory
#[derive(Debug)]
pub struct OutputWriter<'a> {
    dir: &'a Path,
    overwrite: bool,
    anchor_key: Option<Vec<u8>>,
    with_suggestions: bool,
}

impl<'a> OutputWriter<'a> {
    pub fn new(dir: &'a Path) -> Self {
        Self {
            dir,
            overwrite: false,
            anchor_key: None,
            with_suggestions: false,
        }
    }

    pub fn overwrite(mut self, yes: bool) -> Self {
        self.overwrite = yes;
        self
    }

    /// Set the hex-encoded HMAC-SHA256 key used to sign the anchor
    pub fn anchor_key_hex(mut self, key_hex: Option<&str>) -> Result<Self> {
        self.anchor_key = match key_hex {
            Some(hex_str) => {
                let key = hex::decode(hex_str.trim()).map_err(|e| {
                    RecorderError::InvalidAnchorKey {
                        reason: e.to_string(),
                    }
                })?;
                if key.is_empty() {
                    return Err(RecorderError::InvalidAnchorKey {
                        reason: "key is empty".to_string(),
                    });
                }
                Some(key)
            }
            None => None,
        };
        Ok(self)
    }

    pub fn with_suggestions(mut self, yes: bool) -> Self {
        self.with_suggestions = yes;
        self
    }

    /// Write all artifacts for the run
    pub fn write(&self, artifacts: &RunArtifacts, input_hint: &str) -> Result<Vec<PathBuf>> {
        self.prepare_dir()?;

        let mut staged: Vec<(PathBuf, PathBuf)> = Vec::new();
        let result = self.stage_all(artifacts, input_hint, &mut staged);

        if let Err(e) = result {
            for (tmp, _) in &staged {
                let _ = std::fs::remove_file(tmp);
            }
            return Err(e);
        }

        let mut written = Vec::new();
        for (tmp, target) in staged {
            std::fs::rename(&tmp, &target).map_err(|e| RecorderError::OutputWrite {
                path: target.display().to_string(),
                reason: e.to_string(),
            })?;
            tracing::info!(path = %target.display(), "wrote artifact");
            written.push(target);
        }
        Ok(written)
    }

    fn prepare_dir(&self) -> Result<()> {
        if self.dir.is_dir() {
            let occupied = std::fs::read_dir(self.dir)
                .map_err(|e| RecorderError::OutputWrite {
                    path: self.dir.display().to_string(),
                    reason: e.to_string(),
                })?
                .next()
                .is_some();
            if occupied && !self.overwrite {
                return Err(RecorderError::OutputDirNotEmpty {
                    path: self.dir.display().to_string(),
                });
            }
        } else {
            std::fs::create_dir_all(self.dir).map_err(|e| RecorderError::OutputWrite {
                path: self.dir.display().to_string(),
                reason: e.to_string(),
            })?;
        }
        Ok(())
    }

    fn stage_all(
        &self,
        artifacts: &RunArtifacts,
        input_hint: &str,
        staged: &mut Vec<(PathBuf, PathBuf)>,
    ) -> Result<()> {
        let badge_json = serde_json::to_string_pretty(&artifacts.badge)?;
        self.stage("badge.json", badge_json.as_bytes(), staged)?;

        let mut receipts_jsonl = String::new();
        for receipt in &artifacts.receipts {
            receipts_jsonl.push_str(&serde_json::to_string(receipt)?);
            receipts_jsonl.push('\n');
        }
        self.stage("receipts.jsonl", receipts_jsonl.as_bytes(), staged)?;

        let anchor = self.build_anchor(artifacts)?;
        let anchor_json = serde_json::to_string_pretty(&anchor)?;
        self.stage("anchor.json", anchor_json.as_bytes(), staged)?;

        if self.with_suggestions {
            let pack = generate_suggestions(&artifacts.badge, input_hint);
            let pack_json = serde_json::to_string_pretty(&pack)?;
            self.stage("suggestions.json", pack_json.as_bytes(), staged)?;
            self.stage("probe_plan.md", build_probe_plan_md(&pack).as_bytes(), staged)?;
        }

        Ok(())
    }

    fn stage(&self, name: &str, content: &[u8], staged: &mut Vec<(PathBuf, PathBuf)>) -> Result<()> {
        let target = self.dir.join(name);
        let tmp = self.dir.join(format!("{name}.tmp"));
        std::fs::write(&tmp, content).map_err(|e| RecorderError::OutputWrite {
            path: tmp.display().to_string(),
            reason: e.to_string(),
        })?;
        staged.push((tmp, target));
        Ok(())
    }

    /// The anchor commits to the whole chain via its final receipt hash
    fn build_anchor(&self, artifacts: &RunArtifacts) -> Result<serde_json::Value> {
        let final_hash = artifacts
            .receipts
            .last()
            .map(|r| r.receipt_hash.as_str())
            .unwrap_or(GENESIS_HASH);

        let mut anchor = serde_json::json!({
            "final_receipt_hash": final_hash,
            "receipt_count": artifacts.receipts.len(),
            "status": artifacts.badge.status,
        });

        if let Some(key) = &self.anchor_key {
            // Key length already validated; HMAC accepts any non-empty key
            let mut mac = HmacSha256::new_from_slice(key).map_err(|e| {
                RecorderError::InvalidAnchorKey {
                    reason: e.to_string(),
                }
            })?;
            mac.update(final_hash.as_bytes());
            let signature = hex::encode(mac.finalize().into_bytes());
            anchor["signature"] = serde_json::json!(signature);
            anchor["signature_alg"] = serde_json::json!("HMAC-SHA256");
        }

        Ok(anchor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RecorderConfig;
    use crate::recorder::FlightRecorder;
    use serde_json::json;

    fn artifacts() -> RunArtifacts {
        let config = RecorderConfig::default();
        let line = json!({
            "v": "flight-log/1",
            "ts": "2026-01-01T00:00:00Z",
            "trace_id": "t-1",
            "seq": 1,
            "actor": "agent",
            "event_type": "FILE_IO",
            "payload_digest": "d".repeat(64),
            "domain_class": "FS",
            "details": {"path": "/tmp/a", "op": "read"},
        })
        .to_string();
        FlightRecorder::new(&config).analyze_lines([line.as_str()])
    }

    fn temp_dir(tag: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("blackbox-out-{tag}-{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        dir
    }

    #[test]
    fn test_writes_core_artifacts() {
        let dir = temp_dir("core");
        let written = OutputWriter::new(&dir).write(&artifacts(), "run.jsonl").unwrap();

        let names: Vec<_> = written
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert!(names.contains(&"badge.json".to_string()));
        assert!(names.contains(&"receipts.jsonl".to_string()));
        assert!(names.contains(&"anchor.json".to_string()));
        assert!(!names.contains(&"suggestions.json".to_string()));

        // No stray .tmp files
        for entry in std::fs::read_dir(&dir).unwrap() {
            let name = entry.unwrap().file_name().to_string_lossy().to_string();
            assert!(!name.ends_with(".tmp"), "staging file left behind: {name}");
        }

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_refuses_non_empty_dir_without_overwrite() {
        let dir = temp_dir("occupied");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("existing.txt"), b"x").unwrap();

        let err = OutputWriter::new(&dir).write(&artifacts(), "run.jsonl").unwrap_err();
        assert!(matches!(err, RecorderError::OutputDirNotEmpty { .. }));
        assert_eq!(err.exit_code(), 2);

        // Overwrite flag allows it
        OutputWriter::new(&dir)
            .overwrite(true)
            .write(&artifacts(), "run.jsonl")
            .unwrap();

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_anchor_commits_to_final_receipt() {
        let dir = temp_dir("anchor");
        let artifacts = artifacts();
        OutputWriter::new(&dir).write(&artifacts, "run.jsonl").unwrap();

        let anchor: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(dir.join("anchor.json")).unwrap()).unwrap();
        assert_eq!(
            anchor["final_receipt_hash"],
            json!(artifacts.receipts.last().unwrap().receipt_hash)
        );
        assert_eq!(anchor["receipt_count"], json!(1));
        assert!(anchor.get("signature").is_none());

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_anchor_signature_with_key() {
        let dir = temp_dir("signed");
        OutputWriter::new(&dir)
            .anchor_key_hex(Some("00112233445566778899aabbccddeeff"))
            .unwrap()
            .write(&artifacts(), "run.jsonl")
            .unwrap();

        let anchor: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(dir.join("anchor.json")).unwrap()).unwrap();
        assert_eq!(anchor["signature_alg"], json!("HMAC-SHA256"));
        assert_eq!(anchor["signature"].as_str().unwrap().len(), 64);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_invalid_anchor_key_is_usage_error() {
        let dir = temp_dir("badkey");
        let err = OutputWriter::new(&dir)
            .anchor_key_hex(Some("not hex!"))
            .unwrap_err();
        assert!(matches!(err, RecorderError::InvalidAnchorKey { .. }));
        assert_eq!(err.exit_code(), 2);

        let err = OutputWriter::new(&dir).anchor_key_hex(Some("")).unwrap_err();
        assert!(matches!(err, RecorderError::InvalidAnchorKey { .. }));
    }

    #[test]
    fn test_suggestions_written_when_requested() {
        let dir = temp_dir("suggest");
        OutputWriter::new(&dir)
            .with_suggestions(true)
            .write(&artifacts(), "run.jsonl")
            .unwrap();

        assert!(dir.join("suggestions.json").is_file());
        let plan = std::fs::read_to_string(dir.join("probe_plan.md")).unwrap();
        assert!(plan.starts_with("# Probe Plan (Advisory)"));

        let _ = std::fs::remove_dir_all(&dir);
    }
}
