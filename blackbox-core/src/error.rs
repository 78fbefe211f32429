//! Error types for recorder operations
//!
//! The analysis pass itself is total: malformed input lines, unknown event
//! types, and unreadable policy configs are surfaced as data (evidence gaps,
//! highlights, built-in defaults), never as errors. Errors here cover the
//! surrounding machinery only: reading the flight log, writing the output
//! directory, and invalid caller-supplied values.

use thiserror::Error;

/// Result type alias for recorder operations
pub type Result<T> = std::result::Result<T, RecorderError>;

/// Errors that can occur around an analysis run
#[derive(Error, Debug)]
pub enum RecorderError {
    /// Flight log could not be read
    #[error("Failed to read flight log '{path}': {reason}")]
    InputRead { path: String, reason: String },

    /// Receipts file could not be read for verification
    #[error("Failed to read receipts '{path}': {reason}")]
    ReceiptsRead { path: String, reason: String },

    /// Output directory already contains files
    #[error("Output directory not empty: '{path}'. Pass --overwrite or choose a new directory.")]
    OutputDirNotEmpty { path: String },

    /// An output artifact could not be written
    #[error("Failed to write output '{path}': {reason}")]
    OutputWrite { path: String, reason: String },

    /// Anchor signing key is not valid hex
    #[error("Invalid anchor key: {reason}. Provide a hex-encoded HMAC-SHA256 key.")]
    InvalidAnchorKey { reason: String },

    /// JSON serialization failure (should not occur for well-formed artifacts)
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl RecorderError {
    /// Process exit code for this error
    ///
    /// Usage errors (caller gave us something unusable) exit with 2,
    /// everything else with 1.
    pub fn exit_code(&self) -> i32 {
        match self {
            RecorderError::OutputDirNotEmpty { .. } | RecorderError::InvalidAnchorKey { .. } => 2,
            _ => 1,
        }
    }
}
