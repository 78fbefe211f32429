//! Receipts — the tamper-evident hash chain over one analysis run
//!
//! Each receipt binds one flight event to the previous receipt via SHA-256
//! hash chaining. The chain is a strict singly linked list in input order:
//! any mutation of an event, a receipt, or the order breaks verification at
//! the exact offending sequence number.

mod canonical;
mod chain;
mod verify;

pub use canonical::{canonical_json, sha256_hex};
pub use chain::{Receipt, ReceiptChainBuilder};
pub use verify::{ChainErrorType, ChainVerification, ChainVerifier};

/// Genesis hash - used as prev_hash for the first receipt
pub const GENESIS_HASH: &str = "0000000000000000000000000000000000000000000000000000000000000000";
