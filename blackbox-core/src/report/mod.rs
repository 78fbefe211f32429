//! Badge report assembly
//!
//! Aggregates per-event behavior facts and accumulated risk highlights
//! into the final badge for one analysis run.

mod assembler;
mod badge;

pub use assembler::ReportAssembler;
pub use badge::{Badge, BadgeStats, BadgeStatus};
