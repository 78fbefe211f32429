//! Risk rules — the closed, auditable dispatch table over flight events
//!
//! Every rule is a pure, deterministic function of one normalized event and
//! the run configuration. Multiple tags per event are permitted and
//! independent; evaluation order (type rules, then unknown-type, then
//! evidence-gap) keeps highlight output stable.

mod rules;
mod tags;

pub use rules::RiskRuleEngine;
pub(crate) use rules::command_digest;
pub use tags::{RiskHighlight, RiskTag};
