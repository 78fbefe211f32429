//! Flight log — the ordered JSONL record of instrumented agent actions
//!
//! One JSON object per non-blank line. Input is untrusted and arbitrarily
//! shaped: the normalizer in this module turns every line, including lines
//! that fail to parse, into a canonical [`NormalizedEvent`]. No line is ever
//! dropped, so downstream receipt counts always match input line counts.

mod event;
mod normalize;

pub use event::{EventType, FlightEvent};
pub(crate) use event::value_str;
pub use normalize::{EventNormalizer, NormalizedEvent};

/// Flight log schema version tag
pub const FLIGHT_LOG_VERSION: &str = "flight-log/1";
