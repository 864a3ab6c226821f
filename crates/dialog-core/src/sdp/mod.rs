//! SDP offer/answer negotiation
//!
//! - [`offer_answer`]: the [`SdpNegotiator`] state machine
//! - [`matching`]: media line and format matching used to apply answers and
//!   build them
//! - [`format_match`]: payload type comparison and codec-specific matchers

pub mod format_match;
pub mod matching;
pub mod offer_answer;

pub use format_match::{fmt_match, FormatMatcher, FormatMatcherRegistry};
pub use matching::MatchOptions;
pub use offer_answer::{NegotiatorState, SdpNegotiator};
