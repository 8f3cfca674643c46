//! Parlay Core - shared types for the parlay research tool
//!
//! Namespaces and the cache entry codec used by the storage tiers, the
//! payload shapes exchanged with the AI client, the parlay slip, and the
//! error taxonomy every other crate returns.

pub mod clock;
pub mod domain;
pub mod entry;
pub mod error;
pub mod namespace;
pub mod slip;

pub use clock::{Clock, ManualClock, SystemClock};
pub use domain::{
    game_key, AnalysisResult, Game, MatchupPayload, PropLeg, RosterPlayer, RosterSnapshot,
    SchedulePayload, Source,
};
pub use entry::{CacheEntry, CorruptEntry};
pub use error::{
    ConfigError, LlmError, LocalStoreError, ParlayError, ParlayResult, RemoteError,
    RemoteErrorKind, ValidationError,
};
pub use namespace::{LocalKey, Namespace, NamespaceParseError, LOCAL_KEY_PREFIX};
pub use slip::{american_to_decimal, decimal_to_american, ParlaySlip, SlipLeg};
