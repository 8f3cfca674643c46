//! Parlay LLM - AI research client boundary
//!
//! The research UI asks a generative model for three things: a week's
//! schedule, current rosters for a matchup, and a long-form matchup
//! analysis that streams partial text while it is produced. This crate
//! defines that boundary as [`AnalysisClient`] and ships a Gemini-backed
//! implementation.
//!
//! Model output is free text. Structured parts are recovered with
//! [`extract_json_block`] and decoded into the payload types from
//! `parlay-core`.

pub mod parse;
pub mod prompts;
pub mod providers;
pub mod sse;

pub use parse::{
    dedupe_sources, extract_json_block, parse_analysis, parse_roster_snapshot, parse_schedule,
};
pub use providers::GeminiClient;

use async_trait::async_trait;
use parlay_core::{MatchupPayload, ParlayResult, RosterSnapshot, SchedulePayload};

/// Progress callback for streamed analysis. Receives the cumulative text
/// produced so far; it can observe but not stop the producer.
pub type PartialTextFn<'a> = &'a (dyn Fn(&str) + Send + Sync);

// ============================================================================
// ANALYSIS CLIENT TRAIT
// ============================================================================

/// Source of research content.
///
/// Implementations must be thread-safe (Send + Sync).
#[async_trait]
pub trait AnalysisClient: Send + Sync {
    /// Fetch the schedule for `week`, or the current week when `None`.
    ///
    /// # Errors
    /// `LlmError::MissingCredentials` when no API key is configured, and
    /// other `LlmError` variants for transport or decoding failures.
    async fn fetch_schedule(&self, week: Option<&str>) -> ParlayResult<SchedulePayload>;

    /// Current rosters for both teams. `Ok(None)` when the model produced
    /// nothing usable.
    async fn fetch_roster_snapshot(
        &self,
        team_a: &str,
        team_b: &str,
    ) -> ParlayResult<Option<RosterSnapshot>>;

    /// Long-form matchup analysis.
    ///
    /// `on_partial` is invoked zero or more times with cumulative text
    /// before the final payload is returned.
    async fn fetch_deep_analysis(
        &self,
        team_a: &str,
        team_b: &str,
        roster_context: Option<&str>,
        on_partial: PartialTextFn<'_>,
    ) -> ParlayResult<MatchupPayload>;

    /// Provider name for logs.
    fn provider_id(&self) -> &str;
}
