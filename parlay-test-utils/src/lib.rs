//! Parlay Test Utilities
//!
//! Shared test infrastructure for the parlay workspace:
//! - Proptest generators for cache keys and JSON payloads
//! - A mock AI client
//! - A storage harness wiring in-memory tiers to a manual clock
//! - Fixtures and custom assertions

pub use parlay_core::{
    game_key, AnalysisResult, CacheEntry, Game, LlmError, ManualClock, MatchupPayload, Namespace,
    ParlayError, ParlayResult, PropLeg, RemoteErrorKind, RosterPlayer, RosterSnapshot,
    SchedulePayload, Source, ValidationError,
};
pub use parlay_storage::{
    InMemoryRemoteStore, MemoryLocalStore, RemoteRecord, RemoteStore, StorageConfig,
    StorageService,
};

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parlay_llm::{AnalysisClient, PartialTextFn};

// ============================================================================
// MOCK AI CLIENT
// ============================================================================

/// Scripted [`AnalysisClient`]. Defaults to the fixture payloads.
#[derive(Debug)]
pub struct MockAnalysisClient {
    schedule: SchedulePayload,
    roster: Option<RosterSnapshot>,
    analysis: MatchupPayload,
    partials: Vec<String>,
    failure: Option<LlmError>,
    schedule_calls: AtomicUsize,
    roster_calls: AtomicUsize,
    analysis_calls: AtomicUsize,
}

impl Default for MockAnalysisClient {
    fn default() -> Self {
        Self::new()
    }
}

impl MockAnalysisClient {
    pub fn new() -> Self {
        Self {
            schedule: fixtures::week_12_schedule(),
            roster: Some(fixtures::chiefs_raiders_roster()),
            analysis: fixtures::chiefs_raiders_analysis(),
            partials: vec!["Chiefs ".to_string(), "look strong.".to_string()],
            failure: None,
            schedule_calls: AtomicUsize::new(0),
            roster_calls: AtomicUsize::new(0),
            analysis_calls: AtomicUsize::new(0),
        }
    }

    pub fn with_schedule(mut self, schedule: SchedulePayload) -> Self {
        self.schedule = schedule;
        self
    }

    pub fn with_roster(mut self, roster: Option<RosterSnapshot>) -> Self {
        self.roster = roster;
        self
    }

    pub fn with_analysis(mut self, analysis: MatchupPayload) -> Self {
        self.analysis = analysis;
        self
    }

    /// Chunks emitted (cumulatively) through `on_partial`.
    pub fn with_partials<I, S>(mut self, partials: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.partials = partials.into_iter().map(Into::into).collect();
        self
    }

    /// Fail every call with `error`.
    pub fn failing(mut self, error: LlmError) -> Self {
        self.failure = Some(error);
        self
    }

    pub fn schedule_calls(&self) -> usize {
        self.schedule_calls.load(Ordering::SeqCst)
    }

    pub fn roster_calls(&self) -> usize {
        self.roster_calls.load(Ordering::SeqCst)
    }

    pub fn analysis_calls(&self) -> usize {
        self.analysis_calls.load(Ordering::SeqCst)
    }

    fn check(&self) -> ParlayResult<()> {
        match &self.failure {
            Some(err) => Err(ParlayError::Llm(err.clone())),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl AnalysisClient for MockAnalysisClient {
    async fn fetch_schedule(&self, week: Option<&str>) -> ParlayResult<SchedulePayload> {
        self.schedule_calls.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        let mut schedule = self.schedule.clone();
        if let Some(week) = week {
            schedule.week = week.to_string();
        }
        Ok(schedule)
    }

    async fn fetch_roster_snapshot(
        &self,
        _team_a: &str,
        _team_b: &str,
    ) -> ParlayResult<Option<RosterSnapshot>> {
        self.roster_calls.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        Ok(self.roster.clone())
    }

    async fn fetch_deep_analysis(
        &self,
        _team_a: &str,
        _team_b: &str,
        _roster_context: Option<&str>,
        on_partial: PartialTextFn<'_>,
    ) -> ParlayResult<MatchupPayload> {
        self.analysis_calls.fetch_add(1, Ordering::SeqCst);
        self.check()?;

        let mut text = String::new();
        for chunk in &self.partials {
            text.push_str(chunk);
            on_partial(text.as_str());
        }
        Ok(self.analysis.clone())
    }

    fn provider_id(&self) -> &str {
        "mock"
    }
}

// ============================================================================
// STORAGE HARNESS
// ============================================================================

/// In-memory tiers and a manual clock behind one service.
pub struct StorageHarness {
    pub service: StorageService,
    pub local: Arc<MemoryLocalStore>,
    pub remote: Arc<InMemoryRemoteStore>,
    pub clock: Arc<ManualClock>,
}

impl StorageHarness {
    pub fn new() -> Self {
        Self::build(
            MemoryLocalStore::new(),
            InMemoryRemoteStore::new(),
            StorageConfig::default(),
        )
    }

    /// Local tier that rejects writes beyond `capacity_bytes`.
    pub fn with_local_capacity(capacity_bytes: usize) -> Self {
        Self::build(
            MemoryLocalStore::with_capacity_bytes(capacity_bytes),
            InMemoryRemoteStore::new(),
            StorageConfig::default(),
        )
    }

    pub fn build(
        local: MemoryLocalStore,
        remote: InMemoryRemoteStore,
        config: StorageConfig,
    ) -> Self {
        let local = Arc::new(local);
        let remote = Arc::new(remote);
        let clock = Arc::new(ManualClock::new(fixtures::T0));
        let service = StorageService::new(
            local.clone(),
            Some(remote.clone() as Arc<dyn RemoteStore>),
            config,
        )
        .with_clock(clock.clone());
        Self {
            service,
            local,
            remote,
            clock,
        }
    }
}

impl Default for StorageHarness {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// PROPTEST GENERATORS
// ============================================================================

pub mod generators {
    //! Proptest strategies for cache keys and payloads.

    use super::*;
    use proptest::prelude::*;
    use serde_json::{Map, Value};

    pub fn arb_namespace() -> impl Strategy<Value = Namespace> {
        prop_oneof![Just(Namespace::Matchup), Just(Namespace::Schedule)]
    }

    /// Non-empty ids that look like game keys or week labels.
    pub fn arb_cache_key() -> impl Strategy<Value = String> {
        "[a-z0-9][a-z0-9 :-]{0,20}"
    }

    /// Arbitrary JSON. Numbers are integers or binary fractions so they
    /// survive a text round trip exactly.
    pub fn arb_json_value() -> impl Strategy<Value = Value> {
        let leaf = prop_oneof![
            Just(Value::Null),
            any::<bool>().prop_map(Value::Bool),
            any::<i64>().prop_map(Value::from),
            (-1_000_000i32..1_000_000).prop_map(|n| Value::from(f64::from(n) / 4.0)),
            "[ -~]{0,16}".prop_map(Value::String),
        ];

        leaf.prop_recursive(3, 48, 6, |inner| {
            prop_oneof![
                prop::collection::vec(inner.clone(), 0..6).prop_map(Value::Array),
                prop::collection::btree_map("[a-zA-Z_]{1,10}", inner, 0..6)
                    .prop_map(|m| Value::Object(m.into_iter().collect::<Map<_, _>>())),
            ]
        })
    }

    /// Distinct capture timestamps, in no particular order.
    pub fn arb_distinct_timestamps(count: usize) -> impl Strategy<Value = Vec<i64>> {
        prop::collection::btree_set(0i64..1_000_000, count)
            .prop_map(|set| set.into_iter().collect::<Vec<_>>())
            .prop_shuffle()
    }
}

// ============================================================================
// TEST FIXTURES
// ============================================================================

pub mod fixtures {
    //! Sample payloads for the Chiefs at Raiders example game.

    use super::*;

    /// Fixed start time for manual clocks (2023-11-14T22:13:20Z).
    pub const T0: i64 = 1_700_000_000_000;

    pub fn week_12_schedule() -> SchedulePayload {
        SchedulePayload {
            week: "Week 12".to_string(),
            games: vec![
                Game {
                    id: game_key("KC", "LV"),
                    away: "Kansas City Chiefs".to_string(),
                    home: "Las Vegas Raiders".to_string(),
                    kickoff: "Fri 3:00 PM ET".to_string(),
                    venue: Some("Allegiant Stadium".to_string()),
                },
                Game {
                    id: game_key("BUF", "PHI"),
                    away: "Buffalo Bills".to_string(),
                    home: "Philadelphia Eagles".to_string(),
                    kickoff: "Sun 4:25 PM ET".to_string(),
                    venue: None,
                },
            ],
        }
    }

    pub fn chiefs_raiders_roster() -> RosterSnapshot {
        let mut snapshot = RosterSnapshot::default();
        snapshot.rosters.insert(
            "Kansas City Chiefs".to_string(),
            vec![
                RosterPlayer {
                    name: "Patrick Mahomes".to_string(),
                    position: "QB".to_string(),
                    status: None,
                },
                RosterPlayer {
                    name: "Travis Kelce".to_string(),
                    position: "TE".to_string(),
                    status: Some("Questionable".to_string()),
                },
            ],
        );
        snapshot.rosters.insert(
            "Las Vegas Raiders".to_string(),
            vec![RosterPlayer {
                name: "Davante Adams".to_string(),
                position: "WR".to_string(),
                status: None,
            }],
        );
        snapshot
    }

    pub fn mahomes_passing_yards() -> PropLeg {
        PropLeg {
            player: "Patrick Mahomes".to_string(),
            team: "Kansas City Chiefs".to_string(),
            market: "Passing Yards".to_string(),
            line: Some(262.5),
            pick: "Over".to_string(),
            odds: Some(-110),
            confidence: 0.62,
            rationale: "Raiders allow the most yards per attempt over the last month.".to_string(),
        }
    }

    pub fn chiefs_raiders_analysis() -> MatchupPayload {
        MatchupPayload {
            analysis: Some(AnalysisResult {
                summary: "Chiefs control the game through the air.".to_string(),
                key_factors: vec!["Raiders secondary injuries".to_string()],
                prop_legs: vec![mahomes_passing_yards()],
                extra: Default::default(),
            }),
            sources: vec![Source {
                title: "Injury report".to_string(),
                uri: "https://example.com/injuries".to_string(),
            }],
            raw_text: "Chiefs look strong.".to_string(),
        }
    }
}

// ============================================================================
// CUSTOM ASSERTIONS
// ============================================================================

pub mod assertions {
    //! Assertions for storage behaviour.

    use super::*;

    pub fn assert_validation_error<T: std::fmt::Debug>(result: &ParlayResult<T>) {
        assert!(
            matches!(result, Err(ParlayError::Validation(_))),
            "Expected validation error, got {:?}",
            result
        );
    }

    pub fn assert_invalid_key<T: std::fmt::Debug>(result: &ParlayResult<T>) {
        assert!(
            matches!(
                result,
                Err(ParlayError::Validation(ValidationError::InvalidKey { .. }))
            ),
            "Expected invalid key error, got {:?}",
            result
        );
    }

    /// The remote tier received no calls at all.
    pub fn assert_remote_untouched(remote: &InMemoryRemoteStore) {
        let calls = remote.calls();
        assert_eq!(calls.total(), 0, "Expected no remote calls, got {:?}", calls);
    }

    pub fn assert_local_mode(service: &StorageService) {
        assert!(
            !service.is_remote_active(),
            "Expected local storage mode, circuit is {:?}",
            service.circuit_state()
        );
        assert_eq!(service.status_label(), "Local Storage Mode");
    }

    pub fn assert_cloud_mode(service: &StorageService) {
        assert!(
            service.is_remote_active(),
            "Expected cloud mode, circuit is {:?}",
            service.circuit_state()
        );
        assert_eq!(service.status_label(), "Cloud Connected");
    }
}
