//! Payload types handed between the AI client, the UI and storage.
//!
//! Storage never inspects these; it caches whatever serializes. They live
//! here so every crate agrees on the wire shape.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// A scheduled game.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Game {
    pub id: String,
    pub away: String,
    pub home: String,
    /// Kickoff as reported by the schedule source (free-form).
    pub kickoff: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub venue: Option<String>,
}

/// Payload cached under [`crate::Namespace::Schedule`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchedulePayload {
    pub week: String,
    pub games: Vec<Game>,
}

/// A web citation backing part of an analysis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Source {
    pub title: String,
    pub uri: String,
}

/// One recommended player prop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropLeg {
    pub player: String,
    pub team: String,
    /// e.g. "Passing Yards", "Anytime TD".
    pub market: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<f64>,
    /// "Over", "Under", "Yes".
    pub pick: String,
    /// American odds, e.g. -110 or +150.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub odds: Option<i32>,
    /// 0.0..=1.0
    #[serde(default)]
    pub confidence: f64,
    #[serde(default)]
    pub rationale: String,
}

impl PropLeg {
    /// Identity used to keep a slip free of duplicate legs.
    pub fn same_bet(&self, other: &PropLeg) -> bool {
        self.player.eq_ignore_ascii_case(&other.player)
            && self.market.eq_ignore_ascii_case(&other.market)
            && self.pick.eq_ignore_ascii_case(&other.pick)
    }
}

/// Structured part of an AI matchup analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub summary: String,
    #[serde(default)]
    pub key_factors: Vec<String>,
    #[serde(default)]
    pub prop_legs: Vec<PropLeg>,
    /// Anything else the model returned; kept so nothing is lost on re-save.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Payload cached under [`crate::Namespace::Matchup`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchupPayload {
    pub analysis: Option<AnalysisResult>,
    #[serde(default)]
    pub sources: Vec<Source>,
    #[serde(default)]
    pub raw_text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RosterPlayer {
    pub name: String,
    pub position: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

/// Current rosters for the two teams in a matchup, keyed by team name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RosterSnapshot {
    pub rosters: BTreeMap<String, Vec<RosterPlayer>>,
}

impl RosterSnapshot {
    /// Compact text form fed back into the deep-analysis prompt.
    pub fn as_context(&self) -> String {
        self.rosters
            .iter()
            .map(|(team, players)| {
                let names = players
                    .iter()
                    .map(|p| match &p.status {
                        Some(status) => format!("{} ({}, {})", p.name, p.position, status),
                        None => format!("{} ({})", p.name, p.position),
                    })
                    .collect::<Vec<_>>()
                    .join(", ");
                format!("{}: {}", team, names)
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Matchup cache key for a game, e.g. `kc-lv`.
pub fn game_key(away: &str, home: &str) -> String {
    format!("{}-{}", slug(away), slug(home))
}

fn slug(team: &str) -> String {
    let mut out = String::with_capacity(team.len());
    for c in team.trim().chars() {
        if c.is_ascii_alphanumeric() {
            out.push(c.to_ascii_lowercase());
        } else if !out.ends_with('_') && !out.is_empty() {
            out.push('_');
        }
    }
    out.trim_end_matches('_').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_game_key() {
        assert_eq!(game_key("KC", "LV"), "kc-lv");
        assert_eq!(game_key(" New York Giants ", "Dallas"), "new_york_giants-dallas");
    }

    #[test]
    fn test_matchup_payload_wire_shape() {
        let payload = MatchupPayload {
            analysis: None,
            sources: vec![Source {
                title: "Injury report".to_string(),
                uri: "https://example.com/report".to_string(),
            }],
            raw_text: "text".to_string(),
        };
        let value = serde_json::to_value(&payload).expect("serialize should succeed");
        assert_eq!(
            value,
            json!({
                "analysis": null,
                "sources": [{"title": "Injury report", "uri": "https://example.com/report"}],
                "rawText": "text"
            })
        );
    }

    #[test]
    fn test_analysis_keeps_unknown_fields() {
        let value = json!({
            "summary": "Chiefs by a field goal",
            "keyFactors": ["weather"],
            "propLegs": [],
            "bettingTrends": {"ats": "4-1"}
        });
        let analysis: AnalysisResult =
            serde_json::from_value(value.clone()).expect("deserialize should succeed");
        assert_eq!(analysis.extra.get("bettingTrends"), Some(&json!({"ats": "4-1"})));
        assert_eq!(serde_json::to_value(&analysis).expect("serialize"), value);
    }

    #[test]
    fn test_roster_context() {
        let mut snapshot = RosterSnapshot::default();
        snapshot.rosters.insert(
            "KC".to_string(),
            vec![
                RosterPlayer {
                    name: "P. Mahomes".to_string(),
                    position: "QB".to_string(),
                    status: None,
                },
                RosterPlayer {
                    name: "T. Kelce".to_string(),
                    position: "TE".to_string(),
                    status: Some("Questionable".to_string()),
                },
            ],
        );
        assert_eq!(
            snapshot.as_context(),
            "KC: P. Mahomes (QB), T. Kelce (TE, Questionable)"
        );
    }

    #[test]
    fn test_same_bet_ignores_case_and_odds() {
        let a = PropLeg {
            player: "T. Kelce".to_string(),
            team: "KC".to_string(),
            market: "Receiving Yards".to_string(),
            line: Some(62.5),
            pick: "Over".to_string(),
            odds: Some(-115),
            confidence: 0.6,
            rationale: String::new(),
        };
        let mut b = a.clone();
        b.odds = Some(-105);
        b.pick = "over".to_string();
        assert!(a.same_bet(&b));
        b.pick = "Under".to_string();
        assert!(!a.same_bet(&b));
    }
}
