//! Recovering structured payloads from model text.

use std::collections::HashSet;

use once_cell::sync::Lazy;
use parlay_core::{
    game_key, AnalysisResult, Game, LlmError, RosterSnapshot, SchedulePayload, Source,
};
use regex::Regex;
use serde::Deserialize;

static FENCED_JSON: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r"(?s)```(?:json|JSON)?\s*(\{.*?\})\s*```").ok());

/// Pull the first JSON object out of model text.
///
/// A fenced block (```` ```json ... ``` ````) wins; otherwise the first
/// balanced `{ ... }` span in the text is returned.
pub fn extract_json_block(text: &str) -> Option<&str> {
    if let Some(re) = FENCED_JSON.as_ref() {
        if let Some(m) = re.captures(text).and_then(|caps| caps.get(1)) {
            return Some(m.as_str());
        }
    }
    balanced_object(text)
}

fn balanced_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, c) in text[start..].char_indices() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..start + offset + c.len_utf8()]);
                }
            }
            _ => {}
        }
    }
    None
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ScheduleDraft {
    #[serde(default)]
    week: Option<String>,
    #[serde(default)]
    games: Vec<GameDraft>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GameDraft {
    #[serde(default)]
    id: Option<String>,
    away: String,
    home: String,
    #[serde(default)]
    kickoff: String,
    #[serde(default)]
    venue: Option<String>,
}

/// Decode a schedule answer. Games without an id get the matchup key.
pub fn parse_schedule(
    provider: &str,
    text: &str,
    requested_week: Option<&str>,
) -> Result<SchedulePayload, LlmError> {
    let invalid = |reason: String| LlmError::InvalidResponse {
        provider: provider.to_string(),
        reason,
    };

    let block =
        extract_json_block(text).ok_or_else(|| invalid("no JSON object in schedule".into()))?;
    let draft: ScheduleDraft =
        serde_json::from_str(block).map_err(|e| invalid(format!("schedule: {}", e)))?;

    let week = draft
        .week
        .filter(|w| !w.trim().is_empty())
        .or_else(|| requested_week.map(str::to_string))
        .unwrap_or_else(|| "Current Week".to_string());

    let games = draft
        .games
        .into_iter()
        .map(|g| Game {
            id: g
                .id
                .filter(|id| !id.trim().is_empty())
                .unwrap_or_else(|| game_key(&g.away, &g.home)),
            away: g.away,
            home: g.home,
            kickoff: g.kickoff,
            venue: g.venue,
        })
        .collect();

    Ok(SchedulePayload { week, games })
}

/// Decode a roster answer; anything unusable is `None`.
pub fn parse_roster_snapshot(text: &str) -> Option<RosterSnapshot> {
    let block = extract_json_block(text)?;
    serde_json::from_str::<RosterSnapshot>(block)
        .ok()
        .filter(|snapshot| !snapshot.rosters.is_empty())
}

/// Decode the structured part of an analysis, if the model produced one.
pub fn parse_analysis(text: &str) -> Option<AnalysisResult> {
    let block = extract_json_block(text)?;
    serde_json::from_str(block).ok()
}

/// Drop repeated citations, keeping first-seen order.
pub fn dedupe_sources(sources: Vec<Source>) -> Vec<Source> {
    let mut seen = HashSet::new();
    sources
        .into_iter()
        .filter(|s| !s.uri.is_empty() && seen.insert(s.uri.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_extract_fenced_block() {
        let text = "Here you go:\n```json\n{\"a\": {\"b\": 1}}\n```\ntrailing {\"c\": 2}";
        assert_eq!(extract_json_block(text), Some("{\"a\": {\"b\": 1}}"));
    }

    #[test]
    fn test_extract_bare_block_respects_strings() {
        let text = r#"Summary first. {"summary": "a } inside \" quotes", "n": {"x": 1}} and more"#;
        assert_eq!(
            extract_json_block(text),
            Some(r#"{"summary": "a } inside \" quotes", "n": {"x": 1}}"#)
        );
    }

    #[test]
    fn test_extract_none() {
        assert_eq!(extract_json_block("no json here"), None);
        assert_eq!(extract_json_block("{ never closed"), None);
    }

    #[test]
    fn test_parse_schedule_fills_ids_and_week() {
        let text = r#"```json
{"games": [
  {"away": "Kansas City Chiefs", "home": "Las Vegas Raiders", "kickoff": "Sun 4:25 PM", "id": "KC-LV"},
  {"away": "Bills", "home": "Jets", "kickoff": "Mon 8:15 PM"}
]}
```"#;
        let schedule =
            parse_schedule("gemini", text, Some("Week 12")).expect("parse should succeed");
        assert_eq!(schedule.week, "Week 12");
        assert_eq!(schedule.games.len(), 2);
        assert_eq!(schedule.games[0].id, "KC-LV");
        assert_eq!(schedule.games[1].id, game_key("Bills", "Jets"));
    }

    #[test]
    fn test_parse_schedule_without_json() {
        let err = parse_schedule("gemini", "Sorry, no schedule.", None).expect_err("no json");
        assert!(matches!(err, LlmError::InvalidResponse { .. }));
    }

    #[test]
    fn test_parse_roster_snapshot() {
        let text = r#"{"rosters": {"Chiefs": [{"name": "Patrick Mahomes", "position": "QB"}]}}"#;
        let snapshot = parse_roster_snapshot(text).expect("roster");
        assert_eq!(snapshot.rosters["Chiefs"][0].name, "Patrick Mahomes");

        assert!(parse_roster_snapshot(r#"{"rosters": {}}"#).is_none());
        assert!(parse_roster_snapshot("nothing").is_none());
    }

    #[test]
    fn test_parse_analysis_keeps_extra_fields() {
        let text = r#"Analysis:
```json
{"summary": "Chiefs control the clock", "keyFactors": ["run defense"], "propLegs": [], "weather": "clear"}
```"#;
        let analysis = parse_analysis(text).expect("analysis");
        assert_eq!(analysis.summary, "Chiefs control the clock");
        assert_eq!(analysis.key_factors, vec!["run defense".to_string()]);
        assert_eq!(analysis.extra["weather"], "clear");
    }

    #[test]
    fn test_dedupe_sources() {
        let s = |uri: &str| Source {
            title: uri.to_uppercase(),
            uri: uri.to_string(),
        };
        let deduped = dedupe_sources(vec![s("a"), s("b"), s("a"), s("")]);
        assert_eq!(deduped, vec![s("a"), s("b")]);
    }

    proptest! {
        #[test]
        fn prop_extract_finds_embedded_object(prefix in "[a-zA-Z .,]{0,40}", n in any::<i64>()) {
            let object = format!("{{\"n\": {}}}", n);
            let text = format!("{}{} tail", prefix, object);
            prop_assert_eq!(extract_json_block(&text), Some(object.as_str()));
        }
    }
}
