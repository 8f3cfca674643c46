//! Prompt text for the research requests.

pub fn schedule_prompt(week: Option<&str>) -> String {
    let target = match week {
        Some(week) => format!("{} of the current NFL season", week),
        None => "the current NFL week".to_string(),
    };
    format!(
        "Find the NFL game schedule for {target}. Respond with a single JSON object \
         inside a ```json fenced block, shaped as \
         {{\"week\": \"Week N\", \"games\": [{{\"away\": \"team\", \"home\": \"team\", \
         \"kickoff\": \"day and local time\", \"venue\": \"stadium\"}}]}}. \
         Use full team names. Do not add commentary outside the block."
    )
}

pub fn roster_prompt(team_a: &str, team_b: &str) -> String {
    format!(
        "List the current active skill-position players (QB, RB, WR, TE) for the {team_a} \
         and the {team_b}, including injury designations. Respond with a JSON object \
         inside a ```json fenced block shaped as \
         {{\"rosters\": {{\"{team_a}\": [{{\"name\": \"...\", \"position\": \"QB\", \
         \"status\": \"Questionable\"}}], \"{team_b}\": [...]}}}}. Omit status when healthy."
    )
}

pub fn analysis_prompt(team_a: &str, team_b: &str, roster_context: Option<&str>) -> String {
    let mut prompt = format!(
        "You are an NFL betting research analyst. Research the upcoming game between the \
         {team_a} and the {team_b}: recent form, injuries, weather, matchup edges and \
         betting market movement.\n\n\
         Write your reasoning first as prose. Then finish with a ```json fenced block \
         shaped as {{\"summary\": \"...\", \"keyFactors\": [\"...\"], \"propLegs\": \
         [{{\"player\": \"...\", \"team\": \"...\", \"market\": \"Passing Yards\", \
         \"line\": 249.5, \"pick\": \"Over\", \"odds\": -110, \"confidence\": 0.6, \
         \"rationale\": \"...\"}}]}}."
    );

    if let Some(context) = roster_context.filter(|c| !c.trim().is_empty()) {
        prompt.push_str("\n\nOnly recommend props for players on these current rosters:\n");
        prompt.push_str(context);
    }
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schedule_prompt_mentions_week() {
        assert!(schedule_prompt(Some("Week 12")).contains("Week 12 of the current NFL season"));
        assert!(schedule_prompt(None).contains("the current NFL week"));
    }

    #[test]
    fn test_analysis_prompt_roster_context() {
        let with = analysis_prompt("Chiefs", "Raiders", Some("Chiefs: Patrick Mahomes (QB)"));
        assert!(with.contains("Patrick Mahomes"));

        let without = analysis_prompt("Chiefs", "Raiders", Some("   "));
        assert!(!without.contains("current rosters"));
    }

    #[test]
    fn test_roster_prompt_names_both_teams() {
        let prompt = roster_prompt("Chiefs", "Raiders");
        assert!(prompt.contains("\"Chiefs\": ["));
        assert!(prompt.contains("\"Raiders\": [...]"));
    }
}
