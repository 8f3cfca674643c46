use std::io::Write;

use parlay_core::{Namespace, SchedulePayload};
use tracing::info;

use super::Context;
use crate::error::CliResult;

/// Cache key for a schedule requested without a week label.
pub const CURRENT_WEEK_KEY: &str = "current";

/// Cache-aside schedule lookup keyed by week label.
pub async fn schedule(
    ctx: &Context<'_>,
    week: Option<&str>,
    refresh: bool,
    out: &mut dyn Write,
) -> CliResult<()> {
    let key = week.unwrap_or(CURRENT_WEEK_KEY);

    let cached = if refresh {
        None
    } else {
        ctx.storage
            .get::<SchedulePayload>(Namespace::Schedule, key)
            .await?
    };

    let payload = match cached {
        Some(payload) => payload,
        None => {
            info!(week = key, provider = ctx.ai.provider_id(), "Fetching schedule");
            let payload = ctx.ai.fetch_schedule(week).await?;
            ctx.storage.save(Namespace::Schedule, key, &payload).await?;
            payload
        }
    };

    render(&payload, out)
}

fn render(payload: &SchedulePayload, out: &mut dyn Write) -> CliResult<()> {
    writeln!(out, "{}", payload.week)?;
    for game in &payload.games {
        write!(out, "  {} @ {}  {}", game.away, game.home, game.kickoff)?;
        if let Some(venue) = &game.venue {
            write!(out, "  {}", venue)?;
        }
        writeln!(out, "  [{}]", game.id)?;
    }
    Ok(())
}
