use std::io::Write;

use parlay_core::{game_key, MatchupPayload, Namespace, ParlaySlip};
use tracing::{info, warn};

use super::Context;
use crate::error::CliResult;

/// Cache-aside matchup research.
///
/// On a miss the roster snapshot is fetched first (best effort) and passed
/// as context to the deep analysis, whose streamed text is reported on
/// stderr. A failed analysis is the one error surfaced to the user.
pub async fn research(
    ctx: &Context<'_>,
    away: &str,
    home: &str,
    refresh: bool,
    out: &mut dyn Write,
) -> CliResult<()> {
    let key = game_key(away, home);

    let cached = if refresh {
        None
    } else {
        ctx.storage
            .get::<MatchupPayload>(Namespace::Matchup, &key)
            .await?
    };

    let payload = match cached {
        Some(payload) => payload,
        None => {
            let payload = fetch_analysis(ctx, away, home).await?;
            ctx.storage.save(Namespace::Matchup, &key, &payload).await?;
            payload
        }
    };

    render(&key, &payload, out)
}

async fn fetch_analysis(ctx: &Context<'_>, away: &str, home: &str) -> CliResult<MatchupPayload> {
    let roster_context = match ctx.ai.fetch_roster_snapshot(away, home).await {
        Ok(Some(snapshot)) => Some(snapshot.as_context()),
        Ok(None) => None,
        Err(e) => {
            warn!(away, home, error = %e, "Roster fetch failed, continuing without it");
            None
        }
    };

    info!(away, home, provider = ctx.ai.provider_id(), "Fetching deep analysis");
    let on_partial = |text: &str| eprint!("\rAnalyzing... {} chars", text.chars().count());
    let payload = ctx
        .ai
        .fetch_deep_analysis(away, home, roster_context.as_deref(), &on_partial)
        .await;
    eprintln!();
    Ok(payload?)
}

fn render(key: &str, payload: &MatchupPayload, out: &mut dyn Write) -> CliResult<()> {
    writeln!(out, "Matchup {}", key)?;

    match &payload.analysis {
        Some(analysis) => {
            writeln!(out, "\n{}", analysis.summary)?;

            if !analysis.key_factors.is_empty() {
                writeln!(out, "\nKey factors:")?;
                for factor in &analysis.key_factors {
                    writeln!(out, "  - {}", factor)?;
                }
            }

            if !analysis.prop_legs.is_empty() {
                writeln!(out, "\nProps:")?;
                let mut slip = ParlaySlip::new();
                for leg in &analysis.prop_legs {
                    write!(out, "  {} {} {}", leg.player, leg.market, leg.pick)?;
                    if let Some(line) = leg.line {
                        write!(out, " {}", line)?;
                    }
                    match leg.odds {
                        Some(odds) => writeln!(out, " ({:+})", odds)?,
                        None => writeln!(out)?,
                    }
                    if leg.odds.is_some() {
                        slip.pin(key, leg.clone());
                    }
                }
                if slip.len() > 1 {
                    if let Some(odds) = slip.combined_american_odds() {
                        writeln!(out, "  Parlay of {} legs: {:+}", slip.len(), odds)?;
                    }
                }
            }
        }
        None => writeln!(out, "\n{}", payload.raw_text)?,
    }

    if !payload.sources.is_empty() {
        writeln!(out, "\nSources:")?;
        for source in &payload.sources {
            writeln!(out, "  {} <{}>", source.title, source.uri)?;
        }
    }
    Ok(())
}
