//! Command-line surface and dispatch.
//!
//! Every command writes its result to `out` and finishes with the storage
//! status line, so a user always sees whether the shared tier is in use.

mod cache;
mod research;
mod schedule;

pub use research::research;
pub use schedule::{schedule, CURRENT_WEEK_KEY};

use std::io::Write;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use parlay_core::Namespace;
use parlay_llm::AnalysisClient;
use parlay_storage::StorageService;

use crate::error::CliResult;

#[derive(Debug, Parser)]
#[command(name = "parlay", version, about = "NFL matchup research with a tiered cache")]
pub struct Cli {
    /// Path to the TOML configuration file.
    #[arg(long, env = "PARLAY_CONFIG")]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Show a week's schedule, fetching it when not cached
    Schedule {
        /// Week label, e.g. "Week 12". Defaults to the current week.
        week: Option<String>,
        /// Ignore cached data and fetch again
        #[arg(long)]
        refresh: bool,
    },

    /// Show the deep analysis for a matchup, fetching it when not cached
    Research {
        away: String,
        home: String,
        #[arg(long)]
        refresh: bool,
    },

    /// List cached ids in a namespace
    Keys { namespace: Namespace },

    /// Entry counts and local usage, for one namespace or all
    Stats { namespace: Option<Namespace> },

    /// Delete expired and unreadable local entries
    Prune { namespace: Namespace },

    /// Delete every local entry of a namespace
    Clear { namespace: Namespace },

    /// Probe the remote tier and re-enable it when reachable
    Verify,
}

/// The collaborators a command runs against.
pub struct Context<'a> {
    pub storage: &'a StorageService,
    pub ai: &'a dyn AnalysisClient,
}

pub async fn dispatch(ctx: &Context<'_>, command: &Command, out: &mut dyn Write) -> CliResult<()> {
    match command {
        Command::Schedule { week, refresh } => {
            schedule(ctx, week.as_deref(), *refresh, out).await?
        }
        Command::Research {
            away,
            home,
            refresh,
        } => research(ctx, away, home, *refresh, out).await?,
        Command::Keys { namespace } => cache::keys(ctx.storage, *namespace, out).await?,
        Command::Stats { namespace } => cache::stats(ctx.storage, *namespace, out).await?,
        Command::Prune { namespace } => cache::prune(ctx.storage, *namespace, out).await?,
        Command::Clear { namespace } => cache::clear(ctx.storage, *namespace, out).await?,
        Command::Verify => cache::verify(ctx.storage, out).await?,
    }

    writeln!(out, "[{}]", ctx.storage.status_label())?;
    Ok(())
}
