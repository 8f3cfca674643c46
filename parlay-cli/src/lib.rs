//! Parlay CLI
//!
//! Wires the tiered storage service and the AI research client together
//! behind a small command set. The binary entry point lives in `main.rs`;
//! everything here is a library so commands can be driven from tests with
//! in-memory tiers and a scripted AI client.

pub mod commands;
pub mod config;
pub mod error;
pub mod telemetry;

use std::sync::Arc;

use parlay_llm::{AnalysisClient, GeminiClient};
use parlay_storage::{LmdbLocalStore, RemoteStore, RestRemoteStore, StorageService};
use tracing::info;

use crate::commands::{dispatch, Cli, Context};
use crate::config::CliConfig;
use crate::error::CliResult;

/// Long-lived collaborators built from a [`CliConfig`].
pub struct App {
    pub storage: StorageService,
    pub ai: Box<dyn AnalysisClient>,
}

impl App {
    pub fn from_config(config: &CliConfig) -> CliResult<Self> {
        let local = LmdbLocalStore::open(&config.local_store_path, config.local_store_max_mb)?;

        let remote = config.remote.as_ref().map(|section| {
            Arc::new(RestRemoteStore::new(&section.url, &section.api_key)) as Arc<dyn RemoteStore>
        });

        let storage = StorageService::new(Arc::new(local), remote, config.storage_config());

        let mut ai = GeminiClient::from_env();
        if let Some(section) = &config.ai {
            if let Some(key) = &section.api_key {
                ai = ai.with_api_key(key.as_str());
            }
            if let Some(model) = &section.model {
                ai = ai.with_model(model.as_str());
            }
        }

        info!(
            local_store = %config.local_store_path.display(),
            remote = config.remote.is_some(),
            model = ai.model(),
            "Parlay initialized"
        );

        Ok(Self {
            storage,
            ai: Box::new(ai),
        })
    }

    pub fn context(&self) -> Context<'_> {
        Context {
            storage: &self.storage,
            ai: self.ai.as_ref(),
        }
    }
}

/// Load configuration, build the app and run one command against stdout.
pub async fn run(cli: Cli) -> CliResult<()> {
    let config = CliConfig::load(&cli.config)?;
    let app = App::from_config(&config)?;

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    dispatch(&app.context(), &cli.command, &mut out).await
}
