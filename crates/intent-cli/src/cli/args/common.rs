//! Shared argument types used across multiple commands.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::ValueEnum;
use intent_core::{load_checks_dir, CheckEngine, CheckSet, EngineSettings, HttpProvider, ProviderConfig};

#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(clap::Args, Clone, Debug)]
pub struct ChecksArgs {
    /// Directory of check definitions (*.yaml / *.yml)
    #[arg(long, env = "CHECKS_DIR", default_value = "./checks")]
    pub checks_dir: PathBuf,
}

impl ChecksArgs {
    pub fn load(&self) -> anyhow::Result<CheckSet> {
        load_checks_dir(&self.checks_dir)
            .with_context(|| format!("failed to load checks from {}", self.checks_dir.display()))
    }
}

#[derive(clap::Args, Clone, Debug)]
pub struct ProviderArgs {
    /// Base URL of the catalog service
    #[arg(long, env = "CATALOG_BASE_URL", default_value = "http://localhost:8001")]
    pub catalog_url: String,

    /// Base URL of the surface service
    #[arg(long, env = "SURFACE_BASE_URL", default_value = "http://localhost:8002")]
    pub surface_url: String,

    /// Deadline for each provider call, in seconds
    #[arg(
        long,
        env = "INTENT_HTTP_TIMEOUT_SECS",
        default_value_t = 5,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub timeout_secs: u64,

    /// Maximum checks evaluated at once
    #[arg(long, default_value_t = 4)]
    pub concurrency: usize,
}

impl ProviderArgs {
    pub fn provider_config(&self) -> ProviderConfig {
        ProviderConfig::default()
            .with_catalog_url(self.catalog_url.clone())
            .with_surface_url(self.surface_url.clone())
            .with_timeout_secs(self.timeout_secs)
    }

    pub fn engine_settings(&self) -> EngineSettings {
        EngineSettings::default()
            .with_call_timeout(Duration::from_secs(self.timeout_secs))
            .with_max_concurrency(self.concurrency)
    }

    pub fn build_engine(&self) -> anyhow::Result<CheckEngine> {
        let provider =
            HttpProvider::new(self.provider_config()).context("failed to build HTTP provider")?;
        Ok(CheckEngine::new(Arc::new(provider), self.engine_settings()))
    }
}

#[derive(clap::Args, Clone, Debug)]
pub struct StoreArgs {
    /// SQLite database holding result history
    #[arg(long, env = "INTENT_DB", default_value = "intent.db")]
    pub db: PathBuf,
}

impl StoreArgs {
    pub fn open(&self) -> anyhow::Result<intent_store::Store> {
        let store = intent_store::Store::open(&self.db)?;
        store.init_schema()?;
        Ok(store)
    }
}
