//! CLI command definitions and dispatch.

pub mod file;
pub mod folder;

use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing::info;

use assethub_core::config::AppConfig;
use assethub_core::error::AppError;
use assethub_core::result::AppResult;
use assethub_database::{AssetStore, DatabasePool};
use assethub_index::{AssetIndex, FolderIndex};
use assethub_service::{AssetService, Collaborators};
use assethub_storage::BackendRegistry;

use crate::output::OutputFormat;

/// AssetHub: pluggable asset storage and indexing
#[derive(Debug, Parser)]
#[command(name = "assethub", version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/default.toml")]
    pub config: String,

    /// Configuration overlay to merge (`config/{env}.toml`)
    #[arg(long, env = "ASSETHUB_ENV", default_value = "development")]
    pub env: String,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    pub format: OutputFormat,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Folder management
    Folder(folder::FolderArgs),
    /// File management
    File(file::FileArgs),
}

impl Cli {
    pub fn load_config(&self) -> AppResult<AppConfig> {
        AppConfig::load(&self.config, &self.env)
    }

    /// Execute the CLI command
    pub async fn execute(&self, config: AppConfig) -> AppResult<()> {
        let service = build_service(&config).await?;
        match &self.command {
            Commands::Folder(args) => folder::execute(args, &service, self.format).await,
            Commands::File(args) => file::execute(args, &service, self.format).await,
        }
    }
}

/// Connect to the database and assemble the asset service.
pub async fn build_service(config: &AppConfig) -> AppResult<AssetService> {
    info!("Connecting to database...");
    let pool = DatabasePool::connect_and_migrate(&config.database).await?;
    let store: Arc<dyn AssetStore> = Arc::new(pool.store());

    let folders = FolderIndex::new(store.clone(), &config.index);
    let assets = AssetIndex::new(store);

    let registry = BackendRegistry::from_config(&config.storage, &folders, &assets).await?;
    if registry.ids().is_empty() {
        return Err(AppError::configuration("No storage backends are configured"));
    }
    registry.ensure_root_folders().await?;
    info!(backends = registry.ids().len(), "Storage backends ready");

    Ok(AssetService::new(
        Arc::new(registry),
        folders,
        assets,
        Collaborators::default(),
        &config.storage,
        &config.transforms,
    ))
}
