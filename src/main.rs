use std::sync::Arc;
use tokio::signal;

use amethystkey::config::AppConfig;
use amethystkey::core::auth::CredentialCache;
use amethystkey::core::error::{Result, ServiceError};
use amethystkey::core::storage::memory::create_memory_repository;
use amethystkey::core::storage::mirror::SecretsMirror;
use amethystkey::core::storage::postgres::create_postgres_repository;
use amethystkey::core::storage::RepositoryInstance;
use amethystkey::service::SyncService;
use amethystkey::{init_logging, AmethystKey};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let config = AppConfig::from_env()?;
    init_logging(&config.log_level);
    config.print_config();

    // Shared state: the local mirror and the credential cache are read by
    // request handlers and written by the sync engine.
    let mirror = Arc::new(SecretsMirror::new(&config.secrets_dir));
    let cache = Arc::new(CredentialCache::new());

    let repository: RepositoryInstance = if config.use_memory_storage {
        tracing::warn!("Using in-memory storage; data will not survive restarts");
        create_memory_repository()
    } else {
        let database_url = config.database_url.as_deref().ok_or_else(|| {
            ServiceError::ConfigError(
                "DATABASE_URL must be set unless USE_MEMORY_STORAGE is enabled".to_string(),
            )
        })?;
        create_postgres_repository(database_url).await?
    };

    let sync_service = Arc::new(SyncService::new(repository, mirror, cache.clone()));

    // Startup reconciliation rebuilds the mirror and credential cache
    // before any request handling begins.
    tracing::info!("Running startup reconciliation");
    sync_service.sync_once().await?;
    tracing::info!(buckets = cache.len()?, "Credential cache initialized");

    let sync_handle = tokio::spawn(sync_service.clone().run(config.sync_interval));

    tracing::info!(version = AmethystKey::version(), "AmethystKey service started");

    signal::ctrl_c().await?;
    tracing::info!("Shutdown signal received, stopping sync engine");
    sync_handle.abort();

    Ok(())
}
