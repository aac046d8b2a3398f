use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

use crate::core::auth::CredentialCache;
use crate::core::error::Result;
use crate::core::storage::mirror::SecretsMirror;
use crate::core::storage::RepositoryInstance;

/// Default reconciliation interval: 10 minutes
pub const DEFAULT_SYNC_INTERVAL: Duration = Duration::from_secs(600);

/// Background reconciliation engine.
///
/// Each cycle re-pulls bucket keys and secrets from the authoritative store
/// and heals the local mirror and credential cache: key and secret files
/// are written only if absent (local state wins for files that exist), and
/// cache entries are refreshed unconditionally. Cycles are idempotent, so a
/// failed cycle needs no rollback — the next one retries from scratch.
pub struct SyncService {
    repository: RepositoryInstance,
    mirror: Arc<SecretsMirror>,
    cache: Arc<CredentialCache>,
    // Held for the duration of a cycle; a trigger that finds it taken is
    // skipped rather than queued.
    cycle_lock: Mutex<()>,
}

impl SyncService {
    /// Create a new SyncService
    pub fn new(
        repository: RepositoryInstance,
        mirror: Arc<SecretsMirror>,
        cache: Arc<CredentialCache>,
    ) -> Self {
        Self {
            repository,
            mirror,
            cache,
            cycle_lock: Mutex::new(()),
        }
    }

    /// Run one reconciliation cycle.
    ///
    /// This is the first-class repair path: callers can invoke it directly
    /// after a suspected divergence instead of waiting for the timer.
    /// Returns `Ok(false)` if another cycle was already in progress and
    /// this trigger was skipped.
    pub async fn sync_once(&self) -> Result<bool> {
        let _guard = match self.cycle_lock.try_lock() {
            Ok(guard) => guard,
            Err(_) => {
                tracing::debug!("Sync cycle already in progress, skipping trigger");
                return Ok(false);
            }
        };

        self.sync_keys_and_cache().await?;
        self.sync_secrets().await?;

        Ok(true)
    }

    /// Run the reconciliation loop on a fixed interval.
    ///
    /// Per-cycle errors are logged and discarded; the loop never exits on
    /// its own.
    pub async fn run(self: Arc<Self>, interval: Duration) {
        let mut ticker = tokio::time::interval(interval);
        loop {
            ticker.tick().await;
            tracing::info!("Syncing buckets, keys and secrets from database");
            if let Err(e) = self.sync_once().await {
                tracing::error!(error = %e, "Sync cycle aborted");
            }
        }
    }

    // Write missing key files, then refresh the credential cache. Key files
    // land before their cache entries, so a request handler that sees a
    // cache entry can also read the key.
    async fn sync_keys_and_cache(&self) -> Result<()> {
        let records = self.repository.fetch_bucket_keys().await?;

        for record in &records {
            let written = self
                .mirror
                .write_key_blob_if_absent(&record.app_name, &record.bucket_name, &record.key_blob)
                .await?;
            if written {
                tracing::info!(
                    app_name = %record.app_name,
                    bucket_name = %record.bucket_name,
                    "Restored missing bucket key file from database"
                );
            }
        }

        self.cache.refresh_from(&records)?;

        Ok(())
    }

    // Write missing secret files; existing files are never overwritten.
    async fn sync_secrets(&self) -> Result<()> {
        let records = self.repository.fetch_secrets().await?;

        for record in &records {
            let written = self
                .mirror
                .write_secret_if_absent(
                    &record.app_name,
                    &record.bucket_name,
                    &record.secret_name,
                    &record.ciphertext,
                )
                .await?;
            if written {
                tracing::info!(
                    app_name = %record.app_name,
                    bucket_name = %record.bucket_name,
                    secret_name = %record.secret_name,
                    "Restored missing secret file from database"
                );
            }
        }

        Ok(())
    }
}
