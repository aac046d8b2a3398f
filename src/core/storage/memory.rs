use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use crate::core::error::{Result, ServiceError};
use crate::core::storage::SecretsRepository;
use crate::models::{BucketKeyRecord, SecretRecord};

/// In-memory repository, used for tests and when `USE_MEMORY_STORAGE` is set.
///
/// Mirrors the relational constraints: unique `(app_name, bucket_name)` for
/// bucket keys and unique `(app_name, bucket_name, secret_name)` for secrets.
#[derive(Default)]
pub struct MemoryRepository {
    bucket_keys: Mutex<BTreeMap<(String, String), BucketKeyRecord>>,
    secrets: Mutex<BTreeMap<(String, String, String), Vec<u8>>>,
}

impl MemoryRepository {
    /// Create a new empty MemoryRepository
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SecretsRepository for MemoryRepository {
    async fn insert_bucket_key(&self, record: &BucketKeyRecord) -> Result<()> {
        let mut bucket_keys = self.bucket_keys.lock()?;

        let key = (record.app_name.clone(), record.bucket_name.clone());
        if bucket_keys.contains_key(&key) {
            return Err(ServiceError::BucketExists(format!(
                "{}/{}",
                record.app_name, record.bucket_name
            )));
        }

        bucket_keys.insert(key, record.clone());
        Ok(())
    }

    async fn fetch_bucket_keys(&self) -> Result<Vec<BucketKeyRecord>> {
        let bucket_keys = self.bucket_keys.lock()?;
        Ok(bucket_keys.values().cloned().collect())
    }

    async fn upsert_secret(&self, record: &SecretRecord) -> Result<()> {
        let mut secrets = self.secrets.lock()?;
        secrets.insert(
            (
                record.app_name.clone(),
                record.bucket_name.clone(),
                record.secret_name.clone(),
            ),
            record.ciphertext.clone(),
        );
        Ok(())
    }

    async fn update_secret(
        &self,
        app_name: &str,
        bucket_name: &str,
        secret_name: &str,
        ciphertext: &[u8],
    ) -> Result<()> {
        let mut secrets = self.secrets.lock()?;

        let key = (
            app_name.to_string(),
            bucket_name.to_string(),
            secret_name.to_string(),
        );
        match secrets.get_mut(&key) {
            Some(stored) => {
                *stored = ciphertext.to_vec();
                Ok(())
            }
            None => Err(ServiceError::SecretNotFound(format!(
                "{}/{}/{}",
                app_name, bucket_name, secret_name
            ))),
        }
    }

    async fn delete_secret(
        &self,
        app_name: &str,
        bucket_name: &str,
        secret_name: &str,
    ) -> Result<()> {
        let mut secrets = self.secrets.lock()?;
        secrets.remove(&(
            app_name.to_string(),
            bucket_name.to_string(),
            secret_name.to_string(),
        ));
        Ok(())
    }

    async fn fetch_secrets(&self) -> Result<Vec<SecretRecord>> {
        let secrets = self.secrets.lock()?;
        Ok(secrets
            .iter()
            .map(|((app_name, bucket_name, secret_name), ciphertext)| SecretRecord {
                app_name: app_name.clone(),
                bucket_name: bucket_name.clone(),
                secret_name: secret_name.clone(),
                ciphertext: ciphertext.clone(),
            })
            .collect())
    }
}

/// Factory function matching the Postgres counterpart
pub fn create_memory_repository() -> Arc<MemoryRepository> {
    Arc::new(MemoryRepository::new())
}
