pub mod memory;
pub mod mirror;
pub mod postgres;

use async_trait::async_trait;
use std::sync::Arc;

use crate::core::error::Result;
use crate::models::{BucketKeyRecord, SecretRecord};

/// Authoritative persistence for bucket keys and encrypted secrets.
///
/// The database is the durable write path; the local file mirror (see
/// [`mirror::SecretsMirror`]) is the read path that reconciliation rebuilds
/// from these rows.
#[async_trait]
pub trait SecretsRepository: Send + Sync {
    /// Insert a newly created bucket's key material.
    ///
    /// Fails with `BucketExists` if a row for the same
    /// `(app_name, bucket_name)` is already present.
    async fn insert_bucket_key(&self, record: &BucketKeyRecord) -> Result<()>;

    /// Fetch every bucket key row
    async fn fetch_bucket_keys(&self) -> Result<Vec<BucketKeyRecord>>;

    /// Insert or overwrite a secret row
    async fn upsert_secret(&self, record: &SecretRecord) -> Result<()>;

    /// Overwrite an existing secret row's ciphertext
    async fn update_secret(
        &self,
        app_name: &str,
        bucket_name: &str,
        secret_name: &str,
        ciphertext: &[u8],
    ) -> Result<()>;

    /// Delete a secret row
    async fn delete_secret(&self, app_name: &str, bucket_name: &str, secret_name: &str)
        -> Result<()>;

    /// Fetch every secret row
    async fn fetch_secrets(&self) -> Result<Vec<SecretRecord>>;
}

/// Type alias for repository instances shared across services
pub type RepositoryInstance = Arc<dyn SecretsRepository>;
