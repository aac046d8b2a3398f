use std::sync::Arc;

use crate::core::crypto;
use crate::core::error::{Result, ServiceError};
use crate::core::storage::mirror::SecretsMirror;
use crate::core::storage::RepositoryInstance;
use crate::models::SecretRecord;
use crate::service::bucket_service::BucketService;

/// Encrypts, stores, and serves named secrets under a bucket.
///
/// Writes go to the database first (authoritative, durable) and then to the
/// local file mirror; reads come from the mirror only. A secret visible in
/// the database but not yet mirrored locally becomes readable after the
/// next reconciliation cycle.
pub struct SecretService {
    repository: RepositoryInstance,
    mirror: Arc<SecretsMirror>,
    buckets: Arc<BucketService>,
}

impl SecretService {
    /// Create a new SecretService
    pub fn new(
        repository: RepositoryInstance,
        mirror: Arc<SecretsMirror>,
        buckets: Arc<BucketService>,
    ) -> Self {
        Self {
            repository,
            mirror,
            buckets,
        }
    }

    /// Store a new named secret.
    ///
    /// Fails with `BucketNotFound` if the bucket is absent and with
    /// `SecretExists` if the name is already taken — creation is not
    /// idempotent; callers wanting overwrite semantics use [`Self::update`].
    pub async fn store(
        &self,
        app_name: &str,
        bucket_name: &str,
        secret_name: &str,
        plaintext: &str,
    ) -> Result<()> {
        if !self.mirror.bucket_exists(app_name, bucket_name) {
            return Err(ServiceError::BucketNotFound(format!(
                "{}/{}",
                app_name, bucket_name
            )));
        }
        if self.mirror.secret_exists(app_name, bucket_name, secret_name) {
            return Err(ServiceError::SecretExists(format!(
                "{}/{}/{}",
                app_name, bucket_name, secret_name
            )));
        }

        let material = self.buckets.load_key_material(app_name, bucket_name).await?;
        let ciphertext = crypto::encrypt(plaintext.as_bytes(), &material.salt)?;

        let record = SecretRecord {
            app_name: app_name.to_string(),
            bucket_name: bucket_name.to_string(),
            secret_name: secret_name.to_string(),
            ciphertext: ciphertext.clone(),
        };
        self.repository.upsert_secret(&record).await?;
        self.mirror
            .write_secret(app_name, bucket_name, secret_name, &ciphertext)
            .await?;

        tracing::info!(app_name, bucket_name, secret_name, "Stored secret");
        Ok(())
    }

    /// Generate a random secret value and store it under the given name.
    ///
    /// Same preconditions as [`Self::store`]. Returns the generated
    /// plaintext so it can be handed to the requester once.
    pub async fn generate_and_store(
        &self,
        app_name: &str,
        bucket_name: &str,
        secret_name: &str,
        length: usize,
    ) -> Result<String> {
        let plaintext = crypto::generate_password(length)?;
        self.store(app_name, bucket_name, secret_name, &plaintext)
            .await?;
        Ok(plaintext)
    }

    /// Decrypt and return a secret, reading ciphertext from the local mirror
    pub async fn retrieve(
        &self,
        app_name: &str,
        bucket_name: &str,
        secret_name: &str,
    ) -> Result<String> {
        if !self.mirror.secret_exists(app_name, bucket_name, secret_name) {
            return Err(ServiceError::SecretNotFound(format!(
                "{}/{}/{}",
                app_name, bucket_name, secret_name
            )));
        }

        let material = self.buckets.load_key_material(app_name, bucket_name).await?;
        let ciphertext = self
            .mirror
            .read_secret(app_name, bucket_name, secret_name)
            .await?;
        let plaintext = crypto::decrypt(&ciphertext, &material.salt)?;

        String::from_utf8(plaintext).map_err(|e| {
            ServiceError::DecryptionError(format!("Decrypted secret is not valid UTF-8: {}", e))
        })
    }

    /// Re-encrypt an existing secret with new contents.
    ///
    /// Fails with `SecretNotFound` if the secret does not exist.
    pub async fn update(
        &self,
        app_name: &str,
        bucket_name: &str,
        secret_name: &str,
        new_plaintext: &str,
    ) -> Result<()> {
        if !self.mirror.secret_exists(app_name, bucket_name, secret_name) {
            return Err(ServiceError::SecretNotFound(format!(
                "{}/{}/{}",
                app_name, bucket_name, secret_name
            )));
        }

        let material = self.buckets.load_key_material(app_name, bucket_name).await?;
        let ciphertext = crypto::encrypt(new_plaintext.as_bytes(), &material.salt)?;

        self.repository
            .update_secret(app_name, bucket_name, secret_name, &ciphertext)
            .await?;
        self.mirror
            .write_secret(app_name, bucket_name, secret_name, &ciphertext)
            .await?;

        tracing::info!(app_name, bucket_name, secret_name, "Updated secret");
        Ok(())
    }

    /// Delete a secret: database row first, then the local file.
    ///
    /// Fails with `SecretNotFound` if the secret does not exist. If the
    /// file deletion fails after the row is gone the two stores diverge
    /// until the next reconciliation; the divergence is logged.
    pub async fn delete(
        &self,
        app_name: &str,
        bucket_name: &str,
        secret_name: &str,
    ) -> Result<()> {
        if !self.mirror.secret_exists(app_name, bucket_name, secret_name) {
            return Err(ServiceError::SecretNotFound(format!(
                "{}/{}/{}",
                app_name, bucket_name, secret_name
            )));
        }

        self.repository
            .delete_secret(app_name, bucket_name, secret_name)
            .await?;

        if let Err(e) = self
            .mirror
            .delete_secret(app_name, bucket_name, secret_name)
            .await
        {
            tracing::warn!(
                app_name,
                bucket_name,
                secret_name,
                error = %e,
                "Database row deleted but local secret file removal failed; stores diverge until next sync"
            );
            return Err(e);
        }

        tracing::info!(app_name, bucket_name, secret_name, "Deleted secret");
        Ok(())
    }

    /// Enumerate secret names from the bucket's local files
    pub async fn list_secrets(&self, app_name: &str, bucket_name: &str) -> Result<Vec<String>> {
        self.mirror.list_secrets(app_name, bucket_name).await
    }

    /// Check whether a secret's local file exists
    pub fn secret_exists(&self, app_name: &str, bucket_name: &str, secret_name: &str) -> bool {
        self.mirror.secret_exists(app_name, bucket_name, secret_name)
    }
}
