use std::sync::Arc;
use uuid::Uuid;
use zeroize::Zeroize;

use crate::core::auth::CredentialCache;
use crate::core::crypto::{self, KEY_SIZE, SALT_SIZE};
use crate::core::error::{Result, ServiceError};
use crate::core::storage::mirror::SecretsMirror;
use crate::core::storage::RepositoryInstance;
use crate::models::BucketKeyRecord;

/// A bucket's decoded key material, zeroed on drop
pub struct KeyMaterial {
    pub key: Vec<u8>,
    pub salt: Vec<u8>,
}

impl KeyMaterial {
    fn from_blob(app_name: &str, bucket_name: &str, blob: &[u8]) -> Result<Self> {
        if blob.len() != KEY_SIZE + SALT_SIZE {
            return Err(ServiceError::DecryptionError(format!(
                "Key blob for bucket '{}/{}' has unexpected length {}",
                app_name,
                bucket_name,
                blob.len()
            )));
        }

        let (key, salt) = blob.split_at(KEY_SIZE);
        Ok(Self {
            key: key.to_vec(),
            salt: salt.to_vec(),
        })
    }
}

impl Drop for KeyMaterial {
    fn drop(&mut self) {
        self.key.zeroize();
        self.salt.zeroize();
    }
}

/// Manages tenant buckets and their encryption key material.
///
/// Bucket creation is a two-phase write: the key blob is persisted to the
/// database first (the durable copy), then mirrored to the local key file
/// and registered in the credential cache. A mirror failure leaves the
/// bucket half-created on disk; reconciliation repairs it from the database.
pub struct BucketService {
    repository: RepositoryInstance,
    mirror: Arc<SecretsMirror>,
    cache: Arc<CredentialCache>,
}

impl BucketService {
    /// Create a new BucketService
    pub fn new(
        repository: RepositoryInstance,
        mirror: Arc<SecretsMirror>,
        cache: Arc<CredentialCache>,
    ) -> Self {
        Self {
            repository,
            mirror,
            cache,
        }
    }

    /// Create a bucket and issue its client identity.
    ///
    /// Fails with `BucketExists` if the bucket is already present. On
    /// success the bucket holds a freshly generated key and salt, combined
    /// into one opaque blob that lives in the database row and the local
    /// `secret.key` file.
    pub async fn create_bucket(&self, app_name: &str, bucket_name: &str) -> Result<Uuid> {
        if self.mirror.bucket_exists(app_name, bucket_name) {
            return Err(ServiceError::BucketExists(format!(
                "{}/{}",
                app_name, bucket_name
            )));
        }

        let key = crypto::generate_key()?;
        let salt = crypto::generate_salt()?;
        let mut key_blob = Vec::with_capacity(KEY_SIZE + SALT_SIZE);
        key_blob.extend_from_slice(&key);
        key_blob.extend_from_slice(&salt);

        let client_id = Uuid::new_v4();
        let record = BucketKeyRecord {
            app_name: app_name.to_string(),
            bucket_name: bucket_name.to_string(),
            key_blob: key_blob.clone(),
            client_id,
        };

        // Durable write first; the mirror and cache follow.
        self.repository.insert_bucket_key(&record).await?;

        if let Err(e) = self
            .mirror
            .write_key_blob(app_name, bucket_name, &key_blob)
            .await
        {
            // The database row exists, so the next reconciliation cycle
            // will rebuild the key file and cache entry.
            tracing::error!(
                app_name,
                bucket_name,
                error = %e,
                "Bucket key mirrored to database but local key file write failed"
            );
            return Err(ServiceError::BucketCreation(format!(
                "{}/{}: local key file write failed",
                app_name, bucket_name
            )));
        }

        self.cache.insert(app_name, bucket_name, client_id)?;

        tracing::info!(app_name, bucket_name, %client_id, "Created bucket");
        Ok(client_id)
    }

    /// Fast-path existence check against the local mirror only
    pub fn bucket_exists(&self, app_name: &str, bucket_name: &str) -> bool {
        self.mirror.bucket_exists(app_name, bucket_name)
    }

    /// Enumerate all `(app_name, bucket_name)` pairs from the mirror
    pub async fn list_buckets(&self) -> Result<Vec<(String, String)>> {
        self.mirror.list_buckets().await
    }

    /// Enumerate bucket names under one app namespace
    pub async fn list_buckets_for_app(&self, app_name: &str) -> Result<Vec<String>> {
        self.mirror.list_buckets_for_app(app_name).await
    }

    /// Read and split a bucket's key material from the local key file.
    ///
    /// Encryption operations always read here rather than round-tripping to
    /// the database.
    pub async fn load_key_material(&self, app_name: &str, bucket_name: &str) -> Result<KeyMaterial> {
        let blob = self.mirror.read_key_blob(app_name, bucket_name).await?;
        KeyMaterial::from_blob(app_name, bucket_name, &blob)
    }
}
