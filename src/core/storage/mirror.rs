use std::path::{Path, PathBuf};
use tokio::fs;

use crate::core::error::{Result, ServiceError};

/// Filename of the per-bucket key blob inside its mirror directory
pub const SECRET_KEY_FILE: &str = "secret.key";

/// Extension given to mirrored secret ciphertext files
const SECRET_FILE_EXT: &str = "json";

/// Local filesystem mirror of the authoritative store.
///
/// Layout: `{base}/{app_name}/{bucket_name}/secret.key` holds the bucket's
/// key blob, and `{base}/{app_name}/{bucket_name}/{secret_name}.json` holds
/// each secret's raw ciphertext. The mirror is the fast read path; the
/// database remains the durability backstop, and reconciliation rebuilds
/// missing files from it.
pub struct SecretsMirror {
    base_dir: PathBuf,
}

impl SecretsMirror {
    /// Create a new SecretsMirror rooted at the given directory
    pub fn new<P: AsRef<Path>>(base_dir: P) -> Self {
        Self {
            base_dir: base_dir.as_ref().to_path_buf(),
        }
    }

    /// Directory holding a bucket's key and secret files
    pub fn bucket_dir(&self, app_name: &str, bucket_name: &str) -> PathBuf {
        self.base_dir.join(app_name).join(bucket_name)
    }

    fn key_path(&self, app_name: &str, bucket_name: &str) -> PathBuf {
        self.bucket_dir(app_name, bucket_name).join(SECRET_KEY_FILE)
    }

    fn secret_path(&self, app_name: &str, bucket_name: &str, secret_name: &str) -> PathBuf {
        self.bucket_dir(app_name, bucket_name)
            .join(format!("{}.{}", secret_name, SECRET_FILE_EXT))
    }

    /// Fast-path existence check: a bucket exists if its key file does
    pub fn bucket_exists(&self, app_name: &str, bucket_name: &str) -> bool {
        self.key_path(app_name, bucket_name).exists()
    }

    /// Check whether a secret's ciphertext file exists locally
    pub fn secret_exists(&self, app_name: &str, bucket_name: &str, secret_name: &str) -> bool {
        self.secret_path(app_name, bucket_name, secret_name).exists()
    }

    /// Write a bucket's key blob, creating the bucket directory
    pub async fn write_key_blob(
        &self,
        app_name: &str,
        bucket_name: &str,
        blob: &[u8],
    ) -> Result<()> {
        let path = self.key_path(app_name, bucket_name);
        self.write_file(&path, blob).await
    }

    /// Write a bucket's key blob only if the file is absent.
    ///
    /// Returns `true` if the file was written. Existing files are left
    /// untouched so that local state wins over stale database content.
    pub async fn write_key_blob_if_absent(
        &self,
        app_name: &str,
        bucket_name: &str,
        blob: &[u8],
    ) -> Result<bool> {
        let path = self.key_path(app_name, bucket_name);
        if path.exists() {
            return Ok(false);
        }

        self.write_file(&path, blob).await?;
        Ok(true)
    }

    /// Read a bucket's key blob
    pub async fn read_key_blob(&self, app_name: &str, bucket_name: &str) -> Result<Vec<u8>> {
        let path = self.key_path(app_name, bucket_name);
        if !path.exists() {
            return Err(ServiceError::BucketNotFound(format!(
                "{}/{}",
                app_name, bucket_name
            )));
        }

        fs::read(&path).await.map_err(|e| {
            ServiceError::StoreUnavailable(format!(
                "Failed to read key file {}: {}",
                path.display(),
                e
            ))
        })
    }

    /// Write a secret's ciphertext, creating directories as needed
    pub async fn write_secret(
        &self,
        app_name: &str,
        bucket_name: &str,
        secret_name: &str,
        ciphertext: &[u8],
    ) -> Result<()> {
        let path = self.secret_path(app_name, bucket_name, secret_name);
        self.write_file(&path, ciphertext).await
    }

    /// Write a secret's ciphertext only if the file is absent.
    ///
    /// Returns `true` if the file was written.
    pub async fn write_secret_if_absent(
        &self,
        app_name: &str,
        bucket_name: &str,
        secret_name: &str,
        ciphertext: &[u8],
    ) -> Result<bool> {
        let path = self.secret_path(app_name, bucket_name, secret_name);
        if path.exists() {
            return Ok(false);
        }

        self.write_file(&path, ciphertext).await?;
        Ok(true)
    }

    /// Read a secret's ciphertext
    pub async fn read_secret(
        &self,
        app_name: &str,
        bucket_name: &str,
        secret_name: &str,
    ) -> Result<Vec<u8>> {
        let path = self.secret_path(app_name, bucket_name, secret_name);
        if !path.exists() {
            return Err(ServiceError::SecretNotFound(format!(
                "{}/{}/{}",
                app_name, bucket_name, secret_name
            )));
        }

        fs::read(&path).await.map_err(|e| {
            ServiceError::StoreUnavailable(format!(
                "Failed to read secret file {}: {}",
                path.display(),
                e
            ))
        })
    }

    /// Delete a secret's ciphertext file if present
    pub async fn delete_secret(
        &self,
        app_name: &str,
        bucket_name: &str,
        secret_name: &str,
    ) -> Result<()> {
        let path = self.secret_path(app_name, bucket_name, secret_name);
        if path.exists() {
            fs::remove_file(&path).await.map_err(|e| {
                ServiceError::StoreUnavailable(format!(
                    "Failed to delete secret file {}: {}",
                    path.display(),
                    e
                ))
            })?;
        }

        Ok(())
    }

    /// Enumerate all `(app_name, bucket_name)` pairs present in the mirror
    pub async fn list_buckets(&self) -> Result<Vec<(String, String)>> {
        let mut buckets = Vec::new();
        for app_name in self.list_dirs(&self.base_dir).await? {
            let app_dir = self.base_dir.join(&app_name);
            for bucket_name in self.list_dirs(&app_dir).await? {
                buckets.push((app_name.clone(), bucket_name));
            }
        }

        Ok(buckets)
    }

    /// Enumerate bucket names under a single app namespace
    pub async fn list_buckets_for_app(&self, app_name: &str) -> Result<Vec<String>> {
        self.list_dirs(&self.base_dir.join(app_name)).await
    }

    /// Enumerate secret names in a bucket from its local `.json` files
    pub async fn list_secrets(&self, app_name: &str, bucket_name: &str) -> Result<Vec<String>> {
        let dir = self.bucket_dir(app_name, bucket_name);
        if !dir.exists() {
            return Ok(Vec::new());
        }

        let mut entries = fs::read_dir(&dir).await.map_err(|e| {
            ServiceError::StoreUnavailable(format!("Failed to read directory: {}", e))
        })?;

        let mut names = Vec::new();
        while let Some(entry) = entries.next_entry().await.map_err(|e| {
            ServiceError::StoreUnavailable(format!("Failed to read directory entry: {}", e))
        })? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) == Some(SECRET_FILE_EXT) {
                if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                    names.push(stem.to_string());
                }
            }
        }

        names.sort();
        Ok(names)
    }

    async fn list_dirs(&self, dir: &Path) -> Result<Vec<String>> {
        if !dir.exists() {
            return Ok(Vec::new());
        }

        let mut entries = fs::read_dir(dir).await.map_err(|e| {
            ServiceError::StoreUnavailable(format!("Failed to read directory: {}", e))
        })?;

        let mut names = Vec::new();
        while let Some(entry) = entries.next_entry().await.map_err(|e| {
            ServiceError::StoreUnavailable(format!("Failed to read directory entry: {}", e))
        })? {
            if entry.file_type().await.map(|t| t.is_dir()).unwrap_or(false) {
                if let Ok(name) = entry.file_name().into_string() {
                    names.push(name);
                }
            }
        }

        names.sort();
        Ok(names)
    }

    async fn write_file(&self, path: &Path, data: &[u8]) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await.map_err(|e| {
                ServiceError::StoreUnavailable(format!("Failed to create directory: {}", e))
            })?;
        }

        fs::write(path, data).await.map_err(|e| {
            ServiceError::StoreUnavailable(format!(
                "Failed to write file {}: {}",
                path.display(),
                e
            ))
        })
    }
}
