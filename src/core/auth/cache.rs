use std::collections::HashMap;
use std::sync::Mutex;
use uuid::Uuid;

use crate::core::error::Result;
use crate::models::BucketKeyRecord;

/// In-memory map from tenant identity to issued client id.
///
/// This is a read-mostly cache used only for token validation. It is never
/// the source of truth: it is rebuilt from the database on startup and
/// refreshed on every sync cycle. Entries are never evicted — bucket
/// deletion is out of scope, so a stale entry can only belong to a tenant
/// that no longer receives writes.
#[derive(Default)]
pub struct CredentialCache {
    entries: Mutex<HashMap<(String, String), Uuid>>,
}

impl CredentialCache {
    /// Create a new empty CredentialCache
    pub fn new() -> Self {
        Self::default()
    }

    /// Register or refresh the client id for a bucket
    pub fn insert(&self, app_name: &str, bucket_name: &str, client_id: Uuid) -> Result<()> {
        let mut entries = self.entries.lock()?;
        entries.insert((app_name.to_string(), bucket_name.to_string()), client_id);
        Ok(())
    }

    /// Look up the client id registered for a bucket
    pub fn get(&self, app_name: &str, bucket_name: &str) -> Result<Option<Uuid>> {
        let entries = self.entries.lock()?;
        Ok(entries
            .get(&(app_name.to_string(), bucket_name.to_string()))
            .copied())
    }

    /// Check that a bucket is known and registered to the given client id
    pub fn matches(&self, app_name: &str, bucket_name: &str, client_id: Uuid) -> Result<bool> {
        Ok(self.get(app_name, bucket_name)? == Some(client_id))
    }

    /// Refresh the cache from authoritative bucket key rows.
    ///
    /// Every row's entry is (re)written unconditionally; entries for tenants
    /// absent from `records` are left in place.
    pub fn refresh_from(&self, records: &[BucketKeyRecord]) -> Result<()> {
        let mut entries = self.entries.lock()?;
        for record in records {
            entries.insert(
                (record.app_name.clone(), record.bucket_name.clone()),
                record.client_id,
            );
        }
        Ok(())
    }

    /// Number of cached tenants
    pub fn len(&self) -> Result<usize> {
        Ok(self.entries.lock()?.len())
    }

    /// Whether the cache holds no entries
    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }
}
