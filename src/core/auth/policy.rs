use std::collections::HashMap;
use std::path::Path;
use tokio::fs;

use crate::core::error::{Result, ServiceError};
use crate::models::BucketPolicy;

/// Sentinel value that disables the IP allow-list for a bucket
const ANY_IP: &str = "ANY";

/// Configuration-supplied bucket policies, keyed by app then bucket.
///
/// The policy file is a JSON object of the form
/// `{"app_name": {"bucket_name": {"allowed_ips": [...], "owner_email": "..."}}}`.
#[derive(Debug, Default)]
pub struct PolicyStore {
    policies: HashMap<String, HashMap<String, BucketPolicy>>,
}

impl PolicyStore {
    /// Create an empty PolicyStore (all requests IP-denied)
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a PolicyStore from its JSON representation
    pub fn from_json(json: &str) -> Result<Self> {
        let policies = serde_json::from_str(json).map_err(|e| {
            ServiceError::ConfigError(format!("Invalid bucket policy config: {}", e))
        })?;
        Ok(Self { policies })
    }

    /// Load a PolicyStore from a JSON file
    pub async fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path.as_ref()).await.map_err(|e| {
            ServiceError::ConfigError(format!(
                "Failed to read policy file {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;
        Self::from_json(&contents)
    }

    /// Look up the policy for a bucket, if configured
    pub fn lookup(&self, app_name: &str, bucket_name: &str) -> Option<&BucketPolicy> {
        self.policies.get(app_name)?.get(bucket_name)
    }

    /// Check a caller address against the bucket's allow-list.
    ///
    /// `"ANY"` in the list disables the check. A bucket with no configured
    /// policy denies every address.
    pub fn is_ip_allowed(&self, app_name: &str, bucket_name: &str, ip: &str) -> bool {
        match self.lookup(app_name, bucket_name) {
            Some(policy) => {
                policy.allowed_ips.iter().any(|allowed| allowed == ANY_IP)
                    || policy.allowed_ips.iter().any(|allowed| allowed == ip)
            }
            None => false,
        }
    }
}
