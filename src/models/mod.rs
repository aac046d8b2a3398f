// Models for the AmethystKey secret store
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A bucket's key material row, as persisted in the `bucket_keys` table.
///
/// `key_blob` is the opaque concatenation of the bucket's 32-byte encryption
/// key and its 16-byte derivation salt, created once when the bucket is
/// created and immutable afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BucketKeyRecord {
    pub app_name: String,
    pub bucket_name: String,
    pub key_blob: Vec<u8>,
    pub client_id: Uuid,
}

/// An encrypted secret row, as persisted in the `secrets` table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecretRecord {
    pub app_name: String,
    pub bucket_name: String,
    pub secret_name: String,
    pub ciphertext: Vec<u8>,
}

/// Per-bucket access policy, supplied by configuration rather than the
/// database. The sentinel `"ANY"` in `allowed_ips` disables the IP check.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BucketPolicy {
    pub allowed_ips: Vec<String>,
    pub owner_email: String,
}

/// Claims carried by a bucket-scoped bearer token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenClaims {
    pub app_name: String,
    pub bucket_name: String,
    pub client_id: Uuid,
    /// Expiration timestamp (seconds since epoch)
    pub exp: u64,
}
