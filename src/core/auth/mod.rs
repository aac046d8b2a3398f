pub mod cache;
pub mod policy;
pub mod token;

pub use cache::CredentialCache;
pub use policy::PolicyStore;
pub use token::{TokenService, DEFAULT_TOKEN_TTL};

use std::sync::Arc;
use uuid::Uuid;

use crate::core::error::{Result, ServiceError};

// Uniform failure message: callers must not be able to tell a missing
// bucket from a wrong credential.
const INVALID_TOKEN: &str = "Invalid token or scope";

/// Bucket-scoped authentication and authorization gates.
///
/// Token validation and IP allow-listing are independent checks; a request
/// must pass both before it reaches the secret store or bucket manager.
pub struct AccessControl {
    tokens: TokenService,
    cache: Arc<CredentialCache>,
    policies: PolicyStore,
}

impl AccessControl {
    /// Create a new AccessControl over the shared credential cache
    pub fn new(tokens: TokenService, cache: Arc<CredentialCache>, policies: PolicyStore) -> Self {
        Self {
            tokens,
            cache,
            policies,
        }
    }

    /// Issue a token for a client that presents the correct
    /// `(app_name, bucket_name, client_id)` triple.
    pub fn issue_token(
        &self,
        app_name: &str,
        bucket_name: &str,
        client_id: Uuid,
    ) -> Result<String> {
        if !self.cache.matches(app_name, bucket_name, client_id)? {
            tracing::warn!(app_name, bucket_name, "Rejected token request");
            return Err(ServiceError::AuthError(INVALID_TOKEN.to_string()));
        }

        self.tokens.issue(app_name, bucket_name, client_id)
    }

    /// Validate a bearer token against a target bucket scope.
    ///
    /// The token must decode with a valid signature and expiry, its claims
    /// must name the target bucket, and the credential cache must hold a
    /// matching client id for that bucket. A cache miss or mismatch is a
    /// validation failure, not an internal error.
    pub fn verify_token(&self, token: &str, app_name: &str, bucket_name: &str) -> Result<Uuid> {
        let claims = self.tokens.decode(token)?;

        if claims.app_name != app_name || claims.bucket_name != bucket_name {
            tracing::warn!(
                app_name,
                bucket_name,
                token_scope = %format!("{}/{}", claims.app_name, claims.bucket_name),
                "Token presented against wrong bucket scope"
            );
            return Err(ServiceError::AuthError(INVALID_TOKEN.to_string()));
        }

        if !self.cache.matches(app_name, bucket_name, claims.client_id)? {
            return Err(ServiceError::AuthError(INVALID_TOKEN.to_string()));
        }

        Ok(claims.client_id)
    }

    /// Check the caller's address against the bucket's allow-list
    pub fn enforce_ip(&self, app_name: &str, bucket_name: &str, ip: &str) -> Result<()> {
        if self.policies.is_ip_allowed(app_name, bucket_name, ip) {
            Ok(())
        } else {
            tracing::warn!(app_name, bucket_name, ip, "Unauthorized IP address attempt");
            Err(ServiceError::AuthError("Unauthorized IP address".to_string()))
        }
    }

    /// Combined gate: token validation and IP allow-listing must both pass
    pub fn authorize(
        &self,
        token: &str,
        app_name: &str,
        bucket_name: &str,
        ip: &str,
    ) -> Result<Uuid> {
        let client_id = self.verify_token(token, app_name, bucket_name)?;
        self.enforce_ip(app_name, bucket_name, ip)?;
        Ok(client_id)
    }
}
