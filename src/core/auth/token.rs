use std::time::{Duration, SystemTime, UNIX_EPOCH};

use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use uuid::Uuid;

use crate::core::error::{Result, ServiceError};
use crate::models::TokenClaims;

/// Default token lifetime: one day
pub const DEFAULT_TOKEN_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Signs and verifies bucket-scoped bearer tokens (HS256).
///
/// A token binds `(app_name, bucket_name, client_id)` to an expiry; scope
/// checks against the credential cache live one level up in
/// [`super::AccessControl`].
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl: Duration,
}

impl TokenService {
    /// Create a new TokenService with the given signing secret and lifetime
    pub fn new(secret: &[u8], ttl: Duration) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            ttl,
        }
    }

    /// Sign a token scoped to the given bucket and client id
    pub fn issue(&self, app_name: &str, bucket_name: &str, client_id: Uuid) -> Result<String> {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|e| ServiceError::AuthError(format!("System time error: {}", e)))?;

        let claims = TokenClaims {
            app_name: app_name.to_string(),
            bucket_name: bucket_name.to_string(),
            client_id,
            exp: (now + self.ttl).as_secs(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| ServiceError::AuthError(format!("Failed to sign token: {}", e)))
    }

    /// Decode and verify a token's signature and expiry.
    ///
    /// Fails closed: any decode error, bad signature, or expired token is an
    /// `AuthError`. Scope is NOT checked here.
    pub fn decode(&self, token: &str) -> Result<TokenClaims> {
        let data = decode::<TokenClaims>(
            token,
            &self.decoding_key,
            &Validation::new(Algorithm::HS256),
        )
        .map_err(|_| ServiceError::AuthError("Invalid or expired token".to_string()))?;

        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_SECRET: &[u8] = b"unit-test-signing-secret";

    #[test]
    fn issued_token_decodes_to_its_claims() {
        let service = TokenService::new(TEST_SECRET, DEFAULT_TOKEN_TTL);
        let client_id = Uuid::new_v4();

        let token = service.issue("app1", "bucketA", client_id).unwrap();
        let claims = service.decode(&token).unwrap();

        assert_eq!(claims.app_name, "app1");
        assert_eq!(claims.bucket_name, "bucketA");
        assert_eq!(claims.client_id, client_id);
    }

    #[test]
    fn garbage_token_is_rejected() {
        let service = TokenService::new(TEST_SECRET, DEFAULT_TOKEN_TTL);

        match service.decode("not.a.token") {
            Err(ServiceError::AuthError(_)) => {}
            other => panic!("expected AuthError, got {:?}", other),
        }
    }

    #[test]
    fn token_signed_with_other_secret_is_rejected() {
        let issuer = TokenService::new(b"other-secret", DEFAULT_TOKEN_TTL);
        let verifier = TokenService::new(TEST_SECRET, DEFAULT_TOKEN_TTL);

        let token = issuer.issue("app1", "bucketA", Uuid::new_v4()).unwrap();

        assert!(verifier.decode(&token).is_err());
    }

    #[test]
    fn expired_token_is_rejected() {
        let service = TokenService::new(TEST_SECRET, DEFAULT_TOKEN_TTL);

        // Sign claims that expired well past the validation leeway
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_secs();
        let claims = TokenClaims {
            app_name: "app1".to_string(),
            bucket_name: "bucketA".to_string(),
            client_id: Uuid::new_v4(),
            exp: now - 600,
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(TEST_SECRET),
        )
        .unwrap();

        match service.decode(&token) {
            Err(ServiceError::AuthError(_)) => {}
            other => panic!("expected AuthError, got {:?}", other),
        }
    }
}
