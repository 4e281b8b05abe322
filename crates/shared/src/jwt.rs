//! JWT bearer-token utilities using HS256 signing.
//!
//! The dashboard frontend authenticates against an external identity
//! service; this backend only verifies the resulting tokens against the
//! shared secret. Token minting here exists for tests and tooling.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Error type for JWT operations.
#[derive(Debug, Error)]
pub enum JwtError {
    #[error("Failed to encode token: {0}")]
    EncodingError(String),

    #[error("Failed to decode token: {0}")]
    DecodingError(String),

    #[error("Token has expired")]
    TokenExpired,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Invalid key: {0}")]
    InvalidKey(String),
}

/// JWT token claims.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (owner ID)
    pub sub: String,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// JWT ID (unique token identifier)
    pub jti: String,
}

/// Default leeway in seconds for clock skew tolerance
pub const DEFAULT_LEEWAY_SECS: u64 = 30;

/// Configuration for JWT token verification (and test-side minting).
#[derive(Clone)]
pub struct JwtConfig {
    /// HMAC key derived from the shared secret, used for signing
    encoding_key: EncodingKey,
    /// HMAC key derived from the shared secret, used for verification
    decoding_key: DecodingKey,
    /// Token expiration in seconds (default: 86400 = 24 hours)
    pub token_expiry_secs: i64,
    /// Leeway in seconds for clock skew tolerance (default: 30)
    pub leeway_secs: u64,
}

impl std::fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtConfig")
            .field("token_expiry_secs", &self.token_expiry_secs)
            .field("leeway_secs", &self.leeway_secs)
            .field("encoding_key", &"[REDACTED]")
            .field("decoding_key", &"[REDACTED]")
            .finish()
    }
}

impl JwtConfig {
    /// Creates a new JwtConfig from the shared HS256 secret.
    ///
    /// # Arguments
    /// * `secret` - shared secret, must be at least 32 bytes
    /// * `token_expiry_secs` - token expiration in seconds
    pub fn new(secret: &str, token_expiry_secs: i64) -> Result<Self, JwtError> {
        Self::with_leeway(secret, token_expiry_secs, DEFAULT_LEEWAY_SECS)
    }

    /// Creates a new JwtConfig with custom clock-skew leeway.
    pub fn with_leeway(
        secret: &str,
        token_expiry_secs: i64,
        leeway_secs: u64,
    ) -> Result<Self, JwtError> {
        if secret.len() < 32 {
            return Err(JwtError::InvalidKey(
                "JWT secret must be at least 32 bytes".to_string(),
            ));
        }

        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            token_expiry_secs,
            leeway_secs,
        })
    }

    /// Generates a signed token for the given owner ID.
    ///
    /// Returns the token together with its `jti`.
    pub fn generate_token(&self, owner_id: Uuid) -> Result<(String, String), JwtError> {
        let now = Utc::now();
        let jti = Uuid::new_v4().to_string();
        let exp = (now + Duration::seconds(self.token_expiry_secs)).timestamp();

        let claims = Claims {
            sub: owner_id.to_string(),
            exp,
            iat: now.timestamp(),
            jti: jti.clone(),
        };

        let header = Header::new(Algorithm::HS256);

        let token = encode(&header, &claims, &self.encoding_key)
            .map_err(|e| JwtError::EncodingError(e.to_string()))?;

        Ok((token, jti))
    }

    /// Validates a token and returns its claims.
    pub fn validate_token(&self, token: &str) -> Result<Claims, JwtError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        // Allow minor clock differences between the identity service and us
        validation.leeway = self.leeway_secs;

        let token_data = decode::<Claims>(token, &self.decoding_key, &validation).map_err(|e| {
            match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => JwtError::TokenExpired,
                jsonwebtoken::errors::ErrorKind::InvalidToken
                | jsonwebtoken::errors::ErrorKind::InvalidSignature => JwtError::InvalidToken,
                _ => JwtError::DecodingError(e.to_string()),
            }
        })?;

        Ok(token_data.claims)
    }
}

/// Extracts the owner ID from validated claims.
pub fn extract_owner_id(claims: &Claims) -> Result<Uuid, JwtError> {
    Uuid::parse_str(&claims.sub).map_err(|_| JwtError::InvalidToken)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_config() -> JwtConfig {
        JwtConfig::with_leeway("test_secret_key_for_jwt_testing_12345", 3600, 0).unwrap()
    }

    #[test]
    fn test_generate_and_validate_token() {
        let config = create_test_config();
        let owner_id = Uuid::new_v4();

        let (token, jti) = config.generate_token(owner_id).unwrap();
        let claims = config.validate_token(&token).unwrap();

        assert_eq!(claims.sub, owner_id.to_string());
        assert_eq!(claims.jti, jti);
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn test_extract_owner_id() {
        let config = create_test_config();
        let owner_id = Uuid::new_v4();

        let (token, _) = config.generate_token(owner_id).unwrap();
        let claims = config.validate_token(&token).unwrap();

        assert_eq!(extract_owner_id(&claims).unwrap(), owner_id);
    }

    #[test]
    fn test_rejects_short_secret() {
        let result = JwtConfig::new("too_short", 3600);
        assert!(matches!(result, Err(JwtError::InvalidKey(_))));
    }

    #[test]
    fn test_rejects_tampered_token() {
        let config = create_test_config();
        let (token, _) = config.generate_token(Uuid::new_v4()).unwrap();

        let mut tampered = token.clone();
        tampered.push('x');

        assert!(config.validate_token(&tampered).is_err());
    }

    #[test]
    fn test_rejects_token_from_other_secret() {
        let config = create_test_config();
        let other =
            JwtConfig::with_leeway("another_secret_key_for_jwt_testing_67890", 3600, 0).unwrap();

        let (token, _) = other.generate_token(Uuid::new_v4()).unwrap();
        assert!(matches!(
            config.validate_token(&token),
            Err(JwtError::InvalidToken)
        ));
    }

    #[test]
    fn test_expired_token() {
        let mut config = create_test_config();
        config.token_expiry_secs = -10;

        let (token, _) = config.generate_token(Uuid::new_v4()).unwrap();
        assert!(matches!(
            config.validate_token(&token),
            Err(JwtError::TokenExpired)
        ));
    }

    #[test]
    fn test_invalid_subject_rejected_on_extract() {
        let claims = Claims {
            sub: "not-a-uuid".to_string(),
            exp: Utc::now().timestamp() + 3600,
            iat: Utc::now().timestamp(),
            jti: Uuid::new_v4().to_string(),
        };

        assert!(matches!(
            extract_owner_id(&claims),
            Err(JwtError::InvalidToken)
        ));
    }
}
