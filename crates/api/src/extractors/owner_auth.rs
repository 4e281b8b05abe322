//! Owner JWT authentication extractor.
//!
//! Provides an Axum extractor for validating Bearer tokens from requests.

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use uuid::Uuid;

use crate::app::AppState;
use crate::error::ApiError;
use shared::jwt::{extract_owner_id, JwtConfig, JwtError};

/// Authenticated owner information from a verified JWT.
///
/// This extractor validates the Bearer token in the Authorization header
/// and yields the verified owner identity. Handlers that mutate rule or
/// preference data scope their queries to `owner_id`.
#[derive(Debug, Clone)]
pub struct AuthenticatedOwner {
    /// Owner ID from the JWT subject claim.
    pub owner_id: Uuid,
    /// JWT ID (jti) for session tracking.
    #[allow(dead_code)] // Available for audit logging in handlers
    pub jti: String,
}

#[async_trait]
impl FromRequestParts<AppState> for AuthenticatedOwner {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get("Authorization")
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| ApiError::Unauthorized("Missing Authorization header".to_string()))?;

        if !auth_header.starts_with("Bearer ") {
            return Err(ApiError::Unauthorized(
                "Invalid Authorization header format".to_string(),
            ));
        }

        let token = &auth_header[7..];

        let jwt_config = JwtConfig::with_leeway(
            &state.config.auth.jwt_secret,
            state.config.auth.token_expiry_secs,
            state.config.auth.leeway_secs,
        )
        .map_err(|e| ApiError::Internal(e.to_string()))?;

        let claims = jwt_config.validate_token(token).map_err(|e| match e {
            JwtError::TokenExpired => ApiError::Unauthorized("Token has expired".to_string()),
            _ => ApiError::Unauthorized("Invalid token".to_string()),
        })?;

        let owner_id = extract_owner_id(&claims)
            .map_err(|_| ApiError::Unauthorized("Invalid token subject".to_string()))?;

        Ok(Self {
            owner_id,
            jti: claims.jti,
        })
    }
}
