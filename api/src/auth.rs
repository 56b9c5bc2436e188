//! Bearer-token authentication for vote casting

use crate::{ApiError, ApiState};
use axum::extract::FromRequestParts;
use axum::http::{header::AUTHORIZATION, request::Parts};
use chrono::Utc;
use securechain_crypto::{token, Role};

/// A voter whose session token checked out.
#[derive(Debug, Clone)]
pub struct AuthenticatedVoter {
    pub mobile: String,
    pub role: Role,
}

impl FromRequestParts<ApiState> for AuthenticatedVoter {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &ApiState,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| ApiError::Unauthorized("Missing Authorization header".to_string()))?;

        let token = header
            .strip_prefix("Bearer ")
            .ok_or_else(|| ApiError::Unauthorized("Expected Bearer token".to_string()))?;

        let claims = token::verify(&state.keypair, token)
            .map_err(|_| ApiError::Unauthorized("Invalid token".to_string()))?;

        if claims.is_expired(Utc::now().timestamp()) {
            return Err(ApiError::Unauthorized("Session expired".to_string()));
        }

        Ok(AuthenticatedVoter {
            mobile: claims.mobile,
            role: claims.role,
        })
    }
}
