//! API handlers for the OTP login flow

use crate::otp::DEMO_CODE;
use crate::{ApiError, ApiResult, ApiState};
use axum::{extract::State, Json};
use chrono::{Duration, Utc};
use securechain_crypto::{token, Role, SessionClaims};
use serde::{Deserialize, Serialize};
use tracing as log;
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub struct SendOtpRequest {
    pub mobile: String,
}

#[derive(Debug, Serialize)]
pub struct SendOtpResponse {
    pub success: bool,
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct VerifyOtpRequest {
    pub mobile: String,
    pub code: String,
}

#[derive(Debug, Serialize)]
pub struct VoterProfile {
    pub mobile: String,
    pub has_voted: bool,
    pub role: Role,
}

#[derive(Debug, Serialize)]
pub struct VerifyOtpResponse {
    pub token: String,
    pub voter: VoterProfile,
}

fn validated_mobile(raw: &str) -> ApiResult<&str> {
    let mobile = raw.trim();
    if mobile.len() < 10 || !mobile.chars().all(|c| c.is_ascii_digit()) {
        return Err(ApiError::BadRequest(
            "A valid mobile number is required".to_string(),
        ));
    }
    Ok(mobile)
}

/// Issue an OTP challenge for a mobile number.
///
/// Delivery is out of scope; the code reaches the operator through the log
/// (info in dev mode, debug otherwise) for a delivery hook to pick up.
pub async fn send_otp(
    State(state): State<ApiState>,
    Json(request): Json<SendOtpRequest>,
) -> ApiResult<Json<SendOtpResponse>> {
    let mobile = validated_mobile(&request.mobile)?;

    let code = state.otp.issue(mobile).await;
    if state.dev_mode {
        log::info!(mobile = %mobile, code = %code, "otp_issued");
    } else {
        log::debug!(mobile = %mobile, code = %code, "otp_issued");
    }

    Ok(Json(SendOtpResponse {
        success: true,
        message: "OTP sent".to_string(),
    }))
}

/// Verify an OTP and open a session.
///
/// On success the voter is registered in the roll (first login) and receives
/// a signed session token.
pub async fn verify_otp(
    State(state): State<ApiState>,
    Json(request): Json<VerifyOtpRequest>,
) -> ApiResult<Json<VerifyOtpResponse>> {
    let mobile = validated_mobile(&request.mobile)?;

    let demo_accepted = state.dev_mode && request.code == DEMO_CODE;
    if !demo_accepted {
        state
            .otp
            .verify(mobile, &request.code)
            .await
            .map_err(|e| ApiError::InvalidOtp(e.to_string()))?;
    }

    let record = state
        .voters
        .get_or_create(mobile)
        .await
        .map_err(|e| ApiError::Internal(format!("voter roll unavailable: {e}")))?;

    let now = Utc::now();
    let claims = SessionClaims {
        mobile: record.mobile.clone(),
        role: record.role,
        token_id: Uuid::new_v4().to_string(),
        issued_at: now.timestamp(),
        expires_at: (now + Duration::minutes(state.session_ttl_minutes)).timestamp(),
    };
    let token = token::issue(&state.keypair, &claims)
        .map_err(|e| ApiError::Internal(format!("token issue failed: {e}")))?;

    log::info!(mobile = %record.mobile, token_id = %claims.token_id, "session_opened");

    Ok(Json(VerifyOtpResponse {
        token,
        voter: VoterProfile {
            mobile: record.mobile,
            has_voted: record.has_voted,
            role: record.role,
        },
    }))
}
