//! One-time-password challenges for voter login
//!
//! Delivery (SMS) is out of scope; issued codes are surfaced through the
//! log so an operator-side delivery hook can pick them up. In dev mode the
//! fixed demo code is also accepted.

use chrono::Utc;
use rand::Rng;
use std::collections::HashMap;
use thiserror::Error;
use tokio::sync::RwLock;

/// Challenge lifetime.
const OTP_TTL_SECONDS: i64 = 300;

/// Wrong-code attempts before the challenge is discarded.
const MAX_ATTEMPTS: u32 = 5;

/// Code accepted in dev mode regardless of the issued challenge.
pub const DEMO_CODE: &str = "123456";

#[derive(Error, Debug)]
pub enum OtpError {
    #[error("no pending code for this number")]
    NoChallenge,

    #[error("code expired, request a new one")]
    Expired,

    #[error("too many attempts, request a new code")]
    TooManyAttempts,

    #[error("code does not match")]
    Mismatch,
}

#[derive(Debug, Clone)]
struct OtpChallenge {
    code: String,
    expires_at: i64,
    attempts: u32,
}

/// Pending challenges keyed by mobile number.
pub struct OtpStore {
    challenges: RwLock<HashMap<String, OtpChallenge>>,
}

impl OtpStore {
    pub fn new() -> Self {
        Self {
            challenges: RwLock::new(HashMap::new()),
        }
    }

    /// Issue a fresh six-digit code, replacing any pending challenge.
    pub async fn issue(&self, mobile: &str) -> String {
        let code = format!("{:06}", rand::rng().random_range(0..1_000_000u32));
        let challenge = OtpChallenge {
            code: code.clone(),
            expires_at: Utc::now().timestamp() + OTP_TTL_SECONDS,
            attempts: 0,
        };
        self.challenges
            .write()
            .await
            .insert(mobile.to_string(), challenge);
        code
    }

    /// Check a submitted code; the challenge is consumed on success.
    pub async fn verify(&self, mobile: &str, code: &str) -> Result<(), OtpError> {
        self.verify_at(mobile, code, Utc::now().timestamp()).await
    }

    async fn verify_at(&self, mobile: &str, code: &str, now: i64) -> Result<(), OtpError> {
        let mut challenges = self.challenges.write().await;

        let challenge = challenges.get_mut(mobile).ok_or(OtpError::NoChallenge)?;

        if now >= challenge.expires_at {
            challenges.remove(mobile);
            return Err(OtpError::Expired);
        }

        if challenge.code != code {
            challenge.attempts += 1;
            if challenge.attempts >= MAX_ATTEMPTS {
                challenges.remove(mobile);
                return Err(OtpError::TooManyAttempts);
            }
            return Err(OtpError::Mismatch);
        }

        challenges.remove(mobile);
        Ok(())
    }
}

impl Default for OtpStore {
    fn default() -> Self {
        Self::new()
    }
}
