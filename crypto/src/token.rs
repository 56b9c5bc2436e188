//! Signed session tokens
//!
//! A token is `hex(claims JSON).hex(signature)`, signed with the node's
//! Ed25519 key. Verification checks the signature; expiry is the caller's
//! check via [`SessionClaims::is_expired`].

use crate::{CryptoError, KeyPair};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Voter,
    Admin,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    pub mobile: String,
    pub role: Role,
    pub token_id: String,
    /// Seconds since epoch
    pub issued_at: i64,
    /// Seconds since epoch
    pub expires_at: i64,
}

impl SessionClaims {
    pub fn is_expired(&self, now: i64) -> bool {
        now >= self.expires_at
    }
}

/// Issue a signed token carrying the given claims.
pub fn issue(keypair: &KeyPair, claims: &SessionClaims) -> Result<String, CryptoError> {
    let payload =
        serde_json::to_vec(claims).map_err(|e| CryptoError::InvalidToken(e.to_string()))?;
    let signature = keypair.sign(&payload);
    Ok(format!("{}.{}", hex::encode(&payload), hex::encode(signature)))
}

/// Verify a token's signature and recover its claims.
pub fn verify(keypair: &KeyPair, token: &str) -> Result<SessionClaims, CryptoError> {
    let (payload_hex, signature_hex) = token
        .split_once('.')
        .ok_or_else(|| CryptoError::InvalidToken("missing signature part".to_string()))?;

    let payload =
        hex::decode(payload_hex).map_err(|e| CryptoError::InvalidToken(e.to_string()))?;
    let signature =
        hex::decode(signature_hex).map_err(|e| CryptoError::InvalidToken(e.to_string()))?;

    keypair.verify(&payload, &signature)?;

    serde_json::from_slice(&payload).map_err(|e| CryptoError::InvalidToken(e.to_string()))
}
