//! API State Management

use crate::otp::OtpStore;
use crate::voters::VoterRegistry;
use securechain_core::{Ledger, PartyRegistry};
use securechain_crypto::KeyPair;
use std::sync::Arc;

/// Session token lifetime, matching the original one-hour JWTs.
const DEFAULT_SESSION_TTL_MINUTES: i64 = 60;

#[derive(Clone)]
pub struct ApiState {
    pub ledger: Arc<Ledger>,
    pub voters: Arc<VoterRegistry>,
    pub otp: Arc<OtpStore>,
    pub keypair: Arc<KeyPair>,
    pub parties: Arc<PartyRegistry>,
    pub start_time: std::time::Instant,
    pub dev_mode: bool,
    pub session_ttl_minutes: i64,
}

impl ApiState {
    pub fn new(
        ledger: Arc<Ledger>,
        voters: Arc<VoterRegistry>,
        keypair: Arc<KeyPair>,
        parties: Arc<PartyRegistry>,
        dev_mode: bool,
    ) -> Self {
        Self {
            ledger,
            voters,
            otp: Arc::new(OtpStore::new()),
            keypair,
            parties,
            start_time: std::time::Instant::now(),
            dev_mode,
            session_ttl_minutes: DEFAULT_SESSION_TTL_MINUTES,
        }
    }

    /// Override the session token lifetime (called after ApiState creation)
    pub fn with_session_ttl(mut self, minutes: i64) -> Self {
        self.session_ttl_minutes = minutes;
        self
    }
}
