//! Voter roll: the eligibility gate consulted before any append
//!
//! Keyed by mobile number. `has_voted` is flipped only after the ledger has
//! durably appended the vote, so a crash can never leave a voter marked as
//! having voted without a recorded block.

use chrono::Utc;
use securechain_crypto::Role;
use securechain_storage::{SnapshotStore, StorageError};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tokio::sync::RwLock;

const SNAPSHOT_NAME: &str = "voters";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoterRecord {
    pub mobile: String,
    pub has_voted: bool,
    pub role: Role,
    /// Seconds since epoch
    pub created_at: i64,
}

/// Persistent registry of known voters and their voted flags.
pub struct VoterRegistry {
    voters: RwLock<HashMap<String, VoterRecord>>,
    store: Option<SnapshotStore>,
}

impl VoterRegistry {
    /// Open the registry over a snapshot store, loading any existing roll.
    pub fn open(store: SnapshotStore) -> Result<Self, StorageError> {
        let voters = if store.has(SNAPSHOT_NAME) {
            store.load(SNAPSHOT_NAME)?
        } else {
            HashMap::new()
        };

        Ok(Self {
            voters: RwLock::new(voters),
            store: Some(store),
        })
    }

    /// In-memory registry with no persistence, for tests and dry runs.
    pub fn ephemeral() -> Self {
        Self {
            voters: RwLock::new(HashMap::new()),
            store: None,
        }
    }

    pub async fn get(&self, mobile: &str) -> Option<VoterRecord> {
        self.voters.read().await.get(mobile).cloned()
    }

    /// Fetch the record for this mobile, registering a new voter on first login.
    pub async fn get_or_create(&self, mobile: &str) -> Result<VoterRecord, StorageError> {
        let mut voters = self.voters.write().await;

        if let Some(record) = voters.get(mobile) {
            return Ok(record.clone());
        }

        let record = VoterRecord {
            mobile: mobile.to_string(),
            has_voted: false,
            role: Role::Voter,
            created_at: Utc::now().timestamp(),
        };
        voters.insert(mobile.to_string(), record.clone());
        self.persist(&voters)?;

        Ok(record)
    }

    pub async fn has_voted(&self, mobile: &str) -> bool {
        self.voters
            .read()
            .await
            .get(mobile)
            .map(|r| r.has_voted)
            .unwrap_or(false)
    }

    /// Record that this voter's vote is on the chain. Call only after the
    /// ledger append has returned Ok. A voter missing from the roll (lost
    /// snapshot) is registered and marked in one step.
    pub async fn mark_voted(&self, mobile: &str) -> Result<(), StorageError> {
        let mut voters = self.voters.write().await;

        voters
            .entry(mobile.to_string())
            .or_insert_with(|| VoterRecord {
                mobile: mobile.to_string(),
                has_voted: false,
                role: Role::Voter,
                created_at: Utc::now().timestamp(),
            })
            .has_voted = true;

        self.persist(&voters)
    }

    pub async fn len(&self) -> usize {
        self.voters.read().await.len()
    }

    fn persist(&self, voters: &HashMap<String, VoterRecord>) -> Result<(), StorageError> {
        match &self.store {
            Some(store) => store.save(SNAPSHOT_NAME, voters),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_first_login_registers_voter() {
        let registry = VoterRegistry::ephemeral();

        let record = registry.get_or_create("9876543210").await.unwrap();
        assert_eq!(record.mobile, "9876543210");
        assert!(!record.has_voted);
        assert_eq!(record.role, Role::Voter);
        assert_eq!(registry.len().await, 1);
    }

    #[tokio::test]
    async fn test_repeat_login_keeps_record() {
        let registry = VoterRegistry::ephemeral();

        registry.get_or_create("9876543210").await.unwrap();
        registry.mark_voted("9876543210").await.unwrap();

        let record = registry.get_or_create("9876543210").await.unwrap();
        assert!(record.has_voted);
        assert_eq!(registry.len().await, 1);
    }

    #[tokio::test]
    async fn test_mark_voted_registers_missing_voter() {
        let registry = VoterRegistry::ephemeral();
        registry.mark_voted("0000000000").await.unwrap();
        assert!(registry.has_voted("0000000000").await);
    }

    #[tokio::test]
    async fn test_roll_survives_reopen() {
        let dir = tempdir().unwrap();

        {
            let registry = VoterRegistry::open(SnapshotStore::open(dir.path()).unwrap()).unwrap();
            registry.get_or_create("9876543210").await.unwrap();
            registry.get_or_create("9123456780").await.unwrap();
            registry.mark_voted("9876543210").await.unwrap();
        }

        let reopened = VoterRegistry::open(SnapshotStore::open(dir.path()).unwrap()).unwrap();
        assert_eq!(reopened.len().await, 2);
        assert!(reopened.has_voted("9876543210").await);
        assert!(!reopened.has_voted("9123456780").await);
    }
}
