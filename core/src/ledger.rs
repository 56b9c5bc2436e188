//! The vote ledger: append protocol, read path and chain verification

use crate::block::{Block, GENESIS_PREVIOUS_HASH};
use crate::pow::ProofOfWork;
use crate::store::{BlockStore, PersistenceError};
use chrono::Utc;
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("Append conflict: chain tail moved (expected index {expected}, found {found})")]
    AppendConflict { expected: u64, found: u64 },

    #[error("Persistence error: {0}")]
    Persistence(#[from] PersistenceError),
}

/// The append-only chain of vote blocks.
///
/// Appends are serialized ledger-wide by the append guard; the chain itself
/// sits behind a read/write lock so readers observe either the state before
/// or after an append, never the middle of one. The proof-of-work search
/// runs while only the guard is held, so readers are never stalled by it.
pub struct Ledger {
    chain: RwLock<Vec<Block>>,
    append_guard: Mutex<()>,
    store: Arc<dyn BlockStore>,
    pow: ProofOfWork,
}

impl Ledger {
    /// Create an empty ledger over the given store.
    pub fn new(store: Arc<dyn BlockStore>, difficulty: usize) -> Self {
        Self::with_blocks(store, Vec::new(), difficulty)
    }

    /// Create a ledger seeded with blocks loaded from durable storage.
    ///
    /// Callers are expected to run [`verify_chain`] on the loaded blocks
    /// first; the ledger trusts the sequence it is given.
    pub fn with_blocks(store: Arc<dyn BlockStore>, blocks: Vec<Block>, difficulty: usize) -> Self {
        Self {
            chain: RwLock::new(blocks),
            append_guard: Mutex::new(()),
            store,
            pow: ProofOfWork::new(difficulty),
        }
    }

    pub fn difficulty(&self) -> usize {
        self.pow.difficulty()
    }

    /// Number of blocks in the chain.
    pub fn height(&self) -> u64 {
        self.chain.read().len() as u64
    }

    pub fn is_empty(&self) -> bool {
        self.chain.read().is_empty()
    }

    /// Admit one vote: extend the chain by exactly one block.
    ///
    /// The caller must have authenticated the voter and checked eligibility
    /// and party validity; the ledger only enforces ordering and integrity.
    /// On `Err` nothing is published: the computed block is discarded and the
    /// caller must treat the vote as not recorded (in particular, the voter
    /// must not be marked as having voted).
    pub fn append(&self, party_id: &str, voter_id: &str) -> Result<Block, LedgerError> {
        let _guard = self.append_guard.lock();

        let (index, previous_hash) = {
            let chain = self.chain.read();
            match chain.last() {
                Some(tail) => (tail.index + 1, tail.hash.clone()),
                None => (0, GENESIS_PREVIOUS_HASH.to_string()),
            }
        };
        let timestamp = Utc::now().timestamp_millis();

        let (nonce, hash) = self
            .pow
            .mine(index, &previous_hash, timestamp, party_id, voter_id);

        let block = Block {
            index,
            timestamp,
            party_id: party_id.to_string(),
            voter_id: voter_id.to_string(),
            previous_hash,
            hash,
            nonce,
        };

        let mut chain = self.chain.write();

        // The guard makes a moved tail impossible; check anyway rather than
        // silently reconcile a broken chain.
        let tail_hash = chain
            .last()
            .map(|tail| tail.hash.as_str())
            .unwrap_or(GENESIS_PREVIOUS_HASH);
        if chain.len() as u64 != block.index || tail_hash != block.previous_hash {
            return Err(LedgerError::AppendConflict {
                expected: block.index,
                found: chain.len() as u64,
            });
        }

        self.store.append(&block)?;
        chain.push(block.clone());

        Ok(block)
    }

    /// Consistent snapshot of the chain, ascending by index.
    pub fn blocks(&self) -> Vec<Block> {
        self.chain.read().clone()
    }

    /// Vote count per party over the current snapshot.
    pub fn tally(&self) -> BTreeMap<String, u64> {
        let chain = self.chain.read();
        let mut counts: BTreeMap<String, u64> = BTreeMap::new();
        for block in chain.iter() {
            *counts.entry(block.party_id.clone()).or_insert(0) += 1;
        }
        counts
    }

    /// Verify the current chain against the ledger's own difficulty.
    pub fn verify(&self) -> ChainVerification {
        verify_chain(&self.chain.read(), self.pow.difficulty())
    }
}

/// First invariant violated by an invalid chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChainFault {
    /// First block does not carry the `"0"` sentinel
    GenesisLink,
    /// `previous_hash` does not match the preceding block's hash
    BrokenLink,
    /// Index does not increase by exactly one
    NonSequentialIndex,
    /// Stored hash lacks the required zero prefix
    DifficultyNotMet,
    /// Stored hash does not match the digest recomputed from the fields
    DigestMismatch,
}

/// Outcome of [`verify_chain`]: valid, or the first violation found.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainVerification {
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_invalid_index: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fault: Option<ChainFault>,
}

impl ChainVerification {
    fn valid() -> Self {
        Self {
            valid: true,
            first_invalid_index: None,
            fault: None,
        }
    }

    fn invalid(index: u64, fault: ChainFault) -> Self {
        Self {
            valid: false,
            first_invalid_index: Some(index),
            fault: Some(fault),
        }
    }
}

/// Recompute the linkage and digest invariants over an exported snapshot.
///
/// Pure: runnable against any ordered block sequence, independent of a live
/// ledger. Reports the position of the first violation; never repairs.
pub fn verify_chain(blocks: &[Block], difficulty: usize) -> ChainVerification {
    let pow = ProofOfWork::new(difficulty);

    for (position, block) in blocks.iter().enumerate() {
        let position = position as u64;

        let link_fault = if position == 0 {
            if block.previous_hash != GENESIS_PREVIOUS_HASH {
                Some(ChainFault::GenesisLink)
            } else if block.index != 0 {
                Some(ChainFault::NonSequentialIndex)
            } else {
                None
            }
        } else {
            let prev = &blocks[position as usize - 1];
            if block.previous_hash != prev.hash {
                Some(ChainFault::BrokenLink)
            } else if block.index != prev.index + 1 {
                Some(ChainFault::NonSequentialIndex)
            } else {
                None
            }
        };

        let fault = link_fault.or_else(|| {
            if !pow.meets_target(&block.hash) {
                Some(ChainFault::DifficultyNotMet)
            } else if block.digest() != block.hash {
                Some(ChainFault::DigestMismatch)
            } else {
                None
            }
        });

        if let Some(fault) = fault {
            return ChainVerification::invalid(position, fault);
        }
    }

    ChainVerification::valid()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use std::collections::HashSet;
    use std::thread;

    fn ledger(difficulty: usize) -> Ledger {
        Ledger::new(Arc::new(MemoryStore), difficulty)
    }

    struct RejectingStore;

    impl BlockStore for RejectingStore {
        fn append(&self, block: &Block) -> Result<(), PersistenceError> {
            Err(PersistenceError::Rejected {
                index: block.index,
                reason: "store offline".to_string(),
            })
        }
    }

    #[test]
    fn test_first_append_on_empty_ledger() {
        let ledger = ledger(1);
        let block = ledger.append("p1", "voter-a").unwrap();

        assert_eq!(block.index, 0);
        assert_eq!(block.previous_hash, GENESIS_PREVIOUS_HASH);
        assert!(block.hash.starts_with('0'));
        assert_eq!(ledger.height(), 1);
    }

    #[test]
    fn test_sequential_appends_link_exactly() {
        let ledger = ledger(1);
        let first = ledger.append("p1", "voter-a").unwrap();
        let second = ledger.append("p2", "voter-b").unwrap();

        assert_eq!(second.index, first.index + 1);
        assert_eq!(second.previous_hash, first.hash);
    }

    #[test]
    fn test_appended_chain_verifies() {
        let ledger = ledger(1);
        for i in 0..5 {
            ledger.append("p1", &format!("voter-{i}")).unwrap();
        }

        let blocks = ledger.blocks();
        for (i, block) in blocks.iter().enumerate() {
            assert_eq!(block.index, i as u64);
        }
        assert!(ledger.verify().valid);
    }

    #[test]
    fn test_two_votes_at_default_difficulty() {
        // p1 then p3 on an empty chain at the default difficulty.
        let ledger = ledger(2);
        let first = ledger.append("p1", "voter-a").unwrap();
        let second = ledger.append("p3", "voter-b").unwrap();

        assert!(first.hash.starts_with("00"));
        assert!(second.hash.starts_with("00"));
        assert_eq!(second.previous_hash, first.hash);
        assert_eq!(second.index, 1);
        assert!(verify_chain(&ledger.blocks(), 2).valid);
    }

    #[test]
    fn test_stored_hash_recomputes_exactly() {
        let ledger = ledger(1);
        ledger.append("p2", "voter-a").unwrap();
        ledger.append("p4", "voter-b").unwrap();

        for block in ledger.blocks() {
            assert_eq!(block.hash, block.digest());
        }
    }

    #[test]
    fn test_tampered_party_detected_at_that_index() {
        let ledger = ledger(1);
        for i in 0..3 {
            ledger.append("p1", &format!("voter-{i}")).unwrap();
        }

        let mut blocks = ledger.blocks();
        blocks[1].party_id = "p4".to_string();

        let verification = verify_chain(&blocks, 1);
        assert!(!verification.valid);
        assert_eq!(verification.first_invalid_index, Some(1));
        assert_eq!(verification.fault, Some(ChainFault::DigestMismatch));
    }

    #[test]
    fn test_tampered_link_detected() {
        let ledger = ledger(1);
        for i in 0..3 {
            ledger.append("p1", &format!("voter-{i}")).unwrap();
        }

        let mut blocks = ledger.blocks();
        blocks[2].previous_hash = "00ab".to_string();

        let verification = verify_chain(&blocks, 1);
        assert_eq!(verification.first_invalid_index, Some(2));
        assert_eq!(verification.fault, Some(ChainFault::BrokenLink));
    }

    #[test]
    fn test_tampered_index_detected() {
        let ledger = ledger(1);
        for i in 0..3 {
            ledger.append("p1", &format!("voter-{i}")).unwrap();
        }

        let mut blocks = ledger.blocks();
        blocks[1].index = 5;

        let verification = verify_chain(&blocks, 1);
        assert_eq!(verification.first_invalid_index, Some(1));
        assert_eq!(verification.fault, Some(ChainFault::NonSequentialIndex));
    }

    #[test]
    fn test_tampered_genesis_sentinel_detected() {
        let ledger = ledger(1);
        ledger.append("p1", "voter-a").unwrap();

        let mut blocks = ledger.blocks();
        blocks[0].previous_hash = "ff".to_string();

        let verification = verify_chain(&blocks, 1);
        assert_eq!(verification.first_invalid_index, Some(0));
        assert_eq!(verification.fault, Some(ChainFault::GenesisLink));
    }

    #[test]
    fn test_insufficient_difficulty_detected() {
        // A chain mined at difficulty 0 will generally not satisfy
        // difficulty 4; find a block whose hash misses the prefix.
        let ledger = ledger(0);
        for i in 0..4 {
            ledger.append("p1", &format!("voter-{i}")).unwrap();
        }

        let blocks = ledger.blocks();
        if blocks.iter().any(|b| !b.hash.starts_with("0000")) {
            let verification = verify_chain(&blocks, 4);
            assert!(!verification.valid);
            assert_eq!(verification.fault, Some(ChainFault::DifficultyNotMet));
        }
    }

    #[test]
    fn test_empty_chain_is_valid() {
        assert!(verify_chain(&[], 2).valid);
    }

    #[test]
    fn test_rejected_persistence_leaves_nothing_visible() {
        let ledger = Ledger::new(Arc::new(RejectingStore), 1);
        let result = ledger.append("p1", "voter-a");

        assert!(matches!(
            result,
            Err(LedgerError::Persistence(PersistenceError::Rejected { index: 0, .. }))
        ));
        assert!(ledger.is_empty());
        assert!(ledger.blocks().is_empty());
    }

    #[test]
    fn test_concurrent_appends_serialize() {
        let ledger = Arc::new(ledger(1));
        let workers = 8;
        let votes_per_worker = 4;

        thread::scope(|scope| {
            for w in 0..workers {
                let ledger = Arc::clone(&ledger);
                scope.spawn(move || {
                    for v in 0..votes_per_worker {
                        ledger.append("p1", &format!("voter-{w}-{v}")).unwrap();
                    }
                });
            }
        });

        let blocks = ledger.blocks();
        assert_eq!(blocks.len(), workers * votes_per_worker);

        let indexes: HashSet<u64> = blocks.iter().map(|b| b.index).collect();
        assert_eq!(indexes.len(), blocks.len());

        let parents: HashSet<&str> = blocks.iter().map(|b| b.previous_hash.as_str()).collect();
        assert_eq!(parents.len(), blocks.len());

        assert!(ledger.verify().valid);
    }

    #[test]
    fn test_tally_counts_votes_per_party() {
        let ledger = ledger(1);
        ledger.append("p1", "voter-a").unwrap();
        ledger.append("p3", "voter-b").unwrap();
        ledger.append("p1", "voter-c").unwrap();

        let tally = ledger.tally();
        assert_eq!(tally.get("p1"), Some(&2));
        assert_eq!(tally.get("p3"), Some(&1));
        assert_eq!(tally.get("p2"), None);
    }

    #[test]
    fn test_ledger_resumes_from_loaded_blocks() {
        let seeded = ledger(1);
        seeded.append("p1", "voter-a").unwrap();
        seeded.append("p2", "voter-b").unwrap();
        let loaded = seeded.blocks();

        let resumed = Ledger::with_blocks(Arc::new(MemoryStore), loaded, 1);
        let block = resumed.append("p3", "voter-c").unwrap();

        assert_eq!(block.index, 2);
        assert!(resumed.verify().valid);
    }
}
