//! Proof-of-work search over block digests

use crate::block::block_digest;

/// Default required count of leading zero hex characters.
pub const DEFAULT_DIFFICULTY: usize = 2;

/// Brute-force nonce search satisfying the difficulty predicate.
///
/// A digest is admissible when its hex representation starts with
/// `difficulty` zero characters, so a search takes ~16^difficulty attempts
/// on average (~256 at the default difficulty 2). Callers that want a
/// timeout must enforce it at the edge; the search itself never caps its
/// iteration count, since a cap could make a valid vote unappendable.
#[derive(Debug, Clone)]
pub struct ProofOfWork {
    difficulty: usize,
    target: String,
}

impl ProofOfWork {
    pub fn new(difficulty: usize) -> Self {
        Self {
            difficulty,
            target: "0".repeat(difficulty),
        }
    }

    pub fn difficulty(&self) -> usize {
        self.difficulty
    }

    /// The admission predicate: does this digest carry the required prefix?
    pub fn meets_target(&self, hash: &str) -> bool {
        hash.starts_with(&self.target)
    }

    /// Search nonces in increasing order from 0; return the first nonce whose
    /// digest is admissible, along with that digest.
    pub fn mine(
        &self,
        index: u64,
        previous_hash: &str,
        timestamp: i64,
        party_id: &str,
        voter_id: &str,
    ) -> (u64, String) {
        let mut nonce: u64 = 0;
        loop {
            let hash = block_digest(index, previous_hash, timestamp, party_id, voter_id, nonce);
            if self.meets_target(&hash) {
                return (nonce, hash);
            }
            nonce += 1;
        }
    }
}

impl Default for ProofOfWork {
    fn default() -> Self {
        Self::new(DEFAULT_DIFFICULTY)
    }
}
