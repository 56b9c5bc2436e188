//! Block structure and content digest for the vote ledger

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// `previous_hash` sentinel carried by the first block of a chain.
pub const GENESIS_PREVIOUS_HASH: &str = "0";

/// Separator between fields in the digest pre-image.
///
/// Numeric fields are rendered in decimal and digest fields in lowercase hex,
/// so neither can contain it; party identifiers are validated against it by
/// the party registry. That keeps the joined encoding free of field-boundary
/// collisions.
pub const FIELD_SEPARATOR: char = '|';

/// One immutable ledger entry representing a single accepted vote.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    /// Position in the chain, starting at 0
    pub index: u64,
    /// Milliseconds since epoch, stamped at append time
    pub timestamp: i64,
    /// Identifier of the selected party
    pub party_id: String,
    /// SHA-256 digest of the voter's authenticated identity (never the raw identity)
    pub voter_id: String,
    /// Hash of the previous block, `"0"` for the first block
    pub previous_hash: String,
    /// SHA-256 digest over the six other fields
    pub hash: String,
    /// Proof-of-work counter, smallest value satisfying the difficulty predicate
    pub nonce: u64,
}

impl Block {
    /// Recompute this block's content digest from its stored fields.
    pub fn digest(&self) -> String {
        block_digest(
            self.index,
            &self.previous_hash,
            self.timestamp,
            &self.party_id,
            &self.voter_id,
            self.nonce,
        )
    }

    pub fn is_genesis(&self) -> bool {
        self.index == 0
    }
}

/// Compute the block content digest (lowercase hex, 64 chars).
///
/// SHA-256 over the fields in the order
/// `index | previous_hash | timestamp | party_id | voter_id | nonce`,
/// integers in decimal, strings as raw UTF-8, joined with
/// [`FIELD_SEPARATOR`]. Deterministic across processes and implementations.
pub fn block_digest(
    index: u64,
    previous_hash: &str,
    timestamp: i64,
    party_id: &str,
    voter_id: &str,
    nonce: u64,
) -> String {
    let preimage = format!(
        "{index}{sep}{previous_hash}{sep}{timestamp}{sep}{party_id}{sep}{voter_id}{sep}{nonce}",
        sep = FIELD_SEPARATOR,
    );
    hex::encode(Sha256::digest(preimage.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_digest_is_hex_sha256() {
        let digest = block_digest(0, GENESIS_PREVIOUS_HASH, 1_700_000_000_000, "p1", "abc", 0);
        assert_eq!(digest.len(), 64);
        assert!(digest.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_digest_is_deterministic() {
        let a = block_digest(3, "00ff", 1_700_000_000_000, "p2", "deadbeef", 17);
        let b = block_digest(3, "00ff", 1_700_000_000_000, "p2", "deadbeef", 17);
        assert_eq!(a, b);
    }

    #[test]
    fn test_digest_changes_with_every_field() {
        let base = block_digest(1, "aa", 100, "p1", "v1", 5);
        assert_ne!(base, block_digest(2, "aa", 100, "p1", "v1", 5));
        assert_ne!(base, block_digest(1, "ab", 100, "p1", "v1", 5));
        assert_ne!(base, block_digest(1, "aa", 101, "p1", "v1", 5));
        assert_ne!(base, block_digest(1, "aa", 100, "p2", "v1", 5));
        assert_ne!(base, block_digest(1, "aa", 100, "p1", "v2", 5));
        assert_ne!(base, block_digest(1, "aa", 100, "p1", "v1", 6));
    }

    #[test]
    fn test_field_boundaries_are_unambiguous() {
        // Without the separator these two would share a pre-image.
        let a = block_digest(1, "ab", 100, "c1", "v", 0);
        let b = block_digest(1, "a", 100, "bc1", "v", 0);
        assert_ne!(a, b);
    }

    #[test]
    fn test_block_digest_matches_stored_fields() {
        let block = Block {
            index: 0,
            timestamp: 1_700_000_000_000,
            party_id: "p1".to_string(),
            voter_id: "aa".repeat(32),
            previous_hash: GENESIS_PREVIOUS_HASH.to_string(),
            hash: String::new(),
            nonce: 42,
        };
        assert_eq!(block.digest().len(), 64);
        assert!(block.is_genesis());
    }
}
