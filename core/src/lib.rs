//! SecureChain Core Library
//!
//! The vote ledger: hash-linked blocks, proof-of-work admission and the
//! single-writer append protocol.

pub mod block;
pub mod ledger;
pub mod party;
pub mod pow;
pub mod store;

// Re-export main types
pub use block::{block_digest, Block, FIELD_SEPARATOR, GENESIS_PREVIOUS_HASH};
pub use ledger::{verify_chain, ChainFault, ChainVerification, Ledger, LedgerError};
pub use party::{Party, PartyError, PartyRegistry};
pub use pow::{ProofOfWork, DEFAULT_DIFFICULTY};
pub use store::{BlockStore, MemoryStore, PersistenceError};
