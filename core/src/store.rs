//! Persistence seam for appended blocks

use crate::block::Block;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PersistenceError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Store rejected block {index}: {reason}")]
    Rejected { index: u64, reason: String },
}

/// Durable sink for blocks, injected into the [`Ledger`](crate::Ledger).
///
/// `append` must either persist the block completely or fail; the ledger
/// discards the block on failure and never publishes it.
pub trait BlockStore: Send + Sync {
    fn append(&self, block: &Block) -> Result<(), PersistenceError>;
}

/// Store for ephemeral ledgers; the chain lives only in ledger memory.
#[derive(Debug, Default)]
pub struct MemoryStore;

impl BlockStore for MemoryStore {
    fn append(&self, _block: &Block) -> Result<(), PersistenceError> {
        Ok(())
    }
}
