//! Durable chain store: one JSON document per block

use crate::StorageError;
use securechain_core::{Block, BlockStore, PersistenceError};
use std::fs;
use std::path::{Path, PathBuf};

/// Persists each block as `block_<index>.json`, all seven fields verbatim.
///
/// The zero-padded filename keeps lexical order equal to index order.
pub struct ChainStore {
    data_dir: PathBuf,
}

impl ChainStore {
    /// Open the chain directory, creating it if needed.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StorageError> {
        let data_dir = path.as_ref().to_path_buf();

        if !data_dir.exists() {
            fs::create_dir_all(&data_dir)?;
        }

        Ok(Self { data_dir })
    }

    fn block_path(&self, index: u64) -> PathBuf {
        self.data_dir.join(format!("block_{index:08}.json"))
    }

    /// Persist one block. Refuses to overwrite an existing index.
    pub fn append_block(&self, block: &Block) -> Result<(), StorageError> {
        let path = self.block_path(block.index);
        if path.exists() {
            return Err(StorageError::BlockExists(block.index));
        }

        let json = serde_json::to_string_pretty(block)
            .map_err(|e| StorageError::SerializationError(e.to_string()))?;
        fs::write(&path, json)?;

        Ok(())
    }

    /// Load every persisted block, ascending by index.
    pub fn load(&self) -> Result<Vec<Block>, StorageError> {
        let mut blocks = Vec::new();

        for entry in fs::read_dir(&self.data_dir)? {
            let path = entry?.path();
            if path.extension().and_then(|s| s.to_str()) != Some("json") {
                continue;
            }
            let contents = fs::read_to_string(&path)?;
            let block: Block = serde_json::from_str(&contents).map_err(|e| {
                StorageError::SerializationError(format!("{}: {}", path.display(), e))
            })?;
            blocks.push(block);
        }

        blocks.sort_by_key(|b| b.index);
        Ok(blocks)
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }
}

impl BlockStore for ChainStore {
    fn append(&self, block: &Block) -> Result<(), PersistenceError> {
        self.append_block(block).map_err(PersistenceError::from)
    }
}

impl From<StorageError> for PersistenceError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::IoError(e) => PersistenceError::Io(e),
            StorageError::SerializationError(msg) => PersistenceError::Serialization(msg),
            StorageError::BlockExists(index) => PersistenceError::Rejected {
                index,
                reason: "block already persisted".to_string(),
            },
            StorageError::SnapshotNotFound(name) => {
                PersistenceError::Serialization(format!("snapshot not found: {name}"))
            }
        }
    }
}
