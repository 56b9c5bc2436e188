//! SecureChain Storage Layer
//!
//! Two durable stores back the service:
//! - [`ChainStore`]: one JSON document per appended block
//! - [`SnapshotStore`]: named snapshots (voter roll) written as JSON for
//!   readability plus bincode for fast loading

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub mod chain;
pub use chain::ChainStore;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Snapshot not found: {0}")]
    SnapshotNotFound(String),

    #[error("Block {0} already persisted")]
    BlockExists(u64),
}

/// File-based store for named state snapshots.
pub struct SnapshotStore {
    data_dir: PathBuf,
}

impl SnapshotStore {
    /// Open the snapshot directory, creating it if needed.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StorageError> {
        let data_dir = path.as_ref().to_path_buf();

        if !data_dir.exists() {
            fs::create_dir_all(&data_dir)?;
        }

        Ok(Self { data_dir })
    }

    /// Save a snapshot (JSON for readability, bincode for speed).
    pub fn save<T: Serialize>(&self, name: &str, data: &T) -> Result<(), StorageError> {
        let json_path = self.data_dir.join(format!("{}.json", name));
        let bin_path = self.data_dir.join(format!("{}.bin", name));

        let json = serde_json::to_string_pretty(data)
            .map_err(|e| StorageError::SerializationError(e.to_string()))?;
        fs::write(&json_path, json)?;

        let bin = bincode::serialize(data)
            .map_err(|e| StorageError::SerializationError(e.to_string()))?;
        fs::write(&bin_path, bin)?;

        Ok(())
    }

    /// Load a snapshot (tries bincode first, falls back to JSON).
    pub fn load<T: for<'de> Deserialize<'de>>(&self, name: &str) -> Result<T, StorageError> {
        let bin_path = self.data_dir.join(format!("{}.bin", name));
        let json_path = self.data_dir.join(format!("{}.json", name));

        if bin_path.exists() {
            let data = fs::read(&bin_path)?;
            return bincode::deserialize(&data)
                .map_err(|e| StorageError::SerializationError(e.to_string()));
        }

        if json_path.exists() {
            let data = fs::read_to_string(&json_path)?;
            return serde_json::from_str(&data)
                .map_err(|e| StorageError::SerializationError(e.to_string()));
        }

        Err(StorageError::SnapshotNotFound(name.to_string()))
    }

    /// Check if a snapshot exists
    pub fn has(&self, name: &str) -> bool {
        let bin_path = self.data_dir.join(format!("{}.bin", name));
        let json_path = self.data_dir.join(format!("{}.json", name));
        bin_path.exists() || json_path.exists()
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }
}
