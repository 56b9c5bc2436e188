//! Party catalog consulted before a vote is admitted

use crate::block::FIELD_SEPARATOR;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PartyError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid party file: {0}")]
    Parse(String),

    #[error("Invalid party id: {0:?}")]
    InvalidId(String),

    #[error("Duplicate party id: {0:?}")]
    DuplicateId(String),

    #[error("Party catalog is empty")]
    Empty,
}

/// One selectable choice on the ballot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Party {
    pub id: String,
    pub name: String,
    pub symbol: String,
    pub color: String,
}

/// The known party set for one election.
///
/// Party ids become part of block digest pre-images, so the registry rejects
/// ids that are empty or contain the digest field separator.
#[derive(Debug, Clone)]
pub struct PartyRegistry {
    parties: Vec<Party>,
}

impl PartyRegistry {
    pub fn new(parties: Vec<Party>) -> Result<Self, PartyError> {
        if parties.is_empty() {
            return Err(PartyError::Empty);
        }
        for (i, party) in parties.iter().enumerate() {
            if party.id.is_empty() || party.id.contains(FIELD_SEPARATOR) {
                return Err(PartyError::InvalidId(party.id.clone()));
            }
            if parties[..i].iter().any(|p| p.id == party.id) {
                return Err(PartyError::DuplicateId(party.id.clone()));
            }
        }
        Ok(Self { parties })
    }

    /// Load a catalog from a JSON array of party objects.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, PartyError> {
        let contents = std::fs::read_to_string(path)?;
        let parties: Vec<Party> =
            serde_json::from_str(&contents).map_err(|e| PartyError::Parse(e.to_string()))?;
        Self::new(parties)
    }

    pub fn get(&self, id: &str) -> Option<&Party> {
        self.parties.iter().find(|p| p.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    pub fn parties(&self) -> &[Party] {
        &self.parties
    }
}

impl Default for PartyRegistry {
    /// The standard four-party ballot.
    fn default() -> Self {
        let parties = vec![
            Party {
                id: "p1".to_string(),
                name: "Liberty Alliance".to_string(),
                symbol: "🗽".to_string(),
                color: "blue".to_string(),
            },
            Party {
                id: "p2".to_string(),
                name: "Green Growth".to_string(),
                symbol: "🌿".to_string(),
                color: "green".to_string(),
            },
            Party {
                id: "p3".to_string(),
                name: "Digital Progress".to_string(),
                symbol: "💻".to_string(),
                color: "purple".to_string(),
            },
            Party {
                id: "p4".to_string(),
                name: "Heritage Front".to_string(),
                symbol: "🏰".to_string(),
                color: "amber".to_string(),
            },
        ];
        Self { parties }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_catalog() {
        let registry = PartyRegistry::default();
        assert_eq!(registry.parties().len(), 4);
        assert!(registry.contains("p1"));
        assert!(registry.contains("p4"));
        assert!(!registry.contains("p5"));
        assert_eq!(registry.get("p2").unwrap().name, "Green Growth");
    }

    #[test]
    fn test_rejects_separator_in_id() {
        let party = Party {
            id: "p|1".to_string(),
            name: "Bad".to_string(),
            symbol: "x".to_string(),
            color: "red".to_string(),
        };
        assert!(matches!(
            PartyRegistry::new(vec![party]),
            Err(PartyError::InvalidId(_))
        ));
    }

    #[test]
    fn test_rejects_duplicate_ids() {
        let mut parties = PartyRegistry::default().parties().to_vec();
        parties.push(parties[0].clone());
        assert!(matches!(
            PartyRegistry::new(parties),
            Err(PartyError::DuplicateId(_))
        ));
    }

    #[test]
    fn test_rejects_empty_catalog() {
        assert!(matches!(PartyRegistry::new(vec![]), Err(PartyError::Empty)));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        let json = serde_json::to_string(PartyRegistry::default().parties()).unwrap();
        file.write_all(json.as_bytes()).unwrap();

        let registry = PartyRegistry::from_file(file.path()).unwrap();
        assert_eq!(registry.parties().len(), 4);
        assert!(registry.contains("p3"));
    }

    #[test]
    fn test_load_rejects_malformed_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"not json").unwrap();
        assert!(matches!(
            PartyRegistry::from_file(file.path()),
            Err(PartyError::Parse(_))
        ));
    }
}
