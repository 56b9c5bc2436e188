//! SecureChain Cryptography
//!
//! Voter-identity digests, the node keypair and signed session tokens

use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use rand::rngs::OsRng;
use sha2::{Digest, Sha256};
use std::path::Path;
use thiserror::Error;

pub mod token;
pub use token::{Role, SessionClaims};

#[derive(Error, Debug)]
pub enum CryptoError {
    #[error("Invalid signature")]
    InvalidSignature,

    #[error("Invalid public key")]
    InvalidPublicKey,

    #[error("Invalid private key")]
    InvalidPrivateKey,

    #[error("Invalid token: {0}")]
    InvalidToken(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// The node's signing identity, used to issue session tokens.
#[derive(Clone)]
pub struct KeyPair {
    signing_key: SigningKey,
    verifying_key: VerifyingKey,
}

impl KeyPair {
    /// Generate new random keypair
    pub fn generate() -> Self {
        let signing_key = SigningKey::generate(&mut OsRng);
        let verifying_key = signing_key.verifying_key();

        Self {
            signing_key,
            verifying_key,
        }
    }

    /// Get public key as hex string
    pub fn public_key_hex(&self) -> String {
        hex::encode(self.verifying_key.as_bytes())
    }

    /// Create keypair from a 32-byte seed
    pub fn from_seed(seed: [u8; 32]) -> Self {
        let signing_key = SigningKey::from_bytes(&seed);
        let verifying_key = signing_key.verifying_key();

        Self {
            signing_key,
            verifying_key,
        }
    }

    /// Load the keypair seed from disk, generating and saving one on first run.
    pub fn load_or_generate<P: AsRef<Path>>(path: P) -> Result<Self, CryptoError> {
        let path = path.as_ref();
        if path.exists() {
            let bytes = std::fs::read(path)?;
            let seed: [u8; 32] = bytes
                .try_into()
                .map_err(|_| CryptoError::InvalidPrivateKey)?;
            return Ok(Self::from_seed(seed));
        }

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let keypair = Self::generate();
        std::fs::write(path, keypair.signing_key.to_bytes())?;
        Ok(keypair)
    }

    /// Sign message
    pub fn sign(&self, message: &[u8]) -> Vec<u8> {
        self.signing_key.sign(message).to_bytes().to_vec()
    }

    /// Verify a signature made by this keypair.
    pub fn verify(&self, message: &[u8], signature_bytes: &[u8]) -> Result<(), CryptoError> {
        let sig_array: [u8; 64] = signature_bytes
            .try_into()
            .map_err(|_| CryptoError::InvalidSignature)?;
        let signature = Signature::from_bytes(&sig_array);

        self.verifying_key
            .verify(message, &signature)
            .map_err(|_| CryptoError::InvalidSignature)
    }

    /// Verify a signature against a hex-encoded public key.
    pub fn verify_with_public_key(
        public_key_hex: &str,
        message: &[u8],
        signature_bytes: &[u8],
    ) -> Result<(), CryptoError> {
        let pub_key_bytes = hex::decode(public_key_hex).map_err(|_| CryptoError::InvalidPublicKey)?;

        let pub_key_array: [u8; 32] = pub_key_bytes
            .try_into()
            .map_err(|_| CryptoError::InvalidPublicKey)?;

        let verifying_key =
            VerifyingKey::from_bytes(&pub_key_array).map_err(|_| CryptoError::InvalidPublicKey)?;

        let sig_array: [u8; 64] = signature_bytes
            .try_into()
            .map_err(|_| CryptoError::InvalidSignature)?;

        let signature = Signature::from_bytes(&sig_array);

        verifying_key
            .verify(message, &signature)
            .map_err(|_| CryptoError::InvalidSignature)
    }
}

/// Digest a voter's authenticated identity (the mobile number).
///
/// SHA-256 of the raw identity, lowercase hex. The digest is what blocks
/// carry as `voter_id`; the raw identity never reaches the ledger. The
/// digest is unsalted, so the same voter produces the same digest across
/// elections.
pub fn voter_digest(mobile: &str) -> String {
    hex::encode(Sha256::digest(mobile.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keypair_generation() {
        let keypair = KeyPair::generate();
        assert_eq!(keypair.public_key_hex().len(), 64); // 32 bytes = 64 hex chars
    }

    #[test]
    fn test_sign_and_verify() {
        let keypair = KeyPair::generate();
        let message = b"test message";

        let signature = keypair.sign(message);
        assert!(keypair.verify(message, &signature).is_ok());
        assert!(
            KeyPair::verify_with_public_key(&keypair.public_key_hex(), message, &signature).is_ok()
        );
    }

    #[test]
    fn test_invalid_signature() {
        let keypair = KeyPair::generate();
        let signature = keypair.sign(b"test message");

        assert!(matches!(
            keypair.verify(b"wrong message", &signature),
            Err(CryptoError::InvalidSignature)
        ));
    }

    #[test]
    fn test_wrong_key_rejects() {
        let keypair = KeyPair::generate();
        let other = KeyPair::generate();
        let signature = keypair.sign(b"message");

        assert!(other.verify(b"message", &signature).is_err());
    }

    #[test]
    fn test_load_or_generate_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("node_key.bin");

        let first = KeyPair::load_or_generate(&path).unwrap();
        let second = KeyPair::load_or_generate(&path).unwrap();

        assert_eq!(first.public_key_hex(), second.public_key_hex());
    }

    #[test]
    fn test_voter_digest_known_vector() {
        // SHA-256("abc")
        assert_eq!(
            voter_digest("abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_voter_digest_is_stable_and_distinct() {
        assert_eq!(voter_digest("9876543210"), voter_digest("9876543210"));
        assert_ne!(voter_digest("9876543210"), voter_digest("9876543211"));
        assert_eq!(voter_digest("9876543210").len(), 64);
    }
}
