use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

use std::fmt;
use std::str::FromStr;

/// Errors that can occur during cryptographic operations
#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("Invalid public key: {0}")]
    InvalidPublicKey(String),

    #[error("Invalid signature: {0}")]
    InvalidSignature(String),

    #[error("Decoding error: {0}")]
    DecodingError(String),
}

/// Represents a public key in base58 format
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PublicKey(pub String);

impl PublicKey {
    /// Creates a new public key handle from a verifying key
    pub fn from_verifying_key(verifying_key: &VerifyingKey) -> Self {
        let encoded = bs58::encode(verifying_key.as_bytes()).into_string();
        PublicKey(encoded)
    }

    /// Converts the handle back to a verifying key
    pub fn to_verifying_key(&self) -> Result<VerifyingKey, CryptoError> {
        let bytes = bs58::decode(&self.0)
            .into_vec()
            .map_err(|e| CryptoError::DecodingError(e.to_string()))?;

        VerifyingKey::from_bytes(&bytes.try_into().map_err(|_| {
            CryptoError::InvalidPublicKey("Invalid public key bytes".to_string())
        })?)
        .map_err(|e| CryptoError::InvalidPublicKey(e.to_string()))
    }
}

impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Represents a digital signature
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DigitalSignature(pub String);

impl DigitalSignature {
    /// Creates a new digital signature from a signature
    pub fn from_signature(signature: &Signature) -> Self {
        let encoded = bs58::encode(signature.to_bytes()).into_string();
        DigitalSignature(encoded)
    }

    /// Converts the digital signature to a signature
    pub fn to_signature(&self) -> Result<Signature, CryptoError> {
        let bytes = bs58::decode(&self.0)
            .into_vec()
            .map_err(|e| CryptoError::DecodingError(e.to_string()))?;

        let signature_bytes: [u8; 64] = bytes.try_into().map_err(|_| {
            CryptoError::InvalidSignature("Invalid signature length".to_string())
        })?;

        Ok(Signature::from_bytes(&signature_bytes))
    }
}

impl fmt::Display for DigitalSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for DigitalSignature {
    type Err = CryptoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let signature = DigitalSignature(s.to_string());
        signature.to_signature()?;
        Ok(signature)
    }
}

/// An ed25519 keypair. The signing half never leaves this struct.
pub struct KeyPair {
    signing_key: SigningKey,
    public_key: PublicKey,
}

impl fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyPair")
            .field("public_key", &self.public_key)
            .finish_non_exhaustive()
    }
}

impl KeyPair {
    /// Generates a fresh keypair from the operating system's entropy source
    pub fn generate() -> Self {
        let mut csprng = OsRng;
        let signing_key = SigningKey::generate(&mut csprng);
        let public_key = PublicKey::from_verifying_key(&signing_key.verifying_key());

        KeyPair {
            signing_key,
            public_key,
        }
    }

    /// Gets the public half of the keypair
    pub fn public_key(&self) -> &PublicKey {
        &self.public_key
    }

    /// Signs a message with the private key
    pub fn sign(&self, message: &[u8]) -> DigitalSignature {
        let signature = self.signing_key.sign(message);
        DigitalSignature::from_signature(&signature)
    }
}

/// Verifies a signature against a message and public key.
///
/// A well-formed signature that does not match yields `Ok(false)`; only
/// undecodable key or signature text is an error.
pub fn verify_signature(
    message: &[u8],
    signature: &DigitalSignature,
    public_key: &PublicKey,
) -> Result<bool, CryptoError> {
    let signature = signature.to_signature()?;
    let verifying_key = public_key.to_verifying_key()?;

    Ok(verifying_key.verify(message, &signature).is_ok())
}

/// SHA-256 of `data` as 64 lowercase hex characters
pub fn sha256_hex(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keypair_generation() {
        let keypair = KeyPair::generate();
        assert!(!keypair.public_key().0.is_empty());

        let other = KeyPair::generate();
        assert_ne!(keypair.public_key(), other.public_key());
    }

    #[test]
    fn test_signing_and_verification() {
        let keypair = KeyPair::generate();
        let message = b"alice-bob-2";

        let signature = keypair.sign(message);
        assert!(verify_signature(message, &signature, keypair.public_key()).unwrap());

        // Verify with wrong message
        let wrong_message = b"alice-bob-3";
        assert!(!verify_signature(wrong_message, &signature, keypair.public_key()).unwrap());

        // Verify with someone else's key
        let stranger = KeyPair::generate();
        assert!(!verify_signature(message, &signature, stranger.public_key()).unwrap());
    }

    #[test]
    fn test_public_key_conversion() {
        let keypair = KeyPair::generate();
        let verifying_key = keypair.public_key().to_verifying_key().unwrap();
        assert_eq!(
            PublicKey::from_verifying_key(&verifying_key),
            *keypair.public_key()
        );
    }

    #[test]
    fn test_garbage_signature_is_an_error() {
        let keypair = KeyPair::generate();
        let garbage = DigitalSignature("not-base58-0OIl".to_string());
        assert!(verify_signature(b"msg", &garbage, keypair.public_key()).is_err());
        assert!("abc".parse::<DigitalSignature>().is_err());
    }

    #[test]
    fn test_sha256_hex() {
        assert_eq!(
            sha256_hex(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
        assert_eq!(sha256_hex(b"").len(), 64);
    }
}
