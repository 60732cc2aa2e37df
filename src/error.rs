//! # Error Handling
//!
//! This module provides the error types for Seedvault Core.
//!
//! ## Error Hierarchy
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                           ERROR HIERARCHY                               │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  Error (top-level)                                                     │
//! │  │                                                                      │
//! │  ├── Mnemonic Errors                                                   │
//! │  │   ├── InvalidRecoveryPhrase  - Word count/wordlist/checksum failure │
//! │  │   └── UnsupportedEntropySize - Entropy length not a BIP39 class     │
//! │  │                                                                      │
//! │  ├── Key Generation Errors                                             │
//! │  │   ├── KeySizeTooSmall        - Below the 2048-bit floor            │
//! │  │   ├── KeySizeUnsupported     - Not a usable modulus size           │
//! │  │   ├── InsufficientEntropy    - Seed too short for requested size   │
//! │  │   ├── PrimeSearchExhausted   - Candidate budget spent              │
//! │  │   └── KeyDerivationFailed    - Arithmetic failure during derivation│
//! │  │                                                                      │
//! │  ├── Crypto Errors                                                     │
//! │  │   ├── EncryptionFailed       - Seal operation failed               │
//! │  │   ├── DecryptionFailed       - Open operation failed (no detail)   │
//! │  │   ├── MessageTooLong         - Payload exceeds OAEP capacity       │
//! │  │   └── RngFailed              - Randomness collaborator failure     │
//! │  │                                                                      │
//! │  ├── Storage Errors                                                    │
//! │  │   ├── StorageReadError       - Storage collaborator read failure   │
//! │  │   ├── StorageWriteError      - Storage collaborator write failure  │
//! │  │   └── CorruptKeyMaterial     - Persisted keys failed to decode     │
//! │  │                                                                      │
//! │  └── Internal Errors                                                   │
//! │      └── SerializationError     - Payload encode/decode failure       │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Boundary policy
//!
//! The public manager surface collapses expected, checkable failures
//! (bad key size, malformed phrase, malformed envelope, wrong key) into
//! `false`/`None` results. `Error` values cross the boundary only for
//! collaborator failures, which indicate an environment problem outside
//! this engine's control. No error message ever contains key bytes,
//! entropy, or phrase words.

use thiserror::Error;

/// Result type alias for Seedvault Core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for Seedvault Core
///
/// Errors are categorized by module/domain. Numeric codes are stable and
/// intended for host applications that log or map errors across an FFI or
/// IPC boundary.
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Mnemonic Errors (100-199)
    // ========================================================================
    /// Recovery phrase failed word-count, wordlist, or checksum validation
    #[error("Invalid recovery phrase: {0}")]
    InvalidRecoveryPhrase(String),

    /// Entropy length is not one of the supported BIP39 size classes
    #[error("Unsupported entropy size: {0} bytes")]
    UnsupportedEntropySize(usize),

    // ========================================================================
    // Key Generation Errors (200-299)
    // ========================================================================
    /// Requested key size is below the hard floor
    #[error("Key size {0} bits is below the {min}-bit minimum", min = crate::crypto::MIN_KEY_SIZE_BITS)]
    KeySizeTooSmall(usize),

    /// Requested key size is above the ceiling or not byte-aligned
    #[error("Key size {0} bits is not supported")]
    KeySizeUnsupported(usize),

    /// Seed entropy is too short for the requested key size
    #[error("Insufficient entropy: got {got} bytes, need at least {need}")]
    InsufficientEntropy {
        /// Bytes of entropy provided
        got: usize,
        /// Minimum bytes required
        need: usize,
    },

    /// The bounded prime search spent its whole candidate budget
    #[error("Prime search exhausted its candidate budget")]
    PrimeSearchExhausted,

    /// Key derivation failed
    #[error("Failed to derive keys: {0}")]
    KeyDerivationFailed(String),

    // ========================================================================
    // Crypto Errors (300-399)
    // ========================================================================
    /// Encryption failed
    #[error("Encryption failed: {0}")]
    EncryptionFailed(String),

    /// Decryption failed. Deliberately carries no detail: format errors,
    /// unwrap failures, and authentication failures are indistinguishable.
    #[error("Decryption failed")]
    DecryptionFailed,

    /// Plaintext exceeds what the asymmetric padding can carry
    #[error("Message of {got} bytes exceeds the {max}-byte wrap capacity")]
    MessageTooLong {
        /// Bytes supplied
        got: usize,
        /// Maximum the padding scheme can carry
        max: usize,
    },

    /// The randomness collaborator failed to produce bytes
    #[error("Random number generation failed: {0}")]
    RngFailed(String),

    // ========================================================================
    // Storage Errors (400-499)
    // ========================================================================
    /// Failed to read from the storage collaborator
    #[error("Failed to read from storage: {0}")]
    StorageReadError(String),

    /// Failed to write to the storage collaborator
    #[error("Failed to write to storage: {0}")]
    StorageWriteError(String),

    /// Persisted key material was present but failed to decode
    #[error("Persisted key material is corrupt: {0}")]
    CorruptKeyMaterial(String),

    // ========================================================================
    // Internal Errors (900-999)
    // ========================================================================
    /// Serialization error
    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl Error {
    /// Get the stable numeric code for this error
    ///
    /// Codes are organized by category:
    /// - 100-199: Mnemonic
    /// - 200-299: Key generation
    /// - 300-399: Crypto
    /// - 400-499: Storage
    /// - 900-999: Internal
    pub fn code(&self) -> i32 {
        match self {
            // Mnemonic (100-199)
            Error::InvalidRecoveryPhrase(_) => 100,
            Error::UnsupportedEntropySize(_) => 101,

            // Key generation (200-299)
            Error::KeySizeTooSmall(_) => 200,
            Error::KeySizeUnsupported(_) => 201,
            Error::InsufficientEntropy { .. } => 202,
            Error::PrimeSearchExhausted => 203,
            Error::KeyDerivationFailed(_) => 204,

            // Crypto (300-399)
            Error::EncryptionFailed(_) => 300,
            Error::DecryptionFailed => 301,
            Error::MessageTooLong { .. } => 302,
            Error::RngFailed(_) => 303,

            // Storage (400-499)
            Error::StorageReadError(_) => 400,
            Error::StorageWriteError(_) => 401,
            Error::CorruptKeyMaterial(_) => 402,

            // Internal (900-999)
            Error::SerializationError(_) => 900,
        }
    }

    /// Check whether this error came from an external collaborator
    ///
    /// Collaborator failures are the only errors the manager surface
    /// propagates as `Err`; everything else collapses to `false`/`None`.
    pub fn is_collaborator_failure(&self) -> bool {
        matches!(
            self,
            Error::RngFailed(_) | Error::StorageReadError(_) | Error::StorageWriteError(_)
        )
    }
}

// ============================================================================
// ERROR CONVERSIONS
// ============================================================================

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::SerializationError(err.to_string())
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(Error::InvalidRecoveryPhrase("test".into()).code(), 100);
        assert_eq!(Error::KeySizeTooSmall(1024).code(), 200);
        assert_eq!(Error::EncryptionFailed("test".into()).code(), 300);
        assert_eq!(Error::StorageReadError("test".into()).code(), 400);
        assert_eq!(Error::SerializationError("test".into()).code(), 900);
    }

    #[test]
    fn test_collaborator_failures() {
        assert!(Error::RngFailed("no entropy".into()).is_collaborator_failure());
        assert!(Error::StorageWriteError("disk".into()).is_collaborator_failure());
        assert!(!Error::DecryptionFailed.is_collaborator_failure());
        assert!(!Error::KeySizeTooSmall(512).is_collaborator_failure());
    }

    #[test]
    fn test_decryption_error_carries_no_detail() {
        let msg = Error::DecryptionFailed.to_string();
        assert_eq!(msg, "Decryption failed");
    }
}
