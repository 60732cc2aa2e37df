//! # Cryptography Module
//!
//! This module provides the cryptographic engine of Seedvault Core.
//!
//! ## Security Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    CRYPTOGRAPHIC ARCHITECTURE                           │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    KEY HIERARCHY                                │   │
//! │  ├─────────────────────────────────────────────────────────────────┤   │
//! │  │                                                                 │   │
//! │  │  Recovery Phrase (BIP39 - 12 to 24 words)                      │   │
//! │  │                          │                                      │   │
//! │  │                          ▼                                      │   │
//! │  │  ┌─────────────────────────────────────────────────────────┐   │   │
//! │  │  │              Entropy (16-32 bytes)                       │   │   │
//! │  │  │       Recovered exactly via the phrase checksum         │   │   │
//! │  │  └─────────────────────────────────────────────────────────┘   │   │
//! │  │                          │                                      │   │
//! │  │                          ▼                                      │   │
//! │  │  ┌─────────────────────────────────────────────────────────┐   │   │
//! │  │  │   Deterministic prime stream (HKDF-SHA256)              │   │   │
//! │  │  │   → RSA keypair (n, e, d, CRT params)                   │   │   │
//! │  │  │   Same phrase ⇒ same keypair, on every platform         │   │   │
//! │  │  └─────────────────────────────────────────────────────────┘   │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 ENVELOPE ENCRYPTION                             │   │
//! │  ├─────────────────────────────────────────────────────────────────┤   │
//! │  │                                                                 │   │
//! │  │  1. Fresh 256-bit AES key + 96-bit nonce per payload           │   │
//! │  │  2. AES-256-GCM over the bulk data (128-bit tag)               │   │
//! │  │  3. RSA-OAEP (SHA-256/MGF1) wraps only the AES key             │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Algorithm Choices & Rationale
//!
//! | Algorithm | Purpose | Why Chosen |
//! |-----------|---------|------------|
//! | BIP39 | Recovery phrase | User-friendly backup, standard |
//! | HKDF-SHA256 | Keygen stream | Industry standard, well-analyzed |
//! | RSA-OAEP | Key wrap | Remote party needs public-key-only encryption |
//! | AES-256-GCM | Bulk encryption | Hardware acceleration, AEAD |
//!
//! ## Security Considerations
//!
//! 1. **Deterministic keygen**: system randomness is banned inside the
//!    derivation path; everything flows from the entropy-keyed stream
//! 2. **Key Zeroization**: symmetric keys and recovered plaintext are
//!    zeroized when dropped
//! 3. **Oracle resistance**: every open/unwrap failure collapses to the
//!    same `None`
//! 4. **No key reuse**: a fresh symmetric key and nonce for every envelope

pub mod envelope;
pub mod keygen;
pub mod mnemonic;
pub mod rsa;

pub use envelope::{
    open_local, open_remote, seal_local, seal_remote, TransmissionPayload, NONCE_SIZE,
    SYMMETRIC_KEY_SIZE, TAG_SIZE,
};
pub use keygen::{
    derive_keypair, derive_keypair_with_progress, KeygenProgress, ProgressFn,
    MAX_PRIME_CANDIDATES, MILLER_RABIN_ROUNDS, MIN_ENTROPY_BYTES, PUBLIC_EXPONENT,
};
pub use mnemonic::{
    is_valid, validate, RecoveryPhrase, ValidationReport, SUPPORTED_ENTROPY_SIZES,
    SUPPORTED_WORD_COUNTS,
};
pub use rsa::{RsaKeyPair, RsaPrivateKey, RsaPublicKey};

/// Hard floor for RSA modulus size in bits; smaller requests are rejected
pub const MIN_KEY_SIZE_BITS: usize = 2048;

/// Largest supported RSA modulus size in bits
pub const MAX_KEY_SIZE_BITS: usize = 8192;

/// Key size used when none is specified (and for mnemonic recovery)
pub const DEFAULT_KEY_SIZE_BITS: usize = 2048;

/// Entropy drawn for a fresh keypair by default (24-word phrase)
pub const DEFAULT_ENTROPY_BYTES: usize = 32;

// ============================================================================
// TEST FIXTURES
// ============================================================================

/// Shared RSA fixtures so the test binary pays for key derivation once
#[cfg(test)]
pub(crate) mod testutil {
    use super::keygen::derive_keypair;
    use super::rsa::RsaKeyPair;
    use std::sync::OnceLock;

    /// Entropy behind [`test_keypair`]
    pub(crate) const TEST_ENTROPY: [u8; 32] = [7u8; 32];

    /// A 2048-bit keypair derived from [`TEST_ENTROPY`]
    pub(crate) fn test_keypair() -> &'static RsaKeyPair {
        static KP: OnceLock<RsaKeyPair> = OnceLock::new();
        KP.get_or_init(|| derive_keypair(&TEST_ENTROPY, 2048).expect("test keypair"))
    }

    /// A second keypair, for wrong-key scenarios
    pub(crate) fn alt_keypair() -> &'static RsaKeyPair {
        static KP: OnceLock<RsaKeyPair> = OnceLock::new();
        KP.get_or_init(|| derive_keypair(&[8u8; 32], 2048).expect("alt keypair"))
    }
}
