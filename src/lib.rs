//! # Seedvault Core
//!
//! A cross-platform cryptographic key manager providing hybrid RSA + AES
//! encryption with a human-recoverable backup mechanism: the keypair is
//! regenerated deterministically from a memorized word phrase instead of
//! a raw key file.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      SEEDVAULT CORE MODULES                             │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │                    ┌──────────────────────────┐                         │
//! │                    │       KeyManager         │                         │
//! │                    │                          │                         │
//! │                    │ - Generate / Recover     │                         │
//! │                    │ - Encrypt / Decrypt      │                         │
//! │                    │ - Persist / Load         │                         │
//! │                    └───────┬──────────┬───────┘                         │
//! │                            │          │                                 │
//! │          ┌─────────────────┘          └──────────────┐                  │
//! │          ▼                                           ▼                  │
//! │  ┌───────────────────────────┐      ┌─────────────────────────────┐    │
//! │  │         Crypto            │      │    Collaborators            │    │
//! │  │                           │      │                             │    │
//! │  │ - Mnemonic codec (BIP39)  │      │ - KeyStorage (get/set/rm)   │    │
//! │  │ - Deterministic keygen    │      │ - RandomSource (fill)       │    │
//! │  │ - RSA-OAEP key wrap       │      │ - Injected per platform     │    │
//! │  │ - AES-256-GCM envelopes   │      │                             │    │
//! │  └───────────────────────────┘      └─────────────────────────────┘    │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Hierarchy
//!
//! - [`error`] - Error types for the entire library
//! - [`crypto`] - The engine: mnemonic codec, deterministic key
//!   generation, envelope encryption
//! - [`storage`] - Collaborator traits plus in-memory and OS-RNG stand-ins
//! - [`manager`] - The stateful façade applications use
//! - [`config`] - Per-manager configuration
//!
//! ## Security Model
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          SECURITY LAYERS                                │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  Layer 1: Deterministic Key Derivation                                  │
//! │  ──────────────────────────────────────                                 │
//! │  The keypair is a pure function of the mnemonic's entropy. The word    │
//! │  phrase, written down once, is the only backup a user ever needs.      │
//! │                                                                         │
//! │  Layer 2: Envelope Encryption (RSA-OAEP + AES-256-GCM)                 │
//! │  ──────────────────────────────────────────────────────                 │
//! │  Bulk data is encrypted under a fresh symmetric key per payload;       │
//! │  only that key is wrapped asymmetrically, so a remote party holding    │
//! │  nothing but the public key can receive sealed payloads.               │
//! │                                                                         │
//! │  Layer 3: Oracle-Resistant Failure Handling                             │
//! │  ──────────────────────────────────────────                             │
//! │  Malformed envelopes, wrong keys, and forged ciphertexts all           │
//! │  produce the same null result; nothing partially decrypted is ever     │
//! │  returned and no error message carries key material.                   │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```ignore
//! use seedvault_core::KeyManager;
//!
//! let mut manager = KeyManager::with_defaults();
//! manager.generate_keypair(2048).await?;
//!
//! // Show exactly once; this phrase recreates the keypair anywhere
//! println!("{}", manager.mnemonic_phrase().unwrap());
//!
//! let sealed = manager.encrypt_for_local_storage(b"secret").await?.unwrap();
//! let opened = manager.decrypt_from_local_storage(&sealed).unwrap();
//! assert_eq!(&*opened, b"secret");
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

// ============================================================================
// MODULE DECLARATIONS
// ============================================================================

pub mod config;
pub mod crypto;
pub mod error;
pub mod manager;
pub mod storage;

// ============================================================================
// RE-EXPORTS
// ============================================================================

pub use config::ManagerConfig;
pub use crypto::{
    RecoveryPhrase, RsaKeyPair, RsaPublicKey, TransmissionPayload, ValidationReport,
    DEFAULT_KEY_SIZE_BITS, MIN_KEY_SIZE_BITS,
};
pub use error::{Error, Result};
pub use manager::KeyManager;
pub use storage::{KeyStorage, MemoryKeyStorage, OsRandom, RandomSource};
