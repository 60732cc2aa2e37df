//! # Storage & Randomness Collaborators
//!
//! Platform capabilities consumed by the key manager, injected at
//! construction time.
//!
//! ## Collaborator Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     COLLABORATOR INTERFACES                             │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │  KeyStorage Trait                                               │   │
//! │  │  ────────────────                                                │   │
//! │  │                                                                 │   │
//! │  │  • get_item(key)    - Read a string value (None if absent)     │   │
//! │  │  • set_item(key, v) - Write/overwrite a string value           │   │
//! │  │  • remove_item(key) - Delete a key                             │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │  RandomSource Trait                                             │   │
//! │  │  ─────────────────                                               │   │
//! │  │                                                                 │   │
//! │  │  • fill(buffer)     - Fill a caller-provided buffer in place   │   │
//! │  │                       with cryptographically secure bytes      │   │
//! │  │                       (empty buffer is a no-op)                │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                                                         │
//! │  Platform Implementations:                                             │
//! │  ────────────────────────                                               │
//! │                                                                         │
//! │  ┌───────────────┐  ┌───────────────┐  ┌───────────────┐              │
//! │  │   Desktop     │  │    Mobile     │  │  Tests/Dev    │              │
//! │  │  OS keyring   │  │  Keychain /   │  │  MemoryKey-   │              │
//! │  │  (host app)   │  │  Keystore     │  │  Storage      │              │
//! │  │               │  │  (host app)   │  │  (built-in)   │              │
//! │  └───────────────┘  └───────────────┘  └───────────────┘              │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The engine itself never branches on platform. Host applications supply
//! whichever secure-storage backend fits their platform; [`MemoryKeyStorage`]
//! and [`OsRandom`] are the built-in stand-ins used by tests and by
//! [`KeyManager::with_defaults`](crate::KeyManager::with_defaults).

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;
use rand::rngs::OsRng;
use rand_core::RngCore;

use crate::error::{Error, Result};

/// Asynchronous keyed string storage
///
/// Backed by OS-level secure storage in production; keys are opaque string
/// identifiers chosen by the manager or its caller. Failures indicate an
/// environment problem and are propagated to the caller, never swallowed.
#[async_trait]
pub trait KeyStorage: Send + Sync {
    /// Read the value stored under `key`, or `None` if absent
    async fn get_item(&self, key: &str) -> Result<Option<String>>;

    /// Store `value` under `key`, overwriting any existing value
    async fn set_item(&self, key: &str, value: &str) -> Result<()>;

    /// Remove `key`; removing an absent key is not an error
    async fn remove_item(&self, key: &str) -> Result<()>;
}

/// Source of cryptographically secure random bytes
///
/// Fills a caller-provided buffer in place. Filling an empty buffer is a
/// no-op. Implementations must fail loudly (return `Err`) rather than
/// produce weak bytes.
#[async_trait]
pub trait RandomSource: Send + Sync {
    /// Fill `buffer` with cryptographically secure random bytes
    async fn fill(&self, buffer: &mut [u8]) -> Result<()>;
}

/// In-memory key storage for tests and development
///
/// Values live only as long as the instance. Production deployments should
/// inject a platform keychain/keystore adapter instead.
#[derive(Default)]
pub struct MemoryKeyStorage {
    memory: RwLock<HashMap<String, String>>,
}

impl MemoryKeyStorage {
    /// Create an empty in-memory store
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyStorage for MemoryKeyStorage {
    async fn get_item(&self, key: &str) -> Result<Option<String>> {
        let memory = self.memory.read();
        Ok(memory.get(key).cloned())
    }

    async fn set_item(&self, key: &str, value: &str) -> Result<()> {
        let mut memory = self.memory.write();
        memory.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove_item(&self, key: &str) -> Result<()> {
        let mut memory = self.memory.write();
        memory.remove(key);
        Ok(())
    }
}

/// Randomness from the operating system CSPRNG
///
/// Uses `getrandom`/`CryptGenRandom` under the hood via [`OsRng`].
#[derive(Default, Clone, Copy)]
pub struct OsRandom;

impl OsRandom {
    /// Create a new OS randomness source
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl RandomSource for OsRandom {
    async fn fill(&self, buffer: &mut [u8]) -> Result<()> {
        if buffer.is_empty() {
            return Ok(());
        }
        OsRng
            .try_fill_bytes(buffer)
            .map_err(|e| Error::RngFailed(e.to_string()))
    }
}

// ============================================================================
// TESTS
// ============================================================================
