//! # Key Lifecycle Manager
//!
//! The stateful façade applications use: generation, recovery, envelope
//! encryption, and persistence through the injected collaborators.
//!
//! ## Lifecycle
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      KEY MANAGER LIFECYCLE                              │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │                   ┌───────────────────┐                                 │
//! │                   │   Uninitialized   │                                 │
//! │                   │                   │◄───────────┐                    │
//! │                   └─────────┬─────────┘            │                    │
//! │                             │                      │                    │
//! │        generate_keypair ────┤                      │                    │
//! │        recover_from_mnemonic┤                 clear_keys                │
//! │        load_persisted_keys ─┤                      │                    │
//! │                             ▼                      │                    │
//! │                   ┌───────────────────┐            │                    │
//! │                   │       Ready       │────────────┘                    │
//! │                   │  (keypair held)   │                                 │
//! │                   └─────────┬─────────┘                                 │
//! │                             │                                           │
//! │                             ▼                                           │
//! │        encrypt_for_local_storage / decrypt_from_local_storage          │
//! │        prepare_for_remote_transmission / decrypt_remote_...            │
//! │        persist_keys                                                    │
//! │                                                                         │
//! │  Encrypt/decrypt on an Uninitialized manager returns None — an         │
//! │  expected, checkable condition, never a panic.                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Each manager instance holds at most one keypair and shares nothing
//! with other instances; callers driving a single instance from several
//! logical threads of control must serialize access themselves, since
//! generate/recover replace the held keypair.

use std::sync::Arc;

use zeroize::Zeroizing;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;

use crate::config::ManagerConfig;
use crate::crypto::mnemonic::RecoveryPhrase;
use crate::crypto::{envelope, keygen, RsaKeyPair, MIN_KEY_SIZE_BITS};
use crate::error::{Error, Result};
use crate::storage::{KeyStorage, MemoryKeyStorage, OsRandom, RandomSource};

/// Explicit manager state; transitions only through generate, recover,
/// load, and clear
enum KeyState {
    /// No keypair held
    Uninitialized,
    /// Keypair held; `mnemonic` is present only when this keypair came
    /// from generation or recovery in this instance
    Ready {
        keypair: RsaKeyPair,
        mnemonic: Option<RecoveryPhrase>,
    },
}

/// Stateful key manager over injected storage and randomness collaborators
///
/// ## Example
///
/// ```ignore
/// let mut manager = KeyManager::with_defaults();
/// manager.generate_keypair(2048).await?;
/// let phrase = manager.mnemonic_phrase().unwrap(); // show to the user once
/// let blob = manager.encrypt_for_local_storage(b"secret").await?.unwrap();
/// ```
pub struct KeyManager {
    storage: Arc<dyn KeyStorage>,
    random: Arc<dyn RandomSource>,
    config: ManagerConfig,
    state: KeyState,
}

impl KeyManager {
    /// Create a manager with explicit collaborators
    pub fn new(
        storage: Arc<dyn KeyStorage>,
        random: Arc<dyn RandomSource>,
        config: ManagerConfig,
    ) -> Self {
        Self {
            storage,
            random,
            config,
            state: KeyState::Uninitialized,
        }
    }

    /// Create a manager with in-memory storage and OS randomness
    ///
    /// The right choice for tests and host processes that handle
    /// persistence themselves; production apps on platforms with a
    /// keychain/keystore should inject their own [`KeyStorage`].
    pub fn with_defaults() -> Self {
        Self::new(
            Arc::new(MemoryKeyStorage::new()),
            Arc::new(OsRandom::new()),
            ManagerConfig::default(),
        )
    }

    // ========================================================================
    // LIFECYCLE
    // ========================================================================

    /// Generate a fresh keypair and its recovery phrase
    ///
    /// Returns `Ok(false)` if `key_size_bits` is below the 2048-bit floor
    /// or derivation fails; the previous state is left untouched in that
    /// case. A randomness-collaborator failure propagates as `Err`.
    pub async fn generate_keypair(&mut self, key_size_bits: usize) -> Result<bool> {
        if key_size_bits < MIN_KEY_SIZE_BITS {
            tracing::warn!(
                "Rejected key generation request for {} bits (minimum {})",
                key_size_bits,
                MIN_KEY_SIZE_BITS
            );
            return Ok(false);
        }

        let mut entropy = Zeroizing::new(vec![0u8; self.config.entropy_bytes]);
        self.random.fill(&mut entropy).await?;

        let mnemonic = match RecoveryPhrase::from_entropy(&entropy) {
            Ok(m) => m,
            Err(e) => {
                tracing::warn!("Mnemonic encoding failed: {}", e);
                return Ok(false);
            }
        };

        match keygen::derive_keypair(&entropy, key_size_bits) {
            Ok(keypair) => {
                tracing::info!(
                    "Generated {}-bit keypair (fingerprint {})",
                    key_size_bits,
                    keypair.public.fingerprint()
                );
                self.state = KeyState::Ready {
                    keypair,
                    mnemonic: Some(mnemonic),
                };
                Ok(true)
            }
            Err(e) => {
                tracing::warn!("Key generation failed: {}", e);
                Ok(false)
            }
        }
    }

    /// Recover the keypair encoded by a previously issued phrase
    ///
    /// Pure computation over the phrase: no collaborator is involved, so
    /// the result is a plain `bool`. Any word-count, wordlist, or checksum
    /// failure — including empty or whitespace-only input — returns
    /// `false` and leaves the state untouched. Recovery derives at the
    /// configured default key size, which must match the size the phrase
    /// was generated with.
    pub fn recover_from_mnemonic(&mut self, phrase: &str) -> bool {
        let recovery = match RecoveryPhrase::from_phrase(phrase) {
            Ok(r) => r,
            Err(e) => {
                tracing::debug!("Recovery phrase rejected: {}", e);
                return false;
            }
        };

        let entropy = recovery.entropy();
        match keygen::derive_keypair(&entropy, self.config.default_key_size_bits) {
            Ok(keypair) => {
                tracing::info!(
                    "Recovered {}-bit keypair from mnemonic (fingerprint {})",
                    keypair.key_size_bits,
                    keypair.public.fingerprint()
                );
                self.state = KeyState::Ready {
                    keypair,
                    mnemonic: Some(recovery),
                };
                true
            }
            Err(e) => {
                tracing::warn!("Key recovery failed: {}", e);
                false
            }
        }
    }

    /// Drop the held keypair (and phrase) and return to Uninitialized
    pub fn clear_keys(&mut self) {
        tracing::debug!("Clearing in-memory key state");
        self.state = KeyState::Uninitialized;
    }

    // ========================================================================
    // ENVELOPE OPERATIONS
    // ========================================================================

    /// Encrypt a payload into the compact local-storage envelope
    ///
    /// `Ok(None)` when no keypair is held; `Err` only for a randomness
    /// collaborator failure.
    pub async fn encrypt_for_local_storage(&self, data: &[u8]) -> Result<Option<Vec<u8>>> {
        let keypair = match &self.state {
            KeyState::Ready { keypair, .. } => keypair,
            KeyState::Uninitialized => {
                tracing::debug!("Encrypt requested before any keypair exists");
                return Ok(None);
            }
        };

        match envelope::seal_local(&keypair.public, data, self.random.as_ref()).await {
            Ok(blob) => Ok(Some(blob)),
            Err(e) if e.is_collaborator_failure() => Err(e),
            Err(e) => {
                tracing::warn!("Local encryption failed: {}", e);
                Ok(None)
            }
        }
    }

    /// Decrypt a local-storage envelope
    ///
    /// `None` for a missing keypair, malformed envelope, wrong key, or
    /// failed authentication — indistinguishable by design.
    pub fn decrypt_from_local_storage(&self, blob: &[u8]) -> Option<Zeroizing<Vec<u8>>> {
        match &self.state {
            KeyState::Ready { keypair, .. } => envelope::open_local(&keypair.private, blob),
            KeyState::Uninitialized => None,
        }
    }

    /// Encrypt a payload for remote transmission
    ///
    /// Returns the UTF-8 bytes of a JSON record with `encrypted_key` and
    /// `encrypted_data` fields; `Ok(None)` when no keypair is held.
    pub async fn prepare_for_remote_transmission(&self, data: &[u8]) -> Result<Option<Vec<u8>>> {
        let keypair = match &self.state {
            KeyState::Ready { keypair, .. } => keypair,
            KeyState::Uninitialized => {
                tracing::debug!("Remote encrypt requested before any keypair exists");
                return Ok(None);
            }
        };

        match envelope::seal_remote(&keypair.public, data, self.random.as_ref()).await {
            Ok(payload) => match serde_json::to_vec(&payload) {
                Ok(bytes) => Ok(Some(bytes)),
                Err(e) => {
                    tracing::warn!("Payload serialization failed: {}", e);
                    Ok(None)
                }
            },
            Err(e) if e.is_collaborator_failure() => Err(e),
            Err(e) => {
                tracing::warn!("Remote encryption failed: {}", e);
                Ok(None)
            }
        }
    }

    /// Decrypt the two fields of a transmission payload
    pub fn decrypt_remote_transmission_data(
        &self,
        encrypted_key: &str,
        encrypted_data: &str,
    ) -> Option<Zeroizing<Vec<u8>>> {
        match &self.state {
            KeyState::Ready { keypair, .. } => {
                envelope::open_remote(&keypair.private, encrypted_key, encrypted_data)
            }
            KeyState::Uninitialized => None,
        }
    }

    // ========================================================================
    // PERSISTENCE
    // ========================================================================

    /// Persist the held keypair through the storage collaborator
    ///
    /// The serialized keypair contains private material; the collaborator
    /// is expected to be OS-level secure storage. Returns `Ok(false)` when
    /// no keypair is held.
    pub async fn persist_keys(&self) -> Result<bool> {
        let keypair = match &self.state {
            KeyState::Ready { keypair, .. } => keypair,
            KeyState::Uninitialized => return Ok(false),
        };

        let bytes = keypair.to_bytes();
        let encoded = Zeroizing::new(BASE64.encode(&*bytes));
        self.storage
            .set_item(&self.config.keypair_storage_key(), &encoded)
            .await?;

        tracing::info!(
            "Persisted keypair (fingerprint {})",
            keypair.public.fingerprint()
        );
        Ok(true)
    }

    /// Load a previously persisted keypair
    ///
    /// `Ok(false)` when nothing is stored. Stored-but-undecodable material
    /// surfaces as [`Error::CorruptKeyMaterial`] rather than being
    /// silently discarded. A loaded keypair has no associated mnemonic.
    pub async fn load_persisted_keys(&mut self) -> Result<bool> {
        let encoded = match self
            .storage
            .get_item(&self.config.keypair_storage_key())
            .await?
        {
            Some(v) => v,
            None => return Ok(false),
        };

        let bytes = Zeroizing::new(
            BASE64
                .decode(encoded.trim())
                .map_err(|e| Error::CorruptKeyMaterial(format!("bad base64: {}", e)))?,
        );
        let keypair = RsaKeyPair::from_bytes(&bytes)?;

        tracing::info!(
            "Loaded persisted {}-bit keypair (fingerprint {})",
            keypair.key_size_bits,
            keypair.public.fingerprint()
        );
        self.state = KeyState::Ready {
            keypair,
            mnemonic: None,
        };
        Ok(true)
    }

    /// Remove any persisted keypair from storage
    pub async fn clear_persisted_keys(&self) -> Result<()> {
        self.storage
            .remove_item(&self.config.keypair_storage_key())
            .await
    }

    // ========================================================================
    // READ-ONLY STATE
    // ========================================================================

    /// Whether a keypair is currently held
    pub fn is_key_generated(&self) -> bool {
        matches!(self.state, KeyState::Ready { .. })
    }

    /// Exported public key, or `None` when no keypair is held
    pub fn public_key_string(&self) -> Option<String> {
        match &self.state {
            KeyState::Ready { keypair, .. } => Some(keypair.public.to_export_string()),
            KeyState::Uninitialized => None,
        }
    }

    /// The phrase for the held keypair, or `None` once a different or no
    /// keypair is active
    ///
    /// ## Security Warning
    ///
    /// Show to the user once; never log or store.
    pub fn mnemonic_phrase(&self) -> Option<String> {
        match &self.state {
            KeyState::Ready { mnemonic, .. } => mnemonic.as_ref().map(|m| m.phrase()),
            KeyState::Uninitialized => None,
        }
    }

    /// Size of the held keypair in bits, if any
    pub fn key_size_bits(&self) -> Option<usize> {
        match &self.state {
            KeyState::Ready { keypair, .. } => Some(keypair.key_size_bits),
            KeyState::Uninitialized => None,
        }
    }
}

// Never expose key material through Debug
impl std::fmt::Debug for KeyManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = match &self.state {
            KeyState::Ready { keypair, .. } => format!(
                "Ready({} bits, fingerprint {})",
                keypair.key_size_bits,
                keypair.public.fingerprint()
            ),
            KeyState::Uninitialized => "Uninitialized".to_string(),
        };
        f.debug_struct("KeyManager").field("state", &state).finish()
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::testutil::test_keypair;
    use crate::crypto::TransmissionPayload;

    /// Manager pre-loaded with the shared fixture keypair, avoiding a
    /// fresh prime search per test
    async fn ready_manager() -> KeyManager {
        let storage = Arc::new(MemoryKeyStorage::new());
        let encoded = BASE64.encode(&*test_keypair().to_bytes());
        storage
            .set_item("seedvault.keypair.v1", &encoded)
            .await
            .unwrap();

        let mut manager = KeyManager::new(
            storage,
            Arc::new(OsRandom::new()),
            ManagerConfig::default(),
        );
        assert!(manager.load_persisted_keys().await.unwrap());
        manager
    }

    #[tokio::test]
    async fn test_generate_keypair_and_clear() {
        let mut manager = KeyManager::with_defaults();
        assert!(!manager.is_key_generated());

        assert!(manager.generate_keypair(2048).await.unwrap());
        assert!(manager.is_key_generated());
        assert_eq!(manager.key_size_bits(), Some(2048));
        assert!(manager.public_key_string().is_some());

        let phrase = manager.mnemonic_phrase().unwrap();
        assert_eq!(phrase.split_whitespace().count(), 24);

        manager.clear_keys();
        assert!(!manager.is_key_generated());
        assert!(manager.mnemonic_phrase().is_none());
        assert!(manager.public_key_string().is_none());
    }

    #[tokio::test]
    async fn test_generate_rejects_key_size_below_minimum() {
        let mut manager = KeyManager::with_defaults();
        assert!(!manager.generate_keypair(1024).await.unwrap());
        assert!(!manager.is_key_generated());
        assert!(manager.mnemonic_phrase().is_none());
    }

    #[tokio::test]
    async fn test_local_round_trip() {
        let manager = ready_manager().await;

        let encrypted = manager
            .encrypt_for_local_storage(b"hello world")
            .await
            .unwrap()
            .unwrap();
        assert!(!encrypted.is_empty());

        let decrypted = manager.decrypt_from_local_storage(&encrypted).unwrap();
        assert_eq!(&*decrypted, b"hello world");
    }

    #[tokio::test]
    async fn test_operations_without_keys_return_none() {
        let manager = KeyManager::with_defaults();

        assert!(manager.decrypt_from_local_storage(&[0u8; 100]).is_none());
        assert!(manager
            .encrypt_for_local_storage(b"data")
            .await
            .unwrap()
            .is_none());
        assert!(manager
            .prepare_for_remote_transmission(b"data")
            .await
            .unwrap()
            .is_none());
        assert!(manager
            .decrypt_remote_transmission_data("a2V5", "ZGF0YQ==")
            .is_none());
        assert!(!manager.persist_keys().await.unwrap());
    }

    #[tokio::test]
    async fn test_decrypt_rejects_short_payload() {
        let manager = ready_manager().await;
        assert!(manager.decrypt_from_local_storage(&[0u8; 4]).is_none());
        assert!(manager.decrypt_from_local_storage(&[]).is_none());
    }

    #[tokio::test]
    async fn test_recover_rejects_invalid_phrases() {
        let mut manager = KeyManager::with_defaults();
        assert!(!manager.recover_from_mnemonic("not valid words"));
        assert!(!manager.recover_from_mnemonic("   "));
        assert!(!manager.recover_from_mnemonic(""));
        assert!(!manager.is_key_generated());
    }

    #[tokio::test]
    async fn test_cross_manager_recovery() {
        let mut manager_a = KeyManager::with_defaults();
        assert!(manager_a.generate_keypair(2048).await.unwrap());
        let phrase = manager_a.mnemonic_phrase().unwrap();

        let mut manager_b = KeyManager::with_defaults();
        assert!(manager_b.recover_from_mnemonic(&phrase));
        assert_eq!(manager_a.public_key_string(), manager_b.public_key_string());
        assert_eq!(manager_b.mnemonic_phrase(), Some(phrase));

        let encrypted = manager_a
            .encrypt_for_local_storage(b"recovered secret")
            .await
            .unwrap()
            .unwrap();
        let decrypted = manager_b.decrypt_from_local_storage(&encrypted).unwrap();
        assert_eq!(&*decrypted, b"recovered secret");
    }

    #[tokio::test]
    async fn test_remote_round_trip() {
        let manager = ready_manager().await;

        let bytes = manager
            .prepare_for_remote_transmission(b"remote payload")
            .await
            .unwrap()
            .unwrap();
        let payload: TransmissionPayload = serde_json::from_slice(&bytes).unwrap();
        assert!(!payload.encrypted_key.is_empty());
        assert!(!payload.encrypted_data.is_empty());

        let decrypted = manager
            .decrypt_remote_transmission_data(&payload.encrypted_key, &payload.encrypted_data)
            .unwrap();
        assert_eq!(&*decrypted, b"remote payload");
    }

    #[tokio::test]
    async fn test_persistence_round_trip() {
        let storage = Arc::new(MemoryKeyStorage::new());
        let mut manager_a = ready_manager().await;
        manager_a.storage = storage.clone();
        assert!(manager_a.persist_keys().await.unwrap());

        let mut manager_b = KeyManager::new(
            storage.clone(),
            Arc::new(OsRandom::new()),
            ManagerConfig::default(),
        );
        assert!(manager_b.load_persisted_keys().await.unwrap());
        // Loaded keypairs carry no phrase
        assert!(manager_b.mnemonic_phrase().is_none());

        let encrypted = manager_a
            .encrypt_for_local_storage(b"persisted secret")
            .await
            .unwrap()
            .unwrap();
        let decrypted = manager_b.decrypt_from_local_storage(&encrypted).unwrap();
        assert_eq!(&*decrypted, b"persisted secret");

        manager_b.clear_persisted_keys().await.unwrap();
        let mut manager_c = KeyManager::new(
            storage,
            Arc::new(OsRandom::new()),
            ManagerConfig::default(),
        );
        assert!(!manager_c.load_persisted_keys().await.unwrap());
    }

    #[tokio::test]
    async fn test_load_rejects_corrupt_material() {
        let storage = Arc::new(MemoryKeyStorage::new());
        storage
            .set_item("seedvault.keypair.v1", "not base64 !!!")
            .await
            .unwrap();

        let mut manager = KeyManager::new(
            storage.clone(),
            Arc::new(OsRandom::new()),
            ManagerConfig::default(),
        );
        assert!(matches!(
            manager.load_persisted_keys().await,
            Err(Error::CorruptKeyMaterial(_))
        ));

        // Valid base64 of garbage bytes is still corrupt
        storage
            .set_item("seedvault.keypair.v1", &BASE64.encode([1u8, 2, 3]))
            .await
            .unwrap();
        assert!(matches!(
            manager.load_persisted_keys().await,
            Err(Error::CorruptKeyMaterial(_))
        ));
        assert!(!manager.is_key_generated());
    }

    #[test]
    fn test_debug_redacts() {
        let manager = KeyManager::with_defaults();
        let debug = format!("{:?}", manager);
        assert!(debug.contains("Uninitialized"));
    }
}
