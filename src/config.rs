//! Configuration for a [`KeyManager`](crate::KeyManager) instance.

use crate::crypto::{DEFAULT_ENTROPY_BYTES, DEFAULT_KEY_SIZE_BITS};

/// Configuration for constructing a key manager
///
/// The defaults match the versioned protocol constants: 2048-bit keys
/// derived from 32 bytes of entropy (a 24-word phrase). Changing
/// `default_key_size_bits` changes the size used by mnemonic recovery,
/// so it must match the size the original keypair was generated with.
#[derive(Debug, Clone)]
pub struct ManagerConfig {
    /// Key size used when recovering from a mnemonic
    pub default_key_size_bits: usize,

    /// Entropy drawn for a fresh keypair (must be a supported BIP39 size)
    pub entropy_bytes: usize,

    /// Namespace prefix for keys handed to the storage collaborator
    pub storage_namespace: String,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            default_key_size_bits: DEFAULT_KEY_SIZE_BITS,
            entropy_bytes: DEFAULT_ENTROPY_BYTES,
            storage_namespace: "seedvault".to_string(),
        }
    }
}

impl ManagerConfig {
    /// Storage key under which the serialized keypair is persisted
    ///
    /// The `.v1` suffix is part of the stable persistence format.
    pub fn keypair_storage_key(&self) -> String {
        format!("{}.keypair.v1", self.storage_namespace)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ManagerConfig::default();
        assert_eq!(config.default_key_size_bits, 2048);
        assert_eq!(config.entropy_bytes, 32);
        assert_eq!(config.keypair_storage_key(), "seedvault.keypair.v1");
    }

    #[test]
    fn test_namespace_isolation() {
        let config = ManagerConfig {
            storage_namespace: "appA".to_string(),
            ..Default::default()
        };
        assert_eq!(config.keypair_storage_key(), "appA.keypair.v1");
    }
}
