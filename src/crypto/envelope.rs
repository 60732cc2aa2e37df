//! # Hybrid Envelope Cipher
//!
//! Encrypts arbitrary byte payloads under an RSA keypair using envelope
//! encryption: a fresh AES-256-GCM key encrypts the bulk data, and only
//! that key is wrapped with RSA-OAEP.
//!
//! ## Envelope Formats
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        ENVELOPE FORMATS                                 │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  Local (single opaque blob, for encrypted-at-rest storage):            │
//! │                                                                         │
//! │  ┌──────────────┬─────────────────┬──────────┬────────────────────┐    │
//! │  │ u32 BE       │ RSA-OAEP        │ nonce    │ AES-256-GCM        │    │
//! │  │ wrapped len  │ wrapped AES key │ 12 bytes │ ciphertext ‖ tag   │    │
//! │  └──────────────┴─────────────────┴──────────┴────────────────────┘    │
//! │                                                                         │
//! │  Remote (two independently routable base64 fields):                    │
//! │                                                                         │
//! │  {                                                                     │
//! │    "encrypted_key":  base64(wrapped AES key),                          │
//! │    "encrypted_data": base64(nonce ‖ ciphertext ‖ tag)                  │
//! │  }                                                                     │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Both layouts are stable across versions: data sealed today must stay
//! recoverable by any future release.
//!
//! ## Failure Policy
//!
//! Opening returns `None` for every failure — too-short blob, bad length
//! prefix, unwrap failure, authentication-tag mismatch. Callers cannot
//! tell "malformed input" from "wrong key", and no unauthenticated
//! plaintext byte is ever returned.

use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Nonce as AesNonce,
};
use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;

use crate::crypto::rsa::{RsaPrivateKey, RsaPublicKey, OAEP_HASH_LEN};
use crate::error::{Error, Result};
use crate::storage::RandomSource;

/// Size of the per-payload symmetric key in bytes (256 bits)
pub const SYMMETRIC_KEY_SIZE: usize = 32;

/// Size of the AES-GCM nonce in bytes (96 bits)
pub const NONCE_SIZE: usize = 12;

/// Size of the AES-GCM authentication tag in bytes (128 bits)
pub const TAG_SIZE: usize = 16;

/// Size of the local envelope's wrapped-key length prefix
const LEN_PREFIX_SIZE: usize = 4;

/// The two-field payload produced for remote transmission
///
/// The wrapped key and the bulk ciphertext travel as separate named
/// fields so an intermediary can route or store them independently
/// without ever touching plaintext.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransmissionPayload {
    /// Base64 of the RSA-OAEP-wrapped symmetric key
    pub encrypted_key: String,
    /// Base64 of nonce ‖ ciphertext ‖ tag
    pub encrypted_data: String,
}

/// Draw the per-payload key, nonce, and OAEP seed from the collaborator
async fn fresh_material(
    random: &dyn RandomSource,
) -> Result<(
    Zeroizing<[u8; SYMMETRIC_KEY_SIZE]>,
    [u8; NONCE_SIZE],
    [u8; OAEP_HASH_LEN],
)> {
    let mut key = Zeroizing::new([0u8; SYMMETRIC_KEY_SIZE]);
    random.fill(&mut key[..]).await?;
    let mut nonce = [0u8; NONCE_SIZE];
    random.fill(&mut nonce).await?;
    let mut oaep_seed = [0u8; OAEP_HASH_LEN];
    random.fill(&mut oaep_seed).await?;
    Ok((key, nonce, oaep_seed))
}

/// Shared seal path: returns (wrapped key, nonce ‖ ciphertext ‖ tag)
fn seal_parts(
    public: &RsaPublicKey,
    plaintext: &[u8],
    key: &[u8; SYMMETRIC_KEY_SIZE],
    nonce: &[u8; NONCE_SIZE],
    oaep_seed: &[u8; OAEP_HASH_LEN],
) -> Result<(Vec<u8>, Vec<u8>)> {
    let cipher = Aes256Gcm::new_from_slice(key)
        .map_err(|_| Error::EncryptionFailed("invalid symmetric key length".into()))?;
    let ciphertext = cipher
        .encrypt(AesNonce::from_slice(nonce), plaintext)
        .map_err(|_| Error::EncryptionFailed("authenticated encryption failed".into()))?;

    let wrapped = public.oaep_encrypt(key.as_slice(), oaep_seed)?;

    let mut body = Vec::with_capacity(NONCE_SIZE + ciphertext.len());
    body.extend_from_slice(nonce);
    body.extend_from_slice(&ciphertext);
    Ok((wrapped, body))
}

/// Shared open path; every failure collapses to `None`
fn open_parts(private: &RsaPrivateKey, wrapped: &[u8], body: &[u8]) -> Option<Zeroizing<Vec<u8>>> {
    if body.len() < NONCE_SIZE + TAG_SIZE {
        return None;
    }

    let key = private.oaep_decrypt(wrapped)?;
    if key.len() != SYMMETRIC_KEY_SIZE {
        return None;
    }

    let cipher = Aes256Gcm::new_from_slice(&key).ok()?;
    let plaintext = cipher
        .decrypt(AesNonce::from_slice(&body[..NONCE_SIZE]), &body[NONCE_SIZE..])
        .ok()?;

    Some(Zeroizing::new(plaintext))
}

/// Seal a payload into the compact local-storage envelope
pub async fn seal_local(
    public: &RsaPublicKey,
    plaintext: &[u8],
    random: &dyn RandomSource,
) -> Result<Vec<u8>> {
    let (key, nonce, oaep_seed) = fresh_material(random).await?;
    let (wrapped, body) = seal_parts(public, plaintext, &key, &nonce, &oaep_seed)?;

    let mut blob = Vec::with_capacity(LEN_PREFIX_SIZE + wrapped.len() + body.len());
    blob.extend_from_slice(&(wrapped.len() as u32).to_be_bytes());
    blob.extend_from_slice(&wrapped);
    blob.extend_from_slice(&body);
    Ok(blob)
}

/// Open a local-storage envelope
///
/// `None` covers structurally malformed blobs and cryptographic failures
/// alike, with no way to tell which occurred.
pub fn open_local(private: &RsaPrivateKey, blob: &[u8]) -> Option<Zeroizing<Vec<u8>>> {
    if blob.len() < LEN_PREFIX_SIZE + NONCE_SIZE + TAG_SIZE {
        return None;
    }

    let wrapped_len = u32::from_be_bytes(blob[..LEN_PREFIX_SIZE].try_into().ok()?) as usize;
    let rest = &blob[LEN_PREFIX_SIZE..];
    if wrapped_len == 0 || wrapped_len > rest.len().saturating_sub(NONCE_SIZE + TAG_SIZE) {
        return None;
    }

    let (wrapped, body) = rest.split_at(wrapped_len);
    open_parts(private, wrapped, body)
}

/// Seal a payload into the split-field transmission form
///
/// Cryptographically identical to [`seal_local`]; only the framing
/// differs.
pub async fn seal_remote(
    public: &RsaPublicKey,
    plaintext: &[u8],
    random: &dyn RandomSource,
) -> Result<TransmissionPayload> {
    let (key, nonce, oaep_seed) = fresh_material(random).await?;
    let (wrapped, body) = seal_parts(public, plaintext, &key, &nonce, &oaep_seed)?;

    Ok(TransmissionPayload {
        encrypted_key: BASE64.encode(&wrapped),
        encrypted_data: BASE64.encode(&body),
    })
}

/// Open a transmission payload from its two base64 fields
pub fn open_remote(
    private: &RsaPrivateKey,
    encrypted_key: &str,
    encrypted_data: &str,
) -> Option<Zeroizing<Vec<u8>>> {
    let wrapped = BASE64.decode(encrypted_key.trim()).ok()?;
    let body = BASE64.decode(encrypted_data.trim()).ok()?;
    open_parts(private, &wrapped, &body)
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::testutil::{alt_keypair, test_keypair};
    use crate::storage::OsRandom;

    #[tokio::test]
    async fn test_local_round_trip() {
        let kp = test_keypair();
        let blob = seal_local(&kp.public, b"hello world", &OsRandom).await.unwrap();

        let opened = open_local(&kp.private, &blob).unwrap();
        assert_eq!(&*opened, b"hello world");
    }

    #[tokio::test]
    async fn test_local_round_trip_empty_payload() {
        let kp = test_keypair();
        let blob = seal_local(&kp.public, b"", &OsRandom).await.unwrap();
        let opened = open_local(&kp.private, &blob).unwrap();
        assert!(opened.is_empty());
    }

    #[tokio::test]
    async fn test_fresh_key_per_envelope() {
        let kp = test_keypair();
        let a = seal_local(&kp.public, b"same plaintext", &OsRandom).await.unwrap();
        let b = seal_local(&kp.public, b"same plaintext", &OsRandom).await.unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_open_local_rejects_short_blobs() {
        let kp = test_keypair();
        assert!(open_local(&kp.private, &[]).is_none());
        assert!(open_local(&kp.private, &[0u8; 4]).is_none());
        assert!(open_local(&kp.private, &[0u8; 30]).is_none());
    }

    #[tokio::test]
    async fn test_open_local_rejects_lying_length_prefix() {
        let kp = test_keypair();
        let mut blob = seal_local(&kp.public, b"payload", &OsRandom).await.unwrap();

        // Claim a wrapped key larger than the whole buffer
        let lying_len = blob.len() as u32 * 2;
        blob[..4].copy_from_slice(&lying_len.to_be_bytes());
        assert!(open_local(&kp.private, &blob).is_none());

        // Zero-length wrapped key
        blob[..4].copy_from_slice(&0u32.to_be_bytes());
        assert!(open_local(&kp.private, &blob).is_none());
    }

    #[tokio::test]
    async fn test_open_local_rejects_tampered_ciphertext() {
        let kp = test_keypair();
        let mut blob = seal_local(&kp.public, b"payload", &OsRandom).await.unwrap();
        let last = blob.len() - 1;
        blob[last] ^= 0xFF;
        assert!(open_local(&kp.private, &blob).is_none());
    }

    #[tokio::test]
    async fn test_open_local_wrong_key_indistinguishable_from_garbage() {
        let kp = test_keypair();
        let other = alt_keypair();
        let blob = seal_local(&kp.public, b"payload", &OsRandom).await.unwrap();

        // Wrong key and malformed input produce the identical signal
        assert!(open_local(&other.private, &blob).is_none());
        assert!(open_local(&kp.private, &[0u8; 100]).is_none());
    }

    #[tokio::test]
    async fn test_remote_round_trip() {
        let kp = test_keypair();
        let payload = seal_remote(&kp.public, b"remote payload", &OsRandom).await.unwrap();
        assert!(!payload.encrypted_key.is_empty());
        assert!(!payload.encrypted_data.is_empty());

        let opened =
            open_remote(&kp.private, &payload.encrypted_key, &payload.encrypted_data).unwrap();
        assert_eq!(&*opened, b"remote payload");
    }

    #[tokio::test]
    async fn test_remote_rejects_bad_base64_and_swapped_fields() {
        let kp = test_keypair();
        let payload = seal_remote(&kp.public, b"remote payload", &OsRandom).await.unwrap();

        assert!(open_remote(&kp.private, "!!!", &payload.encrypted_data).is_none());
        assert!(open_remote(&kp.private, &payload.encrypted_key, "???").is_none());
        // Fields swapped: structurally plausible, cryptographically wrong
        assert!(open_remote(&kp.private, &payload.encrypted_data, &payload.encrypted_key).is_none());
    }

    #[test]
    fn test_payload_serializes_with_stable_field_names() {
        let payload = TransmissionPayload {
            encrypted_key: "a".into(),
            encrypted_data: "b".into(),
        };
        let json = serde_json::to_string(&payload).unwrap();
        assert!(json.contains("\"encrypted_key\""));
        assert!(json.contains("\"encrypted_data\""));

        let restored: TransmissionPayload = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, payload);
    }
}
