//! # RSA Key Types & OAEP
//!
//! RSA keypairs with CRT parameters, the raw public/private operations,
//! and the OAEP padding scheme used to wrap symmetric keys.
//!
//! ## Why not an off-the-shelf keygen API
//!
//! Mnemonic recovery requires "same phrase ⇒ same key", which rules out
//! opaque keygen functions that consume system randomness internally.
//! The key structure and primitive operations therefore live here, over
//! arbitrary-precision integers, and the generator
//! ([`keygen`](crate::crypto::keygen)) feeds them from a stream it fully
//! controls.
//!
//! ## OAEP Wrap
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    RSA-OAEP (SHA-256 / MGF1-SHA-256)                    │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  DB   = lHash ‖ PS ‖ 0x01 ‖ M          (k - hLen - 1 bytes)            │
//! │  seed = hLen random bytes               (from the caller's CSPRNG)      │
//! │                                                                         │
//! │  maskedDB   = DB   ⊕ MGF1(seed, k - hLen - 1)                          │
//! │  maskedSeed = seed ⊕ MGF1(maskedDB, hLen)                              │
//! │                                                                         │
//! │  EM = 0x00 ‖ maskedSeed ‖ maskedDB                                     │
//! │  C  = EM^e mod n                                                       │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Unpadding collapses every failure cause (wrong length, bad hash, missing
//! separator, value out of range) into one `None` so callers cannot be used
//! as a padding oracle.

use num_bigint::BigUint;
use num_traits::Zero;
use sha2::{Digest, Sha256};
use zeroize::Zeroizing;

use crate::error::{Error, Result};

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;

/// OAEP hash output length in bytes (SHA-256)
pub const OAEP_HASH_LEN: usize = 32;

/// Version byte of the persisted keypair layout
const KEYPAIR_FORMAT_VERSION: u8 = 1;

/// RSA public key: modulus and public exponent
#[derive(Clone, PartialEq, Eq)]
pub struct RsaPublicKey {
    /// Modulus n = p·q
    pub n: BigUint,
    /// Public exponent e
    pub e: BigUint,
}

/// RSA private key with CRT parameters for fast private operations
#[derive(Clone, PartialEq, Eq)]
pub struct RsaPrivateKey {
    /// Modulus n = p·q
    pub n: BigUint,
    /// Private exponent d = e⁻¹ mod lcm(p−1, q−1)
    pub d: BigUint,
    /// First prime factor
    pub p: BigUint,
    /// Second prime factor
    pub q: BigUint,
    /// d mod (p−1)
    pub dp: BigUint,
    /// d mod (q−1)
    pub dq: BigUint,
    /// q⁻¹ mod p
    pub qinv: BigUint,
}

/// An RSA keypair held by a key manager
///
/// Two keypairs derived from equal entropy are byte-identical, which is
/// what `PartialEq` here compares.
#[derive(Clone, PartialEq, Eq)]
pub struct RsaKeyPair {
    /// Public half (safe to share)
    pub public: RsaPublicKey,
    /// Private half (never leaves the process unencrypted)
    pub private: RsaPrivateKey,
    /// Modulus size in bits
    pub key_size_bits: usize,
}

impl RsaPublicKey {
    /// Modulus length in bytes
    pub fn modulus_len(&self) -> usize {
        ((self.n.bits() as usize) + 7) / 8
    }

    /// Largest message OAEP can carry under this key
    pub fn max_wrap_len(&self) -> usize {
        self.modulus_len().saturating_sub(2 * OAEP_HASH_LEN + 2)
    }

    /// Raw public operation m^e mod n
    fn public_op(&self, m: &BigUint) -> BigUint {
        m.modpow(&self.e, &self.n)
    }

    /// Encrypt a short message with OAEP
    ///
    /// `seed` must be `OAEP_HASH_LEN` fresh random bytes; determinism of
    /// the ciphertext is exactly as strong as the seed is random.
    pub fn oaep_encrypt(&self, msg: &[u8], seed: &[u8; OAEP_HASH_LEN]) -> Result<Vec<u8>> {
        let k = self.modulus_len();
        let max = self.max_wrap_len();
        if msg.len() > max {
            return Err(Error::MessageTooLong {
                got: msg.len(),
                max,
            });
        }

        // DB = lHash || PS || 0x01 || M
        let mut db = Zeroizing::new(vec![0u8; k - OAEP_HASH_LEN - 1]);
        db[..OAEP_HASH_LEN].copy_from_slice(&Sha256::digest(b""));
        let msg_start = db.len() - msg.len();
        db[msg_start - 1] = 0x01;
        db[msg_start..].copy_from_slice(msg);

        let db_mask = mgf1(seed, k - OAEP_HASH_LEN - 1);
        xor_in_place(&mut db, &db_mask);

        let seed_mask = mgf1(&db, OAEP_HASH_LEN);
        let mut masked_seed = *seed;
        xor_in_place(&mut masked_seed, &seed_mask);

        // EM = 0x00 || maskedSeed || maskedDB
        let mut em = Zeroizing::new(Vec::with_capacity(k));
        em.push(0x00);
        em.extend_from_slice(&masked_seed);
        em.extend_from_slice(&db);

        let m = BigUint::from_bytes_be(&em);
        let c = self.public_op(&m);
        i2osp(&c, k).ok_or_else(|| Error::EncryptionFailed("ciphertext out of range".into()))
    }

    /// Export as a stable, versioned base64 string
    ///
    /// Layout: `[u32 BE n_len][n BE][u32 BE e_len][e BE]`, base64-encoded.
    pub fn to_export_string(&self) -> String {
        let mut buf = Vec::new();
        push_field(&mut buf, &self.n.to_bytes_be());
        push_field(&mut buf, &self.e.to_bytes_be());
        BASE64.encode(&buf)
    }

    /// Parse a key previously exported with [`to_export_string`](Self::to_export_string)
    pub fn from_export_string(s: &str) -> Result<Self> {
        let buf = BASE64
            .decode(s.trim())
            .map_err(|e| Error::CorruptKeyMaterial(format!("bad base64: {}", e)))?;

        let mut pos = 0;
        let n = read_field(&buf, &mut pos)?;
        let e = read_field(&buf, &mut pos)?;
        if pos != buf.len() {
            return Err(Error::CorruptKeyMaterial("trailing bytes".into()));
        }

        Ok(Self {
            n: BigUint::from_bytes_be(n),
            e: BigUint::from_bytes_be(e),
        })
    }

    /// Short hex fingerprint for logging and display
    ///
    /// Derived from a hash of the exported key bytes; safe to log.
    pub fn fingerprint(&self) -> String {
        let mut buf = Vec::new();
        push_field(&mut buf, &self.n.to_bytes_be());
        push_field(&mut buf, &self.e.to_bytes_be());
        hex::encode(&Sha256::digest(&buf)[..8])
    }
}

impl RsaPrivateKey {
    /// Raw private operation c^d mod n via the Chinese Remainder Theorem
    fn private_op(&self, c: &BigUint) -> BigUint {
        let m1 = c.modpow(&self.dp, &self.p);
        let m2 = c.modpow(&self.dq, &self.q);

        let m2_mod_p = &m2 % &self.p;
        let diff = if m1 >= m2_mod_p {
            &m1 - &m2_mod_p
        } else {
            &self.p - &m2_mod_p + &m1
        };
        let h = (&diff * &self.qinv) % &self.p;

        m2 + h * &self.q
    }

    /// Modulus length in bytes
    pub fn modulus_len(&self) -> usize {
        ((self.n.bits() as usize) + 7) / 8
    }

    /// Decrypt an OAEP ciphertext
    ///
    /// Returns `None` for every failure cause — wrong length, value out of
    /// range, bad padding — with no distinction exposed.
    pub fn oaep_decrypt(&self, ciphertext: &[u8]) -> Option<Zeroizing<Vec<u8>>> {
        let k = self.modulus_len();
        if ciphertext.len() != k || k < 2 * OAEP_HASH_LEN + 2 {
            return None;
        }

        let c = BigUint::from_bytes_be(ciphertext);
        if c >= self.n {
            return None;
        }

        let m = self.private_op(&c);
        let em = Zeroizing::new(i2osp(&m, k)?);
        oaep_unpad(&em)
    }
}

impl RsaKeyPair {
    /// Serialize to the versioned binary layout used for persistence
    ///
    /// Layout: version byte, then length-prefixed n, e, d, p, q, dp, dq,
    /// qinv. Contains private material — callers must treat the output
    /// like a private key.
    pub fn to_bytes(&self) -> Zeroizing<Vec<u8>> {
        let mut buf = Vec::new();
        buf.push(KEYPAIR_FORMAT_VERSION);
        push_field(&mut buf, &self.public.n.to_bytes_be());
        push_field(&mut buf, &self.public.e.to_bytes_be());
        push_field(&mut buf, &self.private.d.to_bytes_be());
        push_field(&mut buf, &self.private.p.to_bytes_be());
        push_field(&mut buf, &self.private.q.to_bytes_be());
        push_field(&mut buf, &self.private.dp.to_bytes_be());
        push_field(&mut buf, &self.private.dq.to_bytes_be());
        push_field(&mut buf, &self.private.qinv.to_bytes_be());
        Zeroizing::new(buf)
    }

    /// Reconstruct a keypair from [`to_bytes`](Self::to_bytes) output
    ///
    /// Verifies the structural invariant n = p·q before accepting.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let version = *bytes
            .first()
            .ok_or_else(|| Error::CorruptKeyMaterial("empty key blob".into()))?;
        if version != KEYPAIR_FORMAT_VERSION {
            return Err(Error::CorruptKeyMaterial(format!(
                "unknown format version {}",
                version
            )));
        }

        let mut pos = 1;
        let n = BigUint::from_bytes_be(read_field(bytes, &mut pos)?);
        let e = BigUint::from_bytes_be(read_field(bytes, &mut pos)?);
        let d = BigUint::from_bytes_be(read_field(bytes, &mut pos)?);
        let p = BigUint::from_bytes_be(read_field(bytes, &mut pos)?);
        let q = BigUint::from_bytes_be(read_field(bytes, &mut pos)?);
        let dp = BigUint::from_bytes_be(read_field(bytes, &mut pos)?);
        let dq = BigUint::from_bytes_be(read_field(bytes, &mut pos)?);
        let qinv = BigUint::from_bytes_be(read_field(bytes, &mut pos)?);
        if pos != bytes.len() {
            return Err(Error::CorruptKeyMaterial("trailing bytes".into()));
        }

        if &p * &q != n {
            return Err(Error::CorruptKeyMaterial("modulus mismatch".into()));
        }

        let key_size_bits = n.bits() as usize;
        Ok(Self {
            public: RsaPublicKey { n: n.clone(), e },
            private: RsaPrivateKey {
                n,
                d,
                p,
                q,
                dp,
                dq,
                qinv,
            },
            key_size_bits,
        })
    }
}

// Prevent accidental logging of private material
impl std::fmt::Debug for RsaPrivateKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "RsaPrivateKey([REDACTED])")
    }
}

impl std::fmt::Debug for RsaPublicKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "RsaPublicKey(fingerprint={})", self.fingerprint())
    }
}

impl std::fmt::Debug for RsaKeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "RsaKeyPair({} bits, fingerprint={})",
            self.key_size_bits,
            self.public.fingerprint()
        )
    }
}

// ============================================================================
// PADDING INTERNALS
// ============================================================================

/// MGF1 mask generation over SHA-256
fn mgf1(seed: &[u8], len: usize) -> Vec<u8> {
    let mut mask = Vec::with_capacity(len + OAEP_HASH_LEN);
    let mut counter: u32 = 0;
    while mask.len() < len {
        let mut hasher = Sha256::new();
        hasher.update(seed);
        hasher.update(counter.to_be_bytes());
        mask.extend_from_slice(&hasher.finalize());
        counter += 1;
    }
    mask.truncate(len);
    mask
}

/// Reverse the OAEP encoding; all failure causes collapse to `None`
fn oaep_unpad(em: &[u8]) -> Option<Zeroizing<Vec<u8>>> {
    if em[0] != 0x00 {
        return None;
    }

    let masked_seed = &em[1..1 + OAEP_HASH_LEN];
    let masked_db = &em[1 + OAEP_HASH_LEN..];

    let seed_mask = mgf1(masked_db, OAEP_HASH_LEN);
    let mut seed = Zeroizing::new(masked_seed.to_vec());
    xor_in_place(&mut seed, &seed_mask);

    let db_mask = mgf1(&seed, masked_db.len());
    let mut db = Zeroizing::new(masked_db.to_vec());
    xor_in_place(&mut db, &db_mask);

    let lhash: [u8; OAEP_HASH_LEN] = Sha256::digest(b"").into();
    if db[..OAEP_HASH_LEN] != lhash {
        return None;
    }

    // Skip the zero padding, expect the 0x01 separator
    let rest = &db[OAEP_HASH_LEN..];
    let sep = rest.iter().position(|&b| b != 0x00)?;
    if rest[sep] != 0x01 {
        return None;
    }

    Some(Zeroizing::new(rest[sep + 1..].to_vec()))
}

fn xor_in_place(data: &mut [u8], mask: &[u8]) {
    for (b, m) in data.iter_mut().zip(mask) {
        *b ^= m;
    }
}

/// Big-endian octet string of exactly `len` bytes, or `None` if it won't fit
fn i2osp(x: &BigUint, len: usize) -> Option<Vec<u8>> {
    if x.is_zero() {
        return Some(vec![0u8; len]);
    }
    let bytes = x.to_bytes_be();
    if bytes.len() > len {
        return None;
    }
    let mut out = vec![0u8; len - bytes.len()];
    out.extend_from_slice(&bytes);
    Some(out)
}

// ============================================================================
// FIELD SERIALIZATION
// ============================================================================

fn push_field(buf: &mut Vec<u8>, bytes: &[u8]) {
    buf.extend_from_slice(&(bytes.len() as u32).to_be_bytes());
    buf.extend_from_slice(bytes);
}

fn read_field<'a>(buf: &'a [u8], pos: &mut usize) -> Result<&'a [u8]> {
    let end = pos
        .checked_add(4)
        .filter(|&e| e <= buf.len())
        .ok_or_else(|| Error::CorruptKeyMaterial("truncated length prefix".into()))?;
    let len = u32::from_be_bytes(buf[*pos..end].try_into().unwrap()) as usize;
    let field_end = end
        .checked_add(len)
        .filter(|&e| e <= buf.len())
        .ok_or_else(|| Error::CorruptKeyMaterial("field length out of range".into()))?;
    let field = &buf[end..field_end];
    *pos = field_end;
    Ok(field)
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::testutil::test_keypair;

    // Textbook toy key: p=61, q=53, n=3233, e=17, d=2753
    fn toy_keypair() -> RsaKeyPair {
        let p = BigUint::from(61u32);
        let q = BigUint::from(53u32);
        let n = &p * &q;
        RsaKeyPair {
            public: RsaPublicKey {
                n: n.clone(),
                e: BigUint::from(17u32),
            },
            private: RsaPrivateKey {
                n,
                d: BigUint::from(2753u32),
                dp: BigUint::from(2753u32 % 60),
                dq: BigUint::from(2753u32 % 52),
                qinv: BigUint::from(38u32),
                p,
                q,
            },
            key_size_bits: 12,
        }
    }

    #[test]
    fn test_crt_private_op_matches_textbook() {
        let kp = toy_keypair();
        let m = BigUint::from(65u32);
        let c = kp.public.public_op(&m);
        assert_eq!(c, BigUint::from(2790u32));
        assert_eq!(kp.private.private_op(&c), m);
    }

    #[test]
    fn test_i2osp_padding() {
        let x = BigUint::from(0x0102u32);
        assert_eq!(i2osp(&x, 4).unwrap(), vec![0, 0, 1, 2]);
        assert_eq!(i2osp(&x, 2).unwrap(), vec![1, 2]);
        assert!(i2osp(&x, 1).is_none());
        assert_eq!(i2osp(&BigUint::zero(), 3).unwrap(), vec![0, 0, 0]);
    }

    #[test]
    fn test_mgf1_deterministic() {
        let a = mgf1(b"seed", 48);
        let b = mgf1(b"seed", 48);
        assert_eq!(a, b);
        assert_eq!(a.len(), 48);
        assert_ne!(mgf1(b"seed", 48), mgf1(b"other", 48));
    }

    #[test]
    fn test_oaep_round_trip() {
        let kp = test_keypair();
        let seed = [9u8; OAEP_HASH_LEN];

        let ct = kp.public.oaep_encrypt(b"wrapped key bytes", &seed).unwrap();
        assert_eq!(ct.len(), kp.public.modulus_len());

        let pt = kp.private.oaep_decrypt(&ct).unwrap();
        assert_eq!(&*pt, b"wrapped key bytes");
    }

    #[test]
    fn test_oaep_tampered_ciphertext_fails() {
        let kp = test_keypair();
        let seed = [9u8; OAEP_HASH_LEN];

        let mut ct = kp.public.oaep_encrypt(b"secret", &seed).unwrap();
        ct[10] ^= 0xFF;
        assert!(kp.private.oaep_decrypt(&ct).is_none());
    }

    #[test]
    fn test_oaep_wrong_length_fails() {
        let kp = test_keypair();
        assert!(kp.private.oaep_decrypt(&[0u8; 16]).is_none());
        assert!(kp.private.oaep_decrypt(&[]).is_none());
    }

    #[test]
    fn test_oaep_message_too_long() {
        let kp = test_keypair();
        let oversized = vec![0u8; kp.public.max_wrap_len() + 1];
        let seed = [0u8; OAEP_HASH_LEN];
        assert!(matches!(
            kp.public.oaep_encrypt(&oversized, &seed),
            Err(Error::MessageTooLong { .. })
        ));
    }

    #[test]
    fn test_public_key_export_round_trip() {
        let kp = test_keypair();
        let exported = kp.public.to_export_string();
        let restored = RsaPublicKey::from_export_string(&exported).unwrap();
        assert_eq!(restored, kp.public);
    }

    #[test]
    fn test_public_key_export_rejects_garbage() {
        assert!(RsaPublicKey::from_export_string("not base64 !!!").is_err());
        assert!(RsaPublicKey::from_export_string(&BASE64.encode([1, 2, 3])).is_err());
    }

    #[test]
    fn test_keypair_serialization_round_trip() {
        let kp = toy_keypair();
        let bytes = kp.to_bytes();
        let restored = RsaKeyPair::from_bytes(&bytes).unwrap();
        assert_eq!(restored, kp);
    }

    #[test]
    fn test_keypair_from_bytes_rejects_corruption() {
        let kp = toy_keypair();
        let mut bytes = kp.to_bytes().to_vec();

        // Unknown version
        bytes[0] = 99;
        assert!(RsaKeyPair::from_bytes(&bytes).is_err());

        // Truncation
        let bytes = kp.to_bytes();
        assert!(RsaKeyPair::from_bytes(&bytes[..bytes.len() - 2]).is_err());
        assert!(RsaKeyPair::from_bytes(&[]).is_err());
    }

    #[test]
    fn test_debug_redacts_private_key() {
        let kp = toy_keypair();
        let debug = format!("{:?}", kp.private);
        assert!(debug.contains("REDACTED"));
        assert!(!debug.contains("2753"));
    }
}
