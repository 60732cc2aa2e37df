//! # Deterministic Key Generator
//!
//! Reproducibly expands mnemonic entropy into a full RSA keypair.
//!
//! ## Derivation Pipeline
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                  DETERMINISTIC KEY DERIVATION                           │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  Entropy (16-32 bytes, from the mnemonic)                              │
//! │        │                                                                │
//! │        ▼                                                                │
//! │  ┌─────────────────────────────────────────────────────────────┐       │
//! │  │  HKDF-SHA256                                                │       │
//! │  │    salt = "seedvault-keygen-v1"                             │       │
//! │  │    ikm  = entropy                                           │       │
//! │  │    block i = expand("seedvault-prime-stream-v1" ‖ i)        │       │
//! │  │                                                             │       │
//! │  │  → unbounded deterministic byte stream (SeedRng)            │       │
//! │  └─────────────────────────────────────────────────────────────┘       │
//! │        │                                                                │
//! │        ▼                                                                │
//! │  ┌─────────────────────────────────────────────────────────────┐       │
//! │  │  Prime search (bits/2 per prime)                            │       │
//! │  │                                                             │       │
//! │  │  1. Draw candidate, force top two bits and low bit          │       │
//! │  │  2. Trial division by primes < 1000                         │       │
//! │  │  3. Miller-Rabin, 40 witness rounds from the same stream    │       │
//! │  │  4. Require gcd(e, p-1) = 1                                 │       │
//! │  │                                                             │       │
//! │  │  Bounded: at most 50 000 candidates per prime               │       │
//! │  └─────────────────────────────────────────────────────────────┘       │
//! │        │                                                                │
//! │        ▼                                                                │
//! │  n = p·q     d = e⁻¹ mod lcm(p−1, q−1)     dp, dq, qinv (CRT)          │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The stream is the sole randomness source in this path. Identical
//! (entropy, key size) always yields a bit-identical keypair, independent
//! of process, platform, or call time — that is what makes mnemonic
//! recovery work. Any use of system randomness in here is a correctness
//! bug, not a hardening measure.

use hkdf::Hkdf;
use num_bigint::{BigUint, RandBigInt};
use num_integer::Integer;
use num_traits::{One, Zero};
use rand_core::RngCore;
use sha2::Sha256;

use crate::crypto::rsa::{RsaKeyPair, RsaPrivateKey, RsaPublicKey};
use crate::crypto::{MAX_KEY_SIZE_BITS, MIN_KEY_SIZE_BITS};
use crate::error::{Error, Result};

/// Fixed public exponent (F4)
pub const PUBLIC_EXPONENT: u32 = 65537;

/// Miller-Rabin witness rounds per accepted prime
pub const MILLER_RABIN_ROUNDS: usize = 40;

/// Candidate budget per prime; exhausting it is a hard failure
pub const MAX_PRIME_CANDIDATES: usize = 50_000;

/// Minimum entropy accepted by the generator, in bytes
pub const MIN_ENTROPY_BYTES: usize = 16;

/// HKDF salt pinning the derivation protocol version
const KEYGEN_SALT: &[u8] = b"seedvault-keygen-v1";

/// HKDF info prefix for the prime-search stream
const STREAM_INFO: &[u8] = b"seedvault-prime-stream-v1";

/// Snapshot of key-generation progress, reported during the prime search
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeygenProgress {
    /// Primes accepted so far (0, 1, or 2)
    pub primes_found: usize,
    /// Total candidates drawn so far
    pub candidates_tested: usize,
}

/// Callback invoked with [`KeygenProgress`] snapshots
pub type ProgressFn = dyn Fn(KeygenProgress) + Send + Sync;

// ============================================================================
// DETERMINISTIC STREAM
// ============================================================================

/// Deterministic byte stream keyed by entropy
///
/// Produces 32-byte HKDF-SHA256 blocks under a counter-bearing info
/// string. Implements [`RngCore`] so the big-integer crate can draw prime
/// candidates and Miller-Rabin witnesses directly from it.
pub(crate) struct SeedRng {
    hk: Hkdf<Sha256>,
    block: [u8; 32],
    used: usize,
    counter: u32,
}

impl SeedRng {
    pub(crate) fn new(entropy: &[u8]) -> Self {
        Self {
            hk: Hkdf::<Sha256>::new(Some(KEYGEN_SALT), entropy),
            block: [0u8; 32],
            used: 32,
            counter: 0,
        }
    }

    fn refill(&mut self) {
        let mut info = [0u8; STREAM_INFO.len() + 4];
        info[..STREAM_INFO.len()].copy_from_slice(STREAM_INFO);
        info[STREAM_INFO.len()..].copy_from_slice(&self.counter.to_be_bytes());
        self.hk
            .expand(&info, &mut self.block)
            .expect("32 bytes is always a valid HKDF-SHA256 output length");
        self.counter = self.counter.wrapping_add(1);
        self.used = 0;
    }
}

impl RngCore for SeedRng {
    fn next_u32(&mut self) -> u32 {
        rand_core::impls::next_u32_via_fill(self)
    }

    fn next_u64(&mut self) -> u64 {
        rand_core::impls::next_u64_via_fill(self)
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        let mut written = 0;
        while written < dest.len() {
            if self.used == self.block.len() {
                self.refill();
            }
            let take = (dest.len() - written).min(self.block.len() - self.used);
            dest[written..written + take]
                .copy_from_slice(&self.block[self.used..self.used + take]);
            self.used += take;
            written += take;
        }
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> std::result::Result<(), rand_core::Error> {
        self.fill_bytes(dest);
        Ok(())
    }
}

// ============================================================================
// KEY DERIVATION
// ============================================================================

/// Derive an RSA keypair deterministically from entropy
///
/// Rejects `key_size_bits` below [`MIN_KEY_SIZE_BITS`] before doing any
/// work — undersized requests are never silently upgraded.
pub fn derive_keypair(entropy: &[u8], key_size_bits: usize) -> Result<RsaKeyPair> {
    derive_keypair_with_progress(entropy, key_size_bits, None)
}

/// [`derive_keypair`] with progress reporting
///
/// Prime search for a 2048-bit key takes noticeable wall-clock time on
/// mobile hardware; UIs can subscribe to candidate counts to keep a
/// spinner honest.
pub fn derive_keypair_with_progress(
    entropy: &[u8],
    key_size_bits: usize,
    on_progress: Option<&ProgressFn>,
) -> Result<RsaKeyPair> {
    if key_size_bits < MIN_KEY_SIZE_BITS {
        return Err(Error::KeySizeTooSmall(key_size_bits));
    }
    if key_size_bits > MAX_KEY_SIZE_BITS || key_size_bits % 64 != 0 {
        return Err(Error::KeySizeUnsupported(key_size_bits));
    }
    if entropy.len() < MIN_ENTROPY_BYTES {
        return Err(Error::InsufficientEntropy {
            got: entropy.len(),
            need: MIN_ENTROPY_BYTES,
        });
    }

    let e = BigUint::from(PUBLIC_EXPONENT);
    let mut rng = SeedRng::new(entropy);
    let prime_bits = (key_size_bits / 2) as u64;

    let (p, mut tested) = find_prime(&mut rng, prime_bits, &e, 0, 0, on_progress)?;
    let mut q = None;
    // Drawing p twice has negligible probability, but the search stays
    // strictly bounded either way.
    for _ in 0..4 {
        let (candidate, t) = find_prime(&mut rng, prime_bits, &e, 1, tested, on_progress)?;
        tested = t;
        if candidate != p {
            q = Some(candidate);
            break;
        }
    }
    let q = q.ok_or(Error::PrimeSearchExhausted)?;

    if let Some(cb) = on_progress {
        cb(KeygenProgress {
            primes_found: 2,
            candidates_tested: tested,
        });
    }

    let n = &p * &q;
    let p_minus_one = &p - 1u32;
    let q_minus_one = &q - 1u32;
    let lambda = p_minus_one.lcm(&q_minus_one);

    let d = e
        .modinv(&lambda)
        .ok_or_else(|| Error::KeyDerivationFailed("public exponent not invertible".into()))?;
    let dp = &d % &p_minus_one;
    let dq = &d % &q_minus_one;
    let qinv = q
        .modinv(&p)
        .ok_or_else(|| Error::KeyDerivationFailed("CRT coefficient not invertible".into()))?;

    Ok(RsaKeyPair {
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

/// Draw candidates from the stream until one passes every primality gate
///
/// Returns the prime and the updated total candidate count. Bounded by
/// [`MAX_PRIME_CANDIDATES`] fresh draws so derivation terminates without
/// caller-side timeouts.
fn find_prime(
    rng: &mut SeedRng,
    bits: u64,
    e: &BigUint,
    primes_found: usize,
    tested_before: usize,
    on_progress: Option<&ProgressFn>,
) -> Result<(BigUint, usize)> {
    let one = BigUint::one();

    for attempt in 1..=MAX_PRIME_CANDIDATES {
        let tested = tested_before + attempt;
        if attempt % 64 == 0 {
            if let Some(cb) = on_progress {
                cb(KeygenProgress {
                    primes_found,
                    candidates_tested: tested,
                });
            }
        }

        let mut candidate = rng.gen_biguint(bits);
        // Top two bits guarantee the product reaches the full key size;
        // the low bit makes the candidate odd.
        candidate.set_bit(bits - 1, true);
        candidate.set_bit(bits - 2, true);
        candidate.set_bit(0, true);

        if !survives_trial_division(&candidate) {
            continue;
        }
        if !is_probable_prime(&candidate, rng, MILLER_RABIN_ROUNDS) {
            continue;
        }
        // e must be invertible mod (p-1); e is prime, so a gcd check suffices
        if (&candidate - 1u32).gcd(e) != one {
            continue;
        }

        return Ok((candidate, tested));
    }

    Err(Error::PrimeSearchExhausted)
}

// ============================================================================
// PRIMALITY
// ============================================================================

/// Odd primes below 1000, used to cheaply reject most candidates before
/// the expensive Miller-Rabin rounds
const SMALL_PRIMES: [u32; 167] = [
    3, 5, 7, 11, 13, 17, 19, 23, 29, 31, 37, 41, 43, 47, 53, 59, 61, 67, 71, 73, 79, 83, 89, 97,
    101, 103, 107, 109, 113, 127, 131, 137, 139, 149, 151, 157, 163, 167, 173, 179, 181, 191, 193,
    197, 199, 211, 223, 227, 229, 233, 239, 241, 251, 257, 263, 269, 271, 277, 281, 283, 293, 307,
    311, 313, 317, 331, 337, 347, 349, 353, 359, 367, 373, 379, 383, 389, 397, 401, 409, 419, 421,
    431, 433, 439, 443, 449, 457, 461, 463, 467, 479, 487, 491, 499, 503, 509, 521, 523, 541, 547,
    557, 563, 569, 571, 577, 587, 593, 599, 601, 607, 613, 617, 619, 631, 641, 643, 647, 653, 659,
    661, 673, 677, 683, 691, 701, 709, 719, 727, 733, 739, 743, 751, 757, 761, 769, 773, 787, 797,
    809, 811, 821, 823, 827, 829, 839, 853, 857, 859, 863, 877, 881, 883, 887, 907, 911, 919, 929,
    937, 941, 947, 953, 967, 971, 977, 983, 991, 997,
];

fn survives_trial_division(candidate: &BigUint) -> bool {
    SMALL_PRIMES.iter().all(|&p| !(candidate % p).is_zero())
}

/// Miller-Rabin probabilistic primality test
///
/// Witnesses come from the deterministic stream, so the whole test is
/// reproducible for a given entropy. 40 rounds bound the error
/// probability by 4^-40.
pub(crate) fn is_probable_prime(n: &BigUint, rng: &mut SeedRng, rounds: usize) -> bool {
    let one = BigUint::one();
    let two = BigUint::from(2u32);
    let three = BigUint::from(3u32);

    if *n < two {
        return false;
    }
    if *n == two || *n == three {
        return true;
    }
    if (n % 2u32).is_zero() {
        return false;
    }

    // n - 1 = d * 2^s with d odd
    let n_minus_one = n - &one;
    let s = n_minus_one.trailing_zeros().unwrap_or(0);
    let d = &n_minus_one >> s;

    'witness: for _ in 0..rounds {
        let a = rng.gen_biguint_range(&two, &n_minus_one);
        let mut x = a.modpow(&d, n);
        if x == one || x == n_minus_one {
            continue;
        }
        for _ in 1..s {
            x = x.modpow(&two, n);
            if x == n_minus_one {
                continue 'witness;
            }
        }
        return false;
    }

    true
}

// ============================================================================
// TESTS
// ============================================================================
