//! # Mnemonic Codec (BIP39)
//!
//! Reversible, checksummed mapping between raw entropy and human-readable
//! word phrases.
//!
//! ## Encoding Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      MNEMONIC ENCODING                                  │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  Step 1: Checksum                                                      │
//! │  ┌─────────────────────────────────────────────────────────────┐       │
//! │  │  checksum = first (entropy_bits / 32) bits of SHA256(E)     │       │
//! │  └─────────────────────────────────────────────────────────────┘       │
//! │                                                                         │
//! │  Step 2: Combine and Split                                             │
//! │  ┌─────────────────────────────────────────────────────────────┐       │
//! │  │  combined = entropy || checksum                             │       │
//! │  │  split into 11-bit segments                                 │       │
//! │  └─────────────────────────────────────────────────────────────┘       │
//! │                                                                         │
//! │  Step 3: Map to Words                                                  │
//! │  ┌─────────────────────────────────────────────────────────────┐       │
//! │  │  each 11-bit value (0-2047) indexes the English wordlist    │       │
//! │  └─────────────────────────────────────────────────────────────┘       │
//! │                                                                         │
//! │  Supported sizes:                                                      │
//! │                                                                         │
//! │  │ entropy │ checksum │ words │                                        │
//! │  │ 16 B    │ 4 bits   │ 12    │                                        │
//! │  │ 20 B    │ 5 bits   │ 15    │                                        │
//! │  │ 24 B    │ 6 bits   │ 18    │                                        │
//! │  │ 28 B    │ 7 bits   │ 21    │                                        │
//! │  │ 32 B    │ 8 bits   │ 24    │                                        │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Decoding reverses the mapping and must reproduce the exact original
//! entropy or fail — wrong word count, unknown words, and checksum
//! mismatches are all rejected, never papered over.
//!
//! ## Security Considerations
//!
//! | Aspect | Measure |
//! |--------|---------|
//! | Wordlist | BIP39 English, 2048 words, versioned by the standard |
//! | Checksum | Catches typos and transposed words during recovery |
//! | Display | Show once, never log, never store |

use bip39::{Language, Mnemonic};
use zeroize::{ZeroizeOnDrop, Zeroizing};

use crate::error::{Error, Result};

/// Supported entropy sizes in bytes (12, 15, 18, 21, 24 words)
pub const SUPPORTED_ENTROPY_SIZES: [usize; 5] = [16, 20, 24, 28, 32];

/// Word counts corresponding to [`SUPPORTED_ENTROPY_SIZES`]
pub const SUPPORTED_WORD_COUNTS: [usize; 5] = [12, 15, 18, 21, 24];

/// A checksummed recovery phrase encoding a keypair's entropy
///
/// ## Security Warning
///
/// - This phrase can fully recover the keypair derived from it
/// - Should be shown to the user exactly once
/// - Should never be logged or stored in plaintext
#[derive(ZeroizeOnDrop)]
pub struct RecoveryPhrase {
    /// The underlying BIP39 mnemonic
    #[zeroize(skip)] // bip39::Mnemonic doesn't implement Zeroize
    mnemonic: Mnemonic,
}

impl RecoveryPhrase {
    /// Encode entropy as a recovery phrase
    ///
    /// The entropy length must be one of [`SUPPORTED_ENTROPY_SIZES`];
    /// anything else is rejected up front.
    pub fn from_entropy(entropy: &[u8]) -> Result<Self> {
        if !SUPPORTED_ENTROPY_SIZES.contains(&entropy.len()) {
            return Err(Error::UnsupportedEntropySize(entropy.len()));
        }

        let mnemonic = Mnemonic::from_entropy(entropy)
            .map_err(|e| Error::InvalidRecoveryPhrase(format!("{}", e)))?;

        Ok(Self { mnemonic })
    }

    /// Parse and validate a recovery phrase
    ///
    /// ## Validation
    ///
    /// - Word count must be one of the supported size classes
    /// - All words must be in the BIP39 English wordlist
    /// - The embedded checksum must match the recovered entropy
    ///
    /// Total over arbitrary input: empty strings, whitespace, and word
    /// salads return `Err`, never panic.
    pub fn from_phrase(phrase: &str) -> Result<Self> {
        let trimmed = phrase.trim();
        if trimmed.is_empty() {
            return Err(Error::InvalidRecoveryPhrase("empty phrase".into()));
        }

        let word_count = trimmed.split_whitespace().count();
        if !SUPPORTED_WORD_COUNTS.contains(&word_count) {
            return Err(Error::InvalidRecoveryPhrase(format!(
                "unsupported word count {}",
                word_count
            )));
        }

        let normalized = trimmed.split_whitespace().collect::<Vec<_>>().join(" ");
        let mnemonic = Mnemonic::parse_normalized(&normalized)
            .map_err(|e| Error::InvalidRecoveryPhrase(format!("{}", e)))?;

        Ok(Self { mnemonic })
    }

    /// Recover the exact entropy this phrase encodes
    pub fn entropy(&self) -> Zeroizing<Vec<u8>> {
        Zeroizing::new(self.mnemonic.to_entropy())
    }

    /// Get the words as a vector
    pub fn words(&self) -> Vec<&'static str> {
        self.mnemonic.words().collect()
    }

    /// Number of words in the phrase
    pub fn word_count(&self) -> usize {
        self.mnemonic.word_count()
    }

    /// Get the phrase as a single string (words separated by spaces)
    ///
    /// ## Security Warning
    ///
    /// Only use this for display to the user. Never log or store.
    pub fn phrase(&self) -> String {
        self.mnemonic.to_string()
    }

    /// Check if a single word is in the BIP39 wordlist
    pub fn is_valid_word(word: &str) -> bool {
        let word_lower = word.to_lowercase();
        Language::English
            .word_list()
            .iter()
            .any(|w| *w == word_lower)
    }

    /// Get word suggestions for recovery-UI autocomplete
    ///
    /// Returns up to ten wordlist entries starting with the given prefix.
    pub fn suggest_words(prefix: &str) -> Vec<&'static str> {
        if prefix.is_empty() {
            return vec![];
        }

        let prefix_lower = prefix.to_lowercase();
        let mut suggestions = Vec::new();

        for word in Language::English.word_list().iter() {
            if word.starts_with(&prefix_lower) {
                suggestions.push(*word);
                if suggestions.len() >= 10 {
                    break;
                }
            }
        }

        suggestions
    }
}

// Prevent accidental logging
impl std::fmt::Debug for RecoveryPhrase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "RecoveryPhrase([REDACTED])")
    }
}

/// Outcome of validating a candidate phrase, with per-check detail
///
/// Useful for recovery UIs that want to highlight the failing words
/// rather than show a generic "invalid phrase" message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationReport {
    /// Overall verdict: all checks passed
    pub valid: bool,
    /// Number of whitespace-separated words found
    pub word_count: usize,
    /// Whether the word count is a supported size class
    pub word_count_supported: bool,
    /// Words not present in the wordlist
    pub unknown_words: Vec<String>,
    /// Whether the embedded checksum matched (false if earlier checks failed)
    pub checksum_valid: bool,
}

/// Run every phrase check and report which ones failed
pub fn validate(phrase: &str) -> ValidationReport {
    let words: Vec<&str> = phrase.split_whitespace().collect();
    let word_count = words.len();
    let word_count_supported = SUPPORTED_WORD_COUNTS.contains(&word_count);

    let unknown_words: Vec<String> = words
        .iter()
        .filter(|w| !RecoveryPhrase::is_valid_word(w))
        .map(|w| w.to_string())
        .collect();

    let checksum_valid = word_count_supported
        && unknown_words.is_empty()
        && RecoveryPhrase::from_phrase(phrase).is_ok();

    ValidationReport {
        valid: word_count_supported && unknown_words.is_empty() && checksum_valid,
        word_count,
        word_count_supported,
        unknown_words,
        checksum_valid,
    }
}

/// Boolean form of [`validate`]
pub fn is_valid(phrase: &str) -> bool {
    RecoveryPhrase::from_phrase(phrase).is_ok()
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    // Standard BIP39 vector: all-zero 16-byte entropy
    const VECTOR_PHRASE: &str = "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about";

    #[test]
    fn test_fixed_vector() {
        let phrase = RecoveryPhrase::from_entropy(&[0u8; 16]).unwrap();
        assert_eq!(phrase.phrase(), VECTOR_PHRASE);

        let decoded = RecoveryPhrase::from_phrase(VECTOR_PHRASE).unwrap();
        assert_eq!(&*decoded.entropy(), &[0u8; 16]);
    }

    #[test]
    fn test_round_trip_all_supported_sizes() {
        for (i, &size) in SUPPORTED_ENTROPY_SIZES.iter().enumerate() {
            let entropy: Vec<u8> = (0..size).map(|b| (b * 7 + 3) as u8).collect();

            let phrase = RecoveryPhrase::from_entropy(&entropy).unwrap();
            assert_eq!(phrase.word_count(), SUPPORTED_WORD_COUNTS[i]);

            let decoded = RecoveryPhrase::from_phrase(&phrase.phrase()).unwrap();
            assert_eq!(&*decoded.entropy(), &entropy[..]);
        }
    }

    #[test]
    fn test_unsupported_entropy_sizes() {
        assert!(matches!(
            RecoveryPhrase::from_entropy(&[0u8; 15]),
            Err(Error::UnsupportedEntropySize(15))
        ));
        assert!(matches!(
            RecoveryPhrase::from_entropy(&[]),
            Err(Error::UnsupportedEntropySize(0))
        ));
        assert!(matches!(
            RecoveryPhrase::from_entropy(&[0u8; 64]),
            Err(Error::UnsupportedEntropySize(64))
        ));
    }

    #[test]
    fn test_invalid_phrases_rejected() {
        assert!(RecoveryPhrase::from_phrase("").is_err());
        assert!(RecoveryPhrase::from_phrase("   ").is_err());
        assert!(RecoveryPhrase::from_phrase("not valid words").is_err());
        // Wrong word count
        assert!(RecoveryPhrase::from_phrase("abandon abandon abandon").is_err());
    }

    #[test]
    fn test_word_substitution_breaks_checksum() {
        // All-zero entropy demands "about" as its checksum word, so twelve
        // plain "abandon"s carry a wrong checksum despite valid words
        let tampered = VECTOR_PHRASE.replace(" about", " abandon");
        assert!(!is_valid(&tampered));

        // Substitute a non-wordlist token
        let salad = VECTOR_PHRASE.replace("about", "notaword");
        assert!(!is_valid(&salad));
    }

    #[test]
    fn test_is_valid() {
        assert!(is_valid(VECTOR_PHRASE));
        assert!(!is_valid(""));
        assert!(!is_valid("   "));
        assert!(!is_valid("not valid words"));
    }

    #[test]
    fn test_whitespace_tolerance() {
        let padded = format!("  {}  ", VECTOR_PHRASE.replace(' ', "   "));
        let decoded = RecoveryPhrase::from_phrase(&padded).unwrap();
        assert_eq!(&*decoded.entropy(), &[0u8; 16]);
    }

    #[test]
    fn test_validation_report() {
        let report = validate(VECTOR_PHRASE);
        assert!(report.valid);
        assert_eq!(report.word_count, 12);
        assert!(report.unknown_words.is_empty());
        assert!(report.checksum_valid);

        let report = validate("not valid words");
        assert!(!report.valid);
        assert_eq!(report.word_count, 3);
        assert!(!report.word_count_supported);
        assert!(!report.unknown_words.is_empty());

        let report = validate("");
        assert!(!report.valid);
        assert_eq!(report.word_count, 0);
    }

    #[test]
    fn test_is_valid_word() {
        assert!(RecoveryPhrase::is_valid_word("abandon"));
        assert!(RecoveryPhrase::is_valid_word("zoo"));
        assert!(!RecoveryPhrase::is_valid_word("notaword"));
    }

    #[test]
    fn test_suggest_words() {
        let suggestions = RecoveryPhrase::suggest_words("ab");
        assert!(suggestions.contains(&"abandon"));
        assert!(suggestions.contains(&"ability"));
        assert!(RecoveryPhrase::suggest_words("").is_empty());
    }

    #[test]
    fn test_debug_redacts() {
        let phrase = RecoveryPhrase::from_entropy(&[0u8; 16]).unwrap();
        let debug = format!("{:?}", phrase);
        assert!(debug.contains("REDACTED"));
        assert!(!debug.contains("abandon"));
    }
}
