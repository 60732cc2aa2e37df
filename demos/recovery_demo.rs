//! # Recovery Phrase Demo
//!
//! Demonstrates mnemonic generation, validation, and keypair recovery.
//!
//! ## Run
//!
//! ```bash
//! cargo run --release --example recovery_demo
//! ```

use seedvault_core::crypto::{is_valid, validate};
use seedvault_core::KeyManager;

#[tokio::main]
async fn main() {
    println!("=== Seedvault Core: Recovery Phrase Demo ===\n");

    // Step 1: Generate a keypair and its phrase
    println!("Step 1: Generating a 2048-bit keypair (this takes a moment)...");

    let mut manager = KeyManager::with_defaults();
    let ok = manager
        .generate_keypair(2048)
        .await
        .expect("randomness source failed");
    assert!(ok, "generation was rejected");

    let phrase = manager.mnemonic_phrase().expect("phrase available");
    let words: Vec<&str> = phrase.split_whitespace().collect();

    println!();
    println!("  ┌────────────────────────────────────────────────────────────┐");
    println!("  │                   YOUR RECOVERY PHRASE                     │");
    println!("  ├────────────────────────────────────────────────────────────┤");
    for (i, chunk) in words.chunks(6).enumerate() {
        print!("  │  ");
        for (j, word) in chunk.iter().enumerate() {
            print!("{:2}. {:12}", i * 6 + j + 1, word);
        }
        println!("│");
    }
    println!("  └────────────────────────────────────────────────────────────┘");
    println!();
    println!("  Write this down on paper. It is shown exactly once.");
    println!();

    // Step 2: Validate phrases
    println!("Step 2: Validating phrases...");
    println!("  original phrase valid: {}", is_valid(&phrase));
    let report = validate("not valid words");
    println!(
        "  \"not valid words\" valid: {} (unknown words: {:?})",
        report.valid, report.unknown_words
    );
    println!();

    // Step 3: Recover on a second manager
    println!("Step 3: Recovering the keypair on a fresh manager...");
    let mut recovered = KeyManager::with_defaults();
    assert!(recovered.recover_from_mnemonic(&phrase));

    println!(
        "  public keys match: {}",
        manager.public_key_string() == recovered.public_key_string()
    );

    // Step 4: Prove the recovered keypair decrypts old data
    println!("Step 4: Decrypting with the recovered keypair...");
    let sealed = manager
        .encrypt_for_local_storage(b"sealed before recovery")
        .await
        .expect("randomness source failed")
        .expect("keypair held");
    let opened = recovered
        .decrypt_from_local_storage(&sealed)
        .expect("decryption succeeds");
    println!(
        "  recovered plaintext: {:?}",
        String::from_utf8_lossy(&opened)
    );

    println!("\nDone.");
}
