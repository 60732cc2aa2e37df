//! # Envelope Encryption Demo
//!
//! Demonstrates the local and remote envelope formats.
//!
//! ## Run
//!
//! ```bash
//! cargo run --release --example encryption_demo
//! ```

use seedvault_core::{KeyManager, TransmissionPayload};

#[tokio::main]
async fn main() {
    println!("=== Seedvault Core: Envelope Encryption Demo ===\n");

    println!("Step 1: Generating a 2048-bit keypair (this takes a moment)...");
    let mut manager = KeyManager::with_defaults();
    let ok = manager
        .generate_keypair(2048)
        .await
        .expect("randomness source failed");
    assert!(ok, "generation was rejected");
    println!("  public key: {}...", &manager.public_key_string().unwrap()[..48]);
    println!();

    // Local envelope: one opaque blob for encrypted-at-rest storage
    println!("Step 2: Local-storage envelope...");
    let plaintext = b"database field contents";
    let blob = manager
        .encrypt_for_local_storage(plaintext)
        .await
        .expect("randomness source failed")
        .expect("keypair held");
    println!("  plaintext: {} bytes", plaintext.len());
    println!("  envelope:  {} bytes (wrapped key + nonce + ciphertext)", blob.len());

    let opened = manager.decrypt_from_local_storage(&blob).expect("opens");
    println!("  round-trip ok: {}", &*opened == plaintext);
    println!();

    // Tampering is detected, and indistinguishable from a wrong key
    println!("Step 3: Tamper detection...");
    let mut tampered = blob.clone();
    let last = tampered.len() - 1;
    tampered[last] ^= 0xFF;
    println!(
        "  tampered envelope decrypts: {}",
        manager.decrypt_from_local_storage(&tampered).is_some()
    );
    println!();

    // Remote payload: two independently routable base64 fields
    println!("Step 4: Remote transmission payload...");
    let bytes = manager
        .prepare_for_remote_transmission(b"message for the server")
        .await
        .expect("randomness source failed")
        .expect("keypair held");
    let payload: TransmissionPayload =
        serde_json::from_slice(&bytes).expect("payload parses");
    println!("  encrypted_key:  {}...", &payload.encrypted_key[..32]);
    println!("  encrypted_data: {}...", &payload.encrypted_data[..32]);

    let opened = manager
        .decrypt_remote_transmission_data(&payload.encrypted_key, &payload.encrypted_data)
        .expect("opens");
    println!(
        "  round-trip ok: {}",
        &*opened == b"message for the server"
    );

    println!("\nDone.");
}
