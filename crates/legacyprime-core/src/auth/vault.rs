//! Passphrase sealing for the session file.
//!
//! Layout: `MAGIC | salt (16) | nonce (12) | ciphertext+tag`. The key is
//! derived from the passphrase with Argon2id (default parameters) and the
//! payload is encrypted with ChaCha20-Poly1305.

use anyhow::{anyhow, bail, Result};
use argon2::Argon2;
use chacha20poly1305::aead::{Aead, KeyInit};
use chacha20poly1305::{ChaCha20Poly1305, Key, Nonce};
use rand::RngCore;

const MAGIC: &[u8] = b"LPS1";
const SALT_LEN: usize = 16;
const NONCE_LEN: usize = 12;
const KEY_LEN: usize = 32;

/// True if `data` starts with the sealed-file marker.
pub fn is_sealed(data: &[u8]) -> bool {
    data.starts_with(MAGIC)
}

pub fn seal(passphrase: &str, plaintext: &[u8]) -> Result<Vec<u8>> {
    let mut salt = [0u8; SALT_LEN];
    let mut nonce = [0u8; NONCE_LEN];
    let mut rng = rand::thread_rng();
    rng.fill_bytes(&mut salt);
    rng.fill_bytes(&mut nonce);

    let cipher = cipher_for(passphrase, &salt)?;
    let ciphertext = cipher
        .encrypt(Nonce::from_slice(&nonce), plaintext)
        .map_err(|_| anyhow!("Failed to encrypt session data"))?;

    let mut out = Vec::with_capacity(MAGIC.len() + SALT_LEN + NONCE_LEN + ciphertext.len());
    out.extend_from_slice(MAGIC);
    out.extend_from_slice(&salt);
    out.extend_from_slice(&nonce);
    out.extend_from_slice(&ciphertext);
    Ok(out)
}

pub fn open(passphrase: &str, sealed: &[u8]) -> Result<Vec<u8>> {
    if !is_sealed(sealed) || sealed.len() < MAGIC.len() + SALT_LEN + NONCE_LEN {
        bail!("Session data is not sealed");
    }
    let rest = &sealed[MAGIC.len()..];
    let (salt, rest) = rest.split_at(SALT_LEN);
    let (nonce, ciphertext) = rest.split_at(NONCE_LEN);

    let cipher = cipher_for(passphrase, salt)?;
    cipher
        .decrypt(Nonce::from_slice(nonce), ciphertext)
        .map_err(|_| anyhow!("Failed to decrypt session data (wrong passphrase or corrupt file)"))
}

fn cipher_for(passphrase: &str, salt: &[u8]) -> Result<ChaCha20Poly1305> {
    let mut key = [0u8; KEY_LEN];
    Argon2::default()
        .hash_password_into(passphrase.as_bytes(), salt, &mut key)
        .map_err(|e| anyhow!("Failed to derive session key: {}", e))?;
    Ok(ChaCha20Poly1305::new(Key::from_slice(&key)))
}
