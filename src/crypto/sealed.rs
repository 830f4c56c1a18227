//! Password-derived authenticated encryption.
//!
//! Blob layout: `tag(1) || salt(16) || nonce(24) || ciphertext`. The
//! ciphertext carries the Poly1305 authentication tag, so the blob is fully
//! self-contained: decrypt re-derives the key from the stored salt and
//! verifies integrity in one step.

use chacha20poly1305::{
    Key, XChaCha20Poly1305, XNonce,
    aead::{Aead, KeyInit},
};
use getrandom::fill;
use zeroize::Zeroize;

use super::{NONCE_LEN, SALT_LEN, TAG_LEN, TAG_SEALED, kdf};
use crate::error::{Error, Result};

const PREFIX_LEN: usize = TAG_LEN + SALT_LEN + NONCE_LEN;

/// Encrypt plaintext under a password with a fresh random salt and nonce.
pub fn seal(plaintext: &[u8], password: &str) -> Result<Vec<u8>> {
    let salt = kdf::generate_salt()?;
    let mut key = kdf::derive_key(password, &salt);

    let mut nonce = [0u8; NONCE_LEN];
    fill(&mut nonce).map_err(|_| Error::Rng)?;

    let cipher = XChaCha20Poly1305::new(Key::from_slice(&key));
    key.zeroize();

    let ciphertext = cipher
        .encrypt(XNonce::from_slice(&nonce), plaintext)
        .map_err(|_| Error::Encryption)?;

    let mut blob = Vec::with_capacity(PREFIX_LEN + ciphertext.len());
    blob.push(TAG_SEALED);
    blob.extend_from_slice(&salt);
    blob.extend_from_slice(&nonce);
    blob.extend_from_slice(&ciphertext);
    Ok(blob)
}

/// Decrypt a sealed blob under a password.
///
/// Every failure mode — unknown tag, truncated blob, failed authentication —
/// collapses into [`Error::Decryption`] so a caller cannot tell a wrong
/// password from corrupted bytes.
pub fn open(blob: &[u8], password: &str) -> Result<Vec<u8>> {
    if blob.len() <= PREFIX_LEN || blob[0] != TAG_SEALED {
        return Err(Error::Decryption);
    }

    let salt = &blob[TAG_LEN..TAG_LEN + SALT_LEN];
    let nonce = &blob[TAG_LEN + SALT_LEN..PREFIX_LEN];
    let ciphertext = &blob[PREFIX_LEN..];

    let mut key = kdf::derive_key(password, salt);
    let cipher = XChaCha20Poly1305::new(Key::from_slice(&key));
    key.zeroize();

    cipher
        .decrypt(XNonce::from_slice(nonce), ciphertext)
        .map_err(|_| Error::Decryption)
}
