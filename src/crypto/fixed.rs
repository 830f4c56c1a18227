//! Fixed-key encryption for password-less operation.
//!
//! Blob layout: `tag(1) || iv(16) || ciphertext`, AES-256-CBC with PKCS#7
//! padding under the 32-byte key held by [`KeyStore`](super::KeyStore).
//! No authentication tag: this mode trades tamper detection for a stable
//! key that needs no per-call password.

use aes::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit, block_padding::Pkcs7};
use getrandom::fill;

use super::{IV_LEN, KEY_LEN, TAG_FIXED, TAG_LEN};
use crate::error::{Error, Result};

type Aes256CbcEnc = cbc::Encryptor<aes::Aes256>;
type Aes256CbcDec = cbc::Decryptor<aes::Aes256>;

const PREFIX_LEN: usize = TAG_LEN + IV_LEN;

/// Encrypt plaintext under the fixed key with a fresh random IV.
pub fn seal(plaintext: &[u8], key: &[u8; KEY_LEN]) -> Result<Vec<u8>> {
    let mut iv = [0u8; IV_LEN];
    fill(&mut iv).map_err(|_| Error::Rng)?;

    let ciphertext = Aes256CbcEnc::new_from_slices(key, &iv)
        .map_err(|_| Error::Encryption)?
        .encrypt_padded_vec_mut::<Pkcs7>(plaintext);

    let mut blob = Vec::with_capacity(PREFIX_LEN + ciphertext.len());
    blob.push(TAG_FIXED);
    blob.extend_from_slice(&iv);
    blob.extend_from_slice(&ciphertext);
    Ok(blob)
}

/// Decrypt a fixed-key blob.
///
/// Framing and padding failures collapse into [`Error::Decryption`], same as
/// the password path.
pub fn open(blob: &[u8], key: &[u8; KEY_LEN]) -> Result<Vec<u8>> {
    if blob.len() <= PREFIX_LEN || blob[0] != TAG_FIXED {
        return Err(Error::Decryption);
    }

    let iv = &blob[TAG_LEN..PREFIX_LEN];
    let ciphertext = &blob[PREFIX_LEN..];

    Aes256CbcDec::new_from_slices(key, iv)
        .map_err(|_| Error::Decryption)?
        .decrypt_padded_vec_mut::<Pkcs7>(ciphertext)
        .map_err(|_| Error::Decryption)
}
