use getrandom::fill;
use pbkdf2::pbkdf2_hmac;
use sha2::Sha256;

use super::{KEY_LEN, PBKDF2_ITERATIONS, SALT_LEN};
use crate::error::{Error, Result};

/// Generate a fresh random salt.
pub fn generate_salt() -> Result<[u8; SALT_LEN]> {
    let mut salt = [0u8; SALT_LEN];
    fill(&mut salt).map_err(|_| Error::Rng)?;
    Ok(salt)
}

/// Derive a 256-bit key from a password and salt.
///
/// Pure in `(password, salt)`: decrypt reconstructs the same key from the
/// salt stored in the blob.
pub fn derive_key(password: &str, salt: &[u8]) -> [u8; KEY_LEN] {
    let mut key = [0u8; KEY_LEN];
    pbkdf2_hmac::<Sha256>(password.as_bytes(), salt, PBKDF2_ITERATIONS, &mut key);
    key
}
