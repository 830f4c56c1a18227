//! Persisted fixed-key material.
//!
//! The fixed-key mode needs a stable 256-bit key that survives restarts
//! without a per-call password. The key lives in a file of exactly 32 raw
//! bytes; it is generated on first use and reused thereafter. Callers load
//! it once at startup and pass the [`KeyStore`] down explicitly.

use getrandom::fill;
use std::fs;
use std::path::{Path, PathBuf};
use zeroize::Zeroize;

use super::KEY_LEN;
use crate::error::{Error, Result};
use crate::storage;

/// Name of the key file under the platform data directory.
const KEY_FILE_NAME: &str = "keepsafe.key";

/// Holds the fixed encryption key loaded from (or generated into) a key file.
pub struct KeyStore {
    key: [u8; KEY_LEN],
    path: PathBuf,
}

impl Drop for KeyStore {
    fn drop(&mut self) {
        self.key.zeroize();
    }
}

impl KeyStore {
    /// Loads the key file at `path`, or generates a fresh random key and
    /// writes it there if the file does not exist yet.
    ///
    /// # Errors
    ///
    /// A key file of any length other than exactly 32 bytes is a fatal
    /// configuration error ([`Error::KeyFile`]); it is never truncated,
    /// padded, or regenerated.
    pub fn load_or_generate(path: &Path) -> Result<Self> {
        if path.exists() {
            let mut data = fs::read(path).map_err(|e| Error::file_io(path, e))?;
            if data.len() != KEY_LEN {
                let actual = data.len();
                data.zeroize();
                return Err(Error::KeyFile(format!(
                    "{} holds {actual} bytes, expected exactly {KEY_LEN}",
                    path.display(),
                )));
            }

            let mut key = [0u8; KEY_LEN];
            key.copy_from_slice(&data);
            data.zeroize();

            return Ok(Self {
                key,
                path: path.to_path_buf(),
            });
        }

        let mut key = [0u8; KEY_LEN];
        fill(&mut key).map_err(|_| Error::Rng)?;
        storage::write_atomic(path, &key)?;

        Ok(Self {
            key,
            path: path.to_path_buf(),
        })
    }

    /// The 32-byte key.
    pub fn key(&self) -> &[u8; KEY_LEN] {
        &self.key
    }

    /// Where the key was loaded from.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Default key file location under the platform data directory.
pub fn default_key_path() -> Result<PathBuf> {
    let project_dirs = directories::ProjectDirs::from("", "", "keepsafe").ok_or_else(|| {
        Error::KeyFile("could not determine platform data directory".to_string())
    })?;

    Ok(project_dirs.data_dir().join(KEY_FILE_NAME))
}
