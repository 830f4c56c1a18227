//! Encrypted file backup and restore with change detection.

mod changes;
mod error;
mod storage;

pub mod backup;
pub mod crypto;
pub mod restore;

pub use crate::backup::{BackupSummary, ENC_SUFFIX, SourceKind};
pub use crate::changes::{ChangeTracker, STATE_FILE_NAME, hash_file};
pub use crate::crypto::KeyStore;
pub use crate::crypto::keyfile::default_key_path;
pub use crate::error::{Error, Result};
pub use crate::restore::RestoreSummary;

use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Backup session: owns the change-tracking records and drives the
/// orchestrators.
///
/// One instance corresponds to one backup root; load the persisted records
/// with [`Keepsafe::with_state`] to keep change detection across restarts.
pub struct Keepsafe {
    tracker: ChangeTracker,
}

impl Default for Keepsafe {
    fn default() -> Self {
        Self::new()
    }
}

impl Keepsafe {
    /// Starts a session with no change records; every file counts as new.
    pub fn new() -> Self {
        Self {
            tracker: ChangeTracker::new(),
        }
    }

    /// Starts a session from the state file persisted in `backup_root`, if
    /// any.
    pub fn with_state(backup_root: &Path) -> Result<Self> {
        let tracker = ChangeTracker::load(&backup_root.join(STATE_FILE_NAME))?;
        Ok(Self { tracker })
    }

    /// Encrypts every new or changed file under `source` into `backup_root`
    /// and persists the updated change records there.
    ///
    /// Returns the outcome counts; `processed == 0` means nothing needed
    /// backing up.
    pub fn backup(
        &mut self,
        source: &Path,
        backup_root: &Path,
        password: &str,
        kind: SourceKind,
    ) -> Result<BackupSummary> {
        let summary = backup::run(&mut self.tracker, source, backup_root, password, kind)?;

        if let Err(e) = self.save_state(backup_root) {
            warn!("failed to persist change records: {e}");
        }

        Ok(summary)
    }

    /// Lists the files under `source` that would be re-encrypted by the next
    /// backup pass.
    pub fn check(&self, source: &Path, kind: SourceKind) -> Result<Vec<PathBuf>> {
        backup::changed_files(&self.tracker, source, kind)
    }

    /// Decrypts the backup tree at `backup_root` into `destination`.
    pub fn restore(
        &self,
        backup_root: &Path,
        destination: &Path,
        password: &str,
    ) -> Result<RestoreSummary> {
        restore::run(backup_root, destination, password)
    }

    /// Forgets every change record, forcing the next backup pass to treat
    /// every file as new. Touches nothing on disk.
    pub fn reset(&mut self) {
        self.tracker.reset();
    }

    /// Persists the change records into `backup_root`.
    pub fn save_state(&self, backup_root: &Path) -> Result<()> {
        self.tracker.save(&backup_root.join(STATE_FILE_NAME))
    }

    /// Number of files with a recorded digest.
    pub fn tracked(&self) -> usize {
        self.tracker.len()
    }
}

/// Encrypts a single file under the stored fixed key, no password involved.
///
/// Writes `output_dir/<filename>.enc` and returns its path.
pub fn encrypt_file(source: &Path, output_dir: &Path, keys: &KeyStore) -> Result<PathBuf> {
    if !source.is_file() {
        return Err(Error::NotFound(source.to_path_buf()));
    }
    let Some(name) = source.file_name() else {
        return Err(Error::NotFound(source.to_path_buf()));
    };

    let plaintext = fs::read(source).map_err(|e| Error::file_io(source, e))?;
    let blob = crypto::fixed::seal(&plaintext, keys.key())?;

    fs::create_dir_all(output_dir).map_err(|e| Error::file_io(output_dir, e))?;
    let target = output_dir.join(backup::encrypted_name(name));
    fs::write(&target, blob).map_err(|e| Error::file_io(&target, e))?;

    info!(file = %target.display(), "encrypted");
    Ok(target)
}

/// Decrypts a fixed-key encrypted file into `output`.
pub fn decrypt_file(encrypted: &Path, output: &Path, keys: &KeyStore) -> Result<PathBuf> {
    if !encrypted.is_file() {
        return Err(Error::NotFound(encrypted.to_path_buf()));
    }

    let blob = fs::read(encrypted).map_err(|e| Error::file_io(encrypted, e))?;
    let plaintext = crypto::fixed::open(&blob, keys.key())?;

    if let Some(parent) = output.parent() {
        fs::create_dir_all(parent).map_err(|e| Error::file_io(parent, e))?;
    }
    fs::write(output, plaintext).map_err(|e| Error::file_io(output, e))?;

    info!(file = %output.display(), "decrypted");
    Ok(output.to_path_buf())
}
