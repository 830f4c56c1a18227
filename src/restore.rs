//! Restore orchestration.
//!
//! Walks an encrypted backup tree, strips the `.enc` marker from every
//! encrypted file, and decrypts it into the mirrored place under the
//! destination. Decrypt failures are logged and counted per file; a wrong
//! password simply leaves every file failed and the count at zero.

use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::backup::ENC_SUFFIX;
use crate::crypto::sealed;
use crate::error::{Error, Result};

/// Outcome counts of one restore run. `restored` reflects successes only.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RestoreSummary {
    pub restored: usize,
    pub failed: usize,
}

/// Runs one restore pass. See [`crate::Keepsafe::restore`].
pub fn run(backup_root: &Path, destination: &Path, password: &str) -> Result<RestoreSummary> {
    let mut violations = Vec::new();
    if backup_root.as_os_str().is_empty() {
        violations.push("backup directory is not set".to_string());
    }
    if password.is_empty() {
        violations.push("encryption password is empty".to_string());
    }
    if !violations.is_empty() {
        return Err(Error::Validation(violations));
    }

    if !backup_root.exists() {
        return Err(Error::NotFound(backup_root.to_path_buf()));
    }

    info!(
        backup_root = %backup_root.display(),
        destination = %destination.display(),
        "starting restore"
    );

    let mut summary = RestoreSummary::default();

    if backup_root.is_dir() {
        restore_tree(backup_root, destination, password, &mut summary);
    } else if let Some(original) = original_name(backup_root) {
        // the backup root is itself a single encrypted file
        match restore_file(backup_root, &destination.join(original), password) {
            Ok(()) => summary.restored += 1,
            Err(_) => summary.failed += 1,
        }
    } else {
        warn!(path = %backup_root.display(), "not an encrypted backup file, nothing to restore");
    }

    info!(
        restored = summary.restored,
        failed = summary.failed,
        "restore complete"
    );

    Ok(summary)
}

fn restore_tree(
    backup_root: &Path,
    destination: &Path,
    password: &str,
    summary: &mut RestoreSummary,
) {
    for entry in WalkDir::new(backup_root) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!("skipping unreadable entry: {e}");
                summary.failed += 1;
                continue;
            }
        };

        let path = entry.path();
        let relative = match path.strip_prefix(backup_root) {
            Ok(relative) => relative,
            Err(_) => continue,
        };

        if path.is_dir() {
            let mirrored = destination.join(relative);
            if let Err(e) = fs::create_dir_all(&mirrored) {
                warn!(path = %mirrored.display(), "failed to mirror directory: {e}");
            }
            continue;
        }

        // only files carrying the marker extension are backups; state files
        // and stray content are left alone
        let Some(original) = original_name(path) else {
            debug!(file = %path.display(), "no encrypted marker, ignoring");
            continue;
        };

        let mut target = destination.join(relative);
        target.set_file_name(original);

        match restore_file(path, &target, password) {
            Ok(()) => summary.restored += 1,
            Err(e) => {
                warn!(file = %path.display(), "failed to restore: {e}");
                summary.failed += 1;
            }
        }
    }
}

fn restore_file(encrypted: &Path, target: &Path, password: &str) -> Result<()> {
    let blob = fs::read(encrypted).map_err(|e| Error::file_io(encrypted, e))?;
    let plaintext = sealed::open(&blob, password)?;

    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent).map_err(|e| Error::file_io(parent, e))?;
    }
    fs::write(target, plaintext).map_err(|e| Error::file_io(target, e))?;

    info!(file = %target.display(), "restored");
    Ok(())
}

/// The original file name with the `.enc` marker stripped, or `None` when
/// the file does not carry the marker.
fn original_name(path: &Path) -> Option<PathBuf> {
    if path.extension()? == ENC_SUFFIX {
        path.file_stem().map(PathBuf::from)
    } else {
        None
    }
}
