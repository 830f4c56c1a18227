//! Backup orchestration.
//!
//! Walks a source file or directory, mirrors its structure under the backup
//! root, and encrypts every new or changed file under the supplied password.
//! Failures are isolated at file granularity: a file that cannot be hashed,
//! read, or written is logged and counted, and the walk moves on.

use std::ffi::{OsStr, OsString};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::changes::{self, ChangeTracker};
use crate::crypto::sealed;
use crate::error::{Error, Result};

/// Extension appended to every encrypted file.
pub const ENC_SUFFIX: &str = "enc";

/// Declared kind of the backup source. Validation rejects a source whose
/// actual filesystem kind does not match the declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    Directory,
    File,
}

/// Outcome counts of one backup run.
///
/// `processed` counts files actually (re-)encrypted; zero means "nothing new
/// to back up", which is a success, not an error.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BackupSummary {
    pub processed: usize,
    pub skipped: usize,
    pub failed: usize,
}

enum FileOutcome {
    Processed,
    Skipped,
    Failed,
}

fn check_source(source: &Path, kind: SourceKind, violations: &mut Vec<String>) {
    if source.as_os_str().is_empty() {
        violations.push("source path is not set".to_string());
    } else if !source.exists() {
        violations.push(format!("source path does not exist: {}", source.display()));
    } else if kind == SourceKind::Directory && !source.is_dir() {
        violations.push(format!(
            "source path is not a directory: {}",
            source.display()
        ));
    } else if kind == SourceKind::File && !source.is_file() {
        violations.push(format!(
            "source path is not a regular file: {}",
            source.display()
        ));
    }
}

/// Checks every precondition before any I/O and reports all violations
/// together, not just the first.
fn validate(source: &Path, kind: SourceKind, backup_root: &Path, password: &str) -> Result<()> {
    let mut violations = Vec::new();

    check_source(source, kind, &mut violations);

    if backup_root.as_os_str().is_empty() {
        violations.push("backup directory is not set".to_string());
    }

    if password.is_empty() {
        violations.push("encryption password is empty".to_string());
    }

    if violations.is_empty() {
        Ok(())
    } else {
        Err(Error::Validation(violations))
    }
}

/// Runs one backup pass. See [`crate::Keepsafe::backup`].
pub fn run(
    tracker: &mut ChangeTracker,
    source: &Path,
    backup_root: &Path,
    password: &str,
    kind: SourceKind,
) -> Result<BackupSummary> {
    validate(source, kind, backup_root, password)?;

    info!(
        source = %source.display(),
        backup_root = %backup_root.display(),
        "starting backup"
    );

    let summary = match kind {
        SourceKind::Directory => backup_directory(tracker, source, backup_root, password),
        SourceKind::File => backup_single_file(tracker, source, backup_root, password),
    };

    info!(
        processed = summary.processed,
        skipped = summary.skipped,
        failed = summary.failed,
        "backup complete"
    );

    Ok(summary)
}

fn backup_directory(
    tracker: &mut ChangeTracker,
    source: &Path,
    backup_root: &Path,
    password: &str,
) -> BackupSummary {
    let mut summary = BackupSummary::default();

    for entry in WalkDir::new(source) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!("skipping unreadable entry: {e}");
                summary.failed += 1;
                continue;
            }
        };

        let path = entry.path();
        // the walk yields the source root itself first; strip_prefix then
        // maps it to the backup root
        let relative = match path.strip_prefix(source) {
            Ok(relative) => relative,
            Err(_) => continue,
        };

        if path.is_dir() {
            let mirrored = backup_root.join(relative);
            if let Err(e) = fs::create_dir_all(&mirrored) {
                warn!(path = %mirrored.display(), "failed to mirror directory: {e}");
            }
            continue;
        }

        let mut destination = backup_root.join(relative);
        destination.set_file_name(encrypted_name(entry.file_name()));

        match backup_file(tracker, path, &destination, password) {
            FileOutcome::Processed => summary.processed += 1,
            FileOutcome::Skipped => summary.skipped += 1,
            FileOutcome::Failed => summary.failed += 1,
        }
    }

    summary
}

fn backup_single_file(
    tracker: &mut ChangeTracker,
    source: &Path,
    backup_root: &Path,
    password: &str,
) -> BackupSummary {
    let mut summary = BackupSummary::default();

    // a lone file gets its own stem-named subdirectory, so single-file
    // backups stay grouped by logical unit
    let Some(name) = source.file_name() else {
        warn!(path = %source.display(), "source has no file name");
        summary.failed += 1;
        return summary;
    };
    let stem = source.file_stem().unwrap_or(name);

    let destination = backup_root.join(stem).join(encrypted_name(name));

    match backup_file(tracker, source, &destination, password) {
        FileOutcome::Processed => summary.processed += 1,
        FileOutcome::Skipped => summary.skipped += 1,
        FileOutcome::Failed => summary.failed += 1,
    }

    summary
}

fn backup_file(
    tracker: &mut ChangeTracker,
    source: &Path,
    destination: &Path,
    password: &str,
) -> FileOutcome {
    let digest = match changes::hash_file(source) {
        Ok(digest) => digest,
        Err(e) => {
            warn!(file = %source.display(), "failed to hash: {e}");
            return FileOutcome::Failed;
        }
    };

    if !tracker.has_changed(source, &digest) {
        debug!(file = %source.display(), "unchanged, skipping");
        return FileOutcome::Skipped;
    }

    let plaintext = match fs::read(source) {
        Ok(plaintext) => plaintext,
        Err(e) => {
            warn!(file = %source.display(), "failed to read: {e}");
            return FileOutcome::Failed;
        }
    };

    let blob = match sealed::seal(&plaintext, password) {
        Ok(blob) => blob,
        Err(e) => {
            warn!(file = %source.display(), "failed to encrypt: {e}");
            return FileOutcome::Failed;
        }
    };

    if let Some(parent) = destination.parent() {
        if let Err(e) = fs::create_dir_all(parent) {
            warn!(path = %parent.display(), "failed to create backup directory: {e}");
            return FileOutcome::Failed;
        }
    }

    if let Err(e) = fs::write(destination, blob) {
        warn!(file = %destination.display(), "failed to write: {e}");
        return FileOutcome::Failed;
    }

    tracker.record(source, digest);
    info!(file = %source.display(), "backed up");
    FileOutcome::Processed
}

/// Lists the files under `source` whose content differs from the last
/// recorded digest (or that have no record), without encrypting anything.
pub fn changed_files(
    tracker: &ChangeTracker,
    source: &Path,
    kind: SourceKind,
) -> Result<Vec<PathBuf>> {
    // password and backup root play no part here; validate the source alone
    let mut violations = Vec::new();
    check_source(source, kind, &mut violations);
    if !violations.is_empty() {
        return Err(Error::Validation(violations));
    }

    let mut changed = Vec::new();

    match kind {
        SourceKind::File => {
            check_file(tracker, source, &mut changed);
        }
        SourceKind::Directory => {
            for entry in WalkDir::new(source) {
                let entry = match entry {
                    Ok(entry) => entry,
                    Err(e) => {
                        warn!("skipping unreadable entry: {e}");
                        continue;
                    }
                };
                if entry.path().is_dir() {
                    continue;
                }
                check_file(tracker, entry.path(), &mut changed);
            }
        }
    }

    Ok(changed)
}

fn check_file(tracker: &ChangeTracker, path: &Path, changed: &mut Vec<PathBuf>) {
    match changes::hash_file(path) {
        Ok(digest) => {
            if tracker.has_changed(path, &digest) {
                changed.push(path.to_path_buf());
            }
        }
        Err(e) => warn!(file = %path.display(), "failed to hash: {e}"),
    }
}

/// `name` with the encrypted-marker extension appended: `report.txt` becomes
/// `report.txt.enc`.
pub(crate) fn encrypted_name(name: &OsStr) -> OsString {
    let mut encrypted = name.to_os_string();
    encrypted.push(".");
    encrypted.push(ENC_SUFFIX);
    encrypted
}
