//! Content-hash change detection.
//!
//! Each source file is streamed through SHA-256 and its lowercase hex digest
//! compared against the last digest recorded for that path. A file with no
//! record, or a differing digest, needs (re-)backup. The records are kept in
//! memory and persisted as a JSON state file inside the backup root so a
//! relaunched process does not re-encrypt an unchanged tree.

use chrono::Local;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fs::{self, File};
use std::io::Read;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::storage;

/// Name of the per-backup-root state file.
pub const STATE_FILE_NAME: &str = ".keepsafe.state";

/// Read size for streaming file hashing.
const HASH_CHUNK: usize = 4096;

/// Computes the lowercase hex SHA-256 digest of a file's content.
///
/// Streams in fixed-size chunks; files of any size hash in constant memory.
pub fn hash_file(path: &Path) -> Result<String> {
    let mut file = File::open(path).map_err(|e| Error::file_io(path, e))?;
    let mut hasher = Sha256::new();
    let mut buf = [0u8; HASH_CHUNK];

    loop {
        let n = file.read(&mut buf).map_err(|e| Error::file_io(path, e))?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }

    Ok(hex::encode(hasher.finalize()))
}

/// Records the last-seen content digest per source path.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ChangeTracker {
    records: HashMap<PathBuf, String>,
    updated: String,
}

impl ChangeTracker {
    pub fn new() -> Self {
        Self {
            records: HashMap::new(),
            updated: Local::now().to_string(),
        }
    }

    /// Loads tracker state from `state_path`. A missing file yields a fresh
    /// tracker (every file counts as new); an unreadable or malformed file
    /// is an error.
    pub fn load(state_path: &Path) -> Result<Self> {
        if !state_path.exists() {
            return Ok(Self::new());
        }

        let data = fs::read(state_path).map_err(|e| Error::file_io(state_path, e))?;
        serde_json::from_slice(&data).map_err(|e| {
            Error::file_io(
                state_path,
                std::io::Error::new(std::io::ErrorKind::InvalidData, e),
            )
        })
    }

    /// Persists tracker state to `state_path` atomically.
    pub fn save(&self, state_path: &Path) -> Result<()> {
        let data = serde_json::to_vec_pretty(self).map_err(|e| {
            Error::file_io(
                state_path,
                std::io::Error::new(std::io::ErrorKind::InvalidData, e),
            )
        })?;
        storage::write_atomic(state_path, &data)
    }

    /// True when `path` has no record yet or its digest differs.
    pub fn has_changed(&self, path: &Path, digest: &str) -> bool {
        self.records.get(path).map(String::as_str) != Some(digest)
    }

    /// Records the digest last backed up for `path`.
    pub fn record(&mut self, path: &Path, digest: String) {
        self.records.insert(path.to_path_buf(), digest);
        self.updated = Local::now().to_string();
    }

    /// Forgets every record. Touches nothing on disk; the next backup pass
    /// treats every file as new and rewrites the persisted state when it
    /// saves.
    pub fn reset(&mut self) {
        self.records.clear();
        self.updated = Local::now().to_string();
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
