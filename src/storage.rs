//! Atomic persistence for key and state files.

use getrandom::fill;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Writes `data` to `path` using a temp-file-and-rename scheme.
///
/// Crash-safety: the data lands in a randomly named temporary file first,
/// which is fsynced and then atomically moved over the target. A crash
/// leaves either the old file or the new one, never a partial write.
///
/// Creates parent directories if they don't exist.
pub fn write_atomic(path: &Path, data: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| Error::file_io(parent, e))?;
    }

    let tmp_path = random_tmp_path(path)?;

    // securely create temp file (fail if exists)
    let mut tmp_file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&tmp_path)
        .map_err(|e| Error::file_io(&tmp_path, e))?;

    let write_result = tmp_file
        .write_all(data)
        .and_then(|_| tmp_file.sync_all());
    drop(tmp_file);

    if let Err(e) = write_result {
        let _ = fs::remove_file(&tmp_path);
        return Err(Error::file_io(&tmp_path, e));
    }

    if let Err(e) = atomic_replace(&tmp_path, path) {
        let _ = fs::remove_file(&tmp_path);
        return Err(e);
    }

    // fsync directory so the rename itself is persisted
    if let Some(parent) = path.parent() {
        let dir = File::open(parent).map_err(|e| Error::file_io(parent, e))?;
        dir.sync_all().map_err(|e| Error::file_io(parent, e))?;
    }

    Ok(())
}

/// Generates a unique temporary file path in the same directory.
///
/// Format: `filename.tmp.<randomhex>`
fn random_tmp_path(path: &Path) -> Result<PathBuf> {
    let mut buf = [0u8; 8]; // 64 bit entropy
    fill(&mut buf).map_err(|_| Error::Rng)?;

    let rand_string = buf.iter().map(|b| format!("{b:02x}")).collect::<String>();

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "state".to_string());

    Ok(path.with_file_name(format!("{file_name}.tmp.{rand_string}")))
}

/// Atomically replaces the target file with the temporary file.
///
/// Uses Windows `ReplaceFileW` with `REPLACEFILE_WRITE_THROUGH` when the
/// target exists; falls back to rename for the first write.
#[cfg(target_os = "windows")]
fn atomic_replace(tmp_path: &Path, path: &Path) -> Result<()> {
    use std::ffi::OsStr;
    use std::os::windows::ffi::OsStrExt;
    use windows_sys::Win32::Storage::FileSystem::{REPLACEFILE_WRITE_THROUGH, ReplaceFileW};

    if !path.exists() {
        return fs::rename(tmp_path, path).map_err(|e| Error::file_io(path, e));
    }

    fn to_wide(s: &OsStr) -> Vec<u16> {
        s.encode_wide().chain(std::iter::once(0)).collect()
    }

    let target_w = to_wide(path.as_os_str());
    let tmp_w = to_wide(tmp_path.as_os_str());

    // SAFETY:
    // - Strings are valid UTF-16 and null-terminated
    // - Pointers remain valid during the call
    // - Windows does not retain the pointers after return
    let result = unsafe {
        ReplaceFileW(
            target_w.as_ptr(),
            tmp_w.as_ptr(),
            std::ptr::null(),
            REPLACEFILE_WRITE_THROUGH,
            std::ptr::null(),
            std::ptr::null(),
        )
    };

    if result == 0 {
        return Err(Error::file_io(path, std::io::Error::last_os_error()));
    }

    Ok(())
}

/// Atomically replaces the target file with the temporary file.
///
/// On Unix, `rename()` is atomic when both paths are on the same filesystem.
#[cfg(not(target_os = "windows"))]
fn atomic_replace(tmp_path: &Path, path: &Path) -> Result<()> {
    fs::rename(tmp_path, path).map_err(|e| Error::file_io(path, e))
}
