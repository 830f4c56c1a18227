use std::fmt;
use std::io;
use std::path::PathBuf;

/// Result type used by the library core.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug)]
pub enum Error {
    /// One or more preconditions failed before any I/O began.
    /// Carries every violation, not just the first.
    Validation(Vec<String>),
    /// A referenced path did not exist at the time of the operation.
    NotFound(PathBuf),
    /// Decryption failed. Wrong password and corrupted data surface
    /// identically through this variant.
    Decryption,
    /// Encryption failed inside the cipher primitive.
    Encryption,
    /// Read/write failure independent of the crypto layer.
    FileIo { path: PathBuf, source: io::Error },
    /// The key file is unreadable or does not hold exactly 32 bytes.
    KeyFile(String),
    /// The OS random generator is unavailable.
    Rng,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Validation(violations) => {
                write!(f, "validation failed: {}", violations.join("; "))
            }
            Error::NotFound(path) => write!(f, "path not found: {}", path.display()),
            Error::Decryption => write!(f, "Invalid password or corrupted data"),
            Error::Encryption => write!(f, "encryption failed"),
            Error::FileIo { path, source } => {
                write!(f, "file error at {}: {source}", path.display())
            }
            Error::KeyFile(reason) => write!(f, "key file error: {reason}"),
            Error::Rng => write!(f, "OS random generator unavailable"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::FileIo { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl Error {
    /// Wraps an I/O error with the path it occurred on.
    pub(crate) fn file_io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Error::FileIo {
            path: path.into(),
            source,
        }
    }
}
