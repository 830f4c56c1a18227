//! Cryptographic primitives for backup blobs.
//!
//! Two blob formats share one framing convention: a one-byte format tag
//! followed by a 16-byte field (salt or IV) and the payload. The tag makes
//! every blob self-describing, so a password-mode blob can never be fed to
//! the fixed-key path by accident.

pub mod fixed;
pub mod kdf;
pub mod keyfile;
pub mod sealed;

pub use keyfile::KeyStore;

/// Length of the format tag (1 byte).
pub const TAG_LEN: usize = 1;
/// Format tag for password-derived encryption.
pub const TAG_SEALED: u8 = 0x01;
/// Format tag for fixed-key encryption.
pub const TAG_FIXED: u8 = 0x02;
/// Length of the KDF salt (16 bytes).
pub const SALT_LEN: usize = 16;
/// Length of the AEAD nonce (24 bytes for XChaCha20-Poly1305).
pub const NONCE_LEN: usize = 24;
/// Length of the CBC initialization vector (16 bytes).
pub const IV_LEN: usize = 16;
/// Length of the encryption key (32 bytes / 256 bits).
pub const KEY_LEN: usize = 32;
/// PBKDF2-HMAC-SHA256 iteration count.
pub const PBKDF2_ITERATIONS: u32 = 100_000;
