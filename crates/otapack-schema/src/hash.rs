//! MD5 digests for firmware binaries.

use serde::{Deserialize, Deserializer, Serialize};
use std::io::Read;
use std::path::Path;

/// Size of the read buffer used when hashing files (64KB).
pub const HASH_CHUNK_SIZE: usize = 65536;

/// Errors produced when validating a digest string.
#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum DigestError {
    /// The digest is not exactly 32 characters long.
    #[error("Invalid MD5 digest: expected 32 hex characters, got {0}")]
    InvalidLength(usize),

    /// The digest contains characters outside `[0-9a-fA-F]`.
    #[error("Invalid MD5 digest: contains non-hex characters in '{0}'")]
    NonHex(String),
}

/// A validated MD5 digest (32 lowercase hex characters).
///
/// OTA clients on the device verify downloads against MD5, so this is the
/// checksum carried by every manifest and index entry. Deserialization
/// validates the string, so a malformed manifest is rejected at parse time.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Md5Digest(String);

impl Md5Digest {
    /// Create a new `Md5Digest`, validating the input.
    ///
    /// Accepts upper or lower case hex and normalizes to lower case.
    ///
    /// # Errors
    ///
    /// Returns [`DigestError`] if the input is not exactly 32 ASCII hex characters.
    pub fn new(s: impl Into<String>) -> Result<Self, DigestError> {
        let s = s.into();
        if s.len() != 32 {
            return Err(DigestError::InvalidLength(s.len()));
        }
        if !s.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(DigestError::NonHex(s));
        }
        Ok(Self(s.to_lowercase()))
    }

    /// Compute the digest of an in-memory buffer.
    pub fn compute(data: &[u8]) -> Self {
        use md5::{Digest, Md5};
        Self(hex::encode(Md5::digest(data)))
    }

    /// Compute the digest of everything readable from `reader`.
    ///
    /// Reads in fixed [`HASH_CHUNK_SIZE`] chunks, so memory use does not
    /// depend on the input size. Returns the digest and the byte count.
    ///
    /// # Errors
    ///
    /// Returns any I/O error raised by the reader.
    pub fn compute_reader<R: Read>(mut reader: R) -> std::io::Result<(Self, u64)> {
        use md5::{Digest, Md5};

        let mut hasher = Md5::new();
        let mut buffer = vec![0u8; HASH_CHUNK_SIZE];
        let mut total = 0u64;

        loop {
            let bytes_read = reader.read(&mut buffer)?;
            if bytes_read == 0 {
                break;
            }
            hasher.update(&buffer[..bytes_read]);
            total += bytes_read as u64;
        }

        Ok((Self(hex::encode(hasher.finalize())), total))
    }

    /// Compute the digest of a file (streaming).
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the file cannot be opened or read.
    pub fn compute_file(path: &Path) -> std::io::Result<(Self, u64)> {
        let file = std::fs::File::open(path)?;
        Self::compute_reader(file)
    }

    /// Return the inner hex string as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl<'de> Deserialize<'de> for Md5Digest {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::new(s).map_err(serde::de::Error::custom)
    }
}

impl std::fmt::Display for Md5Digest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
