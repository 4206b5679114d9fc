//! Error types for lookahead computation and persistence.

use std::path::PathBuf;
use tessel_common::ContentHash;

/// Errors from building, reading or writing a lookahead cost map.
///
/// Reading is all-or-nothing: every variant returned by
/// [`CostMap::try_read`](crate::CostMap::try_read) means the whole file was
/// discarded.
#[derive(Debug, thiserror::Error)]
pub enum LookaheadError {
    /// An I/O error occurred while reading or writing the cache file.
    #[error("lookahead I/O error at {path}: {source}")]
    Io {
        /// The path that caused the error.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// The file is truncated or does not start with a lookahead header.
    #[error("invalid lookahead header in {path}: {reason}")]
    InvalidHeader {
        /// The cache file path.
        path: PathBuf,
        /// Description of the header problem.
        reason: String,
    },

    /// The stored checksum does not match the payload.
    #[error("checksum mismatch in {path}: expected {expected}, got {actual}")]
    ChecksumMismatch {
        /// The cache file path.
        path: PathBuf,
        /// Checksum recorded in the header.
        expected: ContentHash,
        /// Checksum of the payload on disk.
        actual: ContentHash,
    },

    /// The file was written with a different format version.
    #[error("version mismatch in {path}: expected {expected}, got {actual}")]
    VersionMismatch {
        /// The cache file path.
        path: PathBuf,
        /// The format version this build reads.
        expected: u32,
        /// The format version found in the file.
        actual: u32,
    },

    /// The file was computed for a different fabric or build setup.
    #[error("lookahead in {path} belongs to a different fabric: expected {expected}, got {actual}")]
    FingerprintMismatch {
        /// The cache file path.
        path: PathBuf,
        /// Fingerprint of the current fabric.
        expected: ContentHash,
        /// Fingerprint stored in the file.
        actual: ContentHash,
    },

    /// The payload decoded but its tables are inconsistent.
    #[error("malformed lookahead in {path}: {reason}")]
    Malformed {
        /// The cache file path.
        path: PathBuf,
        /// Which dimension or length is wrong.
        reason: String,
    },

    /// Encoding, decoding or compression failed.
    #[error("serialization error: {reason}")]
    Serialization {
        /// Description of the failure.
        reason: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_error_display() {
        let err = LookaheadError::Io {
            path: PathBuf::from("/tmp/lookahead.bin"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "file not found"),
        };
        let msg = err.to_string();
        assert!(msg.contains("lookahead I/O error"));
        assert!(msg.contains("lookahead.bin"));
    }

    #[test]
    fn version_mismatch_display() {
        let err = LookaheadError::VersionMismatch {
            path: PathBuf::from("cache.tlka"),
            expected: 1,
            actual: 7,
        };
        assert_eq!(err.to_string(), "version mismatch in cache.tlka: expected 1, got 7");
    }
}
