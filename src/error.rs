//! Error types for SegKV
//!
//! Provides a unified error type for all operations.

use thiserror::Error;

/// Result type alias using SegError
pub type Result<T> = std::result::Result<T, SegError>;

/// Unified error type for SegKV operations
///
/// A missing key is not an error: lookups return `Option` or
/// [`LookupResult`](crate::storage::LookupResult).
#[derive(Debug, Error)]
pub enum SegError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // On-disk Format Errors
    // -------------------------------------------------------------------------
    #[error("Format error: {0}")]
    Format(String),

    #[error("Checksum mismatch: stored {stored:#010x}, computed {computed:#010x}")]
    ChecksumMismatch { stored: u32, computed: u32 },

    // -------------------------------------------------------------------------
    // Network Errors
    // -------------------------------------------------------------------------
    #[error("Network error: {0}")]
    Network(String),

    #[error("Protocol error: {0}")]
    Protocol(String),

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}

impl SegError {
    /// True when the underlying cause is a short read (truncated data)
    pub fn is_unexpected_eof(&self) -> bool {
        matches!(self, SegError::Io(e) if e.kind() == std::io::ErrorKind::UnexpectedEof)
    }
}
