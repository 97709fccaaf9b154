//! Error types for the scanning and binding layers.
//!
//! The core is permissive by design: malformed numbers bind to defaults,
//! unknown object members are skipped, and a truncated document ends the
//! token stream rather than failing it. The errors below cover the cases
//! that genuinely cannot produce a best-effort value: the character source
//! failing, a chunk view outliving the scanner state it borrowed from, and
//! the buffer hitting its configured ceiling.

use thiserror::Error;

/// Failure reading characters from the underlying input.
#[derive(Debug, Error)]
pub enum SourceError {
    /// The underlying reader failed.
    #[error("i/o error while reading characters: {0}")]
    Io(#[from] std::io::Error),

    /// The source was cancelled before the input completed.
    ///
    /// Raised by suspending sources when their cancellation signal fires.
    /// The scanner stays at the last token boundary; callers may resume if
    /// the source supports it, or abandon the scan.
    #[error("character source cancelled")]
    Cancelled,
}

/// Failure of a scanner or binder operation.
#[derive(Debug, Error)]
pub enum ScanError {
    #[error(transparent)]
    Source(#[from] SourceError),

    /// A chunk view was requested after the scanner advanced past the
    /// state it was produced from.
    #[error("chunk view is stale: the scanner has advanced since the chunk was produced")]
    StaleChunk,

    /// A single token required more buffer space than the configured
    /// maximum capacity allows.
    #[error("token requires more than the configured buffer ceiling of {max} bytes")]
    BufferLimit {
        /// Configured maximum capacity in bytes.
        max: usize,
    },
}

/// Result alias used across the scanner and binder surface.
pub type ScanResult<T> = Result<T, ScanError>;

impl From<std::io::Error> for ScanError {
    fn from(err: std::io::Error) -> Self {
        ScanError::Source(SourceError::Io(err))
    }
}
