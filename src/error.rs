//! Error types for the leafline index engine.
//!
//! Errors surface at the public boundary unchanged. The only one consumed
//! internally is [`IndexError::EndOfFile`], which terminates bulk build.

use thiserror::Error;

use crate::storage::page::PageId;

/// Main error type for the index engine
#[derive(Error, Debug)]
pub enum IndexError {
    /// Scan opcodes are out of range: the lower bound must use `>`/`>=`
    /// and the upper bound `<`/`<=`
    #[error("bad scan opcodes")]
    BadOpcodes,

    /// The scan range is inverted (low > high)
    #[error("bad scan range")]
    BadScanRange,

    /// No entry in the tree satisfies the scan bounds
    #[error("no such key found")]
    NoSuchKeyFound,

    /// A scan operation was issued without a successful `start_scan`
    #[error("scan not initialized")]
    ScanNotInitialized,

    /// The scan has moved past the last matching entry
    #[error("index scan completed")]
    IndexScanCompleted,

    /// A relation scan ran out of records
    #[error("end of file")]
    EndOfFile,

    /// An existing index file does not match the requested parameters
    #[error("bad index info: {0}")]
    BadIndexInfo(String),

    /// A page or header failed to parse
    #[error("invalid file format: {0}")]
    InvalidFormat(String),

    /// Every buffer pool frame is pinned; nothing can be evicted
    #[error("buffer pool exhausted")]
    BufferExhausted,

    /// A file flush was requested while one of its pages is still pinned
    #[error("page {0} is still pinned")]
    PagePinned(PageId),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for index operations
pub type IndexResult<T> = Result<T, IndexError>;
