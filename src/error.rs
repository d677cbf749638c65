//! Error types for pagetree

use std::fmt;
use std::io;
use thiserror::Error;

/// The main error type for pagetree operations
#[derive(Error, Debug, Clone)]
pub enum Error {
    /// I/O error occurred
    #[error("I/O error: {0}")]
    Io(String),

    /// Key not found in the tree
    #[error("Key not found")]
    KeyNotFound,

    /// Invalid parameter
    #[error("Invalid parameter: {0}")]
    InvalidParameter(&'static str),

    /// Page-id allocation failure
    #[error("Allocation failure: {0}")]
    Alloc(&'static str),

    /// File corruption detected
    #[error("Corruption detected: {details}")]
    Corruption {
        /// Description of the corruption
        details: String,
        /// Page where corruption was detected
        page_id: Option<PageId>,
    },

    /// File format version mismatch
    #[error("Version mismatch: expected {expected}, found {found}")]
    VersionMismatch {
        /// Expected version
        expected: u32,
        /// Found version
        found: u32,
    },

    /// Invalid page ID
    #[error("Invalid page ID: {0}")]
    InvalidPageId(PageId),
}

/// Page identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PageId(pub u64);

impl PageId {
    /// Convert to byte offset in the backing file
    pub fn to_offset(self, record_size: usize) -> u64 {
        self.0 * record_size as u64
    }
}

impl fmt::Display for PageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Result type alias for pagetree operations
pub type Result<T> = std::result::Result<T, Error>;

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        Error::Io(err.to_string())
    }
}

/// Operation completed successfully
pub const STATUS_SUCCESS: i32 = 0;
/// Memory or page-id allocation failed
pub const STATUS_ALLOC_ERROR: i32 = -1;
/// Key absent on search or remove
pub const STATUS_NOT_FOUND: i32 = -2;
/// Duplicate key (reserved; inserts update the existing value instead)
pub const STATUS_DUPLICATE: i32 = -3;
/// Malformed argument
pub const STATUS_INVALID_PARAM: i32 = -4;
/// Seek, read or write failed or was short
pub const STATUS_IO_ERROR: i32 = -5;

impl Error {
    /// Convert to the numeric status code understood by the script driver
    pub fn to_status_code(&self) -> i32 {
        match self {
            Error::Io(_) => STATUS_IO_ERROR,
            Error::KeyNotFound => STATUS_NOT_FOUND,
            Error::InvalidParameter(_) => STATUS_INVALID_PARAM,
            Error::Alloc(_) => STATUS_ALLOC_ERROR,
            Error::Corruption { .. } => STATUS_IO_ERROR,
            Error::VersionMismatch { .. } => STATUS_INVALID_PARAM,
            Error::InvalidPageId(_) => STATUS_INVALID_PARAM,
        }
    }
}
