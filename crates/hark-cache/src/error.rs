//! Error types for cache files.

use std::fmt;
use std::io;

use hark_graph::GraphError;
use hark_table::TableError;

/// Errors that can occur while reading or writing a cache file.
#[derive(Debug)]
pub enum CacheError {
    /// An I/O error occurred, including a missing or truncated file.
    Io(io::Error),
    /// The file was computed for a map with different contents.
    ChecksumMismatch {
        /// Checksum of the loaded map.
        expected: u32,
        /// Checksum recorded in the file.
        found: u32,
    },
    /// The file was computed for a map with a different leaf count.
    LeafCountMismatch {
        /// Leaf count of the loaded map.
        expected: u32,
        /// Leaf count recorded in the file.
        found: u32,
    },
    /// A header field is inconsistent with the rest of the header.
    BadHeader {
        /// Human-readable description of what went wrong.
        detail: String,
    },
    /// Bytes remain after the last section.
    TrailingData,
    /// The stored graph failed structural validation.
    Graph(GraphError),
    /// The stored table failed structural validation.
    Table(TableError),
}

impl CacheError {
    /// Whether the error only means no file exists yet.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Io(e) if e.kind() == io::ErrorKind::NotFound)
    }
}

impl fmt::Display for CacheError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "I/O error: {e}"),
            Self::ChecksumMismatch { expected, found } => {
                write!(
                    f,
                    "map checksum mismatch: file={found:#010x}, map={expected:#010x}"
                )
            }
            Self::LeafCountMismatch { expected, found } => {
                write!(f, "leaf count mismatch: file={found}, map={expected}")
            }
            Self::BadHeader { detail } => write!(f, "bad header: {detail}"),
            Self::TrailingData => write!(f, "unexpected data after the last section"),
            Self::Graph(e) => write!(f, "invalid graph: {e}"),
            Self::Table(e) => write!(f, "invalid table: {e}"),
        }
    }
}

impl std::error::Error for CacheError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            Self::Graph(e) => Some(e),
            Self::Table(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for CacheError {
    fn from(e: io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<GraphError> for CacheError {
    fn from(e: GraphError) -> Self {
        Self::Graph(e)
    }
}

impl From<TableError> for CacheError {
    fn from(e: TableError) -> Self {
        Self::Table(e)
    }
}
