//! Error type used by the crate.

use thiserror::Error;

/// Error returned by format readers.
#[derive(Debug, Error)]
pub enum VecmapFormatsError {
    /// Data is not in the expected format at all (wrong magic number or file type byte).
    #[error("invalid format: {0}")]
    InvalidFormat(String),

    /// Shape type is recognized, but not supported.
    #[error("unsupported shape type: {0}")]
    UnsupportedShapeType(u32),

    /// WKB geometry type is not supported.
    #[error("unsupported geometry type: {0}")]
    UnsupportedGeometryType(u32),

    /// WKT string violates the grammar.
    #[error("malformed WKT: {0}")]
    MalformedWkt(String),

    /// Data ended before the structure it describes.
    #[error("unexpected end of data")]
    UnexpectedEof,

    /// Failed to read the file.
    #[error("failed to read file: {0}")]
    Io(#[from] std::io::Error),
}
