//! Error types used by the crate.

use thiserror::Error;
use vecmap_formats::VecmapFormatsError;

/// Vecmap error type.
#[derive(Debug, Error)]
pub enum VecmapError {
    /// Zoom level is outside of the levels the pyramid is configured for.
    #[error("zoom level {zoom} is outside of the pyramid range {min}..={max}")]
    ZoomOutOfRange {
        /// Requested zoom level.
        zoom: u32,
        /// Minimum zoom level of the pyramid.
        min: u32,
        /// Maximum zoom level of the pyramid.
        max: u32,
    },
    /// Tile index is outside of the grid of its zoom level.
    #[error("tile index is outside of the tile grid")]
    TileOutOfRange,
    /// Quad key contains characters other than `0`-`3`, or is too long.
    #[error("invalid quad key: {0}")]
    InvalidQuadKey(String),
    /// Tile pyramid configuration is inconsistent.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    /// Error decoding data.
    #[error("failed to decode data")]
    Decoding(#[from] VecmapFormatsError),
}
