//! Error type used by the crate.

use thiserror::Error;

use crate::projection::ProjectionError;

/// Error enum.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum VecmapTypesError {
    /// Shape type code is known but has no geometry model counterpart (e.g. MultiPoint, MultiPatch, Z variants).
    #[error("unsupported shape type: {0}")]
    UnsupportedShapeType(u32),
    /// Aspect ratio must be a positive finite number.
    #[error("invalid aspect ratio: {0}")]
    InvalidAspectRatio(f64),
    /// A point of the geometry could not be projected.
    #[error("projection failed: {0}")]
    Projection(#[from] ProjectionError),
}
