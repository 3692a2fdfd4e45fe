//! Error types for medspace operations.

use std::path::PathBuf;

use crate::space::SpaceTag;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, Error>;

/// All errors surfaced by this crate.
///
/// Every failure is reported synchronously to the immediate caller; nothing
/// here is retried or downgraded internally.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The file could not be opened or read.
    #[error("failed to read {path}: {source}")]
    Io {
        /// Path as given by the caller (after zipped-variant resolution).
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The file exists but is not a recognised NIfTI volume.
    #[error("failed to parse {path}: {source}")]
    Parse {
        /// Path of the offending file.
        path: PathBuf,
        /// Error reported by the NIfTI reader.
        source: nifti::error::NiftiError,
    },

    /// Strict (non-coercing) load of a volume whose on-disk samples are not
    /// floating point.
    #[error("unsupported data type code {0} (pass as_float = true to coerce)")]
    UnsupportedDataType(i16),

    /// Geometry conflicts with the orientation already fixed for this space.
    #[error("space {space} is already initialised with a differing orientation")]
    OrientationMismatch {
        /// The space whose registered orientation disagrees.
        space: SpaceTag,
    },

    /// Arithmetic attempted between images of different spaces.
    #[error("space mismatch: {left} vs {right}")]
    SpaceMismatch {
        /// Tag of the left operand.
        left: SpaceTag,
        /// Tag of the right operand.
        right: SpaceTag,
    },

    /// Arithmetic attempted between same-space images of differing shape.
    #[error("shape mismatch: {left:?} vs {right:?}")]
    ShapeMismatch {
        /// Shape of the left operand.
        left: Vec<usize>,
        /// Shape of the right operand.
        right: Vec<usize>,
    },

    /// Empty or zero-sized geometry at construction.
    #[error("invalid dimensions: {0}")]
    InvalidDimensions(String),

    /// A kernel required a contiguous buffer and did not get one.
    #[error("non-contiguous array: {0}")]
    NonContiguousArray(String),
}
