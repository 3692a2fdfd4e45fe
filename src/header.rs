//! Image geometry: shape and voxel-to-world orientation.
//!
//! The header is what identifies a physical space: two volumes occupy the same
//! space only when both their shapes and their affines agree. Comparison is
//! tolerant to the floating-point noise that accumulates in scanner-exported
//! affines.

use crate::error::{Error, Result};

/// Tolerance for affine comparison, in world units (mm).
const AFFINE_TOLERANCE: f32 = 1e-4;

/// Shape plus voxel-to-world affine for a volume.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageHeader {
    shape: Vec<usize>,
    affine: [[f32; 4]; 4],
}

impl ImageHeader {
    /// Create a header, rejecting empty or zero-sized geometry.
    pub fn new(shape: Vec<usize>, affine: [[f32; 4]; 4]) -> Result<Self> {
        if shape.is_empty() {
            return Err(Error::InvalidDimensions("shape is empty".to_string()));
        }
        if let Some(zero_axis) = shape.iter().position(|&d| d == 0) {
            return Err(Error::InvalidDimensions(format!(
                "axis {zero_axis} has extent 0 in shape {shape:?}"
            )));
        }
        Ok(Self { shape, affine })
    }

    /// Shape of the volume, one extent per axis.
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    /// Number of axes.
    pub fn ndim(&self) -> usize {
        self.shape.len()
    }

    /// Total number of voxels.
    pub fn numel(&self) -> usize {
        self.shape.iter().product()
    }

    /// Voxel-to-world affine (row-major 4x4).
    pub fn affine(&self) -> &[[f32; 4]; 4] {
        &self.affine
    }

    /// Voxel size in mm along each spatial axis (column norms of the affine).
    pub fn spacing(&self) -> [f32; 3] {
        let mut out = [0.0f32; 3];
        for (axis, spacing) in out.iter_mut().enumerate() {
            let col = [
                self.affine[0][axis],
                self.affine[1][axis],
                self.affine[2][axis],
            ];
            *spacing = col.iter().map(|v| v * v).sum::<f32>().sqrt();
        }
        out
    }

    /// Tolerant geometry equality: exact on shape, within [`AFFINE_TOLERANCE`]
    /// on the affine.
    pub fn matches(&self, other: &Self) -> bool {
        if self.shape != other.shape {
            return false;
        }
        self.affine
            .iter()
            .flatten()
            .zip(other.affine.iter().flatten())
            .all(|(a, b)| (a - b).abs() <= AFFINE_TOLERANCE)
    }
}
