//! Space-typed image volumes and their element-wise arithmetic.
//!
//! [`Image<S>`] carries its anatomical space as a type parameter, so mixing
//! frames is a compile error. [`DynImage`] carries the tag as a value for
//! callers that only learn the space at run time; both enforce the same
//! run-time guards inside every operation.

pub(crate) mod dynamic;

pub use dynamic::DynImage;

use std::marker::PhantomData;

use ndarray::{ArrayD, IxDyn, ShapeBuilder, Zip};
use rayon::prelude::*;

use crate::error::{Error, Result};
use crate::header::ImageHeader;
use crate::space::{self, Space, SpaceTag};

/// Volumes larger than this are processed in parallel chunks.
const PAR_CHUNK: usize = 8192;

/// A floating-point volume bound to the anatomical space `S`.
///
/// Immutable after construction: every arithmetic operation allocates a new,
/// independently owned image and leaves its operands untouched.
#[derive(Debug, Clone)]
pub struct Image<S: Space> {
    data: ArrayD<f32>,
    header: ImageHeader,
    space: PhantomData<S>,
}

impl<S: Space> Image<S> {
    /// Create an image from voxel data and a voxel-to-world affine.
    ///
    /// The first image constructed in space `S` fixes that space's geometry;
    /// later constructions must agree with it or fail with
    /// [`Error::OrientationMismatch`]. Construction is all-or-nothing: on any
    /// failure no image exists.
    pub fn from_array(data: ArrayD<f32>, affine: [[f32; 4]; 4]) -> Result<Self> {
        let header = ImageHeader::new(data.shape().to_vec(), affine)?;
        space::initialise::<S>(&header)?;
        Ok(Self::from_parts(data, header))
    }

    /// Trusted constructor: the header is known to describe `data` and to
    /// agree with the space registry.
    pub(crate) fn from_parts(data: ArrayD<f32>, header: ImageHeader) -> Self {
        Self {
            data,
            header,
            space: PhantomData,
        }
    }

    /// Voxel data.
    pub fn data(&self) -> &ArrayD<f32> {
        &self.data
    }

    /// Shape of the volume.
    pub fn shape(&self) -> &[usize] {
        self.header.shape()
    }

    /// Number of axes.
    pub fn ndim(&self) -> usize {
        self.header.ndim()
    }

    /// Total number of voxels.
    pub fn numel(&self) -> usize {
        self.header.numel()
    }

    /// Geometry of this volume.
    pub fn header(&self) -> &ImageHeader {
        &self.header
    }

    /// Runtime tag of the space `S`.
    pub fn tag(&self) -> SpaceTag {
        S::tag()
    }

    /// Element-wise sum, as a new image.
    ///
    /// Operands are left untouched. Shape disagreement reports
    /// [`Error::ShapeMismatch`]; stale geometry under a rebound space reports
    /// [`Error::OrientationMismatch`].
    pub fn add(&self, other: &Self) -> Result<Self> {
        self.binary_op(other, |a, b| a + b)
    }

    /// Element-wise difference.
    pub fn sub(&self, other: &Self) -> Result<Self> {
        self.binary_op(other, |a, b| a - b)
    }

    /// Element-wise product.
    pub fn mul(&self, other: &Self) -> Result<Self> {
        self.binary_op(other, |a, b| a * b)
    }

    /// Element-wise quotient. Division by zero follows IEEE 754.
    pub fn div(&self, other: &Self) -> Result<Self> {
        self.binary_op(other, |a, b| a / b)
    }

    /// Per-voxel `v * slope + inter`, as a new image.
    pub fn scaled(&self, slope: f32, inter: f32) -> Result<Self> {
        let out = map_voxels(&self.data, |v| v * slope + inter)?;
        Ok(Self::from_parts(out, self.header.clone()))
    }

    /// Discard the compile-time space, keeping the runtime tag.
    pub fn into_dyn(self) -> DynImage {
        DynImage::from_parts(self.data, self.header, S::tag())
    }

    /// Apply `op` voxel-wise against `other`, producing a new image.
    ///
    /// Both operands already share the space `S` at the type level; the
    /// run-time guards are kept anyway so stale geometry (a space rebound in
    /// tests) cannot slip through. Shape disagreement is reported as
    /// [`Error::ShapeMismatch`], affine disagreement as
    /// [`Error::OrientationMismatch`].
    fn binary_op(&self, other: &Self, op: impl Fn(f32, f32) -> f32 + Sync) -> Result<Self> {
        if self.shape() != other.shape() {
            return Err(Error::ShapeMismatch {
                left: self.shape().to_vec(),
                right: other.shape().to_vec(),
            });
        }
        if !self.header.matches(&other.header) {
            return Err(Error::OrientationMismatch { space: S::tag() });
        }
        let out = zip_voxels(&self.data, &other.data, op)?;
        Ok(Self::from_parts(out, self.header.clone()))
    }
}

/// Combine two same-shape volumes voxel-wise into a new F-order volume.
///
/// When both operands share a memory layout the work runs over contiguous
/// slices, chunked through rayon above [`PAR_CHUNK`] voxels; each chunk writes
/// a disjoint range of the private output buffer, so no synchronisation is
/// needed. Mixed layouts fall back to an index-aware traversal.
pub(crate) fn zip_voxels(
    a: &ArrayD<f32>,
    b: &ArrayD<f32>,
    op: impl Fn(f32, f32) -> f32 + Sync,
) -> Result<ArrayD<f32>> {
    debug_assert_eq!(a.shape(), b.shape());

    if a.strides() == b.strides() {
        if let (Some(lhs), Some(rhs)) = (a.as_slice_memory_order(), b.as_slice_memory_order()) {
            let mut output = vec![0.0f32; lhs.len()];

            if lhs.len() > PAR_CHUNK {
                output
                    .par_chunks_mut(PAR_CHUNK)
                    .enumerate()
                    .for_each(|(chunk_idx, out_chunk)| {
                        let start = chunk_idx * PAR_CHUNK;
                        for (i, out) in out_chunk.iter_mut().enumerate() {
                            *out = op(lhs[start + i], rhs[start + i]);
                        }
                    });
            } else {
                for (i, out) in output.iter_mut().enumerate() {
                    *out = op(lhs[i], rhs[i]);
                }
            }

            // Memory-order slices came off identical strides, so the output
            // vec is in the same order; rebuild with the matching layout.
            let shape = IxDyn(a.shape());
            let array = if is_f_order(a) {
                ArrayD::from_shape_vec(shape.f(), output)
            } else {
                ArrayD::from_shape_vec(shape, output)
            };
            return array.map_err(|e| {
                Error::InvalidDimensions(format!("failed to build output array: {e}"))
            });
        }
    }

    // F-order to match the NIfTI convention
    let mut out = ArrayD::zeros(IxDyn(a.shape()).f());
    Zip::from(&mut out)
        .and(a)
        .and(b)
        .for_each(|o, &x, &y| *o = op(x, y));
    Ok(out)
}

/// Map a volume voxel-wise into a new volume of the same layout.
pub(crate) fn map_voxels(a: &ArrayD<f32>, op: impl Fn(f32) -> f32 + Sync) -> Result<ArrayD<f32>> {
    let slice = a.as_slice_memory_order().ok_or_else(|| {
        Error::NonContiguousArray("array must be contiguous for scaling".to_string())
    })?;
    let mut output = vec![0.0f32; slice.len()];

    if slice.len() > PAR_CHUNK {
        output
            .par_chunks_mut(PAR_CHUNK)
            .enumerate()
            .for_each(|(chunk_idx, out_chunk)| {
                let start = chunk_idx * PAR_CHUNK;
                for (i, out) in out_chunk.iter_mut().enumerate() {
                    *out = op(slice[start + i]);
                }
            });
    } else {
        for (i, out) in output.iter_mut().enumerate() {
            *out = op(slice[i]);
        }
    }

    let shape = IxDyn(a.shape());
    let array = if is_f_order(a) {
        ArrayD::from_shape_vec(shape.f(), output)
    } else {
        ArrayD::from_shape_vec(shape, output)
    };
    array.map_err(|e| Error::InvalidDimensions(format!("failed to build output array: {e}")))
}

/// Whether the array's memory order is column-major.
fn is_f_order(a: &ArrayD<f32>) -> bool {
    !a.is_standard_layout() && a.t().is_standard_layout()
}

#[cfg(test)]
mod tests {
    use super::*;

    const IDENTITY: [[f32; 4]; 4] = [
        [1.0, 0.0, 0.0, 0.0],
        [0.0, 1.0, 0.0, 0.0],
        [0.0, 0.0, 1.0, 0.0],
        [0.0, 0.0, 0.0, 1.0],
    ];

    fn f_order(shape: &[usize], data: Vec<f32>) -> ArrayD<f32> {
        let c_order = ArrayD::from_shape_vec(shape.to_vec(), data).unwrap();
        let mut f = ArrayD::zeros(IxDyn(shape).f());
        f.assign(&c_order);
        f
    }

    #[test]
    fn zip_voxels_handles_mixed_layouts() {
        let shape = [2usize, 3, 2];
        let values: Vec<f32> = (0..12).map(|i| i as f32).collect();
        let c = ArrayD::from_shape_vec(shape.to_vec(), values.clone()).unwrap();
        let f = f_order(&shape, values);

        let sum = zip_voxels(&c, &f, |a, b| a + b).unwrap();
        for (idx, &v) in c.indexed_iter() {
            assert!((sum[&idx] - 2.0 * v).abs() < 1e-6);
        }
    }

    #[test]
    fn zip_voxels_parallel_path_matches_serial() {
        let n = PAR_CHUNK * 2 + 17;
        let a = ArrayD::from_shape_vec(vec![n], (0..n).map(|i| i as f32).collect()).unwrap();
        let b = ArrayD::from_shape_vec(vec![n], vec![1.0f32; n]).unwrap();
        let sum = zip_voxels(&a, &b, |x, y| x + y).unwrap();
        let slice = sum.as_slice_memory_order().unwrap();
        assert!((slice[0] - 1.0).abs() < 1e-6);
        assert!((slice[n - 1] - n as f32).abs() < 1e-6);
    }

    #[test]
    fn map_voxels_applies_slope_and_intercept() {
        let a = f_order(&[2, 2], vec![1.0, 2.0, 3.0, 4.0]);
        let scaled = map_voxels(&a, |v| v * 2.0 + 1.0).unwrap();
        for (idx, &v) in a.indexed_iter() {
            assert!((scaled[&idx] - (v * 2.0 + 1.0)).abs() < 1e-6);
        }
    }
}
