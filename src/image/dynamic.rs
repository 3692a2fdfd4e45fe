//! Runtime-tagged images, for callers whose space is decided by data rather
//! than by types (batch pipelines, config-driven tools).
//!
//! The guards are identical to the typed API, just enforced inside each
//! operation instead of by the compiler: arithmetic first demands tag
//! equality, then shape equality. Tag equality is identity of the tag — a
//! shape-compatible volume in a different frame must never combine.

use ndarray::ArrayD;

use crate::error::{Error, Result};
use crate::header::ImageHeader;
use crate::image::{map_voxels, zip_voxels, Image};
use crate::space::{self, Space, SpaceTag};

/// A floating-point volume with a runtime space tag.
#[derive(Debug, Clone)]
pub struct DynImage {
    data: ArrayD<f32>,
    header: ImageHeader,
    tag: SpaceTag,
}

impl DynImage {
    /// Create an image from voxel data, a voxel-to-world affine and a tag.
    pub fn new(tag: SpaceTag, data: ArrayD<f32>, affine: [[f32; 4]; 4]) -> Result<Self> {
        let header = ImageHeader::new(data.shape().to_vec(), affine)?;
        Ok(Self { data, header, tag })
    }

    pub(crate) fn from_parts(data: ArrayD<f32>, header: ImageHeader, tag: SpaceTag) -> Self {
        Self { data, header, tag }
    }

    /// Voxel data.
    pub fn data(&self) -> &ArrayD<f32> {
        &self.data
    }

    /// Shape of the volume.
    pub fn shape(&self) -> &[usize] {
        self.header.shape()
    }

    /// Geometry of this volume.
    pub fn header(&self) -> &ImageHeader {
        &self.header
    }

    /// The space tag this volume was constructed with.
    pub fn tag(&self) -> &SpaceTag {
        &self.tag
    }

    /// Element-wise sum.
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
        Ok(Self::from_parts(out, self.header.clone(), self.tag.clone()))
    }

    /// Promote to the typed API.
    ///
    /// The runtime tag must equal `S`'s tag, and the geometry must agree with
    /// whatever orientation space `S` is already bound to (binding it if this
    /// is the first volume in `S`).
    pub fn into_typed<S: Space>(self) -> Result<Image<S>> {
        if self.tag != S::tag() {
            return Err(Error::SpaceMismatch {
                left: self.tag,
                right: S::tag(),
            });
        }
        space::initialise::<S>(&self.header)?;
        Ok(Image::from_parts(self.data, self.header))
    }

    /// Tag equality comes first: two volumes in different frames must not
    /// combine even when their shapes agree.
    fn binary_op(&self, other: &Self, op: impl Fn(f32, f32) -> f32 + Sync) -> Result<Self> {
        if self.tag != other.tag {
            return Err(Error::SpaceMismatch {
                left: self.tag.clone(),
                right: other.tag.clone(),
            });
        }
        if self.shape() != other.shape() {
            return Err(Error::ShapeMismatch {
                left: self.shape().to_vec(),
                right: other.shape().to_vec(),
            });
        }
        if !self.header.matches(&other.header) {
            return Err(Error::OrientationMismatch {
                space: self.tag.clone(),
            });
        }
        let out = zip_voxels(&self.data, &other.data, op)?;
        Ok(Self::from_parts(out, self.header.clone(), self.tag.clone()))
    }
}
