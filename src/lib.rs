//! medspace: space-typed medical image arithmetic.
//!
//! A volume here is more than a numeric buffer: it lives in an anatomical
//! space (a subject's native T1 frame, MNI152, ...), and combining volumes
//! from different spaces produces physically meaningless results even when
//! the arithmetic succeeds mechanically. This crate makes the space part of
//! the image's identity and enforces it at every operation boundary.
//!
//! Two API levels share one guard discipline:
//!
//! - [`image::Image<S>`] encodes the space as a type parameter, so a
//!   cross-space `add` does not compile.
//! - [`image::DynImage`] carries a runtime [`space::SpaceTag`] for callers
//!   whose space is decided by data; mismatches surface as
//!   [`error::Error::SpaceMismatch`].
//!
//! NIfTI parsing and writing are delegated to the `nifti` crate; see
//! [`io`].
//!
//! ```no_run
//! use medspace::io;
//! use medspace::spaces::NativeT1;
//!
//! # fn main() -> medspace::error::Result<()> {
//! let a = io::load::<NativeT1, _>("t1-raw.nii", true)?;
//! let b = io::load::<NativeT1, _>("t1-raw.nii", true)?;
//! let sum = a.add(&b)?;
//! io::save(&sum, "t1-doubled.nii.gz")?;
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod header;
pub mod image;
pub mod io;
pub mod space;
pub mod spaces;

pub use error::{Error, Result};
pub use header::ImageHeader;
pub use image::{DynImage, Image};
pub use space::{Space, SpaceTag};
