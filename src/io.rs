//! Loading and saving volumes through the NIfTI collaborator.
//!
//! All byte-level parsing and writing is delegated to the `nifti` crate; this
//! module only maps its output into space-typed images and its failures into
//! this crate's error taxonomy. Both `.nii` and `.nii.gz` are handled by the
//! collaborator transparently.

use std::path::{Path, PathBuf};

use log::debug;
use ndarray::ArrayD;
use nifti::error::NiftiError;
use nifti::{IntoNdArray, NiftiHeader, NiftiObject, NiftiType, ReaderOptions};

use crate::error::{Error, Result};
use crate::header::ImageHeader;
use crate::image::{DynImage, Image};
use crate::space::{self, Space, SpaceTag};

/// Load a volume into the typed space `S`.
///
/// With `as_float = true` any on-disk sample type is coerced to `f32`, with
/// the file's slope/intercept scaling applied by the collaborator. With
/// `as_float = false` the load is strict: non-floating-point on-disk types
/// fail with [`Error::UnsupportedDataType`].
///
/// When `path` does not exist, a sibling with `.gz` appended is tried before
/// giving up. Fails with [`Error::OrientationMismatch`] when the file's
/// geometry conflicts with the orientation already fixed for `S`.
///
/// # Example
/// ```ignore
/// use medspace::spaces::NativeT1;
///
/// let a = medspace::io::load::<NativeT1, _>("t1-raw.nii", true)?;
/// let b = medspace::io::load::<NativeT1, _>("t1-bias.nii", true)?;
/// let sum = a.add(&b)?;
/// ```
pub fn load<S: Space, P: AsRef<Path>>(path: P, as_float: bool) -> Result<Image<S>> {
    let (data, header) = read_volume(path.as_ref(), as_float)?;
    space::initialise::<S>(&header)?;
    Ok(Image::from_parts(data, header))
}

/// Load a volume under a runtime space tag.
///
/// Same semantics as [`load`], but no orientation is registered: the caller's
/// tag is taken at face value and checked at every subsequent operation.
pub fn load_dyn<P: AsRef<Path>>(path: P, tag: SpaceTag, as_float: bool) -> Result<DynImage> {
    let (data, header) = read_volume(path.as_ref(), as_float)?;
    Ok(DynImage::from_parts(data, header, tag))
}

/// Read only the geometry of a volume.
pub fn load_header<P: AsRef<Path>>(path: P) -> Result<ImageHeader> {
    let path = resolve_path(path.as_ref())?;
    let obj = read_object(&path)?;
    geometry_of(obj.header())
}

/// Save a typed image as NIfTI. The extension decides compression.
pub fn save<S: Space, P: AsRef<Path>>(image: &Image<S>, path: P) -> Result<()> {
    write_volume(image.data(), image.header(), path.as_ref())
}

/// Save a runtime-tagged image as NIfTI.
pub fn save_dyn<P: AsRef<Path>>(image: &DynImage, path: P) -> Result<()> {
    write_volume(image.data(), image.header(), path.as_ref())
}

/// Resolve a path, falling back to a `.gz` sibling when the file is absent.
fn resolve_path(path: &Path) -> Result<PathBuf> {
    if path.exists() {
        return Ok(path.to_path_buf());
    }
    if path.extension().is_none_or(|e| e != "gz") {
        let mut zipped = path.as_os_str().to_os_string();
        zipped.push(".gz");
        let zipped = PathBuf::from(zipped);
        if zipped.exists() {
            debug!("{} not found, using zipped variant {}", path.display(), zipped.display());
            return Ok(zipped);
        }
    }
    Err(Error::Io {
        path: path.to_path_buf(),
        source: std::io::Error::new(std::io::ErrorKind::NotFound, "no such file"),
    })
}

fn read_object(path: &Path) -> Result<nifti::object::InMemNiftiObject> {
    ReaderOptions::new().read_file(path).map_err(|e| match e {
        NiftiError::Io(source) => Error::Io {
            path: path.to_path_buf(),
            source,
        },
        source => Error::Parse {
            path: path.to_path_buf(),
            source,
        },
    })
}

/// Map the collaborator's header into this crate's geometry.
fn geometry_of(header: &NiftiHeader) -> Result<ImageHeader> {
    let ndim = usize::from(header.dim[0]);
    if ndim == 0 || ndim > 7 {
        return Err(Error::InvalidDimensions(format!(
            "header declares {ndim} dimensions"
        )));
    }
    let shape: Vec<usize> = header.dim[1..=ndim].iter().map(|&d| usize::from(d)).collect();
    ImageHeader::new(shape, affine_of(header))
}

/// Voxel-to-world affine: sform rows when present, else a pixdim diagonal.
fn affine_of(header: &NiftiHeader) -> [[f32; 4]; 4] {
    if header.sform_code > 0 {
        return [
            header.srow_x,
            header.srow_y,
            header.srow_z,
            [0.0, 0.0, 0.0, 1.0],
        ];
    }
    let mut affine = [[0.0f32; 4]; 4];
    for (i, row) in affine.iter_mut().enumerate().take(3) {
        row[i] = header.pixdim[i + 1];
    }
    affine[3][3] = 1.0;
    affine
}

fn read_volume(path: &Path, as_float: bool) -> Result<(ArrayD<f32>, ImageHeader)> {
    let path = resolve_path(path)?;
    let obj = read_object(&path)?;

    if !as_float {
        let code = obj.header().datatype;
        if code != NiftiType::Float32 as i16 && code != NiftiType::Float64 as i16 {
            return Err(Error::UnsupportedDataType(code));
        }
    }

    let geometry = geometry_of(obj.header())?;
    let data = obj
        .into_volume()
        .into_ndarray::<f32>()
        .map_err(|source| Error::Parse {
            path: path.clone(),
            source,
        })?;

    debug!(
        "loaded {} ({:?}, {} voxels)",
        path.display(),
        geometry.shape(),
        geometry.numel()
    );
    Ok((data, geometry))
}

fn write_volume(data: &ArrayD<f32>, header: &ImageHeader, path: &Path) -> Result<()> {
    let affine = header.affine();
    let spacing = header.spacing();

    let mut reference = NiftiHeader {
        sform_code: 1,
        srow_x: affine[0],
        srow_y: affine[1],
        srow_z: affine[2],
        scl_slope: 1.0,
        scl_inter: 0.0,
        ..NiftiHeader::default()
    };
    for (i, s) in spacing.iter().enumerate().take(header.ndim().min(3)) {
        reference.pixdim[i + 1] = *s;
    }

    nifti::writer::WriterOptions::new(path)
        .reference_header(&reference)
        .write_nifti(data)
        .map_err(|e| match e {
            NiftiError::Io(source) => Error::Io {
                path: path.to_path_buf(),
                source,
            },
            source => Error::Parse {
                path: path.to_path_buf(),
                source,
            },
        })?;

    debug!("saved {} ({:?})", path.display(), header.shape());
    Ok(())
}
