//!
//! Error taxonomy for the HEALPix core and its external adapters.
//!
//! The original C library returns `0` as an in-band error sentinel from
//! several kernels even though `0` is a legal pixel index. Every fallible
//! operation here instead returns `Option`/`Result`, so that ambiguity
//! cannot arise (see DESIGN.md).
//!
use thiserror::Error;

#[derive(Error, Debug)]
pub enum HealpixError {
    #[error("Nside {0} is not a power of two")]
    InvalidNside(u32),
    #[error("pixel index {index} is out of range for Npix = {npix}")]
    IndexOutOfRange { index: u64, npix: u64 },
    #[error("array length {got} does not match Npix for any valid Nside (expected one of the form 12*N^2, N a power of two, got {got})")]
    DimensionMismatch { got: usize },
    #[error("disc radius {0} is not in the range (0, pi]")]
    InvalidRadius(f64),
    #[error("polarization triplet components do not share the same Nside/ordering")]
    MismatchedGeometry,
}

#[derive(Error, Debug)]
pub enum FitsError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed FITS header: {0}")]
    Header(String),
    #[error("unsupported FITS layout: {0}")]
    UnsupportedLayout(String),
    #[error("HEALPix error while building map: {0}")]
    Healpix(#[from] HealpixError),
}

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("output format '{0}' is not implemented by this backend")]
    UnsupportedFormat(String),
    #[error("encoding error: {0}")]
    Encoding(String),
}
