use pyo3::prelude::*;
use numpy as np;

use crate::mollweide::{trace_bitmap, BmpProjection};
use crate::nside::{nside_to_npix, npix_to_nside, valid_nside, Nside};
use crate::order::{nest_to_ring, ring_to_nest};
use crate::pixel::{angles_to_nest, angles_to_ring, nest_to_angles, ring_to_angles};
use crate::pybindings::pymap::PyMap;
use crate::query_disc::{query_disc, query_disc_inclusive};

fn to_nside(n: u32) -> PyResult<Nside> {
    Nside::new(n).ok_or_else(|| PyErr::new::<pyo3::exceptions::PyValueError, _>(format!("{n} is not a valid Nside")))
}

#[pyfunction]
#[pyo3(name = "valid_nside")]
pub fn py_valid_nside(nside: u32) -> bool {
    valid_nside(nside)
}

#[pyfunction]
#[pyo3(name = "nside_to_npix")]
pub fn py_nside_to_npix(nside: u32) -> u64 {
    nside_to_npix(nside)
}

#[pyfunction]
#[pyo3(name = "npix_to_nside")]
pub fn py_npix_to_nside(npix: u64) -> u32 {
    npix_to_nside(npix).map(|n| n.get()).unwrap_or(0)
}

#[pyfunction]
#[pyo3(name = "angles_to_ring")]
pub fn py_angles_to_ring(nside: u32, theta: f64, phi: f64) -> PyResult<u64> {
    Ok(angles_to_ring(to_nside(nside)?, theta, phi))
}

#[pyfunction]
#[pyo3(name = "angles_to_nest")]
pub fn py_angles_to_nest(nside: u32, theta: f64, phi: f64) -> PyResult<u64> {
    Ok(angles_to_nest(to_nside(nside)?, theta, phi))
}

#[pyfunction]
#[pyo3(name = "ring_to_angles")]
pub fn py_ring_to_angles(nside: u32, pix: u64) -> PyResult<(f64, f64)> {
    ring_to_angles(to_nside(nside)?, pix)
        .ok_or_else(|| PyErr::new::<pyo3::exceptions::PyIndexError, _>(format!("pixel {pix} out of range")))
}

#[pyfunction]
#[pyo3(name = "nest_to_angles")]
pub fn py_nest_to_angles(nside: u32, pix: u64) -> PyResult<(f64, f64)> {
    nest_to_angles(to_nside(nside)?, pix)
        .ok_or_else(|| PyErr::new::<pyo3::exceptions::PyIndexError, _>(format!("pixel {pix} out of range")))
}

#[pyfunction]
#[pyo3(name = "nest_to_ring")]
pub fn py_nest_to_ring(nside: u32, pix: u64) -> PyResult<u64> {
    nest_to_ring(to_nside(nside)?, pix)
        .ok_or_else(|| PyErr::new::<pyo3::exceptions::PyIndexError, _>(format!("pixel {pix} out of range")))
}

#[pyfunction]
#[pyo3(name = "ring_to_nest")]
pub fn py_ring_to_nest(nside: u32, pix: u64) -> PyResult<u64> {
    ring_to_nest(to_nside(nside)?, pix)
        .ok_or_else(|| PyErr::new::<pyo3::exceptions::PyIndexError, _>(format!("pixel {pix} out of range")))
}

#[pyfunction]
#[pyo3(name = "query_disc")]
pub fn py_query_disc<'py>(py: Python<'py>, nside: u32, theta: f64, phi: f64, radius: f64) -> PyResult<Bound<'py, np::PyArray1<u64>>> {
    let result = query_disc(to_nside(nside)?, theta, phi, radius)
        .map_err(|e| PyErr::new::<pyo3::exceptions::PyValueError, _>(e.to_string()))?;
    Ok(np::PyArray1::from_vec_bound(py, result))
}

#[pyfunction]
#[pyo3(name = "query_disc_inclusive")]
pub fn py_query_disc_inclusive<'py>(
    py: Python<'py>,
    nside: u32,
    theta: f64,
    phi: f64,
    radius: f64,
) -> PyResult<Bound<'py, np::PyArray1<u64>>> {
    let result = query_disc_inclusive(to_nside(nside)?, theta, phi, radius)
        .map_err(|e| PyErr::new::<pyo3::exceptions::PyValueError, _>(e.to_string()))?;
    Ok(np::PyArray1::from_vec_bound(py, result))
}

/// Rasterizes `map` through a `width x height` Mollweide projection and
/// returns the dense grid as a 2-D numpy array (row-major, `+inf` outside
/// the ellipse), matching the layout `trace_bitmap` produces natively.
#[pyfunction]
#[pyo3(name = "mollweide_raster")]
pub fn py_mollweide_raster(py: Python<'_>, map: &PyMap, width: u32, height: u32) -> PyResult<PyObject> {
    let proj = BmpProjection::new(width, height, map.inner.coordinate_system());
    let raster = trace_bitmap(&proj, &map.inner);
    let arr = np::PyArray1::from_vec_bound(py, raster.values);
    Ok(arr
        .as_gil_ref()
        .reshape([height as usize, width as usize])
        .map_err(|e| PyErr::new::<pyo3::exceptions::PyRuntimeError, _>(e.to_string()))?
        .to_object(py))
}
