use pyo3::prelude::*;
use pyo3::wrap_pyfunction;

mod pyfunctions;
mod pymap;

pub use pyfunctions::*;
pub use pymap::*;

#[pymodule]
fn healpix_rs(_py: Python, m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<PyMap>()?;
    m.add_class::<PyOrdering>()?;
    m.add_class::<PyCoordinateSystem>()?;
    m.add_function(wrap_pyfunction!(py_valid_nside, m)?)?;
    m.add_function(wrap_pyfunction!(py_nside_to_npix, m)?)?;
    m.add_function(wrap_pyfunction!(py_npix_to_nside, m)?)?;
    m.add_function(wrap_pyfunction!(py_angles_to_ring, m)?)?;
    m.add_function(wrap_pyfunction!(py_angles_to_nest, m)?)?;
    m.add_function(wrap_pyfunction!(py_ring_to_angles, m)?)?;
    m.add_function(wrap_pyfunction!(py_nest_to_angles, m)?)?;
    m.add_function(wrap_pyfunction!(py_nest_to_ring, m)?)?;
    m.add_function(wrap_pyfunction!(py_ring_to_nest, m)?)?;
    m.add_function(wrap_pyfunction!(py_query_disc, m)?)?;
    m.add_function(wrap_pyfunction!(py_query_disc_inclusive, m)?)?;
    m.add_function(wrap_pyfunction!(py_mollweide_raster, m)?)?;
    Ok(())
}
