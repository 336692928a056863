use pyo3::prelude::*;
use numpy as np;

use crate::map::{CoordinateSystem, Map, Ordering};
use crate::nside::Nside;
use crate::order::switch_order;

#[pyclass(name = "Ordering")]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PyOrdering {
    Ring,
    Nested,
}

impl From<PyOrdering> for Ordering {
    fn from(o: PyOrdering) -> Ordering {
        match o {
            PyOrdering::Ring => Ordering::Ring,
            PyOrdering::Nested => Ordering::Nested,
        }
    }
}

impl From<Ordering> for PyOrdering {
    fn from(o: Ordering) -> PyOrdering {
        match o {
            Ordering::Ring => PyOrdering::Ring,
            Ordering::Nested => PyOrdering::Nested,
        }
    }
}

#[pyclass(name = "CoordinateSystem")]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PyCoordinateSystem {
    Custom,
    Ecliptic,
    Galactic,
    Celestial,
}

impl From<PyCoordinateSystem> for CoordinateSystem {
    fn from(c: PyCoordinateSystem) -> CoordinateSystem {
        match c {
            PyCoordinateSystem::Custom => CoordinateSystem::Custom,
            PyCoordinateSystem::Ecliptic => CoordinateSystem::Ecliptic,
            PyCoordinateSystem::Galactic => CoordinateSystem::Galactic,
            PyCoordinateSystem::Celestial => CoordinateSystem::Celestial,
        }
    }
}

impl From<CoordinateSystem> for PyCoordinateSystem {
    fn from(c: CoordinateSystem) -> PyCoordinateSystem {
        match c {
            CoordinateSystem::Custom => PyCoordinateSystem::Custom,
            CoordinateSystem::Ecliptic => PyCoordinateSystem::Ecliptic,
            CoordinateSystem::Galactic => PyCoordinateSystem::Galactic,
            CoordinateSystem::Celestial => PyCoordinateSystem::Celestial,
        }
    }
}

/// Python wrapper around a `Map`: a HEALPix pixel buffer plus its
/// `Nside`, `Ordering` and `CoordinateSystem`, following the same
/// getter/`__str__`/error-to-`PyErr`-string idiom as the teacher's
/// `PyCameraFrame`.
#[pyclass(name = "Map")]
#[derive(Clone, Debug)]
pub struct PyMap {
    pub(crate) inner: Map,
}

#[pymethods]
impl PyMap {
    #[new]
    #[pyo3(signature = (nside, ordering=PyOrdering::Ring, coord_system=PyCoordinateSystem::Custom))]
    fn new(nside: u32, ordering: PyOrdering, coord_system: PyCoordinateSystem) -> PyResult<Self> {
        let nside = Nside::new(nside)
            .ok_or_else(|| PyErr::new::<pyo3::exceptions::PyValueError, _>(format!("{nside} is not a valid Nside")))?;
        Ok(PyMap {
            inner: Map::zeros(nside, ordering.into(), coord_system.into()),
        })
    }

    #[staticmethod]
    #[pyo3(signature = (pixels, ordering=PyOrdering::Ring, coord_system=PyCoordinateSystem::Custom))]
    fn from_array(pixels: &Bound<'_, PyAny>, ordering: PyOrdering, coord_system: PyCoordinateSystem) -> PyResult<Self> {
        let arr: np::PyReadonlyArray1<f64> = pixels.extract()?;
        let data = arr.as_slice()?.to_vec();
        let inner = Map::from_array(data, ordering.into(), coord_system.into())
            .map_err(|e| PyErr::new::<pyo3::exceptions::PyValueError, _>(e.to_string()))?;
        Ok(PyMap { inner })
    }

    #[getter]
    fn get_nside(&self) -> u32 {
        self.inner.nside().get()
    }

    #[getter]
    fn get_npix(&self) -> u64 {
        self.inner.npix()
    }

    #[getter]
    fn get_ordering(&self) -> PyOrdering {
        self.inner.ordering().into()
    }

    #[getter]
    fn get_coord_system(&self) -> PyCoordinateSystem {
        self.inner.coordinate_system().into()
    }

    #[getter]
    fn pixels<'py>(&self, py: Python<'py>) -> Bound<'py, np::PyArray1<f64>> {
        np::PyArray1::from_slice_bound(py, self.inner.pixels())
    }

    fn get(&self, index: u64) -> PyResult<f64> {
        self.inner.get(index).map_err(|e| PyErr::new::<pyo3::exceptions::PyIndexError, _>(e.to_string()))
    }

    fn set(&mut self, index: u64, value: f64) -> PyResult<()> {
        self.inner.set(index, value).map_err(|e| PyErr::new::<pyo3::exceptions::PyIndexError, _>(e.to_string()))
    }

    fn switch_order(&mut self) {
        switch_order(&mut self.inner);
    }

    fn __len__(&self) -> usize {
        self.inner.npix() as usize
    }

    fn __str__(&self) -> String {
        format!(
            "Map(nside={}, npix={}, ordering={:?})",
            self.inner.nside(),
            self.inner.npix(),
            self.inner.ordering()
        )
    }
}
