//!
//! `Map` (M5): an owned HEALPix pixel buffer plus the metadata needed to
//! interpret it: `Nside`, pixel `Ordering`, and `CoordinateSystem`.
//!
//! The original kept a map as a `hpix_map_t*` the caller had to free by
//! hand; here the buffer is a plain `Vec<f64>` owned by the `Map` and
//! dropped automatically, and every constructor validates the buffer
//! length against `Nside` instead of trusting the caller.
//!
use crate::error::HealpixError;
use crate::nside::{npix_to_nside, Nside};

/// Pixel numbering scheme a `Map`'s buffer is stored in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Ordering {
    Ring,
    Nested,
}

/// Coordinate frame a `Map`'s pixel centers are expressed in. Purely a
/// label carried alongside the buffer; no module in this crate rotates
/// between frames.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CoordinateSystem {
    Custom,
    Ecliptic,
    Galactic,
    Celestial,
}

/// A HEALPix map: one `f64` sample per pixel, at a single `Nside`, in a
/// single `Ordering`.
#[derive(Clone, Debug, PartialEq)]
pub struct Map {
    nside: Nside,
    ordering: Ordering,
    coordinate_system: CoordinateSystem,
    pixels: Vec<f64>,
}

impl Map {
    /// Builds a map from an existing buffer. Fails if `pixels.len() !=
    /// Npix(nside)`.
    pub fn new(
        nside: Nside,
        ordering: Ordering,
        coordinate_system: CoordinateSystem,
        pixels: Vec<f64>,
    ) -> Result<Self, HealpixError> {
        let expected = nside.npix() as usize;
        if pixels.len() != expected {
            return Err(HealpixError::DimensionMismatch { got: pixels.len() });
        }
        Ok(Map {
            nside,
            ordering,
            coordinate_system,
            pixels,
        })
    }

    /// Builds a map from a buffer whose length alone determines `Nside`
    /// (`Npix = 12*N^2`). Fails if the length isn't of that form.
    pub fn from_array(
        pixels: Vec<f64>,
        ordering: Ordering,
        coordinate_system: CoordinateSystem,
    ) -> Result<Self, HealpixError> {
        let nside = npix_to_nside(pixels.len() as u64)
            .ok_or(HealpixError::DimensionMismatch { got: pixels.len() })?;
        Ok(Map {
            nside,
            ordering,
            coordinate_system,
            pixels,
        })
    }

    pub fn zeros(nside: Nside, ordering: Ordering, coordinate_system: CoordinateSystem) -> Self {
        Map {
            nside,
            ordering,
            coordinate_system,
            pixels: vec![0.0; nside.npix() as usize],
        }
    }

    pub fn filled(
        nside: Nside,
        ordering: Ordering,
        coordinate_system: CoordinateSystem,
        value: f64,
    ) -> Self {
        Map {
            nside,
            ordering,
            coordinate_system,
            pixels: vec![value; nside.npix() as usize],
        }
    }

    pub fn nside(&self) -> Nside {
        self.nside
    }

    pub fn npix(&self) -> u64 {
        self.nside.npix()
    }

    pub fn ordering(&self) -> Ordering {
        self.ordering
    }

    pub fn coordinate_system(&self) -> CoordinateSystem {
        self.coordinate_system
    }

    pub fn pixels(&self) -> &[f64] {
        &self.pixels
    }

    pub fn pixels_mut(&mut self) -> &mut [f64] {
        &mut self.pixels
    }

    pub fn get(&self, index: u64) -> Result<f64, HealpixError> {
        self.pixels
            .get(index as usize)
            .copied()
            .ok_or(HealpixError::IndexOutOfRange {
                index,
                npix: self.npix(),
            })
    }

    pub fn set(&mut self, index: u64, value: f64) -> Result<(), HealpixError> {
        let npix = self.npix();
        let slot = self
            .pixels
            .get_mut(index as usize)
            .ok_or(HealpixError::IndexOutOfRange { index, npix })?;
        *slot = value;
        Ok(())
    }

    /// Flips the ordering tag without touching the buffer. Only
    /// `order::switch_order` should call this; it is the caller's job to
    /// permute the buffer to match.
    pub(crate) fn set_ordering_unchecked(&mut self, ordering: Ordering) {
        self.ordering = ordering;
    }
}

/// Three co-registered maps (intensity and the two linear Stokes
/// components) that must share the same `Nside` and `Ordering` to be
/// combined meaningfully. Not present in the distilled module list; added
/// because the original format these maps come from always carries I, Q
/// and U together (see DESIGN.md).
#[derive(Clone, Debug, PartialEq)]
pub struct PolarizationMaps {
    pub i: Map,
    pub q: Map,
    pub u: Map,
}

impl PolarizationMaps {
    pub fn new(i: Map, q: Map, u: Map) -> Result<Self, HealpixError> {
        if !Self::same_geometry(&i, &q) || !Self::same_geometry(&i, &u) {
            return Err(HealpixError::MismatchedGeometry);
        }
        Ok(PolarizationMaps { i, q, u })
    }

    fn same_geometry(a: &Map, b: &Map) -> bool {
        a.nside() == b.nside() && a.ordering() == b.ordering()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn n(v: u32) -> Nside {
        Nside::new(v).unwrap()
    }

    #[test]
    fn zeros_has_right_length_and_value() {
        let m = Map::zeros(n(4), Ordering::Ring, CoordinateSystem::Custom);
        assert_eq!(m.pixels().len(), 12 * 16);
        assert!(m.pixels().iter().all(|&v| v == 0.0));
    }

    #[test]
    fn new_rejects_wrong_length() {
        let err = Map::new(n(4), Ordering::Ring, CoordinateSystem::Custom, vec![0.0; 10]);
        assert!(matches!(err, Err(HealpixError::DimensionMismatch { got: 10 })));
    }

    #[test]
    fn from_array_infers_nside() {
        let pixels = vec![1.0; 12 * 64 * 64];
        let m = Map::from_array(pixels, Ordering::Nested, CoordinateSystem::Galactic).unwrap();
        assert_eq!(m.nside().get(), 64);
    }

    #[test]
    fn from_array_rejects_non_healpix_length() {
        assert!(Map::from_array(vec![0.0; 11], Ordering::Ring, CoordinateSystem::Custom).is_err());
    }

    #[test]
    fn get_set_bounds_checked() {
        let mut m = Map::zeros(n(2), Ordering::Ring, CoordinateSystem::Custom);
        m.set(5, 3.0).unwrap();
        assert_eq!(m.get(5).unwrap(), 3.0);
        assert!(m.get(m.npix()).is_err());
        assert!(m.set(m.npix(), 1.0).is_err());
    }

    #[test]
    fn polarization_maps_require_matching_geometry() {
        let i = Map::zeros(n(4), Ordering::Ring, CoordinateSystem::Custom);
        let q = Map::zeros(n(4), Ordering::Ring, CoordinateSystem::Custom);
        let u_mismatched = Map::zeros(n(8), Ordering::Ring, CoordinateSystem::Custom);
        assert!(PolarizationMaps::new(i.clone(), q.clone(), u_mismatched).is_err());
        assert!(PolarizationMaps::new(i, q.clone(), q).is_ok());
    }
}
