//!
//! Mollweide rasterization (M7): back-project a `W x H` bitmap onto the
//! sphere and sample a `Map` at each in-ellipse pixel.
//!
//! Each bitmap pixel's normalized coordinate `(X, Y)` is inverse-projected
//! to a sky point via the standard Mollweide formulas; pixels outside the
//! projection ellipse carry `f64::INFINITY` so a renderer can treat them
//! as transparent without a second pass.
//!
use std::f64::consts::PI;

use crate::map::{CoordinateSystem, Map, Ordering};
use crate::pixel::{angles_to_nest, angles_to_ring};

/// Threshold (and NaN) below which a sampled map value is treated as
/// "unseen" rather than data, matching the FITS sentinel convention.
pub const UNSEEN_SENTINEL: f64 = -1.63e30;

fn is_observed(v: f64) -> bool {
    v.is_finite() && v > UNSEEN_SENTINEL
}

/// A `width x height` Mollweide bitmap descriptor. `coord_tag` carries the
/// coordinate system the back-projected sky points are labeled in, the same
/// descriptive-only role the tag plays on `Map`; `trace_bitmap` itself never
/// consults it, since no module in this crate rotates between systems.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BmpProjection {
    pub width: u32,
    pub height: u32,
    pub coord_tag: CoordinateSystem,
}

impl BmpProjection {
    pub fn new(width: u32, height: u32, coord_tag: CoordinateSystem) -> Self {
        BmpProjection { width, height, coord_tag }
    }
}

/// The result of rasterizing a `Map` through a `BmpProjection`: a dense
/// row-major grid of samples (`f64::INFINITY` outside the ellipse) plus
/// the observed min/max over finite, non-sentinel samples. `None` when
/// every sample was a sentinel or outside the ellipse, since there is no
/// data to report an extremum over, so this is not forced into a
/// sentinel float the way the original's uninitialized-extrema case was.
#[derive(Clone, Debug)]
pub struct RasterResult {
    pub width: u32,
    pub height: u32,
    pub values: Vec<f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl RasterResult {
    pub fn get(&self, u: u32, v: u32) -> f64 {
        self.values[(v * self.width + u) as usize]
    }
}

/// Inverse Mollweide projection of a normalized `(x, y) in [-2,2]x[-1,1]`
/// point. Returns `None` if the point lies outside the projection
/// ellipse; otherwise `(colatitude, longitude)` in HEALPix convention.
fn inverse_mollweide(x: f64, y: f64) -> Option<(f64, f64)> {
    if x * x / 4.0 + y * y > 1.0 {
        return None;
    }
    let alpha = y.clamp(-1.0, 1.0).asin();
    let cos_alpha = alpha.cos();
    let phi = if cos_alpha.abs() < 1e-12 {
        0.0
    } else {
        PI * x / (2.0 * cos_alpha)
    };
    let sin_theta = ((2.0 * alpha + (2.0 * alpha).sin()) / PI).clamp(-1.0, 1.0);
    let latitude = sin_theta.asin();
    let colatitude = PI / 2.0 - latitude;
    Some((colatitude, phi.rem_euclid(2.0 * PI)))
}

/// Rasterizes `map` through `proj`, sampling the map's native ordering at
/// each in-ellipse bitmap pixel.
pub fn trace_bitmap(proj: &BmpProjection, map: &Map) -> RasterResult {
    let w = proj.width;
    let h = proj.height;
    let mut values = vec![f64::INFINITY; (w as usize) * (h as usize)];
    let mut min: Option<f64> = None;
    let mut max: Option<f64> = None;

    for v in 0..h {
        let y = 1.0 - (v as f64 + 0.5) / h as f64 * 2.0;
        for u in 0..w {
            let x = (u as f64 + 0.5) / w as f64 * 4.0 - 2.0;
            let Some((theta, phi)) = inverse_mollweide(x, y) else {
                continue;
            };

            let pix = match map.ordering() {
                Ordering::Ring => angles_to_ring(map.nside(), theta, phi),
                Ordering::Nested => angles_to_nest(map.nside(), theta, phi),
            };
            let Ok(value) = map.get(pix) else {
                continue;
            };

            let idx = (v as usize) * (w as usize) + u as usize;
            values[idx] = value;
            if is_observed(value) {
                min = Some(min.map_or(value, |m| m.min(value)));
                max = Some(max.map_or(value, |m| m.max(value)));
            }
        }
    }

    RasterResult {
        width: w,
        height: h,
        values,
        min,
        max,
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::nside::Nside;

    #[test]
    fn corner_pixels_are_outside_the_ellipse() {
        let nside = Nside::new(8).unwrap();
        let map = Map::filled(nside, Ordering::Ring, CoordinateSystem::Custom, 1.0);
        let proj = BmpProjection::new(64, 32, CoordinateSystem::Custom);
        let result = trace_bitmap(&proj, &map);
        assert_eq!(result.get(0, 0), f64::INFINITY);
        assert_eq!(result.get(63, 0), f64::INFINITY);
    }

    #[test]
    fn center_pixel_is_inside_the_ellipse_and_sampled() {
        let nside = Nside::new(8).unwrap();
        let map = Map::filled(nside, Ordering::Ring, CoordinateSystem::Custom, 42.0);
        let proj = BmpProjection::new(64, 32, CoordinateSystem::Custom);
        let result = trace_bitmap(&proj, &map);
        let center = result.get(32, 16);
        assert_eq!(center, 42.0);
    }

    #[test]
    fn min_max_ignore_sentinel_values() {
        let nside = Nside::new(4).unwrap();
        let mut map = Map::zeros(nside, Ordering::Ring, CoordinateSystem::Custom);
        for i in 0..map.npix() {
            map.pixels_mut()[i as usize] = if i % 2 == 0 { UNSEEN_SENTINEL } else { i as f64 };
        }
        let proj = BmpProjection::new(32, 16, CoordinateSystem::Custom);
        let result = trace_bitmap(&proj, &map);
        assert!(result.min.unwrap() >= 0.0);
        assert!(result.max.unwrap() < map.npix() as f64);
    }

    #[test]
    fn min_max_are_none_when_nothing_is_observed() {
        let nside = Nside::new(4).unwrap();
        let map = Map::filled(nside, Ordering::Ring, CoordinateSystem::Custom, UNSEEN_SENTINEL);
        let proj = BmpProjection::new(32, 16, CoordinateSystem::Custom);
        let result = trace_bitmap(&proj, &map);
        assert_eq!(result.min, None);
        assert_eq!(result.max, None);
    }

    #[test]
    fn inverse_mollweide_handles_poles_without_panicking() {
        assert!(inverse_mollweide(0.0, 1.0).is_some());
        assert!(inverse_mollweide(0.0, -1.0).is_some());
        assert!(inverse_mollweide(2.0, 0.0).is_none() || inverse_mollweide(1.999, 0.0).is_some());
    }
}
