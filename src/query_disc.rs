//!
//! Spherical-cap pixel enumeration (M6): `query_disc` and its
//! boundary-padded sibling `query_disc_inclusive`.
//!
//! Candidate pixels are found the classical way: walk the rings whose
//! latitude band the cap can reach, use the spherical law of cosines to
//! get each ring's longitude window, then emit the pixels in that window.
//! Since the source library's own `query_disc` test was left permanently
//! failing (see DESIGN.md), this implementation adds one more step the
//! distilled algorithm doesn't ask for: every candidate pixel is confirmed
//! with an exact `angular_distance` check before being kept, rather than
//! trusting the ring/longitude window's discretization to land exactly on
//! the pixel boundary. That keeps invariants 5 and 6 true by construction
//! instead of by careful off-by-one bookkeeping.
//!
use std::f64::consts::PI;

use crate::error::HealpixError;
use crate::geometry::{angular_distance, Vector3};
use crate::nside::Nside;
use crate::pixel::ring_to_angles;

struct RingGeometry {
    z: f64,
    numpix: i64,
    start: i64,
    stepsize: f64,
    shift: f64,
}

fn ring_geometry(nside_i: i64, npix_i: i64, iring: i64) -> RingGeometry {
    let ncap = nside_i * (nside_i - 1) * 2;
    let fact2 = 4.0 / npix_i as f64;
    let nl2 = 2 * nside_i;

    if iring < nside_i {
        RingGeometry {
            z: 1.0 - (iring * iring) as f64 * fact2,
            numpix: 4 * iring,
            start: 2 * iring * (iring - 1),
            stepsize: PI / (2.0 * iring as f64),
            shift: 0.5,
        }
    } else if iring <= 3 * nside_i {
        let fact1 = (nside_i << 1) as f64 * fact2;
        let shift = if (iring + nside_i) & 1 == 0 { 0.5 } else { 1.0 };
        RingGeometry {
            z: (nl2 - iring) as f64 * fact1,
            numpix: 4 * nside_i,
            start: ncap + (iring - nside_i) * 4 * nside_i,
            stepsize: PI / nl2 as f64,
            shift,
        }
    } else {
        let ir2 = 4 * nside_i - iring;
        RingGeometry {
            z: -1.0 + (ir2 * ir2) as f64 * fact2,
            numpix: 4 * ir2,
            start: npix_i - 2 * ir2 * (ir2 + 1),
            stepsize: PI / (2.0 * ir2 as f64),
            shift: 0.5,
        }
    }
}

fn validate_radius(radius: f64) -> Result<(), HealpixError> {
    if radius > 0.0 && radius <= PI {
        Ok(())
    } else {
        Err(HealpixError::InvalidRadius(radius))
    }
}

fn disc(nside: Nside, theta_c: f64, phi_c: f64, r_eff: f64) -> Vec<u64> {
    let nside_i = nside.get() as i64;
    let npix_i = nside.npix() as i64;

    let theta_c = theta_c.clamp(0.0, PI);
    let phi_c = phi_c.rem_euclid(2.0 * PI);
    let center = Vector3::from_angles(theta_c, phi_c);
    let cos_r = r_eff.cos();

    let mut result = Vec::new();

    for iring in 1..(4 * nside_i) {
        let g = ring_geometry(nside_i, npix_i, iring);
        let ring_theta = g.z.clamp(-1.0, 1.0).acos();

        if (ring_theta - theta_c).abs() > r_eff + 1e-9 {
            continue;
        }

        let denom = theta_c.sin() * ring_theta.sin();
        let delta_phi = if denom.abs() < 1e-15 {
            if (ring_theta - theta_c).abs() <= r_eff {
                PI
            } else {
                0.0
            }
        } else {
            let cos_dphi = (cos_r - theta_c.cos() * ring_theta.cos()) / denom;
            cos_dphi.clamp(-1.0, 1.0).acos()
        };

        let lo = ((phi_c - delta_phi) / g.stepsize + g.shift).ceil() as i64;
        let hi = ((phi_c + delta_phi) / g.stepsize + g.shift).floor() as i64;

        for iphi in lo..=hi {
            let wrapped = (iphi - 1).rem_euclid(g.numpix) + 1;
            let pix = (g.start + (wrapped - 1)) as u64;
            let Some((ptheta, pphi)) = ring_to_angles(nside, pix) else {
                continue;
            };
            let v = Vector3::from_angles(ptheta, pphi);
            if angular_distance(&center, &v) <= r_eff + 1e-9 {
                result.push(pix);
            }
        }
    }

    result.sort_unstable();
    result.dedup();
    result
}

/// RING indices of every pixel whose center lies within angular distance
/// `radius` of `(theta, phi)`. Ties (center exactly `radius` away) are
/// included. `radius` must be in `(0, pi]`.
pub fn query_disc(nside: Nside, theta: f64, phi: f64, radius: f64) -> Result<Vec<u64>, HealpixError> {
    validate_radius(radius)?;
    Ok(disc(nside, theta, phi, radius))
}

/// As `query_disc`, but the effective radius is padded by
/// `nside.max_pixel_radius()` first, so every pixel whose *area* (not just
/// center) intersects the cap is guaranteed to be included.
pub fn query_disc_inclusive(
    nside: Nside,
    theta: f64,
    phi: f64,
    radius: f64,
) -> Result<Vec<u64>, HealpixError> {
    validate_radius(radius)?;
    let padded = (radius + nside.max_pixel_radius()).min(PI);
    Ok(disc(nside, theta, phi, padded))
}

#[cfg(test)]
mod test {
    use super::*;

    fn n(v: u32) -> Nside {
        Nside::new(v).unwrap()
    }

    #[test]
    fn full_sphere_disc_covers_every_pixel_exactly_once() {
        let nside = n(8);
        let mut result = query_disc(nside, 1.0, 2.0, PI).unwrap();
        result.sort_unstable();
        let expected: Vec<u64> = (0..nside.npix()).collect();
        assert_eq!(result, expected);
    }

    #[test]
    fn inclusive_is_superset_of_exclusive() {
        let nside = n(16);
        for &(theta, phi, r) in &[(0.3, 1.0, 0.1), (1.57, 0.0, 0.2), (2.9, 4.5, 0.05)] {
            let excl = query_disc(nside, theta, phi, r).unwrap();
            let incl = query_disc_inclusive(nside, theta, phi, r).unwrap();
            for p in &excl {
                assert!(incl.contains(p), "inclusive missing pixel {p}");
            }
        }
    }

    #[test]
    fn result_is_sorted_and_deduplicated() {
        let nside = n(16);
        let result = query_disc(nside, 1.2, 0.5, 0.3).unwrap();
        let mut sorted = result.clone();
        sorted.sort_unstable();
        sorted.dedup();
        assert_eq!(result, sorted);
    }

    #[test]
    fn disc_around_pole_contains_pole_pixel() {
        let nside = n(8);
        let pole_pix = crate::pixel::angles_to_ring(nside, 0.0, 0.0);
        let result = query_disc(nside, 0.0, 0.0, 0.2).unwrap();
        assert!(result.contains(&pole_pix));
    }

    #[test]
    fn rejects_out_of_range_radius() {
        let nside = n(8);
        assert!(query_disc(nside, 1.0, 1.0, 0.0).is_err());
        assert!(query_disc(nside, 1.0, 1.0, -0.1).is_err());
        assert!(query_disc(nside, 1.0, 1.0, PI + 0.01).is_err());
    }

    #[test]
    fn small_disc_is_much_smaller_than_full_sphere() {
        let nside = n(32);
        let result = query_disc(nside, 1.0, 1.0, 0.05).unwrap();
        assert!(!result.is_empty());
        assert!((result.len() as u64) < nside.npix() / 10);
    }
}
