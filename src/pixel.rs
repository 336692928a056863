//!
//! Pixel index kernels: `(Nside, theta, phi) <-> ring_index` and
//! `(Nside, theta, phi) <-> nest_index`, plus their unit-vector variants.
//!
//! The RING half of this module keeps the `z`/`phi` internal helpers the
//! teacher's `healpix.rs` already used (`pix2ang_ring_z_phi`,
//! `ang2pix_ring_z_phi`), widened from `i32` to `i64` per the "32-bit
//! intermediates are unsound" design note, and generalized to return the
//! widened index type and to wrap `phi` with `rem_euclid` instead of `%`
//! (the teacher's `%` propagates a negative `phi` straight into a negative
//! pixel index; `rem_euclid` is the fix).
//!
//! The NESTED half follows the standard HEALPix `ang2pix_nest`/
//! `pix2ang_nest` algorithm: face selection by comparing two diagonal
//! line indices, face-local row/column bit-interleaving (Morton order).
//!
use std::f64::consts::{FRAC_PI_2, PI};

use num::integer::Roots;

use crate::geometry::Vector3;
use crate::nside::Nside;

fn clamp_theta(theta: f64) -> f64 {
    theta.clamp(0.0, PI)
}

fn wrap_phi(phi: f64) -> f64 {
    phi.rem_euclid(2.0 * PI)
}

/// Spreads the low 32 bits of `v` so that each input bit `k` lands at
/// output bit `2k` (a "Morton"/interleave half-step).
fn spread_bits(v: u64) -> u64 {
    let mut v = v & 0xFFFF_FFFF;
    v = (v | (v << 16)) & 0x0000_FFFF_0000_FFFF;
    v = (v | (v << 8)) & 0x00FF_00FF_00FF_00FF;
    v = (v | (v << 4)) & 0x0F0F_0F0F_0F0F_0F0F;
    v = (v | (v << 2)) & 0x3333_3333_3333_3333;
    v = (v | (v << 1)) & 0x5555_5555_5555_5555;
    v
}

/// Inverse of `spread_bits`: gathers bits at positions `0, 2, 4, ...` back
/// into a contiguous integer.
fn compact_bits(v: u64) -> u64 {
    let mut v = v & 0x5555_5555_5555_5555;
    v = (v | (v >> 1)) & 0x3333_3333_3333_3333;
    v = (v | (v >> 2)) & 0x0F0F_0F0F_0F0F_0F0F;
    v = (v | (v >> 4)) & 0x00FF_00FF_00FF_00FF;
    v = (v | (v >> 8)) & 0x0000_FFFF_0000_FFFF;
    v = (v | (v >> 16)) & 0x0000_0000_FFFF_FFFF;
    v
}

/// `nest_index` contribution of the face-local `(x, y)` coordinate:
/// `x` occupies even bit positions, `y` occupies odd bit positions, so the
/// bit pattern reads `...y1 x1 y0 x0` from the top, matching the spec.
fn interleave_xy(x: u32, y: u32) -> u64 {
    spread_bits(x as u64) | (spread_bits(y as u64) << 1)
}

fn deinterleave_xy(v: u64) -> (u32, u32) {
    (compact_bits(v) as u32, compact_bits(v >> 1) as u32)
}

fn xyf2nest(nside: i64, ix: i64, iy: i64, face: i64) -> u64 {
    (face as u64) * (nside as u64) * (nside as u64) + interleave_xy(ix as u32, iy as u32)
}

fn nest2xyf(nside: i64, pix: u64) -> (i64, i64, i64) {
    let npface = (nside as u64) * (nside as u64);
    let face = (pix / npface) as i64;
    let ipf = pix % npface;
    let (x, y) = deinterleave_xy(ipf);
    (face as i64, x as i64, y as i64)
}

// ---------------------------------------------------------------------
// RING
// ---------------------------------------------------------------------

fn ring_z_phi_from_pix(nside: u32, pix: u64) -> (f64, f64) {
    let pix = pix as i64;
    let nside_i = nside as i64;
    let ncap = nside_i * (nside_i - 1) * 2;
    let npix = 12 * nside_i * nside_i;
    let fact2 = 4.0 / npix as f64;

    if pix < ncap {
        // North polar cap
        let iring: i64 = (1 + (1 + 2 * pix).sqrt()) >> 1;
        let iphi = pix + 1 - 2 * iring * (iring - 1);
        let z = 1.0 - (iring * iring) as f64 * fact2;
        let phi = (iphi as f64 - 0.5) * PI / (2.0 * iring as f64);
        (z, phi)
    } else if pix < (npix - ncap) {
        // Equatorial belt
        let fact1 = (nside_i << 1) as f64 * fact2;
        let ip = pix - ncap;
        let iring = ip / (4 * nside_i) + nside_i;
        let iphi = ip % (4 * nside_i) + 1;
        let fodd = if (iring + nside_i) & 1 == 0 { 0.5 } else { 1.0 };
        let nl2 = 2 * nside_i;
        let z = (nl2 - iring) as f64 * fact1;
        let phi = (iphi as f64 - fodd) * PI / nl2 as f64;
        (z, phi)
    } else {
        // South polar cap
        let ip = npix - pix;
        let iring: i64 = (1 + (2 * ip - 1).sqrt()) >> 1;
        let iphi = 4 * iring + 1 - (ip - 2 * iring * (iring - 1));
        let z = -1.0 + (iring * iring) as f64 * fact2;
        let phi = (iphi as f64 - 0.5) * PI / (2.0 * iring as f64);
        (z, phi)
    }
}

fn ring_pix_from_z_phi(nside: u32, z: f64, phi: f64) -> u64 {
    let nside_i = nside as i64;
    let za = z.abs();
    let tt = wrap_phi(phi) * 2.0 / PI;

    if za <= 2.0 / 3.0 {
        // Equatorial belt
        let temp1 = nside_i as f64 * (0.5 + tt);
        let temp2 = nside_i as f64 * z * 0.75;
        let jp = (temp1 - temp2) as i64;
        let jm = (temp1 + temp2) as i64;
        let ir = nside_i + 1 + jp - jm;
        let kshift = 1 - (ir & 1);
        let mut ip = (jp + jm - nside_i + kshift + 1) / 2;
        ip = ip.rem_euclid(4 * nside_i);
        (nside_i * (nside_i - 1) * 2 + (ir - 1) * 4 * nside_i + ip) as u64
    } else {
        // North and South polar caps
        let tp = tt.fract();
        let tmp = nside_i as f64 * (3.0 * (1.0 - za)).sqrt();
        let jp = (tp * tmp) as i64;
        let jm = ((1.0 - tp) * tmp) as i64;
        let ir = jp + jm + 1;
        let mut ip = (tt * ir as f64) as i64;
        ip = ip.rem_euclid(4 * ir);
        if z >= 0.0 {
            (2 * ir * (ir - 1) + ip) as u64
        } else {
            (12 * nside_i * nside_i - 2 * ir * (ir + 1) + ip) as u64
        }
    }
}

/// RING index of the pixel whose center is nearest `(theta, phi)`.
pub fn angles_to_ring(nside: Nside, theta: f64, phi: f64) -> u64 {
    ring_pix_from_z_phi(nside.get(), clamp_theta(theta).cos(), phi)
}

/// Center `(theta, phi)` of RING pixel `p`. `None` if `p >= Npix(nside)`.
pub fn ring_to_angles(nside: Nside, p: u64) -> Option<(f64, f64)> {
    if p >= nside.npix() {
        return None;
    }
    let (z, phi) = ring_z_phi_from_pix(nside.get(), p);
    Some((z.clamp(-1.0, 1.0).acos(), phi))
}

/// RING index of the unit vector `v`.
pub fn vec_to_ring(nside: Nside, v: &Vector3) -> u64 {
    let (theta, phi) = v.to_angles();
    angles_to_ring(nside, theta, phi)
}

/// Unit vector at the center of RING pixel `p`.
pub fn ring_to_vec(nside: Nside, p: u64) -> Option<Vector3> {
    ring_to_angles(nside, p).map(|(theta, phi)| Vector3::from_angles(theta, phi))
}

// ---------------------------------------------------------------------
// NESTED
// ---------------------------------------------------------------------

const JRLL: [i64; 12] = [2, 2, 2, 2, 3, 3, 3, 3, 4, 4, 4, 4];
const JPLL: [i64; 12] = [1, 3, 5, 7, 0, 2, 4, 6, 1, 3, 5, 7];

fn nest_pix_from_z_phi(nside: u32, z: f64, phi: f64) -> u64 {
    let nside_i = nside as i64;
    let za = z.abs();
    let tt = wrap_phi(phi) * 2.0 / PI;

    let (face, ix, iy);
    if za <= 2.0 / 3.0 {
        let temp1 = nside_i as f64 * (0.5 + tt);
        let temp2 = nside_i as f64 * (z * 0.75);
        let jp = (temp1 - temp2) as i64;
        let jm = (temp1 + temp2) as i64;
        let ifp = jp / nside_i;
        let ifm = jm / nside_i;
        face = if ifp == ifm {
            if ifp == 4 {
                4
            } else {
                ifp + 4
            }
        } else if ifp < ifm {
            ifp
        } else {
            ifm + 8
        };
        ix = jm.rem_euclid(nside_i);
        iy = nside_i - jp.rem_euclid(nside_i) - 1;
    } else {
        let mut ntt = tt as i64;
        if ntt >= 4 {
            ntt = 3;
        }
        let tp = tt - ntt as f64;
        let tmp = nside_i as f64 * (3.0 * (1.0 - za)).sqrt();
        let mut jp = (tp * tmp) as i64;
        let mut jm = ((1.0 - tp) * tmp) as i64;
        if jp >= nside_i {
            jp = nside_i - 1;
        }
        if jm >= nside_i {
            jm = nside_i - 1;
        }
        if z >= 0.0 {
            face = ntt;
            ix = nside_i - jm - 1;
            iy = nside_i - jp - 1;
        } else {
            face = ntt + 8;
            ix = jp;
            iy = jm;
        }
    }
    xyf2nest(nside_i, ix, iy, face)
}

fn nest_z_phi_from_pix(nside: u32, pix: u64) -> (f64, f64) {
    let nside_i = nside as i64;
    let npix = 12 * nside_i * nside_i;
    let (face, ix, iy) = nest2xyf(nside_i, pix);

    let jr = JRLL[face as usize] * nside_i - ix - iy - 1;

    let fact2 = 4.0 / npix as f64;
    let fact1 = 2.0 / (3.0 * nside_i as f64);

    let (nr, z, kshift) = if jr < nside_i {
        (jr, 1.0 - (jr * jr) as f64 * fact2, 0)
    } else if jr > 3 * nside_i {
        let nr = 4 * nside_i - jr;
        (nr, -1.0 + (nr * nr) as f64 * fact2, 0)
    } else {
        let kshift = (jr - nside_i) & 1;
        (nside_i, (2 * nside_i - jr) as f64 * fact1, kshift)
    };

    let mut jp = (JPLL[face as usize] * nr + ix - iy + 1 + kshift) / 2;
    if jp > 4 * nr {
        jp -= 4 * nr;
    }
    if jp < 1 {
        jp += 4 * nr;
    }

    let phi = (jp as f64 - (kshift as f64 + 1.0) * 0.5) * (FRAC_PI_2 / nr as f64);
    (z, phi)
}

/// NESTED index of the pixel whose center is nearest `(theta, phi)`.
pub fn angles_to_nest(nside: Nside, theta: f64, phi: f64) -> u64 {
    nest_pix_from_z_phi(nside.get(), clamp_theta(theta).cos(), phi)
}

/// Center `(theta, phi)` of NESTED pixel `p`. `None` if `p >= Npix(nside)`.
pub fn nest_to_angles(nside: Nside, p: u64) -> Option<(f64, f64)> {
    if p >= nside.npix() {
        return None;
    }
    let (z, phi) = nest_z_phi_from_pix(nside.get(), p);
    Some((z.clamp(-1.0, 1.0).acos(), phi))
}

/// NESTED index of the unit vector `v`.
pub fn vec_to_nest(nside: Nside, v: &Vector3) -> u64 {
    let (theta, phi) = v.to_angles();
    angles_to_nest(nside, theta, phi)
}

/// Unit vector at the center of NESTED pixel `p`.
pub fn nest_to_vec(nside: Nside, p: u64) -> Option<Vector3> {
    nest_to_angles(nside, p).map(|(theta, phi)| Vector3::from_angles(theta, phi))
}

#[cfg(test)]
mod test {
    use super::*;

    fn n(v: u32) -> Nside {
        Nside::new(v).unwrap()
    }

    fn close(a: f64, b: f64, tol: f64) -> bool {
        (a - b).abs() < tol
    }

    #[test]
    fn ring_scenarios_from_spec() {
        assert_eq!(angles_to_ring(n(256), 0.1, 0.1), 1861);
        assert_eq!(angles_to_ring(n(256), 0.3, 0.3), 17129);

        let (theta, phi) = ring_to_angles(n(256), 1861).unwrap();
        assert!(close(theta, 0.09891295, 1e-6));
        assert!(close(phi, 0.07600627, 1e-6));
    }

    #[test]
    fn nest_scenarios_from_spec() {
        assert_eq!(angles_to_nest(n(256), 0.1, 0.1), 65196);
    }

    #[test]
    fn ring_round_trip_small_nside() {
        for order in 0..4 {
            let nside = n(1 << order);
            for p in 0..nside.npix() {
                let (theta, phi) = ring_to_angles(nside, p).unwrap();
                assert_eq!(angles_to_ring(nside, theta, phi), p);
            }
        }
    }

    #[test]
    fn nest_round_trip_small_nside() {
        for order in 0..4 {
            let nside = n(1 << order);
            for p in 0..nside.npix() {
                let (theta, phi) = nest_to_angles(nside, p).unwrap();
                assert_eq!(angles_to_nest(nside, theta, phi), p);
            }
        }
    }

    #[test]
    fn ring_to_vec_is_unit_norm() {
        let nside = n(32);
        for p in (0..nside.npix()).step_by(7) {
            let v = ring_to_vec(nside, p).unwrap();
            assert!(close(v.norm(), 1.0, 1e-12));
        }
    }

    #[test]
    fn out_of_range_index_returns_none() {
        let nside = n(4);
        assert!(ring_to_angles(nside, nside.npix()).is_none());
        assert!(nest_to_angles(nside, nside.npix()).is_none());
    }

    #[test]
    fn negative_phi_wraps_instead_of_going_negative() {
        let nside = n(64);
        let p1 = angles_to_ring(nside, 1.0, -0.1);
        let p2 = angles_to_ring(nside, 1.0, 2.0 * PI - 0.1);
        assert_eq!(p1, p2);
    }

    #[test]
    fn cap_belt_boundary_is_continuous() {
        let nside = n(128);
        let theta_boundary = (2.0_f64 / 3.0).acos();
        let p = angles_to_ring(nside, theta_boundary, 0.4);
        assert!(p < nside.npix());
    }

    #[test]
    fn poles_yield_in_range_pixels() {
        let nside = n(32);
        for &theta in &[0.0, PI] {
            for &phi in &[0.0, 1.0, 2.0 * PI - 1e-6] {
                assert!(angles_to_ring(nside, theta, phi) < nside.npix());
                assert!(angles_to_nest(nside, theta, phi) < nside.npix());
            }
        }
    }
}
