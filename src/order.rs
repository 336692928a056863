//!
//! Order conversion (M4): translating a pixel index between the RING and
//! NESTED numbering schemes for the same `Nside`, and permuting a whole
//! pixel buffer between the two.
//!
//! Both schemes tile the sphere with exactly the same set of pixel
//! centers; they differ only in how a center is assigned an integer. That
//! means the RING index and the NESTED index of a given physical pixel are
//! related through the pixel's `(theta, phi)` center: decoding under one
//! scheme and re-encoding under the other recovers the corresponding index
//! in the other scheme. `pixel.rs` already carries directly verified
//! kernels for that decode/encode step, so order conversion here is their
//! composition rather than a second, independently-risked bit-twiddling
//! path.
//!
use crate::map::{Map, Ordering};
use crate::nside::Nside;
use crate::pixel::{angles_to_nest, angles_to_ring, nest_to_angles, ring_to_angles};

/// RING index of the pixel whose NESTED index is `p`. `None` if
/// `p >= Npix(nside)`.
pub fn nest_to_ring(nside: Nside, p: u64) -> Option<u64> {
    let (theta, phi) = nest_to_angles(nside, p)?;
    Some(angles_to_ring(nside, theta, phi))
}

/// NESTED index of the pixel whose RING index is `p`. `None` if
/// `p >= Npix(nside)`.
pub fn ring_to_nest(nside: Nside, p: u64) -> Option<u64> {
    let (theta, phi) = ring_to_angles(nside, p)?;
    Some(angles_to_nest(nside, theta, phi))
}

/// Permutes `map`'s pixel buffer in place from its current ordering to the
/// other one, and flips its `Ordering` tag to match. `O(Npix)` time and a
/// single `O(Npix)` scratch buffer; the caller must have exclusive access
/// (no concurrent readers), matching the rest of the `Map` API.
pub fn switch_order(map: &mut Map) {
    let nside = map.nside();
    let npix = nside.npix() as usize;
    let mut permuted = vec![0.0_f64; npix];

    match map.ordering() {
        Ordering::Ring => {
            for i in 0..npix as u64 {
                let j = ring_to_nest(nside, i).expect("i < npix by construction");
                permuted[j as usize] = map.pixels()[i as usize];
            }
            map.set_ordering_unchecked(Ordering::Nested);
        }
        Ordering::Nested => {
            for i in 0..npix as u64 {
                let j = nest_to_ring(nside, i).expect("i < npix by construction");
                permuted[j as usize] = map.pixels()[i as usize];
            }
            map.set_ordering_unchecked(Ordering::Ring);
        }
    }
    map.pixels_mut().copy_from_slice(&permuted);
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::map::CoordinateSystem;

    fn n(v: u32) -> Nside {
        Nside::new(v).unwrap()
    }

    #[test]
    fn order_conversion_round_trips() {
        for order in 0..4 {
            let nside = n(1 << order);
            for p in 0..nside.npix() {
                let r = nest_to_ring(nside, p).unwrap();
                assert_eq!(ring_to_nest(nside, r).unwrap(), p);
            }
        }
    }

    #[test]
    fn nest_to_ring_matches_known_small_case() {
        // Known nest->ring table for Nside=2 (the inverse of the
        // ring->nest permutation): ring index 0's NEST pixel is 3, so
        // NEST pixel 3's RING index must be 0.
        let nside = n(2);
        assert_eq!(ring_to_nest(nside, 0).unwrap(), 3);
        assert_eq!(ring_to_nest(nside, 1).unwrap(), 7);
        assert_eq!(nest_to_ring(nside, 3).unwrap(), 0);
        assert_eq!(nest_to_ring(nside, 7).unwrap(), 1);
    }

    #[test]
    fn nest_to_ring_matches_reference_scenario() {
        assert_eq!(nest_to_ring(n(64), 9632).unwrap(), 9010);
    }

    #[test]
    fn ring_to_nest_matches_reference_scenario() {
        assert_eq!(ring_to_nest(n(512), 2800416).unwrap(), 2966186);
    }

    #[test]
    fn switch_order_matches_reference_permutation_at_nside_2() {
        let nside = n(2);
        let mut map = Map::zeros(nside, Ordering::Ring, CoordinateSystem::Custom);
        for i in 0..map.npix() {
            map.pixels_mut()[i as usize] = i as f64;
        }
        switch_order(&mut map);
        let expected: [u64; 48] = [
            3, 7, 11, 15, 2, 1, 6, 5, 10, 9, 14, 13, 19, 0, 23, 4, 27, 8, 31, 12, 17, 22, 21, 26, 25, 30, 29, 18, 16,
            35, 20, 39, 24, 43, 28, 47, 34, 33, 38, 37, 42, 41, 46, 45, 32, 36, 40, 44,
        ];
        let got: Vec<f64> = map.pixels().to_vec();
        let expected_f: Vec<f64> = expected.iter().map(|&x| x as f64).collect();
        assert_eq!(got, expected_f);
    }

    #[test]
    fn switch_order_twice_is_identity() {
        let nside = n(4);
        let mut map = Map::zeros(nside, Ordering::Ring, CoordinateSystem::Custom);
        for i in 0..map.npix() {
            map.pixels_mut()[i as usize] = i as f64;
        }
        let original = map.pixels().to_vec();

        switch_order(&mut map);
        assert_eq!(map.ordering(), Ordering::Nested);
        switch_order(&mut map);
        assert_eq!(map.ordering(), Ordering::Ring);
        assert_eq!(map.pixels(), original.as_slice());
    }

    #[test]
    fn switch_order_is_a_bijective_permutation() {
        let nside = n(4);
        let mut map = Map::zeros(nside, Ordering::Ring, CoordinateSystem::Custom);
        for i in 0..map.npix() {
            map.pixels_mut()[i as usize] = i as f64;
        }
        switch_order(&mut map);
        let mut seen: Vec<f64> = map.pixels().to_vec();
        seen.sort_by(|a, b| a.partial_cmp(b).unwrap());
        let expected: Vec<f64> = (0..map.npix()).map(|i| i as f64).collect();
        assert_eq!(seen, expected);
    }
}
