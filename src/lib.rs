pub mod error;
pub mod fits;
pub mod geometry;
pub mod map;
pub mod mollweide;
pub mod nside;
pub mod order;
pub mod pixel;
pub mod pybindings;
pub mod query_disc;
pub mod render;

pub use error::HealpixError;
pub use map::{CoordinateSystem, Map, Ordering, PolarizationMaps};
pub use mollweide::{trace_bitmap, BmpProjection, RasterResult};
pub use nside::{nside_to_npix, npix_to_nside, valid_nside, Nside};
pub use order::{nest_to_ring, ring_to_nest, switch_order};
pub use pixel::{
    angles_to_nest, angles_to_ring, nest_to_angles, nest_to_vec, ring_to_angles, ring_to_vec, vec_to_nest,
    vec_to_ring,
};
pub use query_disc::{query_disc, query_disc_inclusive};
