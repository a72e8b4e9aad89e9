/// Coverage-weighted mip pyramid and color flood.
pub mod mip;

pub use mip::{auto_levels, flood, flood_in_place};
