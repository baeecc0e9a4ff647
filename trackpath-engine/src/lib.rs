//! Search engines, track follower, and per-mode cost models built on top of
//! `trackpath-graph`'s map/track data model.
//!
//! `trackpath-graph` owns state; this crate owns the algorithms that read and
//! (for reservations and map generation) mutate it. [`query`] is the crate's
//! public surface - the entry points a vehicle controller or map generator
//! actually calls; everything else here is a building block `query` composes.

pub mod astar;
pub mod cost;
pub mod destination;
pub mod follower;
pub mod heuristic;
pub mod query;
pub mod reservation_pass;
pub mod river;
pub mod water_region_builder;
pub mod water_region_pf;

/// Flat per-edge cost used by the region-graph search's heuristic: an
/// abstraction of "one more region hop", independent of the true in-region
/// tile distance it represents.
pub const DIRECT_NEIGHBOUR_COST: i32 = 100;
