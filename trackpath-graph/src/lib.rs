//! Tile and track data model shared by the vehicle pathfinding engines.
//!
//! This crate owns everything the search engines in `trackpath-engine` treat
//! as "the map": tiles, track geometry, node/key types, the rail segment
//! cache and the water region hierarchy. It has no notion of A* itself -
//! that lives one layer up, where it can be specialized per transport mode.

pub mod node;
pub mod owner;
pub mod reservation;
pub mod segment;
pub mod settings;
pub mod tile;
pub mod trackdir;
pub mod water_region;

pub use node::{Node, NodeArena, NodeIndex, NodeKey};
pub use owner::Owner;
pub use segment::{EndSegmentReason, EndSegmentReasons, RailChangeCounter, Segment, SegmentCache};
pub use settings::Settings;
pub use tile::{Tile, TileGrid, TileIndex, TileType};
pub use trackdir::{DiagDir, Track, TrackBits, Trackdir, TrackdirBits};
pub use water_region::{WaterRegionCoord, WaterRegionMap, WaterRegionPatchDesc};

/// Base cost of crossing one tile along a diagonal trackdir.
///
/// This is the canonical "one tile" unit that every per-mode cost model is
/// expressed in multiples of.
pub const TILE_LENGTH: i32 = 100;

/// Cost of crossing one tile along a non-diagonal (45 degree corner) trackdir.
///
/// Hardcoded approximation of `TILE_LENGTH * sqrt(2) / 2`. Costs are kept
/// integer throughout the engine; switching this to floating point would
/// make search results depend on platform FP behavior, breaking determinism.
pub const TILE_CORNER_LENGTH: i32 = 71;

/// A cost used to mark a move as effectively unreachable.
///
/// Must exceed any finite sum of penalties the engine can produce within
/// `max_search_nodes` expansions, so that it always loses to a real path.
pub const INFINITE_PENALTY: i32 = i32::MAX / 2;

/// Side length, in tiles, of a water region patch.
pub const WATER_REGION_EDGE_LENGTH: u32 = 16;

/// Number of tiles contained in a single water region.
pub const WATER_REGION_NUMBER_OF_TILES: u32 = WATER_REGION_EDGE_LENGTH * WATER_REGION_EDGE_LENGTH;

/// Number of bits used to mask a node key hash down to an open/closed list
/// bucket index for the finer-grained (trackdir) key variant.
pub const NPF_HASH_BITS: u32 = 12;

/// Default search budget for a single query, in closed nodes.
pub const AYSTAR_DEF_MAX_SEARCH_NODES: u32 = 10_000;
