//! Tiles and the flat grid that holds them.
//!
//! The grid is a plain row-major array of `2^log_x * 2^log_y` tiles (the
//! southern and eastern edge rows/columns are `Void` and never enterable,
//! mirroring real tile-based transport sims). Everything the search engines
//! need to know about a tile - its track geometry, reservations, signals,
//! ownership - lives on [`Tile`]; the engines themselves hold no map state
//! of their own.

use crate::owner::Owner;
use crate::trackdir::{DiagDir, TrackBits};
use std::collections::BTreeMap;

/// A flat, row-major index into a [`TileGrid`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TileIndex(pub u32);

impl TileIndex {
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    #[must_use]
    pub const fn value(self) -> u32 {
        self.0
    }
}

/// A single transport mode that can use a tile/track.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Transport {
    Rail,
    Road,
    Water,
}

/// A rail type identifier (standard gauge, electrified, monorail, ...).
///
/// Opaque beyond equality; compatibility is a property of the *vehicle*
/// (its set of compatible rail types), not of this type alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RailType(pub u8);

/// A road type identifier (road vs tram, and sub-variants thereof).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RoadType(pub u8);

/// A bounded set of [`RailType`] or [`RoadType`] values, represented as a
/// 32-bit mask.
///
/// A hand-rolled mask rather than `enumset::EnumSet` because the number of
/// rail/road (sub)types is a map-defined, not compile-time-fixed, count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TypeMask(pub u32);

impl TypeMask {
    #[must_use]
    pub const fn single(id: u8) -> Self {
        Self(1 << id)
    }

    #[must_use]
    pub const fn contains(self, id: u8) -> bool {
        self.0 & (1 << id) != 0
    }

    #[must_use]
    pub const fn intersects(self, other: Self) -> bool {
        self.0 & other.0 != 0
    }

    #[must_use]
    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }
}

/// A rail signal, tied to a specific (tile, facing trackdir).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Signal {
    pub signal_type: SignalType,
    pub red: bool,
    /// A two-way signal also faces oncoming traffic (used to detect
    /// "first signal is two-way and red" dead branches).
    pub two_way: bool,
}

/// The kind of rail signal, which determines its cost/pruning treatment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SignalType {
    Normal,
    Entry,
    Exit,
    Combo,
    Pbs,
    PbsOneway,
}

impl SignalType {
    /// Path-based signals don't accumulate "last red" state; conflicts are
    /// resolved by the reservation pass instead.
    #[must_use]
    pub const fn is_pbs(self) -> bool {
        matches!(self, SignalType::Pbs | SignalType::PbsOneway)
    }
}

/// Rail-specific per-tile data.
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RailData {
    pub track_bits: TrackBits,
    pub rail_type: Option<RailType>,
    /// Track bits already claimed by a PBS reservation.
    pub reserved: TrackBits,
    /// Signals present, keyed by the trackdir they face (protect).
    pub signals: BTreeMap<crate::trackdir::Trackdir, Signal>,
}

impl RailData {
    #[must_use]
    pub fn new(track_bits: TrackBits, rail_type: RailType) -> Self {
        Self {
            track_bits,
            rail_type: Some(rail_type),
            reserved: TrackBits::empty(),
            signals: BTreeMap::new(),
        }
    }
}

/// Road-specific per-tile data.
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RoadData {
    pub track_bits: TrackBits,
    pub road_types: TypeMask,
    /// True if this tile is the single, always-reversible bit a tram uses
    /// to turn around at the end of a line.
    pub single_tram_bit: bool,
    pub is_level_crossing: bool,
}

/// Water-specific per-tile data.
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WaterData {
    pub track_bits: TrackBits,
    /// Canal (scaled slower) vs open ocean.
    pub is_canal: bool,
    pub is_buoy: bool,
}

/// Station/stop data, common to rail platforms, bus/truck stops and docks.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StationData {
    pub transport: Transport,
    pub station_index: u32,
    pub track_bits: TrackBits,
    /// Total length of this platform, in tiles (rail) or 1 for stops/docks.
    pub platform_length: u16,
    /// Index of this tile within its platform, counting from the throat.
    pub platform_position: u16,
    pub drive_through: bool,
    /// Road stops only: approximate queue length, used to scale occupancy
    /// cost.
    pub queue_length: u16,
    pub rail_type: Option<RailType>,
    /// Whole-platform PBS claim: a train reserving through this station
    /// reserves every tile sharing `station_index`, not just the ones its
    /// path happens to cross.
    pub reserved: bool,
}

/// Tunnel/bridge ramp data (the far end is jumped to directly by the
/// follower; the wormhole itself has no tiles).
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TunnelBridgeData {
    pub other_end: TileIndex,
    pub transport: Transport,
    pub track_bits: TrackBits,
    pub is_bridge: bool,
    /// 0 = unrestricted.
    pub speed_limit: u16,
    pub rail_type: Option<RailType>,
}

/// A vehicle depot, one per transport mode.
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DepotData {
    pub transport: Transport,
    /// The only face a vehicle may enter/exit by.
    pub facing: DiagDir,
    pub track_bits: TrackBits,
    pub rail_type: Option<RailType>,
}

/// What a tile *is*.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TileType {
    /// Map edge; never enterable.
    Void,
    Rail(RailData),
    Road(RoadData),
    Water(WaterData),
    Station(StationData),
    TunnelBridgeHead(TunnelBridgeData),
    Depot(DepotData),
}

/// A single map cell.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Tile {
    pub tile_type: TileType,
    pub owner: Owner,
    /// True if traversing this tile uphill (see [`Tile::slope_up_exit`])
    /// incurs the slope penalty. `None` means flat.
    pub slope_up: Option<DiagDir>,
}

impl Tile {
    #[must_use]
    pub const fn void() -> Self {
        Self {
            tile_type: TileType::Void,
            owner: Owner::None,
            slope_up: None,
        }
    }

    #[must_use]
    pub const fn is_void(&self) -> bool {
        matches!(self.tile_type, TileType::Void)
    }

    /// Whether this tile slopes upward in the direction a vehicle exits by
    /// `exitdir`, per the simplified single-uphill-face slope model.
    #[must_use]
    pub fn is_uphill_exit(&self, exitdir: DiagDir) -> bool {
        self.slope_up == Some(exitdir)
    }

    /// Track bits present on this tile for the given transport, ignoring
    /// reservations. Stations and tunnel/bridge heads report the track of
    /// the underlying transport; depots report their single track bit.
    #[must_use]
    pub fn track_bits(&self, transport: Transport) -> TrackBits {
        match (&self.tile_type, transport) {
            (TileType::Rail(d), Transport::Rail) => d.track_bits,
            (TileType::Road(d), Transport::Road) => d.track_bits,
            (TileType::Water(d), Transport::Water) => d.track_bits,
            (TileType::Station(d), t) if d.transport == t => d.track_bits,
            (TileType::TunnelBridgeHead(d), t) if d.transport == t => d.track_bits,
            (TileType::Depot(d), t) if d.transport == t => d.track_bits,
            _ => TrackBits::empty(),
        }
    }
}

/// The finite 2D map over which every query runs.
#[derive(Debug, Clone)]
pub struct TileGrid {
    log_x: u8,
    log_y: u8,
    tiles: Vec<Tile>,
}

impl TileGrid {
    /// Builds a grid of `2^log_x * 2^log_y` tiles, all initially [`TileType::Void`].
    #[must_use]
    pub fn new(log_x: u8, log_y: u8) -> Self {
        let size = 1usize << (log_x + log_y);
        Self {
            log_x,
            log_y,
            tiles: vec![Tile::void(); size],
        }
    }

    #[must_use]
    pub const fn size_x(&self) -> u32 {
        1 << self.log_x
    }

    #[must_use]
    pub const fn size_y(&self) -> u32 {
        1 << self.log_y
    }

    #[must_use]
    pub fn coords(&self, tile: TileIndex) -> (u32, u32) {
        let x = tile.value() & (self.size_x() - 1);
        let y = tile.value() >> self.log_x;
        (x, y)
    }

    #[must_use]
    pub fn index_of(&self, x: u32, y: u32) -> TileIndex {
        TileIndex::new((y << self.log_x) | x)
    }

    #[must_use]
    pub fn get(&self, tile: TileIndex) -> &Tile {
        &self.tiles[tile.value() as usize]
    }

    pub fn get_mut(&mut self, tile: TileIndex) -> &mut Tile {
        &mut self.tiles[tile.value() as usize]
    }

    /// The tile reached by stepping one tile in `dir` from `tile`, or `None`
    /// if that would leave the grid.
    #[must_use]
    pub fn neighbor(&self, tile: TileIndex, dir: DiagDir) -> Option<TileIndex> {
        let (x, y) = self.coords(tile);
        let (dx, dy) = dir.offset();
        let nx = x as i64 + i64::from(dx);
        let ny = y as i64 + i64::from(dy);
        if nx < 0 || ny < 0 || nx >= i64::from(self.size_x()) || ny >= i64::from(self.size_y()) {
            return None;
        }
        Some(self.index_of(nx as u32, ny as u32))
    }

    #[must_use]
    pub fn is_valid(&self, tile: TileIndex) -> bool {
        (tile.value() as usize) < self.tiles.len() && !self.get(tile).is_void()
    }

    /// Iterates over every non-void tile, with its index.
    pub fn iter(&self) -> impl Iterator<Item = (TileIndex, &Tile)> {
        self.tiles
            .iter()
            .enumerate()
            .map(|(i, t)| (TileIndex::new(i as u32), t))
            .filter(|(_, t)| !t.is_void())
    }
}
