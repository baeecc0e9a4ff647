//! Destination predicates: what a query is trying to reach.

use trackpath_graph::tile::{TileType, Transport};
use trackpath_graph::trackdir::TrackdirBits;
use trackpath_graph::{Owner, TileIndex};

/// What a query is trying to reach.
#[derive(Debug, Clone)]
pub enum Destination {
    /// A specific tile, optionally restricted to a subset of accepted
    /// entry trackdirs, or a station by index.
    TileOrStation {
        tile: Option<TileIndex>,
        accepted_trackdirs: Option<TrackdirBits>,
        station_index: Option<u32>,
        /// Road only: non-articulated vehicles may use a bay stop; others
        /// require drive-through.
        requires_drive_through_if_articulated: bool,
        is_articulated: bool,
    },
    /// Any depot of `transport`, owned by `owner`.
    AnyDepot { transport: Transport, owner: Owner },
    /// Any rail tile that's a safe waiting position (PBS): not reserved,
    /// and not itself inside a block a reservation would conflict with.
    AnySafeTile,
}

impl Destination {
    /// Whether `(tile, trackdir_bits_present)` satisfies this destination.
    #[must_use]
    pub fn matches(&self, grid: &trackpath_graph::tile::TileGrid, tile: TileIndex, trackdirs: TrackdirBits) -> bool {
        match self {
            Destination::TileOrStation {
                tile: target_tile,
                accepted_trackdirs,
                station_index,
                requires_drive_through_if_articulated,
                is_articulated,
            } => {
                let tile_matches = target_tile.is_none_or(|t| t == tile);
                let station_matches = station_index.is_none_or(|idx| {
                    matches!(&grid.get(tile).tile_type, TileType::Station(s) if s.station_index == idx)
                });
                if !tile_matches && station_index.is_none() {
                    return false;
                }
                if station_index.is_some() && !station_matches {
                    return false;
                }
                if *is_articulated && *requires_drive_through_if_articulated {
                    let drive_through_ok = matches!(
                        &grid.get(tile).tile_type,
                        TileType::Station(s) if s.drive_through
                    );
                    if !drive_through_ok {
                        return false;
                    }
                }
                accepted_trackdirs.is_none_or(|mask| !(mask & trackdirs).is_empty())
            }
            Destination::AnyDepot { transport, owner } => matches!(
                &grid.get(tile).tile_type,
                TileType::Depot(d) if d.transport == *transport && grid.get(tile).owner == *owner
            ),
            Destination::AnySafeTile => {
                // A plain rail tile with no PBS signal coverage conflict is
                // modelled here as: rail tile, no track currently reserved.
                match &grid.get(tile).tile_type {
                    TileType::Rail(d) => d.reserved.is_empty(),
                    _ => false,
                }
            }
        }
    }
}
