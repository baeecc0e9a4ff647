//! Rail PBS reservation pass.
//!
//! Runs after a successful rail A* query that requested reservation: finds
//! the safe waiting position closest to the destination end of the path,
//! then claims every track bit from the origin up to (and including) it,
//! rolling back atomically if any tile can't be claimed.

use trackpath_graph::reservation::{try_reserve_all, Claim, ReservationError};
use trackpath_graph::tile::{TileGrid, TileType, Transport};
use trackpath_graph::trackdir::Trackdir;
use trackpath_graph::TileIndex;

use crate::destination::Destination;

/// Finds the index, within `path`, of the safe waiting position nearest the
/// destination end. Returns `None` if no tile on the path is safe.
#[must_use]
pub fn find_reservation_target(grid: &TileGrid, path: &[(TileIndex, Trackdir)]) -> Option<usize> {
    let dest = Destination::AnySafeTile;
    path.iter()
        .enumerate()
        .rev()
        .find(|(_, (tile, _))| dest.matches(grid, *tile, Trackdir::NeSw.into()))
        .map(|(i, _)| i)
}

/// Runs the full reservation pass over `path`: locates the reservation
/// target, claims every track bit from the origin up to it, and rolls back
/// cleanly on the first failure.
///
/// # Errors
///
/// Returns the underlying [`ReservationError`] if any tile along the way
/// can't be claimed; the grid is left unchanged on failure.
pub fn run(grid: &mut TileGrid, path: &[(TileIndex, Trackdir)]) -> Result<usize, ReservationError> {
    let Some(target) = find_reservation_target(grid, path) else {
        return Ok(0);
    };
    let mut claims: Vec<Claim> = path[..=target]
        .iter()
        .map(|(tile, trackdir)| Claim::Track { tile: *tile, track: trackdir.track() })
        .collect();
    // The safe-waiting-position search only ever lands on a plain rail tile
    // short of a platform throat, but if the path's actual endpoint is a
    // station the train is heading into that platform regardless, so the
    // whole platform is claimed alongside the track up to the safe tile.
    if let Some((last_tile, _)) = path.last() {
        claims.extend(platform_claims(grid, *last_tile));
    }
    try_reserve_all(grid, &claims)?;
    Ok(claims.len())
}

/// If `tile` is a rail station platform, one [`Claim::Platform`] per tile
/// sharing that platform's `station_index`, so a train ending its
/// reservation inside a station claims the whole platform it will occupy,
/// not just the tile its path happens to cross.
fn platform_claims(grid: &TileGrid, tile: TileIndex) -> Vec<Claim> {
    let TileType::Station(station) = &grid.get(tile).tile_type else {
        return Vec::new();
    };
    if station.transport != Transport::Rail {
        return Vec::new();
    }
    let station_index = station.station_index;
    grid.iter()
        .filter_map(|(idx, t)| match &t.tile_type {
            TileType::Station(d) if d.transport == Transport::Rail && d.station_index == station_index => {
                Some(Claim::Platform { tile: idx, station_index })
            }
            _ => None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use trackpath_graph::owner::Owner;
    use trackpath_graph::tile::{RailData, RailType, StationData, Tile, TileType};
    use trackpath_graph::trackdir::Track;

    fn grid_with_line() -> (TileGrid, Vec<(TileIndex, Trackdir)>) {
        let mut grid = TileGrid::new(5, 5);
        let coords = [(10, 20), (11, 19), (12, 18)];
        let mut path = Vec::new();
        for (x, y) in coords {
            let idx = grid.index_of(x, y);
            *grid.get_mut(idx) = Tile {
                tile_type: TileType::Rail(RailData::new(Track::X.into(), RailType(0))),
                owner: Owner::Company(0),
                slope_up: None,
            };
            path.push((idx, Trackdir::SwNe));
        }
        (grid, path)
    }

    #[test]
    fn reserves_up_to_the_safe_tile_and_rolls_back_on_conflict() {
        let (mut grid, path) = grid_with_line();
        let reserved = run(&mut grid, &path).unwrap();
        assert_eq!(reserved, path.len());
        for (tile, _) in &path {
            if let TileType::Rail(d) = &grid.get(*tile).tile_type {
                assert!(d.reserved.contains(Track::X));
            }
        }
    }

    #[test]
    fn conflict_mid_path_rolls_back_everything() {
        let (mut grid, path) = grid_with_line();
        if let TileType::Rail(d) = &mut grid.get_mut(path[1].0).tile_type {
            d.reserved.insert(Track::X);
        }
        let result = run(&mut grid, &path);
        assert!(result.is_err());
        if let TileType::Rail(d) = &grid.get(path[0].0).tile_type {
            assert!(d.reserved.is_empty());
        }
    }

    #[test]
    fn path_ending_in_a_station_claims_the_whole_platform() {
        let (mut grid, mut path) = grid_with_line();
        let platform_a = grid.index_of(13, 17);
        let platform_b = grid.index_of(14, 16);
        for (i, &idx) in [platform_a, platform_b].iter().enumerate() {
            *grid.get_mut(idx) = Tile {
                tile_type: TileType::Station(StationData {
                    transport: trackpath_graph::tile::Transport::Rail,
                    station_index: 9,
                    track_bits: Track::X.into(),
                    platform_length: 2,
                    platform_position: i as u16,
                    drive_through: false,
                    queue_length: 0,
                    rail_type: Some(RailType(0)),
                    reserved: false,
                }),
                owner: Owner::Company(0),
                slope_up: None,
            };
        }
        path.push((platform_a, Trackdir::SwNe));

        let reserved = run(&mut grid, &path).unwrap();
        // Track claims only cover the rail tiles up to the safe-tile target
        // (the platform throat isn't itself a safe waiting tile), plus one
        // platform claim per tile of the station, including `platform_b`
        // which the path never actually crosses.
        assert_eq!(reserved, 3 + 2);
        for idx in [platform_a, platform_b] {
            let TileType::Station(d) = &grid.get(idx).tile_type else { unreachable!() };
            assert!(d.reserved);
        }
    }
}
