//! PBS (path-based signalling) reservation claims and release.
//!
//! Reservation state itself lives on the tile (`RailData::reserved`,
//! `StationData::reserved`); this module is the narrow set of operations the
//! reservation pass uses to mutate it transactionally: claim tiles one at a
//! time while walking a chosen path, and unwind cleanly if a later tile
//! can't be claimed.

use thiserror::Error;

use crate::tile::{TileGrid, TileType};
use crate::trackdir::{Track, TrackBits};
use crate::TileIndex;

/// Attempts to claim one tile's worth of a station platform.
///
/// # Errors
///
/// Returns [`ReservationError::UnknownStation`] if `tile` isn't a station
/// tile belonging to `station_index`, or
/// [`ReservationError::PlatformAlreadyReserved`] if that tile is already
/// claimed.
pub fn try_reserve_platform_tile(
    grid: &mut TileGrid,
    tile: TileIndex,
    station_index: u32,
) -> Result<(), ReservationError> {
    let TileType::Station(data) = &mut grid.get_mut(tile).tile_type else {
        return Err(ReservationError::UnknownStation(station_index));
    };
    if data.station_index != station_index {
        return Err(ReservationError::UnknownStation(station_index));
    }
    if data.reserved {
        return Err(ReservationError::PlatformAlreadyReserved { station_index });
    }
    data.reserved = true;
    Ok(())
}

/// Releases a previously claimed platform tile. No-op if it wasn't claimed.
pub fn release_platform_tile(grid: &mut TileGrid, tile: TileIndex) {
    if let TileType::Station(data) = &mut grid.get_mut(tile).tile_type {
        data.reserved = false;
    }
}

/// A single unit of reservation: either one track bit on a plain rail tile,
/// or one tile of an entire station platform (a platform is claimed tile by
/// tile, one [`Claim::Platform`] per tile sharing the station, since a train
/// physically occupies the full platform length while stopped).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Claim {
    Track { tile: TileIndex, track: Track },
    Platform { tile: TileIndex, station_index: u32 },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ReservationError {
    #[error("tile {0:?} is not a rail tile")]
    NotRail(TileIndex),
    #[error("track already reserved on tile {tile:?}")]
    TrackAlreadyReserved { tile: TileIndex },
    #[error("station {station_index} platform already reserved")]
    PlatformAlreadyReserved { station_index: u32 },
    #[error("unknown station index {0}")]
    UnknownStation(u32),
}

/// Attempts to claim one track bit on a rail tile.
///
/// # Errors
///
/// Returns [`ReservationError::NotRail`] if `tile` isn't a rail tile, or
/// [`ReservationError::TrackAlreadyReserved`] if `track` is already claimed.
pub fn try_reserve_track(
    grid: &mut TileGrid,
    tile: TileIndex,
    track: Track,
) -> Result<(), ReservationError> {
    let TileType::Rail(data) = &mut grid.get_mut(tile).tile_type else {
        return Err(ReservationError::NotRail(tile));
    };
    if data.reserved.contains(track) {
        return Err(ReservationError::TrackAlreadyReserved { tile });
    }
    data.reserved.insert(track);
    Ok(())
}

/// Releases a previously claimed track bit. No-op if it wasn't claimed.
pub fn release_track(grid: &mut TileGrid, tile: TileIndex, track: Track) {
    if let TileType::Rail(data) = &mut grid.get_mut(tile).tile_type {
        data.reserved.remove(track);
    }
}

/// All track bits currently reserved on a rail tile.
#[must_use]
pub fn reserved_tracks(grid: &TileGrid, tile: TileIndex) -> TrackBits {
    match &grid.get(tile).tile_type {
        TileType::Rail(data) => data.reserved,
        _ => TrackBits::empty(),
    }
}

/// Applies a sequence of claims in order, unwinding (releasing) everything
/// already claimed as soon as one fails, matching the reservation pass's
/// "walk forward, roll back on first failure" contract.
///
/// # Errors
///
/// Returns the first [`ReservationError`] encountered; on error, the grid is
/// left exactly as it was before this call.
pub fn try_reserve_all(grid: &mut TileGrid, claims: &[Claim]) -> Result<(), ReservationError> {
    for (i, claim) in claims.iter().enumerate() {
        let result = match *claim {
            Claim::Track { tile, track } => try_reserve_track(grid, tile, track),
            Claim::Platform { tile, station_index } => {
                try_reserve_platform_tile(grid, tile, station_index)
            }
        };
        if let Err(err) = result {
            tracing::debug!(claimed = i, error = %err, "reservation failed, rolling back");
            for undo in claims[..i].iter().rev() {
                release_claim(grid, *undo);
            }
            return Err(err);
        }
    }
    Ok(())
}

fn release_claim(grid: &mut TileGrid, claim: Claim) {
    match claim {
        Claim::Track { tile, track } => release_track(grid, tile, track),
        Claim::Platform { tile, .. } => release_platform_tile(grid, tile),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::owner::Owner;
    use crate::tile::{RailData, RailType, StationData, Tile, Transport};

    fn rail_grid() -> (TileGrid, TileIndex) {
        let mut grid = TileGrid::new(4, 4);
        let idx = grid.index_of(1, 1);
        *grid.get_mut(idx) = Tile {
            tile_type: TileType::Rail(RailData::new(Track::X.into(), RailType(0))),
            owner: Owner::Company(0),
            slope_up: None,
        };
        (grid, idx)
    }

    fn platform_tile(grid: &mut TileGrid, x: u32, y: u32, station_index: u32, platform_position: u16) -> TileIndex {
        let idx = grid.index_of(x, y);
        *grid.get_mut(idx) = Tile {
            tile_type: TileType::Station(StationData {
                transport: Transport::Rail,
                station_index,
                track_bits: Track::X.into(),
                platform_length: 2,
                platform_position,
                drive_through: false,
                queue_length: 0,
                rail_type: Some(RailType(0)),
                reserved: false,
            }),
            owner: Owner::Company(0),
            slope_up: None,
        };
        idx
    }

    #[test]
    fn reserve_then_release_round_trips() {
        let (mut grid, idx) = rail_grid();
        try_reserve_track(&mut grid, idx, Track::X).unwrap();
        assert!(reserved_tracks(&grid, idx).contains(Track::X));
        release_track(&mut grid, idx, Track::X);
        assert!(reserved_tracks(&grid, idx).is_empty());
    }

    #[test]
    fn double_reserve_fails() {
        let (mut grid, idx) = rail_grid();
        try_reserve_track(&mut grid, idx, Track::X).unwrap();
        assert_eq!(
            try_reserve_track(&mut grid, idx, Track::X),
            Err(ReservationError::TrackAlreadyReserved { tile: idx })
        );
    }

    #[test]
    fn try_reserve_all_rolls_back_on_failure() {
        let (mut grid, idx) = rail_grid();
        let other = grid.index_of(2, 1);
        // `other` isn't rail, so the second claim fails and the first must
        // be rolled back.
        let claims = [
            Claim::Track { tile: idx, track: Track::X },
            Claim::Track { tile: other, track: Track::X },
        ];
        assert!(try_reserve_all(&mut grid, &claims).is_err());
        assert!(reserved_tracks(&grid, idx).is_empty());
    }

    #[test]
    fn platform_reserve_then_release_round_trips() {
        let mut grid = TileGrid::new(4, 4);
        let tile = platform_tile(&mut grid, 1, 1, 7, 0);
        try_reserve_platform_tile(&mut grid, tile, 7).unwrap();
        let TileType::Station(data) = &grid.get(tile).tile_type else { unreachable!() };
        assert!(data.reserved);
        release_platform_tile(&mut grid, tile);
        let TileType::Station(data) = &grid.get(tile).tile_type else { unreachable!() };
        assert!(!data.reserved);
    }

    #[test]
    fn double_platform_reserve_fails() {
        let mut grid = TileGrid::new(4, 4);
        let tile = platform_tile(&mut grid, 1, 1, 7, 0);
        try_reserve_platform_tile(&mut grid, tile, 7).unwrap();
        assert_eq!(
            try_reserve_platform_tile(&mut grid, tile, 7),
            Err(ReservationError::PlatformAlreadyReserved { station_index: 7 })
        );
    }

    #[test]
    fn try_reserve_all_rolls_back_platform_claims_too() {
        let mut grid = TileGrid::new(4, 4);
        let a = platform_tile(&mut grid, 1, 1, 7, 0);
        let b = platform_tile(&mut grid, 2, 1, 7, 1);
        // Pre-claim `b` so the second platform claim in the batch fails and
        // the first must be rolled back.
        try_reserve_platform_tile(&mut grid, b, 7).unwrap();
        let claims = [
            Claim::Platform { tile: a, station_index: 7 },
            Claim::Platform { tile: b, station_index: 7 },
        ];
        assert!(try_reserve_all(&mut grid, &claims).is_err());
        let TileType::Station(data) = &grid.get(a).tile_type else { unreachable!() };
        assert!(!data.reserved);
    }
}
