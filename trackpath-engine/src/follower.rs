//! The one-tile move abstraction shared by every transport mode.
//!
//! Rather than three near-identical followers (one per transport, as the
//! original `CFollowTrackRail`/`CFollowTrackRoad`/`CFollowTrackWater`
//! templates are), this is a single function parametrised by
//! [`FollowContext`], following `follow_track.hpp`'s observation that the
//! three templates differ only in which checks are active, not in the
//! control flow itself.

use enumset::EnumSet;
use thiserror::Error;

use trackpath_graph::owner::Owner;
use trackpath_graph::reservation::reserved_tracks;
use trackpath_graph::tile::{TileGrid, TileType, Transport, TypeMask};
use trackpath_graph::trackdir::{DiagDir, Track, TrackBits, Trackdir, TrackdirBits};
use trackpath_graph::TileIndex;

/// Why a follower step could not produce any successor.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum FollowError {
    #[error("owner mismatch entering tile")]
    Owner,
    #[error("incompatible rail type")]
    RailType,
    #[error("90 degree turn forbidden")]
    Forbid90,
    #[error("no track leads out of this tile")]
    NoWay,
    #[error("track is reserved")]
    Reserved,
}

/// Per-query parameters the follower needs beyond the map itself: which
/// transport is being routed, who owns the vehicle, which rail/road
/// (sub)types it's compatible with, and which optional checks are active.
#[derive(Debug, Clone)]
pub struct FollowContext {
    pub transport: Transport,
    pub owner: Owner,
    /// `None` when `transport != Rail`.
    pub compatible_rail_types: Option<TypeMask>,
    /// `None` when `transport != Road`.
    pub compatible_road_types: Option<TypeMask>,
    pub forbid_90_deg: bool,
    pub reservation_aware: bool,
    /// Road only: crossing onto a publicly (`Owner::None`) owned tile is
    /// always allowed regardless of the vehicle's own owner.
    pub allow_public_road: bool,
}

/// The result of a single successful follower step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FollowResult {
    pub new_tile: TileIndex,
    pub new_trackdirs: TrackdirBits,
    pub tiles_skipped: u32,
    pub is_station: bool,
    pub is_tunnel: bool,
    pub is_bridge: bool,
}

pub(crate) fn trackdirs_for_track(track: Track) -> TrackdirBits {
    EnumSet::<Trackdir>::all().iter().filter(|td| td.track() == track).collect()
}

pub(crate) fn trackdirs_for_bits(bits: TrackBits) -> TrackdirBits {
    bits.iter().flat_map(trackdirs_for_track).collect()
}

/// Advances one tile (or one wormhole, or one forced reverse) from
/// `(old_tile, old_trackdir)`. See the module docs for the eleven-step
/// contract this implements.
///
/// # Errors
///
/// Returns a [`FollowError`] describing why no successor exists.
pub fn follow(
    grid: &TileGrid,
    ctx: &FollowContext,
    old_tile: TileIndex,
    old_trackdir: Trackdir,
) -> Result<FollowResult, FollowError> {
    let exitdir = old_trackdir.to_exitdir();

    // Step 2: forced reverse at a depot facing the wrong way.
    if let TileType::Depot(d) = &grid.get(old_tile).tile_type {
        if d.transport == ctx.transport && exitdir != d.facing {
            return Ok(FollowResult {
                new_tile: old_tile,
                new_trackdirs: old_trackdir.reverse().into(),
                tiles_skipped: 0,
                is_station: false,
                is_tunnel: false,
                is_bridge: false,
            });
        }
    }

    // Step 4: tile exit, including tunnel/bridge wormhole jump.
    let (new_tile, tiles_skipped, is_tunnel, is_bridge) =
        if let TileType::TunnelBridgeHead(tb) = &grid.get(old_tile).tile_type {
            if tb.transport == ctx.transport {
                let (ox, oy) = grid.coords(old_tile);
                let (ex, ey) = grid.coords(tb.other_end);
                let skipped = (i64::from(ex) - i64::from(ox)).unsigned_abs().max(
                    (i64::from(ey) - i64::from(oy)).unsigned_abs(),
                );
                #[allow(clippy::cast_possible_truncation)]
                (tb.other_end, skipped as u32, !tb.is_bridge, tb.is_bridge)
            } else {
                let next = grid.neighbor(old_tile, exitdir).ok_or(FollowError::NoWay)?;
                (next, 0, false, false)
            }
        } else {
            let next = grid.neighbor(old_tile, exitdir).ok_or(FollowError::NoWay)?;
            (next, 0, false, false)
        };

    if !grid.is_valid(new_tile) {
        return Err(FollowError::NoWay);
    }

    // Step 6: owner check.
    let new_owner = grid.get(new_tile).owner;
    let public_exception = ctx.transport == Transport::Road && ctx.allow_public_road;
    if !ctx.owner.compatible_with(new_owner, public_exception) {
        return Err(FollowError::Owner);
    }

    // Steps 5+6: successor track bits restricted to transport and subtype.
    let raw_bits = grid.get(new_tile).track_bits(ctx.transport);
    let type_ok = match (&grid.get(new_tile).tile_type, ctx.transport) {
        (TileType::Rail(d), Transport::Rail) => d
            .rail_type
            .zip(ctx.compatible_rail_types)
            .is_none_or(|(rt, mask)| mask.contains(rt.0)),
        (TileType::Road(d), Transport::Road) => ctx
            .compatible_road_types
            .is_none_or(|mask| mask.intersects(d.road_types)),
        (TileType::Station(d), t) if d.transport == t => {
            if t == Transport::Rail {
                d.rail_type
                    .zip(ctx.compatible_rail_types)
                    .is_none_or(|(rt, mask)| mask.contains(rt.0))
            } else {
                true
            }
        }
        (TileType::TunnelBridgeHead(d), t) if d.transport == t => {
            if t == Transport::Rail {
                d.rail_type
                    .zip(ctx.compatible_rail_types)
                    .is_none_or(|(rt, mask)| mask.contains(rt.0))
            } else {
                true
            }
        }
        (TileType::Depot(d), t) if d.transport == t => true,
        (TileType::Water(_), Transport::Water) => true,
        _ => false,
    };
    if !type_ok {
        return Err(FollowError::RailType);
    }

    // Step 6 (depot entry restriction): can only enter via the depot's own face.
    if let TileType::Depot(d) = &grid.get(new_tile).tile_type {
        if d.transport == ctx.transport && exitdir.reverse() != d.facing {
            return Err(FollowError::NoWay);
        }
    }

    // Step 7: mask to reachable trackdirs.
    let mut candidates = trackdirs_for_bits(raw_bits) & exitdir.reaches_trackdirs();

    // Step 8: dead-end fallback, road only — reverse in place on old_tile.
    if candidates.is_empty() {
        if ctx.transport == Transport::Road {
            return Ok(FollowResult {
                new_tile: old_tile,
                new_trackdirs: old_trackdir.reverse().into(),
                tiles_skipped: 0,
                is_station: false,
                is_tunnel: false,
                is_bridge: false,
            });
        }
        return Err(FollowError::NoWay);
    }

    // Step 9: 90 degree turn filter.
    if ctx.forbid_90_deg {
        candidates = candidates.iter().filter(|td| !old_trackdir.crosses(*td)).collect();
        if candidates.is_empty() {
            return Err(FollowError::Forbid90);
        }
    }

    // Step 10: rail platform skip.
    let mut total_skipped = tiles_skipped;
    let is_station = matches!(&grid.get(new_tile).tile_type, TileType::Station(_));
    if let TileType::Station(s) = &grid.get(new_tile).tile_type {
        if s.transport == Transport::Rail && ctx.transport == Transport::Rail {
            total_skipped += u32::from(s.platform_length.saturating_sub(s.platform_position + 1));
        }
    }

    // Step 11: reservation-aware stripping.
    if ctx.reservation_aware {
        let reserved = reserved_tracks(grid, new_tile);
        candidates = candidates.iter().filter(|td| !reserved.contains(td.track())).collect();
        if candidates.is_empty() {
            return Err(FollowError::Reserved);
        }
    }

    Ok(FollowResult {
        new_tile,
        new_trackdirs: candidates,
        tiles_skipped: total_skipped,
        is_station,
        is_tunnel,
        is_bridge,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use trackpath_graph::tile::{DepotData, RailData, RailType, Tile};
    use trackpath_graph::trackdir::{DiagDir, Track};

    fn ctx() -> FollowContext {
        FollowContext {
            transport: Transport::Rail,
            owner: Owner::Company(0),
            compatible_rail_types: Some(TypeMask::single(0)),
            compatible_road_types: None,
            forbid_90_deg: false,
            reservation_aware: false,
            allow_public_road: false,
        }
    }

    /// A line of `Track::X` tiles running NE from `(10, 20)`.
    fn straight_rail_grid() -> TileGrid {
        let mut grid = TileGrid::new(6, 6);
        for (x, y) in [(10, 20), (11, 19), (12, 18), (13, 17)] {
            let idx = grid.index_of(x, y);
            *grid.get_mut(idx) = Tile {
                tile_type: TileType::Rail(RailData::new(Track::X.into(), RailType(0))),
                owner: Owner::Company(0),
                slope_up: None,
            };
        }
        grid
    }

    #[test]
    fn straight_rail_advances_one_tile() {
        let grid = straight_rail_grid();
        let origin = grid.index_of(10, 20);
        let result = follow(&grid, &ctx(), origin, Trackdir::SwNe).unwrap();
        assert_eq!(result.new_tile, grid.index_of(11, 19));
        assert_eq!(result.new_trackdirs, Trackdir::SwNe.into());
        assert_eq!(result.tiles_skipped, 0);
    }

    #[test]
    fn end_of_line_has_no_rail_beyond() {
        let grid = straight_rail_grid();
        let end = grid.index_of(13, 17);
        let result = follow(&grid, &ctx(), end, Trackdir::SwNe);
        assert_eq!(result, Err(FollowError::NoWay));
    }

    #[test]
    fn owner_mismatch_is_rejected() {
        let mut grid = straight_rail_grid();
        let far = grid.index_of(12, 18);
        grid.get_mut(far).owner = Owner::Company(1);
        let origin = grid.index_of(10, 20);
        let result = follow(&grid, &ctx(), origin, Trackdir::SwNe).unwrap();
        let result2 = follow(&grid, &ctx(), result.new_tile, Trackdir::SwNe);
        assert_eq!(result2, Err(FollowError::Owner));
    }

    #[test]
    fn depot_facing_mismatch_forces_reverse() {
        let mut grid = TileGrid::new(6, 6);
        let idx = grid.index_of(10, 10);
        *grid.get_mut(idx) = Tile {
            tile_type: TileType::Depot(DepotData {
                transport: Transport::Rail,
                facing: DiagDir::Se,
                track_bits: Track::X.into(),
                rail_type: Some(RailType(0)),
            }),
            owner: Owner::Company(0),
            slope_up: None,
        };
        // Entering via NeSw (exitdir Sw) doesn't match the depot's Se facing.
        let result = follow(&grid, &ctx(), idx, Trackdir::NeSw).unwrap();
        assert_eq!(result.new_tile, idx);
        assert_eq!(result.new_trackdirs, Trackdir::SwNe.into());
    }
}
