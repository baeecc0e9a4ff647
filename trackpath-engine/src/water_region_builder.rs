//! On-demand construction of a single [`WaterRegion`]'s contents: labelling
//! connected water patches and recording per-edge traversability.
//!
//! Connectivity within a region is a plain flood fill over water tiles
//! using track-geometry adjacency (does tile A carry a trackdir whose exit
//! face points at tile B, and does B carry one whose entry face accepts
//! it); this is coarser than the full [`crate::follower::follow`] contract
//! (it ignores owner/reservation, which don't apply to water connectivity),
//! deliberately, since the region layer only needs "is this tile locally
//! reachable", not a complete follower step.

use trackpath_graph::tile::{TileGrid, TileType, Transport};
use trackpath_graph::trackdir::DiagDir;
use trackpath_graph::water_region::{WaterRegion, WaterRegionCoord, WaterRegionMap};
use trackpath_graph::{TileIndex, WATER_REGION_EDGE_LENGTH};

use crate::follower::trackdirs_for_bits;

/// Tunnel/bridge heads over water count as water for connectivity purposes;
/// their surface-side face is reachable the normal way, and the wormhole
/// jump to the far ramp is handled separately in [`flood_fill`].
pub(crate) fn water_track_bits(grid: &TileGrid, tile: TileIndex) -> Option<trackpath_graph::trackdir::TrackBits> {
    match &grid.get(tile).tile_type {
        TileType::Water(d) => Some(d.track_bits),
        TileType::TunnelBridgeHead(d) if d.transport == Transport::Water => Some(d.track_bits),
        _ => None,
    }
}

pub(crate) fn reaches(grid: &TileGrid, tile: TileIndex, dir: DiagDir) -> bool {
    water_track_bits(grid, tile).is_some_and(|bits| {
        trackdirs_for_bits(bits).iter().any(|td| td.to_exitdir() == dir)
    })
}

pub(crate) fn accepts_from(grid: &TileGrid, tile: TileIndex, dir: DiagDir) -> bool {
    water_track_bits(grid, tile).is_some_and(|bits| {
        trackdirs_for_bits(bits).iter().any(|td| td.entry_face() == dir.reverse())
    })
}

/// The edge-mask bit a tile local to a region sets when it reaches across
/// `dir` out of the region: the coordinate along the boundary that `dir`
/// doesn't itself advance.
pub(crate) fn edge_position(dir: DiagDir, local_x: u32, local_y: u32) -> u32 {
    match dir {
        DiagDir::Ne | DiagDir::Sw => local_y,
        DiagDir::Se | DiagDir::Nw => local_x,
    }
}

/// Rebuilds region `coord`'s label array and edge masks from scratch.
pub fn build_region(grid: &TileGrid, map: &mut WaterRegionMap, coord: WaterRegionCoord) {
    let origin_x = coord.x * WATER_REGION_EDGE_LENGTH;
    let origin_y = coord.y * WATER_REGION_EDGE_LENGTH;

    let mut labels = [0u8; (WATER_REGION_EDGE_LENGTH * WATER_REGION_EDGE_LENGTH) as usize];
    let mut edge_masks = [0u16; 4];
    let mut has_cross_region_aqueducts = false;
    let mut next_label: u8 = 0;

    for local_y in 0..WATER_REGION_EDGE_LENGTH {
        for local_x in 0..WATER_REGION_EDGE_LENGTH {
            let local_index = (local_y * WATER_REGION_EDGE_LENGTH + local_x) as usize;
            if labels[local_index] != 0 {
                continue;
            }
            let tile = grid.index_of(origin_x + local_x, origin_y + local_y);
            if water_track_bits(grid, tile).is_none() {
                continue;
            }
            next_label += 1;
            flood_fill(
                grid,
                origin_x,
                origin_y,
                local_x,
                local_y,
                next_label,
                &mut labels,
                &mut edge_masks,
                &mut has_cross_region_aqueducts,
            );
        }
    }

    map.get_mut(coord).set_built(labels, edge_masks, has_cross_region_aqueducts, next_label);
}

#[allow(clippy::too_many_arguments)]
fn flood_fill(
    grid: &TileGrid,
    origin_x: u32,
    origin_y: u32,
    start_x: u32,
    start_y: u32,
    label: u8,
    labels: &mut [u8; (WATER_REGION_EDGE_LENGTH * WATER_REGION_EDGE_LENGTH) as usize],
    edge_masks: &mut [u16; 4],
    has_cross_region_aqueducts: &mut bool,
) {
    let mut stack = vec![(start_x, start_y)];
    labels[(start_y * WATER_REGION_EDGE_LENGTH + start_x) as usize] = label;

    while let Some((lx, ly)) = stack.pop() {
        let tile = grid.index_of(origin_x + lx, origin_y + ly);

        // Wormhole jump: the follower treats a tunnel/bridge head's far end
        // as a direct successor, bypassing normal tile adjacency, so the
        // region builder must do the same rather than rely on `reaches`.
        if let TileType::TunnelBridgeHead(tb) = &grid.get(tile).tile_type {
            if tb.transport == Transport::Water {
                let (ex, ey) = grid.coords(tb.other_end);
                let same_region = ex / WATER_REGION_EDGE_LENGTH == origin_x / WATER_REGION_EDGE_LENGTH
                    && ey / WATER_REGION_EDGE_LENGTH == origin_y / WATER_REGION_EDGE_LENGTH;
                if same_region {
                    let local_nx = ex % WATER_REGION_EDGE_LENGTH;
                    let local_ny = ey % WATER_REGION_EDGE_LENGTH;
                    let idx = (local_ny * WATER_REGION_EDGE_LENGTH + local_nx) as usize;
                    if labels[idx] == 0 {
                        labels[idx] = label;
                        stack.push((local_nx, local_ny));
                    }
                } else {
                    *has_cross_region_aqueducts = true;
                }
            }
        }

        for dir in DiagDir::ALL {
            if !reaches(grid, tile, dir) {
                continue;
            }
            let Some(neighbor) = grid.neighbor(tile, dir) else { continue };
            if !accepts_from(grid, neighbor, dir) {
                continue;
            }
            let (nx, ny) = grid.coords(neighbor);
            let in_region = nx / WATER_REGION_EDGE_LENGTH == origin_x / WATER_REGION_EDGE_LENGTH
                && ny / WATER_REGION_EDGE_LENGTH == origin_y / WATER_REGION_EDGE_LENGTH;
            if in_region {
                let local_nx = nx % WATER_REGION_EDGE_LENGTH;
                let local_ny = ny % WATER_REGION_EDGE_LENGTH;
                let idx = (local_ny * WATER_REGION_EDGE_LENGTH + local_nx) as usize;
                if labels[idx] == 0 {
                    labels[idx] = label;
                    stack.push((local_nx, local_ny));
                }
            } else {
                edge_masks[dir as usize] |= 1 << edge_position(dir, lx, ly);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use trackpath_graph::owner::Owner;
    use trackpath_graph::tile::{Tile, WaterData};
    use trackpath_graph::trackdir::Track;

    #[test]
    fn single_connected_patch_gets_compacted_away() {
        let mut grid = TileGrid::new(6, 6);
        for (x, y) in [(0, 15), (1, 14), (2, 13)] {
            let idx = grid.index_of(x, y);
            *grid.get_mut(idx) = Tile {
                tile_type: TileType::Water(WaterData { track_bits: Track::X.into(), is_canal: false, is_buoy: false }),
                owner: Owner::None,
                slope_up: None,
            };
        }
        let mut map = WaterRegionMap::new(6, 6);
        let coord = WaterRegionCoord { x: 0, y: 0 };
        build_region(&grid, &mut map, coord);
        let region: &WaterRegion = map.get(coord);
        assert_eq!(region.number_of_patches(), 1);
        assert_eq!(region.patch_label_at(0, 15 % WATER_REGION_EDGE_LENGTH), 1);
    }

    #[test]
    fn empty_region_has_zero_patches() {
        let grid = TileGrid::new(6, 6);
        let mut map = WaterRegionMap::new(6, 6);
        let coord = WaterRegionCoord { x: 1, y: 1 };
        build_region(&grid, &mut map, coord);
        assert_eq!(map.get(coord).number_of_patches(), 0);
    }
}
