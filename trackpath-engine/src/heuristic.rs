//! Admissible distance estimates for the A* heuristic.

use trackpath_graph::tile::TileGrid;
use trackpath_graph::water_region::WaterRegionCoord;
use trackpath_graph::{TileIndex, TILE_CORNER_LENGTH, TILE_LENGTH};

/// Manhattan distance between two tiles, scaled by [`TILE_LENGTH`].
///
/// Admissible and consistent for a uniform per-tile cost of `TILE_LENGTH`:
/// used for depot/tile destinations reached by orthogonal-ish travel.
#[must_use]
pub fn manhattan(grid: &TileGrid, from: TileIndex, to: TileIndex) -> i32 {
    let (fx, fy) = grid.coords(from);
    let (tx, ty) = grid.coords(to);
    let dx = (i64::from(fx) - i64::from(tx)).unsigned_abs();
    let dy = (i64::from(fy) - i64::from(ty)).unsigned_abs();
    #[allow(clippy::cast_possible_wrap, clippy::cast_possible_truncation)]
    let tiles = (dx + dy) as i64;
    i32::try_from(tiles * i64::from(TILE_LENGTH)).unwrap_or(i32::MAX)
}

/// Octile distance: diagonal moves are cheaper than the sum of their axis
/// components, matching the grid's actual diagonal-move cost structure.
#[must_use]
pub fn octile(grid: &TileGrid, from: TileIndex, to: TileIndex) -> i32 {
    let (fx, fy) = grid.coords(from);
    let (tx, ty) = grid.coords(to);
    let dx = (i64::from(fx) - i64::from(tx)).unsigned_abs();
    let dy = (i64::from(fy) - i64::from(ty)).unsigned_abs();
    let (lo, hi) = if dx < dy { (dx, dy) } else { (dy, dx) };
    #[allow(clippy::cast_possible_wrap)]
    let straight = hi - lo;
    #[allow(clippy::cast_possible_wrap)]
    let cost = straight as i64 * i64::from(TILE_LENGTH) + lo as i64 * i64::from(TILE_CORNER_LENGTH);
    i32::try_from(cost).unwrap_or(i32::MAX)
}

/// Pure Dijkstra: used for "any depot" and "any safe tile" searches, where
/// no single target tile exists to measure distance to.
#[must_use]
pub const fn zero() -> i32 {
    0
}

/// Manhattan distance between region coordinates, scaled by
/// `DIRECT_NEIGHBOUR_COST`, for the hierarchical water-region layer.
#[must_use]
pub fn region_manhattan(from: WaterRegionCoord, to: WaterRegionCoord) -> i32 {
    let dx = (i64::from(from.x) - i64::from(to.x)).unsigned_abs();
    let dy = (i64::from(from.y) - i64::from(to.y)).unsigned_abs();
    #[allow(clippy::cast_possible_wrap)]
    let tiles = (dx + dy) as i64;
    i32::try_from(tiles * i64::from(crate::DIRECT_NEIGHBOUR_COST)).unwrap_or(i32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manhattan_is_zero_at_origin() {
        let grid = TileGrid::new(4, 4);
        let tile = grid.index_of(3, 3);
        assert_eq!(manhattan(&grid, tile, tile), 0);
    }

    #[test]
    fn octile_is_cheaper_than_manhattan_off_axis() {
        let grid = TileGrid::new(5, 5);
        let from = grid.index_of(0, 0);
        let to = grid.index_of(3, 3);
        assert!(octile(&grid, from, to) < manhattan(&grid, from, to));
    }

    #[test]
    fn region_manhattan_scales_by_direct_neighbour_cost() {
        let a = WaterRegionCoord { x: 0, y: 0 };
        let b = WaterRegionCoord { x: 2, y: 1 };
        assert_eq!(region_manhattan(a, b), 3 * crate::DIRECT_NEIGHBOUR_COST);
    }
}
