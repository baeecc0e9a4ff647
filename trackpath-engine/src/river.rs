//! Flow-based A* river placement, used by map generation rather than by
//! vehicle controllers.
//!
//! Cost per step is `1 + random(0..river_route_random)`: rivers should meander
//! rather than run perfectly straight, so the path found isn't the *unique*
//! cheapest one, only *a* cheap one under a randomized tie-break. Successors
//! are whichever neighbouring tiles the caller's `flows_down` predicate
//! accepts (terrain height comparison lives outside this crate).

use rand::Rng;
use std::cell::RefCell;

use trackpath_graph::tile::TileGrid;
use trackpath_graph::trackdir::DiagDir;
use trackpath_graph::{Settings, TileIndex};

use crate::astar::{find_path, Problem};

/// Plain (unscaled) Manhattan tile distance. The river builder's per-step
/// cost is a small random integer, not a `TILE_LENGTH`-scaled penalty, so its
/// heuristic must be in the same units, unlike every other mode's.
fn tile_distance(grid: &TileGrid, from: TileIndex, to: TileIndex) -> i32 {
    let (fx, fy) = grid.coords(from);
    let (tx, ty) = grid.coords(to);
    let dx = (i64::from(fx) - i64::from(tx)).unsigned_abs();
    let dy = (i64::from(fy) - i64::from(ty)).unsigned_abs();
    i32::try_from(dx + dy).unwrap_or(i32::MAX)
}

struct RiverProblem<'a, F: Fn(TileIndex, TileIndex) -> bool> {
    grid: &'a TileGrid,
    start: TileIndex,
    end: TileIndex,
    route_random: i32,
    flows_down: F,
    rng: RefCell<rand::rngs::StdRng>,
}

impl<'a, F: Fn(TileIndex, TileIndex) -> bool> Problem for RiverProblem<'a, F> {
    type Key = TileIndex;
    type Payload = ();

    fn origins(&self) -> Vec<(TileIndex, i32, ())> {
        vec![(self.start, 0, ())]
    }

    fn heuristic(&self, key: &TileIndex) -> i32 {
        tile_distance(self.grid, *key, self.end)
    }

    fn is_destination(&self, key: &TileIndex, _payload: &()) -> bool {
        *key == self.end
    }

    fn successors(&self, key: &TileIndex, g: i32, _payload: &()) -> Vec<(TileIndex, i32, (), bool)> {
        let mut out = Vec::new();
        for dir in DiagDir::ALL {
            // Plain land tiles aren't a transport concept this grid models,
            // so unlike every other mode the river builder doesn't gate on
            // `TileGrid::is_valid` here - bounds are the only constraint,
            // `flows_down` (terrain height, outside this crate) does the rest.
            let Some(next) = self.grid.neighbor(*key, dir) else { continue };
            if !(self.flows_down)(*key, next) {
                continue;
            }
            let bound = self.route_random.max(1);
            let step = 1 + self.rng.borrow_mut().random_range(0..bound);
            out.push((next, g + step, (), false));
        }
        let is_choice = out.len() >= 2;
        out.into_iter().map(|(k, g, p, _)| (k, g, p, is_choice)).collect()
    }
}

/// Finds a river's course from `start_tile` to `end_tile`, per the flow-based
/// A* search above. `flows_down(from, to)` decides whether water could flow
/// from one tile to an adjacent one (terrain height is the caller's problem).
///
/// Returns the path from start to end, inclusive, or `None` if no route
/// exists under the `flows_down` predicate.
#[must_use]
pub fn find_river_path(
    grid: &TileGrid,
    start_tile: TileIndex,
    end_tile: TileIndex,
    settings: &Settings,
    flows_down: impl Fn(TileIndex, TileIndex) -> bool,
    rng: rand::rngs::StdRng,
) -> Option<Vec<TileIndex>> {
    let problem = RiverProblem {
        grid,
        start: start_tile,
        end: end_tile,
        route_random: settings.river_route_random,
        flows_down,
        rng: RefCell::new(rng),
    };
    let result = find_path(&problem, settings.max_search_nodes);
    if !result.path_found {
        return None;
    }
    let mut path = Vec::new();
    let mut idx = Some(result.best);
    while let Some(i) = idx {
        let node = result.arena.get(i);
        path.push(node.key);
        idx = node.parent;
    }
    path.reverse();
    Some(path)
}

/// The widening diameter for a main river's center tile, given its distance
/// (Manhattan) from the spring. Mirrors the reference engine's schedule: a
/// river only widens once it's travelled `min_river_length * 4 / 3` tiles
/// from its source, capped at a 3-tile diameter.
#[must_use]
pub fn widen_diameter(settings: &Settings, distance_from_spring: u32) -> u32 {
    let long_river_length = settings.min_river_length * 4;
    let step = (long_river_length / 3).max(1);
    (distance_from_spring / step + 1).min(3)
}

/// Every tile within Chebyshev distance `radius` of `center`, `center`
/// itself included.
///
/// The reference engine walks these in a spiral (nearest first); that
/// ordering only matters when the caller wants to stop partway through, and
/// `RiverMakeWider`-style placement is idempotent and order-independent, so a
/// plain box scan is equivalent here.
fn tiles_within(grid: &TileGrid, center: TileIndex, radius: u32) -> Vec<TileIndex> {
    let (cx, cy) = grid.coords(center);
    let mut out = Vec::new();
    let r = i64::from(radius);
    for dy in -r..=r {
        for dx in -r..=r {
            let x = i64::from(cx) + dx;
            let y = i64::from(cy) + dy;
            if x < 0 || y < 0 || x >= i64::from(grid.size_x()) || y >= i64::from(grid.size_y()) {
                continue;
            }
            #[allow(clippy::cast_sign_loss)]
            out.push(grid.index_of(x as u32, y as u32));
        }
    }
    out
}

/// Places a river along `start_tile..end_tile`, widening it near the spring
/// if `main_river` is set. `make_river` turns a tile into river; `widen`
/// additionally widens a tile relative to the river's center line at that
/// point (both side-effect into the caller's map representation).
///
/// Returns `false` (no side effects) if no path exists.
pub fn build_river(
    grid: &TileGrid,
    start_tile: TileIndex,
    end_tile: TileIndex,
    spring_tile: TileIndex,
    main_river: bool,
    settings: &Settings,
    flows_down: impl Fn(TileIndex, TileIndex) -> bool,
    rng: rand::rngs::StdRng,
    mut make_river: impl FnMut(TileIndex),
    mut widen: impl FnMut(TileIndex, TileIndex),
) -> bool {
    let Some(path) = find_river_path(grid, start_tile, end_tile, settings, flows_down, rng) else {
        return false;
    };

    for &tile in &path {
        make_river(tile);
    }

    if main_river {
        for &center in &path {
            let distance = tile_distance(grid, spring_tile, center);
            let diameter = widen_diameter(settings, u32::try_from(distance).unwrap_or(0));
            if diameter <= 1 {
                continue;
            }
            for tile in tiles_within(grid, center, diameter - 1) {
                widen(tile, center);
            }
        }
    }

    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn finds_a_path_along_a_permissive_flow_predicate() {
        let grid = TileGrid::new(6, 6);
        let settings = Settings::default();
        let start = grid.index_of(10, 10);
        let end = grid.index_of(13, 10);
        let path = find_river_path(&grid, start, end, &settings, |_, _| true, rand::rngs::StdRng::seed_from_u64(1))
            .expect("path exists");
        assert_eq!(path.first(), Some(&start));
        assert_eq!(path.last(), Some(&end));
    }

    #[test]
    fn no_path_when_nothing_flows_down() {
        let grid = TileGrid::new(6, 6);
        let settings = Settings::default();
        let start = grid.index_of(10, 10);
        let end = grid.index_of(13, 10);
        let path = find_river_path(&grid, start, end, &settings, |_, _| false, rand::rngs::StdRng::seed_from_u64(1));
        assert!(path.is_none());
    }

    #[test]
    fn widen_diameter_grows_then_caps_at_three() {
        let mut settings = Settings::default();
        settings.min_river_length = 12; // long_river_length = 48, step = 16
        assert_eq!(widen_diameter(&settings, 0), 1);
        assert_eq!(widen_diameter(&settings, 20), 2);
        assert_eq!(widen_diameter(&settings, 200), 3);
    }

    #[test]
    fn build_river_places_tiles_and_widens_main_rivers() {
        let grid = TileGrid::new(6, 6);
        let mut settings = Settings::default();
        settings.min_river_length = 1;
        let start = grid.index_of(10, 10);
        let end = grid.index_of(14, 10);
        let spring = start;
        let mut placed = Vec::new();
        let mut widened = Vec::new();
        let ok = build_river(
            &grid,
            start,
            end,
            spring,
            true,
            &settings,
            |_, _| true,
            rand::rngs::StdRng::seed_from_u64(7),
            |t| placed.push(t),
            |t, c| widened.push((t, c)),
        );
        assert!(ok);
        assert!(!placed.is_empty());
        assert!(!widened.is_empty());
    }
}
