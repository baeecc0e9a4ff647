//! Region-graph A* for ships: routes over [`WaterRegionPatchDesc`] nodes
//! instead of tiles, the hierarchical layer above tile-level ship routing.
//!
//! Each node is one connected water patch within one 16x16 region. Regions
//! are built lazily (on first visit, if dirty) the same way the data model
//! describes: a query never assumes every region is already populated.

use std::cell::RefCell;

use trackpath_graph::tile::TileGrid;
use trackpath_graph::trackdir::DiagDir;
use trackpath_graph::water_region::{WaterRegionCoord, WaterRegionMap, WaterRegionPatchDesc};
use trackpath_graph::WATER_REGION_EDGE_LENGTH;

use crate::astar::{find_path, Problem};
use crate::heuristic::region_manhattan;
use crate::water_region_builder::{accepts_from, build_region, edge_position, reaches, water_track_bits};

/// Ensures `coord`'s region is present and valid, (re)building it if absent
/// or dirty.
fn ensure_built(grid: &TileGrid, map: &RefCell<WaterRegionMap>, coord: WaterRegionCoord) {
    let needs_build = !map.borrow().get(coord).is_valid();
    if needs_build {
        build_region(grid, &mut map.borrow_mut(), coord);
    }
}

/// The boundary-local positions a crossing in `dir` can possibly start from:
/// the two region edges `dir`'s two axis components can each overflow
/// across (e.g. `Se`, `(+1, +1)`, can leave via the east edge or the south
/// edge). Only the single corner tile can trigger both at once.
fn boundary_tiles(dir: DiagDir) -> impl Iterator<Item = (u32, u32)> {
    let max = WATER_REGION_EDGE_LENGTH - 1;
    let (x_edge, y_edge) = match dir {
        DiagDir::Ne => (max, 0),
        DiagDir::Se => (max, max),
        DiagDir::Sw => (0, max),
        DiagDir::Nw => (0, 0),
    };
    let along_x_edge = (0..WATER_REGION_EDGE_LENGTH).map(move |ly| (x_edge, ly));
    let along_y_edge = (0..WATER_REGION_EDGE_LENGTH).map(move |lx| (lx, y_edge));
    along_x_edge.chain(along_y_edge)
}

/// Patch labels reachable, across direction `dir`, from a water tile in
/// `from_patch` within `coord`'s region - one entry per distinct
/// `(neighbour region, neighbour patch)` pair found.
///
/// Rather than re-scanning the whole 16x16 region, this walks only the
/// boundary tiles `dir` could possibly cross from, gated at each candidate
/// position by ANDing this region's edge mask with the actual neighbour
/// region's opposite-direction edge mask - both read at the bit the real
/// crossing tile sets, not assumed from a fixed region offset.
fn cross_region_patches(
    grid: &TileGrid,
    map: &RefCell<WaterRegionMap>,
    coord: WaterRegionCoord,
    from_patch: u8,
    dir: DiagDir,
) -> Vec<(WaterRegionCoord, u8)> {
    let own_mask = map.borrow().get(coord).edge_mask(dir);
    if own_mask == 0 {
        return Vec::new();
    }

    let origin_x = coord.x * WATER_REGION_EDGE_LENGTH;
    let origin_y = coord.y * WATER_REGION_EDGE_LENGTH;
    let mut found = Vec::new();

    for (lx, ly) in boundary_tiles(dir) {
        if own_mask & (1 << edge_position(dir, lx, ly)) == 0 {
            continue;
        }
        let label = map.borrow().get(coord).patch_label_at(lx, ly);
        if label != from_patch || label == 0 {
            continue;
        }
        let tile = grid.index_of(origin_x + lx, origin_y + ly);
        if !reaches(grid, tile, dir) {
            continue;
        }
        let Some(neighbor_tile) = grid.neighbor(tile, dir) else { continue };
        if !accepts_from(grid, neighbor_tile, dir) {
            continue;
        }
        let neighbor_coord = map.borrow().region_of(grid, neighbor_tile);
        if neighbor_coord == coord {
            continue;
        }
        ensure_built(grid, map, neighbor_coord);
        let (nlx, nly) = map.borrow().local_coords(grid, neighbor_tile);
        let reverse = dir.reverse();
        let neighbor_mask = map.borrow().get(neighbor_coord).edge_mask(reverse);
        if neighbor_mask & (1 << edge_position(reverse, nlx, nly)) == 0 {
            continue;
        }
        let neighbor_label = map.borrow().get(neighbor_coord).patch_label_at(nlx, nly);
        if neighbor_label == 0 {
            continue;
        }
        let entry = (neighbor_coord, neighbor_label);
        if !found.contains(&entry) {
            found.push(entry);
        }
    }
    found
}

struct RegionProblem<'a> {
    grid: &'a TileGrid,
    map: &'a RefCell<WaterRegionMap>,
    destination: WaterRegionPatchDesc,
    origin: WaterRegionPatchDesc,
}

impl<'a> Problem for RegionProblem<'a> {
    type Key = WaterRegionPatchDesc;
    /// The diagdir of the move that reached this node, carried so the next
    /// move can be penalized for repeating it - the region graph's
    /// anti-straight-line bias that makes a zig-zagging route strictly
    /// cheaper than a straight one when both are otherwise symmetric.
    type Payload = Option<DiagDir>;

    fn origins(&self) -> Vec<(WaterRegionPatchDesc, i32, Option<DiagDir>)> {
        vec![(self.origin, 0, None)]
    }

    fn heuristic(&self, key: &WaterRegionPatchDesc) -> i32 {
        region_manhattan(key.region, self.destination.region)
    }

    fn is_destination(&self, key: &WaterRegionPatchDesc, _payload: &Option<DiagDir>) -> bool {
        *key == self.destination
    }

    fn successors(
        &self,
        key: &WaterRegionPatchDesc,
        g: i32,
        payload: &Option<DiagDir>,
    ) -> Vec<(WaterRegionPatchDesc, i32, Option<DiagDir>, bool)> {
        ensure_built(self.grid, self.map, key.region);
        let mut out = Vec::new();
        for dir in DiagDir::ALL {
            let has_edge = self.map.borrow().get(key.region).edge_mask(dir) != 0;
            if !has_edge {
                continue;
            }
            let penalty = if *payload == Some(dir) { 1 } else { 0 };
            for (neighbor_region, label) in cross_region_patches(self.grid, self.map, key.region, key.patch_label, dir) {
                out.push((
                    WaterRegionPatchDesc { region: neighbor_region, patch_label: label },
                    g + crate::DIRECT_NEIGHBOUR_COST + penalty,
                    Some(dir),
                    false,
                ));
            }
        }
        let is_choice = out.len() >= 2;
        out.into_iter().map(|(k, g, p, _)| (k, g, p, is_choice)).collect()
    }
}

/// Resolves `tile`'s region/patch, building the region first if needed.
#[must_use]
pub fn patch_of(grid: &TileGrid, map: &RefCell<WaterRegionMap>, tile: trackpath_graph::TileIndex) -> Option<WaterRegionPatchDesc> {
    let region = map.borrow().region_of(grid, tile);
    ensure_built(grid, map, region);
    let (lx, ly) = map.borrow().local_coords(grid, tile);
    if water_track_bits(grid, tile).is_none() {
        return None;
    }
    let label = map.borrow().get(region).patch_label_at(lx, ly);
    (label != 0).then_some(WaterRegionPatchDesc { region, patch_label: label })
}

/// Finds a route from `start`'s patch to `end`'s patch over the region
/// graph, returning the ordered list of patches crossed (start patch
/// included) or `None` if either tile isn't water or no route exists.
#[must_use]
pub fn find_region_path(
    grid: &TileGrid,
    map: &RefCell<WaterRegionMap>,
    start: trackpath_graph::TileIndex,
    end: trackpath_graph::TileIndex,
    max_search_nodes: u32,
) -> Option<Vec<WaterRegionPatchDesc>> {
    let origin = patch_of(grid, map, start)?;
    let destination = patch_of(grid, map, end)?;
    if origin == destination {
        return Some(vec![origin]);
    }
    let problem = RegionProblem { grid, map, destination, origin };
    let result = find_path(&problem, max_search_nodes);
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
