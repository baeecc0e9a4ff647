//! Public entry points a vehicle controller (or map generator) calls.
//!
//! Everything above this module - the follower, the generic A* engine, the
//! per-mode cost models - is a building block; this is the only module the
//! rest of a simulation is expected to depend on directly.

use std::cell::RefCell;

use trackpath_graph::reservation::ReservationError;
use trackpath_graph::segment::{EndSegmentReason, RailChangeCounter, Segment, SegmentCache, SegmentKey};
use trackpath_graph::tile::{TileGrid, TileType, Transport, TypeMask};
use trackpath_graph::trackdir::Trackdir;
use trackpath_graph::water_region::{WaterRegionMap, WaterRegionPatchDesc};
use trackpath_graph::{Owner, Settings, TileIndex};

use crate::astar::{find_path, Problem};
use crate::cost;
use crate::cost::rail::SignalState;
use crate::destination::Destination;
use crate::follower::{follow, FollowContext};
use crate::heuristic;
use crate::reservation_pass;
use crate::river;
use crate::water_region_pf::find_region_path;

/// Everything a `choose_next_track`-style query needs beyond the map: which
/// vehicle is asking (owner, transport, type compatibility) and what it's
/// trying to reach.
#[derive(Debug, Clone)]
pub struct VehicleQuery {
    pub transport: Transport,
    pub owner: Owner,
    pub compatible_rail_types: Option<TypeMask>,
    pub compatible_road_types: Option<TypeMask>,
    pub forbid_90_deg: bool,
    pub allow_public_road: bool,
    pub destination: Destination,
}

impl VehicleQuery {
    fn follow_ctx(&self, reservation_aware: bool) -> FollowContext {
        FollowContext {
            transport: self.transport,
            owner: self.owner,
            compatible_rail_types: self.compatible_rail_types,
            compatible_road_types: self.compatible_road_types,
            forbid_90_deg: self.forbid_90_deg,
            reservation_aware,
            allow_public_road: self.allow_public_road,
        }
    }
}

/// Outcome of a `choose_next_track`-style query.
#[derive(Debug, Clone)]
pub struct ChooseNextTrackResult {
    pub path_found: bool,
    pub chosen_trackdir: Option<Trackdir>,
    /// Destination tile/trackdir actually reached, if `path_found`.
    pub target: Option<(TileIndex, Trackdir)>,
    /// Set when `reserve_track` was requested and the reservation pass ran
    /// (rail only). `Some(Ok(n))` reserved `n` tiles; `Some(Err(_))` means
    /// the reservation pass itself failed and was rolled back.
    pub reservation: Option<Result<usize, ReservationError>>,
}

type Key = (TileIndex, Trackdir);
type StepCost<'a> = dyn Fn(&TileGrid, &Settings, Key, &crate::follower::FollowResult, Trackdir, SignalState) -> (i32, SignalState, bool) + 'a;

/// One pathfinding problem shared by rail/road/water: walk the follower one
/// tile at a time, score each step with the mode's cost model, stop at
/// `destination`. Mode differences live entirely in `step_cost`; the signal
/// state carried in the payload is opaque to road/water (always default).
///
/// Rail additionally consults `segment_cache` (road/water always pass
/// `None`, per-tile only): when the destination isn't an exact arbitrary
/// tile and the incoming signal state is fresh, a whole maximal
/// straight-through run is resolved in one shot instead of one A* node per
/// tile. See [`rail_segment`].
struct TrackProblem<'a> {
    grid: &'a TileGrid,
    settings: &'a Settings,
    ctx: FollowContext,
    destination: &'a Destination,
    origin: Key,
    step_cost: &'a StepCost<'a>,
    segment_cache: Option<&'a SegmentCache>,
}

/// Whether `destination` names one specific tile rather than a class of
/// tiles (a station index, a depot, any safe tile): an exact-tile
/// destination can land strictly inside what would otherwise be a single
/// maximal straight-through run, so it must always be approached tile by
/// tile rather than jumped over via a cached segment.
fn destination_is_exact_tile(destination: &Destination) -> bool {
    matches!(destination, Destination::TileOrStation { tile: Some(_), .. })
}

impl<'a> Problem for TrackProblem<'a> {
    type Key = Key;
    type Payload = SignalState;

    fn origins(&self) -> Vec<(Key, i32, SignalState)> {
        vec![(self.origin, 0, SignalState::default())]
    }

    fn heuristic(&self, key: &Key) -> i32 {
        match self.destination {
            Destination::TileOrStation { tile: Some(t), .. } => heuristic::manhattan(self.grid, key.0, *t),
            _ => heuristic::zero(),
        }
    }

    fn is_destination(&self, key: &Key, _payload: &SignalState) -> bool {
        self.destination.matches(self.grid, key.0, key.1.into())
    }

    fn successors(&self, key: &Key, g: i32, payload: &SignalState) -> Vec<(Key, i32, SignalState, bool)> {
        if let Some(cache) = self.segment_cache {
            if *payload == SignalState::default() && !destination_is_exact_tile(self.destination) {
                return self.rail_segment_successors(cache, key, g, payload);
            }
        }
        self.tile_successors(key, g, payload)
    }
}

impl<'a> TrackProblem<'a> {
    fn tile_successors(&self, key: &Key, g: i32, payload: &SignalState) -> Vec<(Key, i32, SignalState, bool)> {
        let Ok(result) = follow(self.grid, &self.ctx, key.0, key.1) else { return vec![] };
        let candidates: Vec<Trackdir> = result.new_trackdirs.iter().collect();
        let is_choice = candidates.len() >= 2;

        candidates
            .into_iter()
            .filter_map(|td| {
                let (mut cost, mut state, prune) = (self.step_cost)(self.grid, self.settings, *key, &result, td, *payload);
                if prune {
                    return None;
                }
                state.choice_seen = payload.choice_seen || is_choice;
                if self.destination.matches(self.grid, result.new_tile, td.into()) {
                    cost += cost::rail::target_hit_bonus(self.settings, &state);
                }
                Some(((result.new_tile, td), g + cost, state, is_choice))
            })
            .collect()
    }

    /// Resolves the cached (or freshly built) segment starting at `key` and
    /// turns it into a single successor at the segment's end, skipping node
    /// creation for every tile in between.
    fn rail_segment_successors(&self, cache: &SegmentCache, key: &Key, g: i32, payload: &SignalState) -> Vec<(Key, i32, SignalState, bool)> {
        let segment = rail_segment(self.grid, self.settings, &self.ctx, cache, *key);
        let end_key = (segment.last_tile, segment.last_trackdir);
        if end_key == *key {
            // `follow` failed on the very first tile, or the run looped
            // straight back to its own entry: no way forward.
            return Vec::new();
        }

        let is_choice = segment.end_reasons.contains(EndSegmentReason::ChoiceFollows);
        let mut state = SignalState {
            choice_seen: payload.choice_seen || is_choice,
            ..SignalState::default()
        };
        let mut cost = g + segment.cost;
        if self.destination.matches(self.grid, end_key.0, end_key.1.into()) {
            cost += cost::rail::target_hit_bonus(self.settings, &state);
        }
        vec![(end_key, cost, state, is_choice)]
    }
}

/// Maximum tiles a single cached segment may span before it's force-ended
/// with [`EndSegmentReason::SegmentTooLong`], mirroring the real YAPF's
/// bound against pathologically long unsignalled stretches.
const MAX_SEGMENT_LENGTH: u32 = 128;

/// Builds (or returns the cached copy of) the maximal straight-through rail
/// run starting at `key`: walks tile by tile through every choice-free
/// follower step, summing `rail_step_cost` as it goes, and stops at the
/// first of a dead end, a junction, a rail type change, a station, a safe
/// (unreserved) waiting tile, a loop back to the entry, or
/// [`MAX_SEGMENT_LENGTH`].
///
/// Built fresh from [`SignalState::default`] every time - callers only use
/// this when the incoming payload is itself already default. That's what
/// makes the result safe to key purely by `(first_tile, first_trackdir)`:
/// the look-ahead signal cost and the `FirstTwoWayRed` prune both depend on
/// how much signal history the caller already carries, which a plain
/// topology key can't capture.
fn rail_segment(grid: &TileGrid, settings: &Settings, ctx: &FollowContext, cache: &SegmentCache, key: Key) -> Segment {
    let segment_key = SegmentKey { first_tile: key.0, first_trackdir: key.1 };
    if let Some(segment) = cache.get(segment_key) {
        return segment;
    }

    let first_rail_type = rail_type_at(grid, key.0);
    let mut cur = key;
    let mut cost = 0;
    let mut state = SignalState::default();
    let mut end_reasons = trackpath_graph::segment::EndSegmentReasons::empty();
    let mut steps: u32 = 0;

    loop {
        let Ok(result) = follow(grid, ctx, cur.0, cur.1) else {
            end_reasons.insert(EndSegmentReason::DeadEnd);
            break;
        };
        let candidates: Vec<Trackdir> = result.new_trackdirs.iter().collect();
        if candidates.len() != 1 {
            end_reasons.insert(EndSegmentReason::ChoiceFollows);
            break;
        }
        if rail_type_at(grid, result.new_tile) != first_rail_type {
            end_reasons.insert(EndSegmentReason::RailTypeChange);
            break;
        }

        let td = candidates[0];
        let (step_cost, next_state, prune) = rail_step_cost(grid, settings, cur, &result, td, state);
        if prune {
            end_reasons.insert(EndSegmentReason::FirstTwoWayRed);
            break;
        }
        cost += step_cost;
        state = next_state;
        cur = (result.new_tile, td);
        steps += 1;

        if let TileType::Station(s) = &grid.get(cur.0).tile_type {
            if s.transport == Transport::Rail {
                end_reasons.insert(EndSegmentReason::Station);
                break;
            }
        }
        if Destination::AnySafeTile.matches(grid, cur.0, cur.1.into()) {
            end_reasons.insert(EndSegmentReason::SafeTile);
            break;
        }
        if cur == key {
            end_reasons.insert(EndSegmentReason::InfiniteLoop);
            break;
        }
        if steps >= MAX_SEGMENT_LENGTH {
            end_reasons.insert(EndSegmentReason::SegmentTooLong);
            break;
        }
    }

    let segment = Segment {
        cost,
        last_tile: cur.0,
        last_trackdir: cur.1,
        last_signal: None,
        end_reasons,
    };
    if end_reasons.iter().all(EndSegmentReason::is_cacheable) {
        cache.insert(segment_key, segment);
    }
    segment
}

fn rail_type_at(grid: &TileGrid, tile: TileIndex) -> Option<trackpath_graph::tile::RailType> {
    match &grid.get(tile).tile_type {
        TileType::Rail(d) => d.rail_type,
        _ => None,
    }
}

fn rail_step_cost(
    grid: &TileGrid,
    settings: &Settings,
    from: Key,
    result: &crate::follower::FollowResult,
    td: Trackdir,
    prev: SignalState,
) -> (i32, SignalState, bool) {
    let mut c = cost::rail::base_tile_cost(td);
    c += cost::rail::curve_cost(settings, from.1, td);
    c += cost::rail::doubleslip_cost(settings, result.new_trackdirs.len() >= 2);
    let is_uphill = grid.get(from.0).is_uphill_exit(from.1.to_exitdir());
    c += cost::rail::slope_cost(settings, is_uphill);

    let mut state = prev;
    let mut prune = false;
    if let TileType::Rail(d) = &grid.get(result.new_tile).tile_type {
        if let Some(signal) = d.signals.get(&td) {
            let outcome = cost::rail::signal_cost(settings, &mut state, *signal);
            c += outcome.cost;
            prune = outcome.prune;
        }
    }
    if let TileType::Station(s) = &grid.get(result.new_tile).tile_type {
        if s.transport == Transport::Rail {
            c += settings.rail_station_penalty;
        }
    }
    (c, state, prune)
}

fn road_step_cost(
    grid: &TileGrid,
    settings: &Settings,
    from: Key,
    result: &crate::follower::FollowResult,
    td: Trackdir,
    prev: SignalState,
) -> (i32, SignalState, bool) {
    let mut c = cost::road::base_tile_cost(td);
    c += cost::road::curve_cost(settings, from.1, td);
    let is_uphill = grid.get(from.0).is_uphill_exit(from.1.to_exitdir());
    c += cost::road::slope_cost(settings, is_uphill);
    if let TileType::Road(d) = &grid.get(result.new_tile).tile_type {
        c += cost::road::crossing_cost(settings, d.is_level_crossing);
    }
    if let TileType::Station(s) = &grid.get(result.new_tile).tile_type {
        if s.transport == Transport::Road {
            c += if s.drive_through {
                cost::road::drive_through_stop_cost(settings, s.queue_length)
            } else {
                cost::road::bay_stop_cost(settings, s.queue_length > 0)
            };
        }
    }
    (c, prev, false)
}

/// Canal speed fraction (of full speed) used by the water cost model; open
/// ocean is always full speed.
const CANAL_SPEED_FRAC: u16 = 128;

fn water_step_cost(
    grid: &TileGrid,
    settings: &Settings,
    from: Key,
    result: &crate::follower::FollowResult,
    td: Trackdir,
    prev: SignalState,
) -> (i32, SignalState, bool) {
    let mut c = cost::water::base_tile_cost(td);
    let is_curve = from.1.track() != td.track();
    c += cost::water::curve_cost(settings, is_curve);
    if result.is_bridge {
        c += cost::water::aqueduct_cost(result.tiles_skipped);
    }
    if let TileType::Water(d) = &grid.get(result.new_tile).tile_type {
        if d.is_canal {
            c = cost::water::speed_scaled_cost(c, result.tiles_skipped, CANAL_SPEED_FRAC);
        }
        c += cost::water::buoy_cost(settings, d.is_buoy);
    }
    (c, prev, false)
}

fn reconstruct_path(result: &crate::astar::SearchResult<Key, SignalState>) -> Vec<(TileIndex, Trackdir)> {
    let mut path = Vec::new();
    let mut idx = Some(result.best);
    while let Some(i) = idx {
        let node = result.arena.get(i);
        path.push(node.key);
        idx = node.parent;
    }
    path.reverse();
    path
}

/// Expands a reconstructed path's waypoints into every tile actually
/// crossed. A rail query collapses a maximal straight-through run into one
/// successor (see [`TrackProblem::rail_segment_successors`]), so two
/// consecutive waypoints here can be many tiles apart; the reservation pass
/// (and anything else stepping the path tile by tile) needs every one of
/// them, not just the search's decision points. Road and water paths are
/// already tile by tile, so this is a no-op for them.
fn expand_rail_path(grid: &TileGrid, ctx: &FollowContext, waypoints: &[(TileIndex, Trackdir)]) -> Vec<(TileIndex, Trackdir)> {
    let Some(&first) = waypoints.first() else { return Vec::new() };
    let mut expanded = vec![first];
    for &next in &waypoints[1..] {
        loop {
            let cur = *expanded.last().unwrap();
            if cur == next {
                break;
            }
            let Ok(result) = follow(grid, ctx, cur.0, cur.1) else { break };
            let candidates: Vec<Trackdir> = result.new_trackdirs.iter().collect();
            let [td] = candidates.as_slice() else { break };
            expanded.push((result.new_tile, *td));
        }
    }
    expanded
}

fn step_cost_for(transport: Transport) -> &'static StepCost<'static> {
    match transport {
        Transport::Rail => &rail_step_cost,
        Transport::Road => &road_step_cost,
        Transport::Water => &water_step_cost,
    }
}

/// Runs a `choose_next_track` style query for rail, road or water, dispatched
/// on `query.transport`.
///
/// `reserve_track` (rail only) requests the PBS reservation pass run against
/// the found path on success.
#[must_use]
pub fn choose_next_track(
    grid: &mut TileGrid,
    query: &VehicleQuery,
    settings: &Settings,
    origin_tile: TileIndex,
    origin_trackdir: Trackdir,
    reserve_track: bool,
    segment_cache: &SegmentCache,
) -> ChooseNextTrackResult {
    let ctx = query.follow_ctx(reserve_track && query.transport == Transport::Rail);
    let origin = (origin_tile, origin_trackdir);

    let problem = TrackProblem {
        grid,
        settings,
        ctx: ctx.clone(),
        destination: &query.destination,
        origin,
        step_cost: step_cost_for(query.transport),
        segment_cache: (query.transport == Transport::Rail).then_some(segment_cache),
    };

    let result = find_path(&problem, settings.max_search_nodes);
    if !result.path_found {
        return ChooseNextTrackResult { path_found: false, chosen_trackdir: None, target: None, reservation: None };
    }

    let path = expand_rail_path(grid, &ctx, &reconstruct_path(&result));
    let chosen_trackdir = path.get(1).map(|(_, td)| *td);
    let target = path.last().copied();

    let reservation = if reserve_track && query.transport == Transport::Rail {
        Some(reservation_pass::run(grid, &path))
    } else {
        None
    };

    ChooseNextTrackResult { path_found: true, chosen_trackdir, target, reservation }
}

/// Result of `find_nearest_depot`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FindDepotData {
    pub tile: TileIndex,
    pub best_length: i32,
    pub reverse: bool,
}

struct DepotProblem<'a> {
    grid: &'a TileGrid,
    ctx: FollowContext,
    transport: Transport,
    owner: Owner,
    forward: Key,
    reversed: Key,
    reverse_penalty: i32,
}

impl<'a> Problem for DepotProblem<'a> {
    type Key = Key;
    type Payload = bool;

    fn origins(&self) -> Vec<(Key, i32, bool)> {
        vec![(self.forward, 0, false), (self.reversed, self.reverse_penalty, true)]
    }

    fn heuristic(&self, _key: &Key) -> i32 {
        heuristic::zero()
    }

    fn is_destination(&self, key: &Key, _payload: &bool) -> bool {
        Destination::AnyDepot { transport: self.transport, owner: self.owner }.matches(self.grid, key.0, key.1.into())
    }

    fn successors(&self, key: &Key, g: i32, payload: &bool) -> Vec<(Key, i32, bool, bool)> {
        let Ok(result) = follow(self.grid, &self.ctx, key.0, key.1) else { return vec![] };
        let candidates: Vec<Trackdir> = result.new_trackdirs.iter().collect();
        let is_choice = candidates.len() >= 2;
        let base: fn(Trackdir) -> i32 = match self.transport {
            Transport::Rail => cost::rail::base_tile_cost,
            Transport::Road => cost::road::base_tile_cost,
            Transport::Water => cost::water::base_tile_cost,
        };
        candidates
            .into_iter()
            .map(|td| ((result.new_tile, td), g + base(td), *payload, is_choice))
            .collect()
    }
}

/// Finds the nearest depot reachable from either `forward` or `reversed`
/// (the vehicle's current position travelled normally, or after an in-place
/// reverse costing `reverse_penalty`).
#[must_use]
pub fn find_nearest_depot(
    grid: &TileGrid,
    transport: Transport,
    owner: Owner,
    ctx: FollowContext,
    forward: (TileIndex, Trackdir),
    reversed: (TileIndex, Trackdir),
    reverse_penalty: i32,
    max_search_nodes: u32,
) -> Option<FindDepotData> {
    let problem = DepotProblem { grid, ctx, transport, owner, forward, reversed, reverse_penalty };
    let result = find_path(&problem, max_search_nodes);
    if !result.path_found {
        return None;
    }
    let node = result.best_node();
    Some(FindDepotData { tile: node.key.0, best_length: node.g, reverse: node.payload })
}

/// Compares continuing forward against reversing first (at `reverse_penalty`
/// extra cost) and pathfinding from there to the same `destination`. Returns
/// `true` if reversing reaches a strictly lower cost.
#[must_use]
pub fn check_reverse(
    grid: &TileGrid,
    settings: &Settings,
    transport: Transport,
    ctx: FollowContext,
    destination: &Destination,
    forward: (TileIndex, Trackdir),
    reversed: (TileIndex, Trackdir),
    reverse_penalty: i32,
    segment_cache: &SegmentCache,
) -> bool {
    let step_cost = step_cost_for(transport);
    let segment_cache = (transport == Transport::Rail).then_some(segment_cache);

    let run = |origin: Key, extra: i32| -> Option<i32> {
        let problem = TrackProblem { grid, settings, ctx: ctx.clone(), destination, origin, step_cost, segment_cache };
        let result = find_path(&problem, settings.max_search_nodes);
        result.path_found.then(|| result.best_node().g + extra)
    };

    match (run(forward, 0), run(reversed, reverse_penalty)) {
        (Some(fwd), Some(rev)) => rev < fwd,
        (None, Some(_)) => true,
        _ => false,
    }
}

/// Runs the reservation pass against the nearest safe waiting position
/// reachable from `origin`, matching `find_nearest_safe_tile`.
///
/// # Errors
///
/// Returns the underlying [`ReservationError`] if reservation fails; the grid
/// is left unchanged in that case (or if `dont_reserve` is set, in which case
/// this never mutates the grid at all).
pub fn find_nearest_safe_tile(
    grid: &mut TileGrid,
    settings: &Settings,
    ctx: FollowContext,
    origin: (TileIndex, Trackdir),
    dont_reserve: bool,
    segment_cache: &SegmentCache,
) -> Result<bool, ReservationError> {
    let destination = Destination::AnySafeTile;
    let problem = TrackProblem {
        grid,
        settings,
        ctx: ctx.clone(),
        destination: &destination,
        origin,
        step_cost: step_cost_for(Transport::Rail),
        segment_cache: Some(segment_cache),
    };
    let result = find_path(&problem, settings.max_search_nodes);
    if !result.path_found {
        return Ok(false);
    }
    if dont_reserve {
        return Ok(true);
    }
    let path = expand_rail_path(grid, &ctx, &reconstruct_path(&result));
    reservation_pass::run(grid, &path)?;
    Ok(true)
}

/// Routes a ship from `start_tile` over the region graph, returning up to
/// `max_returned_path_length` patches (start patch included). This is the
/// coarse region-level route a ship AI follows at a distance, not the exact
/// tile path - see [`crate::water_region_pf`] for that.
#[must_use]
pub fn ship_find_water_region_path(
    grid: &TileGrid,
    map: &RefCell<WaterRegionMap>,
    start_tile: TileIndex,
    end_tile: TileIndex,
    max_returned_path_length: usize,
    max_search_nodes: u32,
) -> Option<Vec<WaterRegionPatchDesc>> {
    let mut path = find_region_path(grid, map, start_tile, end_tile, max_search_nodes)?;
    path.truncate(max_returned_path_length.max(1));
    Some(path)
}

/// Marks the region(s) covering `tile` dirty, forcing a rebuild the next time
/// a ship query visits them.
pub fn invalidate_water_region(grid: &TileGrid, map: &mut WaterRegionMap, tile: TileIndex) {
    map.invalidate_tile(grid, tile);
}

/// Bumps the global track-layout change counter and flushes the rail segment
/// cache.
pub fn notify_track_layout_change(counter: &RailChangeCounter, cache: &trackpath_graph::segment::SegmentCache) {
    counter.bump();
    cache.clear();
}

/// Thin wrapper around [`river::build_river`].
pub fn build_river(
    grid: &TileGrid,
    start_tile: TileIndex,
    end_tile: TileIndex,
    spring_tile: TileIndex,
    main_river: bool,
    settings: &Settings,
    flows_down: impl Fn(TileIndex, TileIndex) -> bool,
    rng: rand::rngs::StdRng,
    make_river: impl FnMut(TileIndex),
    widen: impl FnMut(TileIndex, TileIndex),
) -> bool {
    river::build_river(grid, start_tile, end_tile, spring_tile, main_river, settings, flows_down, rng, make_river, widen)
}

#[cfg(test)]
mod tests {
    use super::*;
    use trackpath_graph::owner::Owner;
    use trackpath_graph::tile::{RailData, RailType, Tile};
    use trackpath_graph::trackdir::Track;

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

    fn destination_at(grid: &TileGrid, x: u32, y: u32) -> Destination {
        Destination::TileOrStation {
            tile: Some(grid.index_of(x, y)),
            accepted_trackdirs: None,
            station_index: None,
            requires_drive_through_if_articulated: false,
            is_articulated: false,
        }
    }

    #[test]
    fn choose_next_track_finds_a_straight_path() {
        let mut grid = straight_rail_grid();
        let settings = Settings::default();
        let destination = destination_at(&grid, 13, 17);
        let query = VehicleQuery {
            transport: Transport::Rail,
            owner: Owner::Company(0),
            compatible_rail_types: Some(TypeMask::single(0)),
            compatible_road_types: None,
            forbid_90_deg: false,
            allow_public_road: false,
            destination,
        };
        let origin = grid.index_of(10, 20);
        let cache = SegmentCache::new();
        let result = choose_next_track(&mut grid, &query, &settings, origin, Trackdir::SwNe, false, &cache);
        assert!(result.path_found);
        assert_eq!(result.chosen_trackdir, Some(Trackdir::SwNe));
        assert_eq!(result.target, Some((grid.index_of(13, 17), Trackdir::SwNe)));
    }

    #[test]
    fn choose_next_track_with_reservation_claims_the_path() {
        let mut grid = straight_rail_grid();
        let settings = Settings::default();
        let destination = destination_at(&grid, 13, 17);
        let query = VehicleQuery {
            transport: Transport::Rail,
            owner: Owner::Company(0),
            compatible_rail_types: Some(TypeMask::single(0)),
            compatible_road_types: None,
            forbid_90_deg: false,
            allow_public_road: false,
            destination,
        };
        let origin = grid.index_of(10, 20);
        let cache = SegmentCache::new();
        let result = choose_next_track(&mut grid, &query, &settings, origin, Trackdir::SwNe, true, &cache);
        assert!(result.path_found);
        assert!(matches!(result.reservation, Some(Ok(_))));
    }

    #[test]
    fn check_reverse_prefers_the_reversed_direction_when_closer() {
        let grid = straight_rail_grid();
        let settings = Settings::default();
        let ctx = FollowContext {
            transport: Transport::Rail,
            owner: Owner::Company(0),
            compatible_rail_types: Some(TypeMask::single(0)),
            compatible_road_types: None,
            forbid_90_deg: false,
            reservation_aware: false,
            allow_public_road: false,
        };
        let destination = destination_at(&grid, 10, 20);
        let forward = (grid.index_of(10, 20), Trackdir::SwNe);
        let reversed = (grid.index_of(10, 20), Trackdir::NeSw);
        let cache = SegmentCache::new();
        assert!(!check_reverse(&grid, &settings, Transport::Rail, ctx, &destination, forward, reversed, 500, &cache));
    }

    #[test]
    fn choose_next_track_warms_the_segment_cache_on_a_safe_tile_destination() {
        let mut grid = straight_rail_grid();
        // Reserve every tile but the last so `AnySafeTile` can't be
        // satisfied until the far end, forcing the whole run to be walked
        // (and cached) as one segment instead of trivially matching at the
        // origin.
        for (x, y) in [(10, 20), (11, 19), (12, 18)] {
            let idx = grid.index_of(x, y);
            if let TileType::Rail(d) = &mut grid.get_mut(idx).tile_type {
                d.reserved.insert(Track::X);
            }
        }
        let settings = Settings::default();
        let query = VehicleQuery {
            transport: Transport::Rail,
            owner: Owner::Company(0),
            compatible_rail_types: Some(TypeMask::single(0)),
            compatible_road_types: None,
            forbid_90_deg: false,
            allow_public_road: false,
            destination: Destination::AnySafeTile,
        };
        let origin = grid.index_of(10, 20);
        let cache = SegmentCache::new();
        assert_eq!(cache.len(), 0);

        let first = choose_next_track(&mut grid, &query, &settings, origin, Trackdir::SwNe, false, &cache);
        assert!(first.path_found);
        assert_eq!(first.target, Some((grid.index_of(13, 17), Trackdir::SwNe)));
        assert!(cache.len() > 0);
        let misses_after_first = cache.misses();

        let second = choose_next_track(&mut grid, &query, &settings, origin, Trackdir::SwNe, false, &cache);
        assert!(second.path_found);
        assert_eq!(second.target, first.target);
        // The second query re-enters the exact same straight run from the
        // same origin: it's served entirely from the cache, no new misses.
        assert_eq!(cache.misses(), misses_after_first);
        assert!(cache.hits() > 0);
    }

    #[test]
    fn expand_rail_path_fills_in_every_tile_a_segment_jump_skipped() {
        // Mimics what a multi-tile `rail_segment_successors` jump hands
        // `reconstruct_path`: only the jump's two endpoints, four tiles
        // apart on a straight run. Downstream consumers (the reservation
        // pass) need every tile in between, not just the decision points.
        let grid = straight_rail_grid();
        let ctx = FollowContext {
            transport: Transport::Rail,
            owner: Owner::Company(0),
            compatible_rail_types: Some(TypeMask::single(0)),
            compatible_road_types: None,
            forbid_90_deg: false,
            reservation_aware: false,
            allow_public_road: false,
        };
        let waypoints = [
            (grid.index_of(10, 20), Trackdir::SwNe),
            (grid.index_of(13, 17), Trackdir::SwNe),
        ];
        let expanded = expand_rail_path(&grid, &ctx, &waypoints);
        let expected: Vec<(TileIndex, Trackdir)> = [(10, 20), (11, 19), (12, 18), (13, 17)]
            .into_iter()
            .map(|(x, y)| (grid.index_of(x, y), Trackdir::SwNe))
            .collect();
        assert_eq!(expanded, expected);
    }

    #[test]
    fn expand_rail_path_is_a_no_op_on_an_already_tile_by_tile_path() {
        let grid = straight_rail_grid();
        let ctx = FollowContext {
            transport: Transport::Rail,
            owner: Owner::Company(0),
            compatible_rail_types: Some(TypeMask::single(0)),
            compatible_road_types: None,
            forbid_90_deg: false,
            reservation_aware: false,
            allow_public_road: false,
        };
        let waypoints: Vec<(TileIndex, Trackdir)> = [(10, 20), (11, 19), (12, 18), (13, 17)]
            .into_iter()
            .map(|(x, y)| (grid.index_of(x, y), Trackdir::SwNe))
            .collect();
        assert_eq!(expand_rail_path(&grid, &ctx, &waypoints), waypoints);
    }
}
