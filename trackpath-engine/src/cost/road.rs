//! Road cost model: no segment cache, walked one tile at a time.
//!
//! Grounded in `yapf_road.cpp`'s per-tile cost accumulation.

use trackpath_graph::settings::Settings;
use trackpath_graph::trackdir::Trackdir;
use trackpath_graph::{TILE_CORNER_LENGTH, TILE_LENGTH};

#[must_use]
pub fn base_tile_cost(trackdir: Trackdir) -> i32 {
    if trackdir.is_diagonal() {
        TILE_LENGTH
    } else {
        TILE_CORNER_LENGTH
    }
}

#[must_use]
pub fn curve_cost(settings: &Settings, prev: Trackdir, next: Trackdir) -> i32 {
    if prev.track() == next.track() {
        0
    } else {
        settings.road_curve_penalty
    }
}

#[must_use]
pub const fn slope_cost(settings: &Settings, is_uphill: bool) -> i32 {
    if is_uphill {
        settings.road_slope_penalty
    } else {
        0
    }
}

#[must_use]
pub const fn crossing_cost(settings: &Settings, is_level_crossing: bool) -> i32 {
    if is_level_crossing {
        settings.road_crossing_penalty
    } else {
        0
    }
}

/// Occupancy-scaled cost of a drive-through road stop: the base penalty
/// scaled up by how long the queue already waiting there is.
#[must_use]
pub fn drive_through_stop_cost(settings: &Settings, queue_length: u16) -> i32 {
    settings.road_stop_penalty + i32::from(queue_length) * settings.road_stop_occupied_penalty
}

/// Bay stop occupancy cost: simpler, a single "is it occupied" charge
/// rather than a queue-scaled one (bays hold one vehicle at a time).
#[must_use]
pub const fn bay_stop_cost(settings: &Settings, occupied: bool) -> i32 {
    settings.road_stop_penalty + if occupied { settings.road_stop_bay_occupied_penalty } else { 0 }
}

/// Speed-mismatch penalty for crossing a bridge or rail-type-restricted
/// tile slower than the vehicle's max speed:
/// `TILE_LENGTH * (max_speed - segment_speed) * (4 + tiles_skipped) / max_speed`.
#[must_use]
pub fn speed_penalty(max_veh_speed: u32, segment_speed: u32, tiles_skipped: u32) -> i32 {
    if segment_speed >= max_veh_speed || max_veh_speed == 0 {
        return 0;
    }
    let numerator = i64::from(TILE_LENGTH) * i64::from(max_veh_speed - segment_speed) * i64::from(4 + tiles_skipped);
    let cost = numerator / i64::from(max_veh_speed);
    i32::try_from(cost).unwrap_or(i32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_speed_penalty_when_segment_is_fast_enough() {
        assert_eq!(speed_penalty(100, 100, 0), 0);
        assert_eq!(speed_penalty(100, 120, 0), 0);
    }

    #[test]
    fn slower_segment_costs_more_with_more_tiles_skipped() {
        let short = speed_penalty(100, 50, 0);
        let long = speed_penalty(100, 50, 10);
        assert!(long > short);
    }

    #[test]
    fn drive_through_cost_scales_with_queue() {
        let settings = Settings::default();
        let empty = drive_through_stop_cost(&settings, 0);
        let busy = drive_through_stop_cost(&settings, 5);
        assert!(busy > empty);
    }
}
