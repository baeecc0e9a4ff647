//! Tunable costs and search limits.

/// All tunables a query can override, grouped by the cost model they feed.
///
/// Every field is a non-negative integer penalty in the same units as
/// [`crate::TILE_LENGTH`], a boolean flag, or (for `river_route_random`) a
/// random-range bound, matching the recognized settings list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Settings {
    pub rail_slope_penalty: i32,
    pub rail_curve45_penalty: i32,
    pub rail_curve90_penalty: i32,
    pub rail_crossing_penalty: i32,
    pub rail_doubleslip_penalty: i32,

    pub rail_firstred_penalty: i32,
    pub rail_firstred_exit_penalty: i32,
    pub rail_lastred_penalty: i32,
    pub rail_lastred_exit_penalty: i32,

    pub rail_station_penalty: i32,
    pub rail_pbs_station_penalty: i32,
    pub rail_pbs_cross_penalty: i32,
    pub rail_pbs_signal_back_penalty: i32,

    pub rail_look_ahead_max_signals: u32,
    pub rail_look_ahead_signal_p0: i32,
    pub rail_look_ahead_signal_p1: i32,
    pub rail_look_ahead_signal_p2: i32,

    pub rail_longer_platform_penalty: i32,
    pub rail_longer_platform_per_tile_penalty: i32,
    pub rail_shorter_platform_penalty: i32,
    pub rail_shorter_platform_per_tile_penalty: i32,

    pub rail_depot_reverse_penalty: i32,

    pub road_slope_penalty: i32,
    pub road_curve_penalty: i32,
    pub road_crossing_penalty: i32,
    pub road_stop_penalty: i32,
    pub road_stop_bay_occupied_penalty: i32,
    pub road_stop_occupied_penalty: i32,

    pub water_curve_penalty: i32,
    pub water_buoy_penalty: i32,

    pub forbid_90_deg: bool,
    pub disable_node_optimization: bool,

    pub max_search_nodes: u32,
    pub river_route_random: i32,
    /// Map-generation tunable feeding the main-river widening schedule: a
    /// river widens once it has travelled `min_river_length * 4 / 3` tiles
    /// from its spring, up to a 3-tile diameter cap.
    pub min_river_length: u32,
}

impl Default for Settings {
    /// Defaults chosen to mirror the reference engine's out-of-the-box
    /// balance: curves and slopes mildly discourage detours, signals apply
    /// the look-ahead scheme described in the rail cost model, and
    /// `max_search_nodes` matches [`crate::AYSTAR_DEF_MAX_SEARCH_NODES`].
    fn default() -> Self {
        Self {
            rail_slope_penalty: 200,
            rail_curve45_penalty: 3,
            rail_curve90_penalty: 6,
            rail_crossing_penalty: 3,
            rail_doubleslip_penalty: 1,

            rail_firstred_penalty: 10,
            rail_firstred_exit_penalty: 100,
            rail_lastred_penalty: 10,
            rail_lastred_exit_penalty: 100,

            rail_station_penalty: 8,
            rail_pbs_station_penalty: 8,
            rail_pbs_cross_penalty: 3,
            rail_pbs_signal_back_penalty: 15,

            rail_look_ahead_max_signals: 10,
            rail_look_ahead_signal_p0: 500,
            rail_look_ahead_signal_p1: -100,
            rail_look_ahead_signal_p2: 5,

            rail_longer_platform_penalty: 8,
            rail_longer_platform_per_tile_penalty: 0,
            rail_shorter_platform_penalty: 20,
            rail_shorter_platform_per_tile_penalty: 2,

            rail_depot_reverse_penalty: 50,

            road_slope_penalty: 2,
            road_curve_penalty: 1,
            road_crossing_penalty: 3,
            road_stop_penalty: 8,
            road_stop_bay_occupied_penalty: 2,
            road_stop_occupied_penalty: 2,

            water_curve_penalty: 1,
            water_buoy_penalty: 2,

            forbid_90_deg: false,
            disable_node_optimization: false,

            max_search_nodes: crate::AYSTAR_DEF_MAX_SEARCH_NODES,
            river_route_random: 5,
            min_river_length: 16,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_non_negative_where_required() {
        let s = Settings::default();
        assert!(s.rail_slope_penalty >= 0);
        assert!(s.rail_look_ahead_max_signals > 0);
        assert_eq!(s.max_search_nodes, crate::AYSTAR_DEF_MAX_SEARCH_NODES);
    }
}
