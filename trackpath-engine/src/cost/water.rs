//! Ship cost model.

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

/// Aqueduct skip cost: `TILE_LENGTH` per tile the wormhole crossed.
#[must_use]
pub fn aqueduct_cost(tiles_skipped: u32) -> i32 {
    i32::try_from(tiles_skipped).unwrap_or(i32::MAX).saturating_mul(TILE_LENGTH)
}

/// Canal-vs-ocean speed scaling: `tile_cost * (1 + tiles_skipped) *
/// speed_frac / (256 - speed_frac)`. `speed_frac` is 0..256, the fraction
/// of full speed this stretch of water allows (canals are slower).
#[must_use]
pub fn speed_scaled_cost(tile_cost: i32, tiles_skipped: u32, speed_frac: u16) -> i32 {
    if speed_frac == 0 || speed_frac >= 256 {
        return tile_cost;
    }
    let factor = (1 + i64::from(tiles_skipped)) * i64::from(speed_frac) / i64::from(256 - speed_frac);
    let extra = i64::from(tile_cost) * factor;
    i32::try_from(i64::from(tile_cost) + extra).unwrap_or(i32::MAX)
}

#[must_use]
pub const fn curve_cost(settings: &Settings, is_curve: bool) -> i32 {
    if is_curve {
        settings.water_curve_penalty
    } else {
        0
    }
}

#[must_use]
pub const fn buoy_cost(settings: &Settings, passes_buoy: bool) -> i32 {
    if passes_buoy {
        settings.water_buoy_penalty
    } else {
        0
    }
}
