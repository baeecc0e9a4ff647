//! Rail cost model: transition costs, per-tile costs and signal handling.
//!
//! Grounded directly in `yapf_costrail.hpp`'s `SlopeCost`/`CurveCost`/
//! `SwitchCost`/`SignalCost` functions.

use trackpath_graph::settings::Settings;
use trackpath_graph::tile::{Signal, SignalType};
use trackpath_graph::trackdir::Trackdir;
use trackpath_graph::{TILE_CORNER_LENGTH, TILE_LENGTH};

/// Mode-specific per-node state the rail A* payload carries: signals-passed
/// counter, `last_signal_was_red`, `last_signal_type`, `target_seen`,
/// `choice_seen`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SignalState {
    pub num_signals_passed: u32,
    pub last_signal_was_red: bool,
    pub last_signal_type: Option<SignalType>,
    pub choice_seen: bool,
    pub target_seen: bool,
}

/// Base per-tile length: diagonal trackdirs cost [`TILE_LENGTH`], the four
/// corner pieces cost [`TILE_CORNER_LENGTH`].
#[must_use]
pub fn base_tile_cost(trackdir: Trackdir) -> i32 {
    if trackdir.is_diagonal() {
        TILE_LENGTH
    } else {
        TILE_CORNER_LENGTH
    }
}

/// Curve penalty for the transition `prev -> next` (90 degree crossing vs.
/// 45 degree corner vs. no turn at all).
#[must_use]
pub fn curve_cost(settings: &Settings, prev: Trackdir, next: Trackdir) -> i32 {
    if prev.crosses(next) {
        settings.rail_curve90_penalty
    } else if prev.track() != next.track() {
        settings.rail_curve45_penalty
    } else {
        0
    }
}

/// Doubleslip junction penalty: applied whenever the tile being entered
/// offers more than one reachable trackdir sharing the entry face with
/// `next` (a genuine junction choice), independent of curve cost.
#[must_use]
pub const fn doubleslip_cost(settings: &Settings, is_doubleslip: bool) -> i32 {
    if is_doubleslip {
        settings.rail_doubleslip_penalty
    } else {
        0
    }
}

#[must_use]
pub const fn slope_cost(settings: &Settings, is_uphill: bool) -> i32 {
    if is_uphill {
        settings.rail_slope_penalty
    } else {
        0
    }
}

#[must_use]
pub const fn crossing_cost(settings: &Settings, is_level_crossing: bool) -> i32 {
    if is_level_crossing {
        settings.rail_crossing_penalty
    } else {
        0
    }
}

/// The i-th look-ahead term: `p0 + i*(p1 + i*p2)`.
#[must_use]
pub fn look_ahead_term(settings: &Settings, i: u32) -> i32 {
    let i = i32::try_from(i).unwrap_or(i32::MAX);
    settings.rail_look_ahead_signal_p0 + i * (settings.rail_look_ahead_signal_p1 + i * settings.rail_look_ahead_signal_p2)
}

/// Result of walking past one signal: the cost delta to apply, and whether
/// the branch must be pruned (first signal seen is two-way and red, and the
/// node is past a junction choice).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SignalOutcome {
    pub cost: i32,
    pub prune: bool,
}

/// Applies one signal to `state`, returning the cost delta (and whether the
/// branch should be pruned), per `yapf_costrail.hpp`'s `SignalCost`.
///
/// PBS signals never set `last_signal_was_red`/`last_signal_type` — their
/// effect is entirely deferred to the reservation pass.
pub fn signal_cost(settings: &Settings, state: &mut SignalState, signal: Signal) -> SignalOutcome {
    if signal.signal_type.is_pbs() {
        return SignalOutcome { cost: 0, prune: false };
    }

    let is_first = state.num_signals_passed == 0;
    let mut cost = 0;

    if is_first && signal.red {
        cost += if matches!(signal.signal_type, SignalType::Exit | SignalType::Combo) {
            settings.rail_firstred_exit_penalty
        } else {
            settings.rail_firstred_penalty
        };
        if signal.two_way && state.choice_seen {
            return SignalOutcome { cost, prune: true };
        }
    }

    if state.num_signals_passed < settings.rail_look_ahead_max_signals {
        let term = look_ahead_term(settings, state.num_signals_passed);
        cost += if signal.red { term } else { -term };
    }

    state.num_signals_passed += 1;
    state.last_signal_was_red = signal.red;
    state.last_signal_type = Some(signal.signal_type);

    SignalOutcome { cost, prune: false }
}

/// Terminal bonus/penalty applied when the segment ends at the destination:
/// a red last signal costs extra, scaled by its type.
#[must_use]
pub fn target_hit_bonus(settings: &Settings, state: &SignalState) -> i32 {
    if !state.last_signal_was_red {
        return 0;
    }
    match state.last_signal_type {
        Some(SignalType::Exit | SignalType::Combo) => settings.rail_lastred_exit_penalty,
        _ => settings.rail_lastred_penalty,
    }
}

/// Platform-length mismatch penalty: too short needs a flat penalty plus a
/// per-missing-tile charge; too long likewise.
#[must_use]
pub fn platform_length_penalty(settings: &Settings, vehicle_length: u16, platform_length: u16) -> i32 {
    if vehicle_length > platform_length {
        let missing = i32::from(vehicle_length - platform_length);
        settings.rail_shorter_platform_penalty + missing * settings.rail_shorter_platform_per_tile_penalty
    } else if platform_length > vehicle_length {
        let excess = i32::from(platform_length - vehicle_length);
        settings.rail_longer_platform_penalty + excess * settings.rail_longer_platform_per_tile_penalty
    } else {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diagonal_and_corner_costs_differ() {
        assert_eq!(base_tile_cost(Trackdir::NeSw), TILE_LENGTH);
        assert_eq!(base_tile_cost(Trackdir::NwNe), TILE_CORNER_LENGTH);
    }

    #[test]
    fn curve_cost_picks_the_right_tier() {
        let settings = Settings::default();
        assert_eq!(curve_cost(&settings, Trackdir::NeSw, Trackdir::SwNe), 0);
        assert_eq!(curve_cost(&settings, Trackdir::NeSw, Trackdir::NwSe), settings.rail_curve90_penalty);
        assert_eq!(curve_cost(&settings, Trackdir::SwNe, Trackdir::NwNe), settings.rail_curve45_penalty);
    }

    #[test]
    fn first_red_two_way_after_choice_prunes() {
        let settings = Settings::default();
        let mut state = SignalState { choice_seen: true, ..Default::default() };
        let outcome = signal_cost(
            &settings,
            &mut state,
            Signal { signal_type: SignalType::Normal, red: true, two_way: true },
        );
        assert!(outcome.prune);
    }

    #[test]
    fn look_ahead_stops_accumulating_past_the_limit() {
        let mut settings = Settings::default();
        settings.rail_look_ahead_max_signals = 1;
        let mut state = SignalState::default();
        let first = signal_cost(&settings, &mut state, Signal { signal_type: SignalType::Normal, red: false, two_way: false });
        let second = signal_cost(&settings, &mut state, Signal { signal_type: SignalType::Normal, red: false, two_way: false });
        assert_ne!(first.cost, 0);
        assert_eq!(second.cost, 0);
    }

    #[test]
    fn pbs_signals_never_set_last_red_state() {
        let settings = Settings::default();
        let mut state = SignalState::default();
        signal_cost(&settings, &mut state, Signal { signal_type: SignalType::Pbs, red: true, two_way: false });
        assert!(!state.last_signal_was_red);
        assert_eq!(target_hit_bonus(&settings, &state), 0);
    }

    #[test]
    fn platform_too_short_charges_per_missing_tile() {
        let settings = Settings::default();
        let penalty = platform_length_penalty(&settings, 5, 3);
        assert_eq!(
            penalty,
            settings.rail_shorter_platform_penalty + 2 * settings.rail_shorter_platform_per_tile_penalty
        );
    }
}
