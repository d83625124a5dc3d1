//! Phase sequencing logic.
//!
//! Determines the next phase in the game year and advances the board state
//! accordingly.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::board::{AdjacencyGraph, BoardState, Phase, Power, ProvinceId, Season, ALL_POWERS};
use crate::validate::adjustment::quota;

/// A supply center that changed hands at the end of a year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CenterChange {
    pub province: ProvinceId,
    pub from: Option<Power>,
    pub to: Power,
}

/// Computes the next (season, phase) after the current phase resolves.
///
/// Phase flow:
/// - Spring Movement -> Spring Retreat (if dislodged) OR Fall Movement
/// - Spring Retreat  -> Fall Movement
/// - Fall Movement   -> Fall Retreat (if dislodged) OR Fall Adjustment
/// - Fall Retreat    -> Fall Adjustment
/// - Fall Adjustment -> Spring Movement (next year)
///
/// The adjustment phase is skipped when no power needs one.
pub fn next_phase(
    season: Season,
    phase: Phase,
    has_dislodgements: bool,
    needs_adjustment: bool,
) -> (Season, Phase) {
    match (season, phase) {
        (_, Phase::Movement) if has_dislodgements => (season, Phase::Retreat),
        (Season::Spring, _) => (Season::Fall, Phase::Movement),
        (Season::Fall, Phase::Movement | Phase::Retreat) if needs_adjustment => {
            (Season::Fall, Phase::Adjustment)
        }
        (Season::Fall, _) => (Season::Spring, Phase::Movement),
    }
}

/// Returns true if any power has a unit/center mismatch.
pub fn needs_adjustment(state: &BoardState) -> bool {
    ALL_POWERS.iter().any(|&power| quota(power, state) != 0)
}

/// Transfers each occupied supply center to the occupying power.
///
/// Unoccupied centers keep their owner. Returns the centers that changed
/// hands, in province order.
pub fn update_sc_ownership(state: &mut BoardState, map: &AdjacencyGraph) -> Vec<CenterChange> {
    let mut changes = Vec::new();
    for province in map.supply_centers() {
        let Some(occupant) = state.unit_at(province).map(|u| u.power) else {
            continue;
        };
        let from = state.sc_owner(province);
        if from != Some(occupant) {
            state.set_sc_owner(province, Some(occupant));
            changes.push(CenterChange {
                province,
                from,
                to: occupant,
            });
        }
    }
    changes
}

/// Advances the board state to the next phase.
///
/// Supply-center ownership is updated when the Fall turn ends (after Fall
/// movement with no retreats, or after the Fall retreat). The year is
/// incremented when entering Spring, and dislodged units are cleared unless
/// a retreat phase follows.
pub fn advance_state(
    state: &mut BoardState,
    has_dislodgements: bool,
    map: &AdjacencyGraph,
) -> Vec<CenterChange> {
    let ends_fall_turn = state.season == Season::Fall
        && match state.phase {
            Phase::Movement => !has_dislodgements,
            Phase::Retreat => true,
            Phase::Adjustment => false,
        };
    let changes = if ends_fall_turn {
        update_sc_ownership(state, map)
    } else {
        Vec::new()
    };

    let (season, phase) = next_phase(
        state.season,
        state.phase,
        has_dislodgements,
        needs_adjustment(state),
    );
    if season == Season::Spring && state.season == Season::Fall {
        state.year += 1;
    }
    debug!(from = ?(state.season, state.phase), to = ?(season, phase), year = state.year, "phase advanced");
    state.season = season;
    state.phase = phase;

    if phase != Phase::Retreat {
        state.clear_dislodged();
    }
    changes
}

/// Returns true if `power` has neither units nor supply centers.
///
/// A unit waiting to retreat still counts.
pub fn is_eliminated(power: Power, state: &BoardState) -> bool {
    state.unit_count(power) == 0
        && state.center_count(power) == 0
        && !state.dislodged().any(|d| d.unit.power == power)
}

/// Returns the power holding at least `victory_centers` supply centers.
pub fn solo_winner(state: &BoardState, victory_centers: usize) -> Option<Power> {
    ALL_POWERS
        .iter()
        .copied()
        .find(|&power| state.center_count(power) >= victory_centers)
}
