//! Order validation.
//!
//! Checks a submitted order against the board before resolution. A rejected
//! order is never fatal: the resolvers downgrade it (an implicit hold in the
//! movement phase) and report the `Rejection`. An order that references a unit
//! missing from the board is a caller error and surfaces as
//! `AdjudicationError`.

pub mod adjustment;
pub mod movement;
pub mod retreat;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::board::{AdjacencyGraph, BoardState, Order, OrderUnit, Power, ProvinceId, Unit};
use crate::error::AdjudicationError;

/// Why a submitted order was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rejection {
    /// The unit belongs to another power.
    WrongPower,
    /// The order names an army where a fleet stands, or vice versa.
    WrongUnitType,
    /// The order kind is not allowed in the current phase.
    WrongPhase,
    NotAdjacent,
    /// The unit type cannot stand in the destination.
    IllegalTerrain,
    /// A fleet move to a split-coast province reachable on several coasts.
    CoastRequired,
    /// The named coast does not exist or cannot be reached.
    InvalidCoast,
    /// Fleets cannot be convoyed.
    FleetConvoy,
    SupportedUnitMissing,
    /// A unit cannot support itself or a move into its own province.
    SelfSupport,
    NotAFleet,
    ConvoyerNotAtSea,
    NoArmyToConvoy,
    InvalidRetreat,
    NotHomeCenter,
    CenterNotOwned,
    ProvinceOccupied,
    NoBuildsAvailable,
    NoDestroysRequired,
}

/// The outcome of validating one order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// The order is legal. Carries the normalized order: inferred fleet
    /// coasts filled in, army coasts cleared, convoy routing made explicit.
    Legal(Order),
    Rejected(Rejection),
}

impl Verdict {
    pub fn is_legal(&self) -> bool {
        matches!(self, Verdict::Legal(_))
    }
}

/// Validates an order issued by `power` against the current board.
///
/// Checks run in order: the referenced unit exists and belongs to `power`
/// with the stated type, the order kind fits the current phase, then the
/// phase-specific geometry.
pub fn validate(
    order: &Order,
    power: Power,
    state: &BoardState,
    map: &AdjacencyGraph,
) -> Result<Verdict, AdjudicationError> {
    let verdict = match check(order, power, state, map)? {
        Err(rejection) => Verdict::Rejected(rejection),
        Ok(normalized) => Verdict::Legal(normalized),
    };
    if let Verdict::Rejected(rejection) = verdict {
        warn!(%power, ?order, ?rejection, "order rejected");
    }
    Ok(verdict)
}

fn check(
    order: &Order,
    power: Power,
    state: &BoardState,
    map: &AdjacencyGraph,
) -> Result<Result<Order, Rejection>, AdjudicationError> {
    for province in referenced_provinces(order) {
        if map.get(province).is_none() {
            return Err(AdjudicationError::UnknownProvince(province.0));
        }
    }

    match order {
        Order::Hold { unit }
        | Order::Move { unit, .. }
        | Order::SupportHold { unit, .. }
        | Order::SupportMove { unit, .. }
        | Order::Convoy { unit, .. }
        | Order::Destroy { unit } => {
            let found = state
                .unit_at(unit.province())
                .ok_or_else(|| unit_not_found(unit, map, "movement or destroy order"))?;
            if let Err(r) = check_owner(found, unit, power) {
                return Ok(Err(r));
            }
        }
        Order::Retreat { unit, .. } | Order::Disband { unit } => {
            let found = state
                .dislodged_at(unit.province())
                .ok_or_else(|| unit_not_found(unit, map, "retreat order"))?;
            if let Err(r) = check_owner(&found.unit, unit, power) {
                return Ok(Err(r));
            }
        }
        Order::Build { .. } | Order::Waive => {}
    }

    if order.phase() != state.phase {
        return Ok(Err(Rejection::WrongPhase));
    }

    Ok(match order {
        Order::Hold { .. }
        | Order::Move { .. }
        | Order::SupportHold { .. }
        | Order::SupportMove { .. }
        | Order::Convoy { .. } => movement::check(order, state, map),
        Order::Retreat { .. } | Order::Disband { .. } => retreat::check(order, state),
        Order::Build { .. } | Order::Destroy { .. } | Order::Waive => {
            adjustment::check(order, power, state, map)
        }
    })
}

fn check_owner(found: &Unit, referenced: &OrderUnit, power: Power) -> Result<(), Rejection> {
    if found.power != power {
        return Err(Rejection::WrongPower);
    }
    if found.unit_type != referenced.unit_type {
        return Err(Rejection::WrongUnitType);
    }
    Ok(())
}

fn unit_not_found(unit: &OrderUnit, map: &AdjacencyGraph, context: &'static str) -> AdjudicationError {
    AdjudicationError::UnitNotFound {
        id: unit.province(),
        abbr: map.abbr(unit.province()).to_string(),
        context,
    }
}

/// Every province an order mentions.
fn referenced_provinces(order: &Order) -> Vec<ProvinceId> {
    match order {
        Order::Hold { unit }
        | Order::Disband { unit }
        | Order::Build { unit }
        | Order::Destroy { unit } => vec![unit.province()],
        Order::Move { unit, dest, .. } | Order::Retreat { unit, dest } => {
            vec![unit.province(), dest.province]
        }
        Order::SupportHold { unit, supported } => vec![unit.province(), supported.province()],
        Order::SupportMove {
            unit,
            supported,
            dest,
        } => vec![unit.province(), supported.province(), dest.province],
        Order::Convoy {
            unit,
            convoyed_from,
            convoyed_to,
        } => vec![unit.province(), convoyed_from.province, convoyed_to.province],
        Order::Waive => Vec::new(),
    }
}
