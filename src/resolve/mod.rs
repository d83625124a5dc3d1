//! Order resolution.
//!
//! Each phase has its own resolver: `movement` (with `convoy` routing and
//! `cycle` detection), `retreat` and `adjustment`. Resolvers never mutate the
//! board; the matching `apply_*` function commits a report to the state.

pub mod adjustment;
pub mod convoy;
pub mod cycle;
pub mod movement;
pub mod phase;
pub mod retreat;

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::board::{AdjacencyGraph, BoardState, Order, Power, ProvinceId};
use crate::error::AdjudicationError;
use crate::validate::{validate, Rejection, Verdict};

pub use adjustment::{apply_adjustments, civil_disorder, resolve_adjustments, AdjustmentReport};
pub use movement::{apply_movement, resolve_movement, MovementReport};
pub use retreat::{apply_retreats, resolve_retreats, valid_retreats, RetreatReport};

/// Why an order did not succeed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Reason {
    /// Lost a standoff, or failed to beat the defender.
    Bounced,
    /// Support cut by an attack or by dislodgement.
    Cut,
    /// Every convoy chain for the move lost a fleet, or a paradox was broken.
    ConvoyDisrupted,
    /// No chain of convoy orders connects origin and destination.
    NoConvoyPath,
    /// The move would have dislodged a unit of the same power.
    SelfDislodgementBlocked,
    Dislodged,
    Invalid(Rejection),
    /// A later order for the same unit replaced this one.
    Superseded,
    /// A support or convoy whose counterpart was not ordered.
    Unmatched,
    /// A dislodged unit without a usable retreat.
    ForcedDisband,
    /// More builds or destroys than the power's adjustment quota allows.
    QuotaExceeded,
}

/// The outcome of resolving an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderResult {
    Succeeded,
    Failed(Reason),
}

impl OrderResult {
    pub fn is_success(self) -> bool {
        matches!(self, OrderResult::Succeeded)
    }

    pub fn reason(self) -> Option<Reason> {
        match self {
            OrderResult::Succeeded => None,
            OrderResult::Failed(reason) => Some(reason),
        }
    }
}

/// A resolved order paired with its result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedOrder {
    pub order: Order,
    pub power: Power,
    pub result: OrderResult,
}

/// The legal orders of a phase after validation and deduplication.
pub(crate) struct Submissions {
    /// Legal orders in submission order, grouped by power.
    pub accepted: Vec<(Power, Order)>,
    /// Rejected and superseded submissions.
    pub rejected: Vec<ResolvedOrder>,
}

impl Submissions {
    /// Returns the accepted orders keyed by the ordered unit's province.
    pub fn by_province(&self) -> HashMap<ProvinceId, (Power, Order)> {
        self.accepted
            .iter()
            .filter_map(|(power, order)| order.province().map(|p| (p, (*power, *order))))
            .collect()
    }
}

/// Rejects a board that refers to provinces outside the map.
///
/// Boards restored from JSON are not tied to a map, so every resolver runs
/// this before touching adjacency data.
pub(crate) fn check_board(
    state: &BoardState,
    map: &AdjacencyGraph,
) -> Result<(), AdjudicationError> {
    match state.provinces().find(|&id| map.get(id).is_none()) {
        Some(id) => Err(AdjudicationError::UnknownProvince(id.0)),
        None => Ok(()),
    }
}

/// Validates a phase's submissions.
///
/// When a power orders the same unit more than once the last order wins;
/// earlier ones are reported as `Superseded`. Orders are grouped by power
/// first, so the outcome does not depend on how powers were interleaved.
pub(crate) fn collect_orders(
    orders: &[(Order, Power)],
    state: &BoardState,
    map: &AdjacencyGraph,
) -> Result<Submissions, AdjudicationError> {
    let mut sorted: Vec<&(Order, Power)> = orders.iter().collect();
    sorted.sort_by_key(|(_, power)| *power);

    let mut last: HashMap<(Power, ProvinceId), usize> = HashMap::new();
    for (i, (order, power)) in sorted.iter().enumerate() {
        if let Some(province) = order.province() {
            last.insert((*power, province), i);
        }
    }

    let mut accepted = Vec::new();
    let mut rejected = Vec::new();
    for (i, &&(order, power)) in sorted.iter().enumerate() {
        let superseded = order
            .province()
            .is_some_and(|p| last.get(&(power, p)) != Some(&i));
        if superseded {
            rejected.push(ResolvedOrder {
                order,
                power,
                result: OrderResult::Failed(Reason::Superseded),
            });
            continue;
        }
        match validate(&order, power, state, map)? {
            Verdict::Legal(normalized) => accepted.push((power, normalized)),
            Verdict::Rejected(rejection) => rejected.push(ResolvedOrder {
                order,
                power,
                result: OrderResult::Failed(Reason::Invalid(rejection)),
            }),
        }
    }
    rejected.sort_by_key(|r| (r.order.province(), r.power));

    Ok(Submissions { accepted, rejected })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{Location, OrderUnit, Phase, Season, Unit};

    fn p(abbr: &str) -> ProvinceId {
        AdjacencyGraph::standard().province(abbr).unwrap()
    }

    #[test]
    fn last_order_for_a_unit_wins() {
        let mut state = BoardState::empty(1901, Season::Spring, Phase::Movement);
        state.place_unit(Unit::army(Power::Austria, p("vie")));
        let first = Order::move_to(OrderUnit::army(p("vie")), Location::new(p("bud")));
        let second = Order::move_to(OrderUnit::army(p("vie")), Location::new(p("gal")));
        let orders = vec![(first, Power::Austria), (second, Power::Austria)];

        let subs = collect_orders(&orders, &state, AdjacencyGraph::standard()).unwrap();
        assert_eq!(subs.accepted, vec![(Power::Austria, second)]);
        assert_eq!(subs.rejected.len(), 1);
        assert_eq!(subs.rejected[0].order, first);
        assert_eq!(subs.rejected[0].result, OrderResult::Failed(Reason::Superseded));
    }

    #[test]
    fn foreign_order_does_not_supersede_owner() {
        let mut state = BoardState::empty(1901, Season::Spring, Phase::Movement);
        state.place_unit(Unit::army(Power::Austria, p("vie")));
        let own = Order::move_to(OrderUnit::army(p("vie")), Location::new(p("bud")));
        let foreign = Order::Hold {
            unit: OrderUnit::army(p("vie")),
        };
        let orders = vec![(own, Power::Austria), (foreign, Power::Russia)];

        let subs = collect_orders(&orders, &state, AdjacencyGraph::standard()).unwrap();
        assert_eq!(subs.accepted, vec![(Power::Austria, own)]);
        assert_eq!(
            subs.rejected[0].result,
            OrderResult::Failed(Reason::Invalid(Rejection::WrongPower))
        );
    }

    #[test]
    fn board_with_foreign_province_is_rejected() {
        let map = AdjacencyGraph::standard();
        let mut state = BoardState::empty(1901, Season::Spring, Phase::Movement);
        state.place_unit(Unit::army(Power::Italy, p("rom")));
        assert!(check_board(&state, map).is_ok());

        state.set_standoffs([ProvinceId(240)]);
        assert!(matches!(
            check_board(&state, map),
            Err(AdjudicationError::UnknownProvince(240))
        ));
    }
}
