//! Retreat-phase resolution.
//!
//! Resolves retreat orders: if two or more dislodged units retreat to the
//! same province, all of them are destroyed. Dislodged units without a legal
//! retreat order are disbanded.

use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use crate::board::{
    AdjacencyGraph, BoardState, Coast, Location, Order, OrderUnit, Phase, Power, ProvinceId, Unit,
};
use crate::error::AdjudicationError;

use super::{check_board, collect_orders, OrderResult, Reason, ResolvedOrder};

/// The outcome of a retreat phase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetreatReport {
    /// One entry per dislodged unit, in province order.
    pub results: Vec<ResolvedOrder>,
    /// Rejected and superseded submissions.
    pub rejected: Vec<ResolvedOrder>,
    /// Units removed from the board: voluntary disbands, bounced retreats
    /// and forced disbands.
    pub disbanded: Vec<Unit>,
}

/// Computes where a dislodged unit may retreat.
///
/// A destination must be adjacent and passable for the unit type (fleets
/// keep to their coast and name the coast they arrive on), unoccupied, not
/// the province the attacker came from and not left empty by a standoff.
pub fn retreat_options(
    unit: &Unit,
    attacker_from: Option<ProvinceId>,
    occupied: impl Fn(ProvinceId) -> bool,
    standoffs: &BTreeSet<ProvinceId>,
    map: &AdjacencyGraph,
) -> Vec<Location> {
    let mut options = Vec::new();
    for dest in map.provinces_adjacent_to(unit.province, unit.coast, unit.is_fleet()) {
        if Some(dest) == attacker_from || occupied(dest) || standoffs.contains(&dest) {
            continue;
        }
        if !map.info(dest).admits(unit.is_fleet()) {
            continue;
        }
        if unit.is_fleet() && map.info(dest).has_coasts() {
            for coast in map.fleet_coasts_to(unit.province, unit.coast, dest) {
                options.push(Location::with_coast(dest, coast));
            }
        } else {
            options.push(Location::new(dest));
        }
    }
    options.sort();
    options
}

/// Returns the legal retreats of the unit dislodged from `province`.
pub fn valid_retreats(
    province: ProvinceId,
    state: &BoardState,
    map: &AdjacencyGraph,
) -> Result<Vec<Location>, AdjudicationError> {
    check_board(state, map)?;
    let dislodged = state
        .dislodged_at(province)
        .ok_or_else(|| AdjudicationError::UnitNotFound {
            id: province,
            abbr: map
                .get(province)
                .map(|i| i.abbr.clone())
                .unwrap_or_default(),
            context: "retreat options",
        })?;
    Ok(retreat_options(
        &dislodged.unit,
        dislodged.attacker_from,
        |p| state.is_occupied(p),
        state.standoffs(),
        map,
    ))
}

/// Resolves a retreat phase.
#[instrument(skip_all, fields(year = state.year, season = ?state.season))]
pub fn resolve_retreats(
    orders: &[(Order, Power)],
    state: &BoardState,
    map: &AdjacencyGraph,
) -> Result<RetreatReport, AdjudicationError> {
    if state.phase != Phase::Retreat {
        return Err(AdjudicationError::WrongPhase {
            expected: Phase::Retreat,
            actual: state.phase,
        });
    }
    check_board(state, map)?;

    let submissions = collect_orders(orders, state, map)?;
    let by_province = submissions.by_province();

    let mut target_count: HashMap<ProvinceId, usize> = HashMap::new();
    for (_, order) in by_province.values() {
        if let Order::Retreat { dest, .. } = order {
            *target_count.entry(dest.province).or_default() += 1;
        }
    }

    let mut results = Vec::new();
    let mut disbanded = Vec::new();
    for d in state.dislodged() {
        let unit = d.unit;
        let (order, result) = match by_province.get(&unit.province) {
            Some((_, order @ Order::Retreat { dest, .. })) => {
                if target_count.get(&dest.province).copied().unwrap_or(0) > 1 {
                    disbanded.push(unit);
                    (*order, OrderResult::Failed(Reason::Bounced))
                } else {
                    (*order, OrderResult::Succeeded)
                }
            }
            Some((_, order @ Order::Disband { .. })) => {
                disbanded.push(unit);
                (*order, OrderResult::Succeeded)
            }
            _ => {
                disbanded.push(unit);
                let order = Order::Disband {
                    unit: OrderUnit {
                        unit_type: unit.unit_type,
                        location: unit.location(),
                    },
                };
                (order, OrderResult::Failed(Reason::ForcedDisband))
            }
        };
        debug!(power = %unit.power, unit = map.abbr(unit.province), ?result, "retreat resolved");
        results.push(ResolvedOrder {
            order,
            power: unit.power,
            result,
        });
    }

    info!(
        retreats = results.len(),
        disbanded = disbanded.len(),
        "retreats resolved"
    );
    Ok(RetreatReport {
        results,
        rejected: submissions.rejected,
        disbanded,
    })
}

/// Commits a retreat report: successful retreats are placed and every
/// dislodged slot is cleared.
pub fn apply_retreats(
    state: &mut BoardState,
    report: &RetreatReport,
    map: &AdjacencyGraph,
) -> Result<(), AdjudicationError> {
    for r in &report.results {
        let (Order::Retreat { unit, dest }, OrderResult::Succeeded) = (r.order, r.result) else {
            continue;
        };
        let coast = if unit.unit_type.is_fleet() {
            dest.coast
        } else {
            Coast::None
        };
        let placed = state.place_unit(Unit {
            unit_type: unit.unit_type,
            power: r.power,
            province: dest.province,
            coast,
        });
        if !placed {
            return Err(AdjudicationError::OccupiedProvince {
                abbr: map.abbr(dest.province).to_string(),
            });
        }
    }
    state.clear_dislodged();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{DislodgedUnit, Season};

    fn map() -> &'static AdjacencyGraph {
        AdjacencyGraph::standard()
    }

    fn p(abbr: &str) -> ProvinceId {
        map().province(abbr).unwrap()
    }

    fn provinces(locs: &[Location]) -> Vec<ProvinceId> {
        locs.iter().map(|l| l.province).collect()
    }

    /// Places a dislodged unit with options computed from the board.
    fn dislodge(state: &mut BoardState, unit: Unit, attacker_from: Option<&str>) {
        let attacker_from = attacker_from.map(p);
        let retreats = retreat_options(
            &unit,
            attacker_from,
            |q| state.is_occupied(q),
            state.standoffs(),
            map(),
        );
        state.set_dislodged(DislodgedUnit {
            unit,
            attacker_from,
            retreats,
        });
    }

    fn retreat_state() -> BoardState {
        BoardState::empty(1901, Season::Spring, Phase::Retreat)
    }

    fn retreat(abbr: &str, dest: &str) -> Order {
        Order::Retreat {
            unit: OrderUnit::army(p(abbr)),
            dest: Location::new(p(dest)),
        }
    }

    #[test]
    fn options_exclude_attacker_occupied_and_standoff() {
        let mut state = retreat_state();
        state.place_unit(Unit::army(Power::Austria, p("ser")));
        state.place_unit(Unit::army(Power::Russia, p("bud")));
        state.set_standoffs([p("gal")]);
        let unit = Unit::army(Power::Austria, p("vie"));
        let options = retreat_options(&unit, Some(p("boh")), |q| state.is_occupied(q), state.standoffs(), map());
        assert_eq!(provinces(&options), vec![p("tri"), p("tyr")]);
    }

    #[test]
    fn army_options_stay_on_land() {
        let unit = Unit::army(Power::England, p("nwy"));
        let options = retreat_options(&unit, None, |_| false, &BTreeSet::new(), map());
        assert_eq!(provinces(&options), vec![p("fin"), p("stp"), p("swe")]);
    }

    #[test]
    fn fleet_options_carry_coasts() {
        let unit = Unit::fleet(Power::France, p("mao"), Coast::None);
        let options = retreat_options(&unit, None, |_| false, &BTreeSet::new(), map());
        assert!(options.contains(&Location::with_coast(p("spa"), Coast::North)));
        assert!(options.contains(&Location::with_coast(p("spa"), Coast::South)));
        assert!(!options.contains(&Location::new(p("spa"))));
    }

    #[test]
    fn valid_retreats_requires_dislodged_unit() {
        let state = retreat_state();
        assert!(matches!(
            valid_retreats(p("vie"), &state, map()),
            Err(AdjudicationError::UnitNotFound { .. })
        ));
    }

    #[test]
    fn retreat_succeeds_and_applies() {
        let mut state = retreat_state();
        state.place_unit(Unit::army(Power::Germany, p("mun")));
        dislodge(&mut state, Unit::army(Power::Austria, p("vie")), Some("gal"));

        let report = resolve_retreats(&[(retreat("vie", "boh"), Power::Austria)], &state, map()).unwrap();
        assert_eq!(report.results[0].result, OrderResult::Succeeded);
        assert!(report.disbanded.is_empty());

        apply_retreats(&mut state, &report, map()).unwrap();
        assert_eq!(state.unit_at(p("boh")).map(|u| u.power), Some(Power::Austria));
        assert!(!state.has_dislodged());
    }

    #[test]
    fn two_retreats_to_same_province_both_destroyed() {
        let mut state = retreat_state();
        dislodge(&mut state, Unit::army(Power::Austria, p("vie")), Some("gal"));
        dislodge(&mut state, Unit::army(Power::Germany, p("mun")), Some("bur"));

        let orders = [
            (retreat("vie", "boh"), Power::Austria),
            (retreat("mun", "boh"), Power::Germany),
        ];
        let report = resolve_retreats(&orders, &state, map()).unwrap();
        for r in &report.results {
            assert_eq!(r.result, OrderResult::Failed(Reason::Bounced));
        }
        assert_eq!(report.disbanded.len(), 2);

        apply_retreats(&mut state, &report, map()).unwrap();
        assert!(state.unit_at(p("boh")).is_none());
    }

    #[test]
    fn unordered_and_invalid_retreats_are_disbanded() {
        let mut state = retreat_state();
        dislodge(&mut state, Unit::army(Power::Austria, p("vie")), Some("gal"));
        dislodge(&mut state, Unit::army(Power::Germany, p("mun")), Some("bur"));

        // Retreating onto the attacker's origin is not an option.
        let orders = [(retreat("vie", "gal"), Power::Austria)];
        let report = resolve_retreats(&orders, &state, map()).unwrap();
        assert_eq!(report.rejected.len(), 1);
        assert_eq!(report.results.len(), 2);
        for r in &report.results {
            assert_eq!(r.result, OrderResult::Failed(Reason::ForcedDisband));
        }
        assert_eq!(report.disbanded.len(), 2);
    }

    #[test]
    fn voluntary_disband_succeeds() {
        let mut state = retreat_state();
        dislodge(&mut state, Unit::army(Power::Turkey, p("bul")), Some("ser"));
        let order = Order::Disband {
            unit: OrderUnit::army(p("bul")),
        };
        let report = resolve_retreats(&[(order, Power::Turkey)], &state, map()).unwrap();
        assert_eq!(report.results[0].result, OrderResult::Succeeded);
        assert_eq!(report.disbanded.len(), 1);
    }
}
