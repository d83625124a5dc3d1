//! Adjustment-phase order legality.

use crate::board::{AdjacencyGraph, BoardState, Coast, Location, Order, OrderUnit, Power};

use super::Rejection;

/// Returns a power's adjustment quota: controlled centers minus owned units.
///
/// Positive means builds are available, negative means units must be destroyed.
pub fn quota(power: Power, state: &BoardState) -> i32 {
    state.center_count(power) as i32 - state.unit_count(power) as i32
}

pub(super) fn check(
    order: &Order,
    power: Power,
    state: &BoardState,
    map: &AdjacencyGraph,
) -> Result<Order, Rejection> {
    let quota = quota(power, state);
    match *order {
        Order::Waive => {
            if quota <= 0 {
                return Err(Rejection::NoBuildsAvailable);
            }
            Ok(Order::Waive)
        }
        Order::Destroy { unit } => {
            if quota >= 0 {
                return Err(Rejection::NoDestroysRequired);
            }
            let location = state
                .unit_at(unit.province())
                .map(|u| u.location())
                .unwrap_or(unit.location);
            Ok(Order::Destroy {
                unit: OrderUnit {
                    unit_type: unit.unit_type,
                    location,
                },
            })
        }
        Order::Build { unit } => {
            if quota <= 0 {
                return Err(Rejection::NoBuildsAvailable);
            }
            let province = unit.province();
            let info = map.info(province);
            if !info.supply_center || info.home != Some(power) {
                return Err(Rejection::NotHomeCenter);
            }
            if state.sc_owner(province) != Some(power) {
                return Err(Rejection::CenterNotOwned);
            }
            if state.is_occupied(province) {
                return Err(Rejection::ProvinceOccupied);
            }
            let is_fleet = unit.unit_type.is_fleet();
            if !info.admits(is_fleet) {
                return Err(Rejection::IllegalTerrain);
            }
            let coast = match (is_fleet && info.has_coasts(), unit.location.coast) {
                (false, _) => Coast::None,
                (true, Coast::None) => return Err(Rejection::CoastRequired),
                (true, named) if info.coasts.contains(&named) => named,
                (true, _) => return Err(Rejection::InvalidCoast),
            };
            Ok(Order::Build {
                unit: OrderUnit {
                    unit_type: unit.unit_type,
                    location: Location::with_coast(province, coast),
                },
            })
        }
        _ => Err(Rejection::WrongPhase),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{Phase, ProvinceId, Season, Unit};
    use crate::validate::{validate, Verdict};

    fn map() -> &'static AdjacencyGraph {
        AdjacencyGraph::standard()
    }

    fn p(abbr: &str) -> ProvinceId {
        map().province(abbr).unwrap()
    }

    /// Russia owns its four home centers plus Rumania with two units left.
    fn russia_with_builds() -> BoardState {
        let mut state = BoardState::empty(1901, Season::Fall, Phase::Adjustment);
        for sc in ["mos", "sev", "stp", "war", "rum"] {
            state.set_sc_owner(p(sc), Some(Power::Russia));
        }
        state.place_unit(Unit::army(Power::Russia, p("rum")));
        state.place_unit(Unit::army(Power::Russia, p("mos")));
        state
    }

    fn verdict(state: &BoardState, power: Power, order: Order) -> Verdict {
        validate(&order, power, state, map()).unwrap()
    }

    #[test]
    fn quota_counts_centers_minus_units() {
        assert_eq!(quota(Power::Russia, &russia_with_builds()), 3);
    }

    #[test]
    fn build_rules() {
        let state = russia_with_builds();
        let build = |unit| Order::Build { unit };

        assert!(verdict(&state, Power::Russia, build(OrderUnit::army(p("war")))).is_legal());
        assert_eq!(
            verdict(&state, Power::Russia, build(OrderUnit::army(p("rum")))),
            Verdict::Rejected(Rejection::NotHomeCenter)
        );
        assert_eq!(
            verdict(&state, Power::Russia, build(OrderUnit::army(p("mos")))),
            Verdict::Rejected(Rejection::ProvinceOccupied)
        );
        assert_eq!(
            verdict(&state, Power::Russia, build(OrderUnit::fleet(p("war")))),
            Verdict::Rejected(Rejection::IllegalTerrain)
        );
        assert_eq!(
            verdict(&state, Power::Russia, build(OrderUnit::fleet(p("stp")))),
            Verdict::Rejected(Rejection::CoastRequired)
        );
        assert!(verdict(
            &state,
            Power::Russia,
            build(OrderUnit::fleet_at(p("stp"), Coast::North))
        )
        .is_legal());
    }

    #[test]
    fn build_needs_owned_center() {
        let mut state = russia_with_builds();
        state.set_sc_owner(p("sev"), Some(Power::Turkey));
        state.set_sc_owner(p("ank"), Some(Power::Russia));
        assert_eq!(
            verdict(&state, Power::Russia, Order::Build { unit: OrderUnit::fleet(p("sev")) }),
            Verdict::Rejected(Rejection::CenterNotOwned)
        );
    }

    #[test]
    fn destroy_requires_negative_quota() {
        let state = russia_with_builds();
        let order = Order::Destroy {
            unit: OrderUnit::army(p("rum")),
        };
        assert_eq!(
            verdict(&state, Power::Russia, order),
            Verdict::Rejected(Rejection::NoDestroysRequired)
        );
        assert!(verdict(&state, Power::Russia, Order::Waive).is_legal());
    }
}
