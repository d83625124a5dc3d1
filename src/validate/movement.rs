//! Movement-phase order legality.

use crate::board::{
    AdjacencyGraph, BoardState, Coast, Location, Order, OrderUnit, ProvinceId, Terrain, Unit,
    UnitType,
};

use super::Rejection;

/// Returns true if the unit could move to `dest`, ignoring the destination coast.
///
/// This is the reach test for supports: a fleet may support into a
/// split-coast province through any of its coasts.
pub fn can_reach(unit: &Unit, dest: ProvinceId, map: &AdjacencyGraph) -> bool {
    dest != unit.province
        && map.is_adjacent(unit.province, unit.coast, dest, Coast::None, unit.is_fleet())
}

/// Returns true if an army move between the two provinces would need a convoy.
pub fn needs_convoy(src: ProvinceId, dst: ProvinceId, map: &AdjacencyGraph) -> bool {
    !map.is_adjacent(src, Coast::None, dst, Coast::None, false)
}

fn is_coastal(province: ProvinceId, map: &AdjacencyGraph) -> bool {
    map.info(province).terrain == Terrain::Coastal
}

/// Checks a Hold, Move, Support or Convoy order whose unit is known to exist.
pub(super) fn check(order: &Order, state: &BoardState, map: &AdjacencyGraph) -> Result<Order, Rejection> {
    let Some(unit) = order.unit().and_then(|u| state.unit_at(u.province())) else {
        return Err(Rejection::WrongPhase);
    };
    let me = OrderUnit {
        unit_type: unit.unit_type,
        location: unit.location(),
    };

    match *order {
        Order::Hold { .. } => Ok(Order::Hold { unit: me }),

        Order::Move {
            dest, via_convoy, ..
        } => {
            let dest = check_move(unit, dest, via_convoy, map)?;
            let via_convoy =
                !unit.is_fleet() && (via_convoy || needs_convoy(unit.province, dest.province, map));
            Ok(Order::Move {
                unit: me,
                dest,
                via_convoy,
            })
        }

        Order::SupportHold { supported, .. } => {
            let target = supported_unit(state, &supported)?;
            if target.province == unit.province {
                return Err(Rejection::SelfSupport);
            }
            if !can_reach(unit, target.province, map) {
                return Err(Rejection::NotAdjacent);
            }
            Ok(Order::SupportHold {
                unit: me,
                supported: OrderUnit {
                    unit_type: target.unit_type,
                    location: target.location(),
                },
            })
        }

        Order::SupportMove {
            supported, dest, ..
        } => {
            let target = supported_unit(state, &supported)?;
            if target.province == unit.province || dest.province == unit.province {
                return Err(Rejection::SelfSupport);
            }
            if target.province == dest.province || !can_reach(unit, dest.province, map) {
                return Err(Rejection::NotAdjacent);
            }
            Ok(Order::SupportMove {
                unit: me,
                supported: OrderUnit {
                    unit_type: target.unit_type,
                    location: target.location(),
                },
                dest: Location::new(dest.province),
            })
        }

        Order::Convoy {
            convoyed_from,
            convoyed_to,
            ..
        } => {
            if !unit.is_fleet() {
                return Err(Rejection::NotAFleet);
            }
            if map.info(unit.province).terrain != Terrain::Sea {
                return Err(Rejection::ConvoyerNotAtSea);
            }
            match state.unit_at(convoyed_from.province) {
                Some(army) if army.unit_type == UnitType::Army => {}
                _ => return Err(Rejection::NoArmyToConvoy),
            }
            if convoyed_from.province == convoyed_to.province {
                return Err(Rejection::NotAdjacent);
            }
            if !is_coastal(convoyed_to.province, map) {
                return Err(Rejection::IllegalTerrain);
            }
            Ok(Order::Convoy {
                unit: me,
                convoyed_from: Location::new(convoyed_from.province),
                convoyed_to: Location::new(convoyed_to.province),
            })
        }

        _ => Err(Rejection::WrongPhase),
    }
}

/// Checks a move destination and returns it with the coast normalized.
fn check_move(
    unit: &Unit,
    dest: Location,
    via_convoy: bool,
    map: &AdjacencyGraph,
) -> Result<Location, Rejection> {
    if dest.province == unit.province {
        return Err(Rejection::NotAdjacent);
    }
    let info = map.info(dest.province);
    if !info.admits(unit.is_fleet()) {
        return Err(Rejection::IllegalTerrain);
    }

    if !unit.is_fleet() {
        let convoyed = via_convoy || needs_convoy(unit.province, dest.province, map);
        if convoyed && !(is_coastal(unit.province, map) && is_coastal(dest.province, map)) {
            return Err(Rejection::NotAdjacent);
        }
        return Ok(Location::new(dest.province));
    }

    if via_convoy {
        return Err(Rejection::FleetConvoy);
    }
    let coasts = map.fleet_coasts_to(unit.province, unit.coast, dest.province);
    if coasts.is_empty() {
        return Err(Rejection::NotAdjacent);
    }
    if !info.has_coasts() {
        return Ok(Location::new(dest.province));
    }
    let coast = match dest.coast {
        Coast::None if coasts.len() == 1 => coasts[0],
        Coast::None => return Err(Rejection::CoastRequired),
        named if coasts.contains(&named) => named,
        _ => return Err(Rejection::InvalidCoast),
    };
    Ok(Location::with_coast(dest.province, coast))
}

fn supported_unit<'a>(state: &'a BoardState, supported: &OrderUnit) -> Result<&'a Unit, Rejection> {
    state
        .unit_at(supported.province())
        .ok_or(Rejection::SupportedUnitMissing)
}
