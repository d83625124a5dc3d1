//! Retreat-phase order legality.

use crate::board::{BoardState, Coast, Location, Order, OrderUnit};

use super::Rejection;

/// Checks a Retreat or Disband order whose dislodged unit is known to exist.
///
/// A retreat is legal only to one of the options recorded when the unit was
/// dislodged. A missing coast is filled in when the province offers exactly
/// one retreat coast.
pub(super) fn check(order: &Order, state: &BoardState) -> Result<Order, Rejection> {
    let Some(dislodged) = order.unit().and_then(|u| state.dislodged_at(u.province())) else {
        return Err(Rejection::WrongPhase);
    };
    let me = OrderUnit {
        unit_type: dislodged.unit.unit_type,
        location: dislodged.unit.location(),
    };

    match *order {
        Order::Disband { .. } => Ok(Order::Disband { unit: me }),
        Order::Retreat { dest, .. } => {
            let options: Vec<&Location> = dislodged
                .retreats
                .iter()
                .filter(|l| l.province == dest.province)
                .collect();
            let chosen = match (dest.coast, options.as_slice()) {
                (_, []) => return Err(Rejection::InvalidRetreat),
                (Coast::None, [only]) => **only,
                (Coast::None, _) => return Err(Rejection::CoastRequired),
                (named, opts) => match opts.iter().find(|l| l.coast == named || l.coast == Coast::None) {
                    Some(l) => **l,
                    None => return Err(Rejection::InvalidCoast),
                },
            };
            Ok(Order::Retreat {
                unit: me,
                dest: chosen,
            })
        }
        _ => Err(Rejection::WrongPhase),
    }
}
