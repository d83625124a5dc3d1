//! Order types for all Diplomacy phases.
//!
//! `Order` is a closed sum type; each phase matches on it exhaustively.
//! Orders arrive already structured, there is no text notation parser.

use serde::{Deserialize, Serialize};

use super::province::{Coast, ProvinceId};
use super::state::Phase;
use super::unit::{is_no_coast, UnitType};

/// A location on the board: a province with an optional coast specifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Location {
    pub province: ProvinceId,
    #[serde(default, skip_serializing_if = "is_no_coast")]
    pub coast: Coast,
}

impl Location {
    /// Creates a location without a coast.
    pub fn new(province: ProvinceId) -> Self {
        Self {
            province,
            coast: Coast::None,
        }
    }

    /// Creates a location with a coast specifier.
    pub fn with_coast(province: ProvinceId, coast: Coast) -> Self {
        Self { province, coast }
    }
}

/// A unit reference in an order: the unit type and its current location.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OrderUnit {
    pub unit_type: UnitType,
    pub location: Location,
}

impl OrderUnit {
    pub fn army(province: ProvinceId) -> Self {
        OrderUnit {
            unit_type: UnitType::Army,
            location: Location::new(province),
        }
    }

    pub fn fleet(province: ProvinceId) -> Self {
        OrderUnit {
            unit_type: UnitType::Fleet,
            location: Location::new(province),
        }
    }

    pub fn fleet_at(province: ProvinceId, coast: Coast) -> Self {
        OrderUnit {
            unit_type: UnitType::Fleet,
            location: Location::with_coast(province, coast),
        }
    }

    #[inline]
    pub fn province(&self) -> ProvinceId {
        self.location.province
    }
}

/// A Diplomacy order covering all three phases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Order {
    Hold {
        unit: OrderUnit,
    },

    /// `via_convoy` forces convoy routing even between adjacent provinces.
    Move {
        unit: OrderUnit,
        dest: Location,
        #[serde(default)]
        via_convoy: bool,
    },

    SupportHold {
        unit: OrderUnit,
        supported: OrderUnit,
    },

    SupportMove {
        unit: OrderUnit,
        supported: OrderUnit,
        dest: Location,
    },

    Convoy {
        unit: OrderUnit,
        convoyed_from: Location,
        convoyed_to: Location,
    },

    Retreat {
        unit: OrderUnit,
        dest: Location,
    },

    /// Voluntary disband of a dislodged unit.
    Disband {
        unit: OrderUnit,
    },

    /// The unit to create; its location is the home center being built on.
    Build {
        unit: OrderUnit,
    },

    Destroy {
        unit: OrderUnit,
    },

    /// Voluntarily skip one build.
    Waive,
}

impl Order {
    /// Returns the unit the order is issued to, or None for `Waive`.
    pub fn unit(&self) -> Option<&OrderUnit> {
        match self {
            Order::Hold { unit }
            | Order::Move { unit, .. }
            | Order::SupportHold { unit, .. }
            | Order::SupportMove { unit, .. }
            | Order::Convoy { unit, .. }
            | Order::Retreat { unit, .. }
            | Order::Disband { unit }
            | Order::Build { unit }
            | Order::Destroy { unit } => Some(unit),
            Order::Waive => None,
        }
    }

    /// Returns the province of the ordered unit, or None for `Waive`.
    pub fn province(&self) -> Option<ProvinceId> {
        self.unit().map(OrderUnit::province)
    }

    /// Returns the phase in which this kind of order may be issued.
    pub fn phase(&self) -> Phase {
        match self {
            Order::Hold { .. }
            | Order::Move { .. }
            | Order::SupportHold { .. }
            | Order::SupportMove { .. }
            | Order::Convoy { .. } => Phase::Movement,
            Order::Retreat { .. } | Order::Disband { .. } => Phase::Retreat,
            Order::Build { .. } | Order::Destroy { .. } | Order::Waive => Phase::Adjustment,
        }
    }

    /// Shorthand for a plain (non-convoyed) move.
    pub fn move_to(unit: OrderUnit, dest: Location) -> Order {
        Order::Move {
            unit,
            dest,
            via_convoy: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn location_new_has_no_coast() {
        let loc = Location::new(ProvinceId(7));
        assert_eq!(loc.province, ProvinceId(7));
        assert_eq!(loc.coast, Coast::None);
    }

    #[test]
    fn order_unit_and_phase() {
        let unit = OrderUnit::army(ProvinceId(4));
        assert_eq!(Order::Hold { unit }.province(), Some(ProvinceId(4)));
        assert_eq!(Order::Hold { unit }.phase(), Phase::Movement);
        assert_eq!(Order::Disband { unit }.phase(), Phase::Retreat);
        assert_eq!(Order::Destroy { unit }.phase(), Phase::Adjustment);
        assert_eq!(Order::Waive.unit(), None);
    }

    #[test]
    fn order_json_shape() {
        let order = Order::move_to(
            OrderUnit::fleet(ProvinceId(40)),
            Location::with_coast(ProvinceId(59), Coast::North),
        );
        let json = serde_json::to_value(order).unwrap();
        assert_eq!(json["type"], "move");
        assert_eq!(json["dest"]["coast"], "north");
        assert_eq!(json["via_convoy"], false);

        let parsed: Order = serde_json::from_str(
            r#"{"type":"move","unit":{"unit_type":"army","location":{"province":3}},"dest":{"province":5}}"#,
        )
        .unwrap();
        assert_eq!(
            parsed,
            Order::move_to(OrderUnit::army(ProvinceId(3)), Location::new(ProvinceId(5)))
        );

        let waive: Order = serde_json::from_str(r#"{"type":"waive"}"#).unwrap();
        assert_eq!(waive, Order::Waive);
    }
}
