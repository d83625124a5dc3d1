//! Unit types and ownership.
//!
//! Represents armies and fleets, their owning power, and their current
//! position on the board.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::order::Location;
use super::province::{Coast, Power, ProvinceId};

/// The type of a military unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnitType {
    Army,
    Fleet,
}

impl UnitType {
    #[inline]
    pub const fn is_fleet(self) -> bool {
        matches!(self, UnitType::Fleet)
    }

    /// Returns the uppercase abbreviation used in order notation.
    pub const fn abbr(self) -> char {
        match self {
            UnitType::Army => 'A',
            UnitType::Fleet => 'F',
        }
    }
}

impl fmt::Display for UnitType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.abbr())
    }
}

/// A military unit on the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Unit {
    pub unit_type: UnitType,
    pub power: Power,
    pub province: ProvinceId,
    /// Only set for fleets on split-coast provinces.
    #[serde(default, skip_serializing_if = "is_no_coast")]
    pub coast: Coast,
}

impl Unit {
    pub fn army(power: Power, province: ProvinceId) -> Self {
        Unit {
            unit_type: UnitType::Army,
            power,
            province,
            coast: Coast::None,
        }
    }

    pub fn fleet(power: Power, province: ProvinceId, coast: Coast) -> Self {
        Unit {
            unit_type: UnitType::Fleet,
            power,
            province,
            coast,
        }
    }

    /// Returns the unit's location including coast.
    pub fn location(&self) -> Location {
        Location::with_coast(self.province, self.coast)
    }

    #[inline]
    pub fn is_fleet(&self) -> bool {
        self.unit_type.is_fleet()
    }
}

/// A unit dislodged during a movement phase, awaiting its retreat.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DislodgedUnit {
    pub unit: Unit,
    /// Province the dislodging attack came from. None when the attack was
    /// convoyed, in which case the retreat into that province is allowed.
    pub attacker_from: Option<ProvinceId>,
    /// Legal retreat destinations computed at dislodgement time.
    #[serde(default)]
    pub retreats: Vec<Location>,
}

pub(crate) fn is_no_coast(coast: &Coast) -> bool {
    *coast == Coast::None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unit_constructors() {
        let a = Unit::army(Power::Austria, ProvinceId(3));
        assert!(!a.is_fleet());
        assert_eq!(a.location(), Location::new(ProvinceId(3)));

        let f = Unit::fleet(Power::Russia, ProvinceId(60), Coast::South);
        assert!(f.is_fleet());
        assert_eq!(f.location().coast, Coast::South);
    }

    #[test]
    fn unit_serializes_without_empty_coast() {
        let a = Unit::army(Power::France, ProvinceId(12));
        let json = serde_json::to_string(&a).unwrap();
        assert!(!json.contains("coast"));
        let back: Unit = serde_json::from_str(&json).unwrap();
        assert_eq!(back, a);
    }

    #[test]
    fn unit_type_abbr() {
        assert_eq!(UnitType::Army.to_string(), "A");
        assert_eq!(UnitType::Fleet.to_string(), "F");
    }
}
