//! Board state representation.
//!
//! Holds a snapshot of the board at a given point in time: unit positions,
//! dislodged units, supply-center ownership, phase, season, and year.
//! Tables are keyed by `ProvinceId` so the state is independent of the
//! map's size.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use super::province::{Power, ProvinceId};
use super::unit::{DislodgedUnit, Unit};

/// The season of a game turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Season {
    Spring,
    Fall,
}

/// The phase within a game turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Movement,
    Retreat,
    Adjustment,
}

/// Complete board state at a point in time.
///
/// Serialized as plain lists; the keyed tables are rebuilt on load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "BoardRecord", into = "BoardRecord")]
pub struct BoardState {
    pub year: u16,
    pub season: Season,
    pub phase: Phase,
    units: BTreeMap<ProvinceId, Unit>,
    dislodged: BTreeMap<ProvinceId, DislodgedUnit>,
    sc_owner: BTreeMap<ProvinceId, Power>,
    /// Provinces left empty by a standoff in the last movement phase.
    standoffs: BTreeSet<ProvinceId>,
}

impl BoardState {
    /// Creates an empty board state with no units or ownership.
    pub fn empty(year: u16, season: Season, phase: Phase) -> Self {
        BoardState {
            year,
            season,
            phase,
            units: BTreeMap::new(),
            dislodged: BTreeMap::new(),
            sc_owner: BTreeMap::new(),
            standoffs: BTreeSet::new(),
        }
    }

    /// Places a unit on the board. Returns false if the province is already occupied.
    pub fn place_unit(&mut self, unit: Unit) -> bool {
        if self.units.contains_key(&unit.province) {
            return false;
        }
        self.units.insert(unit.province, unit);
        true
    }

    pub fn remove_unit(&mut self, province: ProvinceId) -> Option<Unit> {
        self.units.remove(&province)
    }

    #[inline]
    pub fn unit_at(&self, province: ProvinceId) -> Option<&Unit> {
        self.units.get(&province)
    }

    #[inline]
    pub fn is_occupied(&self, province: ProvinceId) -> bool {
        self.units.contains_key(&province)
    }

    /// Iterates over all units in province order.
    pub fn units(&self) -> impl Iterator<Item = &Unit> {
        self.units.values()
    }

    pub fn units_of(&self, power: Power) -> impl Iterator<Item = &Unit> {
        self.units.values().filter(move |u| u.power == power)
    }

    pub fn unit_count(&self, power: Power) -> usize {
        self.units_of(power).count()
    }

    /// Returns the owner of a supply center, or None if neutral.
    #[inline]
    pub fn sc_owner(&self, province: ProvinceId) -> Option<Power> {
        self.sc_owner.get(&province).copied()
    }

    /// Sets supply center ownership for a province.
    pub fn set_sc_owner(&mut self, province: ProvinceId, owner: Option<Power>) {
        match owner {
            Some(power) => self.sc_owner.insert(province, power),
            None => self.sc_owner.remove(&province),
        };
    }

    /// Returns the supply centers controlled by a power.
    pub fn centers_of(&self, power: Power) -> impl Iterator<Item = ProvinceId> + '_ {
        self.sc_owner
            .iter()
            .filter(move |(_, owner)| **owner == power)
            .map(|(p, _)| *p)
    }

    pub fn center_count(&self, power: Power) -> usize {
        self.centers_of(power).count()
    }

    /// Records a dislodged unit at its province.
    pub fn set_dislodged(&mut self, dislodged: DislodgedUnit) {
        self.dislodged.insert(dislodged.unit.province, dislodged);
    }

    pub fn dislodged_at(&self, province: ProvinceId) -> Option<&DislodgedUnit> {
        self.dislodged.get(&province)
    }

    /// Iterates over dislodged units in province order.
    pub fn dislodged(&self) -> impl Iterator<Item = &DislodgedUnit> {
        self.dislodged.values()
    }

    pub fn has_dislodged(&self) -> bool {
        !self.dislodged.is_empty()
    }

    pub fn clear_dislodged(&mut self) {
        self.dislodged.clear();
        self.standoffs.clear();
    }

    pub fn standoffs(&self) -> &BTreeSet<ProvinceId> {
        &self.standoffs
    }

    pub fn set_standoffs(&mut self, standoffs: impl IntoIterator<Item = ProvinceId>) {
        self.standoffs = standoffs.into_iter().collect();
    }

    /// Iterates over every province id the state refers to: units, dislodged
    /// units with their attack origins and retreat options, owned centers
    /// and standoffs.
    pub fn provinces(&self) -> impl Iterator<Item = ProvinceId> + '_ {
        let dislodged = self.dislodged.values().flat_map(|d| {
            std::iter::once(d.unit.province)
                .chain(d.attacker_from)
                .chain(d.retreats.iter().map(|l| l.province))
        });
        self.units
            .keys()
            .copied()
            .chain(dislodged)
            .chain(self.sc_owner.keys().copied())
            .chain(self.standoffs.iter().copied())
    }
}

#[derive(Serialize, Deserialize)]
struct CenterRecord {
    province: ProvinceId,
    owner: Power,
}

#[derive(Serialize, Deserialize)]
struct BoardRecord {
    year: u16,
    season: Season,
    phase: Phase,
    #[serde(default)]
    units: Vec<Unit>,
    #[serde(default)]
    dislodged: Vec<DislodgedUnit>,
    #[serde(default)]
    centers: Vec<CenterRecord>,
    #[serde(default)]
    standoffs: Vec<ProvinceId>,
}

impl From<BoardState> for BoardRecord {
    fn from(state: BoardState) -> Self {
        BoardRecord {
            year: state.year,
            season: state.season,
            phase: state.phase,
            units: state.units.into_values().collect(),
            dislodged: state.dislodged.into_values().collect(),
            centers: state
                .sc_owner
                .into_iter()
                .map(|(province, owner)| CenterRecord { province, owner })
                .collect(),
            standoffs: state.standoffs.into_iter().collect(),
        }
    }
}

impl TryFrom<BoardRecord> for BoardState {
    type Error = String;

    fn try_from(record: BoardRecord) -> Result<Self, Self::Error> {
        let mut state = BoardState::empty(record.year, record.season, record.phase);
        for unit in record.units {
            if !state.place_unit(unit) {
                return Err(format!("two units in province {}", unit.province.0));
            }
        }
        for d in record.dislodged {
            if state.dislodged.contains_key(&d.unit.province) {
                return Err(format!("two dislodged units in province {}", d.unit.province.0));
            }
            state.set_dislodged(d);
        }
        for c in record.centers {
            state.set_sc_owner(c.province, Some(c.owner));
        }
        state.set_standoffs(record.standoffs);
        Ok(state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::province::Coast;

    #[test]
    fn empty_state_has_no_units() {
        let state = BoardState::empty(1901, Season::Spring, Phase::Movement);
        assert_eq!(state.units().count(), 0);
        assert!(!state.has_dislodged());
        assert_eq!(state.center_count(Power::Austria), 0);
    }

    #[test]
    fn place_unit_rejects_duplicate() {
        let mut state = BoardState::empty(1901, Season::Spring, Phase::Movement);
        assert!(state.place_unit(Unit::army(Power::Austria, ProvinceId(10))));
        assert!(!state.place_unit(Unit::army(Power::Germany, ProvinceId(10))));
        assert_eq!(state.unit_at(ProvinceId(10)).unwrap().power, Power::Austria);
    }

    #[test]
    fn centers_and_units_per_power() {
        let mut state = BoardState::empty(1901, Season::Spring, Phase::Movement);
        state.place_unit(Unit::army(Power::Italy, ProvinceId(1)));
        state.place_unit(Unit::fleet(Power::Italy, ProvinceId(2), Coast::None));
        state.set_sc_owner(ProvinceId(1), Some(Power::Italy));
        state.set_sc_owner(ProvinceId(5), Some(Power::Turkey));
        assert_eq!(state.unit_count(Power::Italy), 2);
        assert_eq!(state.center_count(Power::Italy), 1);
        state.set_sc_owner(ProvinceId(5), None);
        assert_eq!(state.sc_owner(ProvinceId(5)), None);
    }

    #[test]
    fn json_round_trip_keeps_tables() {
        let mut state = BoardState::empty(1905, Season::Fall, Phase::Retreat);
        state.place_unit(Unit::army(Power::France, ProvinceId(3)));
        state.set_sc_owner(ProvinceId(3), Some(Power::France));
        state.set_dislodged(DislodgedUnit {
            unit: Unit::army(Power::Germany, ProvinceId(3)),
            attacker_from: Some(ProvinceId(4)),
            retreats: vec![],
        });
        state.set_standoffs([ProvinceId(9)]);

        let json = serde_json::to_string(&state).unwrap();
        let back: BoardState = serde_json::from_str(&json).unwrap();
        assert_eq!(back, state);
    }

    #[test]
    fn duplicate_units_rejected_on_load() {
        let json = r#"{
            "year": 1901, "season": "spring", "phase": "movement",
            "units": [
                {"unit_type": "army", "power": "france", "province": 3},
                {"unit_type": "army", "power": "germany", "province": 3}
            ]
        }"#;
        assert!(serde_json::from_str::<BoardState>(json).is_err());
    }
}
