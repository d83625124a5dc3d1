//! Province identifiers, powers, coasts and terrain.
//!
//! Provinces are identified by a compact `ProvinceId` index into the map
//! they were loaded from. Static metadata (name, terrain, supply center
//! status, home power) lives in `ProvinceInfo` records owned by the
//! `AdjacencyGraph`.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Index of a province within its map.
///
/// The index doubles as an array index into per-province board tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProvinceId(pub u8);

impl ProvinceId {
    /// Returns the id as a table index.
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// Coast specifier for split-coast provinces.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Coast {
    #[default]
    None,
    North,
    South,
    East,
}

impl Coast {
    /// Returns the 2-letter abbreviation (empty string for None).
    pub const fn abbr(self) -> &'static str {
        match self {
            Coast::None => "",
            Coast::North => "nc",
            Coast::South => "sc",
            Coast::East => "ec",
        }
    }

    /// Parses a coast from its 2-letter abbreviation.
    pub fn from_abbr(s: &str) -> Option<Coast> {
        match s {
            "" => Some(Coast::None),
            "nc" => Some(Coast::North),
            "sc" => Some(Coast::South),
            "ec" => Some(Coast::East),
            _ => Option::None,
        }
    }
}

/// Classifies a province by terrain type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Terrain {
    Land,
    Sea,
    Coastal,
}

/// One of the seven great powers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Power {
    Austria,
    England,
    France,
    Germany,
    Italy,
    Russia,
    Turkey,
}

/// All seven powers in standard order.
pub const ALL_POWERS: [Power; 7] = [
    Power::Austria,
    Power::England,
    Power::France,
    Power::Germany,
    Power::Italy,
    Power::Russia,
    Power::Turkey,
];

impl Power {
    /// Returns the lowercase full name of this power.
    pub const fn name(self) -> &'static str {
        match self {
            Power::Austria => "austria",
            Power::England => "england",
            Power::France => "france",
            Power::Germany => "germany",
            Power::Italy => "italy",
            Power::Russia => "russia",
            Power::Turkey => "turkey",
        }
    }

    /// Parses a power from its lowercase full name.
    pub fn from_name(name: &str) -> Option<Power> {
        ALL_POWERS.iter().copied().find(|p| p.name() == name)
    }
}

impl fmt::Display for Power {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Static metadata for a province.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProvinceInfo {
    pub abbr: String,
    pub name: String,
    pub terrain: Terrain,
    pub supply_center: bool,
    /// The power for which this province is a home supply center.
    pub home: Option<Power>,
    /// Named coasts of a split-coast province, empty otherwise.
    pub coasts: Vec<Coast>,
}

impl ProvinceInfo {
    /// Returns true if this province has split coasts.
    pub fn has_coasts(&self) -> bool {
        !self.coasts.is_empty()
    }

    /// Returns true if a unit of the given kind may stand in this province.
    pub fn admits(&self, is_fleet: bool) -> bool {
        match self.terrain {
            Terrain::Land => !is_fleet,
            Terrain::Sea => is_fleet,
            Terrain::Coastal => true,
        }
    }
}
