//! Adjacency graph for a Diplomacy map.
//!
//! Each entry records a directed edge: (from, from_coast) -> (to, to_coast)
//! with flags for army and fleet passability. Map specifications list
//! undirected edges; loading expands every edge into both directions, so the
//! table is symmetric by construction.
//!
//! Split-coast provinces (bul, spa, stp on the standard map) use
//! coast-specific fleet adjacencies and `Coast::None` for army adjacencies.

use std::collections::HashMap;
use std::sync::LazyLock;

use serde::Deserialize;

use super::province::{Coast, Power, ProvinceId, ProvinceInfo, Terrain};
use crate::error::MapError;

/// The embedded standard map specification.
const STANDARD_MAP: &str = include_str!("../../maps/standard.toml");

/// A single directed adjacency between two provinces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdjacencyEntry {
    pub from: ProvinceId,
    pub from_coast: Coast,
    pub to: ProvinceId,
    pub to_coast: Coast,
    pub army_ok: bool,
    pub fleet_ok: bool,
}

/// Province record as written in a map specification.
#[derive(Debug, Deserialize)]
struct ProvinceSpec {
    abbr: String,
    name: String,
    terrain: Terrain,
    #[serde(default)]
    supply_center: bool,
    #[serde(default)]
    home: Option<Power>,
    #[serde(default)]
    coasts: Vec<String>,
}

/// Undirected edges grouped by which unit types may cross them.
#[derive(Debug, Default, Deserialize)]
struct EdgeSpec {
    #[serde(default)]
    army: Vec<String>,
    #[serde(default)]
    fleet: Vec<String>,
    #[serde(default)]
    both: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct MapSpec {
    name: String,
    provinces: Vec<ProvinceSpec>,
    #[serde(default)]
    edges: EdgeSpec,
}

/// Map topology: provinces, terrain and the adjacency index.
///
/// Adjacency entries are stored sorted by source province with a
/// `(start, end)` offset per province for O(neighbors) lookup.
#[derive(Debug, Clone)]
pub struct AdjacencyGraph {
    name: String,
    provinces: Vec<ProvinceInfo>,
    entries: Vec<AdjacencyEntry>,
    offsets: Vec<(u32, u32)>,
    by_abbr: HashMap<String, ProvinceId>,
}

static STANDARD: LazyLock<AdjacencyGraph> = LazyLock::new(|| {
    AdjacencyGraph::from_toml_str(STANDARD_MAP).expect("embedded standard map is valid")
});

impl AdjacencyGraph {
    /// Returns the standard 75-province map.
    pub fn standard() -> &'static AdjacencyGraph {
        &STANDARD
    }

    /// Builds a map from a TOML map specification.
    pub fn from_toml_str(s: &str) -> Result<AdjacencyGraph, MapError> {
        let spec: MapSpec = toml::from_str(s)?;
        Self::from_spec(spec)
    }

    fn from_spec(mut spec: MapSpec) -> Result<AdjacencyGraph, MapError> {
        if spec.provinces.len() > u8::MAX as usize {
            return Err(MapError::TooManyProvinces(spec.provinces.len()));
        }
        // Ids follow abbreviation order, whatever order the file lists.
        spec.provinces.sort_by(|a, b| a.abbr.cmp(&b.abbr));

        let mut provinces = Vec::with_capacity(spec.provinces.len());
        let mut by_abbr = HashMap::with_capacity(spec.provinces.len());
        for (i, p) in spec.provinces.into_iter().enumerate() {
            let id = ProvinceId(i as u8);
            if by_abbr.insert(p.abbr.clone(), id).is_some() {
                return Err(MapError::DuplicateProvince(p.abbr));
            }
            let mut coasts = Vec::with_capacity(p.coasts.len());
            for c in &p.coasts {
                match Coast::from_abbr(c) {
                    Some(coast) if coast != Coast::None => coasts.push(coast),
                    _ => {
                        return Err(MapError::UnknownCoast {
                            edge: String::new(),
                            province: p.abbr.clone(),
                            coast: c.clone(),
                        })
                    }
                }
            }
            provinces.push(ProvinceInfo {
                abbr: p.abbr,
                name: p.name,
                terrain: p.terrain,
                supply_center: p.supply_center,
                home: p.home,
                coasts,
            });
        }

        let mut graph = AdjacencyGraph {
            name: spec.name,
            provinces,
            entries: Vec::new(),
            offsets: Vec::new(),
            by_abbr,
        };

        let mut entries = Vec::new();
        for edge in &spec.edges.army {
            graph.push_edge(edge, true, false, &mut entries)?;
        }
        for edge in &spec.edges.fleet {
            graph.push_edge(edge, false, true, &mut entries)?;
        }
        for edge in &spec.edges.both {
            graph.push_edge(edge, true, true, &mut entries)?;
        }

        entries.sort_by_key(|a| (a.from, a.to, a.from_coast, a.to_coast));
        let mut offsets = vec![(0u32, 0u32); graph.provinces.len()];
        let mut i = 0;
        for (p, slot) in offsets.iter_mut().enumerate() {
            let start = i;
            while i < entries.len() && entries[i].from.index() == p {
                i += 1;
            }
            *slot = (start as u32, i as u32);
        }
        graph.entries = entries;
        graph.offsets = offsets;
        Ok(graph)
    }

    /// Parses one `abc-xyz` edge and appends both directions.
    fn push_edge(
        &self,
        edge: &str,
        army_ok: bool,
        fleet_ok: bool,
        out: &mut Vec<AdjacencyEntry>,
    ) -> Result<(), MapError> {
        let (a, b) = edge
            .split_once('-')
            .ok_or_else(|| MapError::MalformedEdge(edge.to_string()))?;
        let (from, from_coast) = self.parse_endpoint(edge, a)?;
        let (to, to_coast) = self.parse_endpoint(edge, b)?;
        if from == to {
            return Err(MapError::MalformedEdge(edge.to_string()));
        }

        for (id, coast) in [(from, from_coast), (to, to_coast)] {
            let info = &self.provinces[id.index()];
            if fleet_ok && info.terrain == Terrain::Land {
                return Err(MapError::FleetEdgeInland(edge.to_string()));
            }
            if army_ok && info.terrain == Terrain::Sea {
                return Err(MapError::ArmyEdgeSea(edge.to_string()));
            }
            if fleet_ok && info.has_coasts() && coast == Coast::None {
                return Err(MapError::MissingCoast(edge.to_string()));
            }
            if army_ok && coast != Coast::None {
                return Err(MapError::MalformedEdge(edge.to_string()));
            }
        }

        out.push(AdjacencyEntry {
            from,
            from_coast,
            to,
            to_coast,
            army_ok,
            fleet_ok,
        });
        out.push(AdjacencyEntry {
            from: to,
            from_coast: to_coast,
            to: from,
            to_coast: from_coast,
            army_ok,
            fleet_ok,
        });
        Ok(())
    }

    fn parse_endpoint(&self, edge: &str, s: &str) -> Result<(ProvinceId, Coast), MapError> {
        let (abbr, coast) = match s.split_once('/') {
            Some((abbr, coast)) => (abbr.trim(), coast.trim()),
            None => (s.trim(), ""),
        };
        let id = self.province(abbr).ok_or_else(|| MapError::UnknownProvince {
            edge: edge.to_string(),
            province: abbr.to_string(),
        })?;
        let unknown_coast = || MapError::UnknownCoast {
            edge: edge.to_string(),
            province: abbr.to_string(),
            coast: coast.to_string(),
        };
        let coast = Coast::from_abbr(coast).ok_or_else(unknown_coast)?;
        if coast != Coast::None && !self.provinces[id.index()].coasts.contains(&coast) {
            return Err(unknown_coast());
        }
        Ok((id, coast))
    }

    /// Returns the map's name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the number of provinces on the map.
    pub fn province_count(&self) -> usize {
        self.provinces.len()
    }

    /// Iterates over all province ids in index order.
    pub fn provinces(&self) -> impl Iterator<Item = ProvinceId> + '_ {
        (0..self.provinces.len()).map(|i| ProvinceId(i as u8))
    }

    /// Looks up a province by its abbreviation.
    pub fn province(&self, abbr: &str) -> Option<ProvinceId> {
        self.by_abbr.get(abbr).copied()
    }

    /// Returns the metadata of a province.
    ///
    /// Panics if the id does not belong to this map; use `get` for ids that
    /// come from outside the crate.
    pub fn info(&self, id: ProvinceId) -> &ProvinceInfo {
        &self.provinces[id.index()]
    }

    /// Returns the metadata of a province, or None for a foreign id.
    pub fn get(&self, id: ProvinceId) -> Option<&ProvinceInfo> {
        self.provinces.get(id.index())
    }

    /// Returns the 3-letter abbreviation of a province.
    pub fn abbr(&self, id: ProvinceId) -> &str {
        &self.provinces[id.index()].abbr
    }

    /// Returns all supply centers on the map.
    pub fn supply_centers(&self) -> impl Iterator<Item = ProvinceId> + '_ {
        self.provinces().filter(|p| self.info(*p).supply_center)
    }

    /// Returns the home supply centers of a power.
    pub fn home_centers(&self, power: Power) -> impl Iterator<Item = ProvinceId> + '_ {
        self.provinces()
            .filter(move |p| self.info(*p).supply_center && self.info(*p).home == Some(power))
    }

    /// Returns the adjacency entries originating from the given province.
    #[inline]
    pub fn adj_from(&self, prov: ProvinceId) -> &[AdjacencyEntry] {
        let (start, end) = self.offsets[prov.index()];
        &self.entries[start as usize..end as usize]
    }

    /// Returns all directed adjacency entries.
    pub fn entries(&self) -> &[AdjacencyEntry] {
        &self.entries
    }

    /// Returns true if a unit of the given type can move from `src` to `dst`,
    /// optionally specifying coasts for fleet movement on split-coast provinces.
    ///
    /// A `Coast::None` on either side matches any coast.
    pub fn is_adjacent(
        &self,
        src: ProvinceId,
        src_coast: Coast,
        dst: ProvinceId,
        dst_coast: Coast,
        is_fleet: bool,
    ) -> bool {
        self.adj_from(src).iter().any(|adj| {
            adj.to == dst
                && passable(adj, is_fleet)
                && coast_matches(src_coast, adj.from_coast)
                && coast_matches(dst_coast, adj.to_coast)
        })
    }

    /// Returns all coasts at the destination reachable by fleet from the given source and coast.
    pub fn fleet_coasts_to(&self, src: ProvinceId, src_coast: Coast, dst: ProvinceId) -> Vec<Coast> {
        let mut coasts = Vec::new();
        for adj in self.adj_from(src) {
            if adj.to != dst || !adj.fleet_ok || !coast_matches(src_coast, adj.from_coast) {
                continue;
            }
            if !coasts.contains(&adj.to_coast) {
                coasts.push(adj.to_coast);
            }
        }
        coasts
    }

    /// Returns all provinces adjacent to the given province for the given unit type.
    pub fn provinces_adjacent_to(
        &self,
        prov: ProvinceId,
        coast: Coast,
        is_fleet: bool,
    ) -> Vec<ProvinceId> {
        let mut result = Vec::new();
        for adj in self.adj_from(prov) {
            if !passable(adj, is_fleet) || !coast_matches(coast, adj.from_coast) {
                continue;
            }
            if !result.contains(&adj.to) {
                result.push(adj.to);
            }
        }
        result
    }

    /// Returns every province sharing any border with `prov`, regardless of unit type.
    pub fn neighbors(&self, prov: ProvinceId) -> Vec<ProvinceId> {
        let mut result: Vec<ProvinceId> = self.adj_from(prov).iter().map(|a| a.to).collect();
        result.dedup();
        result
    }
}

#[inline]
fn passable(adj: &AdjacencyEntry, is_fleet: bool) -> bool {
    if is_fleet {
        adj.fleet_ok
    } else {
        adj.army_ok
    }
}

#[inline]
fn coast_matches(wanted: Coast, actual: Coast) -> bool {
    wanted == Coast::None || actual == Coast::None || wanted == actual
}
