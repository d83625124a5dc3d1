//! Convoy routing.
//!
//! A convoyed army needs an unbroken chain of convoying fleets, each in a
//! sea province, linking its origin to its destination. The adjudicator
//! decides which fleets may take part; this module only answers whether
//! those fleets form a chain.

use std::collections::VecDeque;

use crate::board::{AdjacencyGraph, Coast, ProvinceId};

/// Finds a chain of fleets from `from` to `to` using only `fleets`.
///
/// Returns the fleet provinces in order from origin to destination, or
/// None when no chain exists.
pub fn find_route(
    map: &AdjacencyGraph,
    from: ProvinceId,
    to: ProvinceId,
    fleets: &[ProvinceId],
) -> Option<Vec<ProvinceId>> {
    let touches = |fleet: ProvinceId, coast: ProvinceId| {
        map.is_adjacent(fleet, Coast::None, coast, Coast::None, true)
    };

    let mut parent: Vec<Option<usize>> = vec![None; fleets.len()];
    let mut seen = vec![false; fleets.len()];
    let mut queue = VecDeque::new();

    for (i, &f) in fleets.iter().enumerate() {
        if touches(f, from) {
            seen[i] = true;
            queue.push_back(i);
        }
    }

    while let Some(i) = queue.pop_front() {
        if touches(fleets[i], to) {
            let mut route = vec![fleets[i]];
            let mut cur = i;
            while let Some(prev) = parent[cur] {
                route.push(fleets[prev]);
                cur = prev;
            }
            route.reverse();
            return Some(route);
        }
        for (j, &next) in fleets.iter().enumerate() {
            if !seen[j] && touches(fleets[i], next) {
                seen[j] = true;
                parent[j] = Some(i);
                queue.push_back(j);
            }
        }
    }
    None
}

/// Returns true if `fleets` link `from` and `to`.
pub fn route_exists(
    map: &AdjacencyGraph,
    from: ProvinceId,
    to: ProvinceId,
    fleets: &[ProvinceId],
) -> bool {
    find_route(map, from, to, fleets).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map() -> &'static AdjacencyGraph {
        AdjacencyGraph::standard()
    }

    fn p(abbr: &str) -> ProvinceId {
        map().province(abbr).unwrap()
    }

    #[test]
    fn single_fleet_route() {
        let route = find_route(map(), p("lon"), p("nwy"), &[p("nth")]);
        assert_eq!(route, Some(vec![p("nth")]));
    }

    #[test]
    fn multi_fleet_route_in_order() {
        let fleets = [p("wes"), p("mao"), p("tys")];
        let route = find_route(map(), p("bre"), p("tun"), &fleets).unwrap();
        assert_eq!(route, vec![p("mao"), p("wes")]);
    }

    #[test]
    fn broken_chain() {
        assert!(!route_exists(map(), p("lon"), p("tun"), &[p("nth"), p("tys")]));
        assert!(!route_exists(map(), p("lon"), p("nwy"), &[]));
    }

    #[test]
    fn route_into_split_coast_province() {
        assert!(route_exists(map(), p("bre"), p("spa"), &[p("mao")]));
        assert!(route_exists(map(), p("mar"), p("spa"), &[p("gol")]));
    }
}
