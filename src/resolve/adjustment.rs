//! Adjustment-phase resolution.
//!
//! Applies builds and destroys at the end of a game year. A power with more
//! centers than units may build up to the difference; one with fewer must
//! destroy. When too few destroys were ordered, civil disorder removes the
//! units furthest from home.

use std::cmp::Reverse;
use std::collections::VecDeque;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use crate::board::{
    AdjacencyGraph, BoardState, Order, OrderUnit, Phase, Power, ProvinceId, Unit, ALL_POWERS,
};
use crate::error::AdjudicationError;
use crate::validate::adjustment::quota;

use super::{check_board, collect_orders, OrderResult, Reason, ResolvedOrder};

/// The outcome of an adjustment phase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdjustmentReport {
    /// Accepted orders with their results, followed by the destroys chosen
    /// by civil disorder.
    pub results: Vec<ResolvedOrder>,
    /// Rejected and superseded submissions.
    pub rejected: Vec<ResolvedOrder>,
    pub built: Vec<Unit>,
    /// Units removed by destroy orders.
    pub destroyed: Vec<Unit>,
    /// Units removed by civil disorder.
    pub civil_disorder: Vec<Unit>,
}

/// Resolves an adjustment phase for all powers.
#[instrument(skip_all, fields(year = state.year))]
pub fn resolve_adjustments(
    orders: &[(Order, Power)],
    state: &BoardState,
    map: &AdjacencyGraph,
) -> Result<AdjustmentReport, AdjudicationError> {
    if state.phase != Phase::Adjustment {
        return Err(AdjudicationError::WrongPhase {
            expected: Phase::Adjustment,
            actual: state.phase,
        });
    }
    check_board(state, map)?;

    let submissions = collect_orders(orders, state, map)?;
    let mut report = AdjustmentReport {
        results: Vec::new(),
        rejected: submissions.rejected,
        built: Vec::new(),
        destroyed: Vec::new(),
        civil_disorder: Vec::new(),
    };

    for power in ALL_POWERS {
        let quota = quota(power, state);
        let allowed = quota.unsigned_abs() as usize;
        let mut used = 0;

        for &(p, order) in &submissions.accepted {
            if p != power {
                continue;
            }
            let result = if used < allowed {
                used += 1;
                match order {
                    Order::Build { unit } => report.built.push(Unit {
                        unit_type: unit.unit_type,
                        power,
                        province: unit.province(),
                        coast: unit.location.coast,
                    }),
                    Order::Destroy { unit } => {
                        if let Some(u) = state.unit_at(unit.province()) {
                            report.destroyed.push(*u);
                        }
                    }
                    _ => {}
                }
                OrderResult::Succeeded
            } else {
                OrderResult::Failed(Reason::QuotaExceeded)
            };
            report.results.push(ResolvedOrder {
                order,
                power,
                result,
            });
        }

        if quota < 0 && used < allowed {
            let chosen: Vec<ProvinceId> = report
                .destroyed
                .iter()
                .filter(|u| u.power == power)
                .map(|u| u.province)
                .collect();
            for unit in civil_disorder(power, allowed - used, state, map, &chosen) {
                debug!(%power, unit = map.abbr(unit.province), "civil disorder");
                report.results.push(ResolvedOrder {
                    order: Order::Destroy {
                        unit: OrderUnit {
                            unit_type: unit.unit_type,
                            location: unit.location(),
                        },
                    },
                    power,
                    result: OrderResult::Succeeded,
                });
                report.civil_disorder.push(unit);
            }
        }

        if quota != 0 {
            debug!(%power, quota, used, "adjustments resolved");
        }
    }

    info!(
        built = report.built.len(),
        destroyed = report.destroyed.len(),
        civil_disorder = report.civil_disorder.len(),
        "adjustments resolved"
    );
    Ok(report)
}

/// Picks `count` units of `power` to destroy, skipping `exclude`.
///
/// Units furthest from any of the power's home centers go first; ties are
/// broken fleets before armies, then by province abbreviation.
pub fn civil_disorder(
    power: Power,
    count: usize,
    state: &BoardState,
    map: &AdjacencyGraph,
    exclude: &[ProvinceId],
) -> Vec<Unit> {
    let mut candidates: Vec<(Reverse<u32>, bool, &str, Unit)> = state
        .units_of(power)
        .filter(|u| !exclude.contains(&u.province))
        .map(|u| {
            (
                Reverse(distance_to_home(u.province, power, map)),
                !u.is_fleet(),
                map.abbr(u.province),
                *u,
            )
        })
        .collect();
    candidates.sort_by(|a, b| (a.0, a.1, a.2).cmp(&(b.0, b.1, b.2)));
    candidates.into_iter().take(count).map(|c| c.3).collect()
}

/// Minimum number of steps from `from` to a home center of `power`,
/// crossing any border regardless of unit type.
///
/// Returns `u32::MAX` if no home center is reachable.
pub fn distance_to_home(from: ProvinceId, power: Power, map: &AdjacencyGraph) -> u32 {
    let is_home = |p: ProvinceId| {
        let info = map.info(p);
        info.supply_center && info.home == Some(power)
    };
    if is_home(from) {
        return 0;
    }

    let mut visited = vec![false; map.province_count()];
    visited[from.index()] = true;
    let mut queue = VecDeque::from([(from, 0u32)]);
    while let Some((prov, dist)) = queue.pop_front() {
        for next in map.neighbors(prov) {
            if visited[next.index()] {
                continue;
            }
            if is_home(next) {
                return dist + 1;
            }
            visited[next.index()] = true;
            queue.push_back((next, dist + 1));
        }
    }
    u32::MAX
}

/// Commits an adjustment report: destroyed units are removed and built
/// units placed.
pub fn apply_adjustments(
    state: &mut BoardState,
    report: &AdjustmentReport,
    map: &AdjacencyGraph,
) -> Result<(), AdjudicationError> {
    for unit in report.destroyed.iter().chain(&report.civil_disorder) {
        state.remove_unit(unit.province);
    }
    for unit in &report.built {
        if !state.place_unit(*unit) {
            return Err(AdjudicationError::OccupiedProvince {
                abbr: map.abbr(unit.province).to_string(),
            });
        }
    }
    Ok(())
}
