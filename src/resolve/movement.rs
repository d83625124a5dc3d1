//! Movement-phase adjudication.
//!
//! Every order contributes decisions: whether a move succeeds, whether a
//! convoyed move has a path, whether a unit is dislodged and whether a
//! support is given. Each pass recomputes min/max bounds for the attack,
//! hold, defend and prevent strengths from the decisions made so far and
//! settles whatever those bounds determine. Decisions never flip once made,
//! so passes repeat until one changes nothing.
//!
//! A stalled loop means the remaining decisions depend on each other:
//! - a cycle of moves (circular movement, or a swap where one side is
//!   convoyed) succeeds as a whole;
//! - otherwise a convoy paradox is broken by failing the undecided convoyed
//!   moves.
//!
//! Each fallback settles at least one decision. The number of fallback
//! rounds is capped by the order count + 1; exceeding the cap is reported
//! as `AdjudicationError::NoConvergence`.

use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use crate::board::{
    AdjacencyGraph, BoardState, Coast, DislodgedUnit, Order, OrderUnit, Phase, Power, ProvinceId,
    Unit,
};
use crate::error::AdjudicationError;

use super::convoy;
use super::cycle::find_cycles;
use super::retreat::retreat_options;
use super::{check_board, collect_orders, OrderResult, Reason, ResolvedOrder};

/// The outcome of a movement phase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovementReport {
    /// One entry per unit on the board, in province order. Units without a
    /// legal order appear with the implicit hold they were given.
    pub results: Vec<ResolvedOrder>,
    /// Rejected and superseded submissions.
    pub rejected: Vec<ResolvedOrder>,
    /// Units dislodged this phase, with their retreat options.
    pub dislodged: Vec<DislodgedUnit>,
    /// Provinces left empty by a standoff.
    pub standoffs: Vec<ProvinceId>,
}

impl MovementReport {
    /// Returns the result for the unit that started the phase in `province`.
    pub fn result_at(&self, province: ProvinceId) -> Option<OrderResult> {
        self.results
            .iter()
            .find(|r| r.order.province() == Some(province))
            .map(|r| r.result)
    }
}

/// Resolves a movement phase.
///
/// Each `(Order, Power)` pair is an order submitted by that power. Orders
/// are validated first; rejected orders leave their unit holding.
#[instrument(skip_all, fields(year = state.year, season = ?state.season))]
pub fn resolve_movement(
    orders: &[(Order, Power)],
    state: &BoardState,
    map: &AdjacencyGraph,
) -> Result<MovementReport, AdjudicationError> {
    if state.phase != Phase::Movement {
        return Err(AdjudicationError::WrongPhase {
            expected: Phase::Movement,
            actual: state.phase,
        });
    }
    check_board(state, map)?;

    let submissions = collect_orders(orders, state, map)?;
    let mut adj = Adjudicator::new(state, map, &submissions.by_province());
    adj.run()?;
    let report = adj.into_report(submissions.rejected);

    info!(
        orders = report.results.len(),
        rejected = report.rejected.len(),
        dislodged = report.dislodged.len(),
        standoffs = report.standoffs.len(),
        "movement resolved"
    );
    Ok(report)
}

/// Commits a movement report to the board.
///
/// Successful moves relocate their units, dislodged units move into the
/// dislodged slot of their province, and standoffs are recorded for the
/// retreat phase.
pub fn apply_movement(
    state: &mut BoardState,
    report: &MovementReport,
    map: &AdjacencyGraph,
) -> Result<(), AdjudicationError> {
    let mut arrivals = Vec::new();
    for r in &report.results {
        if let (Order::Move { unit, dest, .. }, OrderResult::Succeeded) = (r.order, r.result) {
            if let Some(mut moved) = state.remove_unit(unit.province()) {
                moved.province = dest.province;
                moved.coast = if moved.is_fleet() { dest.coast } else { Coast::None };
                arrivals.push(moved);
            }
        }
    }
    for d in &report.dislodged {
        state.remove_unit(d.unit.province);
    }
    for unit in arrivals {
        if !state.place_unit(unit) {
            return Err(AdjudicationError::OccupiedProvince {
                abbr: map.abbr(unit.province).to_string(),
            });
        }
    }

    state.clear_dislodged();
    for d in &report.dislodged {
        state.set_dislodged(d.clone());
    }
    state.set_standoffs(report.standoffs.iter().copied());
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Decision {
    Undecided,
    Yes,
    No,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
    Hold,
    Move { dest: ProvinceId, convoyed: bool },
    SupportHold { target: ProvinceId },
    SupportMove { target: ProvinceId, dest: ProvinceId },
    Convoy { from: ProvinceId, to: ProvinceId },
}

impl Kind {
    fn of(order: &Order) -> Option<Kind> {
        Some(match *order {
            Order::Hold { .. } => Kind::Hold,
            Order::Move {
                dest, via_convoy, ..
            } => Kind::Move {
                dest: dest.province,
                convoyed: via_convoy,
            },
            Order::SupportHold { supported, .. } => Kind::SupportHold {
                target: supported.province(),
            },
            Order::SupportMove {
                supported, dest, ..
            } => Kind::SupportMove {
                target: supported.province(),
                dest: dest.province,
            },
            Order::Convoy {
                convoyed_from,
                convoyed_to,
                ..
            } => Kind::Convoy {
                from: convoyed_from.province,
                to: convoyed_to.province,
            },
            _ => return None,
        })
    }
}

struct Entry {
    unit: Unit,
    order: Order,
    kind: Kind,
    /// False for a support or convoy whose counterpart was not ordered.
    matched: bool,
}

type Bounds = (u32, u32);

struct Adjudicator<'a> {
    map: &'a AdjacencyGraph,
    entries: Vec<Entry>,
    /// Entry index of the unit standing in each province.
    at: HashMap<ProvinceId, usize>,
    /// Entry indices of the moves into each province.
    attackers: HashMap<ProvinceId, Vec<usize>>,
    /// Matching supports for each entry's move or hold.
    supports: Vec<Vec<usize>>,
    /// Matching convoy fleets for each convoyed move.
    convoys: Vec<Vec<usize>>,
    mv: Vec<Decision>,
    path: Vec<Decision>,
    dislodged: Vec<Decision>,
    support: Vec<Decision>,
}

impl<'a> Adjudicator<'a> {
    fn new(
        state: &BoardState,
        map: &'a AdjacencyGraph,
        orders: &HashMap<ProvinceId, (Power, Order)>,
    ) -> Self {
        let mut entries = Vec::new();
        for unit in state.units() {
            let hold = Order::Hold {
                unit: OrderUnit {
                    unit_type: unit.unit_type,
                    location: unit.location(),
                },
            };
            let (order, kind) = orders
                .get(&unit.province)
                .and_then(|(_, o)| Kind::of(o).map(|k| (*o, k)))
                .unwrap_or((hold, Kind::Hold));
            entries.push(Entry {
                unit: *unit,
                order,
                kind,
                matched: true,
            });
        }

        let n = entries.len();
        let at: HashMap<ProvinceId, usize> = entries
            .iter()
            .enumerate()
            .map(|(i, e)| (e.unit.province, i))
            .collect();
        let mut attackers: HashMap<ProvinceId, Vec<usize>> = HashMap::new();
        for (i, e) in entries.iter().enumerate() {
            if let Kind::Move { dest, .. } = e.kind {
                attackers.entry(dest).or_default().push(i);
            }
        }

        let mut supports = vec![Vec::new(); n];
        let mut convoys = vec![Vec::new(); n];
        for i in 0..n {
            let kind_at = |p: ProvinceId| at.get(&p).map(|&j| (j, entries[j].kind));
            let matched = match entries[i].kind {
                Kind::Hold | Kind::Move { .. } => true,
                Kind::SupportHold { target } => match kind_at(target) {
                    Some((j, k)) if !matches!(k, Kind::Move { .. }) => {
                        supports[j].push(i);
                        true
                    }
                    _ => false,
                },
                Kind::SupportMove { target, dest } => match kind_at(target) {
                    Some((j, Kind::Move { dest: d, .. })) if d == dest => {
                        supports[j].push(i);
                        true
                    }
                    _ => false,
                },
                Kind::Convoy { from, to } => match kind_at(from) {
                    Some((j, Kind::Move { dest, convoyed: true })) if dest == to => {
                        convoys[j].push(i);
                        true
                    }
                    _ => false,
                },
            };
            entries[i].matched = matched;
        }

        let mut mv = vec![Decision::No; n];
        let mut path = vec![Decision::No; n];
        let mut support = vec![Decision::No; n];
        for (i, e) in entries.iter().enumerate() {
            match e.kind {
                Kind::Move { convoyed, .. } => {
                    mv[i] = Decision::Undecided;
                    path[i] = if convoyed {
                        Decision::Undecided
                    } else {
                        Decision::Yes
                    };
                }
                Kind::SupportHold { .. } | Kind::SupportMove { .. } if e.matched => {
                    support[i] = Decision::Undecided;
                }
                _ => {}
            }
        }

        Adjudicator {
            map,
            entries,
            at,
            attackers,
            supports,
            convoys,
            mv,
            path,
            dislodged: vec![Decision::Undecided; n],
            support,
        }
    }

    fn run(&mut self) -> Result<(), AdjudicationError> {
        let cap = self.entries.len() + 1;
        let mut rounds = 0;
        loop {
            while self.sweep() {}
            if self.all_decided() {
                return Ok(());
            }
            rounds += 1;
            if rounds > cap || !(self.break_cycles() || self.break_paradoxes()) {
                return Err(AdjudicationError::NoConvergence { rounds });
            }
        }
    }

    fn all_decided(&self) -> bool {
        [&self.mv, &self.path, &self.dislodged, &self.support]
            .iter()
            .all(|ds| ds.iter().all(|d| *d != Decision::Undecided))
    }

    /// One pass over all undecided decisions. Returns true if any was settled.
    fn sweep(&mut self) -> bool {
        let mut changed = false;
        for i in 0..self.entries.len() {
            if self.path[i] == Decision::Undecided {
                if let Some(d) = self.decide_path(i) {
                    self.path[i] = d;
                    changed = true;
                }
            }
            if self.mv[i] == Decision::Undecided {
                if let Some(d) = self.decide_move(i) {
                    self.mv[i] = d;
                    changed = true;
                }
            }
            if self.dislodged[i] == Decision::Undecided {
                if let Some(d) = self.decide_dislodged(i) {
                    self.dislodged[i] = d;
                    changed = true;
                }
            }
            if self.support[i] == Decision::Undecided {
                if let Some(d) = self.decide_support(i) {
                    self.support[i] = d;
                    changed = true;
                }
            }
        }
        changed
    }

    fn is_move(&self, i: usize) -> bool {
        matches!(self.entries[i].kind, Kind::Move { .. })
    }

    fn is_convoyed(&self, i: usize) -> bool {
        matches!(self.entries[i].kind, Kind::Move { convoyed: true, .. })
    }

    fn dest(&self, i: usize) -> Option<ProvinceId> {
        match self.entries[i].kind {
            Kind::Move { dest, .. } => Some(dest),
            _ => None,
        }
    }

    fn occupant(&self, province: ProvinceId) -> Option<usize> {
        self.at.get(&province).copied()
    }

    fn attackers_of(&self, province: ProvinceId) -> &[usize] {
        self.attackers
            .get(&province)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Returns the unit that `i` meets head to head: both move into each
    /// other's province and neither goes by convoy.
    fn head_to_head(&self, i: usize) -> Option<usize> {
        let j = self.occupant(self.dest(i)?)?;
        let back = self.dest(j)? == self.entries[i].unit.province;
        (back && !self.is_convoyed(i) && !self.is_convoyed(j)).then_some(j)
    }

    /// True when `k` was beaten by the unit it met head to head. The winner
    /// leaves its province, so the empty origin is not a standoff.
    fn lost_head_to_head(&self, k: usize) -> bool {
        self.head_to_head(k).is_some_and(|j| self.mv[j] == Decision::Yes)
    }

    /// Counts the supports for entry `i`, skipping those from `exclude`.
    fn support_count(&self, i: usize, exclude: Option<Power>) -> Bounds {
        let mut bounds = (0, 0);
        for &s in &self.supports[i] {
            if Some(self.entries[s].unit.power) == exclude {
                continue;
            }
            match self.support[s] {
                Decision::Yes => {
                    bounds.0 += 1;
                    bounds.1 += 1;
                }
                Decision::Undecided => bounds.1 += 1,
                Decision::No => {}
            }
        }
        bounds
    }

    fn attack(&self, i: usize) -> Bounds {
        let Some(dest) = self.dest(i) else {
            return (0, 0);
        };
        if self.path[i] == Decision::No {
            return (0, 0);
        }
        let me = self.entries[i].unit.power;
        let full = plus_one(self.support_count(i, None));
        let against = |j: usize| {
            let defender = self.entries[j].unit.power;
            if defender == me {
                (0, 0)
            } else {
                plus_one(self.support_count(i, Some(defender)))
            }
        };

        let (mut lo, hi) = match self.occupant(dest) {
            None => full,
            Some(j) if self.is_move(j) && self.head_to_head(i).is_none() => match self.mv[j] {
                Decision::Yes => full,
                Decision::No => against(j),
                Decision::Undecided => {
                    let stay = against(j);
                    (full.0.min(stay.0), full.1.max(stay.1))
                }
            },
            Some(j) => against(j),
        };
        if self.path[i] == Decision::Undecided {
            lo = 0;
        }
        (lo, hi)
    }

    fn hold(&self, province: ProvinceId) -> Bounds {
        let Some(j) = self.occupant(province) else {
            return (0, 0);
        };
        if self.is_move(j) {
            return match self.mv[j] {
                Decision::Yes => (0, 0),
                Decision::No => (1, 1),
                Decision::Undecided => (0, 1),
            };
        }
        plus_one(self.support_count(j, None))
    }

    fn defend(&self, j: usize) -> Bounds {
        plus_one(self.support_count(j, None))
    }

    fn prevent(&self, k: usize) -> Bounds {
        if self.path[k] == Decision::No {
            return (0, 0);
        }
        let (mut lo, mut hi) = plus_one(self.support_count(k, None));
        if self.path[k] == Decision::Undecided {
            lo = 0;
        }
        if let Some(j) = self.head_to_head(k) {
            match self.mv[j] {
                Decision::Yes => hi = 0,
                Decision::Undecided => lo = 0,
                Decision::No => {}
            }
            lo = lo.min(hi);
        }
        (lo, hi)
    }

    fn decide_path(&self, i: usize) -> Option<Decision> {
        let Kind::Move { dest, .. } = self.entries[i].kind else {
            return None;
        };
        let origin = self.entries[i].unit.province;
        let fleets = |ok: fn(Decision) -> bool| -> Vec<ProvinceId> {
            self.convoys[i]
                .iter()
                .filter(|&&c| ok(self.dislodged[c]))
                .map(|&c| self.entries[c].unit.province)
                .collect()
        };
        let possible = fleets(|d| d != Decision::Yes);
        if !convoy::route_exists(self.map, origin, dest, &possible) {
            return Some(Decision::No);
        }
        let certain = fleets(|d| d == Decision::No);
        convoy::route_exists(self.map, origin, dest, &certain).then_some(Decision::Yes)
    }

    fn decide_move(&self, i: usize) -> Option<Decision> {
        let dest = self.dest(i)?;
        let (attack_lo, attack_hi) = self.attack(i);
        let (defend_lo, defend_hi) = match self.head_to_head(i) {
            Some(j) => self.defend(j),
            None => self.hold(dest),
        };

        let mut succeeds = attack_lo > defend_hi;
        let mut fails = attack_hi <= defend_lo;
        for &k in self.attackers_of(dest) {
            if k == i {
                continue;
            }
            let (prevent_lo, prevent_hi) = self.prevent(k);
            succeeds &= attack_lo > prevent_hi;
            fails |= attack_hi <= prevent_lo;
        }

        if fails {
            Some(Decision::No)
        } else if succeeds {
            Some(Decision::Yes)
        } else {
            None
        }
    }

    fn decide_dislodged(&self, j: usize) -> Option<Decision> {
        let moving = self.is_move(j);
        if moving && self.mv[j] == Decision::Yes {
            return Some(Decision::No);
        }
        let attackers = self.attackers_of(self.entries[j].unit.province);
        if attackers.iter().all(|&k| self.mv[k] == Decision::No) {
            return Some(Decision::No);
        }
        let beaten = attackers.iter().any(|&k| self.mv[k] == Decision::Yes);
        (beaten && (!moving || self.mv[j] == Decision::No)).then_some(Decision::Yes)
    }

    fn decide_support(&self, s: usize) -> Option<Decision> {
        let into = match self.entries[s].kind {
            Kind::SupportHold { target } => target,
            Kind::SupportMove { dest, .. } => dest,
            _ => return None,
        };
        if self.dislodged[s] == Decision::Yes {
            return Some(Decision::No);
        }
        let me = &self.entries[s].unit;
        let mut pending = false;
        for &k in self.attackers_of(me.province) {
            let attacker = &self.entries[k].unit;
            if attacker.power == me.power || attacker.province == into {
                continue;
            }
            match self.path[k] {
                Decision::Yes => return Some(Decision::No),
                Decision::Undecided => pending = true,
                Decision::No => {}
            }
        }
        (!pending && self.dislodged[s] == Decision::No).then_some(Decision::Yes)
    }

    /// Settles every cycle of undecided moves as successful.
    fn break_cycles(&mut self) -> bool {
        let next: Vec<Option<usize>> = (0..self.entries.len())
            .map(|i| {
                if self.mv[i] != Decision::Undecided {
                    return None;
                }
                let j = self.occupant(self.dest(i)?)?;
                (self.is_move(j) && self.mv[j] == Decision::Undecided).then_some(j)
            })
            .collect();

        let mut changed = false;
        for cycle in find_cycles(&next) {
            if cycle.len() == 2 && self.head_to_head(cycle[0]) == Some(cycle[1]) {
                continue;
            }
            if cycle.iter().any(|&i| self.path[i] == Decision::Undecided) {
                continue;
            }
            debug!(
                units = ?cycle.iter().map(|&i| self.map.abbr(self.entries[i].unit.province)).collect::<Vec<_>>(),
                "circular movement"
            );
            for &i in &cycle {
                self.mv[i] = Decision::Yes;
            }
            changed = true;
        }
        changed
    }

    /// Fails every convoyed move whose path is still undecided.
    fn break_paradoxes(&mut self) -> bool {
        let mut changed = false;
        for i in 0..self.entries.len() {
            if self.is_convoyed(i) && self.path[i] == Decision::Undecided {
                debug!(army = self.map.abbr(self.entries[i].unit.province), "convoy paradox");
                self.path[i] = Decision::No;
                if self.mv[i] == Decision::Undecided {
                    self.mv[i] = Decision::No;
                }
                changed = true;
            }
        }
        changed
    }

    /// True if the failed move `i` was aimed at a staying unit of its own power.
    fn blocked_by_own_unit(&self, i: usize) -> bool {
        let Some(j) = self.dest(i).and_then(|d| self.occupant(d)) else {
            return false;
        };
        self.entries[j].unit.power == self.entries[i].unit.power
            && (!self.is_move(j) || self.head_to_head(i).is_some() || self.mv[j] == Decision::No)
    }

    fn outcome(&self, i: usize) -> OrderResult {
        let e = &self.entries[i];
        let dislodged = self.dislodged[i] == Decision::Yes;
        let reason = match e.kind {
            Kind::Move { dest, convoyed } => {
                if self.mv[i] == Decision::Yes {
                    return OrderResult::Succeeded;
                }
                if dislodged {
                    Reason::Dislodged
                } else if convoyed && self.path[i] == Decision::No {
                    let ordered: Vec<ProvinceId> =
                        self.convoys[i].iter().map(|&c| self.entries[c].unit.province).collect();
                    if convoy::route_exists(self.map, e.unit.province, dest, &ordered) {
                        Reason::ConvoyDisrupted
                    } else {
                        Reason::NoConvoyPath
                    }
                } else if self.blocked_by_own_unit(i) {
                    Reason::SelfDislodgementBlocked
                } else {
                    Reason::Bounced
                }
            }
            _ if dislodged => Reason::Dislodged,
            Kind::Hold => return OrderResult::Succeeded,
            Kind::SupportHold { .. } | Kind::SupportMove { .. } => {
                if !e.matched {
                    Reason::Unmatched
                } else if self.support[i] == Decision::No {
                    Reason::Cut
                } else {
                    return OrderResult::Succeeded;
                }
            }
            Kind::Convoy { .. } => {
                if !e.matched {
                    Reason::Unmatched
                } else {
                    return OrderResult::Succeeded;
                }
            }
        };
        OrderResult::Failed(reason)
    }

    fn into_report(self, rejected: Vec<ResolvedOrder>) -> MovementReport {
        let mut results = Vec::with_capacity(self.entries.len());
        for (i, e) in self.entries.iter().enumerate() {
            let result = self.outcome(i);
            debug!(
                power = %e.unit.power,
                unit = self.map.abbr(e.unit.province),
                order = ?e.kind,
                ?result,
                "order resolved"
            );
            results.push(ResolvedOrder {
                order: e.order,
                power: e.unit.power,
                result,
            });
        }

        let mut occupied = BTreeSet::new();
        for (i, e) in self.entries.iter().enumerate() {
            match e.kind {
                Kind::Move { dest, .. } if self.mv[i] == Decision::Yes => {
                    occupied.insert(dest);
                }
                _ if self.dislodged[i] != Decision::Yes => {
                    occupied.insert(e.unit.province);
                }
                _ => {}
            }
        }

        let standoffs: BTreeSet<ProvinceId> = self
            .attackers
            .iter()
            .filter(|(p, _)| !occupied.contains(*p))
            .filter(|(_, moves)| {
                moves.iter().any(|&k| {
                    self.mv[k] == Decision::No
                        && self.path[k] == Decision::Yes
                        && !self.lost_head_to_head(k)
                })
            })
            .map(|(p, _)| *p)
            .collect();

        let mut dislodged = Vec::new();
        for (j, e) in self.entries.iter().enumerate() {
            if self.dislodged[j] != Decision::Yes {
                continue;
            }
            let attacker_from = self
                .attackers_of(e.unit.province)
                .iter()
                .find(|&&k| self.mv[k] == Decision::Yes)
                .filter(|&&k| !self.is_convoyed(k))
                .map(|&k| self.entries[k].unit.province);
            let retreats = retreat_options(
                &e.unit,
                attacker_from,
                |p| occupied.contains(&p),
                &standoffs,
                self.map,
            );
            debug!(
                unit = self.map.abbr(e.unit.province),
                options = retreats.len(),
                "unit dislodged"
            );
            dislodged.push(DislodgedUnit {
                unit: e.unit,
                attacker_from,
                retreats,
            });
        }

        MovementReport {
            results,
            rejected,
            dislodged,
            standoffs: standoffs.into_iter().collect(),
        }
    }
}

#[inline]
fn plus_one((lo, hi): Bounds) -> Bounds {
    (lo + 1, hi + 1)
}
