//! Game lifecycle.
//!
//! `GameState` owns the board, the orders submitted for the current phase and
//! the history of resolved phases. Each `resolve_phase` call consumes the
//! pending orders, resolves them with the resolver for the board's phase,
//! commits the result and advances the phase state machine.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use crate::board::{
    AdjacencyGraph, BoardState, Coast, Order, Phase, Power, Season, Unit, UnitType, ALL_POWERS,
};
use crate::config::GameConfig;
use crate::error::AdjudicationError;
use crate::resolve::phase::{advance_state, is_eliminated, solo_winner, CenterChange};
use crate::resolve::{
    apply_adjustments, apply_movement, apply_retreats, resolve_adjustments, resolve_movement,
    resolve_retreats, AdjustmentReport, MovementReport, RetreatReport,
};

/// Standard 1901 starting positions.
const STARTING_UNITS: [(Power, UnitType, &str, Coast); 22] = [
    (Power::Austria, UnitType::Army, "vie", Coast::None),
    (Power::Austria, UnitType::Army, "bud", Coast::None),
    (Power::Austria, UnitType::Fleet, "tri", Coast::None),
    (Power::England, UnitType::Fleet, "lon", Coast::None),
    (Power::England, UnitType::Fleet, "edi", Coast::None),
    (Power::England, UnitType::Army, "lvp", Coast::None),
    (Power::France, UnitType::Fleet, "bre", Coast::None),
    (Power::France, UnitType::Army, "par", Coast::None),
    (Power::France, UnitType::Army, "mar", Coast::None),
    (Power::Germany, UnitType::Fleet, "kie", Coast::None),
    (Power::Germany, UnitType::Army, "ber", Coast::None),
    (Power::Germany, UnitType::Army, "mun", Coast::None),
    (Power::Italy, UnitType::Fleet, "nap", Coast::None),
    (Power::Italy, UnitType::Army, "rom", Coast::None),
    (Power::Italy, UnitType::Army, "ven", Coast::None),
    (Power::Russia, UnitType::Fleet, "stp", Coast::South),
    (Power::Russia, UnitType::Army, "mos", Coast::None),
    (Power::Russia, UnitType::Army, "war", Coast::None),
    (Power::Russia, UnitType::Fleet, "sev", Coast::None),
    (Power::Turkey, UnitType::Fleet, "ank", Coast::None),
    (Power::Turkey, UnitType::Army, "con", Coast::None),
    (Power::Turkey, UnitType::Army, "smy", Coast::None),
];

/// Per-power bookkeeping that is not derivable from the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PowerRecord {
    pub active: bool,
    /// Year in which the power lost its last unit and center.
    pub eliminated_in: Option<u16>,
}

/// Why a game ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum Completion {
    /// A power reached the victory threshold.
    Victory { power: Power },
    /// Every other power was eliminated.
    LastPowerStanding { power: Power },
    /// The final configured year was played out.
    YearLimit { year: u16 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameStatus {
    InProgress,
    Completed(Completion),
}

/// The phase-specific part of a phase report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Resolution {
    Movement(MovementReport),
    Retreat(RetreatReport),
    Adjustment(AdjustmentReport),
}

/// Everything that happened when one phase was resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseReport {
    pub turn: u32,
    pub year: u16,
    pub season: Season,
    pub phase: Phase,
    pub resolution: Resolution,
    /// Supply centers that changed hands when the year's Fall turn ended.
    pub center_changes: Vec<CenterChange>,
    /// Powers eliminated by this phase.
    pub eliminated: Vec<Power>,
    /// Game status after the phase.
    pub status: GameStatus,
}

/// A game in progress.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameState {
    /// Number of phases resolved so far.
    pub turn: u32,
    pub board: BoardState,
    pub config: GameConfig,
    pub powers: BTreeMap<Power, PowerRecord>,
    /// Orders submitted for the current phase.
    #[serde(default)]
    pub orders: BTreeMap<Power, Vec<Order>>,
    #[serde(default)]
    pub history: Vec<PhaseReport>,
    pub status: GameStatus,
}

impl GameState {
    /// Starts a game from an arbitrary board.
    ///
    /// Powers with neither units nor centers on `board` start out eliminated.
    pub fn new(board: BoardState, config: GameConfig) -> Self {
        let powers = ALL_POWERS
            .iter()
            .map(|&power| {
                let active = !is_eliminated(power, &board);
                (
                    power,
                    PowerRecord {
                        active,
                        eliminated_in: (!active).then_some(board.year),
                    },
                )
            })
            .collect();
        GameState {
            turn: 0,
            board,
            config,
            powers,
            orders: BTreeMap::new(),
            history: Vec::new(),
            status: GameStatus::InProgress,
        }
    }

    /// Starts a standard game: 22 units and every home center owned, Spring
    /// movement of the configured start year.
    pub fn standard(config: GameConfig) -> Self {
        let map = AdjacencyGraph::standard();
        let mut board = BoardState::empty(config.start_year, Season::Spring, Phase::Movement);
        for (power, unit_type, abbr, coast) in STARTING_UNITS {
            let province = map
                .province(abbr)
                .expect("starting units lie on the standard map");
            board.place_unit(Unit {
                unit_type,
                power,
                province,
                coast,
            });
        }
        for power in ALL_POWERS {
            for center in map.home_centers(power) {
                board.set_sc_owner(center, Some(power));
            }
        }
        GameState::new(board, config)
    }

    pub fn is_completed(&self) -> bool {
        matches!(self.status, GameStatus::Completed(_))
    }

    /// Powers that have not been eliminated.
    pub fn active_powers(&self) -> impl Iterator<Item = Power> + '_ {
        self.powers
            .iter()
            .filter(|(_, r)| r.active)
            .map(|(&p, _)| p)
    }

    /// Queues orders for the current phase.
    ///
    /// Orders accumulate until the phase is resolved; a later order for the
    /// same unit replaces an earlier one at resolution time.
    pub fn submit_orders(
        &mut self,
        power: Power,
        orders: impl IntoIterator<Item = Order>,
    ) -> Result<(), AdjudicationError> {
        if self.is_completed() {
            return Err(AdjudicationError::GameOver);
        }
        self.orders.entry(power).or_default().extend(orders);
        Ok(())
    }

    /// Resolves the current phase with the pending orders and advances the
    /// game.
    #[instrument(skip_all, fields(turn = self.turn, year = self.board.year, season = ?self.board.season, phase = ?self.board.phase))]
    pub fn resolve_phase(&mut self, map: &AdjacencyGraph) -> Result<PhaseReport, AdjudicationError> {
        if self.is_completed() {
            return Err(AdjudicationError::GameOver);
        }

        let orders: Vec<(Order, Power)> = self
            .orders
            .iter()
            .flat_map(|(&power, list)| list.iter().map(move |&o| (o, power)))
            .collect();
        let (year, season, phase) = (self.board.year, self.board.season, self.board.phase);

        // Resolve against a copy so a failed call leaves the game untouched.
        let mut board = self.board.clone();
        let (resolution, has_dislodgements) = match phase {
            Phase::Movement => {
                let report = resolve_movement(&orders, &board, map)?;
                apply_movement(&mut board, &report, map)?;
                let dislodged = !report.dislodged.is_empty();
                (Resolution::Movement(report), dislodged)
            }
            Phase::Retreat => {
                let report = resolve_retreats(&orders, &board, map)?;
                apply_retreats(&mut board, &report, map)?;
                (Resolution::Retreat(report), false)
            }
            Phase::Adjustment => {
                let report = resolve_adjustments(&orders, &board, map)?;
                apply_adjustments(&mut board, &report, map)?;
                (Resolution::Adjustment(report), false)
            }
        };
        let center_changes = advance_state(&mut board, has_dislodgements, map);
        self.board = board;
        self.orders.clear();
        self.turn += 1;

        let eliminated = self.record_eliminations(year);
        self.status = self.check_completion();
        if let GameStatus::Completed(completion) = self.status {
            info!(?completion, "game completed");
        }
        info!(
            next_year = self.board.year,
            next_season = ?self.board.season,
            next_phase = ?self.board.phase,
            center_changes = center_changes.len(),
            "phase resolved"
        );

        let report = PhaseReport {
            turn: self.turn,
            year,
            season,
            phase,
            resolution,
            center_changes,
            eliminated,
            status: self.status,
        };
        self.history.push(report.clone());
        Ok(report)
    }

    fn record_eliminations(&mut self, year: u16) -> Vec<Power> {
        let mut eliminated = Vec::new();
        for (&power, record) in self.powers.iter_mut() {
            if record.active && is_eliminated(power, &self.board) {
                record.active = false;
                record.eliminated_in = Some(year);
                info!(%power, year, "power eliminated");
                eliminated.push(power);
            }
        }
        eliminated
    }

    fn check_completion(&self) -> GameStatus {
        if let Some(power) = solo_winner(&self.board, self.config.victory_centers) {
            return GameStatus::Completed(Completion::Victory { power });
        }
        let mut active = self.active_powers();
        if let (Some(power), None) = (active.next(), active.next()) {
            return GameStatus::Completed(Completion::LastPowerStanding { power });
        }
        if let Some(year) = self.config.max_year {
            if self.board.year > year {
                return GameStatus::Completed(Completion::YearLimit { year });
            }
        }
        GameStatus::InProgress
    }
}
