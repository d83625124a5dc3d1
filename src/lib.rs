//! Realpolitik adjudicator library.
//!
//! Exposes the map and board representation, order validation, the phase
//! resolvers and the game lifecycle for use by integration tests and the
//! binary entry point.

pub mod board;
pub mod config;
pub mod error;
pub mod game;
pub mod resolve;
pub mod validate;

pub use board::{AdjacencyGraph, BoardState, Order, Phase, Power, ProvinceId, Season};
pub use config::GameConfig;
pub use error::{AdjudicationError, ConfigError, MapError};
pub use game::{Completion, GameState, GameStatus, PhaseReport, Resolution};
pub use resolve::{OrderResult, Reason, ResolvedOrder};
pub use validate::{validate, Rejection, Verdict};
