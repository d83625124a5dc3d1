//! Error types.
//!
//! Expected adjudication outcomes (bounces, cut supports, disrupted convoys)
//! are never errors; they are `OrderResult` values in the phase report. The
//! types here cover caller mistakes and internal inconsistencies, which are
//! fatal for the call that hit them.

use thiserror::Error;

use crate::board::{Phase, ProvinceId};

/// A fatal error raised while validating or resolving a phase.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AdjudicationError {
    #[error("province id {0} is not part of the map")]
    UnknownProvince(u8),

    #[error("no unit at {abbr} (province {id:?}) for {context}")]
    UnitNotFound {
        id: ProvinceId,
        abbr: String,
        context: &'static str,
    },

    #[error("province {abbr} is already occupied")]
    OccupiedProvince { abbr: String },

    #[error("resolution did not converge within {rounds} rounds")]
    NoConvergence { rounds: usize },

    #[error("expected a {expected:?} phase, state is in {actual:?}")]
    WrongPhase { expected: Phase, actual: Phase },

    #[error("the game has already ended")]
    GameOver,
}

/// An error raised while loading a map specification.
#[derive(Debug, Error)]
pub enum MapError {
    #[error("failed to parse map specification: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("map defines {0} provinces, at most 255 are supported")]
    TooManyProvinces(usize),

    #[error("duplicate province abbreviation '{0}'")]
    DuplicateProvince(String),

    #[error("edge '{edge}' references unknown province '{province}'")]
    UnknownProvince { edge: String, province: String },

    #[error("malformed edge '{0}', expected 'abc-xyz' with optional '/nc', '/sc' or '/ec'")]
    MalformedEdge(String),

    #[error("edge '{edge}' names coast '{coast}' which province '{province}' does not have")]
    UnknownCoast {
        edge: String,
        province: String,
        coast: String,
    },

    #[error("fleet edge '{0}' touches an inland province")]
    FleetEdgeInland(String),

    #[error("army edge '{0}' touches a sea province")]
    ArmyEdgeSea(String),

    #[error("fleet edge '{0}' must name a coast of its split-coast province")]
    MissingCoast(String),
}

/// An error raised while loading the game configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("victory threshold must be at least 1, got {0}")]
    InvalidVictoryCenters(usize),

    #[error("max year {max_year} is before start year {start_year}")]
    InvalidYearLimit { start_year: u16, max_year: u16 },
}
