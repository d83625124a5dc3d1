//! Game configuration.
//!
//! Loaded from TOML; every field is optional and defaults to the standard
//! rules.
//!
//! ```toml
//! start_year = 1901
//! victory_centers = 18
//! max_year = 1920
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Rules that vary between games.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GameConfig {
    /// Year of the first Spring movement.
    pub start_year: u16,
    /// Supply centers needed for a solo victory.
    pub victory_centers: usize,
    /// Last year played; the game ends after its Fall turn.
    pub max_year: Option<u16>,
}

impl Default for GameConfig {
    fn default() -> Self {
        GameConfig {
            start_year: 1901,
            victory_centers: 18,
            max_year: None,
        }
    }
}

impl GameConfig {
    /// Parses and validates a configuration from TOML.
    pub fn from_toml_str(s: &str) -> Result<GameConfig, ConfigError> {
        let config: GameConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads a configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<GameConfig, ConfigError> {
        let content = fs::read_to_string(path)?;
        GameConfig::from_toml_str(&content)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.victory_centers == 0 {
            return Err(ConfigError::InvalidVictoryCenters(self.victory_centers));
        }
        if let Some(max_year) = self.max_year {
            if max_year < self.start_year {
                return Err(ConfigError::InvalidYearLimit {
                    start_year: self.start_year,
                    max_year,
                });
            }
        }
        Ok(())
    }
}
