//! Game configuration.
//!
//! Everything needed to deal a standard game: the seed, who sits where, and
//! a few rule knobs. Loaded from JSON with every field optional.

use serde::{Deserialize, Serialize};

use crate::board::{Controller, Role};
use crate::error::SetupError;

/// Days played before the dictator wins by holding out.
pub const DEFAULT_MAX_DAYS: u32 = 12;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    pub name: String,
    pub role: Role,
    pub controller: Controller,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        PlayerConfig {
            name: "Rebel".to_string(),
            role: Role::Rebel,
            controller: Controller::Ai,
        }
    }
}

impl PlayerConfig {
    pub fn new(name: impl Into<String>, role: Role, controller: Controller) -> Self {
        PlayerConfig {
            name: name.into(),
            role,
            controller,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub seed: u64,
    pub players: Vec<PlayerConfig>,
    /// When false, every combat decision is made automatically, humans
    /// included.
    pub interactive_combat: bool,
    pub max_days: u32,
    pub map_width: u16,
    pub map_height: u16,
    pub mercs_per_rebel: usize,
    pub starting_dictator_militia: u8,
}

impl Default for GameConfig {
    fn default() -> Self {
        GameConfig {
            seed: 0,
            players: vec![
                PlayerConfig::new("Rebel A", Role::Rebel, Controller::Ai),
                PlayerConfig::new("Rebel B", Role::Rebel, Controller::Ai),
                PlayerConfig::new("Dictator", Role::Dictator, Controller::Ai),
            ],
            interactive_combat: true,
            max_days: DEFAULT_MAX_DAYS,
            map_width: 4,
            map_height: 3,
            mercs_per_rebel: 2,
            starting_dictator_militia: 3,
        }
    }
}

impl GameConfig {
    pub fn from_json(text: &str) -> Result<Self, SetupError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_players(mut self, players: Vec<PlayerConfig>) -> Self {
        self.players = players;
        self
    }
}
