//! Action logs and replay.
//!
//! A log is the configuration a game was dealt from plus every accepted
//! action in order. Replaying it on a freshly dealt game reproduces the
//! original exactly.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::board::{Action, Seat};
use crate::config::GameConfig;
use crate::error::ReplayError;
use crate::game::Game;
use crate::setup::standard_game;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggedAction {
    pub seat: Seat,
    #[serde(flatten)]
    pub action: Action,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionLog {
    pub config: GameConfig,
    pub actions: Vec<LoggedAction>,
}

impl ActionLog {
    /// Captures the log of a game dealt by [`standard_game`].
    pub fn of(game: &Game) -> Self {
        ActionLog {
            config: game.config().clone(),
            actions: game.history().to_vec(),
        }
    }

    pub fn to_json(&self) -> Result<String, ReplayError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(text: &str) -> Result<Self, ReplayError> {
        Ok(serde_json::from_str(text)?)
    }
}

/// Deals the logged configuration and replays every action on it.
pub fn replay(log: &ActionLog) -> Result<Game, ReplayError> {
    let mut game = standard_game(&log.config)?;
    replay_on(&mut game, &log.actions)?;
    Ok(game)
}

/// Applies logged actions to an existing game, stopping at the first
/// rejection.
pub fn replay_on(game: &mut Game, actions: &[LoggedAction]) -> Result<(), ReplayError> {
    for (index, logged) in actions.iter().enumerate() {
        game.apply(logged.seat, logged.action.clone())
            .map_err(|source| ReplayError::Rejected {
                index,
                seat: logged.seat,
                source,
            })?;
    }
    debug!(actions = actions.len(), "replay finished");
    Ok(())
}
