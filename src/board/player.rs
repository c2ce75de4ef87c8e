//! Players, their role in the game, and who drives their decisions.

use serde::{Deserialize, Serialize};

use super::ids::Seat;
use super::unit::Side;

/// The side a player fights for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Rebel,
    Dictator,
}

impl Role {
    /// Returns the combat side this role fights on.
    pub const fn side(self) -> Side {
        match self {
            Role::Rebel => Side::Rebel,
            Role::Dictator => Side::Dictator,
        }
    }
}

/// Whether decisions for a seat come from a person or the AI policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Controller {
    Human,
    Ai,
}

/// A seated player.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Player {
    pub seat: Seat,
    pub name: String,
    pub role: Role,
    pub controller: Controller,
}

impl Player {
    pub fn is_ai(&self) -> bool {
        self.controller == Controller::Ai
    }

    pub fn side(&self) -> Side {
        self.role.side()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_maps_to_side() {
        assert_eq!(Role::Rebel.side(), Side::Rebel);
        assert_eq!(Role::Dictator.side(), Side::Dictator);
    }

    #[test]
    fn role_serializes_snake_case() {
        let json = serde_json::to_string(&Role::Dictator).unwrap();
        assert_eq!(json, "\"dictator\"");
        let back: Controller = serde_json::from_str("\"ai\"").unwrap();
        assert_eq!(back, Controller::Ai);
    }
}
