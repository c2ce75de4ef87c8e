//! Actions a player can submit.
//!
//! Every mutation of the game goes through one of these variants via
//! `Game::apply`. The enum serializes with an `action` tag so an action log
//! reads as a flat JSON stream.

use serde::{Deserialize, Serialize};

use super::ids::{MercId, SectorId};
use super::unit::SquadKind;
use crate::combat::{CombatOptions, CombatantId};

/// A number of hits directed at one combatant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HitAssignment {
    pub target: CombatantId,
    pub hits: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Action {
    /// Move a whole squad to an adjacent sector.
    Move { squad: SquadKind, to: SectorId },
    Explore { merc: MercId },
    /// Swap an item from the sector stash into the merc's matching slot.
    ReEquip { merc: MercId, item: String },
    Train { merc: MercId },
    /// Use a healing item held by the merc or lying in its sector.
    Heal { merc: MercId, item: String },
    EndTurn,

    DeclareCoordinatedAttack { target: SectorId, squad: SquadKind },
    JoinCoordinatedAttack { squad: SquadKind },
    DeclineCoordinatedAttack,
    /// Launch a declared attack without waiting for the remaining answers.
    ExecuteCoordinatedAttack,

    CombatSelectTargets { targets: Vec<CombatantId> },
    CombatAllocateHits { allocation: Vec<HitAssignment> },
    CombatAllocateWolverineSixes { allocation: Vec<HitAssignment> },
    CombatEpinephrine { use_item: bool },
    CombatContinue,
    /// Retreat to the given sector, or the first legal one when absent.
    CombatRetreat { to: Option<SectorId> },

    /// A combat started or continued through `Game::execute_combat`.
    ExecuteCombat { sector: SectorId, options: CombatOptions },
}

impl Action {
    /// Actions that answer a pending combat decision.
    pub fn is_combat_decision(&self) -> bool {
        matches!(
            self,
            Action::CombatSelectTargets { .. }
                | Action::CombatAllocateHits { .. }
                | Action::CombatAllocateWolverineSixes { .. }
                | Action::CombatEpinephrine { .. }
                | Action::CombatContinue
                | Action::CombatRetreat { .. }
        )
    }

    /// Answers to an open coordinated attack.
    pub fn is_coordinated_response(&self) -> bool {
        matches!(
            self,
            Action::JoinCoordinatedAttack { .. }
                | Action::DeclineCoordinatedAttack
                | Action::ExecuteCoordinatedAttack
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn action_json_is_tagged() {
        let action = Action::Move {
            squad: SquadKind::Primary,
            to: SectorId(3),
        };
        let json = serde_json::to_string(&action).unwrap();
        assert_eq!(json, r#"{"action":"move","squad":"primary","to":3}"#);
        let back: Action = serde_json::from_str(&json).unwrap();
        assert_eq!(back, action);
    }

    #[test]
    fn decision_classification() {
        assert!(Action::CombatContinue.is_combat_decision());
        assert!(!Action::EndTurn.is_combat_decision());
        assert!(Action::DeclineCoordinatedAttack.is_coordinated_response());
        assert!(!Action::CombatContinue.is_coordinated_response());
        let run = Action::ExecuteCombat {
            sector: SectorId(1),
            options: CombatOptions::default(),
        };
        assert!(!run.is_combat_decision());
        assert!(!run.is_coordinated_response());
    }

    #[test]
    fn execute_combat_logs_its_options() {
        let action = Action::ExecuteCombat {
            sector: SectorId(4),
            options: CombatOptions { interactive: false },
        };
        let json = serde_json::to_string(&action).unwrap();
        assert_eq!(
            json,
            r#"{"action":"execute_combat","sector":4,"options":{"interactive":false}}"#
        );
        assert_eq!(serde_json::from_str::<Action>(&json).unwrap(), action);
    }
}
