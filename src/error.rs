//! Error types.
//!
//! Every rejected action is reported as why it is illegal right now. A
//! rejected action leaves the game untouched.

use crate::board::{MercId, Seat, SectorId, SquadKind};
use crate::combat::{CombatantId, PendingKind};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ActionError {
    #[error("the game is over")]
    GameOver,

    #[error("there is no {0}")]
    UnknownSeat(Seat),

    #[error("sector {0} does not exist")]
    UnknownSector(SectorId),

    #[error("there is no {0}")]
    UnknownMerc(MercId),

    #[error("{seat} has no {squad:?} squad on the map")]
    UnknownSquad { seat: Seat, squad: SquadKind },

    #[error("{0} is not expected to act right now")]
    NotAwaited(Seat),

    #[error("{0} has already ended the turn")]
    TurnEnded(Seat),

    #[error("{0} must wait for the other rebels to catch up")]
    Gated(Seat),

    #[error("a combat must be resolved first")]
    CombatInProgress,

    #[error("a combat is already running in sector {0}")]
    CombatElsewhere(SectorId),

    #[error("a coordinated attack must be settled first")]
    CoordinatedAttackOpen,

    #[error("no combat is in progress")]
    NoActiveCombat,

    #[error("no {0} decision is pending")]
    NoPendingDecision(PendingKind),

    #[error("{0} is not entitled to make this decision")]
    NotEntitled(Seat),

    #[error("at least one target must be selected")]
    EmptySelection,

    #[error("at most {max} targets may be selected, got {got}")]
    TooManyTargets { max: u8, got: usize },

    #[error("{0} was selected twice")]
    DuplicateTarget(CombatantId),

    #[error("{0} cannot be targeted")]
    IllegalTarget(CombatantId),

    #[error("exactly {expected} hits must be placed, got {got}")]
    HitCountMismatch { expected: u8, got: u32 },

    #[error("{0} has already decided")]
    AlreadyDecided(Seat),

    #[error("{0} has nowhere to retreat")]
    NoRetreatRoute(Seat),

    #[error("cannot retreat to sector {0}")]
    IllegalRetreat(SectorId),

    #[error("sector {0} has no opposing forces")]
    NoOpposingForces(SectorId),

    #[error("the game has no dictator")]
    NoDictator,

    #[error("{0} cannot take this action in its role")]
    WrongRole(Seat),

    #[error("{merc} does not belong to {seat}")]
    NotOwner { seat: Seat, merc: MercId },

    #[error("{0} is dead")]
    MercDead(MercId),

    #[error("{0} has no actions left")]
    NoActionsLeft(MercId),

    #[error("{0} is not on the map")]
    NotOnMap(MercId),

    #[error("the {0:?} squad has no living mercs")]
    EmptySquad(SquadKind),

    #[error("every merc in the {0:?} squad needs an action to move")]
    SquadNotReady(SquadKind),

    #[error("sector {to} is not adjacent to sector {from}")]
    NotAdjacent { from: SectorId, to: SectorId },

    #[error("sector {0} is already explored")]
    AlreadyExplored(SectorId),

    #[error("{0} is not available here")]
    ItemNotAvailable(String),

    #[error("{0} cannot be equipped")]
    NotEquippable(String),

    #[error("{0} cannot heal")]
    NotHealing(String),

    #[error("{0} is not wounded")]
    NotWounded(MercId),

    #[error("sector {0} cannot hold more militia")]
    MilitiaFull(SectorId),

    #[error("militia cannot be trained in sector {0} right now")]
    CannotTrain(SectorId),

    #[error("no coordinated attack is open")]
    NoCoordinatedAttack,

    #[error("{0} cannot join this attack")]
    NotEligible(Seat),

    #[error("{0} has already answered")]
    AlreadyResponded(Seat),

    #[error("only {0} can launch this attack")]
    NotDeclarer(Seat),
}

#[derive(Debug, thiserror::Error)]
pub enum SetupError {
    #[error("a game needs exactly one dictator, found {0}")]
    DictatorCount(usize),

    #[error("a game needs at least one rebel")]
    NoRebels,

    #[error("sector {0} does not exist")]
    UnknownSector(SectorId),

    #[error("there is no {0}")]
    UnknownSeat(Seat),

    #[error("there is no {0}")]
    UnknownMerc(MercId),

    #[error("map must be at least 2x2, got {width}x{height}")]
    MapTooSmall { width: u16, height: u16 },

    #[error("the roster has {available} mercs, {needed} are needed")]
    NotEnoughMercs { needed: usize, available: usize },

    #[error("invalid configuration: {0}")]
    Config(#[from] serde_json::Error),
}

#[derive(Debug, thiserror::Error)]
pub enum ReplayError {
    #[error(transparent)]
    Setup(#[from] SetupError),

    #[error("action {index} by {seat} was rejected: {source}")]
    Rejected {
        index: usize,
        seat: Seat,
        #[source]
        source: ActionError,
    },

    #[error("malformed action log: {0}")]
    Json(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_explain_why() {
        assert_eq!(
            ActionError::NoActionsLeft(MercId(2)).to_string(),
            "merc 2 has no actions left"
        );
        assert_eq!(
            ActionError::NoPendingDecision(PendingKind::HitAllocation).to_string(),
            "no hit allocation decision is pending"
        );
        assert_eq!(
            ActionError::NotAdjacent {
                from: SectorId(0),
                to: SectorId(5)
            }
            .to_string(),
            "sector #5 is not adjacent to sector #0"
        );
    }

    #[test]
    fn replay_error_keeps_source() {
        let err = ReplayError::Rejected {
            index: 4,
            seat: Seat(1),
            source: ActionError::Gated(Seat(1)),
        };
        assert!(err.to_string().contains("action 4 by seat 1"));
        assert!(std::error::Error::source(&err).is_some());
    }
}
