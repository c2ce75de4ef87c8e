//! Combat resolution.
//!
//! A combat is a multi-round state machine over per-round combatant
//! snapshots. It suspends whenever a human must decide something and is
//! resumed by the matching resolver in [`decision`].

pub mod active;
pub mod combatant;
pub mod decision;
pub mod dice;
pub mod engine;
pub mod events;
pub mod initiative;

pub use active::{
    ActiveCombat, CombatOptions, CombatOutcome, Conclusion, EpinephrineSave, HitAllocation,
    PendingDecision, PendingKind, RetreatDecision, RetreatVote, TargetSelection, WolverineSixes,
    MAX_COMBAT_ROUNDS,
};
pub use combatant::{Combatant, CombatantId, CombatantKind, MilitiaOwner};
pub use engine::{advance, target_candidates, CombatContext, Progress};
pub use events::{AnimationEvent, PanelEntry, PanelSnapshot};
pub use initiative::{AttackKind, AttackSlot};
