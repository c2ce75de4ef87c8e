//! The state of a combat in progress.
//!
//! [`ActiveCombat`] is owned by the game and mutated only by the round loop
//! in [`super::engine`] and the resolvers in [`super::decision`]. A combat
//! that needs a player's answer holds exactly one [`PendingDecision`]; the
//! enum makes two simultaneous suspensions unrepresentable.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::board::{HitAssignment, MercId, Seat, SectorId, Side};

use super::combatant::{Combatant, CombatantId};
use super::events::AnimationEvent;
use super::initiative::AttackSlot;

/// A combat still running after this many rounds ends in a draw.
pub const MAX_COMBAT_ROUNDS: u32 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CombatOptions {
    /// When false the engine never prompts and nobody retreats.
    pub interactive: bool,
}

impl Default for CombatOptions {
    fn default() -> Self {
        CombatOptions { interactive: true }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetSelection {
    pub attacker: CombatantId,
    pub attacker_name: String,
    pub controller: Seat,
    pub valid_targets: Vec<CombatantId>,
    pub max_targets: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HitAllocation {
    pub attacker: CombatantId,
    pub attacker_name: String,
    pub controller: Seat,
    pub hits: u8,
    pub targets: Vec<CombatantId>,
    pub dice: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WolverineSixes {
    pub attacker: CombatantId,
    pub attacker_name: String,
    pub controller: Seat,
    pub sixes: u8,
    pub valid_targets: Vec<CombatantId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EpinephrineSave {
    pub target: CombatantId,
    pub merc: MercId,
    pub target_name: String,
    /// Owner of the dying merc.
    pub controller: Seat,
    pub attacker: CombatantId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RetreatDecision {
    Continue,
    Retreat { to: SectorId },
}

/// Round-end vote; one decision per seat with mercs in the sector.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetreatVote {
    /// Human seats that must answer.
    pub required: Vec<Seat>,
    /// Legal retreat sectors per seat.
    pub options: BTreeMap<Seat, Vec<SectorId>>,
    pub decisions: BTreeMap<Seat, RetreatDecision>,
}

impl RetreatVote {
    pub fn is_complete(&self) -> bool {
        self.required.iter().all(|s| self.decisions.contains_key(s))
    }

    pub fn undecided(&self) -> Vec<Seat> {
        self.required
            .iter()
            .copied()
            .filter(|s| !self.decisions.contains_key(s))
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PendingKind {
    TargetSelection,
    HitAllocation,
    WolverineSixes,
    Epinephrine,
    Retreat,
}

impl fmt::Display for PendingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PendingKind::TargetSelection => "target selection",
            PendingKind::HitAllocation => "hit allocation",
            PendingKind::WolverineSixes => "wolverine sixes",
            PendingKind::Epinephrine => "epinephrine",
            PendingKind::Retreat => "retreat",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum PendingDecision {
    TargetSelection(TargetSelection),
    HitAllocation(HitAllocation),
    WolverineSixes(WolverineSixes),
    Epinephrine(EpinephrineSave),
    Retreat(RetreatVote),
}

impl PendingDecision {
    pub fn kind(&self) -> PendingKind {
        match self {
            PendingDecision::TargetSelection(_) => PendingKind::TargetSelection,
            PendingDecision::HitAllocation(_) => PendingKind::HitAllocation,
            PendingDecision::WolverineSixes(_) => PendingKind::WolverineSixes,
            PendingDecision::Epinephrine(_) => PendingKind::Epinephrine,
            PendingDecision::Retreat(_) => PendingKind::Retreat,
        }
    }

    /// Seats whose answer the decision is waiting for.
    pub fn awaiting_seats(&self) -> Vec<Seat> {
        match self {
            PendingDecision::TargetSelection(p) => vec![p.controller],
            PendingDecision::HitAllocation(p) => vec![p.controller],
            PendingDecision::WolverineSixes(p) => vec![p.controller],
            PendingDecision::Epinephrine(p) => vec![p.controller],
            PendingDecision::Retreat(vote) => vote.undecided(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Conclusion {
    RebelVictory,
    DictatorVictory,
    Retreated,
    Draw,
}

/// What a caller of the engine sees after each step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CombatOutcome {
    pub sector: SectorId,
    pub rebel_victory: bool,
    pub dictator_victory: bool,
    pub retreated: bool,
    pub combat_pending: bool,
    pub round: u32,
    pub pending: Option<PendingKind>,
    pub events: Vec<AnimationEvent>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RoundPhase {
    Start,
    Attacks,
    End,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum AttackStage {
    Target,
    Roll,
    Allocate,
    Wolverine,
    /// Applying `assignments[next..]`; `save` carries an epinephrine answer
    /// for the assignment at `next`.
    Apply { next: usize, save: Option<bool> },
}

/// The attack currently being resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct AttackInProgress {
    pub slot: AttackSlot,
    /// Snapshot of the attacker when the attack began.
    pub attacker: Combatant,
    pub stage: AttackStage,
    pub targets: Vec<CombatantId>,
    pub dice: Vec<u8>,
    pub hits: u8,
    pub sixes: u8,
    pub assignments: Vec<HitAssignment>,
}

impl AttackInProgress {
    pub fn new(slot: AttackSlot, attacker: Combatant) -> Self {
        AttackInProgress {
            slot,
            attacker,
            stage: AttackStage::Target,
            targets: Vec::new(),
            dice: Vec::new(),
            hits: 0,
            sixes: 0,
            assignments: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveCombat {
    pub sector: SectorId,
    pub attacking_player: Seat,
    pub round: u32,
    pub rebel_combatants: Vec<Combatant>,
    pub dictator_combatants: Vec<Combatant>,
    pub rebel_casualties: Vec<Combatant>,
    pub dictator_casualties: Vec<Combatant>,
    /// Targets chosen by players this round, keyed by attacker.
    pub selected_targets: BTreeMap<CombatantId, Vec<CombatantId>>,
    pub animation_events: Vec<AnimationEvent>,

    pub(crate) dictator_seat: Seat,
    pub(crate) interactive: bool,
    pub(crate) pending: Option<PendingDecision>,
    pub(crate) phase: RoundPhase,
    pub(crate) order: Vec<AttackSlot>,
    pub(crate) cursor: usize,
    pub(crate) attack: Option<AttackInProgress>,
    pub(crate) settled_vote: Option<RetreatVote>,
    pub(crate) conclusion: Option<Conclusion>,
    /// Events already copied to the game-wide log.
    pub(crate) published: usize,
}

impl ActiveCombat {
    pub(crate) fn new(sector: SectorId, attacking_player: Seat, dictator_seat: Seat, options: CombatOptions) -> Self {
        ActiveCombat {
            sector,
            attacking_player,
            round: 0,
            rebel_combatants: Vec::new(),
            dictator_combatants: Vec::new(),
            rebel_casualties: Vec::new(),
            dictator_casualties: Vec::new(),
            selected_targets: BTreeMap::new(),
            animation_events: Vec::new(),
            dictator_seat,
            interactive: options.interactive,
            pending: None,
            phase: RoundPhase::Start,
            order: Vec::new(),
            cursor: 0,
            attack: None,
            settled_vote: None,
            conclusion: None,
            published: 0,
        }
    }

    pub fn is_interactive(&self) -> bool {
        self.interactive
    }

    pub fn pending(&self) -> Option<&PendingDecision> {
        self.pending.as_ref()
    }

    pub fn conclusion(&self) -> Option<Conclusion> {
        self.conclusion
    }

    pub fn pending_target_selection(&self) -> Option<&TargetSelection> {
        match &self.pending {
            Some(PendingDecision::TargetSelection(p)) => Some(p),
            _ => None,
        }
    }

    pub fn pending_hit_allocation(&self) -> Option<&HitAllocation> {
        match &self.pending {
            Some(PendingDecision::HitAllocation(p)) => Some(p),
            _ => None,
        }
    }

    pub fn pending_wolverine_sixes(&self) -> Option<&WolverineSixes> {
        match &self.pending {
            Some(PendingDecision::WolverineSixes(p)) => Some(p),
            _ => None,
        }
    }

    pub fn pending_epinephrine(&self) -> Option<&EpinephrineSave> {
        match &self.pending {
            Some(PendingDecision::Epinephrine(p)) => Some(p),
            _ => None,
        }
    }

    pub fn awaiting_retreat_decisions(&self) -> bool {
        matches!(self.pending, Some(PendingDecision::Retreat(_)))
    }

    pub fn retreat_decisions(&self) -> Option<&BTreeMap<Seat, RetreatDecision>> {
        match &self.pending {
            Some(PendingDecision::Retreat(vote)) => Some(&vote.decisions),
            _ => None,
        }
    }

    pub fn side(&self, side: Side) -> &[Combatant] {
        match side {
            Side::Rebel => &self.rebel_combatants,
            Side::Dictator => &self.dictator_combatants,
        }
    }

    pub(crate) fn side_mut(&mut self, side: Side) -> &mut Vec<Combatant> {
        match side {
            Side::Rebel => &mut self.rebel_combatants,
            Side::Dictator => &mut self.dictator_combatants,
        }
    }

    pub(crate) fn casualties_mut(&mut self, side: Side) -> &mut Vec<Combatant> {
        match side {
            Side::Rebel => &mut self.rebel_casualties,
            Side::Dictator => &mut self.dictator_casualties,
        }
    }

    /// A living combatant by id.
    pub fn combatant(&self, id: CombatantId) -> Option<&Combatant> {
        self.rebel_combatants
            .iter()
            .chain(&self.dictator_combatants)
            .find(|c| c.id == id)
    }

    pub fn outcome(&self) -> CombatOutcome {
        CombatOutcome {
            sector: self.sector,
            rebel_victory: self.conclusion == Some(Conclusion::RebelVictory),
            dictator_victory: self.conclusion == Some(Conclusion::DictatorVictory),
            retreated: self.conclusion == Some(Conclusion::Retreated),
            combat_pending: self.conclusion.is_none(),
            round: self.round,
            pending: self.pending.as_ref().map(PendingDecision::kind),
            events: self.animation_events.clone(),
        }
    }

    /// Panics if the combat is in an impossible state.
    pub fn check_invariants(&self) {
        for side in [Side::Rebel, Side::Dictator] {
            let (living, dead) = match side {
                Side::Rebel => (&self.rebel_combatants, &self.rebel_casualties),
                Side::Dictator => (&self.dictator_combatants, &self.dictator_casualties),
            };
            for c in living {
                assert!(c.is_alive(), "{} is listed as fighting at 0 health", c.id);
                assert!(c.health <= c.max_health, "{} is above max health", c.id);
                assert_eq!(c.side, side, "{} is on the wrong side", c.id);
                assert!(
                    !dead.iter().any(|d| d.id == c.id),
                    "{} is both fighting and a casualty",
                    c.id
                );
            }
        }
        if self.conclusion.is_some() {
            assert!(self.pending.is_none(), "concluded combat still awaits a decision");
        }
        match &self.pending {
            Some(PendingDecision::HitAllocation(_))
            | Some(PendingDecision::WolverineSixes(_))
            | Some(PendingDecision::Epinephrine(_))
            | Some(PendingDecision::TargetSelection(_)) => {
                assert!(self.attack.is_some(), "attack decision pending with no attack in progress");
            }
            Some(PendingDecision::Retreat(vote)) => {
                assert!(!vote.is_complete(), "settled retreat vote left pending");
            }
            None => {}
        }
    }
}
