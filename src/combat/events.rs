//! Animation events.
//!
//! The append-only trace a presentation layer replays. Nothing in the engine
//! reads these back.

use serde::{Deserialize, Serialize};

use crate::board::{SectorId, Side};

use super::active::{Conclusion, PendingKind};
use super::combatant::{Combatant, CombatantId};
use super::initiative::AttackKind;

/// One row of the combat panel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PanelEntry {
    pub id: CombatantId,
    pub name: String,
    pub health: u8,
    pub max_health: u8,
}

impl From<&Combatant> for PanelEntry {
    fn from(c: &Combatant) -> Self {
        PanelEntry {
            id: c.id,
            name: c.name.clone(),
            health: c.health,
            max_health: c.max_health,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PanelSnapshot {
    pub sector: SectorId,
    pub round: u32,
    pub rebels: Vec<PanelEntry>,
    pub dictator: Vec<PanelEntry>,
    pub rebel_casualties: Vec<PanelEntry>,
    pub dictator_casualties: Vec<PanelEntry>,
    pub pending: Option<PendingKind>,
    pub combat_complete: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all_fields = "camelCase")]
pub enum AnimationEvent {
    #[serde(rename = "combat-round-start")]
    RoundStart { sector: SectorId, round: u32 },
    #[serde(rename = "combat-roll")]
    Roll {
        attacker: CombatantId,
        attacker_name: String,
        attack: AttackKind,
        dice: Vec<u8>,
        threshold: u8,
        hits: u8,
        rerolled: bool,
    },
    #[serde(rename = "combat-damage")]
    Damage {
        attacker: CombatantId,
        target: CombatantId,
        target_name: String,
        damage: u8,
        health: u8,
        /// The hit was survived by using epinephrine.
        saved: bool,
    },
    #[serde(rename = "combat-death")]
    Death {
        target: CombatantId,
        target_name: String,
        side: Side,
    },
    #[serde(rename = "combat-panel")]
    Panel(PanelSnapshot),
    #[serde(rename = "combat-end")]
    End {
        sector: SectorId,
        round: u32,
        conclusion: Conclusion,
    },
}

impl AnimationEvent {
    /// The wire name of the event type.
    pub fn kind(&self) -> &'static str {
        match self {
            AnimationEvent::RoundStart { .. } => "combat-round-start",
            AnimationEvent::Roll { .. } => "combat-roll",
            AnimationEvent::Damage { .. } => "combat-damage",
            AnimationEvent::Death { .. } => "combat-death",
            AnimationEvent::Panel(_) => "combat-panel",
            AnimationEvent::End { .. } => "combat-end",
        }
    }
}
