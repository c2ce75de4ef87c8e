//! Merc ability profiles.
//!
//! An ability profile is the complete list of combat-relevant quirks a merc
//! brings: threshold changes, extra attacks, ordering flags, and squad
//! bonuses. Mercs without a profile fight with plain stats.

use serde::{Deserialize, Serialize};

use crate::combat::dice::DEFAULT_HIT_THRESHOLD;

/// Bonus a merc grants to every other merc in its squad.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SquadBonus {
    pub initiative: i8,
    pub combat: i8,
    pub armor: i8,
}

impl SquadBonus {
    /// Component-wise sum.
    pub fn plus(self, other: SquadBonus) -> SquadBonus {
        SquadBonus {
            initiative: self.initiative.saturating_add(other.initiative),
            combat: self.combat.saturating_add(other.combat),
            armor: self.armor.saturating_add(other.armor),
        }
    }
}

/// Flat stat modifiers from an ability.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CombatModifiers {
    pub initiative: i8,
    pub combat: i8,
    pub extra_targets: u8,
    pub armor_piercing: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AbilityProfile {
    pub hit_threshold: u8,
    pub initiative_bonus: i8,
    pub combat_bonus: i8,
    pub extra_targets: u8,
    pub armor_piercing: bool,
    pub reroll_once: bool,
    pub preemptive_strike: bool,
    pub second_shot: bool,
    /// Sixes may be pointed at any enemy after the normal hits are placed.
    pub wolverine: bool,
    pub rolls_initiative: bool,
    pub always_first: bool,
    pub always_before_militia: bool,
    pub targeted_last: bool,
    pub prioritizes_mercs: bool,
    pub squad_bonus: Option<SquadBonus>,
}

impl Default for AbilityProfile {
    fn default() -> Self {
        AbilityProfile {
            hit_threshold: DEFAULT_HIT_THRESHOLD,
            initiative_bonus: 0,
            combat_bonus: 0,
            extra_targets: 0,
            armor_piercing: false,
            reroll_once: false,
            preemptive_strike: false,
            second_shot: false,
            wolverine: false,
            rolls_initiative: false,
            always_first: false,
            always_before_militia: false,
            targeted_last: false,
            prioritizes_mercs: false,
            squad_bonus: None,
        }
    }
}

/// Ability lookups keyed by merc key. Unknown keys answer with defaults.
pub trait AbilityLookup {
    fn ability(&self, key: &str) -> Option<&AbilityProfile>;

    fn hit_threshold(&self, key: &str) -> u8 {
        self.ability(key)
            .map_or(DEFAULT_HIT_THRESHOLD, |a| a.hit_threshold)
    }

    fn can_reroll_once(&self, key: &str) -> bool {
        self.ability(key).is_some_and(|a| a.reroll_once)
    }

    fn can_preemptive_strike(&self, key: &str) -> bool {
        self.ability(key).is_some_and(|a| a.preemptive_strike)
    }

    fn fires_second_shot(&self, key: &str) -> bool {
        self.ability(key).is_some_and(|a| a.second_shot)
    }

    fn has_wolverine(&self, key: &str) -> bool {
        self.ability(key).is_some_and(|a| a.wolverine)
    }

    fn squad_bonus(&self, key: &str) -> Option<SquadBonus> {
        self.ability(key).and_then(|a| a.squad_bonus)
    }

    fn combat_modifiers(&self, key: &str) -> CombatModifiers {
        self.ability(key)
            .map(|a| CombatModifiers {
                initiative: a.initiative_bonus,
                combat: a.combat_bonus,
                extra_targets: a.extra_targets,
                armor_piercing: a.armor_piercing,
            })
            .unwrap_or_default()
    }
}
