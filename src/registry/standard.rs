//! Standard content tables.
//!
//! A small catalog sufficient for self-play and tests: a dozen mercs, two
//! dictators, and the equipment found in the standard deck.

use super::{AbilityProfile, EquipmentProfile, Registry, Slot, SquadBonus};
use crate::board::Stats;

/// Items drawn into a sector's stash when it is explored.
pub const EXPLORE_DRAW: usize = 2;

/// Printed card for a hireable merc.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MercTemplate {
    pub key: &'static str,
    pub name: &'static str,
    pub stats: Stats,
}

const fn merc(key: &'static str, name: &'static str, initiative: u8, combat: u8, health: u8) -> MercTemplate {
    MercTemplate {
        key,
        name,
        stats: Stats {
            initiative,
            combat,
            health,
        },
    }
}

pub const MERC_ROSTER: [MercTemplate; 12] = [
    merc("wolverine", "Wolverine", 3, 3, 3),
    merc("shadow", "Shadow", 2, 2, 3),
    merc("bull", "Bull", 1, 3, 4),
    merc("ace", "Ace", 3, 2, 3),
    merc("ghost", "Ghost", 4, 2, 2),
    merc("hawk", "Hawk", 3, 2, 3),
    merc("gunner", "Gunner", 2, 3, 3),
    merc("lucky", "Lucky", 2, 2, 3),
    merc("sarge", "Sarge", 2, 2, 4),
    merc("doc", "Doc", 2, 1, 3),
    merc("tank", "Tank", 1, 2, 5),
    merc("scout", "Scout", 4, 1, 3),
];

pub const DICTATOR_ROSTER: [MercTemplate; 2] = [
    merc("general", "The General", 2, 3, 5),
    merc("colonel", "The Colonel", 3, 2, 4),
];

fn ability(f: impl FnOnce(&mut AbilityProfile)) -> AbilityProfile {
    let mut profile = AbilityProfile::default();
    f(&mut profile);
    profile
}

fn item(name: &str, slot: Slot, f: impl FnOnce(&mut EquipmentProfile)) -> EquipmentProfile {
    let mut profile = EquipmentProfile {
        name: name.to_string(),
        slot,
        ..EquipmentProfile::default()
    };
    f(&mut profile);
    profile
}

impl Registry {
    /// The standard merc abilities and equipment.
    pub fn standard() -> Self {
        Registry::new()
            .with_ability("wolverine", ability(|a| a.wolverine = true))
            .with_ability("shadow", ability(|a| a.always_first = true))
            .with_ability("bull", ability(|a| a.always_before_militia = true))
            .with_ability("ace", ability(|a| a.hit_threshold = 3))
            .with_ability("ghost", ability(|a| a.targeted_last = true))
            .with_ability(
                "hawk",
                ability(|a| {
                    a.prioritizes_mercs = true;
                    a.preemptive_strike = true;
                }),
            )
            .with_ability("gunner", ability(|a| a.second_shot = true))
            .with_ability("lucky", ability(|a| a.reroll_once = true))
            .with_ability(
                "sarge",
                ability(|a| {
                    a.squad_bonus = Some(SquadBonus {
                        initiative: 1,
                        combat: 0,
                        armor: 0,
                    })
                }),
            )
            .with_ability(
                "tank",
                ability(|a| {
                    a.squad_bonus = Some(SquadBonus {
                        initiative: 0,
                        combat: 0,
                        armor: 1,
                    })
                }),
            )
            .with_ability("scout", ability(|a| a.rolls_initiative = true))
            .with_ability(
                "general",
                ability(|a| {
                    a.extra_targets = 1;
                    a.combat_bonus = 1;
                }),
            )
            .with_ability("colonel", ability(|a| a.armor_piercing = true))
            .with_equipment(
                "pistol",
                item("Pistol", Slot::Weapon, |e| {
                    e.combat = 1;
                    e.handgun = true;
                }),
            )
            .with_equipment("rifle", item("Rifle", Slot::Weapon, |e| e.combat = 2))
            .with_equipment(
                "smg",
                item("SMG", Slot::Weapon, |e| {
                    e.combat = 1;
                    e.initiative = 1;
                    e.extra_targets = 1;
                }),
            )
            .with_equipment(
                "sniper_rifle",
                item("Sniper Rifle", Slot::Weapon, |e| {
                    e.combat = 2;
                    e.initiative = -1;
                    e.armor_piercing = true;
                }),
            )
            .with_equipment(
                "machine_gun",
                item("Machine Gun", Slot::Weapon, |e| {
                    e.combat = 2;
                    e.initiative = -1;
                    e.damage_bonus = 1;
                }),
            )
            .with_equipment(
                "grenade",
                item("Grenade", Slot::Accessory, |e| {
                    e.combat = 1;
                    e.extra_targets = 1;
                    e.explosive = true;
                }),
            )
            .with_equipment("body_armor", item("Body Armor", Slot::Armor, |e| e.armor = 1))
            .with_equipment(
                "epinephrine",
                item("Epinephrine", Slot::Accessory, |e| e.epinephrine = true),
            )
            .with_equipment(
                "land_mine",
                item("Land Mine", Slot::Accessory, |e| {
                    e.land_mine = true;
                    e.explosive = true;
                    e.mine_damage = 1;
                }),
            )
            .with_equipment(
                "medical_kit",
                item("Medical Kit", Slot::Accessory, |e| e.heal_amount = 2),
            )
            .with_equipment(
                "repair_kit",
                item("Repair Kit", Slot::Accessory, |e| {
                    e.repair_kit = true;
                    e.heal_amount = 3;
                }),
            )
            .with_equipment(
                "attack_dog",
                item("Attack Dog", Slot::Accessory, |e| e.attack_dog = true),
            )
    }
}

/// The standard equipment deck, unshuffled.
pub fn standard_deck() -> Vec<String> {
    const COUNTS: [(&str, usize); 12] = [
        ("pistol", 4),
        ("rifle", 4),
        ("smg", 2),
        ("sniper_rifle", 1),
        ("machine_gun", 1),
        ("grenade", 2),
        ("body_armor", 3),
        ("epinephrine", 2),
        ("land_mine", 2),
        ("medical_kit", 3),
        ("repair_kit", 1),
        ("attack_dog", 1),
    ];
    COUNTS
        .iter()
        .flat_map(|&(key, n)| std::iter::repeat(key.to_string()).take(n))
        .collect()
}
