//! Equipment profiles.

use serde::{Deserialize, Serialize};

/// The loadout slot an item occupies.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Slot {
    Weapon,
    Armor,
    #[default]
    Accessory,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EquipmentProfile {
    pub name: String,
    pub slot: Slot,
    pub combat: i8,
    pub initiative: i8,
    pub armor: u8,
    pub extra_targets: u8,
    /// Added to the base one damage per hit.
    pub damage_bonus: u8,
    pub armor_piercing: bool,
    pub handgun: bool,
    pub explosive: bool,
    pub land_mine: bool,
    pub mine_damage: u8,
    pub epinephrine: bool,
    pub repair_kit: bool,
    pub heal_amount: u8,
    pub attack_dog: bool,
}

impl EquipmentProfile {
    /// Items that sit in a slot rather than being used up or left lying.
    pub fn is_equippable(&self) -> bool {
        !self.land_mine && self.heal_amount == 0
    }

    /// Rough usefulness score for comparing items in the same slot.
    pub fn rating(&self) -> i32 {
        let mut score = i32::from(self.combat) * 3
            + i32::from(self.initiative) * 2
            + i32::from(self.armor) * 3
            + i32::from(self.extra_targets) * 2
            + i32::from(self.damage_bonus) * 3;
        if self.armor_piercing {
            score += 2;
        }
        if self.epinephrine {
            score += 3;
        }
        if self.attack_dog {
            score += 4;
        }
        score
    }
}

/// Equipment lookups keyed by item key. Unknown keys answer "no".
pub trait EquipmentLookup {
    fn equipment(&self, key: &str) -> Option<&EquipmentProfile>;

    fn slot_of(&self, key: &str) -> Option<Slot> {
        self.equipment(key).map(|e| e.slot)
    }

    fn is_land_mine(&self, key: &str) -> bool {
        self.equipment(key).is_some_and(|e| e.land_mine)
    }

    fn is_explosive(&self, key: &str) -> bool {
        self.equipment(key).is_some_and(|e| e.explosive)
    }

    fn is_handgun(&self, key: &str) -> bool {
        self.equipment(key).is_some_and(|e| e.handgun)
    }

    fn is_epinephrine(&self, key: &str) -> bool {
        self.equipment(key).is_some_and(|e| e.epinephrine)
    }

    fn is_repair_kit(&self, key: &str) -> bool {
        self.equipment(key).is_some_and(|e| e.repair_kit)
    }

    fn mine_damage(&self, key: &str) -> u8 {
        self.equipment(key).map_or(0, |e| e.mine_damage)
    }

    fn heal_amount(&self, key: &str) -> u8 {
        self.equipment(key).map_or(0, |e| e.heal_amount)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn consumables_are_not_equippable() {
        let kit = EquipmentProfile {
            heal_amount: 2,
            ..EquipmentProfile::default()
        };
        let mine = EquipmentProfile {
            land_mine: true,
            ..EquipmentProfile::default()
        };
        let rifle = EquipmentProfile {
            slot: Slot::Weapon,
            combat: 2,
            ..EquipmentProfile::default()
        };
        assert!(!kit.is_equippable());
        assert!(!mine.is_equippable());
        assert!(rifle.is_equippable());
    }

    #[test]
    fn rating_prefers_stronger_items() {
        let pistol = EquipmentProfile {
            combat: 1,
            ..EquipmentProfile::default()
        };
        let rifle = EquipmentProfile {
            combat: 2,
            ..EquipmentProfile::default()
        };
        assert!(rifle.rating() > pistol.rating());
    }
}
