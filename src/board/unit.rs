//! Units and squads.
//!
//! Mercs carry base stats, accumulated damage, a three-slot loadout, and a
//! daily action budget. Squads group mercs of one player into a single
//! moving stack.

use serde::{Deserialize, Serialize};

use super::ids::{MercId, Seat, SectorId};
use crate::registry::Slot;

/// Actions each living merc receives at the start of a day.
pub const ACTIONS_PER_DAY: u8 = 2;

/// Fixed stats for a single militia token.
pub const MILITIA_STATS: Stats = Stats {
    initiative: 1,
    combat: 1,
    health: 1,
};

/// Fixed stats for an attack dog.
pub const DOG_STATS: Stats = Stats {
    initiative: 3,
    combat: 1,
    health: 3,
};

/// Which side of a fight something is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Rebel,
    Dictator,
}

impl Side {
    pub const fn opponent(self) -> Side {
        match self {
            Side::Rebel => Side::Dictator,
            Side::Dictator => Side::Rebel,
        }
    }
}

/// Printed stats of a unit before equipment and abilities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stats {
    pub initiative: u8,
    pub combat: u8,
    pub health: u8,
}

/// Equipment held by a merc, one item per slot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Loadout {
    pub weapon: Option<String>,
    pub armor: Option<String>,
    pub accessory: Option<String>,
}

impl Loadout {
    /// Returns the item in a slot.
    pub fn get(&self, slot: Slot) -> Option<&str> {
        match slot {
            Slot::Weapon => self.weapon.as_deref(),
            Slot::Armor => self.armor.as_deref(),
            Slot::Accessory => self.accessory.as_deref(),
        }
    }

    /// Puts an item into a slot and returns whatever was there before.
    pub fn replace(&mut self, slot: Slot, item: Option<String>) -> Option<String> {
        let cell = match slot {
            Slot::Weapon => &mut self.weapon,
            Slot::Armor => &mut self.armor,
            Slot::Accessory => &mut self.accessory,
        };
        std::mem::replace(cell, item)
    }

    /// Iterates over held items in slot order.
    pub fn items(&self) -> impl Iterator<Item = &str> {
        [&self.weapon, &self.armor, &self.accessory]
            .into_iter()
            .filter_map(|item| item.as_deref())
    }

    /// Removes the first held copy of `key`. Returns false if not held.
    pub fn remove(&mut self, key: &str) -> bool {
        for cell in [&mut self.weapon, &mut self.armor, &mut self.accessory] {
            if cell.as_deref() == Some(key) {
                *cell = None;
                return true;
            }
        }
        false
    }

    /// Empties every slot, returning the items.
    pub fn take_all(&mut self) -> Vec<String> {
        [self.weapon.take(), self.armor.take(), self.accessory.take()]
            .into_iter()
            .flatten()
            .collect()
    }
}

/// An attack dog fighting alongside its handler.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Dog {
    pub damage: u8,
}

impl Dog {
    pub fn health(&self) -> u8 {
        DOG_STATS.health.saturating_sub(self.damage)
    }
}

/// A named mercenary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Merc {
    pub id: MercId,
    /// Registry key used for ability lookups.
    pub key: String,
    pub name: String,
    pub owner: Seat,
    pub base: Stats,
    pub damage: u8,
    pub loadout: Loadout,
    pub actions: u8,
    pub dog: Option<Dog>,
    pub alive: bool,
}

impl Merc {
    pub fn health(&self) -> u8 {
        self.base.health.saturating_sub(self.damage)
    }

    pub fn max_health(&self) -> u8 {
        self.base.health
    }

    pub fn is_wounded(&self) -> bool {
        self.alive && self.damage > 0
    }

    pub fn can_act(&self) -> bool {
        self.alive && self.actions > 0
    }
}

/// The dictator's own figure, present on the board once placed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DictatorFigure {
    pub key: String,
    pub name: String,
    pub base: Stats,
    pub damage: u8,
    pub sector: Option<SectorId>,
    pub alive: bool,
}

impl DictatorFigure {
    pub fn health(&self) -> u8 {
        self.base.health.saturating_sub(self.damage)
    }
}

/// A player may field two squads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SquadKind {
    Primary,
    Secondary,
}

/// A stack of mercs owned by one player, moving together.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Squad {
    pub owner: Seat,
    pub kind: SquadKind,
    pub sector: Option<SectorId>,
    pub members: Vec<MercId>,
}
