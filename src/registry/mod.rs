//! Ability and equipment registry.
//!
//! The engine never hard-codes what a merc or an item does. It asks a
//! [`Catalog`] keyed by merc key or item key, and unknown keys fall back to
//! "no modifier". [`Registry`] is the table-backed implementation.

pub mod ability;
pub mod equipment;
pub mod standard;

use std::collections::BTreeMap;
use std::fmt::Debug;

use serde::{Deserialize, Serialize};

pub use ability::{AbilityLookup, AbilityProfile, CombatModifiers, SquadBonus};
pub use equipment::{EquipmentLookup, EquipmentProfile, Slot};
pub use standard::{standard_deck, MercTemplate, DICTATOR_ROSTER, EXPLORE_DRAW, MERC_ROSTER};

/// Everything the engine needs to know about content.
pub trait Catalog: AbilityLookup + EquipmentLookup + Debug + Send + Sync {}

impl<T> Catalog for T where T: AbilityLookup + EquipmentLookup + Debug + Send + Sync {}

/// Table-backed catalog.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Registry {
    pub abilities: BTreeMap<String, AbilityProfile>,
    pub equipment: BTreeMap<String, EquipmentProfile>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ability(mut self, key: impl Into<String>, profile: AbilityProfile) -> Self {
        self.abilities.insert(key.into(), profile);
        self
    }

    pub fn with_equipment(mut self, key: impl Into<String>, profile: EquipmentProfile) -> Self {
        self.equipment.insert(key.into(), profile);
        self
    }

    /// Parses a registry from JSON. Missing tables are empty.
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}

impl AbilityLookup for Registry {
    fn ability(&self, key: &str) -> Option<&AbilityProfile> {
        self.abilities.get(key)
    }
}

impl EquipmentLookup for Registry {
    fn equipment(&self, key: &str) -> Option<&EquipmentProfile> {
        self.equipment.get(key)
    }
}
