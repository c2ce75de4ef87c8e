//! Sectors of the map.
//!
//! A sector tracks exploration, the equipment stash lying in it, militia of
//! both sides, and its neighbours. Adjacency is supplied by whoever builds
//! the map; the engine only reads it.

use std::collections::BTreeMap;

use super::ids::{Seat, SectorId};

/// Militia cap per owner in a single sector.
pub const MAX_MILITIA: u8 = 10;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sector {
    pub id: SectorId,
    pub name: String,
    pub explored: bool,
    pub stash: Vec<String>,
    pub dictator_militia: u8,
    pub rebel_militia: BTreeMap<Seat, u8>,
    pub adjacent: Vec<SectorId>,
}

impl Sector {
    pub fn new(id: SectorId, name: impl Into<String>) -> Self {
        Sector {
            id,
            name: name.into(),
            explored: false,
            stash: Vec::new(),
            dictator_militia: 0,
            rebel_militia: BTreeMap::new(),
            adjacent: Vec::new(),
        }
    }

    /// Militia belonging to one rebel seat.
    pub fn militia_of(&self, seat: Seat) -> u8 {
        self.rebel_militia.get(&seat).copied().unwrap_or(0)
    }

    /// All rebel militia regardless of owner.
    pub fn total_rebel_militia(&self) -> u32 {
        self.rebel_militia.values().map(|&n| u32::from(n)).sum()
    }

    /// Adds up to `count` rebel militia, respecting the cap. Returns how many were added.
    pub fn add_rebel_militia(&mut self, seat: Seat, count: u8) -> u8 {
        let current = self.militia_of(seat);
        let added = count.min(MAX_MILITIA.saturating_sub(current));
        if added > 0 {
            self.rebel_militia.insert(seat, current + added);
        }
        added
    }

    /// Adds up to `count` dictator militia, respecting the cap. Returns how many were added.
    pub fn add_dictator_militia(&mut self, count: u8) -> u8 {
        let added = count.min(MAX_MILITIA.saturating_sub(self.dictator_militia));
        self.dictator_militia += added;
        added
    }

    /// Removes one rebel militia of a seat, dropping the entry at zero.
    pub fn remove_rebel_militia(&mut self, seat: Seat) {
        if let Some(count) = self.rebel_militia.get_mut(&seat) {
            *count = count.saturating_sub(1);
            if *count == 0 {
                self.rebel_militia.remove(&seat);
            }
        }
    }

    /// Removes and returns the first stash item equal to `key`.
    pub fn take_from_stash(&mut self, key: &str) -> Option<String> {
        let pos = self.stash.iter().position(|item| item == key)?;
        Some(self.stash.remove(pos))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn militia_respects_cap() {
        let mut s = Sector::new(SectorId(0), "A1");
        assert_eq!(s.add_rebel_militia(Seat(1), 7), 7);
        assert_eq!(s.add_rebel_militia(Seat(1), 7), 3);
        assert_eq!(s.militia_of(Seat(1)), MAX_MILITIA);
        assert_eq!(s.add_dictator_militia(12), MAX_MILITIA);
        assert_eq!(s.add_dictator_militia(1), 0);
    }

    #[test]
    fn removing_last_militia_drops_entry() {
        let mut s = Sector::new(SectorId(0), "A1");
        s.add_rebel_militia(Seat(0), 1);
        s.remove_rebel_militia(Seat(0));
        assert!(s.rebel_militia.is_empty());
        assert_eq!(s.total_rebel_militia(), 0);
    }

    #[test]
    fn take_from_stash_removes_one_copy() {
        let mut s = Sector::new(SectorId(0), "A1");
        s.stash = vec!["rifle".into(), "rifle".into()];
        assert_eq!(s.take_from_stash("rifle"), Some("rifle".to_string()));
        assert_eq!(s.stash.len(), 1);
        assert_eq!(s.take_from_stash("pistol"), None);
    }
}
