//! Identifier newtypes.
//!
//! Sectors, mercs, and player seats are addressed by small integer ids that
//! double as indices into the world's vectors.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A sector on the map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SectorId(pub u16);

/// A mercenary, rebel or dictator-hired.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MercId(pub u16);

/// A player seat at the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Seat(pub u8);

impl SectorId {
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl MercId {
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl Seat {
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for SectorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl fmt::Display for MercId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "merc {}", self.0)
    }
}

impl fmt::Display for Seat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "seat {}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_index_their_vectors() {
        assert_eq!(SectorId(7).index(), 7);
        assert_eq!(MercId(3).index(), 3);
        assert_eq!(Seat(2).index(), 2);
    }

    #[test]
    fn display_is_human_readable() {
        assert_eq!(SectorId(4).to_string(), "#4");
        assert_eq!(MercId(1).to_string(), "merc 1");
        assert_eq!(Seat(0).to_string(), "seat 0");
    }
}
