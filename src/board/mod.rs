//! Board representation and game-state types.
//!
//! Contains the live data structures for sectors, players, mercs, squads,
//! the dictator figure, and the actions players submit against them.

pub mod action;
pub mod ids;
pub mod player;
pub mod sector;
pub mod state;
pub mod unit;

pub use action::{Action, HitAssignment};
pub use ids::{MercId, Seat, SectorId};
pub use player::{Controller, Player, Role};
pub use sector::{Sector, MAX_MILITIA};
pub use state::World;
pub use unit::{
    DictatorFigure, Dog, Loadout, Merc, Side, Squad, SquadKind, Stats, ACTIONS_PER_DAY, DOG_STATS,
    MILITIA_STATS,
};
