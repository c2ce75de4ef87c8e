//! Regular day actions.
//!
//! Each action validates completely before touching the world, so a
//! rejected action leaves the game unchanged.

pub mod equipment;
pub mod movement;
pub mod sector;

use crate::board::{Merc, MercId, Seat, SectorId, World};
use crate::error::ActionError;

pub use sector::TRAIN_MILITIA;

/// The merc `seat` wants to spend an action on.
pub(crate) fn acting_merc(world: &World, seat: Seat, id: MercId) -> Result<&Merc, ActionError> {
    let merc = world.merc(id).ok_or(ActionError::UnknownMerc(id))?;
    if merc.owner != seat {
        return Err(ActionError::NotOwner { seat, merc: id });
    }
    if !merc.alive {
        return Err(ActionError::MercDead(id));
    }
    if merc.actions == 0 {
        return Err(ActionError::NoActionsLeft(id));
    }
    Ok(merc)
}

pub(crate) fn location(world: &World, id: MercId) -> Result<SectorId, ActionError> {
    world.merc_sector(id).ok_or(ActionError::NotOnMap(id))
}

pub(crate) fn spend_action(world: &mut World, id: MercId) {
    if let Some(merc) = world.merc_mut(id) {
        merc.actions = merc.actions.saturating_sub(1);
    }
}
