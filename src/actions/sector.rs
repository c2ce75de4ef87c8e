//! Exploring sectors and training militia.

use tracing::debug;

use crate::board::{MercId, Seat, SectorId, Side, World, MAX_MILITIA};
use crate::error::ActionError;
use crate::game::Game;
use crate::registry::EXPLORE_DRAW;

use super::{acting_merc, location, spend_action};

/// Militia raised by one train action.
pub const TRAIN_MILITIA: u8 = 2;

pub(crate) fn explore(game: &mut Game, seat: Seat, merc: MercId) -> Result<(), ActionError> {
    if game.world.side_of(seat) != Some(Side::Rebel) {
        return Err(ActionError::WrongRole(seat));
    }
    acting_merc(&game.world, seat, merc)?;
    let sector = location(&game.world, merc)?;
    if game.world.sector(sector).is_some_and(|s| s.explored) {
        return Err(ActionError::AlreadyExplored(sector));
    }

    let drawn = game.world.draw_equipment(EXPLORE_DRAW);
    debug!(%merc, %sector, ?drawn, "explored");
    if let Some(s) = game.world.sector_mut(sector) {
        s.explored = true;
        s.stash.extend(drawn);
    }
    spend_action(&mut game.world, merc);
    Ok(())
}

/// Whether `seat` may raise militia in `sector` right now.
pub fn check_train(world: &World, seat: Seat, sector: SectorId) -> Result<(), ActionError> {
    let side = world.side_of(seat).ok_or(ActionError::UnknownSeat(seat))?;
    let s = world.sector(sector).ok_or(ActionError::UnknownSector(sector))?;
    let present = match side {
        Side::Rebel => {
            if !s.explored || world.has_forces(sector, Side::Dictator) {
                return Err(ActionError::CannotTrain(sector));
            }
            s.militia_of(seat)
        }
        Side::Dictator => {
            if world.has_forces(sector, Side::Rebel) {
                return Err(ActionError::CannotTrain(sector));
            }
            s.dictator_militia
        }
    };
    if present >= MAX_MILITIA {
        return Err(ActionError::MilitiaFull(sector));
    }
    Ok(())
}

pub(crate) fn train(game: &mut Game, seat: Seat, merc: MercId) -> Result<(), ActionError> {
    acting_merc(&game.world, seat, merc)?;
    let sector = location(&game.world, merc)?;
    check_train(&game.world, seat, sector)?;

    let side = game.world.side_of(seat);
    let Some(s) = game.world.sector_mut(sector) else {
        return Err(ActionError::UnknownSector(sector));
    };
    let added = match side {
        Some(Side::Dictator) => s.add_dictator_militia(TRAIN_MILITIA),
        _ => s.add_rebel_militia(seat, TRAIN_MILITIA),
    };
    debug!(%merc, %sector, added, "militia trained");
    spend_action(&mut game.world, merc);
    Ok(())
}
