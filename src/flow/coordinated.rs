//! Coordinated attacks: one rebel declares, others adjacent to the target
//! may commit a squad, and everyone committed enters together so a single
//! combat resolves them all.

use serde::Serialize;
use tracing::{debug, info};

use crate::actions::movement::{advance_squad, check_move};
use crate::board::{Seat, SectorId, Side, SquadKind, World};
use crate::error::ActionError;
use crate::game::Game;

use super::orchestrator::queue_combat;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CoordinatedAttack {
    pub target: SectorId,
    pub declarer: Seat,
    pub committed: Vec<(Seat, SquadKind)>,
    pub declined: Vec<Seat>,
    /// Seats asked to answer, fixed at declaration.
    pub eligible: Vec<Seat>,
}

impl CoordinatedAttack {
    pub fn responded(&self, seat: Seat) -> bool {
        self.declined.contains(&seat) || self.committed.iter().any(|&(s, _)| s == seat)
    }

    pub fn awaiting(&self) -> Vec<Seat> {
        self.eligible
            .iter()
            .copied()
            .filter(|&s| !self.responded(s))
            .collect()
    }

    pub fn is_settled(&self) -> bool {
        self.awaiting().is_empty()
    }
}

/// Squads of `seat` that could step into `target` right now.
pub fn ready_squads(world: &World, seat: Seat, target: SectorId) -> Vec<SquadKind> {
    [SquadKind::Primary, SquadKind::Secondary]
        .into_iter()
        .filter(|&kind| check_move(world, seat, kind, target).is_ok())
        .collect()
}

/// Rebels other than the declarer who are still in the step and have a
/// squad ready to join.
pub fn eligible_seats(game: &Game, declarer: Seat, target: SectorId) -> Vec<Seat> {
    let world = game.world();
    world
        .rebel_seats()
        .into_iter()
        .filter(|&s| s != declarer && !game.flow.done.contains(&s))
        .filter(|&s| !ready_squads(world, s, target).is_empty())
        .collect()
}

pub(crate) fn declare(game: &mut Game, seat: Seat, target: SectorId, squad: SquadKind) -> Result<(), ActionError> {
    if game.world.side_of(seat) != Some(Side::Rebel) {
        return Err(ActionError::WrongRole(seat));
    }
    check_move(&game.world, seat, squad, target)?;
    if !game.world.has_forces(target, Side::Dictator) {
        return Err(ActionError::NoOpposingForces(target));
    }

    let eligible = eligible_seats(game, seat, target);
    if eligible.is_empty() {
        debug!(%seat, %target, "nobody can join, attacking alone");
        advance_squad(game, seat, squad, target);
        queue_combat(game, target, seat);
        return Ok(());
    }
    info!(%seat, %target, ?eligible, "coordinated attack declared");
    game.coordinated = Some(CoordinatedAttack {
        target,
        declarer: seat,
        committed: vec![(seat, squad)],
        declined: Vec::new(),
        eligible,
    });
    Ok(())
}

fn open_for(game: &Game, seat: Seat) -> Result<&CoordinatedAttack, ActionError> {
    let attack = game
        .coordinated
        .as_ref()
        .ok_or(ActionError::NoCoordinatedAttack)?;
    if !attack.eligible.contains(&seat) {
        return Err(ActionError::NotEligible(seat));
    }
    if attack.responded(seat) {
        return Err(ActionError::AlreadyResponded(seat));
    }
    Ok(attack)
}

pub(crate) fn join(game: &mut Game, seat: Seat, squad: SquadKind) -> Result<(), ActionError> {
    let target = open_for(game, seat)?.target;
    check_move(&game.world, seat, squad, target)?;
    if let Some(attack) = game.coordinated.as_mut() {
        attack.committed.push((seat, squad));
    }
    debug!(%seat, ?squad, "joined coordinated attack");
    Ok(())
}

pub(crate) fn decline(game: &mut Game, seat: Seat) -> Result<(), ActionError> {
    open_for(game, seat)?;
    if let Some(attack) = game.coordinated.as_mut() {
        attack.declined.push(seat);
    }
    debug!(%seat, "declined coordinated attack");
    Ok(())
}

/// The declarer stops waiting; everyone still silent counts as declined.
pub(crate) fn execute(game: &mut Game, seat: Seat) -> Result<(), ActionError> {
    let attack = game
        .coordinated
        .as_mut()
        .ok_or(ActionError::NoCoordinatedAttack)?;
    if attack.declarer != seat {
        return Err(ActionError::NotDeclarer(attack.declarer));
    }
    let silent = attack.awaiting();
    attack.declined.extend(silent);
    Ok(())
}

/// Moves every committed squad into the target and queues one combat.
pub(crate) fn launch(game: &mut Game) {
    let Some(attack) = game.coordinated.take() else {
        return;
    };
    info!(target = %attack.target, squads = attack.committed.len(), "coordinated attack launched");
    for &(seat, squad) in &attack.committed {
        // Mines sprung by an earlier squad can leave a later one empty.
        if check_move(&game.world, seat, squad, attack.target).is_ok() {
            advance_squad(game, seat, squad, attack.target);
        }
    }
    queue_combat(game, attack.target, attack.declarer);
}
