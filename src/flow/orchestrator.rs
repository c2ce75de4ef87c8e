//! Day and step sequencing.
//!
//! A day is a simultaneous rebel step followed by the dictator step. The
//! orchestrator decides who may act, and [`settle`] drives everything that
//! happens without a player's input: running combats until they suspend,
//! launching settled coordinated attacks, draining the combat queue, and
//! moving between steps and days.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::board::{Action, Seat, SectorId, Side};
use crate::combat::CombatOptions;
use crate::error::ActionError;
use crate::game::Game;

use super::batching::RebelBatching;
use super::coordinated;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    Rebels,
    Dictator,
}

/// A combat waiting to be started.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingCombat {
    pub sector: SectorId,
    pub player: Seat,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlowState {
    pub step: Step,
    /// Seats that ended their turn in the current step.
    pub done: BTreeSet<Seat>,
    pub batching: RebelBatching,
    /// Set when combat or a coordinated attack interrupted the step; the
    /// step is re-entered with fresh batching once the interruption clears.
    pub unwound: bool,
}

impl FlowState {
    pub fn new() -> Self {
        FlowState {
            step: Step::Rebels,
            done: BTreeSet::new(),
            batching: RebelBatching::default(),
            unwound: false,
        }
    }

    pub fn reset_rebel_batching(&mut self) {
        self.batching.reset();
    }
}

impl Default for FlowState {
    fn default() -> Self {
        Self::new()
    }
}

/// Rebels still taking part in the step.
fn active_rebels(game: &Game) -> Vec<Seat> {
    game.world
        .rebel_seats()
        .into_iter()
        .filter(|s| !game.flow.done.contains(s) && game.world.has_living_mercs(*s))
        .collect()
}

fn active_ai_rebels(game: &Game) -> Vec<Seat> {
    active_rebels(game)
        .into_iter()
        .filter(|&s| !game.world.is_human(s))
        .collect()
}

/// Seats expected to submit a regular action in the current step.
pub fn awaiting(game: &Game) -> Vec<Seat> {
    match game.flow.step {
        Step::Rebels => {
            let ai = active_ai_rebels(game);
            active_rebels(game)
                .into_iter()
                .filter(|&s| game.world.is_human(s) || !game.flow.batching.is_gated(s, &ai))
                .collect()
        }
        Step::Dictator => game
            .world
            .dictator_seat()
            .filter(|s| !game.flow.done.contains(s))
            .into_iter()
            .collect(),
    }
}

/// Checks that `seat` may take `action` in the current step. Ending the
/// turn is never gated.
pub(crate) fn ensure_may_act(game: &Game, seat: Seat, action: &Action) -> Result<(), ActionError> {
    let side = game
        .world
        .side_of(seat)
        .ok_or(ActionError::UnknownSeat(seat))?;
    if game.flow.done.contains(&seat) {
        return Err(ActionError::TurnEnded(seat));
    }
    match (game.flow.step, side) {
        (Step::Rebels, Side::Rebel) => {
            if !game.world.has_living_mercs(seat) {
                return Err(ActionError::NotAwaited(seat));
            }
            if *action != Action::EndTurn
                && !game.world.is_human(seat)
                && game.flow.batching.is_gated(seat, &active_ai_rebels(game))
            {
                return Err(ActionError::Gated(seat));
            }
            Ok(())
        }
        (Step::Dictator, Side::Dictator) => Ok(()),
        _ => Err(ActionError::NotAwaited(seat)),
    }
}

/// Counts a completed action towards AI batching.
pub(crate) fn record_action(game: &mut Game, seat: Seat) {
    if game.flow.step == Step::Rebels && !game.world.is_human(seat) {
        game.flow.batching.record(seat);
    }
}

pub(crate) fn end_turn(game: &mut Game, seat: Seat) {
    debug!(%seat, step = ?game.flow.step, "turn ended");
    game.flow.done.insert(seat);
}

/// Queues a combat unless one is already queued for the sector.
pub(crate) fn queue_combat(game: &mut Game, sector: SectorId, player: Seat) {
    if !game.pending_combats.iter().any(|p| p.sector == sector) {
        debug!(%sector, %player, "combat queued");
        game.pending_combats.push_back(PendingCombat { sector, player });
    }
    game.flow.unwound = true;
}

/// Advances everything that needs no player input.
pub(crate) fn settle(game: &mut Game) {
    loop {
        game.check_game_over();
        if game.winner.is_some() {
            return;
        }

        if let Some(combat) = &game.combat {
            if combat.pending().is_some() {
                return;
            }
            game.advance_combat();
            continue;
        }

        match &game.coordinated {
            Some(attack) if attack.is_settled() => {
                coordinated::launch(game);
                continue;
            }
            Some(_) => {
                game.flow.unwound = true;
                return;
            }
            None => {}
        }

        if let Some(next) = game.pending_combats.pop_front() {
            if !game.world.is_contested(next.sector) {
                debug!(sector = %next.sector, "queued combat no longer contested");
                continue;
            }
            let options = CombatOptions {
                interactive: game.config.interactive_combat,
            };
            if let Err(err) = game.start_combat(next.sector, next.player, options) {
                debug!(sector = %next.sector, %err, "queued combat dropped");
            }
            continue;
        }

        if game.flow.unwound {
            game.flow.unwound = false;
            game.flow.reset_rebel_batching();
            debug!(step = ?game.flow.step, "step re-entered");
        }

        match game.flow.step {
            Step::Rebels if active_rebels(game).is_empty() => {
                debug!(day = game.world.day, "rebel step complete");
                game.flow.step = Step::Dictator;
                game.flow.reset_rebel_batching();
            }
            Step::Dictator if awaiting(game).is_empty() => end_day(game),
            _ => return,
        }
    }
}

fn end_day(game: &mut Game) {
    game.world.day += 1;
    game.world.refresh_actions();
    game.flow.done.clear();
    game.flow.step = Step::Rebels;
    game.flow.reset_rebel_batching();
    info!(day = game.world.day, "new day");
}
