//! AI players.
//!
//! [`next_action`] produces exactly one action for an AI seat: an answer
//! to a suspended combat or an open coordinated attack if one is owed,
//! otherwise healing, then the first useful per-merc decision, and finally
//! ending the turn.

pub mod combat;
pub mod healing;
pub mod policy;

use tracing::debug;

use crate::board::{Action, Seat, Side};
use crate::flow::coordinated::eligible_seats;
use crate::game::Game;

pub use healing::{choose_heal, HealChoice};
pub use policy::{decide, AiDecision, DecisionKind, GARRISON_TARGET};

pub fn next_action(game: &Game, seat: Seat) -> Action {
    if game.active_combat().is_some() {
        return combat::combat_decision(game, seat).unwrap_or(Action::CombatContinue);
    }
    if game.coordinated_attack().is_some() {
        return combat::coordinated_response(game, seat);
    }

    match choose_heal(game, seat) {
        HealChoice::RepairKit { merc, item } | HealChoice::Item { merc, item } => {
            debug!(%seat, %merc, %item, "AI heals");
            return Action::Heal { merc, item };
        }
        HealChoice::None => {}
    }

    for merc in game.world().living_mercs_of(seat).filter(|m| m.can_act()) {
        let decision = decide(game, merc.id);
        if let Some(action) = to_action(game, seat, &decision) {
            debug!(%seat, merc = %merc.id, reason = %decision.reason, ?action, "AI decision");
            return action;
        }
    }
    Action::EndTurn
}

fn to_action(game: &Game, seat: Seat, decision: &AiDecision) -> Option<Action> {
    let merc = decision.merc;
    let action = match &decision.kind {
        DecisionKind::Explore => Action::Explore { merc },
        DecisionKind::ReEquip { item } => Action::ReEquip {
            merc,
            item: item.clone(),
        },
        DecisionKind::Train => Action::Train { merc },
        DecisionKind::Move { to } => {
            let world = game.world();
            let squad = world.squad_of(merc)?.kind;
            let attacking = world.side_of(seat) == Some(Side::Rebel) && world.has_forces(*to, Side::Dictator);
            if attacking && !eligible_seats(game, seat, *to).is_empty() {
                Action::DeclareCoordinatedAttack { target: *to, squad }
            } else {
                Action::Move { squad, to: *to }
            }
        }
        DecisionKind::None => return None,
    };
    Some(action)
}
