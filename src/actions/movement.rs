//! Squad movement and the land mines waiting at the destination.

use tracing::{debug, info};

use crate::board::{MercId, Seat, SectorId, Side, SquadKind, World};
use crate::error::ActionError;
use crate::flow::orchestrator::queue_combat;
use crate::game::Game;

/// Checks a squad move and returns the sector it leaves.
pub fn check_move(world: &World, seat: Seat, kind: SquadKind, to: SectorId) -> Result<SectorId, ActionError> {
    let squad = world
        .squad(seat, kind)
        .ok_or(ActionError::UnknownSquad { seat, squad: kind })?;
    let from = squad
        .sector
        .ok_or(ActionError::UnknownSquad { seat, squad: kind })?;
    if world.sector(to).is_none() {
        return Err(ActionError::UnknownSector(to));
    }
    let mut living = world.living_members(squad).peekable();
    if living.peek().is_none() {
        return Err(ActionError::EmptySquad(kind));
    }
    if living.any(|m| m.actions == 0) {
        return Err(ActionError::SquadNotReady(kind));
    }
    if !world.is_adjacent(from, to) {
        return Err(ActionError::NotAdjacent { from, to });
    }
    Ok(from)
}

pub(crate) fn move_squad(game: &mut Game, seat: Seat, kind: SquadKind, to: SectorId) -> Result<(), ActionError> {
    let from = check_move(&game.world, seat, kind, to)?;
    debug!(%seat, ?kind, %from, %to, "squad moves");
    advance_squad(game, seat, kind, to);
    if game.world.is_contested(to) {
        queue_combat(game, to, seat);
    }
    Ok(())
}

/// Spends one action per living member, moves the squad, and springs any
/// mines on rebels entering. Legality is the caller's concern.
pub(crate) fn advance_squad(game: &mut Game, seat: Seat, kind: SquadKind, to: SectorId) {
    let members: Vec<MercId> = match game.world.squad(seat, kind) {
        Some(squad) => game.world.living_members(squad).map(|m| m.id).collect(),
        None => return,
    };
    for &id in &members {
        super::spend_action(&mut game.world, id);
    }
    game.world.move_squad(seat, kind, to);
    if game.world.side_of(seat) == Some(Side::Rebel) {
        spring_mines(game, &members, to);
    }
}

/// Every mine in the sector goes off once; each one damages every entering
/// merc and is discarded.
fn spring_mines(game: &mut Game, members: &[MercId], sector: SectorId) {
    let catalog = game.catalog.clone();
    let mines: Vec<String> = match game.world.sector_mut(sector) {
        Some(s) => {
            let (mines, rest): (Vec<String>, Vec<String>) = s
                .stash
                .drain(..)
                .partition(|key| catalog.is_land_mine(key));
            s.stash = rest;
            mines
        }
        None => return,
    };

    for mine in mines {
        let damage = catalog.mine_damage(&mine);
        info!(%sector, %mine, damage, "land mine triggered");
        for &id in members {
            let Some(merc) = game.world.merc_mut(id).filter(|m| m.alive) else {
                continue;
            };
            merc.damage = merc.damage.saturating_add(damage).min(merc.max_health());
            if merc.health() == 0 {
                debug!(merc = %id, "killed by a mine");
                game.world.kill_merc(id);
            }
        }
        game.world.discard.push(mine);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{Action, Controller, Role, Stats};
    use crate::combat::CombatOptions;
    use crate::setup::ScenarioBuilder;

    const STURDY: Stats = Stats {
        initiative: 2,
        combat: 2,
        health: 4,
    };

    /// A human rebel squad of two in A1 next to a mined B1.
    fn squad_near_mines(second: Stats) -> (Game, Seat, MercId, MercId) {
        let mut b = ScenarioBuilder::new(3, 2).unwrap();
        b.seed(3).interactive(false);
        let rebel = b.add_player("Rebel", Role::Rebel, Controller::Human);
        b.add_player("Dictator", Role::Dictator, Controller::Ai);
        let a = b
            .add_merc(rebel, SquadKind::Primary, SectorId(0), "grunt", "Able", STURDY)
            .unwrap();
        let c = b
            .add_merc(rebel, SquadKind::Primary, SectorId(0), "grunt", "Charlie", second)
            .unwrap();
        b.stash(SectorId(1), "land_mine").unwrap();
        b.stash(SectorId(1), "rifle").unwrap();
        (b.build().unwrap(), rebel, a, c)
    }

    #[test]
    fn mines_hurt_every_entering_merc_once() {
        let (mut game, rebel, a, c) = squad_near_mines(STURDY);
        game.apply(rebel, Action::Move { squad: SquadKind::Primary, to: SectorId(1) })
            .unwrap();

        for id in [a, c] {
            let merc = game.world().merc(id).unwrap();
            assert_eq!(merc.health(), 3);
            assert_eq!(merc.actions, 1);
            assert_eq!(game.world().merc_sector(id), Some(SectorId(1)));
        }
        assert_eq!(game.world().sector(SectorId(1)).unwrap().stash, vec!["rifle".to_string()]);
        assert_eq!(game.world().discard, vec!["land_mine".to_string()]);
    }

    #[test]
    fn mine_kills_drop_gear_where_the_merc_fell() {
        let fragile = Stats {
            initiative: 1,
            combat: 1,
            health: 1,
        };
        let mut b = ScenarioBuilder::new(3, 2).unwrap();
        let rebel = b.add_player("Rebel", Role::Rebel, Controller::Human);
        b.add_player("Dictator", Role::Dictator, Controller::Ai);
        let a = b
            .add_merc(rebel, SquadKind::Primary, SectorId(0), "grunt", "Able", STURDY)
            .unwrap();
        let c = b
            .add_merc(rebel, SquadKind::Primary, SectorId(0), "grunt", "Charlie", fragile)
            .unwrap();
        b.equip(c, "smg").unwrap();
        b.stash(SectorId(1), "land_mine").unwrap();
        let mut game = b.build().unwrap();

        game.apply(rebel, Action::Move { squad: SquadKind::Primary, to: SectorId(1) })
            .unwrap();

        assert!(!game.world().merc(c).unwrap().alive);
        assert!(game.world().merc(a).unwrap().alive);
        assert_eq!(game.world().sector(SectorId(1)).unwrap().stash, vec!["smg".to_string()]);
        assert_eq!(game.world().squad(rebel, SquadKind::Primary).unwrap().members, vec![a]);
        assert!(!game.is_over());
    }

    #[test]
    fn moves_are_checked_before_anything_changes() {
        let (mut game, rebel, _, c) = squad_near_mines(STURDY);
        assert_eq!(
            check_move(&game.world, rebel, SquadKind::Primary, SectorId(4)),
            Err(ActionError::NotAdjacent {
                from: SectorId(0),
                to: SectorId(4)
            })
        );
        assert_eq!(
            check_move(&game.world, rebel, SquadKind::Secondary, SectorId(1)),
            Err(ActionError::UnknownSquad {
                seat: rebel,
                squad: SquadKind::Secondary
            })
        );

        if let Some(merc) = game.world.merc_mut(c) {
            merc.actions = 0;
        }
        assert_eq!(
            game.apply(rebel, Action::Move { squad: SquadKind::Primary, to: SectorId(1) }),
            Err(ActionError::SquadNotReady(SquadKind::Primary))
        );
        assert_eq!(game.world().sector(SectorId(1)).unwrap().stash.len(), 2);
        assert!(game.history().is_empty());
    }

    #[test]
    fn entering_an_enemy_sector_starts_combat() {
        let (mut game, rebel, _, _) = squad_near_mines(STURDY);
        game.world.sector_mut(SectorId(3)).unwrap().dictator_militia = 1;

        let outcome = game
            .apply(rebel, Action::Move { squad: SquadKind::Primary, to: SectorId(3) })
            .unwrap();
        let combat = outcome.combat.unwrap();
        assert_eq!(combat.sector, SectorId(3));
        assert!(!combat.combat_pending);
        assert!(game.pending_combats().next().is_none());
        assert_eq!(
            game.execute_combat(SectorId(3), rebel, CombatOptions::default()),
            Ok(combat)
        );
    }
}
