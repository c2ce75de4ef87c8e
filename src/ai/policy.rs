//! Per-merc day decisions.
//!
//! [`decide`] looks at one merc and picks the first applicable option in a
//! fixed priority. It reads the game and never changes it.

use std::collections::{BTreeSet, VecDeque};

use serde::Serialize;

use crate::actions::sector::check_train;
use crate::board::{Merc, MercId, Seat, SectorId, Side, Squad, World};
use crate::combat::combatant::{project_side, strength};
use crate::combat::CombatantId;
use crate::game::Game;
use crate::registry::Catalog;

/// Militia a merc tries to keep in its own sector.
pub const GARRISON_TARGET: u8 = 4;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DecisionKind {
    Explore,
    ReEquip { item: String },
    Train,
    Move { to: SectorId },
    None,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AiDecision {
    pub merc: MercId,
    pub kind: DecisionKind,
    pub reason: String,
}

pub fn decide(game: &Game, id: MercId) -> AiDecision {
    let world = game.world();
    let decision = |kind: DecisionKind, reason: &str| AiDecision {
        merc: id,
        kind,
        reason: reason.to_string(),
    };

    let Some(merc) = world.merc(id).filter(|m| m.can_act()) else {
        return decision(DecisionKind::None, "cannot act");
    };
    let (Some(here), Some(side)) = (world.merc_sector(id), world.side_of(merc.owner)) else {
        return decision(DecisionKind::None, "not on the map");
    };
    let Some(sector) = world.sector(here) else {
        return decision(DecisionKind::None, "not on the map");
    };

    if side == Side::Rebel && !sector.explored {
        return decision(DecisionKind::Explore, "current sector is unexplored");
    }
    if let Some(item) = best_upgrade(game.catalog(), merc, &sector.stash) {
        return decision(DecisionKind::ReEquip { item }, "better gear in the stash");
    }

    let can_train = check_train(world, merc.owner, here).is_ok();
    let garrison = match side {
        Side::Rebel => sector.militia_of(merc.owner),
        Side::Dictator => sector.dictator_militia,
    };
    if can_train && garrison < GARRISON_TARGET {
        return decision(DecisionKind::Train, "garrison below target");
    }

    if let Some(squad) = world.squad_of(id) {
        if is_cohesive(world, squad) {
            if let Some(to) = best_move(game, squad, here, side) {
                return decision(DecisionKind::Move { to }, "best adjacent sector");
            }
        }
    }
    if can_train {
        return decision(DecisionKind::Train, "nothing better to do");
    }
    decision(DecisionKind::None, "no useful action")
}

/// The stash item that most improves its slot over what the merc carries.
fn best_upgrade(catalog: &dyn Catalog, merc: &Merc, stash: &[String]) -> Option<String> {
    let mut best: Option<(i32, &String)> = None;
    for item in stash {
        let Some(profile) = catalog.equipment(item).filter(|p| p.is_equippable()) else {
            continue;
        };
        let current = merc
            .loadout
            .get(profile.slot)
            .and_then(|k| catalog.equipment(k))
            .map_or(0, |p| p.rating());
        let gain = profile.rating() - current;
        if gain > 0 && best.map_or(true, |(g, _)| gain > g) {
            best = Some((gain, item));
        }
    }
    best.map(|(_, item)| item.clone())
}

/// A squad only moves when every living member can.
fn is_cohesive(world: &World, squad: &Squad) -> bool {
    let mut living = world.living_members(squad).peekable();
    living.peek().is_some() && living.all(|m| m.actions > 0)
}

fn belongs_to(squad: &Squad, id: CombatantId) -> bool {
    match id {
        CombatantId::Merc(m) | CombatantId::Dog(m) => squad.members.contains(&m),
        _ => false,
    }
}

fn side_strength(world: &World, catalog: &dyn Catalog, sector: SectorId, side: Side, dictator: Seat) -> u32 {
    strength(&project_side(world, catalog, sector, side, dictator, 0))
}

/// Scores each neighbour and returns the best one worth moving to.
///
/// Defended sectors are only worth entering with half again the
/// defenders' strength. Rebels also like unexplored sectors, loot, and
/// getting closer to the dictator.
fn best_move(game: &Game, squad: &Squad, here: SectorId, side: Side) -> Option<SectorId> {
    let world = game.world();
    let catalog = game.catalog();
    let dictator = world.dictator_seat()?;
    let ours: Vec<_> = project_side(world, catalog, here, side, dictator, 0)
        .into_iter()
        .filter(|c| belongs_to(squad, c.id))
        .collect();
    let ours = strength(&ours);

    let goal = match side {
        Side::Rebel => world
            .dictator
            .as_ref()
            .filter(|d| d.alive)
            .and_then(|d| d.sector),
        Side::Dictator => None,
    };
    let distance_here = goal.and_then(|g| distance(world, here, g));

    let mut best: Option<(i32, SectorId)> = None;
    for &adj in world.adjacent(here) {
        let Some(target) = world.sector(adj) else {
            continue;
        };
        let enemy = side_strength(world, catalog, adj, side.opponent(), dictator);
        let mut score = 0i32;
        if enemy > 0 {
            if ours.saturating_mul(2) <= enemy.saturating_mul(3) {
                continue;
            }
            score += 6;
        }
        if side == Side::Rebel {
            if !target.explored {
                score += 3;
            }
            let loot = target
                .stash
                .iter()
                .filter(|k| catalog.equipment(k).is_some_and(|p| p.is_equippable()))
                .count();
            score += loot.min(3) as i32;
            if let (Some(goal), Some(d)) = (goal, distance_here) {
                if distance(world, adj, goal).is_some_and(|n| n < d) {
                    score += 2;
                }
            }
        }
        if score > 0 && best.map_or(true, |(b, _)| score > b) {
            best = Some((score, adj));
        }
    }
    best.map(|(_, to)| to)
}

/// Steps between two sectors, if connected.
fn distance(world: &World, from: SectorId, to: SectorId) -> Option<u32> {
    let mut seen = BTreeSet::from([from]);
    let mut queue = VecDeque::from([(from, 0u32)]);
    while let Some((at, steps)) = queue.pop_front() {
        if at == to {
            return Some(steps);
        }
        for &next in world.adjacent(at) {
            if seen.insert(next) {
                queue.push_back((next, steps + 1));
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{Controller, Role, SquadKind, Stats};
    use crate::setup::ScenarioBuilder;

    const GRUNT: Stats = Stats {
        initiative: 2,
        combat: 2,
        health: 3,
    };

    struct Scene {
        builder: ScenarioBuilder,
        rebel: Seat,
        dictator: Seat,
        merc: MercId,
    }

    /// An AI rebel with one merc in A1 and an empty dictator seat.
    fn scene() -> Scene {
        let mut builder = ScenarioBuilder::new(3, 2).unwrap();
        let rebel = builder.add_player("Rebel", Role::Rebel, Controller::Ai);
        let dictator = builder.add_player("Dictator", Role::Dictator, Controller::Ai);
        let merc = builder
            .add_merc(rebel, SquadKind::Primary, SectorId(0), "grunt", "Grunt", GRUNT)
            .unwrap();
        Scene {
            builder,
            rebel,
            dictator,
            merc,
        }
    }

    /// Like [`scene`], but A1 is explored and fully garrisoned so neither
    /// exploring nor training comes first.
    fn garrisoned() -> Scene {
        let mut s = scene();
        s.builder.explore(SectorId(0)).unwrap();
        s.builder
            .rebel_militia(SectorId(0), s.rebel, GARRISON_TARGET)
            .unwrap();
        s
    }

    fn kind(s: Scene) -> DecisionKind {
        let merc = s.merc;
        decide(&s.builder.build().unwrap(), merc).kind
    }

    #[test]
    fn unexplored_sector_is_explored_before_looting() {
        let mut s = scene();
        s.builder.stash(SectorId(0), "rifle").unwrap();
        assert_eq!(kind(s), DecisionKind::Explore);
    }

    #[test]
    fn better_stash_gear_comes_next() {
        let mut s = scene();
        s.builder.explore(SectorId(0)).unwrap();
        s.builder.equip(s.merc, "pistol").unwrap();
        for item in ["land_mine", "pistol", "rifle"] {
            s.builder.stash(SectorId(0), item).unwrap();
        }
        assert_eq!(kind(s), DecisionKind::ReEquip { item: "rifle".into() });
    }

    #[test]
    fn thin_garrison_is_trained_before_moving() {
        let mut s = scene();
        s.builder.explore(SectorId(0)).unwrap();
        s.builder.equip(s.merc, "rifle").unwrap();
        s.builder.stash(SectorId(0), "pistol").unwrap();
        s.builder
            .rebel_militia(SectorId(0), s.rebel, GARRISON_TARGET - 1)
            .unwrap();
        let merc = s.merc;
        let game = s.builder.build().unwrap();
        let d = decide(&game, merc);
        assert_eq!(d.kind, DecisionKind::Train);
        assert_eq!(d.reason, "garrison below target");
    }

    #[test]
    fn full_garrison_moves_towards_loot() {
        assert_eq!(kind(garrisoned()), DecisionKind::Move { to: SectorId(1) });

        let mut s = garrisoned();
        s.builder.stash(SectorId(3), "rifle").unwrap();
        assert_eq!(kind(s), DecisionKind::Move { to: SectorId(3) });
    }

    #[test]
    fn squad_waits_for_members_without_actions() {
        let mut s = garrisoned();
        let partner = s
            .builder
            .add_merc(s.rebel, SquadKind::Primary, SectorId(0), "grunt", "Partner", GRUNT)
            .unwrap();
        let merc = s.merc;
        let mut game = s.builder.build().unwrap();
        game.world.merc_mut(partner).unwrap().actions = 0;

        let d = decide(&game, merc);
        assert_eq!(d.kind, DecisionKind::Train);
        assert_eq!(d.reason, "nothing better to do");
        assert_eq!(decide(&game, partner).kind, DecisionKind::None);
    }

    #[test]
    fn strong_defences_are_not_attacked() {
        let defended = |militia| {
            let mut s = garrisoned();
            s.builder.explore(SectorId(1)).unwrap();
            s.builder.explore(SectorId(3)).unwrap();
            s.builder.dictator_militia(SectorId(1), militia).unwrap();
            kind(s)
        };
        assert_eq!(defended(1), DecisionKind::Move { to: SectorId(1) });
        assert_eq!(defended(5), DecisionKind::Train);
    }

    #[test]
    fn dictator_mercs_never_explore() {
        let mut s = scene();
        let guard = s
            .builder
            .add_merc(s.dictator, SquadKind::Primary, SectorId(5), "grunt", "Guard", GRUNT)
            .unwrap();
        let game = s.builder.build().unwrap();
        assert_eq!(decide(&game, guard).kind, DecisionKind::Train);
    }

    #[test]
    fn exhausted_merc_has_no_decision() {
        let s = scene();
        let merc = s.merc;
        let mut game = s.builder.build().unwrap();
        game.world.merc_mut(merc).unwrap().actions = 0;
        assert_eq!(decide(&game, merc).kind, DecisionKind::None);
    }
}
