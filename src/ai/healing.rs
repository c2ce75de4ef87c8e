//! Healing priorities: a repair kit anywhere first, then any other healing
//! item, then nothing.

use crate::actions::equipment::heal_source;
use crate::board::{MercId, Seat};
use crate::game::Game;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealChoice {
    RepairKit { merc: MercId, item: String },
    Item { merc: MercId, item: String },
    None,
}

/// Healing items reachable by `merc`: its own gear first, then the stash.
fn reachable(game: &Game, merc: MercId) -> Vec<String> {
    let world = game.world();
    let Some(m) = world.merc(merc) else {
        return Vec::new();
    };
    let mut items: Vec<String> = m.loadout.items().map(str::to_string).collect();
    if let Some(stash) = world
        .merc_sector(merc)
        .and_then(|s| world.sector(s))
        .map(|s| &s.stash)
    {
        items.extend(stash.iter().cloned());
    }
    items
        .into_iter()
        .filter(|key| game.catalog().heal_amount(key) > 0 && heal_source(world, m, key).is_some())
        .collect()
}

pub fn choose_heal(game: &Game, seat: Seat) -> HealChoice {
    let wounded: Vec<MercId> = game
        .world()
        .living_mercs_of(seat)
        .filter(|m| m.can_act() && m.is_wounded())
        .map(|m| m.id)
        .collect();

    let catalog = game.catalog();
    let mut fallback = HealChoice::None;
    for merc in wounded {
        let items = reachable(game, merc);
        if let Some(item) = items.iter().find(|k| catalog.is_repair_kit(k)) {
            return HealChoice::RepairKit {
                merc,
                item: item.clone(),
            };
        }
        if fallback == HealChoice::None {
            if let Some(item) = items.into_iter().next() {
                fallback = HealChoice::Item { merc, item };
            }
        }
    }
    fallback
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::next_action;
    use crate::board::{Action, Controller, Role, SectorId, SquadKind, Stats};
    use crate::setup::ScenarioBuilder;

    fn wounded_in_a1(stash: &[&str]) -> (Game, Seat, MercId) {
        let mut b = ScenarioBuilder::new(3, 2).unwrap();
        let rebel = b.add_player("Rebel", Role::Rebel, Controller::Ai);
        b.add_player("Dictator", Role::Dictator, Controller::Ai);
        let stats = Stats {
            initiative: 2,
            combat: 2,
            health: 5,
        };
        let merc = b
            .add_merc(rebel, SquadKind::Primary, SectorId(0), "grunt", "Grunt", stats)
            .unwrap();
        b.wound(merc, 3).unwrap();
        for item in stash {
            b.stash(SectorId(0), item).unwrap();
        }
        (b.build().unwrap(), rebel, merc)
    }

    #[test]
    fn repair_kit_is_preferred() {
        let (game, rebel, merc) = wounded_in_a1(&["medical_kit", "repair_kit"]);
        assert_eq!(
            choose_heal(&game, rebel),
            HealChoice::RepairKit {
                merc,
                item: "repair_kit".into()
            }
        );
    }

    #[test]
    fn any_healing_item_is_the_fallback() {
        let (game, rebel, merc) = wounded_in_a1(&["rifle", "medical_kit"]);
        assert_eq!(
            choose_heal(&game, rebel),
            HealChoice::Item {
                merc,
                item: "medical_kit".into()
            }
        );
    }

    #[test]
    fn out_of_reach_items_do_not_count() {
        let (mut game, rebel, _) = wounded_in_a1(&["rifle"]);
        game.world
            .sector_mut(SectorId(1))
            .unwrap()
            .stash
            .push("repair_kit".into());
        assert_eq!(choose_heal(&game, rebel), HealChoice::None);
    }

    #[test]
    fn healing_comes_before_exploring() {
        let (mut game, rebel, merc) = wounded_in_a1(&["medical_kit"]);
        let heal = Action::Heal {
            merc,
            item: "medical_kit".into(),
        };
        assert_eq!(next_action(&game, rebel), heal);

        game.apply(rebel, heal).unwrap();
        assert_eq!(choose_heal(&game, rebel), HealChoice::None);
        assert_eq!(next_action(&game, rebel), Action::Explore { merc });
    }
}
