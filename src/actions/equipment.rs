//! Swapping gear with the sector stash and using healing items.

use tracing::{debug, warn};

use crate::board::{Dog, Merc, MercId, Seat, World};
use crate::error::ActionError;
use crate::game::Game;
use crate::registry::{Catalog, Slot};

use super::{acting_merc, location, spend_action};

/// Where a healing item would be taken from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HealSource {
    Loadout,
    Stash,
}

/// The slot `item` would go into, or why it cannot be equipped. Items the
/// catalog does not know are carried as accessories.
pub fn slot_for(catalog: &dyn Catalog, item: &str) -> Result<Slot, ActionError> {
    match catalog.equipment(item) {
        Some(profile) if !profile.is_equippable() => Err(ActionError::NotEquippable(item.to_string())),
        Some(profile) => Ok(profile.slot),
        None => {
            warn!(%item, "unknown item equipped as an accessory");
            Ok(Slot::Accessory)
        }
    }
}

pub(crate) fn re_equip(game: &mut Game, seat: Seat, merc: MercId, item: &str) -> Result<(), ActionError> {
    acting_merc(&game.world, seat, merc)?;
    let sector = location(&game.world, merc)?;
    if !game
        .world
        .sector(sector)
        .is_some_and(|s| s.stash.iter().any(|i| i == item))
    {
        return Err(ActionError::ItemNotAvailable(item.to_string()));
    }
    let slot = slot_for(game.catalog.as_ref(), item)?;

    let Some(taken) = game
        .world
        .sector_mut(sector)
        .and_then(|s| s.take_from_stash(item))
    else {
        return Err(ActionError::ItemNotAvailable(item.to_string()));
    };
    let catalog = game.catalog.clone();
    let Some(m) = game.world.merc_mut(merc) else {
        return Err(ActionError::UnknownMerc(merc));
    };
    let new_dog = catalog.equipment(&taken).is_some_and(|p| p.attack_dog);
    let old = m.loadout.replace(slot, Some(taken));
    if old
        .as_deref()
        .is_some_and(|k| catalog.equipment(k).is_some_and(|p| p.attack_dog))
    {
        m.dog = None;
    }
    if new_dog {
        m.dog = Some(Dog::default());
    }
    debug!(%merc, %item, ?slot, replaced = ?old, "re-equipped");
    if let (Some(old), Some(s)) = (old, game.world.sector_mut(sector)) {
        s.stash.push(old);
    }
    spend_action(&mut game.world, merc);
    Ok(())
}

/// Finds `item` on the merc or in its sector, preferring the merc's own gear.
pub fn heal_source(world: &World, merc: &Merc, item: &str) -> Option<HealSource> {
    if merc.loadout.items().any(|i| i == item) {
        return Some(HealSource::Loadout);
    }
    let sector = world.merc_sector(merc.id)?;
    world
        .sector(sector)?
        .stash
        .iter()
        .any(|i| i == item)
        .then_some(HealSource::Stash)
}

pub(crate) fn heal(game: &mut Game, seat: Seat, merc: MercId, item: &str) -> Result<(), ActionError> {
    let m = acting_merc(&game.world, seat, merc)?;
    let amount = game.catalog.heal_amount(item);
    if amount == 0 {
        return Err(ActionError::NotHealing(item.to_string()));
    }
    if !m.is_wounded() {
        return Err(ActionError::NotWounded(merc));
    }
    let source = heal_source(&game.world, m, item).ok_or_else(|| ActionError::ItemNotAvailable(item.to_string()))?;

    match source {
        HealSource::Loadout => {
            if let Some(m) = game.world.merc_mut(merc) {
                m.loadout.remove(item);
            }
        }
        HealSource::Stash => {
            let sector = location(&game.world, merc)?;
            if let Some(s) = game.world.sector_mut(sector) {
                s.take_from_stash(item);
            }
        }
    }
    if let Some(m) = game.world.merc_mut(merc) {
        m.damage = m.damage.saturating_sub(amount);
        debug!(%merc, %item, health = m.health(), "healed");
    }
    game.world.discard.push(item.to_string());
    spend_action(&mut game.world, merc);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{Action, Controller, Role, SectorId, SquadKind, Stats};
    use crate::setup::ScenarioBuilder;

    fn merc_with_pistol() -> (Game, Seat, MercId) {
        let mut b = ScenarioBuilder::new(3, 2).unwrap();
        let rebel = b.add_player("Rebel", Role::Rebel, Controller::Human);
        b.add_player("Dictator", Role::Dictator, Controller::Ai);
        let stats = Stats {
            initiative: 2,
            combat: 2,
            health: 5,
        };
        let merc = b
            .add_merc(rebel, SquadKind::Primary, SectorId(0), "grunt", "Grunt", stats)
            .unwrap();
        b.equip(merc, "pistol").unwrap();
        for item in ["rifle", "land_mine", "medical_kit"] {
            b.stash(SectorId(0), item).unwrap();
        }
        (b.build().unwrap(), rebel, merc)
    }

    fn stash(game: &Game) -> &[String] {
        &game.world().sector(SectorId(0)).unwrap().stash
    }

    #[test]
    fn re_equip_swaps_with_the_stash() {
        let (mut game, rebel, merc) = merc_with_pistol();
        game.apply(rebel, Action::ReEquip { merc, item: "rifle".into() })
            .unwrap();

        let m = game.world().merc(merc).unwrap();
        assert_eq!(m.loadout.weapon.as_deref(), Some("rifle"));
        assert_eq!(m.actions, 1);
        assert_eq!(stash(&game), ["land_mine", "medical_kit", "pistol"]);
    }

    #[test]
    fn mines_and_healing_items_stay_in_the_stash() {
        let (mut game, rebel, merc) = merc_with_pistol();
        assert_eq!(slot_for(game.catalog(), "land_mine"), Err(ActionError::NotEquippable("land_mine".into())));
        assert_eq!(
            game.apply(rebel, Action::ReEquip { merc, item: "medical_kit".into() }),
            Err(ActionError::NotEquippable("medical_kit".into()))
        );
        assert_eq!(
            game.apply(rebel, Action::ReEquip { merc, item: "sniper_rifle".into() }),
            Err(ActionError::ItemNotAvailable("sniper_rifle".into()))
        );
        assert_eq!(slot_for(game.catalog(), "mystery_box"), Ok(Slot::Accessory));
        assert_eq!(stash(&game).len(), 3);
    }

    #[test]
    fn healing_uses_up_the_item() {
        let (mut game, rebel, merc) = merc_with_pistol();
        assert_eq!(
            game.apply(rebel, Action::Heal { merc, item: "medical_kit".into() }),
            Err(ActionError::NotWounded(merc))
        );
        game.world.merc_mut(merc).unwrap().damage = 3;
        assert_eq!(
            game.apply(rebel, Action::Heal { merc, item: "rifle".into() }),
            Err(ActionError::NotHealing("rifle".into()))
        );

        let m = game.world().merc(merc).unwrap();
        assert_eq!(heal_source(game.world(), m, "medical_kit"), Some(HealSource::Stash));
        game.apply(rebel, Action::Heal { merc, item: "medical_kit".into() })
            .unwrap();

        let m = game.world().merc(merc).unwrap();
        assert_eq!(m.health(), 4);
        assert_eq!(m.actions, 1);
        assert_eq!(stash(&game), ["rifle", "land_mine"]);
        assert_eq!(game.world().discard, vec!["medical_kit".to_string()]);
    }

    #[test]
    fn carried_healing_items_are_used_first() {
        let (mut game, rebel, merc) = merc_with_pistol();
        {
            let m = game.world.merc_mut(merc).unwrap();
            m.damage = 4;
            m.loadout.accessory = Some("medical_kit".into());
        }
        let m = game.world().merc(merc).unwrap();
        assert_eq!(heal_source(game.world(), m, "medical_kit"), Some(HealSource::Loadout));
        game.apply(rebel, Action::Heal { merc, item: "medical_kit".into() })
            .unwrap();

        let m = game.world().merc(merc).unwrap();
        assert_eq!(m.health(), 3);
        assert_eq!(m.loadout.accessory, None);
        assert_eq!(stash(&game).len(), 3);
    }
}
