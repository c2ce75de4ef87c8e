//! Live world state.
//!
//! Holds every sector, player, merc, and squad plus the equipment deck. The
//! combat engine projects its per-round snapshots from this structure and
//! writes damage back into it.

use super::ids::{MercId, Seat, SectorId};
use super::player::{Player, Role};
use super::sector::Sector;
use super::unit::{DictatorFigure, Merc, Side, Squad, SquadKind, ACTIONS_PER_DAY};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct World {
    pub day: u32,
    pub sectors: Vec<Sector>,
    pub players: Vec<Player>,
    pub mercs: Vec<Merc>,
    pub squads: Vec<Squad>,
    pub dictator: Option<DictatorFigure>,
    /// Undrawn equipment; the top of the deck is the end of the vector.
    pub deck: Vec<String>,
    pub discard: Vec<String>,
}

impl World {
    /// Creates an empty world on day 1.
    pub fn new() -> Self {
        World {
            day: 1,
            sectors: Vec::new(),
            players: Vec::new(),
            mercs: Vec::new(),
            squads: Vec::new(),
            dictator: None,
            deck: Vec::new(),
            discard: Vec::new(),
        }
    }

    pub fn sector(&self, id: SectorId) -> Option<&Sector> {
        self.sectors.get(id.index())
    }

    pub fn sector_mut(&mut self, id: SectorId) -> Option<&mut Sector> {
        self.sectors.get_mut(id.index())
    }

    pub fn player(&self, seat: Seat) -> Option<&Player> {
        self.players.get(seat.index())
    }

    pub fn merc(&self, id: MercId) -> Option<&Merc> {
        self.mercs.get(id.index())
    }

    pub fn merc_mut(&mut self, id: MercId) -> Option<&mut Merc> {
        self.mercs.get_mut(id.index())
    }

    /// Neighbours of a sector; empty for an unknown id.
    pub fn adjacent(&self, id: SectorId) -> &[SectorId] {
        match self.sector(id) {
            Some(sector) => &sector.adjacent,
            None => &[],
        }
    }

    pub fn is_adjacent(&self, from: SectorId, to: SectorId) -> bool {
        self.adjacent(from).contains(&to)
    }

    pub fn side_of(&self, seat: Seat) -> Option<Side> {
        self.player(seat).map(Player::side)
    }

    pub fn is_human(&self, seat: Seat) -> bool {
        self.player(seat).is_some_and(|p| !p.is_ai())
    }

    pub fn dictator_seat(&self) -> Option<Seat> {
        self.players
            .iter()
            .find(|p| p.role == Role::Dictator)
            .map(|p| p.seat)
    }

    pub fn rebel_seats(&self) -> Vec<Seat> {
        self.players
            .iter()
            .filter(|p| p.role == Role::Rebel)
            .map(|p| p.seat)
            .collect()
    }

    pub fn squad(&self, owner: Seat, kind: SquadKind) -> Option<&Squad> {
        self.squads
            .iter()
            .find(|s| s.owner == owner && s.kind == kind)
    }

    pub fn squad_mut(&mut self, owner: Seat, kind: SquadKind) -> Option<&mut Squad> {
        self.squads
            .iter_mut()
            .find(|s| s.owner == owner && s.kind == kind)
    }

    /// The squad a merc currently belongs to.
    pub fn squad_of(&self, merc: MercId) -> Option<&Squad> {
        self.squads.iter().find(|s| s.members.contains(&merc))
    }

    pub fn merc_sector(&self, merc: MercId) -> Option<SectorId> {
        self.squad_of(merc).and_then(|s| s.sector)
    }

    /// Squads standing in a sector, ordered by owner seat then squad kind.
    pub fn squads_in(&self, sector: SectorId) -> Vec<&Squad> {
        let mut squads: Vec<&Squad> = self
            .squads
            .iter()
            .filter(|s| s.sector == Some(sector))
            .collect();
        squads.sort_by_key(|s| (s.owner, s.kind));
        squads
    }

    pub fn living_members<'a>(&'a self, squad: &'a Squad) -> impl Iterator<Item = &'a Merc> + 'a {
        squad
            .members
            .iter()
            .filter_map(move |id| self.merc(*id))
            .filter(|m| m.alive)
    }

    pub fn living_mercs_of(&self, seat: Seat) -> impl Iterator<Item = &Merc> + '_ {
        self.mercs
            .iter()
            .filter(move |m| m.alive && m.owner == seat)
    }

    pub fn has_living_mercs(&self, seat: Seat) -> bool {
        self.living_mercs_of(seat).next().is_some()
    }

    pub fn living_rebel_mercs(&self) -> usize {
        self.mercs
            .iter()
            .filter(|m| m.alive && self.side_of(m.owner) == Some(Side::Rebel))
            .count()
    }

    /// Returns true if `side` has anything able to fight in the sector.
    pub fn has_forces(&self, sector: SectorId, side: Side) -> bool {
        let Some(s) = self.sector(sector) else {
            return false;
        };
        let militia = match side {
            Side::Rebel => s.total_rebel_militia() > 0,
            Side::Dictator => s.dictator_militia > 0,
        };
        if militia {
            return true;
        }
        if side == Side::Dictator
            && self
                .dictator
                .as_ref()
                .is_some_and(|d| d.alive && d.sector == Some(sector))
        {
            return true;
        }
        self.squads_in(sector).into_iter().any(|squad| {
            self.side_of(squad.owner) == Some(side) && self.living_members(squad).next().is_some()
        })
    }

    /// Both sides have forces in the sector.
    pub fn is_contested(&self, sector: SectorId) -> bool {
        self.has_forces(sector, Side::Rebel) && self.has_forces(sector, Side::Dictator)
    }

    /// Moves a squad; the caller is responsible for legality.
    pub fn move_squad(&mut self, owner: Seat, kind: SquadKind, to: SectorId) {
        if let Some(squad) = self.squad_mut(owner, kind) {
            squad.sector = Some(to);
        }
    }

    /// Marks a merc dead, removes it from its squad, and drops its gear into
    /// the sector it died in.
    pub fn kill_merc(&mut self, id: MercId) {
        let sector = self.merc_sector(id);
        let Some(merc) = self.mercs.get_mut(id.index()) else {
            return;
        };
        merc.alive = false;
        merc.damage = merc.base.health;
        merc.actions = 0;
        merc.dog = None;
        let gear = merc.loadout.take_all();

        for squad in &mut self.squads {
            squad.members.retain(|m| *m != id);
        }
        match sector.and_then(|s| self.sectors.get_mut(s.index())) {
            Some(sector) => sector.stash.extend(gear),
            None => self.discard.extend(gear),
        }
    }

    /// Draws up to `count` items from the top of the deck.
    pub fn draw_equipment(&mut self, count: usize) -> Vec<String> {
        let take = count.min(self.deck.len());
        let at = self.deck.len() - take;
        let mut drawn = self.deck.split_off(at);
        drawn.reverse();
        drawn
    }

    /// Refreshes the daily action budget of every living merc.
    pub fn refresh_actions(&mut self) {
        for merc in self.mercs.iter_mut().filter(|m| m.alive) {
            merc.actions = ACTIONS_PER_DAY;
        }
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::player::Controller;
    use crate::board::unit::{Loadout, Stats};

    fn world() -> World {
        let mut w = World::new();
        for i in 0..2u16 {
            w.sectors.push(Sector::new(SectorId(i), format!("S{i}")));
        }
        w.sectors[0].adjacent.push(SectorId(1));
        w.sectors[1].adjacent.push(SectorId(0));
        w.players.push(Player {
            seat: Seat(0),
            name: "Rebel".into(),
            role: Role::Rebel,
            controller: Controller::Human,
        });
        w.players.push(Player {
            seat: Seat(1),
            name: "Dictator".into(),
            role: Role::Dictator,
            controller: Controller::Ai,
        });
        w.mercs.push(Merc {
            id: MercId(0),
            key: "basic".into(),
            name: "Basic".into(),
            owner: Seat(0),
            base: Stats {
                initiative: 2,
                combat: 2,
                health: 3,
            },
            damage: 0,
            loadout: Loadout {
                weapon: Some("rifle".into()),
                ..Loadout::default()
            },
            actions: 2,
            dog: None,
            alive: true,
        });
        w.squads.push(Squad {
            owner: Seat(0),
            kind: SquadKind::Primary,
            sector: Some(SectorId(0)),
            members: vec![MercId(0)],
        });
        w
    }

    #[test]
    fn seats_by_role() {
        let w = world();
        assert_eq!(w.rebel_seats(), vec![Seat(0)]);
        assert_eq!(w.dictator_seat(), Some(Seat(1)));
        assert!(w.is_human(Seat(0)));
        assert!(!w.is_human(Seat(1)));
    }

    #[test]
    fn forces_and_contest() {
        let mut w = world();
        assert!(w.has_forces(SectorId(0), Side::Rebel));
        assert!(!w.is_contested(SectorId(0)));
        w.sectors[0].dictator_militia = 2;
        assert!(w.is_contested(SectorId(0)));
    }

    #[test]
    fn kill_merc_drops_gear_and_leaves_squad() {
        let mut w = world();
        w.kill_merc(MercId(0));
        assert!(!w.mercs[0].alive);
        assert!(w.squads[0].members.is_empty());
        assert_eq!(w.sectors[0].stash, vec!["rifle".to_string()]);
        assert!(!w.has_forces(SectorId(0), Side::Rebel));
    }

    #[test]
    fn draw_more_than_deck_returns_what_is_left() {
        let mut w = world();
        w.deck = vec!["a".into(), "b".into()];
        assert_eq!(w.draw_equipment(5), vec!["b".to_string(), "a".to_string()]);
        assert!(w.deck.is_empty());
        assert!(w.draw_equipment(1).is_empty());
    }

    #[test]
    fn refresh_skips_the_dead() {
        let mut w = world();
        w.mercs[0].actions = 0;
        w.refresh_actions();
        assert_eq!(w.mercs[0].actions, ACTIONS_PER_DAY);
        w.kill_merc(MercId(0));
        w.refresh_actions();
        assert_eq!(w.mercs[0].actions, 0);
    }
}
