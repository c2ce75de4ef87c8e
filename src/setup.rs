//! Dealing games.
//!
//! [`ScenarioBuilder`] assembles a hand-made position on a rectangular
//! grid, which is what tests and benches use. [`standard_game`] deals a
//! full game from a [`GameConfig`] with the standard catalog.

use std::sync::Arc;

use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info};

use crate::board::{
    Controller, DictatorFigure, Dog, Loadout, Merc, MercId, Player, Role, Seat, Sector, SectorId, Squad,
    SquadKind, Stats, World, ACTIONS_PER_DAY,
};
use crate::config::{GameConfig, PlayerConfig};
use crate::error::SetupError;
use crate::game::Game;
use crate::registry::{standard_deck, Catalog, MercTemplate, Registry, Slot, DICTATOR_ROSTER, MERC_ROSTER};

/// Mercs the dictator hires at the start of a standard game.
pub const DICTATOR_HIRES: usize = 1;

/// Keeps the dealing stream apart from the game's combat stream.
const SETUP_SALT: u64 = 0x5e7u64 << 48;

/// Builds a position piece by piece.
///
/// Sectors are numbered row by row, `A1` being id 0; neighbours share an
/// edge. Combat is not started for sectors that begin contested; call
/// [`Game::execute_combat`] for those.
#[derive(Debug)]
pub struct ScenarioBuilder {
    world: World,
    catalog: Arc<dyn Catalog>,
    config: GameConfig,
}

impl ScenarioBuilder {
    pub fn new(width: u16, height: u16) -> Result<Self, SetupError> {
        if width < 2 || height < 2 {
            return Err(SetupError::MapTooSmall { width, height });
        }
        let mut world = World::new();
        for row in 0..height {
            for col in 0..width {
                let id = SectorId(row * width + col);
                let name = format!("{}{}", char::from(b'A' + (col % 26) as u8), row + 1);
                let mut sector = Sector::new(id, name);
                if col > 0 {
                    sector.adjacent.push(SectorId(id.0 - 1));
                }
                if col + 1 < width {
                    sector.adjacent.push(SectorId(id.0 + 1));
                }
                if row > 0 {
                    sector.adjacent.push(SectorId(id.0 - width));
                }
                if row + 1 < height {
                    sector.adjacent.push(SectorId(id.0 + width));
                }
                world.sectors.push(sector);
            }
        }
        Ok(ScenarioBuilder {
            world,
            catalog: Arc::new(Registry::standard()),
            config: GameConfig {
                players: Vec::new(),
                map_width: width,
                map_height: height,
                ..GameConfig::default()
            },
        })
    }

    pub fn seed(&mut self, seed: u64) -> &mut Self {
        self.config.seed = seed;
        self
    }

    pub fn interactive(&mut self, interactive: bool) -> &mut Self {
        self.config.interactive_combat = interactive;
        self
    }

    pub fn max_days(&mut self, days: u32) -> &mut Self {
        self.config.max_days = days;
        self
    }

    pub fn catalog(&mut self, catalog: Arc<dyn Catalog>) -> &mut Self {
        self.catalog = catalog;
        self
    }

    /// Replaces the equipment deck; the last item is drawn first.
    pub fn deck(&mut self, deck: Vec<String>) -> &mut Self {
        self.world.deck = deck;
        self
    }

    fn sector_mut(&mut self, id: SectorId) -> Result<&mut Sector, SetupError> {
        self.world.sector_mut(id).ok_or(SetupError::UnknownSector(id))
    }

    fn check_seat(&self, seat: Seat) -> Result<(), SetupError> {
        self.world
            .player(seat)
            .map(|_| ())
            .ok_or(SetupError::UnknownSeat(seat))
    }

    pub fn add_player(&mut self, name: impl Into<String>, role: Role, controller: Controller) -> Seat {
        let seat = Seat(self.world.players.len() as u8);
        let name = name.into();
        self.config
            .players
            .push(PlayerConfig::new(name.clone(), role, controller));
        self.world.players.push(Player {
            seat,
            name,
            role,
            controller,
        });
        seat
    }

    /// Adds a merc to a seat's squad. A new squad is placed in `sector`; an
    /// existing one keeps its position.
    pub fn add_merc(
        &mut self,
        seat: Seat,
        squad: SquadKind,
        sector: SectorId,
        key: &str,
        name: &str,
        stats: Stats,
    ) -> Result<MercId, SetupError> {
        self.check_seat(seat)?;
        self.sector_mut(sector)?;
        let id = MercId(self.world.mercs.len() as u16);
        self.world.mercs.push(Merc {
            id,
            key: key.to_string(),
            name: name.to_string(),
            owner: seat,
            base: stats,
            damage: 0,
            loadout: Loadout::default(),
            actions: ACTIONS_PER_DAY,
            dog: None,
            alive: true,
        });
        match self.world.squad_mut(seat, squad) {
            Some(existing) => existing.members.push(id),
            None => self.world.squads.push(Squad {
                owner: seat,
                kind: squad,
                sector: Some(sector),
                members: vec![id],
            }),
        }
        Ok(id)
    }

    pub fn hire(&mut self, seat: Seat, squad: SquadKind, sector: SectorId, template: &MercTemplate) -> Result<MercId, SetupError> {
        self.add_merc(seat, squad, sector, template.key, template.name, template.stats)
    }

    /// Puts an item straight into a merc's slot; an attack dog item brings
    /// its dog.
    pub fn equip(&mut self, merc: MercId, item: &str) -> Result<(), SetupError> {
        let slot = self.catalog.slot_of(item).unwrap_or(Slot::Accessory);
        let dog = self.catalog.equipment(item).is_some_and(|p| p.attack_dog);
        let m = self
            .world
            .merc_mut(merc)
            .ok_or(SetupError::UnknownMerc(merc))?;
        if let Some(old) = m.loadout.replace(slot, Some(item.to_string())) {
            self.world.discard.push(old);
        }
        if dog {
            if let Some(m) = self.world.merc_mut(merc) {
                m.dog = Some(Dog::default());
            }
        }
        Ok(())
    }

    pub fn wound(&mut self, merc: MercId, damage: u8) -> Result<(), SetupError> {
        let m = self
            .world
            .merc_mut(merc)
            .ok_or(SetupError::UnknownMerc(merc))?;
        m.damage = damage.min(m.max_health().saturating_sub(1));
        Ok(())
    }

    pub fn dictator_militia(&mut self, sector: SectorId, count: u8) -> Result<(), SetupError> {
        self.sector_mut(sector)?.add_dictator_militia(count);
        Ok(())
    }

    pub fn rebel_militia(&mut self, sector: SectorId, seat: Seat, count: u8) -> Result<(), SetupError> {
        self.check_seat(seat)?;
        self.sector_mut(sector)?.add_rebel_militia(seat, count);
        Ok(())
    }

    pub fn dictator_figure(&mut self, template: &MercTemplate, sector: SectorId) -> Result<(), SetupError> {
        self.sector_mut(sector)?;
        self.world.dictator = Some(DictatorFigure {
            key: template.key.to_string(),
            name: template.name.to_string(),
            base: template.stats,
            damage: 0,
            sector: Some(sector),
            alive: true,
        });
        Ok(())
    }

    pub fn explore(&mut self, sector: SectorId) -> Result<(), SetupError> {
        self.sector_mut(sector)?.explored = true;
        Ok(())
    }

    pub fn stash(&mut self, sector: SectorId, item: &str) -> Result<(), SetupError> {
        self.sector_mut(sector)?.stash.push(item.to_string());
        Ok(())
    }

    /// Checks the seating and hands the position to a new game.
    pub fn build(self) -> Result<Game, SetupError> {
        let dictators = self
            .world
            .players
            .iter()
            .filter(|p| p.role == Role::Dictator)
            .count();
        if dictators != 1 {
            return Err(SetupError::DictatorCount(dictators));
        }
        if self.world.rebel_seats().is_empty() {
            return Err(SetupError::NoRebels);
        }
        let rng = ChaCha8Rng::seed_from_u64(self.config.seed);
        debug!(
            seed = self.config.seed,
            sectors = self.world.sectors.len(),
            mercs = self.world.mercs.len(),
            "scenario built"
        );
        Ok(Game::new(self.world, rng, self.catalog, self.config))
    }
}

/// Deals a standard game: rebels start down the left edge, the dictator
/// holds the far corner with a garrison, and militia dot the far half.
pub fn standard_game(config: &GameConfig) -> Result<Game, SetupError> {
    let dictators = config
        .players
        .iter()
        .filter(|p| p.role == Role::Dictator)
        .count();
    if dictators != 1 {
        return Err(SetupError::DictatorCount(dictators));
    }
    let rebels = config.players.len() - dictators;
    if rebels == 0 {
        return Err(SetupError::NoRebels);
    }
    let needed = rebels * config.mercs_per_rebel + DICTATOR_HIRES;
    if needed > MERC_ROSTER.len() {
        return Err(SetupError::NotEnoughMercs {
            needed,
            available: MERC_ROSTER.len(),
        });
    }

    let mut rng = ChaCha8Rng::seed_from_u64(config.seed ^ SETUP_SALT);
    let (width, height) = (config.map_width, config.map_height);
    let mut b = ScenarioBuilder::new(width, height)?;
    b.config = GameConfig {
        players: Vec::new(),
        ..config.clone()
    };

    let mut roster: Vec<&MercTemplate> = MERC_ROSTER.iter().collect();
    roster.shuffle(&mut rng);
    let mut roster = roster.into_iter();
    let mut deck = standard_deck();
    deck.shuffle(&mut rng);
    b.deck(deck);

    let palace = SectorId(width * height - 1);
    let mut rebel_row = 0u16;
    for player in &config.players {
        let seat = b.add_player(player.name.clone(), player.role, player.controller);
        match player.role {
            Role::Rebel => {
                let start = SectorId((rebel_row % height) * width);
                rebel_row += 1;
                for template in roster.by_ref().take(config.mercs_per_rebel) {
                    b.hire(seat, SquadKind::Primary, start, template)?;
                }
            }
            Role::Dictator => {
                let figure = DICTATOR_ROSTER[rng.gen_range(0..DICTATOR_ROSTER.len())];
                b.dictator_figure(&figure, palace)?;
                for template in roster.by_ref().take(DICTATOR_HIRES) {
                    b.hire(seat, SquadKind::Primary, palace, template)?;
                }
                b.dictator_militia(palace, config.starting_dictator_militia)?;
            }
        }
    }

    for row in 0..height {
        for col in (width / 2).max(1)..width {
            let sector = SectorId(row * width + col);
            if sector != palace {
                let militia = rng.gen_range(0..=2);
                b.dictator_militia(sector, militia)?;
            }
        }
    }

    info!(seed = config.seed, rebels, width, height, "standard game dealt");
    b.build()
}
