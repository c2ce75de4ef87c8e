//! Per-round combatant snapshots.
//!
//! At the start of every round both sides are projected from the live world:
//! mercs with their loadout and abilities, attack dogs, the dictator figure,
//! and one entry per militia token. Snapshots are immutable values; when a
//! hit lands the entry is replaced by a copy carrying the live health.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::board::{
    Merc, MercId, Seat, SectorId, Side, Squad, Stats, World, DOG_STATS, MILITIA_STATS,
};
use crate::registry::{Catalog, SquadBonus};

use super::dice::DEFAULT_HIT_THRESHOLD;

/// Owner of a militia token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MilitiaOwner {
    Dictator,
    Rebel(Seat),
}

/// Identity of a combatant, stable within a round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CombatantId {
    Merc(MercId),
    Militia { owner: MilitiaOwner, slot: u8 },
    /// The attack dog handled by this merc.
    Dog(MercId),
    Dictator,
}

impl fmt::Display for CombatantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CombatantId::Merc(id) => write!(f, "{id}"),
            CombatantId::Militia {
                owner: MilitiaOwner::Dictator,
                slot,
            } => write!(f, "dictator militia {slot}"),
            CombatantId::Militia {
                owner: MilitiaOwner::Rebel(seat),
                slot,
            } => write!(f, "militia {slot} of {seat}"),
            CombatantId::Dog(id) => write!(f, "dog of {id}"),
            CombatantId::Dictator => f.write_str("dictator"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CombatantKind {
    Merc,
    Militia,
    AttackDog,
    DictatorFigure,
}

impl CombatantKind {
    /// Tie-break rank in initiative order: named units, then dogs, then militia.
    pub fn rank(self) -> u8 {
        match self {
            CombatantKind::Merc | CombatantKind::DictatorFigure => 0,
            CombatantKind::AttackDog => 1,
            CombatantKind::Militia => 2,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CombatFlags {
    pub always_first: bool,
    pub always_before_militia: bool,
    pub targeted_last: bool,
    pub prioritizes_mercs: bool,
    pub reroll_once: bool,
    pub preemptive_strike: bool,
    pub second_shot: bool,
    pub wolverine: bool,
    pub rolls_initiative: bool,
    pub has_epinephrine: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Combatant {
    pub id: CombatantId,
    pub name: String,
    pub side: Side,
    pub kind: CombatantKind,
    /// Seat entitled to decide for this combatant.
    pub controller: Seat,
    pub initiative: i16,
    pub combat_power: u8,
    pub health: u8,
    pub max_health: u8,
    pub armor: u8,
    pub target_count: u8,
    pub armor_piercing: bool,
    pub hit_threshold: u8,
    pub damage_per_hit: u8,
    /// Position in declaration order across both sides.
    pub declared: u16,
    pub flags: CombatFlags,
}

impl Combatant {
    pub fn is_alive(&self) -> bool {
        self.health > 0
    }

    /// Mercs and the dictator figure are the units that make choices.
    pub fn counts_as_merc(&self) -> bool {
        matches!(
            self.kind,
            CombatantKind::Merc | CombatantKind::DictatorFigure
        )
    }

    pub fn with_health(&self, health: u8) -> Combatant {
        Combatant {
            health: health.min(self.max_health),
            ..self.clone()
        }
    }

    fn plain(id: CombatantId, name: String, side: Side, kind: CombatantKind, controller: Seat, stats: Stats, health: u8) -> Self {
        Combatant {
            id,
            name,
            side,
            kind,
            controller,
            initiative: i16::from(stats.initiative),
            combat_power: stats.combat,
            health,
            max_health: stats.health,
            armor: 0,
            target_count: 1,
            armor_piercing: false,
            hit_threshold: DEFAULT_HIT_THRESHOLD,
            damage_per_hit: 1,
            declared: 0,
            flags: CombatFlags::default(),
        }
    }
}

/// Modifiers summed over a loadout.
#[derive(Debug, Default)]
struct GearTotals {
    combat: i16,
    initiative: i16,
    armor: i16,
    extra_targets: u8,
    damage_bonus: u8,
    armor_piercing: bool,
    epinephrine: bool,
}

fn gear_totals(merc: &Merc, catalog: &dyn Catalog) -> GearTotals {
    let mut totals = GearTotals::default();
    for key in merc.loadout.items() {
        let Some(profile) = catalog.equipment(key) else {
            continue;
        };
        totals.combat += i16::from(profile.combat);
        totals.initiative += i16::from(profile.initiative);
        totals.armor += i16::from(profile.armor);
        totals.extra_targets = totals.extra_targets.saturating_add(profile.extra_targets);
        totals.damage_bonus = totals.damage_bonus.max(profile.damage_bonus);
        totals.armor_piercing |= profile.armor_piercing;
        totals.epinephrine |= profile.epinephrine;
    }
    totals
}

/// Sum of bonuses granted by the other living members of the squad.
fn squad_bonus_for(world: &World, catalog: &dyn Catalog, squad: &Squad, merc: MercId) -> SquadBonus {
    world
        .living_members(squad)
        .filter(|m| m.id != merc)
        .filter_map(|m| catalog.squad_bonus(&m.key))
        .fold(SquadBonus::default(), SquadBonus::plus)
}

fn clamp_u8(value: i16) -> u8 {
    value.clamp(0, i16::from(u8::MAX)) as u8
}

#[allow(clippy::too_many_arguments)]
fn project_named(
    key: &str,
    id: CombatantId,
    name: &str,
    side: Side,
    kind: CombatantKind,
    controller: Seat,
    stats: Stats,
    health: u8,
    gear: GearTotals,
    bonus: SquadBonus,
    catalog: &dyn Catalog,
) -> Combatant {
    let mods = catalog.combat_modifiers(key);
    let ability = catalog.ability(key);
    let flag = |f: fn(&crate::registry::AbilityProfile) -> bool| ability.is_some_and(f);

    let mut c = Combatant::plain(id, name.to_string(), side, kind, controller, stats, health);
    c.initiative += gear.initiative + i16::from(mods.initiative) + i16::from(bonus.initiative);
    c.combat_power = clamp_u8(
        i16::from(stats.combat) + gear.combat + i16::from(mods.combat) + i16::from(bonus.combat),
    );
    c.armor = clamp_u8(gear.armor + i16::from(bonus.armor));
    c.target_count = 1u8
        .saturating_add(gear.extra_targets)
        .saturating_add(mods.extra_targets);
    c.armor_piercing = gear.armor_piercing || mods.armor_piercing;
    c.hit_threshold = catalog.hit_threshold(key).clamp(1, super::dice::DIE_FACES);
    c.damage_per_hit = 1u8.saturating_add(gear.damage_bonus);
    c.flags = CombatFlags {
        always_first: flag(|a| a.always_first),
        always_before_militia: flag(|a| a.always_before_militia),
        targeted_last: flag(|a| a.targeted_last),
        prioritizes_mercs: flag(|a| a.prioritizes_mercs),
        reroll_once: catalog.can_reroll_once(key),
        preemptive_strike: catalog.can_preemptive_strike(key),
        second_shot: catalog.fires_second_shot(key),
        wolverine: catalog.has_wolverine(key),
        rolls_initiative: flag(|a| a.rolls_initiative),
        has_epinephrine: gear.epinephrine,
    };
    c
}

fn project_merc(world: &World, catalog: &dyn Catalog, squad: &Squad, merc: &Merc, side: Side) -> Combatant {
    project_named(
        &merc.key,
        CombatantId::Merc(merc.id),
        &merc.name,
        side,
        CombatantKind::Merc,
        merc.owner,
        merc.base,
        merc.health(),
        gear_totals(merc, catalog),
        squad_bonus_for(world, catalog, squad, merc.id),
        catalog,
    )
}

fn project_dog(merc: &Merc, side: Side) -> Option<Combatant> {
    let dog = merc.dog.filter(|d| d.health() > 0)?;
    Some(Combatant::plain(
        CombatantId::Dog(merc.id),
        format!("{}'s dog", merc.name),
        side,
        CombatantKind::AttackDog,
        merc.owner,
        DOG_STATS,
        dog.health(),
    ))
}

fn militia(owner: MilitiaOwner, controller: Seat, count: u8, side: Side) -> impl Iterator<Item = Combatant> {
    (0..count).map(move |slot| {
        Combatant::plain(
            CombatantId::Militia { owner, slot },
            "Militia".to_string(),
            side,
            CombatantKind::Militia,
            controller,
            MILITIA_STATS,
            MILITIA_STATS.health,
        )
    })
}

/// Projects one side of the sector in declaration order.
///
/// Rebels: squads ordered by seat then squad kind with their members in
/// squad order, then the dogs of those mercs, then militia seat by seat.
/// Dictator: the figure, then squads, dogs and militia the same way.
pub fn project_side(
    world: &World,
    catalog: &dyn Catalog,
    sector: SectorId,
    side: Side,
    dictator_seat: Seat,
    first_declared: u16,
) -> Vec<Combatant> {
    let Some(s) = world.sector(sector) else {
        return Vec::new();
    };
    let mut out = Vec::new();

    if side == Side::Dictator {
        if let Some(figure) = world
            .dictator
            .as_ref()
            .filter(|d| d.alive && d.sector == Some(sector))
        {
            out.push(project_named(
                &figure.key,
                CombatantId::Dictator,
                &figure.name,
                side,
                CombatantKind::DictatorFigure,
                dictator_seat,
                figure.base,
                figure.health(),
                GearTotals::default(),
                SquadBonus::default(),
                catalog,
            ));
        }
    }

    let squads: Vec<&Squad> = world
        .squads_in(sector)
        .into_iter()
        .filter(|sq| world.side_of(sq.owner) == Some(side))
        .collect();
    let mut handlers = Vec::new();
    for squad in &squads {
        for merc in world.living_members(squad) {
            out.push(project_merc(world, catalog, squad, merc, side));
            handlers.push(merc);
        }
    }
    out.extend(handlers.into_iter().filter_map(|m| project_dog(m, side)));

    match side {
        Side::Rebel => {
            for (&seat, &count) in &s.rebel_militia {
                out.extend(militia(MilitiaOwner::Rebel(seat), seat, count, side));
            }
        }
        Side::Dictator => {
            out.extend(militia(
                MilitiaOwner::Dictator,
                dictator_seat,
                s.dictator_militia,
                side,
            ));
        }
    }

    for (i, c) in out.iter_mut().enumerate() {
        c.declared = first_declared + i as u16;
    }
    out
}

/// Projects both sides, rebels declared first.
pub fn project(world: &World, catalog: &dyn Catalog, sector: SectorId, dictator_seat: Seat) -> (Vec<Combatant>, Vec<Combatant>) {
    let rebels = project_side(world, catalog, sector, Side::Rebel, dictator_seat, 0);
    let dictator = project_side(
        world,
        catalog,
        sector,
        Side::Dictator,
        dictator_seat,
        rebels.len() as u16,
    );
    (rebels, dictator)
}

/// Rough fighting strength of a set of combatants.
pub fn strength(combatants: &[Combatant]) -> u32 {
    combatants
        .iter()
        .filter(|c| c.is_alive())
        .map(|c| {
            let hit_chance = u32::from(super::dice::DIE_FACES + 1 - c.hit_threshold);
            u32::from(c.combat_power.max(1)) * hit_chance * u32::from(c.damage_per_hit) * (u32::from(c.health) + u32::from(c.armor))
        })
        .sum()
}
