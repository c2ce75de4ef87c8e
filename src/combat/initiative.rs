//! Initiative and turn order.
//!
//! The order is total and deterministic:
//! 1. effective initiative descending (rolled d6 included),
//! 2. kind rank: mercs and the dictator figure, then dogs, then militia,
//! 3. declaration order.
//!
//! Units that always act before militia are then moved directly in front of
//! the first militia of their own side if they sorted behind it, and units
//! that always act first are hoisted to the front keeping their relative
//! order. The always-first hoist runs last so it wins over everything else.

use std::cmp::Reverse;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::combatant::{Combatant, CombatantId, CombatantKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttackKind {
    /// Extra attack before everyone else in the first round.
    Preemptive,
    Normal,
    /// Extra attack after everyone else, every round.
    SecondShot,
}

/// One entry in a round's sequence of attacks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttackSlot {
    pub attacker: CombatantId,
    pub kind: AttackKind,
}

/// Effective initiative including any rolled die.
pub fn effective_initiative(unit: &Combatant, rolls: &BTreeMap<CombatantId, u8>) -> i16 {
    unit.initiative + rolls.get(&unit.id).map_or(0, |&r| i16::from(r))
}

/// Orders every combatant of both sides for a round.
pub fn initiative_order(units: &[Combatant], rolls: &BTreeMap<CombatantId, u8>) -> Vec<CombatantId> {
    let mut order: Vec<&Combatant> = units.iter().filter(|u| u.is_alive()).collect();
    order.sort_by_key(|u| (Reverse(effective_initiative(u, rolls)), u.kind.rank(), u.declared));

    let eager: Vec<CombatantId> = order
        .iter()
        .filter(|u| u.flags.always_before_militia && !u.flags.always_first)
        .map(|u| u.id)
        .collect();
    for id in eager {
        let Some(pos) = order.iter().position(|u| u.id == id) else {
            continue;
        };
        let side = order[pos].side;
        let first_militia = order
            .iter()
            .position(|u| u.side == side && u.kind == CombatantKind::Militia);
        if let Some(m) = first_militia.filter(|&m| m < pos) {
            let unit = order.remove(pos);
            order.insert(m, unit);
        }
    }

    let (first, rest): (Vec<&Combatant>, Vec<&Combatant>) =
        order.into_iter().partition(|u| u.flags.always_first);
    first.into_iter().chain(rest).map(|u| u.id).collect()
}

/// Expands an initiative order into the attacks of one round.
pub fn turn_order(order: &[CombatantId], units: &[Combatant], round: u32) -> Vec<AttackSlot> {
    let flags = |id: &CombatantId| units.iter().find(|u| u.id == *id).map(|u| u.flags);
    let slot = |kind| move |&attacker: &CombatantId| AttackSlot { attacker, kind };

    let mut slots = Vec::with_capacity(order.len() + 2);
    if round == 1 {
        slots.extend(
            order
                .iter()
                .filter(|&id| flags(id).is_some_and(|f| f.preemptive_strike))
                .map(slot(AttackKind::Preemptive)),
        );
    }
    slots.extend(order.iter().map(slot(AttackKind::Normal)));
    slots.extend(
        order
            .iter()
            .filter(|&id| flags(id).is_some_and(|f| f.second_shot))
            .map(slot(AttackKind::SecondShot)),
    );
    slots
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{MercId, Seat, Side};
    use crate::combat::combatant::{CombatFlags, MilitiaOwner};

    fn unit(id: CombatantId, side: Side, kind: CombatantKind, initiative: i16, declared: u16) -> Combatant {
        Combatant {
            id,
            name: format!("{id}"),
            side,
            kind,
            controller: Seat(0),
            initiative,
            combat_power: 1,
            health: 1,
            max_health: 1,
            armor: 0,
            target_count: 1,
            armor_piercing: false,
            hit_threshold: 4,
            damage_per_hit: 1,
            declared,
            flags: CombatFlags::default(),
        }
    }

    fn merc(n: u16, side: Side, initiative: i16) -> Combatant {
        unit(CombatantId::Merc(MercId(n)), side, CombatantKind::Merc, initiative, n)
    }

    fn militia(slot: u8, initiative: i16, declared: u16) -> Combatant {
        unit(
            CombatantId::Militia {
                owner: MilitiaOwner::Dictator,
                slot,
            },
            Side::Dictator,
            CombatantKind::Militia,
            initiative,
            declared,
        )
    }

    #[test]
    fn higher_initiative_first_then_rank_then_declaration() {
        let units = vec![
            militia(0, 3, 10),
            merc(1, Side::Rebel, 3),
            merc(2, Side::Rebel, 5),
            merc(0, Side::Rebel, 3),
        ];
        let order = initiative_order(&units, &BTreeMap::new());
        assert_eq!(
            order,
            vec![
                CombatantId::Merc(MercId(2)),
                CombatantId::Merc(MercId(0)),
                CombatantId::Merc(MercId(1)),
                units[0].id,
            ]
        );
    }

    #[test]
    fn rolled_initiative_counts() {
        let mut slow = merc(0, Side::Rebel, 1);
        slow.flags.rolls_initiative = true;
        let units = vec![slow, merc(1, Side::Rebel, 4)];
        let rolls = BTreeMap::from([(CombatantId::Merc(MercId(0)), 6)]);
        let order = initiative_order(&units, &rolls);
        assert_eq!(order[0], CombatantId::Merc(MercId(0)));
    }

    #[test]
    fn before_militia_moves_ahead_of_own_militia_only() {
        let mut bull = merc(5, Side::Dictator, 0);
        bull.flags.always_before_militia = true;
        let units = vec![
            merc(0, Side::Rebel, 4),
            militia(0, 1, 6),
            militia(1, 1, 7),
            bull,
        ];
        let order = initiative_order(&units, &BTreeMap::new());
        assert_eq!(order[0], CombatantId::Merc(MercId(0)));
        assert_eq!(order[1], CombatantId::Merc(MercId(5)));
    }

    #[test]
    fn always_first_beats_before_militia_and_initiative() {
        let mut shadow = merc(3, Side::Rebel, 0);
        shadow.flags.always_first = true;
        let mut bull = merc(4, Side::Dictator, 0);
        bull.flags.always_before_militia = true;
        let units = vec![merc(0, Side::Rebel, 9), militia(0, 2, 5), bull, shadow];
        let order = initiative_order(&units, &BTreeMap::new());
        assert_eq!(
            order,
            vec![
                CombatantId::Merc(MercId(3)),
                CombatantId::Merc(MercId(0)),
                CombatantId::Merc(MercId(4)),
                units[1].id,
            ]
        );
    }

    #[test]
    fn dead_units_are_skipped() {
        let mut dead = merc(0, Side::Rebel, 9);
        dead.health = 0;
        let units = vec![dead, merc(1, Side::Rebel, 1)];
        assert_eq!(
            initiative_order(&units, &BTreeMap::new()),
            vec![CombatantId::Merc(MercId(1))]
        );
    }

    #[test]
    fn extra_attacks_bracket_the_round() {
        let mut hawk = merc(0, Side::Rebel, 1);
        hawk.flags.preemptive_strike = true;
        let mut gunner = merc(1, Side::Rebel, 2);
        gunner.flags.second_shot = true;
        let units = vec![hawk, gunner];
        let order = initiative_order(&units, &BTreeMap::new());

        let first = turn_order(&order, &units, 1);
        assert_eq!(first.len(), 4);
        assert_eq!(first[0].kind, AttackKind::Preemptive);
        assert_eq!(first[0].attacker, CombatantId::Merc(MercId(0)));
        assert_eq!(first[3].kind, AttackKind::SecondShot);
        assert_eq!(first[3].attacker, CombatantId::Merc(MercId(1)));

        let later = turn_order(&order, &units, 2);
        assert_eq!(later.len(), 3);
        assert!(later.iter().all(|s| s.kind != AttackKind::Preemptive));
    }
}
