//! Combat choices for AI seats and for humans when combat runs
//! non-interactively.
//!
//! The combat engine calls the pure helpers here directly. [`combat_decision`]
//! wraps them into actions for an AI seat that owes an answer to a
//! suspended combat.

use tracing::trace;

use crate::board::{Action, HitAssignment, Seat, SectorId, Side, SquadKind};
use crate::combat::combatant::strength;
use crate::combat::dice::damage_per_hit;
use crate::combat::{ActiveCombat, Combatant, CombatantId, PendingDecision, RetreatDecision};
use crate::flow::coordinated::ready_squads;
use crate::game::Game;

/// Retreat once the enemy is more than twice as strong.
const RETREAT_RATIO: u32 = 2;

/// A potential recipient of hits, with how many more hits would kill it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HitTarget {
    pub id: CombatantId,
    /// `None` when this attacker cannot damage the target at all.
    pub hits_to_kill: Option<u8>,
}

/// Takes the first `max` candidates; candidates arrive in preference order.
pub fn choose_targets(candidates: &[CombatantId], max: u8) -> Vec<CombatantId> {
    candidates
        .iter()
        .take(usize::from(max.max(1)))
        .copied()
        .collect()
}

/// Describes how much each target can still absorb from this attacker,
/// accounting for hits already assigned in the same attack.
pub fn hit_targets(
    combat: &ActiveCombat,
    attacker: &Combatant,
    targets: &[CombatantId],
    already: &[HitAssignment],
) -> Vec<HitTarget> {
    targets
        .iter()
        .filter_map(|&id| combat.combatant(id))
        .map(|target| {
            let per_hit = damage_per_hit(attacker.damage_per_hit, target.armor, attacker.armor_piercing);
            let assigned: u8 = already
                .iter()
                .filter(|a| a.target == target.id)
                .fold(0u8, |acc, a| acc.saturating_add(a.hits));
            let hits_to_kill = (per_hit > 0)
                .then(|| target.health.div_ceil(per_hit).saturating_sub(assigned));
            HitTarget {
                id: target.id,
                hits_to_kill,
            }
        })
        .collect()
}

/// Places exactly `hits` hits: greedily kill targets in order, then pile
/// whatever is left on the first damageable target.
pub fn allocate_hits(pool: &[HitTarget], hits: u8) -> Vec<HitAssignment> {
    let mut out: Vec<HitAssignment> = Vec::new();
    let mut remaining = hits;
    for target in pool {
        if remaining == 0 {
            break;
        }
        let Some(need) = target.hits_to_kill.filter(|&n| n > 0) else {
            continue;
        };
        let given = need.min(remaining);
        out.push(HitAssignment {
            target: target.id,
            hits: given,
        });
        remaining -= given;
    }

    if remaining > 0 {
        let dump = pool
            .iter()
            .find(|t| t.hits_to_kill.is_some())
            .or_else(|| pool.first());
        if let Some(dump) = dump {
            match out.iter_mut().find(|a| a.target == dump.id) {
                Some(existing) => existing.hits += remaining,
                None => out.push(HitAssignment {
                    target: dump.id,
                    hits: remaining,
                }),
            }
        }
    }
    out
}

/// Retreats to the first legal sector when badly outmatched.
pub fn retreat_choice(combat: &ActiveCombat, side: Side, options: &[SectorId]) -> RetreatDecision {
    let ours = strength(combat.side(side));
    let theirs = strength(combat.side(side.opponent()));
    match options.first() {
        Some(&to) if ours.saturating_mul(RETREAT_RATIO) < theirs => {
            trace!(ours, theirs, %to, "outmatched, retreating");
            RetreatDecision::Retreat { to }
        }
        _ => RetreatDecision::Continue,
    }
}

/// Joins an open coordinated attack with the first ready squad, otherwise
/// declines.
pub fn coordinated_response(game: &Game, seat: Seat) -> Action {
    let Some(attack) = game.coordinated_attack() else {
        return Action::DeclineCoordinatedAttack;
    };
    let squads: Vec<SquadKind> = ready_squads(game.world(), seat, attack.target);
    match squads.first() {
        Some(&squad) => Action::JoinCoordinatedAttack { squad },
        None => Action::DeclineCoordinatedAttack,
    }
}

/// The answer `seat` owes the active combat, if any.
pub fn combat_decision(game: &Game, seat: Seat) -> Option<Action> {
    let combat = game.active_combat()?;
    let action = match combat.pending()? {
        PendingDecision::TargetSelection(p) if p.controller == seat => Action::CombatSelectTargets {
            targets: choose_targets(&p.valid_targets, p.max_targets),
        },
        PendingDecision::HitAllocation(p) if p.controller == seat => {
            let attacker = combat.attack.as_ref()?.attacker.clone();
            let pool = hit_targets(combat, &attacker, &p.targets, &[]);
            Action::CombatAllocateHits {
                allocation: allocate_hits(&pool, p.hits),
            }
        }
        PendingDecision::WolverineSixes(p) if p.controller == seat => {
            let attack = combat.attack.as_ref()?;
            let pool = hit_targets(combat, &attack.attacker, &p.valid_targets, &attack.assignments);
            Action::CombatAllocateWolverineSixes {
                allocation: allocate_hits(&pool, p.sixes),
            }
        }
        PendingDecision::Epinephrine(p) if p.controller == seat => {
            Action::CombatEpinephrine { use_item: true }
        }
        PendingDecision::Retreat(vote) if vote.undecided().contains(&seat) => {
            let side = game.world().side_of(seat)?;
            let options = vote.options.get(&seat)?;
            match retreat_choice(combat, side, options) {
                RetreatDecision::Continue => Action::CombatContinue,
                RetreatDecision::Retreat { to } => Action::CombatRetreat { to: Some(to) },
            }
        }
        _ => return None,
    };
    Some(action)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combat::combatant::{CombatFlags, CombatantKind, MilitiaOwner};
    use crate::combat::CombatOptions;
    use crate::board::MercId;

    fn unit(id: CombatantId, side: Side, health: u8, armor: u8) -> Combatant {
        Combatant {
            id,
            name: format!("{id}"),
            side,
            kind: CombatantKind::Merc,
            controller: Seat(0),
            initiative: 2,
            combat_power: 3,
            health,
            max_health: health,
            armor,
            target_count: 1,
            armor_piercing: false,
            hit_threshold: 4,
            damage_per_hit: 1,
            declared: 0,
            flags: CombatFlags::default(),
        }
    }

    fn militia(slot: u8) -> CombatantId {
        CombatantId::Militia {
            owner: MilitiaOwner::Dictator,
            slot,
        }
    }

    fn combat() -> ActiveCombat {
        let mut c = ActiveCombat::new(SectorId(0), Seat(0), Seat(1), CombatOptions::default());
        c.rebel_combatants = vec![unit(CombatantId::Merc(MercId(0)), Side::Rebel, 3, 0)];
        c.dictator_combatants = vec![
            unit(militia(0), Side::Dictator, 1, 0),
            unit(CombatantId::Merc(MercId(1)), Side::Dictator, 3, 1),
            unit(militia(1), Side::Dictator, 1, 0),
        ];
        c
    }

    #[test]
    fn choose_takes_preferred_prefix() {
        let ids = [militia(0), militia(1), militia(2)];
        assert_eq!(choose_targets(&ids, 2), vec![militia(0), militia(1)]);
        assert_eq!(choose_targets(&ids, 0), vec![militia(0)]);
    }

    #[test]
    fn armor_makes_targets_immune_to_weak_hits() {
        let c = combat();
        let attacker = c.rebel_combatants[0].clone();
        let pool = hit_targets(&c, &attacker, &[militia(0), CombatantId::Merc(MercId(1))], &[]);
        assert_eq!(pool[0].hits_to_kill, Some(1));
        assert_eq!(pool[1].hits_to_kill, None);
    }

    #[test]
    fn hits_kill_in_order_then_pile_up() {
        let pool = [
            HitTarget {
                id: militia(0),
                hits_to_kill: Some(1),
            },
            HitTarget {
                id: militia(1),
                hits_to_kill: Some(1),
            },
        ];
        let out = allocate_hits(&pool, 4);
        assert_eq!(
            out,
            vec![
                HitAssignment {
                    target: militia(0),
                    hits: 3
                },
                HitAssignment {
                    target: militia(1),
                    hits: 1
                },
            ]
        );
        let total: u32 = out.iter().map(|a| u32::from(a.hits)).sum();
        assert_eq!(total, 4);
    }

    #[test]
    fn undamageable_pool_still_places_every_hit() {
        let pool = [HitTarget {
            id: militia(3),
            hits_to_kill: None,
        }];
        assert_eq!(
            allocate_hits(&pool, 2),
            vec![HitAssignment {
                target: militia(3),
                hits: 2
            }]
        );
        assert!(allocate_hits(&[], 2).is_empty());
    }

    #[test]
    fn already_assigned_hits_are_discounted() {
        let c = combat();
        let attacker = c.rebel_combatants[0].clone();
        let already = [HitAssignment {
            target: militia(0),
            hits: 1,
        }];
        let pool = hit_targets(&c, &attacker, &[militia(0), militia(1)], &already);
        assert_eq!(pool[0].hits_to_kill, Some(0));
        assert_eq!(allocate_hits(&pool, 1)[0].target, militia(1));
    }

    #[test]
    fn retreat_only_when_outmatched() {
        let mut c = combat();
        assert_eq!(
            retreat_choice(&c, Side::Dictator, &[SectorId(4)]),
            RetreatDecision::Continue
        );
        c.rebel_combatants[0].health = 1;
        c.dictator_combatants[1].combat_power = 6;
        assert_eq!(
            retreat_choice(&c, Side::Rebel, &[SectorId(4), SectorId(5)]),
            RetreatDecision::Retreat { to: SectorId(4) }
        );
        assert_eq!(retreat_choice(&c, Side::Rebel, &[]), RetreatDecision::Continue);
    }
}
