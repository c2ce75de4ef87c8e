//! Resolvers for pending combat decisions.
//!
//! Each resolver checks that the right decision is pending, that the seat is
//! entitled to answer and that the answer is legal, and only then records
//! it. A rejected answer leaves the combat untouched. After a resolver
//! clears the pending decision the caller re-enters the round loop.

use std::collections::BTreeSet;

use crate::board::{HitAssignment, Seat, SectorId};
use crate::error::ActionError;

use super::active::{ActiveCombat, AttackStage, PendingDecision, PendingKind, RetreatDecision};
use super::combatant::CombatantId;

fn wrong_decision(expected: PendingKind) -> ActionError {
    ActionError::NoPendingDecision(expected)
}

fn validate_allocation(allocation: &[HitAssignment], expected: u8, valid: &[CombatantId]) -> Result<(), ActionError> {
    if let Some(bad) = allocation.iter().find(|a| !valid.contains(&a.target)) {
        return Err(ActionError::IllegalTarget(bad.target));
    }
    let got: u32 = allocation.iter().map(|a| u32::from(a.hits)).sum();
    if got != u32::from(expected) {
        return Err(ActionError::HitCountMismatch { expected, got });
    }
    Ok(())
}

fn attack_in_progress(combat: &mut ActiveCombat) -> &mut super::active::AttackInProgress {
    match combat.attack.as_mut() {
        Some(attack) => attack,
        None => panic!("attack decision pending with no attack in progress"),
    }
}

/// Records the targets chosen for the pending attacker.
pub fn select_targets(combat: &mut ActiveCombat, seat: Seat, targets: &[CombatantId]) -> Result<(), ActionError> {
    let Some(PendingDecision::TargetSelection(pending)) = &combat.pending else {
        return Err(wrong_decision(PendingKind::TargetSelection));
    };
    if pending.controller != seat {
        return Err(ActionError::NotEntitled(seat));
    }
    if targets.is_empty() {
        return Err(ActionError::EmptySelection);
    }
    if targets.len() > usize::from(pending.max_targets) {
        return Err(ActionError::TooManyTargets {
            max: pending.max_targets,
            got: targets.len(),
        });
    }
    let mut seen = BTreeSet::new();
    for &target in targets {
        if !pending.valid_targets.contains(&target) {
            return Err(ActionError::IllegalTarget(target));
        }
        if !seen.insert(target) {
            return Err(ActionError::DuplicateTarget(target));
        }
    }

    let attacker = pending.attacker;
    combat.selected_targets.insert(attacker, targets.to_vec());
    combat.pending = None;
    Ok(())
}

/// Records how the pending attacker's hits are spread.
pub fn allocate_hits(combat: &mut ActiveCombat, seat: Seat, allocation: &[HitAssignment]) -> Result<(), ActionError> {
    let Some(PendingDecision::HitAllocation(pending)) = &combat.pending else {
        return Err(wrong_decision(PendingKind::HitAllocation));
    };
    if pending.controller != seat {
        return Err(ActionError::NotEntitled(seat));
    }
    validate_allocation(allocation, pending.hits, &pending.targets)?;

    let attack = attack_in_progress(combat);
    attack
        .assignments
        .extend(allocation.iter().copied().filter(|a| a.hits > 0));
    attack.stage = AttackStage::Wolverine;
    combat.pending = None;
    Ok(())
}

/// Records where the pending attacker's sixes go.
pub fn allocate_wolverine_sixes(combat: &mut ActiveCombat, seat: Seat, allocation: &[HitAssignment]) -> Result<(), ActionError> {
    let Some(PendingDecision::WolverineSixes(pending)) = &combat.pending else {
        return Err(wrong_decision(PendingKind::WolverineSixes));
    };
    if pending.controller != seat {
        return Err(ActionError::NotEntitled(seat));
    }
    validate_allocation(allocation, pending.sixes, &pending.valid_targets)?;

    let attack = attack_in_progress(combat);
    attack
        .assignments
        .extend(allocation.iter().copied().filter(|a| a.hits > 0));
    attack.stage = AttackStage::Apply {
        next: 0,
        save: None,
    };
    combat.pending = None;
    Ok(())
}

/// Records whether the dying merc uses its epinephrine.
pub fn resolve_epinephrine(combat: &mut ActiveCombat, seat: Seat, use_item: bool) -> Result<(), ActionError> {
    let Some(PendingDecision::Epinephrine(pending)) = &combat.pending else {
        return Err(wrong_decision(PendingKind::Epinephrine));
    };
    if pending.controller != seat {
        return Err(ActionError::NotEntitled(seat));
    }

    let attack = attack_in_progress(combat);
    let AttackStage::Apply { next, .. } = attack.stage else {
        panic!("epinephrine pending outside damage application");
    };
    attack.stage = AttackStage::Apply {
        next,
        save: Some(use_item),
    };
    combat.pending = None;
    Ok(())
}

/// Records one seat's round-end choice. `to: None` on a retreat picks the
/// first legal sector. The vote stays pending until every required seat has
/// answered.
pub fn decide_retreat(combat: &mut ActiveCombat, seat: Seat, retreat: Option<Option<SectorId>>) -> Result<(), ActionError> {
    let Some(PendingDecision::Retreat(vote)) = &mut combat.pending else {
        return Err(wrong_decision(PendingKind::Retreat));
    };
    if !vote.required.contains(&seat) {
        return Err(ActionError::NotEntitled(seat));
    }
    if vote.decisions.contains_key(&seat) {
        return Err(ActionError::AlreadyDecided(seat));
    }

    let decision = match retreat {
        None => RetreatDecision::Continue,
        Some(to) => {
            let options = vote.options.get(&seat).map(Vec::as_slice).unwrap_or_default();
            let to = match to {
                Some(to) if options.contains(&to) => to,
                Some(to) => return Err(ActionError::IllegalRetreat(to)),
                None => *options.first().ok_or(ActionError::NoRetreatRoute(seat))?,
            };
            RetreatDecision::Retreat { to }
        }
    };
    vote.decisions.insert(seat, decision);

    if vote.is_complete() {
        if let Some(PendingDecision::Retreat(vote)) = combat.pending.take() {
            combat.settled_vote = Some(vote);
        }
    }
    Ok(())
}
