//! The combat round loop.
//!
//! [`advance`] runs rounds until the combat either needs a player's answer or
//! concludes. It is re-entrant: every piece of progress lives in
//! [`ActiveCombat`], so calling it again after a decision was recorded picks
//! up at the exact stage that suspended.
//!
//! Random draws happen in a fixed order: initiative rolls at round start,
//! then for each attack its hit roll followed by any reroll.

use std::collections::{BTreeMap, BTreeSet};

use rand_chacha::ChaCha8Rng;
use tracing::{debug, info};

use crate::ai;
use crate::board::{HitAssignment, MercId, Seat, World};
use crate::registry::Catalog;

use super::active::{
    ActiveCombat, AttackInProgress, AttackStage, Conclusion, EpinephrineSave, HitAllocation,
    PendingDecision, RetreatDecision, RetreatVote, RoundPhase, TargetSelection, WolverineSixes,
    MAX_COMBAT_ROUNDS,
};
use super::combatant::{project, Combatant, CombatantId, CombatantKind, MilitiaOwner};
use super::dice::{count_hits, damage_per_hit, reroll_misses, roll_dice, roll_die, split_wolverine_sixes};
use super::events::{AnimationEvent, PanelEntry, PanelSnapshot};
use super::initiative::{initiative_order, turn_order};

/// Mutable game state the engine works on.
pub struct CombatContext<'a> {
    pub world: &'a mut World,
    pub rng: &'a mut ChaCha8Rng,
    pub catalog: &'a dyn Catalog,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Progress {
    Suspended,
    Concluded,
}

enum Step {
    Continue,
    Suspend(PendingDecision),
    Conclude(Conclusion),
}

enum StageResult {
    Next,
    Suspend(PendingDecision),
    Done,
}

/// Runs the combat until it suspends or concludes.
///
/// # Panics
///
/// Panics if a decision is still pending or the combat already concluded.
pub fn advance(combat: &mut ActiveCombat, ctx: &mut CombatContext<'_>) -> Progress {
    if let Some(pending) = &combat.pending {
        panic!("combat resumed while a {} decision is unresolved", pending.kind());
    }
    assert!(combat.conclusion.is_none(), "combat advanced after it concluded");

    loop {
        let step = match combat.phase {
            RoundPhase::Start => start_round(combat, ctx),
            RoundPhase::Attacks => run_attacks(combat, ctx),
            RoundPhase::End => end_round(combat, ctx),
        };
        match step {
            Step::Continue => {}
            Step::Suspend(decision) => {
                debug!(sector = %combat.sector, round = combat.round, kind = %decision.kind(), "combat suspended");
                combat.pending = Some(decision);
                push_panel(combat, false);
                return Progress::Suspended;
            }
            Step::Conclude(conclusion) => {
                conclude(combat, conclusion);
                return Progress::Concluded;
            }
        }
    }
}

/// Living enemies the attacker may aim at, in preference order.
///
/// Units targeted last are only candidates once nothing else is left.
pub fn target_candidates(combat: &ActiveCombat, attacker: &Combatant) -> Vec<CombatantId> {
    let enemies = combat.side(attacker.side.opponent());
    let mut pool: Vec<&Combatant> = enemies
        .iter()
        .filter(|c| c.is_alive() && !c.flags.targeted_last)
        .collect();
    if pool.is_empty() {
        pool = enemies.iter().filter(|c| c.is_alive()).collect();
    }
    if attacker.flags.prioritizes_mercs {
        pool.sort_by_key(|c| (!c.counts_as_merc(), c.declared));
    } else {
        pool.sort_by_key(|c| c.declared);
    }
    pool.into_iter().map(|c| c.id).collect()
}

fn decides_interactively(combat: &ActiveCombat, world: &World, seat: Seat) -> bool {
    combat.interactive && world.is_human(seat)
}

fn wipe_conclusion(combat: &ActiveCombat) -> Option<Conclusion> {
    match (
        combat.rebel_combatants.is_empty(),
        combat.dictator_combatants.is_empty(),
    ) {
        (true, true) => Some(Conclusion::Draw),
        (true, false) => Some(Conclusion::DictatorVictory),
        (false, true) => Some(Conclusion::RebelVictory),
        (false, false) => None,
    }
}

/// Gives fresh militia snapshots slot numbers no casualty of this combat uses.
fn renumber_militia(side: &mut [Combatant], casualties: &[Combatant]) {
    let mut next: BTreeMap<MilitiaOwner, u8> = BTreeMap::new();
    for c in casualties {
        if let CombatantId::Militia { owner, slot } = c.id {
            let n = next.entry(owner).or_insert(0);
            *n = (*n).max(slot.saturating_add(1));
        }
    }
    for c in side.iter_mut() {
        if let CombatantId::Militia { owner, .. } = c.id {
            let n = next.entry(owner).or_insert(0);
            c.id = CombatantId::Militia { owner, slot: *n };
            *n = n.saturating_add(1);
        }
    }
}

fn start_round(combat: &mut ActiveCombat, ctx: &mut CombatContext<'_>) -> Step {
    let (mut rebels, mut dictator) = project(ctx.world, ctx.catalog, combat.sector, combat.dictator_seat);
    renumber_militia(&mut rebels, &combat.rebel_casualties);
    renumber_militia(&mut dictator, &combat.dictator_casualties);
    combat.rebel_combatants = rebels;
    combat.dictator_combatants = dictator;
    if let Some(conclusion) = wipe_conclusion(combat) {
        return Step::Conclude(conclusion);
    }

    combat.round += 1;
    combat.selected_targets.clear();

    let everyone: Vec<Combatant> = combat
        .rebel_combatants
        .iter()
        .chain(&combat.dictator_combatants)
        .cloned()
        .collect();
    let mut rolls = BTreeMap::new();
    for unit in everyone.iter().filter(|u| u.flags.rolls_initiative) {
        rolls.insert(unit.id, roll_die(ctx.rng));
    }
    let order = initiative_order(&everyone, &rolls);
    combat.order = turn_order(&order, &everyone, combat.round);
    combat.cursor = 0;
    combat.attack = None;

    debug!(sector = %combat.sector, round = combat.round, attacks = combat.order.len(), "round start");
    combat.animation_events.push(AnimationEvent::RoundStart {
        sector: combat.sector,
        round: combat.round,
    });
    push_panel(combat, false);
    combat.phase = RoundPhase::Attacks;
    Step::Continue
}

fn run_attacks(combat: &mut ActiveCombat, ctx: &mut CombatContext<'_>) -> Step {
    loop {
        if combat.attack.is_none() {
            if combat.rebel_combatants.is_empty() || combat.dictator_combatants.is_empty() {
                break;
            }
            let Some(&slot) = combat.order.get(combat.cursor) else {
                break;
            };
            combat.cursor += 1;
            // Attackers killed earlier in the round lose their slot.
            let Some(attacker) = combat.combatant(slot.attacker).cloned() else {
                continue;
            };
            combat.attack = Some(AttackInProgress::new(slot, attacker));
        }

        let Some(mut attack) = combat.attack.take() else {
            continue;
        };
        match step_attack(combat, ctx, &mut attack) {
            StageResult::Next => combat.attack = Some(attack),
            StageResult::Suspend(decision) => {
                combat.attack = Some(attack);
                return Step::Suspend(decision);
            }
            StageResult::Done => {}
        }
    }
    combat.phase = RoundPhase::End;
    Step::Continue
}

fn step_attack(combat: &mut ActiveCombat, ctx: &mut CombatContext<'_>, attack: &mut AttackInProgress) -> StageResult {
    match attack.stage {
        AttackStage::Target => choose_targets(combat, ctx, attack),
        AttackStage::Roll => roll_attack(combat, ctx, attack),
        AttackStage::Allocate => allocate(combat, ctx, attack),
        AttackStage::Wolverine => place_sixes(combat, ctx, attack),
        AttackStage::Apply { next, save } => apply_hits(combat, ctx, attack, next, save),
    }
}

fn choose_targets(combat: &mut ActiveCombat, ctx: &mut CombatContext<'_>, attack: &mut AttackInProgress) -> StageResult {
    let attacker = &attack.attacker;
    let candidates = target_candidates(combat, attacker);
    if candidates.is_empty() {
        return StageResult::Done;
    }
    let max_targets = attacker.target_count.max(1).min(candidates.len() as u8);

    if let Some(chosen) = combat.selected_targets.get(&attacker.id) {
        let still_valid: Vec<CombatantId> = chosen
            .iter()
            .copied()
            .filter(|id| candidates.contains(id))
            .collect();
        if !still_valid.is_empty() {
            attack.targets = still_valid;
            attack.stage = AttackStage::Roll;
            return StageResult::Next;
        }
    }

    if decides_interactively(combat, ctx.world, attacker.controller)
        && attacker.counts_as_merc()
        && (attacker.target_count > 1 || candidates.len() > 1)
    {
        return StageResult::Suspend(PendingDecision::TargetSelection(TargetSelection {
            attacker: attacker.id,
            attacker_name: attacker.name.clone(),
            controller: attacker.controller,
            valid_targets: candidates,
            max_targets,
        }));
    }

    attack.targets = ai::combat::choose_targets(&candidates, max_targets);
    attack.stage = AttackStage::Roll;
    StageResult::Next
}

fn roll_attack(combat: &mut ActiveCombat, ctx: &mut CombatContext<'_>, attack: &mut AttackInProgress) -> StageResult {
    let attacker = &attack.attacker;
    let threshold = attacker.hit_threshold;
    let mut dice = roll_dice(ctx.rng, attacker.combat_power);
    let mut rerolled = false;
    if attacker.flags.reroll_once && usize::from(count_hits(&dice, threshold)) < dice.len() {
        rerolled = reroll_misses(ctx.rng, &mut dice, threshold) > 0;
    }
    let (hits, sixes) = if attacker.flags.wolverine {
        split_wolverine_sixes(&dice, threshold)
    } else {
        (count_hits(&dice, threshold), 0)
    };

    combat.animation_events.push(AnimationEvent::Roll {
        attacker: attacker.id,
        attacker_name: attacker.name.clone(),
        attack: attack.slot.kind,
        dice: dice.clone(),
        threshold,
        hits: hits + sixes,
        rerolled,
    });
    attack.dice = dice;
    attack.hits = hits;
    attack.sixes = sixes;
    if hits + sixes == 0 {
        return StageResult::Done;
    }
    attack.stage = AttackStage::Allocate;
    StageResult::Next
}

fn allocate(combat: &mut ActiveCombat, ctx: &mut CombatContext<'_>, attack: &mut AttackInProgress) -> StageResult {
    let targets: Vec<CombatantId> = attack
        .targets
        .iter()
        .copied()
        .filter(|id| combat.combatant(*id).is_some())
        .collect();
    let attacker = &attack.attacker;

    if attack.hits > 0 {
        match targets.as_slice() {
            [] => {}
            [only] => attack.assignments.push(HitAssignment {
                target: *only,
                hits: attack.hits,
            }),
            _ if matches!(attacker.kind, CombatantKind::Militia | CombatantKind::AttackDog) => {
                let mut spread = vec![0u8; targets.len()];
                for i in 0..usize::from(attack.hits) {
                    spread[i % targets.len()] += 1;
                }
                attack.assignments.extend(
                    targets
                        .iter()
                        .zip(spread)
                        .filter(|(_, hits)| *hits > 0)
                        .map(|(&target, hits)| HitAssignment { target, hits }),
                );
            }
            _ if decides_interactively(combat, ctx.world, attacker.controller) => {
                return StageResult::Suspend(PendingDecision::HitAllocation(HitAllocation {
                    attacker: attacker.id,
                    attacker_name: attacker.name.clone(),
                    controller: attacker.controller,
                    hits: attack.hits,
                    targets,
                    dice: attack.dice.clone(),
                }));
            }
            _ => {
                let pool = ai::combat::hit_targets(combat, attacker, &targets, &[]);
                attack
                    .assignments
                    .extend(ai::combat::allocate_hits(&pool, attack.hits));
            }
        }
    }
    attack.stage = AttackStage::Wolverine;
    StageResult::Next
}

fn place_sixes(combat: &mut ActiveCombat, ctx: &mut CombatContext<'_>, attack: &mut AttackInProgress) -> StageResult {
    let attacker = &attack.attacker;
    let valid: Vec<CombatantId> = combat
        .side(attacker.side.opponent())
        .iter()
        .filter(|c| c.is_alive())
        .map(|c| c.id)
        .collect();

    if attack.sixes > 0 && !valid.is_empty() {
        if decides_interactively(combat, ctx.world, attacker.controller) {
            return StageResult::Suspend(PendingDecision::WolverineSixes(WolverineSixes {
                attacker: attacker.id,
                attacker_name: attacker.name.clone(),
                controller: attacker.controller,
                sixes: attack.sixes,
                valid_targets: valid,
            }));
        }
        let pool = ai::combat::hit_targets(combat, attacker, &valid, &attack.assignments);
        attack
            .assignments
            .extend(ai::combat::allocate_hits(&pool, attack.sixes));
    }
    attack.stage = AttackStage::Apply {
        next: 0,
        save: None,
    };
    StageResult::Next
}

fn apply_hits(
    combat: &mut ActiveCombat,
    ctx: &mut CombatContext<'_>,
    attack: &mut AttackInProgress,
    mut next: usize,
    mut save: Option<bool>,
) -> StageResult {
    let attacker = attack.attacker.clone();
    while let Some(&assignment) = attack.assignments.get(next) {
        let answer = save.take();
        let Some(target) = combat.combatant(assignment.target).cloned() else {
            // Already dead; the remaining hits are wasted.
            next += 1;
            continue;
        };
        let per_hit = damage_per_hit(attacker.damage_per_hit, target.armor, attacker.armor_piercing);
        let damage = per_hit.saturating_mul(assignment.hits);
        if damage == 0 {
            next += 1;
            continue;
        }

        match target.id {
            CombatantId::Merc(merc) if damage >= target.health && target.flags.has_epinephrine => {
                let use_item = match answer {
                    Some(answer) => answer,
                    None if decides_interactively(combat, ctx.world, target.controller) => {
                        attack.stage = AttackStage::Apply { next, save: None };
                        return StageResult::Suspend(PendingDecision::Epinephrine(EpinephrineSave {
                            target: target.id,
                            merc,
                            target_name: target.name.clone(),
                            controller: target.controller,
                            attacker: attacker.id,
                        }));
                    }
                    None => true,
                };
                if use_item && use_epinephrine(combat, ctx, &target, merc, attacker.id, damage) {
                    next += 1;
                    continue;
                }
            }
            _ => {}
        }

        inflict(combat, ctx, attacker.id, &target, damage);
        next += 1;
    }
    StageResult::Done
}

/// Consumes an epinephrine item so the merc survives at 1 health.
fn use_epinephrine(
    combat: &mut ActiveCombat,
    ctx: &mut CombatContext<'_>,
    target: &Combatant,
    merc: MercId,
    attacker: CombatantId,
    damage: u8,
) -> bool {
    let catalog = ctx.catalog;
    let Some(live) = ctx.world.merc_mut(merc) else {
        return false;
    };
    let Some(item) = live
        .loadout
        .items()
        .find(|key| catalog.is_epinephrine(key))
        .map(str::to_string)
    else {
        return false;
    };
    live.loadout.remove(&item);
    live.damage = live.max_health().saturating_sub(1);
    let still_has = live.loadout.items().any(|key| catalog.is_epinephrine(key));
    ctx.world.discard.push(item);

    let mut saved = target.with_health(1);
    saved.flags.has_epinephrine = still_has;
    replace_snapshot(combat, saved);
    debug!(%merc, "epinephrine used");
    combat.animation_events.push(AnimationEvent::Damage {
        attacker,
        target: target.id,
        target_name: target.name.clone(),
        damage,
        health: 1,
        saved: true,
    });
    true
}

/// Writes damage into the live unit and returns its remaining health.
fn write_damage(world: &mut World, id: CombatantId, damage: u8) -> u8 {
    match id {
        CombatantId::Merc(m) => match world.merc_mut(m) {
            Some(merc) => {
                merc.damage = merc.damage.saturating_add(damage).min(merc.max_health());
                merc.health()
            }
            None => 0,
        },
        CombatantId::Dog(m) => match world.merc_mut(m).and_then(|h| h.dog.as_mut()) {
            Some(dog) => {
                dog.damage = dog.damage.saturating_add(damage);
                dog.health()
            }
            None => 0,
        },
        CombatantId::Dictator => match world.dictator.as_mut() {
            Some(figure) => {
                figure.damage = figure.damage.saturating_add(damage).min(figure.base.health);
                figure.health()
            }
            None => 0,
        },
        // A militia token falls to any damage.
        CombatantId::Militia { .. } => 0,
    }
}

fn inflict(combat: &mut ActiveCombat, ctx: &mut CombatContext<'_>, attacker: CombatantId, target: &Combatant, damage: u8) {
    let remaining = write_damage(ctx.world, target.id, damage);
    combat.animation_events.push(AnimationEvent::Damage {
        attacker,
        target: target.id,
        target_name: target.name.clone(),
        damage,
        health: remaining,
        saved: false,
    });
    if remaining == 0 {
        record_death(combat, ctx, target.id);
    } else {
        replace_snapshot(combat, target.with_health(remaining));
    }
}

fn replace_snapshot(combat: &mut ActiveCombat, fresh: Combatant) {
    if let Some(slot) = combat
        .side_mut(fresh.side)
        .iter_mut()
        .find(|c| c.id == fresh.id)
    {
        *slot = fresh;
    }
}

/// Moves a combatant to the casualties and commits the death to the world.
fn record_death(combat: &mut ActiveCombat, ctx: &mut CombatContext<'_>, id: CombatantId) {
    let Some(side) = combat.combatant(id).map(|c| c.side) else {
        return;
    };
    let living = combat.side_mut(side);
    let Some(pos) = living.iter().position(|c| c.id == id) else {
        return;
    };
    let dead = living.remove(pos).with_health(0);
    combat.animation_events.push(AnimationEvent::Death {
        target: id,
        target_name: dead.name.clone(),
        side,
    });
    debug!(sector = %combat.sector, target = %id, "combatant killed");
    combat.casualties_mut(side).push(dead);

    let sector = combat.sector;
    match id {
        CombatantId::Merc(merc) => {
            ctx.world.kill_merc(merc);
            // The dog leaves the fight with its handler.
            record_death(combat, ctx, CombatantId::Dog(merc));
        }
        CombatantId::Dog(handler) => {
            if let Some(merc) = ctx.world.merc_mut(handler) {
                merc.dog = None;
            }
        }
        CombatantId::Militia { owner, .. } => {
            if let Some(s) = ctx.world.sector_mut(sector) {
                match owner {
                    MilitiaOwner::Dictator => s.dictator_militia = s.dictator_militia.saturating_sub(1),
                    MilitiaOwner::Rebel(seat) => s.remove_rebel_militia(seat),
                }
            }
        }
        CombatantId::Dictator => {
            if let Some(figure) = ctx.world.dictator.as_mut() {
                figure.alive = false;
                info!(name = %figure.name, "dictator defeated");
            }
        }
    }
}

fn end_round(combat: &mut ActiveCombat, ctx: &mut CombatContext<'_>) -> Step {
    if let Some(conclusion) = wipe_conclusion(combat) {
        return Step::Conclude(conclusion);
    }
    if let Some(vote) = combat.settled_vote.take() {
        return finish_vote(combat, ctx, &vote);
    }
    if combat.round >= MAX_COMBAT_ROUNDS {
        return Step::Conclude(Conclusion::Draw);
    }
    if combat.interactive {
        let vote = open_retreat_vote(combat, ctx.world);
        if !vote.is_complete() {
            return Step::Suspend(PendingDecision::Retreat(vote));
        }
        return finish_vote(combat, ctx, &vote);
    }
    combat.phase = RoundPhase::Start;
    Step::Continue
}

/// Seats with units in the sector that have a legal way out. Humans must
/// answer; AI seats decide on the spot.
fn open_retreat_vote(combat: &ActiveCombat, world: &World) -> RetreatVote {
    let mut seats: BTreeSet<Seat> = world
        .squads_in(combat.sector)
        .into_iter()
        .filter(|sq| world.living_members(sq).next().is_some())
        .map(|sq| sq.owner)
        .collect();
    if world
        .dictator
        .as_ref()
        .is_some_and(|d| d.alive && d.sector == Some(combat.sector))
    {
        seats.insert(combat.dictator_seat);
    }

    let mut vote = RetreatVote::default();
    for seat in seats {
        let Some(side) = world.side_of(seat) else {
            continue;
        };
        let options: Vec<_> = world
            .adjacent(combat.sector)
            .iter()
            .copied()
            .filter(|&adj| !world.has_forces(adj, side.opponent()))
            .collect();
        if options.is_empty() {
            continue;
        }
        if world.is_human(seat) {
            vote.required.push(seat);
        } else {
            vote.decisions
                .insert(seat, ai::combat::retreat_choice(combat, side, &options));
        }
        vote.options.insert(seat, options);
    }
    vote
}

fn finish_vote(combat: &mut ActiveCombat, ctx: &mut CombatContext<'_>, vote: &RetreatVote) -> Step {
    for (&seat, decision) in &vote.decisions {
        let RetreatDecision::Retreat { to } = *decision else {
            continue;
        };
        info!(sector = %combat.sector, %seat, %to, "retreat");
        let kinds: Vec<_> = ctx
            .world
            .squads_in(combat.sector)
            .into_iter()
            .filter(|sq| sq.owner == seat)
            .map(|sq| sq.kind)
            .collect();
        for kind in kinds {
            ctx.world.move_squad(seat, kind, to);
        }
        if seat == combat.dictator_seat {
            if let Some(figure) = ctx
                .world
                .dictator
                .as_mut()
                .filter(|d| d.alive && d.sector == Some(combat.sector))
            {
                figure.sector = Some(to);
            }
        }
    }
    if !ctx.world.is_contested(combat.sector) {
        return Step::Conclude(Conclusion::Retreated);
    }
    if combat.round >= MAX_COMBAT_ROUNDS {
        return Step::Conclude(Conclusion::Draw);
    }
    combat.phase = RoundPhase::Start;
    Step::Continue
}

fn push_panel(combat: &mut ActiveCombat, complete: bool) {
    let entries = |list: &[Combatant]| list.iter().map(PanelEntry::from).collect::<Vec<_>>();
    let snapshot = PanelSnapshot {
        sector: combat.sector,
        round: combat.round,
        rebels: entries(&combat.rebel_combatants),
        dictator: entries(&combat.dictator_combatants),
        rebel_casualties: entries(&combat.rebel_casualties),
        dictator_casualties: entries(&combat.dictator_casualties),
        pending: combat.pending.as_ref().map(PendingDecision::kind),
        combat_complete: complete,
    };
    combat.animation_events.push(AnimationEvent::Panel(snapshot));
}

fn conclude(combat: &mut ActiveCombat, conclusion: Conclusion) {
    combat.conclusion = Some(conclusion);
    combat.attack = None;
    combat.settled_vote = None;
    info!(sector = %combat.sector, rounds = combat.round, ?conclusion, "combat over");
    combat.animation_events.push(AnimationEvent::End {
        sector: combat.sector,
        round: combat.round,
        conclusion,
    });
    push_panel(combat, true);
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use crate::board::{Action, Controller, HitAssignment, MercId, Role, Seat, SectorId, Side, SquadKind, Stats};
    use crate::combat::{AnimationEvent, AttackKind, CombatOptions, CombatantId, PendingDecision, PendingKind};
    use crate::error::ActionError;
    use crate::game::Game;
    use crate::registry::{AbilityProfile, Registry};
    use crate::setup::ScenarioBuilder;

    const INTERACTIVE: CombatOptions = CombatOptions { interactive: true };
    const AUTO: CombatOptions = CombatOptions { interactive: false };

    const GRUNT: Stats = Stats {
        initiative: 1,
        combat: 1,
        health: 3,
    };

    /// Standard registry plus a "marksman" whose every die hits.
    fn builder() -> ScenarioBuilder {
        let registry = Registry::standard().with_ability(
            "marksman",
            AbilityProfile {
                hit_threshold: 1,
                ..AbilityProfile::default()
            },
        );
        let mut b = ScenarioBuilder::new(3, 2).unwrap();
        b.seed(17).catalog(Arc::new(registry));
        b
    }

    fn players(b: &mut ScenarioBuilder, rebel: Controller) -> (Seat, Seat) {
        let r = b.add_player("Rebel", Role::Rebel, rebel);
        let d = b.add_player("Dictator", Role::Dictator, Controller::Ai);
        (r, d)
    }

    fn pending(game: &Game) -> Option<&PendingDecision> {
        game.active_combat().and_then(|c| c.pending())
    }

    fn rolls(game: &Game, attacker: MercId, kind: AttackKind) -> usize {
        game.animation_events_since(0)
            .iter()
            .filter(|e| {
                matches!(e, AnimationEvent::Roll { attacker: a, attack, .. }
                    if *a == CombatantId::Merc(attacker) && *attack == kind)
            })
            .count()
    }

    fn damage_to(game: &Game, target: CombatantId) -> Vec<u8> {
        game.animation_events_since(0)
            .iter()
            .filter_map(|e| match e {
                AnimationEvent::Damage { target: t, damage, .. } if *t == target => Some(*damage),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn human_spreads_hits_across_chosen_targets() {
        let mut b = builder();
        let (rebel, _) = players(&mut b, Controller::Human);
        let stats = Stats {
            initiative: 5,
            combat: 3,
            health: 10,
        };
        let merc = b
            .add_merc(rebel, SquadKind::Primary, SectorId(0), "marksman", "Marksman", stats)
            .unwrap();
        b.equip(merc, "smg").unwrap();
        b.dictator_militia(SectorId(0), 2).unwrap();
        let mut game = b.build().unwrap();

        let outcome = game.execute_combat(SectorId(0), rebel, INTERACTIVE).unwrap();
        assert_eq!(outcome.pending, Some(PendingKind::TargetSelection));
        let Some(PendingDecision::TargetSelection(sel)) = pending(&game) else {
            panic!("expected target selection");
        };
        assert_eq!(sel.max_targets, 2);
        let targets = sel.valid_targets.clone();
        game.apply(rebel, Action::CombatSelectTargets { targets: targets.clone() })
            .unwrap();

        let Some(PendingDecision::HitAllocation(alloc)) = pending(&game) else {
            panic!("expected hit allocation");
        };
        assert_eq!(alloc.hits, 4);
        assert_eq!(alloc.targets, targets);

        let short = vec![
            HitAssignment { target: targets[0], hits: 2 },
            HitAssignment { target: targets[1], hits: 1 },
        ];
        assert_eq!(
            game.apply(rebel, Action::CombatAllocateHits { allocation: short }),
            Err(ActionError::HitCountMismatch { expected: 4, got: 3 })
        );
        assert_eq!(pending(&game).map(PendingDecision::kind), Some(PendingKind::HitAllocation));

        let even = targets
            .iter()
            .map(|&target| HitAssignment { target, hits: 2 })
            .collect();
        let done = game
            .apply(rebel, Action::CombatAllocateHits { allocation: even })
            .unwrap()
            .combat
            .unwrap();
        assert!(done.rebel_victory);
        assert_eq!(done.round, 1);
        assert_eq!(game.world().sector(SectorId(0)).unwrap().dictator_militia, 0);
        assert!(game.active_combat().is_none());
    }

    #[test]
    fn wolverine_sixes_may_go_to_an_unchosen_enemy() {
        let mut b = builder();
        let (rebel, _) = players(&mut b, Controller::Human);
        let stats = Stats {
            initiative: 6,
            combat: 90,
            health: 50,
        };
        b.add_merc(rebel, SquadKind::Primary, SectorId(0), "wolverine", "Wolverine", stats)
            .unwrap();
        b.dictator_militia(SectorId(0), 3).unwrap();
        let mut game = b.build().unwrap();

        game.execute_combat(SectorId(0), rebel, INTERACTIVE).unwrap();
        let Some(PendingDecision::TargetSelection(sel)) = pending(&game) else {
            panic!("expected target selection");
        };
        assert_eq!(sel.max_targets, 1);
        let first = sel.valid_targets[0];
        game.apply(rebel, Action::CombatSelectTargets { targets: vec![first] })
            .unwrap();

        let Some(PendingDecision::WolverineSixes(sixes)) = pending(&game) else {
            panic!("expected wolverine sixes");
        };
        assert!(sixes.sixes > 0);
        assert_eq!(sixes.valid_targets.len(), 3);
        assert_eq!(sixes.valid_targets[0], first);
        let second = sixes.valid_targets[1];
        let allocation = vec![HitAssignment {
            target: second,
            hits: sixes.sixes,
        }];
        game.apply(rebel, Action::CombatAllocateWolverineSixes { allocation })
            .unwrap();

        assert_eq!(game.world().sector(SectorId(0)).unwrap().dictator_militia, 1);
        assert_eq!(pending(&game).map(PendingDecision::kind), Some(PendingKind::Retreat));
    }

    /// A fragile rebel with epinephrine facing a dictator merc that always
    /// lands two hits.
    fn epinephrine_duel() -> (Game, Seat, MercId) {
        let mut b = builder();
        let (rebel, dictator) = players(&mut b, Controller::Human);
        let fragile = Stats {
            initiative: 1,
            combat: 1,
            health: 1,
        };
        let ours = b
            .add_merc(rebel, SquadKind::Primary, SectorId(0), "grunt", "Medic", fragile)
            .unwrap();
        b.equip(ours, "epinephrine").unwrap();
        let sharp = Stats {
            initiative: 5,
            combat: 2,
            health: 10,
        };
        b.add_merc(dictator, SquadKind::Primary, SectorId(0), "marksman", "Sniper", sharp)
            .unwrap();
        let mut game = b.build().unwrap();
        let outcome = game.execute_combat(SectorId(0), rebel, INTERACTIVE).unwrap();
        assert_eq!(outcome.pending, Some(PendingKind::Epinephrine));
        (game, rebel, ours)
    }

    #[test]
    fn epinephrine_keeps_a_dying_merc_at_one_health() {
        let (mut game, rebel, ours) = epinephrine_duel();
        let Some(PendingDecision::Epinephrine(save)) = pending(&game) else {
            panic!("expected epinephrine");
        };
        assert_eq!(save.merc, ours);
        assert_eq!(save.controller, rebel);

        game.apply(rebel, Action::CombatEpinephrine { use_item: true })
            .unwrap();
        let merc = game.world().merc(ours).unwrap();
        assert!(merc.alive);
        assert_eq!(merc.health(), 1);
        assert!(merc.loadout.items().all(|item| item != "epinephrine"));
        assert!(game.world().discard.iter().any(|item| item == "epinephrine"));
        assert!(game.animation_events_since(0).iter().any(|e| matches!(
            e,
            AnimationEvent::Damage { target, saved: true, health: 1, .. } if *target == CombatantId::Merc(ours)
        )));
        assert_eq!(pending(&game).map(PendingDecision::kind), Some(PendingKind::Retreat));
    }

    #[test]
    fn declined_epinephrine_lets_the_merc_die() {
        let (mut game, rebel, ours) = epinephrine_duel();
        let outcome = game
            .apply(rebel, Action::CombatEpinephrine { use_item: false })
            .unwrap();

        assert!(!game.world().merc(ours).unwrap().alive);
        assert!(outcome.combat.unwrap().dictator_victory);
        assert_eq!(outcome.winner, Some(Side::Dictator));
        let stash = &game.world().sector(SectorId(0)).unwrap().stash;
        assert!(stash.iter().any(|item| item == "epinephrine"));
        assert!(game.world().discard.is_empty());
    }

    #[test]
    fn retreat_moves_the_squad_and_ends_the_combat() {
        let mut b = builder();
        let (rebel, dictator) = players(&mut b, Controller::Human);
        let ours = b
            .add_merc(rebel, SquadKind::Primary, SectorId(0), "grunt", "Ours", GRUNT)
            .unwrap();
        let theirs = b
            .add_merc(dictator, SquadKind::Primary, SectorId(0), "grunt", "Theirs", GRUNT)
            .unwrap();
        b.equip(ours, "body_armor").unwrap();
        b.equip(theirs, "body_armor").unwrap();
        let mut game = b.build().unwrap();

        let outcome = game.execute_combat(SectorId(0), rebel, INTERACTIVE).unwrap();
        assert_eq!(outcome.round, 1);
        let Some(PendingDecision::Retreat(vote)) = pending(&game) else {
            panic!("expected a retreat vote");
        };
        assert_eq!(vote.required, vec![rebel]);
        assert_eq!(vote.options[&rebel], vec![SectorId(1), SectorId(3)]);

        assert_eq!(
            game.apply(rebel, Action::CombatRetreat { to: Some(SectorId(4)) }),
            Err(ActionError::IllegalRetreat(SectorId(4)))
        );
        let done = game
            .apply(rebel, Action::CombatRetreat { to: Some(SectorId(1)) })
            .unwrap()
            .combat
            .unwrap();
        assert!(done.retreated);
        assert!(!done.rebel_victory && !done.dictator_victory);
        assert_eq!(game.world().merc_sector(ours), Some(SectorId(1)));
        assert_eq!(game.world().merc_sector(theirs), Some(SectorId(0)));
        assert!(game.active_combat().is_none());
    }

    #[test]
    fn preemptive_strike_opens_round_one_and_second_shots_repeat() {
        let mut b = builder();
        let (rebel, dictator) = players(&mut b, Controller::Ai);
        let hawk = b
            .add_merc(rebel, SquadKind::Primary, SectorId(0), "hawk", "Hawk", GRUNT)
            .unwrap();
        let gunner = b
            .add_merc(rebel, SquadKind::Primary, SectorId(0), "gunner", "Gunner", GRUNT)
            .unwrap();
        let theirs = b
            .add_merc(dictator, SquadKind::Primary, SectorId(0), "grunt", "Theirs", GRUNT)
            .unwrap();
        for merc in [hawk, gunner, theirs] {
            b.equip(merc, "body_armor").unwrap();
        }
        let mut game = b.build().unwrap();

        let outcome = game.execute_combat(SectorId(0), rebel, AUTO).unwrap();
        assert_eq!(outcome.round, crate::combat::MAX_COMBAT_ROUNDS);

        let first_roll = game
            .animation_events_since(0)
            .iter()
            .find(|e| matches!(e, AnimationEvent::Roll { .. }));
        assert!(matches!(
            first_roll,
            Some(AnimationEvent::Roll { attacker, attack: AttackKind::Preemptive, .. })
                if *attacker == CombatantId::Merc(hawk)
        ));
        assert_eq!(rolls(&game, hawk, AttackKind::Preemptive), 1);
        assert_eq!(rolls(&game, hawk, AttackKind::Normal), 30);
        assert_eq!(rolls(&game, gunner, AttackKind::Normal), 30);
        assert_eq!(rolls(&game, gunner, AttackKind::SecondShot), 30);
        assert_eq!(rolls(&game, theirs, AttackKind::SecondShot), 0);
    }

    fn marksman_vs_armor(weapon: &str) -> (Game, Seat, MercId) {
        let mut b = builder();
        let (rebel, dictator) = players(&mut b, Controller::Ai);
        let stats = Stats {
            initiative: 3,
            combat: 1,
            health: 10,
        };
        let ours = b
            .add_merc(rebel, SquadKind::Primary, SectorId(0), "marksman", "Marksman", stats)
            .unwrap();
        b.equip(ours, weapon).unwrap();
        b.equip(ours, "body_armor").unwrap();
        let theirs = b
            .add_merc(dictator, SquadKind::Primary, SectorId(0), "grunt", "Guard", GRUNT)
            .unwrap();
        b.equip(theirs, "body_armor").unwrap();
        (b.build().unwrap(), rebel, theirs)
    }

    #[test]
    fn armor_piercing_ignores_body_armor() {
        let (mut game, rebel, theirs) = marksman_vs_armor("sniper_rifle");
        let outcome = game.execute_combat(SectorId(0), rebel, AUTO).unwrap();
        assert!(outcome.rebel_victory);
        assert_eq!(outcome.round, 1);
        assert_eq!(damage_to(&game, CombatantId::Merc(theirs)), vec![3]);
        assert!(!game.world().merc(theirs).unwrap().alive);
    }

    #[test]
    fn body_armor_stops_ordinary_hits() {
        let (mut game, rebel, theirs) = marksman_vs_armor("rifle");
        let outcome = game.execute_combat(SectorId(0), rebel, AUTO).unwrap();
        assert!(!outcome.rebel_victory && !outcome.dictator_victory);
        assert!(damage_to(&game, CombatantId::Merc(theirs)).is_empty());
        let guard = game.world().merc(theirs).unwrap();
        assert!(guard.alive);
        assert_eq!(guard.health(), 3);
    }
}
