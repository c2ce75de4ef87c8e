//! The game: live world, seeded randomness, active combat, and turn flow.
//!
//! [`Game::apply`] is the only way to change a game. Every accepted action
//! is recorded, and afterwards the orchestrator settles everything that
//! needs no player input. Cloning a game clones the random stream too, so
//! a clone replays exactly like the original.

use std::collections::VecDeque;
use std::sync::Arc;

use rand_chacha::ChaCha8Rng;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::actions::{equipment, movement, sector};
use crate::ai;
use crate::board::{Action, Seat, SectorId, Side, World};
use crate::combat::{self, decision, ActiveCombat, AnimationEvent, CombatContext, CombatOptions, CombatOutcome, PendingKind, Progress};
use crate::config::GameConfig;
use crate::error::ActionError;
use crate::flow::{coordinated, orchestrator, CoordinatedAttack, FlowState, PendingCombat, Step};
use crate::registry::Catalog;
use crate::replay::LoggedAction;

/// Trip wire for [`Game::run_ai`]; real games finish long before this.
pub const MAX_DRIVER_STEPS: usize = 100_000;

/// What an accepted action led to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionOutcome {
    pub day: u32,
    /// The active combat after the action, or the last one it concluded.
    pub combat: Option<CombatOutcome>,
    pub winner: Option<Side>,
}

/// A summary for presentation and logs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GameStatus {
    pub day: u32,
    pub step: Step,
    pub winner: Option<Side>,
    pub combat_sector: Option<SectorId>,
    pub pending: Option<PendingKind>,
    pub coordinated_target: Option<SectorId>,
    pub queued_combats: usize,
    pub awaiting: Vec<Seat>,
}

#[derive(Debug, Clone)]
pub struct Game {
    pub(crate) world: World,
    pub(crate) rng: ChaCha8Rng,
    pub(crate) catalog: Arc<dyn Catalog>,
    pub(crate) config: GameConfig,
    pub(crate) flow: FlowState,
    pub(crate) combat: Option<ActiveCombat>,
    pub(crate) pending_combats: VecDeque<PendingCombat>,
    pub(crate) coordinated: Option<CoordinatedAttack>,
    pub(crate) last_outcome: Option<CombatOutcome>,
    pub(crate) combat_history: Vec<CombatOutcome>,
    pub(crate) animation_log: Vec<AnimationEvent>,
    pub(crate) history: Vec<LoggedAction>,
    pub(crate) winner: Option<Side>,
}

impl Game {
    pub(crate) fn new(world: World, rng: ChaCha8Rng, catalog: Arc<dyn Catalog>, config: GameConfig) -> Self {
        let mut game = Game {
            world,
            rng,
            catalog,
            config,
            flow: FlowState::new(),
            combat: None,
            pending_combats: VecDeque::new(),
            coordinated: None,
            last_outcome: None,
            combat_history: Vec::new(),
            animation_log: Vec::new(),
            history: Vec::new(),
            winner: None,
        };
        orchestrator::settle(&mut game);
        game
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn catalog(&self) -> &dyn Catalog {
        self.catalog.as_ref()
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn day(&self) -> u32 {
        self.world.day
    }

    pub fn step(&self) -> Step {
        self.flow.step
    }

    pub fn winner(&self) -> Option<Side> {
        self.winner
    }

    pub fn is_over(&self) -> bool {
        self.winner.is_some()
    }

    pub fn active_combat(&self) -> Option<&ActiveCombat> {
        self.combat.as_ref()
    }

    pub fn coordinated_attack(&self) -> Option<&CoordinatedAttack> {
        self.coordinated.as_ref()
    }

    pub fn pending_combats(&self) -> impl Iterator<Item = &PendingCombat> {
        self.pending_combats.iter()
    }

    pub fn last_outcome(&self) -> Option<&CombatOutcome> {
        self.last_outcome.as_ref()
    }

    /// Outcomes of every concluded combat, oldest first.
    pub fn combat_history(&self) -> &[CombatOutcome] {
        &self.combat_history
    }

    pub fn history(&self) -> &[LoggedAction] {
        &self.history
    }

    pub fn has_ended_turn(&self, seat: Seat) -> bool {
        self.flow.done.contains(&seat)
    }

    /// Animation events published after `cursor`.
    pub fn animation_events_since(&self, cursor: usize) -> &[AnimationEvent] {
        self.animation_log.get(cursor..).unwrap_or(&[])
    }

    /// Seats whose input the game is waiting for, in priority order: the
    /// active combat, an open coordinated attack, then the current step.
    pub fn awaiting_players(&self) -> Vec<Seat> {
        if self.winner.is_some() {
            return Vec::new();
        }
        if let Some(combat) = &self.combat {
            return combat
                .pending()
                .map(|p| p.awaiting_seats())
                .unwrap_or_default();
        }
        if let Some(attack) = &self.coordinated {
            return attack.awaiting();
        }
        orchestrator::awaiting(self)
    }

    pub fn status(&self) -> GameStatus {
        GameStatus {
            day: self.world.day,
            step: self.flow.step,
            winner: self.winner,
            combat_sector: self.combat.as_ref().map(|c| c.sector),
            pending: self
                .combat
                .as_ref()
                .and_then(|c| c.pending())
                .map(|p| p.kind()),
            coordinated_target: self.coordinated.as_ref().map(|a| a.target),
            queued_combats: self.pending_combats.len(),
            awaiting: self.awaiting_players(),
        }
    }

    /// Applies one action for `seat`.
    ///
    /// On error nothing changed. On success the action is logged and the
    /// game advanced until some player's input is needed again.
    pub fn apply(&mut self, seat: Seat, action: Action) -> Result<ActionOutcome, ActionError> {
        if self.winner.is_some() {
            return Err(ActionError::GameOver);
        }
        if self.world.player(seat).is_none() {
            return Err(ActionError::UnknownSeat(seat));
        }
        if let Action::ExecuteCombat { sector, options } = action {
            let outcome = self.execute_combat(sector, seat, options)?;
            return Ok(ActionOutcome {
                day: self.world.day,
                combat: Some(outcome),
                winner: self.winner,
            });
        }
        let concluded_before = self.combat_history.len();

        self.dispatch(seat, &action)?;
        debug!(%seat, ?action, day = self.world.day, "action applied");
        self.history.push(LoggedAction { seat, action });
        orchestrator::settle(self);

        let combat = match &self.combat {
            Some(active) => Some(active.outcome()),
            None => self.combat_history.get(concluded_before..).and_then(|c| c.last()).cloned(),
        };
        Ok(ActionOutcome {
            day: self.world.day,
            combat,
            winner: self.winner,
        })
    }

    fn dispatch(&mut self, seat: Seat, action: &Action) -> Result<(), ActionError> {
        if action.is_combat_decision() {
            return self.resolve_combat_decision(seat, action);
        }
        if self.combat.is_some() {
            return Err(ActionError::CombatInProgress);
        }
        if action.is_coordinated_response() {
            return match action {
                Action::JoinCoordinatedAttack { squad } => coordinated::join(self, seat, *squad),
                Action::DeclineCoordinatedAttack => coordinated::decline(self, seat),
                _ => coordinated::execute(self, seat),
            };
        }
        if self.coordinated.is_some() {
            return Err(ActionError::CoordinatedAttackOpen);
        }

        orchestrator::ensure_may_act(self, seat, action)?;
        match action {
            Action::Move { squad, to } => movement::move_squad(self, seat, *squad, *to)?,
            Action::Explore { merc } => sector::explore(self, seat, *merc)?,
            Action::ReEquip { merc, item } => equipment::re_equip(self, seat, *merc, item)?,
            Action::Train { merc } => sector::train(self, seat, *merc)?,
            Action::Heal { merc, item } => equipment::heal(self, seat, *merc, item)?,
            Action::DeclareCoordinatedAttack { target, squad } => coordinated::declare(self, seat, *target, *squad)?,
            Action::EndTurn => {
                orchestrator::end_turn(self, seat);
                return Ok(());
            }
            _ => unreachable!("combat decisions, coordinated responses and combat runs are dispatched above"),
        }
        orchestrator::record_action(self, seat);
        Ok(())
    }

    fn resolve_combat_decision(&mut self, seat: Seat, action: &Action) -> Result<(), ActionError> {
        let combat = self.combat.as_mut().ok_or(ActionError::NoActiveCombat)?;
        match action {
            Action::CombatSelectTargets { targets } => decision::select_targets(combat, seat, targets),
            Action::CombatAllocateHits { allocation } => decision::allocate_hits(combat, seat, allocation),
            Action::CombatAllocateWolverineSixes { allocation } => {
                decision::allocate_wolverine_sixes(combat, seat, allocation)
            }
            Action::CombatEpinephrine { use_item } => decision::resolve_epinephrine(combat, seat, *use_item),
            Action::CombatContinue => decision::decide_retreat(combat, seat, None),
            Action::CombatRetreat { to } => decision::decide_retreat(combat, seat, Some(*to)),
            _ => unreachable!("only combat decisions reach the resolver"),
        }
    }

    /// Starts or resumes combat in `sector`.
    ///
    /// With a combat already running it is continued, or reported unchanged
    /// while it waits on a decision. Asking again about the sector of the
    /// most recently concluded combat returns its stored outcome; moves into
    /// a sector queue any new combat there. Calls that change the game are
    /// recorded in the action log as [`Action::ExecuteCombat`].
    pub fn execute_combat(&mut self, sector: SectorId, attacker: Seat, options: CombatOptions) -> Result<CombatOutcome, ActionError> {
        if self.winner.is_some() {
            return Err(ActionError::GameOver);
        }
        if let Some(active) = &self.combat {
            if active.sector != sector {
                return Err(ActionError::CombatElsewhere(active.sector));
            }
            if active.pending().is_some() {
                return Ok(active.outcome());
            }
            self.log_combat_run(attacker, sector, options);
            let outcome = self.advance_combat();
            orchestrator::settle(self);
            return Ok(outcome);
        }
        if self.world.sector(sector).is_none() {
            return Err(ActionError::UnknownSector(sector));
        }
        if self.world.player(attacker).is_none() {
            return Err(ActionError::UnknownSeat(attacker));
        }
        let queued = self.pending_combats.iter().any(|p| p.sector == sector);
        if !queued {
            if let Some(outcome) = self.last_outcome.as_ref().filter(|o| o.sector == sector) {
                return Ok(outcome.clone());
            }
        }
        if !self.world.is_contested(sector) {
            return Err(ActionError::NoOpposingForces(sector));
        }

        let outcome = self.start_combat(sector, attacker, options)?;
        self.pending_combats.retain(|p| p.sector != sector);
        self.log_combat_run(attacker, sector, options);
        orchestrator::settle(self);
        Ok(outcome)
    }

    fn log_combat_run(&mut self, seat: Seat, sector: SectorId, options: CombatOptions) {
        debug!(%seat, %sector, interactive = options.interactive, "combat run by request");
        self.history.push(LoggedAction {
            seat,
            action: Action::ExecuteCombat { sector, options },
        });
    }

    /// Opens a combat and runs it until it suspends or concludes.
    pub(crate) fn start_combat(&mut self, sector: SectorId, attacker: Seat, options: CombatOptions) -> Result<CombatOutcome, ActionError> {
        let dictator_seat = self.world.dictator_seat().ok_or(ActionError::NoDictator)?;
        info!(%sector, %attacker, interactive = options.interactive, "combat starts");
        self.combat = Some(ActiveCombat::new(sector, attacker, dictator_seat, options));
        self.flow.unwound = true;
        Ok(self.advance_combat())
    }

    /// Runs the active combat, publishes its events, and retires it once
    /// concluded.
    ///
    /// # Panics
    ///
    /// Panics if there is no active combat.
    pub(crate) fn advance_combat(&mut self) -> CombatOutcome {
        let Game {
            world,
            rng,
            catalog,
            combat: slot,
            animation_log,
            ..
        } = self;
        let active = slot.as_mut().expect("advance_combat without an active combat");
        let mut ctx = CombatContext {
            world,
            rng,
            catalog: &**catalog,
        };
        let progress = combat::advance(active, &mut ctx);
        active.check_invariants();
        animation_log.extend_from_slice(&active.animation_events[active.published..]);
        active.published = active.animation_events.len();
        let outcome = active.outcome();

        if progress == Progress::Concluded {
            self.combat = None;
            self.last_outcome = Some(outcome.clone());
            self.combat_history.push(outcome.clone());
            self.check_game_over();
        }
        outcome
    }

    pub(crate) fn check_game_over(&mut self) {
        if self.winner.is_some() {
            return;
        }
        let winner = if self.world.dictator.as_ref().is_some_and(|d| !d.alive) {
            Some(Side::Rebel)
        } else if self.world.living_rebel_mercs() == 0 || self.world.day > self.config.max_days {
            Some(Side::Dictator)
        } else {
            None
        };
        if let Some(side) = winner {
            info!(?side, day = self.world.day, "game over");
            self.winner = Some(side);
        }
    }

    /// Plays AI seats until a human must act or the game ends.
    ///
    /// # Panics
    ///
    /// Panics if the AI cannot find any legal action, or if the game does
    /// not settle within [`MAX_DRIVER_STEPS`] actions.
    pub fn run_ai(&mut self) {
        for _ in 0..MAX_DRIVER_STEPS {
            if !self.step_ai() {
                return;
            }
        }
        panic!("AI driver did not settle within {MAX_DRIVER_STEPS} actions");
    }

    /// Plays one action for the first awaited AI seat. Returns false when
    /// no AI seat is awaited.
    ///
    /// # Panics
    ///
    /// Panics if neither the AI's choice nor the fallback is accepted.
    pub fn step_ai(&mut self) -> bool {
        let Some(seat) = self
            .awaiting_players()
            .into_iter()
            .find(|&s| !self.world.is_human(s))
        else {
            return false;
        };
        let action = ai::next_action(self, seat);
        if let Err(err) = self.apply(seat, action.clone()) {
            warn!(%seat, ?action, %err, "AI action rejected, falling back");
            let fallback = self.fallback_action();
            if let Err(err) = self.apply(seat, fallback.clone()) {
                panic!("AI seat {seat} has no legal action ({fallback:?}: {err})");
            }
        }
        true
    }

    fn fallback_action(&self) -> Action {
        if self.combat.is_some() {
            Action::CombatContinue
        } else if self.coordinated.is_some() {
            Action::DeclineCoordinatedAttack
        } else {
            Action::EndTurn
        }
    }
}
