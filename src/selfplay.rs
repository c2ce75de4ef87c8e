//! Self-play game generation.
//!
//! Plays complete AI-only games from a standard deal and records how each
//! one ended: the winner, the days played, every combat, and optionally the
//! full action log so any game can be replayed. Games run concurrently on a
//! rayon pool; each owns its state and its seed.

use std::io::Write;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;

use serde::Serialize;
use tracing::{debug, info};

use crate::board::{Controller, Role, SectorId, Side};
use crate::config::{GameConfig, PlayerConfig, DEFAULT_MAX_DAYS};
use crate::error::SetupError;
use crate::game::MAX_DRIVER_STEPS;
use crate::replay::ActionLog;
use crate::setup::standard_game;

/// Configuration for self-play game generation.
#[derive(Debug, Clone)]
pub struct SelfPlayConfig {
    /// Number of games to play.
    pub num_games: usize,
    /// Base seed; game `i` is dealt with `seed + i`. Zero picks a random base.
    pub seed: u64,
    /// Number of parallel threads for concurrent games.
    pub threads: usize,
    pub max_days: u32,
    pub map_width: u16,
    pub map_height: u16,
    pub rebels: usize,
    /// Keep each game's action log in its record.
    pub record_actions: bool,
    /// Suppress per-game progress output.
    pub quiet: bool,
}

impl Default for SelfPlayConfig {
    fn default() -> Self {
        SelfPlayConfig {
            num_games: 10,
            seed: 0,
            threads: 4,
            max_days: DEFAULT_MAX_DAYS,
            map_width: 4,
            map_height: 3,
            rebels: 2,
            record_actions: false,
            quiet: false,
        }
    }
}

impl SelfPlayConfig {
    /// The deal for one game. Every seat is AI and combat never waits.
    pub fn game_config(&self, seed: u64) -> GameConfig {
        let mut players: Vec<PlayerConfig> = (1..=self.rebels)
            .map(|i| PlayerConfig::new(format!("Rebel {i}"), Role::Rebel, Controller::Ai))
            .collect();
        players.push(PlayerConfig::new("Dictator", Role::Dictator, Controller::Ai));
        GameConfig {
            seed,
            players,
            interactive_combat: false,
            max_days: self.max_days,
            map_width: self.map_width,
            map_height: self.map_height,
            ..GameConfig::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CombatSummary {
    pub sector: SectorId,
    pub day: u32,
    pub rounds: u32,
    pub rebel_victory: bool,
    pub dictator_victory: bool,
    pub retreated: bool,
}

/// A complete self-play game record.
#[derive(Debug, Clone, Serialize)]
pub struct GameRecord {
    pub game_id: usize,
    /// The seed the game was dealt with; replaying needs only this.
    pub seed: u64,
    pub winner: Option<Side>,
    pub days: u32,
    pub actions: usize,
    pub rebel_mercs_alive: usize,
    pub dictator_alive: bool,
    pub combats: Vec<CombatSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log: Option<ActionLog>,
}

/// Plays a single AI-only game to the end.
pub fn play_game(config: &SelfPlayConfig, game_id: usize, seed: u64) -> Result<GameRecord, SetupError> {
    let mut game = standard_game(&config.game_config(seed))?;
    let mut combats = Vec::new();
    for _ in 0..MAX_DRIVER_STEPS {
        let day = game.day();
        let seen = game.combat_history().len();
        // Every seat is AI, so this only stops once the game is over.
        if !game.step_ai() {
            break;
        }
        combats.extend(game.combat_history()[seen..].iter().map(|outcome| CombatSummary {
            sector: outcome.sector,
            day,
            rounds: outcome.round,
            rebel_victory: outcome.rebel_victory,
            dictator_victory: outcome.dictator_victory,
            retreated: outcome.retreated,
        }));
    }
    debug!(game_id, seed, winner = ?game.winner(), days = game.day(), "game finished");

    let world = game.world();
    Ok(GameRecord {
        game_id,
        seed,
        winner: game.winner(),
        days: world.day,
        actions: game.history().len(),
        rebel_mercs_alive: world.living_rebel_mercs(),
        dictator_alive: world.dictator.as_ref().is_some_and(|d| d.alive),
        combats,
        log: config.record_actions.then(|| ActionLog::of(&game)),
    })
}

fn base_seed(config: &SelfPlayConfig) -> u64 {
    if config.seed != 0 {
        config.seed
    } else {
        rand::random()
    }
}

fn outcome_label(game: &GameRecord) -> &'static str {
    match game.winner {
        Some(Side::Rebel) => "rebels win",
        Some(Side::Dictator) => "dictator wins",
        None => "unfinished",
    }
}

/// Runs self-play generation, producing multiple game records.
///
/// When `config.threads > 1`, games are played concurrently using rayon.
pub fn run_self_play(config: &SelfPlayConfig) -> Result<Vec<GameRecord>, SetupError> {
    let mut games = Vec::with_capacity(config.num_games);
    run_self_play_with_callback(config, |game| games.push(game))?;
    games.sort_by_key(|g| g.game_id);
    Ok(games)
}

/// Runs self-play generation, calling `on_game` with each completed game
/// record as soon as it finishes.
pub fn run_self_play_with_callback<F>(config: &SelfPlayConfig, on_game: F) -> Result<(), SetupError>
where
    F: FnMut(GameRecord) + Send,
{
    // Fail fast on a bad deal rather than once per game.
    standard_game(&config.game_config(1))?;

    let base = base_seed(config);
    info!(games = config.num_games, base, threads = config.threads, "self-play starting");
    if config.threads > 1 {
        run_self_play_parallel(config, base, on_game)
    } else {
        run_self_play_sequential(config, base, on_game)
    }
}

fn report(config: &SelfPlayConfig, n: usize, game: &GameRecord, elapsed: f64) {
    if !config.quiet {
        eprintln!(
            "Game {}/{}: {} on day {} after {} combats ({:.2}s)",
            n,
            config.num_games,
            outcome_label(game),
            game.days,
            game.combats.len(),
            elapsed,
        );
    }
}

/// Sequential self-play: plays games one at a time.
fn run_self_play_sequential<F>(config: &SelfPlayConfig, base: u64, mut on_game: F) -> Result<(), SetupError>
where
    F: FnMut(GameRecord),
{
    for i in 0..config.num_games {
        let game_start = Instant::now();
        let game = play_game(config, i, base.wrapping_add(i as u64))?;
        report(config, i + 1, &game, game_start.elapsed().as_secs_f64());
        on_game(game);
    }
    Ok(())
}

/// Parallel self-play on a dedicated rayon pool. Completed games travel
/// back to the calling thread over a channel.
fn run_self_play_parallel<F>(config: &SelfPlayConfig, base: u64, mut on_game: F) -> Result<(), SetupError>
where
    F: FnMut(GameRecord) + Send,
{
    use rayon::prelude::*;
    use std::sync::mpsc;

    let completed = AtomicUsize::new(0);
    let (tx, rx) = mpsc::channel::<Result<GameRecord, SetupError>>();

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(config.threads)
        .build()
        .expect("failed to build rayon thread pool");

    let config_clone = config.clone();
    let handle = std::thread::spawn(move || {
        pool.install(|| {
            (0..config_clone.num_games)
                .into_par_iter()
                .for_each_with(tx, |tx, i| {
                    let game_start = Instant::now();
                    let game = play_game(&config_clone, i, base.wrapping_add(i as u64));
                    if let Ok(game) = &game {
                        let n = completed.fetch_add(1, Ordering::Relaxed) + 1;
                        report(&config_clone, n, game, game_start.elapsed().as_secs_f64());
                    }
                    let _ = tx.send(game);
                });
        });
    });

    let mut first_error = None;
    for game in rx {
        match game {
            Ok(game) => on_game(game),
            Err(err) => {
                first_error.get_or_insert(err);
            }
        }
    }
    handle.join().expect("selfplay worker thread panicked");
    match first_error {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

/// Writes game records as JSONL, one object per line.
pub fn write_jsonl<W: Write>(games: &[GameRecord], out: &mut W) -> std::io::Result<()> {
    for game in games {
        serde_json::to_writer(&mut *out, game)?;
        writeln!(out)?;
    }
    out.flush()
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Summary {
    pub games: usize,
    pub rebel_wins: usize,
    pub dictator_wins: usize,
    pub unfinished: usize,
    pub average_days: f64,
    pub average_combats: f64,
}

pub fn summarize(games: &[GameRecord]) -> Summary {
    if games.is_empty() {
        return Summary::default();
    }
    let n = games.len() as f64;
    Summary {
        games: games.len(),
        rebel_wins: games.iter().filter(|g| g.winner == Some(Side::Rebel)).count(),
        dictator_wins: games.iter().filter(|g| g.winner == Some(Side::Dictator)).count(),
        unfinished: games.iter().filter(|g| g.winner.is_none()).count(),
        average_days: games.iter().map(|g| f64::from(g.days)).sum::<f64>() / n,
        average_combats: games.iter().map(|g| g.combats.len() as f64).sum::<f64>() / n,
    }
}

/// Prints win rates and averages to stderr.
pub fn print_summary(games: &[GameRecord]) {
    let s = summarize(games);
    if s.games == 0 {
        eprintln!("No games played.");
        return;
    }
    let pct = |k: usize| 100.0 * k as f64 / s.games as f64;
    eprintln!("Results over {} games:", s.games);
    eprintln!("  rebels   {:>4} ({:.1}%)", s.rebel_wins, pct(s.rebel_wins));
    eprintln!("  dictator {:>4} ({:.1}%)", s.dictator_wins, pct(s.dictator_wins));
    if s.unfinished > 0 {
        eprintln!("  unfinished {:>2}", s.unfinished);
    }
    eprintln!("  average {:.1} days, {:.1} combats per game", s.average_days, s.average_combats);
}
