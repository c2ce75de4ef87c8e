//! Self-play game generation CLI.
//!
//! Plays AI-only games and writes one JSON record per game.
//!
//! Usage:
//!   cargo run --release --bin selfplay -- [OPTIONS]
//!
//! Options:
//!   --games N       Number of games to play (default: 10)
//!   --seed N        Base seed, 0 for entropy (default: 0)
//!   --threads N     Number of parallel threads (default: 4)
//!   --max-days N    Days before the dictator wins by holding out (default: 12)
//!   --rebels N      Number of rebel players (default: 2)
//!   --record        Include each game's action log
//!   --output FILE   Output file path (default: stdout)
//!   --quiet         Suppress progress and summary output
//!
//! Logging is controlled by `RUST_LOG` (e.g. `RUST_LOG=sectorwar=debug`).

use std::env;
use std::fs::File;
use std::io::{self, BufWriter};
use std::time::Instant;

use sectorwar::selfplay::{self, SelfPlayConfig};
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let args: Vec<String> = env::args().collect();
    let mut config = SelfPlayConfig::default();
    let mut output_path: Option<String> = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--games" => {
                i += 1;
                config.num_games = value(&args, i, "--games");
            }
            "--seed" => {
                i += 1;
                config.seed = value(&args, i, "--seed");
            }
            "--threads" => {
                i += 1;
                config.threads = value(&args, i, "--threads");
            }
            "--max-days" => {
                i += 1;
                config.max_days = value(&args, i, "--max-days");
            }
            "--rebels" => {
                i += 1;
                config.rebels = value(&args, i, "--rebels");
            }
            "--record" => {
                config.record_actions = true;
            }
            "--output" => {
                i += 1;
                output_path = Some(value(&args, i, "--output"));
            }
            "--quiet" => {
                config.quiet = true;
            }
            "--help" | "-h" => {
                print_usage();
                return;
            }
            other => {
                eprintln!("Unknown argument: {}", other);
                print_usage();
                std::process::exit(1);
            }
        }
        i += 1;
    }

    if !config.quiet {
        eprintln!(
            "Self-play: {} games, {} rebels, {} days max, {} threads",
            config.num_games, config.rebels, config.max_days, config.threads
        );
    }

    let start = Instant::now();
    let games = match selfplay::run_self_play(&config) {
        Ok(games) => games,
        Err(err) => {
            eprintln!("Cannot deal games: {err}");
            std::process::exit(1);
        }
    };
    let elapsed = start.elapsed();

    if !config.quiet {
        eprintln!(
            "Completed {} games in {:.1}s ({:.1} games/s)",
            games.len(),
            elapsed.as_secs_f64(),
            games.len() as f64 / elapsed.as_secs_f64().max(1e-9)
        );
        selfplay::print_summary(&games);
    }

    let written = match &output_path {
        Some(path) => File::create(path)
            .and_then(|file| selfplay::write_jsonl(&games, &mut BufWriter::new(file))),
        None => selfplay::write_jsonl(&games, &mut BufWriter::new(io::stdout().lock())),
    };
    if let Err(err) = written {
        eprintln!("Failed to write output: {err}");
        std::process::exit(1);
    }
    if let (Some(path), false) = (&output_path, config.quiet) {
        eprintln!("Wrote {} games to {}", games.len(), path);
    }
}

fn value<T: std::str::FromStr>(args: &[String], i: usize, flag: &str) -> T {
    match args.get(i).map(|s| s.parse()) {
        Some(Ok(v)) => v,
        _ => {
            eprintln!("invalid {flag} value");
            print_usage();
            std::process::exit(1);
        }
    }
}

fn print_usage() {
    eprintln!("Usage: selfplay [OPTIONS]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --games N        Number of games to play (default: 10)");
    eprintln!("  --seed N         Base seed, 0 for entropy (default: 0)");
    eprintln!("  --threads N      Number of parallel threads (default: 4)");
    eprintln!("  --max-days N     Days before the dictator wins (default: 12)");
    eprintln!("  --rebels N       Number of rebel players (default: 2)");
    eprintln!("  --record         Include each game's action log");
    eprintln!("  --output FILE    Output file path (default: stdout)");
    eprintln!("  --quiet          Suppress progress and summary output");
    eprintln!("  --help           Show this help");
}
