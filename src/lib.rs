//! Sectorwar rules engine library.
//!
//! Exposes the board model, content registry, combat engine, turn-flow
//! orchestrator, and AI policy for use by integration tests, benches, and
//! the self-play binary.

pub mod actions;
pub mod ai;
pub mod board;
pub mod combat;
pub mod config;
pub mod error;
pub mod flow;
pub mod game;
pub mod registry;
pub mod replay;
pub mod selfplay;
pub mod setup;

pub use error::{ActionError, SetupError};
pub use game::Game;
