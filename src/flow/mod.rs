//! Turn flow: who acts when, and what runs between player inputs.

pub mod batching;
pub mod coordinated;
pub mod orchestrator;

pub use batching::RebelBatching;
pub use coordinated::CoordinatedAttack;
pub use orchestrator::{awaiting, FlowState, PendingCombat, Step};
