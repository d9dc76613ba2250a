//! Core engine. Per wager: balance, stake, mode, competitor, slip.

pub mod balance;
pub mod confirmer;
pub mod mode;
pub mod orchestrator;
pub mod resolver;
pub mod stake;

pub use orchestrator::Orchestrator;
