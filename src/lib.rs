//! PADDOCK: headless-browser wager placement
//!
//! Library crate exposing all modules for use by integration tests
//! and the binary entry point.

pub mod api;
pub mod config;
pub mod engine;
pub mod session;
pub mod surface;
pub mod types;
