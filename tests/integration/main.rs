//! End-to-end scenarios against a deterministic in-memory race page.

mod api;
mod fake_surface;
mod orchestrator;
