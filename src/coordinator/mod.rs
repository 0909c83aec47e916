//! Coordinator module
//!
//! Spawns executors, releases them together and aggregates their results.

pub mod session;

pub use session::{RunOptions, Session};
