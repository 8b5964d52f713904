//! Advisor Match - client-to-advisor matching and scoring engine
//!
//! Scores every (client, advisor) pair by weighted skill coverage over a
//! two-level taxonomy, gates lead assignments on advisor capacity, and ranks
//! candidates into explainable match runs.

pub mod config;
pub mod core;
pub mod models;
pub mod routes;
pub mod services;

// Re-export commonly used types
pub use core::{DataWarning, MatchError, Matcher, RunSpec, ScoringParams, Taxonomy};
pub use models::{Advisor, Client, Explanation, MatchResult, MatchRun, Role};
