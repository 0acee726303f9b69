#![forbid(unsafe_code)]

//! Core domain model and business logic for the Vitalog health tracker.
//!
//! This crate provides:
//! - Domain types (profile, daily records, meals, activities, challenges)
//! - Recovery scorer (pure daily score with breakdown)
//! - Challenge engine (join/progress/complete lifecycle, streaks, trophies)
//! - Persistence (keyed JSON documents, config)
//! - History export and advisor context assembly

pub mod types;
pub mod error;
pub mod clock;
pub mod scoring;
pub mod catalog;
pub mod config;
pub mod logging;
pub mod store;
pub mod journal;
pub mod engine;
pub mod export;
pub mod advisor;

// Re-export commonly used types
pub use error::{Error, Result};
pub use types::*;
pub use clock::{Clock, ManualClock, SystemClock};
pub use scoring::{basal_metabolic_rate, daily_calorie_target, recovery_score};
pub use catalog::{builtin_challenges, is_builtin};
pub use config::Config;
pub use store::{JsonFileStore, MemoryStore, StateStore};
pub use journal::{Journal, NewMeal};
pub use engine::ChallengeEngine;
pub use export::history_to_csv;
pub use advisor::AdvisorContext;
