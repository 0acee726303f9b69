//! Core domain types for the Vitalog health tracker.
//!
//! This module defines the fundamental types used throughout the system:
//! - User profile (body metrics, goal, step target)
//! - Daily records and the events logged into them (meals, activities)
//! - Recovery score breakdown
//! - Challenges, participation and the gamification profile

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use uuid::Uuid;

// ============================================================================
// Profile Types
// ============================================================================

/// Biological sex used by the Mifflin-St Jeor estimate
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Gender {
    Male,
    Female,
}

/// Weight goal driving the daily calorie target
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Goal {
    Loss,
    Maintenance,
    Gain,
}

/// User body metrics and targets, supplied by value to the scorer
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UserProfile {
    pub height_cm: f64,
    pub weight_kg: f64,
    pub age: u32,
    pub gender: Gender,
    pub goal: Goal,
    pub step_goal: u32,
}

// ============================================================================
// Daily Record Types
// ============================================================================

/// Kind of logged activity
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ActivityKind {
    Walking,
    Gym,
    Running,
    Other,
}

impl ActivityKind {
    /// Burn rate in kcal per minute for this kind of activity
    pub fn kcal_per_minute(self) -> u32 {
        match self {
            ActivityKind::Gym => 7,
            ActivityKind::Running => 10,
            ActivityKind::Walking | ActivityKind::Other => 4,
        }
    }
}

/// A logged activity with derived calorie burn
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Activity {
    pub id: Uuid,
    pub kind: ActivityKind,
    pub duration_minutes: u32,
    pub calories_burned: u32,
    pub timestamp: DateTime<FixedOffset>,
}

/// A logged meal. Immutable once created; deletable only as a whole.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Meal {
    pub id: Uuid,
    pub name: String,
    pub weight_grams: u32,
    pub calories: u32,
    pub proteins_g: f64,
    pub fats_g: f64,
    pub carbs_g: f64,
    pub fiber_g: f64,
    pub timestamp: DateTime<FixedOffset>,
}

/// Everything logged for one calendar day.
///
/// One record exists per day; it is created zeroed on first write and
/// mutated additively from then on. The core never deletes records.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DailyRecord {
    pub date: NaiveDate,
    pub calories: u32,
    pub water_liters: f64,
    pub sleep_hours: f64,
    pub sleep_start: NaiveTime,
    pub sleep_end: NaiveTime,
    pub vitamins_taken: bool,
    pub steps: u32,
    pub activities: Vec<Activity>,
    pub meals: Vec<Meal>,
}

impl DailyRecord {
    /// Zeroed record for a day, as created on first write
    pub fn empty(date: NaiveDate) -> Self {
        Self {
            date,
            calories: 0,
            water_liters: 0.0,
            sleep_hours: 0.0,
            sleep_start: NaiveTime::MIN,
            sleep_end: NaiveTime::MIN,
            vitamins_taken: false,
            steps: 0,
            activities: Vec::new(),
            meals: Vec::new(),
        }
    }
}

// ============================================================================
// Recovery Score Types
// ============================================================================

/// Per-factor contribution to the recovery score
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    /// Sleep contribution, 0-40 (fractional for partial hours)
    pub sleep: f64,
    /// Calorie-target adherence, 0, 10 or 20
    pub calories: u32,
    /// Hydration, 0, 7 or 15
    pub water: u32,
    /// Step activity, 0-15
    pub activity: u32,
    /// Vitamins, 0 or 10
    pub vitamins: u32,
    /// A meal was logged after 21:30 local time
    pub late_dinner_penalty: bool,
}

/// Recovery score with its breakdown. Derived, recomputed on demand.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RecoveryStats {
    pub score: f64,
    pub breakdown: ScoreBreakdown,
}

// ============================================================================
// Challenge Types
// ============================================================================

/// Metric a challenge tracks
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ChallengeKind {
    Step,
    Calories,
    Water,
    Sleep,
    Workout,
    Custom,
    Other,
}

/// A goal-directed, time-boxed tracked metric a user can opt into
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Challenge {
    pub id: String,
    pub title: String,
    pub description: String,
    pub kind: ChallengeKind,
    pub goal_value: f64,
    pub unit: String,
    pub duration_days: u32,
    pub color: String,
    pub icon: String,
}

/// Fields for a user-created challenge; the engine allocates the id
#[derive(Clone, Debug)]
pub struct NewChallenge {
    pub title: String,
    pub description: String,
    pub kind: ChallengeKind,
    pub goal_value: f64,
    pub unit: String,
    pub duration_days: u32,
    pub color: String,
    pub icon: String,
}

/// Progress record for the single active challenge.
///
/// Created on join, discarded on leave, recreated on rejoin. Progress is
/// monotonically non-decreasing while the challenge stays active.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ChallengeParticipant {
    pub user_id: String,
    pub challenge_id: String,
    pub progress: f64,
    pub joined_at: DateTime<FixedOffset>,
}

/// Persistent gamification state: trophies, streak, completions.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct GameProfile {
    pub username: String,
    pub trophies: u32,
    pub streak: u32,
    pub last_active_date: Option<NaiveDate>,
    /// Ids that have awarded their trophy; grows only
    pub completed_challenges: BTreeSet<String>,
}
