//! Context assembly for the external text-generation collaborator.
//!
//! Chat, predictions and reminders are produced by an external service;
//! the core only decides what data that service may see: the profile,
//! today's record and the last few day summaries with their recovery
//! scores. No generation or transport happens here.

use crate::journal::Journal;
use crate::scoring::recovery_score;
use crate::types::{DailyRecord, UserProfile};
use crate::Result;
use chrono::NaiveDate;
use serde::Serialize;

/// Condensed view of one journaled day
#[derive(Clone, Debug, Serialize)]
pub struct DaySummary {
    pub date: NaiveDate,
    pub calories: u32,
    pub water_liters: f64,
    pub sleep_hours: f64,
    pub steps: u32,
    pub vitamins_taken: bool,
    pub recovery_score: f64,
}

impl DaySummary {
    fn from_record(record: &DailyRecord, profile: &UserProfile) -> Self {
        Self {
            date: record.date,
            calories: record.calories,
            water_liters: record.water_liters,
            sleep_hours: record.sleep_hours,
            steps: record.steps,
            vitamins_taken: record.vitamins_taken,
            recovery_score: recovery_score(Some(record), profile).score,
        }
    }
}

/// Everything the text-generation service is given as context
#[derive(Clone, Debug, Serialize)]
pub struct AdvisorContext {
    pub profile: UserProfile,
    pub today: Option<DailyRecord>,
    pub history: Vec<DaySummary>,
}

impl AdvisorContext {
    /// Collect the profile, today's record and the last `days` day
    /// summaries (today included), newest first
    pub fn collect(
        profile: &UserProfile,
        journal: &Journal,
        today: NaiveDate,
        days: usize,
    ) -> Self {
        let history = journal
            .recent(today, days)
            .into_iter()
            .map(|record| DaySummary::from_record(record, profile))
            .collect();

        Self {
            profile: profile.clone(),
            today: journal.record_for(today).cloned(),
            history,
        }
    }

    /// The context as a JSON document, ready to embed in a prompt
    pub fn to_json(&self) -> Result<serde_json::Value> {
        Ok(serde_json::to_value(self)?)
    }
}
