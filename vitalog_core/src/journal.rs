//! Daily record journal.
//!
//! One `DailyRecord` per calendar day, created zeroed on first write and
//! mutated additively. Mutations return the progress delta they caused so
//! the caller can route it to the challenge engine when the active
//! challenge tracks that metric.

use crate::store::{load_or_default, save_document, StateStore};
use crate::types::{Activity, ActivityKind, DailyRecord, Meal};
use crate::Result;
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime};
use std::collections::BTreeMap;
use uuid::Uuid;

/// Document key for the persisted day map
const HISTORY_KEY: &str = "history";

/// Fields for a meal about to be logged; the journal allocates the id
/// and stamps the timestamp
#[derive(Clone, Debug)]
pub struct NewMeal {
    pub name: String,
    pub weight_grams: u32,
    pub calories: u32,
    pub proteins_g: f64,
    pub fats_g: f64,
    pub carbs_g: f64,
    pub fiber_g: f64,
}

/// The journal of daily records, persisted as one JSON document
pub struct Journal {
    days: BTreeMap<NaiveDate, DailyRecord>,
    store: Box<dyn StateStore>,
}

impl Journal {
    /// Open the journal, loading any persisted history
    pub fn open(store: Box<dyn StateStore>) -> Result<Self> {
        let days = load_or_default(store.as_ref(), HISTORY_KEY)?;
        Ok(Self { days, store })
    }

    /// Record for a day, if one has been written
    pub fn record_for(&self, date: NaiveDate) -> Option<&DailyRecord> {
        self.days.get(&date)
    }

    /// Number of days with a record
    pub fn len(&self) -> usize {
        self.days.len()
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    /// The last `n` records on or before `before`, newest first
    pub fn recent(&self, before: NaiveDate, n: usize) -> Vec<&DailyRecord> {
        self.days
            .range(..=before)
            .rev()
            .take(n)
            .map(|(_, record)| record)
            .collect()
    }

    fn day_mut(&mut self, date: NaiveDate) -> &mut DailyRecord {
        self.days
            .entry(date)
            .or_insert_with(|| DailyRecord::empty(date))
    }

    fn flush(&self) -> Result<()> {
        save_document(self.store.as_ref(), HISTORY_KEY, &self.days)
    }

    /// Log a meal. Day calories are kept as the sum of meal calories.
    /// Returns the stored meal; its calorie count is the progress delta
    /// for calorie challenges.
    pub fn add_meal(
        &mut self,
        date: NaiveDate,
        meal: NewMeal,
        at: DateTime<FixedOffset>,
    ) -> Result<Meal> {
        let stored = Meal {
            id: Uuid::new_v4(),
            name: meal.name,
            weight_grams: meal.weight_grams,
            calories: meal.calories,
            proteins_g: meal.proteins_g,
            fats_g: meal.fats_g,
            carbs_g: meal.carbs_g,
            fiber_g: meal.fiber_g,
            timestamp: at,
        };

        let day = self.day_mut(date);
        day.meals.push(stored.clone());
        day.calories = day.meals.iter().map(|m| m.calories).sum();

        self.flush()?;
        Ok(stored)
    }

    /// Delete a meal as a whole. Returns false if the id is unknown.
    pub fn delete_meal(&mut self, date: NaiveDate, meal_id: Uuid) -> Result<bool> {
        let Some(day) = self.days.get_mut(&date) else {
            return Ok(false);
        };

        let before = day.meals.len();
        day.meals.retain(|m| m.id != meal_id);
        if day.meals.len() == before {
            return Ok(false);
        }

        day.calories = day.meals.iter().map(|m| m.calories).sum();
        self.flush()?;
        Ok(true)
    }

    /// Log an activity; calorie burn is derived from the fixed
    /// per-minute rate for its kind
    pub fn add_activity(
        &mut self,
        date: NaiveDate,
        kind: ActivityKind,
        duration_minutes: u32,
        at: DateTime<FixedOffset>,
    ) -> Result<Activity> {
        let stored = Activity {
            id: Uuid::new_v4(),
            kind,
            duration_minutes,
            calories_burned: duration_minutes * kind.kcal_per_minute(),
            timestamp: at,
        };

        self.day_mut(date).activities.push(stored.clone());
        self.flush()?;
        Ok(stored)
    }

    /// Add water in liters. Non-positive amounts are ignored. Returns
    /// the delta actually applied.
    pub fn add_water(&mut self, date: NaiveDate, liters: f64) -> Result<f64> {
        if liters <= 0.0 {
            return Ok(0.0);
        }

        self.day_mut(date).water_liters += liters;
        self.flush()?;
        Ok(liters)
    }

    /// Update the day's cumulative step count from the motion source.
    ///
    /// The step source is monotonic within a day; a count at or below
    /// the stored value is ignored. Returns the increase.
    pub fn set_steps(&mut self, date: NaiveDate, count: u32) -> Result<u32> {
        let day = self.day_mut(date);
        if count <= day.steps {
            return Ok(0);
        }

        let delta = count - day.steps;
        day.steps = count;
        self.flush()?;
        Ok(delta)
    }

    /// Record the night's sleep for a day
    pub fn set_sleep(
        &mut self,
        date: NaiveDate,
        start: NaiveTime,
        end: NaiveTime,
        hours: f64,
    ) -> Result<()> {
        let day = self.day_mut(date);
        day.sleep_start = start;
        day.sleep_end = end;
        day.sleep_hours = hours;
        self.flush()
    }

    /// Mark vitamins taken (or not) for a day
    pub fn set_vitamins(&mut self, date: NaiveDate, taken: bool) -> Result<()> {
        self.day_mut(date).vitamins_taken = taken;
        self.flush()
    }
}
