//! Recovery scorer: a day's logged data plus the user profile mapped to
//! a 0-100 score with a per-factor breakdown.
//!
//! All functions here are pure. Malformed inputs (zero-height profile,
//! empty record) degrade to zero contributions instead of failing, so
//! the score is total over whatever the host hands in.

use crate::types::{DailyRecord, Gender, Goal, RecoveryStats, UserProfile};
use chrono::Timelike;

/// Late-dinner cutoff: any meal at 21:31 or later flags the penalty
const LATE_DINNER_HOUR: u32 = 21;
const LATE_DINNER_MINUTE: u32 = 30;
const LATE_DINNER_PENALTY: f64 = 7.0;

/// Basal metabolic rate via Mifflin-St Jeor, rounded to whole kcal
pub fn basal_metabolic_rate(profile: &UserProfile) -> i32 {
    let base =
        10.0 * profile.weight_kg + 6.25 * profile.height_cm - 5.0 * f64::from(profile.age);
    let adjusted = match profile.gender {
        Gender::Male => base + 5.0,
        Gender::Female => base - 161.0,
    };
    adjusted.round() as i32
}

/// Daily calorie target: BMR scaled by a fixed sedentary multiplier,
/// then shifted 500 kcal down/up for a loss/gain goal
pub fn daily_calorie_target(profile: &UserProfile) -> i32 {
    let tdee = f64::from(basal_metabolic_rate(profile)) * 1.2;
    let target = match profile.goal {
        Goal::Loss => tdee - 500.0,
        Goal::Maintenance => tdee,
        Goal::Gain => tdee + 500.0,
    };
    target.round() as i32
}

/// Compute the recovery score for one day.
///
/// An absent record scores 0 with an all-zero breakdown. The weights sum
/// to 100 (sleep 40, calories 20, water 15, activity 15, vitamins 10);
/// a late dinner subtracts 7 and the result is floored at 0.
pub fn recovery_score(record: Option<&DailyRecord>, profile: &UserProfile) -> RecoveryStats {
    let mut stats = RecoveryStats::default();

    let Some(record) = record else {
        return stats;
    };

    // 1. Sleep (0-40). The target window is bed by 23:00 and wake in the
    // morning hours, i.e. the hour landing in [2, 12) after the
    // overnight crossing.
    let start = record.sleep_start;
    let end = record.sleep_end;
    let early_start = start.hour() < 23 || (start.hour() == 23 && start.minute() == 0);
    let late_end = end.hour() >= 2 && end.hour() < 12;
    let in_interval = early_start && late_end;

    stats.breakdown.sleep = if record.sleep_hours >= 8.0 && in_interval {
        40.0
    } else if record.sleep_hours < 6.0 || !in_interval {
        10.0
    } else {
        let hour_bonus = ((record.sleep_hours - 6.0) * 10.0).min(20.0);
        let interval_bonus = if in_interval { 20.0 } else { 0.0 };
        10.0 + hour_bonus + interval_bonus
    };

    // 2. Calories (0-20), adherence to the daily target
    let target = daily_calorie_target(profile);
    if target > 0 {
        let ratio = f64::from(record.calories) / f64::from(target);
        stats.breakdown.calories = if (0.95..=1.05).contains(&ratio) {
            20
        } else if (1.0 - ratio).abs() > 0.3 {
            0
        } else {
            10
        };
    }

    // 3. Water (0-15)
    stats.breakdown.water = if record.water_liters >= 1.5 {
        15
    } else if record.water_liters < 0.5 {
        0
    } else {
        7
    };

    // 4. Activity (0-15), steps against the profile goal
    if profile.step_goal > 0 {
        stats.breakdown.activity = if record.steps >= profile.step_goal {
            15
        } else if record.steps < 2000 {
            0
        } else {
            let ratio = f64::from(record.steps) / f64::from(profile.step_goal);
            (ratio * 15.0).round() as u32
        };
    }

    // 5. Vitamins (0 or 10)
    if record.vitamins_taken {
        stats.breakdown.vitamins = 10;
    }

    // Penalty: any meal after 21:30 local wall-clock time
    let late_dinner = record.meals.iter().any(|meal| {
        let t = meal.timestamp.time();
        (t.hour() == LATE_DINNER_HOUR && t.minute() > LATE_DINNER_MINUTE)
            || t.hour() > LATE_DINNER_HOUR
    });
    stats.breakdown.late_dinner_penalty = late_dinner;

    let raw = stats.breakdown.sleep
        + f64::from(stats.breakdown.calories)
        + f64::from(stats.breakdown.water)
        + f64::from(stats.breakdown.activity)
        + f64::from(stats.breakdown.vitamins);

    stats.score = if late_dinner {
        (raw - LATE_DINNER_PENALTY).max(0.0)
    } else {
        raw
    };

    stats
}
