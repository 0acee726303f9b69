//! CSV export of the daily history.
//!
//! Writes one row per journaled day, including the recovery score as
//! computed for the supplied profile, so the history can be pruned or
//! analyzed outside the app.

use crate::journal::Journal;
use crate::scoring::recovery_score;
use crate::types::UserProfile;
use crate::Result;
use chrono::NaiveDate;
use std::fs::OpenOptions;
use std::path::Path;

/// A row in the CSV output
#[derive(Debug, serde::Serialize)]
struct CsvRow {
    date: NaiveDate,
    calories: u32,
    water_liters: f64,
    sleep_hours: f64,
    steps: u32,
    vitamins: bool,
    meals: usize,
    activities: usize,
    recovery_score: f64,
}

/// Export every journaled day up to and including `until` to CSV.
///
/// Appends to an existing file (headers are only written when the file
/// is empty) and syncs before returning. Returns the number of rows
/// written.
pub fn history_to_csv(
    journal: &Journal,
    profile: &UserProfile,
    until: NaiveDate,
    csv_path: &Path,
) -> Result<usize> {
    let mut days = journal.recent(until, journal.len());
    if days.is_empty() {
        tracing::info!("No journal days to export");
        return Ok(0);
    }
    // recent() returns newest first; the export reads better oldest first
    days.reverse();

    // Ensure parent directory exists
    if let Some(parent) = csv_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(csv_path)?;

    let needs_headers = file.metadata()?.len() == 0;

    let mut writer = csv::WriterBuilder::new()
        .has_headers(needs_headers)
        .from_writer(file);

    for day in &days {
        let stats = recovery_score(Some(day), profile);
        writer.serialize(CsvRow {
            date: day.date,
            calories: day.calories,
            water_liters: day.water_liters,
            sleep_hours: day.sleep_hours,
            steps: day.steps,
            vitamins: day.vitamins_taken,
            meals: day.meals.len(),
            activities: day.activities.len(),
            recovery_score: stats.score,
        })?;
    }

    writer.flush()?;
    let file = writer
        .into_inner()
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;
    file.sync_all()?;

    tracing::info!("Wrote {} days to CSV", days.len());
    Ok(days.len())
}
