//! CSV export of the plan and the activity log.
//!
//! Exports are written to a temp file in the target directory, synced and
//! renamed into place, so an interrupted export never leaves a truncated CSV.

use crate::calendar::workout_date;
use crate::types::{day_name, Activity, PlannedWorkout, Settings};
use crate::{Error, Result};
use std::path::Path;
use tempfile::NamedTempFile;

/// A row of the plan export
#[derive(Debug, serde::Serialize)]
struct PlanRow {
    id: u64,
    week: u32,
    day: &'static str,
    date: String,
    #[serde(rename = "type")]
    kind: &'static str,
    distance_km: Option<f64>,
    duration_min: Option<u32>,
    completed: bool,
    activity_id: Option<u64>,
    description: String,
}

/// A row of the activity export
#[derive(Debug, serde::Serialize)]
struct ActivityRow {
    id: u64,
    external_id: String,
    #[serde(rename = "type")]
    kind: String,
    name: String,
    date: String,
    distance_km: f64,
    moving_time_s: u32,
    avg_pace_min_km: Option<f64>,
    avg_hr: Option<u16>,
    max_hr: Option<u16>,
    calories: Option<u32>,
}

impl From<&Activity> for ActivityRow {
    fn from(activity: &Activity) -> Self {
        ActivityRow {
            id: activity.id,
            external_id: activity.external_id.clone(),
            kind: activity.kind.clone(),
            name: activity.name.clone(),
            date: activity.date.to_rfc3339(),
            distance_km: (activity.distance_km() * 100.0).round() / 100.0,
            moving_time_s: activity.duration,
            avg_pace_min_km: activity.avg_pace.map(|p| (p * 100.0).round() / 100.0),
            avg_hr: activity.avg_heart_rate,
            max_hr: activity.max_heart_rate,
            calories: activity.calories,
        }
    }
}

fn write_rows<R, I>(path: &Path, rows: I) -> Result<usize>
where
    R: serde::Serialize,
    I: IntoIterator<Item = R>,
{
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(parent)?;

    let temp = NamedTempFile::new_in(parent)?;
    let mut count = 0;
    {
        let mut writer = csv::Writer::from_writer(temp.as_file());
        for row in rows {
            writer.serialize(row)?;
            count += 1;
        }
        writer.flush()?;
    }
    temp.as_file().sync_all()?;
    temp.persist(path).map_err(|e| Error::Io(e.error))?;

    Ok(count)
}

/// Export planned workouts with their calendar dates, ordered by date
pub fn write_plan_csv(settings: &Settings, workouts: &[PlannedWorkout], path: &Path) -> Result<usize> {
    let total_weeks = workouts.iter().map(|w| w.week_number).max().unwrap_or(0);

    let mut dated: Vec<_> = workouts
        .iter()
        .map(|w| {
            let date = workout_date(settings.race_date, w.week_number, w.day_of_week, total_weeks);
            (date, w)
        })
        .collect();
    dated.sort_by_key(|(date, w)| (*date, w.id));

    let rows = dated.into_iter().map(|(date, w)| PlanRow {
        id: w.id,
        week: w.week_number,
        day: day_name(w.day_of_week),
        date: date.to_string(),
        kind: w.kind.as_str(),
        distance_km: w.distance,
        duration_min: w.duration,
        completed: w.completed,
        activity_id: w.activity_id,
        description: w.description.clone(),
    });

    let count = write_rows(path, rows)?;
    tracing::info!("Exported {} planned workouts to {:?}", count, path);
    Ok(count)
}

/// Export activities in the order given
pub fn write_activities_csv(activities: &[Activity], path: &Path) -> Result<usize> {
    let count = write_rows(path, activities.iter().map(ActivityRow::from))?;
    tracing::info!("Exported {} activities to {:?}", count, path);
    Ok(count)
}
