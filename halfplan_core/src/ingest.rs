//! Ingestion of completed-run webhook payloads.
//!
//! Fitness-platform automations send numeric fields either as JSON numbers
//! or as strings, so every numeric field accepts both.

use crate::adaptation::regenerate_plan;
use crate::linker::link_activity;
use crate::store::{ActivityStore, WorkoutFilter, WorkoutStore};
use crate::types::{Activity, AdaptationResult, NewActivity, PlannedWorkout, Settings};
use crate::{Error, Result};
use chrono::{DateTime, FixedOffset, Local, NaiveDate, TimeZone};
use serde::{Deserialize, Serialize};

/// A JSON value that may be a number or a numeric string
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum Loose {
    Number(f64),
    Text(String),
}

impl Loose {
    fn as_f64(&self, field: &str) -> Result<f64> {
        let value = match self {
            Loose::Number(n) => *n,
            Loose::Text(s) => s.trim().parse::<f64>().map_err(|_| {
                Error::Validation(format!("{} must be numeric, got '{}'", field, s))
            })?,
        };
        if value.is_finite() {
            Ok(value)
        } else {
            Err(Error::Validation(format!("{} must be finite", field)))
        }
    }

    fn as_text(&self) -> String {
        match self {
            Loose::Number(n) if n.fract() == 0.0 => format!("{}", *n as i64),
            Loose::Number(n) => n.to_string(),
            Loose::Text(s) => s.trim().to_string(),
        }
    }
}

/// Webhook body describing one completed activity
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct WebhookPayload {
    pub activity_id: Option<Loose>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub name: Option<String>,
    /// Meters
    pub distance: Option<Loose>,
    /// Seconds
    pub moving_time: Option<Loose>,
    pub elapsed_time: Option<Loose>,
    pub start_date: Option<String>,
    pub average_heartrate: Option<Loose>,
    pub max_heartrate: Option<Loose>,
    pub calories: Option<Loose>,
}

fn required<'a, T>(value: &'a Option<T>, field: &str) -> Result<&'a T> {
    value
        .as_ref()
        .ok_or_else(|| Error::Validation(format!("missing required field: {}", field)))
}

fn optional_bpm(value: &Option<Loose>, field: &str) -> Result<Option<u16>> {
    value
        .as_ref()
        .map(|v| v.as_f64(field))
        .transpose()
        .map(|bpm| bpm.filter(|b| *b > 0.0).map(|b| b.round() as u16))
}

/// Parse a start timestamp; a bare date is taken at local noon
pub fn parse_start(input: &str) -> Result<DateTime<FixedOffset>> {
    let trimmed = input.trim();
    if let Ok(instant) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(instant);
    }
    let noon = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .ok()
        .and_then(|day| day.and_hms_opt(12, 0, 0));
    if let Some(local) = noon.and_then(|n| Local.from_local_datetime(&n).earliest()) {
        return Ok(local.into());
    }
    Err(Error::Validation(format!(
        "start_date '{}' is not an RFC 3339 timestamp",
        input
    )))
}

impl WebhookPayload {
    /// Validate the payload and convert it into an activity record
    pub fn normalize(&self) -> Result<NewActivity> {
        let external_id = required(&self.activity_id, "activity_id")?.as_text();
        if external_id.is_empty() {
            return Err(Error::Validation("activity_id must not be empty".into()));
        }
        let kind = required(&self.kind, "type")?.trim().to_string();
        if kind.is_empty() {
            return Err(Error::Validation("type must not be empty".into()));
        }
        let distance = required(&self.distance, "distance")?.as_f64("distance")?;
        let moving_time = required(&self.moving_time, "moving_time")?.as_f64("moving_time")?;
        let date = parse_start(required(&self.start_date, "start_date")?)?;

        if distance < 0.0 || moving_time < 0.0 {
            return Err(Error::Validation(
                "distance and moving_time must not be negative".into(),
            ));
        }
        let duration = moving_time.round() as u32;

        let distance_km = distance / 1000.0;
        let avg_pace = (distance_km > 0.0).then(|| (f64::from(duration) / 60.0) / distance_km);

        let calories = self
            .calories
            .as_ref()
            .map(|c| c.as_f64("calories"))
            .transpose()?
            .map(|c| c.max(0.0).round() as u32);

        Ok(NewActivity {
            external_id,
            kind,
            name: self
                .name
                .as_deref()
                .map(str::trim)
                .filter(|n| !n.is_empty())
                .unwrap_or("Untitled Activity")
                .to_string(),
            distance,
            duration,
            avg_heart_rate: optional_bpm(&self.average_heartrate, "average_heartrate")?,
            max_heart_rate: optional_bpm(&self.max_heartrate, "max_heartrate")?,
            avg_pace,
            calories,
            date,
        })
    }
}

/// What happened to an ingested payload
#[derive(Clone, Debug, PartialEq)]
pub enum IngestOutcome {
    Created {
        activity: Activity,
        linked: Option<PlannedWorkout>,
        adaptation: Option<AdaptationResult>,
    },
    /// The external id was already recorded. `relinked` is set when the
    /// stored run had been left unlinked and redelivery linked it.
    Duplicate {
        id: u64,
        relinked: Option<PlannedWorkout>,
    },
}

/// Record an activity and, for runs, link it and adapt the plan
///
/// The activity is appended before workout changes are committed. If that
/// commit fails the run stays recorded but unlinked, and a redelivery of the
/// same event links it instead of being dropped as a plain duplicate.
pub fn ingest<W, A>(
    payload: &WebhookPayload,
    settings: Option<&Settings>,
    workouts: &mut W,
    activities: &mut A,
) -> Result<IngestOutcome>
where
    W: WorkoutStore + Clone,
    A: ActivityStore,
{
    let record = payload.normalize()?;

    if let Some(existing) = activities.find_by_external_id(&record.external_id)? {
        tracing::info!(
            "Activity {} already recorded as {}",
            record.external_id,
            existing.id
        );
        return redeliver(existing, settings, workouts, &*activities);
    }

    let activity = match activities.create(record) {
        Ok(activity) => activity,
        // lost a race with a concurrent ingest of the same event
        Err(Error::DuplicateActivity(external_id)) => {
            let existing = activities
                .find_by_external_id(&external_id)?
                .ok_or(Error::DuplicateActivity(external_id))?;
            return redeliver(existing, settings, workouts, &*activities);
        }
        Err(e) => return Err(e),
    };

    if !activity.is_run() {
        tracing::info!(
            "Activity {} is a {}, not linking",
            activity.id,
            activity.kind
        );
        return Ok(IngestOutcome::Created {
            activity,
            linked: None,
            adaptation: None,
        });
    }

    let (linked, adaptation) = workouts.atomically(|staged| {
        let linked = link_activity(settings, staged, activity.id, activity.local_day())?;
        let adaptation = regenerate_plan(settings, staged, &*activities)?;
        Ok((linked, adaptation))
    })?;

    Ok(IngestOutcome::Created {
        activity,
        linked,
        adaptation,
    })
}

/// Link a stored run that no workout references yet; otherwise change nothing
fn redeliver<W, A>(
    existing: Activity,
    settings: Option<&Settings>,
    workouts: &mut W,
    activities: &A,
) -> Result<IngestOutcome>
where
    W: WorkoutStore + Clone,
    A: ActivityStore,
{
    let already_linked = workouts
        .list(&WorkoutFilter::all())?
        .iter()
        .any(|w| w.activity_id == Some(existing.id));
    if !existing.is_run() || already_linked {
        return Ok(IngestOutcome::Duplicate {
            id: existing.id,
            relinked: None,
        });
    }

    let relinked = workouts.atomically(|staged| {
        let linked = link_activity(settings, staged, existing.id, existing.local_day())?;
        if linked.is_some() {
            regenerate_plan(settings, staged, activities)?;
        }
        Ok(linked)
    })?;
    if let Some(workout) = &relinked {
        tracing::info!(
            "Relinked activity {} to workout {}",
            existing.id,
            workout.id
        );
    }

    Ok(IngestOutcome::Duplicate {
        id: existing.id,
        relinked,
    })
}
