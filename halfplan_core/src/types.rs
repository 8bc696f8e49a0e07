//! Core domain types for the half-marathon training tracker.
//!
//! This module defines the fundamental types used throughout the system:
//! - Race settings
//! - Planned workouts and the data used to create them
//! - Recorded activities
//! - Derived weekly statistics and adaptation results

use chrono::{DateTime, FixedOffset, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub type WorkoutId = u64;
pub type ActivityId = u64;

/// Official half-marathon distance in km
pub const HALF_MARATHON_KM: f64 = 21.1;

/// Description given to rest days inserted when a workout moves away
pub const MOVED_REST_DESCRIPTION: &str = "Rest day (workout moved)";

const DAY_NAMES: [&str; 7] = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];

/// Short weekday name for a 0 = Sunday day index
pub fn day_name(day_of_week: u8) -> &'static str {
    DAY_NAMES
        .get(usize::from(day_of_week))
        .copied()
        .unwrap_or("???")
}

// ============================================================================
// Settings
// ============================================================================

/// Race settings singleton
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Settings {
    pub race_date: NaiveDate,
    pub race_name: Option<String>,
    #[serde(default = "default_weekly_goal")]
    pub weekly_goal: u32,
}

pub(crate) fn default_weekly_goal() -> u32 {
    4
}

// ============================================================================
// Planned workouts
// ============================================================================

/// Kind of planned workout
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum WorkoutType {
    Easy,
    Tempo,
    Long,
    Interval,
    Rest,
    Recovery,
}

impl WorkoutType {
    pub fn is_rest(self) -> bool {
        self == WorkoutType::Rest
    }

    pub fn as_str(self) -> &'static str {
        match self {
            WorkoutType::Easy => "easy",
            WorkoutType::Tempo => "tempo",
            WorkoutType::Long => "long",
            WorkoutType::Interval => "interval",
            WorkoutType::Rest => "rest",
            WorkoutType::Recovery => "recovery",
        }
    }
}

impl fmt::Display for WorkoutType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for WorkoutType {
    type Err = crate::Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        match s.to_lowercase().as_str() {
            "easy" => Ok(WorkoutType::Easy),
            "tempo" => Ok(WorkoutType::Tempo),
            "long" => Ok(WorkoutType::Long),
            "interval" => Ok(WorkoutType::Interval),
            "rest" => Ok(WorkoutType::Rest),
            "recovery" => Ok(WorkoutType::Recovery),
            other => Err(crate::Error::Validation(format!(
                "unknown workout type '{}'",
                other
            ))),
        }
    }
}

/// A workout as emitted by the plan generator, before it has an identity
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct PlannedWorkoutData {
    pub week_number: u32,
    pub day_of_week: u8,
    #[serde(rename = "type")]
    pub kind: WorkoutType,
    pub distance: Option<f64>,
    pub duration: Option<u32>,
    pub description: String,
}

impl PlannedWorkoutData {
    /// Rest entry that keeps a vacated slot occupied
    pub fn rest_placeholder(week_number: u32, day_of_week: u8) -> Self {
        Self {
            week_number,
            day_of_week,
            kind: WorkoutType::Rest,
            distance: None,
            duration: None,
            description: MOVED_REST_DESCRIPTION.into(),
        }
    }
}

/// A persisted planned workout
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct PlannedWorkout {
    pub id: WorkoutId,
    pub week_number: u32,
    pub day_of_week: u8,
    #[serde(rename = "type")]
    pub kind: WorkoutType,
    pub distance: Option<f64>,
    pub duration: Option<u32>,
    pub description: String,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub activity_id: Option<ActivityId>,
    /// Distance as generated, before any volume adaptation
    #[serde(default)]
    pub base_distance: Option<f64>,
    /// Duration as generated, before any volume adaptation
    #[serde(default)]
    pub base_duration: Option<u32>,
}

impl PlannedWorkout {
    pub fn from_data(id: WorkoutId, data: PlannedWorkoutData) -> Self {
        Self {
            id,
            week_number: data.week_number,
            day_of_week: data.day_of_week,
            kind: data.kind,
            distance: data.distance,
            duration: data.duration,
            description: data.description,
            completed: false,
            activity_id: None,
            base_distance: data.distance,
            base_duration: data.duration,
        }
    }

    pub fn is_rest(&self) -> bool {
        self.kind.is_rest()
    }

    /// (week, day) coordinates of this workout
    pub fn slot(&self) -> (u32, u8) {
        (self.week_number, self.day_of_week)
    }
}

// ============================================================================
// Activities
// ============================================================================

/// A recorded activity, as received from the fitness platform
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Activity {
    pub id: ActivityId,
    /// External platform identity used for deduplication
    #[serde(alias = "strava_id")]
    pub external_id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub name: String,
    /// Meters
    pub distance: f64,
    /// Seconds of moving time
    pub duration: u32,
    pub avg_heart_rate: Option<u16>,
    pub max_heart_rate: Option<u16>,
    /// Minutes per km
    pub avg_pace: Option<f64>,
    pub calories: Option<u32>,
    pub date: DateTime<FixedOffset>,
}

impl Activity {
    pub fn from_new(id: ActivityId, new: NewActivity) -> Self {
        Self {
            id,
            external_id: new.external_id,
            kind: new.kind,
            name: new.name,
            distance: new.distance,
            duration: new.duration,
            avg_heart_rate: new.avg_heart_rate,
            max_heart_rate: new.max_heart_rate,
            avg_pace: new.avg_pace,
            calories: new.calories,
            date: new.date,
        }
    }

    pub fn is_run(&self) -> bool {
        self.kind == "Run"
    }

    pub fn distance_km(&self) -> f64 {
        self.distance / 1000.0
    }

    /// Local calendar day the activity started on
    pub fn local_day(&self) -> NaiveDate {
        crate::calendar::local_day(&self.date)
    }
}

/// Activity fields supplied on creation; the store assigns the id
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct NewActivity {
    pub external_id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub name: String,
    pub distance: f64,
    pub duration: u32,
    pub avg_heart_rate: Option<u16>,
    pub max_heart_rate: Option<u16>,
    pub avg_pace: Option<f64>,
    pub calories: Option<u32>,
    pub date: DateTime<FixedOffset>,
}

// ============================================================================
// Derived adaptation types
// ============================================================================

/// Completion and heart-rate summary for one plan week
#[derive(Clone, Debug, Default, Serialize, PartialEq)]
pub struct WeeklyStats {
    pub planned_workouts: u32,
    pub completed_workouts: u32,
    pub completion_rate: f64,
    /// km
    pub total_planned_distance: f64,
    /// km
    pub total_actual_distance: f64,
    pub avg_heart_rate: Option<f64>,
    pub previous_week_avg_hr: Option<f64>,
}

/// Volume adjustments derived from a week's statistics
#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct AdaptationResult {
    pub adjustments: Vec<String>,
    pub volume_multiplier: f64,
    pub add_recovery_day: bool,
}

impl Default for AdaptationResult {
    fn default() -> Self {
        Self {
            adjustments: Vec::new(),
            volume_multiplier: 1.0,
            add_recovery_day: false,
        }
    }
}
