//! Error types for the halfplan_core library.

use chrono::NaiveDate;
use std::io;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for halfplan_core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// IO error occurred
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// TOML parsing error
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Configuration validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Malformed or missing input
    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Workout {0} not found")]
    WorkoutNotFound(u64),

    #[error("Activity {0} not found")]
    ActivityNotFound(u64),

    /// No race has been set up yet
    #[error("No settings found. Set up your race date first.")]
    SettingsMissing,

    #[error("Cannot reschedule completed workout {0}")]
    AlreadyCompleted(u64),

    /// Target date resolves to no week of the current plan
    #[error("Cannot reschedule outside of training plan dates ({0})")]
    OutOfRange(NaiveDate),

    #[error("There is already a workout scheduled for week {week}, day {day} (workout {existing})")]
    SlotConflict { week: u32, day: u8, existing: u64 },

    /// An activity with the same external id was already recorded
    #[error("Activity with external id {0} already exists")]
    DuplicateActivity(String),

    /// Built-in workout templates are inconsistent
    #[error("Template validation error: {0}")]
    TemplateValidation(String),

    /// External analysis collaborator failed or is not configured
    #[error("Analysis unavailable: {0}")]
    Analysis(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

/// Coarse classification used at the command boundary
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    NotFound,
    Conflict,
    Dependency,
    Internal,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Validation(_) | Error::Config(_) | Error::Toml(_) => ErrorKind::Validation,
            Error::WorkoutNotFound(_) | Error::ActivityNotFound(_) | Error::SettingsMissing => {
                ErrorKind::NotFound
            }
            Error::AlreadyCompleted(_)
            | Error::OutOfRange(_)
            | Error::SlotConflict { .. }
            | Error::DuplicateActivity(_) => ErrorKind::Conflict,
            Error::Analysis(_) => ErrorKind::Dependency,
            Error::Io(_)
            | Error::Json(_)
            | Error::Csv(_)
            | Error::TemplateValidation(_)
            | Error::Other(_) => ErrorKind::Internal,
        }
    }
}
