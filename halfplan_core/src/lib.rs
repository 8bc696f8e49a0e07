#![forbid(unsafe_code)]

//! Core domain model and business logic for the halfplan training tracker.
//!
//! This crate provides:
//! - Domain types (settings, planned workouts, activities)
//! - Calendar mapping between plan weeks and dates
//! - Plan generation from the 12-week template arc
//! - Activity linking, weekly adaptation and rescheduling
//! - Persistence (plan state file, JSONL activity log, CSV export)
//! - Webhook ingestion and the run analysis seam

pub mod types;
pub mod error;
pub mod config;
pub mod logging;
pub mod calendar;
pub mod templates;
pub mod plan;
pub mod store;
pub mod state;
pub mod activity_log;
pub mod linker;
pub mod adaptation;
pub mod reschedule;
pub mod ingest;
pub mod history;
pub mod analysis;
pub mod export;
pub mod tracker;

// Re-export commonly used types
pub use error::{Error, ErrorKind, Result};
pub use types::*;
pub use config::Config;
pub use plan::{generate_plan, PlanLength};
pub use store::{ActivityStore, SettingsStore, WorkoutFilter, WorkoutPatch, WorkoutStore};
pub use state::PlanState;
pub use activity_log::ActivityLog;
pub use linker::link_activity;
pub use adaptation::{analyze_and_adapt, apply_adaptations, regenerate_plan, weekly_stats};
pub use reschedule::reschedule;
pub use ingest::{ingest, IngestOutcome, WebhookPayload};
pub use analysis::{analyze_or_placeholder, AnalysisContext, RunAnalysis, RunAnalyzer};
pub use tracker::{clear_all, plan_overview, reset_plan, save_settings, SettingsInput};
