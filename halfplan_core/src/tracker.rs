//! Race settings and whole-plan lifecycle operations.

use crate::calendar::{current_week_number, workout_date};
use crate::plan::{generate_plan, PlanLength};
use crate::store::{ActivityStore, SettingsStore, WorkoutFilter, WorkoutStore};
use crate::types::{PlannedWorkout, Settings};
use crate::{Error, Result};
use chrono::NaiveDate;
use serde::Serialize;

/// Race details supplied by the user
#[derive(Clone, Debug, Default)]
pub struct SettingsInput {
    pub race_date: Option<NaiveDate>,
    pub race_name: Option<String>,
    pub weekly_goal: Option<u32>,
}

#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct SettingsOutcome {
    pub settings: Settings,
    /// No settings existed before this call
    pub created: bool,
    /// Planned workouts were (re)generated
    pub plan_regenerated: bool,
    pub workouts_created: usize,
}

/// Create or update the race settings
///
/// First-time setup generates the plan. Moving the race date discards every
/// planned workout and generates a fresh plan; other edits leave the plan
/// alone. Activities are never touched.
pub fn save_settings<S>(
    store: &mut S,
    input: SettingsInput,
    default_weekly_goal: u32,
    length: PlanLength,
    today: NaiveDate,
) -> Result<SettingsOutcome>
where
    S: WorkoutStore + SettingsStore + Clone,
{
    let race_date = input
        .race_date
        .ok_or_else(|| Error::Validation("race date is required".into()))?;
    let weekly_goal = input.weekly_goal.unwrap_or(default_weekly_goal);
    if weekly_goal < 1 {
        return Err(Error::Validation("weekly goal must be at least 1".into()));
    }
    let race_name = input
        .race_name
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty());

    let previous = store.settings()?;
    let created = previous.is_none();
    let date_changed = previous.as_ref().map_or(true, |p| p.race_date != race_date);

    let settings = Settings {
        race_date,
        race_name,
        weekly_goal,
    };

    store.atomically(|staged| {
        let saved = staged.upsert_settings(settings)?;
        let workouts_created = if date_changed {
            let removed = staged.delete_many(&WorkoutFilter::all())?;
            if removed > 0 {
                tracing::info!("Race date moved, discarded {} planned workouts", removed);
            }
            staged.create_many(generate_plan(race_date, today, length))?
        } else {
            0
        };

        tracing::info!(
            "Saved settings for race on {} ({} workouts generated)",
            race_date,
            workouts_created
        );

        Ok(SettingsOutcome {
            settings: saved,
            created,
            plan_regenerated: date_changed,
            workouts_created,
        })
    })
}

/// A planned workout with its calendar date
#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct ScheduledWorkout {
    pub date: NaiveDate,
    #[serde(flatten)]
    pub workout: PlannedWorkout,
}

#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct PlanOverview {
    pub race_date: NaiveDate,
    pub race_name: Option<String>,
    pub weekly_goal: u32,
    pub current_week: u32,
    pub total_weeks: u32,
    /// Runs completed in `current_week`
    pub completed_this_week: u32,
    pub workouts: Vec<ScheduledWorkout>,
}

/// The dated plan, optionally limited to one week
///
/// An empty store is populated with the full plan first.
pub fn plan_overview<S>(store: &mut S, week: Option<u32>, today: NaiveDate) -> Result<PlanOverview>
where
    S: WorkoutStore + SettingsStore,
{
    let settings = store.settings()?.ok_or(Error::SettingsMissing)?;

    let total_weeks = match store.total_weeks()? {
        Some(total) => total,
        None => {
            let created =
                store.create_many(generate_plan(settings.race_date, today, PlanLength::Full))?;
            tracing::info!("Plan was empty, generated {} workouts", created);
            store.total_weeks()?.unwrap_or(0)
        }
    };

    let current_week = current_week_number(settings.race_date, total_weeks, today);

    let completed_this_week = store
        .list(&WorkoutFilter::all().week(current_week).completed(true))?
        .iter()
        .filter(|w| !w.is_rest())
        .count() as u32;

    let filter = match week {
        Some(w) => WorkoutFilter::all().week(w),
        None => WorkoutFilter::all(),
    };
    let mut workouts: Vec<ScheduledWorkout> = store
        .list(&filter)?
        .into_iter()
        .map(|workout| ScheduledWorkout {
            date: workout_date(
                settings.race_date,
                workout.week_number,
                workout.day_of_week,
                total_weeks,
            ),
            workout,
        })
        .collect();
    workouts.sort_by_key(|s| (s.date, s.workout.id));

    Ok(PlanOverview {
        race_date: settings.race_date,
        race_name: settings.race_name,
        weekly_goal: settings.weekly_goal,
        current_week,
        total_weeks,
        completed_this_week,
        workouts,
    })
}

/// Discard every planned workout and rebuild the plan from settings
///
/// Without settings the plan is left empty. Returns the number of workouts
/// generated.
pub fn reset_plan<S>(store: &mut S, length: PlanLength, today: NaiveDate) -> Result<usize>
where
    S: WorkoutStore + SettingsStore + Clone,
{
    let settings = store.settings()?;
    store.atomically(|staged| {
        let removed = staged.delete_many(&WorkoutFilter::all())?;
        let created = match &settings {
            Some(s) => staged.create_many(generate_plan(s.race_date, today, length))?,
            None => 0,
        };
        tracing::info!(
            "Reset plan: removed {} workouts, generated {}",
            removed,
            created
        );
        Ok(created)
    })
}

#[derive(Clone, Copy, Debug, Serialize, PartialEq, Eq)]
pub struct ClearOutcome {
    pub activities_removed: usize,
    pub workouts_created: usize,
}

/// Remove all activities and start the plan over
///
/// The plan is rebuilt in a staged copy first and only replaces `store` once
/// the activity log has been cleared, so a failing log leaves the plan as it
/// was. A plan file that then fails to save still references the removed
/// activities; running this again finishes the job.
pub fn clear_all<S, A>(
    store: &mut S,
    activities: &mut A,
    length: PlanLength,
    today: NaiveDate,
) -> Result<ClearOutcome>
where
    S: WorkoutStore + SettingsStore + Clone,
    A: ActivityStore,
{
    store.atomically(|staged| {
        let workouts_created = reset_plan(staged, length, today)?;
        let activities_removed = activities.clear()?;
        Ok(ClearOutcome {
            activities_removed,
            workouts_created,
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::PlanState;
    use crate::store::WorkoutPatch;
    use crate::types::{Activity, NewActivity, WorkoutType};
    use chrono::{DateTime, Duration};

    fn race() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 5, 3).unwrap()
    }

    fn input(race_date: NaiveDate) -> SettingsInput {
        SettingsInput {
            race_date: Some(race_date),
            race_name: Some("City Half".into()),
            weekly_goal: None,
        }
    }

    fn set_up(state: &mut PlanState) -> SettingsOutcome {
        save_settings(state, input(race()), 4, PlanLength::Full, race()).unwrap()
    }

    #[test]
    fn test_first_setup_generates_plan() {
        let mut state = PlanState::default();
        let outcome = set_up(&mut state);

        assert!(outcome.created);
        assert!(outcome.plan_regenerated);
        assert_eq!(outcome.workouts_created, 84);
        assert_eq!(outcome.settings.weekly_goal, 4);
        assert_eq!(state.workouts.len(), 84);
    }

    #[test]
    fn test_rename_keeps_plan() {
        let mut state = PlanState::default();
        set_up(&mut state);
        let before = state.workouts.clone();

        let outcome = save_settings(
            &mut state,
            SettingsInput {
                race_date: Some(race()),
                race_name: Some("  ".into()),
                weekly_goal: Some(5),
            },
            4,
            PlanLength::Full,
            race(),
        )
        .unwrap();

        assert!(!outcome.created);
        assert!(!outcome.plan_regenerated);
        assert_eq!(outcome.settings.race_name, None);
        assert_eq!(outcome.settings.weekly_goal, 5);
        assert_eq!(state.workouts, before);
    }

    #[test]
    fn test_moving_race_regenerates() {
        let mut state = PlanState::default();
        set_up(&mut state);
        let first_id = state.workouts[0].id;

        let later = race() + Duration::weeks(2);
        let outcome =
            save_settings(&mut state, input(later), 4, PlanLength::Trimmed, race()).unwrap();

        assert!(outcome.plan_regenerated);
        // two weeks out: trimmed to the four-week minimum
        assert_eq!(outcome.workouts_created, 28);
        assert_eq!(state.workouts.len(), 28);
        assert!(state.workouts.iter().all(|w| w.id != first_id));
        assert_eq!(state.settings.as_ref().unwrap().race_date, later);
    }

    #[test]
    fn test_invalid_input_leaves_store_untouched() {
        let mut state = PlanState::default();
        let err = save_settings(
            &mut state,
            SettingsInput::default(),
            4,
            PlanLength::Full,
            race(),
        )
        .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));

        let err = save_settings(
            &mut state,
            SettingsInput {
                weekly_goal: Some(0),
                ..input(race())
            },
            4,
            PlanLength::Full,
            race(),
        )
        .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
        assert!(state.settings.is_none());
        assert!(state.workouts.is_empty());
    }

    #[test]
    fn test_overview_requires_settings() {
        let mut state = PlanState::default();
        let err = plan_overview(&mut state, None, race()).unwrap_err();
        assert!(matches!(err, Error::SettingsMissing));
    }

    #[test]
    fn test_overview_dates_and_progress() {
        let mut state = PlanState::default();
        set_up(&mut state);
        let monday = race() + Duration::days(1);
        let race_week_monday = state
            .list(&WorkoutFilter::all().slot(12, 1))
            .unwrap()
            .remove(0);
        state
            .update(
                race_week_monday.id,
                &WorkoutPatch {
                    completed: Some(true),
                    ..Default::default()
                },
            )
            .unwrap();

        let overview = plan_overview(&mut state, None, monday).unwrap();
        assert_eq!(overview.total_weeks, 12);
        assert_eq!(overview.current_week, 12);
        assert_eq!(overview.completed_this_week, 1);
        assert_eq!(overview.race_name.as_deref(), Some("City Half"));
        assert_eq!(overview.workouts.len(), 84);
        assert!(overview.workouts.windows(2).all(|w| w[0].date <= w[1].date));

        // week 12 starts on race day and its taper runs on after it
        let race_day = overview
            .workouts
            .iter()
            .find(|s| s.date == race())
            .unwrap();
        assert_eq!(race_day.workout.slot(), (12, 0));
        assert_eq!(race_day.workout.kind, WorkoutType::Long);
        assert_eq!(race_day.workout.distance, Some(21.1));

        let last = overview.workouts.last().unwrap();
        assert_eq!(last.date, race() + Duration::days(6));
        assert_eq!(last.workout.slot(), (12, 6));
        assert_eq!(last.workout.kind, WorkoutType::Rest);

        let week_three = plan_overview(&mut state, Some(3), monday).unwrap();
        assert_eq!(week_three.workouts.len(), 7);
        assert!(week_three
            .workouts
            .iter()
            .all(|s| s.workout.week_number == 3));
    }

    #[test]
    fn test_overview_fills_empty_plan() {
        let mut state = PlanState::default();
        set_up(&mut state);
        state.delete_many(&WorkoutFilter::all()).unwrap();

        let overview = plan_overview(&mut state, None, race()).unwrap();
        assert_eq!(overview.workouts.len(), 84);
        assert_eq!(state.workouts.len(), 84);
    }

    #[test]
    fn test_reset_plan() {
        let mut state = PlanState::default();
        set_up(&mut state);
        let first_id = state.workouts[0].id;
        state
            .update(
                first_id,
                &WorkoutPatch {
                    completed: Some(true),
                    ..Default::default()
                },
            )
            .unwrap();

        let created = reset_plan(&mut state, PlanLength::Full, race()).unwrap();
        assert_eq!(created, 84);
        assert!(state.workouts.iter().all(|w| !w.completed));

        state.settings = None;
        assert_eq!(reset_plan(&mut state, PlanLength::Full, race()).unwrap(), 0);
        assert!(state.workouts.is_empty());
    }

    #[test]
    fn test_clear_all() {
        let mut state = PlanState::default();
        set_up(&mut state);
        let mut activities: Vec<Activity> = Vec::new();
        activities
            .create(NewActivity {
                external_id: "1".into(),
                kind: "Run".into(),
                name: "Run".into(),
                distance: 5000.0,
                duration: 1500,
                avg_heart_rate: None,
                max_heart_rate: None,
                avg_pace: Some(5.0),
                calories: None,
                date: DateTime::parse_from_rfc3339("2026-04-01T12:00:00Z").unwrap(),
            })
            .unwrap();

        let outcome = clear_all(&mut state, &mut activities, PlanLength::Full, race()).unwrap();
        assert_eq!(outcome.activities_removed, 1);
        assert_eq!(outcome.workouts_created, 84);
        assert!(activities.is_empty());
        assert!(state.settings.is_some());
    }

    struct BrokenLog;

    impl ActivityStore for BrokenLog {
        fn list(&self) -> Result<Vec<Activity>> {
            Ok(Vec::new())
        }

        fn create(&mut self, _record: NewActivity) -> Result<Activity> {
            Err(Error::Other("log unavailable".into()))
        }

        fn clear(&mut self) -> Result<usize> {
            Err(Error::Other("log unavailable".into()))
        }
    }

    #[test]
    fn test_clear_all_keeps_plan_when_log_fails() {
        let mut state = PlanState::default();
        set_up(&mut state);
        let first = state.list(&WorkoutFilter::all()).unwrap().remove(0);
        state
            .update(
                first.id,
                &WorkoutPatch {
                    completed: Some(true),
                    activity_id: Some(1),
                    ..Default::default()
                },
            )
            .unwrap();
        let snapshot = state.workouts.clone();

        let err = clear_all(&mut state, &mut BrokenLog, PlanLength::Full, race()).unwrap_err();
        assert!(err.to_string().contains("log unavailable"));
        assert_eq!(state.workouts, snapshot);
    }
}
