//! Linking recorded activities to planned workouts.

use crate::calendar::workout_date;
use crate::store::{WorkoutFilter, WorkoutPatch, WorkoutStore};
use crate::types::{ActivityId, PlannedWorkout, Settings, WorkoutType};
use crate::Result;
use chrono::NaiveDate;

/// Mark the planned workout scheduled on `activity_day` as completed
///
/// Candidates are uncompleted, non-rest workouts; the first one (in store
/// order) whose calendar date equals `activity_day` is linked. Returns the
/// updated workout, or `None` when settings are missing or nothing is
/// scheduled that day. Repeating a call after a successful link is a no-op.
pub fn link_activity<S: WorkoutStore>(
    settings: Option<&Settings>,
    store: &mut S,
    activity_id: ActivityId,
    activity_day: NaiveDate,
) -> Result<Option<PlannedWorkout>> {
    let Some(settings) = settings else {
        tracing::debug!("No settings, skipping link for activity {}", activity_id);
        return Ok(None);
    };
    let Some(total_weeks) = store.total_weeks()? else {
        tracing::debug!("Empty plan, skipping link for activity {}", activity_id);
        return Ok(None);
    };

    let candidates = store.list(
        &WorkoutFilter::all()
            .completed(false)
            .not_kind(WorkoutType::Rest),
    )?;

    let matching = candidates.into_iter().find(|w| {
        workout_date(
            settings.race_date,
            w.week_number,
            w.day_of_week,
            total_weeks,
        ) == activity_day
    });

    let Some(workout) = matching else {
        tracing::info!(
            "No planned workout on {} for activity {}, leaving it unlinked",
            activity_day,
            activity_id
        );
        return Ok(None);
    };

    let linked = store.update(
        workout.id,
        &WorkoutPatch {
            completed: Some(true),
            activity_id: Some(activity_id),
            ..Default::default()
        },
    )?;

    tracing::info!(
        "Linked activity {} to week {} {} workout {}",
        activity_id,
        linked.week_number,
        linked.kind,
        linked.id
    );
    Ok(Some(linked))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::{generate_plan, PlanLength};
    use crate::state::PlanState;
    use crate::store::SettingsStore;
    use chrono::Duration;

    fn race() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 5, 3).unwrap()
    }

    fn settings() -> Settings {
        Settings {
            race_date: race(),
            race_name: None,
            weekly_goal: 4,
        }
    }

    fn seeded_state() -> PlanState {
        let mut state = PlanState::default();
        state.upsert_settings(settings()).unwrap();
        state
            .create_many(generate_plan(race(), race(), PlanLength::Full))
            .unwrap();
        state
    }

    #[test]
    fn test_links_race_day() {
        crate::logging::init_test();
        let mut state = seeded_state();

        let linked = link_activity(Some(&settings()), &mut state, 7, race())
            .unwrap()
            .unwrap();
        assert_eq!(linked.week_number, 12);
        assert_eq!(linked.day_of_week, 0);
        assert!(linked.completed);
        assert_eq!(linked.activity_id, Some(7));
    }

    #[test]
    fn test_second_link_is_noop() {
        let mut state = seeded_state();
        let day = race() + Duration::days(1); // Monday of race week

        let first = link_activity(Some(&settings()), &mut state, 1, day).unwrap();
        assert!(first.is_some());

        let second = link_activity(Some(&settings()), &mut state, 1, day).unwrap();
        assert!(second.is_none());

        let linked: Vec<_> = state
            .list(&WorkoutFilter::all().completed(true))
            .unwrap();
        assert_eq!(linked.len(), 1);
    }

    #[test]
    fn test_rest_day_activity_left_unlinked() {
        let mut state = seeded_state();
        let tuesday = race() + Duration::days(2);

        let linked = link_activity(Some(&settings()), &mut state, 3, tuesday).unwrap();
        assert!(linked.is_none());
        assert!(state
            .list(&WorkoutFilter::all().completed(true))
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_day_outside_plan_left_unlinked() {
        let mut state = seeded_state();
        let linked =
            link_activity(Some(&settings()), &mut state, 3, race() + Duration::days(7)).unwrap();
        assert!(linked.is_none());
    }

    #[test]
    fn test_missing_settings_is_noop() {
        let mut state = seeded_state();
        let linked = link_activity(None, &mut state, 1, race()).unwrap();
        assert!(linked.is_none());
    }

    #[test]
    fn test_empty_store_is_noop() {
        let mut state = PlanState::default();
        let linked = link_activity(Some(&settings()), &mut state, 1, race()).unwrap();
        assert!(linked.is_none());
    }

    #[test]
    fn test_uses_stored_plan_length() {
        // six-week plan: week 1 starts five weeks before race Sunday
        let mut state = PlanState::default();
        state
            .create_many(generate_plan(
                race(),
                race() - Duration::weeks(5),
                PlanLength::Trimmed,
            ))
            .unwrap();

        let first_monday = race() - Duration::weeks(5) + Duration::days(1);
        let linked = link_activity(Some(&settings()), &mut state, 2, first_monday)
            .unwrap()
            .unwrap();
        assert_eq!(linked.week_number, 1);
        assert_eq!(linked.day_of_week, 1);
    }
}
