//! Moving a planned workout to another date.
//!
//! A move keeps every (week, day) slot occupied: a rest day at the target
//! yields to the moved workout, and the vacated slot receives a rest
//! placeholder. All steps are staged and committed together.

use crate::calendar::{day_of_week, resolve_week};
use crate::store::{WorkoutFilter, WorkoutPatch, WorkoutStore};
use crate::types::{PlannedWorkout, PlannedWorkoutData, Settings, WorkoutId, WorkoutType};
use crate::{Error, Result};
use chrono::NaiveDate;

/// Move workout `workout_id` onto `new_day`
///
/// # Errors
/// - `WorkoutNotFound` for an unknown id
/// - `AlreadyCompleted` when the workout has been done
/// - `SettingsMissing` without a race date
/// - `OutOfRange` when `new_day` is outside every plan week
/// - `SlotConflict` when another non-rest workout holds the target slot
///
/// The store is left untouched on any error.
pub fn reschedule<S>(
    settings: Option<&Settings>,
    store: &mut S,
    workout_id: WorkoutId,
    new_day: NaiveDate,
) -> Result<PlannedWorkout>
where
    S: WorkoutStore + Clone,
{
    let workout = store
        .get(workout_id)?
        .ok_or(Error::WorkoutNotFound(workout_id))?;

    if workout.completed {
        return Err(Error::AlreadyCompleted(workout_id));
    }

    let settings = settings.ok_or(Error::SettingsMissing)?;
    let total_weeks = store.total_weeks()?.unwrap_or(0);

    let target_week =
        resolve_week(settings.race_date, total_weeks, new_day).ok_or(Error::OutOfRange(new_day))?;
    let target_day = day_of_week(new_day);

    let occupied = store.list(
        &WorkoutFilter::all()
            .slot(target_week, target_day)
            .not_kind(WorkoutType::Rest)
            .not_id(workout_id),
    )?;
    if let Some(existing) = occupied.first() {
        return Err(Error::SlotConflict {
            week: target_week,
            day: target_day,
            existing: existing.id,
        });
    }

    let (origin_week, origin_day) = workout.slot();

    let moved = store.atomically(|staged| {
        staged.delete_many(
            &WorkoutFilter::all()
                .slot(target_week, target_day)
                .kind(WorkoutType::Rest)
                .not_id(workout_id),
        )?;

        let moved = staged.update(
            workout_id,
            &WorkoutPatch {
                week_number: Some(target_week),
                day_of_week: Some(target_day),
                ..Default::default()
            },
        )?;

        if (origin_week, origin_day) != (target_week, target_day) {
            staged.create(PlannedWorkoutData::rest_placeholder(origin_week, origin_day))?;
        }

        Ok(moved)
    })?;

    tracing::info!(
        "Moved workout {} from week {} day {} to week {} day {} ({})",
        workout_id,
        origin_week,
        origin_day,
        target_week,
        target_day,
        new_day
    );

    Ok(moved)
}
