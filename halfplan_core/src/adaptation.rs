//! Adaptation of future training volume from weekly adherence.
//!
//! Rules are checked in a fixed order against one snapshot of the week's
//! statistics:
//! 1. Completion below 50% cuts volume to 80%, below 75% to 90%
//! 2. A heart-rate rise of more than 5 bpm with completion below 75% adds a
//!    recovery day and caps the multiplier at 0.85
//! 3. Running more than 110% of the planned distance with at least 90%
//!    completion raises the multiplier by 5%, never above 1.15
//!
//! Multipliers are applied to each future workout's generated baseline, so
//! running the adaptation repeatedly does not compound.

use crate::store::{ActivityStore, WorkoutFilter, WorkoutPatch, WorkoutStore};
use crate::types::{
    Activity, AdaptationResult, PlannedWorkout, Settings, WeeklyStats, WorkoutType,
};
use crate::Result;

const LOW_COMPLETION: f64 = 0.50;
const PARTIAL_COMPLETION: f64 = 0.75;
const STRONG_COMPLETION: f64 = 0.90;
const HR_RISE_BPM: f64 = 5.0;
const DISTANCE_OVERAGE: f64 = 1.10;
const RECOVERY_CAP: f64 = 0.85;
const INCREASE_STEP: f64 = 1.05;
const MAX_MULTIPLIER: f64 = 1.15;

/// Activities fulfilling the given workouts
fn linked_activities<'a>(
    workouts: &[PlannedWorkout],
    activities: &'a [Activity],
) -> Vec<&'a Activity> {
    activities
        .iter()
        .filter(|a| {
            workouts
                .iter()
                .any(|w| w.completed && w.activity_id == Some(a.id))
        })
        .collect()
}

/// Mean heart rate over activities that recorded one
fn average_heart_rate(activities: &[&Activity]) -> Option<f64> {
    let rates: Vec<f64> = activities
        .iter()
        .filter_map(|a| a.avg_heart_rate)
        .map(f64::from)
        .collect();
    if rates.is_empty() {
        None
    } else {
        Some(rates.iter().sum::<f64>() / rates.len() as f64)
    }
}

/// Completion and heart-rate statistics for one plan week
pub fn weekly_stats<W, A>(workouts: &W, activities: &A, week_number: u32) -> Result<WeeklyStats>
where
    W: WorkoutStore,
    A: ActivityStore,
{
    let week = workouts.list(&WorkoutFilter::all().week(week_number))?;
    let all_activities = activities.list()?;

    let runs: Vec<&PlannedWorkout> = week.iter().filter(|w| !w.is_rest()).collect();
    let planned = runs.len() as u32;
    let completed = runs.iter().filter(|w| w.completed).count() as u32;
    let completion_rate = if planned > 0 {
        f64::from(completed) / f64::from(planned)
    } else {
        0.0
    };

    let this_week = linked_activities(&week, &all_activities);

    let previous_week_avg_hr = match week_number.checked_sub(1) {
        Some(prev) if prev > 0 => {
            let prev_week = workouts.list(&WorkoutFilter::all().week(prev).completed(true))?;
            average_heart_rate(&linked_activities(&prev_week, &all_activities))
        }
        _ => None,
    };

    Ok(WeeklyStats {
        planned_workouts: planned,
        completed_workouts: completed,
        completion_rate,
        total_planned_distance: week.iter().filter_map(|w| w.distance).sum(),
        total_actual_distance: this_week.iter().map(|a| a.distance_km()).sum(),
        avg_heart_rate: average_heart_rate(&this_week),
        previous_week_avg_hr,
    })
}

/// Derive volume adjustments from a week's statistics
pub fn adapt_from_stats(stats: &WeeklyStats) -> AdaptationResult {
    let mut result = AdaptationResult::default();

    if stats.planned_workouts > 0 {
        if stats.completion_rate < LOW_COMPLETION {
            result.volume_multiplier = 0.8;
            result.adjustments.push(
                "Reduced next week volume by 20% due to low completion rate (<50%)".into(),
            );
        } else if stats.completion_rate < PARTIAL_COMPLETION {
            result.volume_multiplier = 0.9;
            result.adjustments.push(
                "Slightly reduced next week volume due to completion rate (<75%)".into(),
            );
        }
    }

    if let (Some(current), Some(previous)) = (stats.avg_heart_rate, stats.previous_week_avg_hr) {
        if current - previous > HR_RISE_BPM && stats.completion_rate < PARTIAL_COMPLETION {
            result.add_recovery_day = true;
            result.volume_multiplier = result.volume_multiplier.min(RECOVERY_CAP);
            result.adjustments.push(
                "Added recovery day due to elevated heart rate trend and incomplete training"
                    .into(),
            );
        }
    }

    if stats.total_actual_distance > stats.total_planned_distance * DISTANCE_OVERAGE
        && stats.completion_rate >= STRONG_COMPLETION
    {
        result.volume_multiplier = (result.volume_multiplier * INCREASE_STEP).min(MAX_MULTIPLIER);
        result
            .adjustments
            .push("Slight volume increase next week due to strong performance".into());
    }

    result
}

/// Compute the statistics for `week_number` and derive adjustments
pub fn analyze_and_adapt<W, A>(
    workouts: &W,
    activities: &A,
    week_number: u32,
) -> Result<AdaptationResult>
where
    W: WorkoutStore,
    A: ActivityStore,
{
    let stats = weekly_stats(workouts, activities, week_number)?;
    let result = adapt_from_stats(&stats);
    tracing::debug!(
        "Week {} stats: {:?} -> multiplier {:.3}",
        week_number,
        stats,
        result.volume_multiplier
    );
    Ok(result)
}

fn round_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Scale uncompleted, non-rest workouts in weeks after `after_week`
///
/// Distances and durations are recomputed from each workout's baseline.
/// Returns the number of workouts whose volume changed.
pub fn apply_adaptations<W: WorkoutStore>(
    store: &mut W,
    after_week: u32,
    adaptation: &AdaptationResult,
) -> Result<usize> {
    let multiplier = adaptation.volume_multiplier;
    let future: Vec<PlannedWorkout> = store
        .list(
            &WorkoutFilter::all()
                .completed(false)
                .not_kind(WorkoutType::Rest),
        )?
        .into_iter()
        .filter(|w| w.week_number > after_week)
        .collect();

    let mut changed = 0;
    for workout in future {
        let base_distance = workout.base_distance.or(workout.distance);
        let base_duration = workout.base_duration.or(workout.duration);

        let patch = WorkoutPatch {
            distance: base_distance.map(|d| round_tenth(d * multiplier)),
            duration: base_duration.map(|d| (f64::from(d) * multiplier).round() as u32),
            base_distance,
            base_duration,
            ..Default::default()
        };

        if patch.distance != workout.distance || patch.duration != workout.duration {
            changed += 1;
        }
        store.update(workout.id, &patch)?;
    }

    Ok(changed)
}

/// Re-derive future volume from the most recent week with a completed workout
///
/// No-op (returns `None`) when settings are missing, the store is empty, or
/// nothing has been completed yet. Completed workouts and weeks up to the
/// last completed one are never touched.
pub fn regenerate_plan<W, A>(
    settings: Option<&Settings>,
    workouts: &mut W,
    activities: &A,
) -> Result<Option<AdaptationResult>>
where
    W: WorkoutStore,
    A: ActivityStore,
{
    if settings.is_none() {
        return Ok(None);
    }

    let last_completed_week = workouts
        .list(&WorkoutFilter::all().completed(true))?
        .iter()
        .map(|w| w.week_number)
        .max();

    let Some(last_week) = last_completed_week else {
        tracing::debug!("No completed workouts yet, leaving plan untouched");
        return Ok(None);
    };

    let adaptation = analyze_and_adapt(workouts, activities, last_week)?;
    let changed = apply_adaptations(workouts, last_week, &adaptation)?;

    tracing::info!(
        "Adapted plan after week {}: multiplier {:.2}, {} workouts changed",
        last_week,
        adaptation.volume_multiplier,
        changed
    );
    for note in &adaptation.adjustments {
        tracing::info!("Adjustment: {}", note);
    }

    Ok(Some(adaptation))
}
