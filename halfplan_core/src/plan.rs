//! Plan generation from the weekly templates.
//!
//! A trimmed plan keeps the *last* templates so the taper and race week stay
//! intact however little time remains before the race.

use crate::calendar::weeks_until_race;
use crate::templates::{template_for_week, TEMPLATE_WEEKS};
use crate::types::PlannedWorkoutData;
use chrono::NaiveDate;

/// Shortest plan ever generated, in weeks
pub const MIN_PLAN_WEEKS: u32 = 4;

/// How much of the template arc to emit
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlanLength {
    /// Fit the plan to the weeks remaining before the race
    Trimmed,
    /// Always emit all 12 weeks
    Full,
}

/// Number of plan weeks for a race seen from `today`
pub fn plan_weeks(race_date: NaiveDate, today: NaiveDate, length: PlanLength) -> u32 {
    match length {
        PlanLength::Full => TEMPLATE_WEEKS,
        PlanLength::Trimmed => {
            let weeks = weeks_until_race(race_date, today) + 1;
            // clamped into u32 range
            weeks.clamp(i64::from(MIN_PLAN_WEEKS), i64::from(TEMPLATE_WEEKS)) as u32
        }
    }
}

/// Generate the ordered list of planned workouts for a race
///
/// Templates `13 - plan_weeks ..= 12` are renumbered as plan weeks
/// `1..=plan_weeks`. Pure and deterministic; callers persist the result.
pub fn generate_plan(
    race_date: NaiveDate,
    today: NaiveDate,
    length: PlanLength,
) -> Vec<PlannedWorkoutData> {
    let weeks = plan_weeks(race_date, today, length);
    let first_template = TEMPLATE_WEEKS - weeks + 1;

    let workouts: Vec<PlannedWorkoutData> = (first_template..=TEMPLATE_WEEKS)
        .flat_map(|template_week| {
            let week_number = template_week - first_template + 1;
            template_for_week(template_week)
                .iter()
                .map(move |t| PlannedWorkoutData {
                    week_number,
                    day_of_week: t.day_of_week,
                    kind: t.kind,
                    distance: t.distance,
                    duration: t.duration,
                    description: t.description.to_string(),
                })
        })
        .collect();

    tracing::info!(
        "Generated {}-week plan ({} workouts) for race on {}",
        weeks,
        workouts.len(),
        race_date
    );

    workouts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{WorkoutType, HALF_MARATHON_KM};
    use chrono::Duration;

    fn race() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 5, 3).unwrap()
    }

    fn weeks_before(weeks: i64) -> NaiveDate {
        race() - Duration::weeks(weeks)
    }

    fn week_of(plan: &[PlannedWorkoutData], week: u32) -> Vec<PlannedWorkoutData> {
        plan.iter()
            .filter(|w| w.week_number == week)
            .cloned()
            .collect()
    }

    #[test]
    fn test_full_plan_has_84_workouts() {
        let plan = generate_plan(race(), race(), PlanLength::Full);
        assert_eq!(plan.len(), 84);
        assert_eq!(plan.first().unwrap().week_number, 1);
        assert_eq!(plan.last().unwrap().week_number, 12);
    }

    #[test]
    fn test_twelve_weeks_out_uses_all_templates() {
        let plan = generate_plan(race(), weeks_before(11), PlanLength::Trimmed);
        assert_eq!(plan.len(), 84);

        let race_day = plan
            .iter()
            .find(|w| w.week_number == 12 && w.day_of_week == 0)
            .unwrap();
        assert_eq!(race_day.kind, WorkoutType::Long);
        assert_eq!(race_day.distance, Some(HALF_MARATHON_KM));
    }

    #[test]
    fn test_five_weeks_out_keeps_last_six_templates() {
        let plan = generate_plan(race(), weeks_before(5), PlanLength::Trimmed);
        assert_eq!(plan.len(), 6 * 7);
        assert_eq!(plan.iter().map(|w| w.week_number).max(), Some(6));

        let full = generate_plan(race(), race(), PlanLength::Full);
        let strip = |ws: Vec<PlannedWorkoutData>| -> Vec<_> {
            ws.into_iter()
                .map(|w| (w.day_of_week, w.kind, w.distance, w.description))
                .collect()
        };
        assert_eq!(strip(week_of(&plan, 6)), strip(week_of(&full, 12)));
        assert_eq!(strip(week_of(&plan, 1)), strip(week_of(&full, 7)));
    }

    #[test]
    fn test_minimum_four_weeks() {
        let plan = generate_plan(race(), race(), PlanLength::Trimmed);
        assert_eq!(plan_weeks(race(), race(), PlanLength::Trimmed), 4);
        assert_eq!(plan.len(), 28);

        // after the race it still emits the last four templates
        let late = race() + Duration::weeks(3);
        assert_eq!(plan_weeks(race(), late, PlanLength::Trimmed), 4);
    }

    #[test]
    fn test_far_future_race_capped_at_twelve() {
        let today = race() - Duration::weeks(40);
        assert_eq!(plan_weeks(race(), today, PlanLength::Trimmed), 12);
    }

    #[test]
    fn test_generation_is_deterministic() {
        let today = weeks_before(7);
        let first = generate_plan(race(), today, PlanLength::Trimmed);
        let second = generate_plan(race(), today, PlanLength::Trimmed);
        assert_eq!(first, second);
    }

    #[test]
    fn test_one_entry_per_slot() {
        let plan = generate_plan(race(), race(), PlanLength::Full);
        let mut slots: Vec<_> = plan.iter().map(|w| (w.week_number, w.day_of_week)).collect();
        slots.sort();
        slots.dedup();
        assert_eq!(slots.len(), plan.len());
    }
}
