//! Built-in weekly templates for the 12-week half-marathon progression.
//!
//! Weeks 1-4 build the base (week 4 recovers), weeks 5-8 build volume
//! (week 8 recovers), weeks 9-11 peak and week 12 tapers into race day.

use crate::types::{WorkoutType, HALF_MARATHON_KM};
use once_cell::sync::Lazy;

/// Number of template weeks in the full plan
pub const TEMPLATE_WEEKS: u32 = 12;

/// One entry of a weekly template
#[derive(Clone, Debug, PartialEq)]
pub struct TemplateWorkout {
    pub day_of_week: u8,
    pub kind: WorkoutType,
    /// km
    pub distance: Option<f64>,
    /// minutes
    pub duration: Option<u32>,
    pub description: &'static str,
}

pub type WeekTemplate = Vec<TemplateWorkout>;

/// Cached template table - built once and reused across all operations
static TEMPLATES: Lazy<Vec<WeekTemplate>> = Lazy::new(build_templates);

/// Template for a 1-indexed template week
///
/// Out-of-range weeks fall back to week 1.
pub fn template_for_week(week: u32) -> &'static WeekTemplate {
    usize::try_from(week)
        .ok()
        .and_then(|w| w.checked_sub(1))
        .and_then(|idx| TEMPLATES.get(idx))
        .unwrap_or_else(|| {
            tracing::warn!("No template for week {}, using week 1", week);
            &TEMPLATES[0]
        })
}

fn run(day: u8, kind: WorkoutType, km: f64, description: &'static str) -> TemplateWorkout {
    TemplateWorkout {
        day_of_week: day,
        kind,
        distance: Some(km),
        duration: None,
        description,
    }
}

fn rest(day: u8, description: &'static str) -> TemplateWorkout {
    TemplateWorkout {
        day_of_week: day,
        kind: WorkoutType::Rest,
        distance: None,
        duration: None,
        description,
    }
}

fn build_templates() -> Vec<WeekTemplate> {
    use WorkoutType::*;

    vec![
        // Week 1-4: base building
        vec![
            run(1, Easy, 4.0, "Easy run - conversational pace"),
            rest(2, "Rest or cross-training"),
            run(3, Easy, 5.0, "Easy run with light strides at end"),
            rest(4, "Rest day"),
            run(5, Tempo, 4.0, "Tempo run - comfortably hard pace"),
            rest(6, "Rest or light walk"),
            run(0, Long, 8.0, "Long run - easy pace, build endurance"),
        ],
        vec![
            run(1, Easy, 5.0, "Easy run - conversational pace"),
            rest(2, "Rest or cross-training"),
            run(3, Interval, 5.0, "4x400m intervals with recovery jogs"),
            rest(4, "Rest day"),
            run(5, Easy, 5.0, "Easy recovery run"),
            rest(6, "Rest or light walk"),
            run(0, Long, 10.0, "Long run - steady easy pace"),
        ],
        vec![
            run(1, Easy, 5.0, "Easy run"),
            rest(2, "Rest or cross-training"),
            run(3, Tempo, 6.0, "Tempo run with warm-up and cool-down"),
            rest(4, "Rest day"),
            run(5, Easy, 5.0, "Easy run"),
            rest(6, "Rest or light walk"),
            run(0, Long, 11.0, "Long run - focus on consistent pace"),
        ],
        vec![
            run(1, Recovery, 4.0, "Recovery week - easy run"),
            rest(2, "Rest"),
            run(3, Easy, 4.0, "Easy run with strides"),
            rest(4, "Rest day"),
            run(5, Easy, 4.0, "Easy run"),
            rest(6, "Rest"),
            run(0, Long, 8.0, "Recovery long run - easy effort"),
        ],
        // Week 5-8: building volume
        vec![
            run(1, Easy, 6.0, "Easy run"),
            rest(2, "Rest or cross-training"),
            run(3, Interval, 6.0, "5x800m intervals at 5K pace"),
            rest(4, "Rest day"),
            run(5, Tempo, 6.0, "Tempo run"),
            rest(6, "Rest or light walk"),
            run(0, Long, 13.0, "Long run - building distance"),
        ],
        vec![
            run(1, Easy, 6.0, "Easy run"),
            rest(2, "Rest or cross-training"),
            run(3, Tempo, 7.0, "Progressive tempo run"),
            rest(4, "Rest day"),
            run(5, Easy, 6.0, "Easy run"),
            rest(6, "Rest"),
            run(0, Long, 14.0, "Long run - practice race nutrition"),
        ],
        vec![
            run(1, Easy, 6.0, "Easy run"),
            rest(2, "Rest or cross-training"),
            run(3, Interval, 7.0, "6x800m intervals"),
            rest(4, "Rest day"),
            run(5, Tempo, 7.0, "Tempo run at half-marathon effort"),
            rest(6, "Rest"),
            run(0, Long, 16.0, "Long run - longest training run"),
        ],
        vec![
            run(1, Recovery, 5.0, "Recovery week - easy run"),
            rest(2, "Rest"),
            run(3, Easy, 5.0, "Easy run"),
            rest(4, "Rest day"),
            run(5, Easy, 5.0, "Easy run"),
            rest(6, "Rest"),
            run(0, Long, 10.0, "Recovery long run"),
        ],
        // Week 9-11: peak training
        vec![
            run(1, Easy, 6.0, "Easy run"),
            rest(2, "Rest or cross-training"),
            run(3, Interval, 8.0, "4x1600m at goal pace"),
            rest(4, "Rest day"),
            run(5, Tempo, 8.0, "Tempo run at race pace"),
            rest(6, "Rest"),
            run(0, Long, 18.0, "Peak long run"),
        ],
        vec![
            run(1, Easy, 6.0, "Easy run"),
            rest(2, "Rest or cross-training"),
            run(3, Tempo, 10.0, "Race pace practice"),
            rest(4, "Rest day"),
            run(5, Easy, 6.0, "Easy run"),
            rest(6, "Rest"),
            run(0, Long, 19.0, "Last big long run"),
        ],
        vec![
            run(1, Easy, 5.0, "Easy run - taper begins"),
            rest(2, "Rest"),
            run(3, Interval, 6.0, "Short intervals, maintain sharpness"),
            rest(4, "Rest day"),
            run(5, Tempo, 5.0, "Short tempo run"),
            rest(6, "Rest"),
            run(0, Long, 13.0, "Moderate long run"),
        ],
        // Week 12: race week taper
        vec![
            run(1, Easy, 4.0, "Easy shakeout run"),
            rest(2, "Rest"),
            run(3, Easy, 3.0, "Short easy run with strides"),
            rest(4, "Rest - stay off feet"),
            run(5, Easy, 2.0, "Light 15-min shakeout"),
            rest(6, "Rest - prepare gear and nutrition"),
            run(0, Long, HALF_MARATHON_KM, "RACE DAY! Half Marathon"),
        ],
    ]
}

/// Validate the template table, returning a list of problems
pub fn validate_templates() -> Vec<String> {
    let mut errors = Vec::new();

    if TEMPLATES.len() != TEMPLATE_WEEKS as usize {
        errors.push(format!(
            "Expected {} template weeks, found {}",
            TEMPLATE_WEEKS,
            TEMPLATES.len()
        ));
    }

    for (idx, week) in TEMPLATES.iter().enumerate() {
        let mut seen = [false; 7];
        for workout in week {
            let Some(slot) = seen.get_mut(usize::from(workout.day_of_week)) else {
                errors.push(format!(
                    "Week {}: day {} out of range",
                    idx + 1,
                    workout.day_of_week
                ));
                continue;
            };
            if *slot {
                errors.push(format!(
                    "Week {}: day {} scheduled twice",
                    idx + 1,
                    workout.day_of_week
                ));
            }
            *slot = true;

            match (workout.kind.is_rest(), workout.distance) {
                (true, Some(_)) => errors.push(format!(
                    "Week {}: rest day {} has a distance",
                    idx + 1,
                    workout.day_of_week
                )),
                (false, None) => errors.push(format!(
                    "Week {}: {} run on day {} has no distance",
                    idx + 1,
                    workout.kind,
                    workout.day_of_week
                )),
                _ => {}
            }
        }
    }

    errors
}
