//! Store traits for workouts, activities and settings.
//!
//! The engine only talks to these traits; `PlanState` and `ActivityLog`
//! provide the file-backed implementations.

use crate::types::{
    Activity, ActivityId, NewActivity, PlannedWorkout, PlannedWorkoutData, Settings, WorkoutId,
    WorkoutType,
};
use crate::{Error, Result};

/// Selection criteria for planned workouts; `Default` matches everything
#[derive(Clone, Debug, Default, PartialEq)]
pub struct WorkoutFilter {
    pub week_number: Option<u32>,
    pub day_of_week: Option<u8>,
    pub completed: Option<bool>,
    pub kind: Option<WorkoutType>,
    pub exclude_kind: Option<WorkoutType>,
    pub exclude_id: Option<WorkoutId>,
}

impl WorkoutFilter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn week(mut self, week_number: u32) -> Self {
        self.week_number = Some(week_number);
        self
    }

    pub fn slot(mut self, week_number: u32, day_of_week: u8) -> Self {
        self.week_number = Some(week_number);
        self.day_of_week = Some(day_of_week);
        self
    }

    pub fn completed(mut self, completed: bool) -> Self {
        self.completed = Some(completed);
        self
    }

    pub fn kind(mut self, kind: WorkoutType) -> Self {
        self.kind = Some(kind);
        self
    }

    pub fn not_kind(mut self, kind: WorkoutType) -> Self {
        self.exclude_kind = Some(kind);
        self
    }

    pub fn not_id(mut self, id: WorkoutId) -> Self {
        self.exclude_id = Some(id);
        self
    }

    pub fn matches(&self, workout: &PlannedWorkout) -> bool {
        self.week_number.map_or(true, |w| workout.week_number == w)
            && self.day_of_week.map_or(true, |d| workout.day_of_week == d)
            && self.completed.map_or(true, |c| workout.completed == c)
            && self.kind.map_or(true, |k| workout.kind == k)
            && self.exclude_kind.map_or(true, |k| workout.kind != k)
            && self.exclude_id.map_or(true, |id| workout.id != id)
    }
}

/// Partial update of a planned workout; `None` leaves a field untouched
#[derive(Clone, Debug, Default, PartialEq)]
pub struct WorkoutPatch {
    pub week_number: Option<u32>,
    pub day_of_week: Option<u8>,
    pub distance: Option<f64>,
    pub duration: Option<u32>,
    pub completed: Option<bool>,
    pub activity_id: Option<ActivityId>,
    pub base_distance: Option<f64>,
    pub base_duration: Option<u32>,
}

impl WorkoutPatch {
    pub fn apply(&self, workout: &mut PlannedWorkout) {
        if let Some(week) = self.week_number {
            workout.week_number = week;
        }
        if let Some(day) = self.day_of_week {
            workout.day_of_week = day;
        }
        if let Some(distance) = self.distance {
            workout.distance = Some(distance);
        }
        if let Some(duration) = self.duration {
            workout.duration = Some(duration);
        }
        if let Some(completed) = self.completed {
            workout.completed = completed;
        }
        if let Some(activity_id) = self.activity_id {
            workout.activity_id = Some(activity_id);
        }
        if let Some(base) = self.base_distance {
            workout.base_distance = Some(base);
        }
        if let Some(base) = self.base_duration {
            workout.base_duration = Some(base);
        }
    }
}

/// Persistence seam for planned workouts
pub trait WorkoutStore {
    /// Workouts matching `filter`, in store iteration order
    fn list(&self, filter: &WorkoutFilter) -> Result<Vec<PlannedWorkout>>;

    fn get(&self, id: WorkoutId) -> Result<Option<PlannedWorkout>>;

    fn create(&mut self, data: PlannedWorkoutData) -> Result<PlannedWorkout>;

    /// Fails with `WorkoutNotFound` for unknown ids
    fn update(&mut self, id: WorkoutId, patch: &WorkoutPatch) -> Result<PlannedWorkout>;

    /// Returns the number of deleted workouts
    fn delete_many(&mut self, filter: &WorkoutFilter) -> Result<usize>;

    /// Highest week number in the store, `None` when empty
    fn total_weeks(&self) -> Result<Option<u32>> {
        Ok(self
            .list(&WorkoutFilter::all())?
            .iter()
            .map(|w| w.week_number)
            .max())
    }

    fn create_many(&mut self, plan: Vec<PlannedWorkoutData>) -> Result<usize> {
        let count = plan.len();
        for data in plan {
            self.create(data)?;
        }
        Ok(count)
    }

    /// Run `f` against a staged copy and commit only if it succeeds
    fn atomically<T, F>(&mut self, f: F) -> Result<T>
    where
        Self: Sized + Clone,
        F: FnOnce(&mut Self) -> Result<T>,
    {
        let mut staged = self.clone();
        let out = f(&mut staged)?;
        *self = staged;
        Ok(out)
    }
}

/// Persistence seam for the settings singleton
pub trait SettingsStore {
    fn settings(&self) -> Result<Option<Settings>>;

    fn upsert_settings(&mut self, settings: Settings) -> Result<Settings>;
}

/// Persistence seam for recorded activities
pub trait ActivityStore {
    fn list(&self) -> Result<Vec<Activity>>;

    fn get(&self, id: ActivityId) -> Result<Option<Activity>> {
        Ok(self.list()?.into_iter().find(|a| a.id == id))
    }

    fn find_by_external_id(&self, external_id: &str) -> Result<Option<Activity>> {
        Ok(self
            .list()?
            .into_iter()
            .find(|a| a.external_id == external_id))
    }

    /// Fails with `DuplicateActivity` if the external id is already stored
    fn create(&mut self, record: NewActivity) -> Result<Activity>;

    /// Remove every activity, returning how many were removed
    fn clear(&mut self) -> Result<usize>;
}

/// In-memory activity store
impl ActivityStore for Vec<Activity> {
    fn list(&self) -> Result<Vec<Activity>> {
        Ok(self.clone())
    }

    fn create(&mut self, record: NewActivity) -> Result<Activity> {
        if self.iter().any(|a| a.external_id == record.external_id) {
            return Err(Error::DuplicateActivity(record.external_id));
        }
        let id = self.iter().map(|a| a.id).max().unwrap_or(0) + 1;
        let activity = Activity::from_new(id, record);
        self.push(activity.clone());
        Ok(activity)
    }

    fn clear(&mut self) -> Result<usize> {
        let count = self.len();
        Vec::clear(self);
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::DateTime;

    fn workout(id: WorkoutId, week: u32, day: u8, kind: WorkoutType) -> PlannedWorkout {
        PlannedWorkout::from_data(
            id,
            PlannedWorkoutData {
                week_number: week,
                day_of_week: day,
                kind,
                distance: None,
                duration: None,
                description: String::new(),
            },
        )
    }

    fn new_activity(external_id: &str) -> NewActivity {
        NewActivity {
            external_id: external_id.into(),
            kind: "Run".into(),
            name: "Morning Run".into(),
            distance: 5000.0,
            duration: 1500,
            avg_heart_rate: None,
            max_heart_rate: None,
            avg_pace: Some(5.0),
            calories: None,
            date: DateTime::parse_from_rfc3339("2026-05-03T12:00:00Z").unwrap(),
        }
    }

    #[test]
    fn test_filter_matches() {
        let easy = workout(1, 2, 3, WorkoutType::Easy);
        assert!(WorkoutFilter::all().matches(&easy));
        assert!(WorkoutFilter::all().slot(2, 3).matches(&easy));
        assert!(!WorkoutFilter::all().slot(2, 4).matches(&easy));
        assert!(!WorkoutFilter::all().not_kind(WorkoutType::Easy).matches(&easy));
        assert!(!WorkoutFilter::all().not_id(1).matches(&easy));
        assert!(WorkoutFilter::all().completed(false).matches(&easy));
        assert!(!WorkoutFilter::all().kind(WorkoutType::Rest).matches(&easy));
    }

    #[test]
    fn test_patch_only_touches_set_fields() {
        let mut w = workout(1, 2, 3, WorkoutType::Tempo);
        w.distance = Some(6.0);
        WorkoutPatch {
            completed: Some(true),
            activity_id: Some(9),
            ..Default::default()
        }
        .apply(&mut w);
        assert!(w.completed);
        assert_eq!(w.activity_id, Some(9));
        assert_eq!(w.distance, Some(6.0));
        assert_eq!(w.slot(), (2, 3));
    }

    #[test]
    fn test_memory_activity_store_dedups() {
        let mut store: Vec<Activity> = Vec::new();
        let first = store.create(new_activity("a-1")).unwrap();
        let second = store.create(new_activity("a-2")).unwrap();
        assert_eq!(first.id, 1);
        assert_eq!(second.id, 2);

        let dup = store.create(new_activity("a-1"));
        assert!(matches!(dup, Err(Error::DuplicateActivity(_))));
        assert_eq!(store.len(), 2);

        let found = store.find_by_external_id("a-2").unwrap().unwrap();
        assert_eq!(found.id, 2);
        assert_eq!(ActivityStore::get(&store, 1).unwrap().unwrap().external_id, "a-1");
        assert_eq!(ActivityStore::clear(&mut store).unwrap(), 2);
    }
}
