//! Plan state persistence with file locking.
//!
//! The settings singleton and every planned workout live in one JSON
//! document. Loads take a shared lock; saves write a locked temp file and
//! rename it over the original, so readers never observe a partial plan.

use crate::store::{SettingsStore, WorkoutFilter, WorkoutPatch, WorkoutStore};
use crate::types::{PlannedWorkout, PlannedWorkoutData, Settings, WorkoutId};
use crate::{Error, Result};
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;
use tempfile::NamedTempFile;

/// Settings plus planned workouts, in insertion order
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PlanState {
    #[serde(default)]
    pub settings: Option<Settings>,
    #[serde(default)]
    pub workouts: Vec<PlannedWorkout>,
    #[serde(default = "first_id")]
    next_id: WorkoutId,
}

fn first_id() -> WorkoutId {
    1
}

impl Default for PlanState {
    fn default() -> Self {
        Self {
            settings: None,
            workouts: Vec::new(),
            next_id: first_id(),
        }
    }
}

impl PlanState {
    /// Load plan state from a file with shared locking
    ///
    /// Returns an empty state if the file doesn't exist. A file that cannot
    /// be parsed is moved aside to `<name>.corrupt` and an empty state is
    /// returned, so the next save never overwrites it.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::info!("No plan state found at {:?}, starting empty", path);
            return Ok(Self::default());
        }

        let file = File::open(path)?;
        file.lock_shared()?;

        let mut contents = String::new();
        let read = std::io::BufReader::new(&file).read_to_string(&mut contents);
        file.unlock()?;
        read?;

        match serde_json::from_str::<PlanState>(&contents) {
            Ok(mut state) => {
                // never hand out an id that is already taken
                let max_id = state.workouts.iter().map(|w| w.id).max().unwrap_or(0);
                state.next_id = state.next_id.max(max_id + 1);
                tracing::debug!(
                    "Loaded plan state from {:?} ({} workouts)",
                    path,
                    state.workouts.len()
                );
                Ok(state)
            }
            Err(e) => {
                let aside = path.with_extension("json.corrupt");
                tracing::warn!(
                    "Failed to parse plan state {:?}: {}. Moved to {:?}, starting empty.",
                    path,
                    e,
                    aside
                );
                std::fs::rename(path, &aside)?;
                Ok(Self::default())
            }
        }
    }

    /// Save plan state to a file with exclusive locking
    ///
    /// Atomically writes state by:
    /// 1. Writing to a temp file
    /// 2. Syncing to disk
    /// 3. Renaming over the original
    pub fn save(&self, path: &Path) -> Result<()> {
        let parent = path
            .parent()
            .ok_or_else(|| Error::Other("plan state path missing parent".into()))?;
        std::fs::create_dir_all(parent)?;

        let temp = NamedTempFile::new_in(parent)?;
        temp.as_file().lock_exclusive()?;

        {
            let mut writer = std::io::BufWriter::new(temp.as_file());
            let contents = serde_json::to_string_pretty(self)?;
            writer.write_all(contents.as_bytes())?;
            writer.flush()?;
        }

        temp.as_file().sync_all()?;
        temp.as_file().unlock()?;

        temp.persist(path).map_err(|e| Error::Io(e.error))?;

        tracing::debug!("Saved plan state to {:?}", path);
        Ok(())
    }

    /// Load state, modify it, and save it back
    ///
    /// Nothing is written when `f` fails.
    pub fn update<T, F>(path: &Path, f: F) -> Result<T>
    where
        F: FnOnce(&mut PlanState) -> Result<T>,
    {
        let mut state = Self::load(path)?;
        let out = f(&mut state)?;
        state.save(path)?;
        Ok(out)
    }
}

impl WorkoutStore for PlanState {
    fn list(&self, filter: &WorkoutFilter) -> Result<Vec<PlannedWorkout>> {
        Ok(self
            .workouts
            .iter()
            .filter(|w| filter.matches(w))
            .cloned()
            .collect())
    }

    fn get(&self, id: WorkoutId) -> Result<Option<PlannedWorkout>> {
        Ok(self.workouts.iter().find(|w| w.id == id).cloned())
    }

    fn create(&mut self, data: PlannedWorkoutData) -> Result<PlannedWorkout> {
        let workout = PlannedWorkout::from_data(self.next_id, data);
        self.next_id += 1;
        self.workouts.push(workout.clone());
        Ok(workout)
    }

    fn update(&mut self, id: WorkoutId, patch: &WorkoutPatch) -> Result<PlannedWorkout> {
        let workout = self
            .workouts
            .iter_mut()
            .find(|w| w.id == id)
            .ok_or(Error::WorkoutNotFound(id))?;
        patch.apply(workout);
        Ok(workout.clone())
    }

    fn delete_many(&mut self, filter: &WorkoutFilter) -> Result<usize> {
        let before = self.workouts.len();
        self.workouts.retain(|w| !filter.matches(w));
        Ok(before - self.workouts.len())
    }
}

impl SettingsStore for PlanState {
    fn settings(&self) -> Result<Option<Settings>> {
        Ok(self.settings.clone())
    }

    fn upsert_settings(&mut self, settings: Settings) -> Result<Settings> {
        self.settings = Some(settings.clone());
        Ok(settings)
    }
}
