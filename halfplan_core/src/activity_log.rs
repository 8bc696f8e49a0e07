//! Append-only activity log.
//!
//! Activities are appended to a JSONL (JSON Lines) file under an exclusive
//! file lock. The lock also covers id assignment and the external-id
//! uniqueness check, so the same webhook event can never be stored twice.

use crate::store::ActivityStore;
use crate::types::{Activity, NewActivity};
use crate::{Error, Result};
use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Read, Write};
use std::path::{Path, PathBuf};

/// JSONL-backed activity store with file locking
#[derive(Clone, Debug)]
pub struct ActivityLog {
    path: PathBuf,
}

impl ActivityLog {
    /// Create an activity log for the given path
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Ensure the parent directory exists
    fn ensure_parent_dir(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        Ok(())
    }
}

fn parse_lines<R: Read>(reader: R) -> Result<Vec<Activity>> {
    let mut activities = Vec::new();

    for (line_num, line_result) in BufReader::new(reader).lines().enumerate() {
        let line = line_result?;
        if line.trim().is_empty() {
            continue;
        }

        match serde_json::from_str::<Activity>(&line) {
            Ok(activity) => activities.push(activity),
            Err(e) => {
                tracing::warn!("Failed to parse activity at line {}: {}", line_num + 1, e);
            }
        }
    }

    Ok(activities)
}

/// Read all activities from a log file
pub fn read_activities(path: &Path) -> Result<Vec<Activity>> {
    if !path.exists() {
        return Ok(Vec::new());
    }

    let file = File::open(path)?;
    file.lock_shared()?;
    let activities = parse_lines(&file);
    file.unlock()?;

    let activities = activities?;
    tracing::debug!("Read {} activities from {:?}", activities.len(), path);
    Ok(activities)
}

impl ActivityStore for ActivityLog {
    fn list(&self) -> Result<Vec<Activity>> {
        read_activities(&self.path)
    }

    fn create(&mut self, record: NewActivity) -> Result<Activity> {
        self.ensure_parent_dir()?;

        let file = OpenOptions::new()
            .read(true)
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.lock_exclusive()?;

        let result = append_locked(&file, record);
        file.unlock()?;

        let activity = result?;
        tracing::info!(
            "Recorded activity {} (external id {})",
            activity.id,
            activity.external_id
        );
        Ok(activity)
    }

    fn clear(&mut self) -> Result<usize> {
        if !self.path.exists() {
            return Ok(0);
        }

        let file = OpenOptions::new().read(true).write(true).open(&self.path)?;
        file.lock_exclusive()?;
        let count = parse_lines(&file).map(|a| a.len());
        let truncated = file.set_len(0);
        file.unlock()?;

        truncated?;
        let count = count?;
        tracing::info!("Cleared {} activities from {:?}", count, self.path);
        Ok(count)
    }
}

/// Assign an id and append, with the exclusive lock already held
fn append_locked(file: &File, record: NewActivity) -> Result<Activity> {
    let existing = parse_lines(file)?;

    if existing.iter().any(|a| a.external_id == record.external_id) {
        return Err(Error::DuplicateActivity(record.external_id));
    }

    let id = existing.iter().map(|a| a.id).max().unwrap_or(0) + 1;
    let activity = Activity::from_new(id, record);

    let mut writer = std::io::BufWriter::new(file);
    let line = serde_json::to_string(&activity)?;
    writer.write_all(line.as_bytes())?;
    writer.write_all(b"\n")?;
    writer.flush()?;

    Ok(activity)
}
