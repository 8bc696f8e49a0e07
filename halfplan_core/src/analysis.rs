//! Narrative run analysis through a pluggable analyzer.
//!
//! The brief handed to an analyzer is plain text describing the run, the
//! workout it fulfilled and a few earlier activities. Analysis is advisory:
//! callers that must not fail use [`analyze_or_placeholder`].

use crate::history::earlier_activities;
use crate::store::{ActivityStore, WorkoutFilter, WorkoutStore};
use crate::types::{Activity, ActivityId, PlannedWorkout};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::io::Write as _;
use std::process::{Command, Stdio};

/// Earlier activities included in a brief
pub const RECENT_ACTIVITY_COUNT: usize = 5;

/// Coaching feedback for one activity
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct RunAnalysis {
    pub activity_id: ActivityId,
    pub summary: String,
    pub insights: String,
    pub pace_analysis: Option<String>,
    pub hr_analysis: Option<String>,
    pub comparison: Option<String>,
    pub suggestions: Option<String>,
}

/// Narrative fields as returned by an analyzer program
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AnalyzerResponse {
    summary: String,
    insights: String,
    #[serde(default, alias = "pace_analysis")]
    pace_analysis: Option<String>,
    #[serde(default, alias = "hr_analysis")]
    hr_analysis: Option<String>,
    #[serde(default)]
    comparison: Option<String>,
    #[serde(default)]
    suggestions: Option<String>,
}

/// Format minutes per km as `M:SS`
pub fn format_pace(min_per_km: f64) -> String {
    let total_seconds = (min_per_km * 60.0).round() as u64;
    format!("{}:{:02}", total_seconds / 60, total_seconds % 60)
}

/// Format seconds as `Hh Mm Ss`, or `Mm Ss` under an hour
pub fn format_duration(seconds: u32) -> String {
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;
    if hours > 0 {
        format!("{}h {}m {}s", hours, minutes, secs)
    } else {
        format!("{}m {}s", minutes, secs)
    }
}

fn or_na<T: ToString>(value: Option<T>, suffix: &str) -> String {
    value
        .map(|v| format!("{}{}", v.to_string(), suffix))
        .unwrap_or_else(|| "N/A".into())
}

/// Everything an analyzer gets to see about one run
#[derive(Clone, Debug)]
pub struct AnalysisContext {
    pub activity: Activity,
    pub planned: Option<PlannedWorkout>,
    pub recent: Vec<Activity>,
}

impl AnalysisContext {
    /// Gather the activity, its linked workout and earlier activities
    pub fn gather<W, A>(workouts: &W, activities: &A, activity_id: ActivityId) -> Result<Self>
    where
        W: WorkoutStore,
        A: ActivityStore,
    {
        let activity = activities
            .get(activity_id)?
            .ok_or(Error::ActivityNotFound(activity_id))?;

        let planned = workouts
            .list(&WorkoutFilter::all().completed(true))?
            .into_iter()
            .find(|w| w.activity_id == Some(activity_id));

        let recent = earlier_activities(activities, &activity, RECENT_ACTIVITY_COUNT)?;

        Ok(Self {
            activity,
            planned,
            recent,
        })
    }

    fn activity_section(&self) -> String {
        let a = &self.activity;
        [
            format!("Activity: {}", a.name),
            format!("Date: {}", a.local_day()),
            format!("Type: {}", a.kind),
            format!("Distance: {:.2} km", a.distance_km()),
            format!("Duration: {}", format_duration(a.duration)),
            format!("Average Pace: {} /km", or_na(a.avg_pace.map(format_pace), "")),
            format!("Average Heart Rate: {}", or_na(a.avg_heart_rate, " bpm")),
            format!("Max Heart Rate: {}", or_na(a.max_heart_rate, " bpm")),
            format!("Calories: {}", or_na(a.calories, "")),
        ]
        .join("\n")
    }

    fn planned_section(&self) -> String {
        let Some(w) = &self.planned else {
            return "No planned workout was linked to this activity.".into();
        };
        [
            "Planned Workout:".to_string(),
            format!("- Type: {}", w.kind),
            format!("- Description: {}", w.description),
            format!("- Target Distance: {}", or_na(w.distance, " km")),
            format!(
                "- Target Duration: {}",
                or_na(w.duration.map(|m| format_duration(m * 60)), "")
            ),
            format!("- Week Number: {}", w.week_number),
        ]
        .join("\n")
    }

    fn recent_section(&self) -> String {
        if self.recent.is_empty() {
            return "No recent activities to compare with.".into();
        }
        let mut lines = vec![format!("Recent Activities (last {}):", self.recent.len())];
        lines.extend(self.recent.iter().map(|a| {
            format!(
                "- {}: {} - {:.2}km at {}/km, HR: {} bpm",
                a.local_day(),
                a.name,
                a.distance_km(),
                or_na(a.avg_pace.map(format_pace), ""),
                or_na(a.avg_heart_rate, "")
            )
        }));
        lines.join("\n")
    }

    /// Plain-text brief handed to an analyzer
    pub fn render(&self) -> String {
        format!(
            "{}\n\n{}\n\n{}\n",
            self.activity_section(),
            self.planned_section(),
            self.recent_section()
        )
    }
}

/// Produces narrative analysis for a run
pub trait RunAnalyzer {
    fn analyze(&self, context: &AnalysisContext) -> Result<RunAnalysis>;
}

/// Analyzer that pipes the brief into an external program
///
/// The program reads the brief on stdin and prints a JSON object with
/// `summary`, `insights` and the optional narrative fields on stdout.
#[derive(Clone, Debug)]
pub struct CommandAnalyzer {
    program: String,
    args: Vec<String>,
}

impl CommandAnalyzer {
    /// Build from an argv list; fails on an empty list
    pub fn from_argv(argv: &[String]) -> Result<Self> {
        let (program, args) = argv
            .split_first()
            .ok_or_else(|| Error::Config("analysis command must not be empty".into()))?;
        Ok(Self {
            program: program.clone(),
            args: args.to_vec(),
        })
    }
}

/// Pull the outermost JSON object out of free-form output
fn extract_json_object(output: &str) -> Option<&str> {
    let start = output.find('{')?;
    let end = output.rfind('}')?;
    (start < end).then(|| &output[start..=end])
}

impl RunAnalyzer for CommandAnalyzer {
    fn analyze(&self, context: &AnalysisContext) -> Result<RunAnalysis> {
        tracing::debug!("Running analyzer {} {:?}", self.program, self.args);

        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| Error::Analysis(format!("failed to start {}: {}", self.program, e)))?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(context.render().as_bytes())
                .map_err(|e| Error::Analysis(format!("failed to write brief: {}", e)))?;
        }

        let output = child
            .wait_with_output()
            .map_err(|e| Error::Analysis(format!("{} did not finish: {}", self.program, e)))?;
        if !output.status.success() {
            return Err(Error::Analysis(format!(
                "{} exited with {}: {}",
                self.program,
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let json = extract_json_object(&stdout)
            .ok_or_else(|| Error::Analysis("analyzer output contained no JSON object".into()))?;
        let response: AnalyzerResponse = serde_json::from_str(json)
            .map_err(|e| Error::Analysis(format!("unreadable analyzer output: {}", e)))?;

        Ok(RunAnalysis {
            activity_id: context.activity.id,
            summary: response.summary,
            insights: response.insights,
            pace_analysis: response.pace_analysis,
            hr_analysis: response.hr_analysis,
            comparison: response.comparison,
            suggestions: response.suggestions,
        })
    }
}

/// Analyzer used when none is configured
#[derive(Clone, Copy, Debug, Default)]
pub struct UnavailableAnalyzer;

impl RunAnalyzer for UnavailableAnalyzer {
    fn analyze(&self, _context: &AnalysisContext) -> Result<RunAnalysis> {
        Err(Error::Analysis("no analysis command configured".into()))
    }
}

/// Placeholder returned when analysis cannot be produced
pub fn placeholder(activity_id: ActivityId) -> RunAnalysis {
    RunAnalysis {
        activity_id,
        summary: "Run analysis is not available.".into(),
        insights: "Set [analysis] command in config.toml to a program that reads a run \
                   brief on stdin and prints JSON analysis."
            .into(),
        pace_analysis: None,
        hr_analysis: None,
        comparison: None,
        suggestions: None,
    }
}

/// Analyze with `analyzer`, substituting a placeholder on any failure
pub fn analyze_or_placeholder(analyzer: &dyn RunAnalyzer, context: &AnalysisContext) -> RunAnalysis {
    match analyzer.analyze(context) {
        Ok(analysis) => analysis,
        Err(e) => {
            tracing::warn!("Analysis of activity {} failed: {}", context.activity.id, e);
            placeholder(context.activity.id)
        }
    }
}
