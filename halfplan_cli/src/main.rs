use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use halfplan_core::analysis::{CommandAnalyzer, UnavailableAnalyzer};
use halfplan_core::calendar::{self, current_week_number};
use halfplan_core::templates;
use halfplan_core::ingest::Loose;
use halfplan_core::tracker::{PlanOverview, SettingsOutcome};
use halfplan_core::*;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "halfplan")]
#[command(about = "Half-marathon training plan tracker", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Override data directory
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Print JSON instead of text
    #[arg(long, global = true)]
    json: bool,

    /// Pretend today is this date (YYYY-MM-DD)
    #[arg(long, global = true, hide = true)]
    today: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Set the race date and generate the training plan
    Setup {
        /// Race day (YYYY-MM-DD)
        #[arg(long)]
        race_date: String,

        /// Race name
        #[arg(long)]
        name: Option<String>,

        /// Runs per week to aim for
        #[arg(long)]
        weekly_goal: Option<u32>,
    },

    /// Show the dated training plan (default)
    Plan {
        /// Only show this plan week
        #[arg(long)]
        week: Option<u32>,
    },

    /// Record an activity from a webhook JSON payload
    Ingest {
        /// Read the payload from a file instead of stdin
        #[arg(long)]
        file: Option<PathBuf>,
    },

    /// Record a run by hand
    LogRun {
        /// Day of the run (YYYY-MM-DD or RFC 3339)
        #[arg(long)]
        date: String,

        /// Distance in kilometers
        #[arg(long)]
        distance_km: f64,

        /// Moving time in minutes
        #[arg(long)]
        minutes: f64,

        #[arg(long)]
        name: Option<String>,

        /// Activity type as the fitness platform names it
        #[arg(long = "type", default_value = "Run")]
        kind: String,

        #[arg(long)]
        avg_hr: Option<f64>,

        #[arg(long)]
        max_hr: Option<f64>,
    },

    /// List recorded activities, newest first
    Activities {
        #[arg(long, default_value_t = history::DEFAULT_PAGE_LIMIT)]
        limit: usize,

        #[arg(long, default_value_t = 0)]
        offset: usize,
    },

    /// Move a planned workout to another date
    Reschedule {
        /// Workout id as shown by `plan`
        id: WorkoutId,

        /// New date (YYYY-MM-DD)
        date: String,
    },

    /// Re-derive future volume from the latest completed week
    Regenerate,

    /// Discard the plan and generate it again from settings
    Reset,

    /// Delete every activity and start the plan over
    ClearAll {
        /// Confirm deletion
        #[arg(long)]
        yes: bool,
    },

    /// Show weekly statistics and the adaptation they would trigger
    Stats {
        /// Plan week (defaults to the current week)
        #[arg(long)]
        week: Option<u32>,
    },

    /// Export the plan and activities as CSV
    Export {
        /// Output directory
        #[arg(long)]
        out: PathBuf,
    },

    /// Narrative analysis of a recorded activity
    Analyze {
        /// Activity id as shown by `activities`
        id: ActivityId,
    },
}

/// Resolved paths and options shared by every command
struct Env {
    plan_path: PathBuf,
    activities_path: PathBuf,
    today: NaiveDate,
    json: bool,
    config: Config,
}

fn main() -> ExitCode {
    halfplan_core::logging::init();

    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::from(exit_code(&e))
        }
    }
}

fn exit_code(error: &Error) -> u8 {
    match error.kind() {
        ErrorKind::Validation => 2,
        ErrorKind::NotFound => 3,
        ErrorKind::Conflict => 4,
        ErrorKind::Dependency => 5,
        ErrorKind::Internal => 1,
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = Config::load()?;
    let data_dir = cli
        .data_dir
        .unwrap_or_else(|| config.data.data_dir.clone());
    let today = match cli.today.as_deref() {
        Some(day) => calendar::parse_day(day)?,
        None => calendar::today(),
    };
    tracing::debug!("Using data directory {:?}, today is {}", data_dir, today);

    let errors = templates::validate_templates();
    if !errors.is_empty() {
        eprintln!("Template validation errors:");
        for error in &errors {
            eprintln!("  - {}", error);
        }
        return Err(Error::TemplateValidation(errors.join("; ")));
    }

    let env = Env {
        plan_path: data_dir.join("plan.json"),
        activities_path: data_dir.join("activities.jsonl"),
        today,
        json: cli.json,
        config,
    };

    match cli.command {
        Some(Commands::Setup {
            race_date,
            name,
            weekly_goal,
        }) => cmd_setup(&env, &race_date, name, weekly_goal),
        Some(Commands::Plan { week }) => cmd_plan(&env, week),
        Some(Commands::Ingest { file }) => cmd_ingest(&env, file.as_deref()),
        Some(Commands::LogRun {
            date,
            distance_km,
            minutes,
            name,
            kind,
            avg_hr,
            max_hr,
        }) => {
            let payload = WebhookPayload {
                activity_id: Some(Loose::Text(format!("manual-{}", uuid::Uuid::new_v4()))),
                kind: Some(kind),
                name,
                distance: Some(Loose::Number(distance_km * 1000.0)),
                moving_time: Some(Loose::Number(minutes * 60.0)),
                elapsed_time: None,
                start_date: Some(date),
                average_heartrate: avg_hr.map(Loose::Number),
                max_heartrate: max_hr.map(Loose::Number),
                calories: None,
            };
            record(&env, &payload)
        }
        Some(Commands::Activities { limit, offset }) => cmd_activities(&env, limit, offset),
        Some(Commands::Reschedule { id, date }) => cmd_reschedule(&env, id, &date),
        Some(Commands::Regenerate) => cmd_regenerate(&env),
        Some(Commands::Reset) => cmd_reset(&env),
        Some(Commands::ClearAll { yes }) => cmd_clear_all(&env, yes),
        Some(Commands::Stats { week }) => cmd_stats(&env, week),
        Some(Commands::Export { out }) => cmd_export(&env, &out),
        Some(Commands::Analyze { id }) => cmd_analyze(&env, id),
        None => cmd_plan(&env, None),
    }
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn km(distance: Option<f64>) -> String {
    distance.map(|d| format!("{:.1} km", d)).unwrap_or_default()
}

fn cmd_setup(
    env: &Env,
    race_date: &str,
    name: Option<String>,
    weekly_goal: Option<u32>,
) -> Result<()> {
    let input = SettingsInput {
        race_date: Some(calendar::parse_day(race_date)?),
        race_name: name,
        weekly_goal,
    };

    let outcome: SettingsOutcome = PlanState::update(&env.plan_path, |state| {
        save_settings(
            state,
            input,
            env.config.plan.weekly_goal,
            env.config.plan.setup_length(),
            env.today,
        )
    })?;

    if env.json {
        return print_json(&outcome);
    }

    let verb = if outcome.created { "Created" } else { "Updated" };
    println!(
        "✓ {} settings: race on {}{}",
        verb,
        outcome.settings.race_date,
        outcome
            .settings
            .race_name
            .as_deref()
            .map(|n| format!(" ({})", n))
            .unwrap_or_default()
    );
    println!("  Weekly goal: {} runs", outcome.settings.weekly_goal);
    if outcome.plan_regenerated {
        println!("  Generated {} planned workouts", outcome.workouts_created);
    }
    Ok(())
}

fn cmd_plan(env: &Env, week: Option<u32>) -> Result<()> {
    let overview: PlanOverview =
        PlanState::update(&env.plan_path, |state| plan_overview(state, week, env.today))?;

    if env.json {
        return print_json(&overview);
    }

    println!(
        "{} on {}: week {} of {}, {}/{} runs done this week",
        overview.race_name.as_deref().unwrap_or("Race"),
        overview.race_date,
        overview.current_week,
        overview.total_weeks,
        overview.completed_this_week,
        overview.weekly_goal
    );

    let mut shown_week = None;
    for scheduled in &overview.workouts {
        let w = &scheduled.workout;
        if shown_week != Some(w.week_number) {
            println!("\nWeek {}", w.week_number);
            shown_week = Some(w.week_number);
        }
        println!(
            "  {} {} {:>4} {} {:<9} {:>8}  {}",
            if w.completed { "✓" } else { " " },
            scheduled.date,
            w.id,
            day_name(w.day_of_week),
            w.kind,
            km(w.distance),
            w.description
        );
    }
    Ok(())
}

fn cmd_ingest(env: &Env, file: Option<&Path>) -> Result<()> {
    let body = match file {
        Some(path) => std::fs::read_to_string(path)?,
        None => {
            let mut body = String::new();
            std::io::stdin().read_to_string(&mut body)?;
            body
        }
    };
    let payload: WebhookPayload = serde_json::from_str(&body)
        .map_err(|e| Error::Validation(format!("payload is not valid JSON: {}", e)))?;
    record(env, &payload)
}

/// Ingest a payload against the stores in the data directory and report
fn record(env: &Env, payload: &WebhookPayload) -> Result<()> {
    let mut log = ActivityLog::new(&env.activities_path);
    let outcome = PlanState::update(&env.plan_path, |state| {
        let settings = state.settings.clone();
        ingest(payload, settings.as_ref(), state, &mut log)
    })?;

    match outcome {
        IngestOutcome::Duplicate { id, relinked } => {
            if env.json {
                print_json(&serde_json::json!({
                    "status": "duplicate",
                    "id": id,
                    "linked_workout": relinked,
                }))?;
            } else {
                println!("Activity already recorded (id {})", id);
                if let Some(w) = relinked {
                    println!(
                        "  Completed week {} {} {} workout {}",
                        w.week_number,
                        day_name(w.day_of_week),
                        w.kind,
                        w.id
                    );
                }
            }
        }
        IngestOutcome::Created {
            activity,
            linked,
            adaptation,
        } => {
            if env.json {
                print_json(&serde_json::json!({
                    "status": "created",
                    "activity": activity,
                    "linked_workout": linked,
                    "adaptation": adaptation,
                }))?;
                return Ok(());
            }
            println!(
                "✓ Recorded activity {}: {} ({:.2} km)",
                activity.id,
                activity.name,
                activity.distance_km()
            );
            match linked {
                Some(w) => println!(
                    "  Completed week {} {} {} workout {}",
                    w.week_number,
                    day_name(w.day_of_week),
                    w.kind,
                    w.id
                ),
                None => println!("  No planned workout linked"),
            }
            if let Some(adaptation) = adaptation {
                for note in &adaptation.adjustments {
                    println!("  {}", note);
                }
            }
        }
    }
    Ok(())
}

fn cmd_activities(env: &Env, limit: usize, offset: usize) -> Result<()> {
    let log = ActivityLog::new(&env.activities_path);
    let page = history::page(&log, limit, offset)?;

    if env.json {
        return print_json(&page);
    }

    if page.activities.is_empty() {
        println!("No activities recorded.");
        return Ok(());
    }
    for a in &page.activities {
        println!(
            "{:>4} {} {:<6} {:>6.2} km {:>12} {:>5}  {}",
            a.id,
            a.local_day(),
            a.kind,
            a.distance_km(),
            analysis::format_duration(a.duration),
            a.avg_pace.map(analysis::format_pace).unwrap_or_default(),
            a.name
        );
    }
    println!(
        "Showing {}-{} of {}",
        page.offset + 1,
        page.offset + page.activities.len(),
        page.total
    );
    Ok(())
}

fn cmd_reschedule(env: &Env, id: WorkoutId, date: &str) -> Result<()> {
    let new_day = calendar::parse_day(date)?;
    let moved = PlanState::update(&env.plan_path, |state| {
        let settings = state.settings.clone();
        reschedule(settings.as_ref(), state, id, new_day)
    })?;

    if env.json {
        return print_json(&moved);
    }
    println!(
        "✓ Moved {} workout {} to {} (week {} {})",
        moved.kind,
        moved.id,
        new_day,
        moved.week_number,
        day_name(moved.day_of_week)
    );
    Ok(())
}

fn cmd_regenerate(env: &Env) -> Result<()> {
    let log = ActivityLog::new(&env.activities_path);
    let adaptation = PlanState::update(&env.plan_path, |state| {
        let settings = state.settings.clone();
        regenerate_plan(settings.as_ref(), state, &log)
    })?;

    if env.json {
        return print_json(&adaptation);
    }
    match adaptation {
        Some(a) => {
            println!("✓ Volume multiplier {:.2}", a.volume_multiplier);
            for note in &a.adjustments {
                println!("  {}", note);
            }
        }
        None => println!("Nothing to adapt yet."),
    }
    Ok(())
}

fn cmd_reset(env: &Env) -> Result<()> {
    let created = PlanState::update(&env.plan_path, |state| {
        reset_plan(state, env.config.plan.setup_length(), env.today)
    })?;

    if env.json {
        return print_json(&serde_json::json!({ "workouts_created": created }));
    }
    println!("✓ Plan reset, {} workouts generated", created);
    Ok(())
}

fn cmd_clear_all(env: &Env, yes: bool) -> Result<()> {
    if !yes {
        return Err(Error::Validation(
            "clear-all deletes every activity; pass --yes to confirm".into(),
        ));
    }

    let mut log = ActivityLog::new(&env.activities_path);
    let outcome = PlanState::update(&env.plan_path, |state| {
        clear_all(state, &mut log, env.config.plan.setup_length(), env.today)
    })?;

    if env.json {
        return print_json(&outcome);
    }
    println!(
        "✓ Deleted {} activities, {} workouts generated",
        outcome.activities_removed, outcome.workouts_created
    );
    Ok(())
}

fn cmd_stats(env: &Env, week: Option<u32>) -> Result<()> {
    let state = PlanState::load(&env.plan_path)?;
    let settings = state.settings.clone().ok_or(Error::SettingsMissing)?;
    let log = ActivityLog::new(&env.activities_path);

    let total_weeks = state.total_weeks()?.unwrap_or(0);
    let week =
        week.unwrap_or_else(|| current_week_number(settings.race_date, total_weeks, env.today));

    let stats = weekly_stats(&state, &log, week)?;
    let adaptation = adaptation::adapt_from_stats(&stats);

    if env.json {
        return print_json(&serde_json::json!({
            "week": week,
            "stats": stats,
            "adaptation": adaptation,
        }));
    }

    println!("Week {} of {}", week, total_weeks);
    println!(
        "  Completed: {}/{} ({:.0}%)",
        stats.completed_workouts,
        stats.planned_workouts,
        stats.completion_rate * 100.0
    );
    println!(
        "  Distance: {:.1} km run / {:.1} km planned",
        stats.total_actual_distance, stats.total_planned_distance
    );
    if let Some(hr) = stats.avg_heart_rate {
        println!("  Avg HR: {:.0} bpm", hr);
    }
    if let Some(hr) = stats.previous_week_avg_hr {
        println!("  Previous week avg HR: {:.0} bpm", hr);
    }
    println!("  Next weeks multiplier: {:.2}", adaptation.volume_multiplier);
    for note in &adaptation.adjustments {
        println!("  {}", note);
    }
    Ok(())
}

fn cmd_export(env: &Env, out: &Path) -> Result<()> {
    let state = PlanState::load(&env.plan_path)?;
    let settings = state.settings.clone().ok_or(Error::SettingsMissing)?;
    let log = ActivityLog::new(&env.activities_path);

    let plan_csv = out.join("plan.csv");
    let activities_csv = out.join("activities.csv");
    let workouts = export::write_plan_csv(&settings, &state.workouts, &plan_csv)?;
    let activities = export::write_activities_csv(&history::newest_first(&log)?, &activities_csv)?;

    println!("✓ Exported {} workouts to {}", workouts, plan_csv.display());
    println!(
        "✓ Exported {} activities to {}",
        activities,
        activities_csv.display()
    );
    Ok(())
}

fn cmd_analyze(env: &Env, id: ActivityId) -> Result<()> {
    let state = PlanState::load(&env.plan_path)?;
    let log = ActivityLog::new(&env.activities_path);
    let context = AnalysisContext::gather(&state, &log, id)?;

    let analysis = match env.config.analysis.command.as_deref() {
        Some(argv) => analyze_or_placeholder(&CommandAnalyzer::from_argv(argv)?, &context),
        None => analyze_or_placeholder(&UnavailableAnalyzer, &context),
    };

    if env.json {
        return print_json(&analysis);
    }

    println!("{}", analysis.summary);
    println!();
    println!("{}", analysis.insights);
    let sections = [
        ("Pace", &analysis.pace_analysis),
        ("Heart rate", &analysis.hr_analysis),
        ("Comparison", &analysis.comparison),
        ("Suggestions", &analysis.suggestions),
    ];
    for (title, body) in sections {
        if let Some(body) = body {
            println!("\n{}:\n{}", title, body);
        }
    }
    Ok(())
}
