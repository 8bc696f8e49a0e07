//! Configuration file support for halfplan.
//!
//! Configuration is loaded from `$XDG_CONFIG_HOME/halfplan/config.toml`.

use crate::plan::PlanLength;
use crate::types::default_weekly_goal;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application configuration
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub data: DataConfig,

    #[serde(default)]
    pub plan: PlanConfig,

    #[serde(default)]
    pub analysis: AnalysisConfig,
}

/// Data storage configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DataConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

impl DataConfig {
    pub fn plan_path(&self) -> PathBuf {
        self.data_dir.join("plan.json")
    }

    pub fn activities_path(&self) -> PathBuf {
        self.data_dir.join("activities.jsonl")
    }
}

/// Plan generation parameters
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PlanConfig {
    /// Weekly run goal used when setup does not specify one
    #[serde(default = "default_weekly_goal")]
    pub weekly_goal: u32,

    /// Generate all template weeks on setup instead of trimming to the
    /// weeks left before the race
    #[serde(default = "default_full_plan_on_setup")]
    pub full_plan_on_setup: bool,
}

impl Default for PlanConfig {
    fn default() -> Self {
        Self {
            weekly_goal: default_weekly_goal(),
            full_plan_on_setup: default_full_plan_on_setup(),
        }
    }
}

impl PlanConfig {
    pub fn setup_length(&self) -> PlanLength {
        if self.full_plan_on_setup {
            PlanLength::Full
        } else {
            PlanLength::Trimmed
        }
    }
}

/// External run analyzer
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct AnalysisConfig {
    /// Program and arguments; the run brief is written to its stdin
    #[serde(default)]
    pub command: Option<Vec<String>>,
}

// Default value functions
fn default_data_dir() -> PathBuf {
    let base = dirs::data_local_dir()
        .or_else(|| dirs::home_dir().map(|home| home.join(".local/share")))
        .unwrap_or_else(|| PathBuf::from("."));
    base.join("halfplan")
}

fn default_full_plan_on_setup() -> bool {
    true
}

impl Config {
    /// Load configuration from the standard config path
    pub fn load() -> Result<Self> {
        let config_path = Self::default_config_path();
        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            tracing::info!("No config file found at {:?}, using defaults", config_path);
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        tracing::info!("Loaded config from {:?}", path);
        Ok(config)
    }

    /// Reject values the engine cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.plan.weekly_goal == 0 {
            return Err(Error::Config("plan.weekly_goal must be at least 1".into()));
        }
        if matches!(&self.analysis.command, Some(argv) if argv.is_empty()) {
            return Err(Error::Config("analysis.command must not be empty".into()));
        }
        Ok(())
    }

    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        let base = dirs::config_dir()
            .or_else(|| dirs::home_dir().map(|home| home.join(".config")))
            .unwrap_or_else(|| PathBuf::from("."));
        base.join("halfplan").join("config.toml")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.plan.weekly_goal, 4);
        assert!(config.plan.full_plan_on_setup);
        assert_eq!(config.plan.setup_length(), PlanLength::Full);
        assert!(config.analysis.command.is_none());
        assert!(config.data.data_dir.ends_with("halfplan"));
    }

    #[test]
    fn test_load_from_file() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
[plan]
weekly_goal = 5

[analysis]
command = ["coach", "--json"]
"#,
        )
        .unwrap();

        let parsed = Config::load_from(&path).unwrap();
        assert_eq!(parsed.plan.weekly_goal, 5);
        assert_eq!(
            parsed.analysis.command,
            Some(vec!["coach".to_string(), "--json".to_string()])
        );
        assert_eq!(parsed.data.data_dir, Config::default().data.data_dir);
    }

    #[test]
    fn test_partial_config() {
        let toml_str = r#"
[plan]
full_plan_on_setup = false
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.plan.setup_length(), PlanLength::Trimmed);
        assert_eq!(config.plan.weekly_goal, 4);
        assert!(config.data.data_dir.ends_with("halfplan"));
    }

    #[test]
    fn test_data_paths() {
        let data = DataConfig {
            data_dir: PathBuf::from("/tmp/hp"),
        };
        assert_eq!(data.plan_path(), PathBuf::from("/tmp/hp/plan.json"));
        assert_eq!(
            data.activities_path(),
            PathBuf::from("/tmp/hp/activities.jsonl")
        );
    }

    #[test]
    fn test_invalid_values_rejected() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("config.toml");

        std::fs::write(&path, "[plan]\nweekly_goal = 0\n").unwrap();
        assert!(matches!(Config::load_from(&path), Err(Error::Config(_))));

        std::fs::write(&path, "[analysis]\ncommand = []\n").unwrap();
        assert!(matches!(Config::load_from(&path), Err(Error::Config(_))));

        std::fs::write(&path, "[plan\n").unwrap();
        assert!(matches!(Config::load_from(&path), Err(Error::Toml(_))));
    }
}
