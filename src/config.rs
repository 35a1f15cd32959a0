use crate::resolver::SameWeekdayPolicy;
use anyhow::{Context, Result, anyhow};
use chrono_tz::Tz;
use directories::ProjectDirs;
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable that overrides the stored CalDAV password
pub const PASSWORD_ENV_VAR: &str = "CALSKILL_CALDAV_PASSWORD";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub calendar: CalendarConfig,
    #[serde(default)]
    pub skill: SkillConfig,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    CalDav,
    Ics,
    #[default]
    Memory,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CalendarConfig {
    pub backend: BackendKind,
    /// URL of the calendar collection, e.g.
    /// https://cloud.example.com/remote.php/dav/calendars/alice/personal/
    pub url: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub ics_path: Option<PathBuf>,
    /// IANA timezone name used for "today" and for event times
    pub timezone: String,
    pub timeout_secs: u64,
}

/// What to do when a question carries no date at all
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingDatePolicy {
    /// Answer for today
    #[default]
    Today,
    /// Ask which day is meant
    AskForClarification,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SkillConfig {
    pub same_weekday: SameWeekdayPolicy,
    pub missing_date: MissingDatePolicy,
    /// How many days ahead "what is my next appointment" looks
    pub next_appointment_lookahead_days: u32,
}

impl Default for CalendarConfig {
    fn default() -> Self {
        Self {
            backend: BackendKind::default(),
            url: None,
            username: None,
            password: None,
            ics_path: None,
            timezone: "UTC".to_string(),
            timeout_secs: 10,
        }
    }
}

impl Default for SkillConfig {
    fn default() -> Self {
        Self {
            same_weekday: SameWeekdayPolicy::default(),
            missing_date: MissingDatePolicy::default(),
            next_appointment_lookahead_days: 30,
        }
    }
}

impl CalendarConfig {
    pub fn timezone(&self) -> Result<Tz> {
        self.timezone
            .parse::<Tz>()
            .map_err(|e| anyhow!("Unknown timezone '{}': {}", self.timezone, e))
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }

    /// Password from the environment, falling back to the config file
    pub fn password(&self) -> Option<SecretString> {
        std::env::var(PASSWORD_ENV_VAR)
            .ok()
            .filter(|p| !p.is_empty())
            .or_else(|| self.password.clone())
            .map(SecretString::from)
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let config_path = get_config_path()?;

        // If config doesn't exist, create default
        if !config_path.exists() {
            let default_config = Config::default();
            default_config.save_to(&config_path)?;
            return Ok(default_config);
        }

        Self::load_from(&config_path)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        toml::from_str(&content).context("Failed to parse config file")
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&get_config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        fs::write(path, content).context("Failed to write config file")?;

        Ok(())
    }
}

pub fn get_config_path() -> Result<PathBuf> {
    let proj_dirs = ProjectDirs::from("com", "calskill", "calskill")
        .context("Failed to determine config directory")?;

    Ok(proj_dirs.config_dir().join("config.toml"))
}
