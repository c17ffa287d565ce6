//! Application configuration.
//!
//! # Responsibility
//! - Load the JSON config file, merging partial files over defaults.
//! - Apply environment overrides and validate the result.
//!
//! # Invariants
//! - A missing file yields defaults; a malformed file is an error.
//! - `TASKMIND_API_KEY` and `TASKMIND_DB_PATH` win over file values.
//! - The API key never appears in `Display` output or logs.

use crate::model::task::Responsibility;
use crate::oracle::history::DEFAULT_HISTORY_TURNS;
use crate::parser::classifier::{CustomProject, RoleContext};
use log::info;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::Path;

pub const API_KEY_ENV: &str = "TASKMIND_API_KEY";
pub const DB_PATH_ENV: &str = "TASKMIND_DB_PATH";

const MAX_TEMPERATURE: f32 = 2.0;

#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(serde_json::Error),
    Invalid(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(err) => write!(f, "cannot read config: {err}"),
            Self::Parse(err) => write!(f, "malformed config: {err}"),
            Self::Invalid(message) => write!(f, "invalid config: {message}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Parse(err) => Some(err),
            Self::Invalid(_) => None,
        }
    }
}

impl From<std::io::Error> for ConfigError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(value: serde_json::Error) -> Self {
        Self::Parse(value)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: "taskmind.db".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    /// Absolute log directory; file logging is off when unset.
    pub dir: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: crate::logging::default_log_level().to_string(),
            dir: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssistantConfig {
    pub api_url: String,
    pub api_key: String,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub timeout_secs: u64,
    pub offline_mode: bool,
    pub history_turns: usize,
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            api_url: "https://api.deepseek.com/v1/chat/completions".to_string(),
            api_key: String::new(),
            model: "deepseek-chat".to_string(),
            temperature: 0.7,
            max_tokens: 1000,
            timeout_secs: 30,
            offline_mode: true,
            history_turns: DEFAULT_HISTORY_TURNS,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileConfig {
    pub default_project: Option<String>,
    pub default_responsibility: Option<String>,
    pub custom_projects: Vec<CustomProject>,
}

impl ProfileConfig {
    /// Profile defaults handed to the classifier.
    pub fn role_context(&self) -> RoleContext {
        RoleContext {
            default_project: self
                .default_project
                .as_deref()
                .map(str::trim)
                .filter(|project| !project.is_empty())
                .map(str::to_string),
            default_responsibility: self
                .default_responsibility
                .as_deref()
                .and_then(Responsibility::parse),
            custom_projects: self.custom_projects.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub logging: LoggingConfig,
    pub assistant: AssistantConfig,
    pub profile: ProfileConfig,
}

impl AppConfig {
    /// Parses a JSON document; absent keys keep their defaults.
    pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(raw)?)
    }

    /// Applies overrides from a variable lookup.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(api_key) = lookup(API_KEY_ENV).filter(|value| !value.trim().is_empty()) {
            self.assistant.api_key = api_key.trim().to_string();
        }
        if let Some(path) = lookup(DB_PATH_ENV).filter(|value| !value.trim().is_empty()) {
            self.database.path = path.trim().to_string();
        }
    }

    /// Checks value ranges and enum literals.
    ///
    /// # Errors
    /// - `ConfigError::Invalid` naming the first offending key.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.database.path.trim().is_empty() {
            return Err(ConfigError::Invalid("database.path must not be empty".to_string()));
        }
        let temperature = self.assistant.temperature;
        if !(0.0..=MAX_TEMPERATURE).contains(&temperature) {
            return Err(ConfigError::Invalid(format!(
                "assistant.temperature must be within [0, {MAX_TEMPERATURE}], got {temperature}"
            )));
        }
        if self.assistant.history_turns == 0 {
            return Err(ConfigError::Invalid(
                "assistant.history_turns must be at least 1".to_string(),
            ));
        }
        if self.assistant.timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "assistant.timeout_secs must be at least 1".to_string(),
            ));
        }
        if let Some(literal) = &self.profile.default_responsibility {
            if Responsibility::parse(literal).is_none() {
                return Err(ConfigError::Invalid(format!(
                    "profile.default_responsibility `{literal}` is not one of owner|participant|observer|supporter"
                )));
            }
        }
        if let Some(project) = self
            .profile
            .custom_projects
            .iter()
            .find(|project| project.id.trim().is_empty())
        {
            return Err(ConfigError::Invalid(format!(
                "profile.custom_projects entry with keywords {:?} has an empty id",
                project.keywords
            )));
        }
        Ok(())
    }
}

/// Loads, overrides and validates the config at `path`.
///
/// # Errors
/// - `ConfigError::Io` when the file exists but cannot be read.
/// - `ConfigError::Parse` for malformed JSON.
/// - `ConfigError::Invalid` when validation fails.
pub fn load_config(path: impl AsRef<Path>) -> Result<AppConfig, ConfigError> {
    let path = path.as_ref();
    let mut config = if path.exists() {
        AppConfig::from_json(&std::fs::read_to_string(path)?)?
    } else {
        AppConfig::default()
    };

    config.apply_env(|name| std::env::var(name).ok());
    config.validate()?;

    info!(
        "event=config_load module=config status=ok file_present={} offline_mode={} has_api_key={} custom_projects={}",
        path.exists(),
        config.assistant.offline_mode,
        !config.assistant.api_key.is_empty(),
        config.profile.custom_projects.len()
    );
    Ok(config)
}

/// Writes `config` as pretty JSON, creating parent directories.
pub fn save_config(path: impl AsRef<Path>, config: &AppConfig) -> Result<(), ConfigError> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, serde_json::to_string_pretty(config)?)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{AppConfig, ConfigError, API_KEY_ENV, DB_PATH_ENV};

    #[test]
    fn env_overrides_win_and_blank_values_are_ignored() {
        let mut config = AppConfig::default();
        config.apply_env(|name| match name {
            API_KEY_ENV => Some(" sk-test ".to_string()),
            DB_PATH_ENV => Some("   ".to_string()),
            _ => None,
        });
        assert_eq!(config.assistant.api_key, "sk-test");
        assert_eq!(config.database.path, "taskmind.db");
    }

    #[test]
    fn temperature_out_of_range_is_invalid() {
        let mut config = AppConfig::default();
        config.assistant.temperature = 2.5;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }
}
