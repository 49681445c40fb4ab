//! Application-level configuration loading: default match setup and storage backend selection.

use std::{env, fs, io::ErrorKind, path::PathBuf};

use serde::Deserialize;
use tracing::{info, warn};

use crate::state::scoreboard::{MatchState, Stage};

/// Default location on disk where the server looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "BEACH_SCOREBOARD_CONFIG_PATH";
/// Environment variable selecting the archive backend.
const STORAGE_BACKEND_ENV: &str = "STORAGE_BACKEND";
const DEFAULT_TEAM1_NAME: &str = "Team 1";
const DEFAULT_TEAM2_NAME: &str = "Team 2";

#[derive(Debug, Clone, PartialEq, Eq)]
/// Immutable runtime configuration shared across the application.
pub struct AppConfig {
    team1_name: String,
    team2_name: String,
    stage: Stage,
}

impl AppConfig {
    /// Load the application configuration from disk, falling back to the built-in match setup.
    pub fn load() -> Self {
        let path = resolve_config_path();
        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<RawConfig>(&contents) {
                Ok(raw) => {
                    let app_config: Self = raw.into();
                    info!(
                        path = %path.display(),
                        team1 = %app_config.team1_name,
                        team2 = %app_config.team2_name,
                        stage = app_config.stage.label(),
                        "loaded match setup from config"
                    );
                    app_config
                }
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "failed to parse config; falling back to defaults"
                    );
                    Self::default()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    path = %path.display(),
                    "config file not found; using built-in defaults"
                );
                Self::default()
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to read config; falling back to defaults"
                );
                Self::default()
            }
        }
    }

    /// A zeroed match seeded with the configured team names and stage.
    pub fn fresh_match(&self) -> MatchState {
        MatchState::new(self.team1_name.clone(), self.team2_name.clone(), self.stage)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            team1_name: DEFAULT_TEAM1_NAME.into(),
            team2_name: DEFAULT_TEAM2_NAME.into(),
            stage: Stage::GroupStage,
        }
    }
}

#[derive(Debug, Deserialize)]
/// JSON representation of the configuration file located at [`DEFAULT_CONFIG_PATH`].
struct RawConfig {
    #[serde(default)]
    team1_name: Option<String>,
    #[serde(default)]
    team2_name: Option<String>,
    #[serde(default)]
    stage: Option<Stage>,
}

impl From<RawConfig> for AppConfig {
    fn from(value: RawConfig) -> Self {
        let defaults = Self::default();
        let non_blank = |name: Option<String>| {
            name.map(|name| name.trim().to_string())
                .filter(|name| !name.is_empty())
        };
        Self {
            team1_name: non_blank(value.team1_name).unwrap_or(defaults.team1_name),
            team2_name: non_blank(value.team2_name).unwrap_or(defaults.team2_name),
            stage: value.stage.unwrap_or(defaults.stage),
        }
    }
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}

/// Archive backend selected through `STORAGE_BACKEND`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    /// Local SQLite file.
    Sqlite,
    /// MongoDB collection.
    Mongo,
    /// CouchDB database.
    Couch,
    /// Process memory, lost on shutdown.
    Memory,
}

impl StorageBackend {
    /// Read the backend from the environment, defaulting to SQLite.
    pub fn from_env() -> Self {
        match env::var(STORAGE_BACKEND_ENV) {
            Ok(value) => Self::parse(&value).unwrap_or_else(|| {
                warn!(value = %value, "unknown storage backend; using sqlite");
                StorageBackend::Sqlite
            }),
            Err(_) => StorageBackend::Sqlite,
        }
    }

    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "sqlite" => Some(StorageBackend::Sqlite),
            "mongo" | "mongodb" => Some(StorageBackend::Mongo),
            "couch" | "couchdb" => Some(StorageBackend::Couch),
            "memory" => Some(StorageBackend::Memory),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::scoreboard::TeamSide;

    #[test]
    fn partial_config_keeps_defaults() {
        let raw: RawConfig = serde_json::from_str(r#"{ "team1_name": "  Sand Sharks " }"#).unwrap();
        let config = AppConfig::from(raw);

        let state = config.fresh_match();
        assert_eq!(state.team_name(TeamSide::Team1), "Sand Sharks");
        assert_eq!(state.team_name(TeamSide::Team2), DEFAULT_TEAM2_NAME);
        assert_eq!(state.stage(), Stage::GroupStage);
    }

    #[test]
    fn blank_names_fall_back_and_stage_is_parsed() {
        let raw: RawConfig =
            serde_json::from_str(r#"{ "team2_name": "   ", "stage": "final" }"#).unwrap();
        let config = AppConfig::from(raw);

        assert_eq!(config.team2_name, DEFAULT_TEAM2_NAME);
        assert_eq!(config.stage, Stage::Final);
    }

    #[test]
    fn storage_backend_names() {
        assert_eq!(StorageBackend::parse("SQLite"), Some(StorageBackend::Sqlite));
        assert_eq!(StorageBackend::parse("mongodb"), Some(StorageBackend::Mongo));
        assert_eq!(StorageBackend::parse(" couch "), Some(StorageBackend::Couch));
        assert_eq!(StorageBackend::parse("memory"), Some(StorageBackend::Memory));
        assert_eq!(StorageBackend::parse("postgres"), None);
    }
}
