//! User preferences stored as TOML.

use crate::games::tictactoe::Difficulty;
use derive_getters::Getters;
use derive_more::{Display, Error};
use derive_setters::Setters;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

/// Default preferences file name, relative to the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "triqui.toml";

/// Persisted user preferences.
#[derive(Debug, Clone, PartialEq, Eq, Getters, Setters, Serialize, Deserialize)]
#[setters(prefix = "with_")]
pub struct Preferences {
    /// Computer difficulty for vs-computer games.
    #[serde(default)]
    difficulty: Difficulty,

    /// Display name shown in online play.
    #[serde(default = "default_player_name")]
    player_name: String,

    /// Stable id sent to the online server.
    #[serde(default = "Uuid::new_v4")]
    player_id: Uuid,

    /// Online server host.
    #[serde(default = "default_server_host")]
    server_host: String,

    /// Online server port.
    #[serde(default = "default_server_port")]
    server_port: u16,

    /// SQLite database file.
    #[serde(default = "default_db_path")]
    db_path: String,

    /// Remote state polling interval in milliseconds.
    #[serde(default = "default_poll_interval_ms")]
    poll_interval_ms: u64,

    /// Pause before the computer moves, in milliseconds.
    #[serde(default = "default_computer_delay_ms")]
    computer_delay_ms: u64,
}

#[instrument]
fn default_player_name() -> String {
    "Player".to_string()
}

#[instrument]
fn default_server_host() -> String {
    "127.0.0.1".to_string()
}

fn default_server_port() -> u16 {
    8080
}

fn default_db_path() -> String {
    "triqui.db".to_string()
}

fn default_poll_interval_ms() -> u64 {
    2000
}

fn default_computer_delay_ms() -> u64 {
    500
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            difficulty: Difficulty::default(),
            player_name: default_player_name(),
            player_id: Uuid::new_v4(),
            server_host: default_server_host(),
            server_port: default_server_port(),
            db_path: default_db_path(),
            poll_interval_ms: default_poll_interval_ms(),
            computer_delay_ms: default_computer_delay_ms(),
        }
    }
}

impl Preferences {
    /// Loads preferences from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file cannot be read or parsed.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        debug!("Loading preferences from file");
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::new(format!("Failed to read preferences: {}", e)))?;

        let prefs: Self = toml::from_str(&content)
            .map_err(|e| ConfigError::new(format!("Failed to parse preferences: {}", e)))?;

        info!(player = %prefs.player_name, "Preferences loaded");
        Ok(prefs)
    }

    /// Loads preferences, creating and saving defaults when the file is
    /// missing. Missing fields take their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if an existing file is unreadable or invalid,
    /// or if the defaults cannot be written.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if path.exists() {
            return Self::from_file(path);
        }
        warn!("Preferences file missing, writing defaults");
        let prefs = Self::default();
        prefs.save(path)?;
        Ok(prefs)
    }

    /// Writes preferences as TOML.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if serialization or the write fails.
    #[instrument(skip(self, path), fields(path = %path.as_ref().display()))]
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| ConfigError::new(format!("Failed to serialize preferences: {}", e)))?;
        std::fs::write(path.as_ref(), content)
            .map_err(|e| ConfigError::new(format!("Failed to write preferences: {}", e)))?;
        debug!("Preferences saved");
        Ok(())
    }

    /// Restores every field to its default but keeps the player id.
    #[instrument(skip(self))]
    pub fn reset(&mut self) {
        let player_id = self.player_id;
        *self = Self::default().with_player_id(player_id);
        info!("Preferences reset");
    }

    /// Replaces the player id with a fresh random one and returns it.
    #[instrument(skip(self))]
    pub fn regenerate_player_id(&mut self) -> Uuid {
        self.player_id = Uuid::new_v4();
        info!(player_id = %self.player_id, "New player id");
        self.player_id
    }

    /// Base URL of the online API, e.g. `http://127.0.0.1:8080/api/v1`.
    pub fn api_base_url(&self) -> String {
        format!("http://{}:{}/api/v1", self.server_host, self.server_port)
    }

    /// Polling interval as a duration.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Computer move delay as a duration.
    pub fn computer_delay(&self) -> Duration {
        Duration::from_millis(self.computer_delay_ms)
    }

    /// Sets the difficulty in place.
    pub fn set_difficulty(&mut self, difficulty: Difficulty) {
        self.difficulty = difficulty;
    }
}

/// Resolves the preferences path: explicit flag, then `TRIQUI_CONFIG`, then
/// [`DEFAULT_CONFIG_FILE`].
pub fn resolve_path(flag: Option<PathBuf>) -> PathBuf {
    flag.or_else(|| std::env::var_os("TRIQUI_CONFIG").map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE))
}

/// Configuration error.
#[derive(Debug, Clone, Display, Error)]
#[display("Config error: {} at {}:{}", message, file, line)]
pub struct ConfigError {
    /// Error message.
    pub message: String,
    /// Line number where error occurred.
    pub line: u32,
    /// Source file where error occurred.
    pub file: &'static str,
}

impl ConfigError {
    /// Creates a new configuration error.
    #[track_caller]
    #[instrument(skip(message))]
    pub fn new(message: String) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            message,
            line: loc.line(),
            file: loc.file(),
        }
    }
}
