//! Configuration module - environment variable parsing and settings loading

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::game::{GameSettings, Location, SettingsFile, Timings, MIN_PLAYERS};

/// Application configuration loaded from environment variables
#[derive(Clone, Debug)]
pub struct Config {
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,

    /// Name of the game hosted by the demo driver
    pub game_name: String,
    /// JSON settings file with spawns and timings; built-in layout if unset
    pub settings_path: Option<PathBuf>,

    /// Number of simulated players joined by the demo driver
    pub demo_players: usize,
    /// Time between simulated eliminations once PVP is enabled
    pub demo_kill_interval: Duration,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let demo_players = parse_var("SG_DEMO_PLAYERS", 4usize)?;
        if demo_players < MIN_PLAYERS {
            return Err(ConfigError::Invalid("SG_DEMO_PLAYERS"));
        }

        let demo_kill_interval =
            kill_interval(parse_var("SG_DEMO_KILL_INTERVAL_SECS", 20u64)?)?;

        Ok(Self {
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            game_name: env::var("SG_GAME_NAME").unwrap_or_else(|_| "arena".to_string()),
            settings_path: env::var_os("SG_SETTINGS_PATH").map(PathBuf::from),
            demo_players,
            demo_kill_interval,
        })
    }

    /// Load game settings from `settings_path`, or the built-in demo layout
    pub fn load_settings(&self) -> Result<GameSettings, ConfigError> {
        let Some(path) = &self.settings_path else {
            return Ok(demo_settings(self.demo_players));
        };

        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::SettingsIo {
            path: path.clone(),
            source,
        })?;
        let file: SettingsFile = serde_json::from_str(&raw)?;
        Ok(file.into())
    }
}

/// The demo driver ticks on this interval, so it must be non-zero
fn kill_interval(secs: u64) -> Result<Duration, ConfigError> {
    if secs == 0 {
        return Err(ConfigError::Invalid("SG_DEMO_KILL_INTERVAL_SECS"));
    }
    Ok(Duration::from_secs(secs))
}

fn parse_var<T: std::str::FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid(name)),
        Err(_) => Ok(default),
    }
}

/// Lobby, spectator platform and a ring of player spawns in one arena world
pub fn demo_settings(players: usize) -> GameSettings {
    let spawns = players.max(MIN_PLAYERS);
    let player_spawns = (0..spawns)
        .map(|i| {
            let angle = std::f64::consts::TAU * i as f64 / spawns as f64;
            Location::new(
                "arena",
                (angle.cos() * 24.0).round(),
                65.0,
                (angle.sin() * 24.0).round(),
            )
        })
        .collect();

    GameSettings::new(
        Some(Location::new("lobby", 0.5, 64.0, 0.5)),
        Some(Location::new("arena", 0.5, 96.0, 0.5)),
        player_spawns,
        Timings::default(),
    )
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for environment variable: {0}")]
    Invalid(&'static str),

    #[error("Cannot read settings file {path}: {source}")]
    SettingsIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid settings file: {0}")]
    SettingsParse(#[from] serde_json::Error),
}
