//! Per-game timings and spawn layout

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};
use tracing::warn;

/// A position in a named world, as persisted by the host ("world;x;y;z;yaw;pitch")
#[derive(Debug, Clone, PartialEq)]
pub struct Location {
    pub world: String,
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub yaw: f32,
    pub pitch: f32,
}

/// Malformed persisted location
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum LocationError {
    #[error("expected 6 ';'-separated fields, found {0}")]
    FieldCount(usize),

    #[error("world name is empty")]
    EmptyWorld,

    #[error("invalid number in field {0}")]
    InvalidNumber(&'static str),
}

impl Location {
    pub fn new(world: impl Into<String>, x: f64, y: f64, z: f64) -> Self {
        Self {
            world: world.into(),
            x,
            y,
            z,
            yaw: 0.0,
            pitch: 0.0,
        }
    }

    /// Lenient parse: a malformed string yields no location
    pub fn parse(text: &str) -> Option<Self> {
        match text.parse() {
            Ok(location) => Some(location),
            Err(err) => {
                warn!(location = text, error = %err, "Ignoring malformed location");
                None
            }
        }
    }

    /// True if both locations are in the same world and block
    pub fn same_block(&self, other: &Location) -> bool {
        self.world.eq_ignore_ascii_case(&other.world)
            && self.x.floor() == other.x.floor()
            && self.y.floor() == other.y.floor()
            && self.z.floor() == other.z.floor()
    }
}

impl FromStr for Location {
    type Err = LocationError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let fields: Vec<&str> = text.split(';').collect();
        if fields.len() != 6 {
            return Err(LocationError::FieldCount(fields.len()));
        }

        let world = fields[0].trim();
        if world.is_empty() {
            return Err(LocationError::EmptyWorld);
        }

        fn number<T: FromStr>(raw: &str, field: &'static str) -> Result<T, LocationError> {
            raw.trim()
                .parse()
                .map_err(|_| LocationError::InvalidNumber(field))
        }

        Ok(Self {
            world: world.to_string(),
            x: number(fields[1], "x")?,
            y: number(fields[2], "y")?,
            z: number(fields[3], "z")?,
            yaw: number(fields[4], "yaw")?,
            pitch: number(fields[5], "pitch")?,
        })
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{};{};{};{};{};{}",
            self.world, self.x, self.y, self.z, self.yaw, self.pitch
        )
    }
}

/// Longest accepted phase or refill interval: one day
pub const MAX_TIMING_SECS: u64 = 24 * 60 * 60;

/// Phase durations in seconds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Timings {
    /// Frozen countdown after teleporting into the arena
    pub pre_game_secs: u64,
    /// Looting phase with PVP disabled
    pub pre_pvp_secs: u64,
    /// Survival phase before the forced deathmatch
    pub pre_deathmatch_secs: u64,
    /// Delay between the end of a match and the return to the lobby
    pub after_match_secs: u64,
    /// Base interval between loot refills (0 disables refills after the first)
    pub loot_refill_interval_secs: u64,
}

impl Default for Timings {
    fn default() -> Self {
        Self {
            pre_game_secs: 30,
            pre_pvp_secs: 60,
            pre_deathmatch_secs: 900,
            after_match_secs: 15,
            loot_refill_interval_secs: 300,
        }
    }
}

impl Timings {
    /// First field above `MAX_TIMING_SECS`, with its value
    pub fn out_of_range(&self) -> Option<(&'static str, u64)> {
        [
            ("pre_game_secs", self.pre_game_secs),
            ("pre_pvp_secs", self.pre_pvp_secs),
            ("pre_deathmatch_secs", self.pre_deathmatch_secs),
            ("after_match_secs", self.after_match_secs),
            ("loot_refill_interval_secs", self.loot_refill_interval_secs),
        ]
        .into_iter()
        .find(|(_, secs)| *secs > MAX_TIMING_SECS)
    }

    /// Every field capped at `MAX_TIMING_SECS`
    pub fn clamped(self) -> Self {
        if let Some((field, secs)) = self.out_of_range() {
            warn!(field, secs, max = MAX_TIMING_SECS, "Clamping out of range timing");
        }
        Self {
            pre_game_secs: self.pre_game_secs.min(MAX_TIMING_SECS),
            pre_pvp_secs: self.pre_pvp_secs.min(MAX_TIMING_SECS),
            pre_deathmatch_secs: self.pre_deathmatch_secs.min(MAX_TIMING_SECS),
            after_match_secs: self.after_match_secs.min(MAX_TIMING_SECS),
            loot_refill_interval_secs: self.loot_refill_interval_secs.min(MAX_TIMING_SECS),
        }
    }
}

/// Persisted settings as stored by the host
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SettingsFile {
    #[serde(deserialize_with = "lenient_location")]
    pub lobby_spawn: Option<Location>,
    #[serde(deserialize_with = "lenient_location")]
    pub spectator_spawn: Option<Location>,
    #[serde(deserialize_with = "lenient_locations")]
    pub player_spawns: Vec<Location>,
    pub timings: Timings,
}

fn lenient_location<'de, D>(deserializer: D) -> Result<Option<Location>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.as_deref().and_then(Location::parse))
}

fn lenient_locations<'de, D>(deserializer: D) -> Result<Vec<Location>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Vec<String> = Vec::deserialize(deserializer)?;
    Ok(raw.iter().filter_map(|text| Location::parse(text)).collect())
}

/// Settings of one game. Spawns are read-only; timings can be overridden
/// for the next match and are restored by `reset`.
#[derive(Debug, Clone, Default)]
pub struct GameSettings {
    lobby_spawn: Option<Location>,
    spectator_spawn: Option<Location>,
    player_spawns: Vec<Location>,
    defaults: Timings,
    timings: Timings,
}

impl GameSettings {
    pub fn new(
        lobby_spawn: Option<Location>,
        spectator_spawn: Option<Location>,
        player_spawns: Vec<Location>,
        timings: Timings,
    ) -> Self {
        let timings = timings.clamped();
        Self {
            lobby_spawn,
            spectator_spawn,
            player_spawns,
            defaults: timings,
            timings,
        }
    }

    pub fn lobby_spawn(&self) -> Option<&Location> {
        self.lobby_spawn.as_ref()
    }

    pub fn spectator_spawn(&self) -> Option<&Location> {
        self.spectator_spawn.as_ref()
    }

    pub fn player_spawns(&self) -> &[Location] {
        &self.player_spawns
    }

    pub fn timings(&self) -> &Timings {
        &self.timings
    }

    pub fn pre_game_secs(&self) -> u64 {
        self.timings.pre_game_secs
    }

    pub fn pre_pvp_secs(&self) -> u64 {
        self.timings.pre_pvp_secs
    }

    pub fn pre_deathmatch_secs(&self) -> u64 {
        self.timings.pre_deathmatch_secs
    }

    pub fn after_match_secs(&self) -> u64 {
        self.timings.after_match_secs
    }

    pub fn loot_refill_interval_secs(&self) -> u64 {
        self.timings.loot_refill_interval_secs
    }

    /// Override timings until the next `reset`. Values are capped at
    /// `MAX_TIMING_SECS`.
    pub(crate) fn override_timings(&mut self, timings: Timings) {
        self.timings = timings.clamped();
    }

    /// Restore the configured default timings
    pub fn reset(&mut self) {
        self.timings = self.defaults;
    }

    /// Both fixed spawns exist and there are at least two player spawns
    pub fn is_setup_complete(&self) -> bool {
        self.lobby_spawn.is_some()
            && self.spectator_spawn.is_some()
            && self.player_spawns.len() > 1
    }
}

impl From<SettingsFile> for GameSettings {
    fn from(file: SettingsFile) -> Self {
        Self::new(
            file.lobby_spawn,
            file.spectator_spawn,
            file.player_spawns,
            file.timings,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_persisted_location() {
        let loc: Location = "arena;10.5;64;-3.25;90;0".parse().unwrap();
        assert_eq!(loc.world, "arena");
        assert_eq!(loc.x, 10.5);
        assert_eq!(loc.z, -3.25);
        assert_eq!(loc.yaw, 90.0);

        let again: Location = loc.to_string().parse().unwrap();
        assert_eq!(again, loc);
    }

    #[test]
    fn rejects_malformed_locations() {
        assert_eq!(
            "arena;1;2;3".parse::<Location>(),
            Err(LocationError::FieldCount(4))
        );
        assert_eq!(
            ";1;2;3;0;0".parse::<Location>(),
            Err(LocationError::EmptyWorld)
        );
        assert_eq!(
            "arena;1;two;3;0;0".parse::<Location>(),
            Err(LocationError::InvalidNumber("y"))
        );
        assert!(Location::parse("garbage").is_none());
    }

    #[test]
    fn same_block_ignores_fraction_and_world_case() {
        let a = Location::new("Arena", 1.2, 64.9, -0.5);
        let b = Location::new("arena", 1.8, 64.1, -0.1);
        let c = Location::new("arena", 2.0, 64.0, -0.5);
        assert!(a.same_block(&b));
        assert!(!a.same_block(&c));
    }

    #[test]
    fn settings_file_drops_bad_spawns() {
        let json = r#"{
            "lobby_spawn": "lobby;0;64;0;0;0",
            "spectator_spawn": "not a location",
            "player_spawns": ["arena;1;64;1;0;0", "broken", "arena;2;64;2;0;0"],
            "timings": { "pre_game_secs": 5 }
        }"#;
        let file: SettingsFile = serde_json::from_str(json).unwrap();
        let settings = GameSettings::from(file);

        assert!(settings.lobby_spawn().is_some());
        assert!(settings.spectator_spawn().is_none());
        assert_eq!(settings.player_spawns().len(), 2);
        assert_eq!(settings.pre_game_secs(), 5);
        assert_eq!(settings.pre_pvp_secs(), Timings::default().pre_pvp_secs);
        assert!(!settings.is_setup_complete());
    }

    #[test]
    fn reset_restores_default_timings() {
        let mut settings = GameSettings::new(None, None, Vec::new(), Timings::default());
        settings.override_timings(Timings {
            pre_game_secs: 1,
            ..Timings::default()
        });
        assert_eq!(settings.pre_game_secs(), 1);

        settings.reset();
        assert_eq!(settings.timings(), &Timings::default());
    }

    #[test]
    fn huge_timings_are_capped() {
        let json = r#"{ "timings": { "pre_game_secs": 18446744073709551615 } }"#;
        let file: SettingsFile = serde_json::from_str(json).unwrap();
        let mut settings = GameSettings::from(file);
        assert_eq!(settings.pre_game_secs(), MAX_TIMING_SECS);

        settings.override_timings(Timings {
            loot_refill_interval_secs: u64::MAX,
            ..Timings::default()
        });
        assert_eq!(settings.loot_refill_interval_secs(), MAX_TIMING_SECS);
    }

    #[test]
    fn out_of_range_names_the_field() {
        let timings = Timings {
            after_match_secs: MAX_TIMING_SECS + 1,
            ..Timings::default()
        };
        assert_eq!(
            timings.out_of_range(),
            Some(("after_match_secs", MAX_TIMING_SECS + 1))
        );
        assert_eq!(Timings::default().out_of_range(), None);
    }
}
