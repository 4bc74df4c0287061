//! Registry of all games hosted by this server

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tracing::{debug, info};

use super::hooks::GameHooks;
use super::r#match::GameHandle;
use super::settings::GameSettings;

/// Registry errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    #[error("game '{0}' already exists")]
    GameExists(String),

    #[error("unknown game '{0}'")]
    UnknownGame(String),

    #[error("player '{player}' is already in game '{game}'")]
    AlreadyInGame { player: String, game: String },

    #[error("player '{0}' is not in any game")]
    NotInGame(String),

    #[error("game '{game}' refused player '{player}'")]
    JoinRefused { player: String, game: String },
}

/// Games keyed by lower-cased name, plus the game each player is in
pub struct GameRegistry {
    hooks: GameHooks,
    games: DashMap<String, GameHandle>,
    players: DashMap<String, String>,
}

fn key(name: &str) -> String {
    name.to_ascii_lowercase()
}

impl GameRegistry {
    pub fn new(hooks: GameHooks) -> Self {
        Self {
            hooks,
            games: DashMap::new(),
            players: DashMap::new(),
        }
    }

    /// Create a game in the lobby
    pub fn create_game(
        &self,
        name: &str,
        settings: GameSettings,
    ) -> Result<GameHandle, RegistryError> {
        match self.games.entry(key(name)) {
            Entry::Occupied(_) => Err(RegistryError::GameExists(name.to_string())),
            Entry::Vacant(slot) => {
                let seed = rand::random::<u64>();
                let handle = GameHandle::new(name, settings, self.hooks.clone(), seed);
                slot.insert(handle.clone());
                info!(game = name, "Created game");
                Ok(handle)
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<GameHandle> {
        self.games.get(&key(name)).map(|g| g.value().clone())
    }

    /// Close a game and forget it and its players
    pub fn close_game(&self, name: &str) -> Result<(), RegistryError> {
        let game_key = key(name);
        let (_, handle) = self
            .games
            .remove(&game_key)
            .ok_or_else(|| RegistryError::UnknownGame(name.to_string()))?;

        // Close before pruning: a concurrent join is then either refused by
        // the closed game or inserted before `retain` reaches its shard
        handle.close_game();
        self.players.retain(|_, game| *game != game_key);
        info!(game = name, "Game removed from registry");
        Ok(())
    }

    /// Close every game
    pub fn close_all(&self) {
        let names: Vec<String> = self.games.iter().map(|g| g.name().to_string()).collect();
        for name in names {
            if let Err(err) = self.close_game(&name) {
                debug!(game = %name, error = %err, "Game already gone");
            }
        }
    }

    /// Put `player` into `game`. A player is in at most one game.
    pub fn join(&self, game: &str, player: &str) -> Result<GameHandle, RegistryError> {
        let handle = self
            .get(game)
            .ok_or_else(|| RegistryError::UnknownGame(game.to_string()))?;

        match self.players.entry(player.to_string()) {
            Entry::Occupied(entry) => Err(RegistryError::AlreadyInGame {
                player: player.to_string(),
                game: entry.get().clone(),
            }),
            Entry::Vacant(slot) => {
                if !handle.join(player) {
                    return Err(RegistryError::JoinRefused {
                        player: player.to_string(),
                        game: game.to_string(),
                    });
                }
                slot.insert(key(game));
                Ok(handle)
            }
        }
    }

    /// Take `player` out of whatever game they are in
    pub fn quit(&self, player: &str) -> Result<(), RegistryError> {
        let (_, game_key) = self
            .players
            .remove(player)
            .ok_or_else(|| RegistryError::NotInGame(player.to_string()))?;

        if let Some(handle) = self.get(&game_key) {
            handle.quit(player);
        }
        Ok(())
    }

    /// Report the death of `player` to their game
    pub fn on_death(&self, player: &str) -> bool {
        self.game_of(player)
            .is_some_and(|handle| handle.on_death(player))
    }

    pub fn game_of(&self, player: &str) -> Option<GameHandle> {
        let game_key = self.players.get(player)?.value().clone();
        self.get(&game_key)
    }

    pub fn active_games(&self) -> usize {
        self.games.len()
    }

    pub fn total_players(&self) -> usize {
        self.players.len()
    }
}
