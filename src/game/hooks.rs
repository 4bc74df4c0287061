//! Collaborators the game issues intents to
//!
//! The game never moves, renders or messages players itself. It calls these
//! traits while holding its own lock, so implementations must not call back
//! into the same game.

use std::fmt;
use std::sync::Arc;

use super::settings::Location;

/// Colour tag attached to broadcasts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChatColor {
    Red,
    Gold,
    Gray,
    DarkGreen,
}

impl fmt::Display for ChatColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ChatColor::Red => "red",
            ChatColor::Gold => "gold",
            ChatColor::Gray => "gray",
            ChatColor::DarkGreen => "dark_green",
        };
        f.write_str(name)
    }
}

/// Player presentation in the hosting world
pub trait PlayerPresenter: Send + Sync {
    fn teleport(&self, player: &str, location: &Location);
    fn show(&self, player: &str);
    fn hide(&self, player: &str);
    /// Restore health, hunger and inventory to a fresh state
    fn reset_player(&self, player: &str);
}

/// Loot chest population for one game's arena
pub trait LootManager: Send + Sync {
    fn refill_chests(&self, game: &str);
    fn clear_chests(&self, game: &str);
}

/// Delivers a message to the listed roster members
pub trait BroadcastSink: Send + Sync {
    fn broadcast(&self, game: &str, recipients: &[&str], color: ChatColor, message: &str);
}

/// Bundle of collaborators injected into every game
#[derive(Clone)]
pub struct GameHooks {
    pub presenter: Arc<dyn PlayerPresenter>,
    pub loot: Arc<dyn LootManager>,
    pub chat: Arc<dyn BroadcastSink>,
}

impl GameHooks {
    pub fn new(
        presenter: Arc<dyn PlayerPresenter>,
        loot: Arc<dyn LootManager>,
        chat: Arc<dyn BroadcastSink>,
    ) -> Self {
        Self {
            presenter,
            loot,
            chat,
        }
    }

    /// Use one value for all three collaborators
    pub fn from_single<T>(host: Arc<T>) -> Self
    where
        T: PlayerPresenter + LootManager + BroadcastSink + 'static,
    {
        Self {
            presenter: host.clone(),
            loot: host.clone(),
            chat: host,
        }
    }
}
