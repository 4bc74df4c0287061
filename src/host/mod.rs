//! Collaborators for running without a world: every intent is logged

use tracing::{debug, info};

use crate::game::{BroadcastSink, ChatColor, Location, LootManager, PlayerPresenter};

/// Logs teleports, visibility changes, loot and chat instead of applying them
#[derive(Debug, Default)]
pub struct TracingHost;

impl PlayerPresenter for TracingHost {
    fn teleport(&self, player: &str, location: &Location) {
        debug!(player, location = %location, "teleport");
    }

    fn show(&self, player: &str) {
        debug!(player, "show");
    }

    fn hide(&self, player: &str) {
        debug!(player, "hide");
    }

    fn reset_player(&self, player: &str) {
        debug!(player, "reset player");
    }
}

impl LootManager for TracingHost {
    fn refill_chests(&self, game: &str) {
        info!(game, "Chests refilled");
    }

    fn clear_chests(&self, game: &str) {
        debug!(game, "Chests cleared");
    }
}

impl BroadcastSink for TracingHost {
    fn broadcast(&self, game: &str, recipients: &[&str], color: ChatColor, message: &str) {
        info!(
            target: "survival_games::chat",
            game,
            recipients = recipients.len(),
            %color,
            "{}",
            message
        );
    }
}
