//! What players may do in the world during each phase
//!
//! The hosting world asks these before applying movement, damage,
//! interaction, chat and respawns.

use super::r#match::Game;
use super::settings::Location;
use super::state::GameState;

impl Game {
    pub fn is_in_game(&self) -> bool {
        self.state().is_in_game()
    }

    pub fn is_pvp_enabled(&self) -> bool {
        self.state().is_pvp_enabled()
    }

    /// Competitors stay frozen on their spawns until the games start
    pub fn may_move(&self, player: &str) -> bool {
        !(self.state() == GameState::PreGame && self.is_competitor(player))
    }

    /// Whether `victim` may take damage. `attacker` is the damaging player,
    /// or `None` for the environment.
    pub fn may_damage(&self, victim: &str, attacker: Option<&str>) -> bool {
        if !self.is_in_game() || self.is_spectator(victim) {
            return false;
        }
        match attacker {
            Some(attacker) => self.is_pvp_enabled() && !self.is_spectator(attacker),
            None => self.state() != GameState::PreGame,
        }
    }

    /// Block use, item pickup and item drop
    pub fn may_interact(&self, player: &str) -> bool {
        !self.is_in_game() || !self.is_spectator(player)
    }

    /// Players who see a chat message from `sender`. During a match
    /// spectators only talk among themselves.
    pub fn chat_recipients(&self, sender: &str) -> Vec<String> {
        let roster = self.roster();
        if self.is_in_game() && roster.is_spectator(sender) {
            roster.spectators().map(str::to_string).collect()
        } else {
            roster.all().map(str::to_string).collect()
        }
    }

    /// Where `player` respawns; `None` leaves it to the world
    pub fn respawn_location(&self, player: &str) -> Option<&Location> {
        if !self.is_in_game() {
            return self.settings().lobby_spawn();
        }
        if self.is_spectator(player) {
            return self.settings().spectator_spawn();
        }
        None
    }
}
