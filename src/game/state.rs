//! Match phases

use std::fmt;

use serde::Serialize;

/// Phase of a game. The normal cycle is
/// `Lobby → PreGame → PrePvp → Survival → Deathmatch → End → Lobby`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GameState {
    /// Players gather; no roles, no timers
    Lobby,
    /// Competitors are placed on their spawns and frozen
    PreGame,
    /// Looting with PVP disabled
    PrePvp,
    /// PVP enabled until the forced deathmatch
    Survival,
    /// Survivors are pulled back onto the spawns
    Deathmatch,
    /// Winner or draw announced, waiting to return to the lobby
    End,
}

impl GameState {
    /// A match is being played
    pub fn is_in_game(self) -> bool {
        matches!(
            self,
            GameState::PreGame | GameState::PrePvp | GameState::Survival | GameState::Deathmatch
        )
    }

    pub fn is_pvp_enabled(self) -> bool {
        matches!(self, GameState::Survival | GameState::Deathmatch)
    }

    /// Whether eliminations and quits can decide the match
    pub fn checks_for_winner(self) -> bool {
        self.is_in_game()
    }
}

impl fmt::Display for GameState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            GameState::Lobby => "lobby",
            GameState::PreGame => "pre_game",
            GameState::PrePvp => "pre_pvp",
            GameState::Survival => "survival",
            GameState::Deathmatch => "deathmatch",
            GameState::End => "end",
        };
        f.write_str(name)
    }
}
