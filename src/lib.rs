//! Survival games match server
//!
//! Runs timed multi-phase matches: players gather in a lobby, are placed in
//! an arena, loot, fight and are finally forced into a deathmatch before the
//! game returns to the lobby. The world itself (movement, damage, chests,
//! chat delivery) is reached through the collaborator traits in
//! [`game::hooks`].

pub mod app;
pub mod config;
pub mod game;
pub mod host;
pub mod util;
