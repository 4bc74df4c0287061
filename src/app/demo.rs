//! Demo driver - plays matches with simulated players
//!
//! Stands in for the world that would normally report joins and deaths.

use rand::seq::IteratorRandom;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{info, warn};

use crate::game::{GameError, GameHandle, GameState};

use super::AppState;

/// Create the configured game, join the demo players and keep playing
/// matches until the task is dropped
pub async fn run(state: AppState) -> anyhow::Result<()> {
    let config = state.config.clone();
    let settings = config.load_settings()?;
    let game = state.registry.create_game(&config.game_name, settings)?;

    for i in 1..=config.demo_players {
        state.registry.join(&config.game_name, &format!("player{}", i))?;
    }

    let mut ticker = interval(config.demo_kill_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        ticker.tick().await;

        match game.state() {
            GameState::Lobby => {
                if let Err(err) = game.start() {
                    warn!(game = %game.name(), error = %err, "Cannot start match");
                    if err == GameError::SetupIncomplete || err == GameError::Closed {
                        return Ok(());
                    }
                }
            }
            phase if phase.is_pvp_enabled() => {
                if let Some(victim) = pick_victim(&game) {
                    log_elimination(&game, &victim);
                    game.on_death(&victim);
                }
            }
            _ => {}
        }
    }
}

fn pick_victim(game: &GameHandle) -> Option<String> {
    let guard = game.lock();
    let victim = guard
        .roster()
        .competitors()
        .choose(&mut rand::thread_rng())
        .map(str::to_string);
    victim
}

fn log_elimination(game: &GameHandle, victim: &str) {
    let summary = game.summary();
    match serde_json::to_string(&summary) {
        Ok(json) => info!(game = %game.name(), victim, summary = %json, "Simulated elimination"),
        Err(err) => warn!(error = %err, "Cannot serialize game summary"),
    }
}
