// Shared fixtures for the match integration tests.
#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use survival_games::game::{
    BroadcastSink, ChatColor, GameHandle, GameHooks, GameSettings, Location, LootManager,
    PlayerPresenter, Timings,
};

/// Fixed seed so spawn shuffles and loot jitter repeat between runs
pub const SEED: u64 = 7;

/// One intent issued by a game
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Teleport { player: String, world: String },
    Show(String),
    Hide(String),
    Reset(String),
    Refill,
    Clear,
    Chat { recipients: usize, color: ChatColor, message: String },
}

/// Records every intent instead of applying it
#[derive(Debug, Default)]
pub struct Recorder {
    events: Mutex<Vec<Event>>,
}

impl Recorder {
    pub fn events(&self) -> Vec<Event> {
        self.events.lock().clone()
    }

    pub fn messages(&self) -> Vec<String> {
        self.events
            .lock()
            .iter()
            .filter_map(|event| match event {
                Event::Chat { message, .. } => Some(message.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn has_message(&self, text: &str) -> bool {
        self.messages().iter().any(|message| message.contains(text))
    }

    pub fn count(&self, wanted: &Event) -> usize {
        self.events.lock().iter().filter(|e| *e == wanted).count()
    }

    pub fn refills(&self) -> usize {
        self.count(&Event::Refill)
    }

    pub fn clear(&self) {
        self.events.lock().clear();
    }

    fn push(&self, event: Event) {
        self.events.lock().push(event);
    }
}

impl PlayerPresenter for Recorder {
    fn teleport(&self, player: &str, location: &Location) {
        self.push(Event::Teleport {
            player: player.to_string(),
            world: location.world.clone(),
        });
    }

    fn show(&self, player: &str) {
        self.push(Event::Show(player.to_string()));
    }

    fn hide(&self, player: &str) {
        self.push(Event::Hide(player.to_string()));
    }

    fn reset_player(&self, player: &str) {
        self.push(Event::Reset(player.to_string()));
    }
}

impl LootManager for Recorder {
    fn refill_chests(&self, _game: &str) {
        self.push(Event::Refill);
    }

    fn clear_chests(&self, _game: &str) {
        self.push(Event::Clear);
    }
}

impl BroadcastSink for Recorder {
    fn broadcast(&self, _game: &str, recipients: &[&str], color: ChatColor, message: &str) {
        self.push(Event::Chat {
            recipients: recipients.len(),
            color,
            message: message.to_string(),
        });
    }
}

/// Short phases so a whole match fits in a couple of minutes of virtual time
pub fn short_timings() -> Timings {
    Timings {
        pre_game_secs: 10,
        pre_pvp_secs: 20,
        pre_deathmatch_secs: 30,
        after_match_secs: 5,
        loot_refill_interval_secs: 0,
    }
}

/// Lobby and spectator spawns plus `spawns` player spawns in "arena"
pub fn settings(spawns: usize, timings: Timings) -> GameSettings {
    let player_spawns = (0..spawns)
        .map(|i| Location::new("arena", i as f64 * 4.0, 65.0, 0.0))
        .collect();
    GameSettings::new(
        Some(Location::new("lobby", 0.0, 64.0, 0.0)),
        Some(Location::new("sky", 0.0, 120.0, 0.0)),
        player_spawns,
        timings,
    )
}

pub fn hooks() -> (Arc<Recorder>, GameHooks) {
    let recorder = Arc::new(Recorder::default());
    let hooks = GameHooks::new(recorder.clone(), recorder.clone(), recorder.clone());
    (recorder, hooks)
}

/// A game named "arena" with eight spawns and short timings
pub fn game() -> (Arc<Recorder>, GameHandle) {
    game_with(settings(8, short_timings()))
}

pub fn game_with(settings: GameSettings) -> (Arc<Recorder>, GameHandle) {
    let (recorder, hooks) = hooks();
    let game = GameHandle::new("arena", settings, hooks, SEED);
    (recorder, game)
}

/// Join `players` and start the match
pub fn started(players: &[&str]) -> (Arc<Recorder>, GameHandle) {
    let (recorder, game) = game();
    for player in players {
        assert!(game.join(player));
    }
    game.start().expect("match should start");
    (recorder, game)
}

pub async fn sleep_secs(secs: u64) {
    tokio::time::sleep(Duration::from_secs(secs)).await;
}

pub async fn sleep_millis(millis: u64) {
    tokio::time::sleep(Duration::from_millis(millis)).await;
}
