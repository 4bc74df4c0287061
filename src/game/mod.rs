//! Survival game core: phases, roster, timers and announcements

pub mod announcer;
pub mod hooks;
pub mod r#match;
pub mod registry;
pub mod roster;
pub mod rules;
pub mod scheduler;
pub mod settings;
pub mod state;

pub use hooks::{BroadcastSink, ChatColor, GameHooks, LootManager, PlayerPresenter};
pub use r#match::{Game, GameError, GameHandle, GameSummary, LIMITER, MIN_PLAYERS};
pub use registry::{GameRegistry, RegistryError};
pub use roster::{PlayerRoster, Role};
pub use settings::{GameSettings, Location, SettingsFile, Timings, MAX_TIMING_SECS};
pub use state::GameState;
