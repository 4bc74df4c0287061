//! Game state machine and its phase timers

use std::hash::{Hash, Hasher};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::{Mutex, MutexGuard};
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::Serialize;
use tokio::time::Instant;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::util::time::{
    format_duration_secs, whole_secs_until, ANNOUNCE_INITIAL_DELAY, ANNOUNCE_PERIOD,
    LOOT_REFILL_JITTER_SECS,
};

use super::announcer::{compute_announcements, Countdown};
use super::hooks::{ChatColor, GameHooks};
use super::roster::{PlayerRoster, Role};
use super::scheduler::{Repeat, Scheduler, TaskId};
use super::settings::{GameSettings, Timings, MAX_TIMING_SECS};
use super::state::GameState;

/// Separator line framing important announcements
pub const LIMITER: &str = "----------------------------------";

/// Players required to start a match
pub const MIN_PLAYERS: usize = 2;

/// Reasons a request to the game was refused
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GameError {
    #[error("game has been closed")]
    Closed,

    #[error("game is not in the lobby (currently {0})")]
    NotInLobby(GameState),

    #[error("game setup is incomplete")]
    SetupIncomplete,

    #[error("not enough players: {have} joined, {need} required")]
    NotEnoughPlayers { have: usize, need: usize },

    #[error("too many players: {have} joined, only {spawns} spawns")]
    TooManyPlayers { have: usize, spawns: usize },

    #[error("{field} of {secs}s exceeds the {max}s limit")]
    TimingOutOfRange {
        field: &'static str,
        secs: u64,
        max: u64,
    },
}

/// Point-in-time view of a game for hosts and logs
#[derive(Debug, Clone, Serialize)]
pub struct GameSummary {
    pub name: String,
    pub state: GameState,
    pub round_id: Option<Uuid>,
    pub round_started_at: Option<DateTime<Utc>>,
    pub players: usize,
    pub competitors: Vec<String>,
    pub spectators: Vec<String>,
    pub armed_timers: usize,
}

/// One survival game. All mutation goes through the methods below while the
/// owning `GameHandle`'s lock is held, timer callbacks included.
pub struct Game {
    name: String,
    state: GameState,
    closed: bool,
    round_id: Option<Uuid>,
    round_started_at: Option<DateTime<Utc>>,
    roster: PlayerRoster,
    settings: GameSettings,
    hooks: GameHooks,
    rng: ChaCha8Rng,
    scheduler: Scheduler<Game>,
    advance_task: Option<TaskId>,
    countdown_task: Option<TaskId>,
    loot_task: Option<TaskId>,
}

impl Game {
    fn new(
        name: String,
        settings: GameSettings,
        hooks: GameHooks,
        seed: u64,
        scheduler: Scheduler<Game>,
    ) -> Self {
        Self {
            name,
            state: GameState::Lobby,
            closed: false,
            round_id: None,
            round_started_at: None,
            roster: PlayerRoster::new(),
            settings,
            hooks,
            rng: ChaCha8Rng::seed_from_u64(seed),
            scheduler,
            advance_task: None,
            countdown_task: None,
            loot_task: None,
        }
    }

    // ---------------------------------------------------------------
    // Players
    // ---------------------------------------------------------------

    /// Add a player. Late joiners always spectate. Returns false if the
    /// name is already in the game or the game is closed.
    pub fn join(&mut self, player: &str) -> bool {
        if self.closed {
            warn!(game = %self.name, player, "Join refused, game is closed");
            return false;
        }
        if !self.roster.add(player) {
            return false;
        }

        let presenter = &self.hooks.presenter;
        match self.state {
            GameState::Lobby | GameState::End => {
                if let Some(spawn) = self.settings.lobby_spawn() {
                    presenter.teleport(player, spawn);
                }
                presenter.show(player);
                self.broadcast(
                    ChatColor::Gray,
                    &format!("'{}' joined the survivalgame!", player),
                );
            }
            GameState::PreGame
            | GameState::PrePvp
            | GameState::Survival
            | GameState::Deathmatch => {
                if let Some(spawn) = self.settings.spectator_spawn() {
                    presenter.teleport(player, spawn);
                }
                presenter.hide(player);
            }
        }

        info!(
            game = %self.name,
            player,
            state = %self.state,
            players = self.roster.len(),
            "Player joined game"
        );
        true
    }

    /// Remove a player and send them back to the lobby. Returns false if
    /// the player is not in the game.
    pub fn quit(&mut self, player: &str) -> bool {
        if !self.roster.contains(player) {
            return false;
        }

        let presenter = &self.hooks.presenter;
        if let Some(spawn) = self.settings.lobby_spawn() {
            presenter.teleport(player, spawn);
        }
        presenter.reset_player(player);
        presenter.show(player);

        self.roster.remove(player);
        info!(
            game = %self.name,
            player,
            players = self.roster.len(),
            "Player left game"
        );

        self.check_for_winner();
        true
    }

    /// A competitor died. Returns false if the player was not competing.
    pub fn on_death(&mut self, player: &str) -> bool {
        if !self.state.is_in_game() || !self.roster.eliminate(player) {
            return false;
        }
        self.hooks.presenter.hide(player);

        let survivors = self.roster.competitor_count();
        info!(game = %self.name, player, survivors, "Competitor eliminated");

        if survivors > 1 {
            self.broadcast(ChatColor::DarkGreen, "Another one bites the dust...");
            self.broadcast(
                ChatColor::Gray,
                &format!("{} survivors are still alive!", survivors),
            );
        }

        self.check_for_winner();
        true
    }

    /// End the match when one competitor (winner) or none (draw) is left
    pub fn check_for_winner(&mut self) {
        if !self.state.checks_for_winner() {
            return;
        }

        match self.roster.competitor_count() {
            0 => {
                self.broadcast(ChatColor::Red, LIMITER);
                self.broadcast(ChatColor::Red, "The game has ended!");
                self.broadcast(ChatColor::Gold, "Nobody survived :-[");
                self.broadcast(ChatColor::Red, LIMITER);
                info!(game = %self.name, round = ?self.round_id, "Match ended in a draw");
                self.go_to_end();
            }
            1 => {
                let winner = self.roster.sole_competitor().unwrap_or("UNKNOWN").to_string();
                self.broadcast(ChatColor::Red, LIMITER);
                self.broadcast(
                    ChatColor::Red,
                    &format!("The game has a winner: {}!", winner),
                );
                self.broadcast(ChatColor::Red, LIMITER);
                info!(game = %self.name, round = ?self.round_id, winner = %winner, "Match won");
                self.go_to_end();
            }
            _ => {}
        }
    }

    // ---------------------------------------------------------------
    // Admin
    // ---------------------------------------------------------------

    /// Start a match from the lobby
    pub fn start(&mut self) -> Result<(), GameError> {
        if self.closed {
            return Err(GameError::Closed);
        }
        if self.state != GameState::Lobby {
            return Err(GameError::NotInLobby(self.state));
        }
        if !self.settings.is_setup_complete() {
            warn!(game = %self.name, "Start refused, setup is incomplete");
            return Err(GameError::SetupIncomplete);
        }

        let have = self.roster.len();
        if have < MIN_PLAYERS {
            return Err(GameError::NotEnoughPlayers {
                have,
                need: MIN_PLAYERS,
            });
        }
        let spawns = self.settings.player_spawns().len();
        if have > spawns {
            return Err(GameError::TooManyPlayers { have, spawns });
        }

        self.go_to_pre_game();
        Ok(())
    }

    /// Abort the running match and return everyone to the lobby
    pub fn stop_game(&mut self) {
        self.broadcast(ChatColor::Red, LIMITER);
        self.broadcast(ChatColor::Red, "Game has been stopped by an admin!");
        self.broadcast(ChatColor::Red, LIMITER);
        info!(game = %self.name, state = %self.state, "Game stopped by admin");
        self.go_to_lobby();
    }

    /// Stop the game for good; the roster is emptied and later joins and
    /// starts are refused
    pub fn close_game(&mut self) {
        self.broadcast(ChatColor::Red, LIMITER);
        self.broadcast(ChatColor::Red, "Game has been closed by an admin!");
        self.broadcast(ChatColor::Red, LIMITER);
        self.go_to_lobby();

        self.roster.clear();
        self.disarm();
        self.settings.reset();
        self.hooks.loot.clear_chests(&self.name);
        self.closed = true;
        info!(game = %self.name, "Game closed");
    }

    /// Override phase timings for the next match. Only allowed in the lobby;
    /// the next return to the lobby restores the defaults.
    pub fn configure_timings(&mut self, timings: Timings) -> Result<(), GameError> {
        if self.closed {
            return Err(GameError::Closed);
        }
        if self.state != GameState::Lobby {
            return Err(GameError::NotInLobby(self.state));
        }
        if let Some((field, secs)) = timings.out_of_range() {
            return Err(GameError::TimingOutOfRange {
                field,
                secs,
                max: MAX_TIMING_SECS,
            });
        }
        self.settings.override_timings(timings);
        info!(game = %self.name, ?timings, "Timings overridden for next match");
        Ok(())
    }

    // ---------------------------------------------------------------
    // Transitions
    // ---------------------------------------------------------------

    /// Back to the lobby: timers cancelled, settings reset, loot cleared,
    /// every player reset and shown at the lobby spawn. Idempotent.
    pub fn go_to_lobby(&mut self) {
        self.state = GameState::Lobby;
        self.disarm();
        self.settings.reset();
        self.hooks.loot.clear_chests(&self.name);

        let presenter = &self.hooks.presenter;
        let lobby_spawn = self.settings.lobby_spawn();
        for player in self.roster.all() {
            if let Some(spawn) = lobby_spawn {
                presenter.teleport(player, spawn);
            }
            presenter.show(player);
            presenter.reset_player(player);
        }
        self.roster.assign_all(Role::Spectator);

        if let Some(round) = self.round_id.take() {
            info!(game = %self.name, %round, "Returned to lobby");
        }
        self.round_started_at = None;
    }

    fn go_to_pre_game(&mut self) {
        self.state = GameState::PreGame;
        let round = Uuid::new_v4();
        self.round_id = Some(round);
        self.round_started_at = Some(Utc::now());

        self.roster.assign_all(Role::Competitor);
        for player in self.roster.all() {
            self.hooks.presenter.reset_player(player);
        }
        self.teleport_all_to_game_spawns();

        let secs = self.settings.pre_game_secs();
        self.arm_phase(secs, Countdown::GameStart);

        info!(
            game = %self.name,
            %round,
            competitors = self.roster.competitor_count(),
            "Match starting"
        );
        self.broadcast_info(&format!(
            "The games will start in {}! Prepare!",
            format_duration_secs(secs)
        ));
    }

    fn go_to_pre_pvp(&mut self) {
        self.state = GameState::PrePvp;
        self.refill_loot();

        let secs = self.settings.pre_pvp_secs();
        self.arm_phase(secs, Countdown::PvpStart);

        info!(game = %self.name, round = ?self.round_id, "Looting phase");
        self.broadcast_info(&format!(
            "PVP will be enabled in {}!",
            format_duration_secs(secs)
        ));
    }

    fn go_to_survival(&mut self) {
        self.state = GameState::Survival;

        let secs = self.settings.pre_deathmatch_secs();
        self.arm_phase(secs, Countdown::DeathmatchStart);

        info!(game = %self.name, round = ?self.round_id, "PVP enabled");
        self.broadcast_info(&format!(
            "Deathmatch will start in {}!",
            format_duration_secs(secs)
        ));
    }

    fn go_to_deathmatch(&mut self) {
        self.state = GameState::Deathmatch;
        self.teleport_all_to_game_spawns();

        info!(
            game = %self.name,
            round = ?self.round_id,
            competitors = self.roster.competitor_count(),
            "Deathmatch"
        );
        self.broadcast_info("The deathmatch has begun!");
    }

    fn go_to_end(&mut self) {
        self.state = GameState::End;
        self.disarm();

        for player in self.roster.all() {
            self.hooks.presenter.show(player);
        }

        let secs = self.settings.after_match_secs();
        self.arm_phase(secs, Countdown::ReturnToLobby);

        self.broadcast_info(&format!(
            "The game will return to the lobby in {}!",
            format_duration_secs(secs)
        ));
    }

    /// Advance timer of `expected` fired
    fn advance_from(&mut self, expected: GameState) {
        if self.closed || self.state != expected {
            debug!(game = %self.name, %expected, state = %self.state, "Stale advance timer");
            return;
        }

        self.advance_task = None;
        if let Some(countdown) = self.countdown_task.take() {
            self.scheduler.cancel(countdown);
        }

        match self.state {
            GameState::PreGame => self.go_to_pre_pvp(),
            GameState::PrePvp => self.go_to_survival(),
            GameState::Survival => self.go_to_deathmatch(),
            GameState::End => self.go_to_lobby(),
            GameState::Lobby | GameState::Deathmatch => {}
        }
    }

    /// Arm the advance timer and countdown for the current phase
    fn arm_phase(&mut self, secs: u64, countdown: Countdown) {
        let phase = self.state;
        let length = Duration::from_secs(secs);

        self.advance_task = Some(self.scheduler.schedule_once(
            "advance",
            length,
            move |game| game.advance_from(phase),
        ));

        let Some(target) = Instant::now().checked_add(length) else {
            warn!(game = %self.name, secs, "Phase too long for a countdown");
            return;
        };
        let mut last_remaining = secs;
        self.countdown_task = Some(self.scheduler.schedule_repeating(
            "countdown",
            ANNOUNCE_INITIAL_DELAY,
            ANNOUNCE_PERIOD,
            move |game| game.countdown_tick(countdown, target, &mut last_remaining),
        ));
    }

    /// Cancel every timer of this game
    fn disarm(&mut self) {
        self.scheduler.cancel_all();
        self.advance_task = None;
        self.countdown_task = None;
        self.loot_task = None;
    }

    /// Announce every checkpoint crossed since the previous tick; ticks
    /// drift against whole seconds and can skip a value
    fn countdown_tick(
        &mut self,
        countdown: Countdown,
        target: Instant,
        last_remaining: &mut u64,
    ) -> Repeat {
        if self.state != countdown.phase() {
            return Repeat::Stop;
        }

        let remaining = whole_secs_until(target);
        let previous = std::mem::replace(last_remaining, remaining);
        let phase_secs = match countdown {
            Countdown::GameStart => self.settings.pre_game_secs(),
            Countdown::PvpStart => self.settings.pre_pvp_secs(),
            Countdown::DeathmatchStart => self.settings.pre_deathmatch_secs(),
            Countdown::ReturnToLobby => self.settings.after_match_secs(),
        };

        for message in compute_announcements(countdown, previous, remaining, phase_secs) {
            self.broadcast(ChatColor::Gray, &message);
        }

        if remaining < 1 {
            self.countdown_task = None;
            Repeat::Stop
        } else {
            Repeat::Continue
        }
    }

    // ---------------------------------------------------------------
    // Loot
    // ---------------------------------------------------------------

    /// Refill now and schedule the next refill
    fn refill_loot(&mut self) {
        self.hooks.loot.refill_chests(&self.name);
        debug!(game = %self.name, "Loot refilled");

        let interval = self.settings.loot_refill_interval_secs();
        if interval > 0 {
            let jitter = self.rng.gen_range(0..LOOT_REFILL_JITTER_SECS);
            let delay = interval.saturating_add(jitter);
            self.loot_task = Some(self.scheduler.schedule_once(
                "loot_refill",
                Duration::from_secs(delay),
                |game| game.on_loot_timer(),
            ));
        }
    }

    fn on_loot_timer(&mut self) {
        self.loot_task = None;
        if self.state.is_in_game() {
            self.refill_loot();
        }
    }

    // ---------------------------------------------------------------
    // Teleportation and chat
    // ---------------------------------------------------------------

    /// Competitors go to the player spawns in a fresh random order,
    /// spectators to the spectator spawn
    fn teleport_all_to_game_spawns(&mut self) {
        let spawns = self.settings.player_spawns();
        let mut order: Vec<usize> = (0..spawns.len()).collect();
        order.shuffle(&mut self.rng);
        let mut free = order.into_iter().map(|index| &spawns[index]);

        let presenter = &self.hooks.presenter;
        for (player, role) in self.roster.members() {
            match role {
                Role::Competitor => match free.next() {
                    Some(spawn) => presenter.teleport(player, spawn),
                    None => warn!(game = %self.name, player, "No free player spawn"),
                },
                Role::Spectator => {
                    if let Some(spawn) = self.settings.spectator_spawn() {
                        presenter.teleport(player, spawn);
                    }
                }
            }
        }
    }

    /// Send a message to every player of this game
    pub fn broadcast(&self, color: ChatColor, message: &str) {
        let recipients: Vec<&str> = self.roster.all().collect();
        self.hooks
            .chat
            .broadcast(&self.name, &recipients, color, message);
    }

    fn broadcast_info(&self, message: &str) {
        self.broadcast(ChatColor::Gold, &format!("[INFO] {}", message));
    }

    // ---------------------------------------------------------------
    // Queries
    // ---------------------------------------------------------------

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn state(&self) -> GameState {
        self.state
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn round_id(&self) -> Option<Uuid> {
        self.round_id
    }

    pub fn roster(&self) -> &PlayerRoster {
        &self.roster
    }

    pub fn settings(&self) -> &GameSettings {
        &self.settings
    }

    pub fn is_in_lobby(&self) -> bool {
        self.state == GameState::Lobby
    }

    pub fn is_in_pre_game(&self) -> bool {
        self.state == GameState::PreGame
    }

    pub fn is_in_pre_pvp(&self) -> bool {
        self.state == GameState::PrePvp
    }

    pub fn is_in_survival(&self) -> bool {
        self.state == GameState::Survival
    }

    pub fn is_in_deathmatch(&self) -> bool {
        self.state == GameState::Deathmatch
    }

    pub fn is_in_end(&self) -> bool {
        self.state == GameState::End
    }

    pub fn is_competitor(&self, player: &str) -> bool {
        self.roster.is_competitor(player)
    }

    pub fn is_spectator(&self, player: &str) -> bool {
        self.roster.is_spectator(player)
    }

    pub fn is_setup_complete(&self) -> bool {
        self.settings.is_setup_complete()
    }

    pub fn is_full(&self) -> bool {
        self.roster.len() >= self.settings.player_spawns().len()
    }

    /// Number of timers still waiting to fire
    pub fn armed_timers(&self) -> usize {
        self.scheduler.armed_count()
    }

    /// Labels of the armed timers ("advance", "countdown", "loot_refill")
    pub fn armed_timer_labels(&self) -> Vec<&'static str> {
        self.scheduler.armed_labels()
    }

    pub fn summary(&self) -> GameSummary {
        GameSummary {
            name: self.name.clone(),
            state: self.state,
            round_id: self.round_id,
            round_started_at: self.round_started_at,
            players: self.roster.len(),
            competitors: self.roster.competitors().map(str::to_string).collect(),
            spectators: self.roster.spectators().map(str::to_string).collect(),
            armed_timers: self.scheduler.armed_count(),
        }
    }
}

/// Shared handle to a game. Every call locks the game for its duration.
#[derive(Clone)]
pub struct GameHandle {
    name: Arc<str>,
    inner: Arc<Mutex<Game>>,
}

impl GameHandle {
    /// Create a game in the lobby. Must be called inside a tokio runtime
    /// before any timer is armed.
    pub fn new(name: &str, settings: GameSettings, hooks: GameHooks, seed: u64) -> Self {
        let inner = Arc::new_cyclic(|weak| {
            Mutex::new(Game::new(
                name.to_string(),
                settings,
                hooks,
                seed,
                Scheduler::new(weak.clone()),
            ))
        });

        Self {
            name: Arc::from(name),
            inner,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Lock the game for queries or a sequence of calls
    pub fn lock(&self) -> MutexGuard<'_, Game> {
        self.inner.lock()
    }

    pub fn join(&self, player: &str) -> bool {
        self.inner.lock().join(player)
    }

    pub fn quit(&self, player: &str) -> bool {
        self.inner.lock().quit(player)
    }

    pub fn on_death(&self, player: &str) -> bool {
        self.inner.lock().on_death(player)
    }

    pub fn check_for_winner(&self) {
        self.inner.lock().check_for_winner();
    }

    pub fn start(&self) -> Result<(), GameError> {
        self.inner.lock().start()
    }

    pub fn stop_game(&self) {
        self.inner.lock().stop_game();
    }

    pub fn close_game(&self) {
        self.inner.lock().close_game();
    }

    pub fn go_to_lobby(&self) {
        self.inner.lock().go_to_lobby();
    }

    pub fn configure_timings(&self, timings: Timings) -> Result<(), GameError> {
        self.inner.lock().configure_timings(timings)
    }

    pub fn state(&self) -> GameState {
        self.inner.lock().state()
    }

    pub fn summary(&self) -> GameSummary {
        self.inner.lock().summary()
    }
}

impl std::fmt::Debug for GameHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GameHandle").field("name", &self.name).finish()
    }
}

impl PartialEq for GameHandle {
    fn eq(&self, other: &Self) -> bool {
        self.name.eq_ignore_ascii_case(&other.name)
    }
}

impl Eq for GameHandle {}

impl Hash for GameHandle {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.to_ascii_lowercase().hash(state);
    }
}
