//! Countdown announcements sampled by a repeating timer
//!
//! The announcer is edge triggered: it only speaks at a fixed set of
//! checkpoints, and a tick speaks for every checkpoint crossed since the
//! previous tick. Below one minute the displayed value is one second ahead
//! of the sampled remainder, because the sample is taken just after a
//! second boundary has passed.

use super::state::GameState;

/// Remaining-second values that trigger a seconds announcement
pub const SECOND_CHECKPOINTS: [u64; 13] = [0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 14, 29, 44];

/// Remaining-minute values that trigger a minutes announcement
pub const MINUTE_CHECKPOINTS: [u64; 8] = [1, 5, 10, 15, 20, 25, 30, 45];

/// What a countdown is counting down to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Countdown {
    GameStart,
    PvpStart,
    DeathmatchStart,
    ReturnToLobby,
}

impl Countdown {
    /// Phase the countdown is armed in; it goes stale once the game leaves it
    pub fn phase(self) -> GameState {
        match self {
            Countdown::GameStart => GameState::PreGame,
            Countdown::PvpStart => GameState::PrePvp,
            Countdown::DeathmatchStart => GameState::Survival,
            Countdown::ReturnToLobby => GameState::End,
        }
    }

    fn subject(self) -> &'static str {
        match self {
            Countdown::GameStart => "The games will start in",
            Countdown::PvpStart => "PVP will be enabled in",
            Countdown::DeathmatchStart => "Deathmatch will start in",
            Countdown::ReturnToLobby => "The game will return to the lobby in",
        }
    }
}

/// Message for one announcer tick, if `remaining_secs` is a checkpoint.
///
/// `phase_secs` is the configured length of the phase; the deathmatch
/// countdown stays quiet when the phase notice already announced the same
/// value.
pub fn compute_announcement(
    countdown: Countdown,
    remaining_secs: u64,
    phase_secs: u64,
) -> Option<String> {
    let subject = countdown.subject();
    let remaining_minutes = remaining_secs / 60;

    if remaining_minutes < 1 {
        if !SECOND_CHECKPOINTS.contains(&remaining_secs) {
            return None;
        }

        let shown = remaining_secs + 1;
        if shown == 1 {
            return Some(format!("{} 1 second...", subject));
        }
        if countdown == Countdown::DeathmatchStart && phase_secs == shown {
            return None;
        }
        return Some(format!("{} {} seconds...", subject, shown));
    }

    if remaining_secs % 60 != 0 || !MINUTE_CHECKPOINTS.contains(&remaining_minutes) {
        return None;
    }

    if remaining_minutes == 1 {
        Some(format!("{} 1 minute...", subject))
    } else {
        Some(format!("{} {} minutes...", subject, remaining_minutes))
    }
}

/// Messages for every checkpoint in `current..previous`, highest first.
///
/// `previous` is the remainder sampled on the last tick (or the phase
/// length before the first one).
pub fn compute_announcements(
    countdown: Countdown,
    previous: u64,
    current: u64,
    phase_secs: u64,
) -> Vec<String> {
    (current..previous)
        .rev()
        .filter_map(|remaining| compute_announcement(countdown, remaining, phase_secs))
        .collect()
}
