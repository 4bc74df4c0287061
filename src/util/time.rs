//! Time utilities for phase timers and announcements

use std::time::Duration;

use tokio::time::Instant;

/// Delay before a countdown announcer ticks for the first time
pub const ANNOUNCE_INITIAL_DELAY: Duration = Duration::from_millis(1000);

/// Announcer period. The extra millisecond keeps ticks from landing exactly
/// on second boundaries.
pub const ANNOUNCE_PERIOD: Duration = Duration::from_millis(1001);

/// Upper bound (exclusive) of the random delay added to every loot refill
pub const LOOT_REFILL_JITTER_SECS: u64 = 180;

/// Whole seconds left until `target`, zero once it has passed.
///
/// Uses the tokio clock so paused-time tests observe virtual time.
pub fn whole_secs_until(target: Instant) -> u64 {
    target.saturating_duration_since(Instant::now()).as_secs()
}

/// Human readable duration for phase notices, e.g. "1 minute and 30 seconds".
pub fn format_duration_secs(secs: u64) -> String {
    let minutes = secs / 60;
    let seconds = secs % 60;

    let unit = |n: u64, singular: &str| {
        if n == 1 {
            format!("1 {}", singular)
        } else {
            format!("{} {}s", n, singular)
        }
    };

    match (minutes, seconds) {
        (0, s) => unit(s, "second"),
        (m, 0) => unit(m, "minute"),
        (m, s) => format!("{} and {}", unit(m, "minute"), unit(s, "second")),
    }
}
