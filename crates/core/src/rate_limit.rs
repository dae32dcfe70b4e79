//! Fixed-window request rate limiting.
//!
//! One counter per user id, reset when its 60-second window elapses. This is
//! a fixed-window counter, not a sliding window or token bucket: a burst
//! straddling a window boundary can admit up to twice the nominal ceiling
//! within a short span. That imprecision is accepted and documented here
//! rather than silently corrected.
//!
//! The map is the only cross-request shared mutable state in the service.
//! The per-user read-check-increment runs under a single mutex, so two
//! concurrent requests from the same user cannot both slip past the
//! ceiling. Entries for idle users are reclaimed by [`RateLimiter::sweep`],
//! which the runtime binary calls on an interval.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

/// Default per-user request ceiling within one window.
pub const DEFAULT_CEILING: u32 = 10;

/// Default window length.
pub const DEFAULT_WINDOW: Duration = Duration::from_secs(60);

#[derive(Clone, Copy)]
struct WindowState {
    count: u32,
    reset_at: Instant,
}

/// Per-user fixed-window counter map.
pub struct RateLimiter {
    ceiling: u32,
    window: Duration,
    windows: Mutex<HashMap<String, WindowState>>,
}

impl RateLimiter {
    pub fn new(ceiling: u32, window: Duration) -> Self {
        Self {
            ceiling,
            window,
            windows: Mutex::new(HashMap::new()),
        }
    }

    /// Records one request attempt for `user_id` and returns whether it is
    /// admitted.
    ///
    /// First call in a window (or first call ever) initialises the entry
    /// with count 1 and admits. At the ceiling the attempt is denied
    /// *without* incrementing; below it the count increments and the
    /// attempt is admitted.
    pub fn allow(&self, user_id: &str) -> bool {
        self.allow_at(user_id, Instant::now())
    }

    fn allow_at(&self, user_id: &str, now: Instant) -> bool {
        let mut windows = self.lock();
        match windows.get_mut(user_id) {
            Some(state) if now < state.reset_at => {
                if state.count >= self.ceiling {
                    return false;
                }
                state.count += 1;
                true
            }
            _ => {
                windows.insert(
                    user_id.to_owned(),
                    WindowState {
                        count: 1,
                        reset_at: now + self.window,
                    },
                );
                true
            }
        }
    }

    /// Removes entries whose window has already elapsed and returns how many
    /// were dropped. Entries still inside their window are untouched.
    pub fn sweep(&self) -> usize {
        let now = Instant::now();
        let mut windows = self.lock();
        let before = windows.len();
        windows.retain(|_, state| now < state.reset_at);
        before - windows.len()
    }

    /// Number of user ids currently tracked.
    pub fn tracked_users(&self) -> usize {
        self.lock().len()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, WindowState>> {
        // A poisoned lock still holds coherent counter state.
        self.windows
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(DEFAULT_CEILING, DEFAULT_WINDOW)
    }
}
