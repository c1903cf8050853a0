// Per-user sliding-window rate limiter.
//
// Each user gets a queue of admission timestamps. On every check the queue
// is pruned of anything a full window old, then the request is either
// recorded (room left) or rejected (window full). Rejections are never
// recorded, so a user hammering the endpoint doesn't extend their own
// lockout.
//
// The whole map sits behind one std Mutex: prune, count and append happen
// in a single critical section, so concurrent requests for the same user
// can't both see the last free slot. The lock is never held across an
// await point.

use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use tracing::debug;

/// Limit and window for a `RateLimiter`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitSettings {
    /// Maximum admissions per user within one window.
    pub max_requests: u32,
    /// Length of the trailing window.
    pub window: Duration,
}

impl Default for RateLimitSettings {
    fn default() -> Self {
        Self {
            max_requests: crate::config::DEFAULT_RATE_LIMIT,
            window: Duration::from_secs(crate::config::DEFAULT_RATE_WINDOW_SECS),
        }
    }
}

/// Outcome of a single admission check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Admission {
    pub allowed: bool,
    /// Admissions still available in the current window after this call.
    pub remaining: u32,
}

/// Keyed sliding-window counter shared by every request handler.
///
/// Share it with `Arc<RateLimiter>`; all methods take `&self`.
pub struct RateLimiter {
    users: Mutex<HashMap<String, VecDeque<Instant>>>,
    settings: RateLimitSettings,
}

impl RateLimiter {
    pub fn new(settings: RateLimitSettings) -> Self {
        Self {
            users: Mutex::new(HashMap::new()),
            settings,
        }
    }

    /// Check whether `user_id` may make a request at `now`, recording it if so.
    ///
    /// A user never seen before has an empty history and is admitted.
    pub fn admit(&self, user_id: &str, now: Instant) -> Admission {
        let max = self.settings.max_requests as usize;
        let mut users = self.lock();

        let history = users.entry(user_id.to_string()).or_default();
        prune(history, now, self.settings.window);

        if history.len() >= max {
            debug!(user_id, in_window = history.len(), "Rate limit reached");
            return Admission {
                allowed: false,
                remaining: 0,
            };
        }

        history.push_back(now);
        Admission {
            allowed: true,
            remaining: (max - history.len()) as u32,
        }
    }

    /// Drop every user whose window has fully drained by `now`.
    ///
    /// Returns how many users were evicted. Pruning in `admit` only touches
    /// the requesting user, so without this the map grows with every
    /// distinct user ever seen.
    pub fn sweep(&self, now: Instant) -> usize {
        let window = self.settings.window;
        let mut users = self.lock();
        let before = users.len();
        users.retain(|_, history| {
            prune(history, now, window);
            !history.is_empty()
        });
        before - users.len()
    }

    /// Number of users currently holding state.
    pub fn tracked_users(&self) -> usize {
        self.lock().len()
    }

    // Poisoning is recovered: each queue is valid after any partial update.
    fn lock(&self) -> MutexGuard<'_, HashMap<String, VecDeque<Instant>>> {
        self.users.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Evict timestamps that are a full window old or more.
fn prune(history: &mut VecDeque<Instant>, now: Instant, window: Duration) {
    while let Some(&oldest) = history.front() {
        if now.saturating_duration_since(oldest) >= window {
            history.pop_front();
        } else {
            break;
        }
    }
}
