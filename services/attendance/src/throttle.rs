//! Login throttling for slowing down credential guessing
//!
//! Counts failed logins per username. Once the limit is hit inside the
//! window, further attempts for that username are refused until the
//! lockout lapses. A successful login clears the counter, so the
//! throttle only ever penalizes streaks of failures.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::warn;

/// Throttle configuration
#[derive(Debug, Clone)]
pub struct ThrottleConfig {
    /// Failed attempts tolerated inside the window
    pub max_failures: u32,
    /// Time window in seconds over which failures are counted
    pub window_seconds: u64,
    /// Lockout duration in seconds once the limit is hit
    pub lockout_seconds: u64,
}

impl Default for ThrottleConfig {
    fn default() -> Self {
        Self {
            max_failures: 5,
            window_seconds: 300,  // 5 minutes
            lockout_seconds: 900, // 15 minutes
        }
    }
}

#[derive(Debug)]
struct ThrottleEntry {
    failures: u32,
    first_failure: Instant,
    locked_until: Option<Instant>,
}

/// Per-username login throttle
#[derive(Debug, Clone)]
pub struct LoginThrottle {
    config: ThrottleConfig,
    entries: Arc<Mutex<HashMap<String, ThrottleEntry>>>,
}

impl LoginThrottle {
    /// Create a new login throttle
    pub fn new(config: ThrottleConfig) -> Self {
        Self {
            config,
            entries: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Whether a login attempt for `username` may proceed right now.
    pub async fn check(&self, username: &str) -> bool {
        let mut entries = self.entries.lock().await;
        let now = Instant::now();

        let Some(entry) = entries.get_mut(username) else {
            return true;
        };

        if let Some(locked_until) = entry.locked_until {
            if now < locked_until {
                return false;
            }
            // Lockout lapsed; forget the streak.
            entries.remove(username);
            return true;
        }

        if now.duration_since(entry.first_failure)
            >= Duration::from_secs(self.config.window_seconds)
        {
            entries.remove(username);
        }
        true
    }

    /// Record a failed login for `username`.
    pub async fn record_failure(&self, username: &str) {
        let mut entries = self.entries.lock().await;
        let now = Instant::now();

        let entry = entries
            .entry(username.to_string())
            .or_insert(ThrottleEntry {
                failures: 0,
                first_failure: now,
                locked_until: None,
            });

        if now.duration_since(entry.first_failure)
            >= Duration::from_secs(self.config.window_seconds)
        {
            entry.failures = 0;
            entry.first_failure = now;
        }

        entry.failures += 1;
        if entry.failures >= self.config.max_failures {
            entry.locked_until = Some(now + Duration::from_secs(self.config.lockout_seconds));
            warn!(
                "Locked out username {} for {} seconds after {} failed logins",
                username, self.config.lockout_seconds, entry.failures
            );
        }
    }

    /// Clear the failure streak for `username` after a successful login.
    pub async fn clear(&self, username: &str) {
        let mut entries = self.entries.lock().await;
        entries.remove(username);
    }
}
