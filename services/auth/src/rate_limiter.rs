//! Rate limiter for preventing brute force attacks on login

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::warn;

/// Rate limiter configuration
#[derive(Debug, Clone)]
pub struct RateLimiterConfig {
    /// Failed attempts that trigger a ban
    pub max_attempts: u32,
    /// Window in seconds over which failures are counted
    pub window_seconds: u64,
    /// Ban duration in seconds
    pub ban_duration_seconds: u64,
}

impl Default for RateLimiterConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            window_seconds: 300,        // 5 minutes
            ban_duration_seconds: 3600, // 1 hour
        }
    }
}

/// Failures seen for one key within the current window
#[derive(Debug)]
struct Attempts {
    failures: u32,
    window_start: Instant,
    banned_until: Option<Instant>,
}

impl Attempts {
    fn new(now: Instant) -> Self {
        Self {
            failures: 0,
            window_start: now,
            banned_until: None,
        }
    }

    fn is_banned(&self, now: Instant) -> bool {
        self.banned_until.is_some_and(|until| now < until)
    }

    /// Neither banned nor inside a live window
    fn is_expired(&self, now: Instant, config: &RateLimiterConfig) -> bool {
        !self.is_banned(now)
            && now.duration_since(self.window_start) >= Duration::from_secs(config.window_seconds)
    }

    /// Count one failure at `now`; true when it starts a ban
    fn record_failure(&mut self, now: Instant, config: &RateLimiterConfig) -> bool {
        if self.is_banned(now) {
            return false;
        }
        if self.banned_until.is_some() || self.is_expired(now, config) {
            *self = Attempts::new(now);
        }

        self.failures += 1;
        if self.failures >= config.max_attempts {
            self.banned_until = Some(now + Duration::from_secs(config.ban_duration_seconds));
            return true;
        }
        false
    }
}

#[derive(Debug)]
struct Tracked {
    entries: HashMap<String, Attempts>,
    last_sweep: Instant,
}

impl Tracked {
    /// Drop expired entries, at most once per window
    fn sweep(&mut self, now: Instant, config: &RateLimiterConfig) {
        if now.duration_since(self.last_sweep) < Duration::from_secs(config.window_seconds) {
            return;
        }
        self.entries.retain(|_, attempts| !attempts.is_expired(now, config));
        self.last_sweep = now;
    }
}

/// Failed-login limiter. Keys are built by the caller, typically from
/// the client address and the username.
#[derive(Debug, Clone)]
pub struct RateLimiter {
    config: RateLimiterConfig,
    tracked: Arc<Mutex<Tracked>>,
}

impl RateLimiter {
    pub fn new(config: RateLimiterConfig) -> Self {
        Self {
            config,
            tracked: Arc::new(Mutex::new(Tracked {
                entries: HashMap::new(),
                last_sweep: Instant::now(),
            })),
        }
    }

    /// Whether `key` is currently banned
    pub async fn is_blocked(&self, key: &str) -> bool {
        self.is_blocked_at(key, Instant::now()).await
    }

    async fn is_blocked_at(&self, key: &str, now: Instant) -> bool {
        let mut tracked = self.tracked.lock().await;
        tracked.sweep(now, &self.config);
        tracked
            .entries
            .get(key)
            .is_some_and(|attempts| attempts.is_banned(now))
    }

    /// Record a failed attempt for `key`
    pub async fn record_failure(&self, key: &str) {
        self.record_failure_at(key, Instant::now()).await;
    }

    async fn record_failure_at(&self, key: &str, now: Instant) {
        let mut tracked = self.tracked.lock().await;
        tracked.sweep(now, &self.config);

        let banned = tracked
            .entries
            .entry(key.to_string())
            .or_insert_with(|| Attempts::new(now))
            .record_failure(now, &self.config);

        if banned {
            warn!(
                "Too many failed logins for {}, blocking for {} seconds",
                key, self.config.ban_duration_seconds
            );
        }
    }

    /// Forget the failures recorded for `key`, after a successful login
    pub async fn reset(&self, key: &str) {
        self.tracked.lock().await.entries.remove(key);
    }
}
