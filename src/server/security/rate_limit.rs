// Copyright 2025 Lablup Inc. and Jeongkyu Shin
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Failed-authentication tracker with temporary blocking.
//!
//! Every client identifier that fails authentication gets an [`AttemptRecord`].
//! Once a client reaches the configured number of failures while still inside
//! the window anchored on its *first* failure, it is blocked for a fixed
//! duration. The window never slides: later failures keep incrementing the
//! counter but do not move the anchor.
//!
//! Records are only removed by the eviction sweep, which drops every record
//! whose first failure is older than the retention horizon, regardless of
//! whether its block is still active.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

/// Upper bound applied to block durations and the sweep period.
///
/// Larger values would overflow `Instant` arithmetic.
pub const MAX_DURATION: Duration = Duration::from_secs(365 * 24 * 60 * 60);

/// Configuration for authentication rate limiting.
///
/// - `max_attempts`: failures needed to trigger a block
/// - `window`: how long after the first failure the threshold still counts
/// - `block_duration`: how long a block lasts once applied
/// - `retention`: age of the first failure after which a record is evicted
/// - `cleanup_interval`: period of the background eviction sweep
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthRateLimitConfig {
    /// Failed attempts before a block is applied.
    pub max_attempts: u32,
    /// Window, measured from the first failure, in which the threshold applies.
    pub window: Duration,
    /// Block duration, measured from the failure that triggered it.
    pub block_duration: Duration,
    /// Records whose first failure is older than this are evicted.
    pub retention: Duration,
    /// Interval between eviction sweeps.
    pub cleanup_interval: Duration,
}

impl Default for AuthRateLimitConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            window: Duration::from_secs(15 * 60),
            block_duration: Duration::from_secs(60 * 60),
            retention: Duration::from_secs(2 * 60 * 60),
            cleanup_interval: Duration::from_secs(30 * 60),
        }
    }
}

impl AuthRateLimitConfig {
    /// Create a configuration with the given threshold, window and block
    /// duration, keeping the default retention and sweep interval.
    ///
    /// # Arguments
    ///
    /// * `max_attempts` - Failures needed to trigger a block
    /// * `window_secs` - Window in seconds, anchored on the first failure
    /// * `block_secs` - Block duration in seconds
    pub fn new(max_attempts: u32, window_secs: u64, block_secs: u64) -> Self {
        Self {
            max_attempts,
            window: Duration::from_secs(window_secs),
            block_duration: Duration::from_secs(block_secs),
            ..Self::default()
        }
    }

    /// Set the retention horizon used by the eviction sweep.
    pub fn with_retention(mut self, retention: Duration) -> Self {
        self.retention = retention;
        self
    }

    /// Set the period of the background eviction sweep.
    pub fn with_cleanup_interval(mut self, interval: Duration) -> Self {
        self.cleanup_interval = interval;
        self
    }
}

/// Failed attempts recorded for a single client identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttemptRecord {
    /// Number of failed attempts since the record was created.
    pub count: u32,
    /// Time of the first failure. Never moves once set.
    pub first_attempt: Instant,
    /// End of the current block, if one was ever applied.
    pub blocked_until: Option<Instant>,
}

impl AttemptRecord {
    fn new(now: Instant) -> Self {
        Self {
            count: 0,
            first_attempt: now,
            blocked_until: None,
        }
    }

    /// Whether the block (if any) is still active at `now`.
    pub fn is_blocked_at(&self, now: Instant) -> bool {
        matches!(self.blocked_until, Some(until) if now < until)
    }
}

/// Authentication rate limiter with temporary blocking.
///
/// The limiter is a cheap handle: clones share the same attempt map and the
/// same background sweep, so one instance is constructed at startup and
/// handed to every request path that needs it.
///
/// # Thread Safety
///
/// Block checks take the read lock; recording failures and evicting take the
/// write lock. Locks are held only for the map access itself.
#[derive(Debug, Clone)]
pub struct AuthRateLimiter {
    /// Failed attempt records per client identifier.
    attempts: Arc<RwLock<HashMap<String, AttemptRecord>>>,
    /// Configuration.
    config: AuthRateLimitConfig,
    /// Set once the background sweep has been spawned.
    cleanup_started: Arc<AtomicBool>,
    /// Cancels the background sweep.
    shutdown: CancellationToken,
}

impl AuthRateLimiter {
    /// Create a new limiter. No background activity is started; call
    /// [`AuthRateLimiter::start_cleanup`] to enable periodic eviction.
    pub fn new(config: AuthRateLimitConfig) -> Self {
        Self {
            attempts: Arc::new(RwLock::new(HashMap::new())),
            config,
            cleanup_started: Arc::new(AtomicBool::new(false)),
            shutdown: CancellationToken::new(),
        }
    }

    /// Check if a client is currently blocked.
    ///
    /// Returns `true` only while the block deadline lies in the future; an
    /// expired block reports `false` even before the record is evicted.
    pub async fn is_blocked(&self, client: &str) -> bool {
        let now = Instant::now();
        let attempts = self.attempts.read().await;
        attempts
            .get(client)
            .is_some_and(|record| record.is_blocked_at(now))
    }

    /// Record a failed authentication attempt.
    ///
    /// # Returns
    ///
    /// Returns `true` if this failure applied (or refreshed) a block.
    pub async fn record_failure(&self, client: &str) -> bool {
        let now = Instant::now();
        let mut attempts = self.attempts.write().await;

        let record = attempts
            .entry(client.to_string())
            .or_insert_with(|| AttemptRecord::new(now));
        record.count = record.count.saturating_add(1);

        let within_window = now.saturating_duration_since(record.first_attempt) <= self.config.window;
        if record.count < self.config.max_attempts || !within_window {
            return false;
        }

        record.blocked_until = Some(now + self.config.block_duration.min(MAX_DURATION));
        let count = record.count;
        drop(attempts);

        tracing::warn!(
            client = %client,
            attempts = count,
            duration_secs = self.config.block_duration.as_secs(),
            "Blocking client after too many failed authentication attempts"
        );
        true
    }

    /// Seconds until the client's block expires, rounded up.
    ///
    /// Returns 0 if the client has no record, was never blocked, or the block
    /// has already expired.
    pub async fn retry_after_secs(&self, client: &str) -> u64 {
        let now = Instant::now();
        let attempts = self.attempts.read().await;
        let Some(until) = attempts.get(client).and_then(|record| record.blocked_until) else {
            return 0;
        };

        let remaining = until.saturating_duration_since(now);
        remaining.as_secs() + u64::from(remaining.subsec_nanos() > 0)
    }

    /// Get a copy of the record for a client, if one exists.
    pub async fn attempt_record(&self, client: &str) -> Option<AttemptRecord> {
        self.attempts.read().await.get(client).copied()
    }

    /// Remove every record whose first failure is older than the retention
    /// horizon, including records that are still blocked.
    ///
    /// Returns the number of removed records.
    pub async fn evict_stale(&self) -> usize {
        let now = Instant::now();
        let retention = self.config.retention;

        let mut attempts = self.attempts.write().await;
        let before = attempts.len();
        attempts.retain(|_, record| now.saturating_duration_since(record.first_attempt) <= retention);
        let removed = before - attempts.len();
        let remaining = attempts.len();
        drop(attempts);

        if removed > 0 {
            tracing::debug!(removed, remaining, "Evicted stale authentication records");
        }
        removed
    }

    /// Spawn the periodic eviction sweep on the current tokio runtime.
    ///
    /// Only the first call spawns a task; later calls (from any clone) return
    /// `false`. A sweep that was stopped is not restarted.
    pub fn start_cleanup(&self) -> bool {
        if self.cleanup_started.swap(true, Ordering::SeqCst) {
            return false;
        }

        let limiter = self.clone();
        let period = self.config.cleanup_interval.min(MAX_DURATION);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    biased;

                    _ = limiter.shutdown.cancelled() => break,
                    _ = ticker.tick() => {
                        limiter.evict_stale().await;
                    }
                }
            }

            tracing::debug!("Authentication record sweep stopped");
        });

        tracing::debug!(
            interval_secs = period.as_secs(),
            "Started authentication record sweep"
        );
        true
    }

    /// Stop the background sweep. Safe to call any number of times, and
    /// before the sweep was ever started.
    pub fn stop(&self) {
        self.shutdown.cancel();
    }

    /// Whether [`AuthRateLimiter::stop`] has been called.
    pub fn is_stopped(&self) -> bool {
        self.shutdown.is_cancelled()
    }

    /// Number of client identifiers with a record.
    pub async fn tracked_count(&self) -> usize {
        self.attempts.read().await.len()
    }

    /// Number of clients whose block is currently active.
    pub async fn blocked_count(&self) -> usize {
        let now = Instant::now();
        let attempts = self.attempts.read().await;
        attempts.values().filter(|r| r.is_blocked_at(now)).count()
    }

    /// Get the configuration.
    pub fn config(&self) -> &AuthRateLimitConfig {
        &self.config
    }
}

impl Default for AuthRateLimiter {
    fn default() -> Self {
        Self::new(AuthRateLimitConfig::default())
    }
}
