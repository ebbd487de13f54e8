// SPDX-FileCopyrightText: 2026 Cauce Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-process fixed-window rate limiter keyed by client IP.
//!
//! State lives in a `DashMap` owned by the limiter instance; a restart resets
//! all counters. Each process counts independently, so the effective ceiling
//! scales with replica count. The limiter is advisory and infallible: callers
//! never fail a request because of limiter internals.

use std::sync::Mutex;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use tokio::task::JoinHandle;
use tracing::{debug, trace};

#[derive(Debug, Clone, Copy)]
struct WindowEntry {
    count: u32,
    reset_at: Instant,
}

/// Outcome of a rate-limit check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateDecision {
    pub allowed: bool,
    /// Requests left in the current window after this one.
    pub remaining: u32,
    /// Seconds until the window resets, rounded up.
    pub retry_after_secs: u64,
}

/// Fixed-window request counter.
///
/// Constructed once at startup and shared via `Arc`. Call [`spawn_sweeper`]
/// after construction and [`shutdown`] before process exit.
///
/// [`spawn_sweeper`]: RateLimiter::spawn_sweeper
/// [`shutdown`]: RateLimiter::shutdown
pub struct RateLimiter {
    max_requests: u32,
    window: Duration,
    entries: DashMap<String, WindowEntry>,
    sweeper: Mutex<Option<JoinHandle<()>>>,
}

impl RateLimiter {
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            max_requests,
            window,
            entries: DashMap::new(),
            sweeper: Mutex::new(None),
        }
    }

    /// Count a request for `ip` and decide whether it may proceed.
    ///
    /// A denied request does not consume from the window.
    pub fn check(&self, ip: &str) -> RateDecision {
        self.check_at(ip, Instant::now())
    }

    /// Check against an explicit clock, for deterministic tests.
    pub fn check_at(&self, ip: &str, now: Instant) -> RateDecision {
        let mut entry = self
            .entries
            .entry(ip.to_string())
            .or_insert(WindowEntry {
                count: 0,
                reset_at: now + self.window,
            });

        if entry.reset_at <= now {
            entry.count = 0;
            entry.reset_at = now + self.window;
        }

        let retry_after_secs = retry_after(entry.reset_at, now);
        if entry.count >= self.max_requests {
            trace!(ip, count = entry.count, "rate limit exceeded");
            return RateDecision {
                allowed: false,
                remaining: 0,
                retry_after_secs,
            };
        }

        entry.count += 1;
        RateDecision {
            allowed: true,
            remaining: self.max_requests - entry.count,
            retry_after_secs,
        }
    }

    /// Start the periodic sweep that evicts expired windows.
    ///
    /// Idempotent: a second call replaces the previous sweeper.
    pub fn spawn_sweeper(self: &std::sync::Arc<Self>, interval: Duration) {
        let limiter = std::sync::Arc::clone(self);
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                limiter.sweep(Instant::now());
            }
        });
        if let Ok(mut slot) = self.sweeper.lock() {
            if let Some(previous) = slot.replace(handle) {
                previous.abort();
            }
        }
    }

    /// Evict entries whose window has ended.
    pub fn sweep(&self, now: Instant) {
        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.reset_at > now);
        let evicted = before - self.entries.len();
        if evicted > 0 {
            debug!(evicted, remaining = self.entries.len(), "rate limit sweep");
        }
    }

    /// Abort the sweeper task. Safe to call multiple times.
    pub fn shutdown(&self) {
        if let Ok(mut slot) = self.sweeper.lock() {
            if let Some(handle) = slot.take() {
                handle.abort();
            }
        }
    }

    #[cfg(test)]
    fn tracked_ips(&self) -> usize {
        self.entries.len()
    }
}

impl Drop for RateLimiter {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn retry_after(reset_at: Instant, now: Instant) -> u64 {
    let remaining = reset_at.saturating_duration_since(now);
    // Round up so a client that waits the advertised time lands past reset.
    remaining.as_secs() + u64::from(remaining.subsec_nanos() > 0)
}
