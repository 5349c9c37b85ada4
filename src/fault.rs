//! # Error Simulation
//!
//! Probabilistic fault injection for canary rollback testing.
//!
//! The injector sits in the vote submission path. While enabled, each
//! submission is failed with probability `error_rate`. Enabling starts a
//! window of `auto_disable` after which the injector shuts itself off the
//! next time anyone looks at it, so a forgotten toggle cannot poison the
//! service forever.
//!
//! ## State
//!
//! One mutex guards the whole tuple of enabled flag, enable timestamps, and
//! the request/error counters. A decision must observe the enabled flag and
//! bump the counters as one step, so field-level locking is off the table.
//! The rate and the window are fixed at startup and live outside the lock.
//!
//! ## Counters
//!
//! `request_count`/`error_count` reset on every enable and survive both
//! manual and automatic disables. Stats read after a window ends still
//! describe that window, which is what the rollback tooling wants to see.
use std::{
    sync::Mutex,
    time::{Duration, Instant, SystemTime, UNIX_EPOCH},
};

use rand::Rng;
use serde::Serialize;
use tracing::info;

pub struct FaultInjector {
    error_rate: f64,
    auto_disable: Duration,
    inner: Mutex<Inner>,
}

struct Inner {
    enabled: bool,
    enabled_at: Option<Instant>,
    enabled_at_unix: Option<u64>,
    request_count: u64,
    error_count: u64,
}

/// Point-in-time copy of the injector state, served by the status endpoint.
#[derive(Serialize, Debug, Clone)]
pub struct FaultStats {
    pub enabled: bool,
    pub error_rate: f64,
    pub auto_disable_seconds: u64,
    pub enabled_at: Option<u64>,
    pub request_count: u64,
    pub error_count: u64,
    pub time_remaining: u64,
}

fn is_expired(now: Instant, enabled_at: Instant, window: Duration) -> bool {
    now.duration_since(enabled_at) > window
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs())
        .unwrap_or(0)
}

impl Inner {
    fn enable(&mut self) {
        self.enabled = true;
        self.enabled_at = Some(Instant::now());
        self.enabled_at_unix = Some(unix_now());
        self.request_count = 0;
        self.error_count = 0;
    }

    fn disable(&mut self) {
        self.enabled = false;
        self.enabled_at = None;
        self.enabled_at_unix = None;
    }

    fn maybe_auto_disable(&mut self, now: Instant, window: Duration) {
        if let Some(enabled_at) = self.enabled_at {
            if is_expired(now, enabled_at, window) {
                self.disable();
                info!(
                    "Error simulation auto-disabled after {} seconds",
                    window.as_secs()
                );
            }
        }
    }
}

impl FaultInjector {
    pub fn new(enabled: bool, error_rate: f64, auto_disable: Duration) -> Self {
        let mut inner = Inner {
            enabled: false,
            enabled_at: None,
            enabled_at_unix: None,
            request_count: 0,
            error_count: 0,
        };

        if enabled {
            inner.enable();
        }

        Self {
            error_rate,
            auto_disable,
            inner: Mutex::new(inner),
        }
    }

    /// Is the injection window open right now?
    ///
    /// Expiry is lazy: the deadline is checked here rather than by a timer
    /// thread, so an expired window is closed on first access.
    pub fn is_active(&self) -> bool {
        let mut inner = self.inner.lock().unwrap();
        inner.maybe_auto_disable(Instant::now(), self.auto_disable);

        inner.enabled
    }

    /// Should this request fail?
    ///
    /// Counts the request and draws against the error rate, all under one
    /// lock acquisition. Never touches the counters while disabled.
    pub fn should_error(&self) -> bool {
        let mut inner = self.inner.lock().unwrap();
        inner.maybe_auto_disable(Instant::now(), self.auto_disable);

        if !inner.enabled {
            return false;
        }

        inner.request_count += 1;
        if rand::thread_rng().gen::<f64>() < self.error_rate {
            inner.error_count += 1;
            return true;
        }

        false
    }

    /// Open a fresh injection window. Counters reset even if already active.
    pub fn enable(&self) {
        let mut inner = self.inner.lock().unwrap();
        inner.enable();

        info!(
            "Error simulation ENABLED (rate={:.0}%, auto-disable={}s)",
            self.error_rate * 100.0,
            self.auto_disable.as_secs()
        );
    }

    /// Close the window. Counters keep their last values until the next enable.
    pub fn disable(&self) {
        let mut inner = self.inner.lock().unwrap();
        inner.disable();

        info!("Error simulation DISABLED");
    }

    /// Flip between active and disabled as one decision under the lock, so
    /// two operators toggling at once cannot interleave the read and the
    /// write incoherently.
    pub fn toggle(&self) {
        let mut inner = self.inner.lock().unwrap();
        inner.maybe_auto_disable(Instant::now(), self.auto_disable);

        if inner.enabled {
            inner.disable();
            info!("Error simulation DISABLED");
        } else {
            inner.enable();
            info!(
                "Error simulation ENABLED (rate={:.0}%, auto-disable={}s)",
                self.error_rate * 100.0,
                self.auto_disable.as_secs()
            );
        }
    }

    pub fn stats(&self) -> FaultStats {
        let mut inner = self.inner.lock().unwrap();
        let now = Instant::now();
        inner.maybe_auto_disable(now, self.auto_disable);

        let time_remaining = match inner.enabled_at {
            Some(enabled_at) => self
                .auto_disable
                .saturating_sub(now.duration_since(enabled_at))
                .as_secs(),
            None => 0,
        };

        FaultStats {
            enabled: inner.enabled,
            error_rate: self.error_rate,
            auto_disable_seconds: self.auto_disable.as_secs(),
            enabled_at: inner.enabled_at_unix,
            request_count: inner.request_count,
            error_count: inner.error_count,
            time_remaining,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::{sync::Arc, thread, time::Duration};

    use super::*;

    fn injector(enabled: bool, rate: f64) -> FaultInjector {
        FaultInjector::new(enabled, rate, Duration::from_secs(300))
    }

    #[test]
    fn test_starts_disabled() {
        let fault = injector(false, 1.0);

        assert!(!fault.is_active());
        assert_eq!(fault.stats().enabled_at, None);
    }

    #[test]
    fn test_starts_enabled_from_config() {
        let fault = injector(true, 1.0);

        assert!(fault.is_active());
        assert!(fault.stats().enabled_at.is_some());
    }

    #[test]
    fn test_disabled_never_counts() {
        let fault = injector(false, 1.0);

        for _ in 0..100 {
            assert!(!fault.should_error());
        }

        let stats = fault.stats();
        assert_eq!(stats.request_count, 0);
        assert_eq!(stats.error_count, 0);
    }

    #[test]
    fn test_rate_zero_never_errors() {
        let fault = injector(true, 0.0);

        for _ in 0..10_000 {
            assert!(!fault.should_error());
        }

        let stats = fault.stats();
        assert_eq!(stats.request_count, 10_000);
        assert_eq!(stats.error_count, 0);
    }

    #[test]
    fn test_rate_one_always_errors() {
        let fault = injector(true, 1.0);

        for _ in 0..1000 {
            assert!(fault.should_error());
        }

        let stats = fault.stats();
        assert_eq!(stats.request_count, 1000);
        assert_eq!(stats.error_count, 1000);
    }

    #[test]
    fn test_rate_half_stays_in_band() {
        let fault = injector(true, 0.5);

        for _ in 0..1000 {
            fault.should_error();
        }

        let stats = fault.stats();
        assert_eq!(stats.request_count, 1000);
        assert!(
            (400..=600).contains(&stats.error_count),
            "error_count {} outside expected band",
            stats.error_count
        );
    }

    #[test]
    fn test_enable_resets_counters() {
        let fault = injector(false, 1.0);

        fault.enable();
        for _ in 0..3 {
            fault.should_error();
        }
        assert_eq!(fault.stats().request_count, 3);
        assert_eq!(fault.stats().error_count, 3);

        fault.enable();

        let stats = fault.stats();
        assert!(stats.enabled);
        assert_eq!(stats.request_count, 0);
        assert_eq!(stats.error_count, 0);
    }

    #[test]
    fn test_disable_preserves_counters() {
        let fault = injector(false, 1.0);

        fault.enable();
        for _ in 0..5 {
            fault.should_error();
        }

        fault.disable();

        let stats = fault.stats();
        assert!(!stats.enabled);
        assert_eq!(stats.enabled_at, None);
        assert_eq!(stats.time_remaining, 0);
        assert_eq!(stats.request_count, 5);
        assert_eq!(stats.error_count, 5);

        assert!(!fault.should_error());
        assert_eq!(fault.stats().request_count, 5);
    }

    #[test]
    fn test_expiry_boundary() {
        let enabled_at = Instant::now();
        let window = Duration::from_secs(300);

        assert!(!is_expired(
            enabled_at + Duration::from_secs(299),
            enabled_at,
            window
        ));
        assert!(!is_expired(enabled_at + window, enabled_at, window));
        assert!(is_expired(
            enabled_at + Duration::from_secs(301),
            enabled_at,
            window
        ));
    }

    #[test]
    fn test_auto_disable_is_sticky() {
        let fault = FaultInjector::new(false, 1.0, Duration::from_millis(50));

        fault.enable();
        assert!(fault.is_active());
        fault.should_error();

        thread::sleep(Duration::from_millis(80));

        assert!(!fault.is_active());
        assert!(!fault.is_active());
        assert!(!fault.should_error());

        let stats = fault.stats();
        assert!(!stats.enabled);
        assert_eq!(stats.enabled_at, None);
        assert_eq!(stats.request_count, 1);
    }

    #[test]
    fn test_toggle_round_trip() {
        let fault = injector(false, 1.0);

        fault.toggle();
        assert!(fault.is_active());
        for _ in 0..4 {
            fault.should_error();
        }

        fault.toggle();
        assert!(!fault.is_active());
        assert_eq!(fault.stats().request_count, 4);

        fault.toggle();
        assert!(fault.is_active());
        assert_eq!(fault.stats().request_count, 0);
        assert_eq!(fault.stats().error_count, 0);
    }

    #[test]
    fn test_concurrent_decides_lose_no_updates() {
        let fault = Arc::new(injector(true, 0.5));
        let mut handles = Vec::new();

        for _ in 0..8 {
            let fault = fault.clone();
            handles.push(thread::spawn(move || {
                for _ in 0..500 {
                    fault.should_error();
                }
            }));
        }

        for handle in handles {
            handle.join().unwrap();
        }

        let stats = fault.stats();
        assert_eq!(stats.request_count, 4000);
        assert!(stats.error_count <= stats.request_count);
    }

    #[test]
    fn test_stats_snapshot_time_remaining() {
        let fault = injector(false, 0.5);

        fault.enable();

        let stats = fault.stats();
        assert!(stats.enabled);
        assert!(stats.time_remaining <= 300);
        assert!(stats.time_remaining >= 299);
        assert_eq!(stats.error_rate, 0.5);
        assert_eq!(stats.auto_disable_seconds, 300);
    }
}
