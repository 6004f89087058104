// SPDX-License-Identifier: Apache-2.0
//! Bounded reconnection to remote workers.
//!
//! When a distributed run starts, some remote workers may be unreachable.
//! [`reconnect`] retries them in rounds according to a [`ReconnectPolicy`]:
//! each round sleeps the backoff delay before every pending remote, tries to
//! connect, and pushes the document snapshot to the new connection. A remote
//! that fails is retried in the next round; one failure never aborts the
//! others.
//!
//! # Determinism
//!
//! Backoff delays use fixed formulas (no jitter), and the sleep function is
//! injected, so tests run instantly and see the exact delay sequence.
//!
//! # Example
//!
//! ```
//! use arbor_runtime::reconnect::{BackoffStrategy, ReconnectPolicy};
//! use std::time::Duration;
//!
//! let policy = ReconnectPolicy::new(3, BackoffStrategy::Exponential {
//!     base_ms: 100,
//!     max_ms: 5000,
//! });
//!
//! assert_eq!(policy.delay(0), Duration::from_millis(100));
//! assert_eq!(policy.delay(1), Duration::from_millis(200));
//! assert_eq!(policy.delay(2), Duration::from_millis(400));
//! ```

#![forbid(unsafe_code)]

use std::fmt;
use std::time::Duration;

use arbor_core::Snapshot;
use tracing::{info, info_span, warn};

/// Backoff strategy for retry delays.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "config", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "config", serde(tag = "kind", rename_all = "snake_case"))]
pub enum BackoffStrategy {
    /// Fixed delay between retries.
    Fixed { delay_ms: u64 },
    /// `base_ms * 2^attempt`, capped at `max_ms`.
    Exponential { base_ms: u64, max_ms: u64 },
    /// `base_ms * (attempt + 1)`, capped at `max_ms`.
    Linear { base_ms: u64, max_ms: u64 },
}

/// How hard to try reaching remote workers that failed to connect.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "config", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "config", serde(default))]
pub struct ReconnectPolicy {
    /// Number of retry rounds (0 = give up immediately).
    pub max_retries: u32,
    /// When false, failed remotes are never retried.
    pub continue_on_fail: bool,
    /// Delay before each connection attempt.
    pub backoff: BackoffStrategy,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            max_retries: 0,
            continue_on_fail: true,
            backoff: BackoffStrategy::Fixed { delay_ms: 0 },
        }
    }
}

impl ReconnectPolicy {
    /// Retry up to `max_retries` rounds with `backoff` between attempts.
    #[must_use]
    pub fn new(max_retries: u32, backoff: BackoffStrategy) -> Self {
        Self {
            max_retries,
            backoff,
            ..Self::default()
        }
    }

    /// Set whether failed remotes are retried at all.
    #[must_use]
    pub fn with_continue_on_fail(mut self, continue_on_fail: bool) -> Self {
        self.continue_on_fail = continue_on_fail;
        self
    }

    /// Number of rounds [`reconnect`] will run.
    #[must_use]
    pub fn rounds(&self) -> u32 {
        if self.continue_on_fail {
            self.max_retries
        } else {
            0
        }
    }

    /// Delay before an attempt in the given round (0-indexed).
    #[must_use]
    pub fn delay(&self, attempt: u32) -> Duration {
        match self.backoff {
            BackoffStrategy::Fixed { delay_ms } => Duration::from_millis(delay_ms),
            BackoffStrategy::Exponential { base_ms, max_ms } => {
                let multiplier = 1u64.checked_shl(attempt).unwrap_or(u64::MAX);
                Duration::from_millis(base_ms.saturating_mul(multiplier).min(max_ms))
            }
            BackoffStrategy::Linear { base_ms, max_ms } => {
                let delay = base_ms.saturating_mul(u64::from(attempt) + 1);
                Duration::from_millis(delay.min(max_ms))
            }
        }
    }
}

/// Connection factory for remote workers.
pub trait RemoteConnector {
    type Handle;
    type Error: fmt::Display;

    /// Open a connection to `remote`.
    fn connect(&mut self, remote: &str) -> Result<Self::Handle, Self::Error>;

    /// Push the document to a freshly opened connection.
    fn configure(&mut self, handle: &mut Self::Handle, plan: &Snapshot)
    -> Result<(), Self::Error>;
}

/// Outcome of a [`reconnect`] run.
#[derive(Debug)]
pub struct ReconnectReport<H> {
    /// Remotes that connected and accepted the plan, in connection order.
    pub connected: Vec<(String, H)>,
    /// Remotes still unreachable after the last round, in input order.
    pub failed: Vec<String>,
}

impl<H> ReconnectReport<H> {
    /// Whether every remote ended up connected.
    #[must_use]
    pub fn all_connected(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Retry `remotes` according to `policy`, configuring each new connection
/// with `plan`.
pub fn reconnect<C, S>(
    connector: &mut C,
    remotes: &[String],
    plan: &Snapshot,
    policy: &ReconnectPolicy,
    mut sleep: S,
) -> ReconnectReport<C::Handle>
where
    C: RemoteConnector,
    S: FnMut(Duration),
{
    let rounds = policy.rounds();
    let span = info_span!("reconnect", remotes = remotes.len(), rounds);
    let _enter = span.enter();

    let mut pending: Vec<String> = remotes.to_vec();
    let mut connected = Vec::new();

    for round in 0..rounds {
        if pending.is_empty() {
            break;
        }
        let attempt = round + 1;
        let mut still_failed = Vec::new();
        for remote in pending {
            sleep(policy.delay(round));
            warn!("{attempt}/{rounds} retry to connect to {remote}");
            match connect_and_configure(connector, &remote, plan) {
                Ok(handle) => {
                    info!("reconnected to {remote} on retry {attempt}/{rounds}");
                    connected.push((remote, handle));
                }
                Err(error) => {
                    warn!(%error, "failed to reconnect to {remote} on retry {attempt}");
                    still_failed.push(remote);
                }
            }
        }
        pending = still_failed;
    }

    if !pending.is_empty() {
        warn!(failed = pending.len(), "remote workers left unreachable");
    }
    ReconnectReport {
        connected,
        failed: pending,
    }
}

fn connect_and_configure<C: RemoteConnector>(
    connector: &mut C,
    remote: &str,
    plan: &Snapshot,
) -> Result<C::Handle, C::Error> {
    let mut handle = connector.connect(remote)?;
    connector.configure(&mut handle, plan)?;
    Ok(handle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    /// Remotes become reachable after a set number of failed attempts.
    struct Flaky {
        failures_left: HashMap<String, u32>,
        reject_plan: Vec<String>,
        attempts: Vec<String>,
    }

    impl Flaky {
        fn new(failures: &[(&str, u32)]) -> Self {
            Self {
                failures_left: failures
                    .iter()
                    .map(|(name, n)| ((*name).to_string(), *n))
                    .collect(),
                reject_plan: Vec::new(),
                attempts: Vec::new(),
            }
        }
    }

    impl RemoteConnector for Flaky {
        type Handle = String;
        type Error = String;

        fn connect(&mut self, remote: &str) -> Result<String, String> {
            self.attempts.push(remote.to_string());
            match self.failures_left.get_mut(remote) {
                Some(0) | None => Ok(format!("conn:{remote}")),
                Some(n) => {
                    *n -= 1;
                    Err(format!("{remote} refused"))
                }
            }
        }

        fn configure(&mut self, handle: &mut String, plan: &Snapshot) -> Result<(), String> {
            if self.reject_plan.iter().any(|r| handle.ends_with(r.as_str())) {
                return Err("plan rejected".into());
            }
            handle.push_str(&format!("+{}", plan.node_count()));
            Ok(())
        }
    }

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn delays_follow_strategy() {
        let fixed = ReconnectPolicy::new(3, BackoffStrategy::Fixed { delay_ms: 15 });
        assert_eq!(fixed.delay(0), Duration::from_millis(15));
        assert_eq!(fixed.delay(9), Duration::from_millis(15));

        let linear = ReconnectPolicy::new(3, BackoffStrategy::Linear {
            base_ms: 100,
            max_ms: 250,
        });
        assert_eq!(linear.delay(0), Duration::from_millis(100));
        assert_eq!(linear.delay(1), Duration::from_millis(200));
        assert_eq!(linear.delay(2), Duration::from_millis(250));

        let exp = ReconnectPolicy::new(3, BackoffStrategy::Exponential {
            base_ms: 1,
            max_ms: u64::MAX,
        });
        assert_eq!(exp.delay(200), Duration::from_millis(u64::MAX));
    }

    #[test]
    fn default_policy_gives_up_immediately() {
        let mut connector = Flaky::new(&[]);
        let report = reconnect(
            &mut connector,
            &names(&["a", "b"]),
            &Snapshot::default(),
            &ReconnectPolicy::default(),
            |_| panic!("no sleeping without retries"),
        );
        assert!(report.connected.is_empty());
        assert_eq!(report.failed, names(&["a", "b"]));
        assert!(connector.attempts.is_empty());
    }

    #[test]
    fn retries_until_reachable() {
        let mut connector = Flaky::new(&[("a", 0), ("b", 2), ("c", 10)]);
        let policy = ReconnectPolicy::new(3, BackoffStrategy::Fixed { delay_ms: 5 });
        let mut slept = Vec::new();

        let report = reconnect(
            &mut connector,
            &names(&["a", "b", "c"]),
            &Snapshot::default(),
            &policy,
            |d| slept.push(d),
        );

        let connected: Vec<&str> = report.connected.iter().map(|(r, _)| r.as_str()).collect();
        assert_eq!(connected, vec!["a", "b"]);
        assert_eq!(report.failed, names(&["c"]));
        assert!(!report.all_connected());
        assert_eq!(
            connector.attempts,
            names(&["a", "b", "c", "b", "c", "b", "c"])
        );
        assert_eq!(slept.len(), 7);
        assert!(slept.iter().all(|d| *d == Duration::from_millis(5)));
    }

    #[test]
    fn configure_failure_counts_as_failed_attempt() {
        let mut connector = Flaky::new(&[]);
        connector.reject_plan.push("b".into());
        let policy = ReconnectPolicy::new(1, BackoffStrategy::Fixed { delay_ms: 0 });

        let report = reconnect(
            &mut connector,
            &names(&["a", "b"]),
            &Snapshot::default(),
            &policy,
            |_| {},
        );
        assert_eq!(report.connected.len(), 1);
        assert_eq!(report.connected[0].1, "conn:a+0");
        assert_eq!(report.failed, names(&["b"]));
    }

    #[test]
    fn continue_on_fail_off_skips_retries() {
        let mut connector = Flaky::new(&[]);
        let policy = ReconnectPolicy::new(5, BackoffStrategy::Fixed { delay_ms: 0 })
            .with_continue_on_fail(false);
        assert_eq!(policy.rounds(), 0);

        let report = reconnect(
            &mut connector,
            &names(&["a"]),
            &Snapshot::default(),
            &policy,
            |_| {},
        );
        assert_eq!(report.failed, names(&["a"]));
        assert!(connector.attempts.is_empty());
    }

    #[test]
    fn exponential_delay_grows_per_round() {
        let mut connector = Flaky::new(&[("a", 2)]);
        let policy = ReconnectPolicy::new(4, BackoffStrategy::Exponential {
            base_ms: 10,
            max_ms: 1000,
        });
        let mut slept = Vec::new();
        let report = reconnect(
            &mut connector,
            &names(&["a"]),
            &Snapshot::default(),
            &policy,
            |d| slept.push(d.as_millis()),
        );
        assert!(report.all_connected());
        assert_eq!(slept, vec![10, 20, 40]);
    }
}
