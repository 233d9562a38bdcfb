//! Fixed-interval polling bounded by a timeout

use std::fmt;
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, warn};

/// Interval between two poll attempts.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Timeout and cadence for a polling loop.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total time budget; zero means a single attempt
    pub timeout: Duration,

    /// Sleep between attempts
    pub interval: Duration,

    /// Emit a warning when the budget runs out without a result
    pub report_timeout: bool,
}

impl RetryPolicy {
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            interval: DEFAULT_POLL_INTERVAL,
            report_timeout: true,
        }
    }

    /// A policy that makes exactly one attempt and stays silent.
    pub fn single_attempt() -> Self {
        Self {
            timeout: Duration::ZERO,
            interval: DEFAULT_POLL_INTERVAL,
            report_timeout: false,
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn with_report(mut self, report_timeout: bool) -> Self {
        self.report_timeout = report_timeout;
        self
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(Duration::from_millis(5000))
    }
}

/// Result of a polling loop.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PollOutcome<T> {
    Found {
        value: T,
        attempts: u32,
        elapsed: Duration,
    },
    TimedOut {
        attempts: u32,
        elapsed: Duration,
    },
}

impl<T> PollOutcome<T> {
    pub fn attempts(&self) -> u32 {
        match self {
            PollOutcome::Found { attempts, .. } | PollOutcome::TimedOut { attempts, .. } => {
                *attempts
            }
        }
    }

    pub fn into_value(self) -> Option<T> {
        match self {
            PollOutcome::Found { value, .. } => Some(value),
            PollOutcome::TimedOut { .. } => None,
        }
    }
}

/// Poll `operation` until it yields a value or the policy's timeout elapses.
///
/// Errors returned by `operation` count as "nothing yet" and are retried.
/// There is no cancellation other than the timeout.
pub fn poll_until<T, E, F>(policy: &RetryPolicy, what: &str, mut operation: F) -> PollOutcome<T>
where
    E: fmt::Display,
    F: FnMut() -> Result<Option<T>, E>,
{
    let started = Instant::now();
    let mut attempts = 0u32;

    loop {
        attempts += 1;
        match operation() {
            Ok(Some(value)) => {
                debug!(what, attempts, "poll attempt produced a result");
                return PollOutcome::Found {
                    value,
                    attempts,
                    elapsed: started.elapsed(),
                };
            }
            Ok(None) => debug!(what, attempts, "poll attempt found nothing"),
            Err(err) => debug!(what, attempts, error = %err, "poll attempt failed; retrying"),
        }

        let elapsed = started.elapsed();
        if elapsed >= policy.timeout {
            if policy.report_timeout {
                warn!(
                    what,
                    attempts,
                    timeout_ms = policy.timeout.as_millis() as u64,
                    "timed out waiting for result"
                );
            }
            return PollOutcome::TimedOut { attempts, elapsed };
        }

        thread::sleep(policy.interval.min(policy.timeout - elapsed));
    }
}

/// Retry `operation` and return its first value, or `None` on timeout.
pub fn retry<T, E, F>(policy: &RetryPolicy, what: &str, operation: F) -> Option<T>
where
    E: fmt::Display,
    F: FnMut() -> Result<Option<T>, E>,
{
    poll_until(policy, what, operation).into_value()
}

/// Poll a predicate until it holds; `false` on timeout.
pub fn wait_until<E, F>(policy: &RetryPolicy, what: &str, mut predicate: F) -> bool
where
    E: fmt::Display,
    F: FnMut() -> Result<bool, E>,
{
    retry(policy, what, || predicate().map(|ok| ok.then_some(()))).is_some()
}
