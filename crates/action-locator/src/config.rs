//! Search configuration carried by every element handle

use std::time::Duration;

use action_primitives::RetryPolicy;
use serde::{Deserialize, Serialize};

/// Per-context search behaviour.
///
/// Copied by value from a parent handle to every element it discovers;
/// changing one copy never affects another.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Emit a diagnostic when a search comes back empty
    pub report_errors: bool,

    /// Poll until the element appears or the timeout elapses
    pub wait_for_element: bool,

    /// Polling budget in milliseconds
    pub timeout_ms: u64,

    /// Enumerate OS windows even when the search root has no window handle.
    /// Without a handle this walks every window in the system.
    pub include_all_os_windows: bool,

    /// Try non-relative paths from every top-level window
    pub search_from_all_top_level_windows: bool,

    /// Treat `/pattern/flags` values as regular expressions
    pub use_regex_values: bool,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            report_errors: true,
            wait_for_element: true,
            timeout_ms: 5000,
            include_all_os_windows: false,
            search_from_all_top_level_windows: false,
            use_regex_values: false,
        }
    }
}

impl SearchConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Polling policy for a search under this configuration.
    ///
    /// Reporting is left to the caller so a miss produces one diagnostic.
    pub fn retry_policy(&self) -> RetryPolicy {
        let policy = if self.wait_for_element {
            RetryPolicy::new(self.timeout())
        } else {
            RetryPolicy::single_attempt()
        };
        policy.with_report(false)
    }

    /// Snapshot used for per-segment sub-searches: quiet and single-shot.
    pub fn nested(&self) -> Self {
        Self {
            report_errors: false,
            wait_for_element: false,
            ..*self
        }
    }

    pub fn with_report_errors(mut self, report_errors: bool) -> Self {
        self.report_errors = report_errors;
        self
    }

    pub fn with_wait(mut self, wait_for_element: bool) -> Self {
        self.wait_for_element = wait_for_element;
        self
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    pub fn with_all_os_windows(mut self, include: bool) -> Self {
        self.include_all_os_windows = include;
        self
    }

    pub fn with_all_top_level_windows(mut self, search: bool) -> Self {
        self.search_from_all_top_level_windows = search;
        self
    }

    pub fn with_regex_values(mut self, use_regex: bool) -> Self {
        self.use_regex_values = use_regex;
        self
    }
}
