//! Polling parameters for a [`TailReader`](crate::TailReader).

use crate::error::{Error, Result};
use std::time::Duration;

/// How the reader wakes up while waiting for the file to change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WatchMode {
    /// Sleep a full poll interval between metadata checks.
    #[default]
    Poll,
    /// Wake early on filesystem events for the followed file, falling back to the poll interval.
    Notify,
}

/// What happens to an unterminated line when the file is truncated in place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TruncationPolicy {
    /// Keep the partial bytes and prefix them to the first line read after the reset.
    #[default]
    PreservePartial,
    /// Drop the partial bytes; the next line starts fresh at offset 0.
    DiscardPartial,
}

/// Configuration consumed by the tail reader.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TailConfig {
    /// Time between metadata checks while waiting for new data.
    pub poll_interval: Duration,
    /// How long the path may stay unreachable before the reader gives up.
    ///
    /// Should exceed `poll_interval`, so a file deleted and recreated within one interval is
    /// not mistaken for a permanent deletion.
    pub stale_timeout: Duration,
    pub watch_mode: WatchMode,
    pub truncation: TruncationPolicy,
}

impl Default for TailConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(1),
            stale_timeout: Duration::from_secs(5),
            watch_mode: WatchMode::default(),
            truncation: TruncationPolicy::default(),
        }
    }
}

impl TailConfig {
    pub fn new(poll_interval: Duration, stale_timeout: Duration) -> Self {
        Self {
            poll_interval,
            stale_timeout,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    #[must_use]
    pub fn with_stale_timeout(mut self, stale_timeout: Duration) -> Self {
        self.stale_timeout = stale_timeout;
        self
    }

    #[must_use]
    pub fn with_watch_mode(mut self, watch_mode: WatchMode) -> Self {
        self.watch_mode = watch_mode;
        self
    }

    #[must_use]
    pub fn with_truncation(mut self, truncation: TruncationPolicy) -> Self {
        self.truncation = truncation;
        self
    }

    /// Checks that both durations are non-zero.
    pub fn validate(&self) -> Result<()> {
        if self.poll_interval.is_zero() {
            return Err(invalid("poll_interval must be > 0"));
        }
        if self.stale_timeout.is_zero() {
            return Err(invalid("stale_timeout must be > 0"));
        }
        Ok(())
    }

    /// True when a delete-then-recreate inside one poll interval could be taken for a deletion.
    pub(crate) fn stale_timeout_too_short(&self) -> bool {
        self.stale_timeout <= self.poll_interval
    }
}

fn invalid(message: &str) -> Error {
    Error::InvalidConfig {
        message: message.to_string(),
    }
}
