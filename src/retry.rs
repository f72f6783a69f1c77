//! Bounded retry with a fixed delay between attempts.
//!
//! Used around externally-facing operations that may fail transiently, such
//! as copying the store file while another process briefly holds a lock.
//! Every failure is treated the same way; callers that need to give up early
//! on non-recoverable errors must filter before calling in.

use std::fmt;
use std::thread;
use std::time::Duration;

use tracing::{debug, warn};

/// Default number of attempts.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Every failure captured while retrying an operation, oldest first.
#[derive(Debug)]
pub struct RetryError<E> {
    pub failures: Vec<E>,
}

impl<E> RetryError<E> {
    /// Number of attempts that were made.
    pub fn attempts(&self) -> usize {
        self.failures.len()
    }

    /// The failure of the final attempt.
    pub fn last(&self) -> Option<&E> {
        self.failures.last()
    }
}

impl<E: fmt::Display> fmt::Display for RetryError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "failed after {} attempt(s)", self.failures.len())?;
        for (i, failure) in self.failures.iter().enumerate() {
            write!(f, "; #{}: {failure}", i + 1)?;
        }
        Ok(())
    }
}

impl<E: std::error::Error + 'static> std::error::Error for RetryError<E> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.failures
            .last()
            .map(|e| e as &(dyn std::error::Error + 'static))
    }
}

/// Retry configuration: how many times to try and how long to wait between tries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub delay: Duration,
    pub max_attempts: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            delay: Duration::from_millis(500),
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }
}

impl RetryPolicy {
    pub const fn new(delay: Duration, max_attempts: u32) -> Self {
        Self {
            delay,
            max_attempts,
        }
    }

    /// Runs `operation`, sleeping the calling thread between attempts.
    pub fn execute<T, E, F>(&self, operation: F) -> Result<T, RetryError<E>>
    where
        F: FnMut() -> Result<T, E>,
        E: fmt::Display,
    {
        self.execute_with_sleep(operation, thread::sleep)
    }

    /// Runs `operation`, calling `sleep` before every retry.
    ///
    /// `sleep` is never called before the first attempt, so an operation
    /// that fails `n` times causes exactly `n - 1` waits. A `max_attempts` of
    /// zero still runs the operation once.
    pub fn execute_with_sleep<T, E, F, S>(
        &self,
        mut operation: F,
        mut sleep: S,
    ) -> Result<T, RetryError<E>>
    where
        F: FnMut() -> Result<T, E>,
        S: FnMut(Duration),
        E: fmt::Display,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut failures = Vec::new();

        for attempt in 1..=max_attempts {
            if attempt > 1 {
                debug!(attempt, delay_ms = self.delay.as_millis(), "Waiting before retry");
                sleep(self.delay);
            }
            match operation() {
                Ok(value) => return Ok(value),
                Err(e) => {
                    warn!(attempt, max_attempts, error = %e, "Attempt failed");
                    failures.push(e);
                }
            }
        }

        Err(RetryError { failures })
    }
}

/// Runs `operation` up to `max_attempts` times with `delay` between attempts.
pub fn execute<T, E, F>(operation: F, delay: Duration, max_attempts: u32) -> Result<T, RetryError<E>>
where
    F: FnMut() -> Result<T, E>,
    E: fmt::Display,
{
    RetryPolicy::new(delay, max_attempts).execute(operation)
}
