//! Compare-and-swap loop around a single table.

use std::time::Duration;

use rand::Rng;

use crate::error::ServiceError;
use crate::store::{StoreError, TableName};

pub const DEFAULT_MAX_WRITE_ATTEMPTS: u32 = 8;
pub const DEFAULT_BASE_DELAY: Duration = Duration::from_millis(5);
pub const DEFAULT_MAX_DELAY: Duration = Duration::from_millis(250);

/// How often, and how patiently, a lost conditional write is retried.
///
/// Every order competes for the same table revision, so callers that lost a
/// race back off for a jittered, doubling delay before re-reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Read-decide-write attempts per table, including the first.
    pub max_attempts: u32,
    /// Backoff ceiling after the first lost race.
    pub base_delay: Duration,
    /// Upper bound for any single backoff.
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_WRITE_ATTEMPTS,
            base_delay: DEFAULT_BASE_DELAY,
            max_delay: DEFAULT_MAX_DELAY,
        }
    }
}

impl RetryPolicy {
    /// Retry without sleeping.
    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            base_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
        }
    }

    /// Exponential ceiling after losing attempt `attempt` (1-indexed).
    pub fn backoff_ceiling(&self, attempt: u32) -> Duration {
        if attempt == 0 {
            return Duration::ZERO;
        }
        let factor = 1u32 << (attempt - 1).min(16);
        self.base_delay.saturating_mul(factor).min(self.max_delay)
    }

    /// Jittered delay in `[ceiling / 2, ceiling]`.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let ceiling = self.backoff_ceiling(attempt);
        let half = ceiling / 2;
        let span = u64::try_from((ceiling - half).as_micros()).unwrap_or(u64::MAX);
        if span == 0 {
            return half;
        }
        half + Duration::from_micros(rand::thread_rng().gen_range(0..=span))
    }
}

/// Outcome of one read-decide-write attempt.
pub(crate) enum Attempt<T> {
    Committed(T),
    /// Someone else wrote the table between our read and our write.
    Conflict,
}

/// Classify the result of a conditional write.
pub(crate) fn commit<T>(written: Result<u64, StoreError>, value: T) -> Result<Attempt<T>, ServiceError> {
    match written {
        Ok(_) => Ok(Attempt::Committed(value)),
        Err(StoreError::Conflict { .. }) => Ok(Attempt::Conflict),
        Err(e) => Err(e.into()),
    }
}

/// Run `attempt` until it commits, fails, or the budget runs out.
///
/// Each attempt must re-read the table; nothing decided against a lost
/// snapshot is reused. Exhausting the budget surfaces as `StoreUnavailable`.
pub(crate) fn write_with_retry<T>(
    table: TableName,
    policy: &RetryPolicy,
    mut attempt: impl FnMut(u32) -> Result<Attempt<T>, ServiceError>,
) -> Result<T, ServiceError> {
    let max_attempts = policy.max_attempts.max(1);
    for n in 1..=max_attempts {
        match attempt(n)? {
            Attempt::Committed(value) => return Ok(value),
            Attempt::Conflict if n < max_attempts => {
                let delay = policy.delay_for_attempt(n);
                tracing::warn!(%table, attempt = n, max_attempts, ?delay, "conditional write lost a race");
                std::thread::sleep(delay);
            }
            Attempt::Conflict => {
                tracing::warn!(%table, attempt = n, max_attempts, "conditional write lost its last race");
            }
        }
    }
    Err(ServiceError::StoreUnavailable(format!(
        "{table} table still contended after {max_attempts} attempts"
    )))
}
