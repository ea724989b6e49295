//! Retry backoff strategy.

use std::time::Duration;
use tokio_retry::strategy::ExponentialBackoff;

use crate::config::{RETRY_BACKOFF_BASE, RETRY_BACKOFF_FACTOR_MS};

/// Creates the exponential backoff used between resends of failed records.
///
/// The `k`-th delay (1-based) is `RETRY_BACKOFF_FACTOR_MS * RETRY_BACKOFF_BASE^k`
/// milliseconds, i.e. `0.1 * 2^k` seconds: 200ms before the first resend,
/// 400ms before the second, and so on.
///
/// # Arguments
///
/// * `max_retries` - Number of resends allowed after the initial attempt
///
/// # Returns
///
/// An iterator yielding exactly `max_retries` delays. When it is exhausted the
/// caller has used up its retry budget.
pub fn get_retry_strategy(max_retries: usize) -> impl Iterator<Item = Duration> {
    ExponentialBackoff::from_millis(RETRY_BACKOFF_BASE)
        .factor(RETRY_BACKOFF_FACTOR_MS)
        .take(max_retries)
}
