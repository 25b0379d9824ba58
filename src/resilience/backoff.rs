//! Exponential backoff with optional jitter.

use std::time::Duration;

use rand::Rng;

/// Delay before the attempt following the zero-based `attempt`.
///
/// `min(base * 2^attempt, max)`, saturating on overflow.
pub fn calculate_backoff(attempt: u32, base: Duration, max: Duration) -> Duration {
    let factor = 2u32.checked_pow(attempt).unwrap_or(u32::MAX);
    base.saturating_mul(factor).min(max)
}

/// Add 0 to 10% random jitter to a delay.
pub fn apply_jitter(delay: Duration) -> Duration {
    let jitter_range = delay.as_millis() as u64 / 10;
    if jitter_range == 0 {
        return delay;
    }
    let jitter = rand::thread_rng().gen_range(0..jitter_range);
    delay + Duration::from_millis(jitter)
}
