//! Retry with exponential backoff for language model calls

use std::time::{Duration, SystemTime};

/// Retry policy for language model requests
///
/// Controls how many times a transient failure is retried and how long to
/// wait between attempts using exponential backoff.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Maximum number of retry attempts
    pub max_retries: u32,
    /// Base delay between retries (doubles each attempt)
    pub base_delay: Duration,
    /// Maximum delay cap
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 2,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(10),
        }
    }
}

/// Determine whether an HTTP status and response body indicate a transient error.
///
/// Server errors (5xx) and timeouts are worth retrying, as are transient
/// network failures surfaced in the body text. Rate limiting (429) is not:
/// the Gemini API reports exhausted quota through it, and hammering it only
/// delays the fallback reply.
#[must_use]
pub fn is_transient(status: u16, body: &str) -> bool {
    if status == 408 || (500..600).contains(&status) {
        return true;
    }

    let lower = body.to_lowercase();
    lower.contains("connection reset")
        || lower.contains("timed out")
        || lower.contains("dns error")
}

/// Compute the delay before the next retry attempt.
///
/// Follows exponential backoff: `min(base_delay * 2^attempt + jitter, max_delay)`.
///
/// Jitter is 0-25% of the computed delay, derived from `SystemTime` to avoid
/// pulling a random number generator into the retry path.
#[must_use]
pub fn delay_for_attempt(policy: &RetryPolicy, attempt: u32) -> Duration {
    let base = policy
        .base_delay
        .saturating_mul(2u32.saturating_pow(attempt));
    let base = base.min(policy.max_delay);

    // Derive a simple jitter from subsecond nanos of the system clock
    let jitter_nanos = SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .unwrap_or_default()
        .subsec_nanos();

    // Scale to 0-25% of the base delay
    let jitter_fraction = f64::from(jitter_nanos % 250) / 1000.0;
    let jitter = base.mul_f64(jitter_fraction);

    (base + jitter).min(policy.max_delay)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transient_on_server_errors() {
        assert!(is_transient(500, ""));
        assert!(is_transient(503, ""));
        assert!(is_transient(408, ""));
    }

    #[test]
    fn not_transient_on_client_errors() {
        assert!(!is_transient(400, ""));
        assert!(!is_transient(401, ""));
        assert!(!is_transient(403, ""));
        assert!(!is_transient(429, ""));
    }

    #[test]
    fn transient_on_network_body() {
        assert!(is_transient(200, "Connection Reset by peer"));
        assert!(is_transient(200, "request Timed Out"));
        assert!(!is_transient(200, "bad request format"));
    }

    #[test]
    fn exponential_growth() {
        let policy = RetryPolicy {
            base_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(60),
            ..RetryPolicy::default()
        };

        assert!(delay_for_attempt(&policy, 0) >= Duration::from_millis(100));
        assert!(delay_for_attempt(&policy, 1) >= Duration::from_millis(200));
        assert!(delay_for_attempt(&policy, 2) >= Duration::from_millis(400));
    }

    #[test]
    fn delay_capped_at_max() {
        let policy = RetryPolicy {
            base_delay: Duration::from_secs(10),
            max_delay: Duration::from_secs(15),
            ..RetryPolicy::default()
        };

        let d = delay_for_attempt(&policy, 3);
        assert!(d <= policy.max_delay, "delay {d:?} exceeds max");
    }

    #[test]
    fn jitter_stays_within_bounds() {
        let policy = RetryPolicy {
            base_delay: Duration::from_millis(1000),
            max_delay: Duration::from_secs(60),
            ..RetryPolicy::default()
        };

        for _ in 0..50 {
            let d = delay_for_attempt(&policy, 0);
            assert!(d >= Duration::from_millis(1000), "below base: {d:?}");
            assert!(d <= Duration::from_millis(1250), "above 125%: {d:?}");
        }
    }
}
