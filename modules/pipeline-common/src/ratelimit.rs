use rand::Rng;
use std::time::Duration;

/// `baseMs + rand*jitterMs` per-source rate limit delay (§4.1, §5).
pub fn jittered_delay(base_ms: u64, jitter_ms: u64) -> Duration {
    let jitter = if jitter_ms == 0 {
        0
    } else {
        rand::rng().random_range(0..jitter_ms)
    };
    Duration::from_millis(base_ms + jitter)
}

/// Exponential backoff for 429s: `base * 2^attempt`, capped at 30s, with
/// ±20% jitter — grounded on `ChromeFetcher`'s `CHROME_RETRY_BASE * 3^attempt`
/// backoff shape, generalized to the base/cap/jitter-fraction §4.1 specifies.
pub fn backoff_with_jitter(base: Duration, attempt: u32, cap: Duration, jitter_fraction: f64) -> Duration {
    let scaled = base.saturating_mul(2u32.saturating_pow(attempt));
    let capped = scaled.min(cap);
    let jitter_ms = (capped.as_millis() as f64 * jitter_fraction) as u64;
    let jitter = if jitter_ms == 0 {
        0
    } else {
        rand::rng().random_range(0..jitter_ms)
    };
    capped + Duration::from_millis(jitter)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn jittered_delay_bounds() {
        for _ in 0..50 {
            let d = jittered_delay(200, 20);
            assert!(d.as_millis() >= 200 && d.as_millis() < 220);
        }
    }

    #[test]
    fn jittered_delay_zero_jitter_is_exact() {
        assert_eq!(jittered_delay(300, 0), Duration::from_millis(300));
    }

    #[test]
    fn backoff_grows_monotonically_until_cap() {
        let base = Duration::from_secs(1);
        let cap = Duration::from_secs(30);
        let a0 = backoff_with_jitter(base, 0, cap, 0.0);
        let a1 = backoff_with_jitter(base, 1, cap, 0.0);
        let a2 = backoff_with_jitter(base, 2, cap, 0.0);
        assert!(a0 < a1);
        assert!(a1 < a2);
    }

    #[test]
    fn backoff_respects_cap() {
        let base = Duration::from_secs(1);
        let cap = Duration::from_secs(30);
        let huge = backoff_with_jitter(base, 20, cap, 0.2);
        assert!(huge.as_secs_f64() <= cap.as_secs_f64() * 1.2 + 0.001);
    }
}
