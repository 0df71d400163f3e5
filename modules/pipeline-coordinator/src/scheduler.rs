/// Floor of the scheduling window, in minutes — the most volatile sources
/// still get re-scraped no sooner than this.
const MIN_INTERVAL_MINUTES: i64 = 15;
/// Ceiling of the scheduling window, in minutes (24h) — the calmest sources
/// wait no longer than this between runs.
const MAX_INTERVAL_MINUTES: i64 = 1_440;

/// Volatility-scaled next-run interval (§4.6): a source with `volatility=1.0`
/// (constantly changing) is scheduled at the floor; `volatility=0.0` (never
/// changes) at the ceiling. Out-of-range input is clamped rather than
/// rejected — grounded on the teacher's `SourceScheduler` keeping its cadence
/// math total over any `f64` input.
pub fn compute_next_run_minutes(volatility: f64) -> i64 {
    let clamped = volatility.clamp(0.0, 1.0);
    MAX_INTERVAL_MINUTES - (clamped * (MAX_INTERVAL_MINUTES - MIN_INTERVAL_MINUTES) as f64) as i64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_volatility_is_ceiling() {
        assert_eq!(compute_next_run_minutes(0.0), MAX_INTERVAL_MINUTES);
    }

    #[test]
    fn full_volatility_is_floor() {
        assert_eq!(compute_next_run_minutes(1.0), MIN_INTERVAL_MINUTES);
    }

    #[test]
    fn midpoint_volatility_is_midpoint_interval() {
        let expected = MAX_INTERVAL_MINUTES - (MAX_INTERVAL_MINUTES - MIN_INTERVAL_MINUTES) / 2;
        assert_eq!(compute_next_run_minutes(0.5), expected);
    }

    #[test]
    fn out_of_range_volatility_is_clamped() {
        assert_eq!(compute_next_run_minutes(-1.0), MAX_INTERVAL_MINUTES);
        assert_eq!(compute_next_run_minutes(2.0), MIN_INTERVAL_MINUTES);
    }
}
