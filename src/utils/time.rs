//! Elapsed-time formatting for progress reporting

use std::time::Duration;

/// Format a duration as `Xm YYs`, or `Xh YYm YYs` once it passes an hour.
/// Sub-second precision is dropped.
pub fn format_elapsed(duration: Duration) -> String {
    let seconds = duration.as_secs();
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;

    if hours > 0 {
        format!("{hours}h {minutes:02}m {secs:02}s")
    } else {
        format!("{minutes}m {secs:02}s")
    }
}

/// Remaining time assuming the average pace so far holds
pub fn estimate_remaining(elapsed: Duration, done: usize, total: usize) -> Duration {
    if done == 0 {
        return Duration::ZERO;
    }
    let remaining = total.saturating_sub(done);
    elapsed.mul_f64(remaining as f64 / done as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(0, "0m 00s")]
    #[case(59, "0m 59s")]
    #[case(61, "1m 01s")]
    #[case(3599, "59m 59s")]
    #[case(3600, "1h 00m 00s")]
    #[case(7325, "2h 02m 05s")]
    fn test_format_elapsed(#[case] seconds: u64, #[case] expected: &str) {
        assert_eq!(format_elapsed(Duration::from_secs(seconds)), expected);
    }

    #[test]
    fn test_sub_second_precision_is_dropped() {
        assert_eq!(format_elapsed(Duration::from_millis(1999)), "0m 01s");
    }

    #[test]
    fn test_estimate_remaining() {
        let eta = estimate_remaining(Duration::from_secs(30), 3, 10);
        assert_eq!(eta, Duration::from_secs(70));
        assert_eq!(estimate_remaining(Duration::from_secs(5), 0, 10), Duration::ZERO);
        assert_eq!(estimate_remaining(Duration::from_secs(5), 10, 10), Duration::ZERO);
    }

    #[test]
    fn test_estimate_remaining_beyond_u32_counts() {
        let done = u32::MAX as usize + 10;
        let eta = estimate_remaining(Duration::from_secs(100), done, done * 2);
        assert_eq!(eta.as_secs(), 100);
    }
}
