use rand::random_range;
use std::time::Duration;
use tokio::time::sleep;
use tracing::trace;

/// Compute `base_ms` plus a random extra in `[0, jitter_ms]`.
pub fn with_jitter(base_ms: u64, jitter_ms: u64) -> Duration {
    let extra = if jitter_ms == 0 {
        0
    } else {
        random_range(0..=jitter_ms)
    };
    Duration::from_millis(base_ms.saturating_add(extra))
}

/// Pause so the page can re-render after an action.
///
/// Zero-length pauses return immediately without touching the timer.
pub async fn settle(base_ms: u64, jitter_ms: u64) {
    let delay = with_jitter(base_ms, jitter_ms);
    if delay.is_zero() {
        return;
    }
    trace!(target: "courtbook::delay", delay = ?delay, "settle");
    sleep(delay).await;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_without_jitter_is_exact() {
        assert_eq!(with_jitter(250, 0), Duration::from_millis(250));
    }

    #[test]
    fn test_jitter_stays_in_bounds() {
        for _ in 0..100 {
            let d = with_jitter(100, 50);
            assert!(d >= Duration::from_millis(100));
            assert!(d <= Duration::from_millis(150));
        }
    }

    #[tokio::test]
    async fn test_zero_settle_returns() {
        settle(0, 0).await;
    }

    #[tokio::test]
    async fn test_settle_waits_full_delay() {
        let start = tokio::time::Instant::now();
        settle(20, 0).await;
        assert!(start.elapsed() >= Duration::from_millis(20));
    }
}
