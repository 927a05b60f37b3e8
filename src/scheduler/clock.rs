//! Time source for the scheduler.

use std::fmt;
use std::time::Instant;

/// Monotonic time source.
///
/// The scheduler reads the time through this trait so tests can control it.
/// Sleeping always goes through tokio, so a replacement clock should agree
/// with tokio's timer (as [`TokioClock`] does under a paused runtime).
pub trait Clock: Send + Sync + fmt::Debug {
    fn now(&self) -> Instant;
}

/// Reads tokio's clock, which follows `tokio::time::pause` in tests.
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioClock;

impl Clock for TokioClock {
    fn now(&self) -> Instant {
        tokio::time::Instant::now().into_std()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test(start_paused = true)]
    async fn test_tokio_clock_follows_paused_time() {
        let clock = TokioClock;
        let before = clock.now();
        tokio::time::advance(Duration::from_secs(30)).await;
        assert!(clock.now().duration_since(before) >= Duration::from_secs(30));
    }
}
