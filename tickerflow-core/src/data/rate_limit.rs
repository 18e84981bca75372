//! Request pacing for the broker.
//!
//! IB enforces pacing limits on historical data requests. The pipelines call
//! `RateLimiter::wait` before every broker request. The default limiter is
//! a single-token bucket with a fixed refill interval: the first permit is
//! immediate, every later permit waits until `interval` has passed since the
//! previous one. It does not look at broker responses.

use std::time::{Duration, Instant};
use tracing::debug;

/// Blocks the caller until the next request may be sent.
pub trait RateLimiter {
    fn wait(&mut self);
}

impl<T: RateLimiter + ?Sized> RateLimiter for &mut T {
    fn wait(&mut self) {
        (**self).wait()
    }
}

impl<T: RateLimiter + ?Sized> RateLimiter for Box<T> {
    fn wait(&mut self) {
        (**self).wait()
    }
}

/// Single-token bucket refilled once per `interval`.
#[derive(Debug)]
pub struct FixedIntervalLimiter {
    interval: Duration,
    last_permit: Option<Instant>,
}

impl FixedIntervalLimiter {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_permit: None,
        }
    }

    /// Limiter from a fractional number of seconds. Negative or NaN input is
    /// treated as zero.
    pub fn from_secs_f64(seconds: f64) -> Self {
        let seconds = if seconds.is_finite() && seconds > 0.0 {
            seconds
        } else {
            0.0
        };
        Self::new(Duration::from_secs_f64(seconds))
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Time left before the next permit (zero if one is available now).
    pub fn remaining(&self) -> Duration {
        match self.last_permit {
            None => Duration::ZERO,
            Some(at) => self.interval.saturating_sub(at.elapsed()),
        }
    }
}

impl RateLimiter for FixedIntervalLimiter {
    fn wait(&mut self) {
        let remaining = self.remaining();
        if !remaining.is_zero() {
            debug!(wait_ms = remaining.as_millis() as u64, "rate limited, waiting");
            std::thread::sleep(remaining);
        }
        self.last_permit = Some(Instant::now());
    }
}

/// Limiter that never waits.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopLimiter;

impl RateLimiter for NoopLimiter {
    fn wait(&mut self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_permit_is_immediate() {
        let mut limiter = FixedIntervalLimiter::new(Duration::from_secs(60));
        let start = Instant::now();
        limiter.wait();
        assert!(start.elapsed() < Duration::from_secs(1));
    }

    #[test]
    fn consecutive_permits_are_spaced_by_interval() {
        let interval = Duration::from_millis(20);
        let mut limiter = FixedIntervalLimiter::new(interval);
        limiter.wait();
        let after_first = Instant::now();
        limiter.wait();
        assert!(after_first.elapsed() >= interval - Duration::from_millis(1));
    }

    #[test]
    fn no_wait_once_interval_has_passed() {
        let mut limiter = FixedIntervalLimiter::new(Duration::from_millis(10));
        limiter.wait();
        std::thread::sleep(Duration::from_millis(15));
        assert_eq!(limiter.remaining(), Duration::ZERO);
    }

    #[test]
    fn invalid_seconds_become_zero() {
        assert_eq!(FixedIntervalLimiter::from_secs_f64(-1.0).interval(), Duration::ZERO);
        assert_eq!(FixedIntervalLimiter::from_secs_f64(f64::NAN).interval(), Duration::ZERO);
        assert_eq!(
            FixedIntervalLimiter::from_secs_f64(0.5).interval(),
            Duration::from_millis(500)
        );
    }

    #[test]
    fn boxed_limiter_is_swappable() {
        let mut limiter: Box<dyn RateLimiter> = Box::new(NoopLimiter);
        limiter.wait();
        limiter.wait();
    }
}
