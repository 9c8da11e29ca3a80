//! Token bucket admission control for directory rebuilds.
//!
//! Tokens refill continuously at `refill_per_sec` up to `burst`. Admission is
//! a zero-wait reservation: either a whole token is taken right now, or
//! nothing is taken and the caller learns how long until one will be there.

use std::time::{Duration, Instant};

use parking_lot::Mutex;

pub const DEFAULT_BURST: u32 = 5;
pub const DEFAULT_REFILL_PER_SEC: f64 = 5.0;

const MIN_REFILL_PER_SEC: f64 = 1e-6;

#[derive(Debug)]
struct Bucket {
    /// Fractional so partial refills accumulate between calls.
    tokens: f64,
    last_refill: Instant,
}

/// Rate gate bounding how often an expensive rebuild may run.
#[derive(Debug)]
pub struct RateGate {
    burst: u32,
    refill_per_sec: f64,
    bucket: Mutex<Bucket>,
}

impl RateGate {
    /// Gate starting full with `burst` tokens.
    pub fn new(burst: u32, refill_per_sec: f64) -> Self {
        Self::with_initial(burst, refill_per_sec, burst)
    }

    pub fn with_initial(burst: u32, refill_per_sec: f64, initial: u32) -> Self {
        // +inf refills to burst on every call; NaN and non-positive rates clamp.
        let refill_per_sec = if refill_per_sec > MIN_REFILL_PER_SEC { refill_per_sec } else { MIN_REFILL_PER_SEC };
        Self {
            burst,
            refill_per_sec,
            bucket: Mutex::new(Bucket { tokens: initial.min(burst) as f64, last_refill: Instant::now() }),
        }
    }

    pub fn burst(&self) -> u32 {
        self.burst
    }

    pub fn refill_per_sec(&self) -> f64 {
        self.refill_per_sec
    }

    /// Take one token if available; otherwise report the wait until the next one.
    pub fn try_admit(&self) -> Result<(), Duration> {
        let mut b = self.bucket.lock();
        self.refill(&mut b, Instant::now());
        if b.tokens >= 1.0 {
            b.tokens -= 1.0;
            return Ok(());
        }
        if self.burst == 0 {
            // Can never hold a token; report one full refill period.
            return Err(Duration::from_secs_f64(1.0 / self.refill_per_sec).max(Duration::from_nanos(1)));
        }
        let missing = 1.0 - b.tokens;
        Err(Duration::from_secs_f64(missing / self.refill_per_sec).max(Duration::from_nanos(1)))
    }

    /// Tokens currently available (after refill).
    pub fn available(&self) -> f64 {
        let mut b = self.bucket.lock();
        self.refill(&mut b, Instant::now());
        b.tokens
    }

    fn refill(&self, b: &mut Bucket, now: Instant) {
        if self.refill_per_sec.is_infinite() {
            b.tokens = self.burst as f64;
            b.last_refill = now;
            return;
        }
        let elapsed = now.saturating_duration_since(b.last_refill);
        if elapsed.is_zero() {
            return;
        }
        b.tokens = (b.tokens + elapsed.as_secs_f64() * self.refill_per_sec).min(self.burst as f64);
        b.last_refill = now;
    }
}

impl Default for RateGate {
    fn default() -> Self {
        Self::new(DEFAULT_BURST, DEFAULT_REFILL_PER_SEC)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn default_admits_burst_then_limits() {
        let gate = RateGate::default();
        for _ in 0..DEFAULT_BURST {
            assert!(gate.try_admit().is_ok());
        }
        let delay = gate.try_admit().unwrap_err();
        assert!(delay > Duration::ZERO);
        // One token at 5/s takes at most 200ms.
        assert!(delay <= Duration::from_millis(200), "delay={:?}", delay);
    }

    #[test]
    fn denied_admission_consumes_nothing() {
        let gate = RateGate::new(1, 0.001);
        assert!(gate.try_admit().is_ok());
        let first = gate.try_admit().unwrap_err();
        let second = gate.try_admit().unwrap_err();
        // Cancelled reservations do not push the next token further out.
        assert!(second <= first);
        assert!(gate.available() < 1.0);
    }

    #[test]
    fn refills_over_time() {
        let gate = RateGate::with_initial(2, 50.0, 0);
        assert!(gate.try_admit().is_err());
        thread::sleep(Duration::from_millis(60));
        assert!(gate.try_admit().is_ok());
    }

    #[test]
    fn refill_capped_at_burst() {
        let gate = RateGate::new(3, 1000.0);
        thread::sleep(Duration::from_millis(20));
        assert!(gate.available() <= 3.0);
        for _ in 0..3 {
            assert!(gate.try_admit().is_ok());
        }
    }

    #[test]
    fn zero_rate_is_clamped_to_finite_delay() {
        let gate = RateGate::new(1, 0.0);
        assert!(gate.try_admit().is_ok());
        let delay = gate.try_admit().unwrap_err();
        assert!(delay > Duration::from_secs(3600));
    }

    #[test]
    fn infinite_rate_always_refills_to_burst() {
        let gate = RateGate::new(2, f64::INFINITY);
        for _ in 0..10 {
            assert!(gate.try_admit().is_ok());
        }
        assert_eq!(gate.available(), 2.0);
    }

    #[test]
    fn nan_rate_is_clamped() {
        let gate = RateGate::new(1, f64::NAN);
        assert!(gate.refill_per_sec() > 0.0 && gate.refill_per_sec().is_finite());
    }

    #[test]
    fn zero_burst_never_admits() {
        let gate = RateGate::new(0, 5.0);
        assert_eq!(gate.try_admit().unwrap_err(), Duration::from_secs_f64(0.2));
    }
}
