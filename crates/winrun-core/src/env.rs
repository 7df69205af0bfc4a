//! Environment abstraction for deterministic testing.
//!
//! Decouples scheduling and retry logic from wall-clock time and OS
//! randomness, so the frame scheduler and telemetry backoff can be driven
//! by a manual clock in tests instead of real `sleep`s.

use std::time::{Duration, Instant};

/// Abstract environment providing time and randomness.
///
/// # Invariants
///
/// - `now()` never goes backwards within a single execution context.
/// - `random_bytes()` uses cryptographically secure entropy in production.
pub trait Environment: Clone + Send + Sync + 'static {
    /// Current monotonic time.
    fn now(&self) -> Instant;

    /// Sleeps for the specified duration.
    fn sleep(&self, duration: Duration) -> impl std::future::Future<Output = ()> + Send;

    /// Fills the provided buffer with random bytes.
    fn random_bytes(&self, buffer: &mut [u8]);

    /// Generates a random `u64`, e.g. for staging session identifiers.
    fn random_u64(&self) -> u64 {
        let mut bytes = [0u8; 8];
        self.random_bytes(&mut bytes);
        u64::from_be_bytes(bytes)
    }
}

/// Production environment backed by the system clock and OS RNG.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemEnvironment;

impl Environment for SystemEnvironment {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn sleep(&self, duration: Duration) -> impl std::future::Future<Output = ()> + Send {
        tokio::time::sleep(duration)
    }

    fn random_bytes(&self, buffer: &mut [u8]) {
        use rand::RngCore;
        rand::rngs::OsRng.fill_bytes(buffer);
    }
}

/// Manually-advanced environment for deterministic unit tests.
///
/// Time only moves when [`ManualEnvironment::advance`] is called; `sleep`
/// resolves immediately rather than waiting, since tests step time
/// explicitly instead of racing real timers.
#[derive(Debug, Clone)]
pub struct ManualEnvironment {
    now: std::sync::Arc<std::sync::Mutex<Instant>>,
    seed: std::sync::Arc<std::sync::atomic::AtomicU64>,
}

impl ManualEnvironment {
    /// Creates a new manual environment starting at the current instant.
    #[must_use]
    pub fn new() -> Self {
        Self {
            now: std::sync::Arc::new(std::sync::Mutex::new(Instant::now())),
            seed: std::sync::Arc::new(std::sync::atomic::AtomicU64::new(0x9E37_79B9)),
        }
    }

    /// Advances the manual clock by `duration`.
    pub fn advance(&self, duration: Duration) {
        #[allow(clippy::unwrap_used)]
        let mut guard = self.now.lock().unwrap();
        *guard += duration;
    }
}

impl Default for ManualEnvironment {
    fn default() -> Self {
        Self::new()
    }
}

impl Environment for ManualEnvironment {
    fn now(&self) -> Instant {
        #[allow(clippy::unwrap_used)]
        {
            *self.now.lock().unwrap()
        }
    }

    fn sleep(&self, _duration: Duration) -> impl std::future::Future<Output = ()> + Send {
        async {}
    }

    fn random_bytes(&self, buffer: &mut [u8]) {
        // Deterministic xorshift so repeated test runs see the same sequence.
        for chunk in buffer.chunks_mut(8) {
            let mut x = self.seed.load(std::sync::atomic::Ordering::Relaxed);
            x ^= x << 13;
            x ^= x >> 7;
            x ^= x << 17;
            self.seed.store(x, std::sync::atomic::Ordering::Relaxed);
            let bytes = x.to_be_bytes();
            chunk.copy_from_slice(&bytes[..chunk.len()]);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_environment_advances_monotonically() {
        let env = ManualEnvironment::new();
        let t0 = env.now();
        env.advance(Duration::from_millis(50));
        let t1 = env.now();
        assert!(t1 > t0);
        assert_eq!(t1 - t0, Duration::from_millis(50));
    }

    #[test]
    fn manual_environment_rng_is_deterministic() {
        let a = ManualEnvironment::new();
        let b = ManualEnvironment::new();
        assert_eq!(a.random_u64(), b.random_u64());
    }
}
