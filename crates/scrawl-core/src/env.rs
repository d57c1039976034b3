//! Environment abstraction for deterministic testing.
//!
//! Decouples game logic from system resources (time, randomness). Turn
//! timers sleep through this trait, so tests can substitute short or virtual
//! durations, and production uses real system resources.

use std::time::Duration;

/// Abstract environment providing time, randomness, and async sleep.
///
/// # Safety
///
/// Implementations MUST guarantee:
///
/// - `now()` never goes backwards
/// - `random_bytes()` uses a secure entropy source in production
pub trait Environment: Clone + Send + Sync + 'static {
    /// The specific instant type used by this environment.
    ///
    /// Production environments use `std::time::Instant`; simulation
    /// environments may use virtual time.
    type Instant: Copy + Ord + Send + Sync + std::ops::Sub<Output = Duration>;

    /// Current time (monotonic).
    fn now(&self) -> Self::Instant;

    /// Sleeps for the specified duration.
    ///
    /// This is the ONLY async method in the trait, and it is only used by
    /// driver code (turn timers), never by the state machine itself.
    fn sleep(&self, duration: Duration) -> impl std::future::Future<Output = ()> + Send;

    /// Fills the provided buffer with random bytes.
    fn random_bytes(&self, buffer: &mut [u8]);

    /// Generates a random `u64`.
    ///
    /// Convenience for connection id generation.
    fn random_u64(&self) -> u64 {
        let mut bytes = [0u8; 8];
        self.random_bytes(&mut bytes);
        u64::from_be_bytes(bytes)
    }
}
