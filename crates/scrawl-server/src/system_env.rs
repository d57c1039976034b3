//! Production Environment implementation using system time and RNG.
//!
//! `SystemEnv` is the production implementation of the Environment trait
//! using real system time and cryptographic RNG.
//!
//! # Capabilities
//!
//! - Real system time (`std::time::Instant`) that advances naturally
//! - OS cryptographic RNG (getrandom). Truly random, not reproducible
//! - Tokio async sleep for actual wall-clock turn timers

use std::time::Duration;

use scrawl_core::env::Environment;

/// Production environment using system time and cryptographic RNG.
///
/// # Panics
///
/// Panics if the OS RNG fails. Connection ids come from this source and a
/// server without functioning randomness cannot assign them safely. RNG
/// failure is extremely rare and indicates OS-level issues.
#[derive(Clone, Default)]
pub struct SystemEnv;

impl SystemEnv {
    /// Create a new system environment.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Environment for SystemEnv {
    type Instant = std::time::Instant;

    fn now(&self) -> Self::Instant {
        std::time::Instant::now()
    }

    fn sleep(&self, duration: Duration) -> impl std::future::Future<Output = ()> + Send {
        tokio::time::sleep(duration)
    }

    #[allow(clippy::expect_used)]
    fn random_bytes(&self, buffer: &mut [u8]) {
        getrandom::fill(buffer).expect("invariant: OS RNG failure is unrecoverable");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn time_advances() {
        let env = SystemEnv::new();
        let t1 = env.now();
        std::thread::sleep(Duration::from_millis(5));
        assert!(env.now() > t1);
    }

    #[test]
    fn random_u64_values_differ() {
        let env = SystemEnv::new();
        // Extremely unlikely to collide if random
        assert_ne!(env.random_u64(), env.random_u64());
    }

    #[tokio::test]
    async fn sleep_waits_at_least_the_duration() {
        let env = SystemEnv::new();
        let start = env.now();
        env.sleep(Duration::from_millis(20)).await;
        assert!(env.now() - start >= Duration::from_millis(20));
    }
}
