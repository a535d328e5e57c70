//! Environment abstraction for cooperative scheduling.
//!
//! The channel never reads a clock or sleeps on its own. Time and the yield
//! primitive come from an [`Environment`] supplied by the caller, so the same
//! protocol code runs on the co-processor (where a sleep hands the CPU to the
//! WiFi stack) and in simulation (where a sleep advances virtual time
//! instantly).
//!
//! # Invariants
//!
//! - Monotonicity: `env.now()` never goes backwards
//! - Isolation: implementations must not share global state

use std::time::Duration;

/// Time source and suspension primitive.
///
/// # Implementations
///
/// - Simulation (`alarmlink-harness::SimEnv`): Turmoil/Tokio virtual time.
/// - Firmware: the board's monotonic timer and the executor's delay, which
///   is also where the WiFi driver gets its scheduling slices.
pub trait Environment: Clone + Send + Sync + 'static {
    /// Type representing a point in time.
    ///
    /// Must support:
    /// - `Copy` - Lightweight to pass around
    /// - `Ord` - Can be compared (for timeout logic)
    /// - `Sub<Output = Duration>` - Can compute elapsed time
    type Instant: Copy + Ord + Send + Sync + std::ops::Sub<Output = Duration>;

    /// Returns the current time.
    ///
    /// Subsequent calls must return times >= previous calls.
    fn now(&self) -> Self::Instant;

    /// Suspends the caller for `duration`, letting other tasks run.
    ///
    /// A zero duration is a plain yield. Every suspension point in the
    /// channel goes through here; nothing else blocks.
    fn sleep(&self, duration: Duration) -> impl std::future::Future<Output = ()> + Send;
}
