//! Turmoil-based Environment implementation for deterministic testing.

use std::time::Duration;

use alarmlink_core::Environment;

/// Simulation environment using Turmoil's virtual time.
///
/// `sleep()` advances virtual time instantly, so a 500 ms acknowledgement
/// window costs nothing in wall-clock time and always ends at the same
/// simulated instant.
///
/// # Usage
///
/// `SimEnv` must be used inside a Turmoil simulation (or a paused Tokio
/// runtime). Outside one, `now()` and `sleep()` panic.
#[derive(Clone, Copy, Debug, Default)]
pub struct SimEnv;

impl SimEnv {
    /// Create a simulation environment.
    pub fn new() -> Self {
        Self
    }
}

impl Environment for SimEnv {
    type Instant = std::time::Instant;

    fn now(&self) -> Self::Instant {
        // Use tokio's Instant which works with turmoil
        tokio::time::Instant::now().into_std()
    }

    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sim_env_time_advances() {
        let mut sim = turmoil::Builder::new().build();

        sim.client("test", async {
            let env = SimEnv::new();

            let start = env.now();
            env.sleep(Duration::from_millis(500)).await;
            let end = env.now();

            assert_eq!(end - start, Duration::from_millis(500));

            Ok(())
        });

        sim.run().expect("simulation failed");
    }
}
