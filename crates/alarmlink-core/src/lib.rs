//! Serial command/response layer for the alarm bridge.
//!
//! Protocol logic for the link between the alarm host and the WiFi
//! co-processor, decoupled from the UART driver and the clock.
//!
//! # Architecture
//!
//! The layer is composed rather than layered by inheritance:
//!
//! - a generic [`CommandChannel`] provides the primitives (capture a line,
//!   send and await an acknowledgement, respond, walk fields),
//! - a [`ProtocolCatalog`] uses those primitives to implement the closed
//!   set of messages.
//!
//! All I/O comes in through two seams supplied by the caller: a
//! [`SerialPort`] for bytes and an [`Environment`] for time and cooperative
//! sleeps. There is no global state; the driver owns the channel and
//! passes it by reference.
//!
//! # Components
//!
//! - [`capture`]: Line capture (marker scan, terminator stripping, truncation)
//! - [`channel`]: Request/acknowledge exchange and field access
//! - [`catalog`]: Concrete message table
//! - [`mod@env`]: Environment abstraction (time, sleep)
//! - [`transport`]: Serial port abstraction
//! - [`error`]: Channel error types

pub mod capture;
pub mod catalog;
pub mod channel;
pub mod env;
pub mod error;
pub mod transport;

pub use capture::{Capture, CaptureConfig, CapturedLine, LineCapture};
pub use catalog::{CatalogConfig, ProtocolCatalog};
pub use channel::{ChannelConfig, CommandChannel, RetryPolicy};
pub use env::Environment;
pub use error::ChannelError;
pub use transport::SerialPort;

#[cfg(test)]
pub(crate) mod testing {
    use std::time::Duration;

    use crate::env::Environment;

    /// Environment on Tokio's (paused) test clock.
    #[derive(Clone, Copy, Debug)]
    pub(crate) struct TestEnv;

    impl Environment for TestEnv {
        type Instant = tokio::time::Instant;

        fn now(&self) -> Self::Instant {
            tokio::time::Instant::now()
        }

        fn sleep(&self, duration: Duration) -> impl std::future::Future<Output = ()> + Send {
            tokio::time::sleep(duration)
        }
    }
}
