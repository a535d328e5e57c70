//! Deterministic simulation harness for the alarm serial bridge.
//!
//! Turmoil-based implementations of the Environment and SerialPort traits
//! for reproducible testing of acknowledgement windows, retries and line
//! capture under latency, silence and noise.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod sim_env;
pub mod sim_serial;

pub use sim_env::SimEnv;
pub use sim_serial::{AckMode, SimHost, SimSerial, sim_link};
