//! Wire format for the alarm serial bridge.
//!
//! The host microcontroller and the WiFi co-processor exchange ASCII lines
//! over a UART. Each line starts with the `CMD+` marker, carries a command
//! name and optional comma-separated fields, and ends in CR/LF. Requests are
//! acknowledged with `RSP+OK` or `RSP+BAD_VALUE`.
//!
//! Lines are decoded positionally out of a fixed-capacity [`FrameBuffer`]
//! rather than tokenised, so decoding never allocates beyond the value it
//! produces and never reads past the buffer. This crate holds only the
//! format; the capture loop and the request/acknowledge exchange live in
//! `alarmlink-core`.
#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod buffer;
pub mod command;
pub mod cursor;
pub mod errors;
pub mod message;
pub mod network;
pub mod status;
pub mod tokens;

pub use buffer::FrameBuffer;
pub use command::{CommandKind, Response, TokenMatching};
pub use cursor::FieldCursor;
pub use errors::{ProtocolError, Result};
pub use message::Message;
pub use network::{Credentials, Encryption, MAX_CREDENTIAL_LENGTH, NetworkInfo, ScannedNetwork};
pub use status::{ArmMethod, ArmState, SensorState, Status};
