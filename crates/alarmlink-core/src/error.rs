//! Error types for the command channel.
//!
//! Bounds violations, truncation and rejected fields are not errors at this
//! layer; they are reported through sentinels, capture results and `BAD_VALUE`
//! responses. What remains is the exchange itself failing.

use std::{io, time::Duration};

use thiserror::Error;

/// Errors from a request/acknowledge exchange.
#[derive(Debug, Error)]
pub enum ChannelError {
    /// The acknowledgement did not arrive within the wait window
    #[error("no {token} within {waited:?}")]
    AckTimeout {
        /// Expected acknowledgement token
        token: String,
        /// How long we waited
        waited: Duration,
    },

    /// The serial driver rejected a write
    #[error("serial transport error: {0}")]
    Transport(#[from] io::Error),
}

impl ChannelError {
    /// Returns true if this error is transient and may succeed on retry.
    ///
    /// A missing acknowledgement is transient (the host may be busy); a
    /// transport fault is not.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::AckTimeout { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeouts_are_transient() {
        let err =
            ChannelError::AckTimeout { token: "RSP+OK".into(), waited: Duration::from_millis(500) };
        assert!(err.is_transient());
        assert_eq!(err.to_string(), "no RSP+OK within 500ms");
    }

    #[test]
    fn transport_faults_are_fatal() {
        let err = ChannelError::from(io::Error::new(io::ErrorKind::BrokenPipe, "uart closed"));
        assert!(!err.is_transient());
    }
}
