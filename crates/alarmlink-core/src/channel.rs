//! Command channel: the request/acknowledge primitives every message uses.
//!
//! # Architecture
//!
//! The channel owns the serial port, the receive [`FrameBuffer`] and the
//! [`Environment`]. It knows nothing about individual messages; the
//! [`crate::catalog`] module builds the message table on top of these
//! primitives.
//!
//! # Blocking
//!
//! There is one logical thread. The only suspension points are
//! `Environment::sleep` calls:
//!
//! | Operation | Suspends for |
//! |---|---|
//! | [`CommandChannel::capture`] | settle delay, only after a marker is seen |
//! | [`CommandChannel::send_and_await_ack`] | exactly `timeout` |
//! | [`CommandChannel::send_until_acked`] | `timeout + retry_yield` per attempt |
//! | everything else | never |
//!
//! A wait always runs to the end of its window; there is no cancellation.
//! Giving up is expressed by not retrying.

use std::time::Duration;

use alarmlink_proto::{
    FieldCursor, FrameBuffer, Message, Response,
    tokens::{LINE_MARKER, LINE_TERMINATOR, RSP_OK},
};
use serde::{Deserialize, Serialize};

use crate::{
    capture::{Capture, CaptureConfig, LineCapture},
    env::Environment,
    error::ChannelError,
    transport::{SerialPort, find_token},
};

/// Channel configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChannelConfig {
    /// Receive buffer capacity; also the longest line that survives capture
    pub buffer_capacity: u8,
    /// Acknowledgement window for ordinary messages
    pub response_timeout: Duration,
    /// Multiplier applied to the window for scan list messages
    pub list_timeout_factor: u32,
    /// Pause between retry attempts
    pub retry_yield: Duration,
    /// Line capture settings
    pub capture: CaptureConfig,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            buffer_capacity: 64,
            response_timeout: Duration::from_millis(500),
            list_timeout_factor: 2,
            retry_yield: Duration::from_millis(10),
            capture: CaptureConfig::default(),
        }
    }
}

impl ChannelConfig {
    /// Acknowledgement window for `message`.
    pub fn timeout_for(&self, message: &Message) -> Duration {
        if message.is_list_transfer() {
            self.response_timeout.saturating_mul(self.list_timeout_factor)
        } else {
            self.response_timeout
        }
    }
}

/// How many times an unacknowledged request is re-sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryPolicy {
    /// Send once; report a missing acknowledgement
    Once,
    /// Send up to this many times (0 is treated as 1)
    Attempts(u32),
    /// Keep sending until acknowledged, yielding between attempts
    Forever,
}

impl RetryPolicy {
    fn allows(self, attempt: u32) -> bool {
        match self {
            Self::Once => attempt < 1,
            Self::Attempts(n) => attempt < n.max(1),
            Self::Forever => true,
        }
    }
}

/// Serial command channel.
///
/// One instance per link, owned by the top-level driver and passed by
/// `&mut` to every operation.
#[derive(Debug)]
pub struct CommandChannel<E, P> {
    env: E,
    port: P,
    buffer: FrameBuffer,
    capture: LineCapture,
    config: ChannelConfig,
}

impl<E: Environment, P: SerialPort> CommandChannel<E, P> {
    /// Create a channel over `port`.
    pub fn new(env: E, port: P, config: ChannelConfig) -> Self {
        Self {
            buffer: FrameBuffer::new(usize::from(config.buffer_capacity)),
            capture: LineCapture::new(config.capture.clone()),
            env,
            port,
            config,
        }
    }

    /// Configuration in use.
    pub fn config(&self) -> &ChannelConfig {
        &self.config
    }

    /// Environment in use.
    pub fn env(&self) -> &E {
        &self.env
    }

    /// The last captured line.
    pub fn buffer(&self) -> &FrameBuffer {
        &self.buffer
    }

    /// The underlying port.
    pub fn port(&self) -> &P {
        &self.port
    }

    /// The underlying port, mutably.
    pub fn port_mut(&mut self) -> &mut P {
        &mut self.port
    }

    /// Release the port.
    pub fn into_port(self) -> P {
        self.port
    }

    /// Try to capture one command line into the buffer.
    pub async fn capture(&mut self) -> Capture {
        self.capture.try_capture(&self.env, &mut self.port, &mut self.buffer).await
    }

    /// Clear the buffer and discard unread input, ending the current turn.
    pub fn drain(&mut self) -> usize {
        self.capture.drain_and_clear(&mut self.port, &mut self.buffer)
    }

    /// Send `line` and wait `timeout` for `ack` to arrive.
    ///
    /// The wait is not cut short when the acknowledgement shows up early.
    /// With a zero timeout the input is checked once, immediately.
    ///
    /// # Errors
    ///
    /// - `AckTimeout` if `ack` was not received during the window
    /// - `Transport` if the write failed
    pub async fn send_and_await_ack(
        &mut self,
        line: &[u8],
        ack: &[u8],
        timeout: Duration,
    ) -> Result<(), ChannelError> {
        self.write_line(line)?;

        if !timeout.is_zero() {
            self.env.sleep(timeout).await;
        }

        if find_token(&mut self.port, ack) {
            tracing::debug!(line = %String::from_utf8_lossy(line), "acknowledged");
            Ok(())
        } else {
            let token = String::from_utf8_lossy(ack).into_owned();
            tracing::warn!(line = %String::from_utf8_lossy(line), %token, ?timeout, "no acknowledgement");
            Err(ChannelError::AckTimeout { token, waited: timeout })
        }
    }

    /// Send `line` repeatedly under `policy` until `ack` arrives.
    ///
    /// Returns the number of attempts made. Transport errors end the loop
    /// immediately regardless of policy.
    ///
    /// # Errors
    ///
    /// - `AckTimeout` from the last attempt once the policy is exhausted
    /// - `Transport` if a write failed
    pub async fn send_until_acked(
        &mut self,
        line: &[u8],
        ack: &[u8],
        timeout: Duration,
        policy: RetryPolicy,
    ) -> Result<u32, ChannelError> {
        let mut attempt = 0u32;
        loop {
            let result = self.send_and_await_ack(line, ack, timeout).await;
            attempt = attempt.saturating_add(1);
            match result {
                Ok(()) => return Ok(attempt),
                Err(err) if err.is_transient() && policy.allows(attempt) => {
                    self.env.sleep(self.config.retry_yield).await;
                },
                Err(err) => return Err(err),
            }
        }
    }

    /// Send `message` and wait for `RSP+OK` under `policy`.
    ///
    /// The window comes from [`ChannelConfig::timeout_for`].
    pub async fn send_message(
        &mut self,
        message: &Message,
        policy: RetryPolicy,
    ) -> Result<u32, ChannelError> {
        let timeout = self.config.timeout_for(message);
        let line = message.to_line();
        // The peer stores the line without the marker, in a buffer sized like ours.
        let body = line.len().saturating_sub(LINE_MARKER.len());
        if body > usize::from(self.config.buffer_capacity) {
            tracing::warn!(
                message = message.name(),
                len = body,
                capacity = self.config.buffer_capacity,
                "outbound line longer than peer buffer"
            );
        }
        self.send_until_acked(&line, RSP_OK, timeout, policy).await
    }

    /// Write an acknowledgement line back to the host.
    pub fn respond(&mut self, response: Response) -> Result<(), ChannelError> {
        self.write_line(response.token())
    }

    /// Cursor over the captured line, starting at `offset`.
    pub fn decode_field_at(&self, offset: usize) -> FieldCursor<'_> {
        FieldCursor::at(&self.buffer, offset)
    }

    fn write_line(&mut self, line: &[u8]) -> Result<(), ChannelError> {
        self.port.write(line)?;
        self.port.write(LINE_TERMINATOR)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use alarmlink_proto::{ArmMethod, ArmState, SensorState, Status};

    use super::*;
    use crate::{testing::TestEnv, transport::testing::LoopPort};

    fn channel(input: &[u8]) -> CommandChannel<TestEnv, LoopPort> {
        CommandChannel::new(TestEnv, LoopPort::with_input(input), ChannelConfig::default())
    }

    #[test]
    fn list_messages_get_doubled_window() {
        let config = ChannelConfig::default();
        assert_eq!(config.timeout_for(&Message::EndList), Duration::from_millis(1000));
        assert_eq!(config.timeout_for(&Message::Disconnected), Duration::from_millis(500));
    }

    #[test]
    fn retry_policy_bounds() {
        assert!(RetryPolicy::Once.allows(0));
        assert!(!RetryPolicy::Once.allows(1));
        assert!(RetryPolicy::Attempts(3).allows(2));
        assert!(!RetryPolicy::Attempts(3).allows(3));
        assert!(!RetryPolicy::Attempts(0).allows(1));
        assert!(RetryPolicy::Forever.allows(u32::MAX));
    }

    #[tokio::test(start_paused = true)]
    async fn zero_timeout_without_reply_fails_immediately() {
        let mut ch = channel(b"");
        let start = tokio::time::Instant::now();

        let result = ch.send_and_await_ack(b"CMD+DISCONNECTED", RSP_OK, Duration::ZERO).await;

        assert!(matches!(result, Err(ChannelError::AckTimeout { .. })));
        assert_eq!(start.elapsed(), Duration::ZERO);
        assert_eq!(ch.port().written(), "CMD+DISCONNECTED\r\n");
    }

    #[tokio::test(start_paused = true)]
    async fn waits_full_window_even_when_ack_is_ready() {
        let mut ch = channel(b"RSP+OK\r\n");
        let start = tokio::time::Instant::now();

        ch.send_and_await_ack(b"CMD+END_LIST", RSP_OK, Duration::from_millis(500)).await.unwrap();

        assert_eq!(start.elapsed(), Duration::from_millis(500));
    }

    #[tokio::test(start_paused = true)]
    async fn bad_value_is_not_ok() {
        let mut ch = channel(b"RSP+BAD_VALUE\r\n");
        let result = ch.send_and_await_ack(b"CMD+STATUS:1,0,0", RSP_OK, Duration::ZERO).await;
        assert!(result.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn attempts_policy_resends_each_time() {
        let mut ch = channel(b"");
        let result = ch
            .send_until_acked(b"CMD+DISCONNECTED", RSP_OK, Duration::ZERO, RetryPolicy::Attempts(3))
            .await;

        assert!(result.is_err());
        assert_eq!(ch.port().written().matches("CMD+DISCONNECTED\r\n").count(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn send_message_reports_attempts() {
        let mut ch = channel(b"RSP+OK\r\n");
        let status = Status::new(ArmState::Alert, ArmMethod::Stay, SensorState::Offline);

        let attempts = ch.send_message(&Message::Status(status), RetryPolicy::Once).await.unwrap();

        assert_eq!(attempts, 1);
        assert_eq!(ch.port().written(), "CMD+STATUS:2,1,3\r\n");
    }

    #[test]
    fn respond_writes_token_line() {
        let mut ch = channel(b"");
        ch.respond(Response::BadValue).unwrap();
        assert_eq!(ch.port().written(), "RSP+BAD_VALUE\r\n");
    }

    #[test]
    fn field_cursor_far_past_the_buffer_reads_sentinels() {
        let ch = channel(b"");
        let mut cursor = ch.decode_field_at(usize::MAX);
        assert_eq!(cursor.digit(), -1);
        assert_eq!(cursor.skip(1).digit(), -1);
        assert_eq!(cursor.offset(), usize::MAX);
    }

    #[test]
    fn buffer_uses_configured_capacity() {
        let config = ChannelConfig { buffer_capacity: 16, ..ChannelConfig::default() };
        let ch = CommandChannel::new(TestEnv, LoopPort::default(), config);
        assert_eq!(ch.buffer().capacity(), 16);
    }
}
