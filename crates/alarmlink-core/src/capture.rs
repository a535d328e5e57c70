//! Line capture: turns the serial byte stream into discrete command lines.
//!
//! # Capture sequence
//!
//! ```text
//! bytes available? ──no──> Idle
//!        │ yes
//!        ▼
//! scan for "CMD+" ──not found──> NoMarker   (scanned bytes are discarded)
//!        │ found
//!        ▼
//! settle delay (driver refills its FIFO)
//!        │
//!        ▼
//! clear buffer, copy bytes until LF, skipping CR/LF
//!        │
//!        ▼
//! Line { len, dropped, terminated }
//! ```
//!
//! Bytes that would land past the buffer's capacity are dropped, not
//! reported as an error. The count of dropped bytes is returned so callers
//! can see the truncation.

use std::time::Duration;

use alarmlink_proto::{
    FrameBuffer,
    tokens::{LINE_MARKER, NAME_SEPARATOR, is_line_terminator},
};
use serde::{Deserialize, Serialize};

use crate::{
    env::Environment,
    transport::{SerialPort, find_token},
};

/// Line capture configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// Pause between finding the marker and reading the line body
    pub settle_delay: Duration,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self { settle_delay: Duration::from_millis(100) }
    }
}

/// Outcome of one capture attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capture {
    /// No bytes were waiting
    Idle,
    /// Bytes were waiting but none formed a marker; they were consumed
    NoMarker,
    /// A command line is in the buffer
    Line(CapturedLine),
}

impl Capture {
    /// Whether a command line is now available in the buffer.
    pub fn is_command(&self) -> bool {
        matches!(self, Self::Line(_))
    }

    /// The captured line, if any.
    pub fn line(&self) -> Option<CapturedLine> {
        match self {
            Self::Line(line) => Some(*line),
            Self::Idle | Self::NoMarker => None,
        }
    }
}

/// Shape of a captured line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CapturedLine {
    /// Bytes stored in the buffer
    pub len: usize,
    /// Bytes read from the line but not stored (buffer full)
    pub dropped: usize,
    /// False if the transport ran dry before the line feed
    pub terminated: bool,
}

impl CapturedLine {
    /// Whether the tail of the line was cut off.
    pub fn is_truncated(&self) -> bool {
        self.dropped > 0
    }
}

/// Assembles command lines from a serial port into a [`FrameBuffer`].
#[derive(Debug, Clone, Default)]
pub struct LineCapture {
    config: CaptureConfig,
}

impl LineCapture {
    /// Create a capture stage.
    pub fn new(config: CaptureConfig) -> Self {
        Self { config }
    }

    /// Try to capture one command line into `buffer`.
    ///
    /// Suspends once, for the settle delay, and only after a marker has been
    /// found. The buffer is left untouched unless a marker is found.
    pub async fn try_capture<E, P>(
        &self,
        env: &E,
        port: &mut P,
        buffer: &mut FrameBuffer,
    ) -> Capture
    where
        E: Environment,
        P: SerialPort + ?Sized,
    {
        let available = port.bytes_available();
        if available == 0 {
            return Capture::Idle;
        }

        if !find_token(port, LINE_MARKER) {
            tracing::debug!(discarded = available, "no command marker in received bytes");
            return Capture::NoMarker;
        }

        env.sleep(self.config.settle_delay).await;

        buffer.clear();
        let mut line = CapturedLine { len: 0, dropped: 0, terminated: false };
        while let Some(b) = port.read_byte() {
            if b == b'\n' {
                line.terminated = true;
                break;
            }
            if is_line_terminator(b) {
                continue;
            }
            if buffer.set_byte(line.len, b) {
                line.len += 1;
            } else {
                line.dropped += 1;
            }
        }

        if line.is_truncated() {
            tracing::warn!(
                kept = line.len,
                dropped = line.dropped,
                capacity = buffer.capacity(),
                "command line truncated"
            );
        }
        if !line.terminated {
            tracing::debug!(len = line.len, "command line ended without line feed");
        }
        // Only the command name: field values can hold a passphrase.
        tracing::debug!(command = %command_name(buffer), len = line.len, "captured command");

        Capture::Line(line)
    }

    /// Clear `buffer` and discard everything still waiting on `port`.
    ///
    /// Returns the number of discarded bytes.
    pub fn drain_and_clear<P>(&self, port: &mut P, buffer: &mut FrameBuffer) -> usize
    where
        P: SerialPort + ?Sized,
    {
        buffer.clear();
        let mut discarded = 0;
        while port.read_byte().is_some() {
            discarded += 1;
        }
        if discarded > 0 {
            tracing::debug!(discarded, "drained stale serial input");
        }
        discarded
    }
}

fn command_name(buffer: &FrameBuffer) -> String {
    let contents = buffer.as_bytes();
    let name = contents.split(|&b| b == NAME_SEPARATOR).next().unwrap_or(contents);
    String::from_utf8_lossy(name).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{testing::TestEnv, transport::testing::LoopPort};

    async fn capture(input: &[u8], capacity: usize) -> (Capture, FrameBuffer, LoopPort) {
        let mut port = LoopPort::with_input(input);
        let mut buffer = FrameBuffer::new(capacity);
        let result =
            LineCapture::default().try_capture(&TestEnv, &mut port, &mut buffer).await;
        (result, buffer, port)
    }

    #[tokio::test(start_paused = true)]
    async fn idle_when_nothing_received() {
        let (result, buffer, _) = capture(b"", 64).await;
        assert_eq!(result, Capture::Idle);
        assert!(!result.is_command());
        assert!(buffer.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn noise_without_marker_is_consumed() {
        let (result, _, port) = capture(b"garbage\r\n", 64).await;
        assert_eq!(result, Capture::NoMarker);
        assert_eq!(port.bytes_available(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn strips_terminators_and_marker() {
        let (result, buffer, _) = capture(b"xxCMD+STATUS:1,2,0\r\n", 64).await;
        assert_eq!(result.line(), Some(CapturedLine { len: 12, dropped: 0, terminated: true }));
        assert_eq!(buffer.as_text(), "STATUS:1,2,0");
    }

    #[tokio::test(start_paused = true)]
    async fn stops_at_first_line_feed() {
        let (_, buffer, port) = capture(b"CMD+RESET\nCMD+CHANGE\n", 64).await;
        assert_eq!(buffer.as_text(), "RESET");
        assert_eq!(port.bytes_available(), b"CMD+CHANGE\n".len());
    }

    #[tokio::test(start_paused = true)]
    async fn long_line_is_truncated_without_error() {
        let (result, buffer, port) = capture(b"CMD+ABCDEFGHIJ\r\n", 4).await;
        let line = result.line().unwrap();
        assert!(line.is_truncated());
        assert_eq!(line.len, 4);
        assert_eq!(line.dropped, 6);
        assert!(line.terminated);
        assert_eq!(buffer.as_text(), "ABCD");
        // The rest of the line is consumed, not left for the next capture.
        assert_eq!(port.bytes_available(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn unterminated_line_is_kept() {
        let (result, buffer, _) = capture(b"CMD+RES", 64).await;
        assert_eq!(result.line(), Some(CapturedLine { len: 3, dropped: 0, terminated: false }));
        assert_eq!(buffer.as_text(), "RES");
    }

    #[test]
    fn command_name_stops_at_separator() {
        let mut buffer = FrameBuffer::new(32);
        for (i, &b) in b"CREDENTIALS:home,hunter22".iter().enumerate() {
            buffer.set_byte(i, b);
        }
        assert_eq!(command_name(&buffer), "CREDENTIALS");

        buffer.clear();
        for (i, &b) in b"RESET".iter().enumerate() {
            buffer.set_byte(i, b);
        }
        assert_eq!(command_name(&buffer), "RESET");
    }

    #[tokio::test(start_paused = true)]
    async fn captured_passphrase_stays_out_of_the_log() {
        let logs = SharedLog::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::TRACE)
            .with_writer(move || writer.clone())
            .finish();
        let _guard = tracing::subscriber::set_default(subscriber);

        let (result, buffer, _) = capture(b"CMD+CREDENTIALS:home,hunter22\r\n", 64).await;

        assert!(result.is_command());
        assert_eq!(buffer.as_text(), "CREDENTIALS:home,hunter22");
        let logged = logs.contents();
        assert!(logged.contains("CREDENTIALS"));
        assert!(!logged.contains("hunter22"));
    }

    #[derive(Clone, Default)]
    struct SharedLog(std::sync::Arc<std::sync::Mutex<Vec<u8>>>);

    impl SharedLog {
        fn contents(&self) -> String {
            String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
        }
    }

    impl std::io::Write for SharedLog {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn settle_delay_elapses_before_read() {
        let start = tokio::time::Instant::now();
        let _ = capture(b"CMD+RESET\n", 64).await;
        assert_eq!(start.elapsed(), Duration::from_millis(100));
    }

    #[tokio::test(start_paused = true)]
    async fn no_delay_without_marker() {
        let start = tokio::time::Instant::now();
        let _ = capture(b"noise", 64).await;
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[test]
    fn drain_clears_both_sides() {
        let mut port = LoopPort::with_input(b"RSP+OK\r\nleftover");
        let mut buffer = FrameBuffer::new(8);
        buffer.set_byte(0, b'X');

        let discarded = LineCapture::default().drain_and_clear(&mut port, &mut buffer);
        assert_eq!(discarded, 16);
        assert!(buffer.is_empty());
        assert_eq!(port.bytes_available(), 0);
    }
}
