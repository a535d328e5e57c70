//! Byte transport abstraction.
//!
//! Models a UART driver with its own receive FIFO: the channel polls for
//! buffered bytes and pulls them one at a time, and writes whole lines.
//! Firmware wraps the board's serial peripheral; tests use the in-memory
//! link from `alarmlink-harness`.

use std::io;

/// Serial byte transport.
///
/// Reads never block. When the driver's FIFO is empty, `read_byte` returns
/// `None` and the caller decides whether to sleep and poll again.
pub trait SerialPort {
    /// Number of received bytes that can be read without waiting.
    fn bytes_available(&self) -> usize;

    /// Pop the next received byte, or `None` if the FIFO is empty.
    fn read_byte(&mut self) -> Option<u8>;

    /// Queue `bytes` for transmission.
    ///
    /// # Errors
    ///
    /// Returns an error if the driver rejects the write (peripheral fault,
    /// link closed).
    fn write(&mut self, bytes: &[u8]) -> io::Result<()>;
}

/// Consume bytes from `port` until `token` has been seen.
///
/// Returns `true` once the last byte of the token is read; bytes after it
/// stay in the FIFO. Returns `false` when the FIFO runs dry first, having
/// consumed everything. A partial match restarts on mismatch, which is exact
/// for tokens without a repeated prefix (all tokens used on this link).
pub(crate) fn find_token<P: SerialPort + ?Sized>(port: &mut P, token: &[u8]) -> bool {
    if token.is_empty() {
        return true;
    }
    let mut matched = 0;
    while let Some(b) = port.read_byte() {
        if b == token[matched] {
            matched += 1;
            if matched == token.len() {
                return true;
            }
        } else {
            matched = usize::from(b == token[0]);
        }
    }
    false
}
