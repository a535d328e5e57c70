//! Fixed wire tokens.

/// Marker that starts every command line, in both directions.
pub const LINE_MARKER: &[u8; 4] = b"CMD+";

/// Terminator appended to every outbound line.
pub const LINE_TERMINATOR: &[u8; 2] = b"\r\n";

/// Acknowledgement: request accepted.
pub const RSP_OK: &[u8] = b"RSP+OK";

/// Acknowledgement: a status field was out of range.
pub const RSP_BAD_VALUE: &[u8] = b"RSP+BAD_VALUE";

/// Separator between positional fields.
pub const FIELD_SEPARATOR: u8 = b',';

/// Separator between a command name and its first field.
pub const NAME_SEPARATOR: u8 = b':';

/// Inbound command names, as they appear after the marker.
pub mod names {
    /// Credentials exchange
    pub const CREDENTIALS: &[u8] = b"CREDENTIALS";
    /// Status set / push
    pub const STATUS: &[u8] = b"STATUS";
    /// Network change request
    pub const CHANGE: &[u8] = b"CHANGE";
    /// Network retry request
    pub const RETRY: &[u8] = b"RETRY";
    /// Device reset request
    pub const RESET: &[u8] = b"RESET";
}

/// True for the bytes stripped from captured lines.
pub fn is_line_terminator(byte: u8) -> bool {
    byte == b'\r' || byte == b'\n'
}
