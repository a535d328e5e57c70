//! Inbound (host to device) command recognition and responses.
//!
//! A captured line holds everything after the [`crate::tokens::LINE_MARKER`].
//! Commands with fields (`STATUS:`, `CREDENTIALS:`) are recognised by prefix;
//! single-word commands (`CHANGE`, `RETRY`, `RESET`) by token, under a
//! [`TokenMatching`] policy.

use serde::{Deserialize, Serialize};

use crate::{
    buffer::FrameBuffer,
    tokens::{NAME_SEPARATOR, RSP_BAD_VALUE, RSP_OK, names},
};

/// Kind of host command held in a captured line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandKind {
    /// `CREDENTIALS:<ssid>,<pass>`
    Credentials,
    /// `STATUS:<state>,<method>,<sensor>`
    Status,
    /// `CHANGE`
    NetworkChange,
    /// `RETRY`
    NetworkRetry,
    /// `RESET`
    Reset,
}

impl CommandKind {
    /// Name as it appears on the wire.
    pub fn name(self) -> &'static [u8] {
        match self {
            Self::Credentials => names::CREDENTIALS,
            Self::Status => names::STATUS,
            Self::NetworkChange => names::CHANGE,
            Self::NetworkRetry => names::RETRY,
            Self::Reset => names::RESET,
        }
    }

    /// Offset of the first field, just past `NAME:`.
    pub fn field_offset(self) -> usize {
        self.name().len() + 1
    }

    /// Whether the command is a bare word with no fields.
    pub fn is_single_word(self) -> bool {
        matches!(self, Self::NetworkChange | Self::NetworkRetry | Self::Reset)
    }

    /// Whether `buffer` holds this command under `matching`.
    pub fn matches(self, buffer: &FrameBuffer, matching: TokenMatching) -> bool {
        if !self.is_single_word() {
            return buffer.matches_prefix(self.name())
                && buffer.byte(self.name().len()) == NAME_SEPARATOR;
        }
        match matching {
            TokenMatching::Exact => buffer.as_bytes() == self.name(),
            TokenMatching::Substring => buffer.contains(self.name()),
        }
    }

    /// Classify the captured line. Field commands take precedence.
    pub fn recognize(buffer: &FrameBuffer, matching: TokenMatching) -> Option<Self> {
        [Self::Credentials, Self::Status, Self::NetworkChange, Self::NetworkRetry, Self::Reset]
            .into_iter()
            .find(|kind| kind.matches(buffer, matching))
    }
}

/// How single-word commands are matched against a captured line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenMatching {
    /// The whole captured line must equal the token.
    #[default]
    Exact,
    /// The token may appear anywhere in the line. Compatible with hosts that
    /// pad or decorate single-word commands, at the cost of false positives
    /// when a field value contains the token.
    Substring,
}

/// Acknowledgement written back to the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Response {
    /// `RSP+OK`
    Ok,
    /// `RSP+BAD_VALUE`
    BadValue,
}

impl Response {
    /// Wire token.
    pub fn token(self) -> &'static [u8] {
        match self {
            Self::Ok => RSP_OK,
            Self::BadValue => RSP_BAD_VALUE,
        }
    }
}
