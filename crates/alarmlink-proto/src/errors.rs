//! Errors produced while building or decoding wire values.

use thiserror::Error;

/// Result alias for wire-format operations.
pub type Result<T> = std::result::Result<T, ProtocolError>;

/// Wire-format errors.
///
/// None of these are fatal to the link: decoders recover by keeping the
/// previous value or returning an absent result.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    /// A text field exceeded its bound while being copied.
    #[error("field `{field}` exceeds {max} bytes")]
    FieldTooLong {
        /// Field name
        field: &'static str,
        /// Maximum allowed length
        max: usize,
    },

    /// A numeric value is outside its enumeration's range.
    #[error("invalid {kind} value: {value}")]
    InvalidEnumValue {
        /// Enumeration name
        kind: &'static str,
        /// Rejected value
        value: i16,
    },

    /// A required field was empty.
    #[error("missing field `{field}`")]
    MissingField {
        /// Field name
        field: &'static str,
    },

    /// A text field is not valid UTF-8.
    #[error("field `{field}` is not valid text")]
    InvalidText {
        /// Field name
        field: &'static str,
    },
}
