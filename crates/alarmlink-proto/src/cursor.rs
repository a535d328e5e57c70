//! Positional field walker over a [`FrameBuffer`].
//!
//! Decoders read fixed-format lines field by field without tokenising: the
//! cursor starts at an offset, reads one position at a time through the
//! buffer's bounds-checked accessors, and is advanced past separators
//! explicitly. Reads past capacity yield the buffer's sentinels rather than
//! failing.

use crate::{
    buffer::FrameBuffer,
    errors::{ProtocolError, Result},
};

/// Read position within a captured line.
#[derive(Debug, Clone, Copy)]
pub struct FieldCursor<'a> {
    buffer: &'a FrameBuffer,
    offset: usize,
}

impl<'a> FieldCursor<'a> {
    /// Cursor positioned at `offset`.
    pub fn at(buffer: &'a FrameBuffer, offset: usize) -> Self {
        Self { buffer, offset }
    }

    /// Current offset.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Read the byte under the cursor and advance.
    pub fn byte(&mut self) -> u8 {
        let b = self.buffer.byte(self.offset);
        self.offset = self.offset.saturating_add(1);
        b
    }

    /// Byte under the cursor, without advancing.
    pub fn peek(&self) -> u8 {
        self.buffer.byte(self.offset)
    }

    /// Read the byte under the cursor as a digit and advance.
    ///
    /// See [`FrameBuffer::digit`] for the sentinel and the lack of digit
    /// validation.
    pub fn digit(&mut self) -> i8 {
        let d = self.buffer.digit(self.offset);
        self.offset = self.offset.saturating_add(1);
        d
    }

    /// Advance past `n` positions (separators).
    pub fn skip(&mut self, n: usize) -> &mut Self {
        self.offset = self.offset.saturating_add(n);
        self
    }

    /// Copy bytes up to `delimiter` and step past it.
    ///
    /// Fails with [`ProtocolError::FieldTooLong`] as soon as more than `max`
    /// bytes would be copied. A field that never meets its delimiter runs
    /// into the zero padding and overflows the same way.
    pub fn take_until(
        &mut self,
        field: &'static str,
        delimiter: u8,
        max: usize,
    ) -> Result<Vec<u8>> {
        let mut out = Vec::with_capacity(max);
        while self.peek() != delimiter {
            if out.len() == max {
                return Err(ProtocolError::FieldTooLong { field, max });
            }
            out.push(self.byte());
        }
        self.offset = self.offset.saturating_add(1);
        Ok(out)
    }

    /// Copy bytes up to the end of the written contents.
    pub fn take_rest(&mut self, field: &'static str, max: usize) -> Result<Vec<u8>> {
        let mut out = Vec::with_capacity(max);
        while self.offset < self.buffer.capacity() && self.peek() != 0 {
            if out.len() == max {
                return Err(ProtocolError::FieldTooLong { field, max });
            }
            out.push(self.byte());
        }
        Ok(out)
    }
}
