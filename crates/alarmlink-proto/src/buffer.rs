//! Fixed-capacity receive buffer.
//!
//! A captured command line lives here between the capture step and the
//! decoders that read it. The buffer is allocated once and reused for every
//! line, so its capacity is fixed at construction and never grows.
//!
//! # Invariants
//!
//! - Capacity is at most [`MAX_CAPACITY`] (the range of an 8-bit size).
//! - No access ever reads or writes outside `[0, capacity)`.
//! - Out-of-range reads return a sentinel (`0` for bytes, `-1` for digits)
//!   and out-of-range writes are no-ops that report failure.
//! - Contents are logically zero-padded: the written text ends at the first
//!   zero byte.

use std::borrow::Cow;

/// Largest capacity a [`FrameBuffer`] can have.
pub const MAX_CAPACITY: usize = u8::MAX as usize;

/// Sentinel returned by [`FrameBuffer::digit`] for out-of-range indices.
pub const DIGIT_OUT_OF_RANGE: i8 = -1;

/// Fixed-capacity, zero-initialised byte store with bounds-checked access.
#[derive(Clone, PartialEq, Eq)]
pub struct FrameBuffer {
    bytes: Box<[u8]>,
}

impl FrameBuffer {
    /// Create a zero-filled buffer.
    ///
    /// Requests above [`MAX_CAPACITY`] are clamped to it. Never fails.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.min(MAX_CAPACITY);
        Self { bytes: vec![0; capacity].into_boxed_slice() }
    }

    /// Fixed capacity in bytes.
    pub fn capacity(&self) -> usize {
        self.bytes.len()
    }

    /// Byte at `index`, or `0` if `index` is out of range.
    pub fn byte(&self, index: usize) -> u8 {
        self.bytes.get(index).copied().unwrap_or(0)
    }

    /// Byte at `index` interpreted as a base-10 ASCII digit.
    ///
    /// Returns [`DIGIT_OUT_OF_RANGE`] if `index` is out of range. The byte is
    /// not checked to be a digit: a non-digit yields whatever `byte - b'0'`
    /// wraps to, so callers must range-check the result.
    pub fn digit(&self, index: usize) -> i8 {
        match self.bytes.get(index) {
            Some(&b) => b.wrapping_sub(b'0') as i8,
            None => DIGIT_OUT_OF_RANGE,
        }
    }

    /// Overwrite the byte at `index`.
    ///
    /// Returns `false` and leaves the buffer untouched if `index` is out of
    /// range.
    pub fn set_byte(&mut self, index: usize, value: u8) -> bool {
        match self.bytes.get_mut(index) {
            Some(slot) => {
                *slot = value;
                true
            },
            None => false,
        }
    }

    /// Whether the buffer starts with `word`.
    ///
    /// A word longer than the capacity never matches.
    pub fn matches_prefix(&self, word: &[u8]) -> bool {
        if word.len() > self.capacity() {
            return false;
        }
        self.bytes[..word.len()] == *word
    }

    /// Whether `word` appears anywhere in the written contents.
    ///
    /// The empty word is contained in every buffer.
    pub fn contains(&self, word: &[u8]) -> bool {
        if word.is_empty() {
            return true;
        }
        self.as_bytes().windows(word.len()).any(|window| window == word)
    }

    /// Zero every byte. Idempotent.
    pub fn clear(&mut self) {
        self.bytes.fill(0);
    }

    /// Written contents, up to (not including) the first zero byte.
    pub fn as_bytes(&self) -> &[u8] {
        let end = self.bytes.iter().position(|&b| b == 0).unwrap_or(self.bytes.len());
        &self.bytes[..end]
    }

    /// Written contents as text. Non-UTF-8 bytes are replaced.
    pub fn as_text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(self.as_bytes())
    }

    /// Length of the written contents.
    pub fn len(&self) -> usize {
        self.as_bytes().len()
    }

    /// True if nothing has been written since the last clear.
    pub fn is_empty(&self) -> bool {
        self.bytes.first().is_none_or(|&b| b == 0)
    }
}

impl std::fmt::Debug for FrameBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameBuffer")
            .field("capacity", &self.capacity())
            .field("contents", &self.as_text())
            .finish()
    }
}
