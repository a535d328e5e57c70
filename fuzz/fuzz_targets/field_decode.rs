//! Fuzz buffer access and positional field decoding.
//!
//! Fills a buffer directly (bypassing capture) so decoders see layouts the
//! capture stage would never produce, such as interior zero bytes.

#![no_main]

use alarmlink_proto::{
    CommandKind, FieldCursor, FrameBuffer, MAX_CREDENTIAL_LENGTH, Status, TokenMatching,
    tokens::{FIELD_SEPARATOR, NAME_SEPARATOR},
};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Some((&capacity, contents)) = data.split_first() else {
        return;
    };

    let mut buffer = FrameBuffer::new(usize::from(capacity));
    for (index, &byte) in contents.iter().enumerate() {
        let stored = buffer.set_byte(index, byte);
        assert_eq!(stored, index < buffer.capacity());
    }

    // Out-of-range reads are sentinels, never panics
    assert_eq!(buffer.byte(buffer.capacity()), 0);
    assert_eq!(buffer.digit(usize::MAX), -1);

    for matching in [TokenMatching::Exact, TokenMatching::Substring] {
        let _ = CommandKind::recognize(&buffer, matching);
    }

    // Status digits at the fixed positions
    let mut cursor = FieldCursor::at(&buffer, CommandKind::Status.field_offset());
    let state = cursor.digit();
    let method = cursor.skip(1).digit();
    let sensor = cursor.skip(1).digit();
    if let Ok(status) = Status::from_digits(state, method, sensor) {
        assert_eq!(status.state.to_u8() as i8, state);
    }

    // Credential fields, whatever the name says
    let mut cursor = FieldCursor::at(&buffer, 0);
    let _ = cursor.take_until("name", NAME_SEPARATOR, usize::from(capacity));
    if let Ok(ssid) = cursor.take_until("ssid", FIELD_SEPARATOR, MAX_CREDENTIAL_LENGTH) {
        assert!(ssid.len() <= MAX_CREDENTIAL_LENGTH);
    }
    if let Ok(pass) = cursor.take_rest("pass", MAX_CREDENTIAL_LENGTH) {
        assert!(pass.len() <= MAX_CREDENTIAL_LENGTH);
    }

    buffer.clear();
    assert!(buffer.is_empty());
});
