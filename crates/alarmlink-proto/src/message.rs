//! Outbound (device to host) messages.
//!
//! Every message is one line: the [`LINE_MARKER`], the message name, and for
//! messages with fields a `:` followed by comma-separated fields. The
//! terminator is appended by the channel, not here.

use bytes::{Bytes, BytesMut};

use crate::{
    network::{NetworkInfo, ScannedNetwork},
    status::Status,
    tokens::LINE_MARKER,
};

/// A device-originated message awaiting acknowledgement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    /// Hardware identity, sent once at boot
    DeviceId(u32),
    /// Details of the associated network
    NetworkInfo(NetworkInfo),
    /// The device has no network
    Disconnected,
    /// Start of a scan list, with the number of entries to follow
    StartList(u8),
    /// One scan list entry
    Network(ScannedNetwork),
    /// End of a scan list
    EndList,
    /// Status pushed from the cloud side
    Status(Status),
}

impl Message {
    /// Name as it appears on the wire after the marker.
    pub fn name(&self) -> &'static str {
        match self {
            Self::DeviceId(_) => "DEVICE_ID",
            Self::NetworkInfo(_) => "INFO",
            Self::Disconnected => "DISCONNECTED",
            Self::StartList(_) => "START_LIST",
            Self::Network(_) => "NETWORK",
            Self::EndList => "END_LIST",
            Self::Status(_) => "STATUS",
        }
    }

    /// True for the scan list messages, which get a longer ack window.
    pub fn is_list_transfer(&self) -> bool {
        matches!(self, Self::StartList(_) | Self::Network(_) | Self::EndList)
    }

    /// Append the encoded line (without terminator) to `dst`.
    pub fn encode(&self, dst: &mut BytesMut) {
        dst.extend_from_slice(LINE_MARKER);
        dst.extend_from_slice(self.name().as_bytes());

        let fields = match self {
            Self::DeviceId(id) => format!(":{id}"),
            Self::NetworkInfo(info) => format!(":{},{},{}", info.ssid(), info.rssi(), info.ip()),
            Self::StartList(count) => format!(":{count}"),
            Self::Network(net) => {
                format!(":{},{},{}", net.ssid(), net.rssi(), net.encryption().to_u8())
            },
            Self::Status(status) => {
                format!(":{},{},{}", status.state, status.method, status.sensor)
            },
            Self::Disconnected | Self::EndList => String::new(),
        };
        dst.extend_from_slice(fields.as_bytes());
    }

    /// Encoded line (without terminator).
    pub fn to_line(&self) -> Bytes {
        let mut dst = BytesMut::with_capacity(32);
        self.encode(&mut dst);
        dst.freeze()
    }
}
