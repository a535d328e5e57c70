//! Message catalog: the concrete messages exchanged with the host.
//!
//! Outbound messages are formatted by [`alarmlink_proto::Message`] and sent
//! through [`CommandChannel::send_message`], which waits for `RSP+OK`.
//! Inbound commands are read out of the channel's last captured line:
//! recognised by name, decoded positionally, and acknowledged.
//!
//! | Command | Decode rule | Response |
//! |---|---|---|
//! | `CREDENTIALS:<ssid>,<pass>` | each field valid UTF-8, at most 16 bytes on the wire | `RSP+OK`, even when a field is rejected |
//! | `STATUS:<s>,<m>,<x>` | three digits, each within its range | `RSP+OK`, or `RSP+BAD_VALUE` keeping the old status |
//! | `CHANGE`, `RETRY`, `RESET` | token match | `RSP+OK` |
//!
//! A decoder that does not recognise the line writes nothing and returns
//! its "absent" value, so the caller can offer the same line to every
//! decoder in turn.

use alarmlink_proto::{
    CommandKind, Credentials, MAX_CREDENTIAL_LENGTH, Message, NetworkInfo, ProtocolError,
    Response, ScannedNetwork, Status, TokenMatching, tokens::FIELD_SEPARATOR,
};
use serde::{Deserialize, Serialize};

use crate::{
    channel::{CommandChannel, RetryPolicy},
    env::Environment,
    error::ChannelError,
    transport::SerialPort,
};

/// Catalog configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    /// Matching rule for single-word commands
    pub matching: TokenMatching,
}

/// The message table.
#[derive(Debug, Clone, Default)]
pub struct ProtocolCatalog {
    config: CatalogConfig,
}

impl ProtocolCatalog {
    /// Create a catalog.
    pub fn new(config: CatalogConfig) -> Self {
        Self { config }
    }

    /// Configuration in use.
    pub fn config(&self) -> &CatalogConfig {
        &self.config
    }

    /// Classify the channel's captured line without responding.
    pub fn recognize<E, P>(&self, channel: &CommandChannel<E, P>) -> Option<CommandKind>
    where
        E: Environment,
        P: SerialPort,
    {
        CommandKind::recognize(channel.buffer(), self.config.matching)
    }

    /// Announce the device's hardware identity.
    pub async fn send_device_id<E, P>(
        &self,
        channel: &mut CommandChannel<E, P>,
        device_id: u32,
        policy: RetryPolicy,
    ) -> Result<u32, ChannelError>
    where
        E: Environment,
        P: SerialPort,
    {
        channel.send_message(&Message::DeviceId(device_id), policy).await
    }

    /// Report the associated network.
    pub async fn send_network_info<E, P>(
        &self,
        channel: &mut CommandChannel<E, P>,
        info: &NetworkInfo,
        policy: RetryPolicy,
    ) -> Result<u32, ChannelError>
    where
        E: Environment,
        P: SerialPort,
    {
        channel.send_message(&Message::NetworkInfo(info.clone()), policy).await
    }

    /// Report that the device has no network.
    pub async fn send_not_connected<E, P>(
        &self,
        channel: &mut CommandChannel<E, P>,
        policy: RetryPolicy,
    ) -> Result<u32, ChannelError>
    where
        E: Environment,
        P: SerialPort,
    {
        channel.send_message(&Message::Disconnected, policy).await
    }

    /// Push a status change to the host.
    pub async fn send_status<E, P>(
        &self,
        channel: &mut CommandChannel<E, P>,
        status: Status,
        policy: RetryPolicy,
    ) -> Result<u32, ChannelError>
    where
        E: Environment,
        P: SerialPort,
    {
        channel.send_message(&Message::Status(status), policy).await
    }

    /// Stream a scan result list: start, one entry per network, end.
    ///
    /// The count is a single byte on the wire, so at most 255 entries are
    /// sent. With no networks only the start message goes out. Each message
    /// is retried under `policy`. Returns the number of entries sent.
    pub async fn send_scan_list<E, P>(
        &self,
        channel: &mut CommandChannel<E, P>,
        networks: &[ScannedNetwork],
        policy: RetryPolicy,
    ) -> Result<u8, ChannelError>
    where
        E: Environment,
        P: SerialPort,
    {
        let count = u8::try_from(networks.len()).unwrap_or(u8::MAX);
        if usize::from(count) < networks.len() {
            tracing::warn!(found = networks.len(), sent = count, "scan list clamped");
        }

        channel.send_message(&Message::StartList(count), policy).await?;
        if count == 0 {
            return Ok(0);
        }
        for network in &networks[..usize::from(count)] {
            channel.send_message(&Message::Network(network.clone()), policy).await?;
        }
        channel.send_message(&Message::EndList, policy).await?;

        tracing::debug!(count, "scan list sent");
        Ok(count)
    }

    /// Decode a `STATUS:` command.
    ///
    /// Returns the decoded status and responds `RSP+OK` when all three
    /// fields are in range. Otherwise responds `RSP+BAD_VALUE` and returns
    /// `current` unchanged. Returns `current` without responding if the
    /// line is not a status command.
    pub fn read_status<E, P>(
        &self,
        channel: &mut CommandChannel<E, P>,
        current: Status,
    ) -> Result<Status, ChannelError>
    where
        E: Environment,
        P: SerialPort,
    {
        let kind = CommandKind::Status;
        if !kind.matches(channel.buffer(), self.config.matching) {
            return Ok(current);
        }

        let decoded = {
            let mut cursor = channel.decode_field_at(kind.field_offset());
            let state = cursor.digit();
            let method = cursor.skip(1).digit();
            let sensor = cursor.skip(1).digit();
            Status::from_digits(state, method, sensor)
        };

        match decoded {
            Ok(status) => {
                channel.respond(Response::Ok)?;
                tracing::debug!(?status, "status received");
                Ok(status)
            },
            Err(err) => {
                channel.respond(Response::BadValue)?;
                tracing::warn!(%err, line = %channel.buffer().as_text(), "status rejected");
                Ok(current)
            },
        }
    }

    /// Decode a `CREDENTIALS:` command.
    ///
    /// Responds `RSP+OK` whenever the command is recognised, including when
    /// a field overflows [`MAX_CREDENTIAL_LENGTH`] wire bytes or is not
    /// valid UTF-8; the rejection shows up only as a `None` result. Returns `None` without responding if the
    /// line is not a credentials command.
    pub fn read_credentials<E, P>(
        &self,
        channel: &mut CommandChannel<E, P>,
    ) -> Result<Option<Credentials>, ChannelError>
    where
        E: Environment,
        P: SerialPort,
    {
        let kind = CommandKind::Credentials;
        if !kind.matches(channel.buffer(), self.config.matching) {
            return Ok(None);
        }

        let decoded = decode_credentials(channel, kind.field_offset());
        channel.respond(Response::Ok)?;

        match decoded {
            Ok(credentials) => {
                tracing::debug!(ssid = credentials.ssid(), "credentials received");
                Ok(Some(credentials))
            },
            Err(err) => {
                tracing::warn!(%err, "credentials discarded");
                Ok(None)
            },
        }
    }

    /// Whether the line is a network change request. Responds `RSP+OK` if so.
    pub fn read_network_change<E, P>(
        &self,
        channel: &mut CommandChannel<E, P>,
    ) -> Result<bool, ChannelError>
    where
        E: Environment,
        P: SerialPort,
    {
        self.read_single_word(channel, CommandKind::NetworkChange)
    }

    /// Whether the line is a network retry request. Responds `RSP+OK` if so.
    pub fn read_retry<E, P>(&self, channel: &mut CommandChannel<E, P>) -> Result<bool, ChannelError>
    where
        E: Environment,
        P: SerialPort,
    {
        self.read_single_word(channel, CommandKind::NetworkRetry)
    }

    /// Whether the line is a reset request. Responds `RSP+OK` if so.
    ///
    /// The restart itself belongs to the caller.
    pub fn read_reset<E, P>(&self, channel: &mut CommandChannel<E, P>) -> Result<bool, ChannelError>
    where
        E: Environment,
        P: SerialPort,
    {
        self.read_single_word(channel, CommandKind::Reset)
    }

    fn read_single_word<E, P>(
        &self,
        channel: &mut CommandChannel<E, P>,
        kind: CommandKind,
    ) -> Result<bool, ChannelError>
    where
        E: Environment,
        P: SerialPort,
    {
        if !kind.matches(channel.buffer(), self.config.matching) {
            return Ok(false);
        }
        channel.respond(Response::Ok)?;
        tracing::debug!(command = ?kind, "command received");
        Ok(true)
    }
}

fn decode_credentials<E, P>(
    channel: &CommandChannel<E, P>,
    offset: usize,
) -> Result<Credentials, ProtocolError>
where
    E: Environment,
    P: SerialPort,
{
    let mut cursor = channel.decode_field_at(offset);
    let ssid = cursor.take_until("ssid", FIELD_SEPARATOR, MAX_CREDENTIAL_LENGTH)?;
    let pass = cursor.take_rest("pass", MAX_CREDENTIAL_LENGTH)?;
    Credentials::new(text("ssid", ssid)?, text("pass", pass)?)
}

fn text(field: &'static str, bytes: Vec<u8>) -> Result<String, ProtocolError> {
    String::from_utf8(bytes).map_err(|_| ProtocolError::InvalidText { field })
}
