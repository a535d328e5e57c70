//! WiFi values exchanged with the host.

use std::net::Ipv4Addr;

use serde::{Deserialize, Serialize};
use serde_repr::{Deserialize_repr, Serialize_repr};

use crate::errors::{ProtocolError, Result};

/// Longest SSID or passphrase the host can store.
pub const MAX_CREDENTIAL_LENGTH: usize = 16;

/// Network credentials supplied by the host.
///
/// Both fields are at most [`MAX_CREDENTIAL_LENGTH`] bytes.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "CredentialFields")]
pub struct Credentials {
    ssid: String,
    pass: String,
}

impl Credentials {
    /// Build credentials, rejecting fields over the length bound.
    ///
    /// An empty SSID is rejected too: the host uses it to mean "no network".
    pub fn new(ssid: impl Into<String>, pass: impl Into<String>) -> Result<Self> {
        let ssid = ssid.into();
        let pass = pass.into();
        if ssid.is_empty() {
            return Err(ProtocolError::MissingField { field: "ssid" });
        }
        check_len("ssid", &ssid)?;
        check_len("pass", &pass)?;
        Ok(Self { ssid, pass })
    }

    /// Network identifier.
    pub fn ssid(&self) -> &str {
        &self.ssid
    }

    /// Passphrase.
    pub fn pass(&self) -> &str {
        &self.pass
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials").field("ssid", &self.ssid).field("pass", &"<redacted>").finish()
    }
}

#[derive(Deserialize)]
struct CredentialFields {
    ssid: String,
    pass: String,
}

impl TryFrom<CredentialFields> for Credentials {
    type Error = ProtocolError;

    fn try_from(fields: CredentialFields) -> Result<Self> {
        Self::new(fields.ssid, fields.pass)
    }
}

fn check_len(field: &'static str, value: &str) -> Result<()> {
    if value.len() > MAX_CREDENTIAL_LENGTH {
        return Err(ProtocolError::FieldTooLong { field, max: MAX_CREDENTIAL_LENGTH });
    }
    Ok(())
}

/// Details of the network the device is associated with.
///
/// The SSID is at most [`MAX_CREDENTIAL_LENGTH`] bytes, the size of the
/// host's record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "NetworkInfoFields")]
pub struct NetworkInfo {
    ssid: String,
    rssi: i32,
    ip: Ipv4Addr,
}

impl NetworkInfo {
    /// Build network details, rejecting an over-long SSID.
    pub fn new(ssid: impl Into<String>, rssi: i32, ip: Ipv4Addr) -> Result<Self> {
        let ssid = ssid.into();
        check_len("ssid", &ssid)?;
        Ok(Self { ssid, rssi, ip })
    }

    /// Network identifier.
    pub fn ssid(&self) -> &str {
        &self.ssid
    }

    /// Signal strength in dBm.
    pub fn rssi(&self) -> i32 {
        self.rssi
    }

    /// Address leased to the device.
    pub fn ip(&self) -> Ipv4Addr {
        self.ip
    }
}

#[derive(Deserialize)]
struct NetworkInfoFields {
    ssid: String,
    rssi: i32,
    ip: Ipv4Addr,
}

impl TryFrom<NetworkInfoFields> for NetworkInfo {
    type Error = ProtocolError;

    fn try_from(fields: NetworkInfoFields) -> Result<Self> {
        Self::new(fields.ssid, fields.rssi, fields.ip)
    }
}

/// Encryption suite advertised by a scanned network.
///
/// Values follow the 802.11 cipher suite numbering; 7 and 8 are reserved
/// there and reused for "open" and "auto".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize_repr, Deserialize_repr)]
#[repr(u8)]
pub enum Encryption {
    /// TKIP (WPA)
    Tkip = 2,
    /// CCMP (WPA2)
    Ccmp = 4,
    /// WEP
    Wep = 5,
    /// Open network
    None = 7,
    /// Negotiated automatically
    Auto = 8,
}

impl Encryption {
    /// Wire value.
    pub fn to_u8(self) -> u8 {
        self as u8
    }
}

impl TryFrom<u8> for Encryption {
    type Error = ProtocolError;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            2 => Ok(Self::Tkip),
            4 => Ok(Self::Ccmp),
            5 => Ok(Self::Wep),
            7 => Ok(Self::None),
            8 => Ok(Self::Auto),
            other => Err(ProtocolError::InvalidEnumValue {
                kind: "encryption",
                value: i16::from(other),
            }),
        }
    }
}

/// One result of a WiFi scan, streamed to the host during a network change.
///
/// The SSID is at most [`MAX_CREDENTIAL_LENGTH`] bytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "ScannedNetworkFields")]
pub struct ScannedNetwork {
    ssid: String,
    rssi: i32,
    encryption: Encryption,
}

impl ScannedNetwork {
    /// Build a scan entry, rejecting an over-long SSID.
    pub fn new(ssid: impl Into<String>, rssi: i32, encryption: Encryption) -> Result<Self> {
        let ssid = ssid.into();
        check_len("ssid", &ssid)?;
        Ok(Self { ssid, rssi, encryption })
    }

    /// Network identifier.
    pub fn ssid(&self) -> &str {
        &self.ssid
    }

    /// Signal strength in dBm.
    pub fn rssi(&self) -> i32 {
        self.rssi
    }

    /// Advertised encryption.
    pub fn encryption(&self) -> Encryption {
        self.encryption
    }
}

#[derive(Deserialize)]
struct ScannedNetworkFields {
    ssid: String,
    rssi: i32,
    encryption: Encryption,
}

impl TryFrom<ScannedNetworkFields> for ScannedNetwork {
    type Error = ProtocolError;

    fn try_from(fields: ScannedNetworkFields) -> Result<Self> {
        Self::new(fields.ssid, fields.rssi, fields.encryption)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn credentials_at_bound_are_accepted() {
        let creds = Credentials::new("a".repeat(16), "b".repeat(16)).unwrap();
        assert_eq!(creds.ssid().len(), 16);
        assert_eq!(creds.pass().len(), 16);
    }

    #[test]
    fn credentials_over_bound_are_rejected() {
        assert_eq!(
            Credentials::new("a".repeat(17), "pw"),
            Err(ProtocolError::FieldTooLong { field: "ssid", max: 16 })
        );
        assert_eq!(
            Credentials::new("home", "b".repeat(17)),
            Err(ProtocolError::FieldTooLong { field: "pass", max: 16 })
        );
    }

    #[test]
    fn empty_ssid_is_missing() {
        assert_eq!(
            Credentials::new("", "pw"),
            Err(ProtocolError::MissingField { field: "ssid" })
        );
    }

    #[test]
    fn debug_hides_passphrase() {
        let creds = Credentials::new("home", "hunter2").unwrap();
        assert!(!format!("{creds:?}").contains("hunter2"));
    }

    #[test]
    fn network_info_ssid_is_bounded() {
        let ip = Ipv4Addr::new(10, 0, 0, 2);
        let info = NetworkInfo::new("sixteen-chars-ab", -60, ip).unwrap();
        assert_eq!(info.ssid(), "sixteen-chars-ab");
        assert_eq!(info.ip(), ip);
        assert_eq!(
            NetworkInfo::new("sixteen-chars-abc", -60, ip),
            Err(ProtocolError::FieldTooLong { field: "ssid", max: 16 })
        );
    }

    #[test]
    fn scanned_network_ssid_is_bounded() {
        let net = ScannedNetwork::new("sixteen-chars-ab", -70, Encryption::Wep).unwrap();
        assert_eq!(net.ssid(), "sixteen-chars-ab");
        assert_eq!(net.encryption(), Encryption::Wep);
        assert_eq!(
            ScannedNetwork::new("a-twenty-char-ssid!!", -50, Encryption::Ccmp),
            Err(ProtocolError::FieldTooLong { field: "ssid", max: 16 })
        );
    }

    #[test]
    fn ssid_bound_counts_bytes() {
        // 8 two-byte characters fill the record exactly; one more does not fit.
        assert!(ScannedNetwork::new("é".repeat(8), -70, Encryption::Auto).is_ok());
        assert!(ScannedNetwork::new("é".repeat(9), -70, Encryption::Auto).is_err());
    }

    #[test]
    fn encryption_rejects_unknown_suite() {
        assert_eq!(Encryption::try_from(4), Ok(Encryption::Ccmp));
        assert!(Encryption::try_from(3).is_err());
    }
}
