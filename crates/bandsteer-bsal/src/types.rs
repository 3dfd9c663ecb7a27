// ── Core BSAL data types ──
//
// MacAddress, radio bands, and the per-client threshold block that the
// steering engine pushes to the driver. These cross the host/driver
// boundary, so everything is serde-friendly and string-mappable.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

use crate::error::MacParseErrorKind;

// ── MacAddress ──────────────────────────────────────────────────────

/// Binary MAC address with a canonical lowercase colon-separated
/// display form (`aa:bb:cc:dd:ee:ff`).
///
/// Unlike a string newtype, the binary form is what driver APIs want;
/// the string form is derived on demand.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MacAddress([u8; 6]);

impl MacAddress {
    pub const fn new(octets: [u8; 6]) -> Self {
        Self(octets)
    }

    pub const fn octets(&self) -> [u8; 6] {
        self.0
    }
}

impl fmt::Display for MacAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let o = &self.0;
        write!(
            f,
            "{:02x}:{:02x}:{:02x}:{:02x}:{:02x}:{:02x}",
            o[0], o[1], o[2], o[3], o[4], o[5]
        )
    }
}

impl fmt::Debug for MacAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MacAddress({self})")
    }
}

/// Failure to parse a MAC address string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid MAC address '{input}': {kind}")]
pub struct MacParseError {
    pub input: String,
    pub kind: MacParseErrorKind,
}

impl FromStr for MacAddress {
    type Err = MacParseError;

    /// Accepts colon-separated, dash-separated, or bare hex, any case.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = |kind| MacParseError {
            input: s.to_owned(),
            kind,
        };

        let hex: String = s
            .chars()
            .filter(|c| *c != ':' && *c != '-')
            .collect::<String>()
            .to_lowercase();
        if hex.len() != 12 {
            return Err(err(MacParseErrorKind::Length));
        }

        let mut octets = [0u8; 6];
        for (i, octet) in octets.iter_mut().enumerate() {
            let pair = hex
                .get(i * 2..i * 2 + 2)
                .ok_or_else(|| err(MacParseErrorKind::Length))?;
            *octet = u8::from_str_radix(pair, 16).map_err(|_| err(MacParseErrorKind::Digit))?;
        }
        Ok(Self(octets))
    }
}

impl TryFrom<String> for MacAddress {
    type Error = MacParseError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<MacAddress> for String {
    fn from(mac: MacAddress) -> Self {
        mac.to_string()
    }
}

// ── RadioType ───────────────────────────────────────────────────────

/// Radio band of an interface, as reported by the topology layer.
///
/// The 5 GHz band splits into lower/upper halves on tri-radio
/// platforms; plain `Radio5G` covers single-5G designs.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
pub enum RadioType {
    #[strum(serialize = "2.4G")]
    #[serde(rename = "2.4G")]
    Radio2G,
    #[strum(serialize = "5G")]
    #[serde(rename = "5G")]
    Radio5G,
    #[strum(serialize = "5GL")]
    #[serde(rename = "5GL")]
    Radio5GL,
    #[strum(serialize = "5GU")]
    #[serde(rename = "5GU")]
    Radio5GU,
    #[strum(serialize = "6G")]
    #[serde(rename = "6G")]
    Radio6G,
}

impl RadioType {
    /// Whether this band counts as 5 GHz for capability tracking.
    pub fn is_5g(self) -> bool {
        matches!(self, Self::Radio5G | Self::Radio5GL | Self::Radio5GU)
    }
}

// ── ClientThresholds ────────────────────────────────────────────────

/// Per-client blocking configuration for one interface.
///
/// Watermarks are SNR values; `0` disables the corresponding check.
/// Probe watermarks gate probe responses, auth watermarks gate
/// authentication, the `*_xing` points arm driver-side crossing events.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientThresholds {
    pub blacklist: bool,
    pub rssi_probe_hwm: u8,
    pub rssi_probe_lwm: u8,
    pub rssi_auth_hwm: u8,
    pub rssi_auth_lwm: u8,
    pub rssi_inact_xing: u8,
    pub rssi_high_xing: u8,
    pub rssi_low_xing: u8,
    /// 802.11 status code sent when auth is rejected; `None` blocks
    /// silently without a response frame.
    pub auth_reject_reason: Option<u16>,
}

// ── Live client info ────────────────────────────────────────────────

/// 802.11k beacon-report capabilities parsed from a client's
/// association request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RrmCaps {
    pub bcn_rpt_passive: bool,
    pub bcn_rpt_active: bool,
    pub bcn_rpt_table: bool,
}

/// Snapshot of a client's state on one interface, polled from the
/// driver.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientInfo {
    pub connected: bool,
    pub snr: u8,
    pub tx_bytes: u64,
    pub rx_bytes: u64,
    pub is_btm_supported: bool,
    pub rrm_caps: RrmCaps,
}

// ── Disconnect metadata ─────────────────────────────────────────────

/// Which side initiated a disconnect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
pub enum DisconnectSource {
    Local,
    Remote,
}

/// Frame type used for a disconnect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
pub enum DisconnectType {
    #[strum(serialize = "disassoc")]
    Disassoc,
    #[strum(serialize = "deauth")]
    Deauth,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn mac_parses_colon_separated() {
        let mac: MacAddress = "AA:BB:CC:DD:EE:FF".parse().unwrap();
        assert_eq!(mac.octets(), [0xaa, 0xbb, 0xcc, 0xdd, 0xee, 0xff]);
    }

    #[test]
    fn mac_parses_dashes_and_bare_hex() {
        let a: MacAddress = "aa-bb-cc-00-11-22".parse().unwrap();
        let b: MacAddress = "aabbcc001122".parse().unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn mac_display_is_lowercase_colons() {
        let mac = MacAddress::new([0xAA, 0x0B, 0xCC, 0x00, 0x11, 0x22]);
        assert_eq!(mac.to_string(), "aa:0b:cc:00:11:22");
    }

    #[test]
    fn mac_rejects_short_input() {
        assert!("aa:bb:cc".parse::<MacAddress>().is_err());
    }

    #[test]
    fn mac_rejects_bad_digits() {
        assert!("zz:bb:cc:dd:ee:ff".parse::<MacAddress>().is_err());
    }

    #[test]
    fn mac_serde_round_trips_as_string() {
        let mac = MacAddress::new([1, 2, 3, 4, 5, 6]);
        let json = serde_json::to_string(&mac).unwrap();
        assert_eq!(json, "\"01:02:03:04:05:06\"");
        let back: MacAddress = serde_json::from_str(&json).unwrap();
        assert_eq!(back, mac);
    }

    #[test]
    fn radio_type_from_str() {
        assert_eq!("2.4G".parse::<RadioType>().unwrap(), RadioType::Radio2G);
        assert_eq!("5GU".parse::<RadioType>().unwrap(), RadioType::Radio5GU);
        assert!("7G".parse::<RadioType>().is_err());
    }

    #[test]
    fn thresholds_default_is_all_clear() {
        let t = ClientThresholds::default();
        assert_eq!(t.rssi_probe_hwm, 0);
        assert_eq!(t.rssi_low_xing, 0);
        assert!(!t.blacklist);
        assert!(t.auth_reject_reason.is_none());
    }
}
