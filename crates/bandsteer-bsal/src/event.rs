// ── Driver → engine events ──
//
// Everything the driver can tell the engine about a client, normalized
// into one enum. Each event names the interface it arrived on; the
// engine maps that back to a radio band via its topology.

use serde::{Deserialize, Serialize};
use strum::Display;

use crate::params::NeighborReport;
use crate::types::{ClientInfo, DisconnectSource, DisconnectType, MacAddress};

/// Direction of an RSSI threshold crossing, relative to one of the
/// armed crossing points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
pub enum RssiChange {
    /// Signal rose above the crossing point.
    Higher,
    /// Signal fell below the crossing point.
    Lower,
    /// No movement across this crossing point.
    Unchanged,
}

/// A telemetry event from the driver about one client on one interface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum BsalEvent {
    /// Probe request received.
    Probe {
        ifname: String,
        client_mac: MacAddress,
        snr: u8,
        broadcast: bool,
        blocked: bool,
    },
    /// Client associated.
    Connect {
        ifname: String,
        client_mac: MacAddress,
        info: ClientInfo,
    },
    /// Client disassociated or was deauthenticated.
    Disconnect {
        ifname: String,
        client_mac: MacAddress,
        source: DisconnectSource,
        kind: DisconnectType,
        reason: u8,
    },
    /// Authentication attempt failed or was rejected.
    AuthFail {
        ifname: String,
        client_mac: MacAddress,
        snr: u8,
        /// True when the failure was our own watermark block.
        bs_blocked: bool,
        reject_reason: u8,
    },
    /// Live SNR crossed one of the armed watermarks.
    RssiXing {
        ifname: String,
        client_mac: MacAddress,
        snr: u8,
        inact_xing: RssiChange,
        high_xing: RssiChange,
        low_xing: RssiChange,
    },
    /// Completed instant RSSI measurement, in response to
    /// [`measure_rssi`](crate::BsalAdapter::measure_rssi).
    RssiMeasurement {
        ifname: String,
        client_mac: MacAddress,
        snr: u8,
    },
    /// Client activity state flipped (active ↔ inactive), for drivers
    /// that track it natively.
    Activity {
        ifname: String,
        client_mac: MacAddress,
        active: bool,
    },
    /// Client responded to a BSS Transition Management request.
    BtmResponse {
        ifname: String,
        client_mac: MacAddress,
        /// 802.11v status code; 0 means the client accepted.
        status: u8,
    },
    /// Beacon measurement report arrived from the client. Carries the
    /// reported BSS when the frame parsed cleanly.
    RrmReport {
        ifname: String,
        client_mac: MacAddress,
        neighbor: Option<NeighborReport>,
        rcpi: u8,
    },
}

impl BsalEvent {
    /// Interface the event arrived on.
    pub fn ifname(&self) -> &str {
        match self {
            Self::Probe { ifname, .. }
            | Self::Connect { ifname, .. }
            | Self::Disconnect { ifname, .. }
            | Self::AuthFail { ifname, .. }
            | Self::RssiXing { ifname, .. }
            | Self::RssiMeasurement { ifname, .. }
            | Self::Activity { ifname, .. }
            | Self::BtmResponse { ifname, .. }
            | Self::RrmReport { ifname, .. } => ifname,
        }
    }

    /// Client the event concerns.
    pub fn client_mac(&self) -> MacAddress {
        match self {
            Self::Probe { client_mac, .. }
            | Self::Connect { client_mac, .. }
            | Self::Disconnect { client_mac, .. }
            | Self::AuthFail { client_mac, .. }
            | Self::RssiXing { client_mac, .. }
            | Self::RssiMeasurement { client_mac, .. }
            | Self::Activity { client_mac, .. }
            | Self::BtmResponse { client_mac, .. }
            | Self::RrmReport { client_mac, .. } => *client_mac,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn accessors_cover_every_variant() {
        let mac = MacAddress::new([0, 1, 2, 3, 4, 5]);
        let ev = BsalEvent::Probe {
            ifname: "wl0".into(),
            client_mac: mac,
            snr: 30,
            broadcast: true,
            blocked: false,
        };
        assert_eq!(ev.ifname(), "wl0");
        assert_eq!(ev.client_mac(), mac);

        let ev = BsalEvent::BtmResponse {
            ifname: "wl1".into(),
            client_mac: mac,
            status: 0,
        };
        assert_eq!(ev.ifname(), "wl1");
    }
}
