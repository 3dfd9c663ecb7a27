// ── Telemetry event sink ──

use bandsteer_bsal::{DisconnectSource, DisconnectType, RrmCaps};
use serde::{Deserialize, Serialize};
use strum::Display;

/// Discrete steering events reported upstream, each scoped to one
/// client and one interface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Display)]
pub enum SteeringEvent {
    Connect,
    Disconnect {
        source: DisconnectSource,
        kind: DisconnectType,
        reason: u8,
    },
    Probe {
        snr: u8,
        broadcast: bool,
        blocked: bool,
    },
    AuthBlock {
        snr: u8,
        reject_reason: u8,
    },
    /// Pre-association backoff started or ended.
    Backoff {
        enabled: bool,
        period_secs: u32,
    },
    BandSteeringAttempt,
    ClientSteeringAttempt,
    ClientSteeringStarted,
    ClientSteeringFailed,
    ClientSteeringExpired,
    ClientSteeringDisabled,
    ActivityChange {
        active: bool,
    },
    /// Capability snapshot learned at association time.
    Capabilities {
        is_btm_supported: bool,
        rrm_caps: RrmCaps,
    },
    BtmStatus {
        status: u8,
    },
}

/// Upstream report pipeline for steering telemetry.
pub trait EventSink {
    fn report(&mut self, mac: bandsteer_bsal::MacAddress, ifname: &str, event: SteeringEvent);
}
