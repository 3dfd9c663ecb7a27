// ── Domain model ──

pub mod client;
pub mod policy;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub use client::{
    BackoffState, BandCaps, BtmRetryState, CachedNeighbor, Client, ClientTimes, DisconnectRecord,
    IfaceSlot, IfaceStats, PendingKick, ProbeMark, ProbeStats, RrmSlot,
};
pub use policy::{
    BtmConfig, ClientMode, ClientPolicy, ClientState, CsMode, CsPhase, CsPolicy, CsState,
    KickPolicy, KickSource, KickType, PrefAllowed, RejectDetection, RrmPolicy,
};

/// Stable identifier of a client's config row.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct RowId(pub Uuid);

impl std::fmt::Display for RowId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

// ── Watermark and behavior constants ────────────────────────────────

/// Lowest usable high watermark; pinning the HWM here blocks at any
/// signal strength.
pub const MIN_HWM: u8 = 1;
pub const MAX_HWM: u8 = 128;
pub const MIN_LWM: u8 = 1;
/// Highest usable low watermark; pinning the LWM here rejects at any
/// signal strength.
pub const MAX_LWM: u8 = 128;

/// Probes below this SNR are treated as rogue noise and ignored by
/// client-steering crossing detection.
pub const ROGUE_SNR_LEVEL: u8 = 5;

/// Settle time between a client-steering crossing and acting on it.
pub const RSSI_HYSTERESIS_SECS: u64 = 2;

/// LWM value overloaded by the controller as a "kick now" command
/// rather than a real threshold. Always test through
/// [`is_kick_sentinel`], never compare directly.
pub const KICK_SENTINEL_LWM: u8 = 255;

/// Debounce period value that suppresses kicking entirely.
pub const KICK_DEBOUNCE_NEVER_SECS: u32 = 1;

/// Exponent clamp for the pre-association backoff period.
pub const BACKOFF_EXP_CLAMP: u32 = 10;
pub const DEFAULT_BACKOFF_EXP_BASE: u32 = 2;

/// Minimum SNR movement before the poll loop re-evaluates crossings.
pub const XING_RETRIGGER_DELTA: u8 = 5;

/// Probe-report throttling: minimum SNR delta and minimum spacing.
pub const PROBE_REPORT_SNR_DELTA: u8 = 3;
pub const PROBE_REPORT_INTERVAL_SECS: i64 = 3;

/// Bounded per-client table sizes.
pub const IFACE_SLOT_MAX: usize = 16;
pub const RRM_REQ_MAX: usize = 8;
pub const RRM_NEIGHBOR_MAX: usize = 16;

/// Default byte-rate above which a client counts as active.
pub const DEFAULT_ACTIVE_THRESHOLD_BPS: u64 = 2000;

/// Samples requested for an instant RSSI measurement before a kick.
pub const INSTANT_MEASUREMENT_SAMPLES: u8 = 5;

/// Whether an LWM value is the controller's kick command rather than a
/// threshold.
pub fn is_kick_sentinel(lwm: u8) -> bool {
    lwm == KICK_SENTINEL_LWM
}
