// ── Client policy and state enums ──
//
// Everything the config layer can set for one client, plus the
// connection/steering state enums driven by the engine.

use bandsteer_bsal::{BtmParams, NeighborReport, RadioType};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use super::{DEFAULT_ACTIVE_THRESHOLD_BPS, DEFAULT_BACKOFF_EXP_BASE};

// ── Policy enums ────────────────────────────────────────────────────

/// When association on a disallowed band is still permitted.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display, EnumString,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PrefAllowed {
    /// Never block; steering thresholds stay disarmed.
    #[default]
    Never,
    /// Block only above the configured HWM.
    Hwm,
    /// Always block, regardless of signal.
    Always,
    /// Block unless every steerable channel is DFS.
    NonDfs,
}

/// Which blocked frames count as a steering reject.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display, EnumString,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum RejectDetection {
    ProbeAll,
    #[default]
    ProbeNull,
    ProbeDirect,
    AuthBlocked,
}

/// How a client is removed from an interface when kicked.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display, EnumString,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum KickType {
    #[default]
    None,
    Disassoc,
    Deauth,
    BssTm,
    RrmBrReq,
    BtmDisassoc,
    BtmDeauth,
    RrmDisassoc,
    RrmDeauth,
}

/// Client-steering mode requested by the controller.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display, EnumString,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum CsMode {
    #[default]
    Off,
    /// Steer toward a specific target band.
    Home,
    /// Steer away from this node entirely.
    Away,
}

/// Sub-state of an active client-steering attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[strum(serialize_all = "snake_case")]
pub enum CsPhase {
    Steering,
    Expired,
    Failed,
    XingLow,
    XingHigh,
    XingDisabled,
}

/// Client-steering state as published back to the config layer.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display, EnumString,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum CsState {
    #[default]
    None,
    Steering,
    Expired,
    Failed,
    XingLow,
    XingHigh,
    XingDisabled,
}

impl From<CsPhase> for CsState {
    fn from(phase: CsPhase) -> Self {
        match phase {
            CsPhase::Steering => Self::Steering,
            CsPhase::Expired => Self::Expired,
            CsPhase::Failed => Self::Failed,
            CsPhase::XingLow => Self::XingLow,
            CsPhase::XingHigh => Self::XingHigh,
            CsPhase::XingDisabled => Self::XingDisabled,
        }
    }
}

/// Connection-level state of a client.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display, EnumString,
)]
#[strum(serialize_all = "snake_case")]
pub enum ClientState {
    #[default]
    Disconnected,
    Connected,
    /// A blocked client currently being pushed toward its preferred
    /// band. Force-reset to `Disconnected` if it lingers.
    Steering,
    /// Pre-association backoff; blocking relaxed after repeated
    /// rejects. Left only via a forced transition.
    Backoff,
}

/// Which rule set drives a client's thresholds right now.
///
/// Client steering carries its sub-state with it, so "client-steering
/// thresholds without an active attempt" is unrepresentable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClientMode {
    BandSteering,
    ClientSteering(CsPhase),
}

impl Default for ClientMode {
    fn default() -> Self {
        Self::BandSteering
    }
}

/// What prompted a kick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[strum(serialize_all = "snake_case")]
pub enum KickSource {
    /// Signal rose above the HWM on a blocked band.
    Steering,
    /// Signal fell below the LWM on the client's current band.
    Sticky,
    /// Controller-requested immediate kick.
    Force,
}

// ── Policy structs ──────────────────────────────────────────────────

/// Kick behavior for one trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct KickPolicy {
    pub kick_type: KickType,
    /// 802.11 reason code placed in the disconnect frame.
    pub reason: u8,
    /// Seconds since last connect during which kicks are suppressed.
    pub debounce_period_secs: u32,
}

/// BTM parameter set for one trigger, plus an optional static
/// candidate that always heads the neighbor list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BtmConfig {
    pub params: BtmParams,
    pub static_neighbor: Option<NeighborReport>,
}

impl BtmConfig {
    pub fn new(params: BtmParams) -> Self {
        Self {
            params,
            static_neighbor: None,
        }
    }
}

/// 802.11k beacon-measurement behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RrmPolicy {
    pub send_after_assoc: bool,
    pub send_after_xing: bool,
    /// Cached neighbor reports older than this are dropped.
    pub age_time_secs: u32,
}

impl Default for RrmPolicy {
    fn default() -> Self {
        Self {
            send_after_assoc: false,
            send_after_xing: false,
            age_time_secs: 60,
        }
    }
}

/// Client-steering policy block (the `cs_params` column).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CsPolicy {
    pub mode: CsMode,
    /// Target band for `Home` mode. `None` falls back to band steering.
    pub band: Option<RadioType>,
    pub hwm: u8,
    pub lwm: u8,
    pub probe_block: bool,
    pub auth_block: bool,
    /// Status code for blocked auth; `None` blocks silently.
    pub auth_reject_reason: Option<u16>,
    pub max_rejects: u32,
    pub rejects_window_secs: u32,
    pub enforce_period_secs: u32,
    /// Tear down client steering on a sustained RSSI crossing.
    pub auto_disable: bool,
    pub reject_detection: Option<RejectDetection>,
}

impl Default for CsPolicy {
    fn default() -> Self {
        Self {
            mode: CsMode::Off,
            band: None,
            hwm: 0,
            lwm: 0,
            probe_block: false,
            auth_block: false,
            auth_reject_reason: None,
            max_rejects: 0,
            rejects_window_secs: 0,
            enforce_period_secs: 60,
            auto_disable: false,
            reject_detection: None,
        }
    }
}

/// Full per-client policy, replaced wholesale on every config update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientPolicy {
    pub hwm: u8,
    pub lwm: u8,
    pub pref_allowed: PrefAllowed,
    pub pre_assoc_auth_block: bool,
    pub reject_detection: RejectDetection,

    pub steering_kick: KickPolicy,
    pub sticky_kick: KickPolicy,
    /// Controller-forced kicks.
    pub force_kick: KickPolicy,
    /// Settle windows after a kick during which crossings are ignored.
    pub steering_kick_guard_secs: u32,
    pub sticky_kick_guard_secs: u32,
    pub kick_upon_idle: bool,

    pub max_rejects: u32,
    pub rejects_window_secs: u32,
    pub backoff_period_secs: u32,
    pub backoff_exp_base: u32,
    pub steer_during_backoff: bool,

    /// SNR delta below which probe reports are throttled. Zero uses
    /// the built-in default.
    pub preq_snr_thr: u8,
    pub active_threshold_bps: u64,

    pub cs: CsPolicy,
    pub steering_btm: BtmConfig,
    pub sticky_btm: BtmConfig,
    pub force_btm: BtmConfig,
    pub rrm: RrmPolicy,
}

impl Default for ClientPolicy {
    fn default() -> Self {
        Self {
            hwm: 0,
            lwm: 0,
            pref_allowed: PrefAllowed::default(),
            pre_assoc_auth_block: false,
            reject_detection: RejectDetection::default(),
            steering_kick: KickPolicy::default(),
            sticky_kick: KickPolicy::default(),
            force_kick: KickPolicy::default(),
            steering_kick_guard_secs: 0,
            sticky_kick_guard_secs: 0,
            kick_upon_idle: false,
            max_rejects: 0,
            rejects_window_secs: 0,
            backoff_period_secs: 0,
            backoff_exp_base: DEFAULT_BACKOFF_EXP_BASE,
            steer_during_backoff: false,
            preq_snr_thr: 0,
            active_threshold_bps: DEFAULT_ACTIVE_THRESHOLD_BPS,
            cs: CsPolicy::default(),
            steering_btm: BtmConfig::default(),
            sticky_btm: BtmConfig::default(),
            force_btm: BtmConfig::default(),
            rrm: RrmPolicy::default(),
        }
    }
}

impl ClientPolicy {
    /// Kick policy for one trigger.
    pub fn kick_for(&self, source: KickSource) -> &KickPolicy {
        match source {
            KickSource::Steering => &self.steering_kick,
            KickSource::Sticky => &self.sticky_kick,
            KickSource::Force => &self.force_kick,
        }
    }

    /// BTM parameter set for one trigger.
    pub fn btm_for(&self, source: KickSource) -> &BtmConfig {
        match source {
            KickSource::Steering => &self.steering_btm,
            KickSource::Sticky => &self.sticky_btm,
            KickSource::Force => &self.force_btm,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn policy_enums_parse_their_wire_names() {
        assert_eq!("non_dfs".parse::<PrefAllowed>().unwrap(), PrefAllowed::NonDfs);
        assert_eq!(
            "probe_null".parse::<RejectDetection>().unwrap(),
            RejectDetection::ProbeNull
        );
        assert_eq!("btm_deauth".parse::<KickType>().unwrap(), KickType::BtmDeauth);
        assert_eq!("away".parse::<CsMode>().unwrap(), CsMode::Away);
        assert!("sideways".parse::<CsMode>().is_err());
    }

    #[test]
    fn cs_phase_maps_onto_published_state() {
        assert_eq!(CsState::from(CsPhase::XingDisabled), CsState::XingDisabled);
        assert_eq!(CsState::from(CsPhase::Steering), CsState::Steering);
    }

    #[test]
    fn cs_state_wire_form_is_snake_case() {
        assert_eq!(CsState::XingHigh.to_string(), "xing_high");
        assert_eq!("xing_low".parse::<CsState>().unwrap(), CsState::XingLow);
    }
}
