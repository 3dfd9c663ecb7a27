// ── Config-sync row parsing ──
//
// The config layer delivers one typed row per client. Enumerated
// columns deserialize straight into the policy enums, so a row with an
// unknown value fails as a whole and the previous client state stays
// untouched. The key/value parameter maps (`cs_params`, `*_btm_params`)
// mirror the controller schema: string keys, loosely typed values.

use std::collections::BTreeMap;

use bandsteer_bsal::{BtmParams, MacAddress, NeighborReport, RadioType};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::error::CoreError;
use crate::model::{
    BtmConfig, ClientPolicy, CsMode, CsPolicy, CsState, KickPolicy, KickType, PrefAllowed,
    RejectDetection, RowId, RrmPolicy, DEFAULT_ACTIVE_THRESHOLD_BPS, DEFAULT_BACKOFF_EXP_BASE,
};

/// Config-row lifecycle notifications from the sync layer.
#[derive(Debug, Clone, PartialEq)]
pub enum RowUpdate {
    Insert(ClientRow),
    Modify(ClientRow),
    Delete(RowId),
}

fn default_backoff_exp_base() -> u32 {
    DEFAULT_BACKOFF_EXP_BASE
}

fn default_active_threshold() -> u64 {
    DEFAULT_ACTIVE_THRESHOLD_BPS
}

fn default_rrm_age_time() -> u32 {
    RrmPolicy::default().age_time_secs
}

/// One client's policy row as the config layer delivers it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[allow(clippy::struct_excessive_bools)]
pub struct ClientRow {
    pub id: RowId,
    pub mac: MacAddress,

    #[serde(default)]
    pub hwm: u8,
    #[serde(default)]
    pub lwm: u8,
    #[serde(default)]
    pub pref_allowed: PrefAllowed,
    #[serde(default)]
    pub pre_assoc_auth_block: bool,
    #[serde(default)]
    pub reject_detection: RejectDetection,

    #[serde(default)]
    pub kick_type: KickType,
    #[serde(default)]
    pub kick_reason: u8,
    #[serde(default)]
    pub kick_debounce_period: u32,
    #[serde(default)]
    pub sticky_kick_type: KickType,
    #[serde(default)]
    pub sticky_kick_reason: u8,
    #[serde(default)]
    pub sticky_kick_debounce_period: u32,
    #[serde(default)]
    pub sc_kick_type: KickType,
    #[serde(default)]
    pub sc_kick_reason: u8,
    #[serde(default)]
    pub sc_kick_debounce_period: u32,
    #[serde(default)]
    pub steering_kick_guard_time: u32,
    #[serde(default)]
    pub sticky_kick_guard_time: u32,
    #[serde(default)]
    pub kick_upon_idle: bool,

    #[serde(default)]
    pub max_rejects: u32,
    #[serde(default)]
    pub rejects_tmout_secs: u32,
    #[serde(default)]
    pub backoff_period: u32,
    #[serde(default = "default_backoff_exp_base")]
    pub backoff_exp_base: u32,
    #[serde(default)]
    pub steer_during_backoff: bool,

    #[serde(default)]
    pub preq_snr_thr: u8,
    #[serde(default = "default_active_threshold")]
    pub active_threshold_bps: u64,

    #[serde(default)]
    pub cs_mode: CsMode,
    /// Output column; present on echoes of our own write-back.
    #[serde(default)]
    pub cs_state: Option<CsState>,
    #[serde(default)]
    pub cs_params: BTreeMap<String, Value>,

    #[serde(default)]
    pub steering_btm_params: BTreeMap<String, Value>,
    #[serde(default)]
    pub sticky_btm_params: BTreeMap<String, Value>,
    #[serde(default)]
    pub sc_btm_params: BTreeMap<String, Value>,

    #[serde(default)]
    pub send_rrm_after_assoc: bool,
    #[serde(default)]
    pub send_rrm_after_xing: bool,
    #[serde(default = "default_rrm_age_time")]
    pub rrm_age_time: u32,
}

impl ClientRow {
    /// Translate the row into an engine policy. Any invalid value
    /// rejects the whole row.
    pub fn to_policy(&self) -> Result<ClientPolicy, CoreError> {
        Ok(ClientPolicy {
            hwm: self.hwm,
            lwm: self.lwm,
            pref_allowed: self.pref_allowed,
            pre_assoc_auth_block: self.pre_assoc_auth_block,
            reject_detection: self.reject_detection,
            steering_kick: KickPolicy {
                kick_type: self.kick_type,
                reason: self.kick_reason,
                debounce_period_secs: self.kick_debounce_period,
            },
            sticky_kick: KickPolicy {
                kick_type: self.sticky_kick_type,
                reason: self.sticky_kick_reason,
                debounce_period_secs: self.sticky_kick_debounce_period,
            },
            force_kick: KickPolicy {
                kick_type: self.sc_kick_type,
                reason: self.sc_kick_reason,
                debounce_period_secs: self.sc_kick_debounce_period,
            },
            steering_kick_guard_secs: self.steering_kick_guard_time,
            sticky_kick_guard_secs: self.sticky_kick_guard_time,
            kick_upon_idle: self.kick_upon_idle,
            max_rejects: self.max_rejects,
            rejects_window_secs: self.rejects_tmout_secs,
            backoff_period_secs: self.backoff_period,
            backoff_exp_base: self.backoff_exp_base.max(1),
            steer_during_backoff: self.steer_during_backoff,
            preq_snr_thr: self.preq_snr_thr,
            active_threshold_bps: self.active_threshold_bps,
            cs: parse_cs_params(self.cs_mode, &self.cs_params)?,
            steering_btm: parse_btm_params("steering_btm_params", &self.steering_btm_params)?,
            sticky_btm: parse_btm_params("sticky_btm_params", &self.sticky_btm_params)?,
            force_btm: parse_btm_params("sc_btm_params", &self.sc_btm_params)?,
            rrm: RrmPolicy {
                send_after_assoc: self.send_rrm_after_assoc,
                send_after_xing: self.send_rrm_after_xing,
                age_time_secs: self.rrm_age_time,
            },
        })
    }
}

// ── Loose value readers ─────────────────────────────────────────────
//
// Controller maps carry values as strings or native JSON scalars,
// depending on the transport revision. Accept both.

fn val_u64(field: &'static str, v: &Value) -> Result<u64, CoreError> {
    match v {
        Value::Number(n) => n.as_u64().ok_or_else(|| CoreError::Config {
            field,
            detail: format!("not an unsigned integer: {n}"),
        }),
        Value::String(s) => s.parse().map_err(|_| CoreError::Config {
            field,
            detail: format!("not an unsigned integer: '{s}'"),
        }),
        other => Err(CoreError::Config {
            field,
            detail: format!("unexpected value type: {other}"),
        }),
    }
}

fn val_i64(field: &'static str, v: &Value) -> Result<i64, CoreError> {
    match v {
        Value::Number(n) => n.as_i64().ok_or_else(|| CoreError::Config {
            field,
            detail: format!("not an integer: {n}"),
        }),
        Value::String(s) => s.parse().map_err(|_| CoreError::Config {
            field,
            detail: format!("not an integer: '{s}'"),
        }),
        other => Err(CoreError::Config {
            field,
            detail: format!("unexpected value type: {other}"),
        }),
    }
}

fn val_u32(field: &'static str, v: &Value) -> Result<u32, CoreError> {
    u32::try_from(val_u64(field, v)?).map_err(|_| CoreError::Config {
        field,
        detail: "value out of range".into(),
    })
}

fn val_u8(field: &'static str, v: &Value) -> Result<u8, CoreError> {
    u8::try_from(val_u64(field, v)?).map_err(|_| CoreError::Config {
        field,
        detail: "value out of range".into(),
    })
}

fn val_bool(field: &'static str, v: &Value) -> Result<bool, CoreError> {
    match v {
        Value::Bool(b) => Ok(*b),
        Value::String(s) => match s.as_str() {
            "true" | "1" => Ok(true),
            "false" | "0" => Ok(false),
            _ => Err(CoreError::Config {
                field,
                detail: format!("not a boolean: '{s}'"),
            }),
        },
        Value::Number(n) => Ok(n.as_u64() == Some(1)),
        other => Err(CoreError::Config {
            field,
            detail: format!("unexpected value type: {other}"),
        }),
    }
}

fn val_str<'v>(field: &'static str, v: &'v Value) -> Result<&'v str, CoreError> {
    v.as_str().ok_or_else(|| CoreError::Config {
        field,
        detail: "expected a string".into(),
    })
}

// ── Parameter maps ──────────────────────────────────────────────────

fn parse_cs_params(
    mode: CsMode,
    map: &BTreeMap<String, Value>,
) -> Result<CsPolicy, CoreError> {
    let mut cs = CsPolicy {
        mode,
        ..CsPolicy::default()
    };

    for (key, value) in map {
        match key.as_str() {
            "band" => {
                let s = val_str("cs_params.band", value)?;
                cs.band = Some(s.parse::<RadioType>().map_err(|_| CoreError::UnknownValue {
                    field: "cs_params.band",
                    value: s.to_owned(),
                })?);
            }
            "hwm" => cs.hwm = val_u8("cs_params.hwm", value)?,
            "lwm" => cs.lwm = val_u8("cs_params.lwm", value)?,
            "cs_probe_block" => cs.probe_block = val_bool("cs_params.cs_probe_block", value)?,
            "cs_auth_block" => cs.auth_block = val_bool("cs_params.cs_auth_block", value)?,
            "cs_auth_reject_reason" => {
                // -1 means "block silently, no status code".
                let raw = val_i64("cs_params.cs_auth_reject_reason", value)?;
                cs.auth_reject_reason = if raw < 0 {
                    None
                } else {
                    Some(u16::try_from(raw).map_err(|_| CoreError::Config {
                        field: "cs_params.cs_auth_reject_reason",
                        detail: "value out of range".into(),
                    })?)
                };
            }
            "cs_max_rejects" => cs.max_rejects = val_u32("cs_params.cs_max_rejects", value)?,
            "cs_max_rejects_period" => {
                cs.rejects_window_secs = val_u32("cs_params.cs_max_rejects_period", value)?;
            }
            "cs_enforce_period" => {
                cs.enforce_period_secs = val_u32("cs_params.cs_enforce_period", value)?;
            }
            "cs_auto_disable" => cs.auto_disable = val_bool("cs_params.cs_auto_disable", value)?,
            "cs_reject_detection" => {
                let s = val_str("cs_params.cs_reject_detection", value)?;
                cs.reject_detection =
                    Some(s.parse::<RejectDetection>().map_err(|_| CoreError::UnknownValue {
                        field: "cs_params.cs_reject_detection",
                        value: s.to_owned(),
                    })?);
            }
            unknown => warn!(key = unknown, "ignoring unknown cs_params key"),
        }
    }

    Ok(cs)
}

fn parse_btm_params(
    column: &'static str,
    map: &BTreeMap<String, Value>,
) -> Result<BtmConfig, CoreError> {
    let mut params = BtmParams::default();
    let mut neighbor_bssid: Option<MacAddress> = None;
    let mut neighbor = NeighborReport {
        bssid: MacAddress::new([0; 6]),
        bssid_info: bandsteer_bsal::BTM_DEFAULT_BSS_INFO,
        op_class: 0,
        channel: 0,
        phy_type: 0,
    };

    for (key, value) in map {
        match key.as_str() {
            "valid_int" => params.valid_int = val_u8(column, value)?,
            "abridged" => params.abridged = val_bool(column, value)?,
            "pref" => params.pref = val_bool(column, value)?,
            "disassoc_imminent" => params.disassoc_imminent = val_bool(column, value)?,
            "bss_term" => params.bss_term = val_u8(column, value)?,
            "btm_max_retries" => params.max_retries = val_u8(column, value)?,
            "btm_retry_interval" => {
                params.retry_interval_secs =
                    u16::try_from(val_u64(column, value)?).map_err(|_| CoreError::Config {
                        field: column,
                        detail: "retry interval out of range".into(),
                    })?;
            }
            "inc_neigh" => params.inc_neighbors = val_bool(column, value)?,
            "inc_self" => params.inc_self = val_bool(column, value)?,
            "neighbor_bssid" => {
                let s = val_str(column, value)?;
                neighbor_bssid = Some(s.parse().map_err(CoreError::Mac)?);
            }
            "neighbor_channel" => neighbor.channel = val_u8(column, value)?,
            "neighbor_op_class" => neighbor.op_class = val_u8(column, value)?,
            "neighbor_phy_type" => neighbor.phy_type = val_u8(column, value)?,
            "neighbor_bssid_info" => {
                neighbor.bssid_info = val_u32(column, value)?;
            }
            unknown => warn!(column, key = unknown, "ignoring unknown btm params key"),
        }
    }

    let static_neighbor = neighbor_bssid.map(|bssid| NeighborReport { bssid, ..neighbor });
    Ok(BtmConfig {
        params,
        static_neighbor,
    })
}
