// ── 802.11v BTM and 802.11k RRM request parameters ──

use serde::{Deserialize, Serialize};

use crate::types::MacAddress;

/// Default BTM disassociation timer validity interval, in TBTTs.
pub const BTM_DEFAULT_VALID_INT: u8 = 255;
/// Default BSSID Information field for candidate neighbor entries.
pub const BTM_DEFAULT_BSS_INFO: u32 = 0x8f;
/// Default number of BTM retransmissions before giving up.
pub const BTM_DEFAULT_MAX_RETRIES: u8 = 3;
/// Default spacing between BTM retransmissions, in seconds.
pub const BTM_DEFAULT_RETRY_INTERVAL_SECS: u16 = 10;
/// Most candidate neighbors a single BTM request carries.
pub const BTM_MAX_NEIGHBORS: usize = 3;

/// Measurement duration for an active beacon scan, in TUs.
pub const RRM_ACTIVE_MEASUREMENT_MS: u16 = 30;
/// Measurement duration for a passive beacon scan, in TUs.
pub const RRM_PASSIVE_MEASUREMENT_MS: u16 = 100;

// ── BTM ─────────────────────────────────────────────────────────────

/// Tunable knobs of a BSS Transition Management request, parsed from
/// client configuration with standards-sane defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[allow(clippy::struct_excessive_bools)]
pub struct BtmParams {
    pub valid_int: u8,
    pub abridged: bool,
    pub pref: bool,
    pub disassoc_imminent: bool,
    pub bss_term: u8,
    pub max_retries: u8,
    pub retry_interval_secs: u16,
    /// Include a neighbor list built from the neighbor cache.
    pub inc_neighbors: bool,
    /// Ask the driver to append its own BSS as a candidate, letting
    /// the client elect to stay.
    pub inc_self: bool,
}

impl Default for BtmParams {
    fn default() -> Self {
        Self {
            valid_int: BTM_DEFAULT_VALID_INT,
            abridged: true,
            pref: true,
            disassoc_imminent: true,
            bss_term: 0,
            max_retries: BTM_DEFAULT_MAX_RETRIES,
            retry_interval_secs: BTM_DEFAULT_RETRY_INTERVAL_SECS,
            inc_neighbors: true,
            inc_self: false,
        }
    }
}

/// One candidate BSS in a BTM neighbor list or RRM neighbor cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NeighborReport {
    pub bssid: MacAddress,
    pub bssid_info: u32,
    pub op_class: u8,
    pub channel: u8,
    pub phy_type: u8,
}

/// A fully built BTM request, ready for the driver to frame and send.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BtmRequest {
    pub params: BtmParams,
    pub neighbors: Vec<NeighborReport>,
}

// ── RRM ─────────────────────────────────────────────────────────────

/// Beacon measurement scan mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RrmMeasurementMode {
    Passive,
    Active,
    /// Report from the client's cached beacon table, no scan.
    Table,
}

/// A beacon measurement request for one channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RrmRequest {
    pub op_class: u8,
    /// Target channel; `0` requests all channels of the op class.
    pub channel: u8,
    pub mode: RrmMeasurementMode,
    /// Measurement duration in TUs, derived from the scan mode.
    pub duration: u16,
    pub rand_interval: u16,
    /// SSID filter; empty string measures any SSID (wildcard).
    pub ssid: String,
    pub rep_detail: u8,
}

impl RrmRequest {
    /// Standard duration for a scan mode. Table reports carry no scan
    /// so the duration is zero.
    pub fn duration_for(mode: RrmMeasurementMode) -> u16 {
        match mode {
            RrmMeasurementMode::Active => RRM_ACTIVE_MEASUREMENT_MS,
            RrmMeasurementMode::Passive => RRM_PASSIVE_MEASUREMENT_MS,
            RrmMeasurementMode::Table => 0,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn btm_defaults_match_standard_values() {
        let p = BtmParams::default();
        assert_eq!(p.valid_int, 255);
        assert!(p.abridged);
        assert!(p.pref);
        assert!(p.disassoc_imminent);
        assert_eq!(p.bss_term, 0);
        assert_eq!(p.max_retries, 3);
        assert_eq!(p.retry_interval_secs, 10);
    }

    #[test]
    fn rrm_duration_tracks_scan_mode() {
        assert_eq!(RrmRequest::duration_for(RrmMeasurementMode::Active), 30);
        assert_eq!(RrmRequest::duration_for(RrmMeasurementMode::Passive), 100);
        assert_eq!(RrmRequest::duration_for(RrmMeasurementMode::Table), 0);
    }
}
