// ── Per-client record ──
//
// One `Client` per wireless station: its policy, connection state,
// per-interface slots with the last thresholds actually pushed to the
// driver, and all running counters/timestamps. Mutated only from the
// engine's single-threaded control flow.

use bandsteer_bsal::{
    ClientInfo, ClientThresholds, DisconnectSource, DisconnectType, MacAddress, NeighborReport,
    RadioType, RrmRequest,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::policy::{
    ClientMode, ClientPolicy, ClientState, CsPhase, CsState, KickSource, RejectDetection,
};
use super::{BACKOFF_EXP_CLAMP, IFACE_SLOT_MAX, RRM_NEIGHBOR_MAX, RRM_REQ_MAX, RowId};
use crate::error::CoreError;
use crate::sched::TimerSlots;
use crate::topology::GroupId;

// ── Per-interface bookkeeping ───────────────────────────────────────

/// Probe counters, split by broadcast (null SSID) vs directed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbeStats {
    pub null_cnt: u32,
    pub null_blocked: u32,
    pub direct_cnt: u32,
    pub direct_blocked: u32,
}

/// Last observed disconnect on an interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisconnectRecord {
    pub source: DisconnectSource,
    pub kind: DisconnectType,
    pub reason: u8,
}

/// Steering counters for one (client, interface).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IfaceStats {
    pub connects: u32,
    pub disconnects: u32,
    pub rejects: u32,
    pub probe: ProbeStats,
    pub rssi_higher_cnt: u32,
    pub rssi_lower_cnt: u32,
    pub steering_success_cnt: u32,
    pub steering_fail_cnt: u32,
    pub steering_kick_cnt: u32,
    pub sticky_kick_cnt: u32,
    pub last_disconnect: Option<DisconnectRecord>,
}

/// One radio interface a client's group set spans.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IfaceSlot {
    pub ifname: String,
    pub radio_type: RadioType,
    /// Whether the group allowed steering toward this interface at the
    /// last sync.
    pub bs_allowed: bool,
    pub group: GroupId,
    /// Thresholds last pushed to the driver; crossing synthesis in the
    /// poll loop compares live SNR against these.
    pub applied: Option<ClientThresholds>,
    pub stats: IfaceStats,
    pub info: ClientInfo,
}

impl IfaceSlot {
    pub fn new(ifname: String, radio_type: RadioType, bs_allowed: bool, group: GroupId) -> Self {
        Self {
            ifname,
            radio_type,
            bs_allowed,
            group,
            applied: None,
            stats: IfaceStats::default(),
            info: ClientInfo::default(),
        }
    }
}

// ── Runtime sub-state ───────────────────────────────────────────────

/// Timestamps the decision logic consults.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientTimes {
    pub last_connect: Option<DateTime<Utc>>,
    pub last_disconnect: Option<DateTime<Utc>>,
    pub last_state_change: Option<DateTime<Utc>>,
    pub last_activity_change: Option<DateTime<Utc>>,
    pub last_kick: Option<DateTime<Utc>>,
    pub reject_first: Option<DateTime<Utc>>,
    pub reject_last: Option<DateTime<Utc>>,
    /// When the byte counters were last sampled.
    pub bytes_report: Option<DateTime<Utc>>,
}

/// Exponential backoff bookkeeping.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackoffState {
    /// Period actually armed for the current cycle.
    pub period_used_secs: u64,
    pub connect_counter: u32,
    /// Counter already bumped during this backoff cycle.
    pub connect_calculated: bool,
}

/// A kick decision waiting for the client to go idle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingKick {
    pub source: KickSource,
    /// SNR at decision time, re-checked before the kick fires.
    pub snr: u8,
}

/// An in-flight BTM request awaiting response or retransmission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BtmRetryState {
    pub ifname: String,
    pub source: KickSource,
    pub retries_left: u8,
}

/// Last probe the sink was told about, for throttling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbeMark {
    pub snr: u8,
    pub at: DateTime<Utc>,
    pub blocked: bool,
}

/// Which bands the client has been seen probing on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BandCaps {
    pub seen_2g: bool,
    pub seen_5g: bool,
    pub seen_6g: bool,
}

impl BandCaps {
    pub fn note(&mut self, radio: RadioType) {
        match radio {
            RadioType::Radio2G => self.seen_2g = true,
            RadioType::Radio6G => self.seen_6g = true,
            _ => self.seen_5g = true,
        }
    }
}

/// A queued beacon measurement request, dispatched by its `Rrm(token)`
/// timer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RrmSlot {
    pub token: u8,
    pub ifname: String,
    pub request: RrmRequest,
}

/// Cached neighbor report from a client beacon measurement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedNeighbor {
    pub report: NeighborReport,
    pub rcpi: u8,
    pub seen_at: DateTime<Utc>,
}

// ── Client ──────────────────────────────────────────────────────────

/// One wireless station known to the engine.
#[derive(Debug, Clone)]
pub struct Client {
    pub mac: MacAddress,
    pub row_id: RowId,
    pub policy: ClientPolicy,

    pub state: ClientState,
    pub mode: ClientMode,
    /// Interface the client is currently associated on, if any.
    pub connected_ifname: Option<String>,
    pub is_active: bool,

    pub num_rejects: u32,
    /// Lifetime reject count, never window-reset.
    pub num_rejects_copy: u32,
    pub times: ClientTimes,
    pub backoff: BackoffState,

    /// Last SNR used for poll-driven crossing synthesis.
    pub prev_xing_snr: u8,
    /// Crossings are ignored until this instant after a kick.
    pub settling_until: Option<DateTime<Utc>>,
    pub pending_kick: Option<PendingKick>,
    /// SNR captured at the low crossing that armed the sticky timer.
    pub sticky_snr: Option<u8>,
    pub btm_retry: Option<BtmRetryState>,
    pub last_probe: Option<ProbeMark>,
    pub band_caps: BandCaps,
    /// Last client-steering state written upstream, for recognizing
    /// our own config echo.
    pub last_published_cs: Option<CsState>,

    pub ifaces: Vec<IfaceSlot>,
    pub rrm_requests: Vec<RrmSlot>,
    pub neighbors: Vec<CachedNeighbor>,
    pub timers: TimerSlots,

    next_rrm_token: u8,
}

impl Client {
    pub fn new(mac: MacAddress, row_id: RowId, policy: ClientPolicy) -> Self {
        Self {
            mac,
            row_id,
            policy,
            state: ClientState::default(),
            mode: ClientMode::default(),
            connected_ifname: None,
            is_active: false,
            num_rejects: 0,
            num_rejects_copy: 0,
            times: ClientTimes::default(),
            backoff: BackoffState::default(),
            prev_xing_snr: 0,
            settling_until: None,
            pending_kick: None,
            sticky_snr: None,
            btm_retry: None,
            last_probe: None,
            band_caps: BandCaps::default(),
            last_published_cs: None,
            ifaces: Vec::new(),
            rrm_requests: Vec::new(),
            neighbors: Vec::new(),
            timers: TimerSlots::default(),
            next_rrm_token: 0,
        }
    }

    // ── Interface slots ──

    pub fn iface(&self, ifname: &str) -> Option<&IfaceSlot> {
        self.ifaces.iter().find(|s| s.ifname == ifname)
    }

    pub fn iface_mut(&mut self, ifname: &str) -> Option<&mut IfaceSlot> {
        self.ifaces.iter_mut().find(|s| s.ifname == ifname)
    }

    /// Get or create the slot for an interface. At most one slot per
    /// interface; the table is bounded.
    pub fn ensure_iface(
        &mut self,
        ifname: &str,
        radio_type: RadioType,
        bs_allowed: bool,
        group: GroupId,
    ) -> Result<&mut IfaceSlot, CoreError> {
        if let Some(pos) = self.ifaces.iter().position(|s| s.ifname == ifname) {
            let slot = &mut self.ifaces[pos];
            slot.radio_type = radio_type;
            slot.bs_allowed = bs_allowed;
            slot.group = group;
            return Ok(slot);
        }
        if self.ifaces.len() >= IFACE_SLOT_MAX {
            return Err(CoreError::CapacityExceeded {
                what: "interface slots",
                capacity: IFACE_SLOT_MAX,
            });
        }
        self.ifaces
            .push(IfaceSlot::new(ifname.to_owned(), radio_type, bs_allowed, group));
        Ok(self
            .ifaces
            .last_mut()
            .unwrap_or_else(|| unreachable!("slot pushed above")))
    }

    /// Drop every slot belonging to a group, returning the removed
    /// slots so the caller can deregister them from the driver.
    pub fn remove_group_ifaces(&mut self, group: GroupId) -> Vec<IfaceSlot> {
        let (gone, kept) = std::mem::take(&mut self.ifaces)
            .into_iter()
            .partition(|s| s.group == group);
        self.ifaces = kept;
        gone
    }

    pub fn connected_slot(&self) -> Option<&IfaceSlot> {
        self.connected_ifname.as_deref().and_then(|n| self.iface(n))
    }

    // ── Mode helpers ──

    pub fn is_client_steering(&self) -> bool {
        matches!(self.mode, ClientMode::ClientSteering(_))
    }

    pub fn cs_phase(&self) -> Option<CsPhase> {
        match self.mode {
            ClientMode::ClientSteering(phase) => Some(phase),
            ClientMode::BandSteering => None,
        }
    }

    /// Reject detection in effect: the client-steering override wins
    /// while an attempt is active.
    pub fn effective_reject_detection(&self) -> RejectDetection {
        if self.is_client_steering() {
            if let Some(rd) = self.policy.cs.reject_detection {
                return rd;
            }
        }
        self.policy.reject_detection
    }

    /// `(max_rejects, window_secs)` in effect; the client-steering
    /// limits apply while the enforcement attempt is running.
    pub fn effective_reject_limit(&self) -> (u32, u32) {
        if matches!(self.mode, ClientMode::ClientSteering(CsPhase::Steering)) {
            (self.policy.cs.max_rejects, self.policy.cs.rejects_window_secs)
        } else {
            (self.policy.max_rejects, self.policy.rejects_window_secs)
        }
    }

    // ── Backoff ──

    /// Current backoff delay: `period × base^min(counter, clamp)`.
    pub fn backoff_delay_secs(&self) -> u64 {
        let exp = self.backoff.connect_counter.min(BACKOFF_EXP_CLAMP);
        u64::from(self.policy.backoff_period_secs)
            .saturating_mul(u64::from(self.policy.backoff_exp_base).saturating_pow(exp))
    }

    // ── RRM tables ──

    /// Reserve an RRM request slot. Tokens are unique among queued
    /// slots so each maps to its own `Rrm(token)` timer.
    pub fn queue_rrm(&mut self, ifname: String, request: RrmRequest) -> Result<u8, CoreError> {
        if self.rrm_requests.len() >= RRM_REQ_MAX {
            return Err(CoreError::CapacityExceeded {
                what: "rrm request slots",
                capacity: RRM_REQ_MAX,
            });
        }
        let token = self.next_rrm_token;
        self.next_rrm_token = self.next_rrm_token.wrapping_add(1);
        self.rrm_requests.push(RrmSlot {
            token,
            ifname,
            request,
        });
        Ok(token)
    }

    pub fn take_rrm(&mut self, token: u8) -> Option<RrmSlot> {
        let pos = self.rrm_requests.iter().position(|s| s.token == token)?;
        Some(self.rrm_requests.remove(pos))
    }

    /// Insert or refresh a cached neighbor, dropping entries older
    /// than the policy TTL. When full, the stalest entry makes room.
    pub fn cache_neighbor(&mut self, report: NeighborReport, rcpi: u8, now: DateTime<Utc>) {
        let ttl = chrono::Duration::seconds(i64::from(self.policy.rrm.age_time_secs));
        self.neighbors.retain(|n| now - n.seen_at <= ttl);

        if let Some(existing) = self
            .neighbors
            .iter_mut()
            .find(|n| n.report.bssid == report.bssid)
        {
            existing.report = report;
            existing.rcpi = rcpi;
            existing.seen_at = now;
            return;
        }
        if self.neighbors.len() >= RRM_NEIGHBOR_MAX {
            if let Some(oldest) = self
                .neighbors
                .iter()
                .enumerate()
                .min_by_key(|(_, n)| n.seen_at)
                .map(|(i, _)| i)
            {
                self.neighbors.remove(oldest);
            }
        }
        self.neighbors.push(CachedNeighbor {
            report,
            rcpi,
            seen_at: now,
        });
    }

    /// Fresh cached neighbors, stalest filtered, strongest first.
    pub fn fresh_neighbors(&self, now: DateTime<Utc>) -> Vec<NeighborReport> {
        let ttl = chrono::Duration::seconds(i64::from(self.policy.rrm.age_time_secs));
        let mut fresh: Vec<&CachedNeighbor> = self
            .neighbors
            .iter()
            .filter(|n| now - n.seen_at <= ttl)
            .collect();
        fresh.sort_by(|a, b| b.rcpi.cmp(&a.rcpi));
        fresh.into_iter().map(|n| n.report).collect()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    use super::*;

    fn client() -> Client {
        Client::new(
            MacAddress::new([2, 0, 0, 0, 0, 1]),
            RowId(uuid::Uuid::nil()),
            ClientPolicy::default(),
        )
    }

    fn report(last: u8) -> NeighborReport {
        NeighborReport {
            bssid: MacAddress::new([0, 0, 0, 0, 0, last]),
            bssid_info: 0x8f,
            op_class: 128,
            channel: 36,
            phy_type: 9,
        }
    }

    #[test]
    fn iface_slots_are_unique_per_interface() {
        let mut c = client();
        let g = GroupId::random();
        c.ensure_iface("wl0", RadioType::Radio2G, false, g).unwrap();
        c.ensure_iface("wl0", RadioType::Radio2G, true, g).unwrap();

        assert_eq!(c.ifaces.len(), 1);
        assert!(c.ifaces[0].bs_allowed);
    }

    #[test]
    fn iface_slot_table_is_bounded() {
        let mut c = client();
        let g = GroupId::random();
        for i in 0..IFACE_SLOT_MAX {
            c.ensure_iface(&format!("wl{i}"), RadioType::Radio5G, true, g)
                .unwrap();
        }
        let err = c
            .ensure_iface("overflow", RadioType::Radio5G, true, g)
            .unwrap_err();
        assert!(matches!(err, CoreError::CapacityExceeded { capacity, .. } if capacity == IFACE_SLOT_MAX));
    }

    #[test]
    fn backoff_delay_grows_exponentially_and_clamps() {
        let mut c = client();
        c.policy.backoff_period_secs = 60;
        c.policy.backoff_exp_base = 2;

        c.backoff.connect_counter = 0;
        assert_eq!(c.backoff_delay_secs(), 60);
        c.backoff.connect_counter = 3;
        assert_eq!(c.backoff_delay_secs(), 480);
        c.backoff.connect_counter = 10;
        let clamped = c.backoff_delay_secs();
        c.backoff.connect_counter = 50;
        assert_eq!(c.backoff_delay_secs(), clamped);
        assert_eq!(clamped, 60 * 1024);
    }

    #[test]
    fn backoff_delay_is_monotone_in_connect_counter() {
        let mut c = client();
        c.policy.backoff_period_secs = 30;
        let mut last = 0;
        for n in 0..=12 {
            c.backoff.connect_counter = n;
            let d = c.backoff_delay_secs();
            assert!(d >= last);
            last = d;
        }
    }

    #[test]
    fn neighbor_cache_ages_and_bounds() {
        let mut c = client();
        c.policy.rrm.age_time_secs = 60;
        let t0 = Utc.with_ymd_and_hms(2026, 8, 25, 12, 0, 0).unwrap();

        c.cache_neighbor(report(1), 40, t0);
        for i in 2..=RRM_NEIGHBOR_MAX as u8 {
            c.cache_neighbor(report(i), 50, t0 + chrono::Duration::seconds(1));
        }
        assert_eq!(c.neighbors.len(), RRM_NEIGHBOR_MAX);

        // Full table: the stalest entry is evicted for the newcomer.
        c.cache_neighbor(report(99), 60, t0 + chrono::Duration::seconds(2));
        assert_eq!(c.neighbors.len(), RRM_NEIGHBOR_MAX);
        assert!(c.neighbors.iter().all(|n| n.report.bssid != report(1).bssid));

        // TTL expiry clears the rest.
        let fresh = c.fresh_neighbors(t0 + chrono::Duration::seconds(120));
        assert!(fresh.is_empty());
    }

    #[test]
    fn rrm_slots_are_bounded_with_unique_tokens() {
        let mut c = client();
        let req = RrmRequest {
            op_class: 128,
            channel: 36,
            mode: bandsteer_bsal::RrmMeasurementMode::Passive,
            duration: 100,
            rand_interval: 0,
            ssid: String::new(),
            rep_detail: 2,
        };
        let mut tokens = Vec::new();
        for _ in 0..RRM_REQ_MAX {
            tokens.push(c.queue_rrm("wl1".into(), req.clone()).unwrap());
        }
        tokens.sort_unstable();
        tokens.dedup();
        assert_eq!(tokens.len(), RRM_REQ_MAX);
        assert!(c.queue_rrm("wl1".into(), req).is_err());

        assert!(c.take_rrm(tokens[0]).is_some());
        assert!(c.take_rrm(tokens[0]).is_none());
    }

    #[test]
    fn cs_override_drives_effective_reject_settings() {
        let mut c = client();
        c.policy.max_rejects = 3;
        c.policy.rejects_window_secs = 10;
        c.policy.cs.max_rejects = 7;
        c.policy.cs.rejects_window_secs = 20;
        c.policy.cs.reject_detection = Some(RejectDetection::AuthBlocked);

        assert_eq!(c.effective_reject_limit(), (3, 10));
        assert_eq!(c.effective_reject_detection(), RejectDetection::ProbeNull);

        c.mode = ClientMode::ClientSteering(CsPhase::Steering);
        assert_eq!(c.effective_reject_limit(), (7, 20));
        assert_eq!(c.effective_reject_detection(), RejectDetection::AuthBlocked);

        // Outside the active attempt the base limits return, but the
        // detection override still applies while client steering.
        c.mode = ClientMode::ClientSteering(CsPhase::XingHigh);
        assert_eq!(c.effective_reject_limit(), (3, 10));
        assert_eq!(c.effective_reject_detection(), RejectDetection::AuthBlocked);
    }
}
