// ── Shared test fakes ──
//
// Rc-backed so a test keeps a handle to each collaborator after the
// engine takes its boxed clone.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;
use std::time::Duration;

use bandsteer_bsal::{
    BsalAdapter, BsalError, BtmRequest, ClientInfo, ClientThresholds, DisconnectType, MacAddress,
    RrmRequest,
};
use chrono::{DateTime, TimeZone, Utc};

use crate::clock::Clock;
use crate::model::CsState;
use crate::publish::CsStatePublisher;
use crate::sched::{Scheduler, TimerHandle, TimerKey};
use crate::telemetry::{EventSink, SteeringEvent};

// ── Scheduler ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Default)]
pub(crate) struct FakeScheduler {
    inner: Rc<RefCell<SchedInner>>,
}

#[derive(Debug, Default)]
struct SchedInner {
    next: u64,
    armed: BTreeMap<u64, (TimerKey, Duration)>,
}

impl FakeScheduler {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn armed_handles(&self) -> Vec<TimerHandle> {
        self.inner.borrow().armed.keys().map(|h| TimerHandle(*h)).collect()
    }

    pub(crate) fn armed_keys(&self) -> Vec<TimerKey> {
        self.inner.borrow().armed.values().map(|(k, _)| *k).collect()
    }

    pub(crate) fn delay_for(&self, key: TimerKey) -> Option<Duration> {
        self.inner
            .borrow()
            .armed
            .values()
            .find(|(k, _)| *k == key)
            .map(|(_, d)| *d)
    }

    pub(crate) fn armed_count(&self) -> usize {
        self.inner.borrow().armed.len()
    }
}

impl Scheduler for FakeScheduler {
    fn schedule(&mut self, key: TimerKey, delay: Duration) -> TimerHandle {
        let mut inner = self.inner.borrow_mut();
        inner.next += 1;
        let handle = inner.next;
        inner.armed.insert(handle, (key, delay));
        TimerHandle(handle)
    }

    fn cancel(&mut self, handle: TimerHandle) {
        self.inner.borrow_mut().armed.remove(&handle.0);
    }
}

// ── Driver adapter ──────────────────────────────────────────────────

#[derive(Debug, Clone, Default)]
pub(crate) struct FakeBsal {
    inner: Rc<RefCell<BsalInner>>,
}

#[derive(Debug, Default)]
struct BsalInner {
    thresholds: BTreeMap<(String, MacAddress), ClientThresholds>,
    infos: BTreeMap<(String, MacAddress), ClientInfo>,
    removed: Vec<(String, MacAddress)>,
    disconnects: Vec<(String, MacAddress, DisconnectType, u8)>,
    btm_requests: Vec<(String, MacAddress, BtmRequest)>,
    rrm_requests: Vec<(String, MacAddress, RrmRequest)>,
    measurements: Vec<(String, MacAddress, u8)>,
    measure_supported: bool,
    programmed: usize,
}

impl FakeBsal {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn thresholds(&self, ifname: &str, mac: MacAddress) -> Option<ClientThresholds> {
        self.inner
            .borrow()
            .thresholds
            .get(&(ifname.to_owned(), mac))
            .copied()
    }

    pub(crate) fn set_info(&self, ifname: &str, mac: MacAddress, info: ClientInfo) {
        self.inner
            .borrow_mut()
            .infos
            .insert((ifname.to_owned(), mac), info);
    }

    pub(crate) fn set_measure_supported(&self, supported: bool) {
        self.inner.borrow_mut().measure_supported = supported;
    }

    pub(crate) fn removed(&self) -> Vec<(String, MacAddress)> {
        self.inner.borrow().removed.clone()
    }

    pub(crate) fn disconnects(&self) -> Vec<(String, MacAddress, DisconnectType, u8)> {
        self.inner.borrow().disconnects.clone()
    }

    pub(crate) fn btm_requests(&self) -> Vec<(String, MacAddress, BtmRequest)> {
        self.inner.borrow().btm_requests.clone()
    }

    pub(crate) fn rrm_requests(&self) -> Vec<(String, MacAddress, RrmRequest)> {
        self.inner.borrow().rrm_requests.clone()
    }

    pub(crate) fn measurements(&self) -> Vec<(String, MacAddress, u8)> {
        self.inner.borrow().measurements.clone()
    }

    /// How many add/update calls have reached the driver.
    pub(crate) fn programmed_count(&self) -> usize {
        self.inner.borrow().programmed
    }
}

impl BsalAdapter for FakeBsal {
    fn add_client(
        &mut self,
        ifname: &str,
        mac: MacAddress,
        thresholds: &ClientThresholds,
    ) -> Result<(), BsalError> {
        let mut inner = self.inner.borrow_mut();
        inner.programmed += 1;
        inner.thresholds.insert((ifname.to_owned(), mac), *thresholds);
        Ok(())
    }

    fn update_client(
        &mut self,
        ifname: &str,
        mac: MacAddress,
        thresholds: &ClientThresholds,
    ) -> Result<(), BsalError> {
        self.add_client(ifname, mac, thresholds)
    }

    fn remove_client(&mut self, ifname: &str, mac: MacAddress) -> Result<(), BsalError> {
        let mut inner = self.inner.borrow_mut();
        inner.thresholds.remove(&(ifname.to_owned(), mac));
        inner.removed.push((ifname.to_owned(), mac));
        Ok(())
    }

    fn client_info(&mut self, ifname: &str, mac: MacAddress) -> Result<ClientInfo, BsalError> {
        self.inner
            .borrow()
            .infos
            .get(&(ifname.to_owned(), mac))
            .copied()
            .ok_or_else(|| BsalError::UnknownInterface(ifname.to_owned()))
    }

    fn disconnect_client(
        &mut self,
        ifname: &str,
        mac: MacAddress,
        kind: DisconnectType,
        reason: u8,
    ) -> Result<(), BsalError> {
        self.inner
            .borrow_mut()
            .disconnects
            .push((ifname.to_owned(), mac, kind, reason));
        Ok(())
    }

    fn measure_rssi(
        &mut self,
        ifname: &str,
        mac: MacAddress,
        num_samples: u8,
    ) -> Result<(), BsalError> {
        let mut inner = self.inner.borrow_mut();
        if !inner.measure_supported {
            return Err(BsalError::Unsupported("instant rssi measurement"));
        }
        inner
            .measurements
            .push((ifname.to_owned(), mac, num_samples));
        Ok(())
    }

    fn send_btm_request(
        &mut self,
        ifname: &str,
        mac: MacAddress,
        request: &BtmRequest,
    ) -> Result<(), BsalError> {
        self.inner
            .borrow_mut()
            .btm_requests
            .push((ifname.to_owned(), mac, request.clone()));
        Ok(())
    }

    fn send_rrm_request(
        &mut self,
        ifname: &str,
        mac: MacAddress,
        request: &RrmRequest,
    ) -> Result<(), BsalError> {
        self.inner
            .borrow_mut()
            .rrm_requests
            .push((ifname.to_owned(), mac, request.clone()));
        Ok(())
    }
}

// ── Sink, publisher, clock ──────────────────────────────────────────

#[derive(Debug, Clone, Default)]
pub(crate) struct RecordingSink {
    events: Rc<RefCell<Vec<(MacAddress, String, SteeringEvent)>>>,
}

impl RecordingSink {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn events(&self) -> Vec<(MacAddress, String, SteeringEvent)> {
        self.events.borrow().clone()
    }

    pub(crate) fn count_of(&self, wanted: &SteeringEvent) -> usize {
        self.events
            .borrow()
            .iter()
            .filter(|(_, _, e)| e == wanted)
            .count()
    }
}

impl EventSink for RecordingSink {
    fn report(&mut self, mac: MacAddress, ifname: &str, event: SteeringEvent) {
        self.events.borrow_mut().push((mac, ifname.to_owned(), event));
    }
}

#[derive(Debug, Clone, Default)]
pub(crate) struct RecordingPublisher {
    states: Rc<RefCell<Vec<(MacAddress, CsState)>>>,
}

impl RecordingPublisher {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn published(&self) -> Vec<(MacAddress, CsState)> {
        self.states.borrow().clone()
    }
}

impl CsStatePublisher for RecordingPublisher {
    fn publish(&mut self, mac: MacAddress, state: CsState) {
        self.states.borrow_mut().push((mac, state));
    }
}

#[derive(Debug, Clone)]
pub(crate) struct ManualClock {
    now: Rc<RefCell<DateTime<Utc>>>,
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl ManualClock {
    pub(crate) fn new() -> Self {
        let start = Utc
            .with_ymd_and_hms(2026, 8, 25, 12, 0, 0)
            .single()
            .unwrap_or_else(Utc::now);
        Self {
            now: Rc::new(RefCell::new(start)),
        }
    }

    pub(crate) fn advance_secs(&self, secs: i64) {
        let mut now = self.now.borrow_mut();
        *now += chrono::Duration::seconds(secs);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.borrow()
    }
}

// ── Engine harness ──────────────────────────────────────────────────

/// An engine wired to fakes, with handles kept for inspection.
pub(crate) struct Harness {
    pub engine: crate::engine::Engine,
    pub sched: FakeScheduler,
    pub bsal: FakeBsal,
    pub sink: RecordingSink,
    pub publisher: RecordingPublisher,
    pub clock: ManualClock,
}

impl Harness {
    pub(crate) fn new(topo: crate::topology::StaticTopology) -> Self {
        let sched = FakeScheduler::new();
        let bsal = FakeBsal::new();
        let sink = RecordingSink::new();
        let publisher = RecordingPublisher::new();
        let clock = ManualClock::new();
        let engine = crate::engine::Engine::new(
            Box::new(sched.clone()),
            Box::new(topo),
            Box::new(bsal.clone()),
            Box::new(sink.clone()),
            Box::new(publisher.clone()),
            Box::new(clock.clone()),
            crate::engine::EngineConfig::default(),
        );
        Self {
            engine,
            sched,
            bsal,
            sink,
            publisher,
            clock,
        }
    }
}
