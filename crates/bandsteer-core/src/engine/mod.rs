// ── Steering engine ──
//
// Single-threaded control loop. The host feeds it config rows, driver
// events, timer expirations, and a periodic poll tick; every decision
// flows out through the collaborator traits in `Ctx`.

mod backoff;
mod btm;
mod cs;
mod events;
mod kick;
mod poll;
mod reject;
mod rrm;
mod state;
mod translate;

use bandsteer_bsal::{BsalAdapter, BsalEvent};
use tracing::{debug, warn};

use crate::clock::Clock;
use crate::config::RowUpdate;
use crate::error::CoreError;
use crate::model::{is_kick_sentinel, Client, ClientMode, CsMode, CsState, KickSource};
use crate::publish::CsStatePublisher;
use crate::sched::{Scheduler, TimerKey, TimerKind};
use crate::store::ClientStore;
use crate::telemetry::{EventSink, SteeringEvent};
use crate::topology::{GroupId, Topology};

use kick::KickQueue;

/// Engine-wide tunables, fixed at construction.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Watchdog interval for clients stuck in the `Steering` state.
    pub stats_report_interval_secs: u32,
    /// Delay between a low crossing and the sticky kick it may cause.
    pub sticky_kick_delay_secs: u64,
    /// Delay before a queued beacon request goes on the air.
    pub rrm_dispatch_delay_secs: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            stats_report_interval_secs: 60,
            sticky_kick_delay_secs: 1,
            rrm_dispatch_delay_secs: 1,
        }
    }
}

/// Borrowed collaborator set handed to the decision functions. Split
/// from the client store so a handler can hold `&mut Client` and still
/// reach every port.
pub(crate) struct Ctx<'a> {
    pub sched: &'a mut dyn Scheduler,
    pub topo: &'a dyn Topology,
    pub bsal: &'a mut dyn BsalAdapter,
    pub sink: &'a mut dyn EventSink,
    pub publisher: &'a mut dyn CsStatePublisher,
    pub clock: &'a dyn Clock,
    pub config: &'a EngineConfig,
}

/// The steering decision engine.
pub struct Engine {
    clients: ClientStore,
    kicks: KickQueue,
    sched: Box<dyn Scheduler>,
    topo: Box<dyn Topology>,
    bsal: Box<dyn BsalAdapter>,
    sink: Box<dyn EventSink>,
    publisher: Box<dyn CsStatePublisher>,
    clock: Box<dyn Clock>,
    config: EngineConfig,
}

impl Engine {
    pub fn new(
        sched: Box<dyn Scheduler>,
        topo: Box<dyn Topology>,
        bsal: Box<dyn BsalAdapter>,
        sink: Box<dyn EventSink>,
        publisher: Box<dyn CsStatePublisher>,
        clock: Box<dyn Clock>,
        config: EngineConfig,
    ) -> Self {
        Self {
            clients: ClientStore::new(),
            kicks: KickQueue::default(),
            sched,
            topo,
            bsal,
            sink,
            publisher,
            clock,
            config,
        }
    }

    fn parts(&mut self) -> (Ctx<'_>, &mut ClientStore, &mut KickQueue) {
        let Self {
            clients,
            kicks,
            sched,
            topo,
            bsal,
            sink,
            publisher,
            clock,
            config,
        } = self;
        (
            Ctx {
                sched: sched.as_mut(),
                topo: &**topo,
                bsal: bsal.as_mut(),
                sink: sink.as_mut(),
                publisher: publisher.as_mut(),
                clock: &**clock,
                config,
            },
            clients,
            kicks,
        )
    }

    // ── Host entry points ──

    /// Apply one config-row change.
    pub fn on_config_row(&mut self, update: RowUpdate) -> Result<(), CoreError> {
        match update {
            RowUpdate::Insert(row) => {
                let policy = row.to_policy()?;
                let (mut ctx, clients, kicks) = self.parts();
                if let Some(mut displaced) = clients.remove(row.mac) {
                    warn!(mac = %row.mac, "replacing existing client record");
                    kicks.remove_for(row.mac);
                    displaced.timers.cancel_all(ctx.sched);
                    for slot in &displaced.ifaces {
                        if slot.applied.is_some() {
                            if let Err(err) = ctx.bsal.remove_client(&slot.ifname, row.mac) {
                                warn!(mac = %row.mac, ifname = %slot.ifname, %err, "client removal failed");
                            }
                        }
                    }
                }
                let mut client = Client::new(row.mac, row.id, policy);
                // Slots must exist before a client-steering trigger so
                // its events are scoped to real interfaces.
                let synced = sync_slots(&mut ctx, &mut client);
                if client.policy.cs.mode != CsMode::Off {
                    cs::trigger(&mut ctx, &mut client);
                }
                let applied = apply_thresholds(&mut ctx, &mut client);
                clients.insert(client);
                synced.and(applied)
            }
            RowUpdate::Modify(row) => {
                let policy = row.to_policy()?;
                let (mut ctx, clients, kicks) = self.parts();
                let mac = clients
                    .mac_for_row(row.id)
                    .ok_or(CoreError::UnknownRow(row.id))?;
                let mut forced_kick = false;
                let result = {
                    let client = clients
                        .get_mut(mac)
                        .ok_or(CoreError::UnknownClient { mac })?;

                    let sentinel_now = is_kick_sentinel(row.lwm);
                    // A modify carrying exactly what we last wrote back
                    // is our own echo; re-applying would restart timers.
                    if !sentinel_now
                        && row.cs_state.is_some()
                        && row.cs_state == client.last_published_cs
                        && policy == client.policy
                    {
                        debug!(%mac, "config echo ignored");
                        return Ok(());
                    }

                    let was_sentinel = is_kick_sentinel(client.policy.lwm);
                    client.policy = policy;

                    if !was_sentinel && sentinel_now {
                        // The sentinel LWM is a kick command, not a
                        // threshold; nothing is pushed to the driver.
                        kick::request(&mut ctx, kicks, client, KickSource::Force, 0);
                        forced_kick = true;
                        Ok(())
                    } else if was_sentinel && !sentinel_now {
                        // Returning from the sentinel restores the
                        // previous thresholds, which never left the
                        // driver.
                        Ok(())
                    } else {
                        if client.policy.cs.mode != CsMode::Off {
                            cs::trigger(&mut ctx, client);
                        } else if client.is_client_steering() {
                            teardown_client_steering(&mut ctx, client);
                        } else {
                            client.timers.cancel(ctx.sched, TimerKind::CsEnforce);
                        }
                        sync_groups(&mut ctx, client)
                    }
                };
                if forced_kick {
                    kick::pump(&mut ctx, clients, kicks);
                }
                result
            }
            RowUpdate::Delete(row_id) => {
                let (mut ctx, clients, kicks) = self.parts();
                let mac = clients
                    .mac_for_row(row_id)
                    .ok_or(CoreError::UnknownRow(row_id))?;
                let mut client = clients
                    .remove(mac)
                    .ok_or(CoreError::UnknownClient { mac })?;
                kicks.remove_for(mac);
                client.timers.cancel_all(ctx.sched);
                for slot in &client.ifaces {
                    if slot.applied.is_some() {
                        if let Err(err) = ctx.bsal.remove_client(&slot.ifname, mac) {
                            warn!(%mac, ifname = %slot.ifname, %err, "client removal failed");
                        }
                    }
                }
                Ok(())
            }
        }
    }

    /// Deliver one driver event.
    pub fn on_event(&mut self, event: BsalEvent) {
        let (mut ctx, clients, kicks) = self.parts();
        events::handle(&mut ctx, clients, kicks, event);
    }

    /// Deliver one timer expiry, keyed as it was scheduled.
    pub fn on_timer(&mut self, key: TimerKey) {
        let (mut ctx, clients, kicks) = self.parts();
        {
            let Some(client) = clients.get_mut(key.mac) else {
                return;
            };
            client.timers.clear_fired(key.kind);
            match key.kind {
                TimerKind::Backoff => backoff::on_timer(&mut ctx, client),
                TimerKind::CsEnforce => cs::on_enforce_timer(&mut ctx, client),
                TimerKind::CsHysteresis => cs::on_hysteresis_timer(&mut ctx, client),
                TimerKind::State => state::on_force_reset(&mut ctx, client),
                TimerKind::BtmRetry => btm::on_retry_timer(&mut ctx, client),
                TimerKind::StickyXing => poll::on_sticky_timer(&mut ctx, kicks, client),
                TimerKind::Rrm(token) => rrm::on_slot_timer(&mut ctx, client, token),
            }
        }
        kick::pump(&mut ctx, clients, kicks);
    }

    /// Run one periodic RSSI/activity sweep over connected clients.
    pub fn on_periodic_rssi_poll(&mut self) {
        let (mut ctx, clients, kicks) = self.parts();
        poll::run(&mut ctx, clients, kicks);
    }

    /// A steering group appeared; give every client a slot on its
    /// interfaces.
    pub fn on_group_added(&mut self, _group: GroupId) -> Result<(), CoreError> {
        self.resync_clients()
    }

    /// A group's interface set or flags changed.
    pub fn on_group_updated(&mut self, _group: GroupId) -> Result<(), CoreError> {
        self.resync_clients()
    }

    /// A group is gone; deregister its interfaces everywhere.
    pub fn on_group_removed(&mut self, group: GroupId) {
        let (mut ctx, clients, _) = self.parts();
        for mac in clients.macs() {
            let Some(client) = clients.get_mut(mac) else {
                continue;
            };
            for slot in client.remove_group_ifaces(group) {
                if slot.applied.is_some() {
                    if let Err(err) = ctx.bsal.remove_client(&slot.ifname, mac) {
                        warn!(%mac, ifname = %slot.ifname, %err, "client removal failed");
                    }
                }
                if client.connected_ifname.as_deref() == Some(slot.ifname.as_str()) {
                    client.connected_ifname = None;
                }
            }
        }
    }

    // ── Lookups ──

    pub fn find_by_mac(&self, mac: bandsteer_bsal::MacAddress) -> Option<&Client> {
        self.clients.get(mac)
    }

    pub fn find_by_row(&self, row: crate::model::RowId) -> Option<&Client> {
        self.clients.by_row(row)
    }

    pub fn client_count(&self) -> usize {
        self.clients.len()
    }

    fn resync_clients(&mut self) -> Result<(), CoreError> {
        let (mut ctx, clients, _) = self.parts();
        let mut failed = 0usize;
        for mac in clients.macs() {
            if let Some(client) = clients.get_mut(mac) {
                if let Err(err) = sync_groups(&mut ctx, client) {
                    warn!(%mac, %err, "group resync incomplete");
                    failed += 1;
                }
            }
        }
        if failed > 0 {
            Err(CoreError::PartialApply { failed })
        } else {
            Ok(())
        }
    }
}

/// Align a client's slot table with the live topology and push the
/// thresholds that follow from its current policy and state.
fn sync_groups(ctx: &mut Ctx<'_>, client: &mut Client) -> Result<(), CoreError> {
    sync_slots(ctx, client)?;
    apply_thresholds(ctx, client)
}

/// Align the slot table alone: deregister slots whose interface left
/// the topology, create slots for interfaces that joined.
fn sync_slots(ctx: &mut Ctx<'_>, client: &mut Client) -> Result<(), CoreError> {
    let mut live: Vec<(String, bandsteer_bsal::RadioType, bool, GroupId)> = Vec::new();
    for group in ctx.topo.group_ids() {
        for iface in ctx.topo.group_ifaces(group) {
            live.push((
                iface.ifname.clone(),
                iface.radio_type,
                ctx.topo.group_allows(group, iface.radio_type),
                group,
            ));
        }
    }

    let (kept, gone): (Vec<_>, Vec<_>) = std::mem::take(&mut client.ifaces)
        .into_iter()
        .partition(|slot| live.iter().any(|(name, ..)| name == &slot.ifname));
    client.ifaces = kept;
    for slot in gone {
        if slot.applied.is_some() {
            if let Err(err) = ctx.bsal.remove_client(&slot.ifname, client.mac) {
                warn!(mac = %client.mac, ifname = %slot.ifname, %err, "client removal failed");
            }
        }
    }

    for (ifname, radio_type, bs_allowed, group) in live {
        client.ensure_iface(&ifname, radio_type, bs_allowed, group)?;
    }
    Ok(())
}

/// Translate and push thresholds for every slot, skipping interfaces
/// already holding the desired values. Failures are per-interface; the
/// rest still apply.
pub(crate) fn apply_thresholds(ctx: &mut Ctx<'_>, client: &mut Client) -> Result<(), CoreError> {
    let mut failed = 0usize;
    let (state, mode) = (client.state, client.mode);
    for slot in &mut client.ifaces {
        let view = translate::IfaceView {
            radio_type: slot.radio_type,
            bs_allowed: ctx.topo.group_allows(slot.group, slot.radio_type),
            dfs_only: ctx.topo.group_is_dfs_only(slot.group),
            gateway_only: ctx.topo.group_is_gateway_only(slot.group),
        };
        let desired = translate::thresholds(&client.policy, state, mode, view);
        slot.bs_allowed = view.bs_allowed;
        if slot.applied.as_ref() == Some(&desired) {
            continue;
        }
        let result = if slot.applied.is_some() {
            ctx.bsal.update_client(&slot.ifname, client.mac, &desired)
        } else {
            ctx.bsal.add_client(&slot.ifname, client.mac, &desired)
        };
        match result {
            Ok(()) => slot.applied = Some(desired),
            Err(err) => {
                warn!(
                    mac = %client.mac, ifname = %slot.ifname, %err,
                    "threshold apply failed"
                );
                failed += 1;
            }
        }
    }
    if failed > 0 {
        Err(CoreError::PartialApply { failed })
    } else {
        Ok(())
    }
}

/// Apply with the error downgraded to a log line, for paths where the
/// caller has no error channel of its own.
pub(crate) fn apply_logged(ctx: &mut Ctx<'_>, client: &mut Client) {
    if let Err(err) = apply_thresholds(ctx, client) {
        warn!(mac = %client.mac, %err, "threshold apply incomplete");
    }
}

/// Controller turned client steering off mid-attempt: publish the
/// final state and fall back to band steering.
fn teardown_client_steering(ctx: &mut Ctx<'_>, client: &mut Client) {
    client.mode = ClientMode::BandSteering;
    client.timers.cancel(ctx.sched, TimerKind::CsEnforce);
    client.timers.cancel(ctx.sched, TimerKind::CsHysteresis);
    cs::publish(ctx, client, CsState::Expired);
    let ifnames: Vec<String> = client.ifaces.iter().map(|s| s.ifname.clone()).collect();
    for ifname in ifnames {
        ctx.sink
            .report(client.mac, &ifname, SteeringEvent::ClientSteeringDisabled);
    }
}
