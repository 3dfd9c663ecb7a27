// ── Kick queue ──
//
// Kicks never fire straight from an event handler. They queue, wait
// for an instant RSSI measurement where the driver supports one, and
// re-check their trigger threshold against the measured value before
// anything is sent. One measurement is in flight at a time.

use std::collections::VecDeque;

use bandsteer_bsal::{BsalError, DisconnectType, MacAddress};
use tracing::{debug, warn};

use crate::model::{
    is_kick_sentinel, Client, ClientState, KickSource, KickType, INSTANT_MEASUREMENT_SAMPLES,
    KICK_DEBOUNCE_NEVER_SECS,
};
use crate::store::ClientStore;

use super::{btm, rrm, Ctx};

#[derive(Debug, Clone)]
struct KickEntry {
    mac: MacAddress,
    ifname: String,
    source: KickSource,
    snr: u8,
    /// An instant measurement for this entry is in flight.
    measuring: bool,
}

/// FIFO of pending kicks across all clients.
#[derive(Debug, Default)]
pub(crate) struct KickQueue {
    entries: VecDeque<KickEntry>,
}

impl KickQueue {
    pub(crate) fn remove_for(&mut self, mac: MacAddress) {
        self.entries.retain(|e| e.mac != mac);
    }
}

/// Queue a kick for a connected client. Returns whether it was
/// accepted; refusals are policy (no kick type, debounce, wrong state),
/// not errors.
pub(crate) fn request(
    ctx: &mut Ctx<'_>,
    queue: &mut KickQueue,
    client: &Client,
    source: KickSource,
    snr: u8,
) -> bool {
    let Some(ifname) = client.connected_ifname.clone() else {
        debug!(mac = %client.mac, source = %source, "kick skipped, not connected");
        return false;
    };
    let kick = client.policy.kick_for(source);
    if kick.kick_type == KickType::None {
        debug!(mac = %client.mac, source = %source, "kick skipped, no kick type");
        return false;
    }
    if kick.debounce_period_secs == KICK_DEBOUNCE_NEVER_SECS {
        debug!(mac = %client.mac, source = %source, "kick suppressed by debounce sentinel");
        return false;
    }
    if let Some(connected_at) = client.times.last_connect {
        let since = (ctx.clock.now() - connected_at).num_seconds();
        if since >= 0 && since <= i64::from(kick.debounce_period_secs) {
            debug!(mac = %client.mac, source = %source, since, "kick debounced");
            return false;
        }
    }
    if source == KickSource::Steering {
        // A steering kick only makes sense for a client sitting
        // connected on a band it should not be on.
        if client.state != ClientState::Connected {
            return false;
        }
        let on_blocked_band = client.connected_slot().is_some_and(|s| !s.bs_allowed);
        if !on_blocked_band {
            return false;
        }
    }

    if let Some(entry) = queue
        .entries
        .iter_mut()
        .find(|e| e.mac == client.mac && !e.measuring)
    {
        entry.source = source;
        entry.snr = snr;
        entry.ifname = ifname;
        return true;
    }
    debug!(mac = %client.mac, source = %source, snr, "kick queued");
    queue.entries.push_back(KickEntry {
        mac: client.mac,
        ifname,
        source,
        snr,
        measuring: false,
    });
    true
}

/// Drive the queue: start a measurement for the head entry, or execute
/// it directly where the driver cannot measure. Stops at the first
/// entry left awaiting its measurement.
pub(crate) fn pump(ctx: &mut Ctx<'_>, clients: &mut ClientStore, queue: &mut KickQueue) {
    loop {
        let Some(head) = queue.entries.front() else {
            return;
        };
        if head.measuring {
            return;
        }
        let entry = head.clone();

        let Some(client) = clients.get_mut(entry.mac) else {
            queue.entries.pop_front();
            continue;
        };
        if client.connected_ifname.as_deref() != Some(entry.ifname.as_str()) {
            debug!(mac = %entry.mac, "kick dropped, client moved");
            queue.entries.pop_front();
            continue;
        }

        // Forced kicks skip the measurement; the decision is final.
        if entry.source == KickSource::Force {
            queue.entries.pop_front();
            execute(ctx, client, &entry.ifname, entry.source, entry.snr);
            continue;
        }

        match ctx
            .bsal
            .measure_rssi(&entry.ifname, entry.mac, INSTANT_MEASUREMENT_SAMPLES)
        {
            Ok(()) => {
                if let Some(head) = queue.entries.front_mut() {
                    head.measuring = true;
                }
                return;
            }
            Err(BsalError::Unsupported(_)) => {
                queue.entries.pop_front();
                execute(ctx, client, &entry.ifname, entry.source, entry.snr);
            }
            Err(err) => {
                warn!(mac = %entry.mac, %err, "instant measurement failed, kick dropped");
                queue.entries.pop_front();
            }
        }
    }
}

/// Measurement completion for the head entry.
pub(crate) fn on_measurement(
    ctx: &mut Ctx<'_>,
    clients: &mut ClientStore,
    queue: &mut KickQueue,
    mac: MacAddress,
    snr: u8,
) {
    let head_matches = queue
        .entries
        .front()
        .is_some_and(|e| e.measuring && e.mac == mac);
    if !head_matches {
        return;
    }
    let entry = queue
        .entries
        .pop_front()
        .unwrap_or_else(|| unreachable!("head checked above"));

    if let Some(client) = clients.get_mut(mac) {
        if client.connected_ifname.as_deref() == Some(entry.ifname.as_str()) {
            execute(ctx, client, &entry.ifname, entry.source, snr);
        }
    }
    pump(ctx, clients, queue);
}

/// Final threshold re-check and transmission.
fn execute(ctx: &mut Ctx<'_>, client: &mut Client, ifname: &str, source: KickSource, snr: u8) {
    if source != KickSource::Force {
        if snr == 0 {
            warn!(mac = %client.mac, "measured snr unavailable, kick skipped");
            return;
        }
        match source {
            KickSource::Sticky => {
                if !is_kick_sentinel(client.policy.lwm) && snr > client.policy.lwm {
                    debug!(mac = %client.mac, snr, "client recovered above lwm, kick skipped");
                    return;
                }
            }
            KickSource::Steering => {
                if snr <= client.policy.hwm {
                    debug!(mac = %client.mac, snr, "client below hwm, kick skipped");
                    return;
                }
            }
            KickSource::Force => {}
        }
    }

    let kick = *client.policy.kick_for(source);
    let sent = match kick.kick_type {
        KickType::None => false,
        KickType::Disassoc => direct(ctx, client, ifname, DisconnectType::Disassoc, kick.reason),
        KickType::Deauth => direct(ctx, client, ifname, DisconnectType::Deauth, kick.reason),
        KickType::BssTm | KickType::BtmDisassoc | KickType::BtmDeauth => {
            btm::send(ctx, client, ifname, source)
        }
        KickType::RrmBrReq => {
            rrm::queue_own_channel(ctx, client);
            true
        }
        KickType::RrmDisassoc => {
            rrm::queue_own_channel(ctx, client);
            direct(ctx, client, ifname, DisconnectType::Disassoc, kick.reason)
        }
        KickType::RrmDeauth => {
            rrm::queue_own_channel(ctx, client);
            direct(ctx, client, ifname, DisconnectType::Deauth, kick.reason)
        }
    };
    if !sent {
        return;
    }

    let now = ctx.clock.now();
    client.times.last_kick = Some(now);
    let guard_secs = match source {
        KickSource::Steering => client.policy.steering_kick_guard_secs,
        KickSource::Sticky => client.policy.sticky_kick_guard_secs,
        KickSource::Force => 0,
    };
    if guard_secs > 0 {
        client.settling_until = Some(now + chrono::Duration::seconds(i64::from(guard_secs)));
    }
    if let Some(slot) = client.iface_mut(ifname) {
        match source {
            KickSource::Steering => slot.stats.steering_kick_cnt += 1,
            KickSource::Sticky | KickSource::Force => slot.stats.sticky_kick_cnt += 1,
        }
    }
}

fn direct(
    ctx: &mut Ctx<'_>,
    client: &Client,
    ifname: &str,
    frame: DisconnectType,
    reason: u8,
) -> bool {
    match ctx.bsal.disconnect_client(ifname, client.mac, frame, reason) {
        Ok(()) => true,
        Err(err) => {
            warn!(mac = %client.mac, ifname, %err, "disconnect failed");
            false
        }
    }
}
