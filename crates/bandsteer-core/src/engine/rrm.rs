// ── 802.11k beacon measurements ──
//
// Beacon requests feed the neighbor cache that BTM candidate lists are
// built from. Requests are queued on the client and dispatched from a
// short per-slot timer so a burst of triggers cannot flood the air.

use std::time::Duration;

use bandsteer_bsal::{RrmCaps, RrmMeasurementMode, RrmRequest};
use tracing::{debug, warn};

use crate::model::Client;
use crate::sched::TimerKind;

use super::Ctx;

/// Global operating class covering a channel, for the beacon request
/// frame. 2.4 GHz maps to class 81, everything else to the wide 5/6
/// GHz class 128.
fn op_class_for_channel(channel: u8) -> u8 {
    if channel <= 14 { 81 } else { 128 }
}

fn scan_mode(caps: RrmCaps) -> Option<RrmMeasurementMode> {
    if caps.bcn_rpt_active {
        Some(RrmMeasurementMode::Active)
    } else if caps.bcn_rpt_passive {
        Some(RrmMeasurementMode::Passive)
    } else if caps.bcn_rpt_table {
        Some(RrmMeasurementMode::Table)
    } else {
        None
    }
}

/// Queue a beacon measurement of the client's own channel, dispatched
/// after the configured delay. Silently skipped for clients that never
/// advertised beacon-report support.
pub(crate) fn queue_own_channel(ctx: &mut Ctx<'_>, client: &mut Client) {
    let Some(slot) = client.connected_slot() else {
        return;
    };
    let Some(mode) = scan_mode(slot.info.rrm_caps) else {
        debug!(mac = %client.mac, "client reports no beacon measurement support");
        return;
    };
    let ifname = slot.ifname.clone();
    let channel = ctx
        .topo
        .group_ifaces(slot.group)
        .iter()
        .find(|i| i.ifname == ifname)
        .map_or(0, |i| i.channel);

    let request = RrmRequest {
        op_class: op_class_for_channel(channel),
        channel,
        mode,
        duration: RrmRequest::duration_for(mode),
        rand_interval: 0,
        ssid: String::new(),
        rep_detail: 2,
    };
    match client.queue_rrm(ifname, request) {
        Ok(token) => {
            client.timers.arm(
                ctx.sched,
                client.mac,
                TimerKind::Rrm(token),
                Duration::from_secs(ctx.config.rrm_dispatch_delay_secs),
            );
        }
        Err(err) => warn!(mac = %client.mac, %err, "beacon request dropped"),
    }
}

/// Slot timer expiry: transmit the queued request if the client is
/// still on that interface.
pub(crate) fn on_slot_timer(ctx: &mut Ctx<'_>, client: &mut Client, token: u8) {
    let Some(slot) = client.take_rrm(token) else {
        return;
    };
    if client.connected_ifname.as_deref() != Some(slot.ifname.as_str()) {
        return;
    }
    if let Err(err) = ctx
        .bsal
        .send_rrm_request(&slot.ifname, client.mac, &slot.request)
    {
        warn!(mac = %client.mac, ifname = %slot.ifname, %err, "beacon request failed");
    }
}

/// Drop queued requests and their timers. Fired on disconnect.
pub(crate) fn cancel_all(ctx: &mut Ctx<'_>, client: &mut Client) {
    for kind in client.timers.rrm_kinds() {
        client.timers.cancel(ctx.sched, kind);
    }
    client.rrm_requests.clear();
}
