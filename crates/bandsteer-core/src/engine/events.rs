// ── Driver event handling ──
//
// One entry point per `BsalEvent`. Handlers only record facts and make
// decisions; anything that removes a client from the air goes through
// the kick queue, which is pumped once per delivered event.

use bandsteer_bsal::{BsalEvent, ClientInfo, DisconnectSource, DisconnectType, RssiChange};
use tracing::{debug, warn};

use crate::model::{
    Client, ClientState, KickSource, PendingKick, ProbeMark, RejectDetection,
    PROBE_REPORT_INTERVAL_SECS, PROBE_REPORT_SNR_DELTA,
};
use crate::sched::TimerKind;
use crate::store::ClientStore;
use crate::telemetry::SteeringEvent;

use super::kick::KickQueue;
use super::{backoff, btm, cs, kick, reject, rrm, state, Ctx};

pub(crate) fn handle(
    ctx: &mut Ctx<'_>,
    clients: &mut ClientStore,
    kicks: &mut KickQueue,
    event: BsalEvent,
) {
    let mac = event.client_mac();
    match event {
        BsalEvent::RssiMeasurement { snr, .. } => {
            kick::on_measurement(ctx, clients, kicks, mac, snr);
        }
        other => {
            let Some(client) = clients.get_mut(mac) else {
                debug!(%mac, ifname = other.ifname(), "event for unknown client");
                return;
            };
            match other {
                BsalEvent::Probe {
                    ifname,
                    snr,
                    broadcast,
                    blocked,
                    ..
                } => on_probe(ctx, client, &ifname, snr, broadcast, blocked),
                BsalEvent::Connect { ifname, info, .. } => on_connect(ctx, client, &ifname, info),
                BsalEvent::Disconnect {
                    ifname,
                    source,
                    kind,
                    reason,
                    ..
                } => on_disconnect(ctx, client, &ifname, source, kind, reason),
                BsalEvent::AuthFail {
                    ifname,
                    snr,
                    bs_blocked,
                    reject_reason,
                    ..
                } => on_auth_fail(ctx, client, &ifname, snr, bs_blocked, reject_reason),
                BsalEvent::RssiXing {
                    ifname,
                    snr,
                    high_xing,
                    low_xing,
                    ..
                } => on_xing(ctx, kicks, client, &ifname, snr, high_xing, low_xing),
                BsalEvent::Activity { ifname, active, .. } => {
                    on_activity(ctx, kicks, client, &ifname, active);
                }
                BsalEvent::BtmResponse { ifname, status, .. } => {
                    btm::on_response(ctx, client, &ifname, status);
                }
                BsalEvent::RrmReport { neighbor, rcpi, .. } => {
                    if let Some(report) = neighbor {
                        let now = ctx.clock.now();
                        client.cache_neighbor(report, rcpi, now);
                    }
                }
                BsalEvent::RssiMeasurement { .. } => {}
            }
        }
    }
    kick::pump(ctx, clients, kicks);
}

fn on_probe(
    ctx: &mut Ctx<'_>,
    client: &mut Client,
    ifname: &str,
    snr: u8,
    broadcast: bool,
    blocked: bool,
) {
    let now = ctx.clock.now();
    if let Some(radio) = ctx.topo.radio_type_for(ifname) {
        client.band_caps.note(radio);
    }
    if let Some(slot) = client.iface_mut(ifname) {
        let probe = &mut slot.stats.probe;
        if broadcast {
            probe.null_cnt += 1;
            if blocked {
                probe.null_blocked += 1;
            }
        } else {
            probe.direct_cnt += 1;
            if blocked {
                probe.direct_blocked += 1;
            }
        }
    }

    // Probe reports are throttled: only blocking flips, a meaningful
    // SNR move, or enough elapsed time get through.
    let delta = if client.policy.preq_snr_thr > 0 {
        client.policy.preq_snr_thr
    } else {
        PROBE_REPORT_SNR_DELTA
    };
    let report = client.last_probe.is_none_or(|mark| {
        mark.blocked != blocked
            || snr.abs_diff(mark.snr) >= delta
            || (now - mark.at).num_seconds() >= PROBE_REPORT_INTERVAL_SECS
    });
    if report {
        ctx.sink.report(
            client.mac,
            ifname,
            SteeringEvent::Probe {
                snr,
                broadcast,
                blocked,
            },
        );
        client.last_probe = Some(ProbeMark {
            snr,
            at: now,
            blocked,
        });
    }

    cs::check_probe_xing(ctx, client, snr);

    let on_blocked_band = client.iface(ifname).is_some_and(|s| !s.bs_allowed);
    if blocked && on_blocked_band && client.state == ClientState::Disconnected {
        state::set(ctx, client, ClientState::Steering);
    }

    if blocked {
        let counts = match client.effective_reject_detection() {
            RejectDetection::ProbeAll => true,
            RejectDetection::ProbeNull => broadcast,
            RejectDetection::ProbeDirect => !broadcast,
            RejectDetection::AuthBlocked => false,
        };
        if counts {
            reject::on_reject(ctx, client, ifname, snr);
        }
    }
}

fn on_connect(ctx: &mut Ctx<'_>, client: &mut Client, ifname: &str, info: ClientInfo) {
    let now = ctx.clock.now();
    let was_steering = client.state == ClientState::Steering;

    client.connected_ifname = Some(ifname.to_owned());
    client.times.last_connect = Some(now);
    client.times.bytes_report = Some(now);
    client.prev_xing_snr = info.snr;
    client.last_probe = None;

    let Some(slot) = client.iface_mut(ifname) else {
        warn!(mac = %client.mac, ifname, "connect on untracked interface");
        return;
    };
    slot.stats.connects += 1;
    slot.info = info;
    let allowed = slot.bs_allowed;
    let radio = slot.radio_type;
    if was_steering && allowed {
        slot.stats.steering_success_cnt += 1;
    }
    client.band_caps.note(radio);

    ctx.sink.report(
        client.mac,
        ifname,
        SteeringEvent::Capabilities {
            is_btm_supported: info.is_btm_supported,
            rrm_caps: info.rrm_caps,
        },
    );

    backoff::note_connect(client, allowed);
    if client.state == ClientState::Backoff {
        if allowed {
            // Landing on the preferred band ends the backoff cycle
            // early.
            state::change(ctx, client, ClientState::Connected, true);
            backoff::emit_events(ctx, client, false);
        }
    } else if client.state != ClientState::Connected {
        state::set(ctx, client, ClientState::Connected);
    }
    ctx.sink.report(client.mac, ifname, SteeringEvent::Connect);

    cs::on_connect(ctx, client, radio);
    if client.policy.rrm.send_after_assoc {
        rrm::queue_own_channel(ctx, client);
    }
}

fn on_disconnect(
    ctx: &mut Ctx<'_>,
    client: &mut Client,
    ifname: &str,
    source: DisconnectSource,
    kind: DisconnectType,
    reason: u8,
) {
    let now = ctx.clock.now();
    client.times.last_disconnect = Some(now);
    if let Some(slot) = client.iface_mut(ifname) {
        slot.stats.disconnects += 1;
        slot.stats.last_disconnect = Some(crate::model::DisconnectRecord {
            source,
            kind,
            reason,
        });
    }

    if client.connected_ifname.as_deref() == Some(ifname) {
        client.connected_ifname = None;
        client.is_active = false;
        client.pending_kick = None;
        client.sticky_snr = None;
        client.settling_until = None;
        client.last_probe = None;
        client.prev_xing_snr = 0;
        client.timers.cancel(ctx.sched, TimerKind::StickyXing);
        btm::cancel(ctx, client);
        rrm::cancel_all(ctx, client);
        if client.state == ClientState::Connected {
            state::set(ctx, client, ClientState::Disconnected);
        }
    }

    ctx.sink.report(
        client.mac,
        ifname,
        SteeringEvent::Disconnect {
            source,
            kind,
            reason,
        },
    );
}

fn on_auth_fail(
    ctx: &mut Ctx<'_>,
    client: &mut Client,
    ifname: &str,
    snr: u8,
    bs_blocked: bool,
    reject_reason: u8,
) {
    if bs_blocked {
        ctx.sink.report(
            client.mac,
            ifname,
            SteeringEvent::AuthBlock { snr, reject_reason },
        );
        if client.effective_reject_detection() == RejectDetection::AuthBlocked {
            reject::on_reject(ctx, client, ifname, snr);
        }
    }

    // A blocked auth from a client we still hold as connected means the
    // association is gone without a disconnect event.
    if client.connected_ifname.as_deref() == Some(ifname) {
        on_disconnect(
            ctx,
            client,
            ifname,
            DisconnectSource::Remote,
            DisconnectType::Deauth,
            reject_reason,
        );
    }
}

pub(crate) fn on_xing(
    ctx: &mut Ctx<'_>,
    kicks: &mut KickQueue,
    client: &mut Client,
    ifname: &str,
    snr: u8,
    high: RssiChange,
    low: RssiChange,
) {
    if let Some(slot) = client.iface_mut(ifname) {
        if high == RssiChange::Higher {
            slot.stats.rssi_higher_cnt += 1;
        }
        if low == RssiChange::Lower {
            slot.stats.rssi_lower_cnt += 1;
        }
    }
    client.prev_xing_snr = snr;

    if client.is_client_steering() {
        cs::on_driver_xing(ctx, client, high, low);
        return;
    }

    if client.state == ClientState::Backoff && !client.policy.steer_during_backoff {
        return;
    }
    if let Some(until) = client.settling_until {
        if ctx.clock.now() < until {
            debug!(mac = %client.mac, "crossing ignored during settle window");
            return;
        }
        client.settling_until = None;
    }
    let Some(allowed) = client.iface(ifname).map(|s| s.bs_allowed) else {
        return;
    };

    if high == RssiChange::Higher && !allowed {
        // Strong signal on a blocked band: move it to where it belongs.
        if client.policy.kick_upon_idle && client.is_active {
            debug!(mac = %client.mac, snr, "steering kick deferred until idle");
            client.pending_kick = Some(PendingKick {
                source: KickSource::Steering,
                snr,
            });
        } else {
            kick::request(ctx, kicks, client, KickSource::Steering, snr);
        }
    } else if low == RssiChange::Lower && allowed {
        // Weak signal on its own band: candidate for a sticky kick
        // after a short delay, with a beacon scan if configured.
        if client.policy.rrm.send_after_xing {
            rrm::queue_own_channel(ctx, client);
        }
        client.sticky_snr = Some(snr);
        client.timers.arm(
            ctx.sched,
            client.mac,
            TimerKind::StickyXing,
            std::time::Duration::from_secs(ctx.config.sticky_kick_delay_secs),
        );
    } else if high == RssiChange::Lower || low == RssiChange::Higher {
        // Back in range: stand down anything pending.
        client.pending_kick = None;
        client.sticky_snr = None;
        client.timers.cancel(ctx.sched, TimerKind::StickyXing);
        btm::cancel(ctx, client);
    }
}

fn on_activity(
    ctx: &mut Ctx<'_>,
    kicks: &mut KickQueue,
    client: &mut Client,
    ifname: &str,
    active: bool,
) {
    if client.is_active == active {
        return;
    }
    client.is_active = active;
    client.times.last_activity_change = Some(ctx.clock.now());
    ctx.sink
        .report(client.mac, ifname, SteeringEvent::ActivityChange { active });
    if !active {
        if let Some(pending) = client.pending_kick.take() {
            kick::request(ctx, kicks, client, pending.source, pending.snr);
        }
    }
}
