// ── Client steering ──
//
// Controller-directed moves of one client: Home pins it to a target
// band, Away pushes it off this node entirely. An attempt runs under
// an enforcement period; crossings of the client-steering watermarks
// are debounced through a short hysteresis timer before they can tear
// the attempt down.

use std::time::Duration;

use bandsteer_bsal::RadioType;
use tracing::{debug, info};

use crate::model::{
    Client, ClientMode, CsMode, CsPhase, CsState, ROGUE_SNR_LEVEL, RSSI_HYSTERESIS_SECS,
};
use crate::sched::TimerKind;
use crate::telemetry::SteeringEvent;

use super::translate::band_matches;
use super::{btm, Ctx};

/// Interfaces an attempt's telemetry events are scoped to: every
/// interface for Away, the target band for Home.
pub(crate) fn scope_ifnames(client: &Client) -> Vec<String> {
    let cs = &client.policy.cs;
    client
        .ifaces
        .iter()
        .filter(|s| match (cs.mode, cs.band) {
            (CsMode::Home, Some(band)) => band_matches(s.radio_type, band),
            _ => true,
        })
        .map(|s| s.ifname.clone())
        .collect()
}

/// Write the client-steering state upstream, remembering it so the
/// resulting config echo can be recognized.
pub(crate) fn publish(ctx: &mut Ctx<'_>, client: &mut Client, state: CsState) {
    client.last_published_cs = Some(state);
    ctx.publisher.publish(client.mac, state);
}

/// Start (or restart) a client-steering attempt from the current
/// policy. Home mode without a target band cannot steer anywhere and
/// falls back to plain band steering, but the enforcement period still
/// runs so the controller gets its expiry.
pub(crate) fn trigger(ctx: &mut Ctx<'_>, client: &mut Client) {
    let cs = &client.policy.cs;
    let steerable = cs.mode == CsMode::Away || (cs.mode == CsMode::Home && cs.band.is_some());

    if steerable {
        let already_active = matches!(client.mode, ClientMode::ClientSteering(CsPhase::Steering));
        if !already_active {
            for ifname in scope_ifnames(client) {
                ctx.sink
                    .report(client.mac, &ifname, SteeringEvent::ClientSteeringStarted);
            }
        }
        client.mode = ClientMode::ClientSteering(CsPhase::Steering);
        client.num_rejects = 0;
        publish(ctx, client, CsState::Steering);
        info!(mac = %client.mac, mode = %client.policy.cs.mode, "client steering triggered");
    } else {
        info!(mac = %client.mac, "client steering has no target, band steering stays");
        client.mode = ClientMode::BandSteering;
    }

    let enforce = u64::from(client.policy.cs.enforce_period_secs);
    client.timers.arm(
        ctx.sched,
        client.mac,
        TimerKind::CsEnforce,
        Duration::from_secs(enforce),
    );
}

/// Tear the attempt down, publish its final state, and restore
/// band-steering thresholds.
pub(crate) fn disable(ctx: &mut Ctx<'_>, client: &mut Client, last: CsState) {
    client.timers.cancel(ctx.sched, TimerKind::CsEnforce);
    client.timers.cancel(ctx.sched, TimerKind::CsHysteresis);
    publish(ctx, client, last);
    client.mode = ClientMode::BandSteering;
    super::apply_logged(ctx, client);
}

pub(crate) fn on_enforce_timer(ctx: &mut Ctx<'_>, client: &mut Client) {
    if !client.is_client_steering() {
        return;
    }
    info!(mac = %client.mac, "client steering enforcement period complete");
    btm::cancel(ctx, client);
    let scope = scope_ifnames(client);
    disable(ctx, client, CsState::Expired);
    for ifname in scope {
        ctx.sink
            .report(client.mac, &ifname, SteeringEvent::ClientSteeringExpired);
    }
}

/// Probe-driven crossing detection for Away mode, where the client is
/// blocked everywhere and probes are the only signal source. A
/// crossing arms the hysteresis timer; returning in range cancels it.
pub(crate) fn check_probe_xing(ctx: &mut Ctx<'_>, client: &mut Client, snr: u8) {
    let Some(phase) = client.cs_phase() else {
        return;
    };
    if client.policy.cs.mode != CsMode::Away || snr < ROGUE_SNR_LEVEL {
        return;
    }

    let cs = &client.policy.cs;
    let side = if cs.hwm != 0 && snr > cs.hwm {
        Some(CsPhase::XingHigh)
    } else if cs.lwm != 0 && snr < cs.lwm {
        Some(CsPhase::XingLow)
    } else {
        None
    };

    match side {
        None => {
            // Back in range before the hysteresis elapsed.
            client.timers.cancel(ctx.sched, TimerKind::CsHysteresis);
        }
        Some(next) => {
            // Only a change of crossing state starts the settle
            // window; a running timer keeps its original deadline.
            if phase == next {
                return;
            }
            debug!(mac = %client.mac, snr, phase = %next, "client steering probe crossing");
            client.mode = ClientMode::ClientSteering(next);
            if !client.timers.is_armed(TimerKind::CsHysteresis) {
                client.timers.arm(
                    ctx.sched,
                    client.mac,
                    TimerKind::CsHysteresis,
                    Duration::from_secs(RSSI_HYSTERESIS_SECS),
                );
            }
        }
    }
}

/// Driver-reported crossing of the client-steering watermarks while
/// the client is connected (Home mode).
pub(crate) fn on_driver_xing(
    ctx: &mut Ctx<'_>,
    client: &mut Client,
    high: bandsteer_bsal::RssiChange,
    low: bandsteer_bsal::RssiChange,
) {
    use bandsteer_bsal::RssiChange::{Higher, Lower};

    let Some(phase) = client.cs_phase() else {
        return;
    };
    let next = if high == Higher && phase != CsPhase::XingHigh {
        CsPhase::XingHigh
    } else if low == Lower && phase != CsPhase::XingLow {
        CsPhase::XingLow
    } else {
        return;
    };

    client.mode = ClientMode::ClientSteering(next);
    if client.policy.cs.auto_disable {
        let scope = scope_ifnames(client);
        disable(ctx, client, CsState::from(next));
        for ifname in scope {
            ctx.sink
                .report(client.mac, &ifname, SteeringEvent::ClientSteeringDisabled);
        }
    } else {
        publish(ctx, client, CsState::from(next));
    }
}

/// Hysteresis expiry: the crossing held for the full settle window.
pub(crate) fn on_hysteresis_timer(ctx: &mut Ctx<'_>, client: &mut Client) {
    if !client.is_client_steering() {
        return;
    }
    if client.policy.cs.auto_disable {
        let scope = scope_ifnames(client);
        disable(ctx, client, CsState::XingDisabled);
        for ifname in scope {
            ctx.sink
                .report(client.mac, &ifname, SteeringEvent::ClientSteeringDisabled);
        }
    } else {
        client.mode = ClientMode::ClientSteering(CsPhase::XingDisabled);
        publish(ctx, client, CsState::XingDisabled);
    }
}

/// The client associated while an attempt was active: Home reaching
/// the target band simply expires, anything else is a failure.
pub(crate) fn on_connect(ctx: &mut Ctx<'_>, client: &mut Client, radio: RadioType) {
    if !client.is_client_steering() {
        return;
    }
    match client.policy.cs.mode {
        CsMode::Home => {
            let on_target = client
                .policy
                .cs
                .band
                .is_some_and(|band| band_matches(radio, band));
            let outcome = if on_target {
                CsPhase::Expired
            } else {
                CsPhase::Failed
            };
            client.mode = ClientMode::ClientSteering(outcome);
            publish(ctx, client, CsState::from(outcome));
        }
        CsMode::Away => {
            client.mode = ClientMode::ClientSteering(CsPhase::Failed);
            publish(ctx, client, CsState::Failed);
            for ifname in scope_ifnames(client) {
                ctx.sink
                    .report(client.mac, &ifname, SteeringEvent::ClientSteeringFailed);
            }
        }
        CsMode::Off => {}
    }
}
