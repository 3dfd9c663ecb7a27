// ── 802.11v BSS Transition Management ──

use std::time::Duration;

use bandsteer_bsal::{BtmRequest, DisconnectType, NeighborReport, BTM_MAX_NEIGHBORS};
use tracing::{debug, warn};

use crate::model::{BtmConfig, Client, KickSource, KickType};
use crate::model::client::BtmRetryState;
use crate::sched::TimerKind;
use crate::telemetry::SteeringEvent;

use super::Ctx;

/// Assemble a request: the static candidate (if any) heads the list,
/// then the freshest measured neighbors up to the per-frame cap.
pub(crate) fn build_request(ctx: &Ctx<'_>, client: &Client, cfg: &BtmConfig) -> BtmRequest {
    let mut neighbors: Vec<NeighborReport> = Vec::new();
    if let Some(fixed) = cfg.static_neighbor {
        neighbors.push(fixed);
    }
    if cfg.params.inc_neighbors {
        let now = ctx.clock.now();
        for report in client.fresh_neighbors(now) {
            if neighbors.len() >= BTM_MAX_NEIGHBORS {
                break;
            }
            if neighbors.iter().any(|n| n.bssid == report.bssid) {
                continue;
            }
            neighbors.push(report);
        }
    }
    BtmRequest {
        params: cfg.params,
        neighbors,
    }
}

/// Send a BTM request for a kick trigger and arm the retry timer.
pub(crate) fn send(ctx: &mut Ctx<'_>, client: &mut Client, ifname: &str, source: KickSource) -> bool {
    let cfg = *client.policy.btm_for(source);
    let request = build_request(ctx, client, &cfg);
    match ctx.bsal.send_btm_request(ifname, client.mac, &request) {
        Ok(()) => {
            debug!(
                mac = %client.mac, ifname, source = %source,
                neighbors = request.neighbors.len(),
                "btm request sent"
            );
            client.btm_retry = Some(BtmRetryState {
                ifname: ifname.to_owned(),
                source,
                retries_left: cfg.params.max_retries,
            });
            client.timers.arm(
                ctx.sched,
                client.mac,
                TimerKind::BtmRetry,
                Duration::from_secs(u64::from(cfg.params.retry_interval_secs)),
            );
            true
        }
        Err(err) => {
            warn!(mac = %client.mac, ifname, %err, "btm request failed");
            false
        }
    }
}

/// Drop any in-flight request. Fired when the client disconnects,
/// accepts a transition, or moves back in range.
pub(crate) fn cancel(ctx: &mut Ctx<'_>, client: &mut Client) {
    if client.btm_retry.take().is_some() {
        client.timers.cancel(ctx.sched, TimerKind::BtmRetry);
    }
}

pub(crate) fn on_response(ctx: &mut Ctx<'_>, client: &mut Client, ifname: &str, status: u8) {
    ctx.sink
        .report(client.mac, ifname, SteeringEvent::BtmStatus { status });
    // Status 0 means the client accepted the transition.
    if status == 0 {
        cancel(ctx, client);
    }
}

/// Retry expiry: retransmit, or fall back to a hard kick for the
/// btm-then-frame kick types once retries run out.
pub(crate) fn on_retry_timer(ctx: &mut Ctx<'_>, client: &mut Client) {
    let Some(mut retry) = client.btm_retry.take() else {
        return;
    };
    if client.connected_ifname.as_deref() != Some(retry.ifname.as_str()) {
        return;
    }

    if retry.retries_left == 0 {
        let kick = *client.policy.kick_for(retry.source);
        let frame = match kick.kick_type {
            KickType::BtmDisassoc => Some(DisconnectType::Disassoc),
            KickType::BtmDeauth => Some(DisconnectType::Deauth),
            _ => None,
        };
        if let Some(frame) = frame {
            debug!(mac = %client.mac, "btm retries exhausted, forcing disconnect");
            if let Err(err) =
                ctx.bsal
                    .disconnect_client(&retry.ifname, client.mac, frame, kick.reason)
            {
                warn!(mac = %client.mac, %err, "fallback disconnect failed");
            }
        }
        return;
    }

    retry.retries_left -= 1;
    let cfg = *client.policy.btm_for(retry.source);
    let request = build_request(ctx, client, &cfg);
    if let Err(err) = ctx
        .bsal
        .send_btm_request(&retry.ifname, client.mac, &request)
    {
        warn!(mac = %client.mac, %err, "btm retransmission failed");
    }
    client.timers.arm(
        ctx.sched,
        client.mac,
        TimerKind::BtmRetry,
        Duration::from_secs(u64::from(cfg.params.retry_interval_secs)),
    );
    client.btm_retry = Some(retry);
}
