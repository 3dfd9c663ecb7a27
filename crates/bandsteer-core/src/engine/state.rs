// ── Client state machine ──
//
// Disconnected / Connected / Steering / Backoff. Backoff is sticky:
// only a forced transition leaves it, everything else is dropped.

use std::time::Duration;

use tracing::{debug, info};

use crate::model::{Client, ClientState};
use crate::sched::TimerKind;
use crate::telemetry::SteeringEvent;

use super::{backoff, Ctx};

pub(crate) fn set(ctx: &mut Ctx<'_>, client: &mut Client, new: ClientState) {
    change(ctx, client, new, false);
}

pub(crate) fn change(ctx: &mut Ctx<'_>, client: &mut Client, new: ClientState, force: bool) {
    if !force && client.state == ClientState::Backoff {
        debug!(mac = %client.mac, requested = %new, "state change dropped during backoff");
        return;
    }
    if client.state == new {
        return;
    }

    info!(mac = %client.mac, from = %client.state, to = %new, "client state change");
    let was_steering = client.state == ClientState::Steering;
    client.state = new;
    client.times.last_state_change = Some(ctx.clock.now());

    match new {
        ClientState::Connected => {
            backoff::disable(ctx, client);
            client.is_active = true;
        }
        ClientState::Steering => {
            for ifname in disallowed_ifnames(client) {
                ctx.sink
                    .report(client.mac, &ifname, SteeringEvent::BandSteeringAttempt);
            }
            // Watchdog: a client that never lands anywhere is reset to
            // Disconnected so blocking does not wedge.
            client.timers.arm(
                ctx.sched,
                client.mac,
                TimerKind::State,
                Duration::from_secs(u64::from(ctx.config.stats_report_interval_secs)),
            );
        }
        ClientState::Disconnected | ClientState::Backoff => {
            client.is_active = false;
        }
    }

    if was_steering {
        client.timers.cancel(ctx.sched, TimerKind::State);
    }
}

/// Watchdog expiry for a client stuck mid-steering.
pub(crate) fn on_force_reset(ctx: &mut Ctx<'_>, client: &mut Client) {
    if client.state == ClientState::Steering {
        info!(mac = %client.mac, "steering never completed, resetting");
        change(ctx, client, ClientState::Disconnected, true);
    }
}

pub(crate) fn disallowed_ifnames(client: &Client) -> Vec<String> {
    client
        .ifaces
        .iter()
        .filter(|s| !s.bs_allowed)
        .map(|s| s.ifname.clone())
        .collect()
}
