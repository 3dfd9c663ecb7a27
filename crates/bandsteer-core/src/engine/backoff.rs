// ── Pre-association backoff ──
//
// After enough rejects the client clearly cannot reach its preferred
// band; blocking is lifted for an exponentially growing period so it
// can at least get online.

use std::time::Duration;

use tracing::{debug, info};

use crate::model::{Client, ClientState};
use crate::sched::TimerKind;
use crate::telemetry::SteeringEvent;

use super::{state, Ctx};

pub(crate) fn enable(ctx: &mut Ctx<'_>, client: &mut Client) {
    if client.state == ClientState::Backoff {
        return;
    }
    state::change(ctx, client, ClientState::Backoff, false);

    client.backoff.connect_calculated = false;
    let delay = client.backoff_delay_secs();
    client.backoff.period_used_secs = delay;

    super::apply_logged(ctx, client);
    client.timers.arm(
        ctx.sched,
        client.mac,
        TimerKind::Backoff,
        Duration::from_secs(delay),
    );
    info!(mac = %client.mac, period_secs = delay, "backoff enabled");
    emit_events(ctx, client, true);
}

/// Clear the reject window and restore blocking. While backoff is
/// running this is a no-op; its timer owns the exit. With no rejects
/// accumulated there is nothing to restore either.
pub(crate) fn disable(ctx: &mut Ctx<'_>, client: &mut Client) {
    if client.state == ClientState::Backoff {
        debug!(mac = %client.mac, "backoff active, disable deferred to its timer");
        return;
    }
    if client.num_rejects == 0 {
        return;
    }
    client.num_rejects = 0;
    client.timers.cancel(ctx.sched, TimerKind::Backoff);
    super::apply_logged(ctx, client);
}

pub(crate) fn on_timer(ctx: &mut Ctx<'_>, client: &mut Client) {
    if client.state != ClientState::Backoff {
        return;
    }
    info!(mac = %client.mac, "backoff period complete");
    let next = if client.connected_ifname.is_some() {
        ClientState::Connected
    } else {
        ClientState::Disconnected
    };
    state::change(ctx, client, next, true);
    disable(ctx, client);
    emit_events(ctx, client, false);
}

/// Track how often the client lands on a blocked band straight out of
/// backoff, which drives the exponential delay.
pub(crate) fn note_connect(client: &mut Client, connected_allowed: bool) {
    if client.state != ClientState::Backoff {
        return;
    }
    if connected_allowed {
        client.backoff.connect_counter = 0;
        client.backoff.connect_calculated = false;
    } else if !client.backoff.connect_calculated {
        client.backoff.connect_counter += 1;
        client.backoff.connect_calculated = true;
    }
}

pub(crate) fn emit_events(ctx: &mut Ctx<'_>, client: &Client, enabled: bool) {
    let period_secs = u32::try_from(client.backoff.period_used_secs).unwrap_or(u32::MAX);
    for ifname in state::disallowed_ifnames(client) {
        ctx.sink.report(
            client.mac,
            &ifname,
            SteeringEvent::Backoff {
                enabled,
                period_secs,
            },
        );
    }
}
