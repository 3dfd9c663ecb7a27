// ── Reject accounting ──
//
// A reject is one blocked probe or auth that counts toward the
// client's limit. Hitting the limit fails an active client-steering
// attempt, or starts pre-association backoff, or as a last resort
// disarms the high watermark outright.

use tracing::{debug, info};

use crate::model::{Client, ClientMode, CsPhase, CsState};
use crate::telemetry::SteeringEvent;

use super::{backoff, cs, Ctx};

pub(crate) fn on_reject(ctx: &mut Ctx<'_>, client: &mut Client, ifname: &str, snr: u8) {
    let now = ctx.clock.now();
    let (max_rejects, window_secs) = client.effective_reject_limit();

    // Stale window: restart the count.
    if client.num_rejects > 0 {
        if let Some(first) = client.times.reject_first {
            if (now - first).num_seconds() > i64::from(window_secs) {
                debug!(mac = %client.mac, "reject window elapsed, count reset");
                client.num_rejects = 0;
            }
        }
    }

    client.num_rejects += 1;
    client.num_rejects_copy += 1;
    client.times.reject_last = Some(now);
    if let Some(slot) = client.iface_mut(ifname) {
        slot.stats.rejects += 1;
    }
    debug!(
        mac = %client.mac, ifname, snr,
        count = client.num_rejects, max = max_rejects,
        "steering reject"
    );

    if client.num_rejects == 1 {
        client.times.reject_first = Some(now);
        if matches!(client.mode, ClientMode::ClientSteering(CsPhase::Steering)) {
            ctx.sink
                .report(client.mac, ifname, SteeringEvent::ClientSteeringAttempt);
        }
    }

    if max_rejects == 0 || client.num_rejects != max_rejects {
        return;
    }

    if let Some(slot) = client.iface_mut(ifname) {
        slot.stats.steering_fail_cnt += 1;
    }

    if client.is_client_steering() {
        info!(mac = %client.mac, "client steering failed, reject limit reached");
        client.num_rejects = 0;
        let scope = cs::scope_ifnames(client);
        cs::disable(ctx, client, CsState::Failed);
        for scoped in scope {
            ctx.sink
                .report(client.mac, &scoped, SteeringEvent::ClientSteeringFailed);
        }
    } else if client.policy.backoff_period_secs > 0 {
        backoff::enable(ctx, client);
    } else {
        // No backoff configured: give up on steering this client.
        info!(mac = %client.mac, "reject limit reached, steering disarmed");
        client.policy.hwm = 0;
        super::apply_logged(ctx, client);
    }
}
