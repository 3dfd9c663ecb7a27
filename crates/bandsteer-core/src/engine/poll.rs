// ── Periodic RSSI/activity sweep ──
//
// Once per poll interval every connected client is sampled from the
// driver. Byte-counter deltas drive the activity flag for drivers
// without native activity events, and SNR movement is compared against
// the applied thresholds to synthesize crossings the driver did not
// deliver itself.

use bandsteer_bsal::{ClientInfo, RssiChange};
use tracing::warn;

use crate::model::{Client, KickSource, XING_RETRIGGER_DELTA};
use crate::store::ClientStore;
use crate::telemetry::SteeringEvent;

use super::kick::KickQueue;
use super::{events, kick, Ctx};

pub(crate) fn run(ctx: &mut Ctx<'_>, clients: &mut ClientStore, kicks: &mut KickQueue) {
    for mac in clients.macs() {
        let Some(client) = clients.get_mut(mac) else {
            continue;
        };
        let Some(ifname) = client.connected_ifname.clone() else {
            continue;
        };
        let info = match ctx.bsal.client_info(&ifname, mac) {
            Ok(info) => info,
            Err(err) => {
                warn!(%mac, ifname, %err, "client info poll failed");
                continue;
            }
        };
        if !info.connected {
            // The disconnect event owns the teardown; skip this round.
            continue;
        }
        let now = ctx.clock.now();

        // Activity from byte-counter deltas.
        let prev_info = client
            .iface(&ifname)
            .map_or_else(ClientInfo::default, |s| s.info);
        if let Some(sampled_at) = client.times.bytes_report {
            let elapsed = (now - sampled_at).num_seconds();
            if elapsed > 0 {
                let prev_bytes = prev_info.tx_bytes.saturating_add(prev_info.rx_bytes);
                let cur_bytes = info.tx_bytes.saturating_add(info.rx_bytes);
                let bps = cur_bytes
                    .saturating_sub(prev_bytes)
                    .saturating_mul(8)
                    .checked_div(u64::try_from(elapsed).unwrap_or(1))
                    .unwrap_or(0);
                let active = bps >= client.policy.active_threshold_bps;
                if active != client.is_active {
                    client.is_active = active;
                    client.times.last_activity_change = Some(now);
                    ctx.sink
                        .report(mac, &ifname, SteeringEvent::ActivityChange { active });
                    if !active {
                        if let Some(pending) = client.pending_kick.take() {
                            kick::request(ctx, kicks, client, pending.source, pending.snr);
                        }
                    }
                }
            }
        }
        client.times.bytes_report = Some(now);
        let applied = client.iface(&ifname).and_then(|s| s.applied);
        if let Some(slot) = client.iface_mut(&ifname) {
            slot.info = info;
        }

        // Crossing synthesis against the applied thresholds.
        let Some(applied) = applied else {
            continue;
        };
        let prev_snr = client.prev_xing_snr;
        let snr = info.snr;
        if prev_snr == 0 {
            client.prev_xing_snr = snr;
            continue;
        }
        if snr.abs_diff(prev_snr) < XING_RETRIGGER_DELTA {
            continue;
        }
        let high = crossing(prev_snr, snr, applied.rssi_high_xing);
        let low = crossing(prev_snr, snr, applied.rssi_low_xing);
        if high == RssiChange::Unchanged && low == RssiChange::Unchanged {
            client.prev_xing_snr = snr;
            continue;
        }
        events::on_xing(ctx, kicks, client, &ifname, snr, high, low);
    }
    kick::pump(ctx, clients, kicks);
}

/// Direction of movement across one threshold, if any. Disarmed
/// thresholds (zero) never cross.
fn crossing(prev: u8, cur: u8, threshold: u8) -> RssiChange {
    if threshold == 0 {
        return RssiChange::Unchanged;
    }
    if prev <= threshold && cur > threshold {
        RssiChange::Higher
    } else if prev >= threshold && cur < threshold {
        RssiChange::Lower
    } else {
        RssiChange::Unchanged
    }
}

/// Sticky crossing timer expiry: the low crossing held, hand the kick
/// to the queue with the SNR seen at the crossing.
pub(crate) fn on_sticky_timer(ctx: &mut Ctx<'_>, kicks: &mut KickQueue, client: &mut Client) {
    let Some(snr) = client.sticky_snr.take() else {
        return;
    };
    if client.connected_ifname.is_none() {
        return;
    }
    kick::request(ctx, kicks, client, KickSource::Sticky, snr);
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn crossing_requires_an_armed_threshold() {
        assert_eq!(crossing(10, 50, 0), RssiChange::Unchanged);
        assert_eq!(crossing(10, 50, 30), RssiChange::Higher);
        assert_eq!(crossing(50, 10, 30), RssiChange::Lower);
        assert_eq!(crossing(35, 45, 30), RssiChange::Unchanged);
    }
}
