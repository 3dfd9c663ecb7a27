// ── Threshold translator ──
//
// Pure functions from (policy, state, mode, interface) to the blocking
// configuration pushed to the driver. No side effects; the caller owns
// applying the result and remembering what was applied.

use bandsteer_bsal::{ClientThresholds, RadioType};

use crate::model::{
    is_kick_sentinel, ClientMode, ClientPolicy, ClientState, CsMode, MAX_LWM, MIN_HWM,
    PrefAllowed,
};

/// The per-interface facts the translator needs, resolved from the
/// topology at call time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct IfaceView {
    pub radio_type: RadioType,
    /// Whether the group currently allows steering clients toward this
    /// radio type.
    pub bs_allowed: bool,
    /// Every steerable channel of the group is DFS.
    pub dfs_only: bool,
    pub gateway_only: bool,
}

/// Whether an interface's band satisfies a target band. A plain 5G
/// target accepts either half of a split 5 GHz radio.
pub(crate) fn band_matches(iface: RadioType, target: RadioType) -> bool {
    iface == target || (target == RadioType::Radio5G && iface.is_5g())
}

/// Compute the thresholds for one interface under the client's current
/// rule set. Client steering, while active, fully displaces the
/// band-steering watermarks.
pub(crate) fn thresholds(
    policy: &ClientPolicy,
    state: ClientState,
    mode: ClientMode,
    view: IfaceView,
) -> ClientThresholds {
    match mode {
        ClientMode::ClientSteering(_) => client_steering(policy, view),
        ClientMode::BandSteering => band_steering(policy, state, view),
    }
}

fn band_steering(policy: &ClientPolicy, state: ClientState, view: IfaceView) -> ClientThresholds {
    let mut t = ClientThresholds::default();

    // The low crossing stays armed on every interface so sticky drops
    // are seen wherever the client lands. Gateway-only groups have
    // nowhere better to push a weak client, so it is disarmed there.
    t.rssi_low_xing = if view.gateway_only || is_kick_sentinel(policy.lwm) {
        0
    } else {
        policy.lwm
    };

    if !view.bs_allowed && state != ClientState::Backoff {
        t.rssi_probe_hwm = match policy.pref_allowed {
            PrefAllowed::Always => MIN_HWM,
            PrefAllowed::Hwm => policy.hwm,
            PrefAllowed::NonDfs => {
                if view.dfs_only {
                    0
                } else {
                    MIN_HWM
                }
            }
            PrefAllowed::Never => 0,
        };
        t.rssi_probe_lwm = match policy.pref_allowed {
            PrefAllowed::Hwm => t.rssi_low_xing,
            PrefAllowed::NonDfs if !view.dfs_only => t.rssi_low_xing,
            _ => 0,
        };
        t.rssi_high_xing = policy.hwm;
        if policy.pre_assoc_auth_block {
            t.rssi_auth_hwm = t.rssi_probe_hwm;
            t.rssi_auth_lwm = t.rssi_probe_lwm;
        }
    } else if state == ClientState::Backoff && policy.steer_during_backoff {
        // Blocking is relaxed, but keep the high crossing armed so a
        // backoff-originated steering opportunity is still observed.
        t.rssi_high_xing = policy.hwm;
    }

    t
}

fn client_steering(policy: &ClientPolicy, view: IfaceView) -> ClientThresholds {
    let cs = &policy.cs;
    let mut t = ClientThresholds {
        auth_reject_reason: cs.auth_reject_reason,
        ..ClientThresholds::default()
    };

    if cs.mode == CsMode::Away {
        // Away blocks everywhere; no crossing detection is needed once
        // the client can never associate.
        if cs.probe_block {
            t.rssi_probe_hwm = MIN_HWM;
            t.rssi_probe_lwm = MAX_LWM;
        }
        if cs.auth_block {
            t.rssi_auth_hwm = MIN_HWM;
            t.rssi_auth_lwm = MAX_LWM;
        }
    } else {
        let block = cs
            .band
            .is_some_and(|target| !band_matches(view.radio_type, target));
        if block {
            t.rssi_probe_hwm = MIN_HWM;
            t.rssi_probe_lwm = MAX_LWM;
            t.rssi_auth_hwm = MIN_HWM;
            t.rssi_auth_lwm = MAX_LWM;
        } else {
            t.rssi_high_xing = cs.hwm;
            t.rssi_low_xing = cs.lwm;
        }
    }

    t
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::model::{CsPhase, KICK_SENTINEL_LWM};

    fn view_24g_disallowed() -> IfaceView {
        IfaceView {
            radio_type: RadioType::Radio2G,
            bs_allowed: false,
            dfs_only: false,
            gateway_only: false,
        }
    }

    fn view_5g_allowed() -> IfaceView {
        IfaceView {
            radio_type: RadioType::Radio5G,
            bs_allowed: true,
            dfs_only: false,
            gateway_only: false,
        }
    }

    fn policy(high: u8, low: u8, pref: PrefAllowed) -> ClientPolicy {
        ClientPolicy {
            hwm: high,
            lwm: low,
            pref_allowed: pref,
            ..ClientPolicy::default()
        }
    }

    #[test]
    fn disallowed_interface_blocks_on_configured_watermarks() {
        // hwm=40 / lwm=30 / pref=hwm on a blocked 2.4 GHz interface.
        let p = policy(40, 30, PrefAllowed::Hwm);
        let t = thresholds(
            &p,
            ClientState::Disconnected,
            ClientMode::BandSteering,
            view_24g_disallowed(),
        );

        assert_eq!(t.rssi_probe_hwm, 40);
        assert_eq!(t.rssi_probe_lwm, 30);
        assert_eq!(t.rssi_high_xing, 40);
        assert_eq!(t.rssi_low_xing, 30);
        assert!(!t.blacklist);
        assert_eq!(t.rssi_auth_hwm, 0);
    }

    #[test]
    fn translator_is_a_pure_function() {
        let p = policy(40, 30, PrefAllowed::Hwm);
        let a = thresholds(
            &p,
            ClientState::Connected,
            ClientMode::BandSteering,
            view_24g_disallowed(),
        );
        let b = thresholds(
            &p,
            ClientState::Connected,
            ClientMode::BandSteering,
            view_24g_disallowed(),
        );
        assert_eq!(a, b);
    }

    #[test]
    fn pref_always_pins_the_probe_hwm_to_minimum() {
        let p = policy(40, 30, PrefAllowed::Always);
        let t = thresholds(
            &p,
            ClientState::Disconnected,
            ClientMode::BandSteering,
            view_24g_disallowed(),
        );
        assert_eq!(t.rssi_probe_hwm, MIN_HWM);
        assert_eq!(t.rssi_probe_lwm, 0);
    }

    #[test]
    fn pref_never_leaves_probes_unblocked() {
        let p = policy(40, 30, PrefAllowed::Never);
        let t = thresholds(
            &p,
            ClientState::Disconnected,
            ClientMode::BandSteering,
            view_24g_disallowed(),
        );
        assert_eq!(t.rssi_probe_hwm, 0);
        assert_eq!(t.rssi_probe_lwm, 0);
        // Crossings stay armed even without blocking.
        assert_eq!(t.rssi_high_xing, 40);
    }

    #[test]
    fn non_dfs_pref_yields_on_dfs_only_groups() {
        let p = policy(40, 30, PrefAllowed::NonDfs);
        let dfs = IfaceView {
            dfs_only: true,
            ..view_24g_disallowed()
        };
        let t = thresholds(&p, ClientState::Disconnected, ClientMode::BandSteering, dfs);
        assert_eq!(t.rssi_probe_hwm, 0);
        assert_eq!(t.rssi_probe_lwm, 0);

        let clear = view_24g_disallowed();
        let t = thresholds(&p, ClientState::Disconnected, ClientMode::BandSteering, clear);
        assert_eq!(t.rssi_probe_hwm, MIN_HWM);
        assert_eq!(t.rssi_probe_lwm, 30);
    }

    #[test]
    fn auth_block_mirrors_probe_watermarks_when_enabled() {
        let mut p = policy(40, 30, PrefAllowed::Hwm);
        p.pre_assoc_auth_block = true;
        let t = thresholds(
            &p,
            ClientState::Disconnected,
            ClientMode::BandSteering,
            view_24g_disallowed(),
        );
        assert_eq!(t.rssi_auth_hwm, 40);
        assert_eq!(t.rssi_auth_lwm, 30);
    }

    #[test]
    fn backoff_relaxes_blocking_but_can_keep_the_high_crossing() {
        let mut p = policy(40, 30, PrefAllowed::Hwm);
        let t = thresholds(
            &p,
            ClientState::Backoff,
            ClientMode::BandSteering,
            view_24g_disallowed(),
        );
        assert_eq!(t.rssi_probe_hwm, 0);
        assert_eq!(t.rssi_high_xing, 0);

        p.steer_during_backoff = true;
        let t = thresholds(
            &p,
            ClientState::Backoff,
            ClientMode::BandSteering,
            view_24g_disallowed(),
        );
        assert_eq!(t.rssi_probe_hwm, 0);
        assert_eq!(t.rssi_high_xing, 40);
    }

    #[test]
    fn kick_sentinel_lwm_disarms_the_low_crossing() {
        let p = policy(40, KICK_SENTINEL_LWM, PrefAllowed::Hwm);
        let t = thresholds(
            &p,
            ClientState::Disconnected,
            ClientMode::BandSteering,
            view_24g_disallowed(),
        );
        assert_eq!(t.rssi_low_xing, 0);
        assert_eq!(t.rssi_probe_lwm, 0);
    }

    #[test]
    fn gateway_only_group_disarms_the_low_crossing() {
        let p = policy(40, 30, PrefAllowed::Hwm);
        let gw = IfaceView {
            gateway_only: true,
            ..view_5g_allowed()
        };
        let t = thresholds(&p, ClientState::Connected, ClientMode::BandSteering, gw);
        assert_eq!(t.rssi_low_xing, 0);
    }

    #[test]
    fn client_steering_displaces_band_steering_entirely() {
        // Band-steering watermarks set, but an active client-steering
        // attempt must route through the client-steering rules.
        let mut p = policy(40, 30, PrefAllowed::Hwm);
        p.cs.mode = CsMode::Away;
        p.cs.probe_block = true;

        let t = thresholds(
            &p,
            ClientState::Disconnected,
            ClientMode::ClientSteering(CsPhase::Steering),
            view_24g_disallowed(),
        );
        assert_eq!(t.rssi_probe_hwm, MIN_HWM);
        assert_eq!(t.rssi_probe_lwm, MAX_LWM);
        assert_eq!(t.rssi_high_xing, 0);
        assert_eq!(t.rssi_low_xing, 0);
    }

    #[test]
    fn away_mode_without_block_flags_blocks_nothing() {
        let mut p = policy(0, 0, PrefAllowed::Never);
        p.cs.mode = CsMode::Away;
        let t = thresholds(
            &p,
            ClientState::Disconnected,
            ClientMode::ClientSteering(CsPhase::Steering),
            view_5g_allowed(),
        );
        assert_eq!(t, ClientThresholds::default());
    }

    #[test]
    fn home_mode_blocks_only_non_target_bands() {
        let mut p = policy(0, 0, PrefAllowed::Never);
        p.cs.mode = CsMode::Home;
        p.cs.band = Some(RadioType::Radio5G);
        p.cs.hwm = 50;
        p.cs.lwm = 20;
        let mode = ClientMode::ClientSteering(CsPhase::Steering);

        let off_target = thresholds(&p, ClientState::Disconnected, mode, view_24g_disallowed());
        assert_eq!(off_target.rssi_probe_hwm, MIN_HWM);
        assert_eq!(off_target.rssi_auth_lwm, MAX_LWM);

        let on_target = thresholds(&p, ClientState::Disconnected, mode, view_5g_allowed());
        assert_eq!(on_target.rssi_probe_hwm, 0);
        assert_eq!(on_target.rssi_high_xing, 50);
        assert_eq!(on_target.rssi_low_xing, 20);
    }

    #[test]
    fn home_mode_target_5g_accepts_split_radios() {
        let mut p = policy(0, 0, PrefAllowed::Never);
        p.cs.mode = CsMode::Home;
        p.cs.band = Some(RadioType::Radio5G);
        let mode = ClientMode::ClientSteering(CsPhase::Steering);

        let upper = IfaceView {
            radio_type: RadioType::Radio5GU,
            ..view_5g_allowed()
        };
        let t = thresholds(&p, ClientState::Disconnected, mode, upper);
        assert_eq!(t.rssi_probe_hwm, 0);
    }

    #[test]
    fn cs_auth_reject_reason_flows_through() {
        let mut p = policy(0, 0, PrefAllowed::Never);
        p.cs.mode = CsMode::Away;
        p.cs.auth_block = true;
        p.cs.auth_reject_reason = Some(33);
        let t = thresholds(
            &p,
            ClientState::Disconnected,
            ClientMode::ClientSteering(CsPhase::Steering),
            view_24g_disallowed(),
        );
        assert_eq!(t.auth_reject_reason, Some(33));
    }
}
