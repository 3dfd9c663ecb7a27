// ── Radio topology provider ──
//
// The host owns the real interface/group registry; the engine only
// asks questions of it. Clients reference groups by id, never by
// pointer, so group teardown can't leave anything dangling.

use bandsteer_bsal::RadioType;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identifier of one steering group (a set of co-located
/// interfaces steered against each other).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct GroupId(pub Uuid);

impl GroupId {
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }
}

impl std::fmt::Display for GroupId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// One interface of a group, as the topology reports it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IfaceInfo {
    pub ifname: String,
    pub radio_type: RadioType,
    /// Whether band steering may block clients on this interface.
    pub bs_allowed: bool,
    pub channel: u8,
}

/// Read-only view of the radio/group registry.
pub trait Topology {
    fn radio_type_for(&self, ifname: &str) -> Option<RadioType>;
    fn group_ids(&self) -> Vec<GroupId>;
    fn group_ifaces(&self, group: GroupId) -> &[IfaceInfo];
    /// Whether the group currently allows steering clients toward this
    /// radio type (some interface of that type accepts steered clients).
    fn group_allows(&self, group: GroupId, radio_type: RadioType) -> bool;
    /// Whether every non-2.4 GHz interface of the group sits on a DFS
    /// channel.
    fn group_is_dfs_only(&self, group: GroupId) -> bool;
    fn group_is_gateway_only(&self, group: GroupId) -> bool;
    fn group_for_ifname(&self, ifname: &str) -> Option<GroupId>;
}

/// 5 GHz channels subject to DFS radar-detection rules (ETSI/FCC
/// overlap set).
pub fn is_dfs_channel(channel: u8) -> bool {
    matches!(
        channel,
        52 | 56 | 60 | 64 | 100 | 104 | 108 | 112 | 116 | 120 | 124 | 128 | 132 | 136 | 140
    )
}

// ── StaticTopology ──────────────────────────────────────────────────

/// A fixed in-memory topology, for hosts with a static radio layout
/// and for tests.
#[derive(Debug, Clone, Default)]
pub struct StaticTopology {
    groups: Vec<StaticGroup>,
}

#[derive(Debug, Clone)]
struct StaticGroup {
    id: GroupId,
    ifaces: Vec<IfaceInfo>,
    gateway_only: bool,
}

impl StaticTopology {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a group. Returns its id for later lookups.
    pub fn add_group(&mut self, ifaces: Vec<IfaceInfo>, gateway_only: bool) -> GroupId {
        let id = GroupId::random();
        self.groups.push(StaticGroup {
            id,
            ifaces,
            gateway_only,
        });
        id
    }

    fn group(&self, id: GroupId) -> Option<&StaticGroup> {
        self.groups.iter().find(|g| g.id == id)
    }
}

impl Topology for StaticTopology {
    fn radio_type_for(&self, ifname: &str) -> Option<RadioType> {
        self.groups
            .iter()
            .flat_map(|g| g.ifaces.iter())
            .find(|i| i.ifname == ifname)
            .map(|i| i.radio_type)
    }

    fn group_ids(&self) -> Vec<GroupId> {
        self.groups.iter().map(|g| g.id).collect()
    }

    fn group_ifaces(&self, group: GroupId) -> &[IfaceInfo] {
        self.group(group).map_or(&[], |g| &g.ifaces)
    }

    fn group_allows(&self, group: GroupId, radio_type: RadioType) -> bool {
        self.group_ifaces(group)
            .iter()
            .any(|i| i.radio_type == radio_type && i.bs_allowed)
    }

    fn group_is_dfs_only(&self, group: GroupId) -> bool {
        let ifaces = self.group_ifaces(group);
        let mut non_2g = ifaces
            .iter()
            .filter(|i| i.radio_type != RadioType::Radio2G)
            .peekable();
        non_2g.peek().is_some() && non_2g.all(|i| is_dfs_channel(i.channel))
    }

    fn group_is_gateway_only(&self, group: GroupId) -> bool {
        self.group(group).is_some_and(|g| g.gateway_only)
    }

    fn group_for_ifname(&self, ifname: &str) -> Option<GroupId> {
        self.groups
            .iter()
            .find(|g| g.ifaces.iter().any(|i| i.ifname == ifname))
            .map(|g| g.id)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn iface(name: &str, radio: RadioType, allowed: bool, channel: u8) -> IfaceInfo {
        IfaceInfo {
            ifname: name.to_owned(),
            radio_type: radio,
            bs_allowed: allowed,
            channel,
        }
    }

    #[test]
    fn dfs_channel_set_matches_etsi_fcc_overlap() {
        assert!(is_dfs_channel(52));
        assert!(is_dfs_channel(140));
        assert!(!is_dfs_channel(36));
        assert!(!is_dfs_channel(149));
    }

    #[test]
    fn group_allows_requires_a_steerable_interface_of_that_type() {
        let mut topo = StaticTopology::new();
        let g = topo.add_group(
            vec![
                iface("wl0", RadioType::Radio2G, false, 6),
                iface("wl1", RadioType::Radio5G, true, 36),
            ],
            false,
        );

        assert!(topo.group_allows(g, RadioType::Radio5G));
        assert!(!topo.group_allows(g, RadioType::Radio2G));
    }

    #[test]
    fn dfs_only_reflects_the_5g_channel_plan() {
        let mut topo = StaticTopology::new();
        let dfs = topo.add_group(
            vec![
                iface("wl0", RadioType::Radio2G, false, 1),
                iface("wl1", RadioType::Radio5G, true, 100),
            ],
            false,
        );
        let clear = topo.add_group(
            vec![
                iface("wl2", RadioType::Radio2G, false, 11),
                iface("wl3", RadioType::Radio5G, true, 36),
            ],
            false,
        );

        assert!(topo.group_is_dfs_only(dfs));
        assert!(!topo.group_is_dfs_only(clear));
    }

    #[test]
    fn ifname_lookups_cross_groups() {
        let mut topo = StaticTopology::new();
        let a = topo.add_group(vec![iface("wl0", RadioType::Radio2G, false, 6)], false);
        let b = topo.add_group(vec![iface("wl1", RadioType::Radio5G, true, 36)], true);

        assert_eq!(topo.group_for_ifname("wl1"), Some(b));
        assert_eq!(topo.radio_type_for("wl0"), Some(RadioType::Radio2G));
        assert_eq!(topo.group_for_ifname("wl9"), None);
        assert!(topo.group_is_gateway_only(b));
        assert_eq!(topo.group_ids(), vec![a, b]);
    }
}
