// ── Client store ──

use std::collections::{btree_map, BTreeMap, HashMap};

use bandsteer_bsal::MacAddress;

use crate::model::{Client, RowId};

/// Keyed collection of client records: primary key MAC, secondary
/// index by config-row id.
#[derive(Debug, Default)]
pub struct ClientStore {
    by_mac: BTreeMap<MacAddress, Client>,
    by_row: HashMap<RowId, MacAddress>,
}

impl ClientStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a client. Replacement re-indexes the row id.
    pub fn insert(&mut self, client: Client) {
        if let Some(prev) = self.by_mac.get(&client.mac) {
            self.by_row.remove(&prev.row_id);
        }
        self.by_row.insert(client.row_id, client.mac);
        self.by_mac.insert(client.mac, client);
    }

    pub fn remove(&mut self, mac: MacAddress) -> Option<Client> {
        let client = self.by_mac.remove(&mac)?;
        self.by_row.remove(&client.row_id);
        Some(client)
    }

    pub fn get(&self, mac: MacAddress) -> Option<&Client> {
        self.by_mac.get(&mac)
    }

    pub fn get_mut(&mut self, mac: MacAddress) -> Option<&mut Client> {
        self.by_mac.get_mut(&mac)
    }

    pub fn mac_for_row(&self, row: RowId) -> Option<MacAddress> {
        self.by_row.get(&row).copied()
    }

    pub fn by_row(&self, row: RowId) -> Option<&Client> {
        self.mac_for_row(row).and_then(|mac| self.get(mac))
    }

    pub fn macs(&self) -> Vec<MacAddress> {
        self.by_mac.keys().copied().collect()
    }

    pub fn iter(&self) -> btree_map::Values<'_, MacAddress, Client> {
        self.by_mac.values()
    }

    pub fn iter_mut(&mut self) -> btree_map::ValuesMut<'_, MacAddress, Client> {
        self.by_mac.values_mut()
    }

    pub fn len(&self) -> usize {
        self.by_mac.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_mac.is_empty()
    }
}

impl<'a> IntoIterator for &'a ClientStore {
    type Item = &'a Client;
    type IntoIter = btree_map::Values<'a, MacAddress, Client>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'a> IntoIterator for &'a mut ClientStore {
    type Item = &'a mut Client;
    type IntoIter = btree_map::ValuesMut<'a, MacAddress, Client>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter_mut()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;
    use uuid::Uuid;

    use super::*;
    use crate::model::ClientPolicy;

    fn client(mac_last: u8, row: u128) -> Client {
        Client::new(
            MacAddress::new([0, 0, 0, 0, 0, mac_last]),
            RowId(Uuid::from_u128(row)),
            ClientPolicy::default(),
        )
    }

    #[test]
    fn row_index_tracks_inserts_and_removals() {
        let mut store = ClientStore::new();
        store.insert(client(1, 10));
        store.insert(client(2, 20));

        assert_eq!(store.len(), 2);
        assert_eq!(
            store.mac_for_row(RowId(Uuid::from_u128(20))),
            Some(MacAddress::new([0, 0, 0, 0, 0, 2]))
        );

        store.remove(MacAddress::new([0, 0, 0, 0, 0, 2])).unwrap();
        assert_eq!(store.mac_for_row(RowId(Uuid::from_u128(20))), None);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn reinsert_reindexes_the_row_id() {
        let mut store = ClientStore::new();
        store.insert(client(1, 10));
        store.insert(client(1, 11));

        assert_eq!(store.mac_for_row(RowId(Uuid::from_u128(10))), None);
        assert!(store.by_row(RowId(Uuid::from_u128(11))).is_some());
        assert_eq!(store.len(), 1);
    }
}
