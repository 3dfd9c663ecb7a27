// ── Driver adapter trait ──

use crate::error::BsalError;
use crate::params::{BtmRequest, RrmRequest};
use crate::types::{ClientInfo, ClientThresholds, DisconnectType, MacAddress};

/// Host-side driver plumbing the steering engine programs.
///
/// One implementation serves all interfaces; every call names the
/// interface it targets. Implementations are expected to be cheap and
/// non-blocking; long operations (instant RSSI measurement) complete
/// asynchronously via [`BsalEvent`](crate::BsalEvent) delivery.
pub trait BsalAdapter {
    /// Install a client entry with its initial thresholds on one
    /// interface.
    fn add_client(
        &mut self,
        ifname: &str,
        mac: MacAddress,
        thresholds: &ClientThresholds,
    ) -> Result<(), BsalError>;

    /// Replace a client's thresholds on one interface.
    fn update_client(
        &mut self,
        ifname: &str,
        mac: MacAddress,
        thresholds: &ClientThresholds,
    ) -> Result<(), BsalError>;

    /// Remove a client entry from one interface.
    fn remove_client(&mut self, ifname: &str, mac: MacAddress) -> Result<(), BsalError>;

    /// Poll the driver for a client's live state on one interface.
    fn client_info(&mut self, ifname: &str, mac: MacAddress) -> Result<ClientInfo, BsalError>;

    /// Kick a connected client with the given frame type and reason.
    fn disconnect_client(
        &mut self,
        ifname: &str,
        mac: MacAddress,
        kind: DisconnectType,
        reason: u8,
    ) -> Result<(), BsalError>;

    /// Start an instant RSSI measurement. The result arrives later as
    /// an [`RssiMeasurement`](crate::BsalEvent::RssiMeasurement) event.
    /// Drivers without support return [`BsalError::Unsupported`].
    fn measure_rssi(
        &mut self,
        ifname: &str,
        mac: MacAddress,
        num_samples: u8,
    ) -> Result<(), BsalError>;

    /// Transmit a BSS Transition Management request to a client.
    fn send_btm_request(
        &mut self,
        ifname: &str,
        mac: MacAddress,
        request: &BtmRequest,
    ) -> Result<(), BsalError>;

    /// Transmit a beacon measurement request to a client.
    fn send_rrm_request(
        &mut self,
        ifname: &str,
        mac: MacAddress,
        request: &RrmRequest,
    ) -> Result<(), BsalError>;
}
