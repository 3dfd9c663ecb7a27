// ── Client-steering state write-back ──

use bandsteer_bsal::MacAddress;

use crate::model::CsState;

/// Narrow write-back surface to the config-sync layer: the engine
/// publishes only the client-steering state column, nothing else.
pub trait CsStatePublisher {
    fn publish(&mut self, mac: MacAddress, state: CsState);
}
