// ── Engine error types ──

use bandsteer_bsal::{BsalError, MacAddress, MacParseError};

/// Errors surfaced by the steering engine.
///
/// Configuration errors reject the offending row wholesale and leave
/// the previous client state untouched. Adapter errors are
/// per-interface partial failures; the engine keeps processing the
/// remaining interfaces and reports the shortfall to the caller.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// A config row field failed validation.
    #[error("invalid config field '{field}': {detail}")]
    Config { field: &'static str, detail: String },

    /// A config row carried an unknown enumerated value.
    #[error("unknown value '{value}' for config field '{field}'")]
    UnknownValue { field: &'static str, value: String },

    /// A bounded per-client table is full.
    #[error("{what} capacity of {capacity} exceeded")]
    CapacityExceeded { what: &'static str, capacity: usize },

    /// No per-interface slot exists for this client and interface.
    #[error("client {mac} has no slot for interface '{ifname}'")]
    MissingSlot { mac: MacAddress, ifname: String },

    /// Client not present in the store.
    #[error("unknown client {mac}")]
    UnknownClient { mac: MacAddress },

    /// Config row id not present in the store.
    #[error("no client for config row {0}")]
    UnknownRow(crate::model::RowId),

    /// Interface not known to the topology provider.
    #[error("unknown interface '{0}'")]
    UnknownInterface(String),

    /// Some interfaces could not be programmed; the rest were.
    #[error("{failed} interface(s) failed to apply thresholds")]
    PartialApply { failed: usize },

    #[error("MAC address: {0}")]
    Mac(#[from] MacParseError),

    #[error("driver adapter: {0}")]
    Adapter(#[from] BsalError),
}
