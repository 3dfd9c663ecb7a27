//! Radio-driver abstraction layer (BSAL) for the bandsteer workspace.
//!
//! This crate is the boundary between the steering engine
//! (`bandsteer-core`) and whatever actually programs the radios. It
//! defines:
//!
//! - **[`ClientThresholds`]** — the per-client, per-interface blocking
//!   configuration the engine computes and pushes down (probe/auth
//!   watermarks, crossing points, blacklist flag).
//! - **[`BsalEvent`]** — telemetry flowing back up from the driver
//!   (probes, connects, disconnects, RSSI crossings, auth failures).
//! - **[`BtmRequest`]** / **[`RrmRequest`]** — 802.11v BSS Transition
//!   Management and 802.11k beacon-measurement frames the engine asks
//!   the driver to transmit.
//! - **[`BsalAdapter`]** — the trait a host implements on top of its
//!   driver plumbing.
//!
//! No I/O happens here; everything is plain data plus one trait.

pub mod adapter;
pub mod error;
pub mod event;
pub mod params;
pub mod types;

pub use adapter::BsalAdapter;
pub use error::{BsalError, MacParseErrorKind};
pub use event::{BsalEvent, RssiChange};
pub use params::{
    BtmParams, BtmRequest, NeighborReport, RrmMeasurementMode, RrmRequest,
    BTM_DEFAULT_BSS_INFO, BTM_DEFAULT_MAX_RETRIES, BTM_DEFAULT_RETRY_INTERVAL_SECS,
    BTM_DEFAULT_VALID_INT, BTM_MAX_NEIGHBORS, RRM_ACTIVE_MEASUREMENT_MS,
    RRM_PASSIVE_MEASUREMENT_MS,
};
pub use types::{
    ClientInfo, ClientThresholds, DisconnectSource, DisconnectType, MacAddress, MacParseError,
    RadioType, RrmCaps,
};
