//! Per-client Wi-Fi steering decision engine.
//!
//! The engine decides, for every known wireless client and every radio
//! interface it can see, whether probe/auth requests should be blocked
//! (band steering via RSSI watermarks) and when to actively move a
//! client with 802.11v BTM or 802.11k beacon requests (client
//! steering). It is a single-threaded control loop driven entirely by
//! its host: config rows arrive through [`Engine::on_config_row`],
//! driver telemetry through [`Engine::on_event`], timer expirations
//! through [`Engine::on_timer`], and a periodic RSSI/activity sweep
//! through [`Engine::on_periodic_rssi_poll`].
//!
//! All I/O lives behind collaborator traits the host implements:
//!
//! - [`Scheduler`] — deferred timers, keyed by `(client, TimerKind)`.
//! - [`Topology`] — interface/group registry (bands, DFS, gateway).
//! - [`bandsteer_bsal::BsalAdapter`] — the radio driver boundary.
//! - [`EventSink`] — discrete steering telemetry events.
//! - [`CsStatePublisher`] — client-steering state write-back.
//! - [`Clock`] — wall time, swappable in tests.

pub mod clock;
pub mod config;
pub mod engine;
pub mod error;
pub mod model;
pub mod publish;
pub mod sched;
pub mod store;
pub mod telemetry;
pub mod topology;

#[cfg(test)]
pub(crate) mod test_support;

pub use clock::{Clock, SystemClock};
pub use config::{ClientRow, RowUpdate};
pub use engine::{Engine, EngineConfig};
pub use error::CoreError;
pub use model::{
    Client, ClientMode, ClientState, CsMode, CsPhase, CsState, KickType, PrefAllowed,
    RejectDetection, RowId,
};
pub use publish::CsStatePublisher;
pub use sched::{Scheduler, TimerHandle, TimerKey, TimerKind};
pub use store::ClientStore;
pub use telemetry::{EventSink, SteeringEvent};
pub use topology::{GroupId, IfaceInfo, StaticTopology, Topology};

pub use bandsteer_bsal as bsal;
