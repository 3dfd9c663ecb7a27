// ── BSAL error types ──

use strum::Display;

/// Errors surfaced by a [`BsalAdapter`](crate::BsalAdapter)
/// implementation.
#[derive(Debug, thiserror::Error)]
pub enum BsalError {
    /// The driver does not implement this operation. Callers fall back
    /// to a software path where one exists (e.g. instant RSSI
    /// measurement falls back to the last polled SNR).
    #[error("operation not supported by driver: {0}")]
    Unsupported(&'static str),

    /// The named interface is not known to the driver.
    #[error("unknown interface '{0}'")]
    UnknownInterface(String),

    /// The driver accepted the call but reported a failure.
    #[error("driver error on '{ifname}': {detail}")]
    Driver { ifname: String, detail: String },
}

/// What went wrong while parsing a MAC address string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum MacParseErrorKind {
    #[strum(serialize = "expected 12 hex digits")]
    Length,
    #[strum(serialize = "invalid hex digit")]
    Digit,
}
