// ── Per-device error taxonomy ──
//
// Every failure inside one device's pipeline collapses into a
// `DeviceError`. The engine logs it and moves on to other devices.

use nxfleet_api::ResultCode;
use thiserror::Error;

use crate::command::Failure;

/// What went wrong for one device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, strum::IntoStaticStr)]
#[strum(serialize_all = "lowercase")]
pub enum ErrorKind {
    /// The inventory has no usable address for the device.
    Resolution,
    /// 401/403 from the switch or the inventory.
    Auth,
    /// Network failure, timeout or 5xx after retries.
    Transport,
    /// Response body was not the expected JSON shape.
    Protocol,
    /// Command-level rejection or unusable data.
    Semantic,
    /// The record could not be written.
    Output,
}

impl ErrorKind {
    pub fn from_result_code(code: ResultCode) -> Self {
        match code {
            c if c.is_auth_failure() => Self::Auth,
            c if c.is_retryable() => Self::Transport,
            ResultCode::ParseError => Self::Protocol,
            _ => Self::Semantic,
        }
    }

    fn from_api(err: &nxfleet_api::Error) -> Self {
        use nxfleet_api::Error as E;
        match err {
            E::DeviceNotFound { .. } | E::MissingPrimaryIp { .. } | E::InvalidAddress { .. } => Self::Resolution,
            E::InventoryAuth { .. } | E::InvalidHeader { .. } => Self::Auth,
            E::Deserialization { .. } => Self::Protocol,
            E::InvalidState { .. } => Self::Semantic,
            E::Transport(_) | E::InvalidUrl(_) | E::Tls(_) | E::Inventory { .. } | E::CookieFile(_) => {
                Self::Transport
            }
        }
    }
}

/// A failure attributed to one device.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{device}: {kind} error: {message}")]
pub struct DeviceError {
    pub device: String,
    pub kind: ErrorKind,
    pub message: String,
}

impl DeviceError {
    pub fn new(device: impl Into<String>, kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            device: device.into(),
            kind,
            message: message.into(),
        }
    }

    /// Wrap a client error (inventory lookup, session setup).
    pub fn from_api(device: impl Into<String>, err: &nxfleet_api::Error) -> Self {
        Self::new(device, ErrorKind::from_api(err), err.to_string())
    }

    /// Wrap a failed command refresh.
    pub fn from_failure(device: impl Into<String>, failure: &Failure) -> Self {
        Self::new(device, failure.kind, failure.to_string())
    }
}
