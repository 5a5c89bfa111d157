use thiserror::Error;

use crate::nxapi::SessionState;

/// Top-level error type for the `nxfleet-api` crate.
///
/// Covers the failure modes that are not expressed as a
/// [`ResponseView`](crate::ResponseView): inventory lookups, client
/// construction, session misuse and cookie persistence. NX-API wire
/// failures never surface here -- they are folded into per-command views.
#[derive(Debug, Error)]
pub enum Error {
    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// TLS setup or HTTP client construction error.
    #[error("TLS error: {0}")]
    Tls(String),

    // ── Inventory ───────────────────────────────────────────────────
    /// The inventory has no record for this device name.
    #[error("device '{name}' not found in inventory")]
    DeviceNotFound { name: String },

    /// The device record exists but carries no primary IPv4 address.
    #[error("device '{name}' has no primary IPv4 address")]
    MissingPrimaryIp { name: String },

    /// The primary address could not be parsed as `a.b.c.d/prefix`.
    #[error("device '{name}' has an invalid primary address '{address}'")]
    InvalidAddress { name: String, address: String },

    /// A credential cannot be carried in an HTTP header (control
    /// characters, embedded newlines). The value itself is never echoed.
    #[error("invalid {header} header: {reason}")]
    InvalidHeader { header: &'static str, reason: String },

    /// The inventory rejected the token.
    #[error("inventory rejected credentials (HTTP {status})")]
    InventoryAuth { status: u16 },

    /// Any other non-2xx inventory response.
    #[error("inventory returned HTTP {status}: {message}")]
    Inventory { status: u16, message: String },

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },

    // ── Session ─────────────────────────────────────────────────────
    /// Operation not valid in the session's current state.
    #[error("session is {state}, cannot {operation}")]
    InvalidState {
        state: SessionState,
        operation: &'static str,
    },

    /// Cookie file could not be read or written.
    #[error("cookie file error: {0}")]
    CookieFile(#[from] std::io::Error),
}

impl Error {
    /// Returns `true` if this is a "not found" error.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::DeviceNotFound { .. })
    }
}
