// Shared transport configuration for building reqwest::Client instances.
//
// The NX-API session, the NetBox client and the Vault backend all share
// TLS, timeout and warning settings through this module.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tracing::warn;

/// TLS verification mode. Only an on/off toggle; no pinning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TlsMode {
    /// Use the system certificate store.
    System,
    /// Accept any certificate (self-signed switch certificates).
    DangerAcceptInvalid,
}

impl TlsMode {
    pub fn from_verify(verify_tls: bool) -> Self {
        if verify_tls {
            Self::System
        } else {
            Self::DangerAcceptInvalid
        }
    }
}

/// Shared transport configuration for building HTTP clients.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub tls: TlsMode,
    pub connect_timeout: Duration,
    pub read_timeout: Duration,
    /// Suppress the process-wide insecure-TLS warning.
    pub suppress_insecure_warning: bool,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            tls: TlsMode::DangerAcceptInvalid,
            connect_timeout: Duration::from_millis(5000),
            read_timeout: Duration::from_millis(30_000),
            suppress_insecure_warning: false,
        }
    }
}

static INSECURE_WARNED: AtomicBool = AtomicBool::new(false);

impl TransportConfig {
    /// Upper bound for one request: connect plus read.
    pub fn request_deadline(&self) -> Duration {
        self.connect_timeout + self.read_timeout
    }

    /// Build a `reqwest::Client` from this config.
    pub fn build_client(&self) -> Result<reqwest::Client, crate::error::Error> {
        self.build_client_with_headers(reqwest::header::HeaderMap::new())
    }

    /// Build a `reqwest::Client` with additional default headers.
    ///
    /// Used by the inventory client to inject the `Authorization: Token` header.
    pub fn build_client_with_headers(
        &self,
        headers: reqwest::header::HeaderMap,
    ) -> Result<reqwest::Client, crate::error::Error> {
        let mut builder = reqwest::Client::builder()
            .connect_timeout(self.connect_timeout)
            .timeout(self.request_deadline())
            .user_agent(concat!("nxfleet/", env!("CARGO_PKG_VERSION")))
            .default_headers(headers);

        if self.tls == TlsMode::DangerAcceptInvalid {
            self.warn_insecure();
            builder = builder.danger_accept_invalid_certs(true);
        }

        builder
            .build()
            .map_err(|e| crate::error::Error::Tls(format!("failed to build HTTP client: {e}")))
    }

    /// Log the insecure-TLS warning at most once per process.
    fn warn_insecure(&self) {
        if self.suppress_insecure_warning {
            return;
        }
        if !INSECURE_WARNED.swap(true, Ordering::Relaxed) {
            warn!("TLS certificate verification is disabled; switch certificates are not checked");
        }
    }
}
