//! Startup errors with miette diagnostics.
//!
//! Everything here happens before the first device is queried; per-device
//! failures are logged by the engine and never surface as a `CliError`.

use miette::Diagnostic;
use thiserror::Error;

use nxfleet_config::ConfigError;

/// Process exit codes.
pub mod exit_code {
    pub const SUCCESS: u8 = 0;
    pub const STARTUP: u8 = 1;
    pub const ALL_FAILED: u8 = 2;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    #[error("no device names given")]
    #[diagnostic(
        code(nxfleet::no_devices),
        help("Pass a comma-separated list without spaces, e.g. --devices sw1,sw2")
    )]
    NoDevices,

    #[error("invalid configuration")]
    #[diagnostic(
        code(nxfleet::config),
        help("Check {path} and any NXFLEET_* environment variables.")
    )]
    Config {
        path: String,
        #[source]
        source: ConfigError,
    },

    #[error("could not load credentials from the {backend} vault")]
    #[diagnostic(
        code(nxfleet::secrets),
        help(
            "hashicorp needs VAULT_ADDR and VAULT_TOKEN; ansible needs ANSIBLE_VAULT_PATH.\n\
             The secrets must define netbox_url, netbox_token, nxos_username and nxos_password."
        )
    )]
    Secrets {
        backend: &'static str,
        #[source]
        source: ConfigError,
    },

    #[error("cannot use inventory at '{url}'")]
    #[diagnostic(
        code(nxfleet::inventory),
        help("netbox_url must be an absolute http(s) URL.")
    )]
    Inventory {
        url: String,
        #[source]
        source: nxfleet_api::Error,
    },
}

impl CliError {
    pub fn exit_code(&self) -> u8 {
        exit_code::STARTUP
    }
}
