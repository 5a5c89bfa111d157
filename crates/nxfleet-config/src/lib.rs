//! Shared configuration for the nxfleet report binaries.
//!
//! TOML settings layered under `NXFLEET_*` environment overrides, plus
//! the secret providers that yield the per-run [`CredentialBundle`].
//! Command-line flags are applied on top by the binaries themselves.

pub mod vault;

use std::path::{Path, PathBuf};
use std::str::FromStr;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use nxfleet_api::SessionConfig;

pub use vault::{AnsibleVault, CredentialBundle, HashicorpVault, SecretBackend, SecretProvider, VaultKind};

/// Environment prefix for config overrides, e.g. `NXFLEET_NXAPI__PORT=8443`.
pub const ENV_PREFIX: &str = "NXFLEET_";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("environment variable {var} is not set")]
    MissingEnv { var: &'static str },

    #[error("secret '{key}' is missing")]
    MissingKey { key: &'static str },

    #[error("cannot read secrets file {}: {source}", path.display())]
    SecretFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot parse secrets: {0}")]
    SecretFormat(String),

    #[error("secret store returned HTTP {status}")]
    SecretStore { status: u16 },

    #[error("secret store request failed: {0}")]
    SecretTransport(#[from] reqwest::Error),

    #[error(transparent)]
    Client(#[from] nxfleet_api::Error),

    #[error("unknown vault backend '{tag}' (expected ansible or hashicorp)")]
    UnknownBackend { tag: String },
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

impl From<url::ParseError> for ConfigError {
    fn from(err: url::ParseError) -> Self {
        Self::Client(nxfleet_api::Error::InvalidUrl(err))
    }
}

// ── Config structs ──────────────────────────────────────────────────

/// Top-level configuration.
#[derive(Debug, Default, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub defaults: Defaults,

    #[serde(default)]
    pub nxapi: NxapiSettings,

    #[serde(default)]
    pub vault: VaultSettings,
}

/// Defaults for the shared flags.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Defaults {
    /// Secret backend tag: `ansible` or `hashicorp`.
    #[serde(default = "default_vault")]
    pub vault: String,

    #[serde(default = "default_vrf")]
    pub vrf: String,

    /// Worker cap; unset means one worker per device.
    #[serde(default)]
    pub max_workers: Option<usize>,

    #[serde(default)]
    pub verify_tls: bool,

    #[serde(default)]
    pub disable_urllib_warnings: bool,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            vault: default_vault(),
            vrf: default_vrf(),
            max_workers: None,
            verify_tls: false,
            disable_urllib_warnings: false,
        }
    }
}

fn default_vault() -> String {
    "hashicorp".into()
}
fn default_vrf() -> String {
    "default".into()
}

/// How switches are reached.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct NxapiSettings {
    /// `https` unless the switch runs NX-API over plain HTTP.
    #[serde(default = "default_scheme")]
    pub scheme: String,

    /// Explicit port; the scheme's default when unset.
    #[serde(default)]
    pub port: Option<u16>,

    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_ms: u64,

    #[serde(default = "default_read_timeout")]
    pub read_timeout_ms: u64,
}

impl Default for NxapiSettings {
    fn default() -> Self {
        Self {
            scheme: default_scheme(),
            port: None,
            connect_timeout_ms: default_connect_timeout(),
            read_timeout_ms: default_read_timeout(),
        }
    }
}

fn default_scheme() -> String {
    "https".into()
}
fn default_connect_timeout() -> u64 {
    5000
}
fn default_read_timeout() -> u64 {
    30_000
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct VaultSettings {
    /// KV path appended to `VAULT_ADDR`.
    #[serde(default = "default_vault_endpoint")]
    pub endpoint: String,
}

impl Default for VaultSettings {
    fn default() -> Self {
        Self {
            endpoint: default_vault_endpoint(),
        }
    }
}

fn default_vault_endpoint() -> String {
    vault::DEFAULT_ENDPOINT.into()
}

impl Config {
    /// Check values figment cannot express as types.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !matches!(self.nxapi.scheme.as_str(), "http" | "https") {
            return Err(ConfigError::Validation {
                field: "nxapi.scheme".into(),
                reason: format!("'{}' is not http or https", self.nxapi.scheme),
            });
        }
        if self.defaults.max_workers == Some(0) {
            return Err(ConfigError::Validation {
                field: "defaults.max_workers".into(),
                reason: "must be at least 1".into(),
            });
        }
        for (field, value) in [
            ("nxapi.connect_timeout_ms", self.nxapi.connect_timeout_ms),
            ("nxapi.read_timeout_ms", self.nxapi.read_timeout_ms),
        ] {
            if value == 0 {
                return Err(ConfigError::Validation {
                    field: field.into(),
                    reason: "must be greater than zero".into(),
                });
            }
        }
        if self.defaults.vrf.is_empty()
            || self.defaults.vrf.contains(|c: char| c.is_whitespace() || matches!(c, ';' | '|'))
        {
            return Err(ConfigError::Validation {
                field: "defaults.vrf".into(),
                reason: format!("'{}' is not a single VRF name", self.defaults.vrf),
            });
        }
        self.vault_kind()?;
        Ok(())
    }

    pub fn vault_kind(&self) -> Result<VaultKind, ConfigError> {
        VaultKind::from_str(&self.defaults.vault).map_err(|_| ConfigError::UnknownBackend {
            tag: self.defaults.vault.clone(),
        })
    }

    /// Session options for every switch in this run. Cookie options
    /// come from the command line, so they start at their defaults here.
    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            verify_tls: self.defaults.verify_tls,
            disable_urllib_warnings: self.defaults.disable_urllib_warnings,
            connect_timeout_ms: self.nxapi.connect_timeout_ms,
            read_timeout_ms: self.nxapi.read_timeout_ms,
            ..SessionConfig::default()
        }
    }
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("com", "nxfleet", "nxfleet").map_or_else(
        || {
            let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
            p.push(".config");
            p.push("nxfleet");
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

// ── Config loading ──────────────────────────────────────────────────

/// Defaults < TOML file at `path` < `NXFLEET_*` environment.
pub fn figment_for(path: &Path) -> Figment {
    Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed(ENV_PREFIX).split("__"))
}

/// Load and validate the Config from a specific file + environment.
/// A missing file is not an error.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let config: Config = figment_for(path).extract()?;
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = Config::default();
        assert_eq!(config.defaults.vault, "hashicorp");
        assert_eq!(config.defaults.vrf, "default");
        assert_eq!(config.defaults.max_workers, None);
        assert_eq!(config.nxapi.scheme, "https");
        assert_eq!(config.nxapi.connect_timeout_ms, 5000);
        assert_eq!(config.nxapi.read_timeout_ms, 30_000);
        assert_eq!(config.vault.endpoint, "/v1/kv/nxapi");
        config.validate().unwrap();
    }

    #[test]
    fn rejects_unknown_scheme() {
        let mut config = Config::default();
        config.nxapi.scheme = "ftp".into();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Validation { ref field, .. }) if field == "nxapi.scheme"
        ));
    }

    #[test]
    fn rejects_zero_workers_and_timeouts() {
        let mut config = Config::default();
        config.defaults.max_workers = Some(0);
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.nxapi.read_timeout_ms = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_vrf_with_command_separators() {
        for bad in ["default ; reload", "a;b", "a|b", ""] {
            let mut config = Config::default();
            config.defaults.vrf = bad.into();
            assert!(
                matches!(config.validate(), Err(ConfigError::Validation { ref field, .. }) if field == "defaults.vrf"),
                "{bad:?}"
            );
        }
        let mut config = Config::default();
        config.defaults.vrf = "management".into();
        config.validate().unwrap();
    }

    #[test]
    fn unknown_backend_is_named() {
        let mut config = Config::default();
        config.defaults.vault = "keepass".into();
        let err = config.validate().unwrap_err();
        assert_eq!(
            err.to_string(),
            "unknown vault backend 'keepass' (expected ansible or hashicorp)"
        );
    }

    #[test]
    fn session_config_carries_timeouts_and_tls() {
        let mut config = Config::default();
        config.defaults.verify_tls = true;
        config.nxapi.read_timeout_ms = 1234;

        let session = config.session_config();

        assert!(session.verify_tls);
        assert_eq!(session.read_timeout_ms, 1234);
        assert!(session.save_cookies);
        assert!(session.process_cookies);
    }
}
