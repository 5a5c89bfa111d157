// Secret providers
//
// Both backends yield the same four credentials. Which one runs is a
// closed choice made once at startup; `fetch()` is called once per run.

use std::fmt;
use std::path::{Path, PathBuf};

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;
use url::Url;

use nxfleet_api::TransportConfig;

use crate::ConfigError;

/// KV path queried when none is configured.
pub const DEFAULT_ENDPOINT: &str = "/v1/kv/nxapi";

pub const ANSIBLE_VAULT_PATH: &str = "ANSIBLE_VAULT_PATH";
pub const VAULT_ADDR: &str = "VAULT_ADDR";
pub const VAULT_TOKEN: &str = "VAULT_TOKEN";

const KEY_INV_TOKEN: &str = "netbox_token";
const KEY_INV_URL: &str = "netbox_url";
const KEY_DEVICE_USER: &str = "nxos_username";
const KEY_DEVICE_PASS: &str = "nxos_password";

// ── Backend tag ─────────────────────────────────────────────────────

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::IntoStaticStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum VaultKind {
    /// Secrets file named by `ANSIBLE_VAULT_PATH`.
    Ansible,
    /// HTTP KV store at `VAULT_ADDR`, authenticated with `VAULT_TOKEN`.
    Hashicorp,
}

// ── Credentials ─────────────────────────────────────────────────────

/// The credentials one run needs. Never written to disk or logs.
#[derive(Clone)]
pub struct CredentialBundle {
    device_user: String,
    device_pass: SecretString,
    inv_token: SecretString,
    inv_url: String,
}

impl CredentialBundle {
    pub fn new(
        device_user: impl Into<String>,
        device_pass: SecretString,
        inv_token: SecretString,
        inv_url: impl Into<String>,
    ) -> Self {
        Self {
            device_user: device_user.into(),
            device_pass,
            inv_token,
            inv_url: inv_url.into(),
        }
    }

    /// Extract the mandatory keys from a parsed secrets document.
    pub fn from_document(doc: &Value) -> Result<Self, ConfigError> {
        Ok(Self {
            device_user: required(doc, KEY_DEVICE_USER)?,
            device_pass: SecretString::from(required(doc, KEY_DEVICE_PASS)?),
            inv_token: SecretString::from(required(doc, KEY_INV_TOKEN)?),
            inv_url: required(doc, KEY_INV_URL)?,
        })
    }

    pub fn device_user(&self) -> &str {
        &self.device_user
    }

    pub fn device_pass(&self) -> &SecretString {
        &self.device_pass
    }

    pub fn inv_token(&self) -> &SecretString {
        &self.inv_token
    }

    pub fn inv_url(&self) -> &str {
        &self.inv_url
    }
}

impl PartialEq for CredentialBundle {
    fn eq(&self, other: &Self) -> bool {
        self.device_user == other.device_user
            && self.inv_url == other.inv_url
            && self.device_pass.expose_secret() == other.device_pass.expose_secret()
            && self.inv_token.expose_secret() == other.inv_token.expose_secret()
    }
}

impl Eq for CredentialBundle {}

impl fmt::Debug for CredentialBundle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialBundle")
            .field("device_user", &self.device_user)
            .field("device_pass", &"[REDACTED]")
            .field("inv_token", &"[REDACTED]")
            .field("inv_url", &self.inv_url)
            .finish()
    }
}

fn required(doc: &Value, key: &'static str) -> Result<String, ConfigError> {
    let value = match doc.get(key) {
        Some(Value::String(s)) => s.trim().to_owned(),
        Some(Value::Number(n)) => n.to_string(),
        _ => String::new(),
    };
    if value.is_empty() {
        return Err(ConfigError::MissingKey { key });
    }
    Ok(value)
}

// ── Provider capability ─────────────────────────────────────────────

pub trait SecretProvider {
    /// Read the credentials. Pure read: unchanged inputs give equal bundles.
    fn fetch(&self) -> impl Future<Output = Result<CredentialBundle, ConfigError>> + Send;
}

// ── Ansible backend ─────────────────────────────────────────────────

/// YAML secrets file on local disk.
#[derive(Debug, Clone)]
pub struct AnsibleVault {
    path: PathBuf,
}

impl AnsibleVault {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Resolve the file path through `lookup` instead of the process env.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let path = lookup(ANSIBLE_VAULT_PATH)
            .filter(|p| !p.trim().is_empty())
            .ok_or(ConfigError::MissingEnv { var: ANSIBLE_VAULT_PATH })?;
        Ok(Self::new(path))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SecretProvider for AnsibleVault {
    async fn fetch(&self) -> Result<CredentialBundle, ConfigError> {
        debug!(path = %self.path.display(), "reading secrets file");
        let text = std::fs::read_to_string(&self.path).map_err(|source| ConfigError::SecretFile {
            path: self.path.clone(),
            source,
        })?;
        let doc: Value = serde_yaml::from_str(&text).map_err(|e| ConfigError::SecretFormat(e.to_string()))?;
        CredentialBundle::from_document(&doc)
    }
}

// ── Hashicorp backend ───────────────────────────────────────────────

/// HTTP KV store. One `GET {base_url}{endpoint}` with a bearer token.
#[derive(Clone)]
pub struct HashicorpVault {
    base_url: String,
    token: SecretString,
    endpoint: String,
    transport: TransportConfig,
}

impl HashicorpVault {
    pub fn new(base_url: impl Into<String>, token: SecretString) -> Self {
        Self {
            base_url: base_url.into(),
            token,
            endpoint: DEFAULT_ENDPOINT.into(),
            transport: TransportConfig::default(),
        }
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let present = |var: &'static str| {
            lookup(var)
                .filter(|v| !v.trim().is_empty())
                .ok_or(ConfigError::MissingEnv { var })
        };
        let base_url = present(VAULT_ADDR)?;
        let token = present(VAULT_TOKEN)?;
        Ok(Self::new(base_url, SecretString::from(token)))
    }

    /// Override the KV path. Must be called before `fetch()`.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn with_transport(mut self, transport: TransportConfig) -> Self {
        self.transport = transport;
        self
    }

    pub fn url(&self) -> Result<Url, ConfigError> {
        let endpoint = self.endpoint.trim_start_matches('/');
        Ok(Url::parse(&format!("{}/{endpoint}", self.base_url.trim_end_matches('/')))?)
    }
}

impl SecretProvider for HashicorpVault {
    async fn fetch(&self) -> Result<CredentialBundle, ConfigError> {
        let url = self.url()?;
        debug!("GET {url}");

        let http = self.transport.build_client()?;
        let resp = http
            .get(url)
            .bearer_auth(self.token.expose_secret())
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(ConfigError::SecretStore {
                status: status.as_u16(),
            });
        }

        let body: Value = resp
            .json()
            .await
            .map_err(|e| ConfigError::SecretFormat(e.to_string()))?;
        CredentialBundle::from_document(kv_data(&body)?)
    }
}

impl fmt::Debug for HashicorpVault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HashicorpVault")
            .field("base_url", &self.base_url)
            .field("endpoint", &self.endpoint)
            .finish_non_exhaustive()
    }
}

/// KV v1 keeps secrets in `data`; KV v2 nests them in `data.data`.
fn kv_data(body: &Value) -> Result<&Value, ConfigError> {
    let data = body
        .get("data")
        .filter(|d| d.is_object())
        .ok_or_else(|| ConfigError::SecretFormat("response has no data object".into()))?;
    Ok(data.get("data").filter(|d| d.is_object()).unwrap_or(data))
}

// ── Dispatch ────────────────────────────────────────────────────────

/// The selected backend.
#[derive(Debug, Clone)]
pub enum SecretBackend {
    Ansible(AnsibleVault),
    Hashicorp(HashicorpVault),
}

impl SecretBackend {
    /// Build the backend for `kind` from the process environment.
    pub fn from_env(kind: VaultKind, endpoint: &str, transport: TransportConfig) -> Result<Self, ConfigError> {
        Ok(match kind {
            VaultKind::Ansible => Self::Ansible(AnsibleVault::from_env()?),
            VaultKind::Hashicorp => Self::Hashicorp(
                HashicorpVault::from_env()?
                    .with_endpoint(endpoint)
                    .with_transport(transport),
            ),
        })
    }

    pub fn kind(&self) -> VaultKind {
        match self {
            Self::Ansible(_) => VaultKind::Ansible,
            Self::Hashicorp(_) => VaultKind::Hashicorp,
        }
    }
}

impl SecretProvider for SecretBackend {
    async fn fetch(&self) -> Result<CredentialBundle, ConfigError> {
        match self {
            Self::Ansible(vault) => vault.fetch().await,
            Self::Hashicorp(vault) => vault.fetch().await,
        }
    }
}
