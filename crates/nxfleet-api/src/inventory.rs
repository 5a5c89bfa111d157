// NetBox inventory client
//
// One read: device name -> management IPv4 address.
// Auth: `Authorization: Token <inv_token>` header.

use std::net::Ipv4Addr;

use reqwest::StatusCode;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tracing::debug;
use url::Url;

use crate::error::Error;
use crate::transport::TransportConfig;

// ── Response shapes ──────────────────────────────────────────────────

/// Paged list envelope from `/api/dcim/devices/`.
#[derive(Debug, Deserialize)]
struct DeviceList {
    #[serde(default)]
    count: Option<u64>,
    #[serde(default)]
    results: Vec<DeviceRecord>,
}

#[derive(Debug, Deserialize)]
struct DeviceRecord {
    #[serde(default)]
    primary_ip4: Option<IpAddressRef>,
}

#[derive(Debug, Deserialize)]
struct IpAddressRef {
    /// CIDR form, e.g. `10.0.0.1/24`.
    address: String,
}

// ── Client ───────────────────────────────────────────────────────────

/// Async client for the NetBox DCIM device endpoint.
#[derive(Debug, Clone)]
pub struct NetboxClient {
    http: reqwest::Client,
    base_url: Url,
}

impl NetboxClient {
    /// Build from the inventory URL and token. The token is sent as a
    /// sensitive default header on every request.
    pub fn from_token(base_url: &str, token: &SecretString, transport: &TransportConfig) -> Result<Self, Error> {
        let mut headers = HeaderMap::new();
        let mut value = HeaderValue::from_str(&format!("Token {}", token.expose_secret()))
            .map_err(|e| Error::InvalidHeader {
                header: "inventory Authorization",
                reason: e.to_string(),
            })?;
        value.set_sensitive(true);
        headers.insert(AUTHORIZATION, value);

        let http = transport.build_client_with_headers(headers)?;
        Self::from_reqwest(base_url, http)
    }

    /// Wrap an existing `reqwest::Client` (caller manages auth headers).
    pub fn from_reqwest(base_url: &str, http: reqwest::Client) -> Result<Self, Error> {
        let mut base_url = Url::parse(base_url)?;
        let path = base_url.path().trim_end_matches('/').to_owned();
        base_url.set_path(&format!("{path}/"));
        Ok(Self { http, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Resolve a device name to its primary IPv4 address.
    ///
    /// `GET {inv_url}/api/dcim/devices/?name={name}`; the `/prefix`
    /// suffix of `primary_ip4.address` is stripped.
    pub async fn resolve(&self, name: &str) -> Result<Ipv4Addr, Error> {
        let url = self.base_url.join("api/dcim/devices/")?;
        debug!(device = name, "GET {url}");

        let resp = self.http.get(url).query(&[("name", name)]).send().await?;
        let status = resp.status();

        match status {
            s if s.is_success() => {}
            StatusCode::NOT_FOUND => {
                return Err(Error::DeviceNotFound { name: name.to_owned() });
            }
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                return Err(Error::InventoryAuth {
                    status: status.as_u16(),
                });
            }
            _ => {
                let body = resp.text().await.unwrap_or_default();
                return Err(Error::Inventory {
                    status: status.as_u16(),
                    message: body.chars().take(200).collect(),
                });
            }
        }

        let body = resp.text().await?;
        let list: DeviceList = serde_json::from_str(&body).map_err(|e| Error::Deserialization {
            message: e.to_string(),
            body: body.clone(),
        })?;

        let Some(record) = list.results.into_iter().next().filter(|_| list.count != Some(0)) else {
            return Err(Error::DeviceNotFound { name: name.to_owned() });
        };
        let address = record
            .primary_ip4
            .map(|ip| ip.address)
            .ok_or_else(|| Error::MissingPrimaryIp { name: name.to_owned() })?;

        parse_cidr_v4(&address).ok_or_else(|| Error::InvalidAddress {
            name: name.to_owned(),
            address,
        })
    }
}

/// `10.0.0.1/24` -> `10.0.0.1`. A bare address is accepted as well.
pub fn parse_cidr_v4(address: &str) -> Option<Ipv4Addr> {
    let host = address.split_once('/').map_or(address, |(host, _)| host);
    host.trim().parse().ok()
}
