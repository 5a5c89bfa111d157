// ── Device targets ──

use std::net::Ipv4Addr;

use url::Url;

/// How switches are reached: scheme plus optional explicit port.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub scheme: String,
    pub port: Option<u16>,
}

impl Default for Endpoint {
    fn default() -> Self {
        Self {
            scheme: "https".into(),
            port: None,
        }
    }
}

/// One switch named on the command line.
///
/// `mgmt_ip` is filled once by the inventory; `hostname` once by the
/// first successful response. Neither changes afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceTarget {
    name: String,
    mgmt_ip: Option<Ipv4Addr>,
    hostname: String,
}

impl DeviceTarget {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            mgmt_ip: None,
            hostname: String::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn mgmt_ip(&self) -> Option<Ipv4Addr> {
        self.mgmt_ip
    }

    pub fn hostname(&self) -> &str {
        &self.hostname
    }

    /// Record the resolved address. Ignored if one is already set.
    pub fn resolve_to(&mut self, ip: Ipv4Addr) {
        self.mgmt_ip.get_or_insert(ip);
    }

    /// Record the switch's self-reported name. Ignored if already learned
    /// or if `hostname` is empty.
    pub fn learn_hostname(&mut self, hostname: &str) {
        if self.hostname.is_empty() && !hostname.is_empty() {
            self.hostname = hostname.to_owned();
        }
    }

    /// The switch base URL, or `None` while unresolved.
    pub fn nxapi_url(&self, endpoint: &Endpoint) -> Option<Url> {
        let ip = self.mgmt_ip?;
        let mut url = Url::parse(&format!("{}://{ip}", endpoint.scheme)).ok()?;
        if let Some(port) = endpoint.port {
            url.set_port(Some(port)).ok()?;
        }
        Some(url)
    }

    /// Column value for the `ip` field of a report row.
    pub fn ip_column(&self) -> String {
        self.mgmt_ip.map_or_else(|| crate::command::NA_STR.to_owned(), |ip| ip.to_string())
    }
}
