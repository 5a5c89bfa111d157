//! Operational reports: one per binary.
//!
//! A report runs its commands on one device's session and renders the
//! device's record as fixed-width lines. The header is emitted once per
//! run, before any record.

use nxfleet_api::NxapiSession;

use crate::command::{Dir, IpArp, ShowCommand, ShowInterface, ShowVersion};
use crate::error::{DeviceError, ErrorKind};
use crate::target::DeviceTarget;

const IP_WIDTH: usize = 15;
const NAME_WIDTH: usize = 20;

pub trait Report: Send + Sync + 'static {
    fn name(&self) -> &'static str;

    fn header(&self) -> String;

    /// Query `session` and render the device's lines. An empty table is
    /// a valid record with no lines.
    fn collect(
        &self,
        target: &DeviceTarget,
        session: &mut NxapiSession,
    ) -> impl Future<Output = Result<Vec<String>, DeviceError>> + Send;
}

async fn refreshed<C: ShowCommand>(mut cmd: C, target: &DeviceTarget, session: &mut NxapiSession) -> Result<C, DeviceError> {
    if cmd.refresh(session).await {
        return Ok(cmd);
    }
    Err(match cmd.failure() {
        Some(failure) => DeviceError::from_failure(target.name(), failure),
        None => DeviceError::new(target.name(), ErrorKind::Protocol, "refresh failed"),
    })
}

// ── switch-version ──────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default)]
pub struct VersionReport;

impl VersionReport {
    fn row(ip: &str, hostname: &str, bios: &str, nxos: &str) -> String {
        format!("{ip:<IP_WIDTH$} {hostname:<NAME_WIDTH$} {bios:<12} {nxos}")
    }
}

impl Report for VersionReport {
    fn name(&self) -> &'static str {
        "switch-version"
    }

    fn header(&self) -> String {
        Self::row("ip", "hostname", "bios", "nxos_version")
    }

    async fn collect(&self, target: &DeviceTarget, session: &mut NxapiSession) -> Result<Vec<String>, DeviceError> {
        let version = refreshed(ShowVersion::new(), target, session).await?;
        let hostname = match session.hostname() {
            "" => version.hostname(),
            learned => learned.to_owned(),
        };
        Ok(vec![Self::row(
            &target.ip_column(),
            &hostname,
            &version.bios_ver_str(),
            &version.nxos_ver_str(),
        )])
    }
}

// ── interface-errors ────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default)]
pub struct InterfaceErrorsReport;

impl InterfaceErrorsReport {
    fn row(ip: &str, device: &str, interface: &str, counters: [&str; 5]) -> String {
        let [crc, inerr, outerr, runts, giants] = counters;
        format!(
            "{ip:<IP_WIDTH$} {device:<NAME_WIDTH$} {interface:<16} {crc:>8} {inerr:>8} {outerr:>8} {runts:>8} {giants:>8}"
        )
    }
}

impl Report for InterfaceErrorsReport {
    fn name(&self) -> &'static str {
        "interface-errors"
    }

    fn header(&self) -> String {
        Self::row("ip", "device", "interface", ["crc", "inerr", "outerr", "runts", "giants"])
    }

    async fn collect(&self, target: &DeviceTarget, session: &mut NxapiSession) -> Result<Vec<String>, DeviceError> {
        let interfaces = refreshed(ShowInterface::new(), target, session).await?;
        let ip = target.ip_column();
        Ok(interfaces
            .interface_list()
            .iter()
            .map(|intf| {
                let counts = crate::command::interface::COUNTERS.map(|(short, _)| intf.counter(short).to_string());
                Self::row(&ip, target.name(), &intf.name, counts.each_ref().map(String::as_str))
            })
            .collect())
    }
}

// ── dir-listing ─────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct DirReport {
    path: String,
}

impl DirReport {
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }

    fn row(ip: &str, device: &str, size: &str, timestamp: &str, filename: &str) -> String {
        format!("{ip:<IP_WIDTH$} {device:<NAME_WIDTH$} {size:>12} {timestamp:<22} {filename}")
    }
}

impl Default for DirReport {
    fn default() -> Self {
        Self::new(crate::command::dir::DEFAULT_PATH)
    }
}

impl Report for DirReport {
    fn name(&self) -> &'static str {
        "dir-listing"
    }

    fn header(&self) -> String {
        Self::row("ip", "device", "size", "timestamp", "filename")
    }

    async fn collect(&self, target: &DeviceTarget, session: &mut NxapiSession) -> Result<Vec<String>, DeviceError> {
        let mut dir = Dir::new();
        dir.set_input(&self.path);
        let dir = refreshed(dir, target, session).await?;
        let ip = target.ip_column();
        Ok(dir
            .files()
            .into_iter()
            .flatten()
            .map(|(name, entry)| Self::row(&ip, target.name(), &entry.size.to_string(), &entry.timestamp, name))
            .collect())
    }
}

// ── arp-table ───────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct ArpReport {
    vrf: String,
}

impl ArpReport {
    pub fn new(vrf: impl Into<String>) -> Self {
        Self { vrf: vrf.into() }
    }

    fn row(ip: &str, device: &str, address: &str, mac: &str, interface: &str) -> String {
        format!("{ip:<IP_WIDTH$} {device:<NAME_WIDTH$} {address:<IP_WIDTH$} {mac:<14} {interface}")
    }
}

impl Report for ArpReport {
    fn name(&self) -> &'static str {
        "arp-table"
    }

    fn header(&self) -> String {
        Self::row("ip", "device", "address", "mac", "interface")
    }

    async fn collect(&self, target: &DeviceTarget, session: &mut NxapiSession) -> Result<Vec<String>, DeviceError> {
        let mut arp = IpArp::new();
        arp.set_input(&self.vrf);
        let arp = refreshed(arp, target, session).await?;
        let ip = target.ip_column();
        Ok(arp
            .entries()
            .iter()
            .map(|e| Self::row(&ip, target.name(), &e.address, &e.mac, &e.interface))
            .collect())
    }
}
