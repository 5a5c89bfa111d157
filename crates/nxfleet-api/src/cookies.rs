// Cookie file persistence
//
// One section per switch host, sorted `name=value` lines:
//
//   [10.0.0.1]
//   nxapi_auth=admin:16843...
//
// Several sessions may flush into the same file during one run, so
// writes are read-merge-write under a process-wide lock.

use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use tracing::debug;

use crate::error::Error;

/// Cookie name to value.
pub type CookieMap = BTreeMap<String, String>;

/// Host to its cookies.
pub type CookieSections = BTreeMap<String, CookieMap>;

static WRITE_LOCK: Mutex<()> = Mutex::new(());

/// A cookie jar file on disk.
#[derive(Debug, Clone)]
pub struct CookieFile {
    path: PathBuf,
}

impl CookieFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read all sections. A missing file reads as empty.
    pub fn read(&self) -> Result<CookieSections, Error> {
        match std::fs::read_to_string(&self.path) {
            Ok(text) => Ok(parse(&text)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(CookieSections::new()),
            Err(e) => Err(Error::CookieFile(e)),
        }
    }

    /// Replace the section for `host` with `cookies`, keeping other hosts.
    pub fn persist(&self, host: &str, cookies: &CookieMap) -> Result<(), Error> {
        let _guard = WRITE_LOCK.lock().unwrap_or_else(PoisonError::into_inner);

        let mut sections = self.read()?;
        sections.insert(host.to_owned(), cookies.clone());

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        std::fs::write(&tmp, render(&sections))?;
        std::fs::rename(&tmp, &self.path)?;

        debug!(path = %self.path.display(), host, count = cookies.len(), "cookies persisted");
        Ok(())
    }
}

/// Parse the sectioned `name=value` format. Unknown lines are skipped.
pub fn parse(text: &str) -> CookieSections {
    let mut sections = CookieSections::new();
    let mut current: Option<String> = None;

    for line in text.lines().map(str::trim) {
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if let Some(host) = line.strip_prefix('[').and_then(|l| l.strip_suffix(']')) {
            let host = host.trim().to_owned();
            sections.entry(host.clone()).or_default();
            current = Some(host);
            continue;
        }
        let (Some(host), Some((name, value))) = (current.as_ref(), line.split_once('=')) else {
            continue;
        };
        sections
            .entry(host.clone())
            .or_default()
            .insert(name.trim().to_owned(), value.trim().to_owned());
    }

    sections
}

/// Render sections in canonical (sorted) order.
pub fn render(sections: &CookieSections) -> String {
    let mut out = String::new();
    for (host, cookies) in sections {
        out.push('[');
        out.push_str(host);
        out.push_str("]\n");
        for (name, value) in cookies {
            out.push_str(name);
            out.push('=');
            out.push_str(value);
            out.push('\n');
        }
    }
    out
}

/// Split a `Cookie` request header (`a=1; b=2`) into a map.
pub fn parse_cookie_header(header: &str) -> CookieMap {
    header
        .split(';')
        .filter_map(|pair| pair.trim().split_once('='))
        .map(|(name, value)| (name.trim().to_owned(), value.trim().to_owned()))
        .collect()
}
